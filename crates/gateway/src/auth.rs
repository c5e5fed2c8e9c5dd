//! Caller authorization for the chat endpoint.
//!
//! Session handling lives in the booking backend; the gateway only needs
//! to turn a bearer token into a `Principal` and check its role. The
//! `Authorizer` trait is the seam where a JWT verifier or session lookup
//! would plug in; `StaticTokenAuthorizer` serves tokens from config.

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use clinicchat_config::AuthConfig;
use tracing::warn;

use crate::{ErrorBody, SharedState};

/// What the caller is allowed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallerRole {
    Patient,
    Doctor,
    Admin,
}

impl FromStr for CallerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(CallerRole::Patient),
            "doctor" => Ok(CallerRole::Doctor),
            "admin" => Ok(CallerRole::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
    pub role: CallerRole,
}

impl Principal {
    pub fn anonymous_patient() -> Self {
        Self {
            subject: "anonymous".into(),
            role: CallerRole::Patient,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Not authorized, no token")]
    MissingToken,

    #[error("Not authorized, token failed")]
    InvalidToken,

    #[error("Access denied. Patients only.")]
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match self {
            AuthError::MissingToken | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
        };
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// Resolves a bearer token into a principal.
pub trait Authorizer: Send + Sync {
    fn authenticate(&self, bearer: Option<&str>) -> Result<Principal, AuthError>;
}

/// Token table loaded from `[auth]` in config.
pub struct StaticTokenAuthorizer {
    require_auth: bool,
    tokens: HashMap<String, Principal>,
}

impl StaticTokenAuthorizer {
    pub fn from_config(config: &AuthConfig) -> Self {
        let mut tokens = HashMap::new();
        for entry in &config.tokens {
            match entry.role.parse::<CallerRole>() {
                Ok(role) => {
                    tokens.insert(
                        entry.token.clone(),
                        Principal {
                            subject: entry.subject.clone(),
                            role,
                        },
                    );
                }
                Err(reason) => {
                    warn!(subject = %entry.subject, %reason, "Skipping auth token with invalid role");
                }
            }
        }

        if config.require_auth && tokens.is_empty() {
            warn!("Authorization is required but no tokens are configured; every chat request will be rejected");
        }

        Self {
            require_auth: config.require_auth,
            tokens,
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Authorizer for StaticTokenAuthorizer {
    fn authenticate(&self, bearer: Option<&str>) -> Result<Principal, AuthError> {
        if !self.require_auth {
            return Ok(Principal::anonymous_patient());
        }

        let token = bearer.ok_or(AuthError::MissingToken)?;
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware for patient-only routes. On success the `Principal` is
/// available to handlers as an `Extension`.
pub async fn require_patient(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = state.authorizer.authenticate(bearer_token(&req)).map_err(|e| {
        warn!(error = %e, path = %req.uri().path(), "Rejected unauthenticated request");
        e
    })?;

    if principal.role != CallerRole::Patient {
        warn!(subject = %principal.subject, role = ?principal.role, "Rejected non-patient caller");
        return Err(AuthError::Forbidden);
    }

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}
