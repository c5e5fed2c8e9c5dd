//! `clinicchat ask`: One exchange with the medical assistant, no server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clinicchat_assistant::MedicalAssistant;
use clinicchat_core::error::ChatError;
use clinicchat_core::message::{ConversationRequest, Turn};
use tracing::{debug, warn};

fn read_history(path: &Path) -> Result<Vec<Turn>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read history {}: {e}", path.display()))?;
    let turns: Vec<Turn> = serde_json::from_str(&raw)
        .map_err(|e| format!("Invalid history file {}: {e}", path.display()))?;
    Ok(turns)
}

pub async fn run(
    config_path: Option<&Path>,
    message: String,
    history: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;

    if !config.has_api_key() && config.provider != "ollama" {
        eprintln!();
        eprintln!("  ERROR: No API key configured for provider '{}'", config.provider);
        eprintln!();
        eprintln!("  Set CLINICCHAT_API_KEY (or OPENAI_API_KEY), or add api_key to:");
        eprintln!("    {}", super::config_file(config_path).display());
        eprintln!();
        return Err("No API key found.".into());
    }

    let history = match history {
        Some(path) => read_history(&path)?,
        None => Vec::new(),
    };

    debug!(history_len = history.len(), provider = %config.provider, "One-shot ask");

    let provider = clinicchat_providers::build_from_config(&config)?;
    let assistant = Arc::new(MedicalAssistant::from_config(provider, &config));

    match assistant.respond(&ConversationRequest::new(message, history)).await {
        Ok(reply) => {
            println!("{reply}");
            Ok(())
        }
        Err(ChatError::QuotaExceeded) => {
            warn!(provider = %config.provider, "Provider quota exhausted");
            Err("API quota exceeded. Please try again later.".into())
        }
        Err(e) => Err(e.to_string().into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinicchat_core::message::Role;

    #[test]
    fn history_file_parses_turns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(
            &path,
            r#"[{"role":"user","content":"I feel dizzy"},{"role":"assistant","content":"Since when?"}]"#,
        )
        .unwrap();

        let turns = read_history(&path).unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, Role::Assistant);
    }

    #[test]
    fn bad_history_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, r#"[{"role":"robot","content":"x"}]"#).unwrap();
        assert!(read_history(&path).is_err());
        assert!(read_history(&dir.path().join("missing.json")).is_err());
    }
}
