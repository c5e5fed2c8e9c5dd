//! Conversation assembly: directive first, caller history verbatim, new
//! user message last.
//!
//! # Determinism
//!
//! Assembly is a pure function of `(message, history)`: identical inputs
//! always produce identical outputs, and nothing is retained afterwards.
//! History is not truncated, reordered, or validated for role alternation.

use clinicchat_core::error::ChatError;
use clinicchat_core::message::Turn;

/// The canned sentence the directive tells the model to use for off-topic
/// questions.
pub const DECLINE_SENTENCE: &str = "I'm a medical assistant and can only help with health-related questions. Please ask me about symptoms, health advice, medications, or wellness topics.";

/// The domain-restriction policy sent as turn zero of every request.
pub const MEDICAL_DIRECTIVE: &str = concat!(
    "You are a helpful medical assistant chatbot. You can ONLY answer questions related to:\n",
    "- Medical symptoms and conditions\n",
    "- General health advice\n",
    "- Medications and their uses\n",
    "- First aid guidance\n",
    "- Nutrition and wellness\n",
    "- Mental health support\n",
    "\n",
    "IMPORTANT RULES:\n",
    "1. If a question is NOT related to health or medical topics, politely decline and say: \"",
    "I'm a medical assistant and can only help with health-related questions. Please ask me about symptoms, health advice, medications, or wellness topics.",
    "\"\n",
    "2. Always recommend consulting a real doctor for serious symptoms or conditions.\n",
    "3. Never diagnose conditions definitively - only provide general information.\n",
    "4. Be empathetic and supportive in your responses.\n",
    "5. Keep responses concise but helpful.\n",
    "6. If asked about emergencies, advise calling emergency services immediately.",
);

/// A fully assembled request, ready for the completion gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledRequest {
    /// Always `Turn::system(MEDICAL_DIRECTIVE)`.
    pub directive: Turn,
    /// Caller history followed by the new user turn.
    pub turns: Vec<Turn>,
}

impl AssembledRequest {
    /// The literal sequence presented to the provider.
    pub fn sequence(&self) -> Vec<Turn> {
        let mut seq = Vec::with_capacity(self.turns.len() + 1);
        seq.push(self.directive.clone());
        seq.extend(self.turns.iter().cloned());
        seq
    }
}

/// Build the turn sequence for one exchange.
///
/// `message` must contain something other than whitespace; it is forwarded
/// exactly as given.
pub fn assemble(message: Option<&str>, history: &[Turn]) -> Result<AssembledRequest, ChatError> {
    let message = match message {
        Some(m) if !m.trim().is_empty() => m,
        _ => return Err(ChatError::InvalidInput("Message is required".into())),
    };

    let mut turns = Vec::with_capacity(history.len() + 1);
    turns.extend(history.iter().cloned());
    turns.push(Turn::user(message));

    Ok(AssembledRequest {
        directive: Turn::system(MEDICAL_DIRECTIVE),
        turns,
    })
}
