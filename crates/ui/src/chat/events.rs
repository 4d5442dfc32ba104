use crate::chat::message::{ExchangeId, ExchangeTransition};

/// Emitted when the user submits a trimmed, non-empty message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submit {
    pub content: String,
}

impl Submit {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Emitted when the operator supplies an answer in the teach-back prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnAnswerSubmitted {
    pub answer: String,
}

/// Emitted when the operator dismisses the teach-back prompt without
/// answering. Not an error: the pending question stays stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LearnPromptDismissed;

/// Settled result of one chat exchange, mapped into chat domain language at
/// the transport boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Reply { text: String, learn: bool },
    Failed { message: String },
}

impl ExchangeOutcome {
    /// Returns the exchange state transition this settlement implies.
    pub fn transition(&self, exchange_id: ExchangeId) -> ExchangeTransition {
        match self {
            Self::Reply { .. } => ExchangeTransition::Complete(exchange_id),
            Self::Failed { message } => ExchangeTransition::Fail {
                exchange_id,
                message: message.clone(),
            },
        }
    }
}
