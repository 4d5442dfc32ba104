/// Event contracts for chat module wiring.
pub mod events;
/// Plain-text to display-segment conversion.
pub mod format;
/// Teach-back prompt component.
pub mod learn_prompt;
/// Domain entities and deterministic exchange state boundaries.
pub mod message;
pub mod message_input;
pub mod message_list;
pub mod scroll_manager;
pub mod view;

pub use events::{ExchangeOutcome, LearnAnswerSubmitted, LearnPromptDismissed, Submit};
pub use format::{Segment, layout_segments};
pub use learn_prompt::LearnPrompt;
pub use message::{
    ChatSession, ExchangeId, ExchangeRejection, ExchangeState, ExchangeTransition,
    ExchangeTransitionResult, Message, MessageId, MessageStatus, Role, TypingIndicator,
};
pub use message_input::MessageInput;
pub use message_list::{MessageList, TYPING_PLACEHOLDER_TEXT};
pub use scroll_manager::ScrollManager;
pub use view::{ChatView, DEFAULT_REPLY_DELAY_MS};
