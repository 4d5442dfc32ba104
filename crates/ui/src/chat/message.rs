/// Stable identifier for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Creates a typed message identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Identifier for one request/reply exchange with the bot service.
///
/// This must change on every submit so stale settlements can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExchangeId(pub u64);

impl ExchangeId {
    /// Creates a typed exchange identifier.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Chat speaker role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Bot,
}

/// Lifecycle status for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageStatus {
    Done,
    Error(String),
}

/// Core immutable message model. Once appended to the panel a message is
/// never edited, only cleared with the rest of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub status: MessageStatus,
}

impl Message {
    /// Creates a message with explicit status.
    pub fn new(
        id: MessageId,
        role: Role,
        content: impl Into<String>,
        status: MessageStatus,
    ) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            status,
        }
    }

    /// Creates a sent user message.
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self::new(id, Role::User, content, MessageStatus::Done)
    }

    /// Creates a received bot message.
    pub fn bot(id: MessageId, content: impl Into<String>) -> Self {
        Self::new(id, Role::Bot, content, MessageStatus::Done)
    }

    /// Creates a bot-styled failure row for one broken exchange.
    pub fn bot_error(id: MessageId, content: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(id, Role::Bot, content, MessageStatus::Error(error.into()))
    }
}

/// Visibility of the "Bot is typing..." placeholder.
///
/// At most one placeholder exists at any time; `show` refuses a second
/// activation instead of stacking duplicates, and `dismiss` is safe to call
/// when nothing is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypingIndicator {
    #[default]
    Hidden,
    Shown,
}

impl TypingIndicator {
    /// Transitions Hidden -> Shown. Returns false when already shown.
    pub fn show(&mut self) -> bool {
        if *self == Self::Shown {
            return false;
        }
        *self = Self::Shown;
        true
    }

    /// Transitions Shown -> Hidden. Returns false when already hidden.
    pub fn dismiss(&mut self) -> bool {
        if *self == Self::Hidden {
            return false;
        }
        *self = Self::Hidden;
        true
    }

    pub fn is_shown(&self) -> bool {
        *self == Self::Shown
    }
}

/// Exchange state boundary for send-flow orchestration.
///
/// One chat round-trip is in flight at most: `Begin` while another exchange
/// is awaiting its reply is rejected, which keeps rendered ordering
/// deterministic under rapid sending.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExchangeState {
    #[default]
    Idle,
    AwaitingReply(ExchangeId),
    Done(ExchangeId),
    Failed {
        exchange_id: ExchangeId,
        message: String,
    },
}

/// State transition input for the exchange lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeTransition {
    Begin(ExchangeId),
    Complete(ExchangeId),
    Fail {
        exchange_id: ExchangeId,
        message: String,
    },
    ResetToIdle,
}

/// Rejection reason for illegal exchange transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeRejection {
    AlreadyAwaiting {
        active: ExchangeId,
        attempted: ExchangeId,
    },
    NoActiveExchange,
    ExchangeMismatch {
        active: ExchangeId,
        attempted: ExchangeId,
    },
}

/// Result type for exchange transition application.
pub type ExchangeTransitionResult = Result<ExchangeState, ExchangeRejection>;

impl ExchangeState {
    /// Returns the awaiting exchange if and only if one is in flight.
    pub fn active_exchange(&self) -> Option<ExchangeId> {
        match self {
            Self::AwaitingReply(exchange_id) => Some(*exchange_id),
            Self::Idle | Self::Done(_) | Self::Failed { .. } => None,
        }
    }

    /// Returns true when a settlement matches the in-flight exchange.
    pub fn accepts_settlement(&self, exchange_id: ExchangeId) -> bool {
        matches!(self, Self::AwaitingReply(active) if *active == exchange_id)
    }

    /// Applies one transition deterministically.
    ///
    /// Settled states may begin a new exchange directly. Any terminal
    /// transition (`Complete`/`Fail`) must match the in-flight exchange
    /// exactly.
    pub fn apply(&self, transition: ExchangeTransition) -> ExchangeTransitionResult {
        match transition {
            ExchangeTransition::Begin(exchange_id) => self.apply_begin(exchange_id),
            ExchangeTransition::Complete(exchange_id) => self.apply_complete(exchange_id),
            ExchangeTransition::Fail {
                exchange_id,
                message,
            } => self.apply_fail(exchange_id, message),
            ExchangeTransition::ResetToIdle => Ok(Self::Idle),
        }
    }

    fn apply_begin(&self, exchange_id: ExchangeId) -> ExchangeTransitionResult {
        match self {
            Self::AwaitingReply(active) if *active != exchange_id => {
                Err(ExchangeRejection::AlreadyAwaiting {
                    active: *active,
                    attempted: exchange_id,
                })
            }
            Self::AwaitingReply(_) => Ok(self.clone()),
            Self::Idle | Self::Done(_) | Self::Failed { .. } => {
                Ok(Self::AwaitingReply(exchange_id))
            }
        }
    }

    fn apply_complete(&self, exchange_id: ExchangeId) -> ExchangeTransitionResult {
        match self {
            Self::AwaitingReply(active) if *active == exchange_id => Ok(Self::Done(exchange_id)),
            Self::AwaitingReply(active) => Err(ExchangeRejection::ExchangeMismatch {
                active: *active,
                attempted: exchange_id,
            }),
            Self::Idle | Self::Done(_) | Self::Failed { .. } => {
                Err(ExchangeRejection::NoActiveExchange)
            }
        }
    }

    fn apply_fail(&self, exchange_id: ExchangeId, message: String) -> ExchangeTransitionResult {
        match self {
            Self::AwaitingReply(active) if *active == exchange_id => Ok(Self::Failed {
                exchange_id,
                message,
            }),
            Self::AwaitingReply(active) => Err(ExchangeRejection::ExchangeMismatch {
                active: *active,
                attempted: exchange_id,
            }),
            Self::Idle | Self::Done(_) | Self::Failed { .. } => {
                Err(ExchangeRejection::NoActiveExchange)
            }
        }
    }
}

/// Session aggregate for the single chat panel.
///
/// Holds the append-only message sequence, the exchange machine, and the
/// single-slot teach-back question. The slot replaces a process-wide
/// mutable global: at most one unanswered question is tracked, and a new
/// learn trigger displaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatSession {
    pub messages: Vec<Message>,
    pub exchange_state: ExchangeState,
    pending_learn: Option<String>,
}

impl ChatSession {
    /// Creates an empty session in idle state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message to the panel sequence.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Applies a deterministic exchange transition.
    pub fn apply_exchange_transition(
        &mut self,
        transition: ExchangeTransition,
    ) -> ExchangeTransitionResult {
        let next_state = self.exchange_state.apply(transition)?;
        self.exchange_state = next_state.clone();
        Ok(next_state)
    }

    /// Records the question the service could not answer, returning the
    /// question it displaces (last write wins).
    pub fn set_pending_learn(&mut self, question: impl Into<String>) -> Option<String> {
        self.pending_learn.replace(question.into())
    }

    /// Takes the pending question out of the slot at submission time. A
    /// failed submission does not restore it; a dismissed prompt never calls
    /// this, so the question survives for the next trigger.
    pub fn take_pending_learn(&mut self) -> Option<String> {
        self.pending_learn.take()
    }

    pub fn pending_learn(&self) -> Option<&str> {
        self.pending_learn.as_deref()
    }

    /// Clears the panel: messages, exchange state, and the teach-back slot.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.exchange_state = ExchangeState::Idle;
        self.pending_learn = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_indicator_round_trip_leaves_it_hidden() {
        let mut indicator = TypingIndicator::default();
        assert!(indicator.show());
        assert!(indicator.is_shown());
        assert!(indicator.dismiss());
        assert!(!indicator.is_shown());
    }

    #[test]
    fn typing_indicator_rejects_a_second_show() {
        let mut indicator = TypingIndicator::default();
        assert!(indicator.show());
        assert!(!indicator.show());
        assert!(indicator.is_shown());
    }

    #[test]
    fn typing_indicator_dismiss_without_show_is_a_no_op() {
        let mut indicator = TypingIndicator::default();
        assert!(!indicator.dismiss());
        assert!(!indicator.is_shown());
    }

    #[test]
    fn begin_is_rejected_while_an_exchange_is_awaiting() {
        let state = ExchangeState::AwaitingReply(ExchangeId::new(1));
        let rejection = state
            .apply(ExchangeTransition::Begin(ExchangeId::new(2)))
            .unwrap_err();
        assert_eq!(
            rejection,
            ExchangeRejection::AlreadyAwaiting {
                active: ExchangeId::new(1),
                attempted: ExchangeId::new(2),
            }
        );
    }

    #[test]
    fn settlements_must_match_the_active_exchange() {
        let state = ExchangeState::AwaitingReply(ExchangeId::new(7));
        assert!(state.accepts_settlement(ExchangeId::new(7)));
        assert!(!state.accepts_settlement(ExchangeId::new(8)));

        let rejection = state
            .apply(ExchangeTransition::Complete(ExchangeId::new(8)))
            .unwrap_err();
        assert_eq!(
            rejection,
            ExchangeRejection::ExchangeMismatch {
                active: ExchangeId::new(7),
                attempted: ExchangeId::new(8),
            }
        );
    }

    #[test]
    fn settlement_without_an_active_exchange_is_rejected() {
        let rejection = ExchangeState::Idle
            .apply(ExchangeTransition::Complete(ExchangeId::new(1)))
            .unwrap_err();
        assert_eq!(rejection, ExchangeRejection::NoActiveExchange);
    }

    #[test]
    fn settled_states_may_begin_the_next_exchange() {
        for state in [
            ExchangeState::Idle,
            ExchangeState::Done(ExchangeId::new(1)),
            ExchangeState::Failed {
                exchange_id: ExchangeId::new(2),
                message: "boom".into(),
            },
        ] {
            let next = state
                .apply(ExchangeTransition::Begin(ExchangeId::new(9)))
                .unwrap();
            assert_eq!(next, ExchangeState::AwaitingReply(ExchangeId::new(9)));
        }
    }

    #[test]
    fn full_exchange_lifecycle_completes() {
        let mut session = ChatSession::new();
        session
            .apply_exchange_transition(ExchangeTransition::Begin(ExchangeId::new(1)))
            .unwrap();
        assert_eq!(
            session.exchange_state.active_exchange(),
            Some(ExchangeId::new(1))
        );

        session
            .apply_exchange_transition(ExchangeTransition::Complete(ExchangeId::new(1)))
            .unwrap();
        assert_eq!(session.exchange_state, ExchangeState::Done(ExchangeId::new(1)));
    }

    #[test]
    fn learn_slot_overwrite_returns_the_displaced_question() {
        let mut session = ChatSession::new();
        assert_eq!(session.set_pending_learn("first?"), None);
        assert_eq!(
            session.set_pending_learn("second?"),
            Some("first?".to_string())
        );
        assert_eq!(session.pending_learn(), Some("second?"));
    }

    #[test]
    fn learn_slot_take_clears_but_dismissal_keeps_it() {
        let mut session = ChatSession::new();
        session.set_pending_learn("What is X?");

        // A dismissed prompt never takes the slot, so the question survives.
        assert_eq!(session.pending_learn(), Some("What is X?"));

        assert_eq!(session.take_pending_learn(), Some("What is X?".to_string()));
        assert_eq!(session.pending_learn(), None);
        assert_eq!(session.take_pending_learn(), None);
    }

    #[test]
    fn clear_drops_messages_state_and_learn_slot() {
        let mut session = ChatSession::new();
        session.push_message(Message::user(MessageId::new(1), "hello"));
        session.push_message(Message::bot(MessageId::new(2), "hi"));
        session.set_pending_learn("pending?");
        session
            .apply_exchange_transition(ExchangeTransition::Begin(ExchangeId::new(3)))
            .unwrap();

        session.clear();

        assert!(session.messages.is_empty());
        assert_eq!(session.exchange_state, ExchangeState::Idle);
        assert_eq!(session.pending_learn(), None);
    }
}
