use serde::{Deserialize, Serialize};

/// Request body for `POST /chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurnRequest {
    pub message: String,
}

impl ChatTurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for `POST /chat`.
///
/// `response` is mandatory; a reply without it is malformed rather than a
/// turn that renders as literal "undefined". A missing `learn` field means
/// the service has nothing to learn.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub learn: bool,
}

/// Request body for `POST /learn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LearnSubmission {
    pub question: String,
    pub answer: String,
}

impl LearnSubmission {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Response body for `POST /learn`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LearnReply {
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_turn_request_serializes_to_wire_shape() {
        let body = serde_json::to_string(&ChatTurnRequest::new("what is rust?")).unwrap();
        assert_eq!(body, r#"{"message":"what is rust?"}"#);
    }

    #[test]
    fn chat_reply_deserializes_both_fields() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"response":"Hi there!","learn":false}"#).unwrap();
        assert_eq!(reply.response, "Hi there!");
        assert!(!reply.learn);
    }

    #[test]
    fn chat_reply_missing_learn_defaults_to_false() {
        let reply: ChatReply = serde_json::from_str(r#"{"response":"ok"}"#).unwrap();
        assert!(!reply.learn);
    }

    #[test]
    fn chat_reply_missing_response_is_rejected() {
        let result = serde_json::from_str::<ChatReply>(r#"{"learn":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn learn_submission_serializes_to_wire_shape() {
        let body =
            serde_json::to_string(&LearnSubmission::new("What is X?", "X is Y")).unwrap();
        assert_eq!(body, r#"{"question":"What is X?","answer":"X is Y"}"#);
    }

    #[test]
    fn learn_reply_requires_response() {
        assert!(serde_json::from_str::<LearnReply>(r#"{}"#).is_err());

        let reply: LearnReply =
            serde_json::from_str(r#"{"response":"Thanks! Learned something new."}"#).unwrap();
        assert_eq!(reply.response, "Thanks! Learned something new.");
    }
}
