pub mod contract;
pub mod error;
pub mod http;

pub use contract::{ChatReply, ChatTurnRequest, LearnReply, LearnSubmission};
pub use error::{BackendError, BackendResult};
pub use http::{BackendConfig, BoxFuture, ChatBackend, HttpBackend};
