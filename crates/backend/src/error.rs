use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum BackendError {
    #[snafu(display("backend endpoint URL '{endpoint}' is invalid"))]
    InvalidEndpoint {
        stage: &'static str,
        endpoint: String,
    },
    #[snafu(display("backend request failed at {stage}: {source}"))]
    RequestFailed {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("backend returned HTTP {status} at {stage}"))]
    UnexpectedStatus {
        stage: &'static str,
        status: u16,
        body: String,
    },
    #[snafu(display("backend reply at {stage} was malformed: {source}"))]
    MalformedReply {
        stage: &'static str,
        body: String,
        source: serde_json::Error,
    },
}

pub type BackendResult<T> = Result<T, BackendError>;

impl BackendError {
    /// True when the failure happened on the wire rather than in the payload.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::RequestFailed { .. })
    }
}
