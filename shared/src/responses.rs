use serde::Serialize;

/// The uniform error body shape returned by every JSON endpoint: a short
/// machine-matchable `error` code and a human-readable `message`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
