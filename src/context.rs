//! Per-request context slot.

/// State that lives exactly as long as one request.
///
/// A fresh, empty context is created with every [`Request`](crate::Request)
/// and dropped once its response is written. It is never pooled or shared
/// between requests, so one caller's correlation id cannot reach another
/// caller's response.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequestContext {
    correlation_id: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context carrying `id` as its correlation id.
    pub fn with_correlation_id(id: impl Into<String>) -> Self {
        Self { correlation_id: Some(id.into()) }
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}
