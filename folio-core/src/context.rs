/// Per-call context handed to services and hooks.
///
/// Carries the request id assigned by the transport so that log lines
/// emitted deep inside a service can be correlated with the HTTP request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    pub fn new<S: Into<String>>(request_id: S) -> Self {
        Self {
            request_id: request_id.into(),
        }
    }

    /// Context for calls that do not originate from a request
    /// (startup seeding, background maintenance, tests).
    pub fn internal() -> Self {
        Self::new("internal")
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::internal()
    }
}
