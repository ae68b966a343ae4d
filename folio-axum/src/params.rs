use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode, Uri};

/// Success status a service picked for its REST response.
///
/// Clones share one slot, so a service can set it on the params it was
/// handed and the router reads it back after the call.
#[derive(Debug, Clone, Default)]
pub struct ResponseStatus(Arc<AtomicU16>);

impl ResponseStatus {
    pub fn set(&self, status: StatusCode) {
        self.0.store(status.as_u16(), Ordering::Relaxed);
    }

    /// The chosen status, or `default` when none was set.
    pub fn or(&self, default: StatusCode) -> StatusCode {
        StatusCode::from_u16(self.0.load(Ordering::Relaxed)).unwrap_or(default)
    }
}

/// What the REST layer knows about a request, handed to services as params.
#[derive(Debug, Clone, Default)]
pub struct RestParams {
    pub provider: String,
    pub headers: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub method: String,
    pub path: String,
    pub status: ResponseStatus,
}

impl RestParams {
    pub fn from_parts(
        provider: &str,
        headers: &HeaderMap,
        query: HashMap<String, String>,
        method: &str,
        uri: &Uri,
    ) -> Self {
        let mut out = Self {
            provider: provider.to_string(),
            headers: HashMap::new(),
            query,
            method: method.to_string(),
            path: uri.path().to_string(),
            status: ResponseStatus::default(),
        };

        for (k, v) in headers.iter() {
            if let Ok(s) = v.to_str() {
                out.headers.insert(k.to_string(), s.to_string());
            }
        }

        out
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

pub trait FromRestParams: Sized {
    fn from_rest_params(params: RestParams) -> Self;
}

impl FromRestParams for RestParams {
    fn from_rest_params(params: RestParams) -> Self {
        params
    }
}

impl FromRestParams for () {
    fn from_rest_params(_params: RestParams) -> Self {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_set_through_a_clone_is_seen_by_the_original() {
        let params = RestParams::default();
        assert_eq!(params.status.or(StatusCode::CREATED), StatusCode::CREATED);

        params.clone().status.set(StatusCode::OK);
        assert_eq!(params.status.or(StatusCode::CREATED), StatusCode::OK);
    }

    #[test]
    fn header_lookup_is_by_lowercase_name() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-Id", "abc".parse().unwrap());
        let params = RestParams::from_parts("rest", &headers, HashMap::new(), "GET", &Uri::from_static("/api/navbar"));

        assert_eq!(params.header("x-request-id"), Some("abc"));
        assert_eq!(params.path, "/api/navbar");
    }
}
