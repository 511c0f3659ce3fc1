//! `Strict-Transport-Security` on every response.

use http::header::{HeaderValue, STRICT_TRANSPORT_SECURITY};

use crate::context::RequestContext;
use crate::middleware::Middleware;
use crate::response::Response;

/// One day, subdomains included.
pub const HSTS_VALUE: &str = "max-age=86400; includeSubDomains";

/// Stamps the HSTS directive on every outgoing response, denials included.
#[derive(Clone, Copy, Debug, Default)]
pub struct SecurityHeaderInjector;

impl SecurityHeaderInjector {
    /// Sets the header, replacing any value a handler may have set.
    pub fn inject(res: &mut Response) {
        res.set_header(STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS_VALUE));
    }
}

impl Middleware for SecurityHeaderInjector {
    fn after(&self, _ctx: &RequestContext, res: &mut Response) {
        Self::inject(res);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Status;

    #[test]
    fn inject_twice_leaves_one_header() {
        let mut res = Response::text("ok");
        SecurityHeaderInjector::inject(&mut res);
        SecurityHeaderInjector::inject(&mut res);

        let values: Vec<&str> = res.headers()
            .get_all(STRICT_TRANSPORT_SECURITY)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, [HSTS_VALUE]);
    }

    #[test]
    fn replaces_handler_supplied_value() {
        let mut res = Response::builder()
            .header("strict-transport-security", "max-age=0")
            .no_body();
        SecurityHeaderInjector.after(&RequestContext::new(), &mut res);
        assert_eq!(res.header("strict-transport-security"), Some(HSTS_VALUE));
    }

    #[test]
    fn applies_to_error_responses() {
        let mut res = Response::status(Status::Forbidden);
        SecurityHeaderInjector.after(&RequestContext::new(), &mut res);
        assert_eq!(res.header("Strict-Transport-Security"), Some(HSTS_VALUE));
    }
}
