//! Origin checking for protected routes.
//!
//! Requests under a protected path prefix must say where they come from,
//! through `Origin` or (optionally) `Referer`, and that origin must pass the
//! enabled checks. Checks run in a fixed order:
//!
//! 1. path not protected → allowed, nothing else is looked at
//! 2. no `Origin` (and no `Referer` when falling back) → denied
//! 3. value without a `scheme://authority` → denied
//! 4. host match on and authority ≠ `Host` → denied
//! 5. allow-list on and authority not listed → denied
//!
//! Host match always runs before the allow-list; reordering them changes
//! which requests get through.
//!
//! Authorities are compared as plain strings. `example.com` and
//! `example.com:443` are different values, and so are `Example.com` and
//! `example.com`. List every spelling a deployment expects to see.

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Arc;

use http::header::{HeaderName, ORIGIN, REFERER};
use http::uri::{Authority, Scheme};
use tracing::{debug, info};

use crate::middleware::Middleware;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Body of every denial. Deliberately says nothing about which check failed.
pub const ACCESS_DENIED_BODY: &str = r#"{"error":"access denied"}"#;

// ── Policy ────────────────────────────────────────────────────────────────────

/// Which requests are checked and how. Immutable once built.
///
/// Build with [`GuardPolicy::builder`] at startup and share it between
/// workers through an [`Arc`].
#[derive(Clone, Debug)]
pub struct GuardPolicy {
    protected_prefixes: Vec<String>,
    referer_fallback: bool,
    enforce_host_match: bool,
    enforce_allow_list: bool,
    allowed_origins: HashSet<String>,
}

impl GuardPolicy {
    pub fn builder() -> GuardPolicyBuilder {
        GuardPolicyBuilder::default()
    }

    /// Whether `path` falls under any protected prefix.
    pub fn protects(&self, path: &str) -> bool {
        self.protected_prefixes.iter().any(|p| path.starts_with(p.as_str()))
    }

    pub fn protected_prefixes(&self) -> &[String] { &self.protected_prefixes }
    pub fn referer_fallback(&self) -> bool { self.referer_fallback }
    pub fn enforce_host_match(&self) -> bool { self.enforce_host_match }
    pub fn enforce_allow_list(&self) -> bool { self.enforce_allow_list }
    pub fn allowed_origins(&self) -> &HashSet<String> { &self.allowed_origins }
}

impl Default for GuardPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Builder for [`GuardPolicy`].
///
/// Defaults: `/api` protected, referer fallback on, host match on,
/// allow-list on and empty.
#[derive(Clone, Debug)]
pub struct GuardPolicyBuilder {
    protected_prefixes: Vec<String>,
    referer_fallback: bool,
    enforce_host_match: bool,
    enforce_allow_list: bool,
    allowed_origins: HashSet<String>,
}

impl Default for GuardPolicyBuilder {
    fn default() -> Self {
        Self {
            protected_prefixes: vec!["/api".to_owned()],
            referer_fallback: true,
            enforce_host_match: true,
            enforce_allow_list: true,
            allowed_origins: HashSet::new(),
        }
    }
}

impl GuardPolicyBuilder {
    /// Replaces the protected prefixes.
    pub fn protected_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protected_prefixes.clear();
        for prefix in prefixes {
            let prefix = prefix.into();
            if !self.protected_prefixes.contains(&prefix) {
                self.protected_prefixes.push(prefix);
            }
        }
        self
    }

    pub fn referer_fallback(mut self, on: bool) -> Self {
        self.referer_fallback = on;
        self
    }

    pub fn enforce_host_match(mut self, on: bool) -> Self {
        self.enforce_host_match = on;
        self
    }

    pub fn enforce_allow_list(mut self, on: bool) -> Self {
        self.enforce_allow_list = on;
        self
    }

    /// Adds `host[:port]` authorities to the allow-list.
    pub fn allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_origins.extend(origins.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> GuardPolicy {
        GuardPolicy {
            protected_prefixes: self.protected_prefixes,
            referer_fallback: self.referer_fallback,
            enforce_host_match: self.enforce_host_match,
            enforce_allow_list: self.enforce_allow_list,
            allowed_origins: self.allowed_origins,
        }
    }
}

// ── Decision ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum DenyReason {
    #[error("missing origin")]
    MissingOrigin,
    #[error("malformed origin")]
    MalformedOrigin,
    #[error("host mismatch")]
    HostMismatch,
    #[error("origin not allowed")]
    NotAllowed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OriginDecision {
    Allowed,
    Denied(DenyReason),
}

impl OriginDecision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

// ── Guard ─────────────────────────────────────────────────────────────────────

/// Rejects protected-path requests whose origin is missing or untrusted.
pub struct OriginGuard {
    policy: Arc<GuardPolicy>,
    denied: Response,
}

impl OriginGuard {
    pub fn new(policy: impl Into<Arc<GuardPolicy>>) -> Self {
        let denied = Response::builder()
            .status(Status::Forbidden)
            .json(ACCESS_DENIED_BODY);
        Self { policy: policy.into(), denied }
    }

    pub fn policy(&self) -> &GuardPolicy {
        &self.policy
    }

    /// Decides whether `req` may proceed.
    pub fn evaluate(&self, req: &Request) -> OriginDecision {
        let policy = &*self.policy;
        if !policy.protects(req.path()) {
            return OriginDecision::Allowed;
        }

        let Some(origin) = claimed_origin(req, policy.referer_fallback) else {
            return OriginDecision::Denied(DenyReason::MissingOrigin);
        };
        let Some(claimed) = authority(origin) else {
            return OriginDecision::Denied(DenyReason::MalformedOrigin);
        };

        if policy.enforce_host_match && req.host() != Some(claimed) {
            debug!(origin = claimed, host = req.host(), "origin does not match host");
            return OriginDecision::Denied(DenyReason::HostMismatch);
        }
        if policy.enforce_allow_list && !policy.allowed_origins.contains(claimed) {
            return OriginDecision::Denied(DenyReason::NotAllowed);
        }
        OriginDecision::Allowed
    }

    /// The 403 returned for every denial.
    pub fn denied_response(&self) -> Response {
        self.denied.clone()
    }
}

impl Middleware for OriginGuard {
    fn before(&self, req: &mut Request) -> ControlFlow<Response> {
        match self.evaluate(req) {
            OriginDecision::Allowed => ControlFlow::Continue(()),
            OriginDecision::Denied(reason) => {
                info!(
                    request_id = req.request_id().unwrap_or("-"),
                    path = req.path(),
                    %reason,
                    "origin check denied request",
                );
                ControlFlow::Break(self.denied_response())
            }
        }
    }
}

/// `Origin`, or `Referer` when allowed to fall back. A header that is present
/// but not visible ASCII counts as present and empty, so it fails parsing
/// instead of being skipped.
fn claimed_origin(req: &Request, referer_fallback: bool) -> Option<&str> {
    let read = |name: HeaderName| req.headers().get(name).map(|v| v.to_str().unwrap_or(""));

    if let Some(origin) = read(ORIGIN) {
        debug!(origin, "origin header");
        return Some(origin);
    }
    if referer_fallback {
        let referer = read(REFERER)?;
        debug!(referer, "no origin header, using referer");
        return Some(referer);
    }
    None
}

/// The `host[:port]` part of an absolute URL, userinfo removed.
///
/// Only `scheme://authority` is validated; whatever follows the first `/`,
/// `?` or `#` is ignored, so a `Referer` with an odd query still yields its
/// authority. `None` for anything without both a scheme and an authority,
/// including `null` and bare hostnames.
pub fn authority(value: &str) -> Option<&str> {
    let (scheme, rest) = value.split_once("://")?;
    if scheme.is_empty() || scheme.parse::<Scheme>().is_err() {
        return None;
    }

    let end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let raw = &rest[..end];
    raw.parse::<Authority>().ok()?;

    let host_port = raw.rsplit_once('@').map_or(raw, |(_, hp)| hp);
    (!host_port.is_empty()).then_some(host_port)
}
