//! Process-wide security settings.
//!
//! Read once at startup, from code or a TOML file, then turned into the
//! immutable [`GuardPolicy`] and middleware stages:
//!
//! ```toml
//! origin_check = true
//! use_referer_as_fallback = true
//! check_origin_against_host = true
//! check_origin_against_allowed_origins = true
//! allowed_origins = ["localhost:8443", "foobar.com"]
//! generate_request_id = true
//! protected_prefixes = ["/api"]
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above, with
//! an empty allow-list.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::Error;
use crate::middleware::{GuardPolicy, OriginGuard, RequestCorrelator, SecurityHeaderInjector};
use crate::router::Router;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// Registers the origin guard at all. Off means no origin checks run.
    pub origin_check: bool,
    pub use_referer_as_fallback: bool,
    pub check_origin_against_host: bool,
    pub check_origin_against_allowed_origins: bool,
    /// `host[:port]` authorities, no scheme.
    pub allowed_origins: Vec<String>,
    pub generate_request_id: bool,
    pub protected_prefixes: Vec<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            origin_check: true,
            use_referer_as_fallback: true,
            check_origin_against_host: true,
            check_origin_against_allowed_origins: true,
            allowed_origins: Vec::new(),
            generate_request_id: true,
            protected_prefixes: vec!["/api".to_owned()],
        }
    }
}

impl SecurityConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), "loaded security config");
        Ok(config)
    }

    /// Rejects values that could never match a request.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(prefix) = self.protected_prefixes.iter().find(|p| !p.starts_with('/')) {
            return Err(Error::InvalidConfig(format!(
                "protected prefix `{prefix}` must start with `/`"
            )));
        }
        for origin in &self.allowed_origins {
            if origin.is_empty() || origin.contains('/') || origin.contains('@') {
                return Err(Error::InvalidConfig(format!(
                    "allowed origin `{origin}` must be a bare host[:port]"
                )));
            }
        }
        Ok(())
    }

    pub fn policy(&self) -> GuardPolicy {
        GuardPolicy::builder()
            .protected_prefixes(self.protected_prefixes.iter().cloned())
            .referer_fallback(self.use_referer_as_fallback)
            .enforce_host_match(self.check_origin_against_host)
            .enforce_allow_list(self.check_origin_against_allowed_origins)
            .allowed_origins(self.allowed_origins.iter().cloned())
            .build()
    }

    /// Registers the security stages on `router`.
    ///
    /// Order: request ids first so denials carry one, then the origin guard
    /// (when enabled), then HSTS.
    pub fn install(&self, router: Router) -> Router {
        let mut router = router.layer(RequestCorrelator::new(self.generate_request_id));
        if self.origin_check {
            router = router.layer(OriginGuard::new(self.policy()));
        }
        router.layer(SecurityHeaderInjector)
    }
}
