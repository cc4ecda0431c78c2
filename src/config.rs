//! Client configuration: server base, credentials and TLS trust policy.

use std::env;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use hyper::Uri;
use hyper::header::HeaderValue;

use crate::error::{DavError, DavResult};

/// User, password and (optional) Windows-style domain.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
    pub domain: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .field("domain", &self.domain)
            .finish()
    }
}

impl Credentials {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
            domain: domain.into(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.user.is_empty() && self.password.is_empty()
    }

    /// Account name as the server expects it: `DOMAIN\user` when a domain is set.
    pub fn account(&self) -> String {
        if self.domain.is_empty() {
            self.user.clone()
        } else {
            format!("{}\\{}", self.domain, self.user)
        }
    }

    /// Pre-emptive `Authorization` header value, `None` for anonymous access.
    pub fn authorization_header(&self) -> DavResult<Option<HeaderValue>> {
        if self.is_anonymous() {
            return Ok(None);
        }
        let token = format!("{}:{}", self.account(), self.password);
        let mut value = HeaderValue::from_str(&format!("Basic {}", B64.encode(token)))?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

/// Whether server certificates are checked against the trust store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsPolicy {
    #[default]
    Verify,
    /// Accept self-signed or otherwise invalid certificates.
    AcceptInvalidCerts,
}

#[derive(Debug, Clone)]
pub struct WebDavConfig {
    /// Server base the escaped resource paths are appended to.
    pub server: String,
    pub credentials: Credentials,
    pub tls: TlsPolicy,
    /// Per-request timeout. `None` leaves timing to the caller's cancellation token.
    pub timeout: Option<Duration>,
}

impl WebDavConfig {
    pub fn new(server: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            server: server.into(),
            credentials,
            tls: TlsPolicy::Verify,
            timeout: None,
        }
    }

    pub fn with_tls(mut self, tls: TlsPolicy) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether the pre-emptive Basic credentials would travel over plain `http://`.
    pub fn sends_plaintext_credentials(&self) -> bool {
        !self.credentials.is_anonymous()
            && self
                .server
                .trim_start()
                .get(..7)
                .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http://"))
    }

    /// Build a configuration from `WEBDAV_*` environment variables.
    ///
    /// A `.env` file in the working directory (or a parent) is loaded first if
    /// present. Recognised variables:
    ///
    /// * `WEBDAV_SERVER` (required)
    /// * `WEBDAV_USER`, `WEBDAV_PASSWORD`, `WEBDAV_DOMAIN`
    /// * `WEBDAV_IGNORE_CERT_ERRORS` (`1`, `true` or `yes`)
    /// * `WEBDAV_TIMEOUT_SECS`
    pub fn from_env() -> DavResult<Self> {
        dotenvy::dotenv().ok();

        let server = env::var("WEBDAV_SERVER")
            .map_err(|_| DavError::Config("WEBDAV_SERVER is not set".to_string()))?;
        let credentials = Credentials::new(
            env::var("WEBDAV_USER").unwrap_or_default(),
            env::var("WEBDAV_PASSWORD").unwrap_or_default(),
            env::var("WEBDAV_DOMAIN").unwrap_or_default(),
        );

        let tls = match env::var("WEBDAV_IGNORE_CERT_ERRORS") {
            Ok(v) if parse_flag(&v) => TlsPolicy::AcceptInvalidCerts,
            _ => TlsPolicy::Verify,
        };

        let timeout = match env::var("WEBDAV_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    DavError::Config(format!("WEBDAV_TIMEOUT_SECS is not a number: {raw}"))
                })?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        let config = Self {
            server,
            credentials,
            tls,
            timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// The server base must be an absolute `http(s)` URI.
    pub fn validate(&self) -> DavResult<()> {
        let uri: Uri = self.server.parse()?;
        match uri.scheme_str() {
            Some("http") | Some("https") => {}
            _ => {
                return Err(DavError::Config(format!(
                    "server must use http or https: {}",
                    self.server
                )));
            }
        }
        if uri.authority().is_none() {
            return Err(DavError::Config(format!(
                "server has no host: {}",
                self.server
            )));
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
