//! Error types returned by every client operation.
//!
//! A non-success HTTP status always surfaces as [`DavError::Fault`] carrying the
//! reason phrase, the numeric status and the raw response body. Cancellation,
//! transport failures and malformed XML are separate variants so callers can
//! branch on them without inspecting status codes.

use std::fmt;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::{Response, StatusCode};
use tracing::{debug, warn};

use crate::common::compression::{decompress_body, detect_encodings};
use crate::common::http::{DavBody, full_body};
use crate::webdav::xml::XmlError;

pub type DavResult<T> = std::result::Result<T, DavError>;

/// A failed WebDAV request: the server answered with a status outside `2xx`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebDavFault {
    pub reason_phrase: String,
    pub status_code: u16,
    pub body: String,
}

impl WebDavFault {
    pub fn new(reason_phrase: impl Into<String>, status_code: u16, body: impl Into<String>) -> Self {
        Self {
            reason_phrase: reason_phrase.into(),
            status_code,
            body: body.into(),
        }
    }

    /// Typed view of [`WebDavFault::status_code`].
    pub fn status(&self) -> Option<StatusCode> {
        StatusCode::from_u16(self.status_code).ok()
    }
}

impl fmt::Display for WebDavFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status_code, self.reason_phrase)?;
        if !self.body.is_empty() {
            write!(f, ": {}", self.body)?;
        }
        Ok(())
    }
}

impl std::error::Error for WebDavFault {}

#[derive(thiserror::Error, Debug)]
pub enum DavError {
    #[error("WebDAV request failed with {0}")]
    Fault(WebDavFault),

    #[error("operation cancelled")]
    Cancelled,

    #[error("request timed out")]
    Timeout,

    #[error("invalid resource URI: {0}")]
    InvalidUri(#[from] hyper::http::uri::InvalidUri),

    #[error("malformed XML: {0}")]
    Xml(#[from] XmlError),

    #[error("invalid request: {0}")]
    Http(#[from] hyper::http::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] hyper::header::InvalidHeaderValue),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl DavError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DavError::Cancelled)
    }

    /// The fault carried by this error, if the server rejected the request.
    pub fn fault(&self) -> Option<&WebDavFault> {
        match self {
            DavError::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

impl From<WebDavFault> for DavError {
    fn from(fault: WebDavFault) -> Self {
        DavError::Fault(fault)
    }
}

/// Reason phrase sent by the server, falling back to the canonical one.
pub(crate) fn reason_phrase<B>(response: &Response<B>) -> String {
    if let Some(reason) = response.extensions().get::<hyper::ext::ReasonPhrase>() {
        return String::from_utf8_lossy(reason.as_bytes()).into_owned();
    }
    response
        .status()
        .canonical_reason()
        .unwrap_or_default()
        .to_string()
}

/// Consume a failed response and turn it into a [`WebDavFault`].
///
/// The body is read to the end as text, after undoing any `Content-Encoding`.
/// A body that cannot be read yields an empty text rather than masking the
/// status; one that cannot be decoded is kept as received.
pub(crate) async fn fault_from_response(response: Response<DavBody>) -> WebDavFault {
    let reason = reason_phrase(&response);
    let status = response.status().as_u16();
    let encodings = detect_encodings(response.headers());
    let raw = match response.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(_) => Bytes::new(),
    };
    let body = if encodings.is_empty() || raw.is_empty() {
        raw
    } else {
        match decompress_body(full_body(raw.clone()), &encodings).await {
            Ok(decoded) => decoded,
            Err(e) => {
                debug!(error = %e, "fault body could not be decoded, keeping raw bytes");
                raw
            }
        }
    };
    let fault = WebDavFault::new(reason, status, String::from_utf8_lossy(&body));
    warn!(status = fault.status_code, reason = %fault.reason_phrase, "WebDAV request failed");
    fault
}

/// Pass successful responses through, map everything else to a fault.
pub(crate) async fn ensure_success(response: Response<DavBody>) -> DavResult<Response<DavBody>> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(DavError::Fault(fault_from_response(response).await))
    }
}
