use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use hyper::HeaderMap;
use hyper::body::Body;
use tokio_util::io::StreamReader;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::common::http::DavBody;
use crate::webdav::names;
use crate::webdav::xml::{XName, XmlDocument, XmlElement};

/// WebDAV Depth
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Depth {
    Zero,
    #[default]
    One,
    Infinity,
}

impl Depth {
    pub fn as_str(self) -> &'static str {
        match self {
            Depth::Zero => "0",
            Depth::One => "1",
            Depth::Infinity => "infinity",
        }
    }
}

/// Methods and DAV compliance classes advertised by `OPTIONS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DavOptions {
    pub allow: Vec<String>,
    pub dav: Vec<String>,
}

impl DavOptions {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            allow: split_header_list(headers, "Allow"),
            dav: split_header_list(headers, "DAV"),
        }
    }

    pub fn allows(&self, method: &str) -> bool {
        self.allow.iter().any(|m| m.eq_ignore_ascii_case(method))
    }

    pub fn supports_class(&self, class: &str) -> bool {
        self.dav.iter().any(|c| c == class)
    }
}

/// Comma-split, trimmed, non-empty tokens of every occurrence of `name`.
fn split_header_list(headers: &HeaderMap, name: &str) -> Vec<String> {
    headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Body of a `GET`, streamed as it arrives.
pub struct DownloadStream {
    body: DavBody,
    content_length: Option<u64>,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
    finished: bool,
}

impl DownloadStream {
    pub(crate) fn new(body: DavBody, content_length: Option<u64>, cancel: &CancellationToken) -> Self {
        Self {
            body,
            content_length,
            cancelled: Box::pin(cancel.clone().cancelled_owned()),
            finished: false,
        }
    }

    /// Length announced by `Content-Length`, if the server sent one.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    pub fn into_async_read(self) -> StreamReader<Self, Bytes> {
        StreamReader::new(self)
    }

    /// Read the remaining body into memory.
    pub async fn bytes(mut self) -> io::Result<Bytes> {
        let capacity = self.content_length.unwrap_or(0).min(64 * 1024 * 1024) as usize;
        let mut out = BytesMut::with_capacity(capacity);
        while let Some(chunk) = self.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out.freeze())
    }
}

impl Stream for DownloadStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        if this.cancelled.as_mut().poll(cx).is_ready() {
            this.finished = true;
            return Poll::Ready(Some(Err(io::Error::new(
                io::ErrorKind::Interrupted,
                "download cancelled",
            ))));
        }
        loop {
            match ready!(Pin::new(&mut this.body).poll_frame(cx)) {
                None => {
                    this.finished = true;
                    return Poll::Ready(None);
                }
                Some(Err(err)) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(err)));
                }
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        return Poll::Ready(Some(Ok(data)));
                    }
                }
            }
        }
    }
}

/// One `<response>` of a multi-status body, flattened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DavResource {
    pub href: String,
    pub status: Option<String>,
    pub displayname: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub content_language: Option<String>,
    pub creation_date: Option<String>,
    pub last_modified: Option<String>,
    pub etag: Option<String>,
    pub is_collection: bool,
    pub is_hidden: bool,
}

/// Flatten every `<response>` in a multi-status document.
///
/// Properties are only read from `<propstat>` blocks whose status is `2xx`
/// (or that carry no status at all).
pub fn map_resources(doc: &XmlDocument) -> Vec<DavResource> {
    doc.descendants(&names::RESPONSE).map(map_response).collect()
}

fn map_response(response: &XmlElement) -> DavResource {
    let mut item = DavResource {
        href: response
            .element(&names::HREF)
            .map(|h| h.text().trim().to_string())
            .unwrap_or_default(),
        status: response
            .element(&names::STATUS)
            .map(|s| s.text().trim().to_string()),
        ..DavResource::default()
    };

    for propstat in response.elements(&names::PROPSTAT) {
        let status = propstat
            .element(&names::STATUS)
            .map(|s| s.text().trim().to_string());
        if item.status.is_none() {
            item.status = status.clone();
        }
        if status.as_deref().is_some_and(|s| !is_success_status_line(s)) {
            continue;
        }
        for prop in propstat.elements(&names::PROP) {
            apply_props(&mut item, prop);
        }
    }

    item
}

fn apply_props(item: &mut DavResource, prop: &XmlElement) {
    let text = |name: &XName| {
        prop.element(name)
            .map(|e| e.text().trim().to_string())
            .filter(|s| !s.is_empty())
    };

    if let Some(v) = text(&names::DISPLAY_NAME) {
        item.displayname = Some(v);
    }
    if let Some(v) = text(&names::GET_CONTENT_TYPE) {
        item.content_type = Some(v);
    }
    if let Some(v) = text(&names::GET_CONTENT_LENGTH) {
        item.content_length = v.parse().ok();
    }
    if let Some(v) = text(&names::GET_CONTENT_LANGUAGE) {
        item.content_language = Some(v);
    }
    if let Some(v) = text(&names::CREATION_DATE) {
        item.creation_date = Some(v);
    }
    if let Some(v) = text(&names::GET_LAST_MODIFIED) {
        item.last_modified = Some(v);
    }
    if let Some(v) = text(&names::GET_ETAG) {
        item.etag = Some(v);
    }
    if let Some(v) = text(&names::IS_COLLECTION) {
        item.is_collection |= is_truthy(&v);
    }
    if let Some(v) = text(&names::IS_HIDDEN) {
        item.is_hidden = is_truthy(&v);
    }
    if prop
        .element(&names::RESOURCE_TYPE)
        .is_some_and(|rt| rt.element(&names::COLLECTION).is_some())
    {
        item.is_collection = true;
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// `HTTP/1.1 200 OK` → true, `HTTP/1.1 404 Not Found` → false.
pub fn is_success_status_line(line: &str) -> bool {
    line.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .is_some_and(|code| (200..300).contains(&code))
}
