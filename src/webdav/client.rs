use std::io::Cursor;
use std::sync::Arc;

use bytes::Bytes;
use hyper::{HeaderMap, Method, Request, Response, Uri, header};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::common::compression::{add_accept_encoding, decompress_body, detect_encodings};
use crate::common::http::{DavBody, empty_body, full_body};
use crate::common::progress::{ProgressObserver, progress_body};
use crate::common::transport::{HyperSessionFactory, Session, SessionFactory};
use crate::config::WebDavConfig;
use crate::error::{DavError, DavResult, ensure_success};
use crate::webdav::types::{DavOptions, DavResource, Depth, DownloadStream, map_resources};
use crate::webdav::uri::{build_uri, normalize_href};
use crate::webdav::xml::XmlDocument;

const XML_CONTENT_TYPE: &str = "application/xml";

/// Async WebDAV client.
///
/// The client only holds configuration; every operation opens its own
/// [`Session`] from the configured [`SessionFactory`], so a single instance can
/// be cloned and used from many tasks at once. Every operation takes a
/// [`CancellationToken`]: triggering it aborts the exchange with
/// [`DavError::Cancelled`]. Non-`2xx` answers become [`DavError::Fault`].
///
/// ```no_run
/// use fast_webdav_rs::{Credentials, Depth, WebDavClient, WebDavConfig, names};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), fast_webdav_rs::DavError> {
/// let config = WebDavConfig::new(
///     "https://dav.example.com",
///     Credentials::new("alice", "secret", "CORP"),
/// );
/// let client = WebDavClient::new(config)?;
/// let cancel = CancellationToken::new();
///
/// client.mkcol("/docs/reports", &cancel).await?;
/// client
///     .upload_bytes("/docs/reports/q1.txt", Some("text/plain"), "hello", None, &cancel)
///     .await?;
/// let listing = client.propfind("/docs/reports", Depth::One, None, &cancel).await?;
/// for name in listing.descendants(&names::DISPLAY_NAME) {
///     println!("{}", name.text());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WebDavClient {
    config: Arc<WebDavConfig>,
    sessions: Arc<dyn SessionFactory>,
}

impl WebDavClient {
    /// Create a client backed by the default hyper transport.
    pub fn new(config: WebDavConfig) -> DavResult<Self> {
        config.validate()?;
        if config.sends_plaintext_credentials() {
            warn!(server = %config.server, "Basic credentials will be sent unencrypted over http");
        }
        let factory = HyperSessionFactory::new(config.tls)?;
        Ok(Self::with_session_factory(config, Arc::new(factory)))
    }

    /// Create a client from `WEBDAV_*` environment variables, see [`WebDavConfig::from_env`].
    pub fn from_env() -> DavResult<Self> {
        Self::new(WebDavConfig::from_env()?)
    }

    /// Create a client that sends through a custom transport.
    pub fn with_session_factory(config: WebDavConfig, sessions: Arc<dyn SessionFactory>) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
        }
    }

    pub fn config(&self) -> &WebDavConfig {
        &self.config
    }

    /// Absolute URI for a resource path; `/` and `\` both separate segments.
    pub fn build_uri(&self, path: &str) -> DavResult<Uri> {
        build_uri(&self.config.server, path)
    }

    fn session(&self) -> DavResult<Session> {
        Ok(self
            .sessions
            .create_session(&self.config.credentials)?
            .with_timeout(self.config.timeout))
    }

    // ----------- request plumbing -----------

    async fn execute(
        &self,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: DavBody,
        cancel: &CancellationToken,
    ) -> DavResult<Response<DavBody>> {
        let session = self.session()?;
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(h) = builder.headers_mut() {
            h.extend(headers);
        }
        let request = builder.body(body)?;

        let response = session.send(request, cancel).await?;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DavError::Cancelled),
            result = ensure_success(response) => result,
        }
    }

    /// Send a request without an entity, still announcing `Content-Length: 0`.
    async fn execute_empty(
        &self,
        method: Method,
        uri: Uri,
        mut headers: HeaderMap,
        cancel: &CancellationToken,
    ) -> DavResult<Response<DavBody>> {
        headers.insert(header::CONTENT_LENGTH, header::HeaderValue::from_static("0"));
        self.execute(method, uri, headers, empty_body(), cancel)
            .await
    }

    async fn execute_xml(
        &self,
        method: Method,
        uri: Uri,
        mut headers: HeaderMap,
        body: &XmlDocument,
        cancel: &CancellationToken,
    ) -> DavResult<Response<DavBody>> {
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static(XML_CONTENT_TYPE),
        );
        self.execute(method, uri, headers, full_body(body.to_bytes()), cancel)
            .await
    }

    /// Decompress and parse a multi-status (or any XML) response body.
    async fn read_xml(
        response: Response<DavBody>,
        cancel: &CancellationToken,
    ) -> DavResult<XmlDocument> {
        let encodings = detect_encodings(response.headers());
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DavError::Cancelled),
            body = decompress_body(response.into_body(), &encodings) => body?,
        };
        Ok(XmlDocument::parse(&body)?)
    }

    fn webdav_method(name: &'static [u8]) -> DavResult<Method> {
        Method::from_bytes(name).map_err(|e| DavError::Http(e.into()))
    }

    // ----------- WebDAV verbs -----------

    /// `PROPFIND` with a `Depth` header.
    ///
    /// Without a body the request carries an empty entity and the server
    /// answers as for `allprop`.
    pub async fn propfind(
        &self,
        path: &str,
        depth: Depth,
        body: Option<&XmlDocument>,
        cancel: &CancellationToken,
    ) -> DavResult<XmlDocument> {
        let uri = self.build_uri(path)?;
        let method = Self::webdav_method(b"PROPFIND")?;
        let mut h = HeaderMap::new();
        h.insert("Depth", header::HeaderValue::from_static(depth.as_str()));
        add_accept_encoding(&mut h);

        let response = match body {
            Some(doc) => self.execute_xml(method, uri, h, doc, cancel).await?,
            None => self.execute_empty(method, uri, h, cancel).await?,
        };
        Self::read_xml(response, cancel).await
    }

    /// `PROPPATCH` with a property-update document.
    pub async fn proppatch(
        &self,
        path: &str,
        body: &XmlDocument,
        cancel: &CancellationToken,
    ) -> DavResult<XmlDocument> {
        let uri = self.build_uri(path)?;
        let mut h = HeaderMap::new();
        add_accept_encoding(&mut h);
        let response = self
            .execute_xml(Self::webdav_method(b"PROPPATCH")?, uri, h, body, cancel)
            .await?;
        Self::read_xml(response, cancel).await
    }

    /// `MKCOL` creating a plain collection.
    pub async fn mkcol(&self, path: &str, cancel: &CancellationToken) -> DavResult<()> {
        let uri = self.build_uri(path)?;
        self.execute_empty(Self::webdav_method(b"MKCOL")?, uri, HeaderMap::new(), cancel)
            .await?;
        Ok(())
    }

    /// Extended `MKCOL` (RFC 5689) with resource types and initial properties.
    pub async fn mkcol_extended(
        &self,
        path: &str,
        body: &XmlDocument,
        cancel: &CancellationToken,
    ) -> DavResult<()> {
        let uri = self.build_uri(path)?;
        self.execute_xml(Self::webdav_method(b"MKCOL")?, uri, HeaderMap::new(), body, cancel)
            .await?;
        Ok(())
    }

    /// `GET` returning the body as a stream once the headers are in.
    pub async fn download(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> DavResult<DownloadStream> {
        let uri = self.build_uri(path)?;
        let response = self
            .execute(Method::GET, uri, HeaderMap::new(), empty_body(), cancel)
            .await?;
        let length = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        Ok(DownloadStream::new(response.into_body(), length, cancel))
    }

    /// `PUT` streaming `reader` to `path`.
    ///
    /// `content_type` is sent when non-blank, `length` becomes
    /// `Content-Length` when known (chunked otherwise). `progress` is told the
    /// cumulative byte count as the connection pulls data from `reader`.
    pub async fn upload<R>(
        &self,
        path: &str,
        content_type: Option<&str>,
        reader: R,
        length: Option<u64>,
        progress: Option<Arc<dyn ProgressObserver>>,
        cancel: &CancellationToken,
    ) -> DavResult<()>
    where
        R: AsyncRead + Send + 'static,
    {
        let uri = self.build_uri(path)?;
        let mut h = HeaderMap::new();
        if let Some(ct) = content_type.map(str::trim).filter(|ct| !ct.is_empty()) {
            h.insert(header::CONTENT_TYPE, header::HeaderValue::from_str(ct)?);
        }
        if let Some(len) = length {
            h.insert(header::CONTENT_LENGTH, header::HeaderValue::from(len));
        }

        let body = progress_body(reader, length, progress, cancel.clone());
        self.execute(Method::PUT, uri, h, body, cancel).await?;
        debug!(path, "upload complete");
        Ok(())
    }

    /// `PUT` of an in-memory payload.
    pub async fn upload_bytes(
        &self,
        path: &str,
        content_type: Option<&str>,
        content: impl Into<Bytes>,
        progress: Option<Arc<dyn ProgressObserver>>,
        cancel: &CancellationToken,
    ) -> DavResult<()> {
        let content: Bytes = content.into();
        let length = content.len() as u64;
        self.upload(
            path,
            content_type,
            Cursor::new(content),
            Some(length),
            progress,
            cancel,
        )
        .await
    }

    /// `DELETE` a file or collection.
    pub async fn delete(&self, path: &str, cancel: &CancellationToken) -> DavResult<()> {
        let uri = self.build_uri(path)?;
        self.execute(Method::DELETE, uri, HeaderMap::new(), empty_body(), cancel)
            .await?;
        Ok(())
    }

    /// `COPY` `source` to `target`.
    pub async fn copy(
        &self,
        source: &str,
        target: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> DavResult<()> {
        self.transfer(b"COPY", source, target, overwrite, cancel)
            .await
    }

    /// `MOVE` `source` to `target`.
    pub async fn r#move(
        &self,
        source: &str,
        target: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> DavResult<()> {
        self.transfer(b"MOVE", source, target, overwrite, cancel)
            .await
    }

    async fn transfer(
        &self,
        method: &'static [u8],
        source: &str,
        target: &str,
        overwrite: bool,
        cancel: &CancellationToken,
    ) -> DavResult<()> {
        let uri = self.build_uri(source)?;
        let destination = self.build_uri(target)?;
        let mut h = HeaderMap::new();
        h.insert(
            "Destination",
            header::HeaderValue::from_str(&destination.to_string())?,
        );
        h.insert(
            "Overwrite",
            header::HeaderValue::from_static(if overwrite { "T" } else { "F" }),
        );
        self.execute_empty(Self::webdav_method(method)?, uri, h, cancel)
            .await?;
        Ok(())
    }

    /// `OPTIONS`: allowed methods and DAV compliance classes for `path`.
    pub async fn options(&self, path: &str, cancel: &CancellationToken) -> DavResult<DavOptions> {
        let uri = self.build_uri(path)?;
        let response = self
            .execute_empty(Method::OPTIONS, uri, HeaderMap::new(), cancel)
            .await?;
        Ok(DavOptions::from_headers(response.headers()))
    }

    /// `SEARCH` (RFC 5323) with a search-request document.
    pub async fn search(
        &self,
        path: &str,
        body: &XmlDocument,
        cancel: &CancellationToken,
    ) -> DavResult<XmlDocument> {
        let uri = self.build_uri(path)?;
        let mut h = HeaderMap::new();
        add_accept_encoding(&mut h);
        let response = self
            .execute_xml(Self::webdav_method(b"SEARCH")?, uri, h, body, cancel)
            .await?;
        Self::read_xml(response, cancel).await
    }

    // ----------- helpers -----------

    /// Direct members of the collection at `path`, the collection itself excluded.
    ///
    /// Hrefs are compared after percent-decoding with trailing slashes
    /// trimmed, so servers that answer with or without a final `/` (or with
    /// absolute hrefs) behave the same.
    pub async fn list(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> DavResult<Vec<DavResource>> {
        let own = normalize_href(self.build_uri(path)?.path());
        let doc = self.propfind(path, Depth::One, None, cancel).await?;
        Ok(map_resources(&doc)
            .into_iter()
            .filter(|r| normalize_href(&r.href) != own)
            .collect())
    }
}
