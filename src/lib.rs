//! Fast WebDAV client library for Rust.
//!
//! An asynchronous client for WebDAV (RFC 4918) servers such as SharePoint,
//! Nextcloud or any generic DAV share, built on hyper 1.x, rustls and tokio.
//!
//! # Features
//!
//! - One method per verb: `PROPFIND`, `PROPPATCH`, `MKCOL` (plain and extended),
//!   `GET`, `PUT`, `DELETE`, `COPY`, `MOVE`, `OPTIONS` and `SEARCH`
//! - Filesystem-style paths (`/` or `\`) escaped segment by segment
//! - Namespaced XML tree for request bodies and multi-status responses
//! - Streaming uploads with progress notifications, streaming downloads
//! - Cooperative cancellation on every call via [`CancellationToken`]
//! - A single typed fault for every non-`2xx` answer
//! - Pluggable transport through [`SessionFactory`]
//!
//! # Examples
//!
//! ## Setup
//!
//! ```no_run
//! use fast_webdav_rs::{Credentials, TlsPolicy, WebDavClient, WebDavConfig};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let config = WebDavConfig::new(
//!         "https://sharepoint.example.com",
//!         Credentials::new("alice", "secret", "CORP"),
//!     )
//!     .with_tls(TlsPolicy::AcceptInvalidCerts);
//!     let _client = WebDavClient::new(config)?;
//!
//!     // Or from WEBDAV_SERVER / WEBDAV_USER / WEBDAV_PASSWORD / WEBDAV_DOMAIN
//!     let _client = WebDavClient::from_env()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Browsing a collection
//!
//! ```no_run
//! use fast_webdav_rs::{Depth, WebDavClient, bodies, names};
//! use tokio_util::sync::CancellationToken;
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = WebDavClient::from_env()?;
//!     let cancel = CancellationToken::new();
//!
//!     // Ask for a few properties only
//!     let query = bodies::propfind_prop(&[names::DISPLAY_NAME, names::GET_CONTENT_LENGTH]);
//!     let multistatus = client
//!         .propfind("/Shared Documents", Depth::One, Some(&query), &cancel)
//!         .await?;
//!
//!     for response in multistatus.descendants(&names::RESPONSE) {
//!         let href = response.element(&names::HREF).map(|h| h.text()).unwrap_or_default();
//!         let name = response.descendant(&names::DISPLAY_NAME).map(|d| d.text());
//!         println!("{href}: {name:?}");
//!     }
//!
//!     // Or let the client flatten it and drop the collection itself
//!     for item in client.list("/Shared Documents", &cancel).await? {
//!         println!("{} collection={}", item.href, item.is_collection);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Files
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use fast_webdav_rs::{ProgressObserver, StreamProgress, WebDavClient};
//! use tokio_util::sync::CancellationToken;
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = WebDavClient::from_env()?;
//!     let cancel = CancellationToken::new();
//!
//!     let file = tokio::fs::File::open("report.pdf").await?;
//!     let size = file.metadata().await?.len();
//!     let progress: Arc<dyn ProgressObserver> = Arc::new(|p: StreamProgress| {
//!         println!("{} / {:?} bytes", p.bytes_transferred, p.total_bytes);
//!     });
//!     client
//!         .upload("/docs/report.pdf", Some("application/pdf"), file, Some(size), Some(progress), &cancel)
//!         .await?;
//!
//!     client.copy("/docs/report.pdf", "/archive/report.pdf", true, &cancel).await?;
//!
//!     let download = client.download("/archive/report.pdf", &cancel).await?;
//!     println!("length: {:?}", download.content_length());
//!     let bytes = download.bytes().await?;
//!     println!("read {} bytes", bytes.len());
//!
//!     client.delete("/docs/report.pdf", &cancel).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Custom properties
//!
//! ```no_run
//! use fast_webdav_rs::{WebDavClient, XName, bodies, names};
//! use tokio_util::sync::CancellationToken;
//! use anyhow::Result;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = WebDavClient::from_env()?;
//!     let cancel = CancellationToken::new();
//!
//!     let update = bodies::proppatch_set_text(
//!         XName::new(names::EXTENSION_NS, "MyProperty"),
//!         "Custom property value",
//!     );
//!     let result = client.proppatch("/docs/file.txt", &update, &cancel).await?;
//!     let status = result.descendant(&names::STATUS).map(|s| s.text());
//!     assert_eq!(status.as_deref(), Some("HTTP/1.1 200 OK"));
//!     Ok(())
//! }
//! ```
//!
//! ## Faults and cancellation
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use fast_webdav_rs::{DavError, WebDavClient};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(client: WebDavClient) {
//! let cancel = CancellationToken::new();
//! let deadline = cancel.clone();
//! tokio::spawn(async move {
//!     tokio::time::sleep(Duration::from_secs(30)).await;
//!     deadline.cancel();
//! });
//!
//! match client.mkcol("/locked/folder", &cancel).await {
//!     Ok(()) => println!("created"),
//!     Err(DavError::Fault(fault)) if fault.status_code == 423 => {
//!         println!("locked, retry later: {}", fault.body);
//!     }
//!     Err(DavError::Fault(fault)) => println!("server said {fault}"),
//!     Err(DavError::Cancelled) => println!("gave up"),
//!     Err(other) => println!("transport problem: {other}"),
//! }
//! # }
//! ```
pub mod common;
pub mod config;
pub mod error;
pub mod webdav;

pub use common::compression::{ContentEncoding, detect_encodings};
pub use common::progress::{ProgressObserver, StreamProgress};
pub use common::transport::{HyperSessionFactory, HyperTransport, Session, SessionFactory, Transport};
pub use common::http::DavBody;
pub use config::{Credentials, TlsPolicy, WebDavConfig};
pub use error::{DavError, DavResult, WebDavFault};
pub use webdav::{
    DavOptions, DavResource, Depth, DownloadStream, WebDavClient, XName, XmlDocument, XmlElement,
    XmlError, XmlNode, bodies, map_resources, names,
};

pub use tokio_util::sync::CancellationToken;
