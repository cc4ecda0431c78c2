//! Request-sending capability the WebDAV operations are built on.
//!
//! A [`SessionFactory`] turns credentials into a [`Session`]; every operation
//! asks for a fresh session, attaches its method/headers/body and sends it.
//! The default factory is backed by hyper and shares one connection pool
//! across sessions. Custom transports (tests, proxies, alternative auth
//! schemes) implement [`Transport`] and plug in through a factory.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use http_body_util::BodyExt;
use hyper::header::{self, HeaderMap};
use hyper::{Request, Response};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::common::http::{DavBody, HyperClient, build_hyper_client};
use crate::config::{Credentials, TlsPolicy};
use crate::error::{DavError, DavResult};

/// Sends one HTTP request and resolves once the response headers arrive.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request<DavBody>) -> BoxFuture<'static, Result<Response<DavBody>>>;
}

/// Produces sessions bound to a set of credentials.
pub trait SessionFactory: Send + Sync {
    fn create_session(&self, credentials: &Credentials) -> DavResult<Session>;
}

/// A transport plus the headers every request of the session carries.
#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn Transport>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            default_headers: HeaderMap::new(),
            timeout: None,
        }
    }

    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Send `request`, racing it against `cancel`.
    ///
    /// Per-request headers win over session defaults. A triggered token yields
    /// [`DavError::Cancelled`] whatever the transport was doing.
    pub async fn send(
        &self,
        mut request: Request<DavBody>,
        cancel: &CancellationToken,
    ) -> DavResult<Response<DavBody>> {
        for (name, value) in &self.default_headers {
            if !request.headers().contains_key(name) {
                request.headers_mut().insert(name.clone(), value.clone());
            }
        }

        let method = request.method().clone();
        let uri = request.uri().clone();
        debug!(%method, %uri, "sending WebDAV request");

        if cancel.is_cancelled() {
            debug!(%method, %uri, "request cancelled before send");
            return Err(DavError::Cancelled);
        }

        let pending = self.transport.send(request);
        let exchange = async {
            match self.timeout {
                Some(limit) => match timeout(limit, pending).await {
                    Ok(result) => result.map_err(DavError::Transport),
                    Err(_) => Err(DavError::Timeout),
                },
                None => pending.await.map_err(DavError::Transport),
            }
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%method, %uri, "request cancelled");
                return Err(DavError::Cancelled);
            }
            result = exchange => result?,
        };

        debug!(%method, %uri, status = response.status().as_u16(), "received response");
        Ok(response)
    }
}

/// [`Transport`] over the shared hyper client.
#[derive(Clone)]
pub struct HyperTransport {
    client: HyperClient,
}

impl HyperTransport {
    pub fn new(client: HyperClient) -> Self {
        Self { client }
    }
}

impl Transport for HyperTransport {
    fn send(&self, request: Request<DavBody>) -> BoxFuture<'static, Result<Response<DavBody>>> {
        let pending = self.client.request(request);
        async move {
            let response = pending.await?;
            Ok::<_, anyhow::Error>(
                response.map(|body| body.map_err(std::io::Error::other).boxed_unsync()),
            )
        }
        .boxed()
    }
}

/// Default factory: one hyper client per factory, pre-emptive credentials per session.
///
/// The only scheme it speaks is Basic, with the account rendered as
/// `DOMAIN\user` and sent on every request without waiting for a challenge.
/// Over `http://` that means the password crosses the wire base64-encoded only;
/// [`WebDavClient::new`](crate::WebDavClient::new) logs a warning in that case.
/// Servers that insist on Digest or NTLM need a custom [`SessionFactory`] whose
/// [`Transport`] answers the `401` challenge itself.
#[derive(Clone)]
pub struct HyperSessionFactory {
    transport: Arc<HyperTransport>,
}

impl HyperSessionFactory {
    pub fn new(tls: TlsPolicy) -> DavResult<Self> {
        let client = build_hyper_client(tls)?;
        Ok(Self {
            transport: Arc::new(HyperTransport::new(client)),
        })
    }
}

impl SessionFactory for HyperSessionFactory {
    fn create_session(&self, credentials: &Credentials) -> DavResult<Session> {
        let mut headers = HeaderMap::new();
        if let Some(auth) = credentials.authorization_header()? {
            headers.insert(header::AUTHORIZATION, auth);
        }
        let transport: Arc<dyn Transport> = self.transport.clone();
        Ok(Session::new(transport).with_default_headers(headers))
    }
}
