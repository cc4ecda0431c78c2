use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fast_webdav_rs::common::{empty_body, full_body};
use fast_webdav_rs::{
    Credentials, DavBody, DavError, HyperSessionFactory, Session, SessionFactory, TlsPolicy,
    Transport,
};
use futures::FutureExt;
use futures::future::BoxFuture;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::{Request, Response};
use tokio_util::sync::CancellationToken;

/// Answers 200 after `delay`, remembering the headers it saw.
struct Echo {
    delay: Duration,
    seen: Arc<Mutex<Vec<HeaderMap>>>,
}

impl Echo {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Transport for Echo {
    fn send(&self, request: Request<DavBody>) -> BoxFuture<'static, Result<Response<DavBody>>> {
        self.seen
            .lock()
            .expect("echo lock")
            .push(request.headers().clone());
        let delay = self.delay;
        async move {
            tokio::time::sleep(delay).await;
            Ok(Response::new(full_body("ok")))
        }
        .boxed()
    }
}

struct Broken;

impl Transport for Broken {
    fn send(&self, _request: Request<DavBody>) -> BoxFuture<'static, Result<Response<DavBody>>> {
        async { Err(anyhow::anyhow!("connection refused")) }.boxed()
    }
}

fn request() -> Request<DavBody> {
    Request::builder()
        .uri("http://dav.test/file.txt")
        .body(empty_body())
        .expect("request should build")
}

#[tokio::test]
async fn test_session_merges_default_headers() {
    let echo = Arc::new(Echo::new(Duration::ZERO));
    let mut defaults = HeaderMap::new();
    defaults.insert(header::USER_AGENT, HeaderValue::from_static("fast-webdav"));
    defaults.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    let session = Session::new(echo.clone()).with_default_headers(defaults);

    let mut req = request();
    req.headers_mut()
        .insert(header::ACCEPT, HeaderValue::from_static("application/xml"));
    session
        .send(req, &CancellationToken::new())
        .await
        .expect("send should succeed");

    let seen = echo.seen.lock().expect("echo lock");
    assert_eq!(seen[0].get(header::USER_AGENT).unwrap(), "fast-webdav");
    assert_eq!(seen[0].get(header::ACCEPT).unwrap(), "application/xml");
}

#[tokio::test]
async fn test_session_cancelled_before_send_never_reaches_transport() {
    let echo = Arc::new(Echo::new(Duration::ZERO));
    let session = Session::new(echo.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = session
        .send(request(), &cancel)
        .await
        .expect_err("should be cancelled");
    assert!(err.is_cancelled());
    assert!(echo.seen.lock().expect("echo lock").is_empty());
}

#[tokio::test]
async fn test_session_cancelled_while_waiting() {
    let session = Session::new(Arc::new(Echo::new(Duration::from_secs(30))));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = session
        .send(request(), &cancel)
        .await
        .expect_err("should be cancelled");
    assert!(matches!(err, DavError::Cancelled));
}

#[tokio::test]
async fn test_session_timeout() {
    let session = Session::new(Arc::new(Echo::new(Duration::from_secs(30))))
        .with_timeout(Some(Duration::from_millis(20)));

    let err = session
        .send(request(), &CancellationToken::new())
        .await
        .expect_err("should time out");
    assert!(matches!(err, DavError::Timeout));
}

#[tokio::test]
async fn test_session_transport_error() {
    let session = Session::new(Arc::new(Broken));
    let err = session
        .send(request(), &CancellationToken::new())
        .await
        .expect_err("transport should fail");
    assert!(matches!(err, DavError::Transport(_)));
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_hyper_factory_sends_domain_qualified_basic_auth() {
    let factory = HyperSessionFactory::new(TlsPolicy::Verify).expect("factory should build");
    let session = factory
        .create_session(&Credentials::new("alice", "secret", "CORP"))
        .expect("session should build");

    let expected = format!("Basic {}", STANDARD.encode("CORP\\alice:secret"));
    let auth = session
        .default_headers()
        .get(header::AUTHORIZATION)
        .expect("authorization header");
    assert_eq!(auth.to_str().unwrap(), expected);
    assert!(auth.is_sensitive());
}

#[test]
fn test_hyper_factory_anonymous_has_no_auth() {
    let factory =
        HyperSessionFactory::new(TlsPolicy::AcceptInvalidCerts).expect("factory should build");
    let session = factory
        .create_session(&Credentials::default())
        .expect("session should build");
    assert!(session.default_headers().get(header::AUTHORIZATION).is_none());
}
