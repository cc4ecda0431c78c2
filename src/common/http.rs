use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};

use crate::config::TlsPolicy;

/// Body type used in both directions, so uploads can stream from any reader.
pub type DavBody = UnsyncBoxBody<Bytes, std::io::Error>;

/// Type alias for the Hyper client behind the default transport.
pub type HyperClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, DavBody>;

pub fn empty_body() -> DavBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn full_body(bytes: impl Into<Bytes>) -> DavBody {
    Full::new(bytes.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Build a Hyper client with HTTP/1.1 + HTTP/2 and a rustls connector.
///
/// With [`TlsPolicy::Verify`] native roots are preferred and the bundled WebPKI
/// store is the fallback. [`TlsPolicy::AcceptInvalidCerts`] skips chain
/// validation but still checks handshake signatures.
pub fn build_hyper_client(tls: TlsPolicy) -> Result<HyperClient> {
    let https = match tls {
        TlsPolicy::Verify => HttpsConnectorBuilder::new()
            .with_native_roots()
            .unwrap_or_else(|err| {
                tracing::debug!("falling back to webpki roots (native roots unavailable: {err})");
                HttpsConnectorBuilder::new().with_webpki_roots()
            })
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build(),
        TlsPolicy::AcceptInvalidCerts => {
            let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
            let config = rustls::ClientConfig::builder_with_provider(provider.clone())
                .with_safe_default_protocol_versions()?
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
                .with_no_client_auth();
            HttpsConnectorBuilder::new()
                .with_tls_config(config)
                .https_or_http()
                .enable_http1()
                .enable_http2()
                .build()
        }
    };

    Ok(Client::builder(TokioExecutor::new())
        .http2_adaptive_window(true)
        .build::<_, DavBody>(https))
}

#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}
