//! Upload bodies that report how many bytes have been handed to the connection.

use std::sync::Arc;

use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::common::http::DavBody;

/// Snapshot emitted while an upload body is being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamProgress {
    /// Cumulative bytes read from the source so far.
    pub bytes_transferred: u64,
    /// Total size when the caller announced it.
    pub total_bytes: Option<u64>,
}

pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: StreamProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(StreamProgress) + Send + Sync,
{
    fn on_progress(&self, progress: StreamProgress) {
        (self)(progress)
    }
}

/// Wrap `reader` into a streaming request body.
///
/// Every chunk pulled by the connection bumps the cumulative counter and
/// notifies `observer` if there is one. Once `cancel` fires the body yields an
/// error so a partially sent upload is aborted instead of looking complete.
pub fn progress_body<R>(
    reader: R,
    total_bytes: Option<u64>,
    observer: Option<Arc<dyn ProgressObserver>>,
    cancel: CancellationToken,
) -> DavBody
where
    R: AsyncRead + Send + 'static,
{
    let mut sent: u64 = 0;
    let stream = ReaderStream::new(Box::pin(reader)).and_then(move |chunk: Bytes| {
        let result = if cancel.is_cancelled() {
            Err(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "upload cancelled",
            ))
        } else {
            sent += chunk.len() as u64;
            trace!(bytes_transferred = sent, "upload progress");
            if let Some(observer) = &observer {
                observer.on_progress(StreamProgress {
                    bytes_transferred: sent,
                    total_bytes,
                });
            }
            Ok(Frame::data(chunk))
        };
        futures::future::ready(result)
    });
    StreamBody::new(stream).boxed_unsync()
}
