pub mod compression;
pub mod http;
pub mod progress;
pub mod transport;

pub use compression::{ContentEncoding, add_accept_encoding, decompress_body, detect_encodings};
pub use http::{DavBody, HyperClient, build_hyper_client, empty_body, full_body};
pub use progress::{ProgressObserver, StreamProgress, progress_body};
pub use transport::{HyperSessionFactory, HyperTransport, Session, SessionFactory, Transport};
