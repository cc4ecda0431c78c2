pub mod bodies;
pub mod client;
pub mod names;
pub mod types;
pub mod uri;
pub mod xml;

pub use client::WebDavClient;
pub use types::{DavOptions, DavResource, Depth, DownloadStream, is_success_status_line, map_resources};
pub use uri::{build_uri, escape_path, escape_segment, normalize_href, unescape_path};
pub use xml::{XName, XmlDocument, XmlElement, XmlError, XmlNode, escape_xml};
