//! Resource path to URI conversion.

use hyper::Uri;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::error::DavResult;

/// Everything except the RFC 3986 unreserved characters `A-Z a-z 0-9 - . _ ~`.
///
/// `! ' ( ) *` are legal in generic URIs but some DAV servers (IIS/SharePoint)
/// reject them unescaped, so they stay in the set.
pub const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a single path segment.
pub fn escape_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT_ENCODE_SET).to_string()
}

/// Split on `/` and `\`, escape every segment and join back with `/`.
pub fn escape_path(path: &str) -> String {
    path.split(['/', '\\'])
        .map(escape_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Append the escaped `path` to `server` and parse the result.
pub fn build_uri(server: &str, path: &str) -> DavResult<Uri> {
    let uri = format!("{}{}", server, escape_path(path)).parse()?;
    Ok(uri)
}

/// Percent-decode a path, returning the input unchanged when it is not valid UTF-8.
pub fn unescape_path(path: &str) -> String {
    match percent_decode_str(path).decode_utf8() {
        Ok(v) => v.into_owned(),
        Err(_) => path.to_string(),
    }
}

/// Path component of an `href` as found in multi-status responses.
///
/// Absolute hrefs lose their scheme and authority, the remainder is decoded and
/// trailing slashes are trimmed so collection hrefs compare equal with or
/// without them.
pub fn normalize_href(href: &str) -> String {
    let path = match href.parse::<Uri>() {
        Ok(uri) if uri.scheme().is_some() => uri.path().to_string(),
        _ => href.to_string(),
    };
    let decoded = unescape_path(&path).replace('\\', "/");
    let trimmed = decoded.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
