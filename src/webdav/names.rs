//! Namespaces and well-known qualified names used in WebDAV bodies.
//!
//! Everything here is a `const`, so the names can be shared freely between
//! concurrent operations and used directly in tree queries:
//!
//! ```
//! use fast_webdav_rs::webdav::names;
//! use fast_webdav_rs::XmlDocument;
//!
//! let doc = XmlDocument::parse(br#"<d:multistatus xmlns:d="DAV:"><d:response>
//!   <d:href>/a.txt</d:href></d:response></d:multistatus>"#).unwrap();
//! let href = doc.root().descendant(&names::HREF).map(|e| e.text());
//! assert_eq!(href.as_deref(), Some("/a.txt"));
//! ```

use crate::webdav::xml::XName;

/// The WebDAV namespace.
pub const DAV_NS: &str = "DAV:";

/// Namespace for custom (dead) properties and vendor query grammars.
///
/// Any other namespace works as well; build names with [`XName::new`].
pub const EXTENSION_NS: &str = "http://example.com/foo";

/// Prefix used when serializing elements in [`DAV_NS`] without an explicit declaration.
pub const DAV_PREFIX: &str = "D";

pub const fn dav(local: &'static str) -> XName {
    XName::from_static(DAV_NS, local)
}

pub const fn extension(local: &'static str) -> XName {
    XName::from_static(EXTENSION_NS, local)
}

// multi-status
pub const MULTISTATUS: XName = dav("multistatus");
pub const RESPONSE: XName = dav("response");
pub const HREF: XName = dav("href");
pub const PROPSTAT: XName = dav("propstat");
pub const STATUS: XName = dav("status");

// properties
pub const PROP: XName = dav("prop");
pub const DISPLAY_NAME: XName = dav("displayname");
pub const RESOURCE_TYPE: XName = dav("resourcetype");
pub const COLLECTION: XName = dav("collection");
pub const GET_CONTENT_TYPE: XName = dav("getcontenttype");
pub const GET_CONTENT_LENGTH: XName = dav("getcontentlength");
pub const GET_CONTENT_LANGUAGE: XName = dav("getcontentlanguage");
pub const GET_LAST_MODIFIED: XName = dav("getlastmodified");
pub const GET_ETAG: XName = dav("getetag");
pub const CREATION_DATE: XName = dav("creationdate");
pub const IS_COLLECTION: XName = dav("iscollection");
pub const IS_HIDDEN: XName = dav("ishidden");

// request bodies
pub const PROPFIND: XName = dav("propfind");
pub const PROPNAME: XName = dav("propname");
pub const ALLPROP: XName = dav("allprop");
pub const INCLUDE: XName = dav("include");
pub const PROPERTY_UPDATE: XName = dav("propertyupdate");
pub const SET: XName = dav("set");
pub const REMOVE: XName = dav("remove");
pub const MKCOL: XName = dav("mkcol");

// capability lists
pub const SUPPORTED_QUERY_GRAMMAR_SET: XName = dav("supported-query-grammar-set");
pub const SUPPORTED_METHOD_SET: XName = dav("supported-method-set");
pub const SUPPORTED_LIVE_PROPERTY_SET: XName = dav("supported-live-property-set");
pub const SUPPORTED_REPORT_SET: XName = dav("supported-report-set");

// DASL search
pub const SEARCH_REQUEST: XName = dav("searchrequest");
pub const BASIC_SEARCH: XName = dav("basicsearch");
pub const SELECT: XName = dav("select");
pub const FROM: XName = dav("from");
pub const SCOPE: XName = dav("scope");
pub const DEPTH: XName = dav("depth");
pub const WHERE: XName = dav("where");
pub const ORDER_BY: XName = dav("orderby");
pub const LIMIT: XName = dav("limit");
pub const NRESULTS: XName = dav("nresults");
pub const EQ: XName = dav("eq");
pub const LIKE: XName = dav("like");
pub const LITERAL: XName = dav("literal");
pub const AND: XName = dav("and");
pub const OR: XName = dav("or");
pub const NOT: XName = dav("not");

pub const NATURAL_LANGUAGE_QUERY: XName = extension("natural-language-query");
