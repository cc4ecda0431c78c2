//! Builders for common WebDAV request bodies.
//!
//! Each function returns an [`XmlDocument`] ready to hand to the matching
//! client operation. Anything more exotic can be assembled directly with
//! [`XmlElement`].

use crate::webdav::names::{self, DAV_NS, DAV_PREFIX};
use crate::webdav::types::Depth;
use crate::webdav::xml::{XName, XmlDocument, XmlElement};

fn dav_root(name: XName) -> XmlElement {
    XmlElement::new(name).with_namespace(DAV_PREFIX, DAV_NS)
}

fn prop_of(names: &[XName]) -> XmlElement {
    names
        .iter()
        .fold(XmlElement::new(names::PROP), |prop, name| {
            prop.with_child(XmlElement::new(name.clone()))
        })
}

/// `<propfind><prop>…</prop></propfind>` asking for the listed properties.
pub fn propfind_prop(properties: &[XName]) -> XmlDocument {
    dav_root(names::PROPFIND)
        .with_child(prop_of(properties))
        .into()
}

/// `<propfind><allprop/></propfind>`, optionally with an `<include>` list.
pub fn propfind_allprop(include: &[XName]) -> XmlDocument {
    let mut root = dav_root(names::PROPFIND).with_child(XmlElement::new(names::ALLPROP));
    if !include.is_empty() {
        let include_el = include
            .iter()
            .fold(XmlElement::new(names::INCLUDE), |el, name| {
                el.with_child(XmlElement::new(name.clone()))
            });
        root.push(include_el);
    }
    root.into()
}

/// `<propfind><propname/></propfind>`: list property names only.
pub fn propfind_propname() -> XmlDocument {
    dav_root(names::PROPFIND)
        .with_child(XmlElement::new(names::PROPNAME))
        .into()
}

/// `<propertyupdate>` with one `<set>` for `set` and one `<remove>` for `remove`.
///
/// Each element of `set` is a fully built property (name plus value).
pub fn proppatch(set: Vec<XmlElement>, remove: &[XName]) -> XmlDocument {
    let mut root = dav_root(names::PROPERTY_UPDATE);
    if !set.is_empty() {
        let prop = set
            .into_iter()
            .fold(XmlElement::new(names::PROP), XmlElement::with_child);
        root.push(XmlElement::new(names::SET).with_child(prop));
    }
    if !remove.is_empty() {
        root.push(XmlElement::new(names::REMOVE).with_child(prop_of(remove)));
    }
    root.into()
}

/// Convenience for a single text-valued property update.
pub fn proppatch_set_text(property: XName, value: impl Into<String>) -> XmlDocument {
    proppatch(vec![XmlElement::new(property).with_text(value)], &[])
}

/// Extended MKCOL (RFC 5689) body: resource types plus initial properties.
pub fn mkcol_extended(resource_types: &[XName], properties: Vec<XmlElement>) -> XmlDocument {
    let resourcetype = resource_types
        .iter()
        .fold(XmlElement::new(names::RESOURCE_TYPE), |el, name| {
            el.with_child(XmlElement::new(name.clone()))
        });
    let prop = properties
        .into_iter()
        .fold(XmlElement::new(names::PROP).with_child(resourcetype), XmlElement::with_child);
    dav_root(names::MKCOL)
        .with_child(XmlElement::new(names::SET).with_child(prop))
        .into()
}

/// DASL `basicsearch` request.
///
/// `where_clause` is the single operator element placed under `<where>`
/// (e.g. an `<eq>` or `<like>` built with [`XmlElement`]); `None` selects
/// everything in scope.
pub fn basic_search(
    scope_href: &str,
    depth: Depth,
    select: &[XName],
    where_clause: Option<XmlElement>,
    limit: Option<u32>,
) -> XmlDocument {
    let scope = XmlElement::new(names::SCOPE)
        .with_child(XmlElement::new(names::HREF).with_text(scope_href))
        .with_child(XmlElement::new(names::DEPTH).with_text(depth.as_str()));

    let mut search = XmlElement::new(names::BASIC_SEARCH)
        .with_child(XmlElement::new(names::SELECT).with_child(prop_of(select)))
        .with_child(XmlElement::new(names::FROM).with_child(scope));

    if let Some(clause) = where_clause {
        search.push(XmlElement::new(names::WHERE).with_child(clause));
    }
    if let Some(n) = limit {
        search.push(
            XmlElement::new(names::LIMIT)
                .with_child(XmlElement::new(names::NRESULTS).with_text(n.to_string())),
        );
    }

    dav_root(names::SEARCH_REQUEST).with_child(search).into()
}

/// `<like>` operator comparing `property` against a `%`/`_` pattern.
pub fn like(property: XName, pattern: impl Into<String>) -> XmlElement {
    XmlElement::new(names::LIKE)
        .with_child(XmlElement::new(names::PROP).with_child(XmlElement::new(property)))
        .with_child(XmlElement::new(names::LITERAL).with_text(pattern))
}

/// `<eq>` operator comparing `property` with a literal.
pub fn eq(property: XName, literal: impl Into<String>) -> XmlElement {
    XmlElement::new(names::EQ)
        .with_child(XmlElement::new(names::PROP).with_child(XmlElement::new(property)))
        .with_child(XmlElement::new(names::LITERAL).with_text(literal))
}

/// Search request using the extension namespace's free-text grammar.
pub fn natural_language_search(query: impl Into<String>) -> XmlDocument {
    dav_root(names::SEARCH_REQUEST)
        .with_child(XmlElement::new(names::NATURAL_LANGUAGE_QUERY).with_text(query))
        .into()
}
