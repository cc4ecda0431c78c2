//! Minimal namespaced XML tree for WebDAV request and response bodies.
//!
//! Only what the protocol needs: elements with qualified names, attributes,
//! namespace declarations, text, serialization and lookup by [`XName`].
//! Parsing is done with `quick-xml`; prefixes are resolved against the
//! declarations in scope so `D:href`, `d:href` and a default-namespaced
//! `href` all compare equal to [`crate::webdav::names::HREF`].

use std::borrow::Cow;
use std::fmt;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::webdav::names::{DAV_NS, DAV_PREFIX};

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum XmlError {
    #[error("XML syntax error: {0}")]
    Syntax(String),
    #[error("undeclared namespace prefix `{0}`")]
    UnknownPrefix(String),
    #[error("unexpected closing tag `{0}`")]
    UnbalancedTag(String),
    #[error("unknown entity `&{0};`")]
    Entity(String),
    #[error("document has no root element")]
    NoRoot,
}

/// Qualified name: namespace URI plus local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XName {
    namespace: Cow<'static, str>,
    local: Cow<'static, str>,
}

impl XName {
    pub const fn from_static(namespace: &'static str, local: &'static str) -> Self {
        Self {
            namespace: Cow::Borrowed(namespace),
            local: Cow::Borrowed(local),
        }
    }

    pub fn new(namespace: impl Into<Cow<'static, str>>, local: impl Into<Cow<'static, str>>) -> Self {
        Self {
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    /// A name in no namespace.
    pub fn local(local: impl Into<Cow<'static, str>>) -> Self {
        Self::new("", local)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn local_name(&self) -> &str {
        &self.local
    }
}

impl fmt::Display for XName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: XName,
    namespaces: Vec<(String, String)>,
    attributes: Vec<(XName, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: XName) -> Self {
        Self {
            name,
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &XName {
        &self.name
    }

    /// Declare `prefix` for `uri` on this element. An empty prefix sets the default namespace.
    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.declare_namespace(prefix, uri);
        self
    }

    pub fn declare_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        let prefix = prefix.into();
        let uri = uri.into();
        if let Some(existing) = self.namespaces.iter_mut().find(|(p, _)| *p == prefix) {
            existing.1 = uri;
        } else {
            self.namespaces.push((prefix, uri));
        }
    }

    pub fn namespaces(&self) -> &[(String, String)] {
        &self.namespaces
    }

    pub fn with_attribute(mut self, name: XName, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn set_attribute(&mut self, name: XName, value: impl Into<String>) {
        let value = value.into();
        if let Some(existing) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    pub fn attribute(&self, name: &XName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> &[(XName, String)] {
        &self.attributes
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push(child);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(&text);
        } else {
            self.children.push(XmlNode::Text(text));
        }
    }

    /// Replace all content with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(XmlNode::Text(text.into()));
    }

    pub fn nodes(&self) -> &[XmlNode] {
        &self.children
    }

    /// Child elements, skipping text.
    pub fn children(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// First direct child called `name`.
    pub fn element(&self, name: &XName) -> Option<&XmlElement> {
        self.children().find(|e| e.name == *name)
    }

    /// Direct children called `name`.
    pub fn elements<'a>(&'a self, name: &'a XName) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children().filter(move |e| e.name == *name)
    }

    /// All nested elements in document order, not including `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&XmlElement> = self.children().collect();
        stack.reverse();
        Descendants { stack }
    }

    /// Nested elements called `name`, in document order.
    pub fn descendants_named<'a>(
        &'a self,
        name: &'a XName,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.descendants().filter(move |e| e.name == *name)
    }

    /// First nested element called `name`.
    pub fn descendant(&self, name: &XName) -> Option<&XmlElement> {
        self.descendants().find(|e| e.name == *name)
    }

    /// Concatenated text of this element and everything below it.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(t) => out.push_str(t),
                XmlNode::Element(e) => e.collect_text(out),
            }
        }
    }
}

/// Pre-order iterator returned by [`XmlElement::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(next.children());
        self.stack[start..].reverse();
        Some(next)
    }
}

/// A parsed or constructed XML document with a single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl From<XmlElement> for XmlDocument {
    fn from(root: XmlElement) -> Self {
        Self::new(root)
    }
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    pub fn into_root(self) -> XmlElement {
        self.root
    }

    /// Elements called `name` anywhere in the document, the root included.
    pub fn descendants<'a>(&'a self, name: &'a XName) -> impl Iterator<Item = &'a XmlElement> + 'a {
        std::iter::once(&self.root)
            .chain(self.root.descendants())
            .filter(move |e| e.name == *name)
    }

    /// First element called `name` anywhere in the document.
    pub fn descendant(&self, name: &XName) -> Option<&XmlElement> {
        std::iter::once(&self.root)
            .chain(self.root.descendants())
            .find(|e| e.name == *name)
    }

    pub fn parse(input: &[u8]) -> Result<Self, XmlError> {
        parse_document(input)
    }

    /// Serialize with an XML declaration.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::with_capacity(256);
        out.push_str(XML_DECL);
        let mut scopes: Vec<Vec<(String, String)>> = Vec::new();
        let mut generated = 0usize;
        write_element(&self.root, &mut out, &mut scopes, &mut generated);
        out
    }

    pub fn to_bytes(&self) -> bytes::Bytes {
        bytes::Bytes::from(self.to_xml_string())
    }
}

impl fmt::Display for XmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

// ----------- serialization -----------

fn lookup<'a>(scopes: &'a [Vec<(String, String)>], prefix: &str) -> Option<&'a str> {
    scopes
        .iter()
        .rev()
        .flat_map(|scope| scope.iter().rev())
        .find(|(p, _)| p == prefix)
        .map(|(_, uri)| uri.as_str())
}

fn prefix_for<'a>(
    scopes: &'a [Vec<(String, String)>],
    namespace: &str,
    allow_default: bool,
) -> Option<&'a str> {
    scopes
        .iter()
        .rev()
        .flat_map(|scope| scope.iter().rev())
        .filter(|(p, uri)| uri == namespace && (allow_default || !p.is_empty()))
        .map(|(p, _)| p.as_str())
        .find(|p| lookup(scopes, p) == Some(namespace))
}

/// Prefix bound to `namespace`, declaring a fresh one on the current scope if needed.
fn ensure_prefix(
    scopes: &mut [Vec<(String, String)>],
    namespace: &str,
    allow_default: bool,
    generated: &mut usize,
) -> String {
    if let Some(p) = prefix_for(scopes, namespace, allow_default) {
        return p.to_string();
    }

    let prefix = if namespace == DAV_NS && lookup(scopes, DAV_PREFIX).is_none() {
        DAV_PREFIX.to_string()
    } else {
        loop {
            let candidate = format!("ns{}", *generated);
            *generated += 1;
            if lookup(scopes, &candidate).is_none() {
                break candidate;
            }
        }
    };

    if let Some(current) = scopes.last_mut() {
        current.push((prefix.clone(), namespace.to_string()));
    }
    prefix
}

fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{prefix}:{local}")
    }
}

fn write_element(
    element: &XmlElement,
    out: &mut String,
    scopes: &mut Vec<Vec<(String, String)>>,
    generated: &mut usize,
) {
    scopes.push(element.namespaces.clone());

    let namespace = element.name.namespace();
    let tag = if namespace.is_empty() {
        // An unqualified element must not inherit a default namespace.
        if lookup(scopes, "").is_some_and(|uri| !uri.is_empty()) {
            if let Some(current) = scopes.last_mut() {
                current.push((String::new(), String::new()));
            }
        }
        element.name.local_name().to_string()
    } else {
        let prefix = ensure_prefix(scopes, namespace, true, generated);
        qualified(&prefix, element.name.local_name())
    };

    let mut attrs = String::new();
    for (name, value) in &element.attributes {
        let key = if name.namespace().is_empty() {
            name.local_name().to_string()
        } else if name.namespace() == XML_NS {
            qualified("xml", name.local_name())
        } else {
            let prefix = ensure_prefix(scopes, name.namespace(), false, generated);
            qualified(&prefix, name.local_name())
        };
        attrs.push_str(&format!(" {}=\"{}\"", key, escape_xml(value)));
    }

    out.push('<');
    out.push_str(&tag);
    if let Some(current) = scopes.last() {
        // Explicit declarations first, then the ones added while resolving names.
        for (prefix, uri) in current {
            if prefix.is_empty() {
                out.push_str(&format!(" xmlns=\"{}\"", escape_xml(uri)));
            } else {
                out.push_str(&format!(" xmlns:{}=\"{}\"", prefix, escape_xml(uri)));
            }
        }
    }
    out.push_str(&attrs);

    if element.children.is_empty() {
        out.push_str("/>");
    } else {
        out.push('>');
        for node in &element.children {
            match node {
                XmlNode::Text(t) => out.push_str(&escape_xml(t)),
                XmlNode::Element(child) => write_element(child, out, scopes, generated),
            }
        }
        out.push_str("</");
        out.push_str(&tag);
        out.push('>');
    }

    scopes.pop();
}

// ----------- parsing -----------

struct TreeBuilder {
    scopes: Vec<Vec<(String, String)>>,
    open: Vec<XmlElement>,
    root: Option<XmlElement>,
    pending: String,
    pending_significant: bool,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            scopes: Vec::with_capacity(16),
            open: Vec::with_capacity(16),
            root: None,
            pending: String::new(),
            pending_significant: false,
        }
    }

    fn resolve(&self, prefix: &str) -> Result<String, XmlError> {
        match prefix {
            "xml" => Ok(XML_NS.to_string()),
            "" => Ok(lookup(&self.scopes, "").unwrap_or_default().to_string()),
            p => lookup(&self.scopes, p)
                .map(str::to_string)
                .ok_or_else(|| XmlError::UnknownPrefix(p.to_string())),
        }
    }

    fn resolve_qname(&self, raw: &[u8], is_attribute: bool) -> Result<XName, XmlError> {
        let raw = std::str::from_utf8(raw).map_err(|e| XmlError::Syntax(e.to_string()))?;
        match raw.split_once(':') {
            Some((prefix, local)) => Ok(XName::new(self.resolve(prefix)?, local.to_string())),
            // Unprefixed attributes are in no namespace.
            None if is_attribute => Ok(XName::local(raw.to_string())),
            None => Ok(XName::new(self.resolve("")?, raw.to_string())),
        }
    }

    fn flush_text(&mut self) {
        if self.pending_significant
            && let Some(current) = self.open.last_mut()
        {
            current.push_text(std::mem::take(&mut self.pending));
        }
        self.pending.clear();
        self.pending_significant = false;
    }

    fn on_text(&mut self, text: &str, significant: bool) {
        if self.open.is_empty() {
            return;
        }
        self.pending.push_str(text);
        self.pending_significant |= significant || !text.trim().is_empty();
    }

    fn on_start(&mut self, event: &BytesStart<'_>) -> Result<(), XmlError> {
        self.flush_text();

        let mut declarations = Vec::new();
        let mut raw_attributes = Vec::new();
        for attr in event.attributes().with_checks(false) {
            let attr = attr.map_err(|e| XmlError::Syntax(e.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| XmlError::Syntax(e.to_string()))?
                .to_string();
            let value = decode_text(attr.value.as_ref())?;
            if key == "xmlns" {
                declarations.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((prefix.to_string(), value));
            } else {
                raw_attributes.push((key, value));
            }
        }

        self.scopes.push(declarations.clone());
        let name = self.resolve_qname(event.name().as_ref(), false)?;
        let mut element = XmlElement::new(name);
        element.namespaces = declarations;
        for (key, value) in raw_attributes {
            let name = self.resolve_qname(key.as_bytes(), true)?;
            element.attributes.push((name, value));
        }
        self.open.push(element);
        Ok(())
    }

    fn on_end(&mut self, raw: &[u8]) -> Result<(), XmlError> {
        self.flush_text();
        let Some(element) = self.open.pop() else {
            return Err(XmlError::UnbalancedTag(
                String::from_utf8_lossy(raw).into_owned(),
            ));
        };
        self.scopes.pop();
        match self.open.last_mut() {
            Some(parent) => parent.push(element),
            None => self.root = Some(element),
        }
        Ok(())
    }

    fn finish(self) -> Result<XmlDocument, XmlError> {
        if let Some(unclosed) = self.open.last() {
            return Err(XmlError::Syntax(format!(
                "unclosed element `{}`",
                unclosed.name
            )));
        }
        self.root.map(XmlDocument::new).ok_or(XmlError::NoRoot)
    }
}

fn parse_document(input: &[u8]) -> Result<XmlDocument, XmlError> {
    let mut xml = Reader::from_reader(input);
    xml.config_mut().trim_text(false);

    let mut buf = Vec::with_capacity(8 * 1024);
    let mut builder = TreeBuilder::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => builder.on_start(&e)?,
            Ok(Event::Empty(e)) => {
                builder.on_start(&e)?;
                builder.on_end(e.name().as_ref())?;
            }
            Ok(Event::End(e)) => builder.on_end(e.name().as_ref())?,
            Ok(Event::Text(e)) => {
                let text = decode_text(&e)?;
                builder.on_text(&text, false);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                builder.on_text(&text, true);
            }
            Ok(Event::GeneralRef(e)) => {
                let name = String::from_utf8_lossy(&e);
                builder.on_text(&resolve_entity(&name)?, true);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(XmlError::Syntax(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    builder.finish()
}

fn decode_text(raw: &[u8]) -> Result<String, XmlError> {
    let text = String::from_utf8_lossy(raw);
    unescape(&text)
        .map(Cow::into_owned)
        .map_err(|e| XmlError::Syntax(e.to_string()))
}

fn resolve_entity(name: &str) -> Result<String, XmlError> {
    let resolved = match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or(name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()
            } else {
                name.strip_prefix('#').and_then(|dec| dec.parse::<u32>().ok())
            };
            code.and_then(char::from_u32)
        }
    };
    resolved
        .map(String::from)
        .ok_or_else(|| XmlError::Entity(name.to_string()))
}
