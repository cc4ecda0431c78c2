use fast_webdav_rs::webdav::escape_xml;
use fast_webdav_rs::{XName, XmlDocument, XmlElement, XmlError, XmlNode, names};

const PROPFIND_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<multistatus xmlns="DAV:" xmlns:z="http://example.com/foo">
  <response>
    <href>/docs/</href>
    <propstat>
      <prop>
        <displayname>docs</displayname>
        <resourcetype><collection/></resourcetype>
      </prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
  <response>
    <href>/docs/a%20b.txt</href>
    <propstat>
      <prop>
        <displayname>a &amp; b &#233;</displayname>
        <getcontentlength>42</getcontentlength>
        <z:MyProperty>value</z:MyProperty>
      </prop>
      <status>HTTP/1.1 200 OK</status>
    </propstat>
  </response>
</multistatus>"#;

#[test]
fn test_xname_display_and_parts() {
    let name = XName::new(names::EXTENSION_NS, "MyProperty");
    assert_eq!(name.namespace(), "http://example.com/foo");
    assert_eq!(name.local_name(), "MyProperty");
    assert_eq!(name.to_string(), "{http://example.com/foo}MyProperty");
    assert_eq!(XName::local("plain").to_string(), "plain");
    assert_eq!(names::dav("href"), names::HREF);
}

#[test]
fn test_parse_default_namespace_matches_dav_names() {
    let doc = XmlDocument::parse(PROPFIND_RESPONSE.as_bytes()).expect("should parse");
    assert_eq!(doc.root().name(), &names::MULTISTATUS);

    let hrefs: Vec<String> = doc.descendants(&names::HREF).map(|h| h.text()).collect();
    assert_eq!(hrefs, vec!["/docs/", "/docs/a%20b.txt"]);
}

#[test]
fn test_parse_prefixed_names_and_entities() {
    let doc = XmlDocument::parse(PROPFIND_RESPONSE.as_bytes()).expect("should parse");
    let names_found: Vec<String> = doc
        .descendants(&names::DISPLAY_NAME)
        .map(|d| d.text())
        .collect();
    assert_eq!(names_found, vec!["docs", "a & b é"]);

    let custom = XName::new(names::EXTENSION_NS, "MyProperty");
    let value = doc.descendant(&custom).map(|e| e.text());
    assert_eq!(value.as_deref(), Some("value"));
}

#[test]
fn test_document_descendant_outlives_query_name() {
    let doc = XmlDocument::parse(PROPFIND_RESPONSE.as_bytes()).expect("should parse");
    let found = {
        let name = XName::new("DAV:", "multistatus");
        doc.descendant(&name)
    };
    assert_eq!(found.map(|e| e.name().local_name()), Some("multistatus"));

    let first_href = {
        let name = names::HREF;
        doc.descendant(&name)
    };
    assert_eq!(first_href.map(|e| e.text()).as_deref(), Some("/docs/"));
}

#[test]
fn test_element_queries() {
    let doc = XmlDocument::parse(PROPFIND_RESPONSE.as_bytes()).expect("should parse");
    let first = doc.root().element(&names::RESPONSE).expect("first response");
    assert_eq!(first.children().count(), 2);
    assert!(first.descendant(&names::COLLECTION).is_some());
    assert_eq!(doc.root().elements(&names::RESPONSE).count(), 2);
    assert_eq!(doc.root().descendants_named(&names::PROPSTAT).count(), 2);
    assert!(doc.root().element(&names::HREF).is_none());
}

#[test]
fn test_descendants_are_in_document_order() {
    let doc = XmlDocument::parse(
        br#"<a:root xmlns:a="urn:t"><a:x><a:y/></a:x><a:z/></a:root>"#,
    )
    .expect("should parse");
    let order: Vec<&str> = doc
        .root()
        .descendants()
        .map(|e| e.name().local_name())
        .collect();
    assert_eq!(order, vec!["x", "y", "z"]);
}

#[test]
fn test_attributes_and_unqualified_attribute_namespace() {
    let doc = XmlDocument::parse(
        br#"<D:prop xmlns:D="DAV:" xmlns:x="urn:x" lang="en" x:flag="1"/>"#,
    )
    .expect("should parse");
    let root = doc.root();
    assert_eq!(root.attribute(&XName::local("lang")), Some("en"));
    assert_eq!(root.attribute(&XName::new("urn:x", "flag")), Some("1"));
    assert_eq!(root.attribute(&XName::new("DAV:", "lang")), None);
}

#[test]
fn test_text_keeps_cdata_and_skips_layout_whitespace() {
    let doc = XmlDocument::parse(
        b"<D:prop xmlns:D=\"DAV:\">\n  <D:displayname><![CDATA[<raw>]]></D:displayname>\n</D:prop>",
    )
    .expect("should parse");
    let root = doc.root();
    assert!(
        root.nodes()
            .iter()
            .all(|n| matches!(n, XmlNode::Element(_)))
    );
    assert_eq!(root.text(), "<raw>");
}

#[test]
fn test_parse_errors() {
    assert!(matches!(
        XmlDocument::parse(b"<D:prop>"),
        Err(XmlError::UnknownPrefix(_)) | Err(XmlError::Syntax(_))
    ));
    assert!(matches!(
        XmlDocument::parse(b"<a><b></a>"),
        Err(XmlError::UnbalancedTag(_)) | Err(XmlError::Syntax(_))
    ));
    assert!(matches!(XmlDocument::parse(b""), Err(XmlError::NoRoot)));
    assert!(matches!(
        XmlDocument::parse(b"<a>&bogus;</a>"),
        Err(XmlError::Entity(_)) | Err(XmlError::Syntax(_))
    ));
}

#[test]
fn test_serialize_auto_declares_dav_prefix() {
    let doc: XmlDocument = XmlElement::new(names::PROPFIND)
        .with_child(XmlElement::new(names::PROP).with_child(XmlElement::new(names::DISPLAY_NAME)))
        .into();
    assert_eq!(
        doc.to_xml_string(),
        r#"<?xml version="1.0" encoding="utf-8"?><D:propfind xmlns:D="DAV:"><D:prop><D:displayname/></D:prop></D:propfind>"#
    );
}

#[test]
fn test_serialize_respects_explicit_declarations() {
    let doc: XmlDocument = XmlElement::new(names::PROPERTY_UPDATE)
        .with_namespace("d", "DAV:")
        .with_namespace("Z", names::EXTENSION_NS)
        .with_child(
            XmlElement::new(names::SET).with_child(
                XmlElement::new(names::PROP).with_child(
                    XmlElement::new(XName::new(names::EXTENSION_NS, "Author"))
                        .with_text("Ann & <Bob>"),
                ),
            ),
        )
        .into();
    let xml = doc.to_xml_string();
    assert!(xml.contains(r#"<d:propertyupdate xmlns:d="DAV:" xmlns:Z="http://example.com/foo">"#));
    assert!(xml.contains("<Z:Author>Ann &amp; &lt;Bob&gt;</Z:Author>"));
}

#[test]
fn test_serialize_generates_prefix_for_undeclared_namespace() {
    let doc: XmlDocument = XmlElement::new(names::PROP)
        .with_child(XmlElement::new(XName::new("urn:custom", "Tag")))
        .into();
    let xml = doc.to_xml_string();
    assert!(xml.contains(r#"<ns0:Tag xmlns:ns0="urn:custom"/>"#), "{xml}");
}

#[test]
fn test_serialize_then_parse_preserves_tree() {
    let original: XmlDocument = XmlElement::new(names::PROPFIND)
        .with_namespace("D", "DAV:")
        .with_child(
            XmlElement::new(names::PROP)
                .with_child(XmlElement::new(names::DISPLAY_NAME))
                .with_child(XmlElement::new(XName::new(names::EXTENSION_NS, "MyProperty")))
                .with_child(XmlElement::new(XName::local("bare")).with_text("x \"y\" 'z'")),
        )
        .into();
    let reparsed = XmlDocument::parse(&original.to_bytes()).expect("should reparse");
    assert_eq!(reparsed.root().name(), &names::PROPFIND);
    let prop = reparsed.root().element(&names::PROP).expect("prop");
    let children: Vec<XName> = prop.children().map(|c| c.name().clone()).collect();
    assert_eq!(
        children,
        vec![
            names::DISPLAY_NAME,
            XName::new(names::EXTENSION_NS, "MyProperty"),
            XName::local("bare"),
        ]
    );
    assert_eq!(
        prop.element(&XName::local("bare")).map(|e| e.text()).as_deref(),
        Some("x \"y\" 'z'")
    );
}

#[test]
fn test_mutation_helpers() {
    let mut el = XmlElement::new(names::DISPLAY_NAME);
    el.push_text("a");
    el.push_text("b");
    assert_eq!(el.text(), "ab");
    el.set_text("c");
    assert_eq!(el.nodes().len(), 1);
    el.set_attribute(XName::local("k"), "1");
    el.set_attribute(XName::local("k"), "2");
    assert_eq!(el.attributes().len(), 1);
    assert_eq!(el.attribute(&XName::local("k")), Some("2"));

    let mut doc = XmlDocument::new(XmlElement::new(names::PROP));
    doc.root_mut().push(el);
    assert!(doc.descendant(&names::DISPLAY_NAME).is_some());
    assert_eq!(doc.into_root().children().count(), 1);
}

#[test]
fn test_escape_xml() {
    assert_eq!(escape_xml(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&apos;&lt;/a&gt;");
}
