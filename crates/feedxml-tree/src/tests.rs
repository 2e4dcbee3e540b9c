use super::*;

const ITEM: &str = r#"<item><title>Hello</title><category term="a"/><category term="b"/></item>"#;

#[test]
fn test_parse_simple() {
    let root = parse(ITEM).unwrap();
    assert_eq!(root.name, "item");
    assert_eq!(root.children.len(), 3);
    assert_eq!(root.child("title").and_then(Tag::text), Some("Hello"));

    let terms: Vec<_> = root
        .children_named("category")
        .filter_map(|c| c.attribute("term"))
        .collect();
    assert_eq!(terms, ["a", "b"]);
}

#[test]
fn test_childless_root() {
    let root = parse("<title>Only</title>").unwrap();
    assert_eq!(root, Tag::new("title").with_value("Only"));
}

#[test]
fn test_prefix_resolved_from_declaration() {
    let source = r#"<rss xmlns:media="http://search.yahoo.com/mrss/" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
<media:content url="http://x/1.mp3"/>
<itunes:author>Jane</itunes:author>
<title>Plain</title>
</rss>"#;
    let root = parse(source).unwrap();
    assert_eq!(root.prefix, None);

    let qualified: Vec<_> = root.children.iter().map(Tag::qualified_name).collect();
    assert_eq!(qualified, ["media:content", "itunes:author", "title"]);
    assert_eq!(
        root.namespaces().into_iter().collect::<Vec<_>>(),
        ["itunes", "media"]
    );
}

#[test]
fn test_default_namespace_has_no_prefix() {
    let root = parse(r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>t</title></feed>"#).unwrap();
    assert_eq!(root.prefix, None);
    assert_eq!(root.children[0].prefix, None);
}

#[test]
fn test_namespace_last_write_wins() {
    let events = vec![
        SaxEvent::StartPrefixMapping {
            prefix: "a".into(),
            uri: "urn:x".into(),
        },
        SaxEvent::StartPrefixMapping {
            prefix: "b".into(),
            uri: "urn:x".into(),
        },
        SaxEvent::StartElement {
            name: "root".into(),
            namespace_uri: Some("urn:x".into()),
            attributes: vec![],
        },
        SaxEvent::end("root"),
    ];
    let root = TreeBuilder::build(events).unwrap();
    assert_eq!(root.prefix.as_deref(), Some("b"));
}

#[test]
fn test_attributes_exclude_namespace_declarations() {
    let root = parse(r#"<enclosure xmlns:x="urn:x" url="u" length="12" x:flag="1"/>"#).unwrap();
    let names: Vec<_> = root.attributes.keys().map(String::as_str).collect();
    assert_eq!(names, ["length", "url", "x:flag"]);
}

#[test]
fn test_text_is_direct_only() {
    let root = parse("<a>head<b>inner</b>tail</a>").unwrap();
    assert_eq!(root.text(), Some("headtail"));
    assert_eq!(root.children[0].text(), Some("inner"));
}

#[test]
fn test_value_absent_without_text() {
    let root = parse("<a><b/></a>").unwrap();
    assert_eq!(root.value, None);
    assert_eq!(root.children[0].value, None);
}

#[test]
fn test_entities_in_text() {
    let root = parse("<title>Tom &amp; Jerry</title>").unwrap();
    assert_eq!(root.text(), Some("Tom & Jerry"));
}

#[test]
fn test_empty_stream_has_no_root() {
    let err = TreeBuilder::build(Vec::<SaxEvent<'_>>::new()).unwrap_err();
    assert_eq!(err.to_string(), "malformed document: document has no root element");
}

#[test]
fn test_scanner_error_is_source() {
    use std::error::Error as _;

    let err = parse("<a><b></a>").unwrap_err();
    assert!(matches!(
        &err,
        BuildError::Malformed {
            source: Some(_),
            ..
        }
    ));
    assert!(err.source().is_some());
    assert!(err.offset().is_some());
}

#[test]
fn test_unclosed_elements() {
    let events = vec![SaxEvent::start("rss"), SaxEvent::start("channel")];
    let err = TreeBuilder::build(events).unwrap_err();
    assert_eq!(err, BuildError::Unclosed { open: 2 });
    assert_eq!(err.offset(), None);
}

#[test]
fn test_deep_nesting_is_rejected() {
    let depth = 100_000;
    let source = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
    let err = parse(&source).unwrap_err();
    assert_eq!(
        err,
        BuildError::TooDeep {
            limit: TreeBuilder::DEFAULT_MAX_DEPTH
        }
    );
}

#[test]
fn test_max_depth_boundary() {
    let source = "<a><b><c/></b></a>";
    let root = crate::parse_with_max_depth(source, 3).unwrap();
    assert_eq!(root.children[0].children[0].name, "c");

    let err = crate::parse_with_max_depth(source, 2).unwrap_err();
    assert_eq!(err, BuildError::TooDeep { limit: 2 });
}

#[test]
fn test_first_root_wins() {
    let events = vec![
        SaxEvent::start("first"),
        SaxEvent::end("first"),
        SaxEvent::start("second"),
        SaxEvent::end("second"),
    ];
    let root = TreeBuilder::build(events).unwrap();
    assert_eq!(root.name, "first");
}

#[test]
fn test_push_style_builder() {
    let mut builder = TreeBuilder::new();
    Scanner::new(ITEM).parse(&mut builder);
    let root = builder.finish().unwrap();
    assert_eq!(root, parse(ITEM).unwrap());
}
