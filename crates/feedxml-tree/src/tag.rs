//! The element tree.
//!
//! Every element in a document becomes a [`Tag`]:
//! - `<title>Hi</title>` is `Tag { name: "title", value: Some("Hi"), .. }`
//! - `<media:content url="x"/>` is `Tag { name: "content", prefix: Some("media"), attributes: {url: x}, .. }`
//! - `<item><title/></item>` is `Tag { name: "item", children: [Tag { name: "title", .. }], .. }`
//!
//! Only character data sitting directly inside an element contributes to its
//! `value`. Text inside descendants stays with the descendant.

use std::collections::{BTreeMap, BTreeSet, HashMap};

/// An element of the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    /// Local element name, without prefix.
    pub name: String,
    /// Namespace prefix declared for the element's namespace, if any.
    pub prefix: Option<String>,
    /// Attributes by qualified name.
    pub attributes: BTreeMap<String, String>,
    /// Concatenated direct character data, absent until the first fragment.
    pub value: Option<String>,
    /// Child elements in document order.
    pub children: Vec<Tag>,
}

impl Tag {
    /// Create an element with no prefix, attributes, value or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the namespace prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the text value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Append a child element.
    pub fn with_child(mut self, child: Tag) -> Self {
        self.children.push(child);
        self
    }

    /// `prefix:name`, or just `name` when there is no prefix.
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Append a character data fragment to the value.
    pub fn append_text(&mut self, text: &str) {
        match &mut self.value {
            Some(value) => value.push_str(text),
            None => self.value = Some(text.to_string()),
        }
    }

    /// Value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The text value, if any character data was seen.
    pub fn text(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Whether the element has attributes or children.
    pub fn has_structure(&self) -> bool {
        !self.attributes.is_empty() || !self.children.is_empty()
    }

    /// First direct child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Tag> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given local name, in document order.
    pub fn children_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Tag> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// All direct children carrying the given prefix, in document order.
    pub fn children_with_prefix<'a>(&'a self, prefix: &str) -> impl Iterator<Item = &'a Tag> {
        self.children
            .iter()
            .filter(move |c| c.prefix.as_deref() == Some(prefix))
    }

    /// Direct children by local name. The first occurrence of a name wins.
    pub fn children_index(&self) -> HashMap<&str, &Tag> {
        let mut index = HashMap::new();
        for child in &self.children {
            index.entry(child.name.as_str()).or_insert(child);
        }
        index
    }

    /// Like [`children_index`](Self::children_index), restricted to children
    /// carrying `prefix`.
    pub fn children_index_with_prefix(&self, prefix: &str) -> HashMap<&str, &Tag> {
        let mut index = HashMap::new();
        for child in self.children_with_prefix(prefix) {
            index.entry(child.name.as_str()).or_insert(child);
        }
        index
    }

    /// Prefixes carried by direct children.
    pub fn namespaces(&self) -> BTreeSet<&str> {
        self.children
            .iter()
            .filter_map(|c| c.prefix.as_deref())
            .collect()
    }

    /// Number of elements below this one.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> Tag {
        Tag::new("item")
            .with_child(Tag::new("title").with_value("Hello"))
            .with_child(Tag::new("category").with_value("a"))
            .with_child(Tag::new("category").with_value("b"))
            .with_child(
                Tag::new("content")
                    .with_prefix("media")
                    .with_attribute("url", "http://x/1.mp3"),
            )
            .with_child(Tag::new("title").with_prefix("media").with_value("Media"))
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(Tag::new("title").qualified_name(), "title");
        assert_eq!(
            Tag::new("title").with_prefix("media").qualified_name(),
            "media:title"
        );
    }

    #[test]
    fn test_append_text() {
        let mut tag = Tag::new("t");
        assert_eq!(tag.text(), None);
        tag.append_text("a");
        tag.append_text("");
        tag.append_text("b");
        assert_eq!(tag.text(), Some("ab"));
    }

    #[test]
    fn test_children_index_first_wins() {
        let item = item();
        let index = item.children_index();
        assert_eq!(index["category"].text(), Some("a"));
        // the unprefixed title comes first
        assert_eq!(index["title"].text(), Some("Hello"));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_prefix_views() {
        let item = item();
        let media: Vec<_> = item.children_with_prefix("media").map(|c| &c.name).collect();
        assert_eq!(media, ["content", "title"]);

        let index = item.children_index_with_prefix("media");
        assert_eq!(index["title"].text(), Some("Media"));
        assert!(!index.contains_key("category"));

        assert_eq!(item.namespaces().into_iter().collect::<Vec<_>>(), ["media"]);
    }

    #[test]
    fn test_children_named() {
        let item = item();
        let values: Vec<_> = item.children_named("category").filter_map(Tag::text).collect();
        assert_eq!(values, ["a", "b"]);
        assert_eq!(item.child("category").and_then(Tag::text), Some("a"));
        assert!(item.child("missing").is_none());
    }

    #[test]
    fn test_descendant_count() {
        let tree = Tag::new("rss").with_child(item()).with_child(Tag::new("channel"));
        assert_eq!(tree.descendant_count(), 7);
        assert_eq!(Tag::new("leaf").descendant_count(), 0);
    }
}
