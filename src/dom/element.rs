use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Elements serialized without a closing tag
const VOID_ELEMENTS: [&str; 13] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node of the rendered preview document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "node_type", rename_all = "snake_case")]
pub enum DomNode {
    Element(ElementNode),
    Text { text: String },
}

impl DomNode {
    pub fn text(text: impl Into<String>) -> Self {
        DomNode::Text { text: text.into() }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            DomNode::Element(element) => Some(element),
            DomNode::Text { .. } => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
        match self {
            DomNode::Element(element) => Some(element),
            DomNode::Text { .. } => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, DomNode::Text { .. })
    }

    fn push_text_content(&self, out: &mut String) {
        match self {
            DomNode::Element(element) => {
                for child in &element.children {
                    child.push_text_content(out);
                }
            }
            DomNode::Text { text } => out.push_str(text),
        }
    }

    fn push_html(&self, out: &mut String) {
        match self {
            DomNode::Element(element) => element.push_html(out),
            DomNode::Text { text } => out.push_str(&escape_text(text)),
        }
    }
}

impl From<ElementNode> for DomNode {
    fn from(element: ElementNode) -> Self {
        DomNode::Element(element)
    }
}

/// Represents a rendered DOM element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElementNode {
    /// Tag name as reported by the DOM (usually upper-case, e.g. "DIV")
    pub tag_name: String,

    /// Attributes in document order
    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    /// Child nodes, elements and text interleaved
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<DomNode>,

    /// Outline drawn by the preview's highlight signals. Kept apart from the
    /// `style` attribute so tooling never leaks into fingerprints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outline: Option<String>,
}

impl ElementNode {
    /// Create a new ElementNode
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: IndexMap::new(),
            children: Vec::new(),
            outline: None,
        }
    }

    /// Builder method: set a single attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_attribute(key, value);
        self
    }

    /// Builder method: append a text child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(DomNode::text(text));
        self
    }

    /// Builder method: append an element child
    pub fn with_child(mut self, child: ElementNode) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder method: set children
    pub fn with_children(mut self, children: Vec<DomNode>) -> Self {
        self.children = children;
        self
    }

    /// Add a single attribute
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Add a child element
    pub fn add_child(&mut self, child: ElementNode) {
        self.children.push(child.into());
    }

    /// Get attribute value by key
    pub fn get_attribute(&self, key: &str) -> Option<&String> {
        self.attributes.get(key)
    }

    /// Get element ID
    pub fn id(&self) -> Option<&String> {
        self.attributes.get("id").filter(|id| !id.is_empty())
    }

    /// Class tokens in attribute order
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace())
            .into_iter()
            .flatten()
    }

    /// Check if element has a specific class
    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|c| c == class_name)
    }

    pub fn add_class(&mut self, class_name: &str) {
        if self.has_class(class_name) {
            return;
        }
        let classes = match self.attributes.get("class") {
            Some(existing) if !existing.trim().is_empty() => format!("{} {}", existing.trim(), class_name),
            _ => class_name.to_string(),
        };
        self.attributes.insert("class".to_string(), classes);
    }

    pub fn remove_class(&mut self, class_name: &str) {
        if !self.has_class(class_name) {
            return;
        }
        let remaining: Vec<&str> = self.classes().filter(|c| *c != class_name).collect();
        let remaining = remaining.join(" ");
        self.attributes.insert("class".to_string(), remaining);
    }

    /// Check if element is a specific tag
    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.iter().any(|v| self.is_tag(v))
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.push_text_content(&mut out);
        }
        out
    }

    /// Serialized opening tag, attributes in document order
    pub fn open_tag(&self) -> String {
        let mut out = String::new();
        self.push_open_tag(&mut out);
        out
    }

    /// Serialized element including descendants
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        self.push_html(&mut out);
        out
    }

    fn push_open_tag(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag_name.to_ascii_lowercase());
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }
        out.push('>');
    }

    fn push_html(&self, out: &mut String) {
        self.push_open_tag(out);
        if self.is_void() {
            return;
        }
        for child in &self.children {
            child.push_html(out);
        }
        out.push_str("</");
        out.push_str(&self.tag_name.to_ascii_lowercase());
        out.push('>');
    }
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_node_creation() {
        let element = ElementNode::new("BUTTON")
            .with_attribute("id", "test-id")
            .with_attribute("class", "btn primary")
            .with_text("Click me");

        assert!(element.is_tag("button"));
        assert_eq!(element.id(), Some(&"test-id".to_string()));
        assert_eq!(element.text_content(), "Click me");
    }

    #[test]
    fn test_has_class() {
        let mut element = ElementNode::new("div");
        element.add_attribute("class", "container main  active");

        assert!(element.has_class("container"));
        assert!(element.has_class("main"));
        assert!(element.has_class("active"));
        assert!(!element.has_class("hidden"));
    }

    #[test]
    fn test_add_remove_class() {
        let mut element = ElementNode::new("p").with_attribute("class", "lead");
        element.add_class("copilot-highlight-element");
        assert_eq!(
            element.get_attribute("class").unwrap(),
            "lead copilot-highlight-element"
        );
        element.add_class("lead");
        element.remove_class("copilot-highlight-element");
        assert_eq!(element.get_attribute("class").unwrap(), "lead");

        let mut bare = ElementNode::new("p");
        bare.add_class("x");
        assert_eq!(bare.get_attribute("class").unwrap(), "x");
    }

    #[test]
    fn test_text_content_interleaved() {
        let p = ElementNode::new("P")
            .with_text("Hello ")
            .with_child(ElementNode::new("STRONG").with_text("world"))
            .with_text("!");
        assert_eq!(p.text_content(), "Hello world!");
    }

    #[test]
    fn test_outer_html_and_open_tag() {
        let a = ElementNode::new("A")
            .with_attribute("href", "#about")
            .with_attribute("title", "say \"hi\"")
            .with_text("About & more");
        assert_eq!(a.open_tag(), "<a href=\"#about\" title=\"say &quot;hi&quot;\">");
        assert_eq!(
            a.outer_html(),
            "<a href=\"#about\" title=\"say &quot;hi&quot;\">About &amp; more</a>"
        );

        let img = ElementNode::new("IMG").with_attribute("src", "x.png");
        assert_eq!(img.outer_html(), "<img src=\"x.png\">");
    }

    #[test]
    fn test_serialization() {
        let element = ElementNode::new("UL")
            .with_child(ElementNode::new("LI").with_text("One"))
            .with_text("\n");

        let json = serde_json::to_string(&element).unwrap();
        assert!(json.contains("\"node_type\":\"element\""));
        assert!(json.contains("\"node_type\":\"text\""));
        let deserialized: ElementNode = serde_json::from_str(&json).unwrap();

        assert_eq!(element, deserialized);
    }
}
