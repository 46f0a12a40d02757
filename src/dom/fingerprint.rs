use crate::config::SyncOptions;
use crate::dom::element::ElementNode;
use crate::dom::tree::{DomTree, NodePath, NodeRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Structural description of an inspected element
///
/// Snapshotted in the preview at inspection time and consumed once by the
/// host's locating pipeline. `index` is the element's position among all
/// same-tag elements in *rendered* order, which can differ from the order
/// those tags appear in the source text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementFingerprint {
    /// Lower-case tag name
    pub tag_name: String,

    /// Display selector: `tag#id.class1.class2`
    pub selector: String,

    /// Trimmed text content, truncated
    #[serde(default)]
    pub text_content: String,

    #[serde(default)]
    pub outer_html: String,

    /// The raw opening tag
    #[serde(default)]
    pub open_tag: String,

    /// Class tokens in attribute order, tooling classes removed
    #[serde(default)]
    pub class_list: Vec<String>,

    #[serde(default)]
    pub attributes: IndexMap<String, String>,

    #[serde(default)]
    pub parent_tag: String,

    /// First non-tooling class of the parent
    #[serde(default)]
    pub parent_class: String,

    #[serde(default)]
    pub index: usize,
}

/// The identity used to suppress repeated inspections of one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectKey {
    pub tag_name: String,
    pub index: usize,
    pub text_content: String,
}

impl ElementFingerprint {
    /// Create a bare fingerprint for a tag
    pub fn new(tag_name: impl Into<String>) -> Self {
        let tag_name = tag_name.into().to_ascii_lowercase();
        Self {
            selector: tag_name.clone(),
            tag_name,
            ..Default::default()
        }
    }

    /// Builder method: set an attribute, keeping `selector`/`class_list` in step
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if name == "class" {
            self.class_list = value.split_whitespace().map(str::to_string).collect();
        }
        self.attributes.insert(name, value);
        self.selector = build_selector(&self.tag_name, self.attributes.get("id").map(String::as_str), &self.class_list);
        self
    }

    /// Builder method: set text content
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = text.into();
        self
    }

    /// Builder method: set the opening tag
    pub fn with_open_tag(mut self, open_tag: impl Into<String>) -> Self {
        self.open_tag = open_tag.into();
        self
    }

    /// Builder method: set the parent context
    pub fn with_parent(mut self, tag: impl Into<String>, class: impl Into<String>) -> Self {
        self.parent_tag = tag.into();
        self.parent_class = class.into();
        self
    }

    /// Builder method: set the rendered same-tag index
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    pub fn href(&self) -> Option<&str> {
        self.attributes.get("href").map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn src(&self) -> Option<&str> {
        self.attributes.get("src").map(String::as_str).filter(|v| !v.is_empty())
    }

    /// The id encoded in `selector` (text after `#` up to the next `.`)
    pub fn selector_id(&self) -> Option<&str> {
        let (_, rest) = self.selector.split_once('#')?;
        let id = rest.split('.').next().unwrap_or_default();
        (!id.is_empty()).then_some(id)
    }

    pub fn key(&self) -> InspectKey {
        InspectKey {
            tag_name: self.tag_name.clone(),
            index: self.index,
            text_content: self.text_content.clone(),
        }
    }

    /// Fingerprint the element a pointer event landed on
    ///
    /// Text targets resolve to their parent element, then inline wrappers
    /// (`span`, `strong`, ...) are skipped upward so the result names a
    /// structural element. Returns `None` for the document element and body.
    pub fn inspect(tree: &DomTree, target: &[usize], options: &SyncOptions) -> Option<Self> {
        let path = resolve_block_target(tree, target, options)?;
        Self::extract(tree, &path, options)
    }

    /// Fingerprint the element at `path` as-is
    pub fn extract(tree: &DomTree, path: &[usize], options: &SyncOptions) -> Option<Self> {
        if tree.is_document_container(path) {
            return None;
        }
        let element = tree.element(path)?;
        let clean = without_tooling(element, options);

        let tag_name = element.tag_name.to_ascii_lowercase();
        let class_list: Vec<String> = clean.classes().map(str::to_string).collect();
        let selector = build_selector(&tag_name, clean.id().map(String::as_str), &class_list);

        let text_content: String = element
            .text_content()
            .trim()
            .chars()
            .take(options.text_snippet_chars)
            .collect();

        let (parent_tag, parent_class) = DomTree::parent_path(path)
            .and_then(|parent| tree.element(&parent))
            .map(|parent| {
                let class = parent
                    .classes()
                    .find(|c| !options.is_internal(c))
                    .unwrap_or_default()
                    .to_string();
                (parent.tag_name.to_ascii_lowercase(), class)
            })
            .unwrap_or_default();

        Some(Self {
            tag_name,
            selector,
            text_content,
            outer_html: clean.outer_html(),
            open_tag: clean.open_tag(),
            class_list,
            attributes: clean.attributes.clone(),
            parent_tag,
            parent_class,
            index: tree.index_among_tag(path).unwrap_or(0),
        })
    }
}

/// Walk from an event target up to the block-level element it belongs to
pub fn resolve_block_target(tree: &DomTree, target: &[usize], options: &SyncOptions) -> Option<NodePath> {
    let mut path: NodePath = match tree.node(target)? {
        NodeRef::Text(_) => DomTree::parent_path(target)?,
        NodeRef::Element(_) => target.to_vec(),
    };

    loop {
        if tree.is_document_container(&path) {
            break;
        }
        let element = tree.element(&path)?;
        if !options.is_inline_tag(&element.tag_name) {
            break;
        }
        match DomTree::parent_path(&path) {
            Some(parent) => path = parent,
            None => break,
        }
    }

    Some(path)
}

fn build_selector(tag_name: &str, id: Option<&str>, classes: &[String]) -> String {
    let mut selector = tag_name.to_string();
    if let Some(id) = id.filter(|id| !id.is_empty()) {
        selector.push('#');
        selector.push_str(id);
    }
    if !classes.is_empty() {
        selector.push('.');
        selector.push_str(&classes.join("."));
    }
    selector
}

/// Shallow copy with tooling attributes and class tokens removed
fn without_tooling(element: &ElementNode, options: &SyncOptions) -> ElementNode {
    let mut clean = element.clone();
    clean.outline = None;
    clean.attributes = element
        .attributes
        .iter()
        .filter(|(name, _)| !options.is_internal(name))
        .filter_map(|(name, value)| {
            if name != "class" {
                return Some((name.clone(), value.clone()));
            }
            let classes: Vec<&str> = value.split_whitespace().filter(|c| !options.is_internal(c)).collect();
            (!classes.is_empty()).then(|| (name.clone(), classes.join(" ")))
        })
        .collect();
    clean
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> DomTree {
        let nav = ElementNode::new("NAV")
            .with_attribute("class", "copilot-x main-nav")
            .with_child(ElementNode::new("A").with_attribute("href", "#home").with_text("Home"))
            .with_child(
                ElementNode::new("A")
                    .with_attribute("href", "#about")
                    .with_attribute("class", "nav-link copilot-highlight-element")
                    .with_attribute("data-copilot", "1")
                    .with_text("About"),
            );
        let p = ElementNode::new("P")
            .with_attribute("id", "intro")
            .with_text("  Hello ")
            .with_child(ElementNode::new("SPAN").with_child(ElementNode::new("STRONG").with_text("bold")))
            .with_text(" world  ");
        let body = ElementNode::new("BODY").with_child(nav).with_child(p);
        DomTree::new(ElementNode::new("HTML").with_child(ElementNode::new("HEAD")).with_child(body))
    }

    #[test]
    fn test_extract_anchor() {
        let tree = page();
        let fp = ElementFingerprint::extract(&tree, &[1, 0, 1], &SyncOptions::default()).unwrap();

        assert_eq!(fp.tag_name, "a");
        assert_eq!(fp.selector, "a.nav-link");
        assert_eq!(fp.text_content, "About");
        assert_eq!(fp.class_list, vec!["nav-link"]);
        assert_eq!(fp.href(), Some("#about"));
        assert_eq!(fp.attributes.get("class").unwrap(), "nav-link");
        assert!(fp.attributes.get("data-copilot").is_none());
        assert_eq!(fp.open_tag, "<a href=\"#about\" class=\"nav-link\">");
        assert_eq!(fp.outer_html, "<a href=\"#about\" class=\"nav-link\">About</a>");
        assert_eq!(fp.parent_tag, "nav");
        assert_eq!(fp.parent_class, "main-nav");
        assert_eq!(fp.index, 1);
    }

    #[test]
    fn test_body_and_root_are_not_fingerprinted() {
        let tree = page();
        let options = SyncOptions::default();
        assert!(ElementFingerprint::extract(&tree, &[], &options).is_none());
        assert!(ElementFingerprint::extract(&tree, &[1], &options).is_none());
    }

    #[test]
    fn test_inspect_walks_past_inline_wrappers() {
        let tree = page();
        let options = SyncOptions::default();

        // Text node inside <strong> inside <span> inside <p>
        let fp = ElementFingerprint::inspect(&tree, &[1, 1, 1, 0, 0], &options).unwrap();
        assert_eq!(fp.tag_name, "p");
        assert_eq!(fp.selector, "p#intro");
        assert_eq!(fp.text_content, "Hello bold world");
        assert_eq!(fp.parent_tag, "body");

        // Text node directly inside <p>
        let fp = ElementFingerprint::inspect(&tree, &[1, 1, 0], &options).unwrap();
        assert_eq!(fp.tag_name, "p");
    }

    #[test]
    fn test_inline_directly_in_body_resolves_to_none() {
        let body = ElementNode::new("BODY").with_child(ElementNode::new("SPAN").with_text("loose"));
        let tree = DomTree::new(ElementNode::new("HTML").with_child(body));
        let options = SyncOptions::default();
        assert_eq!(resolve_block_target(&tree, &[0, 0, 0], &options), Some(vec![0]));
        assert!(ElementFingerprint::inspect(&tree, &[0, 0, 0], &options).is_none());
    }

    #[test]
    fn test_text_truncation() {
        let long = "x".repeat(80);
        let body = ElementNode::new("BODY").with_child(ElementNode::new("P").with_text(long));
        let tree = DomTree::new(ElementNode::new("HTML").with_child(body));
        let fp = ElementFingerprint::extract(&tree, &[0, 0], &SyncOptions::default()).unwrap();
        assert_eq!(fp.text_content.chars().count(), 50);
    }

    #[test]
    fn test_selector_id() {
        let fp = ElementFingerprint::new("div")
            .with_attribute("id", "hero")
            .with_attribute("class", "a b");
        assert_eq!(fp.selector, "div#hero.a.b");
        assert_eq!(fp.selector_id(), Some("hero"));
        assert_eq!(ElementFingerprint::new("div").selector_id(), None);
    }

    #[test]
    fn test_wire_format() {
        let fp = ElementFingerprint::new("A")
            .with_attribute("href", "#about")
            .with_text("About")
            .with_index(1);
        let json = serde_json::to_value(&fp).unwrap();
        assert_eq!(json["tagName"], "a");
        assert_eq!(json["textContent"], "About");
        assert_eq!(json["classList"], serde_json::json!([]));
        assert_eq!(json["index"], 1);

        let minimal: ElementFingerprint =
            serde_json::from_value(serde_json::json!({"tagName": "h1", "selector": "h1"})).unwrap();
        assert_eq!(minimal.index, 0);
        assert!(minimal.attributes.is_empty());
    }
}
