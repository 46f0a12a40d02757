use crate::dom::element::{DomNode, ElementNode};
use crate::dom::selector::Selector;
use crate::error::{Result, SyncError};
use headless_chrome::Tab;
use std::sync::Arc;

/// Address of a node: child indices from the document element
pub type NodePath = Vec<usize>;

/// Represents the rendered DOM of a preview document
#[derive(Debug, Clone, PartialEq)]
pub struct DomTree {
    /// The document element (`<html>`)
    pub root: ElementNode,
}

impl DomTree {
    /// Create a tree rooted at the document element
    pub fn new(root: ElementNode) -> Self {
        Self { root }
    }

    /// Build DOM tree from a browser tab
    pub fn from_tab(tab: &Arc<Tab>) -> Result<Self> {
        // JavaScript code to extract the rendered document as JSON.
        // This returns a JSON string
        let js_code = include_str!("extract_dom.js");

        let result = tab
            .evaluate(js_code, false)
            .map_err(|e| SyncError::DomParseFailed(format!("Failed to execute DOM extraction script: {}", e)))?;

        let json_value = result
            .value
            .ok_or_else(|| SyncError::DomParseFailed("No value returned from DOM extraction".to_string()))?;

        // The script returns a JSON string, so parse it as a string first
        let json_str: String = serde_json::from_value(json_value)
            .map_err(|e| SyncError::DomParseFailed(format!("Failed to get JSON string: {}", e)))?;

        Self::from_json(&json_str)
    }

    /// Parse a tree previously produced by the extraction script or `to_json`
    pub fn from_json(json: &str) -> Result<Self> {
        let root: ElementNode = serde_json::from_str(json)
            .map_err(|e| SyncError::DomParseFailed(format!("Failed to parse DOM JSON: {}", e)))?;
        Ok(Self::new(root))
    }

    /// Convert the DOM tree to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.root)
            .map_err(|e| SyncError::DomParseFailed(format!("Failed to serialize DOM to JSON: {}", e)))
    }

    /// Node at `path`; the empty path is the document element
    pub fn node(&self, path: &[usize]) -> Option<NodeRef<'_>> {
        let mut current = &self.root;
        for (depth, &index) in path.iter().enumerate() {
            match current.children.get(index)? {
                DomNode::Element(child) => current = child,
                DomNode::Text { text } => {
                    // Text nodes are leaves.
                    return (depth + 1 == path.len()).then_some(NodeRef::Text(text));
                }
            }
        }
        Some(NodeRef::Element(current))
    }

    pub fn element(&self, path: &[usize]) -> Option<&ElementNode> {
        match self.node(path)? {
            NodeRef::Element(element) => Some(element),
            NodeRef::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, path: &[usize]) -> Option<&mut ElementNode> {
        let mut current = &mut self.root;
        for &index in path {
            current = current.children.get_mut(index)?.as_element_mut()?;
        }
        Some(current)
    }

    /// Path of the parent element, `None` for the document element
    pub fn parent_path(path: &[usize]) -> Option<NodePath> {
        path.split_last().map(|(_, parent)| parent.to_vec())
    }

    /// Path of the `<body>` element, if the document has one
    pub fn body_path(&self) -> Option<NodePath> {
        self.root
            .children
            .iter()
            .position(|child| child.as_element().is_some_and(|e| e.is_tag("body")))
            .map(|index| vec![index])
    }

    /// Whether `path` addresses the document element or the body
    pub fn is_document_container(&self, path: &[usize]) -> bool {
        path.is_empty() || self.body_path().as_deref() == Some(path)
    }

    /// All elements in document (pre-)order, document element first
    pub fn elements(&self) -> Vec<(NodePath, &ElementNode)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        Self::collect_elements(&self.root, &mut path, &mut out);
        out
    }

    fn collect_elements<'a>(node: &'a ElementNode, path: &mut NodePath, out: &mut Vec<(NodePath, &'a ElementNode)>) {
        out.push((path.clone(), node));
        for (i, child) in node.children.iter().enumerate() {
            if let DomNode::Element(element) = child {
                path.push(i);
                Self::collect_elements(element, path, out);
                path.pop();
            }
        }
    }

    /// Paths of every element with the tag, in document order
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodePath> {
        self.elements()
            .into_iter()
            .filter(|(_, element)| element.is_tag(tag))
            .map(|(path, _)| path)
            .collect()
    }

    /// Position of the element at `path` among all elements sharing its tag
    pub fn index_among_tag(&self, path: &[usize]) -> Option<usize> {
        let element = self.element(path)?;
        self.elements_by_tag(&element.tag_name)
            .iter()
            .position(|p| p.as_slice() == path)
    }

    /// Path of the `n`th element with the tag
    pub fn nth_by_tag(&self, tag: &str, n: usize) -> Option<NodePath> {
        self.elements_by_tag(tag).into_iter().nth(n)
    }

    /// Paths of every element matching a selector, in document order
    pub fn query_all(&self, selector: &Selector) -> Vec<NodePath> {
        self.elements()
            .into_iter()
            .map(|(path, _)| path)
            .filter(|path| selector.matches_at(self, path))
            .collect()
    }

    /// Path of the `n`th element matching a selector
    pub fn nth_match(&self, selector: &Selector, n: usize) -> Result<NodePath> {
        let mut matches = self.query_all(selector);
        if n >= matches.len() {
            return Err(SyncError::ElementNotFound(format!(
                "selector has {} match(es), no index {}",
                matches.len(),
                n
            )));
        }
        Ok(matches.swap_remove(n))
    }

    /// Count total elements in the tree
    pub fn count_elements(&self) -> usize {
        self.elements().len()
    }
}

/// Borrowed view of a node in the tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Element(&'a ElementNode),
    Text(&'a str),
}
