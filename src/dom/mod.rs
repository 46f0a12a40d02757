//! Rendered-document model
//!
//! The preview renders the user's HTML into a live DOM. This module holds
//! a snapshot of that DOM and the extractor that turns one of its elements
//! into a structural fingerprint:
//! - ElementNode / DomNode: elements and text nodes of the rendered document
//! - DomTree: the document with path addressing and same-tag ordinal lookups
//! - Selector: compound selectors with descendant and child combinators,
//!   used by preview highlight messages
//! - ElementFingerprint: what the host receives about an inspected element

pub mod element;
pub mod fingerprint;
pub mod selector;
pub mod tree;

pub use element::{DomNode, ElementNode};
pub use fingerprint::{ElementFingerprint, InspectKey};
pub use selector::{Combinator, Selector, SimpleSelector};
pub use tree::{DomTree, NodePath, NodeRef};

use crate::error::Result;
use headless_chrome::Tab;
use std::sync::Arc;

/// Extract the rendered DOM tree from a browser tab
pub fn extract_dom(tab: &Arc<Tab>) -> Result<DomTree> {
    DomTree::from_tab(tab)
}
