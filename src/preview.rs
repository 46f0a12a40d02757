//! The sandboxed preview context
//!
//! Owns the rendered DOM and is the producing end of the inspection
//! transport: clicks and hovers become fingerprints posted to the host,
//! in-place edits become debounced `updateHTML` messages, and host
//! highlight signals are applied back onto the DOM.

use crate::buffer::{CLICK_OUTLINE, HIGHLIGHT_CLASS, HOVER_OUTLINE};
use crate::config::SyncOptions;
use crate::dom::fingerprint::resolve_block_target;
use crate::dom::{DomTree, ElementFingerprint, NodePath, Selector};
use crate::transport::{ClickGuard, Debouncer, HostMessage, Inbox, Outbox, PreviewMessage};
use log::debug;
use std::time::Instant;

pub struct PreviewFrame {
    tree: DomTree,
    outbox: Outbox<PreviewMessage>,
    options: SyncOptions,
    click_guard: ClickGuard,
    pending_edit: Debouncer<String>,
    hover_outline: Option<NodePath>,
}

impl PreviewFrame {
    /// Wrap a rendered document, posting to the host through `outbox`
    pub fn new(tree: DomTree, outbox: Outbox<PreviewMessage>, options: SyncOptions) -> Self {
        Self {
            tree,
            outbox,
            click_guard: ClickGuard::new(options.click_lock()),
            pending_edit: Debouncer::new(options.edit_debounce()),
            options,
            hover_outline: None,
        }
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Swap in a freshly rendered document; outlines do not survive a render
    pub fn replace_tree(&mut self, tree: DomTree) {
        self.tree = tree;
        self.hover_outline = None;
    }

    /// Element currently carrying the hover outline
    pub fn hover_outline(&self) -> Option<&NodePath> {
        self.hover_outline.as_ref()
    }

    /// Elements carrying the highlight class
    pub fn highlighted(&self) -> Vec<NodePath> {
        self.tree
            .elements()
            .into_iter()
            .filter(|(_, element)| element.has_class(HIGHLIGHT_CLASS))
            .map(|(path, _)| path)
            .collect()
    }

    /// Click in the primary preview
    ///
    /// Holds a short processing lock so one click cannot start overlapping
    /// cycles. Toggles the click outline on the resolved element, then
    /// posts its fingerprint.
    pub fn click(&mut self, target: &[usize], now: Instant) -> Option<ElementFingerprint> {
        if !self.click_guard.try_acquire(now) {
            debug!("Click ignored while a previous click is processing");
            return None;
        }

        let path = resolve_block_target(&self.tree, target, &self.options)?;
        if let Some(element) = self.tree.element_mut(&path) {
            element.outline = match element.outline {
                Some(_) => None,
                None => Some(CLICK_OUTLINE.to_string()),
            };
        }

        let fingerprint = ElementFingerprint::extract(&self.tree, &path, &self.options)?;
        self.outbox.post(&PreviewMessage::Inspect(fingerprint.clone()));
        Some(fingerprint)
    }

    /// Pointer moved onto an element in the split-view preview
    pub fn hover(&mut self, target: &[usize]) -> Option<ElementFingerprint> {
        let fingerprint = ElementFingerprint::inspect(&self.tree, target, &self.options)?;
        self.outbox.post(&PreviewMessage::Inspect(fingerprint.clone()));
        Some(fingerprint)
    }

    /// Pointer left the hovered element
    pub fn leave(&mut self) {
        self.outbox.post(&PreviewMessage::ClearHighlight);
    }

    /// An element was edited in place
    pub fn edit_element(&mut self, path: &[usize], content: impl Into<String>) {
        let Some(element) = self.tree.element(path) else {
            return;
        };
        self.outbox.post(&PreviewMessage::ContentChanged {
            element: element.tag_name.clone(),
            content: content.into(),
        });
    }

    /// The editable body changed; pushed to the host once edits settle
    pub fn edit_body(&mut self, html: impl Into<String>, now: Instant) {
        self.pending_edit.schedule(html.into(), now);
    }

    /// Flush a settled body edit; returns whether one was posted
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.pending_edit.poll(now) {
            Some(html) => self.outbox.post(&PreviewMessage::UpdateHtml { html }),
            None => false,
        }
    }

    /// Apply every queued host signal; returns how many were handled
    pub fn process(&mut self, inbox: &Inbox<HostMessage>) -> usize {
        let messages = inbox.drain();
        let count = messages.len();
        for message in messages {
            self.handle(message);
        }
        count
    }

    /// Apply one host signal to the rendered DOM
    pub fn handle(&mut self, message: HostMessage) {
        match message {
            HostMessage::ShowHover { tag_name, index } => {
                self.clear_hover();
                match self.tree.nth_by_tag(&tag_name, index) {
                    Some(path) => {
                        if let Some(element) = self.tree.element_mut(&path) {
                            element.outline = Some(HOVER_OUTLINE.to_string());
                        }
                        self.hover_outline = Some(path);
                    }
                    None => debug!("Hover index {} out of bounds for <{}>", index, tag_name),
                }
            }
            HostMessage::ClearHover => self.clear_hover(),
            HostMessage::Highlight { selector, index } => {
                self.clear_class_highlights();
                let matches = match Selector::parse(&selector) {
                    Ok(parsed) => self.tree.query_all(&parsed),
                    Err(e) => {
                        debug!("Highlight skipped: {}", e);
                        return;
                    }
                };
                match matches.get(index) {
                    Some(path) => self.add_highlight(path),
                    None => debug!("Highlight index {} out of bounds for {}", index, selector),
                }
            }
            HostMessage::HighlightCss { selectors } => {
                self.clear_class_highlights();
                for selector in selectors {
                    match Selector::parse(&selector) {
                        Ok(parsed) => {
                            for path in self.tree.query_all(&parsed) {
                                self.add_highlight(&path);
                            }
                        }
                        Err(e) => debug!("CSS highlight skipped: {}", e),
                    }
                }
            }
        }
    }

    fn clear_hover(&mut self) {
        if let Some(path) = self.hover_outline.take() {
            if let Some(element) = self.tree.element_mut(&path) {
                element.outline = None;
            }
        }
    }

    fn add_highlight(&mut self, path: &[usize]) {
        if let Some(element) = self.tree.element_mut(path) {
            element.add_class(HIGHLIGHT_CLASS);
        }
    }

    fn clear_class_highlights(&mut self) {
        for path in self.highlighted() {
            if let Some(element) = self.tree.element_mut(&path) {
                element.remove_class(HIGHLIGHT_CLASS);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ElementNode;
    use crate::transport::channel;
    use std::time::Duration;

    fn page() -> DomTree {
        let nav = ElementNode::new("NAV")
            .with_child(ElementNode::new("A").with_attribute("href", "#home").with_text("Home"))
            .with_child(
                ElementNode::new("A")
                    .with_attribute("href", "#about")
                    .with_attribute("class", "btn")
                    .with_text("About"),
            );
        let p = ElementNode::new("P").with_child(ElementNode::new("EM").with_text("soft"));
        let body = ElementNode::new("BODY").with_child(nav).with_child(p);
        DomTree::new(ElementNode::new("HTML").with_child(body))
    }

    fn frame() -> (PreviewFrame, Inbox<PreviewMessage>) {
        let (outbox, inbox) = channel();
        (PreviewFrame::new(page(), outbox, SyncOptions::default()), inbox)
    }

    #[test]
    fn test_click_posts_fingerprint_and_toggles_outline() {
        let (mut frame, inbox) = frame();
        let start = Instant::now();

        let fp = frame.click(&[0, 1, 0, 0], start).unwrap();
        assert_eq!(fp.tag_name, "p");
        assert_eq!(frame.tree().element(&[0, 1]).unwrap().outline.as_deref(), Some(CLICK_OUTLINE));

        let messages = inbox.drain();
        assert_eq!(messages, vec![PreviewMessage::Inspect(fp)]);

        // Second click after the lock releases toggles the outline off
        frame.click(&[0, 1], start + Duration::from_millis(150)).unwrap();
        assert_eq!(frame.tree().element(&[0, 1]).unwrap().outline, None);
    }

    #[test]
    fn test_click_lock_suppresses_reentry() {
        let (mut frame, inbox) = frame();
        let start = Instant::now();
        assert!(frame.click(&[0, 0, 0], start).is_some());
        assert!(frame.click(&[0, 0, 1], start + Duration::from_millis(20)).is_none());
        assert_eq!(inbox.drain().len(), 1);
    }

    #[test]
    fn test_click_on_body_sends_nothing() {
        let (mut frame, inbox) = frame();
        assert!(frame.click(&[0], Instant::now()).is_none());
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn test_hover_and_leave() {
        let (mut frame, inbox) = frame();
        let fp = frame.hover(&[0, 0, 1, 0]).unwrap();
        assert_eq!(fp.href(), Some("#about"));
        assert_eq!(fp.index, 1);
        frame.leave();

        let messages = inbox.drain();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], PreviewMessage::ClearHighlight);
    }

    #[test]
    fn test_show_and_clear_hover() {
        let (mut frame, _inbox) = frame();
        frame.handle(HostMessage::ShowHover { tag_name: "a".to_string(), index: 1 });
        assert_eq!(frame.hover_outline(), Some(&vec![0, 0, 1]));
        assert_eq!(frame.tree().element(&[0, 0, 1]).unwrap().outline.as_deref(), Some(HOVER_OUTLINE));

        frame.handle(HostMessage::ShowHover { tag_name: "a".to_string(), index: 0 });
        assert_eq!(frame.tree().element(&[0, 0, 1]).unwrap().outline, None);
        assert_eq!(frame.hover_outline(), Some(&vec![0, 0, 0]));

        frame.handle(HostMessage::ShowHover { tag_name: "a".to_string(), index: 5 });
        assert_eq!(frame.hover_outline(), None);

        frame.handle(HostMessage::ShowHover { tag_name: "p".to_string(), index: 0 });
        frame.handle(HostMessage::ClearHover);
        assert_eq!(frame.hover_outline(), None);
        assert_eq!(frame.tree().element(&[0, 1]).unwrap().outline, None);
    }

    #[test]
    fn test_highlight_and_css_highlight() {
        let (mut frame, _inbox) = frame();
        frame.handle(HostMessage::Highlight { selector: "a".to_string(), index: 1 });
        assert_eq!(frame.highlighted(), vec![vec![0, 0, 1]]);

        // Highlight class never leaks into fingerprints
        let fp = ElementFingerprint::extract(frame.tree(), &[0, 0, 1], &SyncOptions::default()).unwrap();
        assert_eq!(fp.class_list, vec!["btn"]);

        frame.handle(HostMessage::HighlightCss {
            selectors: vec!["a".to_string(), "nav a:hover".to_string(), "p".to_string()],
        });
        assert_eq!(frame.highlighted(), vec![vec![0, 0, 0], vec![0, 0, 1], vec![0, 1]]);

        frame.handle(HostMessage::HighlightCss { selectors: vec![] });
        assert!(frame.highlighted().is_empty());
    }

    #[test]
    fn test_body_edits_are_debounced() {
        let (mut frame, inbox) = frame();
        let start = Instant::now();
        frame.edit_body("<p>a</p>", start);
        frame.edit_body("<p>ab</p>", start + Duration::from_millis(100));
        assert!(!frame.tick(start + Duration::from_millis(300)));
        assert!(frame.tick(start + Duration::from_millis(400)));

        assert_eq!(inbox.drain(), vec![PreviewMessage::UpdateHtml { html: "<p>ab</p>".to_string() }]);
    }

    #[test]
    fn test_process_host_inbox() {
        let (mut frame, _inbox) = frame();
        let (to_preview, from_host) = channel();
        to_preview.post(&HostMessage::ShowHover { tag_name: "p".to_string(), index: 0 });
        to_preview.post(&HostMessage::ClearHover);
        assert_eq!(frame.process(&from_host), 2);
        assert_eq!(frame.hover_outline(), None);
    }
}
