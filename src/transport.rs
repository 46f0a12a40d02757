//! Cross-boundary messaging between the sandboxed preview and the host
//!
//! Messages travel as JSON text over a one-way channel, the way
//! `postMessage` moves structured data between frames. Posting never
//! blocks and never fails loudly: a torn-down receiver simply drops the
//! message. Messages from one sender arrive in emission order.

use crate::dom::ElementFingerprint;
use crate::error::{Result, SyncError};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

/// Preview → host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PreviewMessage {
    /// An element was clicked or hovered
    #[serde(rename = "inspect")]
    Inspect(ElementFingerprint),

    /// The pointer left the hovered element
    #[serde(rename = "clearHighlight")]
    ClearHighlight,

    /// A single element's content was edited in place
    #[serde(rename = "contentChanged")]
    ContentChanged { element: String, content: String },

    /// The editable body changed; carries the whole new body HTML
    #[serde(rename = "updateHTML")]
    UpdateHtml { html: String },
}

/// Host → preview. Highlight signals only, never content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HostMessage {
    /// Outline the `index`th element with the tag
    #[serde(rename = "showHover", rename_all = "camelCase")]
    ShowHover { tag_name: String, index: usize },

    #[serde(rename = "clearHover")]
    ClearHover,

    /// Highlight the `index`th element matching the selector
    #[serde(rename = "highlight")]
    Highlight { selector: String, index: usize },

    /// Highlight every element matching any of the selectors
    #[serde(rename = "highlightCSS")]
    HighlightCss { selectors: Vec<String> },
}

/// Decode one JSON payload into a message
pub fn decode<M: DeserializeOwned>(payload: &str) -> Result<M> {
    serde_json::from_str(payload).map_err(|e| SyncError::InvalidMessage(e.to_string()))
}

/// Sending half of a message channel
#[derive(Debug)]
pub struct Outbox<M> {
    sender: Sender<String>,
    _message: PhantomData<fn(M)>,
}

// Derived Clone would require `M: Clone`.
impl<M> Clone for Outbox<M> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            _message: PhantomData,
        }
    }
}

impl<M: Serialize> Outbox<M> {
    /// Fire-and-forget delivery; returns whether the message was queued
    pub fn post(&self, message: &M) -> bool {
        let payload = match serde_json::to_string(message) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to encode message: {}", e);
                return false;
            }
        };
        match self.sender.send(payload) {
            Ok(()) => true,
            Err(_) => {
                debug!("Receiving context is gone, message dropped");
                false
            }
        }
    }
}

/// Receiving half of a message channel
#[derive(Debug)]
pub struct Inbox<M> {
    receiver: Receiver<String>,
    _message: PhantomData<fn() -> M>,
}

impl<M: DeserializeOwned> Inbox<M> {
    /// Take every queued message in arrival order, skipping undecodable ones
    pub fn drain(&self) -> Vec<M> {
        self.receiver
            .try_iter()
            .filter_map(|payload| match decode(&payload) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!("Dropping message: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Next decodable message, if any is queued
    pub fn try_next(&self) -> Option<M> {
        while let Ok(payload) = self.receiver.try_recv() {
            match decode(&payload) {
                Ok(message) => return Some(message),
                Err(e) => warn!("Dropping message: {}", e),
            }
        }
        None
    }
}

/// Create a one-way message channel
pub fn channel<M>() -> (Outbox<M>, Inbox<M>) {
    let (sender, receiver) = mpsc::channel();
    (
        Outbox { sender, _message: PhantomData },
        Inbox { receiver, _message: PhantomData },
    )
}

/// Short-lived lock that keeps one click from starting overlapping cycles
#[derive(Debug, Clone)]
pub struct ClickGuard {
    hold: Duration,
    locked_until: Option<Instant>,
}

impl ClickGuard {
    pub fn new(hold: Duration) -> Self {
        Self { hold, locked_until: None }
    }

    /// Take the lock at `now`; `false` while a previous click still holds it
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if self.is_locked(now) {
            return false;
        }
        self.locked_until = Some(now + self.hold);
        true
    }

    pub fn is_locked(&self, now: Instant) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }
}

/// Coalesces a burst of updates into the last one after a quiet period
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Replace any pending value and restart the quiet period
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.delay, value));
    }

    /// Release the pending value once its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let ready = self.pending.as_ref().is_some_and(|(deadline, _)| now >= *deadline);
        if !ready {
            return None;
        }
        self.pending.take().map(|(_, value)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preview_message_wire_format() {
        let msg = PreviewMessage::Inspect(ElementFingerprint::new("h1").with_text("Hi"));
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "inspect");
        assert_eq!(value["tagName"], "h1");
        assert_eq!(value["textContent"], "Hi");

        let update: PreviewMessage =
            serde_json::from_value(json!({"type": "updateHTML", "html": "<p>x</p>"})).unwrap();
        assert_eq!(update, PreviewMessage::UpdateHtml { html: "<p>x</p>".to_string() });
    }

    #[test]
    fn test_host_message_wire_format() {
        let value = serde_json::to_value(HostMessage::ShowHover { tag_name: "a".to_string(), index: 2 }).unwrap();
        assert_eq!(value, json!({"type": "showHover", "tagName": "a", "index": 2}));

        let value = serde_json::to_value(HostMessage::HighlightCss { selectors: vec![".btn".to_string()] }).unwrap();
        assert_eq!(value, json!({"type": "highlightCSS", "selectors": [".btn"]}));

        let clear: HostMessage = serde_json::from_value(json!({"type": "clearHover"})).unwrap();
        assert_eq!(clear, HostMessage::ClearHover);
    }

    #[test]
    fn test_channel_preserves_order() {
        let (outbox, inbox) = channel::<HostMessage>();
        assert!(outbox.post(&HostMessage::ClearHover));
        assert!(outbox.post(&HostMessage::Highlight { selector: "p".to_string(), index: 0 }));

        let received = inbox.drain();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0], HostMessage::ClearHover);
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn test_post_to_closed_context_is_ignored() {
        let (outbox, inbox) = channel::<HostMessage>();
        drop(inbox);
        assert!(!outbox.post(&HostMessage::ClearHover));
    }

    #[test]
    fn test_malformed_payload_is_skipped() {
        let (outbox, inbox) = channel::<HostMessage>();
        outbox.sender.send("{\"type\":\"bogus\"}".to_string()).unwrap();
        outbox.post(&HostMessage::ClearHover);
        assert_eq!(inbox.try_next(), Some(HostMessage::ClearHover));
        assert_eq!(inbox.try_next(), None);
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let err = decode::<PreviewMessage>("{\"type\":\"reload\"}").unwrap_err();
        assert!(matches!(err, SyncError::InvalidMessage(_)));
        assert!(decode::<HostMessage>("not json").is_err());

        let message: PreviewMessage = decode("{\"type\":\"clearHighlight\"}").unwrap();
        assert_eq!(message, PreviewMessage::ClearHighlight);
    }

    #[test]
    fn test_click_guard() {
        let start = Instant::now();
        let mut guard = ClickGuard::new(Duration::from_millis(100));
        assert!(guard.try_acquire(start));
        assert!(!guard.try_acquire(start + Duration::from_millis(50)));
        assert!(guard.try_acquire(start + Duration::from_millis(100)));
    }

    #[test]
    fn test_debouncer_coalesces() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.schedule("a", start);
        debouncer.schedule("b", start + Duration::from_millis(200));
        assert_eq!(debouncer.poll(start + Duration::from_millis(400)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), Some("b"));
        assert!(!debouncer.is_pending());
    }
}
