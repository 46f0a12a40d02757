//! # preview-sync
//!
//! Element-to-source-line correlation for a live HTML/CSS/JS preview editor.
//!
//! There is no source map between the HTML the user types and the DOM the
//! preview renders. This crate closes that gap heuristically: an element
//! inspected in the preview is fingerprinted (tag, attributes, text,
//! render-order index), sent across a typed message channel, and resolved
//! to a line of the HTML buffer by an exact structural-key lookup with a
//! scored fallback. The reverse direction maps a clicked source line back
//! to the rendered element(s).
//!
//! ## Features
//!
//! - **Line map**: structural key → line index, rebuilt only when the text changes
//! - **Locating pipeline**: precedence-ordered key lookup, then scored line search
//! - **Transport**: JSON messages over a one-way channel, click lock and edit debounce
//! - **Session**: buffers, highlight surfaces and dedup state as one context object
//! - **Preview browser**: render the buffers in headless Chrome and extract the live DOM
//!
//! ## Library Usage
//!
//! ### Resolving an inspected element
//!
//! ```rust
//! use preview_sync::{BufferSet, ElementFingerprint, SyncOptions, SyncSession};
//!
//! let html = "<nav>\n  <a href=\"#home\">Home</a>\n  <a href=\"#about\">About</a>\n</nav>";
//! let mut session = SyncSession::new(BufferSet::new(html, "", ""), SyncOptions::default());
//!
//! let about = ElementFingerprint::new("a").with_attribute("href", "#about").with_text("About");
//! let outcome = session.handle_inspect(&about);
//! assert_eq!(outcome.resolution().map(|r| r.line), Some(2));
//! ```
//!
//! ### Wiring a preview to a session
//!
//! ```rust
//! use preview_sync::dom::{DomTree, ElementNode};
//! use preview_sync::transport::channel;
//! use preview_sync::{BufferSet, PreviewFrame, SyncOptions, SyncSession};
//!
//! let (to_host, host_inbox) = channel();
//! let (to_preview, preview_inbox) = channel();
//!
//! let body = ElementNode::new("BODY").with_child(ElementNode::new("H1").with_text("Hello"));
//! let tree = DomTree::new(ElementNode::new("HTML").with_child(body));
//! let mut frame = PreviewFrame::new(tree, to_host, SyncOptions::default());
//! let mut session = SyncSession::new(BufferSet::new("<h1>Hello</h1>", "", ""), SyncOptions::default())
//!     .with_preview(to_preview);
//!
//! frame.hover(&[0, 0]);
//! session.drain(&host_inbox);
//! frame.process(&preview_inbox);
//! assert_eq!(frame.hover_outline(), Some(&vec![0, 0]));
//! ```
//!
//! ## Module Overview
//!
//! - [`buffer`]: source buffers and document composition
//! - [`dom`]: rendered-document model and the element extractor
//! - [`transport`]: preview ↔ host messages and timing guards
//! - [`preview`]: the sandboxed preview context
//! - [`locate`]: line map, reactive lookup and fallback search
//! - [`highlight`]: per-surface line highlight and outgoing preview targeting
//! - [`session`]: the host-side editing session
//! - [`browser`]: headless Chrome preview renderer
//! - [`tools`]: named JSON operations over a session
//! - [`config`], [`error`]: tunables and error types

pub mod browser;
pub mod buffer;
pub mod config;
pub mod dom;
pub mod error;
pub mod highlight;
pub mod locate;
pub mod preview;
pub mod session;
pub mod tools;
pub mod transport;

pub use browser::{LaunchOptions, PreviewBrowser};
pub use buffer::{BufferSet, Cursor, Language, SourceBuffer};
pub use config::SyncOptions;
pub use dom::{DomTree, ElementFingerprint, ElementNode};
pub use error::{Result, SyncError};
pub use highlight::Pane;
pub use locate::{LineMap, Resolution, Strategy};
pub use preview::PreviewFrame;
pub use session::{InspectOutcome, SyncSession};
pub use tools::{Tool, ToolContext, ToolRegistry, ToolResult};
pub use transport::{HostMessage, PreviewMessage};
