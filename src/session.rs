//! Host-side editor session
//!
//! One `SyncSession` per open document owns everything the correlation
//! loop mutates: the buffers, the line map, the last inspected element,
//! the split editor's current tab and every surface's highlight. It is the
//! consuming end of the preview → host channel and the producing end of
//! host → preview highlight signals.

use crate::buffer::{BufferSet, Language};
use crate::config::SyncOptions;
use crate::dom::{ElementFingerprint, InspectKey};
use crate::highlight::{
    Pane, SurfaceId, Surfaces, ViewportMetrics, css_line_selectors, html_line_target, tag_occurrences_before,
};
use crate::locate::{self, LineMap, Resolution};
use crate::transport::{HostMessage, Inbox, Outbox, PreviewMessage};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// What handling one inspection did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum InspectOutcome {
    /// Same element as the previous inspection; nothing was touched
    Duplicate,
    /// No line could be found; highlight state is unchanged
    Missed,
    Located(Resolution),
}

impl InspectOutcome {
    pub fn resolution(&self) -> Option<Resolution> {
        match self {
            InspectOutcome::Located(resolution) => Some(*resolution),
            _ => None,
        }
    }
}

/// Result of clicking a line in a split editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSelection {
    pub language: Language,
    pub line: usize,
    /// Byte range selected in the buffer
    pub range: Range<usize>,
    /// Highlight signal sent to the preview, if any
    pub preview: Option<HostMessage>,
}

pub struct SyncSession {
    buffers: BufferSet,
    line_map: LineMap,
    last_inspected: Option<InspectKey>,
    current_tab: Language,
    surfaces: Surfaces,
    options: SyncOptions,
    preview: Option<Outbox<HostMessage>>,
}

impl SyncSession {
    pub fn new(buffers: BufferSet, options: SyncOptions) -> Self {
        Self {
            buffers,
            line_map: LineMap::new(options.internal_class_marker.clone()),
            last_inspected: None,
            current_tab: Language::Html,
            surfaces: Surfaces::default(),
            options,
            preview: None,
        }
    }

    /// Send highlight signals to a preview through `outbox`
    pub fn with_preview(mut self, outbox: Outbox<HostMessage>) -> Self {
        self.preview = Some(outbox);
        self
    }

    pub fn with_metrics(mut self, metrics: ViewportMetrics) -> Self {
        self.surfaces = Surfaces::new(metrics);
        self
    }

    pub fn connect_preview(&mut self, outbox: Outbox<HostMessage>) {
        self.preview = Some(outbox);
    }

    pub fn buffers(&self) -> &BufferSet {
        &self.buffers
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    /// How many times the line map has been built
    pub fn build_count(&self) -> usize {
        self.line_map.build_count()
    }

    pub fn surfaces(&self) -> &Surfaces {
        &self.surfaces
    }

    pub fn active_line(&self, pane: Pane, language: Language) -> Option<usize> {
        self.surfaces.active_line(SurfaceId::new(pane, language))
    }

    /// Tab shown in the split editor
    pub fn current_tab(&self) -> Language {
        self.current_tab
    }

    pub fn switch_tab(&mut self, language: Language) {
        self.current_tab = language;
    }

    /// Replace a buffer's text; the line map catches up on its next use
    pub fn set_buffer(&mut self, language: Language, text: impl Into<String>) {
        self.buffers.set_text(language, text);
    }

    /// Locate an element without touching any highlight state
    pub fn locate(&mut self, fingerprint: &ElementFingerprint) -> Option<Resolution> {
        locate::locate(&mut self.line_map, self.buffers.html.text(), fingerprint, &self.options)
    }

    /// Handle every queued preview message; returns how many were handled
    pub fn drain(&mut self, inbox: &Inbox<PreviewMessage>) -> usize {
        let messages = inbox.drain();
        let count = messages.len();
        for message in messages {
            self.handle(message);
        }
        count
    }

    pub fn handle(&mut self, message: PreviewMessage) {
        match message {
            PreviewMessage::Inspect(fingerprint) => {
                self.handle_inspect(&fingerprint);
            }
            PreviewMessage::ClearHighlight => self.clear_highlights(),
            PreviewMessage::ContentChanged { element, content } => {
                debug!("Content changed in <{}>: {} bytes", element, content.len());
            }
            PreviewMessage::UpdateHtml { html } => {
                if html.is_empty() {
                    debug!("Ignoring empty HTML update");
                    return;
                }
                info!("HTML updated from preview ({} bytes)", html.len());
                self.set_buffer(Language::Html, html);
            }
        }
    }

    /// Correlate an inspected element with its source line and highlight it
    ///
    /// A repeat of the previous inspection is skipped. On a hit the split
    /// HTML editor selects and centres the line, the primary HTML editor
    /// mirrors it without scrolling, and the preview is asked to outline
    /// the element.
    pub fn handle_inspect(&mut self, fingerprint: &ElementFingerprint) -> InspectOutcome {
        let key = fingerprint.key();
        if self.last_inspected.as_ref() == Some(&key) {
            debug!("Skipping repeated inspection of {}", fingerprint.selector);
            return InspectOutcome::Duplicate;
        }
        self.last_inspected = Some(key);
        debug!("Inspecting {} (index {})", fingerprint.selector, fingerprint.index);

        let Some(resolution) = self.locate(fingerprint) else {
            debug!("No source line found for {}", fingerprint.selector);
            return InspectOutcome::Missed;
        };

        if self.current_tab != Language::Html {
            debug!("Switching split editor from {} to html", self.current_tab);
            self.current_tab = Language::Html;
        }

        let line = resolution.line;
        let html = self.buffers.html.text();
        self.surfaces
            .get_mut(SurfaceId::new(Pane::Split, Language::Html))
            .select_line(html, line, false);
        self.surfaces
            .get_mut(SurfaceId::new(Pane::Primary, Language::Html))
            .highlight_line(line, false);

        let lines = self.buffers.html.lines();
        let index = tag_occurrences_before(&lines, line, &fingerprint.tag_name);
        self.notify(HostMessage::ShowHover {
            tag_name: fingerprint.tag_name.clone(),
            index,
        });

        InspectOutcome::Located(resolution)
    }

    /// Pointer left the preview element
    pub fn clear_highlights(&mut self) {
        self.surfaces
            .get_mut(SurfaceId::new(Pane::Split, Language::Html))
            .clear_highlight();
        self.notify(HostMessage::ClearHover);
        self.last_inspected = None;
    }

    /// Preview target for a source line, without selecting anything
    pub fn reveal(&self, language: Language, line: usize) -> Option<HostMessage> {
        let lines = self.buffers.get(language).lines();
        match language {
            Language::Html => html_line_target(&lines, line),
            Language::Css => css_line_selectors(&lines, line).map(|selectors| HostMessage::HighlightCss { selectors }),
            Language::Js => None,
        }
    }

    /// Click on a line in a split editor
    ///
    /// Selects the line, mirrors the selection into the primary editor of
    /// the same language without focusing it, and highlights the matching
    /// rendered element(s). Returns `None` if the line does not exist.
    pub fn click_split_line(&mut self, language: Language, line: usize) -> Option<LineSelection> {
        let text = self.buffers.get(language).text();
        let range = self
            .surfaces
            .get_mut(SurfaceId::new(Pane::Split, language))
            .select_line(text, line, true)?;
        self.surfaces
            .get_mut(SurfaceId::new(Pane::Primary, language))
            .select_line(text, line, false);
        self.buffers.get_mut(language).select(range.clone().into());

        let preview = self.reveal(language, line);
        if let Some(message) = &preview {
            self.notify(message.clone());
        }

        Some(LineSelection {
            language,
            line,
            range,
            preview,
        })
    }

    /// Caret placed in an editor; marks its line active and returns it
    pub fn click_editor(&mut self, pane: Pane, language: Language, caret: usize) -> usize {
        let text = self.buffers.get(language).text();
        self.surfaces
            .get_mut(SurfaceId::new(pane, language))
            .activate_caret_line(text, caret)
    }

    fn notify(&self, message: HostMessage) {
        match &self.preview {
            Some(outbox) => {
                outbox.post(&message);
            }
            None => debug!("No preview connected, dropping {:?}", message),
        }
    }
}
