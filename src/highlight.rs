//! Line highlighting and selection across editor surfaces
//!
//! Each surface carries at most one active line. Setting a line on one
//! surface never touches another; mirroring is the caller's decision.
//! The outgoing direction (source line → rendered element) is computed
//! here as well: which tag occurrence a line opens, and which CSS
//! selectors a ruleset line belongs to.

use crate::buffer::{line_at_offset, line_range, Cursor, Language};
use crate::transport::HostMessage;
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use std::sync::OnceLock;

/// Which editor pane a surface belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Pane {
    /// The main three-tab editor
    Primary,
    /// The editor beside the split-view preview
    Split,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId {
    pub pane: Pane,
    pub language: Language,
}

impl SurfaceId {
    pub fn new(pane: Pane, language: Language) -> Self {
        Self { pane, language }
    }
}

/// Active-line indicator of one surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightState {
    pub active_line: Option<usize>,
}

/// Geometry used to centre a line when scrolling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportMetrics {
    pub line_height: f64,
    pub viewport_height: f64,
}

impl Default for ViewportMetrics {
    fn default() -> Self {
        Self {
            line_height: 20.0,
            viewport_height: 400.0,
        }
    }
}

/// View state of one editor surface over a buffer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorSurface {
    pub highlight: HighlightState,
    pub selection: Cursor,
    pub scroll_top: f64,
    pub focused: bool,
    pub metrics: ViewportMetrics,
}

impl EditorSurface {
    pub fn new(metrics: ViewportMetrics) -> Self {
        Self {
            metrics,
            ..Default::default()
        }
    }

    pub fn active_line(&self) -> Option<usize> {
        self.highlight.active_line
    }

    /// Mark `line` active, replacing this surface's previous active line
    pub fn highlight_line(&mut self, line: usize, scroll: bool) {
        self.highlight.active_line = Some(line);
        if scroll {
            self.scroll_to_line(line);
        }
    }

    /// Scroll so `line` sits in the vertical centre of the viewport
    pub fn scroll_to_line(&mut self, line: usize) {
        let lh = self.metrics.line_height;
        let target = line as f64 * lh - self.metrics.viewport_height / 2.0 + lh / 2.0;
        self.scroll_top = target.max(0.0);
    }

    /// Highlight, scroll to and select the whole of `line` in `text`
    ///
    /// Returns the selected byte range, or `None` (leaving the surface
    /// untouched) when the line does not exist.
    pub fn select_line(&mut self, text: &str, line: usize, focus: bool) -> Option<Range<usize>> {
        let range = line_range(text, line)?;
        self.highlight_line(line, true);
        if focus {
            self.focused = true;
        }
        self.selection = range.clone().into();
        Some(range)
    }

    /// Mark the caret's line active without moving the selection
    pub fn activate_caret_line(&mut self, text: &str, caret: usize) -> usize {
        let line = line_at_offset(text, caret);
        self.highlight.active_line = Some(line);
        line
    }

    pub fn clear_highlight(&mut self) {
        self.highlight.active_line = None;
    }
}

/// All editor surfaces of a session, created on first use
#[derive(Debug, Clone, Default)]
pub struct Surfaces {
    surfaces: HashMap<SurfaceId, EditorSurface>,
    metrics: ViewportMetrics,
}

impl Surfaces {
    pub fn new(metrics: ViewportMetrics) -> Self {
        Self {
            surfaces: HashMap::new(),
            metrics,
        }
    }

    pub fn get(&self, id: SurfaceId) -> Option<&EditorSurface> {
        self.surfaces.get(&id)
    }

    pub fn get_mut(&mut self, id: SurfaceId) -> &mut EditorSurface {
        let metrics = self.metrics;
        self.surfaces.entry(id).or_insert_with(|| EditorSurface::new(metrics))
    }

    pub fn active_line(&self, id: SurfaceId) -> Option<usize> {
        self.get(id).and_then(EditorSurface::active_line)
    }
}

fn line_tag_regex() -> &'static Regex {
    static LINE_TAG: OnceLock<Regex> = OnceLock::new();
    LINE_TAG.get_or_init(|| Regex::new(r"<(\w+)[\s>]").expect("line tag pattern is valid"))
}

fn css_comment_regex() -> &'static Regex {
    static COMMENT: OnceLock<Regex> = OnceLock::new();
    COMMENT.get_or_init(|| Regex::new(r"/\*.*?\*/").expect("comment pattern is valid"))
}

/// Lower-case name of the first tag opened on a line
pub fn line_tag(line: &str) -> Option<String> {
    line_tag_regex().captures(line).map(|caps| caps[1].to_ascii_lowercase())
}

/// Count lines before `line` that open `tag`
///
/// This is the source-order ordinal of the element opened on `line`, used to
/// address its rendered counterpart by tag and index.
pub fn tag_occurrences_before(lines: &[&str], line: usize, tag: &str) -> usize {
    let Ok(pattern) = Regex::new(&format!(r"(?i)<{}(?:[\s/>]|$)", regex::escape(tag))) else {
        return 0;
    };
    lines.iter().take(line).filter(|l| pattern.is_match(l)).count()
}

/// Highlight request for the element opened on an HTML source line
pub fn html_line_target(lines: &[&str], line: usize) -> Option<HostMessage> {
    let tag = line_tag(lines.get(line)?)?;
    let index = tag_occurrences_before(lines, line, &tag);
    Some(HostMessage::Highlight { selector: tag, index })
}

/// Selectors of the CSS ruleset a line belongs to
///
/// A line with `{` names its own selector; otherwise the search walks
/// upward to the nearest line with `{`, giving up at a bare `}`.
pub fn css_line_selectors(lines: &[&str], line: usize) -> Option<Vec<String>> {
    let current = lines.get(line)?;
    let raw = if current.contains('{') {
        current.split('{').next().map(str::trim)
    } else {
        let mut found = None;
        for candidate in lines[..=line].iter().rev() {
            let candidate = candidate.trim();
            if candidate.contains('{') {
                found = candidate.split('{').next();
                break;
            }
            if candidate == "}" {
                break;
            }
        }
        found.map(str::trim)
    };
    let raw = raw?;

    let cleaned = css_comment_regex().replace_all(raw, "");
    let selectors: Vec<String> = cleaned
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!selectors.is_empty()).then_some(selectors)
}
