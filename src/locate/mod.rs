//! Element-to-source-line correlation
//!
//! There is no source map between the HTML text and the rendered DOM, so
//! lines are found heuristically:
//! - LineMap: structural key → line index, rebuilt when the text changes
//! - reactive: precedence-ordered exact key lookup in the line map
//! - fallback: scored search over raw lines when the lookup misses
//!
//! Matching is best-effort. Render order and source order can disagree and
//! a miss is an ordinary outcome, not an error.

pub mod fallback;
pub mod line_map;
pub mod reactive;

pub use fallback::FallbackMatch;
pub use line_map::LineMap;
pub use reactive::KeyKind;

use crate::buffer::split_lines;
use crate::config::SyncOptions;
use crate::dom::ElementFingerprint;
use log::debug;
use serde::{Deserialize, Serialize};

/// Which stage resolved a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "stage")]
pub enum Strategy {
    Reactive { key: KeyKind },
    Fallback { method: FallbackMatch },
}

/// A located source line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Zero-based line index in the HTML buffer
    pub line: usize,
    pub strategy: Strategy,
}

impl Resolution {
    pub fn is_reactive(&self) -> bool {
        matches!(self.strategy, Strategy::Reactive { .. })
    }
}

/// Resolve a fingerprint against the HTML text
///
/// The map is rebuilt first if `html` differs from its last build; the
/// fallback runs only when the reactive lookup misses.
pub fn locate(
    map: &mut LineMap,
    html: &str,
    fingerprint: &ElementFingerprint,
    options: &SyncOptions,
) -> Option<Resolution> {
    map.rebuild_if_changed(html);

    if let Some((line, key)) = reactive::find_line(map, fingerprint) {
        debug!("Reactive match for {} via {:?}: line {}", fingerprint.selector, key, line);
        return Some(Resolution {
            line,
            strategy: Strategy::Reactive { key },
        });
    }

    debug!("Reactive lookup missed for {}, trying fallback", fingerprint.selector);
    let lines = split_lines(html);
    fallback::find_line(&lines, fingerprint, options).map(|(line, method)| Resolution {
        line,
        strategy: Strategy::Fallback { method },
    })
}
