//! Scored search over raw source lines, used when the line map misses
//!
//! Strategies run in order and the first two short-circuit:
//! 1. anchor tag with the exact `href` on the same line
//! 2. the normalized opening tag appearing verbatim in a line
//! 3. additive scoring of every line that opens the tag
//!
//! Attribute and text evidence outweighs the tag itself because a page
//! usually has many `div`/`p` lines and only one with a given `href`.

use crate::config::SyncOptions;
use crate::dom::ElementFingerprint;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

pub const TAG_SCORE: u32 = 10;
pub const HREF_SCORE: u32 = 70;
pub const SRC_SCORE: u32 = 70;
pub const ID_SCORE: u32 = 50;
pub const CLASS_SCORE: u32 = 20;
pub const TEXT_SCORE: u32 = 60;
pub const PARENT_SCORE: u32 = 15;

/// How a fallback match was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum FallbackMatch {
    ExactHref,
    OpenTag,
    Scored { score: u32 },
}

/// Best-effort line for a fingerprint, `None` when no line opens the tag
pub fn find_line(
    lines: &[&str],
    fingerprint: &ElementFingerprint,
    options: &SyncOptions,
) -> Option<(usize, FallbackMatch)> {
    let lowered: Vec<String> = lines.iter().map(|l| l.to_lowercase()).collect();
    let tag = fingerprint.tag_name.to_lowercase();
    let tag_pattern = format!("<{}", tag);

    if tag == "a" {
        if let Some(line) = exact_href_line(&lowered, &tag_pattern, fingerprint) {
            debug!("Fallback: exact href match on line {}", line);
            return Some((line, FallbackMatch::ExactHref));
        }
    }

    if let Some(line) = open_tag_line(lines, fingerprint, options) {
        debug!("Fallback: open tag match on line {}", line);
        return Some((line, FallbackMatch::OpenTag));
    }

    let mut best: Option<(usize, u32)> = None;
    for (i, line) in lowered.iter().enumerate() {
        if !line.contains(&tag_pattern) {
            continue;
        }
        let score = score_line(lines, &lowered, i, fingerprint, options);
        // Strictly greater: ties keep the earliest line.
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((i, score));
        }
    }

    let (line, score) = best?;
    debug!("Fallback: scored match on line {} ({})", line, score);
    Some((line, FallbackMatch::Scored { score }))
}

fn exact_href_line(lowered: &[String], tag_pattern: &str, fingerprint: &ElementFingerprint) -> Option<usize> {
    let href = fingerprint.href()?.to_lowercase();
    let forms = [
        format!("href=\"{}\"", href),
        format!("href='{}'", href),
        format!("href={}>", href),
        format!("href=\"{}>", href),
        format!("href='{}>", href),
    ];
    lowered
        .iter()
        .position(|line| line.contains(tag_pattern) && forms.iter().any(|form| line.contains(form.as_str())))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn open_tag_line(lines: &[&str], fingerprint: &ElementFingerprint, options: &SyncOptions) -> Option<usize> {
    let normalized = collapse_whitespace(&fingerprint.open_tag.to_lowercase());
    if normalized.is_empty() {
        return None;
    }
    let signature: String = normalized.chars().take(options.open_tag_signature_chars).collect();
    lines
        .iter()
        .position(|line| collapse_whitespace(&line.to_lowercase()).contains(&signature))
}

fn tag_regex() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

fn score_line(
    lines: &[&str],
    lowered: &[String],
    i: usize,
    fingerprint: &ElementFingerprint,
    options: &SyncOptions,
) -> u32 {
    let line = &lowered[i];
    let mut score = TAG_SCORE;

    if let Some(href) = fingerprint.href() {
        let href = href.to_lowercase();
        if line.contains(&format!("href=\"{}", href)) || line.contains(&format!("href='{}", href)) {
            score += HREF_SCORE;
        }
    }

    if let Some(src) = fingerprint.src() {
        let src = src.to_lowercase();
        let file = src.rsplit('/').next().unwrap_or(&src);
        if line.contains("src=\"") && line.contains(file) {
            score += SRC_SCORE;
        }
    }

    if let Some(id) = fingerprint.selector_id() {
        if line.contains(&format!("id=\"{}", id.to_lowercase())) {
            score += ID_SCORE;
        }
    }

    for class in &fingerprint.class_list {
        if line.contains(&class.to_lowercase()) {
            score += CLASS_SCORE;
        }
    }

    if fingerprint.text_content.chars().count() > 2 {
        let clean: String = fingerprint.text_content.chars().take(options.text_snippet_chars).collect();
        let clean = clean.to_lowercase();
        let clean = clean.trim();
        let window_end = (i + options.text_window_lines).min(lowered.len() - 1);
        let found = (i..=window_end).any(|j| {
            if lowered[j].contains(clean) {
                return true;
            }
            // Text split by inline tags only matches once the tags are gone.
            let stripped = tag_regex().replace_all(lines[j], "").to_lowercase();
            stripped.trim().contains(clean)
        });
        if found {
            score += TEXT_SCORE;
        }
    }

    if !fingerprint.parent_tag.is_empty() && i > 0 {
        let start = i.saturating_sub(options.parent_window_lines);
        let previous = lowered[start..i].join(" ");
        if previous.contains(&format!("<{}", fingerprint.parent_tag.to_lowercase())) {
            score += PARENT_SCORE;
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.split('\n').collect()
    }

    #[test]
    fn test_exact_href_wins_over_earlier_anchor() {
        let src = "<nav>\n  <a href=\"#home\">Home</a>\n  <a href='#about'>About</a>\n</nav>";
        let fp = ElementFingerprint::new("a").with_attribute("href", "#about").with_text("About");
        let found = find_line(&lines(src), &fp, &SyncOptions::default());
        assert_eq!(found, Some((2, FallbackMatch::ExactHref)));
    }

    #[test]
    fn test_open_tag_normalized_match() {
        let src = "<div>\n  <section   CLASS=\"Hero\"  data-x=\"1\">\n  </section>\n</div>";
        let fp = ElementFingerprint::new("section").with_open_tag("<section class=\"hero\" data-x=\"1\">");
        let found = find_line(&lines(src), &fp, &SyncOptions::default());
        assert_eq!(found, Some((1, FallbackMatch::OpenTag)));
    }

    #[test]
    fn test_href_prefix_scoring_for_non_anchor() {
        // <link> is not an anchor, so the href fast path does not apply
        let src = "<link rel=\"icon\" href=\"favicon.ico\">\n<link rel=\"stylesheet\" href=\"css/site.css?v=2\">";
        let fp = ElementFingerprint::new("link").with_attribute("href", "css/site.css");
        let found = find_line(&lines(src), &fp, &SyncOptions::default());
        assert_eq!(found, Some((1, FallbackMatch::Scored { score: TAG_SCORE + HREF_SCORE })));
    }

    #[test]
    fn test_src_matches_by_file_name() {
        let src = "<img src=\"a.png\">\n<img alt=\"logo\" src=\"./assets/logo.png\">";
        let fp = ElementFingerprint::new("img").with_attribute("src", "http://localhost/assets/logo.png");
        let found = find_line(&lines(src), &fp, &SyncOptions::default());
        assert_eq!(found, Some((1, FallbackMatch::Scored { score: TAG_SCORE + SRC_SCORE })));
    }

    #[test]
    fn test_text_on_following_lines() {
        let src = "<p>\n  Intro\n</p>\n<p>\n  Hello <em>there</em> friend\n</p>";
        let fp = ElementFingerprint::new("p").with_text("Hello there friend");
        let found = find_line(&lines(src), &fp, &SyncOptions::default());
        assert_eq!(found, Some((3, FallbackMatch::Scored { score: TAG_SCORE + TEXT_SCORE })));
    }

    #[test]
    fn test_id_class_and_parent_accumulate() {
        let src = concat!(
            "<main>\n  <div class=\"card\">A</div>\n</main>\n",
            "<aside>\n  <div id=\"side\" class=\"card wide\">B</div>\n</aside>",
        );
        let fp = ElementFingerprint::new("div")
            .with_attribute("id", "side")
            .with_attribute("class", "card wide")
            .with_parent("aside", "");
        let found = find_line(&lines(src), &fp, &SyncOptions::default());
        let expected = TAG_SCORE + ID_SCORE + 2 * CLASS_SCORE + PARENT_SCORE;
        assert_eq!(found, Some((4, FallbackMatch::Scored { score: expected })));
    }

    #[test]
    fn test_ties_keep_earliest() {
        let src = "<li>One</li>\n<li>Two</li>";
        let fp = ElementFingerprint::new("li").with_text("Zz");
        let found = find_line(&lines(src), &fp, &SyncOptions::default());
        assert_eq!(found, Some((0, FallbackMatch::Scored { score: TAG_SCORE })));
    }

    #[test]
    fn test_no_candidate() {
        let src = "<div>\n</div>";
        let fp = ElementFingerprint::new("table");
        assert_eq!(find_line(&lines(src), &fp, &SyncOptions::default()), None);
    }
}
