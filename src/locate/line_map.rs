use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    open_tag: Regex,
    href: Regex,
    src: Regex,
    id: Regex,
    class: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let attr = |name: &str| {
            Regex::new(&format!(r#"(?:^|\s){}=["']([^"']+)["']"#, name)).expect("attribute pattern is valid")
        };
        Patterns {
            open_tag: Regex::new(r"<(\w+)([^>]*)>").expect("open tag pattern is valid"),
            href: attr("href"),
            src: attr("src"),
            id: attr("id"),
            class: attr("class"),
        }
    })
}

/// Structural key for an element with an `href`
pub fn href_key(tag: &str, href: &str) -> String {
    format!("{}[href=\"{}\"]", tag, href)
}

/// Structural key for an element with a `src`
pub fn src_key(tag: &str, src: &str) -> String {
    format!("{}[src=\"{}\"]", tag, src)
}

pub fn id_key(tag: &str, id: &str) -> String {
    format!("{}#{}", tag, id)
}

pub fn class_key<S: AsRef<str>>(tag: &str, classes: &[S]) -> String {
    let joined: Vec<&str> = classes.iter().map(AsRef::as_ref).collect();
    format!("{}.{}", tag, joined.join("."))
}

/// Map of structural keys to zero-based source line indices
///
/// Rebuilt wholesale whenever the HTML text differs from the text of the
/// previous build; identical text is a no-op. Uses IndexMap so keys list
/// in the order their lines were scanned.
#[derive(Debug, Clone, Default)]
pub struct LineMap {
    /// Map from structural key to line index
    map: IndexMap<String, usize>,

    /// Text the current map was built from
    source: Option<String>,

    /// Number of full builds performed
    builds: usize,

    /// Class tokens containing this marker are ignored
    marker: String,
}

impl LineMap {
    /// Create an empty map ignoring classes that contain `marker`
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            ..Default::default()
        }
    }

    /// Build from `html` unless it equals the text of the last build.
    /// Returns whether a rebuild happened.
    pub fn rebuild_if_changed(&mut self, html: &str) -> bool {
        if self.source.as_deref() == Some(html) {
            return false;
        }

        self.map.clear();
        for (line_index, line) in html.split('\n').enumerate() {
            self.index_line(line_index, line);
        }
        self.source = Some(html.to_string());
        self.builds += 1;

        debug!("Line map rebuilt: {} keys", self.map.len());
        true
    }

    /// Index one source line; non-opening-tag lines are skipped
    fn index_line(&mut self, line_index: usize, line: &str) {
        let trimmed = line.trim();
        if !trimmed.starts_with('<') || trimmed.starts_with("</") {
            return;
        }
        let p = patterns();
        let Some(caps) = p.open_tag.captures(trimmed) else {
            return;
        };
        let tag = caps[1].to_ascii_lowercase();
        let attrs = caps.get(2).map_or("", |m| m.as_str());

        let mut keyed = false;
        if let Some(href) = p.href.captures(attrs) {
            self.map.insert(href_key(&tag, &href[1]), line_index);
            keyed = true;
        }
        if let Some(src) = p.src.captures(attrs) {
            self.map.insert(src_key(&tag, &src[1]), line_index);
            keyed = true;
        }
        if let Some(id) = p.id.captures(attrs) {
            self.map.insert(id_key(&tag, &id[1]), line_index);
            keyed = true;
        }
        if let Some(class) = p.class.captures(attrs) {
            let classes: Vec<&str> = class[1]
                .split_whitespace()
                .filter(|c| !c.contains(self.marker.as_str()) || self.marker.is_empty())
                .collect();
            if !classes.is_empty() {
                self.map.insert(class_key(&tag, &classes), line_index);
                keyed = true;
            }
        }
        if !keyed {
            self.map.insert(tag, line_index);
        }
    }

    /// Line index for a structural key
    pub fn get(&self, key: &str) -> Option<usize> {
        self.map.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Get the number of keys
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// How many times the map has been (re)built
    pub fn build_count(&self) -> usize {
        self.builds
    }

    /// Drop the map and the memoized source text
    pub fn clear(&mut self) {
        self.map.clear();
        self.source = None;
    }

    /// Iterate over all (key, line) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&String, &usize)> {
        self.map.iter()
    }

    /// Export to JSON for debugging
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"<header>
  <h1>Welcome to My Website</h1>
  <nav>
    <a href="#home">Home</a>
    <a href="#about" class="nav-link">About</a>
  </nav>
</header>
<img src="images/logo.png">
<div id="main" class="container wide">
<p>
text only
</p>"##;

    fn built() -> LineMap {
        let mut map = LineMap::new("copilot");
        map.rebuild_if_changed(PAGE);
        map
    }

    #[test]
    fn test_keys_per_attribute() {
        let map = built();
        assert_eq!(map.get("header"), Some(0));
        assert_eq!(map.get("h1"), Some(1));
        assert_eq!(map.get("nav"), Some(2));
        assert_eq!(map.get("a[href=\"#home\"]"), Some(3));
        assert_eq!(map.get("a[href=\"#about\"]"), Some(4));
        assert_eq!(map.get("a.nav-link"), Some(4));
        assert_eq!(map.get("img[src=\"images/logo.png\"]"), Some(7));
        assert_eq!(map.get("div#main"), Some(8));
        assert_eq!(map.get("div.container.wide"), Some(8));
        assert_eq!(map.get("p"), Some(9));
    }

    #[test]
    fn test_attributed_lines_do_not_claim_bare_tag() {
        let map = built();
        assert!(!map.contains("a"));
        assert!(!map.contains("div"));
        assert!(!map.contains("img"));
    }

    #[test]
    fn test_closing_and_text_lines_skipped() {
        let map = built();
        assert!(map.iter().all(|(_, &line)| line != 5 && line != 6 && line != 10 && line != 11));
    }

    #[test]
    fn test_rebuild_is_memoized() {
        let mut map = LineMap::new("copilot");
        assert!(map.rebuild_if_changed(PAGE));
        let first: Vec<(String, usize)> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();

        assert!(!map.rebuild_if_changed(PAGE));
        assert_eq!(map.build_count(), 1);

        map.clear();
        assert!(map.rebuild_if_changed(PAGE));
        let second: Vec<(String, usize)> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();
        assert_eq!(first, second);
        assert_eq!(map.build_count(), 2);
    }

    #[test]
    fn test_bare_tag_last_write_wins() {
        let mut map = LineMap::new("copilot");
        map.rebuild_if_changed("<li>One</li>\n<li>Two</li>\n<li>Three</li>");
        assert_eq!(map.get("li"), Some(2));
    }

    #[test]
    fn test_marker_classes_ignored() {
        let mut map = LineMap::new("copilot");
        map.rebuild_if_changed(
            "<p class=\"copilot-highlight-element lead\">x</p>\n<span class=\"copilot-only\">y</span>",
        );
        assert_eq!(map.get("p.lead"), Some(0));
        assert_eq!(map.get("span"), Some(1));
    }

    #[test]
    fn test_prefixed_attributes_not_confused() {
        let mut map = LineMap::new("copilot");
        map.rebuild_if_changed("<div data-id=\"x\" data-href=\"y\">z</div>");
        assert_eq!(map.get("div"), Some(0));
        assert!(!map.contains("div#x"));
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let mut map = LineMap::new("copilot");
        map.rebuild_if_changed("<div\n  class=\"multi\">\n<>\n<section>");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("section"), Some(3));
    }

    #[test]
    fn test_to_json() {
        let map = built();
        let json = map.to_json().unwrap();
        assert!(json.contains("a[href=\\\"#about\\\"]"));
    }
}
