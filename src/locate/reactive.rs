use crate::dom::ElementFingerprint;
use crate::locate::line_map::{class_key, href_key, id_key, src_key, LineMap};
use serde::{Deserialize, Serialize};

/// Which structural key resolved a reactive lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    Href,
    Src,
    Id,
    Class,
    Tag,
}

/// Look a fingerprint up in the line map, first matching key wins:
/// href, then src, then id, then the class set, then the bare tag.
pub fn find_line(map: &LineMap, fingerprint: &ElementFingerprint) -> Option<(usize, KeyKind)> {
    let tag = fingerprint.tag_name.to_ascii_lowercase();

    let mut candidates: Vec<(String, KeyKind)> = Vec::with_capacity(5);
    if let Some(href) = fingerprint.href() {
        candidates.push((href_key(&tag, href), KeyKind::Href));
    }
    if let Some(src) = fingerprint.src() {
        candidates.push((src_key(&tag, src), KeyKind::Src));
    }
    if let Some(id) = fingerprint.selector_id() {
        candidates.push((id_key(&tag, id), KeyKind::Id));
    }
    if !fingerprint.class_list.is_empty() {
        candidates.push((class_key(&tag, &fingerprint.class_list), KeyKind::Class));
    }
    candidates.push((tag, KeyKind::Tag));

    candidates
        .into_iter()
        .find_map(|(key, kind)| map.get(&key).map(|line| (line, kind)))
}
