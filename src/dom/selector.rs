use crate::dom::element::ElementNode;
use crate::dom::tree::DomTree;
use crate::error::{Result, SyncError};
use serde::{Deserialize, Serialize};

/// Attribute condition inside a compound selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeCondition {
    pub name: String,
    /// `None` means presence only (`[href]`)
    pub value: Option<String>,
}

/// A single compound selector: `tag#id.class[attr="value"]`
///
/// Pseudo-classes are not supported; the preview only needs to address
/// elements the way the highlight messages name them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimpleSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: Vec<AttributeCondition>,
}

impl SimpleSelector {
    /// Parse a compound selector
    pub fn parse(input: &str) -> Result<Self> {
        let source = input.trim();
        if source.is_empty() {
            return Err(SyncError::InvalidSelector("empty selector".to_string()));
        }

        let invalid = |reason: &str| SyncError::InvalidSelector(format!("{}: {}", source, reason));
        let chars: Vec<char> = source.chars().collect();
        let mut selector = SimpleSelector::default();
        let mut pos = 0;

        if chars[0] == '*' {
            pos = 1;
        } else if is_ident_char(chars[0]) {
            let tag = read_ident(&chars, &mut pos);
            selector.tag = Some(tag.to_ascii_lowercase());
        }

        while pos < chars.len() {
            match chars[pos] {
                '#' => {
                    pos += 1;
                    let id = read_ident(&chars, &mut pos);
                    if id.is_empty() {
                        return Err(invalid("expected id after '#'"));
                    }
                    selector.id = Some(id);
                }
                '.' => {
                    pos += 1;
                    let class = read_ident(&chars, &mut pos);
                    if class.is_empty() {
                        return Err(invalid("expected class after '.'"));
                    }
                    selector.classes.push(class);
                }
                '[' => {
                    pos += 1;
                    let close = chars[pos..]
                        .iter()
                        .position(|&c| c == ']')
                        .ok_or_else(|| invalid("unterminated attribute selector"))?;
                    let body: String = chars[pos..pos + close].iter().collect();
                    pos += close + 1;
                    selector.attributes.push(parse_attribute(&body).ok_or_else(|| invalid("bad attribute selector"))?);
                }
                other => {
                    return Err(invalid(&format!("unsupported character '{}'", other)));
                }
            }
        }

        Ok(selector)
    }

    /// Whether an element satisfies every part of the selector
    pub fn matches(&self, element: &ElementNode) -> bool {
        if let Some(tag) = &self.tag {
            if !element.is_tag(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| element.has_class(c)) {
            return false;
        }
        self.attributes.iter().all(|cond| match (&cond.value, element.get_attribute(&cond.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        })
    }
}

/// Relation between two compounds of a complex selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// `a b`: any ancestor
    Descendant,
    /// `a > b`: the parent
    Child,
}

/// Compounds joined by descendant and child combinators: `nav.main > ul a`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    compounds: Vec<SimpleSelector>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

impl Selector {
    pub fn parse(input: &str) -> Result<Self> {
        let source = input.trim();
        if source.is_empty() {
            return Err(SyncError::InvalidSelector("empty selector".to_string()));
        }
        let invalid = |reason: &str| SyncError::InvalidSelector(format!("{}: {}", source, reason));

        let mut compounds = Vec::new();
        let mut combinators = Vec::new();
        let mut current = String::new();
        let mut pending: Option<Combinator> = None;
        let mut in_brackets = false;

        for c in source.chars() {
            if in_brackets {
                current.push(c);
                in_brackets = c != ']';
                continue;
            }
            if c.is_whitespace() || c == '>' {
                if !current.is_empty() {
                    compounds.push(SimpleSelector::parse(&current)?);
                    current.clear();
                    pending = Some(Combinator::Descendant);
                }
                if c == '>' {
                    pending = match pending {
                        Some(Combinator::Descendant) => Some(Combinator::Child),
                        _ => return Err(invalid("misplaced '>'")),
                    };
                }
                continue;
            }
            if current.is_empty() {
                if let Some(combinator) = pending.take() {
                    combinators.push(combinator);
                }
            }
            in_brackets = c == '[';
            current.push(c);
        }

        if current.is_empty() {
            return Err(invalid("dangling combinator"));
        }
        compounds.push(SimpleSelector::parse(&current)?);

        Ok(Self { compounds, combinators })
    }

    /// The rightmost compound, the one naming the matched element
    pub fn subject(&self) -> &SimpleSelector {
        &self.compounds[self.compounds.len() - 1]
    }

    /// Whether the element at `path` matches, checking ancestors right to left
    pub fn matches_at(&self, tree: &DomTree, path: &[usize]) -> bool {
        self.matches_from(tree, path, self.compounds.len() - 1)
    }

    fn matches_from(&self, tree: &DomTree, path: &[usize], index: usize) -> bool {
        let Some(element) = tree.element(path) else {
            return false;
        };
        if !self.compounds[index].matches(element) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => !path.is_empty() && self.matches_from(tree, &path[..path.len() - 1], index - 1),
            Combinator::Descendant => (0..path.len()).rev().any(|end| self.matches_from(tree, &path[..end], index - 1)),
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        *pos += 1;
    }
    chars[start..*pos].iter().collect()
}

fn parse_attribute(body: &str) -> Option<AttributeCondition> {
    let body = body.trim();
    match body.split_once('=') {
        None => {
            if body.is_empty() || !body.chars().all(is_ident_char) {
                return None;
            }
            Some(AttributeCondition { name: body.to_string(), value: None })
        }
        Some((name, value)) => {
            let name = name.trim();
            if name.is_empty() || !name.chars().all(is_ident_char) {
                return None;
            }
            let value = value.trim();
            let unquoted = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Some(AttributeCondition {
                name: name.to_string(),
                value: Some(unquoted.to_string()),
            })
        }
    }
}
