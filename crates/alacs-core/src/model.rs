//! The ALACS tree: [`Value`] (Text | List | Dict), [`Key`], [`Comment`],
//! and the top-level [`File`].
//!
//! `Key`'s `Hash`/`Eq` are text-only (its `blank_line_before` and
//! `comment_before` are annotations, not identity), so `IndexMap`'s own
//! `==` cannot be used to check full round-trip equality. The
//! `*_eq`/`*_eq_ignoring_comments` free functions below do that instead.

use std::borrow::Borrow;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use thiserror::Error;

use crate::utf8::Utf8;

/// A dict's entries, in insertion order.
pub type Dict = IndexMap<Key, Value>;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("newline in key")]
pub struct KeyError;

/// A dict key: plain text plus two annotation slots that exist purely
/// to survive a round-trip (they take no part in hashing or equality).
#[derive(Debug, Clone)]
pub struct Key {
    text: String,
    pub blank_line_before: bool,
    pub comment_before: Option<Comment>,
}

impl Key {
    /// # Errors
    ///
    /// Returns [`KeyError`] if `text` contains a newline.
    pub fn new(text: impl Into<String>) -> Result<Self, KeyError> {
        let text = text.into();
        if text.contains('\n') {
            return Err(KeyError);
        }
        Ok(Self {
            text,
            blank_line_before: false,
            comment_before: None,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.text
    }
}

/// A comment block: its text plus an informational 1-based starting
/// line, preserved through round-trips but excluded from equality
/// (reassigned on every encode).
#[derive(Debug, Clone, Default)]
pub struct Comment {
    pub lines: Utf8,
    pub starting_line: usize,
}

impl Comment {
    #[must_use]
    pub fn new(lines: Utf8, starting_line: usize) -> Self {
        Self {
            lines,
            starting_line,
        }
    }

    fn content_eq(&self, other: &Self) -> bool {
        self.lines == other.lines
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextValue {
    pub lines: Utf8,
    pub comment_after: Option<Comment>,
}

impl TextValue {
    #[must_use]
    pub fn new(lines: Utf8) -> Self {
        Self {
            lines,
            comment_after: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListValue {
    pub items: Vec<Value>,
    pub comment_intro: Option<Comment>,
    pub comment_after: Option<Comment>,
}

#[derive(Debug, Clone, Default)]
pub struct DictValue {
    pub entries: Dict,
    pub comment_intro: Option<Comment>,
    pub comment_after: Option<Comment>,
}

#[derive(Debug, Clone)]
pub enum Value {
    Text(TextValue),
    List(ListValue),
    Dict(DictValue),
}

impl Value {
    #[must_use]
    pub fn text(lines: Utf8) -> Self {
        Value::Text(TextValue::new(lines))
    }

    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(ListValue {
            items,
            ..Default::default()
        })
    }

    #[must_use]
    pub fn dict(entries: Dict) -> Self {
        Value::Dict(DictValue {
            entries,
            ..Default::default()
        })
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
        }
    }
}

/// The top-level dict. Unlike a nested [`DictValue`] it may carry a
/// `hashbang` and never carries `comment_after` (a trailing comment at
/// file scope attaches to the last value instead).
#[derive(Debug, Clone, Default)]
pub struct File {
    pub root: Dict,
    pub hashbang: Option<Comment>,
    pub comment_intro: Option<Comment>,
}

fn comment_opt_eq(a: &Option<Comment>, b: &Option<Comment>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(x), Some(y)) => x.content_eq(y),
        _ => false,
    }
}

fn dict_eq(a: &Dict, b: &Dict) -> bool {
    a.len() == b.len()
        && a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| {
            ka.as_str() == kb.as_str()
                && ka.blank_line_before == kb.blank_line_before
                && comment_opt_eq(&ka.comment_before, &kb.comment_before)
                && value_eq(va, vb)
        })
}

/// Structural equality including every annotation, ignoring the
/// informational `Comment::starting_line`. This is the invariant
/// `decode(encode(T)) == T` checks against.
#[must_use]
pub fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => {
            x.lines == y.lines && comment_opt_eq(&x.comment_after, &y.comment_after)
        }
        (Value::List(x), Value::List(y)) => {
            x.items.len() == y.items.len()
                && x.items.iter().zip(&y.items).all(|(p, q)| value_eq(p, q))
                && comment_opt_eq(&x.comment_intro, &y.comment_intro)
                && comment_opt_eq(&x.comment_after, &y.comment_after)
        }
        (Value::Dict(x), Value::Dict(y)) => {
            dict_eq(&x.entries, &y.entries)
                && comment_opt_eq(&x.comment_intro, &y.comment_intro)
                && comment_opt_eq(&x.comment_after, &y.comment_after)
        }
        _ => false,
    }
}

#[must_use]
pub fn file_eq(a: &File, b: &File) -> bool {
    comment_opt_eq(&a.hashbang, &b.hashbang)
        && comment_opt_eq(&a.comment_intro, &b.comment_intro)
        && dict_eq(&a.root, &b.root)
}

fn dict_eq_ignoring_comments(a: &Dict, b: &Dict) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b.iter())
            .all(|((ka, va), (kb, vb))| ka.as_str() == kb.as_str() && value_eq_ignoring_comments(va, vb))
}

/// Structural equality ignoring every annotation (comments,
/// `blank_line_before`, hashbang). This is the invariant
/// `from_plain(to_plain(T)) == T` checks against, since the plain
/// bridge carries no annotations at all.
#[must_use]
pub fn value_eq_ignoring_comments(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => x.lines == y.lines,
        (Value::List(x), Value::List(y)) => {
            x.items.len() == y.items.len()
                && x.items
                    .iter()
                    .zip(&y.items)
                    .all(|(p, q)| value_eq_ignoring_comments(p, q))
        }
        (Value::Dict(x), Value::Dict(y)) => dict_eq_ignoring_comments(&x.entries, &y.entries),
        _ => false,
    }
}

#[must_use]
pub fn file_eq_ignoring_comments(a: &File, b: &File) -> bool {
    dict_eq_ignoring_comments(&a.root, &b.root)
}

#[cfg(test)]
mod tests {
    use super::{file_eq, value_eq, File, Key, KeyError, Value};
    use crate::utf8::Utf8;

    #[test]
    fn key_rejects_newline() {
        assert_eq!(Key::new("a\nb").unwrap_err(), KeyError);
    }

    #[test]
    fn key_equality_ignores_annotations() {
        let mut a = Key::new("k").unwrap();
        a.blank_line_before = true;
        let b = Key::new("k").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn value_eq_ignores_starting_line_but_not_content() {
        use super::Comment;
        let mut a = Value::text(Utf8::from_str_lines(["hi"]));
        let mut b = a.clone();
        if let Value::Text(t) = &mut a {
            t.comment_after = Some(Comment::new(Utf8::from_str_lines(["c"]), 5));
        }
        if let Value::Text(t) = &mut b {
            t.comment_after = Some(Comment::new(Utf8::from_str_lines(["c"]), 99));
        }
        assert!(value_eq(&a, &b));
    }

    #[test]
    fn empty_files_are_equal() {
        assert!(file_eq(&File::default(), &File::default()));
    }
}
