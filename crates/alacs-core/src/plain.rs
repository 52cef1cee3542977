//! The plain-data bridge: lowering a [`File`] to language-neutral
//! strings/lists/maps and lifting that shape back into a tree.
//!
//! Because [`Value`] is a closed three-variant enum and [`Key`] already
//! rejects newlines at construction, `to_plain` can never actually
//! populate its error list here; `from_plain` keeps a real failure
//! mode, since its input `Plain::Map` keys are arbitrary caller-
//! supplied strings that may still contain a newline.

use indexmap::IndexMap;

use crate::diagnostics::ErrorList;
use crate::indent::{Indent, IndentKey};
use crate::model::{Dict, File, Key, Value};
use crate::utf8::Utf8;

/// A language-neutral value: the shape `to_plain`/`from_plain` trade
/// in. `Null` only ever appears as `from_plain` input, standing in for
/// "absent" (lowered to an empty Text).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plain {
    Null,
    Text(String),
    List(Vec<Plain>),
    Map(IndexMap<String, Plain>),
}

impl Plain {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Plain::Text(s.into())
    }
}

fn value_to_plain(value: &Value) -> Plain {
    match value {
        Value::Text(t) => Plain::Text(t.lines.to_string_lossy()),
        Value::List(l) => Plain::List(l.items.iter().map(value_to_plain).collect()),
        Value::Dict(d) => Plain::Map(
            d.entries
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), value_to_plain(v)))
                .collect(),
        ),
    }
}

pub(crate) fn to_plain(file: &File) -> (IndexMap<String, Plain>, ErrorList) {
    let map = file
        .root
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), value_to_plain(v)))
        .collect();
    (map, ErrorList::new())
}

fn value_from_plain(plain: &Plain, indent: &Indent, errors: &mut ErrorList) -> Value {
    match plain {
        Plain::Null => Value::text(Utf8::new()),
        Plain::Text(s) => Value::text(Utf8::from_lines(vec![s.as_bytes().to_vec()])),
        Plain::List(items) => {
            let child = indent.more();
            let list = items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    child.set_key(IndentKey::Index(idx));
                    value_from_plain(item, &child, errors)
                })
                .collect();
            Value::list(list)
        }
        Plain::Map(map) => {
            let child = indent.more();
            Value::dict(dict_from_plain(map, &child, errors))
        }
    }
}

fn dict_from_plain(map: &IndexMap<String, Plain>, indent: &Indent, errors: &mut ErrorList) -> Dict {
    let mut dict = Dict::new();
    for (k, v) in map {
        match Key::new(k.clone()) {
            Ok(key) => {
                indent.set_key(IndentKey::Str(k.clone()));
                let value = value_from_plain(v, indent, errors);
                dict.insert(key, value);
            }
            // The offending key itself can't become a path segment (it
            // contains the newline the path format can't represent), so
            // the error is anchored to the parent's path instead.
            Err(_) => errors.push_leading_path(0, indent.path(), "newline in key"),
        }
    }
    dict
}

pub(crate) fn from_plain(map: &IndexMap<String, Plain>) -> (File, ErrorList) {
    let indent = Indent::root();
    let mut errors = ErrorList::new();
    let root = dict_from_plain(map, &indent, &mut errors);
    (
        File {
            root,
            hashbang: None,
            comment_intro: None,
        },
        errors,
    )
}

#[cfg(test)]
mod tests {
    use super::{from_plain, to_plain, Plain};
    use crate::model::{file_eq_ignoring_comments, File, Key, Value};
    use crate::utf8::Utf8;
    use indexmap::IndexMap;

    #[test]
    fn round_trips_ignoring_comments() {
        let mut nested = IndexMap::new();
        nested.insert("inner".to_string(), Plain::text("v"));
        let mut root = IndexMap::new();
        root.insert("a".to_string(), Plain::text("hello"));
        root.insert("b".to_string(), Plain::List(vec![Plain::text("x"), Plain::text("y")]));
        root.insert("c".to_string(), Plain::Map(nested));

        let (file, errors) = from_plain(&root);
        assert!(errors.is_empty());
        let (plain, errors) = to_plain(&file);
        assert!(errors.is_empty());
        let (roundtripped, errors) = from_plain(&plain);
        assert!(errors.is_empty());
        assert!(file_eq_ignoring_comments(&file, &roundtripped));
    }

    #[test]
    fn newline_in_key_is_reported() {
        let mut root = IndexMap::new();
        root.insert("a\nb".to_string(), Plain::text("v"));
        let (_, mut errors) = from_plain(&root);
        assert!(!errors.is_empty());
        let aggregated = errors.finish("can't be converted to `Value`").unwrap();
        assert_eq!(aggregated.items[0].to_string(), "#0: @: newline in key");
    }

    #[test]
    fn to_plain_never_errors() {
        let mut file = File::default();
        file.root.insert(Key::new("k").unwrap(), Value::text(Utf8::from_str_lines(["v"])));
        let (_, errors) = to_plain(&file);
        assert!(errors.is_empty());
    }
}
