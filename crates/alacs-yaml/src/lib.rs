//! A secondary YAML emitter for the ALACS tree. It does not try to be
//! pretty — it exists so a third-party YAML library can carry a tree
//! through a load+dump cycle without losing any annotation. Every
//! comment is written as a line-leading `#`-comment tagged with the
//! structural slot it came from, so a comparison harness built on top
//! of that library can still tell a hashbang from a key-comment after
//! the round trip.
//!
//! Scalars use the block literal style (`|2-`/`|2+`); keys are double
//! quoted with `\`, `"`, and `\t` escaped; empty containers collapse to
//! `{}`/`[]`.

use alacs_core::model::{Comment, Dict, DictValue, File, Key, ListValue, TextValue, Value};

/// What kind of YAML node the current line is standing in for: the
/// implicit root (no key line at all), a list item (`- `), or a dict
/// entry (`"key": `).
enum KeySlot<'a> {
    Root,
    Item,
    Entry(&'a Key),
}

struct YamlEncoder {
    out: Vec<u8>,
}

impl YamlEncoder {
    fn write_key(&mut self, indent: &[u8], key: &KeySlot<'_>, end: &[u8]) {
        self.out.extend_from_slice(indent);
        match key {
            KeySlot::Root => self.out.extend_from_slice(end),
            KeySlot::Item => {
                self.out.push(b'-');
                if !end.is_empty() {
                    self.out.push(b' ');
                    self.out.extend_from_slice(end);
                }
            }
            KeySlot::Entry(key) => {
                self.out.push(b'"');
                self.out.extend_from_slice(quote_key(key.as_str()).as_bytes());
                self.out.extend_from_slice(b"\":");
                if !end.is_empty() {
                    self.out.push(b' ');
                    self.out.extend_from_slice(end);
                }
            }
        }
        self.out.push(b'\n');
    }

    /// Writes one line per comment entry, every line tagged
    /// `<indent><#|#N><prefix><content>`. `N` is the byte length of
    /// `indent`, except for the hashbang's `!` prefix which always
    /// tags bare `#`. A comment is always rendered as at least one
    /// (possibly content-empty) line — the marker line itself is the
    /// annotation, independent of whether it carries any text.
    fn write_comment(&mut self, indent: &[u8], prefix: &[u8], comment: Option<&Comment>) {
        let Some(comment) = comment else { return };
        let mut tag = indent.to_vec();
        if prefix == b"!" {
            tag.push(b'#');
        } else {
            tag.extend_from_slice(format!("#{}", indent.len()).as_bytes());
        }
        let mut lines = comment.lines.iter();
        self.out.extend_from_slice(&tag);
        self.out.extend_from_slice(prefix);
        if let Some(first) = lines.next() {
            self.out.extend_from_slice(first);
        }
        self.out.push(b'\n');
        for line in lines {
            self.out.extend_from_slice(&tag);
            self.out.extend_from_slice(prefix);
            self.out.extend_from_slice(line);
            self.out.push(b'\n');
        }
    }

    fn write_value(&mut self, indent: &[u8], key: KeySlot<'_>, value: &Value) {
        match value {
            Value::Text(text) => self.write_text(indent, key, text),
            Value::List(list) => self.write_list(indent, key, list),
            Value::Dict(dict) => self.write_dict(indent, key, dict),
        }
        let comment_after = match value {
            Value::Text(t) => t.comment_after.as_ref(),
            Value::List(l) => l.comment_after.as_ref(),
            Value::Dict(d) => d.comment_after.as_ref(),
        };
        self.write_comment(indent, b"a:", comment_after);
    }

    /// `|2-` strips the implicit trailing newline; `|2+` keeps it when
    /// the text's last line is itself empty (a real trailing blank
    /// line in the original content, not an artifact of normalization).
    fn write_text(&mut self, indent: &[u8], key: KeySlot<'_>, text: &TextValue) {
        let len = text.lines.len();
        let ends_blank = len > 0 && text.lines.get(len - 1).is_some_and(<[u8]>::is_empty);
        if ends_blank {
            self.write_key(indent, &key, b"|2+");
            for line in text.lines.iter().take(len - 1) {
                self.write_scalar_line(indent, line);
            }
        } else {
            self.write_key(indent, &key, b"|2-");
            for line in text.lines.iter() {
                self.write_scalar_line(indent, line);
            }
        }
    }

    fn write_scalar_line(&mut self, indent: &[u8], line: &[u8]) {
        self.out.extend_from_slice(indent);
        self.out.extend_from_slice(b"  ");
        self.out.extend_from_slice(line);
        self.out.push(b'\n');
    }

    fn write_list(&mut self, indent: &[u8], key: KeySlot<'_>, list: &ListValue) {
        if list.items.is_empty() {
            self.write_key(indent, &key, b"[]");
            return;
        }
        self.write_key(indent, &key, b"");
        let mut child = indent.to_vec();
        child.push(b' ');
        self.write_comment(&child, b"i:", list.comment_intro.as_ref());
        for item in &list.items {
            self.write_value(&child, KeySlot::Item, item);
        }
    }

    fn write_dict(&mut self, indent: &[u8], key: KeySlot<'_>, dict: &DictValue) {
        if dict.entries.is_empty() {
            self.write_key(indent, &key, b"{}");
            return;
        }
        let body_indent = if matches!(key, KeySlot::Root) {
            indent.to_vec()
        } else {
            self.write_key(indent, &key, b"");
            let mut child = indent.to_vec();
            child.push(b' ');
            child
        };
        self.write_dict_body(&body_indent, dict.comment_intro.as_ref(), &dict.entries);
    }

    fn write_dict_body(&mut self, indent: &[u8], comment_intro: Option<&Comment>, entries: &Dict) {
        self.write_comment(indent, b"i:", comment_intro);
        for (key, value) in entries {
            if key.blank_line_before {
                self.write_comment(indent, b"b", Some(&Comment::default()));
            }
            self.write_comment(indent, b"k:", key.comment_before.as_ref());
            self.write_value(indent, KeySlot::Entry(key), value);
        }
    }
}

fn quote_key(key: &str) -> String {
    key.replace('\\', "\\\\").replace('"', "\\\"").replace('\t', "\\t")
}

/// Serialize `file` as a YAML document shaped `--- !map\n<body>...\n`.
/// Never fails: every input is a valid tree (the type system rules out
/// the malformed shapes `alacs_core::encode` rejects).
#[must_use]
pub fn encode(file: &File) -> Vec<u8> {
    tracing::debug!(entries = file.root.len(), "yaml_encode: start");
    let mut encoder = YamlEncoder { out: Vec::new() };
    encoder.out.extend_from_slice(b"--- !map\n");
    encoder.write_comment(b"", b"!", file.hashbang.as_ref());
    if file.root.is_empty() {
        encoder.write_key(b"", &KeySlot::Root, b"{}");
    } else {
        encoder.write_dict_body(b"", file.comment_intro.as_ref(), &file.root);
    }
    encoder.out.extend_from_slice(b"...\n");
    encoder.out
}

#[cfg(test)]
mod tests {
    use super::encode;
    use alacs_core::model::{Comment, File, Key, Value};
    use alacs_core::utf8::Utf8;

    #[test]
    fn empty_file_is_bare_map() {
        let bytes = encode(&File::default());
        assert_eq!(bytes, b"--- !map\n{}\n...\n");
    }

    #[test]
    fn short_text_entry_uses_literal_block() {
        let mut file = File::default();
        file.root.insert(Key::new("k").unwrap(), Value::text(Utf8::from_str_lines(["v"])));
        let bytes = encode(&file);
        assert_eq!(bytes, b"--- !map\n\"k\": |2-\n  v\n...\n");
    }

    #[test]
    fn trailing_blank_line_keeps_plus_variant() {
        let mut file = File::default();
        file.root.insert(
            Key::new("k").unwrap(),
            Value::text(Utf8::from_str_lines(["v", ""])),
        );
        let bytes = encode(&file);
        assert_eq!(bytes, b"--- !map\n\"k\": |2+\n  v\n...\n");
    }

    #[test]
    fn hashbang_tags_bare_hash() {
        let mut file = File::default();
        file.hashbang = Some(Comment::new(Utf8::from_str_lines(["/bin/sh"]), 1));
        let bytes = encode(&file);
        assert!(bytes.starts_with(b"--- !map\n#!/bin/sh\n"));
    }

    #[test]
    fn blank_line_before_emits_marker() {
        let mut file = File::default();
        let mut key = Key::new("k").unwrap();
        key.blank_line_before = true;
        file.root.insert(key, Value::text(Utf8::from_str_lines(["v"])));
        let bytes = encode(&file);
        assert!(bytes.windows(3).any(|w| w == b"#0b"));
    }

    #[test]
    fn nested_list_indents_with_spaces() {
        let mut file = File::default();
        file.root.insert(
            Key::new("k").unwrap(),
            Value::list(vec![Value::text(Utf8::from_str_lines(["a"]))]),
        );
        let bytes = encode(&file);
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"k\":\n"));
        assert!(text.contains(" - |2-\n"));
    }
}
