//! Canonical-form encoder: recursive traversal emitting a byte stream
//! with a line counter and per-value short-vs-block form selection.

use crate::diagnostics::ErrorList;
use crate::indent::Indent;
use crate::model::{Comment, DictValue, File, ListValue, TextValue, Value};

/// Bytes that force a dict entry into block form when they open the
/// key (the key's `=` is checked separately).
const DICT_KEY_FORBIDDEN: &[u8] = b"\t#<>[]{}/";

/// Bytes that force a list item's single-line Text into block form
/// when they open its first byte.
const LIST_TEXT_FORBIDDEN: &[u8] = b"\t#<>[]{}/=";

struct Encoder {
    out: Vec<u8>,
    line_count: usize,
    indent: Indent,
}

impl Encoder {
    fn write_indent(&mut self) {
        if self.line_count > 0 {
            self.out.push(b'\n');
        }
        self.line_count += 1;
        self.out.extend(std::iter::repeat(b'\t').take(self.indent.depth()));
    }

    fn write_comment_block(&mut self, marker: &[u8], comment: &Comment) {
        self.write_indent();
        self.out.extend_from_slice(marker);
        let mut lines = comment.lines.iter();
        if let Some(first) = lines.next() {
            self.out.extend_from_slice(first);
        }
        for line in lines {
            self.indent = self.indent.more();
            self.write_indent();
            self.out.extend_from_slice(line);
            self.indent = self.indent.less();
        }
    }

    fn write_hashbang(&mut self, comment: &Comment) {
        self.write_comment_block(b"#!", comment);
    }

    /// Dict short form depends only on the key: non-empty and empty
    /// keys are both eligible as long as the key has no `=` and (when
    /// non-empty) doesn't open with a structural byte. The value's
    /// content never disqualifies short form beyond being single-line.
    fn dict_short_form_eligible(key_bytes: &[u8], text: &TextValue) -> bool {
        if text.lines.len() > 1 {
            return false;
        }
        if key_bytes.contains(&b'=') {
            return false;
        }
        key_bytes.first().is_none_or(|&b| !DICT_KEY_FORBIDDEN.contains(&b))
    }

    /// List short form depends only on the item's own bytes, since
    /// list items carry no key.
    fn list_short_form_eligible(text: &TextValue) -> bool {
        match text.lines.len() {
            0 => true,
            1 => text
                .lines
                .get(0)
                .and_then(|line| line.first())
                .is_none_or(|&b| !LIST_TEXT_FORBIDDEN.contains(&b)),
            _ => false,
        }
    }

    fn write_text_block(&mut self, text: &TextValue) {
        for line in text.lines.iter() {
            self.indent = self.indent.more();
            self.write_indent();
            self.out.extend_from_slice(line);
            self.indent = self.indent.less();
        }
    }

    fn write_value_comment_after(&mut self, value: &Value) {
        let comment = match value {
            Value::Text(t) => t.comment_after.as_ref(),
            Value::List(l) => l.comment_after.as_ref(),
            Value::Dict(d) => d.comment_after.as_ref(),
        };
        if let Some(comment) = comment {
            self.write_comment_block(b"#", comment);
        }
    }

    fn write_dict_entry_key(&mut self, key_bytes: &[u8]) {
        self.out.extend_from_slice(key_bytes);
    }

    fn write_dict(&mut self, dict: &DictValue, errors: &mut ErrorList) {
        if let Some(intro) = &dict.comment_intro {
            self.write_comment_block(b"#", intro);
        }
        for (key, value) in &dict.entries {
            if key.blank_line_before {
                self.write_indent();
            }
            if let Some(comment) = &key.comment_before {
                self.write_comment_block(b"//", comment);
            }
            self.write_keyed_value(key.as_str().as_bytes(), value, errors);
            self.write_value_comment_after(value);
        }
    }

    fn write_keyed_value(&mut self, key_bytes: &[u8], value: &Value, errors: &mut ErrorList) {
        match value {
            Value::Text(text) => {
                if Self::dict_short_form_eligible(key_bytes, text) {
                    self.write_indent();
                    self.write_dict_entry_key(key_bytes);
                    self.out.push(b'=');
                    if let Some(line) = text.lines.get(0) {
                        self.out.extend_from_slice(line);
                    }
                } else {
                    self.write_indent();
                    self.out.push(b'<');
                    self.write_dict_entry_key(key_bytes);
                    self.out.push(b'>');
                    self.write_text_block(text);
                }
            }
            Value::List(list) => {
                self.write_indent();
                self.out.push(b'[');
                self.write_dict_entry_key(key_bytes);
                self.out.push(b']');
                self.indent = self.indent.more();
                self.write_list(list, errors);
                self.indent = self.indent.less();
            }
            Value::Dict(dict) => {
                self.write_indent();
                self.out.push(b'{');
                self.write_dict_entry_key(key_bytes);
                self.out.push(b'}');
                self.indent = self.indent.more();
                self.write_dict(dict, errors);
                self.indent = self.indent.less();
            }
        }
    }

    fn write_list(&mut self, list: &ListValue, errors: &mut ErrorList) {
        if let Some(intro) = &list.comment_intro {
            self.write_comment_block(b"#", intro);
        }
        for item in &list.items {
            self.write_list_item(item, errors);
            self.write_value_comment_after(item);
        }
    }

    fn write_list_item(&mut self, item: &Value, errors: &mut ErrorList) {
        match item {
            Value::Text(text) => {
                if Self::list_short_form_eligible(text) {
                    self.write_indent();
                    if let Some(line) = text.lines.get(0) {
                        self.out.extend_from_slice(line);
                    }
                } else {
                    self.write_indent();
                    self.out.extend_from_slice(b"<>");
                    self.write_text_block(text);
                }
            }
            Value::List(list) => {
                self.write_indent();
                self.out.extend_from_slice(b"[]");
                self.indent = self.indent.more();
                self.write_list(list, errors);
                self.indent = self.indent.less();
            }
            Value::Dict(dict) => {
                self.write_indent();
                self.out.extend_from_slice(b"{}");
                self.indent = self.indent.more();
                self.write_dict(dict, errors);
                self.indent = self.indent.less();
            }
        }
    }
}

/// Encode `file` into canonical bytes, returning every error recorded
/// along the way (today the only Value/Key shapes the type system
/// allows are the valid ones, so this is always empty in practice; the
/// list exists to mirror the engine-wide error-accumulation contract).
pub(crate) fn run(file: &File) -> (Vec<u8>, ErrorList) {
    let mut encoder = Encoder {
        out: Vec::new(),
        line_count: 0,
        indent: Indent::root(),
    };
    let mut errors = ErrorList::new();
    if let Some(hashbang) = &file.hashbang {
        encoder.write_hashbang(hashbang);
    }
    let root = DictValue {
        entries: file.root.clone(),
        comment_intro: file.comment_intro.clone(),
        comment_after: None,
    };
    encoder.write_dict(&root, &mut errors);
    (encoder.out, errors)
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::model::{File, Key, Value};
    use crate::utf8::Utf8;

    #[test]
    fn e1_round_trip_short_form() {
        let mut file = File::default();
        file.root.insert(Key::new("k").unwrap(), Value::text(Utf8::from_str_lines(["v"])));
        let (bytes, errors) = run(&file);
        assert!(errors.is_empty());
        assert_eq!(bytes, b"k=v");
    }

    #[test]
    fn e7_comment_after_empty_text() {
        use crate::model::{Comment, TextValue};
        let mut file = File::default();
        let mut text = TextValue::new(Utf8::new());
        text.comment_after = Some(Comment::new(Utf8::new(), 0));
        file.root.insert(Key::new("k").unwrap(), Value::Text(text));
        let (bytes, _) = run(&file);
        assert_eq!(bytes, b"k=\n#");
    }

    #[test]
    fn key_with_forbidden_byte_forces_block_form() {
        let mut file = File::default();
        file.root.insert(
            Key::new("#weird").unwrap(),
            Value::text(Utf8::from_str_lines(["v"])),
        );
        let (bytes, _) = run(&file);
        assert_eq!(bytes, b"<#weird>\n\tv");
    }

    #[test]
    fn empty_file_encodes_to_empty_bytes() {
        let file = File::default();
        let (bytes, errors) = run(&file);
        assert!(errors.is_empty());
        assert!(bytes.is_empty());
    }

    #[test]
    fn short_form_snapshot() {
        let mut file = File::default();
        file.root.insert(Key::new("k").unwrap(), Value::text(Utf8::from_str_lines(["v"])));
        let (bytes, _) = run(&file);
        insta::assert_snapshot!(String::from_utf8(bytes).unwrap(), @"k=v");
    }

    #[test]
    fn hashbang_and_nested_list_snapshot() {
        use crate::model::Comment;
        let mut file = File::default();
        file.hashbang = Some(Comment::new(Utf8::from_str_lines(["/bin/sh"]), 1));
        file.root.insert(Key::new("a").unwrap(), Value::text(Utf8::from_str_lines(["hello"])));
        file.root.insert(
            Key::new("b").unwrap(),
            Value::list(vec![Value::text(Utf8::from_str_lines(["x"])), Value::text(Utf8::from_str_lines(["y"]))]),
        );
        let (bytes, errors) = run(&file);
        assert!(errors.is_empty());
        insta::assert_snapshot!(String::from_utf8(bytes).unwrap(), @"#!/bin/sh\na=hello\n[b]\n\tx\n\ty");
    }
}
