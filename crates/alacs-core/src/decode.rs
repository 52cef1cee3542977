//! Byte-level tokenizer plus recursive descent over dicts, lists,
//! text, and comments.
//!
//! A `comment_after` can only ever be claimed by peeking the line
//! immediately following a freshly built value ([`Decoder::maybe_attach_comment_after`]),
//! called inline from each of [`Decoder::parse_dict`] and
//! [`Decoder::parse_list`]'s entry-building steps. A `#` line reached
//! through the main dispatch loop instead — i.e. not immediately after
//! a value was built — is always an error ("illegal position for
//! comment" in a dict, "unattached comment" in a list), regardless of
//! whether a prior entry exists; it does not fall back to attaching.

use crate::diagnostics::ErrorList;
use crate::indent::{Indent, IndentKey};
use crate::model::{Comment, DictValue, File, Key, ListValue, Value};
use crate::utf8::Utf8;

struct LineReader<'a> {
    input: &'a [u8],
    pos: usize,
    line_no: usize,
    tabs: usize,
    assign: Option<usize>,
    line: &'a [u8],
    at_eof: bool,
}

impl<'a> LineReader<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line_no: 0,
            tabs: 0,
            assign: None,
            line: &[],
            at_eof: false,
        }
    }

    /// Advance past the next `\n`, refreshing `line`/`tabs`/`assign`.
    /// Returns whether a line was consumed; latches `at_eof` so later
    /// calls keep returning `false` without touching the cursor.
    fn read_line(&mut self) -> bool {
        if self.at_eof || self.pos >= self.input.len() {
            self.at_eof = true;
            self.line = &[];
            self.tabs = 0;
            self.assign = None;
            return false;
        }
        let start = self.pos;
        let end = self.input[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.input.len(), |rel| start + rel);
        self.line = &self.input[start..end];
        self.pos = if end < self.input.len() { end + 1 } else { end };
        self.line_no += 1;
        self.tabs = self.line.iter().take_while(|&&b| b == b'\t').count();
        self.assign = self.line.iter().position(|&b| b == b'=');
        true
    }
}

/// Scan the bytes between a bracket pair (`rest[0]` is the opener) for
/// the first `close` byte. Returns the byte run strictly between them,
/// or `None` if `close` never appears on the line (a malformed
/// opening).
fn bracket_key(rest: &[u8], close: u8) -> Option<&[u8]> {
    let inner = &rest[1..];
    let pos = inner.iter().position(|&b| b == close)?;
    Some(&inner[..pos])
}

fn attach_comment_after(value: &mut Value, comment: Comment) {
    match value {
        Value::Text(t) => t.comment_after = Some(comment),
        Value::List(l) => l.comment_after = Some(comment),
        Value::Dict(d) => d.comment_after = Some(comment),
    }
}

struct Decoder<'a> {
    reader: LineReader<'a>,
    errors: ErrorList,
    indent: Indent,
}

impl<'a> Decoder<'a> {
    fn has_line(&self) -> bool {
        !self.reader.at_eof
    }

    fn tabs(&self) -> usize {
        self.reader.tabs
    }

    fn line(&self) -> &'a [u8] {
        self.reader.line
    }

    fn line_no(&self) -> usize {
        self.reader.line_no
    }

    fn advance(&mut self) {
        self.reader.read_line();
    }

    /// If the current line is over-indented relative to `i`, record one
    /// "excess indentation" error (pluralized with a line count) and
    /// skip every subsequent over-indented line.
    fn skip_excess(&mut self, i: usize) {
        if !self.has_line() || self.tabs() <= i {
            return;
        }
        let first_line = self.line_no();
        let path = self.indent.path();
        let mut count = 1usize;
        self.advance();
        while self.has_line() && self.tabs() > i {
            count += 1;
            self.advance();
        }
        let message = if count == 1 {
            "excess indentation".to_string()
        } else {
            format!("({count} lines) excess indentation")
        };
        self.errors.push(first_line, path, message);
    }

    /// If the line immediately following a just-built value is a `#`
    /// comment at the same indent, consume it as that value's
    /// `comment_after`. This is the *only* way a `#` line is ever
    /// legal mid-scope — a `#` reached through the main dispatch loop
    /// (i.e. not immediately after building a value) is always an
    /// error, even when a prior entry exists to attach to.
    fn maybe_attach_comment_after(&mut self, i: usize, value: &mut Value) {
        if !self.has_line() || self.tabs() != i {
            return;
        }
        let rest = self.line()[i..].to_vec();
        if rest.first() == Some(&b'#') && !rest.starts_with(b"//") {
            let comment = self.parse_marker_comment(i, 1);
            attach_comment_after(value, comment);
        }
    }

    /// Read a `#`/`//`/`#!` comment block: `marker_len` bytes are
    /// stripped from the opening line, and every continuation line
    /// (indent strictly greater than `i`) has ALL of its leading tabs
    /// stripped before being appended.
    fn parse_marker_comment(&mut self, i: usize, marker_len: usize) -> Comment {
        let starting_line = self.line_no();
        let first = self.line()[i + marker_len..].to_vec();
        self.advance();
        let mut lines = vec![first];
        while self.has_line() && self.tabs() > i {
            let stripped: Vec<u8> = self.line().iter().copied().skip_while(|&b| b == b'\t').collect();
            lines.push(stripped);
            self.advance();
        }
        Comment::new(Utf8::from_lines(lines), starting_line)
    }

    /// Read a multi-line Text block: every continuation line (indent
    /// `>= i + 1`) has exactly `i + 1` leading tabs stripped; extra
    /// tabs become literal data.
    fn read_text_block(&mut self, i: usize) -> Utf8 {
        let strip = i + 1;
        let mut lines = Vec::new();
        while self.has_line() && self.tabs() >= strip {
            let raw = self.line();
            let content = if raw.len() >= strip { raw[strip..].to_vec() } else { Vec::new() };
            lines.push(content);
            self.advance();
        }
        Utf8::from_lines(lines)
    }

    /// Parse a `<KEY>`/`[KEY]`/`{KEY}` opener (or the keyless
    /// `<>`/`[]`/`{}` forms used by list items). Returns the raw key
    /// bytes (empty for keyless forms) and the nested value, or `None`
    /// if the bracket never closes on this line — in which case the
    /// offending line has already been discarded.
    fn parse_bracket_value(&mut self, i: usize, rest: &[u8]) -> Option<(Vec<u8>, Value)> {
        let open = rest[0];
        let (close, message) = match open {
            b'<' => (b'>', "malformed text opening"),
            b'[' => (b']', "malformed linear array opening"),
            b'{' => (b'}', "malformed associative array opening"),
            _ => unreachable!("caller only dispatches on <, [, {{"),
        };
        let Some(key) = bracket_key(rest, close) else {
            self.errors.push(self.line_no(), self.indent.path(), message);
            self.advance();
            return None;
        };
        let key = key.to_vec();
        self.advance();
        let value = match open {
            b'<' => Value::text(self.read_text_block(i)),
            b'[' => {
                self.indent = self.indent.more();
                let list = self.parse_list();
                self.indent = self.indent.less();
                Value::List(list)
            }
            b'{' => {
                self.indent = self.indent.more();
                let dict = self.parse_dict();
                self.indent = self.indent.less();
                Value::Dict(dict)
            }
            _ => unreachable!(),
        };
        Some((key, value))
    }

    fn parse_short_dict_entry(&mut self, i: usize) -> Option<(Vec<u8>, Value)> {
        let line_no = self.line_no();
        let Some(assign) = self.reader.assign else {
            self.errors.push(line_no, self.indent.path(), "malformed `key=value` association");
            self.advance();
            return None;
        };
        let line = self.line();
        let key = line[i..assign].to_vec();
        let value = line[assign + 1..].to_vec();
        self.advance();
        Some((key, Value::text(Utf8::from_lines(vec![value]))))
    }

    fn parse_hashbang(&mut self) -> Option<Comment> {
        if self.has_line() && self.tabs() == 0 && self.line().starts_with(b"#!") {
            Some(self.parse_marker_comment(0, 2))
        } else {
            None
        }
    }

    fn parse_dict(&mut self) -> DictValue {
        let i = self.indent.depth();
        let mut dict = DictValue::default();
        self.skip_excess(i);
        if self.has_line() && self.tabs() == i {
            let rest = self.line()[i..].to_vec();
            if rest.first() == Some(&b'#') && !rest.starts_with(b"//") {
                dict.comment_intro = Some(self.parse_marker_comment(i, 1));
                self.skip_excess(i);
            }
        }
        let mut pending_blank = false;
        let mut pending_key_comment: Option<Comment> = None;
        loop {
            if !self.has_line() || self.tabs() != i {
                break;
            }
            let rest = self.line()[i..].to_vec();
            let line_no = self.line_no();
            if rest.is_empty() {
                if pending_key_comment.is_some() {
                    self.errors
                        .push(line_no, self.indent.path(), "blank line must precede key comment");
                } else if pending_blank {
                    self.errors.push(line_no, self.indent.path(), "more than one blank line");
                } else {
                    pending_blank = true;
                }
                self.advance();
                continue;
            }
            if rest[0] == b'#' {
                self.errors.push(line_no, self.indent.path(), "illegal position for comment");
                let _ = self.parse_marker_comment(i, 1);
                continue;
            }
            if rest[0] == b'/' {
                if rest.starts_with(b"//") {
                    if pending_key_comment.is_some() {
                        self.errors.push(line_no, self.indent.path(), "more than one key comment");
                    }
                    pending_key_comment = Some(self.parse_marker_comment(i, 2));
                } else {
                    self.errors.push(line_no, self.indent.path(), "malformed key comment");
                    self.advance();
                }
                continue;
            }
            let built = match rest[0] {
                b'<' | b'[' | b'{' => self.parse_bracket_value(i, &rest),
                _ => self.parse_short_dict_entry(i),
            };
            let Some((key_bytes, mut value)) = built else {
                continue;
            };
            self.maybe_attach_comment_after(i, &mut value);
            let key_text = String::from_utf8_lossy(&key_bytes).into_owned();
            let mut key = match Key::new(key_text) {
                Ok(key) => key,
                Err(_) => unreachable!("line bytes never contain a newline"),
            };
            key.blank_line_before = pending_blank;
            key.comment_before = pending_key_comment.take();
            pending_blank = false;
            if dict.entries.contains_key(key.as_str()) {
                self.errors
                    .push(line_no, self.indent.path(), format!("duplicate key: {}", key.as_str()));
            }
            self.indent.set_key(IndentKey::Str(key.as_str().to_string()));
            dict.entries.insert(key, value);
        }
        if pending_blank || pending_key_comment.is_some() {
            self.errors
                .push(self.line_no(), self.indent.path(), "unclaimed key comment or blank line");
        }
        dict
    }

    fn parse_list(&mut self) -> ListValue {
        let i = self.indent.depth();
        let mut list = ListValue::default();
        self.skip_excess(i);
        if self.has_line() && self.tabs() == i {
            let rest = self.line()[i..].to_vec();
            if rest.first() == Some(&b'#') && !rest.starts_with(b"//") {
                list.comment_intro = Some(self.parse_marker_comment(i, 1));
                self.skip_excess(i);
            }
        }
        let mut idx = 0usize;
        loop {
            if !self.has_line() || self.tabs() != i {
                break;
            }
            let rest = self.line()[i..].to_vec();
            let line_no = self.line_no();
            if rest.is_empty() {
                self.indent.set_key(IndentKey::Index(idx));
                self.advance();
                let mut item = Value::text(Utf8::new());
                self.maybe_attach_comment_after(i, &mut item);
                list.items.push(item);
                idx += 1;
                continue;
            }
            if rest[0] == b'#' {
                self.errors.push(line_no, self.indent.path(), "unattached comment");
                let _ = self.parse_marker_comment(i, 1);
                continue;
            }
            if rest[0] == b'/' {
                let marker_len = if rest.starts_with(b"//") { 2 } else { 1 };
                self.errors.push(line_no, self.indent.path(), "key comment in list context");
                let _ = self.parse_marker_comment(i, marker_len);
                continue;
            }
            self.indent.set_key(IndentKey::Index(idx));
            let item = match rest[0] {
                b'<' | b'[' | b'{' => self.parse_bracket_value(i, &rest).map(|(_, value)| value),
                _ => {
                    self.advance();
                    Some(Value::text(Utf8::from_lines(vec![rest])))
                }
            };
            if let Some(mut item) = item {
                self.maybe_attach_comment_after(i, &mut item);
                list.items.push(item);
                idx += 1;
            }
        }
        list
    }
}

/// Decode `input` into a [`File`], returning every error recorded
/// along the way. An empty error list means the decode succeeded.
pub(crate) fn run(input: &[u8]) -> (File, ErrorList) {
    let mut reader = LineReader::new(input);
    reader.read_line();
    let mut decoder = Decoder {
        reader,
        errors: ErrorList::new(),
        indent: Indent::root(),
    };
    let hashbang = decoder.parse_hashbang();
    let root = decoder.parse_dict();
    let file = File {
        root: root.entries,
        hashbang,
        comment_intro: root.comment_intro,
    };
    (file, decoder.errors)
}

#[cfg(test)]
mod tests {
    use super::run;
    use crate::model::Value;

    fn decode_ok(input: &str) -> crate::model::File {
        let (file, errors) = run(input.as_bytes());
        assert!(errors.is_empty(), "unexpected decode errors");
        file
    }

    #[test]
    fn e1_short_form() {
        let file = decode_ok("k=v");
        let Value::Text(t) = file.root.get("k").unwrap() else { panic!("not text") };
        assert_eq!(t.lines.to_string_lossy(), "v");
    }

    #[test]
    fn e2_block_text() {
        let file = decode_ok("<k>\n\tline1\n\tline2");
        let Value::Text(t) = file.root.get("k").unwrap() else { panic!("not text") };
        assert_eq!(t.lines.to_string_lossy(), "line1\nline2");
    }

    #[test]
    fn e3_nested_list() {
        let file = decode_ok("[k]\n\ta\n\tb\n\t<>\n\t\tm\n\t\tn");
        let Value::List(list) = file.root.get("k").unwrap() else { panic!("not list") };
        assert_eq!(list.items.len(), 3);
        let Value::Text(last) = &list.items[2] else { panic!("not text") };
        assert_eq!(last.lines.to_string_lossy(), "m\nn");
    }

    #[test]
    fn e3_nested_list_reencodes_to_same_canonical_bytes() {
        let file = decode_ok("[k]\n\ta\n\tb\n\t<>\n\t\tm\n\t\tn");
        let (bytes, errors) = crate::encode::run(&file);
        assert!(errors.is_empty());
        insta::assert_snapshot!(String::from_utf8(bytes).unwrap(), @"[k]\n\ta\n\tb\n\t<>\n\t\tm\n\t\tn");
    }

    #[test]
    fn e4_more_than_one_key_comment() {
        let (_, errors) = run(b"//c1\n//c2\nk=v");
        assert!(!errors.is_empty());
    }

    #[test]
    fn e5_more_than_one_blank_line() {
        let (_, errors) = run(b"\n\nk=v");
        assert!(!errors.is_empty());
    }

    #[test]
    fn e6_duplicate_key() {
        let (file, errors) = run(b"k=v\nk=w");
        assert!(!errors.is_empty());
        let Value::Text(t) = file.root.get("k").unwrap() else { panic!("not text") };
        assert_eq!(t.lines.to_string_lossy(), "w");
    }

    #[test]
    fn empty_input_is_empty_file() {
        let file = decode_ok("");
        assert!(file.root.is_empty());
    }

    #[test]
    fn malformed_text_opening_is_recorded() {
        let (_, errors) = run(b"<k=v");
        assert!(!errors.is_empty());
    }

    #[test]
    fn single_comment_after_attaches() {
        let file = decode_ok("foo=bar\n#attached");
        let Value::Text(t) = file.root.get("foo").unwrap() else { panic!("not text") };
        assert_eq!(t.comment_after.as_ref().unwrap().lines.to_string_lossy(), "attached");
    }

    #[test]
    fn second_comment_after_is_illegal_position_in_dict() {
        let (_, errors) = run(b"foo=bar\n#attached\n#illegal");
        assert!(errors.items().iter().any(|e| e.message.contains("illegal position for comment")));
    }

    #[test]
    fn second_comment_after_is_unattached_in_list() {
        let (_, errors) = run(b"[key]\n\tvalue\n\t#attached\n\t#unattached");
        assert!(errors.items().iter().any(|e| e.message.contains("unattached comment")));
    }
}
