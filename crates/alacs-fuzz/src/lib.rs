//! Bounded-depth random [`File`] generation for the round-trip property
//! checks in `alacs-cli`'s `run` command: `decode(encode(T)) == T`,
//! `from_plain(to_plain(T)) == T`, and `encode(decode(B)) == B`.
//!
//! Single-threaded, single-use: a [`Random`] owns an [`Indent`] chain
//! it walks up and down as it descends into nested containers, purely
//! to seed each generated comment's first line with the path the
//! comment would sit at (`"{path} after"`, `"{path} intro"`, ...),
//! which makes a mismatch easy to spot by eye in a failing comparison.

use alacs_core::indent::{Indent, IndentKey};
use alacs_core::model::{Comment, Dict, File, Key, ListValue, Value};
use alacs_core::utf8::Utf8;
use rand::Rng;

/// `\t` plus the printable ASCII range `32..127`, the same alphabet the
/// reference generator draws keys, text, and comment bodies from.
fn alphabet() -> Vec<u8> {
    let mut bytes = vec![b'\t'];
    bytes.extend(32u8..127);
    bytes
}

fn randrange<R: Rng + ?Sized>(rng: &mut R, n: usize) -> usize {
    if n == 0 {
        0
    } else {
        rng.gen_range(0..n)
    }
}

fn random_bytes<R: Rng + ?Sized>(rng: &mut R, alphabet: &[u8], len: usize) -> Vec<u8> {
    (0..len).map(|_| alphabet[rng.gen_range(0..alphabet.len())]).collect()
}

/// Bounded-depth, bounded-breadth random [`File`] generator.
///
/// `deepest`/`widest` of `0` degenerate to "never descend"/"never add a
/// sibling" rather than panicking, since a CLI-exposed `loops`/
/// `deepest`/`widest` of `0` is a legitimate (if boring) configuration.
pub struct Random<R> {
    rng: R,
    deepest: usize,
    widest: usize,
    alphabet: Vec<u8>,
    indent: Indent,
}

impl<R: Rng> Random<R> {
    #[must_use]
    pub fn new(rng: R, deepest: usize, widest: usize) -> Self {
        Self {
            rng,
            deepest,
            widest,
            alphabet: alphabet(),
            indent: Indent::root(),
        }
    }

    fn random_key_text(&mut self) -> String {
        let len = randrange(&mut self.rng, 20);
        let bytes = random_bytes(&mut self.rng, &self.alphabet, len);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn random_key(&mut self) -> Key {
        let text = self.random_key_text();
        match Key::new(text) {
            Ok(key) => key,
            Err(_) => unreachable!("fuzz alphabet excludes newline"),
        }
    }

    fn comment(&mut self, kind: &str) -> Comment {
        let mut lines = vec![format!("{} {kind}", self.indent.path()).into_bytes()];
        for _ in 0..randrange(&mut self.rng, 3) {
            let len = randrange(&mut self.rng, 80);
            lines.push(random_bytes(&mut self.rng, &self.alphabet, len));
        }
        let mut text = Utf8::from_lines(lines);
        if text.len() == 1 && text.get(0).is_some_and(<[u8]>::is_empty) {
            text.clear();
        }
        Comment::new(text, 0)
    }

    fn random_text(&mut self) -> Utf8 {
        let mut lines = Vec::new();
        for _ in 0..randrange(&mut self.rng, 3) {
            let len = randrange(&mut self.rng, 80);
            lines.push(random_bytes(&mut self.rng, &self.alphabet, len));
        }
        let mut text = Utf8::from_lines(lines);
        if text.len() == 1 && text.get(0).is_some_and(<[u8]>::is_empty) {
            text.clear();
        }
        text
    }

    fn value(&mut self, depth: usize) -> Value {
        match randrange(&mut self.rng, 3) {
            0 => Value::Dict(self.dict(depth + 1)),
            1 => Value::List(self.list(depth + 1)),
            _ => Value::Text(alacs_core::model::TextValue::new(self.random_text())),
        }
    }

    fn list(&mut self, depth: usize) -> ListValue {
        let mut items = Vec::new();
        if depth < randrange(&mut self.rng, self.deepest) {
            self.indent = self.indent.more();
            for index in 0..randrange(&mut self.rng, self.widest) {
                self.indent.set_key(IndentKey::Index(index));
                items.push(self.value(depth));
            }
            self.indent = self.indent.less();
        }
        if items.is_empty() {
            items.push(Value::text(Utf8::from_str_lines(["value"])));
        }
        let comment_after = self.rng.gen_bool(0.5).then(|| self.comment("after"));
        let comment_intro = self.rng.gen_bool(0.5).then(|| self.comment("intro"));
        ListValue {
            items,
            comment_intro,
            comment_after,
        }
    }

    /// Shared by nested dicts and [`Random::file`] (the file-level root
    /// has no `comment_after` slot, so only this half is common).
    fn dict_entries(&mut self, depth: usize) -> (Dict, Option<Comment>) {
        let mut entries = Dict::new();
        if depth < randrange(&mut self.rng, self.deepest) {
            self.indent = self.indent.more();
            for _ in 0..randrange(&mut self.rng, self.widest) {
                let mut key = self.random_key();
                self.indent.set_key(IndentKey::Str(key.as_str().to_string()));
                if self.rng.gen_bool(0.5) {
                    key.blank_line_before = true;
                }
                if self.rng.gen_bool(0.5) {
                    key.comment_before = Some(self.comment("before"));
                }
                let value = self.value(depth);
                entries.insert(key, value);
            }
            self.indent = self.indent.less();
        }
        if entries.is_empty() {
            let key = match Key::new("key") {
                Ok(key) => key,
                Err(_) => unreachable!("\"key\" has no newline"),
            };
            entries.insert(key, Value::text(Utf8::from_str_lines(["value"])));
        }
        let comment_intro = self.rng.gen_bool(0.5).then(|| self.comment("intro"));
        (entries, comment_intro)
    }

    fn dict(&mut self, depth: usize) -> alacs_core::model::DictValue {
        let (entries, comment_intro) = self.dict_entries(depth);
        let comment_after = self.rng.gen_bool(0.5).then(|| self.comment("after"));
        alacs_core::model::DictValue {
            entries,
            comment_intro,
            comment_after,
        }
    }

    /// Generate a bounded-depth, bounded-breadth random [`File`].
    pub fn file(&mut self) -> File {
        self.indent = self.indent.zero();
        let hashbang = self.rng.gen_bool(0.5).then(|| self.comment("hashbang"));
        let (root, comment_intro) = self.dict_entries(0);
        File {
            root,
            hashbang,
            comment_intro,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Random;
    use alacs_core::model::file_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn generates_non_empty_file() {
        let mut random = Random::new(StdRng::seed_from_u64(1), 4, 4);
        let file = random.file();
        assert!(!file.root.is_empty());
    }

    #[test]
    fn zero_deepest_and_widest_still_produces_a_leaf() {
        let mut random = Random::new(StdRng::seed_from_u64(2), 0, 0);
        let file = random.file();
        assert_eq!(file.root.len(), 1);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let mut a = Random::new(StdRng::seed_from_u64(7), 3, 3);
        let mut b = Random::new(StdRng::seed_from_u64(7), 3, 3);
        assert!(file_eq(&a.file(), &b.file()));
    }
}
