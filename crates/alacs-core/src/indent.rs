//! The indent stack: a doubly linked chain of tab-depth levels used to
//! track the "current key path" for diagnostics. Not a domain entity —
//! purely an implementation vehicle for the decoder and the fuzz
//! generator to render `/k1/k2[3]/k4`-style paths.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// The key currently active at one indent level, used only to render
/// [`Indent::path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndentKey {
    None,
    Index(usize),
    Str(String),
}

struct Node {
    depth: usize,
    more: Option<Rc<RefCell<Node>>>,
    less: Weak<RefCell<Node>>,
    key: IndentKey,
}

/// A handle into the indent chain. Cheap to clone (reference-counted);
/// cloning does not allocate a new level.
#[derive(Clone)]
pub struct Indent(Rc<RefCell<Node>>);

impl Indent {
    /// Construct an indent level directly from its tab-byte prefix, with
    /// no parent link — the same standalone construction
    /// `pointer.py`'s `Indent.__init__` allows (used there to build a
    /// root or a detached comparison point from a raw byte string).
    ///
    /// # Panics
    ///
    /// Panics with `"indent must be tab chars only"` if `bytes` contains
    /// anything but `\t`; tabs are the only legal indentation byte (spec
    /// §6) so a non-tab byte here is a caller bug, not malformed input.
    #[must_use]
    pub fn from_tabs(bytes: &[u8]) -> Self {
        assert!(bytes.iter().all(|&b| b == b'\t'), "indent must be tab chars only");
        Self(Rc::new(RefCell::new(Node {
            depth: bytes.len(),
            more: None,
            less: Weak::new(),
            key: IndentKey::None,
        })))
    }

    /// The zero-depth root of a fresh chain.
    #[must_use]
    pub fn root() -> Self {
        Self::from_tabs(b"")
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.borrow().depth
    }

    pub fn set_key(&self, key: IndentKey) {
        self.0.borrow_mut().key = key;
    }

    /// Descend one level, lazily allocating it on first visit. On a
    /// second visit to an already-allocated level, its cached key is
    /// cleared (it belongs to whatever the caller is about to park
    /// there next).
    #[must_use]
    pub fn more(&self) -> Self {
        let child = {
            let existing = self.0.borrow().more.clone();
            existing
        };
        if let Some(child) = child {
            child.borrow_mut().key = IndentKey::None;
            Self(child)
        } else {
            let child = Rc::new(RefCell::new(Node {
                depth: self.depth() + 1,
                more: None,
                less: Rc::downgrade(&self.0),
                key: IndentKey::None,
            }));
            self.0.borrow_mut().more = Some(Rc::clone(&child));
            Self(child)
        }
    }

    /// Ascend one level.
    ///
    /// # Panics
    ///
    /// Panics if already at the root — indent cannot go negative; a
    /// caller that hits this has a decoder/encoder bug, not malformed
    /// input.
    #[must_use]
    pub fn less(&self) -> Self {
        self.0
            .borrow()
            .less
            .upgrade()
            .map(Self)
            .expect("indent can't go negative")
    }

    /// Walk to the root, nulling every cached key along the way back
    /// down, and return the root handle.
    #[must_use]
    pub fn zero(&self) -> Self {
        let mut cursor = self.clone();
        while cursor.0.borrow().less.upgrade().is_some() {
            cursor = cursor.less();
        }
        let root = cursor.clone();
        let mut node = Some(cursor);
        while let Some(current) = node {
            current.0.borrow_mut().key = IndentKey::None;
            node = current.0.borrow().more.clone().map(Self);
        }
        root
    }

    /// Render the chain as `/k1/k2[3]/k4`, slash-escaping `~` and `/`
    /// inside string keys (`~` -> `~0`, `/` -> `~1`).
    #[must_use]
    pub fn path(&self) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(self.clone());
        while let Some(current) = cursor {
            let key = current.0.borrow().key.clone();
            match key {
                IndentKey::None => {}
                IndentKey::Index(i) => segments.push(format!("[{i}]")),
                IndentKey::Str(s) => segments.push(format!("/{}", escape_segment(&s))),
            }
            cursor = current.0.borrow().less.upgrade().map(Self);
        }
        segments.reverse();
        segments.concat()
    }
}

fn escape_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::{Indent, IndentKey};

    #[test]
    fn more_allocates_lazily_and_reuses() {
        let root = Indent::root();
        let one = root.more();
        one.set_key(IndentKey::Str("a".into()));
        let one_again = root.more();
        // same underlying node, key cleared on revisit
        assert_eq!(one_again.depth(), 1);
        assert_eq!(one_again.path(), "");
    }

    #[test]
    #[should_panic(expected = "indent can't go negative")]
    fn less_at_root_panics() {
        Indent::root().less();
    }

    #[test]
    fn from_tabs_accepts_tab_only_bytes() {
        let indent = Indent::from_tabs(b"\t\t");
        assert_eq!(indent.depth(), 2);
    }

    #[test]
    #[should_panic(expected = "indent must be tab chars only")]
    fn from_tabs_rejects_non_tab_bytes() {
        Indent::from_tabs(b" ");
    }

    #[test]
    fn zero_nulls_every_key() {
        let root = Indent::root();
        let a = root.more();
        a.set_key(IndentKey::Str("a".into()));
        let b = a.more();
        b.set_key(IndentKey::Str("b".into()));
        let back_to_root = b.zero();
        assert_eq!(back_to_root.depth(), 0);
        assert_eq!(a.path(), "");
        assert_eq!(b.path(), "");
    }

    #[test]
    fn path_renders_nested_keys() {
        let root = Indent::root();
        let a = root.more();
        a.set_key(IndentKey::Str("k1".into()));
        let b = a.more();
        b.set_key(IndentKey::Index(3));
        let c = b.more();
        c.set_key(IndentKey::Str("k4".into()));
        assert_eq!(c.path(), "/k1[3]/k4");
    }

    #[test]
    fn path_escapes_tilde_and_slash() {
        let root = Indent::root();
        let a = root.more();
        a.set_key(IndentKey::Str("a/b~c".into()));
        assert_eq!(a.path(), "/a~1b~0c");
    }
}
