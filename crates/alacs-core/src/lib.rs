//! The ALACS tree model plus the decoder/encoder pair that round-trips
//! it through the tab-indented text format.
//!
//! [`Engine`] is the public surface: `decode`/`encode`/`to_plain`/
//! `from_plain`. Everything else here is the tree ([`model`]), the
//! UTF-8 line buffer it's built from ([`utf8`]), the indent stack used
//! for diagnostic paths ([`indent`]), and the error taxonomy
//! ([`diagnostics`]).

pub mod decode;
pub mod diagnostics;
pub mod encode;
pub mod engine;
pub mod indent;
pub mod model;
pub mod plain;
pub mod utf8;

pub use diagnostics::{AggregatedError, ErrorItem};
pub use engine::Engine;
pub use model::{Comment, Dict, File, Key, KeyError, Value};
pub use plain::Plain;
pub use utf8::Utf8;
