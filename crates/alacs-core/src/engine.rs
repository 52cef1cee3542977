//! The public surface: [`Engine::decode`], [`Engine::encode`],
//! [`Engine::to_plain`], and [`Engine::from_plain`].
//!
//! Each method builds its own local decoder/encoder state rather than
//! reusing scratch buffers across calls — unlike the reference
//! implementation this was ported from, Rust's ownership model makes
//! per-call allocation cheap enough that there is nothing worth
//! caching on `Engine` itself. The type still exists, `&mut self`
//! methods and all, so a caller reads one engine instance as the unit
//! of "not shareable across threads" that the format's concurrency
//! model calls for.

use indexmap::IndexMap;

use crate::decode;
use crate::diagnostics::{AggregatedError, DECODE_HEADLINE, ENCODE_HEADLINE, FROM_PLAIN_HEADLINE, TO_PLAIN_HEADLINE};
use crate::encode;
use crate::model::File;
use crate::plain::{self, Plain};

#[derive(Debug, Default)]
pub struct Engine;

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// # Errors
    ///
    /// Returns an [`AggregatedError`] if the input violates the
    /// format's structural rules.
    pub fn decode(&mut self, input: &[u8]) -> Result<File, AggregatedError> {
        tracing::debug!(bytes = input.len(), "decode: start");
        let (file, mut errors) = decode::run(input);
        match errors.finish(DECODE_HEADLINE) {
            Some(err) => {
                tracing::warn!(errors = err.items.len(), "decode: failed");
                Err(err)
            }
            None => Ok(file),
        }
    }

    /// # Errors
    ///
    /// Returns an [`AggregatedError`] if `file` contains a Value or Key
    /// the encoder doesn't recognize (unreachable with the current
    /// closed [`crate::model::Value`] type, kept for API symmetry).
    pub fn encode(&mut self, file: &File) -> Result<Vec<u8>, AggregatedError> {
        let (bytes, mut errors) = encode::run(file);
        match errors.finish(ENCODE_HEADLINE) {
            Some(err) => Err(err),
            None => Ok(bytes),
        }
    }

    /// # Errors
    ///
    /// Never fails in practice (see [`crate::plain`]); returns
    /// `Result` for symmetry with the other three operations.
    pub fn to_plain(&mut self, file: &File) -> Result<IndexMap<String, Plain>, AggregatedError> {
        let (map, mut errors) = plain::to_plain(file);
        match errors.finish(TO_PLAIN_HEADLINE) {
            Some(err) => Err(err),
            None => Ok(map),
        }
    }

    /// # Errors
    ///
    /// Returns an [`AggregatedError`] if any key in `map` (at any
    /// depth) contains a newline.
    pub fn from_plain(&mut self, map: &IndexMap<String, Plain>) -> Result<File, AggregatedError> {
        let (file, mut errors) = plain::from_plain(map);
        match errors.finish(FROM_PLAIN_HEADLINE) {
            Some(err) => Err(err),
            None => Ok(file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Engine;

    #[test]
    fn decode_then_encode_round_trips_canonical_bytes() {
        let mut engine = Engine::new();
        let file = engine.decode(b"k=v").unwrap();
        let bytes = engine.encode(&file).unwrap();
        assert_eq!(bytes, b"k=v");
    }

    #[test]
    fn decode_reports_aggregated_error() {
        let mut engine = Engine::new();
        let err = engine.decode(b"\n\nk=v").unwrap_err();
        assert!(err.to_string().contains("more than one blank line"));
    }

    #[test]
    fn plain_round_trip() {
        let mut engine = Engine::new();
        let file = engine.decode(b"k=v").unwrap();
        let plain = engine.to_plain(&file).unwrap();
        let rebuilt = engine.from_plain(&plain).unwrap();
        let bytes = engine.encode(&rebuilt).unwrap();
        assert_eq!(bytes, b"k=v");
    }
}
