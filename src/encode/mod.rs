//! Encoding sinks.
//!
//! Sinks consume rendered frames in timeline order; [`stream::encode_timeline`] drives them.

/// `ffmpeg`-based sink (muxed container output via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait, output settings and the in-memory sink.
pub mod sink;
/// Timeline sampling into a sink.
pub mod stream;
