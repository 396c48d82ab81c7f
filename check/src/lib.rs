//! Aggregation core for cargo's JSON diagnostic stream.
//!
//! One pass flows raw bytes → [`decode_stream`] → [`CheckRecord`]s →
//! [`aggregate`] → [`caravel_types::DiagnosticSet`]. The decoder and
//! aggregator are synchronous and never fail: malformed input degrades by
//! omission so a pass always produces a (possibly empty) set.

mod aggregate;
mod decode;
mod message;

pub use aggregate::aggregate;
pub use decode::decode_stream;
pub use message::{CheckRecord, CompilerMessage, DiagnosticCode, DiagnosticSpan};
