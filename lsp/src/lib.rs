//! LSP server surface for Caravel.
//!
//! The editor talks to us over `Content-Length`-framed JSON-RPC on stdio.
//! [`server::run_stdio`] owns the loop; [`sink::DiagnosticsPublisher`] is the
//! single writer of diagnostic state back to the editor.

pub mod codec;
pub mod protocol;
pub mod sink;

mod server;

pub use server::run_stdio;
pub use sink::DiagnosticsPublisher;
