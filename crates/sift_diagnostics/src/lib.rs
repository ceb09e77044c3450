//! Diagnostic accumulation for symbol processing.
//!
//! Processors report messages through the thread-safe [`DiagnosticSink`],
//! which doubles as the processor logger. The sink tracks its error count
//! atomically; the round scheduler consults [`DiagnosticSink::has_errors`]
//! after every round to decide whether to continue, finish, or abort.
//! Rendering accumulated diagnostics is left to the embedding build driver.

#![warn(missing_docs)]

pub mod diagnostic;
pub mod severity;
pub mod sink;

pub use diagnostic::Diagnostic;
pub use severity::Severity;
pub use sink::DiagnosticSink;
