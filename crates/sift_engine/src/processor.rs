//! The processor API: the trait a symbol processor implements and the
//! per-round context it receives.

use crate::resolver::Resolver;
use sift_codegen::CodeGenerator;
use sift_diagnostics::DiagnosticSink;
use sift_symbol::NodeId;
use std::collections::BTreeMap;
use std::fmt;

/// The boxed error type processor hooks return.
pub type ProcessorError = Box<dyn std::error::Error + Send + Sync>;

/// A one-based round counter, threaded explicitly through the scheduler
/// so processors can tell first-round work from follow-up rounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Round(u32);

impl Round {
    /// The first round of a build.
    pub const FIRST: Round = Round(1);

    /// Creates a round counter.
    pub fn new(number: u32) -> Self {
        Self(number)
    }

    /// Returns the round number, starting at 1.
    pub fn number(self) -> u32 {
        self.0
    }

    /// Returns `true` for the first round of a build.
    pub fn is_first(self) -> bool {
        self.0 == 1
    }

    /// Returns the counter for the following round.
    pub fn next(self) -> Round {
        Round(self.0 + 1)
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "round {}", self.0)
    }
}

/// The per-round view of the build handed to a processor.
pub struct ProcessorContext<'a> {
    /// Query interface over the symbol session.
    pub resolver: Resolver<'a>,
    /// Output file creation, with dependency tracking.
    pub generator: &'a mut CodeGenerator,
    /// Diagnostic reporting. An error diagnostic fails the build after
    /// the current round completes.
    pub sink: &'a DiagnosticSink,
    /// The processor options supplied by the driver.
    pub options: &'a BTreeMap<String, String>,
    /// The current round.
    pub round: Round,
}

/// A symbol processor.
///
/// One instance lives for one build and sees every round. `process` runs
/// once per round and returns the symbols it could not yet handle; those
/// are handed back through the resolver's deferred list next round.
/// Exactly one of `finish` or `on_error` runs at the end of the build.
pub trait SymbolProcessor {
    /// A stable name, used in diagnostics and error reporting.
    fn name(&self) -> &str;

    /// Called once before the first round.
    fn init(&mut self, _options: &BTreeMap<String, String>) -> Result<(), ProcessorError> {
        Ok(())
    }

    /// Called once per round. Returns the symbols to defer to the next
    /// round, typically those that failed validation.
    fn process(&mut self, cx: &mut ProcessorContext<'_>) -> Result<Vec<NodeId>, ProcessorError>;

    /// Called once after the last round of a successful build.
    fn finish(&mut self) {}

    /// Called once when the build fails after `init` has run.
    fn on_error(&mut self) {}
}
