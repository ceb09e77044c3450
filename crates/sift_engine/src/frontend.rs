//! The narrow interface to the external compiler frontend.

use crate::processor::ProcessorError;
use sift_incremental::{IncrementalContext, LookupSymbol};
use sift_symbol::{NodeId, Session};
use std::path::{Path, PathBuf};

/// Receives the dependencies a frontend discovers while parsing, so they
/// end up in the persisted lookup maps.
pub trait LookupRecorder {
    /// Records that `file` structurally depends on `other` (an import, a
    /// supertype in another file, and so on).
    fn record_file_dependency(&mut self, file: &Path, other: PathBuf);

    /// Records that `file` referenced `symbol` by name.
    fn record_symbol_reference(&mut self, file: &Path, symbol: LookupSymbol);
}

impl LookupRecorder for IncrementalContext {
    fn record_file_dependency(&mut self, file: &Path, other: PathBuf) {
        IncrementalContext::record_file_dependency(self, file, other);
    }

    fn record_symbol_reference(&mut self, file: &Path, symbol: LookupSymbol) {
        IncrementalContext::record_symbol_reference(self, file, symbol);
    }
}

/// The external compiler, reduced to the one capability the engine needs:
/// turning source paths into file nodes inside the shared session.
///
/// `parse_files` is called once for the initial sources and once per round
/// for that round's generated sources. Nodes accumulate in the same
/// session, so ids handed out in round one stay valid to the end of the
/// build.
pub trait Frontend {
    /// Parses `paths` into the session and returns one file node per
    /// path, in the same order.
    fn parse_files(
        &mut self,
        session: &mut Session,
        paths: &[PathBuf],
        recorder: &mut dyn LookupRecorder,
    ) -> Result<Vec<NodeId>, ProcessorError>;
}
