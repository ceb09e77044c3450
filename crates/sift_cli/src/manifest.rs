//! The built-in `symbols-manifest` processor.

use sift_codegen::Dependencies;
use sift_engine::{ProcessorContext, ProcessorError, SymbolProcessor};
use sift_symbol::{collect_defined_symbols, NodeId, SymbolKind};
use std::io::Write;

/// An aggregating processor that writes one resource listing every file
/// in the compilation and the symbols it defines.
///
/// Because the manifest depends on all sources, any change at all
/// regenerates it; it doubles as a smoke test that aggregating
/// invalidation works end to end.
pub struct SymbolsManifest;

/// The processor's registry name.
pub const NAME: &str = "symbols-manifest";

impl SymbolProcessor for SymbolsManifest {
    fn name(&self) -> &str {
        NAME
    }

    fn process(&mut self, cx: &mut ProcessorContext<'_>) -> Result<Vec<NodeId>, ProcessorError> {
        if !cx.round.is_first() {
            return Ok(Vec::new());
        }

        let session = cx.resolver.session();
        let mut lines = Vec::new();
        for &file in cx.resolver.all_files() {
            let SymbolKind::File { path, .. } = &session.node(file).kind else {
                continue;
            };
            lines.push(format!("file {}", path.display()));
            collect_defined_symbols(session, file, |name, scope| {
                lines.push(format!("  {scope}:{name}"));
            });
        }

        let deps = Dependencies::all_sources();
        let mut output = cx.generator.create_file(&deps, "", "symbols-manifest", "txt")?;
        for line in lines {
            writeln!(output, "{line}")?;
        }
        Ok(Vec::new())
    }
}

/// Looks up a built-in processor by registry name.
pub fn built_in(name: &str) -> Option<Box<dyn SymbolProcessor>> {
    match name {
        NAME => Some(Box::new(SymbolsManifest)),
        _ => None,
    }
}
