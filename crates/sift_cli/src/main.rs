//! sift — standalone driver for the incremental symbol-processing engine.
//!
//! Scans the given source roots, runs the registered processors to a
//! fixpoint, and persists the lookup maps that make the next build
//! incremental. Exit codes: 0 on success, 1 when processing fails
//! (processor errors or error diagnostics), 2 for internal failures.

#![warn(missing_docs)]

mod frontend;
mod manifest;
mod options_file;

use clap::Parser;
use sift_diagnostics::{Diagnostic, DiagnosticSink, Severity};
use sift_engine::{Engine, EngineOptions, SymbolProcessor};
use std::path::PathBuf;
use std::process;

use frontend::FsFrontend;
use options_file::OptionsFile;

/// sift — incremental annotation and symbol processing.
#[derive(Parser, Debug)]
#[command(name = "sift", version, about = "Incremental symbol processing")]
pub struct Cli {
    /// Name of the module being processed.
    #[arg(long)]
    pub module_name: String,

    /// Directory to scan for source files. Repeatable.
    #[arg(long = "source-root", required = true)]
    pub source_roots: Vec<PathBuf>,

    /// Classpath entry, recorded for processors. Repeatable.
    #[arg(long = "classpath")]
    pub classpath: Vec<PathBuf>,

    /// Base directory for outputs; per-kind roots default to
    /// `classes`, `java`, `kotlin`, and `resources` beneath it.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Output root for compiled classes.
    #[arg(long)]
    pub class_output_dir: Option<PathBuf>,

    /// Output root for generated Java sources.
    #[arg(long)]
    pub java_output_dir: Option<PathBuf>,

    /// Output root for generated Kotlin sources.
    #[arg(long)]
    pub kotlin_output_dir: Option<PathBuf>,

    /// Output root for resources.
    #[arg(long)]
    pub resource_output_dir: Option<PathBuf>,

    /// Directory holding the incremental caches.
    #[arg(long)]
    pub caches_dir: PathBuf,

    /// Processor to run, by registry name. Repeatable.
    #[arg(long = "processor")]
    pub processors: Vec<String>,

    /// Processor option as `key=value`. Repeatable.
    #[arg(long = "option")]
    pub options: Vec<String>,

    /// TOML file contributing processors and options.
    #[arg(long)]
    pub options_file: Option<PathBuf>,

    /// Enable incremental processing.
    #[arg(long)]
    pub incremental: bool,

    /// Write per-build reports under `<caches>/logs/`.
    #[arg(long)]
    pub incremental_log: bool,

    /// Treat warning diagnostics as errors.
    #[arg(long)]
    pub warnings_as_errors: bool,

    /// Maximum number of processing rounds.
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Source file changed or added since the last build. Repeatable.
    #[arg(long = "changed")]
    pub changed: Vec<PathBuf>,

    /// Source file removed since the last build. Repeatable.
    #[arg(long = "removed")]
    pub removed: Vec<PathBuf>,

    /// Suppress all output except diagnostics and errors.
    #[arg(short, long)]
    pub quiet: bool,
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let file_options = match &cli.options_file {
        Some(path) => OptionsFile::load(path)?,
        None => OptionsFile::default(),
    };

    let mut builder = EngineOptions::builder()
        .module_name(&cli.module_name)
        .caches_dir(&cli.caches_dir)
        .incremental(cli.incremental)
        .incremental_log(cli.incremental_log)
        .all_warnings_as_errors(cli.warnings_as_errors);
    for root in &cli.source_roots {
        builder = builder.source_root(root);
    }
    for entry in &cli.classpath {
        builder = builder.classpath_entry(entry);
    }
    if let Some(base) = &cli.output_dir {
        builder = builder.output_base(base);
    }
    if let Some(dir) = &cli.class_output_dir {
        builder = builder.class_output_dir(dir);
    }
    if let Some(dir) = &cli.java_output_dir {
        builder = builder.java_output_dir(dir);
    }
    if let Some(dir) = &cli.kotlin_output_dir {
        builder = builder.kotlin_output_dir(dir);
    }
    if let Some(dir) = &cli.resource_output_dir {
        builder = builder.resource_output_dir(dir);
    }
    if let Some(cap) = cli.max_rounds {
        builder = builder.max_rounds(cap);
    }
    for (key, value) in file_options.options {
        builder = builder.processor_option(key, value);
    }
    for option in &cli.options {
        let (key, value) = option
            .split_once('=')
            .ok_or_else(|| format!("malformed --option '{option}', expected key=value"))?;
        builder = builder.processor_option(key, value);
    }
    for file in &cli.changed {
        builder = builder.modified_source(file);
    }
    for file in &cli.removed {
        builder = builder.removed_source(file);
    }
    let options = builder.build()?;

    let mut names: Vec<String> = file_options.processors;
    names.extend(cli.processors.iter().cloned());
    if names.is_empty() {
        names.push(manifest::NAME.to_string());
    }
    let mut processors: Vec<Box<dyn SymbolProcessor>> = Vec::with_capacity(names.len());
    for name in &names {
        let processor =
            manifest::built_in(name).ok_or_else(|| format!("unknown processor '{name}'"))?;
        processors.push(processor);
    }

    let sink = if cli.warnings_as_errors {
        DiagnosticSink::with_warnings_as_errors()
    } else {
        DiagnosticSink::new()
    };

    let mut engine = Engine::new(options, Box::new(FsFrontend));
    for processor in processors {
        engine.register(processor);
    }

    let result = engine.run(&sink);
    render_diagnostics(&sink.take_all());
    match result {
        Ok(summary) => {
            if !cli.quiet {
                eprintln!(
                    "sift: {} round(s), {} file(s) reprocessed, {} output(s)",
                    summary.rounds,
                    summary.dirty_files.len(),
                    summary.generated_files.len()
                );
            }
            Ok(0)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(e.exit_code())
        }
    }
}


fn render_diagnostics(diagnostics: &[Diagnostic]) {
    for diag in diagnostics {
        let severity = match diag.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Logging => "log",
        };
        let mut line = format!("{severity}: {}", diag.message);
        if let Some(processor) = &diag.processor {
            line.push_str(&format!(" [{processor}]"));
        }
        if let Some(file) = &diag.file {
            line.push_str(&format!(" ({})", file.display()));
        }
        eprintln!("{line}");
    }
}
