//! # Expansion Test Harness
//!
//! Builds small programs in memory (with the embedded macro package registered), runs the
//! transformer with fixed VCS metadata and a fixed working directory, and hands back the printed
//! output together with everything the run reported.

#![allow(dead_code)]

use std::collections::HashMap;

use debug_transform::diagnostics::BufferSink;
use debug_transform::{
    GitMetadata, Program, StaticVcs, TransformConfig, TransformError, TransformedFile, Transformer,
};

/// Working directory every harness run uses; label paths are relative to it.
pub const CWD: &str = "/project";

/// Path of the single file [`expand`] and friends transform.
pub const MAIN: &str = "/project/src/main.ts";

pub const IMPORT_ALL: &str =
    "import { $dbg, $print, $warn, $error, $commitId, $git, $nameof } from \"debug-transform\";\n";

pub fn metadata() -> GitMetadata {
    GitMetadata {
        branch: "main".to_string(),
        commit: "1a2b3c4".to_string(),
        commit_hash: "1a2b3c4d5e6f7081928374655647382910abcdef".to_string(),
        author: "Release Bot".to_string(),
        timestamp: 1_700_000_000,
        iso_date: "2023-11-14T22:13:20+00:00".to_string(),
    }
}

pub fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// The result of one harness run.
pub struct Run {
    pub files: Vec<TransformedFile>,
    pub sink: BufferSink,
}

impl Run {
    /// Printed output of the file at `path`.
    pub fn output(&self, path: &str) -> String {
        self.files
            .iter()
            .find(|f| f.path.to_string_lossy() == path)
            .map(TransformedFile::print)
            .unwrap_or_else(|| panic!("no output for {path}"))
    }

    pub fn main(&self) -> String {
        self.output(MAIN)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.sink.warnings().iter().map(|r| r.render()).collect()
    }
}

/// Builds a program from `(path, text)` pairs plus the macro package.
pub fn program(files: &[(&str, &str)]) -> Result<Program, TransformError> {
    files
        .iter()
        .fold(Program::builder().macro_package(), |builder, (path, text)| {
            builder.file(path, *text)
        })
        .build()
}

/// Transforms `files` with `config`, resolved against `environment`.
pub fn run_program(
    files: &[(&str, &str)],
    config: TransformConfig,
    environment: &HashMap<String, String>,
) -> Result<Run, TransformError> {
    let program = program(files)?;
    let vcs = StaticVcs::new(metadata());
    let transformer = Transformer::with_env(&program, &config, environment, &vcs).with_cwd(CWD);
    let mut sink = BufferSink::new();
    let files = transformer.run(&mut sink)?;
    Ok(Run { files, sink })
}

pub fn run_with(source: &str, config: TransformConfig) -> Result<Run, TransformError> {
    run_program(&[(MAIN, source)], config, &env(&[]))
}

/// Expands `source` with the default configuration and returns the printed main file.
pub fn expand(source: &str) -> String {
    run_with(source, TransformConfig::default())
        .unwrap_or_else(|e| panic!("expansion failed: {e:?}"))
        .main()
}

/// Expands `source` with macros disabled.
pub fn expand_disabled(source: &str) -> String {
    let config = TransformConfig {
        enabled: false,
        ..TransformConfig::default()
    };
    run_with(source, config)
        .unwrap_or_else(|e| panic!("expansion failed: {e:?}"))
        .main()
}

/// Source text with all macros imported.
pub fn with_imports(body: &str) -> String {
    format!("{IMPORT_ALL}{body}")
}

/// The printed import line every enabled expansion of [`with_imports`] begins with.
pub fn type_import() -> String {
    IMPORT_ALL.replacen("import {", "import type {", 1)
}
