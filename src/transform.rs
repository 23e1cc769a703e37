//! One transform run over a program.
//!
//! A [`Transformer`] resolves the configuration once, then expands every non-declaration file of
//! the program in path order. The first fatal error ends the run.

use std::path::{Path, PathBuf};

use crate::config::{Environment, ProcessEnv, ResolvedConfig, TransformConfig};
use crate::diagnostics::{DiagnosticSink, Severity, TransformError};
use crate::macros::walker::expand_file;
use crate::program::{FileId, Program};
use crate::syntax::{print_module, Module};
use crate::vcs::VcsProvider;

/// The output for one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedFile {
    pub id: FileId,
    pub path: PathBuf,
    pub module: Module,
    /// Whether anything in the file was rewritten.
    pub changed: bool,
    original: String,
}

impl TransformedFile {
    /// TypeScript text of the file. Unchanged files are returned exactly as they were read.
    pub fn print(&self) -> String {
        if self.changed {
            print_module(&self.module)
        } else {
            self.original.clone()
        }
    }
}

pub struct Transformer<'a> {
    program: &'a Program,
    config: ResolvedConfig,
    vcs: &'a dyn VcsProvider,
    cwd: Option<PathBuf>,
}

impl<'a> Transformer<'a> {
    /// Resolves `config` against the process environment.
    pub fn new(program: &'a Program, config: &TransformConfig, vcs: &'a dyn VcsProvider) -> Self {
        Self::with_env(program, config, &ProcessEnv, vcs)
    }

    pub fn with_env<E: Environment + ?Sized>(
        program: &'a Program,
        config: &TransformConfig,
        env: &E,
        vcs: &'a dyn VcsProvider,
    ) -> Self {
        Self {
            program,
            config: config.resolve(env),
            vcs,
            cwd: std::env::current_dir().ok(),
        }
    }

    /// Directory label paths are made relative to. Defaults to the process working directory.
    pub fn with_cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Expands one file. Declaration files are never transformed and yield `None`.
    pub fn transform_file(
        &self,
        file: FileId,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<Option<TransformedFile>, TransformError> {
        let source = self.program.file(file);
        if source.is_declaration() {
            return Ok(None);
        }
        let expansion = expand_file(
            self.program,
            file,
            &self.config,
            self.vcs,
            sink,
            self.cwd.as_deref(),
        )?;
        let transformed = TransformedFile {
            id: file,
            path: source.path().to_path_buf(),
            module: expansion.module,
            changed: expansion.changed,
            original: source.text().to_string(),
        };
        if self.config.verbose() && transformed.changed {
            let path = source.path().to_string_lossy();
            sink.diff(&path, source.text(), &transformed.print());
        }
        Ok(Some(transformed))
    }

    /// Expands every source file in path order.
    pub fn run(&self, sink: &mut dyn DiagnosticSink) -> Result<Vec<TransformedFile>, TransformError> {
        if self.config.verbose() {
            sink.emit(
                Severity::Info,
                &format!("Macros enabled: {}", self.config.enabled()),
                None,
            );
            if let Some(name) = self.config.disabled_by() {
                sink.emit(
                    Severity::Info,
                    &format!("Environment requirement on `{name}` is not met"),
                    None,
                );
            }
        }
        let mut out = Vec::new();
        for file in self.program.files() {
            if let Some(transformed) = self.transform_file(file.id(), sink)? {
                out.push(transformed);
            }
        }
        Ok(out)
    }
}
