//! The set of source files one run operates on.
//!
//! A [`Program`] owns every parsed file (sources, declaration files and registered packages),
//! resolves module specifiers between them, and carries the [`Checker`] built over all of them.
//! It is immutable once built.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::diagnostics::{to_error_source, SourceArc, TransformError};
use crate::err_msg;
use crate::macros::identity::{MACRO_DECLARATIONS, MACRO_PACKAGE};
use crate::syntax::{parse_module, Module, Span};

pub mod checker;

pub use checker::Checker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Source,
    /// `.d.ts` files: type information only, never transformed or emitted.
    Declaration,
}

impl FileKind {
    fn from_path(path: &Path) -> Self {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if name.ends_with(".d.ts") {
            FileKind::Declaration
        } else {
            FileKind::Source
        }
    }
}

/// One parsed file.
#[derive(Debug)]
pub struct SourceFile {
    id: FileId,
    path: PathBuf,
    text: Arc<str>,
    module: Module,
    line_starts: Vec<usize>,
    package: Option<String>,
    kind: FileKind,
    digest: OnceCell<[u8; 32]>,
}

impl SourceFile {
    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    /// Name of the package this file is the entry point of, if it was registered as one.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_declaration(&self) -> bool {
        self.kind == FileKind::Declaration
    }

    /// Zero-based line of a byte offset.
    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next.saturating_sub(1),
        }
    }

    /// Source text covered by `span`, or `None` for synthesized spans.
    pub fn slice(&self, span: Span) -> Option<&str> {
        span.slice(&self.text)
    }

    /// SHA-256 of the full text, computed on first use.
    pub fn digest(&self) -> &[u8; 32] {
        self.digest.get_or_init(|| Sha256::digest(self.text.as_bytes()).into())
    }

    pub fn error_source(&self) -> SourceArc {
        to_error_source(self.path.to_string_lossy(), &self.text)
    }
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

// ============================================================================
// PROGRAM
// ============================================================================

#[derive(Debug)]
pub struct Program {
    files: Vec<SourceFile>,
    resolver: ModuleResolver,
    checker: Checker,
}

impl Program {
    pub fn builder() -> ProgramBuilder {
        ProgramBuilder::default()
    }

    pub fn file(&self, id: FileId) -> &SourceFile {
        &self.files[id.0]
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter()
    }

    pub fn file_by_path(&self, path: impl AsRef<Path>) -> Option<FileId> {
        self.resolver.by_path.get(&normalize(path.as_ref())).copied()
    }

    /// Entry file of a registered package.
    pub fn package_entry(&self, name: &str) -> Option<FileId> {
        self.resolver.packages.get(name).copied()
    }

    /// Resolves an import specifier written in `from` to a file of this program.
    pub fn resolve_module(&self, from: FileId, specifier: &str) -> Option<FileId> {
        self.resolver.resolve(&self.files, from, specifier)
    }

    pub fn checker(&self) -> &Checker {
        &self.checker
    }
}

#[derive(Debug, Default)]
struct ModuleResolver {
    by_path: HashMap<PathBuf, FileId>,
    packages: HashMap<String, FileId>,
}

impl ModuleResolver {
    fn resolve(&self, files: &[SourceFile], from: FileId, specifier: &str) -> Option<FileId> {
        if !(specifier.starts_with("./") || specifier.starts_with("../") || specifier == ".") {
            return self.packages.get(specifier).copied();
        }
        let base = files.get(from.0)?.path.parent().unwrap_or(Path::new(""));
        let target = normalize(&base.join(specifier));
        let target = target.to_string_lossy();
        let candidates = [
            target.to_string(),
            format!("{target}.ts"),
            format!("{target}.tsx"),
            format!("{target}.d.ts"),
            format!("{target}/index.ts"),
            format!("{target}/index.d.ts"),
        ];
        candidates
            .iter()
            .find_map(|candidate| self.by_path.get(Path::new(candidate)).copied())
    }
}

/// Lexically resolves `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

// ============================================================================
// BUILDER
// ============================================================================

struct PendingFile {
    path: PathBuf,
    text: String,
    package: Option<String>,
}

/// Collects file texts, then parses and binds them all in [`ProgramBuilder::build`].
#[derive(Default)]
pub struct ProgramBuilder {
    files: BTreeMap<PathBuf, PendingFile>,
}

impl ProgramBuilder {
    /// Adds a file from memory. A later file with the same path replaces the earlier one.
    pub fn file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        let path = normalize(path.as_ref());
        self.files.insert(
            path.clone(),
            PendingFile {
                path,
                text: text.into(),
                package: None,
            },
        );
        self
    }

    /// Adds the entry declaration file of a package importable by its bare `name`.
    pub fn package(
        mut self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
        text: impl Into<String>,
    ) -> Self {
        let path = normalize(path.as_ref());
        self.files.insert(
            path.clone(),
            PendingFile {
                path,
                text: text.into(),
                package: Some(name.into()),
            },
        );
        self
    }

    /// Registers the embedded macro declarations as the `debug-transform` package.
    pub fn macro_package(self) -> Self {
        let path = Path::new("node_modules").join(MACRO_PACKAGE).join("index.d.ts");
        self.package(MACRO_PACKAGE, path, MACRO_DECLARATIONS)
    }

    /// Adds every `.ts`/`.tsx` file under `root`, and the `index.d.ts` entry of each package in
    /// `root/node_modules`. Dot-directories, `node_modules` and `target` are not descended into.
    pub fn scan_dir(mut self, root: impl AsRef<Path>) -> Result<Self, TransformError> {
        let root = root.as_ref();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));
        for entry in walker {
            let entry = entry
                .map_err(|e| err_msg!(Io, "failed to walk {}: {}", root.display(), e))?;
            if !entry.file_type().is_file() || !is_script(entry.path()) {
                continue;
            }
            let text = read(entry.path())?;
            self = self.file(entry.path(), text);
        }
        self.scan_packages(&root.join("node_modules"))
    }

    fn scan_packages(mut self, node_modules: &Path) -> Result<Self, TransformError> {
        if !node_modules.is_dir() {
            return Ok(self);
        }
        for (name, dir) in package_dirs(node_modules)? {
            let entry = dir.join("index.d.ts");
            if entry.is_file() {
                let text = read(&entry)?;
                self = self.package(name, entry, text);
            }
        }
        Ok(self)
    }

    /// Parses every file and binds the whole program.
    pub fn build(self) -> Result<Program, TransformError> {
        let mut files = Vec::with_capacity(self.files.len());
        let mut resolver = ModuleResolver::default();
        for (index, pending) in self.files.into_values().enumerate() {
            let id = FileId(index);
            let module = parse_module(&pending.path.to_string_lossy(), &pending.text)?;
            resolver.by_path.insert(pending.path.clone(), id);
            if let Some(name) = &pending.package {
                resolver.packages.insert(name.clone(), id);
            }
            files.push(SourceFile {
                id,
                kind: FileKind::from_path(&pending.path),
                line_starts: line_starts(&pending.text),
                text: Arc::from(pending.text),
                path: pending.path,
                module,
                package: pending.package,
                digest: OnceCell::new(),
            });
        }
        let checker = Checker::build(&files, |from, specifier| {
            resolver.resolve(&files, from, specifier)
        });
        Ok(Program {
            files,
            resolver,
            checker,
        })
    }
}

fn is_skipped_dir(entry: &walkdir::DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || name == "node_modules" || name == "target"
}

fn is_script(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts") | Some("tsx")
    )
}

fn read(path: &Path) -> Result<String, TransformError> {
    fs::read_to_string(path).map_err(|e| {
        err_msg!(Io, "failed to read {}: {}", path.display(), e).with_cause(e)
    })
}

/// `(package name, directory)` for each package in `node_modules`, including `@scope/name`.
fn package_dirs(node_modules: &Path) -> Result<Vec<(String, PathBuf)>, TransformError> {
    let mut dirs = Vec::new();
    for entry in list_dirs(node_modules)? {
        let name = entry.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
        if name.starts_with('@') {
            for scoped in list_dirs(&entry)? {
                if let Some(inner) = scoped.file_name() {
                    dirs.push((format!("{name}/{}", inner.to_string_lossy()), scoped.clone()));
                }
            }
        } else if !name.starts_with('.') {
            dirs.push((name, entry));
        }
    }
    Ok(dirs)
}

fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>, TransformError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        err_msg!(Io, "failed to list {}: {}", dir.display(), e).with_cause(e)
    })?;
    let mut dirs = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program() -> Program {
        Program::builder()
            .macro_package()
            .file("src/main.ts", "import { helper } from \"./util\";\nhelper();\n")
            .file("src/util/index.ts", "export function helper() {}\n")
            .file("src/types.d.ts", "export declare const x: number;\n")
            .build()
            .expect("program should build")
    }

    #[test]
    fn test_resolves_relative_and_package_specifiers() {
        let program = program();
        let main = program.file_by_path("src/main.ts").expect("main");
        let util = program.file_by_path("src/util/index.ts").expect("util");
        assert_eq!(program.resolve_module(main, "./util"), Some(util));
        assert_eq!(program.resolve_module(main, "./util/index"), Some(util));
        assert_eq!(program.resolve_module(util, "../main"), Some(main));
        assert_eq!(
            program.resolve_module(main, MACRO_PACKAGE),
            program.package_entry(MACRO_PACKAGE)
        );
        assert_eq!(program.resolve_module(main, "./missing"), None);
        assert_eq!(program.resolve_module(main, "left-pad"), None);
    }

    #[test]
    fn test_file_kinds() {
        let program = program();
        let types = program.file_by_path("src/types.d.ts").expect("types");
        assert!(program.file(types).is_declaration());
        let main = program.file_by_path("./src/main.ts").expect("main");
        assert!(!program.file(main).is_declaration());
    }

    #[test]
    fn test_line_of_offsets() {
        let program = program();
        let main = program.file(program.file_by_path("src/main.ts").expect("main"));
        assert_eq!(main.line_of(0), 0);
        let second = main.text().find("helper();").expect("call");
        assert_eq!(main.line_of(second), 1);
    }

    #[test]
    fn test_digest_matches_text() {
        let program = program();
        let entry = program.file(program.package_entry(MACRO_PACKAGE).expect("package"));
        let expected: [u8; 32] = Sha256::digest(MACRO_DECLARATIONS.as_bytes()).into();
        assert_eq!(entry.digest(), &expected);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("a/./b/../c.ts")), PathBuf::from("a/c.ts"));
        assert_eq!(normalize(Path::new("../x")), PathBuf::from("../x"));
    }
}
