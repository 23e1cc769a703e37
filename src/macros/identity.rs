//! Identity of the macro declarations module.
//!
//! A file is the macro module when it is the entry of the registered macro package, or, for
//! vendored copies of the declarations, when its text is byte-identical to the shipped
//! declarations. Text equality is decided on SHA-256 digests.

use once_cell::sync::Lazy;
use sha2::{Digest, Sha256};

use crate::program::checker::Signature;
use crate::program::{FileId, Program};
use crate::syntax::ImportDecl;

/// Package name the macro declarations are published under.
pub const MACRO_PACKAGE: &str = "debug-transform";

/// The shipped macro declarations.
pub const MACRO_DECLARATIONS: &str = include_str!("../../declarations/index.d.ts");

static REFERENCE_DIGEST: Lazy<[u8; 32]> =
    Lazy::new(|| Sha256::digest(MACRO_DECLARATIONS.as_bytes()).into());

pub struct MacroModuleIdentity<'p> {
    program: &'p Program,
    package: String,
}

impl<'p> MacroModuleIdentity<'p> {
    pub fn new(program: &'p Program) -> Self {
        Self::with_package(program, MACRO_PACKAGE)
    }

    pub fn with_package(program: &'p Program, package: impl Into<String>) -> Self {
        Self {
            program,
            package: package.into(),
        }
    }

    pub fn is_macro_module(&self, file: FileId) -> bool {
        let file = self.program.file(file);
        file.package() == Some(self.package.as_str()) || file.digest() == &*REFERENCE_DIGEST
    }

    /// Whether a resolved signature is declared in the macro module.
    pub fn is_macro_declaration(&self, signature: &Signature) -> bool {
        self.is_macro_module(signature.file)
    }

    /// Whether `import`, written in `file`, has a clause and resolves to the macro module.
    pub fn is_macro_import(&self, file: FileId, import: &ImportDecl) -> bool {
        if import.clause.is_none() {
            return false;
        }
        self.program
            .checker()
            .module_of_import(file, &import.source.value)
            .map_or(false, |target| self.is_macro_module(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Stmt;

    fn imports(program: &Program, path: &str) -> Vec<(FileId, ImportDecl)> {
        let id = program.file_by_path(path).expect("file");
        program
            .file(id)
            .module()
            .body
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Import(import) => Some((id, import.clone())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_package_entry_is_macro_module() {
        let program = Program::builder().macro_package().build().expect("program");
        let identity = MacroModuleIdentity::new(&program);
        let entry = program.package_entry(MACRO_PACKAGE).expect("entry");
        assert!(identity.is_macro_module(entry));
    }

    #[test]
    fn test_vendored_copy_matches_by_text() {
        let program = Program::builder()
            .file("vendor/debug.d.ts", MACRO_DECLARATIONS)
            .file("vendor/other.d.ts", format!("{MACRO_DECLARATIONS}\n"))
            .build()
            .expect("program");
        let identity = MacroModuleIdentity::new(&program);
        assert!(identity.is_macro_module(program.file_by_path("vendor/debug.d.ts").expect("copy")));
        assert!(!identity.is_macro_module(program.file_by_path("vendor/other.d.ts").expect("edit")));
    }

    #[test]
    fn test_macro_imports() {
        let program = Program::builder()
            .macro_package()
            .file("lib.ts", "export const x = 1;\n")
            .file(
                "main.ts",
                concat!(
                    "import { $print } from \"debug-transform\";\n",
                    "import {} from \"debug-transform\";\n",
                    "import \"debug-transform\";\n",
                    "import { x } from \"./lib\";\n",
                    "import { y } from \"missing\";\n",
                ),
            )
            .build()
            .expect("program");
        let identity = MacroModuleIdentity::new(&program);
        let found: Vec<bool> = imports(&program, "main.ts")
            .iter()
            .map(|(file, import)| identity.is_macro_import(*file, import))
            .collect();
        assert_eq!(found, vec![true, true, false, false, false]);
    }
}
