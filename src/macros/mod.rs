//! Recognition and expansion of the built-in macros.
//!
//! ## Module Structure
//!
//! - **`identity`**: which file is the macro declarations module, and which imports point at it
//! - **`label`**: `[path:line]` labels written into generated debug output
//! - **`rules`**: one rewrite rule per macro
//! - **`walker`**: the per-file fold that rewrites imports and dispatches calls to the rules

use std::fmt;
use std::str::FromStr;

use crate::diagnostics::TransformError;
use crate::err_msg;

pub mod identity;
pub mod label;
pub mod rules;
pub mod walker;

pub use identity::{MacroModuleIdentity, MACRO_DECLARATIONS, MACRO_PACKAGE};
pub use label::LabelBuilder;
pub use rules::{FreshNames, Rewrite, RuleContext};
pub use walker::{expand_file, Expansion};

/// The functions declared by the macro module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MacroKind {
    Dbg,
    Print,
    Warn,
    Error,
    CommitId,
    Git,
    NameOf,
}

impl MacroKind {
    pub const ALL: [MacroKind; 7] = [
        MacroKind::Dbg,
        MacroKind::Print,
        MacroKind::Warn,
        MacroKind::Error,
        MacroKind::CommitId,
        MacroKind::Git,
        MacroKind::NameOf,
    ];

    /// The declared function name.
    pub fn name(self) -> &'static str {
        match self {
            MacroKind::Dbg => "$dbg",
            MacroKind::Print => "$print",
            MacroKind::Warn => "$warn",
            MacroKind::Error => "$error",
            MacroKind::CommitId => "$commitId",
            MacroKind::Git => "$git",
            MacroKind::NameOf => "$nameof",
        }
    }

    /// Whether `enabled = false` changes the expansion.
    pub fn is_gated(self) -> bool {
        !matches!(self, MacroKind::CommitId | MacroKind::Git | MacroKind::NameOf)
    }
}

impl fmt::Display for MacroKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MacroKind {
    type Err = TransformError;

    /// Fails with [`TransformError::Incompatible`] for names this version does not know.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        MacroKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| {
                err_msg!(
                    Incompatible,
                    "function `{}` cannot be handled by this version of debug-transform",
                    name
                )
            })
    }
}
