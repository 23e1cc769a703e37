pub use crate::config::{EnvRequirement, ResolvedConfig, TransformConfig};
pub use crate::diagnostics::{print_error, DiagnosticSink, ErrorContext, TransformError};
pub use crate::program::{Program, ProgramBuilder};
pub use crate::transform::{TransformedFile, Transformer};
pub use crate::vcs::{GitCli, GitMetadata, StaticVcs, VcsProvider};

pub mod config;
pub mod diagnostics;
pub mod macros;
pub mod program;
pub mod syntax;
pub mod transform;
pub mod vcs;
