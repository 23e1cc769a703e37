//! Syntax module for the TypeScript subset handled by the expander
//!
//! This module provides the syntax tree, the pest-based parser, the printer that renders trees
//! back to source text, the folding traversal used by the macro walker, and small node builders.

use serde::{Deserialize, Serialize};

pub mod ast;
pub mod build;
pub mod fold;
pub mod parser;
pub mod printer;

pub use ast::*;
pub use parser::parse_module;
pub use printer::print_module;

/// Represents a span in the source code, as byte offsets into the file text.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Span carried by synthesized nodes that have no source text.
    pub const DUMMY: Span = Span {
        start: usize::MAX,
        end: usize::MAX,
    };

    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn is_dummy(&self) -> bool {
        *self == Self::DUMMY
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        if self.is_dummy() {
            return other;
        }
        if other.is_dummy() {
            return self;
        }
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// The text this span covers in `source`, if it is a real span inside it.
    pub fn slice(self, source: &str) -> Option<&str> {
        if self.is_dummy() {
            return None;
        }
        source.get(self.start..self.end)
    }
}

impl From<pest::Span<'_>> for Span {
    fn from(span: pest::Span<'_>) -> Self {
        Span {
            start: span.start(),
            end: span.end(),
        }
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        if span.is_dummy() {
            return (0, 0).into();
        }
        (span.start, span.end.saturating_sub(span.start)).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_ignores_dummy_spans() {
        let a = Span::new(3, 7);
        assert_eq!(a.to(Span::DUMMY), a);
        assert_eq!(Span::DUMMY.to(a), a);
        assert_eq!(a.to(Span::new(1, 4)), Span::new(1, 7));
    }

    #[test]
    fn slice_reads_source_text() {
        let text = "let x = 1;";
        assert_eq!(Span::new(4, 5).slice(text), Some("x"));
        assert_eq!(Span::DUMMY.slice(text), None);
    }
}
