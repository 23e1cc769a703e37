//! Error types and the diagnostics channel of the expander.
//!
//! # Overview
//!
//! Every failure a run can produce is a [`TransformError`]. Errors carry an [`ErrorContext`]
//! (source text, span, help) and render through `miette`. Construct them with the `err_msg!`
//! and `err_ctx!` macros rather than by hand:
//!
//! - `err_msg!(Config, "unknown key {}", key)` for message-only errors.
//! - `err_ctx!(Macro, message, &source, span)` for errors pointing into a source file.
//! - `err_ctx!(Macro, message, &source, span, help)` to attach a help line.
//!
//! Non-fatal output (verbose logging, warnings) goes through a [`DiagnosticSink`]. The console
//! sink prints colored lines of the form `[debug-transform] macro warning src/a.ts:3 - message`;
//! the buffer sink records them for tests.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

use difference::{Changeset, Difference};
use miette::{Diagnostic, LabeledSpan, NamedSource, Report, SourceCode};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use thiserror::Error;

use crate::syntax::Span;

pub type SourceArc = Arc<NamedSource<String>>;

// ============================================================================
// CONSTRUCTION MACROS
// ============================================================================

/// Constructs a TransformError variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $($fmt:tt)+) => {
        $crate::diagnostics::TransformError::$variant {
            message: format!($($fmt)+),
            ctx: $crate::diagnostics::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a TransformError variant pointing at `span` inside `src`, with an optional help line.
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $msg:expr, $src:expr, $span:expr, $help:expr) => {
        $crate::diagnostics::TransformError::$variant {
            message: $msg.to_string(),
            ctx: $crate::diagnostics::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: Some(format!("{}", $help)),
            },
            source: None,
        }
    };
    ($variant:ident, $msg:expr, $src:expr, $span:expr) => {
        $crate::diagnostics::TransformError::$variant {
            message: $msg.to_string(),
            ctx: $crate::diagnostics::ErrorContext {
                source: Some($crate::diagnostics::SourceArc::clone($src)),
                span: Some($span),
                help: None,
            },
            source: None,
        }
    };
}

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Source, span and help attached to an error.
#[derive(Debug, Default)]
pub struct ErrorContext {
    pub source: Option<SourceArc>,
    pub span: Option<Span>,
    pub help: Option<String>,
}

impl ErrorContext {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

/// Unified error type for all failure modes of a transform run.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Resolution error: {message}")]
    Resolution {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Macro error: {message}")]
    Macro {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    /// The macro declarations and this expander are out of sync. Aborts the whole run.
    #[error("Incompatible macro declarations: {message}")]
    Incompatible {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    /// Every call-site error found while walking one file.
    #[error("{} macro error(s) in {path}", errors.len())]
    CallSites {
        path: String,
        errors: Vec<TransformError>,
    },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("VCS error: {message}")]
    Vcs {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("I/O error: {message}")]
    Io {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

/// Variant-only classification, used by callers and tests to match on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Parse,
    Resolution,
    Macro,
    Incompatible,
    CallSites,
    Config,
    Vcs,
    Io,
}

impl TransformError {
    fn ctx(&self) -> Option<&ErrorContext> {
        match self {
            TransformError::Parse { ctx, .. }
            | TransformError::Resolution { ctx, .. }
            | TransformError::Macro { ctx, .. }
            | TransformError::Incompatible { ctx, .. }
            | TransformError::Config { ctx, .. }
            | TransformError::Vcs { ctx, .. }
            | TransformError::Io { ctx, .. } => Some(ctx),
            TransformError::CallSites { .. } => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::Parse { .. } => ErrorKind::Parse,
            TransformError::Resolution { .. } => ErrorKind::Resolution,
            TransformError::Macro { .. } => ErrorKind::Macro,
            TransformError::Incompatible { .. } => ErrorKind::Incompatible,
            TransformError::CallSites { .. } => ErrorKind::CallSites,
            TransformError::Config { .. } => ErrorKind::Config,
            TransformError::Vcs { .. } => ErrorKind::Vcs,
            TransformError::Io { .. } => ErrorKind::Io,
        }
    }

    /// The bare message without the variant prefix.
    pub fn message(&self) -> String {
        match self {
            TransformError::Parse { message, .. }
            | TransformError::Resolution { message, .. }
            | TransformError::Macro { message, .. }
            | TransformError::Incompatible { message, .. }
            | TransformError::Config { message, .. }
            | TransformError::Vcs { message, .. }
            | TransformError::Io { message, .. } => message.clone(),
            TransformError::CallSites { .. } => self.to_string(),
        }
    }

    /// The primary span, if the error points into a source file.
    pub fn span(&self) -> Option<Span> {
        self.ctx().and_then(|ctx| ctx.span)
    }

    /// Attaches a help line, replacing any existing one.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        match &mut self {
            TransformError::Parse { ctx, .. }
            | TransformError::Resolution { ctx, .. }
            | TransformError::Macro { ctx, .. }
            | TransformError::Incompatible { ctx, .. }
            | TransformError::Config { ctx, .. }
            | TransformError::Vcs { ctx, .. }
            | TransformError::Io { ctx, .. } => ctx.help = Some(help.into()),
            TransformError::CallSites { .. } => {}
        }
        self
    }

    /// Attaches an underlying cause.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        match &mut self {
            TransformError::Parse { source, .. }
            | TransformError::Resolution { source, .. }
            | TransformError::Macro { source, .. }
            | TransformError::Incompatible { source, .. }
            | TransformError::Config { source, .. }
            | TransformError::Vcs { source, .. }
            | TransformError::Io { source, .. } => *source = Some(Box::new(cause)),
            TransformError::CallSites { .. } => {}
        }
        self
    }
}

impl From<std::io::Error> for TransformError {
    fn from(err: std::io::Error) -> Self {
        err_msg!(Io, "{}", err).with_cause(err)
    }
}

impl Diagnostic for TransformError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.kind() {
            ErrorKind::Parse => "debug_transform::parse",
            ErrorKind::Resolution => "debug_transform::resolution",
            ErrorKind::Macro => "debug_transform::macro",
            ErrorKind::Incompatible => "debug_transform::incompatible",
            ErrorKind::CallSites => "debug_transform::call_sites",
            ErrorKind::Config => "debug_transform::config",
            ErrorKind::Vcs => "debug_transform::vcs",
            ErrorKind::Io => "debug_transform::io",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.ctx()?
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.ctx()?
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.ctx()?.span?;
        if span.is_dummy() {
            return None;
        }
        let len = if span.end > span.start {
            span.end - span.start
        } else {
            1
        };
        let label = LabeledSpan::new(Some(self.message()), span.start, len);
        Some(Box::new(std::iter::once(label)))
    }

    fn related<'a>(&'a self) -> Option<Box<dyn Iterator<Item = &'a dyn Diagnostic> + 'a>> {
        match self {
            TransformError::CallSites { errors, .. } => Some(Box::new(
                errors.iter().map(|e| e as &dyn Diagnostic),
            )),
            _ => None,
        }
    }
}

/// Converts a file's text into a shared `NamedSource` for error contexts.
pub fn to_error_source(name: impl AsRef<str>, text: impl AsRef<str>) -> SourceArc {
    Arc::new(NamedSource::new(name.as_ref(), text.as_ref().to_string()))
}

/// Renders an error with all its labels and related call-site errors to stderr.
pub fn print_error(err: TransformError) {
    eprintln!("{:?}", Report::new(err));
}

// ============================================================================
// DIAGNOSTIC SINKS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file position shown to users. `line` is one-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}

/// Receives informational and warning output of a run.
pub trait DiagnosticSink {
    fn emit(&mut self, severity: Severity, message: &str, location: Option<&Location>);

    /// Reports how a file changed. The default renders a plain `+`/`-` line diff as one message.
    fn diff(&mut self, path: &str, before: &str, after: &str) {
        let changeset = Changeset::new(before, after, "\n");
        let mut text = format!("{path}:");
        for diff in &changeset.diffs {
            let (marker, chunk) = diff_lines(diff);
            for line in chunk.lines() {
                text.push('\n');
                text.push(marker);
                text.push_str(line);
            }
        }
        self.emit(Severity::Info, &text, None);
    }
}

fn diff_lines(diff: &Difference) -> (char, &str) {
    match diff {
        Difference::Same(x) => (' ', x.as_str()),
        Difference::Add(x) => ('+', x.as_str()),
        Difference::Rem(x) => ('-', x.as_str()),
    }
}

/// Formats a diagnostic line without colors.
pub fn format_diagnostic(severity: Severity, message: &str, location: Option<&Location>) -> String {
    match location {
        Some(location) => format!("[debug-transform] macro {severity} {location} - {message}"),
        None => format!("[debug-transform] macro {severity} - {message}"),
    }
}

/// Writes colored diagnostics to stderr.
pub struct ConsoleSink {
    choice: ColorChoice,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            choice: ColorChoice::Auto,
        }
    }

    pub fn with_color_choice(choice: ColorChoice) -> Self {
        Self { choice }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticSink for ConsoleSink {
    fn emit(&mut self, severity: Severity, message: &str, location: Option<&Location>) {
        let mut stderr = StandardStream::stderr(self.choice);
        let color = match severity {
            Severity::Info => Color::Cyan,
            Severity::Warning => Color::Yellow,
            Severity::Error => Color::Red,
        };
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true));
        let _ = write!(stderr, "[debug-transform]");
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(stderr, " macro {severity}");
        let _ = stderr.reset();
        match location {
            Some(location) => {
                let _ = writeln!(stderr, " {location} - {message}");
            }
            None => {
                let _ = writeln!(stderr, " - {message}");
            }
        }
    }

    fn diff(&mut self, path: &str, before: &str, after: &str) {
        let mut stderr = StandardStream::stderr(self.choice);
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = writeln!(stderr, "--- {path} ---");
        let changeset = Changeset::new(before, after, "\n");
        for diff in &changeset.diffs {
            let (marker, chunk) = diff_lines(diff);
            let mut spec = ColorSpec::new();
            match marker {
                '+' => spec.set_fg(Some(Color::Green)),
                '-' => spec.set_fg(Some(Color::Red)),
                _ => &mut spec,
            };
            let _ = stderr.set_color(&spec);
            for line in chunk.lines() {
                let _ = writeln!(stderr, "{marker}{line}");
            }
        }
        let _ = stderr.reset();
    }
}

/// One diagnostic captured by a [`BufferSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub severity: Severity,
    pub message: String,
    pub location: Option<Location>,
}

impl Record {
    pub fn render(&self) -> String {
        format_diagnostic(self.severity, &self.message, self.location.as_ref())
    }
}

/// Collects diagnostics in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    records: Rc<RefCell<Vec<Record>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.borrow().clone()
    }

    pub fn warnings(&self) -> Vec<Record> {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl DiagnosticSink for BufferSink {
    fn emit(&mut self, severity: Severity, message: &str, location: Option<&Location>) {
        self.records.borrow_mut().push(Record {
            severity,
            message: message.to_string(),
            location: location.cloned(),
        });
    }
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    #[test]
    fn test_context_renders_label_and_help() {
        let src = to_error_source("src/main.ts", "$dbg();");
        let err = err_ctx!(
            Macro,
            "`$dbg` expects 1 or 2 arguments, found 0",
            &src,
            Span::new(0, 6),
            "pass the expression to debug"
        );
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("expects 1 or 2 arguments"));
        assert!(output.contains("pass the expression to debug"));
    }

    #[test]
    fn test_call_sites_render_every_error() {
        let src = to_error_source("a.ts", "$nameof(1); $git(2);");
        let err = TransformError::CallSites {
            path: "a.ts".to_string(),
            errors: vec![
                err_ctx!(Macro, "first problem", &src, Span::new(0, 10)),
                err_ctx!(Macro, "second problem", &src, Span::new(12, 19)),
            ],
        };
        assert_eq!(err.to_string(), "2 macro error(s) in a.ts");
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("first problem"));
        assert!(output.contains("second problem"));
    }

    #[test]
    fn test_kind_and_message() {
        let err = err_msg!(Config, "unknown key `{}`", "enable");
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.message(), "unknown key `enable`");
        assert_eq!(err.to_string(), "Configuration error: unknown key `enable`");
        assert!(err.span().is_none());
    }

    #[test]
    fn test_cause_is_the_error_source() {
        use std::error::Error as _;

        let plain = err_msg!(Vcs, "git failed");
        assert!(plain.source().is_none());

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "git not found");
        let err = err_msg!(Vcs, "git failed").with_cause(io);
        let cause = err.source().expect("cause");
        assert_eq!(cause.to_string(), "git not found");
    }

    #[test]
    fn test_buffer_sink_shares_records() {
        let sink = BufferSink::new();
        let mut handle = sink.clone();
        let location = Location {
            path: "src/a.ts".to_string(),
            line: 3,
        };
        handle.emit(Severity::Warning, "stripped", Some(&location));
        handle.emit(Severity::Info, "Macros enabled: true", None);
        assert_eq!(sink.records().len(), 2);
        assert_eq!(sink.warnings().len(), 1);
        assert_eq!(
            sink.records()[0].render(),
            "[debug-transform] macro warning src/a.ts:3 - stripped"
        );
        assert_eq!(
            sink.records()[1].render(),
            "[debug-transform] macro info - Macros enabled: true"
        );
    }

    #[test]
    fn test_default_diff_marks_changed_lines() {
        let mut sink = BufferSink::new();
        sink.diff("a.ts", "a;\nb;\n", "a;\nc;\n");
        let text = &sink.records()[0].message;
        assert!(text.contains("-b;"));
        assert!(text.contains("+c;"));
        assert!(text.contains(" a;"));
    }
}
