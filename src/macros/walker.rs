//! The per-file expansion pass.
//!
//! [`expand_file`] folds one module pre-order. Imports of the macro module are made type-only
//! (or replaced by `export {};` when they bind nothing). Each call is resolved through the
//! checker; calls that resolve to a macro declaration are handed to the rules, and the walk then
//! continues inside whatever the rule produced, so nested macros are expanded too.

use std::path::Path;

use crate::config::ResolvedConfig;
use crate::diagnostics::{DiagnosticSink, Severity, TransformError};
use crate::err_ctx;
use crate::macros::identity::MacroModuleIdentity;
use crate::macros::label::LabelBuilder;
use crate::macros::rules::{self, FreshNames, Rewrite, RuleContext};
use crate::macros::MacroKind;
use crate::program::checker::SignatureDeclaration;
use crate::program::{FileId, Program};
use crate::syntax::ast::*;
use crate::syntax::build;
use crate::syntax::fold::{walk_expr, walk_module, walk_stmt, ExprContext, Fold};
use crate::vcs::VcsProvider;

/// The expanded module of one file.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub module: Module,
    /// Whether any import or call was rewritten.
    pub changed: bool,
    /// Number of macro calls expanded.
    pub handled: usize,
}

/// Expands every macro call in `file`.
///
/// Call-site errors are collected and reported together as [`TransformError::CallSites`] once
/// the whole file has been walked. An unknown macro name aborts immediately with
/// [`TransformError::Incompatible`].
pub fn expand_file(
    program: &Program,
    file: FileId,
    config: &ResolvedConfig,
    vcs: &dyn VcsProvider,
    sink: &mut dyn DiagnosticSink,
    cwd: Option<&Path>,
) -> Result<Expansion, TransformError> {
    let source_file = program.file(file);
    let used = program
        .checker()
        .identifiers(file)
        .cloned()
        .unwrap_or_default();
    let labels = LabelBuilder::new(source_file, cwd, config.scope());
    let path = labels.path().to_string();
    let mut walker = MacroWalker {
        identity: MacroModuleIdentity::new(program),
        cx: RuleContext {
            file: source_file,
            source: source_file.error_source(),
            checker: program.checker(),
            config,
            labels,
            vcs,
            sink,
            names: FreshNames::new(used),
        },
        errors: Vec::new(),
        changed: false,
        handled: 0,
    };
    let module = walker.fold_module(source_file.module().clone())?;
    if !walker.errors.is_empty() {
        return Err(TransformError::CallSites {
            path,
            errors: walker.errors,
        });
    }
    Ok(Expansion {
        module,
        changed: walker.changed,
        handled: walker.handled,
    })
}

struct MacroWalker<'a> {
    identity: MacroModuleIdentity<'a>,
    cx: RuleContext<'a>,
    errors: Vec<TransformError>,
    changed: bool,
    handled: usize,
}

impl<'a> MacroWalker<'a> {
    fn rewrite_import(&mut self, import: ImportDecl) -> Stmt {
        if import.type_only {
            return Stmt::Import(import);
        }
        self.changed = true;
        let bindings = import.clause.as_ref().map_or(0, ImportClause::binding_count);
        if bindings == 0 {
            return build::empty_export();
        }
        Stmt::Import(ImportDecl {
            type_only: true,
            ..import
        })
    }

    /// The macro a call invokes, if any.
    fn classify(&self, call: &CallExpr) -> Result<Option<MacroKind>, TransformError> {
        let file = self.cx.file.id();
        let Some(signature) = self.cx.checker.resolved_signature(file, call) else {
            return Ok(None);
        };
        let SignatureDeclaration::Function { name } = &signature.declaration else {
            return Ok(None);
        };
        if !self.identity.is_macro_declaration(&signature) {
            return Ok(None);
        }
        name.parse::<MacroKind>().map(Some).map_err(|e| {
            err_ctx!(Incompatible, e.message(), &self.cx.source, call.span)
                .with_help("the macro declarations and the transformer must come from the same release")
        })
    }

    fn expand(
        &mut self,
        kind: MacroKind,
        call: CallExpr,
        ctx: ExprContext,
    ) -> Result<Expr, TransformError> {
        self.handled += 1;
        self.changed = true;
        if self.cx.config.verbose() {
            let location = self.cx.location(call.span);
            self.cx.sink.emit(
                Severity::Info,
                &format!("Handling call to macro `{kind}`"),
                Some(&location),
            );
        }
        let original = call.clone();
        let expr = match rules::apply(&mut self.cx, kind, call, ctx) {
            Ok(Rewrite::Replaced(expr)) => walk_expr(self, expr)?,
            Ok(Rewrite::Forwarded(expr)) => self.fold_expr(expr, ctx)?,
            Err(err) => {
                self.errors.push(err);
                // Keep walking the arguments so errors nested inside are reported as well.
                walk_expr(self, Expr::Call(original))?
            }
        };
        Ok(fit(expr, ctx))
    }
}

/// Parenthesizes a replacement that would not bind as tightly as the call it replaced.
fn fit(expr: Expr, ctx: ExprContext) -> Expr {
    if ctx == ExprContext::Operand && !expr.is_tight() {
        build::paren(expr)
    } else {
        expr
    }
}

impl<'a> Fold for MacroWalker<'a> {
    type Error = TransformError;

    fn fold_module(&mut self, module: Module) -> Result<Module, TransformError> {
        walk_module(self, module)
    }

    fn fold_stmt(&mut self, stmt: Stmt) -> Result<Stmt, TransformError> {
        match stmt {
            Stmt::Import(import) if self.identity.is_macro_import(self.cx.file.id(), &import) => {
                Ok(self.rewrite_import(import))
            }
            other => walk_stmt(self, other),
        }
    }

    fn fold_expr(&mut self, expr: Expr, ctx: ExprContext) -> Result<Expr, TransformError> {
        match expr {
            Expr::Call(call) => match self.classify(&call)? {
                Some(kind) => self.expand(kind, call, ctx),
                None => walk_expr(self, Expr::Call(call)),
            },
            other => walk_expr(self, other),
        }
    }
}
