//! One rewrite rule per macro.
//!
//! Every rule receives the original call (its arguments not yet expanded) and the context of the
//! position it occupies, and returns a [`Rewrite`]. Rules never mutate the call; they build new
//! nodes and move original argument nodes into them, so original spans survive for labels and
//! nested expansion.

use std::collections::HashSet;

use crate::config::ResolvedConfig;
use crate::diagnostics::{DiagnosticSink, Location, Severity, SourceArc, TransformError};
use crate::err_ctx;
use crate::macros::label::{source_text, LabelBuilder};
use crate::macros::MacroKind;
use crate::program::checker::Checker;
use crate::program::SourceFile;
use crate::syntax::ast::*;
use crate::syntax::build;
use crate::syntax::fold::ExprContext;
use crate::syntax::Span;
use crate::vcs::{GitMetadata, VcsProvider};

/// The result of expanding one macro call.
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    /// A new node. Its children still have to be expanded.
    Replaced(Expr),
    /// An original argument that takes the place of the call as a whole.
    Forwarded(Expr),
}

/// Parameter names that do not occur anywhere in the file being expanded.
#[derive(Debug, Clone, Default)]
pub struct FreshNames {
    used: HashSet<String>,
}

impl FreshNames {
    pub fn new(used: HashSet<String>) -> Self {
        Self { used }
    }

    /// `base`, `base_1`, `base_2`, ... whichever is free first. The result is reserved.
    pub fn fresh(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 0;
        while self.used.contains(&name) {
            n += 1;
            name = format!("{base}_{n}");
        }
        self.used.insert(name.clone());
        name
    }
}

/// Everything a rule may read while expanding calls of one file.
pub struct RuleContext<'a> {
    pub file: &'a SourceFile,
    pub source: SourceArc,
    pub checker: &'a Checker,
    pub config: &'a ResolvedConfig,
    pub labels: LabelBuilder,
    pub vcs: &'a dyn VcsProvider,
    pub sink: &'a mut dyn DiagnosticSink,
    pub names: FreshNames,
}

impl<'a> RuleContext<'a> {
    /// One-based location of `span` for diagnostics.
    pub fn location(&self, span: Span) -> Location {
        let line = if span.is_dummy() {
            1
        } else {
            self.file.line_of(span.start) + 1
        };
        Location {
            path: self.labels.path().to_string(),
            line,
        }
    }

    fn error(&self, message: impl Into<String>, span: Span) -> TransformError {
        err_ctx!(Macro, message.into(), &self.source, span)
    }
}

/// Expands one recognized macro call.
pub fn apply(
    cx: &mut RuleContext<'_>,
    kind: MacroKind,
    call: CallExpr,
    ctx: ExprContext,
) -> Result<Rewrite, TransformError> {
    check_arity(cx, kind, &call)?;
    match kind {
        MacroKind::Dbg => dbg(cx, call, ctx),
        MacroKind::Print => Ok(log_call(cx, "print", call)),
        MacroKind::Warn => Ok(log_call(cx, "warn", call)),
        MacroKind::Error => Ok(error_call(cx, call)),
        MacroKind::CommitId => commit_id(cx, &call),
        MacroKind::Git => git(cx, &call),
        MacroKind::NameOf => nameof(cx, call, ctx),
    }
}

// ============================================================================
// ARITY
// ============================================================================

fn check_arity(cx: &RuleContext<'_>, kind: MacroKind, call: &CallExpr) -> Result<(), TransformError> {
    let count = call.args.len();
    let (ok, expected) = match kind {
        MacroKind::Dbg => ((1..=2).contains(&count), "1 or 2 arguments"),
        MacroKind::Print | MacroKind::Warn => (true, ""),
        MacroKind::Error => (count >= 1, "at least 1 argument"),
        MacroKind::CommitId | MacroKind::Git => (count == 0, "no arguments"),
        MacroKind::NameOf => (
            count == 1 || (count == 0 && call.type_args.len() == 1),
            "1 argument, or none with a single type argument",
        ),
    };
    if !ok {
        return Err(cx
            .error(
                format!("`{}` expects {}, got {}", kind, expected, count),
                call.span,
            )
            .with_help(format!("check the declaration of `{kind}`")));
    }
    let counted = match kind {
        MacroKind::Print | MacroKind::Warn | MacroKind::CommitId | MacroKind::Git => 0,
        MacroKind::Error => 1,
        MacroKind::Dbg | MacroKind::NameOf => count,
    };
    if let Some(spread) = call.args.iter().take(counted).find(|a| a.spread) {
        return Err(cx.error(
            format!("`{kind}` does not accept a spread argument here"),
            spread.expr.span(),
        ));
    }
    Ok(())
}

// ============================================================================
// $dbg
// ============================================================================

fn dbg(
    cx: &mut RuleContext<'_>,
    call: CallExpr,
    ctx: ExprContext,
) -> Result<Rewrite, TransformError> {
    let mut args = call.args.into_iter().map(|a| a.expr);
    let Some(expr) = args.next() else {
        return Err(cx.error("`$dbg` expects an expression", call.span));
    };
    let handler = args.next();

    if ctx == ExprContext::Statement && handler.is_none() {
        if !cx.config.enabled() {
            return Ok(if expr.is_call() {
                Rewrite::Forwarded(expr)
            } else if expr.may_have_side_effects() {
                Rewrite::Replaced(build::unary(UnaryOp::Void, expr))
            } else {
                Rewrite::Replaced(build::void_zero())
            });
        }
        let label = cx.labels.expression(cx.file, &expr);
        return Ok(Rewrite::Replaced(build::call(
            build::ident("print"),
            vec![build::arg(build::string(label)), build::arg(expr)],
        )));
    }

    if !cx.config.enabled() {
        return Ok(Rewrite::Forwarded(expr));
    }
    let label = cx.labels.expression(cx.file, &expr);
    Ok(Rewrite::Replaced(debug_wrapper(cx, label, expr, handler)))
}

/// `((value) => { print(label, value); return value; })(expr)`, or with a handler
/// `((value, handler) => { handler(label, value); return value; })(expr, handler)`.
fn debug_wrapper(
    cx: &mut RuleContext<'_>,
    label: String,
    expr: Expr,
    handler: Option<Expr>,
) -> Expr {
    let value = cx.names.fresh("value");
    let (params, callee, args) = match handler {
        Some(handler) => {
            let handler_name = cx.names.fresh("handler");
            let params = vec![value.clone(), handler_name.clone()];
            (params, build::ident(&handler_name), vec![expr, handler])
        }
        None => (vec![value.clone()], build::ident("print"), vec![expr]),
    };
    let body = vec![
        build::expr_stmt(build::call(
            callee,
            vec![build::arg(build::string(label)), build::arg(build::ident(&value))],
        )),
        build::return_stmt(build::ident(&value)),
    ];
    let wrapper = build::arrow_block(params.iter().map(String::as_str).collect(), body);
    build::call(
        build::paren(wrapper),
        args.into_iter().map(build::arg).collect(),
    )
}

// ============================================================================
// $print / $warn / $error
// ============================================================================

/// `void 0`, or `void (a, b)` over the arguments whose evaluation is observable.
fn disabled(args: Vec<ExprOrSpread>) -> Rewrite {
    let kept: Vec<Expr> = args
        .into_iter()
        .filter(|a| a.spread || a.expr.may_have_side_effects())
        .map(|a| a.expr)
        .collect();
    if kept.is_empty() {
        Rewrite::Replaced(build::void_zero())
    } else {
        Rewrite::Replaced(build::unary(UnaryOp::Void, build::seq(kept)))
    }
}

fn log_call(cx: &mut RuleContext<'_>, primitive: &str, call: CallExpr) -> Rewrite {
    if !cx.config.enabled() {
        return disabled(call.args);
    }
    let mut args = vec![build::arg(build::string(cx.labels.location(cx.file, call.span)))];
    args.extend(call.args);
    Rewrite::Replaced(build::call(build::ident(primitive), args))
}

fn error_call(cx: &mut RuleContext<'_>, call: CallExpr) -> Rewrite {
    if !cx.config.enabled() {
        return disabled(call.args);
    }
    let location = cx.labels.location(cx.file, call.span);
    let mut args = call.args.into_iter();
    let message = match args.next().map(|a| a.expr) {
        Some(Expr::Lit(Lit::Str(s))) => build::string(format!("{} {}", location, s.value)),
        Some(other) => build::binary(
            BinaryOp::Add,
            build::string(format!("{location} ")),
            build::paren(other),
        ),
        None => build::string(location),
    };
    let mut all = vec![build::arg(message)];
    all.extend(args);
    Rewrite::Replaced(build::call(build::ident("error"), all))
}

// ============================================================================
// $commitId / $git
// ============================================================================

/// Points a provider failure at the call that needed it.
fn at_call(cx: &RuleContext<'_>, call: &CallExpr, err: TransformError) -> TransformError {
    err_ctx!(Vcs, err.message(), &cx.source, call.span)
        .with_help("run the transform inside a git work tree")
        .with_cause(err)
}

fn commit_id(cx: &mut RuleContext<'_>, call: &CallExpr) -> Result<Rewrite, TransformError> {
    let hash = cx.vcs.commit_id().map_err(|e| at_call(cx, call, e))?;
    Ok(Rewrite::Replaced(build::string(hash)))
}

fn git(cx: &mut RuleContext<'_>, call: &CallExpr) -> Result<Rewrite, TransformError> {
    let metadata: GitMetadata = cx.vcs.metadata().map_err(|e| at_call(cx, call, e))?;
    Ok(Rewrite::Replaced(build::object(vec![
        ("Branch", build::string(metadata.branch)),
        ("Commit", build::string(metadata.commit)),
        ("CommitHash", build::string(metadata.commit_hash)),
        ("Author", build::string(metadata.author)),
        ("Timestamp", build::number(metadata.timestamp as f64)),
        ("ISODate", build::string(metadata.iso_date)),
    ])))
}

// ============================================================================
// $nameof
// ============================================================================

fn nameof(
    cx: &mut RuleContext<'_>,
    call: CallExpr,
    ctx: ExprContext,
) -> Result<Rewrite, TransformError> {
    if ctx == ExprContext::Statement {
        let text = source_text(cx.file, &Expr::Call(call.clone()));
        let location = cx.location(call.span);
        cx.sink.emit(
            Severity::Warning,
            &format!("Call to `{text}`, which is not used anywhere. It has been stripped."),
            Some(&location),
        );
        return Ok(Rewrite::Replaced(build::void_zero()));
    }

    let name = match (call.args.first(), call.type_args.first()) {
        (Some(arg), _) => expression_name(cx, &arg.expr),
        (None, Some(ty)) => type_name(ty),
        (None, None) => None,
    };
    match name {
        Some(name) => Ok(Rewrite::Replaced(build::string(name))),
        None => Err(cx
            .error("cannot resolve a name for this `$nameof` operand", call.span)
            .with_help("pass an identifier, a property access, `this`, or a type argument")),
    }
}

fn expression_name(cx: &RuleContext<'_>, expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(ident) => Some(
            cx.checker
                .symbol_at(cx.file.id(), ident)
                .map(|symbol| cx.checker.symbol(symbol).name.clone())
                .unwrap_or_else(|| ident.name.clone()),
        ),
        Expr::Member(member) => Some(member.prop.name.clone()),
        Expr::This(_) => Some("this".to_string()),
        Expr::Paren(paren) => expression_name(cx, &paren.expr),
        Expr::NonNull(inner) => expression_name(cx, &inner.expr),
        Expr::As(cast) => expression_name(cx, &cast.expr),
        _ => None,
    }
}

fn type_name(ty: &TypeNode) -> Option<String> {
    match ty {
        TypeNode::Ref { name, .. } | TypeNode::TypeOf(name, _) => {
            name.last().map(|segment| segment.name.clone())
        }
        TypeNode::Paren(inner, _) => type_name(inner),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_names_skip_used_identifiers() {
        let used = ["value", "value_1"].iter().map(|s| s.to_string()).collect();
        let mut names = FreshNames::new(used);
        assert_eq!(names.fresh("value"), "value_2");
        assert_eq!(names.fresh("value"), "value_3");
        assert_eq!(names.fresh("handler"), "handler");
        assert_eq!(names.fresh("handler"), "handler_1");
    }

    #[test]
    fn test_disabled_keeps_only_observable_arguments() {
        let args = vec![
            build::arg(build::string("hello")),
            build::arg(build::call(build::ident("f"), vec![])),
            build::arg(build::ident("x")),
        ];
        let Rewrite::Replaced(Expr::Unary(unary)) = disabled(args) else {
            panic!("expected void expression");
        };
        assert_eq!(unary.op, UnaryOp::Void);
        assert!(unary.arg.is_call());

        assert_eq!(
            disabled(vec![build::arg(build::ident("x"))]),
            Rewrite::Replaced(build::void_zero())
        );
    }

    #[test]
    fn test_type_names_take_last_segment() {
        let ty = TypeNode::Ref {
            name: vec![build::ident_node("ns"), build::ident_node("Inner")],
            args: Vec::new(),
            span: Span::DUMMY,
        };
        assert_eq!(type_name(&ty).as_deref(), Some("Inner"));
        let lit = TypeNode::Lit(Lit::Null(Span::DUMMY));
        assert_eq!(type_name(&lit), None);
    }
}
