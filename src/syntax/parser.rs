//! TypeScript subset parser
//!
//! Converts source text into a [`Module`] with byte-offset spans on every node. The grammar lives
//! in `grammar.pest`; this file turns the pest parse tree into the typed syntax tree. Binary
//! operators arrive from the grammar as a flat operand/operator list and are grouped here by
//! precedence climbing.

use std::iter::Peekable;
use std::vec::IntoIter;

use pest::error::{Error, InputLocation};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::diagnostics::{to_error_source, TransformError};
use crate::err_ctx;
use crate::syntax::ast::*;
use crate::syntax::Span;

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct TsParser;

type ParseResult<T> = Result<T, TransformError>;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse the text of one source file. `name` is only used to label diagnostics.
pub fn parse_module(name: &str, text: &str) -> ParseResult<Module> {
    let builder = Builder { name, text };
    let mut pairs =
        TsParser::parse(Rule::program, text).map_err(|e| builder.convert_parse_error(e))?;
    let program = pairs
        .next()
        .ok_or_else(|| builder.error("empty parse tree", Span::new(0, 0)))?;

    let body = program
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(|p| builder.stmt(p))
        .collect::<ParseResult<Vec<_>>>()?;

    Ok(Module {
        body,
        span: Span::new(0, text.len()),
    })
}

/// Parse a single expression, as written in a test or a config snippet.
pub fn parse_expr(text: &str) -> ParseResult<Expr> {
    let builder = Builder {
        name: "<expression>",
        text,
    };
    let mut pairs =
        TsParser::parse(Rule::expression, text).map_err(|e| builder.convert_parse_error(e))?;
    let pair = pairs
        .next()
        .ok_or_else(|| builder.error("empty parse tree", Span::new(0, 0)))?;
    let end = get_span(&pair).end;
    if end != text.trim_end().len() {
        return Err(builder.error(
            "unexpected trailing input",
            Span::new(end, text.len()),
        ));
    }
    builder.expression(pair)
}

// ============================================================================
// STATEMENT BUILDERS
// ============================================================================

struct Builder<'a> {
    name: &'a str,
    text: &'a str,
}

impl<'a> Builder<'a> {
    fn stmt(&self, pair: Pair<Rule>) -> ParseResult<Stmt> {
        let span = get_span(&pair);
        match pair.as_rule() {
            Rule::import_decl => self.import_decl(pair).map(Stmt::Import),
            Rule::export_all => self.export_all(pair).map(Stmt::ExportAll),
            Rule::export_named => self.export_named(pair).map(Stmt::ExportNamed),
            Rule::export_default => {
                let expr = self.first_expr(pair, span)?;
                Ok(Stmt::ExportDefault(ExportDefault { expr, span }))
            }
            Rule::declaration => self.declaration(pair),
            Rule::block => self.block(pair).map(Stmt::Block),
            Rule::empty_stmt => Ok(Stmt::Empty(span)),
            Rule::if_stmt => {
                let mut test = None;
                let mut branches = Vec::new();
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::expression => test = Some(self.expression(p)?),
                        _ => branches.push(Box::new(self.stmt(p)?)),
                    }
                }
                let mut branches = branches.into_iter();
                Ok(Stmt::If(IfStmt {
                    test: self.require(test, "if condition", span)?,
                    cons: self.require(branches.next(), "if body", span)?,
                    alt: branches.next(),
                    span,
                }))
            }
            Rule::while_stmt => {
                let mut test = None;
                let mut body = None;
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::expression => test = Some(self.expression(p)?),
                        _ => body = Some(Box::new(self.stmt(p)?)),
                    }
                }
                Ok(Stmt::While(WhileStmt {
                    test: self.require(test, "while condition", span)?,
                    body: self.require(body, "while body", span)?,
                    span,
                }))
            }
            Rule::for_in_stmt => self.for_in_stmt(pair).map(Stmt::ForIn),
            Rule::for_stmt => self.for_stmt(pair).map(Stmt::For),
            Rule::try_stmt => self.try_stmt(pair).map(Stmt::Try),
            Rule::return_stmt => {
                let arg = pair
                    .into_inner()
                    .next()
                    .map(|p| self.expression(p))
                    .transpose()?;
                Ok(Stmt::Return(ReturnStmt { arg, span }))
            }
            Rule::throw_stmt => {
                let arg = self.first_expr(pair, span)?;
                Ok(Stmt::Throw(ThrowStmt { arg, span }))
            }
            Rule::break_stmt => Ok(Stmt::Break(span)),
            Rule::continue_stmt => Ok(Stmt::Continue(span)),
            Rule::expr_stmt => {
                let expr = self.first_expr(pair, span)?;
                Ok(Stmt::Expr(ExprStmt { expr, span }))
            }
            rule => Err(self.unexpected(rule, span)),
        }
    }

    fn import_decl(&self, pair: Pair<Rule>) -> ParseResult<ImportDecl> {
        let span = get_span(&pair);
        let mut type_only = false;
        let mut clause = None;
        let mut source = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::type_only => type_only = true,
                Rule::import_clause => clause = Some(self.import_clause(p)?),
                Rule::string => source = Some(self.string(p)?),
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        Ok(ImportDecl {
            type_only,
            clause,
            source: self.require(source, "module specifier", span)?,
            span,
        })
    }

    fn import_clause(&self, pair: Pair<Rule>) -> ParseResult<ImportClause> {
        let span = get_span(&pair);
        let mut clause = ImportClause {
            default: None,
            bindings: None,
        };
        for p in pair.into_inner() {
            let part_span = get_span(&p);
            match p.as_rule() {
                Rule::import_default => {
                    let ident = self.inner(p, part_span)?;
                    clause.default = Some(make_ident(&ident));
                }
                Rule::import_namespace => {
                    let ident = self.inner(p, part_span)?;
                    clause.bindings = Some(ImportBindings::Namespace(make_ident(&ident)));
                }
                Rule::import_named => {
                    let specifiers = p
                        .into_inner()
                        .map(|s| self.import_specifier(s))
                        .collect::<ParseResult<Vec<_>>>()?;
                    clause.bindings = Some(ImportBindings::Named(specifiers));
                }
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        Ok(clause)
    }

    fn import_specifier(&self, pair: Pair<Rule>) -> ParseResult<ImportSpecifier> {
        let span = get_span(&pair);
        let mut names: Vec<Ident> = pair.into_inner().map(|p| make_ident(&p)).collect();
        let local = self.require(names.pop(), "import binding", span)?;
        Ok(ImportSpecifier {
            imported: names.pop(),
            local,
            span,
        })
    }

    fn export_all(&self, pair: Pair<Rule>) -> ParseResult<ExportAll> {
        let span = get_span(&pair);
        let mut alias = None;
        let mut source = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::identifier_name => alias = Some(make_ident(&p)),
                Rule::string => source = Some(self.string(p)?),
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        Ok(ExportAll {
            alias,
            source: self.require(source, "module specifier", span)?,
            span,
        })
    }

    fn export_named(&self, pair: Pair<Rule>) -> ParseResult<NamedExport> {
        let span = get_span(&pair);
        let mut export = NamedExport {
            type_only: false,
            specifiers: Vec::new(),
            source: None,
            span,
        };
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::type_only => export.type_only = true,
                Rule::export_specifier => {
                    let spec_span = get_span(&p);
                    let mut names = p.into_inner().map(|n| make_ident(&n));
                    let local = self.require(names.next(), "export name", spec_span)?;
                    export.specifiers.push(ExportSpecifier {
                        local,
                        exported: names.next(),
                        span: spec_span,
                    });
                }
                Rule::string => export.source = Some(self.string(p)?),
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        Ok(export)
    }

    fn declaration(&self, pair: Pair<Rule>) -> ParseResult<Stmt> {
        let span = get_span(&pair);
        let mut modifiers = Modifiers::default();
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::export_mod => modifiers.export = true,
                Rule::declare_mod => modifiers.declare = true,
                Rule::function_decl => {
                    let (ident, function) = self.named_function(p)?;
                    return Ok(Stmt::Function(FunctionDecl {
                        modifiers,
                        ident,
                        function,
                        span,
                    }));
                }
                Rule::var_decl => {
                    let (kind, decls) = self.var_declarators(p)?;
                    return Ok(Stmt::Var(VarDecl {
                        modifiers,
                        kind,
                        decls,
                        span,
                    }));
                }
                Rule::type_alias => {
                    let mut ident = None;
                    let mut type_params = Vec::new();
                    let mut ty = None;
                    for part in p.into_inner() {
                        match part.as_rule() {
                            Rule::identifier => ident = Some(make_ident(&part)),
                            Rule::type_params => type_params = self.type_params(part)?,
                            _ => ty = Some(self.type_expr(part)?),
                        }
                    }
                    return Ok(Stmt::TypeAlias(TypeAliasDecl {
                        modifiers,
                        ident: self.require(ident, "type alias name", span)?,
                        type_params,
                        ty: self.require(ty, "aliased type", span)?,
                        span,
                    }));
                }
                Rule::interface_decl => {
                    let mut ident = None;
                    let mut type_params = Vec::new();
                    let mut extends = Vec::new();
                    let mut body = Vec::new();
                    for part in p.into_inner() {
                        match part.as_rule() {
                            Rule::identifier => ident = Some(make_ident(&part)),
                            Rule::type_params => type_params = self.type_params(part)?,
                            Rule::interface_extends => {
                                extends = part
                                    .into_inner()
                                    .map(|t| self.type_node(t))
                                    .collect::<ParseResult<Vec<_>>>()?;
                            }
                            _ => body = self.type_members(part)?,
                        }
                    }
                    return Ok(Stmt::Interface(InterfaceDecl {
                        modifiers,
                        ident: self.require(ident, "interface name", span)?,
                        type_params,
                        extends,
                        body,
                        span,
                    }));
                }
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        Err(self.error("incomplete declaration", span))
    }

    /// `function_decl` or `function_expr`: optional name, signature, optional body.
    fn function_parts(&self, pair: Pair<Rule>) -> ParseResult<(Option<Ident>, Function)> {
        let span = get_span(&pair);
        let mut ident = None;
        let mut function = Function {
            type_params: Vec::new(),
            params: Vec::new(),
            return_type: None,
            body: None,
            span,
        };
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::identifier => ident = Some(make_ident(&p)),
                Rule::function_sig => self.function_sig(p, &mut function)?,
                Rule::block => function.body = Some(self.block(p)?),
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        Ok((ident, function))
    }

    fn named_function(&self, pair: Pair<Rule>) -> ParseResult<(Ident, Function)> {
        let span = get_span(&pair);
        let (ident, function) = self.function_parts(pair)?;
        Ok((self.require(ident, "function name", span)?, function))
    }

    fn function_sig(&self, pair: Pair<Rule>, function: &mut Function) -> ParseResult<()> {
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::type_params => function.type_params = self.type_params(p)?,
                Rule::params => function.params = self.params(p)?,
                Rule::return_type => {
                    let span = get_span(&p);
                    let ty = self.inner(p, span)?;
                    function.return_type = Some(self.type_expr(ty)?);
                }
                rule => return Err(self.unexpected(rule, function.span)),
            }
        }
        Ok(())
    }

    fn params(&self, pair: Pair<Rule>) -> ParseResult<Vec<Param>> {
        pair.into_inner().map(|p| self.param(p)).collect()
    }

    fn param(&self, pair: Pair<Rule>) -> ParseResult<Param> {
        let span = get_span(&pair);
        let mut rest = false;
        let mut name = None;
        let mut optional = false;
        let mut type_ann = None;
        let mut default = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::rest_marker => rest = true,
                Rule::identifier => name = Some(make_ident(&p)),
                Rule::optional_marker => optional = true,
                Rule::type_annotation => type_ann = Some(self.type_annotation(p)?),
                Rule::assignment => default = Some(self.assignment(p)?),
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        Ok(Param {
            rest,
            name: self.require(name, "parameter name", span)?,
            optional,
            type_ann,
            default,
            span,
        })
    }

    fn var_declarators(&self, pair: Pair<Rule>) -> ParseResult<(VarKind, Vec<VarDeclarator>)> {
        let span = get_span(&pair);
        let mut kind = VarKind::Const;
        let mut decls = Vec::new();
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::var_kind => kind = var_kind(&p),
                Rule::var_declarator => decls.push(self.var_declarator(p)?),
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        Ok((kind, decls))
    }

    fn var_declarator(&self, pair: Pair<Rule>) -> ParseResult<VarDeclarator> {
        let span = get_span(&pair);
        let mut name = None;
        let mut type_ann = None;
        let mut init = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::identifier => name = Some(make_ident(&p)),
                Rule::type_annotation => type_ann = Some(self.type_annotation(p)?),
                Rule::assignment => init = Some(self.assignment(p)?),
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        Ok(VarDeclarator {
            name: self.require(name, "variable name", span)?,
            type_ann,
            init,
            span,
        })
    }

    fn block(&self, pair: Pair<Rule>) -> ParseResult<Block> {
        let span = get_span(&pair);
        let stmts = pair
            .into_inner()
            .map(|p| self.stmt(p))
            .collect::<ParseResult<Vec<_>>>()?;
        Ok(Block { stmts, span })
    }

    fn for_in_stmt(&self, pair: Pair<Rule>) -> ParseResult<ForInStmt> {
        let span = get_span(&pair);
        let mut var_kind_value = VarKind::Const;
        let mut binding = None;
        let mut kind = ForInKind::Of;
        let mut right = None;
        let mut body = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::var_kind => var_kind_value = var_kind(&p),
                Rule::identifier => binding = Some(make_ident(&p)),
                Rule::for_in_kind => {
                    kind = if p.as_str() == "in" {
                        ForInKind::In
                    } else {
                        ForInKind::Of
                    }
                }
                Rule::expression => right = Some(self.expression(p)?),
                _ => body = Some(Box::new(self.stmt(p)?)),
            }
        }
        Ok(ForInStmt {
            var_kind: var_kind_value,
            binding: self.require(binding, "loop binding", span)?,
            kind,
            right: self.require(right, "loop subject", span)?,
            body: self.require(body, "loop body", span)?,
            span,
        })
    }

    fn for_stmt(&self, pair: Pair<Rule>) -> ParseResult<ForStmt> {
        let span = get_span(&pair);
        let mut stmt = ForStmt {
            init: None,
            test: None,
            update: None,
            body: Box::new(Stmt::Empty(span)),
            span,
        };
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::for_init => {
                    let init_span = get_span(&p);
                    let mut parts = p.into_inner().peekable();
                    let is_var = parts.peek().map(|f| f.as_rule()) == Some(Rule::var_kind);
                    if is_var {
                        let mut kind = VarKind::Let;
                        let mut decls = Vec::new();
                        for part in parts {
                            match part.as_rule() {
                                Rule::var_kind => kind = var_kind(&part),
                                _ => decls.push(self.var_declarator(part)?),
                            }
                        }
                        stmt.init = Some(ForInit::Var(kind, decls));
                    } else {
                        let expr = self.require(parts.next(), "loop initializer", init_span)?;
                        stmt.init = Some(ForInit::Expr(self.expression(expr)?));
                    }
                }
                Rule::for_test => stmt.test = Some(self.first_expr(p, span)?),
                Rule::for_update => stmt.update = Some(self.first_expr(p, span)?),
                _ => stmt.body = Box::new(self.stmt(p)?),
            }
        }
        Ok(stmt)
    }

    fn try_stmt(&self, pair: Pair<Rule>) -> ParseResult<TryStmt> {
        let span = get_span(&pair);
        let mut block = None;
        let mut handler = None;
        let mut finalizer = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::block => block = Some(self.block(p)?),
                Rule::catch_clause => {
                    let catch_span = get_span(&p);
                    let mut param = None;
                    let mut body = None;
                    for part in p.into_inner() {
                        match part.as_rule() {
                            Rule::identifier => param = Some(make_ident(&part)),
                            _ => body = Some(self.block(part)?),
                        }
                    }
                    handler = Some(CatchClause {
                        param,
                        body: self.require(body, "catch body", catch_span)?,
                        span: catch_span,
                    });
                }
                Rule::finally_clause => {
                    let finally_span = get_span(&p);
                    finalizer = Some(self.block(self.inner(p, finally_span)?)?);
                }
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        Ok(TryStmt {
            block: self.require(block, "try block", span)?,
            handler,
            finalizer,
            span,
        })
    }

    // ========================================================================
    // EXPRESSION BUILDERS
    // ========================================================================

    fn first_expr(&self, pair: Pair<Rule>, span: Span) -> ParseResult<Expr> {
        let inner = self.inner(pair, span)?;
        match inner.as_rule() {
            Rule::expression => self.expression(inner),
            _ => self.assignment(inner),
        }
    }

    fn expression(&self, pair: Pair<Rule>) -> ParseResult<Expr> {
        let span = get_span(&pair);
        let mut exprs = pair
            .into_inner()
            .map(|p| self.assignment(p))
            .collect::<ParseResult<Vec<_>>>()?;
        if exprs.len() == 1 {
            return self.require(exprs.pop(), "expression", span);
        }
        Ok(Expr::Seq(SeqExpr { exprs, span }))
    }

    fn assignment(&self, pair: Pair<Rule>) -> ParseResult<Expr> {
        let span = get_span(&pair);
        let mut inner = pair.into_inner();
        let first = self.require(inner.next(), "expression", span)?;
        if first.as_rule() == Rule::arrow_function {
            return self.arrow_function(first);
        }
        let target = self.conditional(first)?;
        let Some(op_pair) = inner.next() else {
            return Ok(target);
        };
        let op_span = get_span(&op_pair);
        let op = AssignOp::from_token(op_pair.as_str())
            .ok_or_else(|| self.error("unknown assignment operator", op_span))?;
        if !is_assignment_target(&target) {
            return Err(self.error("invalid assignment target", target.span()));
        }
        let value = self.assignment(self.require(inner.next(), "assigned value", span)?)?;
        Ok(Expr::Assign(AssignExpr {
            op,
            target: Box::new(target),
            value: Box::new(value),
            span,
        }))
    }

    fn conditional(&self, pair: Pair<Rule>) -> ParseResult<Expr> {
        let span = get_span(&pair);
        let mut inner = pair.into_inner();
        let test = self.binary(self.require(inner.next(), "expression", span)?)?;
        let (Some(cons), Some(alt)) = (inner.next(), inner.next()) else {
            return Ok(test);
        };
        Ok(Expr::Cond(CondExpr {
            test: Box::new(test),
            cons: Box::new(self.assignment(cons)?),
            alt: Box::new(self.assignment(alt)?),
            span,
        }))
    }

    fn binary(&self, pair: Pair<Rule>) -> ParseResult<Expr> {
        let span = get_span(&pair);
        let mut items = Vec::new();
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::unary => items.push(BinaryItem::Operand(self.unary(p)?)),
                Rule::binary_op => {
                    let op_span = get_span(&p);
                    let op = BinaryOp::from_token(p.as_str())
                        .ok_or_else(|| self.error("unknown binary operator", op_span))?;
                    items.push(BinaryItem::Operator(op));
                }
                Rule::as_suffix => {
                    let as_span = get_span(&p);
                    let ty = self.type_expr(self.inner(p, as_span)?)?;
                    items.push(BinaryItem::Cast(ty, as_span));
                }
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        let mut items = items.into_iter().peekable();
        self.climb(&mut items, 0, span)
    }

    fn climb(
        &self,
        items: &mut Peekable<IntoIter<BinaryItem>>,
        min_prec: u8,
        span: Span,
    ) -> ParseResult<Expr> {
        let mut left = match items.next() {
            Some(BinaryItem::Operand(expr)) => expr,
            _ => return Err(self.error("expected an operand", span)),
        };
        loop {
            match items.peek() {
                Some(BinaryItem::Cast(..)) if BinaryOp::RELATIONAL >= min_prec => {
                    if let Some(BinaryItem::Cast(ty, cast_span)) = items.next() {
                        let span = left.span().to(cast_span);
                        left = Expr::As(AsExpr {
                            expr: Box::new(left),
                            ty,
                            span,
                        });
                    }
                }
                Some(BinaryItem::Operator(op)) if op.precedence() >= min_prec => {
                    let op = *op;
                    items.next();
                    let next_min = if op.is_right_associative() {
                        op.precedence()
                    } else {
                        op.precedence() + 1
                    };
                    let right = self.climb(items, next_min, span)?;
                    let span = left.span().to(right.span());
                    left = Expr::Binary(BinaryExpr {
                        op,
                        left: Box::new(left),
                        right: Box::new(right),
                        span,
                    });
                }
                _ => return Ok(left),
            }
        }
    }

    fn unary(&self, pair: Pair<Rule>) -> ParseResult<Expr> {
        let span = get_span(&pair);
        let mut prefixes = Vec::new();
        let mut operand = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::prefix_op => prefixes.push((p.as_str().to_string(), get_span(&p))),
                _ => operand = Some(self.postfix(p)?),
            }
        }
        let mut expr = self.require(operand, "operand", span)?;
        for (op, op_span) in prefixes.into_iter().rev() {
            let span = Span::new(op_span.start, span.end);
            let arg = Box::new(expr);
            expr = match op.as_str() {
                "++" | "--" => Expr::Update(UpdateExpr {
                    op: if op == "++" {
                        UpdateOp::Increment
                    } else {
                        UpdateOp::Decrement
                    },
                    prefix: true,
                    arg,
                    span,
                }),
                word => Expr::Unary(UnaryExpr {
                    op: unary_op(word).ok_or_else(|| self.error("unknown unary operator", op_span))?,
                    arg,
                    span,
                }),
            };
        }
        Ok(expr)
    }

    fn postfix(&self, pair: Pair<Rule>) -> ParseResult<Expr> {
        let span = get_span(&pair);
        let start = span.start;
        let mut inner = pair.into_inner();
        let head = self.require(inner.next(), "expression", span)?;
        let mut expr = match head.as_rule() {
            Rule::new_expr => self.new_expr(head)?,
            _ => self.primary(head)?,
        };
        for p in inner {
            let span = Span::new(start, get_span(&p).end);
            expr = self.apply_suffix(expr, p, span)?;
        }
        Ok(expr)
    }

    fn apply_suffix(&self, object: Expr, pair: Pair<Rule>, span: Span) -> ParseResult<Expr> {
        let object = Box::new(object);
        match pair.as_rule() {
            Rule::call_suffix => {
                let mut type_args = Vec::new();
                let mut args = Vec::new();
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::type_args => type_args = self.type_args(p)?,
                        _ => args = self.arguments(p)?,
                    }
                }
                Ok(Expr::Call(CallExpr {
                    callee: object,
                    type_args,
                    args,
                    optional: false,
                    span,
                }))
            }
            Rule::member_suffix => {
                let prop = make_ident(&self.inner(pair, span)?);
                Ok(Expr::Member(MemberExpr {
                    object,
                    prop,
                    optional: false,
                    span,
                }))
            }
            Rule::optional_suffix => {
                let part = self.inner(pair, span)?;
                match part.as_rule() {
                    Rule::identifier_name => Ok(Expr::Member(MemberExpr {
                        object,
                        prop: make_ident(&part),
                        optional: true,
                        span,
                    })),
                    Rule::arguments => Ok(Expr::Call(CallExpr {
                        callee: object,
                        type_args: Vec::new(),
                        args: self.arguments(part)?,
                        optional: true,
                        span,
                    })),
                    _ => Ok(Expr::Index(IndexExpr {
                        object,
                        index: Box::new(self.expression(part)?),
                        optional: true,
                        span,
                    })),
                }
            }
            Rule::index_suffix => {
                let index = self.expression(self.inner(pair, span)?)?;
                Ok(Expr::Index(IndexExpr {
                    object,
                    index: Box::new(index),
                    optional: false,
                    span,
                }))
            }
            Rule::non_null_suffix => Ok(Expr::NonNull(NonNullExpr { expr: object, span })),
            Rule::update_op => Ok(Expr::Update(UpdateExpr {
                op: if pair.as_str() == "++" {
                    UpdateOp::Increment
                } else {
                    UpdateOp::Decrement
                },
                prefix: false,
                arg: object,
                span,
            })),
            rule => Err(self.unexpected(rule, span)),
        }
    }

    fn new_expr(&self, pair: Pair<Rule>) -> ParseResult<Expr> {
        let span = get_span(&pair);
        let mut callee = None;
        let mut type_args = Vec::new();
        let mut args = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::new_callee => {
                    let callee_span = get_span(&p);
                    let mut parts = p.into_inner();
                    let head = self.require(parts.next(), "constructor", callee_span)?;
                    let mut expr = self.primary(head)?;
                    for suffix in parts {
                        let span = Span::new(callee_span.start, get_span(&suffix).end);
                        expr = self.apply_suffix(expr, suffix, span)?;
                    }
                    callee = Some(expr);
                }
                Rule::type_args => type_args = self.type_args(p)?,
                Rule::arguments => args = Some(self.arguments(p)?),
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        Ok(Expr::New(NewExpr {
            callee: Box::new(self.require(callee, "constructor", span)?),
            type_args,
            args,
            span,
        }))
    }

    fn primary(&self, pair: Pair<Rule>) -> ParseResult<Expr> {
        let span = get_span(&pair);
        match pair.as_rule() {
            Rule::identifier => Ok(Expr::Ident(make_ident(&pair))),
            Rule::this_expr => Ok(Expr::This(span)),
            Rule::string => Ok(Expr::Lit(Lit::Str(self.string(pair)?))),
            Rule::number => Ok(Expr::Lit(Lit::Num(self.number(pair)?))),
            Rule::boolean_lit => Ok(Expr::Lit(Lit::Bool(pair.as_str() == "true", span))),
            Rule::null_lit => Ok(Expr::Lit(Lit::Null(span))),
            Rule::template => self.template(pair).map(Expr::Template),
            Rule::paren_expr => {
                let expr = self.expression(self.inner(pair, span)?)?;
                Ok(Expr::Paren(ParenExpr {
                    expr: Box::new(expr),
                    span,
                }))
            }
            Rule::function_expr => {
                let (ident, function) = self.function_parts(pair)?;
                Ok(Expr::Function(FunctionExpr {
                    ident,
                    function,
                    span,
                }))
            }
            Rule::array_lit => {
                let elems = pair
                    .into_inner()
                    .map(|p| self.argument(p))
                    .collect::<ParseResult<Vec<_>>>()?;
                Ok(Expr::Array(ArrayLit { elems, span }))
            }
            Rule::object_lit => {
                let props = pair
                    .into_inner()
                    .map(|p| self.prop(p))
                    .collect::<ParseResult<Vec<_>>>()?;
                Ok(Expr::Object(ObjectLit { props, span }))
            }
            rule => Err(self.unexpected(rule, span)),
        }
    }

    fn template(&self, pair: Pair<Rule>) -> ParseResult<Template> {
        let span = get_span(&pair);
        let mut quasis = Vec::new();
        let mut exprs = Vec::new();
        let mut current = String::new();
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::template_chars => current.push_str(p.as_str()),
                _ => {
                    quasis.push(std::mem::take(&mut current));
                    let sub_span = get_span(&p);
                    exprs.push(self.expression(self.inner(p, sub_span)?)?);
                }
            }
        }
        quasis.push(current);
        Ok(Template {
            quasis,
            exprs,
            span,
        })
    }

    fn prop(&self, pair: Pair<Rule>) -> ParseResult<Prop> {
        let span = get_span(&pair);
        match pair.as_rule() {
            Rule::spread => Ok(Prop::Spread(self.first_expr(pair, span)?)),
            Rule::shorthand_prop => Ok(Prop::Shorthand(make_ident(&self.inner(pair, span)?))),
            Rule::key_value => {
                let mut inner = pair.into_inner();
                let key = self.property_key(self.require(inner.next(), "property key", span)?)?;
                let value = self.assignment(self.require(inner.next(), "property value", span)?)?;
                Ok(Prop::KeyValue { key, value })
            }
            Rule::method_prop => {
                let mut key = None;
                let mut function = Function {
                    type_params: Vec::new(),
                    params: Vec::new(),
                    return_type: None,
                    body: None,
                    span,
                };
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::property_key => key = Some(self.property_key(p)?),
                        Rule::function_sig => self.function_sig(p, &mut function)?,
                        _ => function.body = Some(self.block(p)?),
                    }
                }
                Ok(Prop::Method {
                    key: self.require(key, "method name", span)?,
                    function,
                })
            }
            rule => Err(self.unexpected(rule, span)),
        }
    }

    fn property_key(&self, pair: Pair<Rule>) -> ParseResult<PropKey> {
        let span = get_span(&pair);
        let key = self.inner(pair, span)?;
        match key.as_rule() {
            Rule::identifier_name => Ok(PropKey::Ident(make_ident(&key))),
            Rule::string => Ok(PropKey::Str(self.string(key)?)),
            Rule::number => Ok(PropKey::Num(self.number(key)?)),
            _ => Ok(PropKey::Computed(Box::new(self.first_expr(key, span)?))),
        }
    }

    fn arguments(&self, pair: Pair<Rule>) -> ParseResult<Vec<ExprOrSpread>> {
        pair.into_inner().map(|p| self.argument(p)).collect()
    }

    fn argument(&self, pair: Pair<Rule>) -> ParseResult<ExprOrSpread> {
        let span = get_span(&pair);
        match pair.as_rule() {
            Rule::spread => Ok(ExprOrSpread {
                spread: true,
                expr: self.first_expr(pair, span)?,
            }),
            _ => Ok(ExprOrSpread {
                spread: false,
                expr: self.assignment(pair)?,
            }),
        }
    }

    fn arrow_function(&self, pair: Pair<Rule>) -> ParseResult<Expr> {
        let span = get_span(&pair);
        let mut type_params = Vec::new();
        let mut params = Vec::new();
        let mut return_type = None;
        let mut body = None;
        for p in pair.into_inner() {
            match p.as_rule() {
                Rule::type_params => type_params = self.type_params(p)?,
                Rule::arrow_params => {
                    for part in p.into_inner() {
                        match part.as_rule() {
                            Rule::identifier => params.push(Param {
                                rest: false,
                                name: make_ident(&part),
                                optional: false,
                                type_ann: None,
                                default: None,
                                span: get_span(&part),
                            }),
                            _ => params = self.params(part)?,
                        }
                    }
                }
                Rule::return_type => {
                    let ret_span = get_span(&p);
                    return_type = Some(self.type_expr(self.inner(p, ret_span)?)?);
                }
                Rule::arrow_body => {
                    let body_span = get_span(&p);
                    let part = self.inner(p, body_span)?;
                    body = Some(match part.as_rule() {
                        Rule::block => ArrowBody::Block(self.block(part)?),
                        _ => ArrowBody::Expr(Box::new(self.assignment(part)?)),
                    });
                }
                rule => return Err(self.unexpected(rule, span)),
            }
        }
        Ok(Expr::Arrow(ArrowExpr {
            type_params,
            params,
            return_type,
            body: self.require(body, "arrow body", span)?,
            span,
        }))
    }

    // ========================================================================
    // LITERALS
    // ========================================================================

    fn string(&self, pair: Pair<Rule>) -> ParseResult<Str> {
        let span = get_span(&pair);
        let raw = pair.as_str().to_string();
        let chars = self.inner(pair, span)?;
        Ok(Str {
            value: unescape(chars.as_str()),
            raw: Some(raw),
            span,
        })
    }

    fn number(&self, pair: Pair<Rule>) -> ParseResult<Number> {
        let span = get_span(&pair);
        let raw = pair.as_str();
        let value = parse_number(raw).ok_or_else(|| {
            self.error(format!("invalid number literal `{raw}`"), span)
        })?;
        Ok(Number {
            value,
            raw: Some(raw.to_string()),
            span,
        })
    }

    // ========================================================================
    // TYPE BUILDERS
    // ========================================================================

    fn type_annotation(&self, pair: Pair<Rule>) -> ParseResult<TypeNode> {
        let span = get_span(&pair);
        self.type_expr(self.inner(pair, span)?)
    }

    fn type_expr(&self, pair: Pair<Rule>) -> ParseResult<TypeNode> {
        let span = get_span(&pair);
        match pair.as_rule() {
            Rule::type_expr | Rule::type_constraint | Rule::type_default => {
                self.type_expr(self.inner(pair, span)?)
            }
            _ => self.type_node(pair),
        }
    }

    fn type_node(&self, pair: Pair<Rule>) -> ParseResult<TypeNode> {
        let span = get_span(&pair);
        match pair.as_rule() {
            Rule::type_expr => self.type_expr(pair),
            Rule::function_type => {
                let mut type_params = Vec::new();
                let mut params = Vec::new();
                let mut ret = None;
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::type_params => type_params = self.type_params(p)?,
                        Rule::params => params = self.params(p)?,
                        _ => ret = Some(self.type_expr(p)?),
                    }
                }
                Ok(TypeNode::Function {
                    type_params,
                    params,
                    ret: Box::new(self.require(ret, "return type", span)?),
                    span,
                })
            }
            Rule::union_type | Rule::intersection_type => {
                let rule = pair.as_rule();
                let mut members = pair
                    .into_inner()
                    .map(|p| self.type_node(p))
                    .collect::<ParseResult<Vec<_>>>()?;
                if members.len() == 1 {
                    return self.require(members.pop(), "type", span);
                }
                if rule == Rule::union_type {
                    Ok(TypeNode::Union(members, span))
                } else {
                    Ok(TypeNode::Intersection(members, span))
                }
            }
            Rule::array_type => {
                let mut inner = pair.into_inner();
                let mut ty = self.type_node(self.require(inner.next(), "element type", span)?)?;
                for suffix in inner {
                    let span = Span::new(span.start, get_span(&suffix).end);
                    ty = TypeNode::Array(Box::new(ty), span);
                }
                Ok(ty)
            }
            Rule::paren_type => {
                let ty = self.type_expr(self.inner(pair, span)?)?;
                Ok(TypeNode::Paren(Box::new(ty), span))
            }
            Rule::object_type => Ok(TypeNode::Object(self.type_members(pair)?, span)),
            Rule::tuple_type => {
                let elems = pair
                    .into_inner()
                    .map(|p| self.type_expr(p))
                    .collect::<ParseResult<Vec<_>>>()?;
                Ok(TypeNode::Tuple(elems, span))
            }
            Rule::typeof_type => {
                let name = self.qualified_name(self.inner(pair, span)?);
                Ok(TypeNode::TypeOf(name, span))
            }
            Rule::literal_type => {
                let lit = self.inner(pair, span)?;
                let lit_span = get_span(&lit);
                let lit = match lit.as_rule() {
                    Rule::string => Lit::Str(self.string(lit)?),
                    Rule::number => Lit::Num(self.number(lit)?),
                    _ => Lit::Bool(lit.as_str() == "true", lit_span),
                };
                Ok(TypeNode::Lit(lit))
            }
            Rule::type_ref => {
                let mut name = Vec::new();
                let mut args = Vec::new();
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::qualified_name => name = self.qualified_name(p),
                        _ => args = self.type_args(p)?,
                    }
                }
                Ok(TypeNode::Ref { name, args, span })
            }
            rule => Err(self.unexpected(rule, span)),
        }
    }

    fn qualified_name(&self, pair: Pair<Rule>) -> Vec<Ident> {
        pair.into_inner().map(|p| make_ident(&p)).collect()
    }

    fn type_args(&self, pair: Pair<Rule>) -> ParseResult<Vec<TypeNode>> {
        pair.into_inner().map(|p| self.type_expr(p)).collect()
    }

    fn type_params(&self, pair: Pair<Rule>) -> ParseResult<Vec<TypeParam>> {
        let mut params = Vec::new();
        for p in pair.into_inner() {
            let span = get_span(&p);
            let mut name = None;
            let mut constraint = None;
            let mut default = None;
            for part in p.into_inner() {
                match part.as_rule() {
                    Rule::identifier => name = Some(make_ident(&part)),
                    Rule::type_constraint => constraint = Some(self.type_expr(part)?),
                    _ => default = Some(self.type_expr(part)?),
                }
            }
            params.push(TypeParam {
                name: self.require(name, "type parameter name", span)?,
                constraint,
                default,
            });
        }
        Ok(params)
    }

    fn type_members(&self, pair: Pair<Rule>) -> ParseResult<Vec<TypeMember>> {
        pair.into_inner().map(|p| self.type_member(p)).collect()
    }

    fn type_member(&self, pair: Pair<Rule>) -> ParseResult<TypeMember> {
        let span = get_span(&pair);
        match pair.as_rule() {
            Rule::index_signature => {
                let mut readonly = false;
                let mut param = None;
                let mut key_ty = None;
                let mut ty = None;
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::readonly_mod => readonly = true,
                        Rule::identifier => param = Some(make_ident(&p)),
                        Rule::type_expr => key_ty = Some(self.type_expr(p)?),
                        _ => ty = Some(self.type_annotation(p)?),
                    }
                }
                Ok(TypeMember::Index {
                    readonly,
                    param: self.require(param, "index parameter", span)?,
                    key_ty: self.require(key_ty, "index type", span)?,
                    ty: self.require(ty, "value type", span)?,
                    span,
                })
            }
            Rule::method_signature => {
                let mut key = None;
                let mut optional = false;
                let mut function = Function {
                    type_params: Vec::new(),
                    params: Vec::new(),
                    return_type: None,
                    body: None,
                    span,
                };
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::property_key => key = Some(self.property_key(p)?),
                        Rule::optional_marker => optional = true,
                        _ => self.function_sig(p, &mut function)?,
                    }
                }
                Ok(TypeMember::Method {
                    key: self.require(key, "method name", span)?,
                    optional,
                    type_params: function.type_params,
                    params: function.params,
                    ret: function.return_type,
                    span,
                })
            }
            Rule::property_signature => {
                let mut readonly = false;
                let mut key = None;
                let mut optional = false;
                let mut ty = None;
                for p in pair.into_inner() {
                    match p.as_rule() {
                        Rule::readonly_mod => readonly = true,
                        Rule::property_key => key = Some(self.property_key(p)?),
                        Rule::optional_marker => optional = true,
                        _ => ty = Some(self.type_annotation(p)?),
                    }
                }
                Ok(TypeMember::Property {
                    readonly,
                    key: self.require(key, "property name", span)?,
                    optional,
                    ty,
                    span,
                })
            }
            rule => Err(self.unexpected(rule, span)),
        }
    }

    // ========================================================================
    // ERROR HANDLING
    // ========================================================================

    fn inner<'i>(&self, pair: Pair<'i, Rule>, span: Span) -> ParseResult<Pair<'i, Rule>> {
        pair.into_inner()
            .next()
            .ok_or_else(|| self.error("malformed syntax tree", span))
    }

    fn require<T>(&self, value: Option<T>, what: &str, span: Span) -> ParseResult<T> {
        value.ok_or_else(|| self.error(format!("missing {what}"), span))
    }

    fn unexpected(&self, rule: Rule, span: Span) -> TransformError {
        self.error(format!("unexpected {rule:?}"), span)
    }

    fn error(&self, message: impl Into<String>, span: Span) -> TransformError {
        let source = to_error_source(self.name, self.text);
        err_ctx!(Parse, message.into(), &source, span)
    }

    fn convert_parse_error(&self, error: Error<Rule>) -> TransformError {
        let span = match error.location {
            InputLocation::Pos(pos) => Span::new(pos, pos),
            InputLocation::Span((start, end)) => Span::new(start, end),
        };
        let (line, column) = match error.line_col {
            pest::error::LineColLocation::Pos(pos) => pos,
            pest::error::LineColLocation::Span(start, _) => start,
        };
        let message = format!("syntax error at {}:{}:{}", self.name, line, column);
        self.error(message, span)
            .with_help(error.variant.message().to_string())
    }
}

enum BinaryItem {
    Operand(Expr),
    Operator(BinaryOp),
    Cast(TypeNode, Span),
}

// ============================================================================
// UTILITIES
// ============================================================================

/// The pair's span without the trailing whitespace pest folds into rules ending in repetitions.
fn get_span(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    let trimmed = span
        .as_str()
        .trim_end_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    Span::new(span.start(), span.start() + trimmed.len())
}

fn make_ident(pair: &Pair<Rule>) -> Ident {
    Ident {
        name: pair.as_str().to_string(),
        span: get_span(pair),
    }
}

fn var_kind(pair: &Pair<Rule>) -> VarKind {
    match pair.as_str() {
        "let" => VarKind::Let,
        "var" => VarKind::Var,
        _ => VarKind::Const,
    }
}

fn unary_op(token: &str) -> Option<UnaryOp> {
    let op = match token {
        "!" => UnaryOp::Not,
        "-" => UnaryOp::Minus,
        "+" => UnaryOp::Plus,
        "~" => UnaryOp::Tilde,
        "typeof" => UnaryOp::TypeOf,
        "void" => UnaryOp::Void,
        "delete" => UnaryOp::Delete,
        _ => return None,
    };
    Some(op)
}

fn is_assignment_target(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_) | Expr::Member(_) | Expr::Index(_) => true,
        Expr::Paren(p) => is_assignment_target(&p.expr),
        Expr::NonNull(e) => is_assignment_target(&e.expr),
        Expr::As(e) => is_assignment_target(&e.expr),
        _ => false,
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '_').collect();
    let radix = match cleaned.get(..2) {
        Some("0x" | "0X") => 16,
        Some("0b" | "0B") => 2,
        Some("0o" | "0O") => 8,
        _ => return cleaned.parse::<f64>().ok(),
    };
    u64::from_str_radix(&cleaned[2..], radix).ok().map(|v| v as f64)
}

/// Resolves escape sequences of a string literal body.
fn unescape(body: &str) -> String {
    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('b') => result.push('\u{8}'),
            Some('f') => result.push('\u{c}'),
            Some('v') => result.push('\u{b}'),
            Some('0') => result.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                push_code_point(&mut result, &hex);
            }
            Some('u') => {
                let hex: String = if chars.peek() == Some(&'{') {
                    chars.next();
                    chars.by_ref().take_while(|c| *c != '}').collect()
                } else {
                    chars.by_ref().take(4).collect()
                };
                push_code_point(&mut result, &hex);
            }
            Some('\n') => {}
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

fn push_code_point(out: &mut String, hex: &str) {
    match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
        Some(c) => out.push(c),
        None => out.push(char::REPLACEMENT_CHARACTER),
    }
}
