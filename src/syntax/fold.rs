//! Owned, fallible tree folding.
//!
//! A [`Fold`] consumes a tree and returns a new one. The default methods rebuild every node from
//! its folded children through the `walk_*` functions; implementors override the hooks they care
//! about and call back into `walk_*` to keep descending. Expressions are folded together with the
//! [`ExprContext`] of the position they occupy.

use crate::syntax::ast::*;

/// Where an expression sits relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprContext {
    /// The complete expression of an expression statement; its value is discarded.
    Statement,
    /// Operand of an operator, callee, member object or conditional test. A replacement here
    /// must bind at least as tightly as a member expression.
    Operand,
    /// Any other position: arguments, initializers, elements, return values, bodies.
    Free,
}

pub trait Fold {
    type Error;

    fn fold_module(&mut self, module: Module) -> Result<Module, Self::Error> {
        walk_module(self, module)
    }

    fn fold_stmt(&mut self, stmt: Stmt) -> Result<Stmt, Self::Error> {
        walk_stmt(self, stmt)
    }

    fn fold_expr(&mut self, expr: Expr, _ctx: ExprContext) -> Result<Expr, Self::Error> {
        walk_expr(self, expr)
    }
}

// ============================================================================
// STATEMENTS
// ============================================================================

pub fn walk_module<F: Fold + ?Sized>(f: &mut F, module: Module) -> Result<Module, F::Error> {
    let body = fold_stmts(f, module.body)?;
    Ok(Module {
        body,
        span: module.span,
    })
}

fn fold_stmts<F: Fold + ?Sized>(f: &mut F, stmts: Vec<Stmt>) -> Result<Vec<Stmt>, F::Error> {
    stmts.into_iter().map(|s| f.fold_stmt(s)).collect()
}

fn fold_boxed_stmt<F: Fold + ?Sized>(f: &mut F, stmt: Box<Stmt>) -> Result<Box<Stmt>, F::Error> {
    Ok(Box::new(f.fold_stmt(*stmt)?))
}

pub fn walk_block<F: Fold + ?Sized>(f: &mut F, block: Block) -> Result<Block, F::Error> {
    Ok(Block {
        stmts: fold_stmts(f, block.stmts)?,
        span: block.span,
    })
}

fn fold_opt<F: Fold + ?Sized>(
    f: &mut F,
    expr: Option<Expr>,
    ctx: ExprContext,
) -> Result<Option<Expr>, F::Error> {
    expr.map(|e| f.fold_expr(e, ctx)).transpose()
}

fn fold_declarators<F: Fold + ?Sized>(
    f: &mut F,
    decls: Vec<VarDeclarator>,
) -> Result<Vec<VarDeclarator>, F::Error> {
    decls
        .into_iter()
        .map(|d| {
            Ok(VarDeclarator {
                init: fold_opt(f, d.init, ExprContext::Free)?,
                ..d
            })
        })
        .collect()
}

pub fn walk_stmt<F: Fold + ?Sized>(f: &mut F, stmt: Stmt) -> Result<Stmt, F::Error> {
    let stmt = match stmt {
        Stmt::Import(_)
        | Stmt::ExportNamed(_)
        | Stmt::ExportAll(_)
        | Stmt::TypeAlias(_)
        | Stmt::Interface(_)
        | Stmt::Break(_)
        | Stmt::Continue(_)
        | Stmt::Empty(_) => stmt,
        Stmt::ExportDefault(s) => Stmt::ExportDefault(ExportDefault {
            expr: f.fold_expr(s.expr, ExprContext::Free)?,
            span: s.span,
        }),
        Stmt::Function(decl) => Stmt::Function(FunctionDecl {
            function: walk_function(f, decl.function)?,
            ..decl
        }),
        Stmt::Var(var) => Stmt::Var(VarDecl {
            decls: fold_declarators(f, var.decls)?,
            ..var
        }),
        Stmt::Expr(s) => Stmt::Expr(ExprStmt {
            expr: f.fold_expr(s.expr, ExprContext::Statement)?,
            span: s.span,
        }),
        Stmt::Block(block) => Stmt::Block(walk_block(f, block)?),
        Stmt::If(s) => Stmt::If(IfStmt {
            test: f.fold_expr(s.test, ExprContext::Free)?,
            cons: fold_boxed_stmt(f, s.cons)?,
            alt: s.alt.map(|alt| fold_boxed_stmt(f, alt)).transpose()?,
            span: s.span,
        }),
        Stmt::While(s) => Stmt::While(WhileStmt {
            test: f.fold_expr(s.test, ExprContext::Free)?,
            body: fold_boxed_stmt(f, s.body)?,
            span: s.span,
        }),
        Stmt::For(s) => {
            let init = match s.init {
                Some(ForInit::Var(kind, decls)) => {
                    Some(ForInit::Var(kind, fold_declarators(f, decls)?))
                }
                Some(ForInit::Expr(expr)) => {
                    Some(ForInit::Expr(f.fold_expr(expr, ExprContext::Free)?))
                }
                None => None,
            };
            Stmt::For(ForStmt {
                init,
                test: fold_opt(f, s.test, ExprContext::Free)?,
                update: fold_opt(f, s.update, ExprContext::Free)?,
                body: fold_boxed_stmt(f, s.body)?,
                span: s.span,
            })
        }
        Stmt::ForIn(s) => Stmt::ForIn(ForInStmt {
            right: f.fold_expr(s.right, ExprContext::Free)?,
            body: fold_boxed_stmt(f, s.body)?,
            ..s
        }),
        Stmt::Try(s) => Stmt::Try(TryStmt {
            block: walk_block(f, s.block)?,
            handler: s
                .handler
                .map(|h| {
                    Ok::<_, F::Error>(CatchClause {
                        body: walk_block(f, h.body)?,
                        ..h
                    })
                })
                .transpose()?,
            finalizer: s.finalizer.map(|b| walk_block(f, b)).transpose()?,
            span: s.span,
        }),
        Stmt::Return(s) => Stmt::Return(ReturnStmt {
            arg: fold_opt(f, s.arg, ExprContext::Free)?,
            span: s.span,
        }),
        Stmt::Throw(s) => Stmt::Throw(ThrowStmt {
            arg: f.fold_expr(s.arg, ExprContext::Free)?,
            span: s.span,
        }),
    };
    Ok(stmt)
}

fn walk_params<F: Fold + ?Sized>(f: &mut F, params: Vec<Param>) -> Result<Vec<Param>, F::Error> {
    params
        .into_iter()
        .map(|p| {
            Ok(Param {
                default: fold_opt(f, p.default, ExprContext::Free)?,
                ..p
            })
        })
        .collect()
}

pub fn walk_function<F: Fold + ?Sized>(f: &mut F, function: Function) -> Result<Function, F::Error> {
    Ok(Function {
        params: walk_params(f, function.params)?,
        body: function.body.map(|b| walk_block(f, b)).transpose()?,
        ..function
    })
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

fn fold_box<F: Fold + ?Sized>(
    f: &mut F,
    expr: Box<Expr>,
    ctx: ExprContext,
) -> Result<Box<Expr>, F::Error> {
    Ok(Box::new(f.fold_expr(*expr, ctx)?))
}

pub fn walk_args<F: Fold + ?Sized>(
    f: &mut F,
    args: Vec<ExprOrSpread>,
) -> Result<Vec<ExprOrSpread>, F::Error> {
    args.into_iter()
        .map(|a| {
            Ok(ExprOrSpread {
                spread: a.spread,
                expr: f.fold_expr(a.expr, ExprContext::Free)?,
            })
        })
        .collect()
}

fn walk_prop_key<F: Fold + ?Sized>(f: &mut F, key: PropKey) -> Result<PropKey, F::Error> {
    match key {
        PropKey::Computed(expr) => Ok(PropKey::Computed(fold_box(f, expr, ExprContext::Free)?)),
        key => Ok(key),
    }
}

/// Rebuilds `expr` from its folded children. Does not call `fold_expr` on `expr` itself.
pub fn walk_expr<F: Fold + ?Sized>(f: &mut F, expr: Expr) -> Result<Expr, F::Error> {
    use ExprContext::{Free, Operand};

    let expr = match expr {
        Expr::Ident(_) | Expr::This(_) | Expr::Lit(_) => expr,
        Expr::Template(t) => Expr::Template(Template {
            exprs: t
                .exprs
                .into_iter()
                .map(|e| f.fold_expr(e, Free))
                .collect::<Result<_, _>>()?,
            ..t
        }),
        Expr::Array(a) => Expr::Array(ArrayLit {
            elems: walk_args(f, a.elems)?,
            span: a.span,
        }),
        Expr::Object(o) => {
            let props = o
                .props
                .into_iter()
                .map(|p| -> Result<Prop, F::Error> {
                    let prop = match p {
                        Prop::KeyValue { key, value } => Prop::KeyValue {
                            key: walk_prop_key(f, key)?,
                            value: f.fold_expr(value, Free)?,
                        },
                        Prop::Shorthand(ident) => Prop::Shorthand(ident),
                        Prop::Method { key, function } => Prop::Method {
                            key: walk_prop_key(f, key)?,
                            function: walk_function(f, function)?,
                        },
                        Prop::Spread(expr) => Prop::Spread(f.fold_expr(expr, Free)?),
                    };
                    Ok(prop)
                })
                .collect::<Result<_, _>>()?;
            Expr::Object(ObjectLit {
                props,
                span: o.span,
            })
        }
        Expr::Paren(p) => Expr::Paren(ParenExpr {
            expr: fold_box(f, p.expr, Free)?,
            span: p.span,
        }),
        Expr::Call(c) => Expr::Call(CallExpr {
            callee: fold_box(f, c.callee, Operand)?,
            args: walk_args(f, c.args)?,
            ..c
        }),
        Expr::New(n) => Expr::New(NewExpr {
            callee: fold_box(f, n.callee, Operand)?,
            args: n.args.map(|args| walk_args(f, args)).transpose()?,
            ..n
        }),
        Expr::Member(m) => Expr::Member(MemberExpr {
            object: fold_box(f, m.object, Operand)?,
            ..m
        }),
        Expr::Index(i) => Expr::Index(IndexExpr {
            object: fold_box(f, i.object, Operand)?,
            index: fold_box(f, i.index, Free)?,
            ..i
        }),
        Expr::Unary(u) => Expr::Unary(UnaryExpr {
            arg: fold_box(f, u.arg, Operand)?,
            ..u
        }),
        Expr::Update(u) => Expr::Update(UpdateExpr {
            arg: fold_box(f, u.arg, Operand)?,
            ..u
        }),
        Expr::Binary(b) => Expr::Binary(BinaryExpr {
            left: fold_box(f, b.left, Operand)?,
            right: fold_box(f, b.right, Operand)?,
            ..b
        }),
        Expr::Assign(a) => Expr::Assign(AssignExpr {
            target: fold_box(f, a.target, Operand)?,
            value: fold_box(f, a.value, Free)?,
            ..a
        }),
        Expr::Cond(c) => Expr::Cond(CondExpr {
            test: fold_box(f, c.test, Operand)?,
            cons: fold_box(f, c.cons, Free)?,
            alt: fold_box(f, c.alt, Free)?,
            span: c.span,
        }),
        Expr::Seq(s) => Expr::Seq(SeqExpr {
            exprs: s
                .exprs
                .into_iter()
                .map(|e| f.fold_expr(e, Free))
                .collect::<Result<_, _>>()?,
            span: s.span,
        }),
        Expr::Arrow(a) => {
            let body = match a.body {
                ArrowBody::Block(block) => ArrowBody::Block(walk_block(f, block)?),
                ArrowBody::Expr(expr) => ArrowBody::Expr(fold_box(f, expr, Free)?),
            };
            Expr::Arrow(ArrowExpr {
                params: walk_params(f, a.params)?,
                body,
                ..a
            })
        }
        Expr::Function(func) => Expr::Function(FunctionExpr {
            function: walk_function(f, func.function)?,
            ..func
        }),
        Expr::As(a) => Expr::As(AsExpr {
            expr: fold_box(f, a.expr, Operand)?,
            ..a
        }),
        Expr::NonNull(n) => Expr::NonNull(NonNullExpr {
            expr: fold_box(f, n.expr, Operand)?,
            span: n.span,
        }),
    };
    Ok(expr)
}
