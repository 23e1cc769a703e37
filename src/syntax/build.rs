//! Constructors for synthesized nodes. Everything built here carries [`Span::DUMMY`].

use crate::syntax::ast::*;
use crate::syntax::Span;

pub fn ident(name: &str) -> Expr {
    Expr::Ident(ident_node(name))
}

pub fn ident_node(name: &str) -> Ident {
    Ident {
        name: name.to_string(),
        span: Span::DUMMY,
    }
}

pub fn string(value: impl Into<String>) -> Expr {
    Expr::Lit(Lit::Str(str_node(value)))
}

pub fn str_node(value: impl Into<String>) -> Str {
    Str {
        value: value.into(),
        raw: None,
        span: Span::DUMMY,
    }
}

pub fn number(value: f64) -> Expr {
    Expr::Lit(Lit::Num(Number {
        value,
        raw: None,
        span: Span::DUMMY,
    }))
}

pub fn arg(expr: Expr) -> ExprOrSpread {
    ExprOrSpread {
        spread: false,
        expr,
    }
}

pub fn call(callee: Expr, args: Vec<ExprOrSpread>) -> Expr {
    Expr::Call(CallExpr {
        callee: Box::new(callee),
        type_args: Vec::new(),
        args,
        optional: false,
        span: Span::DUMMY,
    })
}

pub fn unary(op: UnaryOp, arg: Expr) -> Expr {
    Expr::Unary(UnaryExpr {
        op,
        arg: Box::new(arg),
        span: Span::DUMMY,
    })
}

/// `void 0`
pub fn void_zero() -> Expr {
    unary(UnaryOp::Void, number(0.0))
}

pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary(BinaryExpr {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span: Span::DUMMY,
    })
}

pub fn paren(expr: Expr) -> Expr {
    Expr::Paren(ParenExpr {
        expr: Box::new(expr),
        span: Span::DUMMY,
    })
}

/// Comma expression, or the single expression itself.
pub fn seq(mut exprs: Vec<Expr>) -> Expr {
    if exprs.len() == 1 {
        if let Some(expr) = exprs.pop() {
            return expr;
        }
    }
    Expr::Seq(SeqExpr {
        exprs,
        span: Span::DUMMY,
    })
}

pub fn param(name: &str) -> Param {
    Param {
        rest: false,
        name: ident_node(name),
        optional: false,
        type_ann: None,
        default: None,
        span: Span::DUMMY,
    }
}

/// Arrow function with an expression body.
pub fn arrow(params: Vec<&str>, body: Expr) -> Expr {
    Expr::Arrow(ArrowExpr {
        type_params: Vec::new(),
        params: params.into_iter().map(param).collect(),
        return_type: None,
        body: ArrowBody::Expr(Box::new(body)),
        span: Span::DUMMY,
    })
}

/// Arrow function with a block body.
pub fn arrow_block(params: Vec<&str>, stmts: Vec<Stmt>) -> Expr {
    Expr::Arrow(ArrowExpr {
        type_params: Vec::new(),
        params: params.into_iter().map(param).collect(),
        return_type: None,
        body: ArrowBody::Block(Block {
            stmts,
            span: Span::DUMMY,
        }),
        span: Span::DUMMY,
    })
}

/// Object literal with identifier keys, in the given order.
pub fn object(props: Vec<(&str, Expr)>) -> Expr {
    Expr::Object(ObjectLit {
        props: props
            .into_iter()
            .map(|(key, value)| Prop::KeyValue {
                key: PropKey::Ident(ident_node(key)),
                value,
            })
            .collect(),
        span: Span::DUMMY,
    })
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr(ExprStmt {
        expr,
        span: Span::DUMMY,
    })
}

pub fn return_stmt(expr: Expr) -> Stmt {
    Stmt::Return(ReturnStmt {
        arg: Some(expr),
        span: Span::DUMMY,
    })
}

/// `export {};`
pub fn empty_export() -> Stmt {
    Stmt::ExportNamed(NamedExport {
        type_only: false,
        specifiers: Vec::new(),
        source: None,
        span: Span::DUMMY,
    })
}
