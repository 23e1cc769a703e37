//! Syntax tree for the TypeScript subset the expander reads and writes.
//!
//! Every node carries a [`Span`] into the text of the file it was parsed from. Nodes built by the
//! rewrite rules carry [`Span::DUMMY`]; forwarded original nodes keep their spans, which is what
//! lets labels and diagnostics point back at the original source text.

use serde::{Deserialize, Serialize};

use crate::syntax::Span;

// ============================================================================
// MODULE & STATEMENTS
// ============================================================================

/// A parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    Import(ImportDecl),
    ExportNamed(NamedExport),
    ExportAll(ExportAll),
    ExportDefault(ExportDefault),
    Function(FunctionDecl),
    Var(VarDecl),
    TypeAlias(TypeAliasDecl),
    Interface(InterfaceDecl),
    Expr(ExprStmt),
    Block(Block),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    ForIn(ForInStmt),
    Try(TryStmt),
    Return(ReturnStmt),
    Throw(ThrowStmt),
    Break(Span),
    Continue(Span),
    Empty(Span),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Import(s) => s.span,
            Stmt::ExportNamed(s) => s.span,
            Stmt::ExportAll(s) => s.span,
            Stmt::ExportDefault(s) => s.span,
            Stmt::Function(s) => s.span,
            Stmt::Var(s) => s.span,
            Stmt::TypeAlias(s) => s.span,
            Stmt::Interface(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::Block(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::ForIn(s) => s.span,
            Stmt::Try(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Throw(s) => s.span,
            Stmt::Break(span) | Stmt::Continue(span) | Stmt::Empty(span) => *span,
        }
    }
}

/// `import type? <clause> from "<source>"` or the side-effect form `import "<source>"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub type_only: bool,
    pub clause: Option<ImportClause>,
    pub source: Str,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportClause {
    pub default: Option<Ident>,
    pub bindings: Option<ImportBindings>,
}

impl ImportClause {
    /// Number of local names this clause introduces.
    pub fn binding_count(&self) -> usize {
        let named = match &self.bindings {
            Some(ImportBindings::Namespace(_)) => 1,
            Some(ImportBindings::Named(specifiers)) => specifiers.len(),
            None => 0,
        };
        named + usize::from(self.default.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImportBindings {
    Namespace(Ident),
    Named(Vec<ImportSpecifier>),
}

/// `local` or `imported as local`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportSpecifier {
    pub imported: Option<Ident>,
    pub local: Ident,
    pub span: Span,
}

impl ImportSpecifier {
    /// The exported name this specifier refers to in the source module.
    pub fn imported_name(&self) -> &str {
        self.imported.as_ref().unwrap_or(&self.local).name.as_str()
    }
}

/// `export type? { a, b as c } (from "<source>")?`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedExport {
    pub type_only: bool,
    pub specifiers: Vec<ExportSpecifier>,
    pub source: Option<Str>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSpecifier {
    pub local: Ident,
    pub exported: Option<Ident>,
    pub span: Span,
}

impl ExportSpecifier {
    pub fn exported_name(&self) -> &str {
        self.exported.as_ref().unwrap_or(&self.local).name.as_str()
    }
}

/// `export * (as name)? from "<source>"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportAll {
    pub alias: Option<Ident>,
    pub source: Str,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDefault {
    pub expr: Expr,
    pub span: Span,
}

/// `export` and `declare` prefixes of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub export: bool,
    pub declare: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub modifiers: Modifiers,
    pub ident: Ident,
    pub function: Function,
    pub span: Span,
}

/// Signature and optional body shared by declarations, expressions and methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeNode>,
    pub body: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub rest: bool,
    pub name: Ident,
    pub optional: bool,
    pub type_ann: Option<TypeNode>,
    pub default: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    Const,
    Let,
    Var,
}

impl VarKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VarKind::Const => "const",
            VarKind::Let => "let",
            VarKind::Var => "var",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub modifiers: Modifiers,
    pub kind: VarKind,
    pub decls: Vec<VarDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDeclarator {
    pub name: Ident,
    pub type_ann: Option<TypeNode>,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAliasDecl {
    pub modifiers: Modifiers,
    pub ident: Ident,
    pub type_params: Vec<TypeParam>,
    pub ty: TypeNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDecl {
    pub modifiers: Modifiers,
    pub ident: Ident,
    pub type_params: Vec<TypeParam>,
    pub extends: Vec<TypeNode>,
    pub body: Vec<TypeMember>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub test: Expr,
    pub cons: Box<Stmt>,
    pub alt: Option<Box<Stmt>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStmt {
    pub test: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForInit {
    Var(VarKind, Vec<VarDeclarator>),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    pub init: Option<ForInit>,
    pub test: Option<Expr>,
    pub update: Option<Expr>,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForInKind {
    In,
    Of,
}

/// `for (<kind> <binding> of|in <right>) <body>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForInStmt {
    pub var_kind: VarKind,
    pub binding: Ident,
    pub kind: ForInKind,
    pub right: Expr,
    pub body: Box<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryStmt {
    pub block: Block,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchClause {
    pub param: Option<Ident>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    pub arg: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThrowStmt {
    pub arg: Expr,
    pub span: Span,
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Ident(Ident),
    This(Span),
    Lit(Lit),
    Template(Template),
    Array(ArrayLit),
    Object(ObjectLit),
    Paren(ParenExpr),
    Call(CallExpr),
    New(NewExpr),
    Member(MemberExpr),
    Index(IndexExpr),
    Unary(UnaryExpr),
    Update(UpdateExpr),
    Binary(BinaryExpr),
    Assign(AssignExpr),
    Cond(CondExpr),
    Seq(SeqExpr),
    Arrow(ArrowExpr),
    Function(FunctionExpr),
    As(AsExpr),
    NonNull(NonNullExpr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Lit {
    Str(Str),
    Num(Number),
    Bool(bool, Span),
    Null(Span),
}

impl Lit {
    pub fn span(&self) -> Span {
        match self {
            Lit::Str(s) => s.span,
            Lit::Num(n) => n.span,
            Lit::Bool(_, span) | Lit::Null(span) => *span,
        }
    }
}

/// A string literal. `raw` keeps the original spelling (quotes included) for parsed literals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Str {
    pub value: String,
    pub raw: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Number {
    pub value: f64,
    pub raw: Option<String>,
    pub span: Span,
}

/// A template literal; `quasis` holds the raw text chunks around `exprs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub quasis: Vec<String>,
    pub exprs: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExprOrSpread {
    pub spread: bool,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayLit {
    pub elems: Vec<ExprOrSpread>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectLit {
    pub props: Vec<Prop>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Prop {
    KeyValue { key: PropKey, value: Expr },
    Shorthand(Ident),
    Method { key: PropKey, function: Function },
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropKey {
    Ident(Ident),
    Str(Str),
    Num(Number),
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParenExpr {
    pub expr: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpr {
    pub callee: Box<Expr>,
    pub type_args: Vec<TypeNode>,
    pub args: Vec<ExprOrSpread>,
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpr {
    pub callee: Box<Expr>,
    pub type_args: Vec<TypeNode>,
    pub args: Option<Vec<ExprOrSpread>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberExpr {
    pub object: Box<Expr>,
    pub prop: Ident,
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexExpr {
    pub object: Box<Expr>,
    pub index: Box<Expr>,
    pub optional: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    Tilde,
    TypeOf,
    Void,
    Delete,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Tilde => "~",
            UnaryOp::TypeOf => "typeof",
            UnaryOp::Void => "void",
            UnaryOp::Delete => "delete",
        }
    }

    pub fn is_word(self) -> bool {
        matches!(self, UnaryOp::TypeOf | UnaryOp::Void | UnaryOp::Delete)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub arg: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl UpdateOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UpdateOp::Increment => "++",
            UpdateOp::Decrement => "--",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateExpr {
    pub op: UpdateOp,
    pub prefix: bool,
    pub arg: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    NullishCoalescing,
    LogicalOr,
    LogicalAnd,
    BitOr,
    BitXor,
    BitAnd,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    InstanceOf,
    In,
    LShift,
    RShift,
    ZeroFillRShift,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
}

impl BinaryOp {
    pub fn from_token(token: &str) -> Option<Self> {
        use BinaryOp::*;
        let op = match token {
            "??" => NullishCoalescing,
            "||" => LogicalOr,
            "&&" => LogicalAnd,
            "|" => BitOr,
            "^" => BitXor,
            "&" => BitAnd,
            "==" => EqEq,
            "!=" => NotEq,
            "===" => EqEqEq,
            "!==" => NotEqEq,
            "<" => Lt,
            "<=" => LtEq,
            ">" => Gt,
            ">=" => GtEq,
            "instanceof" => InstanceOf,
            "in" => In,
            "<<" => LShift,
            ">>" => RShift,
            ">>>" => ZeroFillRShift,
            "+" => Add,
            "-" => Sub,
            "*" => Mul,
            "/" => Div,
            "%" => Mod,
            "**" => Exp,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(self) -> &'static str {
        use BinaryOp::*;
        match self {
            NullishCoalescing => "??",
            LogicalOr => "||",
            LogicalAnd => "&&",
            BitOr => "|",
            BitXor => "^",
            BitAnd => "&",
            EqEq => "==",
            NotEq => "!=",
            EqEqEq => "===",
            NotEqEq => "!==",
            Lt => "<",
            LtEq => "<=",
            Gt => ">",
            GtEq => ">=",
            InstanceOf => "instanceof",
            In => "in",
            LShift => "<<",
            RShift => ">>",
            ZeroFillRShift => ">>>",
            Add => "+",
            Sub => "-",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Exp => "**",
        }
    }

    /// Binding power, higher binds tighter. `as` casts share [`BinaryOp::RELATIONAL`].
    pub fn precedence(self) -> u8 {
        use BinaryOp::*;
        match self {
            NullishCoalescing => 1,
            LogicalOr => 2,
            LogicalAnd => 3,
            BitOr => 4,
            BitXor => 5,
            BitAnd => 6,
            EqEq | NotEq | EqEqEq | NotEqEq => 7,
            Lt | LtEq | Gt | GtEq | InstanceOf | In => Self::RELATIONAL,
            LShift | RShift | ZeroFillRShift => 9,
            Add | Sub => 10,
            Mul | Div | Mod => 11,
            Exp => 12,
        }
    }

    pub const RELATIONAL: u8 = 8;

    pub fn is_right_associative(self) -> bool {
        self == BinaryOp::Exp
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ExpAssign,
    LShiftAssign,
    RShiftAssign,
    ZeroFillRShiftAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    AndAssign,
    OrAssign,
    NullishAssign,
}

impl AssignOp {
    pub fn from_token(token: &str) -> Option<Self> {
        use AssignOp::*;
        let op = match token {
            "=" => Assign,
            "+=" => AddAssign,
            "-=" => SubAssign,
            "*=" => MulAssign,
            "/=" => DivAssign,
            "%=" => ModAssign,
            "**=" => ExpAssign,
            "<<=" => LShiftAssign,
            ">>=" => RShiftAssign,
            ">>>=" => ZeroFillRShiftAssign,
            "&=" => BitAndAssign,
            "|=" => BitOrAssign,
            "^=" => BitXorAssign,
            "&&=" => AndAssign,
            "||=" => OrAssign,
            "??=" => NullishAssign,
            _ => return None,
        };
        Some(op)
    }

    pub fn as_str(self) -> &'static str {
        use AssignOp::*;
        match self {
            Assign => "=",
            AddAssign => "+=",
            SubAssign => "-=",
            MulAssign => "*=",
            DivAssign => "/=",
            ModAssign => "%=",
            ExpAssign => "**=",
            LShiftAssign => "<<=",
            RShiftAssign => ">>=",
            ZeroFillRShiftAssign => ">>>=",
            BitAndAssign => "&=",
            BitOrAssign => "|=",
            BitXorAssign => "^=",
            AndAssign => "&&=",
            OrAssign => "||=",
            NullishAssign => "??=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignExpr {
    pub op: AssignOp,
    pub target: Box<Expr>,
    pub value: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CondExpr {
    pub test: Box<Expr>,
    pub cons: Box<Expr>,
    pub alt: Box<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeqExpr {
    pub exprs: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArrowBody {
    Block(Block),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowExpr {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeNode>,
    pub body: ArrowBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionExpr {
    pub ident: Option<Ident>,
    pub function: Function,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsExpr {
    pub expr: Box<Expr>,
    pub ty: TypeNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonNullExpr {
    pub expr: Box<Expr>,
    pub span: Span,
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(i) => i.span,
            Expr::This(span) => *span,
            Expr::Lit(lit) => lit.span(),
            Expr::Template(e) => e.span,
            Expr::Array(e) => e.span,
            Expr::Object(e) => e.span,
            Expr::Paren(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::New(e) => e.span,
            Expr::Member(e) => e.span,
            Expr::Index(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Update(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::Assign(e) => e.span,
            Expr::Cond(e) => e.span,
            Expr::Seq(e) => e.span,
            Expr::Arrow(e) => e.span,
            Expr::Function(e) => e.span,
            Expr::As(e) => e.span,
            Expr::NonNull(e) => e.span,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self, Expr::Call(_))
    }

    /// Whether the expression can be used as an operand without parentheses.
    pub fn is_tight(&self) -> bool {
        matches!(
            self,
            Expr::Ident(_)
                | Expr::This(_)
                | Expr::Lit(Lit::Str(_) | Lit::Bool(..) | Lit::Null(_))
                | Expr::Template(_)
                | Expr::Array(_)
                | Expr::Object(_)
                | Expr::Paren(_)
                | Expr::Call(_)
                | Expr::New(_)
                | Expr::Member(_)
                | Expr::Index(_)
                | Expr::NonNull(_)
        )
    }

    /// Conservative check for expressions whose evaluation may be observable.
    pub fn may_have_side_effects(&self) -> bool {
        match self {
            Expr::Ident(_) | Expr::This(_) | Expr::Lit(_) | Expr::Arrow(_) | Expr::Function(_) => {
                false
            }
            Expr::Call(_) | Expr::New(_) | Expr::Update(_) | Expr::Assign(_) => true,
            Expr::Unary(e) => e.op == UnaryOp::Delete || e.arg.may_have_side_effects(),
            Expr::Template(t) => t.exprs.iter().any(Expr::may_have_side_effects),
            Expr::Array(a) => a.elems.iter().any(|e| e.spread || e.expr.may_have_side_effects()),
            Expr::Object(o) => o.props.iter().any(|p| match p {
                Prop::KeyValue { key, value } => {
                    value.may_have_side_effects()
                        || matches!(key, PropKey::Computed(k) if k.may_have_side_effects())
                }
                Prop::Shorthand(_) => false,
                Prop::Method { key, .. } => {
                    matches!(key, PropKey::Computed(k) if k.may_have_side_effects())
                }
                Prop::Spread(_) => true,
            }),
            Expr::Paren(e) => e.expr.may_have_side_effects(),
            Expr::Member(e) => e.object.may_have_side_effects(),
            Expr::Index(e) => e.object.may_have_side_effects() || e.index.may_have_side_effects(),
            Expr::Binary(e) => e.left.may_have_side_effects() || e.right.may_have_side_effects(),
            Expr::Cond(e) => {
                e.test.may_have_side_effects()
                    || e.cons.may_have_side_effects()
                    || e.alt.may_have_side_effects()
            }
            Expr::Seq(e) => e.exprs.iter().any(Expr::may_have_side_effects),
            Expr::As(e) => e.expr.may_have_side_effects(),
            Expr::NonNull(e) => e.expr.may_have_side_effects(),
        }
    }
}

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeParam {
    pub name: Ident,
    pub constraint: Option<TypeNode>,
    pub default: Option<TypeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeNode {
    Ref {
        name: Vec<Ident>,
        args: Vec<TypeNode>,
        span: Span,
    },
    Lit(Lit),
    Union(Vec<TypeNode>, Span),
    Intersection(Vec<TypeNode>, Span),
    Array(Box<TypeNode>, Span),
    Tuple(Vec<TypeNode>, Span),
    Object(Vec<TypeMember>, Span),
    Function {
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        ret: Box<TypeNode>,
        span: Span,
    },
    TypeOf(Vec<Ident>, Span),
    Paren(Box<TypeNode>, Span),
}

impl TypeNode {
    pub fn span(&self) -> Span {
        match self {
            TypeNode::Ref { span, .. } | TypeNode::Function { span, .. } => *span,
            TypeNode::Lit(lit) => lit.span(),
            TypeNode::Union(_, span)
            | TypeNode::Intersection(_, span)
            | TypeNode::Array(_, span)
            | TypeNode::Tuple(_, span)
            | TypeNode::Object(_, span)
            | TypeNode::TypeOf(_, span)
            | TypeNode::Paren(_, span) => *span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeMember {
    Property {
        readonly: bool,
        key: PropKey,
        optional: bool,
        ty: Option<TypeNode>,
        span: Span,
    },
    Method {
        key: PropKey,
        optional: bool,
        type_params: Vec<TypeParam>,
        params: Vec<Param>,
        ret: Option<TypeNode>,
        span: Span,
    },
    Index {
        readonly: bool,
        param: Ident,
        key_ty: TypeNode,
        ty: TypeNode,
        span: Span,
    },
}
