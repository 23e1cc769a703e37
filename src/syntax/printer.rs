//! Renders syntax trees back to TypeScript source.
//!
//! Output is normalized (4-space indentation, one statement per line, comments dropped) and
//! parenthesized from operator precedence, so synthesized trees print as valid code without
//! carrying explicit parentheses. Literals that came from source keep their original spelling.

use crate::syntax::ast::*;

const INDENT: &str = "    ";

/// Print a whole module, one top-level statement per line.
pub fn print_module(module: &Module) -> String {
    let mut printer = Printer::default();
    for stmt in &module.body {
        printer.stmt(stmt);
    }
    printer.out
}

/// Print one expression on a single line.
pub fn print_expr(expr: &Expr) -> String {
    let mut printer = Printer::default();
    printer.expr(expr, 0);
    printer.out
}

/// Print one statement (and any nested block) without a trailing newline.
pub fn print_stmt(stmt: &Stmt) -> String {
    let mut printer = Printer::default();
    printer.stmt(stmt);
    printer.out.trim_end().to_string()
}

pub fn print_type(ty: &TypeNode) -> String {
    let mut printer = Printer::default();
    printer.ty(ty, 0);
    printer.out
}

/// A string literal body in double quotes, escaped as JSON (a subset of valid JS string syntax).
pub fn quote_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.escape_default()))
}

/// Binding strength of an expression, higher binds tighter.
pub fn expr_precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Seq(_) => 1,
        Expr::Assign(_) | Expr::Arrow(_) => 2,
        Expr::Cond(_) => 3,
        Expr::Binary(b) => 3 + b.op.precedence(),
        Expr::As(_) => 3 + BinaryOp::RELATIONAL,
        Expr::Unary(_) => PREFIX,
        Expr::Update(u) if u.prefix => PREFIX,
        Expr::Update(_) => POSTFIX,
        Expr::New(n) if n.args.is_none() => POSTFIX,
        Expr::Call(_) | Expr::New(_) | Expr::Member(_) | Expr::Index(_) | Expr::NonNull(_) => {
            MEMBER
        }
        _ => PRIMARY,
    }
}

const ASSIGN: u8 = 2;
const PREFIX: u8 = 16;
const POSTFIX: u8 = 17;
const MEMBER: u8 = 18;
const PRIMARY: u8 = 19;

/// Whether the printed expression would begin with `{` or `function`, which a statement
/// position would read as a block or a declaration.
pub fn starts_ambiguously(expr: &Expr) -> bool {
    match expr {
        Expr::Object(_) | Expr::Function(_) => true,
        Expr::Call(e) => starts_ambiguously(&e.callee),
        Expr::Member(e) => starts_ambiguously(&e.object),
        Expr::Index(e) => starts_ambiguously(&e.object),
        Expr::NonNull(e) => starts_ambiguously(&e.expr),
        Expr::As(e) => starts_ambiguously(&e.expr),
        Expr::Binary(e) => starts_ambiguously(&e.left),
        Expr::Assign(e) => starts_ambiguously(&e.target),
        Expr::Cond(e) => starts_ambiguously(&e.test),
        Expr::Seq(e) => e.exprs.first().is_some_and(starts_ambiguously),
        Expr::Update(e) if !e.prefix => starts_ambiguously(&e.arg),
        _ => false,
    }
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
}

impl Printer {
    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn line_start(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn stmt(&mut self, stmt: &Stmt) {
        self.line_start();
        self.stmt_inline(stmt);
        self.out.push('\n');
    }

    /// Prints a statement starting at the current position, without the final newline.
    fn stmt_inline(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Import(import) => self.import(import),
            Stmt::ExportNamed(export) => {
                self.push("export ");
                if export.type_only {
                    self.push("type ");
                }
                if export.specifiers.is_empty() {
                    self.push("{}");
                } else {
                    self.push("{ ");
                    for (i, spec) in export.specifiers.iter().enumerate() {
                        if i > 0 {
                            self.push(", ");
                        }
                        self.push(&spec.local.name);
                        if let Some(exported) = &spec.exported {
                            self.push(" as ");
                            self.push(&exported.name);
                        }
                    }
                    self.push(" }");
                }
                if let Some(source) = &export.source {
                    self.push(" from ");
                    self.string(source);
                }
                self.push(";");
            }
            Stmt::ExportAll(export) => {
                self.push("export *");
                if let Some(alias) = &export.alias {
                    self.push(" as ");
                    self.push(&alias.name);
                }
                self.push(" from ");
                self.string(&export.source);
                self.push(";");
            }
            Stmt::ExportDefault(export) => {
                self.push("export default ");
                self.expr(&export.expr, ASSIGN);
                self.push(";");
            }
            Stmt::Function(decl) => {
                self.modifiers(decl.modifiers);
                self.push("function ");
                self.push(&decl.ident.name);
                self.function(&decl.function);
            }
            Stmt::Var(var) => {
                self.modifiers(var.modifiers);
                self.var_declarators(var.kind, &var.decls);
                self.push(";");
            }
            Stmt::TypeAlias(alias) => {
                self.modifiers(alias.modifiers);
                self.push("type ");
                self.push(&alias.ident.name);
                self.type_params(&alias.type_params);
                self.push(" = ");
                self.ty(&alias.ty, 0);
                self.push(";");
            }
            Stmt::Interface(interface) => {
                self.modifiers(interface.modifiers);
                self.push("interface ");
                self.push(&interface.ident.name);
                self.type_params(&interface.type_params);
                if !interface.extends.is_empty() {
                    self.push(" extends ");
                    self.type_list(&interface.extends);
                }
                self.push(" ");
                self.type_members_block(&interface.body);
            }
            Stmt::Expr(stmt) => {
                if starts_ambiguously(&stmt.expr) {
                    self.push("(");
                    self.expr(&stmt.expr, 0);
                    self.push(")");
                } else {
                    self.expr(&stmt.expr, 0);
                }
                self.push(";");
            }
            Stmt::Block(block) => self.block(block),
            Stmt::If(stmt) => {
                self.push("if (");
                self.expr(&stmt.test, 0);
                self.push(") ");
                self.stmt_inline(&stmt.cons);
                if let Some(alt) = &stmt.alt {
                    self.push(" else ");
                    self.stmt_inline(alt);
                }
            }
            Stmt::While(stmt) => {
                self.push("while (");
                self.expr(&stmt.test, 0);
                self.push(") ");
                self.stmt_inline(&stmt.body);
            }
            Stmt::For(stmt) => {
                self.push("for (");
                match &stmt.init {
                    Some(ForInit::Var(kind, decls)) => self.var_declarators(*kind, decls),
                    Some(ForInit::Expr(expr)) => self.expr(expr, 0),
                    None => {}
                }
                self.push(";");
                if let Some(test) = &stmt.test {
                    self.push(" ");
                    self.expr(test, 0);
                }
                self.push(";");
                if let Some(update) = &stmt.update {
                    self.push(" ");
                    self.expr(update, 0);
                }
                self.push(") ");
                self.stmt_inline(&stmt.body);
            }
            Stmt::ForIn(stmt) => {
                self.push("for (");
                self.push(stmt.var_kind.as_str());
                self.push(" ");
                self.push(&stmt.binding.name);
                self.push(match stmt.kind {
                    ForInKind::In => " in ",
                    ForInKind::Of => " of ",
                });
                self.expr(&stmt.right, 0);
                self.push(") ");
                self.stmt_inline(&stmt.body);
            }
            Stmt::Try(stmt) => {
                self.push("try ");
                self.block(&stmt.block);
                if let Some(handler) = &stmt.handler {
                    self.push(" catch ");
                    if let Some(param) = &handler.param {
                        self.push("(");
                        self.push(&param.name);
                        self.push(") ");
                    }
                    self.block(&handler.body);
                }
                if let Some(finalizer) = &stmt.finalizer {
                    self.push(" finally ");
                    self.block(finalizer);
                }
            }
            Stmt::Return(stmt) => {
                self.push("return");
                if let Some(arg) = &stmt.arg {
                    self.push(" ");
                    self.expr(arg, 0);
                }
                self.push(";");
            }
            Stmt::Throw(stmt) => {
                self.push("throw ");
                self.expr(&stmt.arg, 0);
                self.push(";");
            }
            Stmt::Break(_) => self.push("break;"),
            Stmt::Continue(_) => self.push("continue;"),
            Stmt::Empty(_) => self.push(";"),
        }
    }

    fn import(&mut self, import: &ImportDecl) {
        self.push("import ");
        if import.type_only {
            self.push("type ");
        }
        if let Some(clause) = &import.clause {
            if let Some(default) = &clause.default {
                self.push(&default.name);
                if clause.bindings.is_some() {
                    self.push(", ");
                }
            }
            match &clause.bindings {
                Some(ImportBindings::Namespace(ns)) => {
                    self.push("* as ");
                    self.push(&ns.name);
                }
                Some(ImportBindings::Named(specs)) if specs.is_empty() => self.push("{}"),
                Some(ImportBindings::Named(specs)) => {
                    self.push("{ ");
                    for (i, spec) in specs.iter().enumerate() {
                        if i > 0 {
                            self.push(", ");
                        }
                        if let Some(imported) = &spec.imported {
                            self.push(&imported.name);
                            self.push(" as ");
                        }
                        self.push(&spec.local.name);
                    }
                    self.push(" }");
                }
                None => {}
            }
            self.push(" from ");
        }
        self.string(&import.source);
        self.push(";");
    }

    fn modifiers(&mut self, modifiers: Modifiers) {
        if modifiers.export {
            self.push("export ");
        }
        if modifiers.declare {
            self.push("declare ");
        }
    }

    fn var_declarators(&mut self, kind: VarKind, decls: &[VarDeclarator]) {
        self.push(kind.as_str());
        self.push(" ");
        for (i, decl) in decls.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(&decl.name.name);
            if let Some(ty) = &decl.type_ann {
                self.push(": ");
                self.ty(ty, 0);
            }
            if let Some(init) = &decl.init {
                self.push(" = ");
                self.expr(init, ASSIGN);
            }
        }
    }

    fn block(&mut self, block: &Block) {
        if block.stmts.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{\n");
        self.depth += 1;
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
        self.depth -= 1;
        self.line_start();
        self.push("}");
    }

    /// Signature plus body (or `;` for a bodiless declaration).
    fn function(&mut self, function: &Function) {
        self.signature(&function.type_params, &function.params, function.return_type.as_ref());
        match &function.body {
            Some(body) => {
                self.push(" ");
                self.block(body);
            }
            None => self.push(";"),
        }
    }

    fn signature(&mut self, type_params: &[TypeParam], params: &[Param], ret: Option<&TypeNode>) {
        self.type_params(type_params);
        self.params(params);
        if let Some(ret) = ret {
            self.push(": ");
            self.ty(ret, 0);
        }
    }

    fn params(&mut self, params: &[Param]) {
        self.push("(");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            if param.rest {
                self.push("...");
            }
            self.push(&param.name.name);
            if param.optional {
                self.push("?");
            }
            if let Some(ty) = &param.type_ann {
                self.push(": ");
                self.ty(ty, 0);
            }
            if let Some(default) = &param.default {
                self.push(" = ");
                self.expr(default, ASSIGN);
            }
        }
        self.push(")");
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn expr(&mut self, expr: &Expr, min_prec: u8) {
        if expr_precedence(expr) < min_prec {
            self.push("(");
            self.expr_unwrapped(expr);
            self.push(")");
        } else {
            self.expr_unwrapped(expr);
        }
    }

    fn expr_unwrapped(&mut self, expr: &Expr) {
        match expr {
            Expr::Ident(ident) => self.push(&ident.name),
            Expr::This(_) => self.push("this"),
            Expr::Lit(lit) => self.lit(lit),
            Expr::Template(template) => {
                self.push("`");
                for (i, quasi) in template.quasis.iter().enumerate() {
                    self.push(quasi);
                    if let Some(expr) = template.exprs.get(i) {
                        self.push("${");
                        self.expr(expr, 0);
                        self.push("}");
                    }
                }
                self.push("`");
            }
            Expr::Array(array) => {
                self.push("[");
                self.args(&array.elems);
                self.push("]");
            }
            Expr::Object(object) => self.object(object),
            Expr::Paren(paren) => {
                self.push("(");
                self.expr(&paren.expr, 0);
                self.push(")");
            }
            Expr::Call(call) => {
                self.callee(&call.callee);
                if call.optional {
                    self.push("?.");
                }
                self.type_args(&call.type_args);
                self.push("(");
                self.args(&call.args);
                self.push(")");
            }
            Expr::New(new) => {
                self.push("new ");
                if new_callee_needs_parens(&new.callee) {
                    self.push("(");
                    self.expr(&new.callee, 0);
                    self.push(")");
                } else {
                    self.expr(&new.callee, MEMBER);
                }
                self.type_args(&new.type_args);
                if let Some(args) = &new.args {
                    self.push("(");
                    self.args(args);
                    self.push(")");
                }
            }
            Expr::Member(member) => {
                self.callee(&member.object);
                self.push(if member.optional { "?." } else { "." });
                self.push(&member.prop.name);
            }
            Expr::Index(index) => {
                self.callee(&index.object);
                self.push(if index.optional { "?.[" } else { "[" });
                self.expr(&index.index, 0);
                self.push("]");
            }
            Expr::Unary(unary) => {
                self.push(unary.op.as_str());
                let arg = print_expr_at(&unary.arg, PREFIX);
                let collides = match unary.op {
                    UnaryOp::Minus => arg.starts_with('-'),
                    UnaryOp::Plus => arg.starts_with('+'),
                    _ => false,
                };
                if unary.op.is_word() || collides {
                    self.push(" ");
                }
                self.push(&arg);
            }
            Expr::Update(update) => {
                if update.prefix {
                    self.push(update.op.as_str());
                    self.expr(&update.arg, PREFIX);
                } else {
                    self.expr(&update.arg, POSTFIX);
                    self.push(update.op.as_str());
                }
            }
            Expr::Binary(binary) => self.binary(binary),
            Expr::Assign(assign) => {
                self.expr(&assign.target, POSTFIX);
                self.push(" ");
                self.push(assign.op.as_str());
                self.push(" ");
                self.expr(&assign.value, ASSIGN);
            }
            Expr::Cond(cond) => {
                self.expr(&cond.test, 4);
                self.push(" ? ");
                self.expr(&cond.cons, ASSIGN);
                self.push(" : ");
                self.expr(&cond.alt, ASSIGN);
            }
            Expr::Seq(seq) => {
                for (i, expr) in seq.exprs.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.expr(expr, ASSIGN);
                }
            }
            Expr::Arrow(arrow) => {
                self.signature(&arrow.type_params, &arrow.params, arrow.return_type.as_ref());
                self.push(" => ");
                match &arrow.body {
                    ArrowBody::Block(block) => self.block(block),
                    ArrowBody::Expr(body) if starts_ambiguously(body) => {
                        self.push("(");
                        self.expr(body, 0);
                        self.push(")");
                    }
                    ArrowBody::Expr(body) => self.expr(body, ASSIGN),
                }
            }
            Expr::Function(function) => {
                self.push("function");
                if let Some(ident) = &function.ident {
                    self.push(" ");
                    self.push(&ident.name);
                }
                self.function(&function.function);
            }
            Expr::As(cast) => {
                self.expr(&cast.expr, 3 + BinaryOp::RELATIONAL);
                self.push(" as ");
                self.ty(&cast.ty, 0);
            }
            Expr::NonNull(non_null) => {
                self.callee(&non_null.expr);
                self.push("!");
            }
        }
    }

    /// Object of a member access, call or index. Bare integer literals need parentheses.
    fn callee(&mut self, expr: &Expr) {
        if matches!(expr, Expr::Lit(Lit::Num(_))) {
            self.push("(");
            self.expr(expr, 0);
            self.push(")");
        } else {
            self.expr(expr, MEMBER);
        }
    }

    fn binary(&mut self, binary: &BinaryExpr) {
        let prec = 3 + binary.op.precedence();
        let (left_min, right_min) = if binary.op.is_right_associative() {
            (prec + 1, prec)
        } else {
            (prec, prec + 1)
        };
        let left_min = if binary.op == BinaryOp::Exp && matches!(*binary.left, Expr::Unary(_)) {
            POSTFIX
        } else {
            left_min
        };
        self.operand(&binary.left, binary.op, left_min);
        self.push(" ");
        self.push(binary.op.as_str());
        self.push(" ");
        self.operand(&binary.right, binary.op, right_min);
    }

    /// `??` cannot be mixed with `||` or `&&` without parentheses.
    fn operand(&mut self, operand: &Expr, parent: BinaryOp, min_prec: u8) {
        let mixes_nullish = match operand {
            Expr::Binary(child) => {
                let logical = |op: BinaryOp| matches!(op, BinaryOp::LogicalOr | BinaryOp::LogicalAnd);
                (parent == BinaryOp::NullishCoalescing && logical(child.op))
                    || (logical(parent) && child.op == BinaryOp::NullishCoalescing)
            }
            _ => false,
        };
        if mixes_nullish {
            self.push("(");
            self.expr(operand, 0);
            self.push(")");
        } else {
            self.expr(operand, min_prec);
        }
    }

    fn args(&mut self, args: &[ExprOrSpread]) {
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            if arg.spread {
                self.push("...");
            }
            self.expr(&arg.expr, ASSIGN);
        }
    }

    fn object(&mut self, object: &ObjectLit) {
        if object.props.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{ ");
        for (i, prop) in object.props.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            match prop {
                Prop::KeyValue { key, value } => {
                    self.prop_key(key);
                    self.push(": ");
                    self.expr(value, ASSIGN);
                }
                Prop::Shorthand(ident) => self.push(&ident.name),
                Prop::Method { key, function } => {
                    self.prop_key(key);
                    self.function(function);
                }
                Prop::Spread(expr) => {
                    self.push("...");
                    self.expr(expr, ASSIGN);
                }
            }
        }
        self.push(" }");
    }

    fn prop_key(&mut self, key: &PropKey) {
        match key {
            PropKey::Ident(ident) => self.push(&ident.name),
            PropKey::Str(s) => self.string(s),
            PropKey::Num(n) => self.number(n),
            PropKey::Computed(expr) => {
                self.push("[");
                self.expr(expr, ASSIGN);
                self.push("]");
            }
        }
    }

    fn lit(&mut self, lit: &Lit) {
        match lit {
            Lit::Str(s) => self.string(s),
            Lit::Num(n) => self.number(n),
            Lit::Bool(value, _) => self.push(if *value { "true" } else { "false" }),
            Lit::Null(_) => self.push("null"),
        }
    }

    fn string(&mut self, s: &Str) {
        match &s.raw {
            Some(raw) => self.push(raw),
            None => {
                let quoted = quote_string(&s.value);
                self.push(&quoted);
            }
        }
    }

    fn number(&mut self, n: &Number) {
        match &n.raw {
            Some(raw) => self.push(raw),
            None => {
                let text = format_number(n.value);
                self.push(&text);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    fn type_args(&mut self, args: &[TypeNode]) {
        if args.is_empty() {
            return;
        }
        self.push("<");
        self.type_list(args);
        self.push(">");
    }

    fn type_list(&mut self, types: &[TypeNode]) {
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.ty(ty, 0);
        }
    }

    fn type_params(&mut self, params: &[TypeParam]) {
        if params.is_empty() {
            return;
        }
        self.push("<");
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            self.push(&param.name.name);
            if let Some(constraint) = &param.constraint {
                self.push(" extends ");
                self.ty(constraint, 0);
            }
            if let Some(default) = &param.default {
                self.push(" = ");
                self.ty(default, 0);
            }
        }
        self.push(">");
    }

    fn ty(&mut self, ty: &TypeNode, min_prec: u8) {
        let prec = match ty {
            TypeNode::Function { .. } => 0,
            TypeNode::Union(..) => 1,
            TypeNode::Intersection(..) => 2,
            TypeNode::Array(..) => 3,
            _ => 4,
        };
        if prec < min_prec {
            self.push("(");
            self.ty(ty, 0);
            self.push(")");
            return;
        }
        match ty {
            TypeNode::Ref { name, args, .. } => {
                self.qualified(name);
                self.type_args(args);
            }
            TypeNode::Lit(lit) => self.lit(lit),
            TypeNode::Union(members, _) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        self.push(" | ");
                    }
                    self.ty(member, 2);
                }
            }
            TypeNode::Intersection(members, _) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        self.push(" & ");
                    }
                    self.ty(member, 3);
                }
            }
            TypeNode::Array(elem, _) => {
                self.ty(elem, 4);
                self.push("[]");
            }
            TypeNode::Tuple(elems, _) => {
                self.push("[");
                self.type_list(elems);
                self.push("]");
            }
            TypeNode::Object(members, _) => self.type_members_inline(members),
            TypeNode::Function {
                type_params,
                params,
                ret,
                ..
            } => {
                self.type_params(type_params);
                self.params(params);
                self.push(" => ");
                self.ty(ret, 0);
            }
            TypeNode::TypeOf(name, _) => {
                self.push("typeof ");
                self.qualified(name);
            }
            TypeNode::Paren(inner, _) => {
                self.push("(");
                self.ty(inner, 0);
                self.push(")");
            }
        }
    }

    fn qualified(&mut self, name: &[Ident]) {
        for (i, part) in name.iter().enumerate() {
            if i > 0 {
                self.push(".");
            }
            self.push(&part.name);
        }
    }

    fn type_members_inline(&mut self, members: &[TypeMember]) {
        if members.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{ ");
        for (i, member) in members.iter().enumerate() {
            if i > 0 {
                self.push("; ");
            }
            self.type_member(member);
        }
        self.push(" }");
    }

    fn type_members_block(&mut self, members: &[TypeMember]) {
        if members.is_empty() {
            self.push("{}");
            return;
        }
        self.push("{\n");
        self.depth += 1;
        for member in members {
            self.line_start();
            self.type_member(member);
            self.push(";\n");
        }
        self.depth -= 1;
        self.line_start();
        self.push("}");
    }

    fn type_member(&mut self, member: &TypeMember) {
        match member {
            TypeMember::Property {
                readonly,
                key,
                optional,
                ty,
                ..
            } => {
                if *readonly {
                    self.push("readonly ");
                }
                self.prop_key(key);
                if *optional {
                    self.push("?");
                }
                if let Some(ty) = ty {
                    self.push(": ");
                    self.ty(ty, 0);
                }
            }
            TypeMember::Method {
                key,
                optional,
                type_params,
                params,
                ret,
                ..
            } => {
                self.prop_key(key);
                if *optional {
                    self.push("?");
                }
                self.signature(type_params, params, ret.as_ref());
            }
            TypeMember::Index {
                readonly,
                param,
                key_ty,
                ty,
                ..
            } => {
                if *readonly {
                    self.push("readonly ");
                }
                self.push("[");
                self.push(&param.name);
                self.push(": ");
                self.ty(key_ty, 0);
                self.push("]: ");
                self.ty(ty, 0);
            }
        }
    }
}

fn print_expr_at(expr: &Expr, min_prec: u8) -> String {
    let mut printer = Printer::default();
    printer.expr(expr, min_prec);
    printer.out
}

/// `new a.b()` is fine, but a call anywhere in the callee chain would be taken as the
/// constructor's own argument list.
fn new_callee_needs_parens(expr: &Expr) -> bool {
    match expr {
        Expr::Ident(_) | Expr::This(_) | Expr::Paren(_) | Expr::Lit(_) => false,
        Expr::Member(m) => new_callee_needs_parens(&m.object),
        Expr::Index(i) => new_callee_needs_parens(&i.object),
        _ => expr_precedence(expr) < PRIMARY,
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
