//! Name binding and call-signature resolution across a [`Program`](super::Program).
//!
//! The checker is built once per program. Binding walks every file with a persistent scope map,
//! records which symbol each identifier reference points at (keyed by span), and builds one export
//! table per file. Queries then follow import aliases and re-exports to the declaring symbol.

use std::collections::{HashMap, HashSet};

use im::HashMap as ScopeMap;

use crate::program::{FileId, SourceFile};
use crate::syntax::ast::*;
use crate::syntax::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub file: FileId,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    /// A local name introduced by an import clause.
    Import {
        specifier: String,
        imported: ImportedName,
    },
    Function,
    /// `function_typed` is set when the variable is annotated with a function type.
    Variable { function_typed: bool },
    Parameter,
    TypeAlias,
    Interface,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportedName {
    Named(String),
    Default,
    Namespace,
}

/// Where an alias chain ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Symbol(SymbolId),
    Namespace(FileId),
}

/// The resolved signature of a call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub declaration: SignatureDeclaration,
    /// File containing the declaration.
    pub file: FileId,
    pub symbol: SymbolId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignatureDeclaration {
    /// A named function declaration.
    Function { name: String },
    /// A signature that exists only as an anonymous function type.
    FunctionType,
}

#[derive(Debug, Clone)]
enum ExportEntry {
    Local(SymbolId),
    ReExport { specifier: String, name: String },
    Namespace { specifier: String },
}

#[derive(Debug, Default)]
struct ExportTable {
    named: HashMap<String, ExportEntry>,
    stars: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Checker {
    symbols: Vec<Symbol>,
    references: HashMap<FileId, HashMap<Span, SymbolId>>,
    identifiers: HashMap<FileId, HashSet<String>>,
    exports: HashMap<FileId, ExportTable>,
    links: HashMap<FileId, HashMap<String, FileId>>,
}

impl Checker {
    /// Binds every file. `resolve` maps an import specifier written in a file to its target.
    pub fn build<R>(files: &[SourceFile], resolve: R) -> Self
    where
        R: Fn(FileId, &str) -> Option<FileId>,
    {
        let mut checker = Checker::default();
        for file in files {
            let id = file.id();
            let links = module_specifiers(file.module())
                .into_iter()
                .filter_map(|spec| resolve(id, &spec).map(|target| (spec, target)))
                .collect();
            checker.links.insert(id, links);
            Binder::new(&mut checker, id).bind_module(file.module());
        }
        checker
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    /// The symbol an identifier (reference or binding occurrence) is bound to.
    pub fn symbol_at(&self, file: FileId, ident: &Ident) -> Option<SymbolId> {
        self.references.get(&file)?.get(&ident.span).copied()
    }

    /// Every identifier name that occurs in `file`.
    pub fn identifiers(&self, file: FileId) -> Option<&HashSet<String>> {
        self.identifiers.get(&file)
    }

    /// Target file of an import or re-export specifier written in `file`.
    pub fn module_of_import(&self, file: FileId, specifier: &str) -> Option<FileId> {
        self.links.get(&file)?.get(specifier).copied()
    }

    /// Follows import aliases to the symbol or namespace they stand for.
    pub fn resolve_alias(&self, symbol: SymbolId) -> Option<Resolved> {
        self.resolve_alias_guarded(symbol, &mut HashSet::new())
    }

    /// What `file` exports under `name`, following re-exports.
    pub fn export(&self, file: FileId, name: &str) -> Option<Resolved> {
        self.export_guarded(file, name, &mut HashSet::new())
    }

    fn resolve_alias_guarded(
        &self,
        symbol: SymbolId,
        visited: &mut HashSet<(FileId, String)>,
    ) -> Option<Resolved> {
        let sym = self.symbols.get(symbol.0)?;
        match &sym.kind {
            SymbolKind::Import {
                specifier,
                imported,
            } => {
                let target = self.module_of_import(sym.file, specifier)?;
                match imported {
                    ImportedName::Namespace => Some(Resolved::Namespace(target)),
                    ImportedName::Default => self.export_guarded(target, "default", visited),
                    ImportedName::Named(name) => self.export_guarded(target, name, visited),
                }
            }
            _ => Some(Resolved::Symbol(symbol)),
        }
    }

    fn export_guarded(
        &self,
        file: FileId,
        name: &str,
        visited: &mut HashSet<(FileId, String)>,
    ) -> Option<Resolved> {
        if !visited.insert((file, name.to_string())) {
            return None;
        }
        let table = self.exports.get(&file)?;
        if let Some(entry) = table.named.get(name) {
            return match entry {
                ExportEntry::Local(symbol) => self.resolve_alias_guarded(*symbol, visited),
                ExportEntry::ReExport { specifier, name } => {
                    let target = self.module_of_import(file, specifier)?;
                    self.export_guarded(target, name, visited)
                }
                ExportEntry::Namespace { specifier } => {
                    self.module_of_import(file, specifier).map(Resolved::Namespace)
                }
            };
        }
        if name == "default" {
            return None;
        }
        table.stars.iter().find_map(|specifier| {
            let target = self.module_of_import(file, specifier)?;
            self.export_guarded(target, name, visited)
        })
    }

    /// Resolves the function a call expression invokes.
    ///
    /// Handles identifier callees, `namespace.member` callees and parenthesized forms of both.
    pub fn resolved_signature(&self, file: FileId, call: &CallExpr) -> Option<Signature> {
        let resolved = match strip_parens(&call.callee) {
            Expr::Ident(ident) => self.resolve_alias(self.symbol_at(file, ident)?)?,
            Expr::Member(member) if !member.optional => {
                let Expr::Ident(object) = strip_parens(&member.object) else {
                    return None;
                };
                match self.resolve_alias(self.symbol_at(file, object)?)? {
                    Resolved::Namespace(target) => self.export(target, &member.prop.name)?,
                    Resolved::Symbol(_) => return None,
                }
            }
            _ => return None,
        };
        let Resolved::Symbol(symbol) = resolved else {
            return None;
        };
        let sym = self.symbol(symbol);
        let declaration = match sym.kind {
            SymbolKind::Function => SignatureDeclaration::Function {
                name: sym.name.clone(),
            },
            SymbolKind::Variable {
                function_typed: true,
            } => SignatureDeclaration::FunctionType,
            _ => return None,
        };
        Some(Signature {
            declaration,
            file: sym.file,
            symbol,
        })
    }
}

fn strip_parens(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => strip_parens(&paren.expr),
        other => other,
    }
}

fn module_specifiers(module: &Module) -> Vec<String> {
    module
        .body
        .iter()
        .filter_map(|stmt| match stmt {
            Stmt::Import(import) => Some(import.source.value.clone()),
            Stmt::ExportNamed(export) => export.source.as_ref().map(|s| s.value.clone()),
            Stmt::ExportAll(export) => Some(export.source.value.clone()),
            _ => None,
        })
        .collect()
}

fn is_function_type(ty: Option<&TypeNode>) -> bool {
    match ty {
        Some(TypeNode::Function { .. }) => true,
        Some(TypeNode::Paren(inner, _)) => is_function_type(Some(inner)),
        _ => false,
    }
}

// ============================================================================
// BINDER
// ============================================================================

type Scope = ScopeMap<String, SymbolId>;

struct Binder<'a> {
    checker: &'a mut Checker,
    file: FileId,
    references: HashMap<Span, SymbolId>,
    identifiers: HashSet<String>,
    exports: ExportTable,
}

impl<'a> Binder<'a> {
    fn new(checker: &'a mut Checker, file: FileId) -> Self {
        Binder {
            checker,
            file,
            references: HashMap::new(),
            identifiers: HashSet::new(),
            exports: ExportTable::default(),
        }
    }

    fn bind_module(mut self, module: &Module) {
        let scope = self.hoist(&module.body, Scope::new());
        for stmt in &module.body {
            self.collect_exports(stmt, &scope);
            self.stmt(stmt, &scope);
        }
        let file = self.file;
        self.checker.references.insert(file, self.references);
        self.checker.identifiers.insert(file, self.identifiers);
        self.checker.exports.insert(file, self.exports);
    }

    fn declare(&mut self, scope: &mut Scope, ident: &Ident, kind: SymbolKind) -> SymbolId {
        let id = SymbolId(self.checker.symbols.len());
        self.checker.symbols.push(Symbol {
            name: ident.name.clone(),
            kind,
            file: self.file,
            span: ident.span,
        });
        scope.insert(ident.name.clone(), id);
        self.references.insert(ident.span, id);
        self.identifiers.insert(ident.name.clone());
        id
    }

    fn reference(&mut self, ident: &Ident, scope: &Scope) {
        self.identifiers.insert(ident.name.clone());
        if let Some(id) = scope.get(&ident.name) {
            self.references.insert(ident.span, *id);
        }
    }

    /// Declares every binding a statement list introduces, before any of it is walked.
    fn hoist(&mut self, stmts: &[Stmt], mut scope: Scope) -> Scope {
        for stmt in stmts {
            match stmt {
                Stmt::Import(import) => self.hoist_import(import, &mut scope),
                Stmt::Function(decl) => {
                    self.declare(&mut scope, &decl.ident, SymbolKind::Function);
                }
                Stmt::Var(decl) => {
                    for declarator in &decl.decls {
                        let function_typed = is_function_type(declarator.type_ann.as_ref());
                        self.declare(
                            &mut scope,
                            &declarator.name,
                            SymbolKind::Variable { function_typed },
                        );
                    }
                }
                Stmt::TypeAlias(decl) => {
                    self.declare(&mut scope, &decl.ident, SymbolKind::TypeAlias);
                }
                Stmt::Interface(decl) => {
                    self.declare(&mut scope, &decl.ident, SymbolKind::Interface);
                }
                _ => {}
            }
        }
        scope
    }

    fn hoist_import(&mut self, import: &ImportDecl, scope: &mut Scope) {
        let Some(clause) = &import.clause else {
            return;
        };
        let specifier = import.source.value.clone();
        if let Some(default) = &clause.default {
            let kind = SymbolKind::Import {
                specifier: specifier.clone(),
                imported: ImportedName::Default,
            };
            self.declare(scope, default, kind);
        }
        match &clause.bindings {
            Some(ImportBindings::Namespace(local)) => {
                let kind = SymbolKind::Import {
                    specifier,
                    imported: ImportedName::Namespace,
                };
                self.declare(scope, local, kind);
            }
            Some(ImportBindings::Named(specifiers)) => {
                for spec in specifiers {
                    if let Some(imported) = &spec.imported {
                        self.identifiers.insert(imported.name.clone());
                    }
                    let kind = SymbolKind::Import {
                        specifier: specifier.clone(),
                        imported: ImportedName::Named(spec.imported_name().to_string()),
                    };
                    self.declare(scope, &spec.local, kind);
                }
            }
            None => {}
        }
    }

    fn collect_exports(&mut self, stmt: &Stmt, scope: &Scope) {
        let exported = |ident: &Ident| scope.get(&ident.name).copied();
        match stmt {
            Stmt::Function(FunctionDecl {
                modifiers, ident, ..
            })
            | Stmt::TypeAlias(TypeAliasDecl {
                modifiers, ident, ..
            })
            | Stmt::Interface(InterfaceDecl {
                modifiers, ident, ..
            }) if modifiers.export => {
                if let Some(id) = exported(ident) {
                    self.exports
                        .named
                        .insert(ident.name.clone(), ExportEntry::Local(id));
                }
            }
            Stmt::Var(decl) if decl.modifiers.export => {
                for declarator in &decl.decls {
                    if let Some(id) = exported(&declarator.name) {
                        self.exports
                            .named
                            .insert(declarator.name.name.clone(), ExportEntry::Local(id));
                    }
                }
            }
            Stmt::ExportNamed(export) => {
                for spec in &export.specifiers {
                    let entry = match &export.source {
                        Some(source) => ExportEntry::ReExport {
                            specifier: source.value.clone(),
                            name: spec.local.name.clone(),
                        },
                        None => match exported(&spec.local) {
                            Some(id) => ExportEntry::Local(id),
                            None => continue,
                        },
                    };
                    self.exports
                        .named
                        .insert(spec.exported_name().to_string(), entry);
                }
            }
            Stmt::ExportAll(export) => match &export.alias {
                Some(alias) => {
                    self.exports.named.insert(
                        alias.name.clone(),
                        ExportEntry::Namespace {
                            specifier: export.source.value.clone(),
                        },
                    );
                }
                None => self.exports.stars.push(export.source.value.clone()),
            },
            Stmt::ExportDefault(export) => {
                if let Expr::Ident(ident) = &export.expr {
                    if let Some(id) = exported(ident) {
                        self.exports
                            .named
                            .insert("default".to_string(), ExportEntry::Local(id));
                    }
                }
            }
            _ => {}
        }
    }

    // ========================================================================
    // STATEMENTS
    // ========================================================================

    fn block(&mut self, block: &Block, scope: &Scope) {
        let scope = self.hoist(&block.stmts, scope.clone());
        for stmt in &block.stmts {
            self.stmt(stmt, &scope);
        }
    }

    fn stmt(&mut self, stmt: &Stmt, scope: &Scope) {
        match stmt {
            Stmt::Import(_) | Stmt::ExportAll(_) => {}
            Stmt::ExportNamed(export) => {
                for spec in &export.specifiers {
                    if export.source.is_none() {
                        self.reference(&spec.local, scope);
                    }
                    if let Some(exported) = &spec.exported {
                        self.identifiers.insert(exported.name.clone());
                    }
                }
            }
            Stmt::ExportDefault(export) => self.expr(&export.expr, scope),
            Stmt::Function(decl) => self.function(&decl.function, None, scope),
            Stmt::Var(decl) => {
                for declarator in &decl.decls {
                    self.type_opt(&declarator.type_ann, scope);
                    if let Some(init) = &declarator.init {
                        self.expr(init, scope);
                    }
                }
            }
            Stmt::TypeAlias(decl) => {
                let scope = self.type_params(&decl.type_params, scope);
                self.type_node(&decl.ty, &scope);
            }
            Stmt::Interface(decl) => {
                let scope = self.type_params(&decl.type_params, scope);
                for ty in &decl.extends {
                    self.type_node(ty, &scope);
                }
                self.type_members(&decl.body, &scope);
            }
            Stmt::Expr(s) => self.expr(&s.expr, scope),
            Stmt::Block(block) => self.block(block, scope),
            Stmt::If(s) => {
                self.expr(&s.test, scope);
                self.stmt(&s.cons, scope);
                if let Some(alt) = &s.alt {
                    self.stmt(alt, scope);
                }
            }
            Stmt::While(s) => {
                self.expr(&s.test, scope);
                self.stmt(&s.body, scope);
            }
            Stmt::For(s) => {
                let mut inner = scope.clone();
                match &s.init {
                    Some(ForInit::Var(_, decls)) => {
                        for declarator in decls {
                            let function_typed = is_function_type(declarator.type_ann.as_ref());
                            self.declare(
                                &mut inner,
                                &declarator.name,
                                SymbolKind::Variable { function_typed },
                            );
                        }
                        for declarator in decls {
                            if let Some(init) = &declarator.init {
                                self.expr(init, &inner);
                            }
                        }
                    }
                    Some(ForInit::Expr(expr)) => self.expr(expr, &inner),
                    None => {}
                }
                for expr in s.test.iter().chain(s.update.iter()) {
                    self.expr(expr, &inner);
                }
                self.stmt(&s.body, &inner);
            }
            Stmt::ForIn(s) => {
                self.expr(&s.right, scope);
                let mut inner = scope.clone();
                self.declare(
                    &mut inner,
                    &s.binding,
                    SymbolKind::Variable {
                        function_typed: false,
                    },
                );
                self.stmt(&s.body, &inner);
            }
            Stmt::Try(s) => {
                self.block(&s.block, scope);
                if let Some(handler) = &s.handler {
                    let mut inner = scope.clone();
                    if let Some(param) = &handler.param {
                        self.declare(&mut inner, param, SymbolKind::Parameter);
                    }
                    self.block(&handler.body, &inner);
                }
                if let Some(finalizer) = &s.finalizer {
                    self.block(finalizer, scope);
                }
            }
            Stmt::Return(s) => {
                if let Some(arg) = &s.arg {
                    self.expr(arg, scope);
                }
            }
            Stmt::Throw(s) => self.expr(&s.arg, scope),
            Stmt::Break(_) | Stmt::Continue(_) | Stmt::Empty(_) => {}
        }
    }

    /// Binds a function's parameters and walks its body. `name` is the binding of a named
    /// function expression, visible only inside it.
    fn function(&mut self, function: &Function, name: Option<&Ident>, scope: &Scope) {
        let mut inner = self.type_params(&function.type_params, scope);
        if let Some(name) = name {
            self.declare(&mut inner, name, SymbolKind::Function);
        }
        self.params(&function.params, &mut inner);
        self.type_opt(&function.return_type, &inner);
        if let Some(body) = &function.body {
            self.block(body, &inner);
        }
    }

    fn params(&mut self, params: &[Param], scope: &mut Scope) {
        for param in params {
            self.declare(scope, &param.name, SymbolKind::Parameter);
        }
        for param in params {
            self.type_opt(&param.type_ann, scope);
            if let Some(default) = &param.default {
                self.expr(default, scope);
            }
        }
    }

    // ========================================================================
    // EXPRESSIONS
    // ========================================================================

    fn expr(&mut self, expr: &Expr, scope: &Scope) {
        match expr {
            Expr::Ident(ident) => self.reference(ident, scope),
            Expr::This(_) | Expr::Lit(_) => {}
            Expr::Template(t) => {
                for e in &t.exprs {
                    self.expr(e, scope);
                }
            }
            Expr::Array(a) => self.args(&a.elems, scope),
            Expr::Object(o) => {
                for prop in &o.props {
                    match prop {
                        Prop::KeyValue { key, value } => {
                            self.prop_key(key, scope);
                            self.expr(value, scope);
                        }
                        Prop::Shorthand(ident) => self.reference(ident, scope),
                        Prop::Method { key, function } => {
                            self.prop_key(key, scope);
                            self.function(function, None, scope);
                        }
                        Prop::Spread(e) => self.expr(e, scope),
                    }
                }
            }
            Expr::Paren(e) => self.expr(&e.expr, scope),
            Expr::Call(call) => {
                self.expr(&call.callee, scope);
                for ty in &call.type_args {
                    self.type_node(ty, scope);
                }
                self.args(&call.args, scope);
            }
            Expr::New(new) => {
                self.expr(&new.callee, scope);
                for ty in &new.type_args {
                    self.type_node(ty, scope);
                }
                if let Some(args) = &new.args {
                    self.args(args, scope);
                }
            }
            Expr::Member(m) => {
                self.expr(&m.object, scope);
                self.identifiers.insert(m.prop.name.clone());
            }
            Expr::Index(i) => {
                self.expr(&i.object, scope);
                self.expr(&i.index, scope);
            }
            Expr::Unary(u) => self.expr(&u.arg, scope),
            Expr::Update(u) => self.expr(&u.arg, scope),
            Expr::Binary(b) => {
                self.expr(&b.left, scope);
                self.expr(&b.right, scope);
            }
            Expr::Assign(a) => {
                self.expr(&a.target, scope);
                self.expr(&a.value, scope);
            }
            Expr::Cond(c) => {
                self.expr(&c.test, scope);
                self.expr(&c.cons, scope);
                self.expr(&c.alt, scope);
            }
            Expr::Seq(s) => {
                for e in &s.exprs {
                    self.expr(e, scope);
                }
            }
            Expr::Arrow(arrow) => {
                let mut inner = self.type_params(&arrow.type_params, scope);
                self.params(&arrow.params, &mut inner);
                self.type_opt(&arrow.return_type, &inner);
                match &arrow.body {
                    ArrowBody::Block(block) => self.block(block, &inner),
                    ArrowBody::Expr(body) => self.expr(body, &inner),
                }
            }
            Expr::Function(f) => self.function(&f.function, f.ident.as_ref(), scope),
            Expr::As(a) => {
                self.expr(&a.expr, scope);
                self.type_node(&a.ty, scope);
            }
            Expr::NonNull(n) => self.expr(&n.expr, scope),
        }
    }

    fn args(&mut self, args: &[ExprOrSpread], scope: &Scope) {
        for arg in args {
            self.expr(&arg.expr, scope);
        }
    }

    fn prop_key(&mut self, key: &PropKey, scope: &Scope) {
        match key {
            PropKey::Ident(ident) => {
                self.identifiers.insert(ident.name.clone());
            }
            PropKey::Computed(expr) => self.expr(expr, scope),
            PropKey::Str(_) | PropKey::Num(_) => {}
        }
    }

    // ========================================================================
    // TYPES
    // ========================================================================

    fn type_params(&mut self, params: &[TypeParam], scope: &Scope) -> Scope {
        let mut inner = scope.clone();
        for param in params {
            self.declare(&mut inner, &param.name, SymbolKind::TypeAlias);
        }
        for param in params {
            self.type_opt(&param.constraint, &inner);
            self.type_opt(&param.default, &inner);
        }
        inner
    }

    fn type_opt(&mut self, ty: &Option<TypeNode>, scope: &Scope) {
        if let Some(ty) = ty {
            self.type_node(ty, scope);
        }
    }

    fn type_node(&mut self, ty: &TypeNode, scope: &Scope) {
        match ty {
            TypeNode::Ref { name, args, .. } => {
                if let Some((first, rest)) = name.split_first() {
                    self.reference(first, scope);
                    for segment in rest {
                        self.identifiers.insert(segment.name.clone());
                    }
                }
                for arg in args {
                    self.type_node(arg, scope);
                }
            }
            TypeNode::TypeOf(name, _) => {
                if let Some((first, rest)) = name.split_first() {
                    self.reference(first, scope);
                    for segment in rest {
                        self.identifiers.insert(segment.name.clone());
                    }
                }
            }
            TypeNode::Lit(_) => {}
            TypeNode::Union(types, _) | TypeNode::Intersection(types, _) | TypeNode::Tuple(types, _) => {
                for ty in types {
                    self.type_node(ty, scope);
                }
            }
            TypeNode::Array(inner, _) | TypeNode::Paren(inner, _) => self.type_node(inner, scope),
            TypeNode::Object(members, _) => self.type_members(members, scope),
            TypeNode::Function {
                type_params,
                params,
                ret,
                ..
            } => {
                let mut inner = self.type_params(type_params, scope);
                self.params(params, &mut inner);
                self.type_node(ret, &inner);
            }
        }
    }

    fn type_members(&mut self, members: &[TypeMember], scope: &Scope) {
        for member in members {
            match member {
                TypeMember::Property { key, ty, .. } => {
                    self.prop_key(key, scope);
                    self.type_opt(ty, scope);
                }
                TypeMember::Method {
                    key,
                    type_params,
                    params,
                    ret,
                    ..
                } => {
                    self.prop_key(key, scope);
                    let mut inner = self.type_params(type_params, scope);
                    self.params(params, &mut inner);
                    self.type_opt(ret, &inner);
                }
                TypeMember::Index {
                    param, key_ty, ty, ..
                } => {
                    self.identifiers.insert(param.name.clone());
                    self.type_node(key_ty, scope);
                    self.type_node(ty, scope);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::program::{FileId, Program};
    use crate::syntax::ast::*;

    use super::*;

    fn first_call(module: &Module) -> &CallExpr {
        module
            .body
            .iter()
            .find_map(|stmt| match stmt {
                Stmt::Expr(ExprStmt {
                    expr: Expr::Call(call),
                    ..
                }) => Some(call),
                _ => None,
            })
            .expect("expression statement with a call")
    }

    fn signature_in(program: &Program, path: &str) -> Option<Signature> {
        let id = program.file_by_path(path).expect("file");
        let call = first_call(program.file(id).module());
        program.checker().resolved_signature(id, call)
    }

    fn lib_program(main: &str) -> Program {
        Program::builder()
            .file(
                "lib.ts",
                "export function greet(name: string) {}\nexport declare const shout: (s: string) => void;\n",
            )
            .file("barrel.ts", "export * from \"./lib\";\nexport { greet as hello } from \"./lib\";\n")
            .file("main.ts", main)
            .build()
            .expect("program")
    }

    fn lib_file(program: &Program) -> FileId {
        program.file_by_path("lib.ts").expect("lib")
    }

    #[test]
    fn test_direct_import_resolves_to_declaration() {
        let program = lib_program("import { greet } from \"./lib\";\ngreet(\"x\");\n");
        let sig = signature_in(&program, "main.ts").expect("signature");
        assert_eq!(sig.file, lib_file(&program));
        assert_eq!(
            sig.declaration,
            SignatureDeclaration::Function {
                name: "greet".to_string()
            }
        );
    }

    #[test]
    fn test_aliased_and_reexported_imports_resolve() {
        let program = lib_program("import { hello as hi } from \"./barrel\";\nhi(\"x\");\n");
        let sig = signature_in(&program, "main.ts").expect("signature");
        assert_eq!(sig.file, lib_file(&program));

        let program = lib_program("import { greet } from \"./barrel\";\ngreet(\"x\");\n");
        assert!(signature_in(&program, "main.ts").is_some());
    }

    #[test]
    fn test_namespace_member_resolves() {
        let program = lib_program("import * as lib from \"./lib\";\n(lib).greet(\"x\");\n");
        let sig = signature_in(&program, "main.ts").expect("signature");
        assert_eq!(program.checker().symbol(sig.symbol).name, "greet");
    }

    #[test]
    fn test_function_typed_variable_is_anonymous_signature() {
        let program = lib_program("import { shout } from \"./lib\";\nshout(\"x\");\n");
        let sig = signature_in(&program, "main.ts").expect("signature");
        assert_eq!(sig.declaration, SignatureDeclaration::FunctionType);
    }

    #[test]
    fn test_shadowed_binding_does_not_resolve_to_import() {
        let program = lib_program(
            "import { greet } from \"./lib\";\nfunction run(greet: (s: string) => void) {\n    greet(\"x\");\n}\n",
        );
        let id = program.file_by_path("main.ts").expect("main");
        let Stmt::Function(decl) = &program.file(id).module().body[1] else {
            panic!("expected function");
        };
        let body = decl.function.body.as_ref().expect("body");
        let Stmt::Expr(ExprStmt {
            expr: Expr::Call(call),
            ..
        }) = &body.stmts[0]
        else {
            panic!("expected call");
        };
        assert_eq!(program.checker().resolved_signature(id, call), None);
    }

    #[test]
    fn test_unresolved_and_missing_exports() {
        let program = lib_program("import { nope } from \"./lib\";\nnope();\nundeclared();\n");
        assert_eq!(signature_in(&program, "main.ts"), None);
        let lib = lib_file(&program);
        assert_eq!(program.checker().export(lib, "nope"), None);
        assert!(program.checker().export(lib, "greet").is_some());
    }

    #[test]
    fn test_reexport_cycles_terminate() {
        let program = Program::builder()
            .file("a.ts", "export * from \"./b\";\n")
            .file("b.ts", "export * from \"./a\";\n")
            .file("main.ts", "import { x } from \"./a\";\nx();\n")
            .build()
            .expect("program");
        assert_eq!(signature_in(&program, "main.ts"), None);
    }

    #[test]
    fn test_identifiers_cover_bindings_and_properties() {
        let program = lib_program("const value = { handler: 1 };\nvalue.other;\n");
        let id = program.file_by_path("main.ts").expect("main");
        let idents = program.checker().identifiers(id).expect("identifiers");
        for name in ["value", "handler", "other"] {
            assert!(idents.contains(name), "missing {name}");
        }
    }
}
