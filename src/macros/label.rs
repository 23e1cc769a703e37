//! Labels written into generated debug output.
//!
//! A location label is `[path:line]`, an expression label is `[path:line] text =`. Paths are
//! relative to the working directory of the run and use `/` separators; lines are zero-based.
//! With a scope configured, every label starts with `[scope] `.

use std::path::{Component, Path};

use crate::program::SourceFile;
use crate::syntax::printer::print_expr;
use crate::syntax::{Expr, Span};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelBuilder {
    path: String,
    scope: Option<String>,
}

impl LabelBuilder {
    pub fn new(file: &SourceFile, cwd: Option<&Path>, scope: Option<&str>) -> Self {
        Self {
            path: relative_path(file.path(), cwd),
            scope: scope.map(str::to_string),
        }
    }

    /// The display path of the file these labels describe.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `[path:line]` for the line `span` starts on.
    pub fn location(&self, file: &SourceFile, span: Span) -> String {
        let line = if span.is_dummy() {
            0
        } else {
            file.line_of(span.start)
        };
        match &self.scope {
            Some(scope) => format!("[{}] [{}:{}]", scope, self.path, line),
            None => format!("[{}:{}]", self.path, line),
        }
    }

    /// `[path:line] text =` where `text` is the source text of `expr`.
    pub fn expression(&self, file: &SourceFile, expr: &Expr) -> String {
        let text = source_text(file, expr);
        format!("{} {} =", self.location(file, expr.span()), text)
    }
}

/// Original text of `expr`, or its printed form when it has no source text.
pub fn source_text(file: &SourceFile, expr: &Expr) -> String {
    match file.slice(expr.span()) {
        Some(text) => text.to_string(),
        None => print_expr(expr),
    }
}

/// `path` relative to `cwd`, stepping out with `..` where needed. Paths that share no root with
/// `cwd` (another drive, or one relative and one absolute) are kept as they are.
fn relative_path(path: &Path, cwd: Option<&Path>) -> String {
    let as_is = || path.to_string_lossy().replace('\\', "/");
    let Some(cwd) = cwd else {
        return as_is();
    };
    if path.is_absolute() != cwd.is_absolute() {
        return as_is();
    }
    let target: Vec<Component> = path.components().collect();
    let base: Vec<Component> = cwd
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();
    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();
    if path.is_absolute() && common == 0 {
        return as_is();
    }
    let mut parts: Vec<String> = base[common..].iter().map(|_| "..".to_string()).collect();
    parts.extend(
        target[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().to_string()),
    );
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Program;
    use crate::syntax::build;
    use crate::syntax::{ExprStmt, Stmt};

    fn program() -> Program {
        Program::builder()
            .file("/work/src/app.ts", "let a = 1;\n\nfoo(a +  1);\n")
            .build()
            .expect("program")
    }

    fn call_arg(program: &Program) -> (&SourceFile, Expr) {
        let file = program.file(program.file_by_path("/work/src/app.ts").expect("file"));
        let Stmt::Expr(ExprStmt {
            expr: Expr::Call(call),
            ..
        }) = &file.module().body[1]
        else {
            panic!("expected call statement");
        };
        (file, call.args[0].expr.clone())
    }

    #[test]
    fn test_expression_label_uses_source_text_and_zero_based_line() {
        let program = program();
        let (file, arg) = call_arg(&program);
        let labels = LabelBuilder::new(file, Some(Path::new("/work")), None);
        assert_eq!(labels.expression(file, &arg), "[src/app.ts:2] a +  1 =");
        assert_eq!(labels.location(file, arg.span()), "[src/app.ts:2]");
    }

    #[test]
    fn test_scope_prefix() {
        let program = program();
        let (file, arg) = call_arg(&program);
        let labels = LabelBuilder::new(file, Some(Path::new("/work")), Some("client"));
        assert_eq!(labels.location(file, arg.span()), "[client] [src/app.ts:2]");
    }

    #[test]
    fn test_path_outside_cwd_steps_up() {
        let program = program();
        let (file, _) = call_arg(&program);
        let labels = LabelBuilder::new(file, Some(Path::new("/elsewhere")), None);
        assert_eq!(labels.path(), "../work/src/app.ts");
        let labels = LabelBuilder::new(file, Some(Path::new("/work/src/nested")), None);
        assert_eq!(labels.path(), "../app.ts");
    }

    #[test]
    fn test_relative_path_edge_cases() {
        assert_eq!(relative_path(Path::new("/a/b/c.ts"), Some(Path::new("/a/"))), "b/c.ts");
        assert_eq!(relative_path(Path::new("src/c.ts"), Some(Path::new("/a"))), "src/c.ts");
        assert_eq!(relative_path(Path::new("/a/c.ts"), None), "/a/c.ts");
    }

    #[test]
    fn test_synthesized_expression_is_printed() {
        let program = program();
        let (file, _) = call_arg(&program);
        let labels = LabelBuilder::new(file, None, None);
        let expr = build::call(build::ident("f"), vec![]);
        assert_eq!(labels.expression(file, &expr), "[/work/src/app.ts:0] f() =");
    }
}
