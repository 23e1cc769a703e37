// tests/parser_tests.rs

use debug_transform::diagnostics::ErrorKind;
use debug_transform::syntax::parser::parse_expr;
use debug_transform::syntax::printer::print_expr;
use debug_transform::syntax::{parse_module, print_module, Expr, Stmt};

fn print(text: &str) -> String {
    print_module(&parse_module("test.ts", text).expect("source should parse"))
}

/// Printing is a fixed point: printed output parses back to the same printed output.
fn assert_stable(text: &str) {
    let once = print(text);
    let twice = print(&once);
    assert_eq!(once, twice, "printing is not stable for:\n{text}");
}

// ---
// Round trips
// ---

#[test]
fn test_statements_round_trip() {
    assert_stable(concat!(
        "import { a, b as c } from \"./m\";\n",
        "import * as ns from \"./ns\";\n",
        "export const limit: number = 10;\n",
        "export function clamp(value: number, max = limit): number {\n",
        "    if (value > max) { return max; } else { return value; }\n",
        "}\n",
        "for (let i = 0; i < 3; i++) { total += i; }\n",
        "for (const key in table) { keys.push(key); }\n",
        "while (running) { tick(); }\n",
        "try { risky(); } catch (e) { report(e); } finally { done(); }\n",
        "export { clamp as clampValue };\n",
        "export default clamp;\n",
    ));
}

#[test]
fn test_expressions_round_trip() {
    assert_stable(concat!(
        "const o = { a: 1, \"b\": [1, 2, ...rest], c, m(x: number) { return x; } };\n",
        "const g = <T>(x: T): T => x;\n",
        "const h = (a, b) => ({ a, b });\n",
        "const t = cond ? left : right ?? other;\n",
        "const s = `tick ${count}`;\n",
        "const n = maybe?.value!.inner[0];\n",
        "const p = new Map<string, number>();\n",
        "const q = typeof x === \"string\" && !(y instanceof Error);\n",
        "const r = (value as unknown) as Record<string, number[]>;\n",
    ));
}

#[test]
fn test_types_round_trip() {
    assert_stable(concat!(
        "type Handler = (label: string, value: unknown) => void;\n",
        "type Pair<A, B = A> = [A, B];\n",
        "type Choice = \"a\" | \"b\" | 3;\n",
        "export interface Meta extends Base {\n",
        "    readonly Branch: string;\n",
        "    [key: string]: unknown;\n",
        "    describe?(depth: number): string;\n",
        "}\n",
        "export declare function $dbg<T>(expression: T, customHandler?: (label: string, value: T) => void): T;\n",
    ));
}

#[test]
fn test_unchanged_expression_keeps_source_spelling() {
    let text = "f('single', 0x10, (a));\n";
    assert_eq!(print(text), text);
}

#[test]
fn test_function_expression_statement_is_wrapped() {
    let printed = print("(function () { run(); })();\n");
    assert!(printed.starts_with("(function"), "{printed}");
    assert_stable(&printed);
}

// ---
// Spans
// ---

#[test]
fn test_statement_spans_cover_their_text() {
    let text = "let a = 1;\n$dbg(a);\n";
    let module = parse_module("test.ts", text).expect("parse");
    let spans: Vec<&str> = module
        .body
        .iter()
        .filter_map(|stmt| stmt.span().slice(text))
        .collect();
    assert_eq!(spans, vec!["let a = 1;", "$dbg(a);"]);
}

#[test]
fn test_argument_spans() {
    let text = "$print(first, second + 1);";
    let module = parse_module("test.ts", text).expect("parse");
    let Stmt::Expr(stmt) = &module.body[0] else {
        panic!("expected expression statement");
    };
    let Expr::Call(call) = &stmt.expr else {
        panic!("expected call");
    };
    let args: Vec<&str> = call
        .args
        .iter()
        .filter_map(|arg| arg.expr.span().slice(text))
        .collect();
    assert_eq!(args, vec!["first", "second + 1"]);
}

// ---
// Errors
// ---

#[test]
fn test_syntax_errors_are_parse_errors() {
    for text in ["const = 1;", "f(", "if (x { }", "let x = ;"] {
        let err = parse_module("broken.ts", text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse, "{text}");
        assert!(err.message().contains("broken.ts"), "{}", err.message());
        assert!(err.span().is_some(), "{text}");
    }
}

#[test]
fn test_parse_expr_and_print_expr() {
    let expr = parse_expr("a  +  b * (c - d)").expect("expression");
    assert_eq!(print_expr(&expr), "a + b * (c - d)");
}
