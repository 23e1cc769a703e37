//! Which calls count as macro calls: symbol resolution, shadowing, re-exports, vendored copies
//! of the declarations and declaration version skew.

mod common;

use common::*;
use debug_transform::diagnostics::ErrorKind;
use debug_transform::macros::MACRO_DECLARATIONS;
use debug_transform::{Program, StaticVcs, TransformConfig, TransformError, Transformer};

fn run_files(files: &[(&str, &str)]) -> Result<Run, TransformError> {
    run_program(files, TransformConfig::default(), &env(&[]))
}

// ---
// Shadowing and look-alikes
// ---

#[test]
fn test_shadowed_name_is_not_a_macro() {
    let source = concat!(
        "import { $print } from \"debug-transform\";\n",
        "function log($print: (msg: string) => void) {\n",
        "    $print(\"inner\");\n",
        "}\n",
        "$print(\"outer\");\n",
    );
    let out = expand(source);
    assert!(out.contains("    $print(\"inner\");\n"), "{out}");
    assert!(out.contains("print(\"[src/main.ts:4]\", \"outer\");"), "{out}");
}

#[test]
fn test_same_named_function_elsewhere_is_untouched() {
    let lib = "export function $print(...args: unknown[]) {\n    print(...args);\n}\n";
    let main = "import { $print } from \"./lib\";\n$print(\"hi\");\n";
    let run = run_files(&[("/project/src/lib.ts", lib), (MAIN, main)]).expect("run");
    assert_eq!(run.main(), main);
    assert!(!run.files.iter().any(|f| f.changed));
}

#[test]
fn test_function_typed_variable_is_not_a_macro() {
    let fake = "export declare const $print: (...args: unknown[]) => void;\n";
    let main = "import { $print } from \"./fake\";\n$print(\"hi\");\n";
    let run = run_files(&[("/project/src/fake.d.ts", fake), (MAIN, main)]).expect("run");
    assert_eq!(run.main(), main);
}

#[test]
fn test_unresolved_call_is_untouched() {
    let source = "$dbg(x);\n";
    assert_eq!(expand(source), source);
}

// ---
// Import forms
// ---

#[test]
fn test_barrel_re_export_resolves_to_macro() {
    let barrel = "export { $dbg, $print } from \"debug-transform\";\n";
    let main = "import { $print } from \"./debug\";\n$print(\"hi\");\n";
    let run = run_files(&[("/project/src/debug.ts", barrel), (MAIN, main)]).expect("run");
    assert_eq!(
        run.main(),
        "import { $print } from \"./debug\";\nprint(\"[src/main.ts:1]\", \"hi\");\n"
    );
}

#[test]
fn test_star_re_export_resolves_to_macro() {
    let barrel = "export * from \"debug-transform\";\n";
    let main = "import { $warn } from \"./debug\";\n$warn(\"hi\");\n";
    let run = run_files(&[("/project/src/debug.ts", barrel), (MAIN, main)]).expect("run");
    assert!(run.main().ends_with("warn(\"[src/main.ts:1]\", \"hi\");\n"));
}

#[test]
fn test_aliased_import() {
    let out = expand("import { $print as log } from \"debug-transform\";\nlog(1);\n");
    assert_eq!(
        out,
        "import type { $print as log } from \"debug-transform\";\nprint(\"[src/main.ts:1]\", 1);\n"
    );
}

#[test]
fn test_namespace_import() {
    let out = expand("import * as D from \"debug-transform\";\nconst v = D.$nameof(value);\n");
    assert_eq!(
        out,
        "import type * as D from \"debug-transform\";\nconst v = \"value\";\n"
    );
}

#[test]
fn test_vendored_declarations_are_recognized_by_content() {
    let main = "import { $commitId } from \"../vendor/debug\";\nconst c = $commitId();\n";
    let run = run_files(&[("/project/vendor/debug.d.ts", MACRO_DECLARATIONS), (MAIN, main)])
        .expect("run");
    assert_eq!(
        run.main(),
        concat!(
            "import type { $commitId } from \"../vendor/debug\";\n",
            "const c = \"1a2b3c4d5e6f7081928374655647382910abcdef\";\n",
        )
    );
}

#[test]
fn test_edited_vendored_copy_is_not_the_macro_module() {
    let edited = format!("{MACRO_DECLARATIONS}\n// local changes\n");
    let main = "import { $commitId } from \"../vendor/debug\";\nconst c = $commitId();\n";
    let run = run_files(&[("/project/vendor/debug.d.ts", edited.as_str()), (MAIN, main)])
        .expect("run");
    assert_eq!(run.main(), main);
}

// ---
// Failures
// ---

#[test]
fn test_unknown_declared_function_is_incompatible() {
    let declarations = format!("{MACRO_DECLARATIONS}\nexport declare function $trace(): void;\n");
    let program = Program::builder()
        .package(
            "debug-transform",
            "/project/node_modules/debug-transform/index.d.ts",
            declarations,
        )
        .file(
            MAIN,
            "import { $print, $trace } from \"debug-transform\";\n$print(1);\n$trace();\n",
        )
        .build()
        .expect("program");
    let vcs = StaticVcs::new(metadata());
    let transformer =
        Transformer::with_env(&program, &TransformConfig::default(), &env(&[]), &vcs).with_cwd(CWD);
    let mut sink = debug_transform::diagnostics::BufferSink::new();
    let err = transformer.run(&mut sink).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Incompatible);
    assert!(err.message().contains("`$trace`"), "{}", err.message());
}

#[test]
fn test_unnameable_operand_is_a_call_site_error() {
    let err = run_with(
        &with_imports("const a = $nameof(1 + 2);\nconst b = $nameof(\"s\");\n"),
        TransformConfig::default(),
    )
    .err()
    .expect("expected an error");
    let TransformError::CallSites { path, errors } = err else {
        panic!("expected call-site errors");
    };
    assert_eq!(path, "src/main.ts");
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.kind() == ErrorKind::Macro));
}

#[test]
fn test_wrong_arity_is_reported_with_help() {
    let err = run_with(&with_imports("$git(1);\n"), TransformConfig::default())
        .err()
        .expect("expected an error");
    let TransformError::CallSites { errors, .. } = err else {
        panic!("expected call-site errors");
    };
    assert_eq!(errors[0].message(), "`$git` expects no arguments, got 1");
}

#[test]
fn test_run_stops_at_first_failing_file() {
    let bad = with_imports("$dbg();\n");
    let good = with_imports("$print(1);\n");
    let err = run_files(&[("/project/src/a.ts", bad.as_str()), ("/project/src/b.ts", good.as_str())])
        .err()
        .expect("expected an error");
    assert_eq!(err.kind(), ErrorKind::CallSites);
    assert_eq!(err.to_string(), "1 macro error(s) in src/a.ts");
}
