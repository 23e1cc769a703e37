//! Whole-run behaviour: import rewriting, the environment gate, verbose output and the
//! identity of files that do not use macros.

mod common;

use common::*;
use debug_transform::diagnostics::Severity;
use debug_transform::{EnvRequirement, TransformConfig};

// ---
// Identity
// ---

#[test]
fn test_file_without_macros_is_returned_verbatim() {
    let source = "let  x = 1; // counter\nfoo(x)\n\nexport { x };\n";
    let run = run_with(source, TransformConfig::default()).expect("run");
    assert_eq!(run.main(), source);
    assert!(!run.files[0].changed);
}

#[test]
fn test_type_only_import_is_untouched() {
    let source = "import type { GitMetadata } from \"debug-transform\";\nlet meta: GitMetadata;\n";
    let run = run_with(source, TransformConfig::default()).expect("run");
    assert_eq!(run.main(), source);
}

// ---
// Import rewriting
// ---

#[test]
fn test_imports_become_type_only() {
    let out = expand(concat!(
        "import { $print as log } from \"debug-transform\";\n",
        "import * as Debug from \"debug-transform\";\n",
        "import macros from \"debug-transform\";\n",
        "log(\"a\");\n",
        "Debug.$warn(\"b\");\n",
    ));
    assert_eq!(
        out,
        concat!(
            "import type { $print as log } from \"debug-transform\";\n",
            "import type * as Debug from \"debug-transform\";\n",
            "import type macros from \"debug-transform\";\n",
            "print(\"[src/main.ts:3]\", \"a\");\n",
            "warn(\"[src/main.ts:4]\", \"b\");\n",
        )
    );
}

#[test]
fn test_empty_import_becomes_empty_export() {
    let out = expand("import {} from \"debug-transform\";\nrun();\n");
    assert_eq!(out, "export {};\nrun();\n");
}

#[test]
fn test_side_effect_import_is_not_a_macro_import() {
    let source = "import \"debug-transform\";\nrun();\n";
    assert_eq!(expand(source), source);
}

#[test]
fn test_imports_rewritten_when_disabled() {
    let out = expand_disabled("import { $print } from \"debug-transform\";\n$print(\"x\");\n");
    assert_eq!(
        out,
        "import type { $print } from \"debug-transform\";\nvoid 0;\n"
    );
}

// ---
// Environment gate
// ---

fn requiring(name: &str, requirement: EnvRequirement) -> TransformConfig {
    let mut config = TransformConfig::default();
    config
        .environment_requires
        .insert(name.to_string(), requirement);
    config
}

#[test]
fn test_missing_required_variable_disables_run() {
    let source = with_imports("$print(\"x\");\n");
    let config = requiring("FOO", EnvRequirement::Present(true));

    let run = run_program(&[(MAIN, source.as_str())], config.clone(), &env(&[])).expect("run");
    assert_eq!(run.main(), format!("{}void 0;\n", type_import()));

    let run = run_program(&[(MAIN, source.as_str())], config, &env(&[("FOO", "1")])).expect("run");
    assert_eq!(
        run.main(),
        format!("{}print(\"[src/main.ts:1]\", \"x\");\n", type_import())
    );
}

#[test]
fn test_required_value_must_match() {
    let source = with_imports("$print(\"x\");\n");
    let config = requiring("MODE", EnvRequirement::Equals("debug".to_string()));
    let run = run_program(&[(MAIN, source.as_str())], config, &env(&[("MODE", "release")]))
        .expect("run");
    assert_eq!(run.main(), format!("{}void 0;\n", type_import()));
}

#[test]
fn test_gate_applies_to_every_file() {
    let a = with_imports("$print(\"a\");\n");
    let b = with_imports("$print(\"b\");\n");
    let config = TransformConfig::from_yaml_str("environmentRequires:\n  FOO: true\n")
        .expect("config");
    let run = run_program(
        &[("/project/src/a.ts", a.as_str()), ("/project/src/b.ts", b.as_str())],
        config,
        &env(&[]),
    )
    .expect("run");
    assert!(run.output("/project/src/a.ts").ends_with("void 0;\n"));
    assert!(run.output("/project/src/b.ts").ends_with("void 0;\n"));
}

// ---
// Verbose output
// ---

#[test]
fn test_verbose_reports_state_calls_and_diff() {
    let config = TransformConfig {
        verbose: true,
        ..TransformConfig::default()
    };
    let run = run_with(&with_imports("$print(\"x\");\n"), config).expect("run");
    let records = run.sink.records();
    assert!(records.iter().all(|r| r.severity == Severity::Info));
    let messages: Vec<&str> = records.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(messages[0], "Macros enabled: true");
    assert!(messages.contains(&"Handling call to macro `$print`"), "{messages:?}");
    assert!(
        messages.iter().any(|m| m.contains("+print(\"[src/main.ts:1]\", \"x\");")),
        "{messages:?}"
    );
}

#[test]
fn test_verbose_names_unmet_requirement() {
    let mut config = requiring("CI", EnvRequirement::Present(true));
    config.verbose = true;
    let run = run_program(&[(MAIN, "run();\n")], config, &env(&[])).expect("run");
    let messages: Vec<String> = run.sink.records().into_iter().map(|r| r.message).collect();
    assert_eq!(
        messages,
        vec![
            "Macros enabled: false".to_string(),
            "Environment requirement on `CI` is not met".to_string(),
        ]
    );
}

// ---
// Declaration files
// ---

#[test]
fn test_declaration_files_are_not_emitted() {
    let run = run_program(
        &[
            ("/project/src/types.d.ts", "export declare const limit: number;\n"),
            (MAIN, "import { limit } from \"./types\";\nuse(limit);\n"),
        ],
        TransformConfig::default(),
        &env(&[]),
    )
    .expect("run");
    let paths: Vec<String> = run
        .files
        .iter()
        .map(|f| f.path.to_string_lossy().to_string())
        .collect();
    assert_eq!(paths, vec![MAIN.to_string()]);
}

// ---
// Label paths
// ---

#[test]
fn test_file_outside_working_directory_is_labelled_relative() {
    let path = "/other/lib/main.ts";
    let source = with_imports("$print(\"hi\");\n");
    let run = run_program(&[(path, source.as_str())], TransformConfig::default(), &env(&[]))
        .expect("run");
    assert!(
        run.output(path)
            .ends_with("print(\"[../other/lib/main.ts:1]\", \"hi\");\n"),
        "{}",
        run.output(path)
    );
}
