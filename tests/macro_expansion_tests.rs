//! Expansion of each macro, enabled and disabled, as seen in the printed output.

mod common;

use common::*;
use debug_transform::diagnostics::{BufferSink, ErrorKind};
use debug_transform::{
    GitMetadata, Program, TransformConfig, TransformError, Transformer, VcsProvider,
};

// ---
// $dbg
// ---

#[test]
fn test_dbg_statement_prints_label_and_value() {
    let out = expand(&with_imports("$dbg(a + 1);\n"));
    assert_eq!(
        out,
        format!("{}print(\"[src/main.ts:1] a + 1 =\", a + 1);\n", type_import())
    );
}

#[test]
fn test_dbg_statement_disabled_keeps_calls_only() {
    let out = expand_disabled(&with_imports("$dbg(compute());\n$dbg(x);\n"));
    assert_eq!(out, format!("{}compute();\nvoid 0;\n", type_import()));
}

#[test]
fn test_dbg_statement_disabled_keeps_nested_calls() {
    let out = expand_disabled(&with_imports("$dbg(f() + 1);\n$dbg(x + 1);\n$print(g());\n"));
    assert_eq!(
        out,
        format!("{}void (f() + 1);\nvoid 0;\nvoid g();\n", type_import())
    );
}

#[test]
fn test_dbg_value_is_wrapped() {
    let out = expand(&with_imports("const y = $dbg(compute());\n"));
    let expected = concat!(
        "const y = ((value) => {\n",
        "    print(\"[src/main.ts:1] compute() =\", value);\n",
        "    return value;\n",
        "})(compute());\n",
    );
    assert_eq!(out, format!("{}{}", type_import(), expected));
}

#[test]
fn test_dbg_with_handler() {
    let out = expand(&with_imports("$dbg(x, (l, v) => log(l, v));\n"));
    let expected = concat!(
        "((value, handler) => {\n",
        "    handler(\"[src/main.ts:1] x =\", value);\n",
        "    return value;\n",
        "})(x, (l, v) => log(l, v));\n",
    );
    assert_eq!(out, format!("{}{}", type_import(), expected));
}

#[test]
fn test_dbg_value_disabled_forwards_expression() {
    let out = expand_disabled(&with_imports("const y = $dbg(compute(), report);\n"));
    assert_eq!(out, format!("{}const y = compute();\n", type_import()));
}

#[test]
fn test_dbg_wrapper_evaluates_argument_once() {
    let out = expand(&with_imports("const y = $dbg(counter++) * 2;\n"));
    assert_eq!(out.matches("counter++").count(), 2, "{out}");
    assert!(out.contains("print(\"[src/main.ts:1] counter++ =\", value);"), "{out}");
    assert!(out.ends_with("})(counter++) * 2;\n"), "{out}");
}

#[test]
fn test_dbg_parameter_names_are_fresh() {
    let out = expand(&with_imports(
        "const value = 1;\nconst handler = 2;\nconst y = $dbg(value, handler);\n",
    ));
    assert!(out.contains("((value_1, handler_1) => {"), "{out}");
    assert!(out.contains("handler_1(\"[src/main.ts:3] value =\", value_1);"), "{out}");
    assert!(out.contains("})(value, handler);"), "{out}");
}

#[test]
fn test_each_wrapper_gets_its_own_names() {
    let out = expand(&with_imports("const a = $dbg(1);\nconst b = $dbg(2);\n"));
    assert!(out.contains("((value) => {"), "{out}");
    assert!(out.contains("((value_1) => {"), "{out}");
}

// ---
// $print / $warn / $error
// ---

#[test]
fn test_print_and_warn_prepend_location() {
    let out = expand(&with_imports("$print(\"hello\", 1);\n$warn(\"careful\");\n"));
    assert_eq!(
        out,
        format!(
            "{}print(\"[src/main.ts:1]\", \"hello\", 1);\nwarn(\"[src/main.ts:2]\", \"careful\");\n",
            type_import()
        )
    );
}

#[test]
fn test_print_disabled_is_void() {
    let out = expand_disabled(&with_imports(
        "$print(\"hello\");\n$print(f(), x);\n$print(f(), g());\nconst r = $warn(\"w\");\n",
    ));
    assert_eq!(
        out,
        format!(
            "{}void 0;\nvoid f();\nvoid (f(), g());\nconst r = void 0;\n",
            type_import()
        )
    );
}

#[test]
fn test_error_merges_string_message() {
    let out = expand(&with_imports("$error(\"boom\", 2);\n$error(reason);\n"));
    assert_eq!(
        out,
        format!(
            "{}error(\"[src/main.ts:1] boom\", 2);\nerror(\"[src/main.ts:2] \" + (reason));\n",
            type_import()
        )
    );
}

#[test]
fn test_error_disabled_is_void() {
    let out = expand_disabled(&with_imports("$error(\"boom\");\n"));
    assert_eq!(out, format!("{}void 0;\n", type_import()));
}

#[test]
fn test_scope_prefixes_labels() {
    let config = TransformConfig {
        scope: Some("server".to_string()),
        ..TransformConfig::default()
    };
    let out = run_with(&with_imports("$print(\"x\");\n$dbg(y);\n"), config)
        .expect("run")
        .main();
    assert!(out.contains("print(\"[server] [src/main.ts:1]\", \"x\");"), "{out}");
    assert!(out.contains("print(\"[server] [src/main.ts:2] y =\", y);"), "{out}");
}

// ---
// $commitId / $git
// ---

#[test]
fn test_commit_id_is_not_gated() {
    let source = with_imports("const c = $commitId();\n");
    let expected = format!(
        "{}const c = \"1a2b3c4d5e6f7081928374655647382910abcdef\";\n",
        type_import()
    );
    assert_eq!(expand(&source), expected);
    assert_eq!(expand_disabled(&source), expected);
}

#[test]
fn test_git_is_an_object_literal() {
    let out = expand(&with_imports("const g = $git();\n"));
    let expected = concat!(
        "const g = { Branch: \"main\", Commit: \"1a2b3c4\", ",
        "CommitHash: \"1a2b3c4d5e6f7081928374655647382910abcdef\", Author: \"Release Bot\", ",
        "Timestamp: 1700000000, ISODate: \"2023-11-14T22:13:20+00:00\" };\n",
    );
    assert_eq!(out, format!("{}{}", type_import(), expected));
}

#[test]
fn test_git_member_access() {
    let out = expand(&with_imports("const b = $git().Branch;\n"));
    assert!(out.contains("const b = { Branch: \"main\","), "{out}");
    assert!(out.ends_with("}.Branch;\n"), "{out}");
}

// ---
// $nameof
// ---

#[test]
fn test_nameof_values() {
    let out = expand(&with_imports(concat!(
        "const player = 1;\n",
        "const a = $nameof(player);\n",
        "const b = $nameof(this.health);\n",
        "const c = $nameof(this);\n",
        "const d = $nameof<Game.Round>();\n",
        "const e = $nameof(unknownThing!);\n",
    )));
    let expected = concat!(
        "const player = 1;\n",
        "const a = \"player\";\n",
        "const b = \"health\";\n",
        "const c = \"this\";\n",
        "const d = \"Round\";\n",
        "const e = \"unknownThing\";\n",
    );
    assert_eq!(out, format!("{}{}", type_import(), expected));
}

#[test]
fn test_nameof_statement_is_stripped_with_warning() {
    let run = run_with(&with_imports("$nameof(x);\n"), TransformConfig::default()).expect("run");
    assert_eq!(run.main(), format!("{}void 0;\n", type_import()));
    assert_eq!(
        run.warnings(),
        vec![
            "[debug-transform] macro warning src/main.ts:2 - Call to `$nameof(x)`, which is not used anywhere. It has been stripped."
                .to_string()
        ]
    );
}

// ---
// Nesting and evaluation order
// ---

#[test]
fn test_nested_macros_expand() {
    let out = expand(&with_imports("$print($dbg(x));\n"));
    let expected = concat!(
        "print(\"[src/main.ts:1]\", ((value) => {\n",
        "    print(\"[src/main.ts:1] x =\", value);\n",
        "    return value;\n",
        "})(x));\n",
    );
    assert_eq!(out, format!("{}{}", type_import(), expected));
}

#[test]
fn test_forwarded_arguments_are_expanded() {
    let out = expand_disabled(&with_imports("$dbg($print(\"a\"));\nconst n = $dbg($nameof(x));\n"));
    assert_eq!(out, format!("{}void 0;\nconst n = \"x\";\n", type_import()));
}

#[test]
fn test_macros_inside_functions_and_control_flow() {
    let out = expand(&with_imports(concat!(
        "function tick(dt: number) {\n",
        "    if (dt > 1) {\n",
        "        $warn(\"slow\", dt);\n",
        "    }\n",
        "    return items.map((item) => $dbg(item));\n",
        "}\n",
    )));
    assert!(out.contains("        warn(\"[src/main.ts:3]\", \"slow\", dt);\n"), "{out}");
    assert!(out.contains("return items.map((item) => ((value) => {"), "{out}");
}

#[test]
fn test_disabled_operand_is_parenthesized() {
    let out = expand_disabled(&with_imports("const ok = $print(\"x\") ?? fallback;\n"));
    assert!(out.contains("const ok = (void 0) ?? fallback;"), "{out}");
}

// ---
// VCS providers
// ---

/// A provider whose commit id comes from a cheaper query than the full metadata.
struct CommitOnly;

impl VcsProvider for CommitOnly {
    fn metadata(&self) -> Result<GitMetadata, TransformError> {
        Err(debug_transform::err_msg!(Vcs, "full metadata is unavailable"))
    }

    fn commit_id(&self) -> Result<String, TransformError> {
        Ok("feedface".to_string())
    }
}

#[test]
fn test_commit_id_uses_provider_commit_query() {
    let program = program(&[(MAIN, with_imports("const c = $commitId();\n").as_str())])
        .expect("program");
    let transformer =
        Transformer::with_env(&program, &TransformConfig::default(), &env(&[]), &CommitOnly)
            .with_cwd(CWD);
    let files = transformer.run(&mut BufferSink::new()).expect("run");
    assert!(files[0].print().ends_with("const c = \"feedface\";\n"));

    let program = program_with_git();
    let err = Transformer::with_env(&program, &TransformConfig::default(), &env(&[]), &CommitOnly)
        .with_cwd(CWD)
        .run(&mut BufferSink::new())
        .unwrap_err();
    let TransformError::CallSites { errors, .. } = err else {
        panic!("expected call-site errors");
    };
    assert_eq!(errors[0].kind(), ErrorKind::Vcs);
}

fn program_with_git() -> Program {
    program(&[(MAIN, with_imports("const g = $git();\n").as_str())]).expect("program")
}
