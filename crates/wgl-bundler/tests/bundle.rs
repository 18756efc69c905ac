//! End-to-end bundling over an in-memory project.

use std::sync::Arc;

use camino::Utf8Path;
use pretty_assertions::assert_eq;
use source_map::LineCol;
use wgl_bundler::{Bundle, BundleError, Bundler, CompileOptions, MemoryFiles, ModuleFilter};

async fn bundle(files: MemoryFiles, entry: &str, options: CompileOptions) -> Bundle {
    Bundler::new(files)
        .bundle(Utf8Path::new(entry), &options)
        .await
        .unwrap()
}

fn lookup(bundle: &Bundle, line: u32, col: u32) -> (String, LineCol) {
    let original = bundle
        .source_map
        .original_position(LineCol::new(line, col))
        .unwrap_or_else(|| panic!("no mapping at {line}:{col}"));
    (original.source.to_string(), original.position)
}

// ============================================================================
// SINGLE FILES
// ============================================================================

#[tokio::test]
async fn test_file_without_imports() {
    let source = "var a = 1;\n/* note\n   more */\nvar b = `x`;\n";
    let files = MemoryFiles::new().with_file("/p/main.js", source);
    let bundle = bundle(files, "/p/main.js", CompileOptions::new("/p")).await;

    assert_eq!(bundle.code, source.trim_end_matches('\n'));
    assert_eq!(bundle.modules, vec!["main.js"]);
    assert!(bundle
        .source_map
        .mappings()
        .all(|m| bundle.source_map.sources()[m.source as usize] == "main.js"));
    for line in 0..4 {
        assert_eq!(lookup(&bundle, line, 0), ("main.js".to_string(), LineCol::new(line, 0)));
    }
}

#[tokio::test]
async fn test_only_one_trailing_break_is_dropped() {
    let files = MemoryFiles::new().with_file("/p/main.js", "var a;\n\n");
    let bundle = bundle(files, "/p/main.js", CompileOptions::new("/p")).await;
    assert_eq!(bundle.code, "var a;\n");
}

#[tokio::test]
async fn test_rewrites_are_applied() {
    let source = "tp.Param(\"ViewList\") = \"Books\"; // comment\nvar q = #sql\nselect 1\n#endsql\n";
    let files = MemoryFiles::new().with_file("/p/main.js", source);
    let bundle = bundle(files, "/p/main.js", CompileOptions::new("/p")).await;

    insta::assert_snapshot!(bundle.code, @r###"
tp.AddParam("ViewList", "Books"); // comment
var q = `
select 1
`;
"###);
    assert_eq!(lookup(&bundle, 2, 3), ("main.js".to_string(), LineCol::new(2, 3)));
}

#[tokio::test]
async fn test_parse_errors_do_not_fail() {
    let files = MemoryFiles::new().with_file("/p/main.js", "var a;\n/* open\nimport 'x.js';");
    let bundle = bundle(files, "/p/main.js", CompileOptions::new("/p")).await;
    assert_eq!(bundle.code, "var a;\n/* open\nimport 'x.js';");
    assert_eq!(bundle.modules, vec!["main.js"]);
}

#[tokio::test]
async fn test_unterminated_backtick_runs_to_end() {
    let source = "var a;\nvar s = `open\nimport 'x.js';";
    let files = MemoryFiles::new().with_file("/p/main.js", source);
    let bundle = bundle(files, "/p/main.js", CompileOptions::new("/p")).await;
    assert_eq!(bundle.code, source);
    assert_eq!(bundle.modules, vec!["main.js"]);
}

#[tokio::test]
async fn test_unterminated_text_block_runs_to_end() {
    let files = MemoryFiles::new().with_file("/p/main.js", "var t = #text\nhello\nimport 'x.js';");
    let bundle = bundle(files, "/p/main.js", CompileOptions::new("/p")).await;
    assert_eq!(bundle.code, "var t = `\nhello\nimport 'x.js';");
    assert_eq!(bundle.modules, vec!["main.js"]);
    assert_eq!(lookup(&bundle, 2, 7), ("main.js".to_string(), LineCol::new(2, 7)));
}

// ============================================================================
// IMPORTS
// ============================================================================

#[tokio::test]
async fn test_import_is_inlined_with_marker() {
    let files = MemoryFiles::new()
        .with_file("/a/entry.js", "import \"dep.js\";\nvar y = double(2);\n")
        .with_file("/a/dep.js", "function double(x) {\n  return x * 2;\n}\n");
    let bundle = bundle(files, "/a/entry.js", CompileOptions::new("/a")).await;

    insta::assert_snapshot!(bundle.code, @r###"
/* @@resolved dep.js from entry.js */
function double(x) {
  return x * 2;
}
var y = double(2);
"###);
    assert_eq!(bundle.modules, vec!["entry.js", "dep.js"]);

    assert_eq!(lookup(&bundle, 0, 3), ("entry.js".to_string(), LineCol::new(0, 3)));
    assert_eq!(lookup(&bundle, 2, 4), ("dep.js".to_string(), LineCol::new(1, 4)));
    assert_eq!(lookup(&bundle, 4, 4), ("entry.js".to_string(), LineCol::new(1, 4)));
    assert_eq!(
        bundle
            .source_map
            .generated_position("dep.js", LineCol::new(2, 0)),
        Some(LineCol::new(3, 0))
    );
}

#[tokio::test]
async fn test_code_after_import_on_same_line_starts_new_line() {
    let files = MemoryFiles::new()
        .with_file("/p/main.js", "import 'dep.js'; var x = 1;\nuse(x);\n")
        .with_file("/p/dep.js", "var a; // end\n");
    let bundle = bundle(files, "/p/main.js", CompileOptions::new("/p")).await;

    insta::assert_snapshot!(bundle.code, @r###"
/* @@resolved dep.js from main.js */
var a; // end
 var x = 1;
use(x);
"###);
    assert_eq!(lookup(&bundle, 2, 1), ("main.js".to_string(), LineCol::new(0, 17)));
    assert_eq!(lookup(&bundle, 3, 0), ("main.js".to_string(), LineCol::new(1, 0)));
}

#[tokio::test]
async fn test_regex_literal_before_import_on_same_line() {
    let files = MemoryFiles::new()
        .with_file("/p/main.js", "s = s.replace(/'/g, \"\"); import 'dep.js';\n")
        .with_file("/p/dep.js", "var d;\n");
    let bundle = bundle(files, "/p/main.js", CompileOptions::new("/p")).await;

    assert_eq!(
        bundle.code,
        "s = s.replace(/'/g, \"\");/* @@resolved dep.js from main.js */\nvar d;"
    );
    assert_eq!(bundle.modules, vec!["main.js", "dep.js"]);
}

#[tokio::test]
async fn test_duplicate_imports_expand_once() {
    let files = MemoryFiles::new()
        .with_file(
            "/p/main.js",
            "import 'lib/x.js';\n#include <LIB\\\\X.js>\nimport \"/lib//x.js\";\n",
        )
        .with_file("/p/lib/x.js", "var x;\n");
    let bundle = bundle(files, "/p/main.js", CompileOptions::new("/p")).await;

    insta::assert_snapshot!(bundle.code, @r###"
/* @@resolved lib/x.js from main.js */
var x;
/* @@unresolved LIB/X.js from main.js */
/* @@unresolved lib/x.js from main.js */
"###);
    assert_eq!(bundle.modules, vec!["main.js", "lib/x.js"]);
}

#[tokio::test]
async fn test_cycle_terminates() {
    let files = MemoryFiles::new()
        .with_file("/p/a.js", "import 'b.js';\nvar a = 1;\n")
        .with_file("/p/b.js", "import 'a.js';\nvar b = 2;\n");
    let bundle = bundle(files, "/p/a.js", CompileOptions::new("/p")).await;

    insta::assert_snapshot!(bundle.code, @r###"
/* @@resolved b.js from a.js */
/* @@unresolved a.js from b.js */
var b = 2;
var a = 1;
"###);
    assert_eq!(bundle.modules, vec!["a.js", "b.js"]);
}

#[tokio::test]
async fn test_relative_and_root_imports() {
    let files = MemoryFiles::new()
        .with_file(
            "/p/sub/main.js",
            "import './util.js';\nimport 'util.js';\nimport '../sub/util.js';\n",
        )
        .with_file("/p/sub/util.js", "var local;\n")
        .with_file("/p/util.js", "var shared;\n");
    let bundle = bundle(files, "/p/sub/main.js", CompileOptions::new("/p")).await;

    insta::assert_snapshot!(bundle.code, @r###"
/* @@resolved sub/util.js from sub/main.js */
var local;
/* @@resolved util.js from sub/main.js */
var shared;
/* @@unresolved sub/util.js from sub/main.js */
"###);
}

#[tokio::test]
async fn test_nested_relative_import_anchors_at_importer() {
    let files = MemoryFiles::new()
        .with_file("/p/main.js", "import 'lib/a.js';\n")
        .with_file("/p/lib/a.js", "import './b.js';\n")
        .with_file("/p/lib/b.js", "var b;\n");
    let bundle = bundle(files, "/p/main.js", CompileOptions::new("/p")).await;
    assert_eq!(bundle.modules, vec!["main.js", "lib/a.js", "lib/b.js"]);
}

#[tokio::test]
async fn test_missing_import_fails() {
    let files = MemoryFiles::new().with_file("/p/main.js", "import 'gone.js';\n");
    let err = Bundler::new(files)
        .bundle(Utf8Path::new("/p/main.js"), &CompileOptions::new("/p"))
        .await
        .unwrap_err();

    match err {
        BundleError::ReadImport { path, importer, .. } => {
            assert_eq!(path, "/p/gone.js");
            assert_eq!(importer, "main.js");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_entry_fails() {
    let err = Bundler::new(MemoryFiles::new())
        .bundle(Utf8Path::new("/p/main.js"), &CompileOptions::new("/p"))
        .await
        .unwrap_err();
    assert!(matches!(err, BundleError::ReadEntry { .. }));
}

// ============================================================================
// TREE-SHAKING
// ============================================================================

fn shaking_project() -> MemoryFiles {
    MemoryFiles::new()
        .with_file(
            "/p/entry.js",
            "import \"sum.js\";\nimport \"double.js\";\nvar r = double(2);\n",
        )
        .with_file("/p/sum.js", "function sum(a, b) { return a + b; }\n")
        .with_file(
            "/p/double.js",
            "import \"constants.js\";\nfunction double(x) { return x * TWO; }\n",
        )
        .with_file("/p/constants.js", "var TWO = 2;\n")
}

#[tokio::test]
async fn test_tree_shaking_by_symbol() {
    let filter = ModuleFilter::new(Vec::<String>::new(), ["double"]).unwrap();
    let options = CompileOptions::new("/p").with_tree_shaking(Arc::new(filter));
    let bundle = bundle(shaking_project(), "/p/entry.js", options).await;

    insta::assert_snapshot!(bundle.code, @r###"
/* @@skippedByTreeShaking sum.js from entry.js */

/* @@resolved double.js from entry.js */
/* @@skippedByTreeShaking constants.js from double.js */

function double(x) { return x * TWO; }
var r = double(2);
"###);
    assert_eq!(bundle.modules, vec!["entry.js", "double.js"]);
}

#[tokio::test]
async fn test_tree_shaking_by_glob() {
    let filter = ModuleFilter::new(["SUM.js", "const*"], Vec::<String>::new()).unwrap();
    let options = CompileOptions::new("/p").with_tree_shaking(Arc::new(filter));
    let bundle = bundle(shaking_project(), "/p/entry.js", options).await;
    assert_eq!(bundle.modules, vec!["entry.js", "sum.js"]);
    assert!(bundle
        .code
        .contains("/* @@skippedByTreeShaking double.js from entry.js */"));
}

#[tokio::test]
async fn test_already_included_wins_over_shaking() {
    let files = MemoryFiles::new()
        .with_file("/p/entry.js", "import 'a.js';\nimport 'a.js';\n")
        .with_file("/p/a.js", "var keep;\n");
    let filter = ModuleFilter::new(Vec::<String>::new(), ["keep"]).unwrap();
    let options = CompileOptions::new("/p").with_tree_shaking(Arc::new(filter));
    let bundle = bundle(files, "/p/entry.js", options).await;
    assert!(bundle.code.ends_with("/* @@unresolved a.js from entry.js */"));
}

// ============================================================================
// GLOBAL SCRIPT
// ============================================================================

fn global_project() -> MemoryFiles {
    MemoryFiles::new()
        .with_file("/p/globals.js", "var G = 1;\n")
        .with_file("/p/main.js", "var a = G;\n")
        .with_file("/p/other.js", "import 'globals.js';\nvar b = G;\n")
}

#[tokio::test]
async fn test_global_script_is_attached() {
    let options = CompileOptions::new("/p").with_global_script("globals.js");
    let bundle = bundle(global_project(), "/p/main.js", options).await;

    insta::assert_snapshot!(bundle.code, @r###"
/* @@resolved globals.js from main.js */
var G = 1;
var a = G;
"###);
    assert_eq!(bundle.modules, vec!["main.js", "globals.js"]);
    assert_eq!(lookup(&bundle, 1, 4), ("globals.js".to_string(), LineCol::new(0, 4)));
    assert_eq!(lookup(&bundle, 2, 4), ("main.js".to_string(), LineCol::new(0, 4)));
}

#[tokio::test]
async fn test_explicit_import_of_global_script_is_unresolved() {
    let options = CompileOptions::new("/p").with_global_script("globals.js");
    let bundle = bundle(global_project(), "/p/other.js", options).await;
    assert!(bundle
        .code
        .contains("/* @@unresolved globals.js from other.js */"));
}

#[tokio::test]
async fn test_global_script_can_be_skipped() {
    let mut options = CompileOptions::new("/p").with_global_script("globals.js");
    options.skip_attach_global_script = true;
    let bundle = bundle(global_project(), "/p/main.js", options).await;
    assert_eq!(bundle.code, "var a = G;");
}

#[tokio::test]
async fn test_global_script_is_not_attached_to_itself() {
    let options = CompileOptions::new("/p").with_global_script("globals.js");
    let bundle = bundle(global_project(), "/p/globals.js", options).await;
    assert_eq!(bundle.code, "var G = 1;");
}

#[tokio::test]
async fn test_global_script_is_never_shaken() {
    let filter = ModuleFilter::new(["nothing"], Vec::<String>::new()).unwrap();
    let options = CompileOptions::new("/p")
        .with_global_script("globals.js")
        .with_tree_shaking(Arc::new(filter));
    let bundle = bundle(global_project(), "/p/main.js", options).await;
    assert!(bundle.code.starts_with("/* @@resolved globals.js from main.js */"));
}
