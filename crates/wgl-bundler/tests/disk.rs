//! Bundling files read from disk.

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use pretty_assertions::assert_eq;
use wgl_bundler::{BundleError, Bundler, CompileOptions, DiskFiles};

fn project(files: &[(&str, &str)]) -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
    for (path, content) in files {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
    }
    (dir, root)
}

#[tokio::test]
async fn test_bundle_from_disk() {
    let (_dir, root) = project(&[
        ("main.js", "#include <lib\\\\util.js>\nutil();\n"),
        ("lib/util.js", "import './inner.js';\nfunction util() {}\n"),
        ("lib/inner.js", "var inner;\n"),
    ]);

    let bundle = Bundler::new(DiskFiles)
        .bundle(&root.join("main.js"), &CompileOptions::new(root.clone()))
        .await
        .unwrap();

    assert_eq!(
        bundle.code,
        "/* @@resolved lib/util.js from main.js */\n\
         /* @@resolved lib/inner.js from lib/util.js */\n\
         var inner;\n\
         function util() {}\n\
         util();"
    );
    assert_eq!(bundle.modules, vec!["main.js", "lib/util.js", "lib/inner.js"]);
    assert_eq!(
        bundle.source_map.sources(),
        ["main.js", "lib/util.js", "lib/inner.js"]
    );
}

#[tokio::test]
async fn test_source_map_json() {
    let (_dir, root) = project(&[("main.js", "var a;\n")]);
    let bundle = Bundler::new(DiskFiles)
        .bundle(&root.join("main.js"), &CompileOptions::new(root.clone()))
        .await
        .unwrap();

    assert_eq!(
        bundle.source_map.to_json(Some("main.bundle.js")),
        r#"{"version":3,"file":"main.bundle.js","sources":["main.js"],"names":[],"mappings":"AAAA"}"#
    );
}

#[tokio::test]
async fn test_missing_file_on_disk() {
    let (_dir, root) = project(&[("main.js", "import 'missing.js';\n")]);
    let err = Bundler::new(DiskFiles)
        .bundle(&root.join("main.js"), &CompileOptions::new(root.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, BundleError::ReadImport { .. }));
    assert_eq!(err.path(), &root.join("missing.js"));
    assert_eq!(
        err.to_string(),
        format!("failed to read `{}` imported from `main.js`", root.join("missing.js"))
    );
}

#[tokio::test]
async fn test_entry_outside_root_keeps_its_path() {
    let (_dir, root) = project(&[("a.js", "var a;\n")]);
    let bundle = Bundler::new(DiskFiles)
        .bundle(&root.join("a.js"), &CompileOptions::new(Utf8Path::new("/elsewhere")))
        .await
        .unwrap();
    assert_eq!(bundle.modules, vec![root.join("a.js").as_str().trim_start_matches('/')]);
}
