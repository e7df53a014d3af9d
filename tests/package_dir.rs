use std::fs;
use std::path::{Path, PathBuf};

use interfake::{
    find_interface, parse_package_dir, Error, GoEnv, GoEnvResolver, PackageDir,
    PackageResolver, TypeExpr, Walker,
};
use tempfile::TempDir;

fn write(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, text).expect("write");
}

fn names(files: &[PathBuf]) -> Vec<String> {
    files
        .iter()
        .map(|f| f.file_name().expect("name").to_string_lossy().into_owned())
        .collect()
}

/// A module `example.com/m` with a `store` package, a `util` directory
/// declaring `package utilities` and a vendored dependency, plus a GOPATH
/// holding one more package.
fn fixture() -> (TempDir, GoEnv) {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();

    let m = root.join("m");
    write(&m.join("go.mod"), "module example.com/m\n\ngo 1.22\n");
    write(
        &m.join("store/store.go"),
        r#"package store

import (
    "example.com/m/util"
    "github.com/x/yaml.v9"
    "example.com/lib"
)

type Store interface {
    Get(key utilities.Key) (*Item, error)
    Encode(doc yaml.Doc) libimpl.Blob
}
"#,
    );
    write(&m.join("store/item.go"), "package store\n\ntype Item struct{}\n");
    write(&m.join("store/item_test.go"), "package store\n\ntype Broken interface {\n");
    write(&m.join("store/_scratch.go"), "this is not go\n");
    write(&m.join("store/.#store.go"), "this is not go\n");
    write(&m.join("store/store_plan9.go"), "package store\n\ntype Plan9 interface{}\n");
    write(
        &m.join("store/gen.go"),
        "//go:build ignore\n\npackage main\n\ntype Gen interface{}\n",
    );
    write(&m.join("store/README.md"), "# store\n");

    write(&m.join("util/util.go"), "package utilities\n\ntype Key string\n");
    write(
        &m.join("vendor/github.com/x/yaml.v9/yaml.go"),
        "// Package yaml.\npackage yaml\n",
    );

    let gopath = root.join("gopath");
    write(
        &gopath.join("src/example.com/lib/lib_test.go"),
        "package lib_test\n",
    );
    write(&gopath.join("src/example.com/lib/lib.go"), "package libimpl\n");

    let env = GoEnv {
        gopath: vec![gopath],
        goroot: None,
    };
    (tmp, env)
}

#[test]
fn import_filters_and_sorts_files() {
    let (tmp, env) = fixture();
    let dir = tmp.path().join("m/store");
    let pkg = PackageDir::import_with(&dir, &env).expect("import");
    assert_eq!(names(&pkg.go_files), ["item.go", "store.go"]);
    assert_eq!(pkg.import_path, "example.com/m/store");
}

#[test]
fn import_path_from_gopath() {
    let (tmp, env) = fixture();
    let dir = tmp.path().join("gopath/src/example.com/lib");
    let pkg = PackageDir::import_with(&dir, &env).expect("import");
    assert_eq!(names(&pkg.go_files), ["lib.go"]);
    assert_eq!(pkg.import_path, "example.com/lib");
}

#[test]
fn import_path_is_empty_outside_known_roots() {
    let (tmp, env) = fixture();
    let dir = tmp.path().join("loose");
    write(&dir.join("x.go"), "package loose\n");
    let pkg = PackageDir::import_with(&dir, &env).expect("import");
    assert_eq!(pkg.import_path, "");
}

#[test]
fn missing_directory_is_an_io_error() {
    let (tmp, env) = fixture();
    let err = PackageDir::import_with(&tmp.path().join("nope"), &env).expect_err("missing");
    assert!(matches!(err, Error::Io { .. }), "{err}");
}

#[test]
fn resolver_searches_module_vendor_and_gopath() {
    let (tmp, env) = fixture();
    let resolver = GoEnvResolver::new(&tmp.path().join("m/store"), &env);
    assert_eq!(
        resolver.package_name("example.com/m/util").as_deref(),
        Some("utilities")
    );
    assert_eq!(
        resolver.package_name("github.com/x/yaml.v9").as_deref(),
        Some("yaml")
    );
    assert_eq!(
        resolver.package_name("example.com/lib").as_deref(),
        Some("libimpl")
    );
    assert_eq!(resolver.package_name("example.com/absent"), None);
}

#[test]
fn walks_a_package_directory() {
    let (tmp, env) = fixture();
    let dir = tmp.path().join("m/store");
    let pkg = PackageDir::import_with(&dir, &env).expect("import");
    let files = Walker::new(GoEnvResolver::new(&dir, &env))
        .walk(&pkg.go_files, &pkg.import_path)
        .expect("walk");

    assert_eq!(files.len(), 2);
    let located = find_interface(&files, "Store", &pkg.import_path).expect("found");
    assert_eq!(located.package_name, "store");

    let get = &located.interface.methods[0];
    assert_eq!(get.args[0].ty, TypeExpr::named("example.com/m/util", "Key"));
    assert_eq!(
        get.results[0].ty,
        TypeExpr::pointer(TypeExpr::named("example.com/m/store", "Item"))
    );

    let encode = &located.interface.methods[1];
    assert_eq!(encode.args[0].ty, TypeExpr::named("github.com/x/yaml.v9", "Doc"));
    assert_eq!(encode.results[0].ty, TypeExpr::named("example.com/lib", "Blob"));

    let paths: Vec<_> = located
        .interface
        .referenced_package_paths()
        .into_iter()
        .collect();
    assert_eq!(
        paths,
        [
            "example.com/lib",
            "example.com/m/store",
            "example.com/m/util",
            "github.com/x/yaml.v9",
        ]
    );
}

#[test]
fn parse_package_dir_uses_the_enclosing_module() {
    let (tmp, env) = fixture();
    let dir = tmp.path().join("m/store");
    let files = parse_package_dir(&dir, GoEnvResolver::new(&dir, &env)).expect("walk");
    let names: Vec<_> = files
        .iter()
        .flat_map(|f| f.interfaces.iter().map(|i| i.name.as_str()))
        .collect();
    assert_eq!(names, ["Store"]);
}

#[test]
fn walk_skips_names_without_go_suffix() {
    let (tmp, env) = fixture();
    let dir = tmp.path().join("m/store");
    let files = vec![dir.join("README.md"), dir.join("item.go"), dir.join("notes.go.txt")];
    let walked = Walker::new(GoEnvResolver::new(&dir, &env))
        .walk(&files, "example.com/m/store")
        .expect("walk");
    assert_eq!(walked.len(), 1);
    assert_eq!(walked[0].package_name, "store");
    assert!(walked[0].interfaces.is_empty());
}

#[test]
fn malformed_later_file_fails_the_whole_walk() {
    let (tmp, env) = fixture();
    let dir = tmp.path().join("m/store");
    let broken = dir.join("zz_broken.go");
    write(&broken, "package store\n\ntype Bad interface {\n\tM(,)\n}\n");

    let files = vec![dir.join("item.go"), dir.join("store.go"), broken.clone()];
    let err = Walker::new(GoEnvResolver::new(&dir, &env))
        .walk(&files, "example.com/m/store")
        .expect_err("broken file");
    match err {
        Error::Syntax { file, line, column, .. } => {
            assert_eq!(file, broken.display().to_string());
            assert_eq!((line, column), (4, 4));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn unsupported_later_file_fails_the_whole_walk() {
    let (tmp, env) = fixture();
    let dir = tmp.path().join("m/store");
    let embeds = dir.join("zz_embeds.go");
    write(
        &embeds,
        "package store\n\ntype Both interface {\n\tStore\n\tClose() error\n}\n",
    );

    let err = parse_package_dir(&dir, GoEnvResolver::new(&dir, &env)).expect_err("embedded");
    match err {
        Error::Unsupported { file, line, column, message } => {
            assert_eq!(file, embeds.display().to_string());
            assert_eq!((line, column), (4, 2));
            assert!(message.contains("don't know how to mock method"), "{message}");
        }
        other => panic!("unexpected error {other}"),
    }
}
