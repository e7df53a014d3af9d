use interfake::{
    find_interface, seek_interface, ChanDir, Error, Interface, NullResolver, PackageTable,
    Parameter, SourceFile, StaticResolver, TypeExpr, Walker,
};

fn walk_with(resolver: StaticResolver, src: &str, import_path: &str) -> Result<SourceFile, Error> {
    Walker::new(resolver).walk_source("sample.go", src, import_path)
}

fn walk(src: &str) -> SourceFile {
    match walk_with(StaticResolver::new(), src, "") {
        Ok(file) => file,
        Err(err) => panic!("walk failed: {err}\n--- src ---\n{src}"),
    }
}

fn walk_err(src: &str) -> Error {
    match walk_with(StaticResolver::new(), src, "") {
        Ok(file) => panic!("expected failure, got {file:?}"),
        Err(err) => err,
    }
}

fn only_interface(file: &SourceFile) -> &Interface {
    assert_eq!(file.interfaces.len(), 1, "{file}");
    &file.interfaces[0]
}

fn arg_types(intf: &Interface, method: usize) -> Vec<String> {
    intf.methods[method]
        .args
        .iter()
        .map(|p| p.render_type(&PackageTable::new()))
        .collect()
}

#[test]
fn reader_end_to_end() {
    let file = walk(
        r#"package sample

type Reader interface {
    Read(p []byte) (int, error)
}
"#,
    );
    assert_eq!(file.package_name, "sample");
    let intf = only_interface(&file);
    assert_eq!(intf.name, "Reader");
    assert_eq!(intf.methods.len(), 1);

    let read = &intf.methods[0];
    assert_eq!(read.name, "Read");
    assert_eq!(
        read.args,
        vec![Parameter::new("p", TypeExpr::slice(TypeExpr::predeclared("byte")))]
    );
    assert_eq!(
        read.results,
        vec![
            Parameter::anonymous(TypeExpr::predeclared("int")),
            Parameter::anonymous(TypeExpr::predeclared("error")),
        ]
    );
    assert!(intf.referenced_package_paths().is_empty());
}

#[test]
fn unaliased_import_is_resolved_through_the_oracle() {
    let resolver = StaticResolver::new().with("io", "io");
    let file = walk_with(
        resolver,
        r#"package sample

import "io"

type Sink interface {
    Attach(w io.Writer)
}
"#,
        "",
    )
    .expect("walk");
    let intf = only_interface(&file);
    assert_eq!(intf.methods[0].args[0].ty, TypeExpr::named("io", "Writer"));
    let paths: Vec<_> = intf.referenced_package_paths().into_iter().collect();
    assert_eq!(paths, ["io"]);
}

#[test]
fn oracle_name_differs_from_the_path() {
    let resolver = StaticResolver::new().with("github.com/acme/go-store", "store");
    let file = walk_with(
        resolver,
        r#"package sample

import "github.com/acme/go-store"

type Repo interface {
    Load(id store.ID) (*store.Item, error)
}
"#,
        "",
    )
    .expect("walk");
    let intf = only_interface(&file);
    assert_eq!(
        intf.methods[0].results[0].ty,
        TypeExpr::pointer(TypeExpr::named("github.com/acme/go-store", "Item"))
    );
}

#[test]
fn unresolved_import_falls_back_to_last_segment() {
    let file = Walker::new(NullResolver)
        .walk_source(
            "sample.go",
            r#"package sample

import "gopkg.in/yaml.v3"

type Codec interface {
    Decode(n *yaml.Node) error
}
"#,
            "",
        )
        .expect("walk");
    let intf = only_interface(&file);
    assert_eq!(
        intf.methods[0].args[0].ty,
        TypeExpr::pointer(TypeExpr::named("gopkg.in/yaml.v3", "Node"))
    );
}

#[test]
fn alias_collision_fails_the_walk() {
    let err = walk_err(
        r#"package sample

import (
    x "example.com/a"
    x "example.com/b"
)

type I interface { M() }
"#,
    );
    match err {
        Error::ImportCollision { name, .. } => assert_eq!(name, "x"),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn blank_and_dot_imports_add_no_qualifiers() {
    let file = walk(
        r#"package sample

import (
    _ "embed"
    _ "time/tzdata"
    . "strings"
)

type I interface { M(b Builder) }
"#,
    );
    let intf = only_interface(&file);
    assert_eq!(intf.methods[0].args[0].ty, TypeExpr::named("", "Builder"));
}

#[test]
fn second_dot_import_collides() {
    let err = walk_err(
        r#"package sample

import (
    . "a/x"
    . "b/y"
)

type I interface { M() }
"#,
    );
    match err {
        Error::ImportCollision { file, name } => {
            assert_eq!(file, "sample.go");
            assert_eq!(name, ".");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn deeply_nested_parameter_type_is_a_syntax_error() {
    let src = format!(
        "package sample\n\ntype I interface {{\n\tM(x {}int)\n}}\n",
        "*".repeat(500)
    );
    match walk_err(&src) {
        Error::Syntax { line, message, .. } => {
            assert_eq!(line, 4);
            assert_eq!(message, "exceeded max nesting depth");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn local_exported_names_use_the_declaring_path() {
    let file = walk_with(
        StaticResolver::new(),
        r#"package store

type Store interface {
    Get(k Key) (*Item, bool)
}
"#,
        "example.com/m/store",
    )
    .expect("walk");
    let intf = only_interface(&file);
    let get = &intf.methods[0];
    assert_eq!(get.args[0].ty, TypeExpr::named("example.com/m/store", "Key"));
    assert_eq!(get.results[1].ty, TypeExpr::predeclared("bool"));
    let paths: Vec<_> = intf.referenced_package_paths().into_iter().collect();
    assert_eq!(paths, ["example.com/m/store"]);
}

#[test]
fn every_type_form() {
    let resolver = StaticResolver::new().with("context", "context");
    let file = walk_with(
        resolver,
        r#"package sample

import "context"

type Everything interface {
    Run(ctx context.Context, grid [3][2]int, m map[string][]*Item, in <-chan int, out chan<- error, both chan bool)
    Each(fn func(int, string) (bool, error)) func()
    Blank(v interface{}, s struct{}) (any)
    Opts(name string, opts ...Option)
    Pair(a, b int)
}
"#,
        "",
    )
    .expect("walk");
    let intf = only_interface(&file);

    assert_eq!(
        arg_types(intf, 0),
        [
            "context.Context",
            "[3][2]int",
            "map[string][]*Item",
            "<-chan int",
            "chan<- error",
            "chan bool",
        ]
    );
    assert_eq!(arg_types(intf, 1), ["func(int, string) (bool, error)"]);
    assert_eq!(
        intf.methods[1].results[0].ty.render(&PackageTable::new()),
        "func()"
    );
    assert_eq!(arg_types(intf, 2), ["interface{}", "struct{}"]);
    assert_eq!(intf.methods[2].results[0].ty, TypeExpr::predeclared("any"));

    let opts = &intf.methods[3].args[1];
    assert!(opts.variadic);
    assert_eq!(opts.ty, TypeExpr::slice(TypeExpr::named("", "Option")));
    assert_eq!(arg_types(intf, 3), ["string", "...Option"]);

    let pair = &intf.methods[4].args;
    assert_eq!(pair.len(), 2);
    assert_eq!((pair[0].name.as_str(), pair[1].name.as_str()), ("a", "b"));

    let in_chan = &intf.methods[0].args[3].ty;
    assert!(matches!(in_chan, TypeExpr::Chan { dir: ChanDir::Recv, .. }));
}

#[test]
fn interfaces_in_grouped_declarations_keep_order() {
    let file = walk(
        r#"package sample

type (
    ID string
    First interface { A() }
    Second interface { B(); C() }
)

type Third interface{}

func helper() interface{ M() } { return nil }
"#,
    );
    let names: Vec<_> = file.interfaces.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["First", "Second", "Third"]);
    let second: Vec<_> = file.interfaces[1].methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(second, ["B", "C"]);
    assert!(file.interfaces[2].methods.is_empty());
}

#[test]
fn embedded_interface_is_unsupported() {
    let err = walk_err(
        r#"package sample

import "io"

type ReadCloser interface {
    io.Reader
    Close() error
}
"#,
    );
    let msg = err.to_string();
    assert!(msg.starts_with("sample.go:6:5: "), "{msg}");
    assert!(msg.contains("don't know how to mock method of type io.Reader"), "{msg}");
}

#[test]
fn bad_array_size_is_unsupported() {
    let err = walk_err(
        r#"package sample

const N = 4

type Buf interface {
    Fill(b [N]byte)
}
"#,
    );
    match err {
        Error::Unsupported {
            line,
            column,
            message,
            ..
        } => {
            assert_eq!((line, column), (6, 13));
            assert!(message.starts_with("bad array size"), "{message}");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn unknown_package_is_unsupported() {
    let err = walk_err("package sample\n\ntype I interface {\n\tM(t time.Time)\n}\n");
    assert_eq!(
        err.to_string(),
        "sample.go:4:6: unknown package \"time\""
    );
}

#[test]
fn anonymous_non_empty_literals_are_unsupported() {
    let err = walk_err("package sample\n\ntype I interface {\n\tM(v struct{ X int })\n}\n");
    assert!(err.to_string().contains("can't handle non-empty unnamed struct types"));

    let err = walk_err("package sample\n\ntype I interface {\n\tM(v interface{ X() })\n}\n");
    assert!(err.to_string().contains("can't handle non-empty unnamed interface types"));
}

#[test]
fn generics_are_unsupported() {
    let err = walk_err("package sample\n\ntype I interface {\n\tM(l List[int])\n}\n");
    assert!(err.to_string().contains("generic type List[int] is not supported"));

    let err = walk_err("package sample\n\ntype I[T any] interface {\n\tM(t T)\n}\n");
    assert!(err.to_string().contains("generic interface I is not supported"));
}

#[test]
fn syntax_errors_carry_positions() {
    let err = walk_err("package sample\n\ntype I interface {\n\tM(,)\n}\n");
    match err {
        Error::Syntax { file, line, column, .. } => {
            assert_eq!(file, "sample.go");
            assert_eq!((line, column), (4, 4));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn lookup_reports_not_found() {
    let files = vec![
        walk("package a\n\ntype Other interface{}\n"),
        walk("package b\n\ntype Target interface { M() }\n"),
        walk("package c\n\ntype Target interface{}\n"),
    ];

    let (intf, pkg) = seek_interface(&files, "Target").expect("found");
    assert_eq!(pkg, "b");
    assert_eq!(intf.methods.len(), 1);

    let located = find_interface(&files, "Target", "example.com/b").expect("found");
    assert_eq!(located.package_name, "b");
    assert_eq!(located.import_path, "example.com/b");

    assert!(seek_interface(&files, "Missing").is_none());
    match find_interface(&files, "Missing", "") {
        Err(Error::NotFound { name }) => assert_eq!(name, "Missing"),
        other => panic!("unexpected {other:?}"),
    }
}
