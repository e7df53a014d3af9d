use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use interfake::{PackageTable, StaticResolver, Walker};
use interfake_syntax::ast::Interner;
use interfake_syntax::lexer::Lexer;
use interfake_syntax::parse_source;
use std::hint::black_box as bb;

// =============================================================================
// Corpus
// =============================================================================

const SMALL_READER: &str = r#"
package sample

type Reader interface {
    Read(p []byte) (n int, err error)
}
"#;

const MEDIUM_STORE: &str = r#"
package store

import (
    "context"
    "io"
    "time"
)

type Item struct {
    Key     string
    Value   []byte
    Expires time.Time
}

type Store interface {
    Get(ctx context.Context, key string) (*Item, error)
    Put(ctx context.Context, item *Item, ttl time.Duration) error
    Delete(ctx context.Context, keys ...string) (int, error)
    Scan(ctx context.Context, prefix string, fn func(*Item) bool) error
    Watch(ctx context.Context) (<-chan Event, func())
    Export(w io.Writer) (int64, error)
}

type Event struct {
    Kind int
    Key  string
}

func (i *Item) Expired(now time.Time) bool {
    return !i.Expires.IsZero() && now.After(i.Expires)
}
"#;

/// Many interfaces and a function body per interface.
fn large_source(n: usize) -> String {
    let mut src = String::from("package gen\n\nimport (\n\t\"context\"\n\t\"io\"\n)\n");
    for i in 0..n {
        src.push_str(&format!(
            "\ntype Service{i} interface {{\n\
             \tCall{i}(ctx context.Context, req map[string][]byte) ([4]uint8, error)\n\
             \tStream{i}(w io.Writer, done <-chan struct{{}}) (n int64, err error)\n\
             }}\n\
             \nfunc helper{i}(xs []int) int {{\n\
             \tsum := 0\n\
             \tfor _, x := range xs {{ if x > {i} {{ sum += x }} }}\n\
             \treturn sum\n\
             }}\n"
        ));
    }
    src
}

fn resolver() -> StaticResolver {
    StaticResolver::new()
        .with("context", "context")
        .with("io", "io")
        .with("time", "time")
}

// =============================================================================
// Benchmark 1: Lexer
// =============================================================================

fn bench_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");
    let large = large_source(200);
    let corpora = [
        ("small", SMALL_READER),
        ("medium", MEDIUM_STORE),
        ("large", large.as_str()),
    ];

    for (name, input) in corpora {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::new("tokens", name), &input, |b, &input| {
            b.iter(|| {
                let mut acc: u64 = 0;
                for (l, _, r) in Lexer::new(bb(input)) {
                    acc = acc.wrapping_add(l as u64).wrapping_add(r as u64);
                }
                bb(acc);
            });
        });
    }
    group.finish();
}

// =============================================================================
// Benchmark 2: Parse and walk
// =============================================================================

fn bench_parse_and_walk(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_walk");
    let walker = Walker::new(resolver());

    for n in [10usize, 100, 1000] {
        let src = large_source(n);
        group.throughput(Throughput::Bytes(src.len() as u64));

        group.bench_with_input(BenchmarkId::new("parse", n), &src, |b, src| {
            b.iter(|| bb(parse_source(bb(src)).map(|p| p.arena.types.len())));
        });

        group.bench_with_input(BenchmarkId::new("walk", n), &src, |b, src| {
            b.iter(|| bb(walker.walk_source("gen.go", bb(src), "example.com/gen")));
        });
    }
    group.finish();
}

// =============================================================================
// Benchmark 3: Model rendering
// =============================================================================

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let file = Walker::new(resolver())
        .walk_source("store.go", MEDIUM_STORE, "example.com/store")
        .expect("medium corpus walks");
    let intf = &file.interfaces[0];
    let table: PackageTable = intf
        .referenced_package_paths()
        .into_iter()
        .map(|p| {
            let alias = p.rsplit('/').next().unwrap_or(&p).to_string();
            (p, alias)
        })
        .collect();

    group.bench_function("method_types", |b| {
        b.iter(|| {
            let mut total = 0usize;
            for m in &intf.methods {
                for p in m.args.iter().chain(&m.results) {
                    total += p.render_type(bb(&table)).len();
                }
            }
            bb(total)
        });
    });
    group.bench_function("package_paths", |b| {
        b.iter(|| bb(intf.referenced_package_paths()));
    });
    group.finish();
}

// =============================================================================
// Benchmark 4: String interning
// =============================================================================

fn bench_string_interning(c: &mut Criterion) {
    let mut group = c.benchmark_group("interning");
    let names: Vec<String> = (0..1000).map(|i| format!("ident_{i}")).collect();
    group.throughput(Throughput::Elements(names.len() as u64));

    group.bench_function("unique_1000", |b| {
        b.iter(|| {
            let mut interner = Interner::new();
            for s in &names {
                bb(interner.intern(s));
            }
            bb(interner);
        });
    });

    group.bench_function("duplicate_hit_1000", |b| {
        let mut interner = Interner::new();
        interner.intern("context");
        b.iter(|| {
            for _ in 0..names.len() {
                bb(interner.intern(bb("context")));
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_lexer,
    bench_parse_and_walk,
    bench_render,
    bench_string_interning
);
criterion_main!(benches);
