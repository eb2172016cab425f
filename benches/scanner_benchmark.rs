use std::sync::LazyLock;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

include!(concat!(env!("OUT_DIR"), "/numbers.rs"));

static SCANNER_INPUT: LazyLock<String> =
    LazyLock::new(|| "1..5 2.5 x7 123.456 17..4 0.\n".repeat(1000));

fn builder_benchmark(c: &mut Criterion) {
    c.bench_function("builder_benchmark", |b| {
        b.iter(|| {
            black_box(
                numbers::yy_scanner_builder()
                    .build_from_bytes(Vec::new(), std::io::sink())
                    .unwrap(),
            );
        });
    });
}

fn scanner_benchmark(c: &mut Criterion) {
    c.bench_function("scanner_benchmark", |b| {
        b.iter(|| {
            let mut scanner = numbers::yy_scanner_builder()
                .build(SCANNER_INPUT.as_bytes(), std::io::sink())
                .unwrap();
            let mut count = 0;
            while scanner.yylex().unwrap() != numbers::END_OF_INPUT {
                count += 1;
            }
            black_box(count);
        });
    });
}

criterion_group!(benches, builder_benchmark, scanner_benchmark);
criterion_main!(benches);
