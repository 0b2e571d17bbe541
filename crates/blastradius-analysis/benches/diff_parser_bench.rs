//! Diff-parser benchmark: every coupling engine that surfaces git
//! evidence routes through `parse_diff`, so its cost scales with how
//! often co-change fires.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use blastradius_analysis::diff::parse_diff;

fn make_diff(hunks: usize, lines_per_hunk: usize) -> String {
    let mut raw = String::new();
    for h in 0..hunks {
        raw.push_str(&format!("@@ -{},{} +{},{} @@\n", h * 10, lines_per_hunk, h * 10, lines_per_hunk));
        for i in 0..lines_per_hunk {
            raw.push_str(&format!("-old line {h}-{i} in the function body\n"));
            raw.push_str(&format!("+new line {h}-{i} in the function body\n"));
        }
    }
    raw
}

fn bench_parse_diff(c: &mut Criterion) {
    let small = make_diff(1, 10);
    let medium = make_diff(5, 50);
    let large = make_diff(20, 200);

    c.bench_function("parse_diff_small", |b| {
        b.iter(|| black_box(parse_diff(black_box(&small))))
    });

    c.bench_function("parse_diff_medium", |b| {
        b.iter(|| black_box(parse_diff(black_box(&medium))))
    });

    c.bench_function("parse_diff_large", |b| {
        b.iter(|| black_box(parse_diff(black_box(&large))))
    });
}

criterion_group!(benches, bench_parse_diff);
criterion_main!(benches);
