use criterion::{criterion_group, criterion_main, Criterion};

use rowgraph::{Bindings, Graph, Record, Strategy};

fn make_rows(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            Record::new()
                .with("id", (i % 64) as i64)
                .with("seq", i as i64)
                .with("tag", format!("tag-{}", i % 7))
        })
        .collect()
}

fn bench_sort(c: &mut Criterion) {
    let rows = make_rows(4096);
    c.bench_function("sort_4k_rows", |b| {
        b.iter(|| {
            let g = Graph::from_source("rows");
            g.sort(["id", "tag"]);
            let out = g
                .run(Bindings::new().records("rows", rows.clone()))
                .unwrap();
            assert_eq!(out.len(), rows.len());
        })
    });
}

fn bench_hash_join(c: &mut Criterion) {
    let left = make_rows(2048);
    let right = make_rows(2048);
    c.bench_function("inner_join_2k_x_2k", |b| {
        b.iter(|| {
            let l = Graph::from_source("left");
            let r = Graph::from_source("right");
            l.join(&r, "id", Strategy::Inner);
            let out = l
                .run(
                    Bindings::new()
                        .records("left", left.clone())
                        .records("right", right.clone()),
                )
                .unwrap();
            assert!(!out.is_empty());
        })
    });
}

fn bench_word_count(c: &mut Criterion) {
    let docs: Vec<Record> = (0..256)
        .map(|i| {
            Record::new()
                .with("doc_id", i as i64)
                .with("text", "the quick brown fox jumps over the lazy dog")
        })
        .collect();
    c.bench_function("word_count_256_docs", |b| {
        b.iter(|| {
            let g = rowgraph::algorithms::word_count_graph("docs", "text", "count");
            let out = g
                .run(Bindings::new().records("docs", docs.clone()))
                .unwrap();
            assert_eq!(out.len(), 8);
        })
    });
}

criterion_group!(benches, bench_sort, bench_hash_join, bench_word_count);
criterion_main!(benches);
