/// 位置インデックス検索と重心分類の性能ベンチマーク。
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use podcast_analytics::classifier::{GenreCentroid, NearestCentroidClassifier};
use podcast_analytics::util::PositionIndex;

fn bench_position_lookup(c: &mut Criterion) {
    let first_releases: Vec<i64> = (0..100_000).map(|i| (i * 7_919) % 5_000_000 * 60).collect();
    let index = PositionIndex::build(first_releases);

    c.bench_function("position_lookup_100k", |b| {
        let mut query = 0i64;
        b.iter(|| {
            query = (query + 86_400) % 300_000_000;
            black_box(index.position_of_value_or_one_below(black_box(query)));
        });
    });
}

fn bench_classify(c: &mut Criterion) {
    let table: Vec<GenreCentroid> = (0..40)
        .map(|i| {
            let x = f64::from(i);
            GenreCentroid::new(format!("genre-{i}"), 600_000.0 + x * 90_000.0, 50.0 + x * 17.0)
        })
        .collect();
    let classifier = NearestCentroidClassifier::fit(table).expect("fit");

    c.bench_function("classify_40_genres", |b| {
        b.iter(|| {
            let result = classifier
                .classify(black_box(2_400_000.0), black_box(320.0))
                .expect("classify");
            black_box(result.confidence);
        });
    });
}

criterion_group!(benches, bench_position_lookup, bench_classify);
criterion_main!(benches);
