use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vidsearch_core::search::rank;
use vidsearch_core::{
    Embedder, IndexEntry, IndexMetadata, StaticEmbedder, TranscriptVector, VideoIndex,
    EMBEDDING_DIM,
};

fn build_index(embedder: &StaticEmbedder, size: usize) -> VideoIndex {
    let entries = (0..size)
        .map(|i| IndexEntry {
            video_id: format!("video-{}", i),
            title: format!("title {}", i),
            title_embedding: embedder.embed(&format!("title {}", i)).unwrap(),
            transcript_embedding: if i % 4 == 0 {
                TranscriptVector::Missing
            } else {
                TranscriptVector::Embedded(embedder.embed(&format!("transcript {}", i)).unwrap())
            },
        })
        .collect();
    VideoIndex::new(IndexMetadata::new("static", EMBEDDING_DIM), entries).unwrap()
}

fn bench_rank(c: &mut Criterion) {
    let embedder = StaticEmbedder::new(EMBEDDING_DIM);
    let query = embedder.embed("deep learning").unwrap();

    let mut group = c.benchmark_group("rank");
    for size in [1_000usize, 10_000] {
        let index = build_index(&embedder, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &index, |b, index| {
            b.iter(|| rank(black_box(index), black_box(&query), 1_000.0, 10).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);
