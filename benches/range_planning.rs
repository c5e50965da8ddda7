//! Benchmarks for range planning and window streaming.
//!
//! Measures header parsing cost and throughput of a guarded window stream.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use futures::StreamExt;
use reelmark::streaming::{plan_request, GuardedStream, CHUNK_CEILING};
use reelmark_common::{MovieId, VideoRef};
use std::io::Cursor;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

fn bench_plan_request(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_request");
    let size = 5_000_000_000u64;

    for header in ["bytes=0-", "bytes=4500000-", "bytes=123456789-123456999", "garbage"] {
        group.bench_function(header, |b| {
            b.iter(|| black_box(plan_request(Some(black_box(header)), size)))
        });
    }

    group.finish();
}

fn bench_window_stream(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("window_stream");

    for window in [64 * 1024u64, 256 * 1024, CHUNK_CEILING + 1] {
        group.throughput(Throughput::Bytes(window));
        let data = vec![0u8; window as usize * 2];

        group.bench_function(format!("guarded_{window}"), |b| {
            b.iter(|| {
                rt.block_on(async {
                    let reader = Cursor::new(data.clone()).take(window);
                    let stream = GuardedStream::new(
                        ReaderStream::new(reader),
                        VideoRef::Movie(MovieId::new()),
                        window,
                    );
                    let chunks: Vec<_> = stream.collect().await;
                    black_box(chunks)
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plan_request, bench_window_stream);
criterion_main!(benches);
