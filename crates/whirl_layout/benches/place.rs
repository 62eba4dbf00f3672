//! Placement throughput for typical carousel rows

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use whirl_core::{Rect, Size, SizeProposal};
use whirl_layout::{WrapLayout, WrapShift};

fn bench_place(c: &mut Criterion) {
    let bounds = Rect::new(0.0, 0.0, 1280.0, 200.0);
    let proposal = SizeProposal::fixed(bounds.size);
    let mut group = c.benchmark_group("wrap_place");

    for count in [15usize, 64, 512] {
        let items: Vec<Size> = (0..count)
            .map(|i| Size::new(120.0 + (i % 5) as f32 * 30.0, 200.0))
            .collect();

        group.bench_with_input(BenchmarkId::new("place", count), &items, |b, items| {
            let mut offset = 0.0_f64;
            b.iter(|| {
                offset += 0.2;
                black_box(WrapLayout::horizontal(offset).place(items, bounds, proposal))
            })
        });

        group.bench_with_input(BenchmarkId::new("place_into", count), &items, |b, items| {
            let mut offset = 0.0_f64;
            b.iter(|| {
                offset -= 0.2;
                let mut wrapped = 0usize;
                WrapLayout::horizontal(offset).place_into(items, bounds, proposal, &mut |p| {
                    if p.wrapped != WrapShift::None {
                        wrapped += 1;
                    }
                });
                black_box(wrapped)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_place);
criterion_main!(benches);
