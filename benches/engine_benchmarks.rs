//! Benchmarks for perft throughput, move generation, and search.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use parking_lot::RwLock;

use mailbox_chess_core::{Board, TranspositionTable};
use mailbox_chess_core::searcher::{SearchLimits, Searcher};

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");

    let mut startpos = Board::new();
    for depth in 1..=4 {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| startpos.perft(black_box(depth)))
        });
    }

    let mut kiwipete =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    for depth in 1..=3 {
        group.bench_with_input(BenchmarkId::new("kiwipete", depth), &depth, |b, &depth| {
            b.iter(|| kiwipete.perft(black_box(depth)))
        });
    }

    group.finish();
}

fn bench_movegen(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");

    let mut startpos = Board::new();
    group.bench_function("startpos", |b| b.iter(|| black_box(startpos.all_moves())));

    let mut middlegame =
        Board::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4")
            .unwrap();
    group.bench_function("middlegame", |b| {
        b.iter(|| black_box(middlegame.all_moves()))
    });

    let mut kiwipete =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    group.bench_function("kiwipete", |b| b.iter(|| black_box(kiwipete.all_moves())));

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    for depth in [3, 4, 5] {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut board = Board::new();
                let tt = Arc::new(RwLock::new(TranspositionTable::new(16)));
                let stop = Arc::new(AtomicBool::new(false));
                let mut searcher = Searcher::new(&mut board, tt, stop);
                searcher.iterative_deepening(SearchLimits {
                    max_depth: depth,
                    max_duration: None,
                })
            })
        });
    }

    for depth in [3, 4] {
        group.bench_with_input(BenchmarkId::new("tactical", depth), &depth, |b, &depth| {
            b.iter(|| {
                let mut board = Board::from_fen(
                    "r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4",
                )
                .unwrap();
                let tt = Arc::new(RwLock::new(TranspositionTable::new(16)));
                let stop = Arc::new(AtomicBool::new(false));
                let mut searcher = Searcher::new(&mut board, tt, stop);
                searcher.iterative_deepening(SearchLimits {
                    max_depth: depth,
                    max_duration: None,
                })
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_perft, bench_movegen, bench_search);
criterion_main!(benches);
