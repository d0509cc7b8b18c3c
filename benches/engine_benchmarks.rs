//! Criterion benchmarks: move generation, perft, evaluation, and a fixed
//! shallow search.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gambit::board::{evaluate, Board};
use gambit::search::{Search, SearchParams};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -";

fn bench_movegen(c: &mut Criterion) {
    let startpos = Board::new();
    let kiwipete = Board::from_fen(KIWIPETE).unwrap();

    c.bench_function("movegen_startpos", |b| {
        b.iter(|| black_box(&startpos).generate_moves().len())
    });
    c.bench_function("movegen_kiwipete", |b| {
        b.iter(|| black_box(&kiwipete).generate_moves().len())
    });
    c.bench_function("movegen_kiwipete_noisy", |b| {
        b.iter(|| black_box(&kiwipete).generate_noisy_moves().len())
    });
}

fn bench_perft(c: &mut Criterion) {
    c.bench_function("perft_startpos_4", |b| {
        let mut board = Board::new();
        b.iter(|| board.perft(black_box(4)))
    });
    c.bench_function("perft_kiwipete_3", |b| {
        let mut board = Board::from_fen(KIWIPETE).unwrap();
        b.iter(|| board.perft(black_box(3)))
    });
}

fn bench_eval(c: &mut Criterion) {
    let board = Board::from_fen(KIWIPETE).unwrap();
    c.bench_function("evaluate_kiwipete", |b| b.iter(|| evaluate(black_box(&board))));
}

fn bench_search(c: &mut Criterion) {
    let board = Board::from_fen(KIWIPETE).unwrap();
    let params = SearchParams {
        max_depth: 5,
        max_workers: 1,
        ..SearchParams::default()
    };
    c.bench_function("search_kiwipete_depth5", |b| {
        b.iter(|| {
            let search = Search::new();
            search.start_search(black_box(&board), &params, None, false, None);
        })
    });
}

criterion_group!(benches, bench_movegen, bench_perft, bench_eval, bench_search);
criterion_main!(benches);
