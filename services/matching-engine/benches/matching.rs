//! Matching hot-path benchmarks.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use matching_engine::{OrderBook, OrderPool};
use std::sync::Arc;
use types::ids::{OrderId, Symbol};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

fn order(id: u64, side: Side, price: u64, qty: u32) -> Order {
    Order::try_new(
        OrderId::new(id),
        side,
        Price::from_u64(price),
        Quantity::new(qty),
    )
    .unwrap()
}

fn seeded_book(levels: u64, per_level: u64) -> (OrderBook, Arc<OrderPool>) {
    let pool = Arc::new(OrderPool::new());
    let book = OrderBook::new(Symbol::from("STOCK"), Arc::clone(&pool));
    let mut id = 0;
    for level in 0..levels {
        for _ in 0..per_level {
            let o = order(id, Side::Sell, 101 + level, 10);
            let handle = pool.acquire(o).unwrap();
            book.add_order(&o, "maker", handle);
            id += 1;
        }
    }
    (book, pool)
}

fn bench_add_resting(c: &mut Criterion) {
    c.bench_function("add_resting_bid", |b| {
        b.iter_batched(
            || seeded_book(10, 10),
            |(book, pool)| {
                let o = order(10_000, Side::Buy, 100, 10);
                let handle = pool.acquire(o).unwrap();
                book.add_order(&o, "bench", handle);
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_sweep_three_levels(c: &mut Criterion) {
    c.bench_function("sweep_three_levels", |b| {
        b.iter_batched(
            || seeded_book(10, 10),
            |(book, pool)| {
                let o = order(10_000, Side::Buy, 103, 300);
                let handle = pool.acquire(o).unwrap();
                book.add_order(&o, "bench", handle);
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_top_of_book(c: &mut Criterion) {
    let (book, _pool) = seeded_book(10, 10);
    c.bench_function("top_of_book", |b| b.iter(|| book.top_of_book()));
}

criterion_group!(
    benches,
    bench_add_resting,
    bench_sweep_three_levels,
    bench_top_of_book
);
criterion_main!(benches);
