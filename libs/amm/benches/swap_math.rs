//! Swap and unit math benchmarks
//!
//! Every queued swap is scored and then executed, so these paths run several
//! times per swap per block.

use amm::{issue_units, swap, SwapMath};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use engine_config::EngineConfig;
use std::collections::BTreeMap;
use types::{Asset, Pool, PoolStatus, Uint};

fn pools() -> BTreeMap<Asset, Pool> {
    let mut map = BTreeMap::new();
    for (asset, native, depth) in [
        ("BTC.BTC", 2_000_000_000_000u64, 10_000_000_000u64),
        ("ETH.ETH", 1_500_000_000_000, 300_000_000_000),
    ] {
        let mut pool = Pool::new(asset.parse().unwrap());
        pool.balance_native = Uint::from(native);
        pool.balance_asset = Uint::from(depth);
        pool.lp_units = Uint::from(native);
        pool.status = PoolStatus::Available;
        map.insert(pool.asset.clone(), pool);
    }
    map
}

fn bench_swap_calc(c: &mut Criterion) {
    let x_depth = Uint::from(2_000_000_000_000u64);
    let y_depth = Uint::from(10_000_000_000u64);

    c.bench_function("get_swap_calc_nominal", |b| {
        b.iter(|| SwapMath::get_swap_calc(black_box(x_depth), black_box(Uint::from(50_000_000_000u64)), y_depth, Uint::ZERO))
    });

    c.bench_function("get_swap_calc_with_floor", |b| {
        b.iter(|| SwapMath::get_swap_calc(black_box(x_depth), black_box(Uint::from(1_000_000u64)), y_depth, Uint::from(5u64)))
    });
}

fn bench_issue_units(c: &mut Criterion) {
    let depth = Uint::from(2_000_000_000_000u64);
    c.bench_function("issue_units_asymmetric", |b| {
        b.iter(|| {
            issue_units(
                black_box(depth),
                black_box(depth),
                black_box(Uint::from(10_000_000_000u64)),
                black_box(Uint::from(7_000_000u64)),
                black_box(Uint::from(3_000u64)),
            )
        })
    });
}

fn bench_router(c: &mut Criterion) {
    let pools = pools();
    let config = EngineConfig::default();
    let btc: Asset = "BTC.BTC".parse().unwrap();
    let eth: Asset = "ETH.ETH".parse().unwrap();

    c.bench_function("double_swap_btc_eth", |b| {
        b.iter(|| swap(&pools, black_box(&btc), black_box(&eth), Uint::from(100_000_000u64), Uint::ZERO, &config))
    });

    c.bench_function("synth_mint", |b| {
        let synth = btc.synthetic();
        b.iter(|| swap(&pools, black_box(&Asset::native()), black_box(&synth), Uint::from(100_000_000u64), Uint::ZERO, &config))
    });
}

criterion_group!(benches, bench_swap_calc, bench_issue_units, bench_router);
criterion_main!(benches);
