//! Throughput benchmarks for catalog population and queries.
//!
//! Measures:
//! - Population from synthetic responses of increasing size
//! - Duration lookups in both containment modes
//! - Combined multi-filter search

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use contractbook::{Catalog, ContractFilter, DurationValue};
use serde_json::{Value, json};

const MODALITIES: [(&str, &str, &str, &str); 6] = [
    ("callput", "Rise/Fall", "5t", "365d"),
    ("callput", "Higher/Lower", "15m", "365d"),
    ("touchnotouch", "Touch/No Touch", "5t", "365d"),
    ("endsinout", "Ends Between/Ends Outside", "2m", "365d"),
    ("digits", "Even/Odd", "1t", "10t"),
    ("asian", "Asians", "5t", "10t"),
];

/// Synthetic responses with `symbols` instruments spread over 4 markets.
fn responses(symbols: usize) -> (Value, Value) {
    let mut assets = Vec::with_capacity(symbols);
    let mut actives = Vec::with_capacity(symbols);
    for i in 0..symbols {
        let symbol = format!("SYM{i:05}");
        let offerings: Vec<Value> = MODALITIES
            .iter()
            .enumerate()
            .filter(|(k, _)| (i + k) % 3 != 0)
            .map(|(_, (g, m, min, max))| json!([g, m, min, max]))
            .collect();
        assets.push(json!([symbol, symbol, offerings]));
        actives.push(json!({
            "symbol": symbol,
            "display_name": format!("Instrument {i}"),
            "market": format!("market_{}", i % 4),
            "market_display_name": format!("Market {}", i % 4),
            "submarket": format!("sub_{}", i % 16),
            "submarket_display_name": format!("Submarket {}", i % 16),
            "exchange_is_open": (i % 5 != 0) as u8,
            "is_trading_suspended": (i % 17 == 0) as u8
        }));
    }
    (json!({ "asset_index": assets }), json!({ "active_symbols": actives }))
}

fn bench_populate(c: &mut Criterion) {
    let mut group = c.benchmark_group("populate");

    for symbols in [10, 100, 1000] {
        let (assets, actives) = responses(symbols);
        group.throughput(Throughput::Elements(symbols as u64));
        group.bench_with_input(BenchmarkId::from_parameter(symbols), &symbols, |b, _| {
            let mut catalog = Catalog::new();
            b.iter(|| black_box(catalog.populate(&assets, &actives)));
        });
    }

    group.finish();
}

fn bench_by_duration(c: &mut Criterion) {
    let mut group = c.benchmark_group("by_duration");
    let (assets, actives) = responses(1000);
    let catalog = Catalog::from_responses(&assets, &actives).unwrap();
    let value = DurationValue::parse("7t").unwrap();

    for fit in [true, false] {
        group.bench_with_input(BenchmarkId::new("fit_in_units", fit), &fit, |b, &fit| {
            b.iter(|| black_box(catalog.by_duration(&value, fit).len()));
        });
    }

    group.finish();
}

fn bench_find_matches(c: &mut Criterion) {
    let (assets, actives) = responses(1000);
    let catalog = Catalog::from_responses(&assets, &actives).unwrap();
    let filter = ContractFilter::new()
        .market("market 2")
        .modality_group("callput")
        .duration(DurationValue::parse("30m").unwrap());

    c.bench_function("find_matches", |b| {
        b.iter(|| black_box(catalog.find_matches(&filter).len()));
    });

    c.bench_function("available_contracts", |b| {
        b.iter(|| black_box(catalog.available_contracts().len()));
    });
}

criterion_group!(benches, bench_populate, bench_by_duration, bench_find_matches);
criterion_main!(benches);
