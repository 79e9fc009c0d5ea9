use std::str::FromStr;

use bigdecimal::BigDecimal;
use clickhouse_columns::{resolve, ClientSettings, Column, Context, SliceBuffer, Value};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn column(type_name: &str) -> Column {
    let context = Context::default()
        .with_settings(ClientSettings::default().with_types_check(true));
    resolve(type_name, &context).unwrap()
}

fn ints(n: u64) -> Vec<Value> {
    (0..n)
        .map(|i| if i % 10 == 0 { Value::Null } else { Value::Int(i.into()) })
        .collect()
}

fn strings(n: u64) -> Vec<Value> {
    (0..n).map(|i| Value::Str(format!("value {}", i))).collect()
}

fn decimals(n: u64) -> Vec<Value> {
    (0..n)
        .map(|i| Value::Decimal(BigDecimal::from_str(&format!("-{}.125", i)).unwrap()))
        .collect()
}

fn encode(column: &Column, items: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();
    column.write_data(items, &mut out).unwrap();
    out
}

fn criterion_benchmark(c: &mut Criterion) {
    let sizes = [100, 1_000, 10_000];
    let cases: [(&str, fn(u64) -> Vec<Value>); 3] = [
        ("Nullable(Int64)", ints),
        ("String", strings),
        ("Decimal(38, 3)", decimals),
    ];

    let mut group = c.benchmark_group("write");
    for size in &sizes {
        group.throughput(criterion::Throughput::Elements(*size));
        for (type_name, make) in &cases {
            let col = column(type_name);
            let items = make(*size);
            group.bench_with_input(BenchmarkId::new(*type_name, size), &items, |b, items| {
                b.iter(|| encode(&col, items))
            });
        }
    }
    group.finish();

    let mut group = c.benchmark_group("read");
    for size in &sizes {
        group.throughput(criterion::Throughput::Elements(*size));
        for (type_name, make) in &cases {
            let col = column(type_name);
            let bytes = encode(&col, &make(*size));
            let n_items = *size as usize;
            group.bench_with_input(BenchmarkId::new(*type_name, size), &bytes, |b, bytes| {
                b.iter(|| {
                    col.read_data(n_items, &mut SliceBuffer::from(&bytes[..]))
                        .unwrap()
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
