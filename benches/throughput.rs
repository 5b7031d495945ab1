use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use riceledger::{
    account::store::AccountStore,
    codec::{decode, encode},
    record::TransactionRecord,
    resolve::HashedResolver,
};

fn record(id: &str, batches: usize) -> TransactionRecord {
    TransactionRecord {
        transaction_id: id.to_string(),
        transaction_type: "purchase".to_string(),
        from_actor_id: 1,
        to_actor_id: 2,
        batch_ids: (0..batches as u64).collect(),
        quantity: "1000".to_string(),
        unit_price: "2.50".to_string(),
        total_amount: "2500.00".to_string(),
        payment_reference: vec![format!("PAY-{id}")],
        transaction_date: "2024-07-21T10:00:00Z".to_string(),
        status: "completed".to_string(),
        notes: Some("bench".to_string()),
    }
}

fn bench_encode(c: &mut Criterion) {
    let rec = record("BENCH001", 8);
    c.bench_function("encode_record", |b| {
        b.iter(|| encode(&rec).expect("encode"));
    });
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let mut binary = encode(&record("BENCH002", 8)).expect("encode");
    binary.resize(1000, 0);
    let mut legacy = br#"{"transaction_id":"REAL001","from_actor_id":1,"to_actor_id":2,"batch_ids":[1,2],"status":"completed"}"#.to_vec();
    legacy.resize(1000, 0);
    let zeroed = vec![0u8; 1000];

    for (name, buf) in [("binary", &binary), ("legacy", &legacy), ("zeroed", &zeroed)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), buf, |b, buf| {
            b.iter(|| decode(buf));
        });
    }

    group.finish();
}

fn bench_store_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("store_scan");
    for n in [100usize, 1000usize, 5000usize] {
        let mut store = AccountStore::default();
        for i in 0..n {
            store
                .create(&HashedResolver, &record(&format!("T{i}"), 2))
                .expect("create");
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &store, |b, store| {
            b.iter(|| store.scan());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_store_scan);
criterion_main!(benches);
