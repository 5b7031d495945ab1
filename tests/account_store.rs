use riceledger::{
    account::store::{AccountStore, StoreError},
    codec::{encode, encoded_len, DecodeOutcome},
    config::{ConfigError, LedgerConfig},
    record::{NotesPatch, TransactionPatch, TransactionRecord},
    resolve::{AddressResolver, HashedResolver, ResolveError},
    types::Address,
};

fn record(id: &str, from: u64, to: u64, batches: &[u64]) -> TransactionRecord {
    TransactionRecord {
        transaction_id: id.to_string(),
        transaction_type: "purchase".to_string(),
        from_actor_id: from,
        to_actor_id: to,
        batch_ids: batches.to_vec(),
        quantity: "1000".to_string(),
        unit_price: "2.50".to_string(),
        total_amount: "2500.00".to_string(),
        payment_reference: vec![format!("PAY-{id}")],
        transaction_date: "2024-07-21T10:00:00Z".to_string(),
        status: "completed".to_string(),
        notes: None,
    }
}

#[test]
fn create_writes_zero_padded_account_at_resolved_address() {
    let mut store = AccountStore::new(LedgerConfig::default());
    let rec = record("WORK001", 1, 2, &[1]);
    let (resolved, write) = store.create(&HashedResolver, &rec).expect("create");

    let expected = HashedResolver
        .resolve_transaction("transaction", "WORK001", &Address::default())
        .expect("resolve");
    assert_eq!(resolved, expected);
    assert_eq!(write.seq, 1);
    assert_eq!(write.data.len(), 1000);

    let raw = store.raw(resolved.address).expect("raw");
    let len = encoded_len(&rec);
    assert!(raw[len..].iter().all(|b| *b == 0));
    assert_eq!(store.read(resolved.address), Some(DecodeOutcome::Record(rec)));
}

#[test]
fn duplicate_create_is_rejected() {
    let mut store = AccountStore::default();
    let rec = record("WORK001", 1, 2, &[1]);
    let (resolved, _) = store.create(&HashedResolver, &rec).expect("create");
    assert_eq!(
        store.create(&HashedResolver, &rec),
        Err(StoreError::AlreadyExists(resolved.address))
    );
}

#[test]
fn zeroed_account_is_reused_by_create() {
    let mut store = AccountStore::default();
    let rec = record("WORK002", 2, 3, &[]);
    let address = HashedResolver
        .resolve_transaction("transaction", "WORK002", &Address::default())
        .expect("resolve")
        .address;
    store.insert_raw(address, vec![0u8; 1000]);
    assert_eq!(store.read(address), Some(DecodeOutcome::Absent));

    store.create(&HashedResolver, &rec).expect("create over zeroed");
    assert_eq!(store.get(address), Some(rec));
    assert_eq!(store.len(), 1);
}

#[test]
fn record_larger_than_account_is_rejected() {
    let mut store = AccountStore::new(LedgerConfig {
        account_space: 64,
        ..LedgerConfig::default()
    });
    let rec = record("WORK003", 1, 2, &[1, 2, 3]);
    let needed = encoded_len(&rec);
    assert_eq!(
        store.create(&HashedResolver, &rec),
        Err(StoreError::AccountTooSmall { needed, space: 64 })
    );
    assert!(store.is_empty());
}

#[test]
fn long_transaction_id_cannot_seed_an_address() {
    let mut store = AccountStore::default();
    let rec = record(&"X".repeat(40), 1, 2, &[]);
    assert_eq!(
        store.create(&HashedResolver, &rec),
        Err(StoreError::Resolve(ResolveError::SeedTooLong { index: 1, len: 40 }))
    );
}

#[test]
fn update_rewrites_whole_record_and_keeps_original_value() {
    let mut store = AccountStore::default();
    let rec = record("WORK004", 1, 2, &[1]);
    let (resolved, _) = store.create(&HashedResolver, &rec).expect("create");

    let patch = TransactionPatch {
        quantity: Some("950".to_string()),
        notes: NotesPatch::Set("re-weighed".to_string()),
        ..TransactionPatch::default()
    };
    let (next, write) = store.update(resolved.address, &patch).expect("update");
    assert_eq!(write.seq, 2);
    assert_eq!(next.quantity, "950");
    assert_eq!(rec.quantity, "1000");
    assert_eq!(store.get(resolved.address), Some(next));
}

#[test]
fn replace_requires_matching_id_and_existing_account() {
    let mut store = AccountStore::default();
    let rec = record("WORK005", 1, 2, &[1]);
    let (resolved, _) = store.create(&HashedResolver, &rec).expect("create");

    let other = record("OTHER", 1, 2, &[1]);
    assert!(matches!(
        store.replace(resolved.address, &other),
        Err(StoreError::IdMismatch { .. })
    ));

    let missing = Address::new([9; 32]);
    assert_eq!(
        store.replace(missing, &rec),
        Err(StoreError::MissingAccount(missing))
    );

    store.insert_raw(missing, vec![0xAB; 80]);
    assert_eq!(
        store.update(missing, &TransactionPatch::default()),
        Err(StoreError::NotDecodable(missing))
    );
}

#[test]
fn indices_follow_rewrites() {
    let mut store = AccountStore::default();
    let (a, _) = store.create(&HashedResolver, &record("T-A", 1, 2, &[10])).expect("a");
    let (b, _) = store.create(&HashedResolver, &record("T-B", 2, 3, &[10, 11])).expect("b");

    let ids = |v: Vec<(Address, TransactionRecord)>| -> Vec<String> {
        v.into_iter().map(|(_, r)| r.transaction_id).collect()
    };
    assert_eq!(ids(store.by_actor(2)), vec!["T-A", "T-B"]);
    assert_eq!(ids(store.by_batch(10)), vec!["T-A", "T-B"]);
    assert_eq!(ids(store.by_batch(11)), vec!["T-B"]);

    let mut moved = record("T-B", 4, 3, &[12]);
    moved.status = "pending".to_string();
    store.replace(b.address, &moved).expect("replace");
    assert_eq!(ids(store.by_actor(2)), vec!["T-A"]);
    assert_eq!(ids(store.by_actor(4)), vec!["T-B"]);
    assert!(store.by_batch(11).is_empty());
    assert_eq!(ids(store.by_batch(12)), vec!["T-B"]);
    assert_eq!(store.addresses(), &[a.address, b.address]);
}

#[test]
fn self_transfer_is_indexed_once() {
    let mut store = AccountStore::default();
    store.create(&HashedResolver, &record("T-S", 5, 5, &[3, 3])).expect("create");
    assert_eq!(store.by_actor(5).len(), 1);
    assert_eq!(store.by_batch(3).len(), 1);
}

#[test]
fn scan_skips_absent_and_undecodable_accounts() {
    let mut store = AccountStore::default();
    store.create(&HashedResolver, &record("T-1", 1, 2, &[])).expect("create");
    store.insert_raw(Address::new([1; 32]), vec![0u8; 128]);
    store.insert_raw(Address::new([2; 32]), vec![0xFF; 7]);
    let legacy = br#"{"transaction_id":"REAL001","from_actor_id":1,"to_actor_id":2}"#;
    let mut legacy_buf = legacy.to_vec();
    legacy_buf.resize(165, 0);
    store.insert_raw(Address::new([3; 32]), legacy_buf);

    let ids: Vec<String> = store.scan().into_iter().map(|(_, r)| r.transaction_id).collect();
    assert_eq!(ids, vec!["T-1", "REAL001"]);
    assert_eq!(store.len(), 4);
}

#[test]
fn find_by_transaction_id_resolves_and_decodes() {
    let mut store = AccountStore::default();
    let rec = record("T-FIND", 1, 2, &[]);
    let mut raw = encode(&rec).expect("encode");
    raw.resize(300, 0);
    let address = HashedResolver
        .resolve_transaction("transaction", "T-FIND", &Address::default())
        .expect("resolve")
        .address;
    store.insert_raw(address, raw);

    assert_eq!(
        store.find_by_transaction_id(&HashedResolver, "T-FIND").expect("find"),
        Some((address, rec))
    );
    assert_eq!(store.find_by_transaction_id(&HashedResolver, "NOPE").expect("find"), None);
}

#[test]
fn writes_carry_increasing_sequences() {
    let mut store = AccountStore::default();
    let (_, first) = store.create(&HashedResolver, &record("T-1", 1, 2, &[])).expect("1");
    let (_, second) = store.create(&HashedResolver, &record("T-2", 1, 2, &[])).expect("2");
    let raw = store.insert_raw(Address::new([4; 32]), vec![0u8; 16]);
    assert_eq!((first.seq, second.seq, raw.seq), (1, 2, 3));
    assert_eq!(store.latest_seq(), 3);
}

#[test]
fn undo_removes_a_created_account() {
    let mut store = AccountStore::default();
    let rec = record("T-U", 6, 7, &[8]);
    let (resolved, write) = store.create(&HashedResolver, &rec).expect("create");

    assert_eq!(store.undo_last_write(), Ok(resolved.address));
    assert!(store.is_empty());
    assert_eq!(store.read(resolved.address), None);
    assert!(store.by_actor(6).is_empty());
    assert!(store.by_batch(8).is_empty());
    assert_eq!(store.latest_seq(), 0);
    assert_eq!(store.undo_last_write(), Err(StoreError::NothingToUndo));

    let (_, again) = store.create(&HashedResolver, &rec).expect("create again");
    assert_eq!(again.seq, write.seq);
}

#[test]
fn undo_restores_the_previous_record() {
    let mut store = AccountStore::default();
    let rec = record("T-R", 1, 2, &[1]);
    let (resolved, _) = store.create(&HashedResolver, &rec).expect("create");
    let moved = TransactionRecord {
        to_actor_id: 9,
        batch_ids: vec![5],
        ..rec.clone()
    };
    store.replace(resolved.address, &moved).expect("replace");

    store.undo_last_write().expect("undo");
    assert_eq!(store.get(resolved.address), Some(rec));
    assert_eq!(store.by_actor(2).len(), 1);
    assert!(store.by_actor(9).is_empty());
    assert!(store.by_batch(5).is_empty());
    assert_eq!(store.addresses(), &[resolved.address]);
    assert_eq!(store.latest_seq(), 1);
}

#[test]
fn patch_is_pure() {
    let rec = record("T-P", 1, 2, &[]);
    let empty = TransactionPatch::default();
    assert!(empty.is_empty());
    assert_eq!(empty.apply(&rec), rec);

    let cleared = TransactionPatch {
        status: Some("cancelled".to_string()),
        notes: NotesPatch::Clear,
        ..TransactionPatch::default()
    }
    .apply(&TransactionRecord {
        notes: Some("x".to_string()),
        ..rec.clone()
    });
    assert_eq!(cleared.status, "cancelled");
    assert_eq!(cleared.notes, None);
    assert_eq!(rec.status, "completed");
}

#[test]
fn config_from_lookup() {
    let program = "11".repeat(32);
    let cfg = LedgerConfig::from_lookup(|key| match key {
        "PROGRAM_ID" => Some(program.clone()),
        "ACCOUNT_SPACE" => Some("512".to_string()),
        _ => None,
    })
    .expect("config");
    assert_eq!(cfg.program_id, Address::new([0x11; 32]));
    assert_eq!(cfg.account_space, 512);
    assert_eq!(cfg.namespace, "transaction");

    let bad = LedgerConfig::from_lookup(|key| (key == "ACCOUNT_SPACE").then(|| "0".to_string()));
    assert!(matches!(bad, Err(ConfigError::AccountSpace(_))));
    let bad = LedgerConfig::from_lookup(|key| (key == "PROGRAM_ID").then(|| "abcd".to_string()));
    assert!(matches!(bad, Err(ConfigError::ProgramId(_))));
}

#[test]
fn address_hex_round_trip() {
    let address = Address::new([0xAB; 32]);
    let text = address.to_string();
    assert_eq!(text.len(), 64);
    assert_eq!(text.parse::<Address>().expect("parse"), address);
}
