//! End-to-end scenarios exercising `BlockLog` and `Db` through their
//! public API together, rather than unit-testing components in
//! isolation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};
use std::thread;

use trie_store::domain::{Block, KeyVal};
use trie_store::ports::storage::TimeSource;
use trie_store::{BlockLog, Db, FileStorage, InMemoryStorage};

static TRACING_INIT: Once = Once::new();

/// Installs a `fmt` subscriber the first time any test calls this, so
/// `RUST_LOG` can surface the `tracing::debug!`/`info!` calls `Db::open_kv`
/// and friends emit. Harmless if a subscriber is already set (`try_init`
/// swallows that error) and safe to call from every test since `Once`
/// collapses repeat calls to a no-op.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

struct FixedClock(AtomicU64);
impl TimeSource for FixedClock {
    fn now(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

#[test]
fn s1_s2_s3_block_log_write_and_stream_round_trips() {
    let log = BlockLog::with_clock(
        InMemoryStorage::new(),
        InMemoryStorage::new(),
        Box::new(FixedClock(AtomicU64::new(1))),
    );

    for i in 0..20u8 {
        log.write_block(Block::new(0, vec![KeyVal::new(vec![i], vec![i, i])]))
            .unwrap();
    }

    assert_eq!(log.len().unwrap(), 20);

    let first = log.read_pointer(0).unwrap();
    let block = log.read_block(&first).unwrap();
    assert_eq!(block.data[0].key, vec![0u8]);

    let all: Vec<_> = log
        .stream_blocks_between(0, u64::MAX)
        .collect::<trie_store::Result<_>>()
        .unwrap();
    assert_eq!(all.len(), 20);
    for (i, b) in all.iter().enumerate() {
        assert_eq!(b.data[0].key, vec![i as u8]);
    }
}

#[test]
fn s3_update_put_then_view_get_round_trips() {
    init_tracing();
    let db = Db::open_kv(InMemoryStorage::new()).unwrap();

    db.update(|tx| {
        tx.put(b"hello", b"world");
        Ok(())
    })
    .unwrap();

    let value = db.view(|tx| Ok(tx.get(b"hello"))).unwrap();
    assert_eq!(value, Some(b"world".to_vec()));

    let missing = db.view(|tx| Ok(tx.get(b"nope"))).unwrap();
    assert_eq!(missing, None);
}

#[test]
fn s4_a_reader_snapshot_is_unaffected_by_a_later_writer() {
    let db = Arc::new(Db::open_kv(InMemoryStorage::new()).unwrap());

    db.update(|tx| {
        tx.put(b"k", b"v1");
        Ok(())
    })
    .unwrap();

    let reader_db = Arc::clone(&db);
    let reader = thread::spawn(move || reader_db.view(|tx| Ok(tx.get(b"k"))).unwrap());
    let snapshot_value = reader.join().unwrap();
    assert_eq!(snapshot_value, Some(b"v1".to_vec()));

    db.update(|tx| {
        tx.put(b"k", b"v2");
        Ok(())
    })
    .unwrap();

    let fresh = db.view(|tx| Ok(tx.get(b"k"))).unwrap();
    assert_eq!(fresh, Some(b"v2".to_vec()));
}

#[test]
fn s5_colliding_leading_nibble_keys_resolve_to_distinct_values() {
    let db = Db::open_kv(InMemoryStorage::new()).unwrap();
    db.update(|tx| {
        tx.put(b"key-0", b"first");
        tx.put(b"key-15", b"second");
        Ok(())
    })
    .unwrap();

    assert_eq!(
        db.view(|tx| Ok(tx.get(b"key-0"))).unwrap(),
        Some(b"first".to_vec())
    );
    assert_eq!(
        db.view(|tx| Ok(tx.get(b"key-15"))).unwrap(),
        Some(b"second".to_vec())
    );
}

#[test]
fn s7_s8_insert_lookup_and_delete_round_trip() {
    let db = Db::open_kv(InMemoryStorage::new()).unwrap();

    db.update(|tx| {
        tx.put(b"k", b"v");
        Ok(())
    })
    .unwrap();
    assert_eq!(db.view(|tx| Ok(tx.get(b"k"))).unwrap(), Some(b"v".to_vec()));

    db.update(|tx| {
        tx.delete(b"k");
        Ok(())
    })
    .unwrap();
    assert_eq!(db.view(|tx| Ok(tx.get(b"k"))).unwrap(), None);
}

#[test]
fn s9_transaction_ids_are_strictly_increasing_across_view_and_update() {
    let db = Db::open_kv(InMemoryStorage::new()).unwrap();
    let mut ids = Vec::new();
    for i in 0..10 {
        if i % 2 == 0 {
            ids.push(db.view(|tx| Ok(tx.id())).unwrap());
        } else {
            ids.push(db.update(|tx| Ok(tx.id())).unwrap());
        }
    }
    for window in ids.windows(2) {
        assert!(window[0] < window[1]);
    }
}

#[test]
fn s11_reopening_a_file_backed_store_recovers_previously_committed_keys() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.bin");

    {
        let storage = FileStorage::open(&path).unwrap();
        let db = Db::open_kv(storage).unwrap();
        db.update(|tx| {
            tx.put(b"alpha", b"1");
            tx.put(b"beta", b"2");
            Ok(())
        })
        .unwrap();
        db.update(|tx| {
            tx.put(b"gamma", b"3");
            Ok(())
        })
        .unwrap();
    }

    let storage = FileStorage::open(&path).unwrap();
    let reopened = Db::open_kv(storage).unwrap();

    assert_eq!(reopened.view(|tx| Ok(tx.get(b"alpha"))).unwrap(), Some(b"1".to_vec()));
    assert_eq!(reopened.view(|tx| Ok(tx.get(b"beta"))).unwrap(), Some(b"2".to_vec()));
    assert_eq!(reopened.view(|tx| Ok(tx.get(b"gamma"))).unwrap(), Some(b"3".to_vec()));
}
