//! Concurrent transfer tests against PostgreSQL.
//!
//! These verify that:
//! - Transfers in opposite directions between the same pair never deadlock
//! - Concurrent transfers on the same account lose no update
//! - Money is conserved across the accounts involved
//!
//! Each test skips when no database is reachable at `DATABASE_URL`.

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_wrap)]

mod common;

use std::sync::Arc;

use futures::future::join_all;
use tally_core::ledger::{EntryQuery, LedgerStore, TransferService};
use tally_db::PgLedgerStore;
use tally_shared::types::PageRequest;
use tokio::sync::Barrier;

use common::{open_account, setup_db};

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_opposite_direction_transfers_do_not_deadlock() {
    let db = match setup_db().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Skipping test - database not available: {}", e);
            return;
        }
    };
    let store = Arc::new(PgLedgerStore::new(db));
    let a = open_account(&store, "deadlock-a", 10_000).await.unwrap();
    let b = open_account(&store, "deadlock-b", 10_000).await.unwrap();
    let service = TransferService::new(Arc::clone(&store));

    const PER_DIRECTION: usize = 50;
    let barrier = Arc::new(Barrier::new(PER_DIRECTION * 2));

    let handles: Vec<_> = (0..PER_DIRECTION * 2)
        .map(|i| {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            let (from, to) = if i % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
            tokio::spawn(async move {
                barrier.wait().await;
                service.transfer(from, to, 7).await
            })
        })
        .collect();

    let results = join_all(handles).await;
    let failures: Vec<_> = results
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .filter_map(Result::err)
        .collect();
    assert!(failures.is_empty(), "transfers failed: {:?}", failures);

    let a_after = store.get_account(a.id).await.unwrap();
    let b_after = store.get_account(b.id).await.unwrap();
    assert_eq!(a_after.balance, 10_000);
    assert_eq!(b_after.balance, 10_000);
    assert_eq!(a_after.balance + b_after.balance, 20_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_debits_lose_no_update() {
    let db = match setup_db().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Skipping test - database not available: {}", e);
            return;
        }
    };
    let store = Arc::new(PgLedgerStore::new(db));
    let source = open_account(&store, "hot-source", 1_000).await.unwrap();
    let sink = open_account(&store, "hot-sink", 0).await.unwrap();
    let service = TransferService::new(Arc::clone(&store));

    const NUM_TRANSFERS: usize = 100;
    let barrier = Arc::new(Barrier::new(NUM_TRANSFERS));

    let handles: Vec<_> = (0..NUM_TRANSFERS)
        .map(|_| {
            let service = service.clone();
            let barrier = Arc::clone(&barrier);
            let (from, to) = (source.id, sink.id);
            tokio::spawn(async move {
                barrier.wait().await;
                service.transfer(from, to, 10).await
            })
        })
        .collect();

    for joined in join_all(handles).await {
        joined.expect("task panicked").unwrap();
    }

    let expected = (NUM_TRANSFERS as i64) * 10;
    assert_eq!(store.get_account(source.id).await.unwrap().balance, 1_000 - expected);
    assert_eq!(store.get_account(sink.id).await.unwrap().balance, expected);

    let entries = store
        .list_entries(EntryQuery::page(sink.id, PageRequest::new(1, 100)))
        .await
        .unwrap();
    assert_eq!(entries.len(), NUM_TRANSFERS);
    assert_eq!(entries.iter().map(|e| e.amount).sum::<i64>(), expected);
}
