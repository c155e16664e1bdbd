use ledger_core::application::engine::TransferEngine;
use ledger_core::application::query::QueryService;
use ledger_core::domain::account::Amount;
use ledger_core::domain::ports::LedgerStoreRef;
use ledger_core::error::LedgerError;
use ledger_core::infrastructure::in_memory::InMemoryLedger;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::sync::Barrier;

mod common;

fn ledger() -> (Arc<TransferEngine>, QueryService) {
    let store: LedgerStoreRef = Arc::new(InMemoryLedger::new());
    let engine = Arc::new(TransferEngine::new(Arc::clone(&store)));
    let query = QueryService::new(store);
    (engine, query)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_disjoint_pairs_transfer_in_parallel() {
    let (engine, query) = ledger();

    let mut pairs = Vec::new();
    for i in 0..8 {
        let a = common::open_seeded(&engine, i * 2, dec!(1000.00)).await;
        let b = common::open_seeded(&engine, i * 2 + 1, dec!(1000.00)).await;
        pairs.push((a, b));
    }

    let barrier = Arc::new(Barrier::new(pairs.len()));
    let mut tasks = Vec::new();
    for (a, b) in &pairs {
        let engine = Arc::clone(&engine);
        let barrier = Arc::clone(&barrier);
        let (a_id, b_id) = (a.id, b.id);
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            for _ in 0..20 {
                let amount = Amount::from_decimal(dec!(10.00)).unwrap();
                engine.transfer(a_id, b_id, amount).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    // Each pair's conservation law holds independently.
    for (a, b) in &pairs {
        let a = engine.store().get_account(a.id).await.unwrap();
        let b = engine.store().get_account(b.id).await.unwrap();
        assert_eq!(a.balance.to_decimal(), dec!(800.00));
        assert_eq!(b.balance.to_decimal(), dec!(1200.00));
    }

    let totals = query.totals().await.unwrap();
    assert_eq!(totals.transaction_count, 8 * 20);
    assert_eq!(totals.total_balance, dec!(16000.00));
    assert!(query.reconcile().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overdraw_race_exactly_one_wins() {
    let (engine, _query) = ledger();
    let a = common::open_seeded(&engine, 0, dec!(100.00)).await;
    let b = common::open_seeded(&engine, 1, dec!(0.00)).await;
    let c = common::open_seeded(&engine, 2, dec!(0.00)).await;

    // Both drafts pass the unlocked pre-check; the re-validation under the
    // sender's lock must fail exactly one of them.
    let barrier = Arc::new(Barrier::new(2));
    let mut tasks = Vec::new();
    for receiver in [b.id, c.id] {
        let engine = Arc::clone(&engine);
        let barrier = Arc::clone(&barrier);
        let sender = a.id;
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            let amount = Amount::from_decimal(dec!(70.00)).unwrap();
            engine.transfer(sender, receiver, amount).await
        }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(LedgerError::InsufficientFunds { .. }) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(insufficient, 1);

    let a = engine.store().get_account(a.id).await.unwrap();
    assert_eq!(a.balance.to_decimal(), dec!(30.00));
    assert!(a.balance.minor_units() >= 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_contended_hammer_conserves_and_never_goes_negative() {
    let (engine, query) = ledger();
    let mut ids = Vec::new();
    for i in 0..4 {
        ids.push(common::open_seeded(&engine, i, dec!(250.00)).await.id);
    }

    let barrier = Arc::new(Barrier::new(32));
    let mut tasks = Vec::new();
    for task_no in 0..32 {
        let engine = Arc::clone(&engine);
        let barrier = Arc::clone(&barrier);
        let ids = ids.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            for round in 0..25 {
                let sender = ids[(task_no + round) % ids.len()];
                let receiver = ids[(task_no + round + 1) % ids.len()];
                let amount = Amount::from_decimal(dec!(90.00)).unwrap();
                match engine.transfer(sender, receiver, amount).await {
                    Ok(_) | Err(LedgerError::InsufficientFunds { .. }) => {}
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let accounts = query.accounts().await.unwrap();
    let mut total = 0i64;
    for account in &accounts {
        assert!(account.balance.minor_units() >= 0);
        total += account.balance.minor_units();
    }
    assert_eq!(total, 100_000); // 4 x 250.00 in minor units

    // The log replays exactly to the cached balances.
    assert!(query.reconcile().await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposite_direction_transfers_do_not_deadlock() {
    let (engine, _query) = ledger();
    let a = common::open_seeded(&engine, 0, dec!(500.00)).await;
    let b = common::open_seeded(&engine, 1, dec!(500.00)).await;

    let barrier = Arc::new(Barrier::new(2));
    let forward = {
        let engine = Arc::clone(&engine);
        let barrier = Arc::clone(&barrier);
        let (s, r) = (a.id, b.id);
        tokio::spawn(async move {
            barrier.wait().await;
            for _ in 0..50 {
                let amount = Amount::from_decimal(dec!(1.00)).unwrap();
                engine.transfer(s, r, amount).await.unwrap();
            }
        })
    };
    let backward = {
        let engine = Arc::clone(&engine);
        let barrier = Arc::clone(&barrier);
        let (s, r) = (b.id, a.id);
        tokio::spawn(async move {
            barrier.wait().await;
            for _ in 0..50 {
                let amount = Amount::from_decimal(dec!(1.00)).unwrap();
                engine.transfer(s, r, amount).await.unwrap();
            }
        })
    };

    tokio::time::timeout(std::time::Duration::from_secs(10), async {
        forward.await.unwrap();
        backward.await.unwrap();
    })
    .await
    .expect("deadlock between opposite-direction transfers");

    let a = engine.store().get_account(a.id).await.unwrap();
    let b = engine.store().get_account(b.id).await.unwrap();
    assert_eq!(a.balance.to_decimal(), dec!(500.00));
    assert_eq!(b.balance.to_decimal(), dec!(500.00));
}
