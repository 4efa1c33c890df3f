use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement,
};

use engine::{Engine, EngineError, LedgerDetail, LedgerKind};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    // A single shared connection so every session sees the same in-memory
    // database.
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1);
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn seed_user(engine: &Engine) -> i64 {
    engine
        .create_user("alice@example.com", "argon2-hash", Some("Alice"), None)
        .await
        .unwrap()
        .id
}

async fn seed_rate(
    db: &DatabaseConnection,
    code: &str,
    date: NaiveDate,
    buy_micro: i64,
    sell_micro: i64,
) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO exchange_rates (currency_code, rate_date, buy_rate_micro, sell_rate_micro) \
         VALUES (?, ?, ?, ?)",
        vec![
            code.into(),
            date.into(),
            buy_micro.into(),
            sell_micro.into(),
        ],
    ))
    .await
    .unwrap();
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn wallet_snapshot_creates_lazily_and_reads_idempotently() {
    let (engine, _db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;

    let first = engine.wallet_snapshot(user_id).await.unwrap();
    assert_eq!(first.user_id, user_id);
    assert_eq!(first.balance_pln, dec!(0.00));
    assert!(first.balances.is_empty());

    let second = engine.wallet_snapshot(user_id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn deposit_credits_wallet_and_appends_record() {
    let (engine, _db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;

    let snapshot = engine.deposit(user_id, dec!(100.00)).await.unwrap();
    assert_eq!(snapshot.balance_pln, dec!(100.00));

    let page = engine
        .transactions_for_user(user_id, None, None)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    let record = &page.items[0];
    assert_eq!(record.detail.kind(), LedgerKind::Deposit);
    assert_eq!(record.detail.pln_amount(), dec!(100.00));
    assert!(record.detail.currency().is_none());
    assert!(record.detail.rate().is_none());
}

#[tokio::test]
async fn deposit_rejects_non_positive_and_sub_cent_amounts() {
    let (engine, _db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;

    for amount in [dec!(0), dec!(-5.00), dec!(10.005)] {
        let err = engine.deposit(user_id, amount).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)), "{amount}");
    }

    let page = engine
        .transactions_for_user(user_id, None, None)
        .await
        .unwrap();
    assert_eq!(page.total, 0);
}

#[tokio::test]
async fn buy_converts_at_latest_sell_rate() {
    let (engine, db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;
    // An older quote must not win over the newest one.
    seed_rate(&db, "USD", date(2026, 8, 6), 3_800_000, 3_850_000).await;
    seed_rate(&db, "USD", date(2026, 8, 7), 3_900_000, 4_000_000).await;
    engine.deposit(user_id, dec!(1000.00)).await.unwrap();

    let outcome = engine.buy(user_id, "USD", dec!(100)).await.unwrap();
    assert_eq!(outcome.kind, LedgerKind::Buy);
    assert_eq!(outcome.currency.as_str(), "USD");
    assert_eq!(outcome.amount, dec!(100.00));
    assert_eq!(outcome.rate_date, date(2026, 8, 7));
    assert_eq!(outcome.rate, dec!(4.000000));
    assert_eq!(outcome.pln_amount, dec!(-400.00));

    let snapshot = engine.wallet_snapshot(user_id).await.unwrap();
    assert_eq!(snapshot.balance_pln, dec!(600.00));
    assert_eq!(snapshot.balances.len(), 1);
    assert_eq!(snapshot.balances[0].currency.as_str(), "USD");
    assert_eq!(snapshot.balances[0].amount, dec!(100.00));

    let page = engine
        .transactions_for_user(user_id, None, None)
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    match &page.items[0].detail {
        LedgerDetail::Buy {
            currency,
            ccy_amount,
            pln_amount,
            rate,
        } => {
            assert_eq!(currency.as_str(), "USD");
            assert_eq!(*ccy_amount, dec!(100.00));
            assert_eq!(*pln_amount, dec!(-400.00));
            assert_eq!(*rate, dec!(4.000000));
        }
        other => panic!("expected a BUY record, got {other:?}"),
    }
}

#[tokio::test]
async fn buy_fails_without_any_recorded_rate() {
    let (engine, _db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;
    engine.deposit(user_id, dec!(1000.00)).await.unwrap();

    let err = engine.buy(user_id, "USD", dec!(10)).await.unwrap_err();
    assert!(matches!(err, EngineError::RateUnavailable(_)));
}

#[tokio::test]
async fn buy_rejects_base_and_malformed_currencies() {
    let (engine, db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;
    seed_rate(&db, "USD", date(2026, 8, 7), 3_900_000, 4_000_000).await;
    engine.deposit(user_id, dec!(1000.00)).await.unwrap();

    for code in ["PLN", "pln", "US", "USDX", "U5D", ""] {
        let err = engine.buy(user_id, code, dec!(10)).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidCurrency(_)), "{code:?}");
    }

    // Lowercase is normalized, not rejected.
    assert!(engine.buy(user_id, "usd", dec!(10)).await.is_ok());
}

#[tokio::test]
async fn buy_with_insufficient_funds_has_zero_effect() {
    let (engine, db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;
    seed_rate(&db, "USD", date(2026, 8, 7), 3_900_000, 4_000_000).await;
    engine.deposit(user_id, dec!(100.00)).await.unwrap();

    // Costs 400.00 against a balance of 100.00.
    let err = engine.buy(user_id, "USD", dec!(100)).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let snapshot = engine.wallet_snapshot(user_id).await.unwrap();
    assert_eq!(snapshot.balance_pln, dec!(100.00));
    assert!(snapshot.balances.is_empty());

    let page = engine
        .transactions_for_user(user_id, None, None)
        .await
        .unwrap();
    assert_eq!(page.total, 1);
}

#[tokio::test]
async fn buy_on_missing_wallet_fails_not_found() {
    let (engine, db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;
    seed_rate(&db, "USD", date(2026, 8, 7), 3_900_000, 4_000_000).await;

    // The user's wallet exists from registration; another id has none.
    let err = engine.buy(user_id + 1, "USD", dec!(10)).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn sell_converts_at_latest_buy_rate() {
    let (engine, db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;
    seed_rate(&db, "USD", date(2026, 8, 7), 3_900_000, 4_000_000).await;
    engine.deposit(user_id, dec!(1000.00)).await.unwrap();
    engine.buy(user_id, "USD", dec!(100)).await.unwrap();

    let outcome = engine.sell(user_id, "USD", dec!(40)).await.unwrap();
    assert_eq!(outcome.kind, LedgerKind::Sell);
    assert_eq!(outcome.rate, dec!(3.900000));
    assert_eq!(outcome.pln_amount, dec!(156.00));

    let snapshot = engine.wallet_snapshot(user_id).await.unwrap();
    assert_eq!(snapshot.balance_pln, dec!(756.00));
    assert_eq!(snapshot.balances[0].amount, dec!(60.00));

    let page = engine
        .transactions_for_user(user_id, None, None)
        .await
        .unwrap();
    match &page.items[0].detail {
        LedgerDetail::Sell {
            ccy_amount,
            pln_amount,
            ..
        } => {
            assert_eq!(*ccy_amount, dec!(-40.00));
            assert_eq!(*pln_amount, dec!(156.00));
        }
        other => panic!("expected a SELL record, got {other:?}"),
    }
}

#[tokio::test]
async fn sell_with_insufficient_currency_has_zero_effect() {
    let (engine, db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;
    seed_rate(&db, "USD", date(2026, 8, 7), 3_900_000, 4_000_000).await;
    engine.deposit(user_id, dec!(1000.00)).await.unwrap();
    engine.buy(user_id, "USD", dec!(50)).await.unwrap();

    let before = engine.wallet_snapshot(user_id).await.unwrap();
    let records_before = engine
        .transactions_for_user(user_id, None, None)
        .await
        .unwrap()
        .total;

    let err = engine.sell(user_id, "USD", dec!(60)).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientCurrencyFunds(_)));

    let after = engine.wallet_snapshot(user_id).await.unwrap();
    assert_eq!(before, after);
    let records_after = engine
        .transactions_for_user(user_id, None, None)
        .await
        .unwrap()
        .total;
    assert_eq!(records_before, records_after);
}

#[tokio::test]
async fn sell_without_balance_row_behaves_like_zero() {
    let (engine, db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;
    seed_rate(&db, "EUR", date(2026, 8, 7), 4_250_000, 4_310_000).await;
    engine.deposit(user_id, dec!(1000.00)).await.unwrap();

    let err = engine.sell(user_id, "EUR", dec!(10)).await.unwrap_err();
    assert!(matches!(err, EngineError::InsufficientCurrencyFunds(_)));
}

#[tokio::test]
async fn buy_then_sell_round_trip_differs_by_spread_only() {
    let (engine, db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;
    seed_rate(&db, "USD", date(2026, 8, 7), 3_900_000, 4_000_000).await;
    engine.deposit(user_id, dec!(1000.00)).await.unwrap();

    engine.buy(user_id, "USD", dec!(10)).await.unwrap();
    engine.sell(user_id, "USD", dec!(10)).await.unwrap();

    let snapshot = engine.wallet_snapshot(user_id).await.unwrap();
    // Bought at 4.00 (40.00), sold back at 3.90 (39.00): the spread is the
    // only difference.
    assert_eq!(snapshot.balance_pln, dec!(999.00));
    assert_eq!(snapshot.balances[0].amount, dec!(0.00));
}

#[tokio::test]
async fn snapshot_sorts_currencies_ascending() {
    let (engine, db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;
    seed_rate(&db, "USD", date(2026, 8, 7), 3_900_000, 4_000_000).await;
    seed_rate(&db, "CHF", date(2026, 8, 7), 4_480_000, 4_520_000).await;
    seed_rate(&db, "EUR", date(2026, 8, 7), 4_250_000, 4_310_000).await;
    engine.deposit(user_id, dec!(1000.00)).await.unwrap();

    engine.buy(user_id, "USD", dec!(10)).await.unwrap();
    engine.buy(user_id, "CHF", dec!(10)).await.unwrap();
    engine.buy(user_id, "EUR", dec!(10)).await.unwrap();

    let snapshot = engine.wallet_snapshot(user_id).await.unwrap();
    let codes: Vec<&str> = snapshot
        .balances
        .iter()
        .map(|b| b.currency.as_str())
        .collect();
    assert_eq!(codes, ["CHF", "EUR", "USD"]);
}

#[tokio::test]
async fn concurrent_buys_spend_exactly_the_covered_amount() {
    let (engine, db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;
    seed_rate(&db, "USD", date(2026, 8, 7), 3_900_000, 4_000_000).await;
    // 800.00 covers exactly 4 of the 5 buys below (200.00 each).
    engine.deposit(user_id, dec!(800.00)).await.unwrap();

    let results =
        futures::future::join_all((0..5).map(|_| engine.buy(user_id, "USD", dec!(50)))).await;

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let rejections = results
        .iter()
        .filter(|r| {
            matches!(r, Err(EngineError::InsufficientFunds(_)))
        })
        .count();
    assert_eq!(successes, 4);
    assert_eq!(rejections, 1);

    let snapshot = engine.wallet_snapshot(user_id).await.unwrap();
    assert_eq!(snapshot.balance_pln, dec!(0.00));
    assert_eq!(snapshot.balances[0].amount, dec!(200.00));

    // One deposit plus one record per successful buy, nothing for the
    // rejected one.
    let page = engine
        .transactions_for_user(user_id, None, None)
        .await
        .unwrap();
    assert_eq!(page.total, 5);
}

#[tokio::test]
async fn history_clamps_limits_and_keeps_pagination_stable() {
    let (engine, db) = engine_with_db().await;
    let user_id = seed_user(&engine).await;

    engine.deposit(user_id, dec!(1.00)).await.unwrap();
    engine.deposit(user_id, dec!(2.00)).await.unwrap();
    engine.deposit(user_id, dec!(3.00)).await.unwrap();

    let page = engine
        .transactions_for_user(user_id, Some(2), None)
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].detail.pln_amount(), dec!(3.00));

    let rest = engine
        .transactions_for_user(user_id, Some(2), Some(2))
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.items[0].detail.pln_amount(), dec!(1.00));

    let clamped = engine
        .transactions_for_user(user_id, Some(500), None)
        .await
        .unwrap();
    assert_eq!(clamped.limit, 200);
    let clamped_low = engine
        .transactions_for_user(user_id, Some(0), None)
        .await
        .unwrap();
    assert_eq!(clamped_low.limit, 1);

    // Records sharing a timestamp come back in ascending id order.
    let wallet = engine.wallet_snapshot(user_id).await.unwrap();
    let tied_at = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    let backend = db.get_database_backend();
    for _ in 0..2 {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO transactions \
             (user_id, wallet_id, kind, currency_code, amount_minor, pln_minor, ccy_minor, \
              rate_micro, status, created_at) \
             VALUES (?, ?, 'DEPOSIT', NULL, 100, 100, NULL, NULL, 'POSTED', ?)",
            vec![user_id.into(), wallet.id.into(), tied_at.into()],
        ))
        .await
        .unwrap();
    }

    let page = engine
        .transactions_for_user(user_id, None, None)
        .await
        .unwrap();
    let tied: Vec<i64> = page
        .items
        .iter()
        .filter(|r| r.created_at == tied_at)
        .map(|r| r.id)
        .collect();
    assert_eq!(tied.len(), 2);
    assert!(tied[0] < tied[1]);
}

#[tokio::test]
async fn rate_store_records_and_serves_quotes() {
    let (engine, _db) = engine_with_db().await;

    let day = date(2026, 8, 7);
    let mids = vec![
        ("USD".to_string(), dec!(3.9354)),
        ("EUR".to_string(), dec!(4.2711)),
        // Unsupported codes in a publication are skipped, not stored.
        ("NOK".to_string(), dec!(0.3701)),
    ];
    let inserted = engine.record_rates(day, &mids).await.unwrap();
    assert_eq!(inserted, 2);

    // A date is written once; replays are no-ops.
    let replayed = engine.record_rates(day, &mids).await.unwrap();
    assert_eq!(replayed, 0);

    let usd = engine.latest_rate("USD").await.unwrap();
    assert_eq!(usd.date, day);
    assert_eq!(usd.buy, dec!(3.935400));
    assert_eq!(usd.sell, dec!(3.935400));

    let exact = engine.rate_at("EUR", day).await.unwrap();
    assert_eq!(exact.buy, dec!(4.271100));
    let missing = engine.rate_at("EUR", date(2026, 8, 8)).await.unwrap_err();
    assert!(matches!(missing, EngineError::RateUnavailable(_)));

    let table = engine.rates_for_date(day).await.unwrap();
    let codes: Vec<&str> = table.iter().map(|r| r.currency.as_str()).collect();
    assert_eq!(codes, ["EUR", "USD"]);
    let empty = engine.rates_for_date(date(2026, 8, 8)).await.unwrap_err();
    assert!(matches!(empty, EngineError::RateUnavailable(_)));
}

#[tokio::test]
async fn rate_history_is_ascending_and_inclusive() {
    let (engine, db) = engine_with_db().await;
    seed_rate(&db, "USD", date(2026, 8, 5), 3_800_000, 3_800_000).await;
    seed_rate(&db, "USD", date(2026, 8, 6), 3_850_000, 3_850_000).await;
    seed_rate(&db, "USD", date(2026, 8, 7), 3_900_000, 3_900_000).await;

    let all = engine.rate_history("USD", None, None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.windows(2).all(|w| w[0].date < w[1].date));

    let bounded = engine
        .rate_history("USD", Some(date(2026, 8, 5)), Some(date(2026, 8, 6)))
        .await
        .unwrap();
    assert_eq!(bounded.len(), 2);

    let err = engine
        .rate_history("USD", Some(date(2026, 8, 7)), Some(date(2026, 8, 5)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}
