use chrono::Utc;
use rust_decimal::Decimal;

use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, QueryFilter, QueryOrder, Statement,
    TransactionTrait, prelude::*,
};

use crate::{
    EngineError, ResultEngine, WalletSnapshot, balances, money,
    transactions::{self, LedgerKind, TxStatus},
    wallets,
};

use super::{Engine, with_tx};

impl Engine {
    /// Returns the wallet snapshot for a user, creating the wallet with a
    /// zero balance on first access.
    pub async fn wallet_snapshot(&self, user_id: i64) -> ResultEngine<WalletSnapshot> {
        with_tx!(self, |db_tx| {
            let wallet = get_or_create_wallet(&db_tx, user_id).await?;
            load_snapshot(&db_tx, wallet).await
        })
    }

    /// Deposits base currency into a user's wallet.
    ///
    /// Atomically: creates the wallet if absent, credits the base balance and
    /// appends the DEPOSIT record. Returns the post-deposit snapshot.
    pub async fn deposit(&self, user_id: i64, amount: Decimal) -> ResultEngine<WalletSnapshot> {
        let amount_minor = money::require_positive_amount(amount)?;

        with_tx!(self, |db_tx| {
            let wallet = get_or_create_wallet(&db_tx, user_id).await?;
            credit_wallet(&db_tx, wallet.id, amount_minor).await?;

            transactions::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                wallet_id: ActiveValue::Set(wallet.id),
                kind: ActiveValue::Set(LedgerKind::Deposit.as_str().to_string()),
                currency_code: ActiveValue::Set(None),
                amount_minor: ActiveValue::Set(amount_minor),
                pln_minor: ActiveValue::Set(amount_minor),
                ccy_minor: ActiveValue::Set(None),
                rate_micro: ActiveValue::Set(None),
                status: ActiveValue::Set(TxStatus::Posted.as_str().to_string()),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            let wallet = require_wallet(&db_tx, user_id).await?;
            load_snapshot(&db_tx, wallet).await
        })
    }
}

/// Finds a user's wallet, creating it with a zero balance when absent.
pub(super) async fn get_or_create_wallet(
    conn: &DatabaseTransaction,
    user_id: i64,
) -> ResultEngine<wallets::Model> {
    if let Some(wallet) = wallets::Entity::find()
        .filter(wallets::Column::UserId.eq(user_id))
        .one(conn)
        .await?
    {
        return Ok(wallet);
    }

    let created = wallets::ActiveModel {
        user_id: ActiveValue::Set(user_id),
        balance_pln_minor: ActiveValue::Set(0),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    Ok(created)
}

pub(super) async fn require_wallet(
    conn: &DatabaseTransaction,
    user_id: i64,
) -> ResultEngine<wallets::Model> {
    wallets::Entity::find()
        .filter(wallets::Column::UserId.eq(user_id))
        .one(conn)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))
}

async fn load_snapshot(
    conn: &DatabaseTransaction,
    wallet: wallets::Model,
) -> ResultEngine<WalletSnapshot> {
    let holdings = balances::Entity::find()
        .filter(balances::Column::WalletId.eq(wallet.id))
        .order_by_asc(balances::Column::CurrencyCode)
        .all(conn)
        .await?;
    WalletSnapshot::try_from((wallet, holdings))
}

/// Unconditional base-balance credit.
pub(super) async fn credit_wallet(
    conn: &DatabaseTransaction,
    wallet_id: i64,
    amount_minor: i64,
) -> ResultEngine<()> {
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        "UPDATE wallets SET balance_pln_minor = balance_pln_minor + ? WHERE id = ?",
        [amount_minor.into(), wallet_id.into()],
    );
    if conn.execute(stmt).await?.rows_affected() == 0 {
        return Err(EngineError::KeyNotFound("wallet not exists".to_string()));
    }
    Ok(())
}
