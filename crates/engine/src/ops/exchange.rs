use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, Statement, TransactionTrait, prelude::*,
};

use crate::{
    CurrencyCode, EngineError, ResultEngine, money,
    transactions::{self, LedgerKind, TxStatus},
};

use super::{
    Engine,
    wallets::{credit_wallet, require_wallet},
    with_tx,
};

/// Result of a completed buy or sell.
///
/// `pln_amount` is the signed delta applied to the base balance: negative
/// for a buy (the user paid PLN), positive for a sell.
#[derive(Clone, Debug, PartialEq)]
pub struct ExchangeOutcome {
    pub transaction_id: i64,
    pub kind: LedgerKind,
    pub currency: CurrencyCode,
    pub amount: Decimal,
    pub rate_date: NaiveDate,
    pub rate: Decimal,
    pub pln_amount: Decimal,
}

impl Engine {
    /// Buys `amount` units of a foreign currency for base currency, priced
    /// at the latest sell rate.
    ///
    /// Atomically: debits the base balance (guarded against going negative),
    /// upserts the currency balance and appends the BUY record. Fails with
    /// `InsufficientFunds` and zero effect when the base balance cannot
    /// cover the cost.
    pub async fn buy(
        &self,
        user_id: i64,
        code: &str,
        amount: Decimal,
    ) -> ResultEngine<ExchangeOutcome> {
        let currency = CurrencyCode::foreign(code)?;
        let amount_minor = money::require_positive_amount(amount)?;

        // Rates are immutable once stored, so the quote is resolved in its
        // own read before the mutation transaction opens. No I/O other than
        // the balance statements happens inside it.
        let rate = self.latest_rate_model(&currency).await?;
        let cost_minor = money::mul_rate_half_up(amount_minor, rate.sell_rate_micro)?;

        with_tx!(self, |db_tx| {
            let wallet = require_wallet(&db_tx, user_id).await?;

            if !debit_wallet_guarded(&db_tx, wallet.id, cost_minor).await? {
                return Err(EngineError::InsufficientFunds(format!(
                    "{} PLN needed to buy {} {}",
                    money::minor_to_amount(cost_minor),
                    money::minor_to_amount(amount_minor),
                    currency
                )));
            }
            upsert_currency_balance(&db_tx, wallet.id, &currency, amount_minor).await?;

            let record = transactions::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                wallet_id: ActiveValue::Set(wallet.id),
                kind: ActiveValue::Set(LedgerKind::Buy.as_str().to_string()),
                currency_code: ActiveValue::Set(Some(currency.as_str().to_string())),
                amount_minor: ActiveValue::Set(amount_minor),
                pln_minor: ActiveValue::Set(-cost_minor),
                ccy_minor: ActiveValue::Set(Some(amount_minor)),
                rate_micro: ActiveValue::Set(Some(rate.sell_rate_micro)),
                status: ActiveValue::Set(TxStatus::Posted.as_str().to_string()),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            Ok(ExchangeOutcome {
                transaction_id: record.id,
                kind: LedgerKind::Buy,
                currency: currency.clone(),
                amount: money::minor_to_amount(amount_minor),
                rate_date: rate.rate_date,
                rate: money::micro_to_rate(rate.sell_rate_micro),
                pln_amount: money::minor_to_amount(-cost_minor),
            })
        })
    }

    /// Sells `amount` units of a foreign currency back to base currency,
    /// priced at the latest buy rate.
    ///
    /// Atomically: debits the currency balance (guarded against going
    /// negative, a missing balance row counting as zero), credits the base
    /// balance and appends the SELL record.
    pub async fn sell(
        &self,
        user_id: i64,
        code: &str,
        amount: Decimal,
    ) -> ResultEngine<ExchangeOutcome> {
        let currency = CurrencyCode::foreign(code)?;
        let amount_minor = money::require_positive_amount(amount)?;

        let rate = self.latest_rate_model(&currency).await?;
        let gain_minor = money::mul_rate_half_up(amount_minor, rate.buy_rate_micro)?;

        with_tx!(self, |db_tx| {
            let wallet = require_wallet(&db_tx, user_id).await?;

            // A wallet that never held the currency has no row; the guarded
            // update then matches nothing, same as an explicit zero balance.
            if !debit_currency_guarded(&db_tx, wallet.id, &currency, amount_minor).await? {
                return Err(EngineError::InsufficientCurrencyFunds(format!(
                    "{} balance below {}",
                    currency,
                    money::minor_to_amount(amount_minor)
                )));
            }
            credit_wallet(&db_tx, wallet.id, gain_minor).await?;

            let record = transactions::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                wallet_id: ActiveValue::Set(wallet.id),
                kind: ActiveValue::Set(LedgerKind::Sell.as_str().to_string()),
                currency_code: ActiveValue::Set(Some(currency.as_str().to_string())),
                amount_minor: ActiveValue::Set(amount_minor),
                pln_minor: ActiveValue::Set(gain_minor),
                ccy_minor: ActiveValue::Set(Some(-amount_minor)),
                rate_micro: ActiveValue::Set(Some(rate.buy_rate_micro)),
                status: ActiveValue::Set(TxStatus::Posted.as_str().to_string()),
                created_at: ActiveValue::Set(Utc::now()),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            Ok(ExchangeOutcome {
                transaction_id: record.id,
                kind: LedgerKind::Sell,
                currency: currency.clone(),
                amount: money::minor_to_amount(amount_minor),
                rate_date: rate.rate_date,
                rate: money::micro_to_rate(rate.buy_rate_micro),
                pln_amount: money::minor_to_amount(gain_minor),
            })
        })
    }
}

/// Conditional base-balance debit.
///
/// The non-negativity guard is part of the statement itself, so the storage
/// engine evaluates it against the committed value in the same step as the
/// write. Two racing operations can never both pass it on a stale read.
/// Returns `false` when the guard rejected the debit.
async fn debit_wallet_guarded(
    conn: &DatabaseTransaction,
    wallet_id: i64,
    amount_minor: i64,
) -> ResultEngine<bool> {
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        "UPDATE wallets SET balance_pln_minor = balance_pln_minor - ? \
         WHERE id = ? AND balance_pln_minor - ? >= 0",
        [amount_minor.into(), wallet_id.into(), amount_minor.into()],
    );
    Ok(conn.execute(stmt).await?.rows_affected() > 0)
}

/// Conditional currency-balance debit; a missing row matches nothing and
/// reports the same way as an insufficient balance.
async fn debit_currency_guarded(
    conn: &DatabaseTransaction,
    wallet_id: i64,
    currency: &CurrencyCode,
    amount_minor: i64,
) -> ResultEngine<bool> {
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        "UPDATE wallet_currency_balances SET amount_minor = amount_minor - ? \
         WHERE wallet_id = ? AND currency_code = ? AND amount_minor - ? >= 0",
        [
            amount_minor.into(),
            wallet_id.into(),
            currency.as_str().into(),
            amount_minor.into(),
        ],
    );
    Ok(conn.execute(stmt).await?.rows_affected() > 0)
}

/// Creates the currency balance row on first acquisition, increments it
/// afterwards.
async fn upsert_currency_balance(
    conn: &DatabaseTransaction,
    wallet_id: i64,
    currency: &CurrencyCode,
    amount_minor: i64,
) -> ResultEngine<()> {
    let stmt = Statement::from_sql_and_values(
        conn.get_database_backend(),
        "INSERT INTO wallet_currency_balances (wallet_id, currency_code, amount_minor) \
         VALUES (?, ?, ?) \
         ON CONFLICT(wallet_id, currency_code) \
         DO UPDATE SET amount_minor = amount_minor + excluded.amount_minor",
        [
            wallet_id.into(),
            currency.as_str().into(),
            amount_minor.into(),
        ],
    );
    conn.execute(stmt).await?;
    Ok(())
}
