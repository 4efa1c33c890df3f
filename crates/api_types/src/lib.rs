use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub mod auth {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RegisterRequest {
        pub email: String,
        pub password: String,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct RegisterResponse {
        pub user_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LoginResponse {
        pub access_token: String,
        pub token_type: String,
        /// Seconds until the token expires.
        pub expires_in: u64,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DepositRequest {
        #[serde(rename = "amountPLN")]
        pub amount_pln: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CurrencyBalanceView {
        pub currency: String,
        pub amount: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct WalletView {
        pub id: i64,
        pub user_id: i64,
        #[serde(rename = "balancePLN")]
        pub balance_pln: Decimal,
        /// Sorted ascending by currency code.
        pub balances: Vec<CurrencyBalanceView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum TransactionKind {
        Deposit,
        Buy,
        Sell,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionQuery {
        pub limit: Option<u64>,
        pub offset: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionView {
        pub id: i64,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub currency: Option<String>,
        /// Positive operation amount: PLN for deposits, foreign units
        /// otherwise.
        pub amount: Decimal,
        /// Signed PLN delta applied to the base balance.
        pub pln_amount: Decimal,
        /// Signed foreign-currency delta, absent for deposits.
        pub ccy_amount: Option<Decimal>,
        pub rate: Option<Decimal>,
        pub status: String,
        /// RFC3339 timestamp (UTC).
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub total: u64,
        pub limit: u64,
        pub offset: u64,
        pub items: Vec<TransactionView>,
    }
}

pub mod exchange {
    use super::*;
    use crate::transaction::TransactionKind;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExchangeRequest {
        pub currency: String,
        pub amount: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ExchangeView {
        pub transaction_id: i64,
        #[serde(rename = "type")]
        pub kind: TransactionKind,
        pub currency: String,
        pub amount: Decimal,
        pub rate_date: NaiveDate,
        pub rate: Decimal,
        /// Signed PLN delta: negative for a buy, positive for a sell.
        pub pln_amount: Decimal,
    }
}

pub mod rates {
    use std::collections::BTreeMap;

    use super::*;

    /// Query parameters of `GET /rates/history`.
    ///
    /// Either `date` (one full table) or `code` (+ optional inclusive
    /// `from`/`to` bounds) selects the mode.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RatesHistoryQuery {
        pub date: Option<NaiveDate>,
        pub code: Option<String>,
        pub from: Option<NaiveDate>,
        pub to: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RateTableResponse {
        pub date: NaiveDate,
        /// Currency code → rate, sorted by code.
        pub rates: BTreeMap<String, Decimal>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RatePointView {
        pub date: NaiveDate,
        pub buy: Decimal,
        pub sell: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RateHistoryResponse {
        pub currency: String,
        pub count: usize,
        pub items: Vec<RatePointView>,
    }
}
