//! Ledger records.
//!
//! A `LedgerRecord` is the immutable trace of one completed operation:
//! created exactly once per successful deposit/buy/sell, never updated or
//! deleted. The table keeps per-kind nullable columns; converting a row into
//! the domain type moves it into a tagged payload and enforces the per-kind
//! field contract on the way.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{CurrencyCode, EngineError, ResultEngine, money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LedgerKind {
    Deposit,
    Buy,
    Sell,
}

impl LedgerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

impl TryFrom<&str> for LedgerKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "DEPOSIT" => Ok(Self::Deposit),
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid ledger kind: {other}"
            ))),
        }
    }
}

/// Record status. Every operation posts synchronously today; the column
/// exists so a pending/reversed state needs no schema change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxStatus {
    Posted,
}

impl TxStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Posted => "POSTED",
        }
    }
}

impl TryFrom<&str> for TxStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "POSTED" => Ok(Self::Posted),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid ledger status: {other}"
            ))),
        }
    }
}

/// Kind-specific payload of a ledger record.
///
/// PLN and currency deltas are signed from the wallet's point of view:
/// a BUY spends PLN (negative) and acquires currency (positive), a SELL is
/// the mirror image, a DEPOSIT only adds PLN.
#[derive(Clone, Debug, PartialEq)]
pub enum LedgerDetail {
    Deposit {
        pln_amount: Decimal,
    },
    Buy {
        currency: CurrencyCode,
        ccy_amount: Decimal,
        pln_amount: Decimal,
        rate: Decimal,
    },
    Sell {
        currency: CurrencyCode,
        ccy_amount: Decimal,
        pln_amount: Decimal,
        rate: Decimal,
    },
}

impl LedgerDetail {
    pub fn kind(&self) -> LedgerKind {
        match self {
            Self::Deposit { .. } => LedgerKind::Deposit,
            Self::Buy { .. } => LedgerKind::Buy,
            Self::Sell { .. } => LedgerKind::Sell,
        }
    }

    /// Positive operation amount: PLN for deposits, foreign units otherwise.
    pub fn amount(&self) -> Decimal {
        match self {
            Self::Deposit { pln_amount } => *pln_amount,
            Self::Buy { ccy_amount, .. } | Self::Sell { ccy_amount, .. } => ccy_amount.abs(),
        }
    }

    pub fn currency(&self) -> Option<&CurrencyCode> {
        match self {
            Self::Deposit { .. } => None,
            Self::Buy { currency, .. } | Self::Sell { currency, .. } => Some(currency),
        }
    }

    /// Signed PLN delta applied to the base balance.
    pub fn pln_amount(&self) -> Decimal {
        match self {
            Self::Deposit { pln_amount }
            | Self::Buy { pln_amount, .. }
            | Self::Sell { pln_amount, .. } => *pln_amount,
        }
    }

    /// Signed foreign-currency delta, absent for deposits.
    pub fn ccy_amount(&self) -> Option<Decimal> {
        match self {
            Self::Deposit { .. } => None,
            Self::Buy { ccy_amount, .. } | Self::Sell { ccy_amount, .. } => Some(*ccy_amount),
        }
    }

    pub fn rate(&self) -> Option<Decimal> {
        match self {
            Self::Deposit { .. } => None,
            Self::Buy { rate, .. } | Self::Sell { rate, .. } => Some(*rate),
        }
    }
}

/// One completed ledger operation.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerRecord {
    pub id: i64,
    pub user_id: i64,
    pub wallet_id: i64,
    pub status: TxStatus,
    pub created_at: DateTime<Utc>,
    pub detail: LedgerDetail,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub wallet_id: i64,
    pub kind: String,
    pub currency_code: Option<String>,
    pub amount_minor: i64,
    pub pln_minor: i64,
    pub ccy_minor: Option<i64>,
    pub rate_micro: Option<i64>,
    pub status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallets,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn exchange_fields(model: &Model) -> ResultEngine<(CurrencyCode, Decimal, Decimal, Decimal)> {
    let code = model.currency_code.as_deref().ok_or_else(|| {
        EngineError::InvalidAmount(format!("exchange record {} missing currency", model.id))
    })?;
    let ccy_minor = model.ccy_minor.ok_or_else(|| {
        EngineError::InvalidAmount(format!(
            "exchange record {} missing currency delta",
            model.id
        ))
    })?;
    let rate_micro = model.rate_micro.ok_or_else(|| {
        EngineError::InvalidAmount(format!("exchange record {} missing rate", model.id))
    })?;
    Ok((
        CurrencyCode::try_from(code)?,
        money::minor_to_amount(ccy_minor),
        money::minor_to_amount(model.pln_minor),
        money::micro_to_rate(rate_micro),
    ))
}

impl TryFrom<Model> for LedgerRecord {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let kind = LedgerKind::try_from(model.kind.as_str())?;
        let status = TxStatus::try_from(model.status.as_str())?;

        let detail = match kind {
            LedgerKind::Deposit => {
                if model.currency_code.is_some()
                    || model.ccy_minor.is_some()
                    || model.rate_micro.is_some()
                {
                    return Err(EngineError::InvalidAmount(format!(
                        "deposit record {} carries exchange fields",
                        model.id
                    )));
                }
                LedgerDetail::Deposit {
                    pln_amount: money::minor_to_amount(model.pln_minor),
                }
            }
            LedgerKind::Buy => {
                let (currency, ccy_amount, pln_amount, rate) = exchange_fields(&model)?;
                LedgerDetail::Buy {
                    currency,
                    ccy_amount,
                    pln_amount,
                    rate,
                }
            }
            LedgerKind::Sell => {
                let (currency, ccy_amount, pln_amount, rate) = exchange_fields(&model)?;
                LedgerDetail::Sell {
                    currency,
                    ccy_amount,
                    pln_amount,
                    rate,
                }
            }
        };

        Ok(LedgerRecord {
            id: model.id,
            user_id: model.user_id,
            wallet_id: model.wallet_id,
            status,
            created_at: model.created_at,
            detail,
        })
    }
}
