//! Wallets table and the wallet snapshot handed to callers.
//!
//! A wallet holds the base-currency (PLN) balance for exactly one user.
//! Foreign holdings live in `wallet_currency_balances`, one row per currency
//! the wallet ever acquired. Balances are stored as integer hundredths and
//! only the engine's atomic operations may change them.

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use crate::{CurrencyCode, EngineError, ResultEngine, balances, money};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub balance_pln_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::balances::Entity")]
    Balances,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
}

impl Related<super::balances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Balances.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// One foreign-currency holding of a wallet.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrencyHolding {
    pub currency: CurrencyCode,
    pub amount: Decimal,
}

/// Read-only view of a wallet: base balance plus every currency holding,
/// sorted ascending by currency code.
#[derive(Clone, Debug, PartialEq)]
pub struct WalletSnapshot {
    pub id: i64,
    pub user_id: i64,
    pub balance_pln: Decimal,
    pub balances: Vec<CurrencyHolding>,
}

impl TryFrom<(Model, Vec<balances::Model>)> for WalletSnapshot {
    type Error = EngineError;

    fn try_from((wallet, holdings): (Model, Vec<balances::Model>)) -> ResultEngine<Self> {
        let mut balances = Vec::with_capacity(holdings.len());
        for holding in holdings {
            balances.push(CurrencyHolding {
                currency: CurrencyCode::try_from(holding.currency_code.as_str())?,
                amount: money::minor_to_amount(holding.amount_minor),
            });
        }
        Ok(Self {
            id: wallet.id,
            user_id: wallet.user_id,
            balance_pln: money::minor_to_amount(wallet.balance_pln_minor),
            balances,
        })
    }
}
