//! Daily exchange rates (`exchange_rates` table).
//!
//! One row per (currency, date). Rows are immutable once written: a quote
//! for a date is never recomputed, only newer dates are appended.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use crate::{CurrencyCode, EngineError, ResultEngine, money};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "exchange_rates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub currency_code: String,
    pub rate_date: Date,
    pub buy_rate_micro: i64,
    pub sell_rate_micro: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// A stored quote: the operator buys foreign currency from the user at
/// `buy` and sells it to the user at `sell`, both in PLN per unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Rate {
    pub currency: CurrencyCode,
    pub date: NaiveDate,
    pub buy: Decimal,
    pub sell: Decimal,
}

impl TryFrom<Model> for Rate {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        if model.buy_rate_micro <= 0 || model.sell_rate_micro <= 0 {
            return Err(EngineError::InvalidAmount(format!(
                "stored rate for {} at {} is not positive",
                model.currency_code, model.rate_date
            )));
        }
        Ok(Self {
            currency: CurrencyCode::try_from(model.currency_code.as_str())?,
            date: model.rate_date,
            buy: money::micro_to_rate(model.buy_rate_micro),
            sell: money::micro_to_rate(model.sell_rate_micro),
        })
    }
}
