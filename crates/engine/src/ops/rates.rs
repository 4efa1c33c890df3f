use chrono::NaiveDate;
use rust_decimal::Decimal;

use sea_orm::{
    ActiveValue, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{CurrencyCode, EngineError, Rate, ResultEngine, money, rates};

use super::{Engine, with_tx};

/// Currencies persisted from an upstream publication. Everything else a
/// table carries is ignored at ingestion.
pub const SUPPORTED_CURRENCIES: [&str; 4] = ["CHF", "EUR", "GBP", "USD"];

impl Engine {
    pub(crate) async fn latest_rate_model(
        &self,
        currency: &CurrencyCode,
    ) -> ResultEngine<rates::Model> {
        rates::Entity::find()
            .filter(rates::Column::CurrencyCode.eq(currency.as_str()))
            .order_by_desc(rates::Column::RateDate)
            .one(&self.database)
            .await?
            .ok_or_else(|| {
                EngineError::RateUnavailable(format!("no rate recorded for {currency}"))
            })
    }

    /// Latest quote recorded for a currency: the row with the maximum date
    /// present in the store.
    pub async fn latest_rate(&self, code: &str) -> ResultEngine<Rate> {
        let currency = CurrencyCode::try_from(code)?;
        let model = self.latest_rate_model(&currency).await?;
        Rate::try_from(model)
    }

    /// Quote in effect for a currency on an exact date.
    pub async fn rate_at(&self, code: &str, date: NaiveDate) -> ResultEngine<Rate> {
        let currency = CurrencyCode::try_from(code)?;
        let model = rates::Entity::find()
            .filter(rates::Column::CurrencyCode.eq(currency.as_str()))
            .filter(rates::Column::RateDate.eq(date))
            .one(&self.database)
            .await?
            .ok_or_else(|| {
                EngineError::RateUnavailable(format!("no rate for {currency} at {date}"))
            })?;
        Rate::try_from(model)
    }

    /// All quotes recorded for a date, sorted by currency code.
    pub async fn rates_for_date(&self, date: NaiveDate) -> ResultEngine<Vec<Rate>> {
        let models = rates::Entity::find()
            .filter(rates::Column::RateDate.eq(date))
            .order_by_asc(rates::Column::CurrencyCode)
            .all(&self.database)
            .await?;
        if models.is_empty() {
            return Err(EngineError::RateUnavailable(format!(
                "no rates recorded for {date}"
            )));
        }
        models.into_iter().map(Rate::try_from).collect()
    }

    /// Quote history of one currency, ascending by date, inclusive bounds.
    pub async fn rate_history(
        &self,
        code: &str,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ResultEngine<Vec<Rate>> {
        let currency = CurrencyCode::try_from(code)?;
        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(EngineError::InvalidAmount(
                "invalid range: from must be <= to".to_string(),
            ));
        }

        let mut query = rates::Entity::find()
            .filter(rates::Column::CurrencyCode.eq(currency.as_str()))
            .order_by_asc(rates::Column::RateDate);
        if let Some(from) = from {
            query = query.filter(rates::Column::RateDate.gte(from));
        }
        if let Some(to) = to {
            query = query.filter(rates::Column::RateDate.lte(to));
        }

        let models = query.all(&self.database).await?;
        models.into_iter().map(Rate::try_from).collect()
    }

    /// Persists an upstream publication for `date`.
    ///
    /// Quotes for a date are immutable: if the date already has rows this is
    /// a no-op returning 0. Only [`SUPPORTED_CURRENCIES`] are kept, and the
    /// upstream mid seeds both sides of the quote until a spread policy
    /// exists. Returns the number of rows inserted.
    pub async fn record_rates(
        &self,
        date: NaiveDate,
        mids: &[(String, Decimal)],
    ) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let existing = rates::Entity::find()
                .filter(rates::Column::RateDate.eq(date))
                .count(&db_tx)
                .await?;
            if existing > 0 {
                return Ok(0);
            }

            let mut inserted = 0;
            for (code, mid) in mids {
                let Ok(currency) = CurrencyCode::try_from(code.as_str()) else {
                    continue;
                };
                if !SUPPORTED_CURRENCIES.contains(&currency.as_str()) {
                    continue;
                }
                let micro = money::rate_to_micro(*mid)?;

                rates::ActiveModel {
                    currency_code: ActiveValue::Set(currency.as_str().to_string()),
                    rate_date: ActiveValue::Set(date),
                    buy_rate_micro: ActiveValue::Set(micro),
                    sell_rate_micro: ActiveValue::Set(micro),
                    ..Default::default()
                }
                .insert(&db_tx)
                .await?;
                inserted += 1;
            }
            Ok(inserted)
        })
    }
}
