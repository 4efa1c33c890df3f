//! Rate endpoints: expose stored quotes and pull missing ones upstream.

use std::collections::BTreeMap;

use api_types::rates::{
    RateHistoryResponse, RatePointView, RateTableResponse, RatesHistoryQuery,
};
use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;

use engine::{EngineError, Rate};

use crate::{ServerError, server::ServerState};

/// GET /rates/latest
///
/// Fetches the newest upstream publication, persists it if its date is new
/// and serves the stored quotes. Serving from the store (instead of echoing
/// the fetch) keeps the response consistent with what exchanges will use.
pub async fn latest(State(state): State<ServerState>) -> Result<Json<RateTableResponse>, ServerError> {
    let table = state.nbp.table_a(None).await?;
    state.engine.record_rates(table.date, &table.mids).await?;

    let rates = state.engine.rates_for_date(table.date).await?;
    Ok(Json(table_response(table.date, rates)))
}

/// GET /rates/history
///
/// Two modes, as selected by the query: `?date=YYYY-MM-DD` returns the full
/// table for one day (fetching it upstream on a store miss), while
/// `?code=USD[&from&to]` returns one currency's quote history.
pub async fn history(
    State(state): State<ServerState>,
    Query(query): Query<RatesHistoryQuery>,
) -> Result<Response, ServerError> {
    if let Some(date) = query.date {
        let table = table_for_date(&state, date).await?;
        return Ok(Json(table).into_response());
    }

    let Some(code) = query.code else {
        return Err(ServerError::Generic("provide 'date' or 'code'".to_string()));
    };

    let rates = state
        .engine
        .rate_history(&code, query.from, query.to)
        .await?;
    let items: Vec<RatePointView> = rates
        .iter()
        .map(|rate| RatePointView {
            date: rate.date,
            buy: rate.buy,
            sell: rate.sell,
        })
        .collect();

    Ok(Json(RateHistoryResponse {
        currency: code.trim().to_ascii_uppercase(),
        count: items.len(),
        items,
    })
    .into_response())
}

async fn table_for_date(
    state: &ServerState,
    date: NaiveDate,
) -> Result<RateTableResponse, ServerError> {
    match state.engine.rates_for_date(date).await {
        Ok(rates) => Ok(table_response(date, rates)),
        Err(EngineError::RateUnavailable(_)) => {
            // Store miss: pull the table upstream (404 there means no
            // publication exists for the date) and serve what got persisted.
            let table = state.nbp.table_a(Some(date)).await?;
            state.engine.record_rates(table.date, &table.mids).await?;
            let rates = state.engine.rates_for_date(date).await?;
            Ok(table_response(date, rates))
        }
        Err(err) => Err(err.into()),
    }
}

fn table_response(date: NaiveDate, rates: Vec<Rate>) -> RateTableResponse {
    let rates: BTreeMap<String, _> = rates
        .into_iter()
        .map(|rate| (rate.currency.as_str().to_string(), rate.buy))
        .collect();
    RateTableResponse { date, rates }
}
