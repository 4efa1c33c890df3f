//! Exchange endpoints: convert between the base balance and a foreign one.

use api_types::exchange::{ExchangeRequest, ExchangeView};
use axum::{Extension, Json, extract::State};

use engine::ExchangeOutcome;

use crate::{
    ServerError,
    server::{AuthUser, ServerState},
    transactions::map_kind,
};

pub async fn buy(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<ExchangeRequest>,
) -> Result<Json<ExchangeView>, ServerError> {
    let outcome = state
        .engine
        .buy(user.id, &payload.currency, payload.amount)
        .await?;
    Ok(Json(exchange_view(outcome)))
}

pub async fn sell(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<ExchangeRequest>,
) -> Result<Json<ExchangeView>, ServerError> {
    let outcome = state
        .engine
        .sell(user.id, &payload.currency, payload.amount)
        .await?;
    Ok(Json(exchange_view(outcome)))
}

fn exchange_view(outcome: ExchangeOutcome) -> ExchangeView {
    ExchangeView {
        transaction_id: outcome.transaction_id,
        kind: map_kind(outcome.kind),
        currency: outcome.currency.as_str().to_string(),
        amount: outcome.amount,
        rate_date: outcome.rate_date,
        rate: outcome.rate,
        pln_amount: outcome.pln_amount,
    }
}
