//! Wallet API endpoints.

use api_types::wallet::{CurrencyBalanceView, DepositRequest, WalletView};
use axum::{Extension, Json, extract::State};

use engine::WalletSnapshot;

use crate::{
    ServerError,
    server::{AuthUser, ServerState},
};

pub async fn get(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<WalletView>, ServerError> {
    let snapshot = state.engine.wallet_snapshot(user.id).await?;
    Ok(Json(wallet_view(snapshot)))
}

pub async fn deposit(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<DepositRequest>,
) -> Result<Json<WalletView>, ServerError> {
    let snapshot = state.engine.deposit(user.id, payload.amount_pln).await?;
    Ok(Json(wallet_view(snapshot)))
}

fn wallet_view(snapshot: WalletSnapshot) -> WalletView {
    WalletView {
        id: snapshot.id,
        user_id: snapshot.user_id,
        balance_pln: snapshot.balance_pln,
        balances: snapshot
            .balances
            .into_iter()
            .map(|holding| CurrencyBalanceView {
                currency: holding.currency.as_str().to_string(),
                amount: holding.amount,
            })
            .collect(),
    }
}
