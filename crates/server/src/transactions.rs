//! Transaction history endpoints.

use api_types::transaction::{
    TransactionKind as ApiKind, TransactionListResponse, TransactionQuery, TransactionView,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};

use engine::LedgerRecord;

use crate::{
    ServerError,
    server::{AuthUser, ServerState},
};

pub(crate) fn map_kind(kind: engine::LedgerKind) -> ApiKind {
    match kind {
        engine::LedgerKind::Deposit => ApiKind::Deposit,
        engine::LedgerKind::Buy => ApiKind::Buy,
        engine::LedgerKind::Sell => ApiKind::Sell,
    }
}

pub(crate) fn record_view(record: LedgerRecord) -> TransactionView {
    TransactionView {
        id: record.id,
        kind: map_kind(record.detail.kind()),
        currency: record
            .detail
            .currency()
            .map(|code| code.as_str().to_string()),
        amount: record.detail.amount(),
        pln_amount: record.detail.pln_amount(),
        ccy_amount: record.detail.ccy_amount(),
        rate: record.detail.rate(),
        status: record.status.as_str().to_string(),
        created_at: record.created_at,
    }
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let page = state
        .engine
        .transactions_for_user(user.id, query.limit, query.offset)
        .await?;

    Ok(Json(TransactionListResponse {
        total: page.total,
        limit: page.limit,
        offset: page.offset,
        items: page.items.into_iter().map(record_view).collect(),
    }))
}
