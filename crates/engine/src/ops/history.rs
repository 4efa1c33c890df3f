use sea_orm::{
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
};

use crate::{LedgerRecord, ResultEngine, transactions};

use super::{Engine, with_tx};

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;

/// One page of a user's ledger history.
#[derive(Clone, Debug)]
pub struct TransactionPage {
    pub items: Vec<LedgerRecord>,
    pub total: u64,
    /// Effective (clamped) page size.
    pub limit: u64,
    pub offset: u64,
}

impl Engine {
    /// Lists a user's ledger records, newest first; records created in the
    /// same instant come back in ascending id order so pages stay stable.
    ///
    /// `limit` is clamped to `[1, 200]` (default 50), `offset` defaults to 0.
    pub async fn transactions_for_user(
        &self,
        user_id: i64,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> ResultEngine<TransactionPage> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = offset.unwrap_or(0);

        with_tx!(self, |db_tx| {
            let base =
                transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id));

            let total = base.clone().count(&db_tx).await?;
            let rows = base
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_asc(transactions::Column::Id)
                .limit(limit)
                .offset(offset)
                .all(&db_tx)
                .await?;

            let mut items = Vec::with_capacity(rows.len());
            for row in rows {
                items.push(LedgerRecord::try_from(row)?);
            }

            Ok(TransactionPage {
                items,
                total,
                limit,
                offset,
            })
        })
    }
}
