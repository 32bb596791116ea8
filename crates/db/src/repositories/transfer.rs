//! Transfer repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tally_core::ledger::{Transfer, TransferQuery};
use tally_shared::types::{AccountId, TransferId};
use tracing::debug;

use crate::entities::transfers;

/// Transfer repository over any connection or open transaction.
#[derive(Debug, Clone, Copy)]
pub struct TransferRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C> TransferRepository<'c, C>
where
    C: ConnectionTrait,
{
    /// Creates a repository bound to `conn`.
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// Inserts one transfer.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails: a foreign-key violation when
    /// either account does not exist, a check violation when `amount <= 0`.
    pub async fn create(
        &self,
        from: AccountId,
        to: AccountId,
        amount: i64,
    ) -> Result<Transfer, DbErr> {
        let model = transfers::ActiveModel {
            from_account_id: Set(from.into_inner()),
            to_account_id: Set(to.into_inner()),
            amount: Set(amount),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        debug!(transfer_id = model.id, from = %from, to = %to, amount, "Transfer recorded");
        Ok(to_transfer(model))
    }

    /// Finds a transfer by ID, failing with `RecordNotFound` if it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer does not exist or the query fails.
    pub async fn get(&self, id: TransferId) -> Result<Transfer, DbErr> {
        transfers::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await?
            .map(to_transfer)
            .ok_or_else(|| DbErr::RecordNotFound(format!("transfer {id}")))
    }

    /// Lists transfers leaving `query.from_account_id` or arriving at
    /// `query.to_account_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, query: TransferQuery) -> Result<Vec<Transfer>, DbErr> {
        let rows = transfers::Entity::find()
            .filter(
                Condition::any()
                    .add(transfers::Column::FromAccountId.eq(query.from_account_id.into_inner()))
                    .add(transfers::Column::ToAccountId.eq(query.to_account_id.into_inner())),
            )
            .order_by_asc(transfers::Column::CreatedAt)
            .order_by_asc(transfers::Column::Id)
            .limit(query.limit)
            .offset(query.offset)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(to_transfer).collect())
    }
}

fn to_transfer(model: transfers::Model) -> Transfer {
    Transfer {
        id: TransferId::new(model.id),
        from_account_id: AccountId::new(model.from_account_id),
        to_account_id: AccountId::new(model.to_account_id),
        amount: model.amount,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
