//! Entry repository.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tally_core::ledger::{Entry, EntryQuery};
use tally_shared::types::{AccountId, EntryId};
use tracing::debug;

use crate::entities::entries;

/// Entry repository over any connection or open transaction.
#[derive(Debug, Clone, Copy)]
pub struct EntryRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C> EntryRepository<'c, C>
where
    C: ConnectionTrait,
{
    /// Creates a repository bound to `conn`.
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// Inserts one entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including a foreign-key
    /// violation when the account does not exist.
    pub async fn create(&self, account_id: AccountId, amount: i64) -> Result<Entry, DbErr> {
        let model = entries::ActiveModel {
            account_id: Set(account_id.into_inner()),
            amount: Set(amount),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        debug!(entry_id = model.id, account_id = %account_id, amount, "Entry recorded");
        Ok(to_entry(model))
    }

    /// Finds an entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: EntryId) -> Result<Option<Entry>, DbErr> {
        Ok(entries::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await?
            .map(to_entry))
    }

    /// Lists an account's entries, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, query: EntryQuery) -> Result<Vec<Entry>, DbErr> {
        let rows = entries::Entity::find()
            .filter(entries::Column::AccountId.eq(query.account_id.into_inner()))
            .order_by_asc(entries::Column::CreatedAt)
            .order_by_asc(entries::Column::Id)
            .limit(query.limit)
            .offset(query.offset)
            .all(self.conn)
            .await?;

        Ok(rows.into_iter().map(to_entry).collect())
    }
}

fn to_entry(model: entries::Model) -> Entry {
    Entry {
        id: EntryId::new(model.id),
        account_id: AccountId::new(model.account_id),
        amount: model.amount,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
