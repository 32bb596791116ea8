//! Account repository.
//!
//! `adjust_balance` is a single `UPDATE ... RETURNING`, so the read and the
//! write of the balance happen under the row lock PostgreSQL takes for the
//! update. Inside a transaction that lock is held until commit or rollback.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tally_core::ledger::{Account, NewAccount};
use tally_shared::types::{AccountId, Currency, PageRequest};
use tracing::debug;

use crate::entities::accounts;

/// Account repository over any connection or open transaction.
#[derive(Debug, Clone, Copy)]
pub struct AccountRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C> AccountRepository<'c, C>
where
    C: ConnectionTrait,
{
    /// Creates a repository bound to `conn`.
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// Inserts a new account.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including a unique violation on
    /// `(owner, currency)`.
    pub async fn create(&self, input: NewAccount) -> Result<Account, DbErr> {
        let model = accounts::ActiveModel {
            owner: Set(input.owner),
            balance: Set(input.balance),
            currency: Set(input.currency.code().to_string()),
            ..Default::default()
        }
        .insert(self.conn)
        .await?;

        debug!(account_id = model.id, currency = %model.currency, "Account created");
        to_account(model)
    }

    /// Finds an account by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, DbErr> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await?
            .map(to_account)
            .transpose()
    }

    /// Finds an account by ID, failing with `RecordNotFound` if it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or the query fails.
    pub async fn get(&self, id: AccountId) -> Result<Account, DbErr> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("account {id}")))
    }

    /// Lists accounts belonging to `owner`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_owner(&self, owner: &str, page: PageRequest) -> Result<Vec<Account>, DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::Owner.eq(owner))
            .order_by_asc(accounts::Column::CreatedAt)
            .order_by_asc(accounts::Column::Id)
            .limit(page.limit())
            .offset(page.offset())
            .all(self.conn)
            .await?
            .into_iter()
            .map(to_account)
            .collect()
    }

    /// Adds `delta` to the balance and returns the updated row.
    ///
    /// # Errors
    ///
    /// Returns `RecordNotFound` if no row matched, or the database error
    /// (for example numeric out of range) if the update failed.
    pub async fn adjust_balance(&self, id: AccountId, delta: i64) -> Result<Account, DbErr> {
        let updated = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(delta),
            )
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .exec_with_returning(self.conn)
            .await?;

        let model = updated
            .into_iter()
            .next()
            .ok_or_else(|| DbErr::RecordNotFound(format!("account {id}")))?;

        debug!(account_id = %id, delta, balance = model.balance, "Balance adjusted");
        to_account(model)
    }
}

/// Converts a row into the domain type.
pub(crate) fn to_account(model: accounts::Model) -> Result<Account, DbErr> {
    let currency = model
        .currency
        .parse::<Currency>()
        .map_err(|e| DbErr::Type(e.to_string()))?;

    Ok(Account {
        id: AccountId::new(model.id),
        owner: model.owner,
        balance: model.balance,
        currency,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
