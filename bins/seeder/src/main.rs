//! Database seeder for Tally development and testing.
//!
//! Opens two demo accounts (reusing them if they already exist) and moves
//! money between them through the transfer engine.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use tally_core::ledger::{Account, LedgerStore, NewAccount, TransferService};
use tally_db::{AccountRepository, PgLedgerStore, connect_with};
use tally_shared::AppConfig;
use tally_shared::types::{Currency, PageRequest};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Demo accounts: owner and opening balance in cents.
const DEMO_ACCOUNTS: [(&str, i64); 2] = [("demo-alice", 100_000), ("demo-bob", 50_000)];

/// Amount moved by the demo transfer, in cents.
const DEMO_TRANSFER_AMOUNT: i64 = 12_345;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug,seeder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    let store = Arc::new(PgLedgerStore::new(db));

    let [(alice_owner, alice_balance), (bob_owner, bob_balance)] = DEMO_ACCOUNTS;
    let alice = seed_account(&store, alice_owner, alice_balance).await?;
    let bob = seed_account(&store, bob_owner, bob_balance).await?;

    let service = TransferService::new(Arc::clone(&store));
    let result = service
        .transfer(alice.id, bob.id, DEMO_TRANSFER_AMOUNT)
        .await
        .context("Demo transfer failed")?;

    info!(
        transfer_id = %result.transfer.id,
        from_balance = result.from_account.balance,
        to_balance = result.to_account.balance,
        "Seeding complete"
    );

    Ok(())
}

/// Returns the owner's USD account, opening it if it does not exist yet.
async fn seed_account(store: &PgLedgerStore, owner: &str, balance: i64) -> anyhow::Result<Account> {
    let existing = AccountRepository::new(store.connection())
        .list_by_owner(owner, PageRequest::default())
        .await?
        .into_iter()
        .find(|account| account.currency == Currency::Usd);

    if let Some(account) = existing {
        info!(account_id = %account.id, owner, balance = account.balance, "Account already exists, skipping");
        return Ok(account);
    }

    let account = store
        .create_account(NewAccount {
            owner: owner.to_string(),
            currency: Currency::Usd,
            balance,
        })
        .await?;
    info!(account_id = %account.id, owner, balance, "Account opened");

    Ok(account)
}
