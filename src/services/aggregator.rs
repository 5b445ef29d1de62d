//! Account data aggregator
//!
//! Resolves a customer's accounts, cards and transactions from the
//! configured data source and assembles them into a [`UserSnapshot`].
//!
//! Live loads fan out one transactions request per account, plus one cards
//! request, and join them at a single barrier. Any failure aborts the whole
//! load, so a snapshot is either complete or not produced at all.

use chrono::Utc;
use futures::future::{try_join, try_join_all};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::fixtures::MockSource;
use super::nessie::{NessieClient, NewTransaction};
use super::publisher::{SnapshotPublisher, SnapshotReceiver};
use super::transport::{HttpTransport, Transport};
use crate::config::{AppConfig, DataSourceMode};
use crate::types::{
    Account, AccountView, Card, Customer, FetchError, Medium, Result, Transaction,
    TransactionType, UserSnapshot,
};

/// Backing source, fixed for the lifetime of an aggregator
pub enum DataSource<T> {
    Mock(MockSource),
    Live(NessieClient<T>),
}

/// One-step transfer from an account to a payee account
#[derive(Debug, Clone, PartialEq)]
pub struct QuickSend {
    pub from_account: String,
    pub payee_account: String,
    pub amount: Decimal,
    pub description: Option<String>,
}

/// Read-through aggregator over a mock or live data source
pub struct Aggregator<T = HttpTransport> {
    source: DataSource<T>,
    publisher: SnapshotPublisher,
}

impl Aggregator<HttpTransport> {
    /// Build the aggregator the configuration asks for
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let source = match config.mode {
            DataSourceMode::Mock => DataSource::Mock(MockSource::new()),
            DataSourceMode::Live => {
                DataSource::Live(NessieClient::new(HttpTransport::from_config(config)?))
            }
        };
        debug!(mode = %config.mode, "aggregator ready");
        Ok(Self::new(source))
    }
}

impl<T: Transport> Aggregator<T> {
    pub fn new(source: DataSource<T>) -> Self {
        Self {
            source,
            publisher: SnapshotPublisher::new(),
        }
    }

    pub fn mock() -> Self {
        Self::new(DataSource::Mock(MockSource::new()))
    }

    pub fn live(client: NessieClient<T>) -> Self {
        Self::new(DataSource::Live(client))
    }

    pub fn mode(&self) -> DataSourceMode {
        match self.source {
            DataSource::Mock(_) => DataSourceMode::Mock,
            DataSource::Live(_) => DataSourceMode::Live,
        }
    }

    /// API client, when running live
    pub fn client(&self) -> Option<&NessieClient<T>> {
        match &self.source {
            DataSource::Live(client) => Some(client),
            DataSource::Mock(_) => None,
        }
    }

    /// Fixture snapshot. Never fails and never performs I/O.
    pub fn load_mock_data(&self) -> Arc<UserSnapshot> {
        let snapshot = match &self.source {
            DataSource::Mock(mock) => mock.snapshot(),
            DataSource::Live(_) => MockSource::new().snapshot(),
        };
        Arc::new(snapshot)
    }

    /// Load a snapshot for `customer_id` without publishing it.
    ///
    /// In mock mode the id is ignored and the fixture snapshot is returned.
    pub async fn load_user_data(&self, customer_id: &str) -> Result<Arc<UserSnapshot>> {
        match &self.source {
            DataSource::Mock(_) => Ok(self.load_mock_data()),
            DataSource::Live(client) => load_live(client, customer_id).await.map(Arc::new),
        }
    }

    /// Load and publish. Nothing is published when the load fails, when
    /// the future is dropped before completion, or when a newer refresh
    /// started in the meantime (`FetchError::Superseded`).
    pub async fn refresh(&self, customer_id: &str) -> Result<Arc<UserSnapshot>> {
        let ticket = self.publisher.begin();
        let snapshot = self.load_user_data(customer_id).await?;
        self.publisher.publish(ticket, Arc::clone(&snapshot))?;
        Ok(snapshot)
    }

    /// Most recently published snapshot
    pub fn current(&self) -> Option<Arc<UserSnapshot>> {
        self.publisher.current()
    }

    pub fn subscribe(&self) -> SnapshotReceiver {
        self.publisher.subscribe()
    }

    /// Post a transfer from one account to another.
    ///
    /// The published snapshot is left alone; balances only change through
    /// the next refresh.
    pub async fn quick_send(&self, send: &QuickSend) -> Result<Transaction> {
        let client = self
            .client()
            .ok_or_else(|| FetchError::Config("quick-send requires live mode".into()))?;

        let from = send.from_account.trim();
        let payee = send.payee_account.trim();
        if from.is_empty() || payee.is_empty() {
            return Err(FetchError::InvalidInput("both accounts are required".into()));
        }
        if from == payee {
            return Err(FetchError::InvalidInput(
                "cannot send to the same account".into(),
            ));
        }
        if send.amount <= Decimal::ZERO {
            return Err(FetchError::InvalidInput(format!(
                "amount must be positive: {}",
                send.amount
            )));
        }

        let request = NewTransaction {
            kind: TransactionType::Transfer,
            medium: Medium::Balance,
            payee_id: payee.to_string(),
            amount: send.amount,
            transaction_date: Some(Utc::now().date_naive()),
            description: send.description.clone(),
        };
        let created = client.create_transaction(from, &request).await?;
        info!(from, payee, amount = %send.amount, id = %created.id, "quick-send posted");
        Ok(created)
    }
}

/// 404 means "nothing there", not failure
fn or_empty<V>(result: Result<Vec<V>>) -> Result<Vec<V>> {
    match result {
        Err(e) if e.is_not_found() => Ok(Vec::new()),
        other => other,
    }
}

async fn load_live<T: Transport>(
    client: &NessieClient<T>,
    customer_id: &str,
) -> Result<UserSnapshot> {
    let customer_id = customer_id.trim();
    if customer_id.is_empty() {
        return Err(FetchError::InvalidInput("customer id is required".into()));
    }

    let customer = match client.get_customer(customer_id).await {
        Ok(customer) => customer,
        Err(e) if e.is_not_found() => {
            info!(customer = customer_id, "customer not found, empty snapshot");
            return Ok(UserSnapshot::empty(
                customer_id,
                DataSourceMode::Live,
                Utc::now(),
            ));
        }
        Err(e) => return Err(e),
    };
    if customer.id != customer_id {
        warn!(
            requested = customer_id,
            received = %customer.id,
            "customer lookup returned another record"
        );
        return Err(FetchError::CustomerMismatch {
            requested: customer_id.to_string(),
            received: customer.id,
        });
    }

    let accounts = owned_accounts(customer_id, or_empty(client.get_accounts(customer_id).await)?);
    if accounts.is_empty() {
        return Ok(UserSnapshot {
            customer: Some(customer),
            ..UserSnapshot::empty(customer_id, DataSourceMode::Live, Utc::now())
        });
    }

    // Fan out: cards once for the customer, transactions once per account.
    // try_join_all keeps one result slot per account, in account order.
    let cards = async { or_empty(client.get_cards(customer_id).await) };
    let transactions = try_join_all(
        accounts
            .iter()
            .map(|account| async move { or_empty(client.get_transactions(&account.id).await) }),
    );
    let (cards, transactions) = try_join(cards, transactions).await?;

    debug!(
        customer = customer_id,
        accounts = accounts.len(),
        cards = cards.len(),
        "fan-in complete"
    );

    Ok(assemble(customer_id, customer, accounts, cards, transactions))
}

/// Keep only accounts owned by `customer_id`, first occurrence of each id
fn owned_accounts(customer_id: &str, accounts: Vec<Account>) -> Vec<Account> {
    let mut seen = HashSet::new();
    accounts
        .into_iter()
        .filter(|account| {
            if account.customer_id != customer_id {
                warn!(
                    account = %account.id,
                    owner = %account.customer_id,
                    "dropping account owned by another customer"
                );
                return false;
            }
            if !seen.insert(account.id.clone()) {
                warn!(account = %account.id, "dropping duplicate account");
                return false;
            }
            true
        })
        .collect()
}

/// Build the snapshot. `transactions[i]` belongs to `accounts[i]`.
fn assemble(
    customer_id: &str,
    customer: Customer,
    accounts: Vec<Account>,
    cards: Vec<Card>,
    transactions: Vec<Vec<Transaction>>,
) -> UserSnapshot {
    let mut views: Vec<AccountView> = accounts
        .into_iter()
        .zip(transactions)
        .map(|(account, mut txs)| {
            txs.sort_by(|a, b| b.date.cmp(&a.date));
            AccountView {
                account,
                cards: Vec::new(),
                transactions: txs,
            }
        })
        .collect();

    let index: HashMap<String, usize> = views
        .iter()
        .enumerate()
        .map(|(i, v)| (v.account.id.clone(), i))
        .collect();

    for card in cards {
        match index.get(&card.account_id) {
            Some(&i) => views[i].cards.push(card),
            None => warn!(
                card = %card.id,
                account = %card.account_id,
                "dropping card for an account outside the snapshot"
            ),
        }
    }

    let snapshot = UserSnapshot {
        customer_id: customer_id.to_string(),
        customer: Some(customer),
        accounts: views,
        source: DataSourceMode::Live,
        fetched_at: Utc::now(),
    };
    debug_assert!(snapshot.dangling_references().is_empty());
    snapshot
}
