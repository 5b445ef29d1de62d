//! Snapshot types handed to presentation code

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use super::{Account, Card, Customer, Transaction};
use crate::config::DataSourceMode;

/// One account together with the cards and transactions scoped to it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountView {
    pub account: Account,
    pub cards: Vec<Card>,
    pub transactions: Vec<Transaction>,
}

impl AccountView {
    pub fn new(account: Account) -> Self {
        Self {
            account,
            cards: Vec::new(),
            transactions: Vec::new(),
        }
    }
}

/// Immutable, internally consistent bundle of one customer's data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSnapshot {
    pub customer_id: String,
    /// `None` when the source has no such customer
    pub customer: Option<Customer>,
    pub accounts: Vec<AccountView>,
    pub source: DataSourceMode,
    pub fetched_at: DateTime<Utc>,
}

/// Totals derived from a snapshot
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct SnapshotSummary {
    pub account_count: usize,
    pub card_count: usize,
    pub transaction_count: usize,
    /// Total balance per currency code
    pub balances: BTreeMap<String, Decimal>,
}

impl UserSnapshot {
    /// Snapshot for a customer that has nothing to show
    pub fn empty(
        customer_id: impl Into<String>,
        source: DataSourceMode,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            customer: None,
            accounts: Vec::new(),
            source,
            fetched_at,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter().map(|v| &v.account)
    }

    pub fn account(&self, account_id: &str) -> Option<&AccountView> {
        self.accounts.iter().find(|v| v.account.id == account_id)
    }

    /// All transactions paired with the account they belong to
    pub fn all_transactions(&self) -> impl Iterator<Item = (&Account, &Transaction)> {
        self.accounts
            .iter()
            .flat_map(|v| v.transactions.iter().map(move |t| (&v.account, t)))
    }

    pub fn summary(&self) -> SnapshotSummary {
        let mut summary = SnapshotSummary {
            account_count: self.accounts.len(),
            ..Default::default()
        };

        for view in &self.accounts {
            summary.card_count += view.cards.len();
            summary.transaction_count += view.transactions.len();
            *summary
                .balances
                .entry(view.account.currency.clone())
                .or_default() += view.account.balance;
        }

        summary
    }

    /// List every reference that points outside this snapshot.
    /// An empty result means the snapshot is referentially closed.
    pub fn dangling_references(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();

        if let Some(customer) = &self.customer {
            if customer.id != self.customer_id {
                problems.push(format!(
                    "snapshot for customer {} holds customer {}",
                    self.customer_id, customer.id
                ));
            }
        }

        for view in &self.accounts {
            let account = &view.account;
            if !seen.insert(account.id.as_str()) {
                problems.push(format!("duplicate account {}", account.id));
            }
            if account.customer_id != self.customer_id {
                problems.push(format!(
                    "account {} belongs to customer {}",
                    account.id, account.customer_id
                ));
            }
            for card in &view.cards {
                if card.account_id != account.id {
                    problems.push(format!(
                        "card {} under account {} names account {}",
                        card.id, account.id, card.account_id
                    ));
                }
            }
        }

        problems
    }
}
