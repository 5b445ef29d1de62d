//! Static fixture data for mock mode

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::config::DataSourceMode;
use crate::types::{
    Account, AccountType, AccountView, Address, Card, CardStatus, Customer, Medium, Transaction,
    TransactionStatus, TransactionType, UserSnapshot, DEFAULT_CURRENCY,
};

/// Customer id every mock snapshot is built for
pub const MOCK_CUSTOMER_ID: &str = "mock-customer";

fn day(year: i32, month: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, d).unwrap_or_default()
}

/// Amount with two decimal places from an integer number of cents
fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

/// Fixed timestamp so repeated mock loads compare equal
fn fixture_time() -> DateTime<Utc> {
    day(2024, 3, 15)
        .and_hms_opt(9, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

/// Deterministic data source that never touches the network
#[derive(Debug, Clone, Default)]
pub struct MockSource;

impl MockSource {
    pub fn new() -> Self {
        Self
    }

    pub fn customer_id(&self) -> &'static str {
        MOCK_CUSTOMER_ID
    }

    /// Build the fixture snapshot
    pub fn snapshot(&self) -> UserSnapshot {
        let customer = Customer {
            id: MOCK_CUSTOMER_ID.to_string(),
            first_name: "Jordan".to_string(),
            last_name: "Rivera".to_string(),
            address: Address {
                street_number: "221".to_string(),
                street_name: "Harbor Ave".to_string(),
                city: "Richmond".to_string(),
                state: "VA".to_string(),
                zip: "23219".to_string(),
            },
        };

        let accounts = vec![
            checking_view(),
            savings_view(),
            credit_view(),
        ];

        UserSnapshot {
            customer_id: MOCK_CUSTOMER_ID.to_string(),
            customer: Some(customer),
            accounts,
            source: DataSourceMode::Mock,
            fetched_at: fixture_time(),
        }
    }
}

fn account(id: &str, account_type: AccountType, nickname: &str, balance: Decimal) -> Account {
    Account {
        id: id.to_string(),
        account_type,
        nickname: nickname.to_string(),
        rewards: 0,
        balance,
        currency: DEFAULT_CURRENCY.to_string(),
        account_number: None,
        customer_id: MOCK_CUSTOMER_ID.to_string(),
    }
}

#[allow(clippy::too_many_arguments)]
fn transaction(
    id: &str,
    kind: TransactionType,
    date: NaiveDate,
    status: TransactionStatus,
    payer: Option<&str>,
    payee: Option<&str>,
    amount: Decimal,
    description: &str,
) -> Transaction {
    Transaction {
        id: id.to_string(),
        kind,
        date,
        status,
        payer_id: payer.map(String::from),
        payee_id: payee.map(String::from),
        amount,
        medium: Medium::Balance,
        description: Some(description.to_string()),
    }
}

fn checking_view() -> AccountView {
    let id = "mock-checking";
    let mut view = AccountView::new(account(
        id,
        AccountType::Checking,
        "Everyday Checking",
        cents(245_075),
    ));
    view.cards.push(Card {
        id: "mock-card-debit".to_string(),
        account_id: id.to_string(),
        masked_number: "**** **** **** 4821".to_string(),
        expiration: "08/27".to_string(),
        status: CardStatus::Active,
    });
    view.transactions = vec![
        transaction(
            "mock-tx-4",
            TransactionType::Purchase,
            day(2024, 3, 14),
            TransactionStatus::Pending,
            Some(id),
            None,
            cents(-4_299),
            "Grocery Market",
        ),
        transaction(
            "mock-tx-3",
            TransactionType::Transfer,
            day(2024, 3, 10),
            TransactionStatus::Completed,
            Some(id),
            Some("mock-savings"),
            cents(-50_000),
            "Monthly savings",
        ),
        transaction(
            "mock-tx-2",
            TransactionType::Withdrawal,
            day(2024, 3, 6),
            TransactionStatus::Completed,
            Some(id),
            None,
            cents(-8_000),
            "ATM withdrawal",
        ),
        transaction(
            "mock-tx-1",
            TransactionType::Deposit,
            day(2024, 3, 1),
            TransactionStatus::Completed,
            None,
            Some(id),
            cents(310_000),
            "Payroll",
        ),
    ];
    view
}

fn savings_view() -> AccountView {
    let id = "mock-savings";
    let mut view = AccountView::new(account(
        id,
        AccountType::Savings,
        "Rainy Day",
        cents(1_020_000),
    ));
    view.transactions = vec![transaction(
        "mock-tx-5",
        TransactionType::Transfer,
        day(2024, 3, 10),
        TransactionStatus::Completed,
        Some("mock-checking"),
        Some(id),
        cents(50_000),
        "Monthly savings",
    )];
    view
}

fn credit_view() -> AccountView {
    let id = "mock-credit";
    let mut view = AccountView::new(account(
        id,
        AccountType::CreditCard,
        "Travel Rewards",
        cents(-31_842),
    ));
    view.account.rewards = 4_150;
    view.cards.push(Card {
        id: "mock-card-credit".to_string(),
        account_id: id.to_string(),
        masked_number: "**** **** **** 9034".to_string(),
        expiration: "11/26".to_string(),
        status: CardStatus::Active,
    });
    view.cards.push(Card {
        id: "mock-card-credit-old".to_string(),
        account_id: id.to_string(),
        masked_number: "**** **** **** 1177".to_string(),
        expiration: "11/23".to_string(),
        status: CardStatus::Expired,
    });
    view.transactions = vec![
        transaction(
            "mock-tx-7",
            TransactionType::Purchase,
            day(2024, 3, 12),
            TransactionStatus::Completed,
            Some(id),
            None,
            cents(-26_842),
            "Airline tickets",
        ),
        transaction(
            "mock-tx-6",
            TransactionType::Purchase,
            day(2024, 3, 2),
            TransactionStatus::Cancelled,
            Some(id),
            None,
            cents(-5_000),
            "Hotel deposit",
        ),
    ];
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_mock_snapshot_is_deterministic() {
        let source = MockSource::new();
        assert_eq!(source.snapshot(), source.snapshot());
        assert_eq!(source.snapshot(), MockSource.snapshot());
    }

    #[test]
    fn test_mock_snapshot_is_referentially_closed() {
        let snapshot = MockSource::new().snapshot();
        assert!(snapshot.dangling_references().is_empty());
        assert_eq!(snapshot.customer_id, MockSource::new().customer_id());
    }

    #[test]
    fn test_mock_snapshot_contents() {
        let snapshot = MockSource::new().snapshot();
        let summary = snapshot.summary();

        assert_eq!(snapshot.source, DataSourceMode::Mock);
        assert_eq!(summary.account_count, 3);
        assert_eq!(summary.card_count, 3);
        assert_eq!(summary.transaction_count, 7);
        // 2450.75 + 10200.00 - 318.42
        assert_eq!(summary.balances.get("USD"), Some(&dec!(12332.33)));
    }

    #[test]
    fn test_mock_transactions_newest_first() {
        let snapshot = MockSource::new().snapshot();
        for view in &snapshot.accounts {
            assert!(view
                .transactions
                .windows(2)
                .all(|pair| pair[0].date >= pair[1].date));
        }
    }
}
