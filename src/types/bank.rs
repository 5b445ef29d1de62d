//! Banking entities as served by the Nessie API

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Nessie only deals in US dollars and does not send a currency field
pub const DEFAULT_CURRENCY: &str = "USD";

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub street_number: String,
    pub street_name: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    #[serde(rename = "_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub address: Address,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum AccountType {
    #[serde(rename = "Checking")]
    Checking,
    #[serde(rename = "Savings")]
    Savings,
    #[serde(rename = "Credit Card")]
    CreditCard,
}

impl AccountType {
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Checking => "Checking",
            AccountType::Savings => "Savings",
            AccountType::CreditCard => "Credit Card",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub nickname: String,
    #[serde(default)]
    pub rewards: u32,
    pub balance: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// Owning customer (non-owning back reference)
    pub customer_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    Active,
    Inactive,
    Expired,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Active => "active",
            CardStatus::Inactive => "inactive",
            CardStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning account (non-owning back reference)
    pub account_id: String,
    #[serde(rename = "card_number")]
    pub masked_number: String,
    /// `MM/YY`
    #[serde(rename = "expiration_date")]
    pub expiration: String,
    pub status: CardStatus,
}

impl Card {
    /// Trailing four digits of the masked number, if it has that many
    pub fn last_four(&self) -> Option<&str> {
        let digits = self.masked_number.trim_end();
        let tail = digits.get(digits.len().checked_sub(4)?..)?;
        tail.chars().all(|c| c.is_ascii_digit()).then_some(tail)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    Purchase,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Transfer => "transfer",
            TransactionType::Purchase => "purchase",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    #[default]
    Balance,
    Rewards,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(rename = "transaction_date", alias = "date")]
    pub date: NaiveDate,
    pub status: TransactionStatus,
    #[serde(default)]
    pub payer_id: Option<String>,
    #[serde(default)]
    pub payee_id: Option<String>,
    /// Signed; outflows are negative when the source reports them that way
    pub amount: Decimal,
    pub medium: Medium,
    #[serde(default)]
    pub description: Option<String>,
}

impl Transaction {
    /// Whether this transaction names `account_id` as payer or payee
    pub fn involves(&self, account_id: &str) -> bool {
        self.payer_id.as_deref() == Some(account_id) || self.payee_id.as_deref() == Some(account_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Geocode {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Atm {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub language_list: Vec<String>,
    pub geocode: Geocode,
    #[serde(default)]
    pub hours: Vec<String>,
    #[serde(default)]
    pub accessibility: bool,
    /// Cash on hand, when the source reports it
    #[serde(default)]
    pub amount_left: Option<Decimal>,
    pub address: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Branch {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub hours: Vec<String>,
    #[serde(default)]
    pub notes: Vec<String>,
    pub address: Address,
    #[serde(default)]
    pub geocode: Option<Geocode>,
}
