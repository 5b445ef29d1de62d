//! Nessie API client
//!
//! Builds endpoint paths, decodes bodies strictly into the banking
//! entities, and wraps the create endpoints. All I/O goes through a
//! [`Transport`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::transport::Transport;
use crate::types::{
    Account, AccountType, Address, Atm, Branch, Card, Customer, FetchError, Medium, Result,
    Transaction, TransactionType,
};

/// Body for `POST /customers`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub address: Address,
}

/// Body for `POST /customers/{id}/accounts`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewAccount {
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub nickname: String,
    pub rewards: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

/// Body for `POST /accounts/{id}/transactions`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub medium: Medium,
    pub payee_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Search area for ATM and branch lookups
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFilter {
    pub lat: f64,
    pub lng: f64,
    /// Radius in miles
    pub rad: u32,
}

impl GeoFilter {
    pub fn new(lat: f64, lng: f64, rad: u32) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(FetchError::InvalidInput(format!(
                "coordinates out of range: {}, {}",
                lat, lng
            )));
        }
        if rad == 0 {
            return Err(FetchError::InvalidInput("radius must be positive".into()));
        }
        Ok(Self { lat, lng, rad })
    }

    /// A filter only when all three parts are given; a partial set means none
    pub fn from_parts(
        lat: Option<f64>,
        lng: Option<f64>,
        rad: Option<u32>,
    ) -> Result<Option<Self>> {
        match (lat, lng, rad) {
            (Some(lat), Some(lng), Some(rad)) => Self::new(lat, lng, rad).map(Some),
            (None, None, None) => Ok(None),
            _ => {
                warn!("lat, lng and rad must be given together; listing without a filter");
                Ok(None)
            }
        }
    }

    fn apply(&self, path: &str) -> String {
        format!("{}?lat={}&lng={}&rad={}", path, self.lat, self.lng, self.rad)
    }
}

/// List responses, bare or wrapped in Nessie's paging envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Paged { data: Vec<T> },
    Plain(Vec<T>),
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Paged { data } => data,
            Listing::Plain(items) => items,
        }
    }
}

/// Envelope Nessie wraps around created objects
#[derive(Debug, Deserialize)]
struct Created<T> {
    message: String,
    #[serde(rename = "objectCreated")]
    object_created: T,
}

/// Decode a response body, naming the resource on failure
pub fn decode<R: DeserializeOwned>(resource: &str, body: &str) -> Result<R> {
    serde_json::from_str(body).map_err(|e| FetchError::decode(resource, e))
}

/// Validate an id before it is spliced into a path
fn segment(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(FetchError::InvalidInput("empty identifier".into()));
    }
    if id
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%' | '&'))
    {
        return Err(FetchError::InvalidInput(format!(
            "identifier contains reserved characters: {:?}",
            id
        )));
    }
    Ok(id)
}

fn located(path: &str, filter: Option<GeoFilter>) -> String {
    match filter {
        Some(f) => f.apply(path),
        None => path.to_string(),
    }
}

/// Typed client for the Nessie endpoints this crate uses
pub struct NessieClient<T> {
    transport: T,
}

impl<T: Transport> NessieClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// `GET /customers`
    pub async fn list_customers(&self) -> Result<Vec<Customer>> {
        self.get_json("/customers").await
    }

    /// `GET /customers/{id}`
    pub async fn get_customer(&self, customer_id: &str) -> Result<Customer> {
        let path = format!("/customers/{}", segment(customer_id)?);
        self.get_json(&path).await
    }

    /// `GET /customers/{id}/accounts`
    pub async fn get_accounts(&self, customer_id: &str) -> Result<Vec<Account>> {
        let path = format!("/customers/{}/accounts", segment(customer_id)?);
        self.get_json(&path).await
    }

    /// `GET /accounts/{id}`
    pub async fn get_account(&self, account_id: &str) -> Result<Account> {
        let path = format!("/accounts/{}", segment(account_id)?);
        self.get_json(&path).await
    }

    /// `GET /customers/{id}/cards`
    pub async fn get_cards(&self, customer_id: &str) -> Result<Vec<Card>> {
        let path = format!("/customers/{}/cards", segment(customer_id)?);
        self.get_json(&path).await
    }

    /// `GET /accounts/{id}/transactions`
    pub async fn get_transactions(&self, account_id: &str) -> Result<Vec<Transaction>> {
        let path = format!("/accounts/{}/transactions", segment(account_id)?);
        self.get_json(&path).await
    }

    /// `GET /atms`, optionally near a point
    pub async fn list_atms(&self, filter: Option<GeoFilter>) -> Result<Vec<Atm>> {
        let path = located("/atms", filter);
        self.get_json::<Listing<Atm>>(&path).await.map(Listing::into_vec)
    }

    /// `GET /branches`, optionally near a point
    pub async fn list_branches(&self, filter: Option<GeoFilter>) -> Result<Vec<Branch>> {
        let path = located("/branches", filter);
        self.get_json::<Listing<Branch>>(&path)
            .await
            .map(Listing::into_vec)
    }

    /// `POST /customers`
    pub async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer> {
        self.post_json("/customers", customer).await
    }

    /// `POST /customers/{id}/accounts`
    pub async fn create_account(&self, customer_id: &str, account: &NewAccount) -> Result<Account> {
        let path = format!("/customers/{}/accounts", segment(customer_id)?);
        self.post_json(&path, account).await
    }

    /// `POST /accounts/{id}/transactions`
    pub async fn create_transaction(
        &self,
        account_id: &str,
        transaction: &NewTransaction,
    ) -> Result<Transaction> {
        let path = format!("/accounts/{}/transactions", segment(account_id)?);
        self.post_json(&path, transaction).await
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let body = self.transport.get(path).await?;
        decode(path, &body)
    }

    async fn post_json<B: Serialize, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        let value = serde_json::to_value(body)
            .map_err(|e| FetchError::InvalidInput(format!("unserializable body: {}", e)))?;
        let response = self.transport.post(path, &value).await?;
        let created: Created<R> = decode(path, &response)?;
        debug!(path, message = %created.message, "created");
        Ok(created.object_created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::transport::MemoryTransport;
    use crate::types::CardStatus;
    use rust_decimal_macros::dec;

    const CUSTOMER: &str = r#"{"_id": "c1", "first_name": "Ada", "last_name": "Lovelace",
        "address": {"street_number": "1", "street_name": "Main", "city": "X", "state": "IL", "zip": "00001"}}"#;

    fn address() -> Address {
        Address {
            street_number: "1".into(),
            street_name: "Main".into(),
            city: "X".into(),
            state: "IL".into(),
            zip: "00001".into(),
        }
    }

    // ========== segment() ==========

    #[test]
    fn test_segment_accepts_plain_ids() {
        assert_eq!(segment(" 5f1e2d ").unwrap(), "5f1e2d");
    }

    #[test]
    fn test_segment_rejects_reserved_characters() {
        for bad in ["", "   ", "a/b", "a?key=x", "a#b", "a b", "a%2F"] {
            assert!(
                matches!(segment(bad), Err(FetchError::InvalidInput(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    // ========== GET endpoints ==========

    #[tokio::test]
    async fn test_get_customer() {
        let client = NessieClient::new(MemoryTransport::new().with_body("/customers/c1", CUSTOMER));

        let customer = client.get_customer("c1").await.unwrap();

        assert_eq!(customer.last_name, "Lovelace");
    }

    #[tokio::test]
    async fn test_list_customers() {
        let body = format!("[{}]", CUSTOMER);
        let client = NessieClient::new(MemoryTransport::new().with_body("/customers", body));

        let customers = client.list_customers().await.unwrap();

        assert_eq!(customers.len(), 1);
    }

    #[tokio::test]
    async fn test_get_accounts_and_cards() {
        let transport = MemoryTransport::new()
            .with_body(
                "/customers/c1/accounts",
                r#"[{"_id": "a1", "type": "Savings", "nickname": "Rainy", "balance": 500.00, "customer_id": "c1"}]"#,
            )
            .with_body(
                "/customers/c1/cards",
                r#"[{"_id": "k1", "account_id": "a1", "card_number": "**** 4242", "expiration_date": "01/29", "status": "expired"}]"#,
            );
        let client = NessieClient::new(transport);

        let accounts = client.get_accounts("c1").await.unwrap();
        let cards = client.get_cards("c1").await.unwrap();

        assert_eq!(accounts[0].balance, dec!(500));
        assert_eq!(cards[0].status, CardStatus::Expired);
    }

    #[tokio::test]
    async fn test_get_account() {
        let client = NessieClient::new(MemoryTransport::new().with_body(
            "/accounts/a1",
            r#"{"_id": "a1", "type": "Checking", "nickname": "Main", "balance": 12, "customer_id": "c1"}"#,
        ));

        let account = client.get_account("a1").await.unwrap();

        assert_eq!(account.nickname, "Main");
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error_naming_path() {
        let client = NessieClient::new(
            MemoryTransport::new().with_body("/accounts/a1/transactions", r#"[{"_id": 7}]"#),
        );

        let err = client.get_transactions("a1").await.unwrap_err();

        match err {
            FetchError::Decode { resource, .. } => {
                assert_eq!(resource, "/accounts/a1/transactions")
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_id_never_reaches_transport() {
        let client = NessieClient::new(MemoryTransport::new());

        let err = client.get_accounts("../admin").await.unwrap_err();

        assert!(matches!(err, FetchError::InvalidInput(_)));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_customer_is_not_found() {
        let client = NessieClient::new(MemoryTransport::new());
        assert!(client.get_customer("nobody").await.unwrap_err().is_not_found());
    }

    // ========== GeoFilter ==========

    #[test]
    fn test_geo_filter_needs_all_parts() {
        assert_eq!(GeoFilter::from_parts(None, None, None).unwrap(), None);
        assert_eq!(GeoFilter::from_parts(Some(38.9), Some(-77.0), None).unwrap(), None);
        assert_eq!(GeoFilter::from_parts(None, Some(-77.0), Some(5)).unwrap(), None);
        assert_eq!(
            GeoFilter::from_parts(Some(38.9), Some(-77.0), Some(5)).unwrap(),
            Some(GeoFilter {
                lat: 38.9,
                lng: -77.0,
                rad: 5
            })
        );
    }

    #[test]
    fn test_geo_filter_rejects_bad_values() {
        assert!(GeoFilter::new(91.0, 0.0, 1).is_err());
        assert!(GeoFilter::new(0.0, -180.5, 1).is_err());
        assert!(GeoFilter::new(0.0, 0.0, 0).is_err());
    }

    // ========== ATMs / branches ==========

    const ATM: &str = r#"{"_id": "m1", "name": "Capital One ATM",
        "geocode": {"lat": 38.9283, "lng": -77.1753},
        "address": {"street_number": "1680", "street_name": "Capital One Dr", "city": "McLean", "state": "VA", "zip": "22102"}}"#;

    const BRANCH: &str = r#"{"_id": "b1", "name": "Tysons Branch", "phone_number": "7035550100",
        "hours": ["Mon-Fri 9-5"],
        "address": {"street_number": "8020", "street_name": "Towers Crescent Dr", "city": "Vienna", "state": "VA", "zip": "22182"}}"#;

    #[tokio::test]
    async fn test_list_atms_unwraps_paging_envelope() {
        let body = format!(
            r#"{{"data": [{}], "paging": {{"previous": null, "next": "/atms?page=2"}}}}"#,
            ATM
        );
        let client = NessieClient::new(MemoryTransport::new().with_body("/atms", body));

        let atms = client.list_atms(None).await.unwrap();

        assert_eq!(atms.len(), 1);
        assert_eq!(atms[0].name, "Capital One ATM");
        assert_eq!(client.transport().requests(), vec!["GET /atms".to_string()]);
    }

    #[tokio::test]
    async fn test_list_atms_with_filter_builds_query() {
        let client = NessieClient::new(
            MemoryTransport::new().with_body("/atms?lat=38.9&lng=-77.03&rad=2", format!("[{}]", ATM)),
        );
        let filter = GeoFilter::new(38.9, -77.03, 2).unwrap();

        let atms = client.list_atms(Some(filter)).await.unwrap();

        assert_eq!(atms[0].id, "m1");
    }

    #[tokio::test]
    async fn test_list_branches() {
        let client = NessieClient::new(
            MemoryTransport::new().with_body("/branches", format!("[{}]", BRANCH)),
        );

        let branches = client.list_branches(None).await.unwrap();

        assert_eq!(branches[0].hours, vec!["Mon-Fri 9-5".to_string()]);
    }

    #[tokio::test]
    async fn test_list_branches_malformed_is_decode_error() {
        let client = NessieClient::new(
            MemoryTransport::new().with_body("/branches", r#"{"data": [{"_id": "b1"}]}"#),
        );

        let err = client.list_branches(None).await.unwrap_err();

        assert!(matches!(err, FetchError::Decode { .. }));
    }

    // ========== POST endpoints ==========

    #[tokio::test]
    async fn test_create_customer_unwraps_envelope() {
        let response = format!(
            r#"{{"code": 201, "message": "Created customer", "objectCreated": {}}}"#,
            CUSTOMER
        );
        let client =
            NessieClient::new(MemoryTransport::new().with_post_body("/customers", response));
        let request = NewCustomer {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            address: address(),
        };

        let created = client.create_customer(&request).await.unwrap();

        assert_eq!(created.id, "c1");
        let posted = client.transport().posted();
        assert_eq!(posted[0].1["address"]["zip"], "00001");
    }

    #[tokio::test]
    async fn test_create_account_sends_numeric_balance() {
        let response = r#"{"code": 201, "message": "Account created", "objectCreated":
            {"_id": "a9", "type": "Credit Card", "nickname": "Travel", "rewards": 0, "balance": 250.5, "customer_id": "c1"}}"#;
        let client = NessieClient::new(
            MemoryTransport::new().with_post_body("/customers/c1/accounts", response),
        );
        let request = NewAccount {
            account_type: AccountType::CreditCard,
            nickname: "Travel".into(),
            rewards: 0,
            balance: dec!(250.50),
        };

        let created = client.create_account("c1", &request).await.unwrap();

        assert_eq!(created.id, "a9");
        let posted = client.transport().posted();
        assert_eq!(posted[0].1["type"], "Credit Card");
        assert_eq!(posted[0].1["balance"], 250.5);
    }

    #[tokio::test]
    async fn test_create_transaction() {
        let response = r#"{"code": 201, "message": "Created transaction", "objectCreated":
            {"_id": "t9", "type": "transfer", "transaction_date": "2024-03-05", "status": "pending",
             "payer_id": "a1", "payee_id": "a2", "amount": 20, "medium": "balance"}}"#;
        let client = NessieClient::new(
            MemoryTransport::new().with_post_body("/accounts/a1/transactions", response),
        );
        let request = NewTransaction {
            kind: TransactionType::Transfer,
            medium: Medium::Balance,
            payee_id: "a2".into(),
            amount: dec!(20),
            transaction_date: None,
            description: None,
        };

        let created = client.create_transaction("a1", &request).await.unwrap();

        assert_eq!(created.payee_id.as_deref(), Some("a2"));
        let posted = client.transport().posted();
        assert!(posted[0].1.get("description").is_none());
        assert_eq!(posted[0].1["amount"], 20.0);
    }

    #[tokio::test]
    async fn test_create_envelope_without_code() {
        let response = format!(r#"{{"message": "Created customer", "objectCreated": {}}}"#, CUSTOMER);
        let client =
            NessieClient::new(MemoryTransport::new().with_post_body("/customers", response));
        let request = NewCustomer {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            address: address(),
        };

        let created = client.create_customer(&request).await.unwrap();

        assert_eq!(created.full_name(), "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_create_response_without_envelope_is_decode_error() {
        let client =
            NessieClient::new(MemoryTransport::new().with_post_body("/customers", CUSTOMER));
        let request = NewCustomer {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            address: address(),
        };

        let err = client.create_customer(&request).await.unwrap_err();

        assert!(matches!(err, FetchError::Decode { .. }));
    }
}
