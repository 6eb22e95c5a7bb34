//! Typed table access.
//!
//! Every table gets the same five operations through [`Repository`]; the
//! per-table differences (name, id column, date column, default order, how
//! to filter by dog) live in the [`Record`] impls below.

use std::fmt::Display;
use std::marker::PhantomData;

use kennel_core::{
    Dog, DogId, Expense, ExpenseId, GrowthEvent, GrowthEventId, HealthRecord, HealthRecordId,
    Litter, LitterId, NewDog, NewExpense, NewGrowthEvent, NewHealthRecord, NewLitter, NewPurchase,
    NewSale, Purchase, PurchaseId, QrCode, Sale, SaleId,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::client::{DataClient, MERGE_DUPLICATES, RETURN_REPRESENTATION};
use super::RepositoryError;
use super::query::{Direction, ListQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Dogs,
    Purchases,
    Sales,
    Expenses,
    Litters,
    HealthRecords,
    GrowthEvents,
    QrCodes,
}

impl Table {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dogs => "dogs",
            Self::Purchases => "purchases",
            Self::Sales => "sales",
            Self::Expenses => "expenses",
            Self::Litters => "litters",
            Self::HealthRecords => "health_records",
            Self::GrowthEvents => "growth_events",
            Self::QrCodes => "qrcodes",
        }
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row type stored in one table.
pub trait Record: DeserializeOwned + Send + Sync + 'static {
    type Id: Display + Copy + Send + Sync;
    /// Form input accepted by `create`.
    type New: Serialize + Send + Sync;

    const TABLE: Table;
    const ID_COLUMN: &'static str = "id";
    /// Column the `from`/`to` range of a [`ListQuery`] applies to.
    const DATE_COLUMN: Option<&'static str>;
    const DEFAULT_ORDER: (&'static str, Direction);

    fn id(&self) -> Self::Id;

    /// Query pair selecting the rows that concern `dog_id`.
    fn dog_filter(dog_id: DogId) -> Option<(String, String)> {
        Some(("dog_id".to_string(), format!("eq.{dog_id}")))
    }
}

impl Record for Dog {
    type Id = DogId;
    type New = NewDog;

    const TABLE: Table = Table::Dogs;
    const DATE_COLUMN: Option<&'static str> = Some("birth_date");
    // Oldest first, so a refreshed roster keeps the order dogs were added in.
    const DEFAULT_ORDER: (&'static str, Direction) = ("created_at", Direction::Ascending);

    fn id(&self) -> DogId {
        self.id
    }

    fn dog_filter(dog_id: DogId) -> Option<(String, String)> {
        Some(("id".to_string(), format!("eq.{dog_id}")))
    }
}

impl Record for Purchase {
    type Id = PurchaseId;
    type New = NewPurchase;

    const TABLE: Table = Table::Purchases;
    const DATE_COLUMN: Option<&'static str> = Some("purchase_date");
    const DEFAULT_ORDER: (&'static str, Direction) = ("purchase_date", Direction::Descending);

    fn id(&self) -> PurchaseId {
        self.id
    }
}

impl Record for Sale {
    type Id = SaleId;
    type New = NewSale;

    const TABLE: Table = Table::Sales;
    const DATE_COLUMN: Option<&'static str> = Some("sale_date");
    const DEFAULT_ORDER: (&'static str, Direction) = ("sale_date", Direction::Descending);

    fn id(&self) -> SaleId {
        self.id
    }
}

impl Record for Expense {
    type Id = ExpenseId;
    type New = NewExpense;

    const TABLE: Table = Table::Expenses;
    const DATE_COLUMN: Option<&'static str> = Some("expense_date");
    const DEFAULT_ORDER: (&'static str, Direction) = ("expense_date", Direction::Descending);

    fn id(&self) -> ExpenseId {
        self.id
    }
}

impl Record for Litter {
    type Id = LitterId;
    type New = NewLitter;

    const TABLE: Table = Table::Litters;
    const DATE_COLUMN: Option<&'static str> = Some("birth_date");
    const DEFAULT_ORDER: (&'static str, Direction) = ("birth_date", Direction::Descending);

    fn id(&self) -> LitterId {
        self.id
    }

    /// A litter concerns both of its parents.
    fn dog_filter(dog_id: DogId) -> Option<(String, String)> {
        Some((
            "or".to_string(),
            format!("(sire_id.eq.{dog_id},dam_id.eq.{dog_id})"),
        ))
    }
}

impl Record for HealthRecord {
    type Id = HealthRecordId;
    type New = NewHealthRecord;

    const TABLE: Table = Table::HealthRecords;
    const DATE_COLUMN: Option<&'static str> = Some("date");
    const DEFAULT_ORDER: (&'static str, Direction) = ("date", Direction::Descending);

    fn id(&self) -> HealthRecordId {
        self.id
    }
}

impl Record for GrowthEvent {
    type Id = GrowthEventId;
    type New = NewGrowthEvent;

    const TABLE: Table = Table::GrowthEvents;
    const DATE_COLUMN: Option<&'static str> = Some("event_date");
    const DEFAULT_ORDER: (&'static str, Direction) = ("event_date", Direction::Descending);

    fn id(&self) -> GrowthEventId {
        self.id
    }
}

impl Record for QrCode {
    type Id = DogId;
    type New = Self;

    const TABLE: Table = Table::QrCodes;
    const ID_COLUMN: &'static str = "dog_id";
    const DATE_COLUMN: Option<&'static str> = None;
    const DEFAULT_ORDER: (&'static str, Direction) = ("updated_at", Direction::Descending);

    fn id(&self) -> DogId {
        self.dog_id
    }
}

/// Repository for one table.
pub struct Repository<'a, R> {
    client: &'a DataClient,
    _record: PhantomData<fn() -> R>,
}

pub type DogRepository<'a> = Repository<'a, Dog>;
pub type PurchaseRepository<'a> = Repository<'a, Purchase>;
pub type SaleRepository<'a> = Repository<'a, Sale>;
pub type ExpenseRepository<'a> = Repository<'a, Expense>;
pub type LitterRepository<'a> = Repository<'a, Litter>;
pub type HealthRecordRepository<'a> = Repository<'a, HealthRecord>;
pub type GrowthEventRepository<'a> = Repository<'a, GrowthEvent>;
pub type QrCodeRepository<'a> = Repository<'a, QrCode>;

impl<'a, R: Record> Repository<'a, R> {
    /// Create a new repository with the given client.
    #[must_use]
    pub const fn new(client: &'a DataClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }

    /// Bulk read.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or a row does not parse.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<R>, RepositoryError> {
        let pairs = query.to_pairs(R::dog_filter, R::DATE_COLUMN, R::DEFAULT_ORDER);
        self.client.select(R::TABLE.as_str(), &pairs).await
    }

    /// Single-row read. `Ok(None)` if there is no such row.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the row does not parse.
    pub async fn get(&self, id: R::Id) -> Result<Option<R>, RepositoryError> {
        let pairs = [
            ("select".to_string(), "*".to_string()),
            Self::id_pair(id),
        ];
        let rows: Vec<R> = self.client.select(R::TABLE.as_str(), &pairs).await?;
        Ok(rows.into_iter().next())
    }

    /// Insert one row and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store echoes no row.
    pub async fn create(&self, input: &R::New) -> Result<R, RepositoryError> {
        let rows: Vec<R> = self
            .client
            .insert(
                R::TABLE.as_str(),
                &[],
                std::slice::from_ref(input),
                RETURN_REPRESENTATION,
            )
            .await?;
        rows.into_iter().next().ok_or_else(|| {
            RepositoryError::Parse(format!("insert into {} returned no row", R::TABLE))
        })
    }

    /// Patch one row and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no row has this id.
    pub async fn update<P>(&self, id: R::Id, patch: &P) -> Result<R, RepositoryError>
    where
        P: Serialize + Sync,
    {
        let rows: Vec<R> = self
            .client
            .update(R::TABLE.as_str(), &[Self::id_pair(id)], patch)
            .await?;
        rows.into_iter().next().ok_or(RepositoryError::NotFound)
    }

    /// Delete one row.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if no row has this id.
    pub async fn delete(&self, id: R::Id) -> Result<(), RepositoryError> {
        let rows = self
            .client
            .delete(R::TABLE.as_str(), &[Self::id_pair(id)])
            .await?;
        if rows.is_empty() {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn id_pair(id: R::Id) -> (String, String) {
        (R::ID_COLUMN.to_string(), format!("eq.{id}"))
    }
}

impl Repository<'_, QrCode> {
    /// The QR code of `dog_id`, if one was generated.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_for_dog(&self, dog_id: DogId) -> Result<Option<QrCode>, RepositoryError> {
        let latest = ListQuery::new().for_dog(dog_id).limit(1);
        Ok(self.list(&latest).await?.into_iter().next())
    }

    /// Insert the code or replace the existing one for the same dog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the store echoes no row.
    pub async fn upsert(&self, code: &QrCode) -> Result<QrCode, RepositoryError> {
        let rows: Vec<QrCode> = self
            .client
            .insert(
                Table::QrCodes.as_str(),
                &[("on_conflict".to_string(), "dog_id".to_string())],
                std::slice::from_ref(code),
                MERGE_DUPLICATES,
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RepositoryError::Parse("QR code upsert returned no row".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use kennel_core::{DogPatch, DogStatus, Gender};
    use secrecy::SecretString;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    use super::*;
    use crate::config::DataStoreConfig;

    fn client_for(server: &MockServer) -> DataClient {
        DataClient::new(&DataStoreConfig {
            url: Url::parse(&server.uri()).unwrap(),
            api_key: SecretString::from("test-service-key"),
        })
        .unwrap()
    }

    fn dog_row(id: DogId, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "breed": "Whippet",
            "gender": "male",
            "birth_date": "2022-02-02",
            "color": "fawn",
            "status": "owned",
            "photos": [],
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_list_uses_table_defaults() {
        let server = MockServer::start().await;
        let id = DogId::generate();
        Mock::given(method("GET"))
            .and(path("/rest/v1/dogs"))
            .and(query_param("select", "*"))
            .and(query_param("order", "created_at.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([dog_row(id, "Rex")])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let dogs = DogRepository::new(&client)
            .list(&ListQuery::new())
            .await
            .unwrap();
        assert_eq!(dogs.len(), 1);
        assert_eq!(dogs[0].id, id);
    }

    #[tokio::test]
    async fn test_litter_filter_matches_either_parent() {
        let server = MockServer::start().await;
        let dog = DogId::generate();
        Mock::given(method("GET"))
            .and(path("/rest/v1/litters"))
            .and(query_param("or", format!("(sire_id.eq.{dog},dam_id.eq.{dog})")))
            .and(query_param("birth_date", "gte.2024-01-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let query = ListQuery::new()
            .for_dog(dog)
            .between(NaiveDate::from_ymd_opt(2024, 1, 1), None);
        let litters = LitterRepository::new(&client).list(&query).await.unwrap();
        assert!(litters.is_empty());
    }

    #[tokio::test]
    async fn test_create_posts_single_row_array() {
        let server = MockServer::start().await;
        let id = DogId::generate();
        let input = NewDog {
            name: "Rex".to_string(),
            breed: "Whippet".to_string(),
            gender: Gender::Male,
            birth_date: NaiveDate::from_ymd_opt(2022, 2, 2).unwrap(),
            color: "fawn".to_string(),
            weight: None,
            microchip_id: None,
            registration_number: None,
            owner_contact: None,
            status: DogStatus::Owned,
            photos: vec![],
            sire_id: None,
            dam_id: None,
            notes: None,
        };
        Mock::given(method("POST"))
            .and(path("/rest/v1/dogs"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!([input])))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([dog_row(id, "Rex")])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let created = DogRepository::new(&client).create(&input).await.unwrap();
        assert_eq!(created.id, id);
        assert_eq!(created.name, "Rex");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_row() {
        let server = MockServer::start().await;
        let id = DogId::generate();
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/dogs"))
            .and(query_param("id", format!("eq.{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/dogs"))
            .and(query_param("id", format!("eq.{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let repo = DogRepository::new(&client);
        let err = repo
            .update(id, &DogPatch::status(DogStatus::Sold))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
        assert!(matches!(
            repo.delete(id).await.unwrap_err(),
            RepositoryError::NotFound
        ));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/sales"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let sale = SaleRepository::new(&client)
            .get(SaleId::generate())
            .await
            .unwrap();
        assert!(sale.is_none());
    }

    #[tokio::test]
    async fn test_qrcode_lookup_takes_latest_for_dog() {
        let server = MockServer::start().await;
        let code = QrCode::new(DogId::generate(), "https://qr.example.com/bo", Utc::now()).unwrap();
        Mock::given(method("GET"))
            .and(path("/rest/v1/qrcodes"))
            .and(query_param("dog_id", format!("eq.{}", code.dog_id)))
            .and(query_param("order", "updated_at.desc"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([code])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let found = QrCodeRepository::new(&client)
            .get_for_dog(code.dog_id)
            .await
            .unwrap();
        assert_eq!(found, Some(code));
    }

    #[tokio::test]
    async fn test_qrcode_upsert_merges_on_dog() {
        let server = MockServer::start().await;
        let code = QrCode::new(DogId::generate(), "https://qr.example.com/rex", Utc::now()).unwrap();
        Mock::given(method("POST"))
            .and(path("/rest/v1/qrcodes"))
            .and(query_param("on_conflict", "dog_id"))
            .and(|request: &Request| {
                request
                    .headers
                    .get("prefer")
                    .and_then(|v| v.to_str().ok())
                    == Some("resolution=merge-duplicates,return=representation")
            })
            .respond_with(ResponseTemplate::new(201).set_body_json(json!([code])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let stored = QrCodeRepository::new(&client).upsert(&code).await.unwrap();
        assert_eq!(stored, code);
    }
}
