//! Merchant search handlers.
//!
//! Both handlers take their search parameters from a required JSON body,
//! ask a [`MerchantQuery`] for matching rows, and answer with
//! `{"items": [...]}`. Rows are converted on the way out: database category
//! labels become [`ProductCategory`] values, offline addresses are nested and
//! distances rounded. A row that cannot be converted is an internal error,
//! never a partial answer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::category::ProductCategory;
use crate::codec::JsonCodec;
use crate::handler::{Handler, adapt};
use crate::middleware::{BoxFuture, RequiredBody};
use crate::rejection::Rejection;
use crate::response::Json;

// ── Search requests ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineMerchantSearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_categories: Option<Vec<ProductCategory>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
}

impl OnlineMerchantSearchRequest {
    pub fn name_filter(&self) -> String {
        name_filter(self.merchant_name.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineMerchantSearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_coordinates: Option<Coordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u64>,
}

impl OfflineMerchantSearchRequest {
    pub fn name_filter(&self) -> String {
        name_filter(self.merchant_name.as_deref())
    }
}

/// Case-insensitive substring pattern for a `LIKE` match on merchant names.
/// No name matches everything.
fn name_filter(name: Option<&str>) -> String {
    format!("%{}%", name.unwrap_or_default().to_lowercase())
}

// ── Query collaborator ────────────────────────────────────────────────────────

/// An online merchant row as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlineMerchantRecord {
    pub id: String,
    pub name: String,
    /// Upper-case database labels, e.g. `"SHOPPING"`.
    pub product_categories: Vec<String>,
    pub website_url: String,
}

/// An offline merchant row as stored. `distance` is in meters from the
/// searcher and only present when the search carried coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct OfflineMerchantRecord {
    pub id: String,
    pub name: String,
    pub product_categories: Vec<String>,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct QueryError {
    message: String,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Data source for merchant searches.
///
/// Handlers receive it as an explicit handle; the implementation owns
/// connection management and query construction.
pub trait MerchantQuery: Send + Sync + 'static {
    fn online_merchants<'a>(
        &'a self,
        search: &'a OnlineMerchantSearchRequest,
    ) -> BoxFuture<'a, Result<Vec<OnlineMerchantRecord>, QueryError>>;

    fn offline_merchants<'a>(
        &'a self,
        search: &'a OfflineMerchantSearchRequest,
    ) -> BoxFuture<'a, Result<Vec<OfflineMerchantRecord>, QueryError>>;
}

// ── Response payloads ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineMerchant {
    pub id: String,
    pub name: String,
    pub product_categories: Vec<ProductCategory>,
    pub website_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnlineMerchants {
    pub items: Vec<OnlineMerchant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub full_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfflineMerchant {
    pub id: String,
    pub name: String,
    pub product_categories: Vec<ProductCategory>,
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineMerchants {
    pub items: Vec<OfflineMerchant>,
}

fn categories_from_model(labels: &[String]) -> Result<Vec<ProductCategory>, Rejection> {
    labels.iter()
        .map(|label| {
            ProductCategory::from_model(label)
                .ok_or_else(|| Rejection::internal(format!("unknown product category `{label}`")))
        })
        .collect()
}

impl TryFrom<OnlineMerchantRecord> for OnlineMerchant {
    type Error = Rejection;

    fn try_from(record: OnlineMerchantRecord) -> Result<Self, Rejection> {
        Ok(Self {
            product_categories: categories_from_model(&record.product_categories)?,
            id: record.id,
            name: record.name,
            website_url: record.website_url,
        })
    }
}

impl TryFrom<OfflineMerchantRecord> for OfflineMerchant {
    type Error = Rejection;

    fn try_from(record: OfflineMerchantRecord) -> Result<Self, Rejection> {
        Ok(Self {
            product_categories: categories_from_model(&record.product_categories)?,
            id: record.id,
            name: record.name,
            address: Address {
                full_address: record.address,
                latitude: record.latitude,
                longitude: record.longitude,
            },
            distance: record.distance.map(|d| d.round() as u64),
        })
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `OnlineMerchantSearchRequest` body in, [`OnlineMerchants`] out.
pub fn get_online_merchants(db: Arc<dyn MerchantQuery>) -> impl Handler {
    adapt(
        (RequiredBody::new(JsonCodec::<OnlineMerchantSearchRequest>::new("OnlineMerchantSearchRequest")),),
        move |search: OnlineMerchantSearchRequest| {
            let db = Arc::clone(&db);
            async move {
                let records = db.online_merchants(&search)
                    .await
                    .map_err(|e| Rejection::internal(e.to_string()))?;
                let items = records.into_iter()
                    .map(OnlineMerchant::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, Rejection>(Json(OnlineMerchants { items }))
            }
        },
    )
}

/// `OfflineMerchantSearchRequest` body in, [`OfflineMerchants`] out.
pub fn get_offline_merchants(db: Arc<dyn MerchantQuery>) -> impl Handler {
    adapt(
        (RequiredBody::new(JsonCodec::<OfflineMerchantSearchRequest>::new("OfflineMerchantSearchRequest")),),
        move |search: OfflineMerchantSearchRequest| {
            let db = Arc::clone(&db);
            async move {
                let records = db.offline_merchants(&search)
                    .await
                    .map_err(|e| Rejection::internal(e.to_string()))?;
                let items = records.into_iter()
                    .map(OfflineMerchant::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, Rejection>(Json(OfflineMerchants { items }))
            }
        },
    )
}
