//! Merchant search over an in-memory store, with a health endpoint beside it.
//!
//! Run with:
//!   RUST_LOG=sluice=debug cargo run --example merchants
//!
//! Try:
//!   curl -X POST http://localhost:3000 -d '{"merchantName":"rossi"}'
//!   curl -X POST http://localhost:3000 -d '{"productCategories":["books"]}'
//!   curl -X POST http://localhost:3000 -d '{"page":"first"}'       # 400
//!   curl http://localhost:3001                                       # 500 until SLUICE_DATABASE_URL is set

use std::sync::Arc;

use sluice::health::{self, probe};
use sluice::merchants::{
    MerchantQuery, OfflineMerchantRecord, OfflineMerchantSearchRequest, OnlineMerchantRecord,
    OnlineMerchantSearchRequest, QueryError, get_online_merchants,
};
use sluice::middleware::BoxFuture;
use sluice::{ProductCategory, Server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), sluice::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let db: Arc<dyn MerchantQuery> = Arc::new(Catalog::sample());

    tokio::try_join!(
        Server::bind("0.0.0.0:3000")?.serve(get_online_merchants(db)),
        Server::bind("0.0.0.0:3001")?.serve(health::handler(probe::service_health())),
    )?;
    Ok(())
}

struct Catalog {
    online: Vec<OnlineMerchantRecord>,
}

impl Catalog {
    fn sample() -> Self {
        let merchant = |id: &str, name: &str, categories: &[&str], url: &str| OnlineMerchantRecord {
            id: id.to_owned(),
            name: name.to_owned(),
            product_categories: categories.iter().map(|c| c.to_string()).collect(),
            website_url: url.to_owned(),
        };
        Self {
            online: vec![
                merchant("1", "Libreria Rossi", &["BOOKS", "LEARNING"], "https://rossi.example"),
                merchant("2", "Cinema Odeon", &["ENTERTAINMENT"], "https://odeon.example"),
                merchant("3", "Treni Veloci", &["TRAVELLING", "TRANSPORTATION"], "https://treni.example"),
            ],
        }
    }
}

impl MerchantQuery for Catalog {
    fn online_merchants<'a>(
        &'a self,
        search: &'a OnlineMerchantSearchRequest,
    ) -> BoxFuture<'a, Result<Vec<OnlineMerchantRecord>, QueryError>> {
        let name = search.merchant_name.as_deref().unwrap_or_default().to_lowercase();
        let wanted = search.product_categories.clone().unwrap_or_default();

        let matches = self.online.iter()
            .filter(|m| m.name.to_lowercase().contains(&name))
            .filter(|m| {
                wanted.is_empty()
                    || m.product_categories.iter()
                        .filter_map(|label| ProductCategory::from_model(label))
                        .any(|c| wanted.contains(&c))
            })
            .cloned()
            .collect();

        Box::pin(async move { Ok(matches) })
    }

    fn offline_merchants<'a>(
        &'a self,
        _search: &'a OfflineMerchantSearchRequest,
    ) -> BoxFuture<'a, Result<Vec<OfflineMerchantRecord>, QueryError>> {
        Box::pin(async { Err(QueryError::new("no offline merchants in this catalog")) })
    }
}
