//! Merchant product categories.

use serde::{Deserialize, Serialize};

use crate::codec::{CommaSeparated, EnumCodec, Enumeration, comma_separated};
use crate::middleware::OptionalQueryParam;

/// The closed set of categories a merchant can be listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProductCategory {
    Entertainment,
    Travelling,
    Transportation,
    Connectivity,
    Books,
    Arts,
    Sports,
    Health,
    Learning,
    Shopping,
    Home,
}

impl ProductCategory {
    pub const ALL: [Self; 11] = [
        Self::Entertainment,
        Self::Travelling,
        Self::Transportation,
        Self::Connectivity,
        Self::Books,
        Self::Arts,
        Self::Sports,
        Self::Health,
        Self::Learning,
        Self::Shopping,
        Self::Home,
    ];

    /// Maps the database's upper-case category label.
    pub fn from_model(label: &str) -> Option<Self> {
        match label {
            "ENTERTAINMENT" => Some(Self::Entertainment),
            "TRAVELLING" => Some(Self::Travelling),
            "TRANSPORTATION" => Some(Self::Transportation),
            "CONNECTIVITY" => Some(Self::Connectivity),
            "BOOKS" => Some(Self::Books),
            "ARTS" => Some(Self::Arts),
            "SPORTS" => Some(Self::Sports),
            "HEALTH" => Some(Self::Health),
            "LEARNING" => Some(Self::Learning),
            "SHOPPING" => Some(Self::Shopping),
            "HOME" => Some(Self::Home),
            _ => None,
        }
    }
}

impl Enumeration for ProductCategory {
    const NAME: &'static str = "ProductCategory";

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "entertainment" => Some(Self::Entertainment),
            "travelling" => Some(Self::Travelling),
            "transportation" => Some(Self::Transportation),
            "connectivity" => Some(Self::Connectivity),
            "books" => Some(Self::Books),
            "arts" => Some(Self::Arts),
            "sports" => Some(Self::Sports),
            "health" => Some(Self::Health),
            "learning" => Some(Self::Learning),
            "shopping" => Some(Self::Shopping),
            "home" => Some(Self::Home),
            _ => None,
        }
    }

    fn as_wire(self) -> &'static str {
        match self {
            Self::Entertainment => "entertainment",
            Self::Travelling => "travelling",
            Self::Transportation => "transportation",
            Self::Connectivity => "connectivity",
            Self::Books => "books",
            Self::Arts => "arts",
            Self::Sports => "sports",
            Self::Health => "health",
            Self::Learning => "learning",
            Self::Shopping => "shopping",
            Self::Home => "home",
        }
    }
}

pub type ProductCategoryList = CommaSeparated<EnumCodec<ProductCategory>>;

/// Optional `?name=a,b,c` filter on product categories.
pub fn optional_product_category_list(name: &str) -> OptionalQueryParam<ProductCategoryList> {
    OptionalQueryParam::new(name, comma_separated(EnumCodec::new()))
}
