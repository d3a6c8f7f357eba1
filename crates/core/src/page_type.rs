//! Page types a slot configuration can apply to.
//!
//! Stored as lowercase text in `slot_configurations.page_type` and used as a
//! path segment by the HTTP layer.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const PAGE_CART: &str = "cart";
pub const PAGE_PRODUCT: &str = "product";
pub const PAGE_CATEGORY: &str = "category";
pub const PAGE_CHECKOUT: &str = "checkout";
pub const PAGE_HEADER: &str = "header";
pub const PAGE_FOOTER: &str = "footer";
pub const PAGE_HOMEPAGE: &str = "homepage";
pub const PAGE_SUCCESS: &str = "success";

/// All valid page type values.
pub const VALID_PAGE_TYPES: &[&str] = &[
    PAGE_CART,
    PAGE_PRODUCT,
    PAGE_CATEGORY,
    PAGE_CHECKOUT,
    PAGE_HEADER,
    PAGE_FOOTER,
    PAGE_HOMEPAGE,
    PAGE_SUCCESS,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Cart,
    Product,
    Category,
    Checkout,
    Header,
    Footer,
    Homepage,
    Success,
}

impl PageType {
    pub const ALL: [PageType; 8] = [
        PageType::Cart,
        PageType::Product,
        PageType::Category,
        PageType::Checkout,
        PageType::Header,
        PageType::Footer,
        PageType::Homepage,
        PageType::Success,
    ];

    /// Convert from a database or path string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            PAGE_CART => Ok(Self::Cart),
            PAGE_PRODUCT => Ok(Self::Product),
            PAGE_CATEGORY => Ok(Self::Category),
            PAGE_CHECKOUT => Ok(Self::Checkout),
            PAGE_HEADER => Ok(Self::Header),
            PAGE_FOOTER => Ok(Self::Footer),
            PAGE_HOMEPAGE => Ok(Self::Homepage),
            PAGE_SUCCESS => Ok(Self::Success),
            _ => Err(CoreError::Validation(format!(
                "Invalid page type '{s}'. Must be one of: {}",
                VALID_PAGE_TYPES.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cart => PAGE_CART,
            Self::Product => PAGE_PRODUCT,
            Self::Category => PAGE_CATEGORY,
            Self::Checkout => PAGE_CHECKOUT,
            Self::Header => PAGE_HEADER,
            Self::Footer => PAGE_FOOTER,
            Self::Homepage => PAGE_HOMEPAGE,
            Self::Success => PAGE_SUCCESS,
        }
    }
}

impl std::fmt::Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for PageType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_value(&value)
    }
}
