use crate::error::{FieldViolation, FoodCartError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type RestaurantId = u32;
pub type ProductId = u32;
pub type CategoryId = u32;

/// A non-negative menu price with two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    pub fn new(value: Decimal) -> Result<Self, FoodCartError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(FoodCartError::Validation(vec![FieldViolation::new(
                "price",
                "price must not be negative",
            )]));
        }
        Ok(Self(value.round_dp(2)))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Price {
    type Error = FoodCartError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    /// Free-text postal address. May be blank, in which case it never geocodes.
    #[serde(default)]
    pub address: String,
    pub contact_phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: Option<CategoryId>,
    pub price: Price,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub special_status: bool,
    #[serde(default)]
    pub description: String,
}

/// The fact that a restaurant offers (or currently does not offer) a product.
///
/// Stores keep at most one entry per `(restaurant, product)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MenuEntry {
    pub restaurant: RestaurantId,
    pub product: ProductId,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

impl MenuEntry {
    pub fn new(restaurant: RestaurantId, product: ProductId, available: bool) -> Self {
        Self {
            restaurant,
            product,
            available,
        }
    }

    pub fn key(&self) -> (RestaurantId, ProductId) {
        (self.restaurant, self.product)
    }
}
