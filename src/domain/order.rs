use super::catalog::{Price, ProductId, RestaurantId};
use crate::error::FoodCartError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

pub type OrderId = u64;

pub const MIN_QUANTITY: u8 = 1;
pub const MAX_QUANTITY: u8 = 10;

/// Lifecycle of an order, declared in progression order.
///
/// The derived `Ord` follows declaration order, which is what "never regresses"
/// is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Created,
    Accepted,
    InKitchen,
    Cooking,
    HandedToCourier,
    InTransit,
    Delivered,
    Closed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Created,
        OrderStatus::Accepted,
        OrderStatus::InKitchen,
        OrderStatus::Cooking,
        OrderStatus::HandedToCourier,
        OrderStatus::InTransit,
        OrderStatus::Delivered,
        OrderStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Accepted => "accepted",
            OrderStatus::InKitchen => "in_kitchen",
            OrderStatus::Cooking => "cooking",
            OrderStatus::HandedToCourier => "handed_to_courier",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Closed => "closed",
        }
    }

    pub fn is_open(&self) -> bool {
        *self != OrderStatus::Closed
    }

    /// The step the manager review takes on its own, if any.
    ///
    /// Only the kitchen edges advance automatically, and only once a restaurant
    /// has been assigned.
    pub fn auto_advance(&self, restaurant_assigned: bool) -> Option<OrderStatus> {
        if !restaurant_assigned {
            return None;
        }
        match self {
            OrderStatus::Accepted => Some(OrderStatus::InKitchen),
            OrderStatus::InKitchen => Some(OrderStatus::Cooking),
            OrderStatus::Cooking => Some(OrderStatus::HandedToCourier),
            _ => None,
        }
    }

    pub fn can_advance_to(&self, next: OrderStatus) -> bool {
        next > *self
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Electronic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product: ProductId,
    pub quantity: u8,
    /// Unit price at the moment the order was placed.
    pub price: Price,
}

impl LineItem {
    pub fn new(product: ProductId, quantity: u8, price: Price) -> Result<Self, FoodCartError> {
        if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
            return Err(FoodCartError::Validation(vec![
                crate::error::FieldViolation::new(
                    "quantity",
                    format!("quantity must be between {MIN_QUANTITY} and {MAX_QUANTITY}"),
                ),
            ]));
        }
        Ok(Self {
            product,
            quantity,
            price,
        })
    }

    pub fn cost(&self) -> Decimal {
        self.price.value() * Decimal::from(self.quantity)
    }
}

/// Customer contact and delivery details captured at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub firstname: String,
    pub lastname: String,
    pub phonenumber: String,
    pub address: String,
}

/// An order that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub contact: Contact,
    pub comment: String,
    pub payment_method: PaymentMethod,
    pub items: Vec<LineItem>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(flatten)]
    pub contact: Contact,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub called_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub restaurant: Option<RestaurantId>,
    pub items: Vec<LineItem>,
}

impl Order {
    pub fn from_new(id: OrderId, new: NewOrder) -> Self {
        Self {
            id,
            contact: new.contact,
            comment: new.comment,
            payment_method: new.payment_method,
            status: OrderStatus::Created,
            created_at: new.created_at,
            called_at: None,
            delivered_at: None,
            restaurant: None,
            items: new.items,
        }
    }

    /// Distinct products the order needs; quantities are irrelevant.
    pub fn required_products(&self) -> BTreeSet<ProductId> {
        self.items.iter().map(|item| item.product).collect()
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::cost).sum()
    }

    pub fn customer_name(&self) -> String {
        format!("{} {}", self.contact.firstname, self.contact.lastname)
    }

    /// Applies a transition if the order is still in the status it was computed from.
    ///
    /// Returns `Ok(false)` when the order already moved on, which makes
    /// re-applying the same transition a no-op.
    pub fn apply(&mut self, transition: &StatusTransition) -> Result<bool, FoodCartError> {
        if self.status != transition.from {
            return Ok(false);
        }
        if !transition.from.can_advance_to(transition.to) {
            return Err(FoodCartError::InvalidTransition {
                from: transition.from.to_string(),
                to: transition.to.to_string(),
            });
        }
        self.status = transition.to;
        if transition.to >= OrderStatus::Accepted && self.called_at.is_none() {
            self.called_at = Some(transition.at);
        }
        if transition.to == OrderStatus::Delivered {
            self.delivered_at = Some(transition.at);
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTransition {
    pub order: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub at: DateTime<Utc>,
}

impl StatusTransition {
    pub fn new(order: OrderId, from: OrderStatus, to: OrderStatus) -> Self {
        Self {
            order,
            from,
            to,
            at: Utc::now(),
        }
    }
}
