use crate::domain::catalog::ProductId;
use crate::domain::order::{Contact, LineItem, MAX_QUANTITY, NewOrder, Order, PaymentMethod};
use crate::domain::ports::{CatalogStoreRef, OrderStoreRef};
use crate::error::{FieldViolation, FoodCartError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// Checkout payload of the public order endpoint.
///
/// Missing text fields deserialize to empty strings so they surface as
/// violations instead of a parse failure.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterOrderRequest {
    #[serde(default)]
    #[validate(
        length(max = 50, message = "must be at most 50 characters"),
        custom(function = "not_blank")
    )]
    pub firstname: String,
    #[serde(default)]
    #[validate(
        length(max = 50, message = "must be at most 50 characters"),
        custom(function = "not_blank")
    )]
    pub lastname: String,
    #[serde(default)]
    #[validate(custom(function = "phone_number"))]
    pub phonenumber: String,
    #[serde(default)]
    #[validate(
        length(max = 250, message = "must be at most 250 characters"),
        custom(function = "not_blank")
    )]
    pub address: String,
    #[serde(default)]
    #[validate(length(max = 250, message = "must be at most 250 characters"))]
    pub comment: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    #[validate(length(min = 1, message = "must contain at least one product"), nested)]
    pub products: Vec<OrderedProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderedProduct {
    pub product: ProductId,
    #[validate(range(min = 1, max = 10, message = "must be between 1 and 10"))]
    pub quantity: u32,
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

/// Accepts 10 to 15 digits with an optional leading `+`; spaces, dashes and
/// parentheses are ignored.
fn phone_number(value: &str) -> std::result::Result<(), ValidationError> {
    let trimmed = value.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let mut digits = 0;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' | '(' | ')' => {}
            _ => {
                return Err(ValidationError::new("phone")
                    .with_message("must contain only digits and separators".into()));
            }
        }
    }
    if !(10..=15).contains(&digits) {
        return Err(ValidationError::new("phone").with_message("must have 10 to 15 digits".into()));
    }
    Ok(())
}

/// Flattens nested validator output into `field[index].field` paths, sorted.
pub fn violations(errors: &ValidationErrors) -> Vec<FieldViolation> {
    let mut out = Vec::new();
    collect(String::new(), errors, &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field).then_with(|| a.message.cmp(&b.message)));
    out
}

fn collect(prefix: String, errors: &ValidationErrors, out: &mut Vec<FieldViolation>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("is invalid ({})", error.code));
                    out.push(FieldViolation::new(path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

/// Turns validated checkout payloads into persisted orders.
pub struct OrderIntake {
    catalog: CatalogStoreRef,
    orders: OrderStoreRef,
}

impl OrderIntake {
    pub fn new(catalog: CatalogStoreRef, orders: OrderStoreRef) -> Self {
        Self { catalog, orders }
    }

    /// Validates the payload once, captures current unit prices and stores the order.
    pub async fn register(&self, request: RegisterOrderRequest) -> Result<Order> {
        let mut problems = match request.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => violations(&errors),
        };

        let mut items = Vec::with_capacity(request.products.len());
        for (index, ordered) in request.products.iter().enumerate() {
            match self.catalog.get_product(ordered.product).await? {
                Some(product) => {
                    if let Ok(quantity) = u8::try_from(ordered.quantity)
                        && quantity <= MAX_QUANTITY
                        && let Ok(item) = LineItem::new(product.id, quantity, product.price)
                    {
                        items.push(item);
                    }
                }
                None => problems.push(FieldViolation::new(
                    format!("products[{index}].product"),
                    format!("unknown product {}", ordered.product),
                )),
            }
        }

        if !problems.is_empty() {
            return Err(FoodCartError::Validation(problems));
        }

        let order = self
            .orders
            .create(NewOrder {
                contact: Contact {
                    firstname: request.firstname.trim().to_string(),
                    lastname: request.lastname.trim().to_string(),
                    phonenumber: request.phonenumber.trim().to_string(),
                    address: request.address.trim().to_string(),
                },
                comment: request.comment,
                payment_method: request.payment_method,
                items,
                created_at: Utc::now(),
            })
            .await?;
        info!(
            order_id = order.id,
            items = order.items.len(),
            total = %order.total(),
            "Order registered"
        );
        Ok(order)
    }
}
