use super::AppState;
use super::error::ApiError;
use crate::application::catalog::{AvailabilityMatrix, CatalogProduct};
use crate::application::dashboard::OrderReview;
use crate::application::ordering::RegisterOrderRequest;
use crate::domain::catalog::{MenuEntry, ProductId, Restaurant, RestaurantId};
use crate::domain::order::{Order, OrderId, OrderStatus};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

type JsonBody<T> = Result<Json<T>, JsonRejection>;

/// An order together with its computed total.
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub total: Decimal,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            total: order.total(),
            order,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityChange {
    pub available: bool,
}

#[derive(Debug, Deserialize)]
pub struct RestaurantAssignment {
    pub restaurant_id: RestaurantId,
}

#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: OrderStatus,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn product_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<CatalogProduct>>, ApiError> {
    Ok(Json(state.catalog.available_products().await?))
}

pub async fn register_order(
    State(state): State<AppState>,
    payload: JsonBody<RegisterOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let Json(request) = payload?;
    let order = state.intake.register(request).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

pub async fn restaurants(State(state): State<AppState>) -> Result<Json<Vec<Restaurant>>, ApiError> {
    Ok(Json(state.catalog.restaurants().await?))
}

pub async fn availability_matrix(
    State(state): State<AppState>,
) -> Result<Json<AvailabilityMatrix>, ApiError> {
    Ok(Json(state.catalog.availability_matrix().await?))
}

pub async fn set_availability(
    State(state): State<AppState>,
    Path((restaurant, product)): Path<(RestaurantId, ProductId)>,
    payload: JsonBody<AvailabilityChange>,
) -> Result<Json<MenuEntry>, ApiError> {
    let Json(change) = payload?;
    let entry = state
        .catalog
        .set_availability(restaurant, product, change.available)
        .await?;
    Ok(Json(entry))
}

pub async fn open_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderReview>>, ApiError> {
    Ok(Json(state.dashboard.review_open_orders().await?))
}

pub async fn assign_restaurant(
    State(state): State<AppState>,
    Path(order): Path<OrderId>,
    payload: JsonBody<RestaurantAssignment>,
) -> Result<Json<OrderView>, ApiError> {
    let Json(assignment) = payload?;
    let order = state
        .dashboard
        .assign_restaurant(order, assignment.restaurant_id)
        .await?;
    Ok(Json(order.into()))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path(order): Path<OrderId>,
    payload: JsonBody<StatusChange>,
) -> Result<Json<OrderView>, ApiError> {
    let Json(change) = payload?;
    let order = state.dashboard.set_status(order, change.status).await?;
    Ok(Json(order.into()))
}
