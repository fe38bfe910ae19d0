use super::ranking::{MenuIndex, RankedRestaurant, RankingEngine, RankingFailure};
use crate::domain::catalog::RestaurantId;
use crate::domain::order::{Order, OrderId, OrderStatus, StatusTransition};
use crate::domain::ports::{CatalogStoreRef, OrderStoreRef};
use crate::error::{FoodCartError, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Ranking outcome as shown to the manager.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Candidates {
    Ranked { restaurants: Vec<RankedRestaurant> },
    NoEligibleRestaurant,
    DistanceUnresolvable { failure: RankingFailure },
}

impl Candidates {
    pub fn label(&self) -> &'static str {
        match self {
            Candidates::Ranked { .. } => "ranked",
            Candidates::NoEligibleRestaurant => "no_eligible_restaurant",
            Candidates::DistanceUnresolvable { .. } => "distance_unresolvable",
        }
    }
}

impl From<std::result::Result<Vec<RankedRestaurant>, RankingFailure>> for Candidates {
    fn from(ranking: std::result::Result<Vec<RankedRestaurant>, RankingFailure>) -> Self {
        match ranking {
            Ok(restaurants) => Candidates::Ranked { restaurants },
            Err(failure) if failure.is_indeterminate() => {
                Candidates::DistanceUnresolvable { failure }
            }
            Err(_) => Candidates::NoEligibleRestaurant,
        }
    }
}

/// One row of the manager's order list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderReview {
    pub order: Order,
    pub total: Decimal,
    pub restaurant_name: Option<String>,
    pub candidates: Candidates,
}

/// The restaurateur's view over open orders.
pub struct OrderDashboard {
    catalog: CatalogStoreRef,
    orders: OrderStoreRef,
    ranking: RankingEngine,
}

impl OrderDashboard {
    pub fn new(catalog: CatalogStoreRef, orders: OrderStoreRef, ranking: RankingEngine) -> Self {
        Self {
            catalog,
            orders,
            ranking,
        }
    }

    /// Ranks candidate restaurants for every open order and takes each order's
    /// automatic status step.
    ///
    /// Orders are handled one at a time; a failure on one order is logged and
    /// leaves the others untouched.
    #[instrument(skip(self))]
    pub async fn review_open_orders(&self) -> Result<Vec<OrderReview>> {
        let orders = self.orders.open_orders().await?;
        let restaurants = self.catalog.restaurants().await?;
        let entries = self.catalog.menu_entries().await?;
        let menus = MenuIndex::build(restaurants.clone(), &entries);

        let mut reviews = Vec::with_capacity(orders.len());
        for order in orders {
            let candidates = Candidates::from(self.ranking.rank(&order, &menus).await);
            let order = self.advance(order).await;
            let restaurant_name = order.restaurant.and_then(|id| {
                restaurants
                    .iter()
                    .find(|restaurant| restaurant.id == id)
                    .map(|restaurant| restaurant.name.clone())
            });
            reviews.push(OrderReview {
                total: order.total(),
                order,
                restaurant_name,
                candidates,
            });
        }
        info!(count = reviews.len(), "Reviewed open orders");
        Ok(reviews)
    }

    async fn advance(&self, order: Order) -> Order {
        let Some(next) = order.status.auto_advance(order.restaurant.is_some()) else {
            return order;
        };
        let transition = StatusTransition::new(order.id, order.status, next);
        match self.orders.apply_transition(transition).await {
            Ok(Some(updated)) => {
                info!(
                    order_id = order.id,
                    from = %transition.from,
                    to = %transition.to,
                    "Order advanced"
                );
                updated
            }
            Ok(None) => match self.orders.get(order.id).await {
                Ok(Some(current)) => current,
                Ok(None) => order,
                Err(e) => {
                    warn!(order_id = order.id, error = %e, "Failed to reload order");
                    order
                }
            },
            Err(e) => {
                warn!(order_id = order.id, error = %e, "Failed to advance order");
                order
            }
        }
    }

    pub async fn assign_restaurant(
        &self,
        order: OrderId,
        restaurant: RestaurantId,
    ) -> Result<Order> {
        if self.catalog.get_restaurant(restaurant).await?.is_none() {
            return Err(FoodCartError::not_found("restaurant", restaurant));
        }
        let order = self.orders.assign_restaurant(order, restaurant).await?;
        info!(order_id = order.id, restaurant_id = restaurant, "Restaurant assigned");
        Ok(order)
    }

    /// Moves an order forward by hand. Backward moves are rejected.
    pub async fn set_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let order = self
            .orders
            .get(id)
            .await?
            .ok_or_else(|| FoodCartError::not_found("order", id))?;
        if order.status == status {
            return Ok(order);
        }
        if !order.status.can_advance_to(status) {
            return Err(FoodCartError::InvalidTransition {
                from: order.status.to_string(),
                to: status.to_string(),
            });
        }
        let transition = StatusTransition::new(id, order.status, status);
        match self.orders.apply_transition(transition).await? {
            Some(updated) => Ok(updated),
            None => Err(FoodCartError::InvalidTransition {
                from: order.status.to_string(),
                to: status.to_string(),
            }),
        }
    }
}
