use super::catalog::{MenuEntry, Product, ProductCategory, ProductId, Restaurant, RestaurantId};
use super::geo::{Coordinates, GeoPoint, GeocodeError};
use super::order::{NewOrder, Order, OrderId, StatusTransition};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn store_restaurant(&self, restaurant: Restaurant) -> Result<()>;
    async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>>;
    async fn restaurants(&self) -> Result<Vec<Restaurant>>;
    /// Removes the restaurant together with its menu entries.
    async fn remove_restaurant(&self, id: RestaurantId) -> Result<bool>;

    async fn store_category(&self, category: ProductCategory) -> Result<()>;
    async fn categories(&self) -> Result<Vec<ProductCategory>>;

    async fn store_product(&self, product: Product) -> Result<()>;
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;
    async fn products(&self) -> Result<Vec<Product>>;
    /// Removes the product together with every menu entry referencing it.
    async fn remove_product(&self, id: ProductId) -> Result<bool>;

    /// Inserts or replaces the entry for `(entry.restaurant, entry.product)`.
    async fn store_menu_entry(&self, entry: MenuEntry) -> Result<()>;
    async fn menu_entries(&self) -> Result<Vec<MenuEntry>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order under a freshly allocated id.
    async fn create(&self, order: NewOrder) -> Result<Order>;
    async fn store(&self, order: Order) -> Result<()>;
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;
    /// Every order that is not closed, ordered by id.
    async fn open_orders(&self) -> Result<Vec<Order>>;
    async fn assign_restaurant(&self, id: OrderId, restaurant: RestaurantId) -> Result<Order>;
    /// Atomically applies `transition` to a single order.
    ///
    /// Returns `None` when the order is no longer in `transition.from`.
    async fn apply_transition(&self, transition: StatusTransition) -> Result<Option<Order>>;
}

/// Persistent side of the geocoding cache.
#[async_trait]
pub trait PlaceStore: Send + Sync {
    async fn get(&self, address: &str) -> Result<Option<GeoPoint>>;
    async fn store(&self, point: GeoPoint) -> Result<()>;
    /// Drops entries fetched before `cutoff`. Returns how many were removed.
    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(
        &self,
        address: &str,
    ) -> std::result::Result<Option<Coordinates>, GeocodeError>;
}

pub type CatalogStoreRef = Arc<dyn CatalogStore>;
pub type OrderStoreRef = Arc<dyn OrderStore>;
pub type PlaceStoreRef = Arc<dyn PlaceStore>;
pub type GeocoderRef = Arc<dyn Geocoder>;
