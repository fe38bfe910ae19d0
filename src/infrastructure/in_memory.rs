use crate::domain::catalog::{
    CategoryId, MenuEntry, Product, ProductCategory, ProductId, Restaurant, RestaurantId,
};
use crate::domain::geo::GeoPoint;
use crate::domain::order::{NewOrder, Order, OrderId, StatusTransition};
use crate::domain::ports::{CatalogStore, OrderStore, PlaceStore};
use crate::error::{FoodCartError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct CatalogTables {
    restaurants: BTreeMap<RestaurantId, Restaurant>,
    categories: BTreeMap<CategoryId, ProductCategory>,
    products: BTreeMap<ProductId, Product>,
    menu: BTreeMap<(RestaurantId, ProductId), MenuEntry>,
}

/// A thread-safe in-memory catalog.
///
/// All tables sit behind one `RwLock` so cascading removals are atomic.
#[derive(Default, Clone)]
pub struct InMemoryCatalogStore {
    tables: Arc<RwLock<CatalogTables>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn store_restaurant(&self, restaurant: Restaurant) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.restaurants.insert(restaurant.id, restaurant);
        Ok(())
    }

    async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>> {
        let tables = self.tables.read().await;
        Ok(tables.restaurants.get(&id).cloned())
    }

    async fn restaurants(&self) -> Result<Vec<Restaurant>> {
        let tables = self.tables.read().await;
        Ok(tables.restaurants.values().cloned().collect())
    }

    async fn remove_restaurant(&self, id: RestaurantId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.restaurants.remove(&id).is_some();
        tables.menu.retain(|(restaurant, _), _| *restaurant != id);
        Ok(removed)
    }

    async fn store_category(&self, category: ProductCategory) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.categories.insert(category.id, category);
        Ok(())
    }

    async fn categories(&self) -> Result<Vec<ProductCategory>> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().cloned().collect())
    }

    async fn store_product(&self, product: Product) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.products.insert(product.id, product);
        Ok(())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.get(&id).cloned())
    }

    async fn products(&self) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(tables.products.values().cloned().collect())
    }

    async fn remove_product(&self, id: ProductId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.products.remove(&id).is_some();
        tables.menu.retain(|(_, product), _| *product != id);
        Ok(removed)
    }

    async fn store_menu_entry(&self, entry: MenuEntry) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.menu.insert(entry.key(), entry);
        Ok(())
    }

    async fn menu_entries(&self) -> Result<Vec<MenuEntry>> {
        let tables = self.tables.read().await;
        Ok(tables.menu.values().copied().collect())
    }
}

/// A thread-safe in-memory order book.
///
/// Each write takes the lock once, so a status change is applied to exactly
/// one order or not at all.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<BTreeMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: NewOrder) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let id = orders.keys().next_back().map_or(1, |last| last + 1);
        let order = Order::from_new(id, order);
        orders.insert(id, order.clone());
        Ok(order)
    }

    async fn store(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).cloned())
    }

    async fn open_orders(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|order| order.status.is_open())
            .cloned()
            .collect())
    }

    async fn assign_restaurant(&self, id: OrderId, restaurant: RestaurantId) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| FoodCartError::not_found("order", id))?;
        order.restaurant = Some(restaurant);
        Ok(order.clone())
    }

    async fn apply_transition(&self, transition: StatusTransition) -> Result<Option<Order>> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&transition.order)
            .ok_or_else(|| FoodCartError::not_found("order", transition.order))?;
        if order.apply(&transition)? {
            Ok(Some(order.clone()))
        } else {
            Ok(None)
        }
    }
}

/// In-memory geocoding cache with an upper bound on the number of addresses.
///
/// When full, the entry fetched longest ago is evicted.
#[derive(Clone)]
pub struct InMemoryPlaceStore {
    places: Arc<RwLock<HashMap<String, GeoPoint>>>,
    capacity: usize,
}

impl Default for InMemoryPlaceStore {
    fn default() -> Self {
        Self::with_capacity(10_000)
    }
}

impl InMemoryPlaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            places: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.places.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.places.read().await.is_empty()
    }
}

#[async_trait]
impl PlaceStore for InMemoryPlaceStore {
    async fn get(&self, address: &str) -> Result<Option<GeoPoint>> {
        let places = self.places.read().await;
        Ok(places.get(address).cloned())
    }

    async fn store(&self, point: GeoPoint) -> Result<()> {
        let mut places = self.places.write().await;
        if !places.contains_key(&point.address) && places.len() >= self.capacity {
            let oldest = places
                .values()
                .min_by_key(|p| p.fetched_at)
                .map(|p| p.address.clone());
            if let Some(oldest) = oldest {
                places.remove(&oldest);
            }
        }
        places.insert(point.address.clone(), point);
        Ok(())
    }

    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let mut places = self.places.write().await;
        let before = places.len();
        places.retain(|_, point| point.fetched_at >= cutoff);
        Ok(before - places.len())
    }
}
