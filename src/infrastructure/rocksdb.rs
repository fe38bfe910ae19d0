use crate::domain::catalog::{
    MenuEntry, Product, ProductCategory, ProductId, Restaurant, RestaurantId,
};
use crate::domain::geo::GeoPoint;
use crate::domain::order::{NewOrder, Order, OrderId, StatusTransition};
use crate::domain::ports::{CatalogStore, OrderStore, PlaceStore};
use crate::error::{FoodCartError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const CF_RESTAURANTS: &str = "restaurants";
pub const CF_CATEGORIES: &str = "categories";
pub const CF_PRODUCTS: &str = "products";
/// Keyed by restaurant id followed by product id, both big-endian.
pub const CF_MENU: &str = "menu";
pub const CF_ORDERS: &str = "orders";
/// Geocoding cache keyed by the raw address bytes.
pub const CF_PLACES: &str = "places";
pub const CF_META: &str = "meta";

const COLUMN_FAMILIES: [&str; 7] = [
    CF_RESTAURANTS,
    CF_CATEGORIES,
    CF_PRODUCTS,
    CF_MENU,
    CF_ORDERS,
    CF_PLACES,
    CF_META,
];

const NEXT_ORDER_ID: &[u8] = b"next_order_id";

/// A persistent store implementing every port on top of one RocksDB instance.
///
/// Values are JSON documents, one column family per entity. Read-modify-write
/// operations are serialized through `write_lock` and committed as a single
/// `WriteBatch`, so each one touches a single order (or cascade) atomically.
///
/// `Clone` shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

fn menu_key(restaurant: RestaurantId, product: ProductId) -> [u8; 8] {
    let mut key = [0u8; 8];
    key[..4].copy_from_slice(&restaurant.to_be_bytes());
    key[4..].copy_from_slice(&product.to_be_bytes());
    key
}

impl RocksDBStore {
    /// Opens or creates a database at `path`, creating missing column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| FoodCartError::Storage(format!("column family {name} not found")))
    }

    fn put_json<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    fn menu_keys_where(&self, matches: impl Fn(&[u8]) -> bool) -> Result<Vec<Box<[u8]>>> {
        let cf = self.cf(CF_MENU)?;
        let mut keys = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _value) = item?;
            if key.len() == 8 && matches(&key[..]) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn next_order_id(&self) -> Result<OrderId> {
        let cf = self.cf(CF_META)?;
        let stored = match self.db.get_cf(cf, NEXT_ORDER_ID)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    FoodCartError::Storage("corrupt order id counter".to_string())
                })?;
                u64::from_be_bytes(raw)
            }
            None => 1,
        };
        // Orders imported with explicit ids may sit above the counter.
        let last = self
            .db
            .iterator_cf(self.cf(CF_ORDERS)?, IteratorMode::End)
            .next()
            .transpose()?
            .and_then(|(key, _)| <[u8; 8]>::try_from(&key[..]).ok())
            .map(u64::from_be_bytes);
        Ok(last.map_or(stored, |last| stored.max(last + 1)))
    }

    fn write_order(&self, batch: &mut WriteBatch, order: &Order) -> Result<()> {
        let cf = self.cf(CF_ORDERS)?;
        batch.put_cf(cf, order.id.to_be_bytes(), serde_json::to_vec(order)?);
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for RocksDBStore {
    async fn store_restaurant(&self, restaurant: Restaurant) -> Result<()> {
        self.put_json(CF_RESTAURANTS, &restaurant.id.to_be_bytes(), &restaurant)
    }

    async fn get_restaurant(&self, id: RestaurantId) -> Result<Option<Restaurant>> {
        self.get_json(CF_RESTAURANTS, &id.to_be_bytes())
    }

    async fn restaurants(&self) -> Result<Vec<Restaurant>> {
        self.scan(CF_RESTAURANTS)
    }

    async fn remove_restaurant(&self, id: RestaurantId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let key = id.to_be_bytes();
        let exists = self.db.get_pinned_cf(self.cf(CF_RESTAURANTS)?, key)?.is_some();

        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_RESTAURANTS)?, key);
        let menu = self.cf(CF_MENU)?;
        for menu_key in self.menu_keys_where(|k| k[..4] == key)? {
            batch.delete_cf(menu, menu_key);
        }
        self.db.write(batch)?;
        Ok(exists)
    }

    async fn store_category(&self, category: ProductCategory) -> Result<()> {
        self.put_json(CF_CATEGORIES, &category.id.to_be_bytes(), &category)
    }

    async fn categories(&self) -> Result<Vec<ProductCategory>> {
        self.scan(CF_CATEGORIES)
    }

    async fn store_product(&self, product: Product) -> Result<()> {
        self.put_json(CF_PRODUCTS, &product.id.to_be_bytes(), &product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        self.get_json(CF_PRODUCTS, &id.to_be_bytes())
    }

    async fn products(&self) -> Result<Vec<Product>> {
        self.scan(CF_PRODUCTS)
    }

    async fn remove_product(&self, id: ProductId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let key = id.to_be_bytes();
        let exists = self.db.get_pinned_cf(self.cf(CF_PRODUCTS)?, key)?.is_some();

        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_PRODUCTS)?, key);
        let menu = self.cf(CF_MENU)?;
        for menu_key in self.menu_keys_where(|k| k[4..] == key)? {
            batch.delete_cf(menu, menu_key);
        }
        self.db.write(batch)?;
        Ok(exists)
    }

    async fn store_menu_entry(&self, entry: MenuEntry) -> Result<()> {
        self.put_json(CF_MENU, &menu_key(entry.restaurant, entry.product), &entry)
    }

    async fn menu_entries(&self) -> Result<Vec<MenuEntry>> {
        self.scan(CF_MENU)
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn create(&self, order: NewOrder) -> Result<Order> {
        let _guard = self.write_lock.lock().await;
        let id = self.next_order_id()?;
        let order = Order::from_new(id, order);

        let mut batch = WriteBatch::default();
        self.write_order(&mut batch, &order)?;
        batch.put_cf(self.cf(CF_META)?, NEXT_ORDER_ID, (id + 1).to_be_bytes());
        self.db.write(batch)?;
        Ok(order)
    }

    async fn store(&self, order: Order) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.put_json(CF_ORDERS, &order.id.to_be_bytes(), &order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        self.get_json(CF_ORDERS, &id.to_be_bytes())
    }

    async fn open_orders(&self) -> Result<Vec<Order>> {
        let orders: Vec<Order> = self.scan(CF_ORDERS)?;
        Ok(orders
            .into_iter()
            .filter(|order| order.status.is_open())
            .collect())
    }

    async fn assign_restaurant(&self, id: OrderId, restaurant: RestaurantId) -> Result<Order> {
        let _guard = self.write_lock.lock().await;
        let mut order: Order = self
            .get_json(CF_ORDERS, &id.to_be_bytes())?
            .ok_or_else(|| FoodCartError::not_found("order", id))?;
        order.restaurant = Some(restaurant);

        let mut batch = WriteBatch::default();
        self.write_order(&mut batch, &order)?;
        self.db.write(batch)?;
        Ok(order)
    }

    async fn apply_transition(&self, transition: StatusTransition) -> Result<Option<Order>> {
        let _guard = self.write_lock.lock().await;
        let mut order: Order = self
            .get_json(CF_ORDERS, &transition.order.to_be_bytes())?
            .ok_or_else(|| FoodCartError::not_found("order", transition.order))?;
        if !order.apply(&transition)? {
            return Ok(None);
        }

        let mut batch = WriteBatch::default();
        self.write_order(&mut batch, &order)?;
        self.db.write(batch)?;
        Ok(Some(order))
    }
}

#[async_trait]
impl PlaceStore for RocksDBStore {
    async fn get(&self, address: &str) -> Result<Option<GeoPoint>> {
        self.get_json(CF_PLACES, address.as_bytes())
    }

    async fn store(&self, point: GeoPoint) -> Result<()> {
        self.put_json(CF_PLACES, point.address.as_bytes(), &point)
    }

    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let cf = self.cf(CF_PLACES)?;
        let mut batch = WriteBatch::default();
        let mut removed = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item?;
            let point: GeoPoint = serde_json::from_slice(&value)?;
            if point.fetched_at < cutoff {
                batch.delete_cf(cf, key);
                removed += 1;
            }
        }
        self.db.write(batch)?;
        Ok(removed)
    }
}
