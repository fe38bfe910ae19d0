#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use foodcart::application::dashboard::OrderDashboard;
use foodcart::application::geocoding::GeoResolver;
use foodcart::application::ranking::{RankingEngine, UnresolvedPolicy};
use foodcart::domain::catalog::{MenuEntry, Price, Product, ProductCategory, ProductId, Restaurant};
use foodcart::domain::geo::{Coordinates, GeocodeError};
use foodcart::domain::order::{Contact, LineItem, NewOrder, Order, OrderStatus, PaymentMethod};
use foodcart::domain::ports::{CatalogStore, Geocoder, OrderStore};
use foodcart::infrastructure::in_memory::{
    InMemoryCatalogStore, InMemoryOrderStore, InMemoryPlaceStore,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const CUSTOMER_ADDRESS: &str = "Moscow, Tverskaya 1";
pub const UNKNOWN_ADDRESS: &str = "Atlantis, Main St 1";
pub const BROKEN_ADDRESS: &str = "Moscow, Broken Lane 13";

pub const ARBAT: u32 = 1;
pub const POKROVKA: u32 = 2;
pub const AIRPORT: u32 = 3;

pub const CHEESEBURGER: ProductId = 1;
pub const FRIES: ProductId = 2;
pub const MILKSHAKE: ProductId = 3;

/// Geocoder answering from a fixed table. `BROKEN_ADDRESS` fails like a dead provider.
#[derive(Default)]
pub struct StubGeocoder {
    known: HashMap<String, Coordinates>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    pub fn moscow() -> Self {
        let known = [
            (CUSTOMER_ADDRESS, Coordinates::new(37.6117, 55.7602)),
            ("Moscow, Arbat 10", Coordinates::new(37.5948, 55.7520)),
            ("Moscow, Pokrovka 3", Coordinates::new(37.6460, 55.7585)),
            ("Moscow, Sheremetyevo", Coordinates::new(37.4146, 55.9726)),
        ]
        .into_iter()
        .map(|(address, point)| (address.to_string(), point))
        .collect();
        Self {
            known,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn resolve(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if address == BROKEN_ADDRESS {
            return Err(GeocodeError::Status(503));
        }
        Ok(self.known.get(address).copied())
    }
}

pub struct Fixture {
    pub catalog: Arc<InMemoryCatalogStore>,
    pub orders: Arc<InMemoryOrderStore>,
    pub places: Arc<InMemoryPlaceStore>,
    pub geocoder: Arc<StubGeocoder>,
}

pub fn price(value: Decimal) -> Price {
    Price::new(value).unwrap()
}

impl Fixture {
    /// Three restaurants around central Moscow.
    ///
    /// Arbat and the airport serve burgers and fries; Pokrovka also has
    /// milkshakes. Arbat lists milkshakes but has run out.
    pub async fn new() -> Self {
        let catalog = Arc::new(InMemoryCatalogStore::new());
        catalog
            .store_category(ProductCategory {
                id: 1,
                name: "Burgers".into(),
            })
            .await
            .unwrap();
        for (id, name, address) in [
            (ARBAT, "Star Burger Arbat", "Moscow, Arbat 10"),
            (POKROVKA, "Star Burger Pokrovka", "Moscow, Pokrovka 3"),
            (AIRPORT, "Star Burger Airport", "Moscow, Sheremetyevo"),
        ] {
            catalog
                .store_restaurant(Restaurant {
                    id,
                    name: name.into(),
                    address: address.into(),
                    contact_phone: "+74950000000".into(),
                })
                .await
                .unwrap();
        }
        for (id, name, cost) in [
            (CHEESEBURGER, "Cheeseburger", Decimal::new(18900, 2)),
            (FRIES, "Fries", Decimal::new(9900, 2)),
            (MILKSHAKE, "Milkshake", Decimal::new(15000, 2)),
        ] {
            catalog
                .store_product(Product {
                    id,
                    name: name.into(),
                    category: Some(1),
                    price: price(cost),
                    image: String::new(),
                    special_status: false,
                    description: String::new(),
                })
                .await
                .unwrap();
        }
        for (restaurant, product, available) in [
            (ARBAT, CHEESEBURGER, true),
            (ARBAT, FRIES, true),
            (ARBAT, MILKSHAKE, false),
            (POKROVKA, CHEESEBURGER, true),
            (POKROVKA, FRIES, true),
            (POKROVKA, MILKSHAKE, true),
            (AIRPORT, CHEESEBURGER, true),
            (AIRPORT, FRIES, true),
        ] {
            catalog
                .store_menu_entry(MenuEntry::new(restaurant, product, available))
                .await
                .unwrap();
        }

        Self {
            catalog,
            orders: Arc::new(InMemoryOrderStore::new()),
            places: Arc::new(InMemoryPlaceStore::new()),
            geocoder: Arc::new(StubGeocoder::moscow()),
        }
    }

    pub fn resolver(&self) -> Arc<GeoResolver> {
        Arc::new(GeoResolver::new(
            self.geocoder.clone(),
            self.places.clone(),
            Duration::from_secs(1),
            chrono::Duration::days(30),
        ))
    }

    pub fn ranking(&self, policy: UnresolvedPolicy) -> RankingEngine {
        RankingEngine::new(self.resolver(), policy)
    }

    pub fn dashboard(&self) -> OrderDashboard {
        OrderDashboard::new(
            self.catalog.clone(),
            self.orders.clone(),
            self.ranking(UnresolvedPolicy::DiscardOrder),
        )
    }

    pub async fn place_order(&self, address: &str, items: &[(ProductId, u8)]) -> Order {
        let mut line_items = Vec::new();
        for &(product, quantity) in items {
            let product = self.catalog.get_product(product).await.unwrap().unwrap();
            line_items.push(LineItem::new(product.id, quantity, product.price).unwrap());
        }
        self.orders
            .create(NewOrder {
                contact: Contact {
                    firstname: "Anna".into(),
                    lastname: "Smirnova".into(),
                    phonenumber: "+79161234567".into(),
                    address: address.into(),
                },
                comment: String::new(),
                payment_method: PaymentMethod::Cash,
                items: line_items,
                created_at: Utc::now(),
            })
            .await
            .unwrap()
    }

    /// Stores a copy of `order` in the given state, bypassing the lifecycle.
    pub async fn force_state(
        &self,
        order: &Order,
        status: OrderStatus,
        restaurant: Option<u32>,
    ) -> Order {
        let mut forced = order.clone();
        forced.status = status;
        forced.restaurant = restaurant;
        self.orders.store(forced.clone()).await.unwrap();
        forced
    }
}
