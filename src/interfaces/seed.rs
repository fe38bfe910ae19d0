use crate::domain::catalog::{MenuEntry, Product, ProductCategory, Restaurant};
use crate::domain::geo::{Coordinates, GeoPoint};
use crate::domain::order::{LineItem, Order};
use crate::domain::ports::{CatalogStore, OrderStore, PlaceStore};
use crate::error::{FieldViolation, FoodCartError, Result};
use serde::Deserialize;
use std::io::Read;
use tracing::info;

/// A pre-resolved address, written straight into the geocoding cache.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedPlace {
    pub address: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// Initial data set, as a single JSON document.
///
/// Every section is optional; loading upserts by id.
#[derive(Debug, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub categories: Vec<ProductCategory>,
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub menu: Vec<MenuEntry>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub places: Vec<SeedPlace>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub restaurants: usize,
    pub products: usize,
    pub menu_entries: usize,
    pub orders: usize,
    pub places: usize,
}

impl Seed {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let seed: Seed = serde_json::from_reader(reader)?;
        seed.check()?;
        Ok(seed)
    }

    fn check(&self) -> Result<()> {
        let mut problems = Vec::new();
        for order in &self.orders {
            for (index, item) in order.items.iter().enumerate() {
                if let Err(FoodCartError::Validation(found)) =
                    LineItem::new(item.product, item.quantity, item.price)
                {
                    problems.extend(found.into_iter().map(|v| {
                        FieldViolation::new(
                            format!("orders[{}].items[{index}].{}", order.id, v.field),
                            v.message,
                        )
                    }));
                }
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(FoodCartError::Validation(problems))
        }
    }

    pub async fn load_into(
        self,
        catalog: &dyn CatalogStore,
        orders: &dyn OrderStore,
        places: &dyn PlaceStore,
    ) -> Result<SeedSummary> {
        let summary = SeedSummary {
            restaurants: self.restaurants.len(),
            products: self.products.len(),
            menu_entries: self.menu.len(),
            orders: self.orders.len(),
            places: self.places.len(),
        };

        for category in self.categories {
            catalog.store_category(category).await?;
        }
        for restaurant in self.restaurants {
            catalog.store_restaurant(restaurant).await?;
        }
        for product in self.products {
            catalog.store_product(product).await?;
        }
        for entry in self.menu {
            catalog.store_menu_entry(entry).await?;
        }
        for order in self.orders {
            orders.store(order).await?;
        }
        for place in self.places {
            places
                .store(GeoPoint::new(place.address, place.coordinates))
                .await?;
        }

        info!(
            restaurants = summary.restaurants,
            products = summary.products,
            menu_entries = summary.menu_entries,
            orders = summary.orders,
            places = summary.places,
            "Seed loaded"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderStatus;
    use crate::infrastructure::in_memory::{
        InMemoryCatalogStore, InMemoryOrderStore, InMemoryPlaceStore,
    };

    const SEED: &str = r#"{
        "categories": [{"id": 1, "name": "Burgers"}],
        "restaurants": [{"id": 1, "name": "Star Burger", "address": "Arbat 1", "contact_phone": "+74950000001"}],
        "products": [{"id": 1, "name": "Cheeseburger", "category": 1, "price": "189.00"}],
        "menu": [{"restaurant": 1, "product": 1}],
        "orders": [{
            "id": 5, "firstname": "Ivan", "lastname": "Petrov", "phonenumber": "+79990000000",
            "address": "Tverskaya 1", "status": "accepted", "created_at": "2024-05-01T12:00:00Z",
            "items": [{"product": 1, "quantity": 2, "price": "189.00"}]
        }],
        "places": [{"address": "Arbat 1", "coordinates": {"longitude": 37.59, "latitude": 55.75}}]
    }"#;

    #[tokio::test]
    async fn test_seed_loads_every_section() {
        let catalog = InMemoryCatalogStore::new();
        let orders = InMemoryOrderStore::new();
        let places = InMemoryPlaceStore::new();

        let summary = Seed::from_reader(SEED.as_bytes())
            .unwrap()
            .load_into(&catalog, &orders, &places)
            .await
            .unwrap();

        assert_eq!(summary.orders, 1);
        assert_eq!(catalog.menu_entries().await.unwrap(), vec![MenuEntry::new(1, 1, true)]);
        let order = orders.get(5).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(order.contact.firstname, "Ivan");
        assert!(places.get("Arbat 1").await.unwrap().unwrap().coordinates.is_some());
    }

    #[test]
    fn test_seed_rejects_out_of_range_quantity() {
        let bad = SEED.replace("\"quantity\": 2", "\"quantity\": 12");
        match Seed::from_reader(bad.as_bytes()) {
            Err(FoodCartError::Validation(found)) => {
                assert_eq!(found[0].field, "orders[5].items[0].quantity");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
