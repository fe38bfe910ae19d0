use crate::domain::catalog::{
    CategoryId, MenuEntry, Price, Product, ProductCategory, ProductId, Restaurant, RestaurantId,
};
use crate::domain::ports::CatalogStoreRef;
use crate::error::{FoodCartError, Result};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
}

/// A product as listed in the public catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub special_status: bool,
    pub description: String,
    pub category: Option<CategorySummary>,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductAvailability {
    pub product: Product,
    /// One flag per restaurant, in the matrix's restaurant order.
    pub availability: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AvailabilityMatrix {
    pub restaurants: Vec<Restaurant>,
    pub products: Vec<ProductAvailability>,
}

pub struct CatalogService {
    store: CatalogStoreRef,
}

impl CatalogService {
    pub fn new(store: CatalogStoreRef) -> Self {
        Self { store }
    }

    /// Products at least one restaurant currently offers.
    pub async fn available_products(&self) -> Result<Vec<CatalogProduct>> {
        let offered: HashSet<ProductId> = self
            .store
            .menu_entries()
            .await?
            .into_iter()
            .filter(|entry| entry.available)
            .map(|entry| entry.product)
            .collect();
        let categories: HashMap<CategoryId, ProductCategory> = self
            .store
            .categories()
            .await?
            .into_iter()
            .map(|category| (category.id, category))
            .collect();

        Ok(self
            .store
            .products()
            .await?
            .into_iter()
            .filter(|product| offered.contains(&product.id))
            .map(|product| CatalogProduct {
                category: product
                    .category
                    .and_then(|id| categories.get(&id))
                    .map(|category| CategorySummary {
                        id: category.id,
                        name: category.name.clone(),
                    }),
                id: product.id,
                name: product.name,
                price: product.price,
                special_status: product.special_status,
                description: product.description,
                image: product.image,
            })
            .collect())
    }

    pub async fn restaurants(&self) -> Result<Vec<Restaurant>> {
        let mut restaurants = self.store.restaurants().await?;
        restaurants.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(restaurants)
    }

    /// Which restaurant offers which product. A missing menu entry reads as `false`.
    pub async fn availability_matrix(&self) -> Result<AvailabilityMatrix> {
        let restaurants = self.restaurants().await?;
        let flags: HashMap<(RestaurantId, ProductId), bool> = self
            .store
            .menu_entries()
            .await?
            .into_iter()
            .map(|entry| (entry.key(), entry.available))
            .collect();

        let products = self
            .store
            .products()
            .await?
            .into_iter()
            .map(|product| ProductAvailability {
                availability: restaurants
                    .iter()
                    .map(|restaurant| {
                        flags
                            .get(&(restaurant.id, product.id))
                            .copied()
                            .unwrap_or(false)
                    })
                    .collect(),
                product,
            })
            .collect();

        Ok(AvailabilityMatrix {
            restaurants,
            products,
        })
    }

    pub async fn set_availability(
        &self,
        restaurant: RestaurantId,
        product: ProductId,
        available: bool,
    ) -> Result<MenuEntry> {
        if self.store.get_restaurant(restaurant).await?.is_none() {
            return Err(FoodCartError::not_found("restaurant", restaurant));
        }
        if self.store.get_product(product).await?.is_none() {
            return Err(FoodCartError::not_found("product", product));
        }
        let entry = MenuEntry::new(restaurant, product, available);
        self.store.store_menu_entry(entry).await?;
        info!(
            restaurant_id = restaurant,
            product_id = product,
            available,
            "Menu availability changed"
        );
        Ok(entry)
    }
}
