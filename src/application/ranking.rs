use super::geocoding::GeoResolver;
use crate::domain::catalog::{MenuEntry, ProductId, Restaurant, RestaurantId};
use crate::domain::geo::{Coordinates, GeocodeError, round_km};
use crate::domain::order::Order;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Why an order could not be ranked. None of these abort a review batch.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankingFailure {
    #[error("no restaurant offers every product of the order")]
    NoEligibleRestaurant,
    #[error("address {address:?} could not be geocoded")]
    AddressUnresolvable { address: String },
    #[error("geocoder unavailable for {address:?}: {reason}")]
    AdapterUnavailable { address: String, reason: String },
}

impl RankingFailure {
    /// True when restaurants were eligible but distances are unknown.
    pub fn is_indeterminate(&self) -> bool {
        !matches!(self, RankingFailure::NoEligibleRestaurant)
    }

    fn from_lookup(
        address: &str,
        lookup: Result<Option<Coordinates>, GeocodeError>,
    ) -> Result<Coordinates, Self> {
        match lookup {
            Ok(Some(coordinates)) => Ok(coordinates),
            Ok(None) => Err(RankingFailure::AddressUnresolvable {
                address: address.to_string(),
            }),
            Err(e) => Err(RankingFailure::AdapterUnavailable {
                address: address.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// What to do when one eligible restaurant's address cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UnresolvedPolicy {
    /// The whole ranking of the order fails.
    #[default]
    DiscardOrder,
    /// Only that restaurant is left out.
    SkipRestaurant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRestaurant {
    pub restaurant: RestaurantId,
    pub name: String,
    /// Kilometres, rounded to three decimals.
    pub distance_km: f64,
}

pub type Ranking = Result<Vec<RankedRestaurant>, RankingFailure>;

/// Restaurant → offered products, built once per review batch.
///
/// Only entries flagged available count as offered.
#[derive(Debug, Default, Clone)]
pub struct MenuIndex {
    restaurants: Vec<Restaurant>,
    offered: HashMap<RestaurantId, HashSet<ProductId>>,
}

impl MenuIndex {
    pub fn build(restaurants: Vec<Restaurant>, entries: &[MenuEntry]) -> Self {
        let mut offered: HashMap<RestaurantId, HashSet<ProductId>> = HashMap::new();
        for entry in entries.iter().filter(|entry| entry.available) {
            offered.entry(entry.restaurant).or_default().insert(entry.product);
        }
        Self {
            restaurants,
            offered,
        }
    }

    pub fn offers(&self, restaurant: RestaurantId, product: ProductId) -> bool {
        self.offered
            .get(&restaurant)
            .is_some_and(|products| products.contains(&product))
    }

    /// Restaurants whose offered set contains every product the order needs.
    pub fn eligible_for(&self, order: &Order) -> Vec<&Restaurant> {
        let required = order.required_products();
        self.restaurants
            .iter()
            .filter(|restaurant| {
                required
                    .iter()
                    .all(|product| self.offers(restaurant.id, *product))
            })
            .collect()
    }
}

/// Ranks eligible restaurants of an order by delivery distance.
#[derive(Clone)]
pub struct RankingEngine {
    resolver: Arc<GeoResolver>,
    policy: UnresolvedPolicy,
}

impl RankingEngine {
    pub fn new(resolver: Arc<GeoResolver>, policy: UnresolvedPolicy) -> Self {
        Self { resolver, policy }
    }

    pub async fn rank(&self, order: &Order, menus: &MenuIndex) -> Ranking {
        let eligible = menus.eligible_for(order);
        if eligible.is_empty() {
            debug!(order_id = order.id, "No eligible restaurant");
            return Err(RankingFailure::NoEligibleRestaurant);
        }

        let address = &order.contact.address;
        let destination =
            RankingFailure::from_lookup(address, self.resolver.resolve(address).await)?;

        let mut ranked = Vec::with_capacity(eligible.len());
        let mut first_failure = None;
        for restaurant in eligible {
            let lookup = self.resolver.resolve(&restaurant.address).await;
            let origin = match RankingFailure::from_lookup(&restaurant.address, lookup) {
                Ok(origin) => origin,
                Err(failure) => match self.policy {
                    UnresolvedPolicy::DiscardOrder => {
                        warn!(
                            order_id = order.id,
                            restaurant_id = restaurant.id,
                            %failure,
                            "Discarding ranking"
                        );
                        return Err(failure);
                    }
                    UnresolvedPolicy::SkipRestaurant => {
                        warn!(
                            order_id = order.id,
                            restaurant_id = restaurant.id,
                            %failure,
                            "Skipping restaurant"
                        );
                        first_failure.get_or_insert(failure);
                        continue;
                    }
                },
            };
            ranked.push(RankedRestaurant {
                restaurant: restaurant.id,
                name: restaurant.name.clone(),
                distance_km: round_km(origin.distance_km(&destination)),
            });
        }

        if ranked.is_empty()
            && let Some(failure) = first_failure
        {
            return Err(failure);
        }

        ranked.sort_by(|a, b| {
            a.distance_km
                .total_cmp(&b.distance_km)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.restaurant.cmp(&b.restaurant))
        });
        Ok(ranked)
    }
}
