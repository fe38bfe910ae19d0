use crate::domain::geo::{Coordinates, GeoPoint, GeocodeError};
use crate::domain::ports::{GeocoderRef, PlaceStoreRef};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, warn};

/// Get-or-resolve access to coordinates, memoized per exact address text.
///
/// Answers from the place store while an entry is younger than `ttl`; otherwise
/// asks the geocoder (bounded by `timeout`) and writes the answer back. A
/// provider "no match" is cached like a hit; provider failures are not.
pub struct GeoResolver {
    geocoder: GeocoderRef,
    places: PlaceStoreRef,
    timeout: Duration,
    ttl: chrono::Duration,
}

impl GeoResolver {
    pub fn new(
        geocoder: GeocoderRef,
        places: PlaceStoreRef,
        timeout: Duration,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            geocoder,
            places,
            timeout,
            ttl,
        }
    }

    pub async fn resolve(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        if address.trim().is_empty() {
            return Ok(None);
        }

        match self.places.get(address).await {
            Ok(Some(point)) if point.is_fresh(self.ttl, Utc::now()) => {
                debug!(%address, "Geocode cache hit");
                return Ok(point.coordinates);
            }
            Ok(_) => {}
            Err(e) => warn!(%address, error = %e, "Failed to read geocode cache"),
        }

        let lookup = tokio::time::timeout(self.timeout, self.geocoder.resolve(address)).await;
        let coordinates = match lookup {
            Ok(Ok(coordinates)) => coordinates,
            Ok(Err(GeocodeError::Unconfigured)) => {
                debug!(%address, "No geocoder configured, address not cached");
                return Err(GeocodeError::Unconfigured);
            }
            Ok(Err(e)) => {
                warn!(%address, error = %e, "Geocoder failed");
                return Err(e);
            }
            Err(_) => {
                let e = GeocodeError::Timeout(self.timeout.as_millis() as u64);
                warn!(%address, error = %e, "Geocoder timed out");
                return Err(e);
            }
        };

        if let Err(e) = self.places.store(GeoPoint::new(address, coordinates)).await {
            warn!(%address, error = %e, "Failed to write geocode cache");
        }
        Ok(coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{Geocoder, PlaceStore};
    use crate::infrastructure::geocoder::OfflineGeocoder;
    use crate::infrastructure::in_memory::InMemoryPlaceStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingGeocoder {
        known: HashMap<String, Coordinates>,
        calls: AtomicUsize,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl Geocoder for CountingGeocoder {
        async fn resolve(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(GeocodeError::Status(403));
            }
            Ok(self.known.get(address).copied())
        }
    }

    fn resolver(geocoder: Arc<CountingGeocoder>, places: Arc<InMemoryPlaceStore>) -> GeoResolver {
        GeoResolver::new(
            geocoder,
            places,
            Duration::from_millis(50),
            chrono::Duration::days(30),
        )
    }

    #[tokio::test]
    async fn test_cache_hit_skips_geocoder() {
        let geocoder = Arc::new(CountingGeocoder {
            known: HashMap::from([("Arbat 1".to_string(), Coordinates::new(37.59, 55.75))]),
            ..Default::default()
        });
        let places = Arc::new(InMemoryPlaceStore::new());
        let resolver = resolver(geocoder.clone(), places.clone());

        let first = resolver.resolve("Arbat 1").await.unwrap();
        let second = resolver.resolve("Arbat 1").await.unwrap();

        assert_eq!(first, Some(Coordinates::new(37.59, 55.75)));
        assert_eq!(first, second);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_match_is_cached() {
        let geocoder = Arc::new(CountingGeocoder::default());
        let places = Arc::new(InMemoryPlaceStore::new());
        let resolver = resolver(geocoder.clone(), places.clone());

        assert_eq!(resolver.resolve("Nowhere").await.unwrap(), None);
        assert_eq!(resolver.resolve("Nowhere").await.unwrap(), None);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
        assert!(places.get("Nowhere").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let geocoder = Arc::new(CountingGeocoder {
            fail: true,
            ..Default::default()
        });
        let places = Arc::new(InMemoryPlaceStore::new());
        let resolver = resolver(geocoder.clone(), places.clone());

        assert_eq!(resolver.resolve("Arbat 1").await, Err(GeocodeError::Status(403)));
        assert!(resolver.resolve("Arbat 1").await.is_err());
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
        assert!(places.is_empty().await);
    }

    #[tokio::test]
    async fn test_offline_lookup_leaves_cache_for_real_provider() {
        let places = Arc::new(InMemoryPlaceStore::new());
        let offline = GeoResolver::new(
            Arc::new(OfflineGeocoder),
            places.clone(),
            Duration::from_millis(50),
            chrono::Duration::days(30),
        );
        assert_eq!(
            offline.resolve("Moscow, Unknown Street 99").await,
            Err(GeocodeError::Unconfigured)
        );
        assert!(places.is_empty().await);

        let geocoder = Arc::new(CountingGeocoder {
            known: HashMap::from([(
                "Moscow, Unknown Street 99".to_string(),
                Coordinates::new(37.6, 55.7),
            )]),
            ..Default::default()
        });
        let online = resolver(geocoder.clone(), places.clone());
        assert_eq!(
            online.resolve("Moscow, Unknown Street 99").await.unwrap(),
            Some(Coordinates::new(37.6, 55.7))
        );
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_unresolvable() {
        let geocoder = Arc::new(CountingGeocoder {
            delay: Some(Duration::from_secs(5)),
            ..Default::default()
        });
        let resolver = resolver(geocoder, Arc::new(InMemoryPlaceStore::new()));

        assert_eq!(resolver.resolve("Arbat 1").await, Err(GeocodeError::Timeout(50)));
    }

    #[tokio::test]
    async fn test_stale_entry_is_requeried() {
        let geocoder = Arc::new(CountingGeocoder {
            known: HashMap::from([("Arbat 1".to_string(), Coordinates::new(1.0, 2.0))]),
            ..Default::default()
        });
        let places = Arc::new(InMemoryPlaceStore::new());
        let mut stale = GeoPoint::new("Arbat 1", Some(Coordinates::new(9.0, 9.0)));
        stale.fetched_at = Utc::now() - chrono::Duration::days(31);
        places.store(stale).await.unwrap();

        let resolver = resolver(geocoder.clone(), places.clone());
        assert_eq!(
            resolver.resolve("Arbat 1").await.unwrap(),
            Some(Coordinates::new(1.0, 2.0))
        );
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blank_address_never_queried() {
        let geocoder = Arc::new(CountingGeocoder::default());
        let resolver = resolver(geocoder.clone(), Arc::new(InMemoryPlaceStore::new()));

        assert_eq!(resolver.resolve("  ").await.unwrap(), None);
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }
}
