use crate::domain::geo::{Coordinates, GeocodeError};
use crate::domain::ports::Geocoder;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

pub const YANDEX_GEOCODER_URL: &str = "https://geocode-maps.yandex.ru/1.x";

#[derive(Debug, Deserialize)]
struct GeocoderResponse {
    response: ResponseBody,
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(rename = "GeoObjectCollection")]
    collection: GeoObjectCollection,
}

#[derive(Debug, Deserialize)]
struct GeoObjectCollection {
    #[serde(rename = "featureMember", default)]
    members: Vec<FeatureMember>,
}

#[derive(Debug, Deserialize)]
struct FeatureMember {
    #[serde(rename = "GeoObject")]
    geo_object: GeoObject,
}

#[derive(Debug, Deserialize)]
struct GeoObject {
    #[serde(rename = "Point")]
    point: Point,
}

#[derive(Debug, Deserialize)]
struct Point {
    /// "<longitude> <latitude>"
    pos: String,
}

/// Geocoder backed by the Yandex HTTP geocoding API.
///
/// The most relevant (first) feature member wins.
pub struct YandexGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YandexGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeocodeError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Geocoder for YandexGeocoder {
    async fn resolve(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("geocode", address),
                ("apikey", self.api_key.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeocodeError::Http(format!("request timed out: {e}"))
                } else {
                    GeocodeError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status().as_u16()));
        }

        let body: GeocoderResponse = response
            .json()
            .await
            .map_err(|e| GeocodeError::Payload(e.to_string()))?;
        most_relevant(&body)
    }
}

fn most_relevant(body: &GeocoderResponse) -> Result<Option<Coordinates>, GeocodeError> {
    let Some(member) = body.response.collection.members.first() else {
        return Ok(None);
    };
    parse_pos(&member.geo_object.point.pos).map(Some)
}

fn parse_pos(pos: &str) -> Result<Coordinates, GeocodeError> {
    let mut parts = pos.split_whitespace();
    let (Some(lon), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(GeocodeError::Payload(format!("malformed position {pos:?}")));
    };
    let longitude = lon
        .parse::<f64>()
        .map_err(|e| GeocodeError::Payload(format!("longitude {lon:?}: {e}")))?;
    let latitude = lat
        .parse::<f64>()
        .map_err(|e| GeocodeError::Payload(format!("latitude {lat:?}: {e}")))?;
    Ok(Coordinates::new(longitude, latitude))
}

/// Geocoder used when no provider is configured. Every lookup fails with
/// [`GeocodeError::Unconfigured`], so only places already in the cache have
/// coordinates and nothing new is cached as a miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineGeocoder;

#[async_trait]
impl Geocoder for OfflineGeocoder {
    async fn resolve(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        tracing::debug!(%address, "Offline geocoder, address left unresolved");
        Err(GeocodeError::Unconfigured)
    }
}
