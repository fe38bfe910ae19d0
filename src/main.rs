use chrono::Utc;
use clap::Parser;
use foodcart::application::dashboard::OrderDashboard;
use foodcart::application::geocoding::GeoResolver;
use foodcart::application::ranking::RankingEngine;
use foodcart::config::{Cli, Command, Settings};
use foodcart::domain::ports::{CatalogStoreRef, GeocoderRef, OrderStoreRef, PlaceStoreRef};
use foodcart::infrastructure::geocoder::{OfflineGeocoder, YandexGeocoder};
use foodcart::infrastructure::in_memory::{
    InMemoryCatalogStore, InMemoryOrderStore, InMemoryPlaceStore,
};
use foodcart::interfaces::csv::review_writer::ReviewWriter;
use foodcart::interfaces::http::{AppState, serve};
use foodcart::interfaces::seed::Seed;
use foodcart::telemetry;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::sync::Arc;
use tracing::{info, warn};

struct Stores {
    catalog: CatalogStoreRef,
    orders: OrderStoreRef,
    places: PlaceStoreRef,
}

fn open_stores(settings: &Settings) -> foodcart::error::Result<Stores> {
    if let Some(db_path) = &settings.db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            let store = Arc::new(foodcart::infrastructure::rocksdb::RocksDBStore::open(db_path)?);
            return Ok(Stores {
                catalog: store.clone(),
                orders: store.clone(),
                places: store,
            });
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        {
            warn!(
                db_path = %db_path.display(),
                "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
        }
    }

    Ok(Stores {
        catalog: Arc::new(InMemoryCatalogStore::new()),
        orders: Arc::new(InMemoryOrderStore::new()),
        places: Arc::new(InMemoryPlaceStore::with_capacity(settings.geo_cache_capacity)),
    })
}

fn geocoder(settings: &Settings) -> Result<GeocoderRef> {
    match &settings.geocoder_api_key {
        Some(key) if !key.trim().is_empty() => Ok(Arc::new(
            YandexGeocoder::new(&settings.geocoder_url, key, settings.geocode_timeout())
                .into_diagnostic()?,
        )),
        _ => {
            warn!("No geocoder API key configured; only cached places will resolve");
            Ok(Arc::new(OfflineGeocoder))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings;
    telemetry::init_logging(&settings.log_level, settings.log_json).into_diagnostic()?;

    let stores = open_stores(&settings).into_diagnostic()?;
    let pruned = stores
        .places
        .prune(Utc::now() - settings.geo_cache_ttl())
        .await
        .into_diagnostic()?;
    if pruned > 0 {
        info!(pruned, "Dropped stale geocode cache entries");
    }

    if let Some(seed_path) = &settings.seed {
        let file = File::open(seed_path).into_diagnostic()?;
        Seed::from_reader(file)
            .into_diagnostic()?
            .load_into(stores.catalog.as_ref(), stores.orders.as_ref(), stores.places.as_ref())
            .await
            .into_diagnostic()?;
    }

    let resolver = Arc::new(GeoResolver::new(
        geocoder(&settings)?,
        stores.places.clone(),
        settings.geocode_timeout(),
        settings.geo_cache_ttl(),
    ));
    let ranking = RankingEngine::new(resolver, settings.unresolved_policy);

    match cli.command {
        Command::Serve { bind } => {
            let state = AppState::new(stores.catalog, stores.orders, ranking);
            serve(state, bind).await.into_diagnostic()?;
        }
        Command::Review => {
            let dashboard = OrderDashboard::new(stores.catalog, stores.orders, ranking);
            let reviews = dashboard.review_open_orders().await.into_diagnostic()?;

            let stdout = io::stdout();
            let mut writer = ReviewWriter::new(stdout.lock());
            writer.write_reviews(&reviews).into_diagnostic()?;
        }
    }

    Ok(())
}
