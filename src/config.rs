use crate::application::ranking::UnresolvedPolicy;
use crate::infrastructure::geocoder::YANDEX_GEOCODER_URL;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Food ordering back office: catalog, checkout and delivery dispatch",
    long_about = None
)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the storefront and manager HTTP API
    Serve {
        #[arg(long, env = "FOODCART_BIND", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },
    /// Rank restaurants for every open order and print the review as CSV
    Review,
}

/// Settings shared by every subcommand. Each flag can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Log level filter; RUST_LOG takes precedence
    #[arg(long, global = true, env = "FOODCART_LOG", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "FOODCART_LOG_JSON")]
    pub log_json: bool,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true, env = "FOODCART_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// JSON seed with catalog, orders and known places, loaded at startup
    #[arg(long, global = true, env = "FOODCART_SEED")]
    pub seed: Option<PathBuf>,

    #[arg(long, global = true, env = "FOODCART_GEOCODER_URL", default_value = YANDEX_GEOCODER_URL)]
    pub geocoder_url: String,

    /// Geocoder API key. Without it only cached places resolve.
    #[arg(long, global = true, env = "YANDEX_API_KEY", hide_env_values = true)]
    pub geocoder_api_key: Option<String>,

    #[arg(long, global = true, env = "FOODCART_GEOCODE_TIMEOUT_MS", default_value_t = 5_000)]
    pub geocode_timeout_ms: u64,

    /// How long a cached geocoding answer stays valid
    #[arg(long, global = true, env = "FOODCART_GEO_CACHE_TTL_DAYS", default_value_t = 30)]
    pub geo_cache_ttl_days: u32,

    /// Upper bound on cached places kept in memory
    #[arg(long, global = true, env = "FOODCART_GEO_CACHE_CAPACITY", default_value_t = 10_000)]
    pub geo_cache_capacity: usize,

    /// What to do when one eligible restaurant's address cannot be geocoded
    #[arg(
        long,
        global = true,
        value_enum,
        env = "FOODCART_UNRESOLVED_POLICY",
        default_value_t = UnresolvedPolicy::DiscardOrder
    )]
    pub unresolved_policy: UnresolvedPolicy,
}

impl Settings {
    pub fn geocode_timeout(&self) -> Duration {
        Duration::from_millis(self.geocode_timeout_ms)
    }

    pub fn geo_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.geo_cache_ttl_days))
    }
}
