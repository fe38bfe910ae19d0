//! Application layer: the use cases behind the public catalog, checkout and
//! the restaurateur's order view.
//!
//! [`ranking::RankingEngine`] is the core: it filters restaurants that can
//! fulfil an order and orders them by delivery distance, resolving addresses
//! through the memoizing [`geocoding::GeoResolver`].

pub mod catalog;
pub mod dashboard;
pub mod geocoding;
pub mod ordering;
pub mod ranking;
