//! Domain model of the food-ordering platform and the ports the application
//! layer talks to.

pub mod catalog;
pub mod geo;
pub mod order;
pub mod ports;
