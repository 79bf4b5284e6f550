//! FoodDeals client library (config, session, request layer, API, feed).

pub mod api;
pub mod config;
pub mod feed;
pub mod http;
pub mod logging;
pub mod session;
