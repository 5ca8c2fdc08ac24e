pub mod cards;
pub mod core;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod rewards;
pub mod security;
pub mod stores;
pub mod utils;
