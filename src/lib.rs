pub mod cache;
pub mod cache_keys;
pub mod chain;
pub mod configuration;
pub mod controller;
pub mod dao;
pub mod error;
pub mod handler;
pub mod helpers;
pub mod math;
pub mod model;
pub mod provider;
pub mod server;

#[cfg(test)]
mod test_support;
