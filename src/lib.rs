// src/lib.rs

//! Air-quality backend library
//!
//! Scrapes particulate readings for a location, classifies them into six
//! severity levels and serves them through a TTL cache.

pub mod api;
pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
