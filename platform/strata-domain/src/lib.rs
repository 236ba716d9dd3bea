//! Domain layer for Strata: candle and trade value objects, the
//! per-variant simulation engine, metrics folding, scoring, and the
//! repository ports implemented by the infrastructure layer.

pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;
