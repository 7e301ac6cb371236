// src/lib.rs

//! Content integrity library: legacy permalink resolution and dead link
//! checking for a publication archive.

pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
