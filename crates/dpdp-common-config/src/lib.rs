//! Configuration for the DPDP compliance engine.
//!
//! This crate loads `.dpdp/config.yaml` files into [`DpdpConfig`], expands
//! environment variables, validates the result and loads `.env` files.

pub mod env;
pub mod loader;
pub mod types;

pub use env::*;
pub use loader::*;
pub use types::*;
