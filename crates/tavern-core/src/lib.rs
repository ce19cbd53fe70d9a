//! Core types for the Tavern campaign store.
//!
//! This crate has no HTTP and database dependencies. It
//! describes the legacy flat-file records, how shop categories are
//! classified, how backend ids are minted, and the application settings that
//! are handed to consumers explicitly.

pub mod category;
pub mod domain;
pub mod error;
pub mod id;
pub mod legacy;
pub mod settings;

pub use error::{Error, Result};
