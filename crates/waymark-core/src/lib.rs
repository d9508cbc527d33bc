//! Waymark Core — domain models, shared error types, and repository
//! trait definitions.
//!
//! This crate has no I/O and no cryptography. Everything here is shared
//! vocabulary: the storage layer (`waymark-db`) implements the repository
//! traits, and the redemption engine (`waymark-engine`) is generic over
//! them.

pub mod error;
pub mod models;
pub mod repository;
