//! Modules layer - Infrastructure components
//!
//! Contains the blob storage backends and the relational repository.

pub mod repository;
pub mod storage;
