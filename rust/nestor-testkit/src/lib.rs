//! Test utilities and helpers for the nestor project.
//!
//! This crate provides:
//! - The `Document` schema and sample documents of the Dremel paper
//! - A schema-guided JSON to [`nestor_format::Record`] decoder
//! - Seeded generation of random documents and random records for any schema
//!
//! # Usage
//!
//! This crate is intended for use within the nestor test suite only.

pub mod data_gen;
pub mod document;
pub mod json;
