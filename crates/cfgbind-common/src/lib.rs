//! # cfgbind-common
//!
//! Shared error definitions, run options, reserved tokens, and domain types
//! used across the cfgbind workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the primitives the engine and the binaries
//! build upon.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
