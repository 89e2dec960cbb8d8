//! Core types for calsync.
//!
//! This crate keeps a local event cache consistent with an authoritative remote calendar:
//! - `sync` reconciles the cache for a date window (remote first, cache always)
//! - `authoring` validates and submits new events, with typed failures
//! - `failure` translates transport conditions into domain failures
//! - `recurrence` holds repeat rules and their preview expansion

pub mod authoring;
pub mod config;
pub mod error;
pub mod event;
pub mod failure;
pub mod recurrence;
pub mod remote;
pub mod store;
pub mod sync;
pub mod window;

pub use event::*;
