//! TienditaCampus Core - Shared domain types.
//!
//! This crate provides the types shared by every TienditaCampus component:
//! - `client` - Typed API client, session store and order lifecycle rules
//! - `cli` - Terminal front-end driving the client
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no persistence. The server owns every entity; these types are
//! the client's view of them.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, money, roles and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
