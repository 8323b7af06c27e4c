//! Core types for TienditaCampus.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod role;
pub mod status;
pub mod transition;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use role::{Role, RoleError};
pub use status::*;
pub use transition::{LifecycleAction, TransitionError};
