//! TienditaCampus client core.
//!
//! Everything a front-end needs to talk to the marketplace API:
//! - [`session`] - The single holder of the bearer token and current user
//! - [`api`] - HTTP chokepoint that attaches credentials and decodes errors
//! - [`services`] - Typed operations per domain (auth, products, orders, ...)
//! - [`lifecycle`] - Order status rules, list views and purchase validation
//! - [`access`] - Role capability table driving navigation and actions
//!
//! # Architecture
//!
//! ```text
//! Tiendita ──► services ──► ApiClient ──► marketplace API
//!                 │             │
//!                 └──► SessionStore ◄─┘ (reads token)
//!                          │
//!                          └──► SessionStorage (file / memory)
//! ```
//!
//! The server is authoritative for every entity; this crate never caches
//! beyond "last fetch wins".

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod services;
pub mod session;

use std::sync::Arc;

use tiendita_core::Role;

pub use api::{ApiClient, RequestOptions};
pub use config::{ClientConfig, ConfigError, LogFormat};
pub use error::{ApiError, ErrorKind};
pub use lifecycle::{BoardScope, Cart, OrderBoard, PurchaseError};
pub use services::{
    AuthService, InFlightGuard, OrdersService, ProductsService, SalesService, UsersService,
};
pub use session::{Session, SessionStorage, SessionStore};

/// One session, one HTTP client and one duplicate guard, wired together.
///
/// Cheap to clone; every clone shares the same state.
#[derive(Debug, Clone)]
pub struct Tiendita {
    session: SessionStore,
    api: ApiClient,
    guard: InFlightGuard,
}

impl Tiendita {
    /// Wire up a client against `config.api_url`, persisting to `storage`.
    ///
    /// The session starts un-hydrated; call
    /// [`SessionStore::hydrate`] before trusting `is_authenticated`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, storage: Arc<dyn SessionStorage>) -> Result<Self, ApiError> {
        let session = SessionStore::new(storage);
        let api = ApiClient::new(config, session.clone())?;
        Ok(Self {
            session,
            api,
            guard: InFlightGuard::new(config.dedup_window),
        })
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    #[must_use]
    pub fn products(&self) -> ProductsService {
        ProductsService::new(self.api.clone())
    }

    /// Orders service sharing this bundle's duplicate guard.
    #[must_use]
    pub fn orders(&self) -> OrdersService {
        OrdersService::new(self.api.clone(), self.guard.clone())
    }

    #[must_use]
    pub fn users(&self) -> UsersService {
        UsersService::new(self.api.clone())
    }

    #[must_use]
    pub fn sales(&self) -> SalesService {
        SalesService::new(self.api.clone())
    }

    /// An empty board for `scope`, acting as `role`.
    #[must_use]
    pub fn order_board(&self, scope: BoardScope, role: Role) -> OrderBoard {
        OrderBoard::new(self.orders(), scope, role)
    }
}
