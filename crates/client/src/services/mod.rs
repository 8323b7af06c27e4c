//! Domain services: thin typed wrappers over [`ApiClient`](crate::api::ApiClient).

mod auth;
mod guard;
mod orders;
mod products;
mod sales;
mod users;

pub use auth::AuthService;
pub use guard::InFlightGuard;
pub use orders::OrdersService;
pub use products::ProductsService;
pub use sales::SalesService;
pub use users::UsersService;
