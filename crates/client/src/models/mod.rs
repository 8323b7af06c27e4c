//! Wire types exchanged with the marketplace API.
//!
//! These are disposable copies of server-owned entities; the client never
//! treats them as authoritative beyond "last fetch wins".

pub mod order;
pub mod product;
pub mod sales;
pub mod user;

pub use order::{Order, OrderItem, PartySummary, ProductSummary, PurchaseItem, PurchaseRequest};
pub use product::{NewProduct, Product, ProductUpdate, SellerSummary};
pub use sales::{ProductSales, SalesStats};
pub use user::{AuthResponse, PublicUser, RegisterRequest, User, UserPatch};
