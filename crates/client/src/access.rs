//! Role-based capability table.
//!
//! One table decides what each role may do. Navigation and order
//! lifecycle gating both read from it, so a role check never lives in a
//! page. The server still enforces everything; this only decides what the
//! client offers.

use tiendita_core::Role;

/// Something a principal can be offered in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    BrowseCatalog,
    Purchase,
    ViewPurchases,
    ViewReceipt,
    ManageProducts,
    ViewIncomingOrders,
    AcceptOrder,
    RejectOrder,
    DeliverOrder,
    ViewSalesStats,
    ManageUsers,
}

impl Capability {
    /// Every capability, in table order.
    pub const ALL: [Self; 11] = [
        Self::BrowseCatalog,
        Self::Purchase,
        Self::ViewPurchases,
        Self::ViewReceipt,
        Self::ManageProducts,
        Self::ViewIncomingOrders,
        Self::AcceptOrder,
        Self::RejectOrder,
        Self::DeliverOrder,
        Self::ViewSalesStats,
        Self::ManageUsers,
    ];
}

/// `(capability, admin, seller, buyer)`
const TABLE: [(Capability, bool, bool, bool); 11] = [
    (Capability::BrowseCatalog, true, true, true),
    (Capability::Purchase, false, false, true),
    (Capability::ViewPurchases, false, false, true),
    (Capability::ViewReceipt, true, true, true),
    (Capability::ManageProducts, false, true, false),
    (Capability::ViewIncomingOrders, false, true, false),
    (Capability::AcceptOrder, false, true, false),
    (Capability::RejectOrder, false, true, false),
    (Capability::DeliverOrder, false, true, false),
    (Capability::ViewSalesStats, false, true, false),
    (Capability::ManageUsers, true, false, false),
];

/// Whether `role` holds `capability`.
#[must_use]
pub fn allows(role: Role, capability: Capability) -> bool {
    TABLE
        .iter()
        .find(|(cap, ..)| *cap == capability)
        .is_some_and(|&(_, admin, seller, buyer)| match role {
            Role::Admin => admin,
            Role::Seller => seller,
            Role::Buyer => buyer,
        })
}

/// All capabilities `role` holds, in table order.
pub fn capabilities(role: Role) -> impl Iterator<Item = Capability> {
    Capability::ALL
        .into_iter()
        .filter(move |cap| allows(role, *cap))
}

/// A navigation link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavEntry {
    pub label: &'static str,
    pub route: &'static str,
}

/// Links gated by a capability, in menu order.
const NAV: [(Capability, NavEntry); 6] = [
    (
        Capability::BrowseCatalog,
        NavEntry {
            label: "Products",
            route: "/products",
        },
    ),
    (
        Capability::ViewPurchases,
        NavEntry {
            label: "My purchases",
            route: "/my-purchases",
        },
    ),
    (
        Capability::ManageProducts,
        NavEntry {
            label: "My products",
            route: "/dashboard/products",
        },
    ),
    (
        Capability::ViewIncomingOrders,
        NavEntry {
            label: "Orders",
            route: "/dashboard/orders",
        },
    ),
    (
        Capability::ViewSalesStats,
        NavEntry {
            label: "Sales",
            route: "/dashboard/sales",
        },
    ),
    (
        Capability::ManageUsers,
        NavEntry {
            label: "Users",
            route: "/admin/users",
        },
    ),
];

const ANONYMOUS_NAV: [NavEntry; 3] = [
    NavEntry {
        label: "Products",
        route: "/products",
    },
    NavEntry {
        label: "Log in",
        route: "/login",
    },
    NavEntry {
        label: "Sign up",
        route: "/register",
    },
];

/// Navigation for the current principal; `None` means anonymous.
#[must_use]
pub fn navigation(role: Option<Role>) -> Vec<NavEntry> {
    let Some(role) = role else {
        return ANONYMOUS_NAV.to_vec();
    };
    let mut entries: Vec<NavEntry> = NAV
        .iter()
        .filter(|(cap, _)| allows(role, *cap))
        .map(|(_, entry)| *entry)
        .collect();
    entries.push(NavEntry {
        label: "Profile",
        route: "/profile",
    });
    entries
}
