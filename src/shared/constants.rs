// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Administrator role - sees the dashboard and every shop
pub const ROLE_ADMIN: &str = "admin";

/// Shop role - operates a print terminal
pub const ROLE_SHOP: &str = "shop";
