/// Router Module Index
///
/// Splits the routing table by access level. Authentication is applied as a layer on
/// whole routers, role checks happen in the handlers.

/// Routes accessible without a session.
pub mod public;

/// Routes for any authenticated user; handlers narrow by role.
pub mod authenticated;

/// Admin-only mutations and listings.
pub mod admin;
