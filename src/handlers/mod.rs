//! HTTP handlers, one module per component.
//!
//! Every protected handler takes `AuthUser` first, runs the role check from the
//! guard table, and only then applies record-level visibility.

use serde::Deserialize;
use uuid::Uuid;

use crate::models::Role;

pub mod attendance;
pub mod auth;
pub mod certificates;
pub mod feedback;
pub mod materials;
pub mod registrations;
pub mod users;
pub mod workshops;

// --- Filter Structs ---

/// WorkshopFilter
///
/// Optional `?workshop=<id>` query parameter shared by the registration, feedback and
/// material listings.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct WorkshopFilter {
    /// Restrict the listing to one workshop.
    pub workshop: Option<Uuid>,
}

/// RoleFilter
///
/// Optional `?role=` query parameter of the user listing.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct RoleFilter {
    /// One of `admin`, `instructor`, `participant`.
    pub role: Option<Role>,
}
