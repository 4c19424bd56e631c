//! Record-level visibility.
//!
//! Each resource has one scope type derived from the authenticated user. The same
//! scope filters list queries (translated to SQL by the Postgres repository, evaluated
//! with `admits` by the in-memory one) and decides single-record access in handlers.

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    models::{Certificate, Registration, Role, Workshop},
};

/// WorkshopScope
///
/// The workshops a user manages. Admins manage every workshop, anyone else only the
/// workshops where they are the assigned instructor. Governs attendance, feedback
/// reads and the "my workshops" view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkshopScope {
    All,
    InstructedBy(Uuid),
}

impl WorkshopScope {
    pub fn for_user(user: &AuthUser) -> Self {
        match user.role {
            Role::Admin => WorkshopScope::All,
            Role::Instructor | Role::Participant => WorkshopScope::InstructedBy(user.id),
        }
    }

    pub fn admits(&self, workshop: &Workshop) -> bool {
        match self {
            WorkshopScope::All => true,
            WorkshopScope::InstructedBy(id) => workshop.instructor_id == Some(*id),
        }
    }
}

/// RegistrationScope
///
/// Participants see their own registrations; instructors and admins see all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationScope {
    All,
    OwnedBy(Uuid),
}

impl RegistrationScope {
    pub fn for_user(user: &AuthUser) -> Self {
        match user.role {
            Role::Participant => RegistrationScope::OwnedBy(user.id),
            Role::Instructor | Role::Admin => RegistrationScope::All,
        }
    }

    /// Strict ownership, regardless of role. Used for cancellation.
    pub fn owner(user: &AuthUser) -> Self {
        RegistrationScope::OwnedBy(user.id)
    }

    pub fn admits(&self, registration: &Registration) -> bool {
        match self {
            RegistrationScope::All => true,
            RegistrationScope::OwnedBy(id) => registration.user_id == *id,
        }
    }
}

/// CertificateScope
///
/// Admins see every certificate, everyone else only certificates issued to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateScope {
    All,
    IssuedTo(Uuid),
}

impl CertificateScope {
    pub fn for_user(user: &AuthUser) -> Self {
        match user.role {
            Role::Admin => CertificateScope::All,
            Role::Instructor | Role::Participant => CertificateScope::IssuedTo(user.id),
        }
    }

    pub fn admits(&self, certificate: &Certificate) -> bool {
        match self {
            CertificateScope::All => true,
            CertificateScope::IssuedTo(id) => certificate.user_id == *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u128, role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::from_u128(id),
            role,
            ..Default::default()
        }
    }

    fn workshop(instructor: Option<u128>) -> Workshop {
        Workshop {
            id: Uuid::new_v4(),
            instructor_id: instructor.map(Uuid::from_u128),
            ..Default::default()
        }
    }

    #[test]
    fn instructors_only_manage_their_own_workshops() {
        let scope = WorkshopScope::for_user(&user(1, Role::Instructor));
        assert!(scope.admits(&workshop(Some(1))));
        assert!(!scope.admits(&workshop(Some(2))));
        assert!(!scope.admits(&workshop(None)));
    }

    #[test]
    fn admins_manage_everything() {
        let scope = WorkshopScope::for_user(&user(9, Role::Admin));
        assert!(scope.admits(&workshop(Some(1))));
        assert!(scope.admits(&workshop(None)));
    }

    #[test]
    fn participants_see_only_their_registrations() {
        let scope = RegistrationScope::for_user(&user(3, Role::Participant));
        let mine = Registration {
            user_id: Uuid::from_u128(3),
            ..Default::default()
        };
        let theirs = Registration {
            user_id: Uuid::from_u128(4),
            ..Default::default()
        };
        assert!(scope.admits(&mine));
        assert!(!scope.admits(&theirs));
        assert_eq!(
            RegistrationScope::for_user(&user(5, Role::Instructor)),
            RegistrationScope::All
        );
    }

    #[test]
    fn ownership_scope_ignores_role() {
        let admin = user(9, Role::Admin);
        let other = Registration {
            user_id: Uuid::from_u128(4),
            ..Default::default()
        };
        assert!(!RegistrationScope::owner(&admin).admits(&other));
    }

    #[test]
    fn certificates_are_private_to_their_owner() {
        let cert = Certificate {
            user_id: Uuid::from_u128(3),
            ..Default::default()
        };
        assert!(CertificateScope::for_user(&user(3, Role::Participant)).admits(&cert));
        assert!(!CertificateScope::for_user(&user(4, Role::Participant)).admits(&cert));
        assert!(!CertificateScope::for_user(&user(5, Role::Instructor)).admits(&cert));
        assert!(CertificateScope::for_user(&user(6, Role::Admin)).admits(&cert));
    }
}
