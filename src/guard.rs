use crate::{auth::AuthUser, error::AppError, models::Role};

/// Role sets shared by several actions.
const ADMIN_ONLY: &[Role] = &[Role::Admin];
const STAFF: &[Role] = &[Role::Admin, Role::Instructor];
const PARTICIPANT_ONLY: &[Role] = &[Role::Participant];
const ANY_ROLE: &[Role] = &[Role::Admin, Role::Instructor, Role::Participant];

/// Action
///
/// Every operation behind authentication. The role table below is matched
/// exhaustively, so adding an action without deciding who may perform it does not
/// compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateWorkshop,
    UpdateWorkshop,
    DeleteWorkshop,
    ListOwnWorkshops,
    Register,
    CancelRegistration,
    ListRegistrations,
    MarkAttendance,
    ListAttendance,
    SubmitFeedback,
    ListFeedback,
    AddMaterial,
    ListMaterials,
    IssueCertificate,
    ListCertificates,
    DownloadCertificate,
    ListUsers,
    ViewProfile,
}

impl Action {
    /// The roles allowed to perform this action.
    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Action::CreateWorkshop
            | Action::UpdateWorkshop
            | Action::DeleteWorkshop
            | Action::IssueCertificate
            | Action::ListUsers => ADMIN_ONLY,
            Action::ListOwnWorkshops
            | Action::MarkAttendance
            | Action::ListAttendance
            | Action::ListFeedback
            | Action::AddMaterial => STAFF,
            Action::Register | Action::CancelRegistration | Action::SubmitFeedback => {
                PARTICIPANT_ONLY
            }
            Action::ListRegistrations
            | Action::ListMaterials
            | Action::ListCertificates
            | Action::DownloadCertificate
            | Action::ViewProfile => ANY_ROLE,
        }
    }

    pub fn permits(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}

/// authorize
///
/// Fails with `Forbidden` when the caller's role is not in the action's role set.
/// Runs after authentication, on an already resolved `AuthUser`.
pub fn authorize(user: &AuthUser, action: Action) -> Result<(), AppError> {
    if action.permits(user.role) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, role = %user.role, ?action, "role not permitted");
        Err(AppError::Forbidden)
    }
}
