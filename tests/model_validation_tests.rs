use serde_json::json;
use uuid::Uuid;
use workshop_hub::models::{
    AddMaterialRequest, IssueCertificateRequest, MarkAttendanceRequest, RegisterRequest,
    Registration, RegistrationStatus, Role, SignupRequest, SubmitFeedbackRequest,
    UpdateWorkshopRequest, User, UserCredentials, WorkshopDetails,
};

// --- Request Payloads ---

#[test]
fn test_register_request_accepts_camel_and_snake_case() {
    let id = Uuid::new_v4();

    let camel: RegisterRequest = serde_json::from_value(json!({ "workshopId": id })).unwrap();
    let snake: RegisterRequest = serde_json::from_value(json!({ "workshop_id": id })).unwrap();
    let empty: RegisterRequest = serde_json::from_value(json!({})).unwrap();

    assert_eq!(camel.workshop_id, Some(id));
    assert_eq!(snake.workshop_id, Some(id));
    assert_eq!(empty.workshop_id, None);
}

#[test]
fn test_attendance_and_certificate_aliases() {
    let registration = Uuid::new_v4();
    let mark: MarkAttendanceRequest = serde_json::from_value(json!({
        "registrationId": registration,
        "attended": true
    }))
    .unwrap();
    assert_eq!(mark.registration_id, Some(registration));
    assert_eq!(mark.attended, Some(true));

    let user = Uuid::new_v4();
    let issue: IssueCertificateRequest = serde_json::from_value(json!({
        "workshop": Uuid::new_v4(),
        "userId": user,
        "certificate_url": "https://certs.example.com/a.pdf"
    }))
    .unwrap();
    assert_eq!(issue.user_id, Some(user));

    let material: AddMaterialRequest = serde_json::from_value(json!({
        "workshop": Uuid::new_v4(),
        "title": "Slides",
        "fileUrl": "https://files.example.com/s.pdf"
    }))
    .unwrap();
    assert_eq!(
        material.file_url.as_deref(),
        Some("https://files.example.com/s.pdf")
    );
}

#[test]
fn test_feedback_rating_type_is_enforced() {
    let result: Result<SubmitFeedbackRequest, _> = serde_json::from_value(json!({
        "workshop": Uuid::new_v4(),
        "rating": "five"
    }));
    assert!(result.is_err());
}

#[test]
fn test_unknown_roles_are_rejected() {
    let admin: SignupRequest = serde_json::from_value(json!({ "role": "admin" })).unwrap();
    assert_eq!(admin.role, Some(Role::Admin));

    let result: Result<SignupRequest, _> = serde_json::from_value(json!({ "role": "superuser" }));
    assert!(result.is_err());
}

#[test]
fn test_partial_update_distinguishes_null_from_absent() {
    let instructor = Uuid::new_v4();

    let absent: UpdateWorkshopRequest = serde_json::from_value(json!({ "seats": 3 })).unwrap();
    assert_eq!(absent.venue, None);
    assert_eq!(absent.instructor, None);

    let cleared: UpdateWorkshopRequest =
        serde_json::from_value(json!({ "venue": null, "instructor_id": null })).unwrap();
    assert_eq!(cleared.venue, Some(None));
    assert_eq!(cleared.instructor, Some(None));

    let set: UpdateWorkshopRequest =
        serde_json::from_value(json!({ "instructor": instructor, "date": "2026-11-02" })).unwrap();
    assert_eq!(set.instructor, Some(Some(instructor)));
    assert!(matches!(set.date, Some(Some(_))));

    // A cleared field serializes back as an explicit null.
    assert_eq!(
        serde_json::to_value(&cleared).unwrap(),
        json!({ "venue": null, "instructor": null })
    );
}

#[test]
fn test_partial_update_omits_absent_fields() {
    let update = UpdateWorkshopRequest {
        seats: Some(3),
        ..Default::default()
    };
    assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "seats": 3 }));
}

// --- Response Shapes ---

#[test]
fn test_enums_serialize_lowercase() {
    assert_eq!(serde_json::to_value(Role::Instructor).unwrap(), json!("instructor"));
    assert_eq!(
        serde_json::to_value(RegistrationStatus::Cancelled).unwrap(),
        json!("cancelled")
    );
    assert_eq!(Role::default(), Role::Participant);
}

#[test]
fn test_workshop_details_uses_registrations_key() {
    let details = WorkshopDetails {
        registration_count: 4,
        ..Default::default()
    };
    let value = serde_json::to_value(&details).unwrap();
    assert_eq!(value["registrations"], 4);
    assert!(value["workshop"].is_object());
}

#[test]
fn test_registration_activity() {
    let mut registration = Registration::default();
    assert!(registration.is_active());
    registration.status = RegistrationStatus::Cancelled;
    assert!(!registration.is_active());
}

#[test]
fn test_user_json_never_carries_a_credential() {
    let credentials = UserCredentials {
        user: User {
            email: "ada@example.com".to_string(),
            ..Default::default()
        },
        password_hash: "$argon2id$secret".to_string(),
    };
    let value = serde_json::to_value(&credentials.user).unwrap();
    assert!(value.get("password_hash").is_none());
    assert_eq!(value["email"], "ada@example.com");
}
