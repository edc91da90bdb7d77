use super::*;
use serde_json::json;

fn backend_user_json() -> serde_json::Value {
    json!({
        "id": 1,
        "company_id": 7,
        "name": "Hanako",
        "email": "hanako@example.com",
        "role": "staff",
        "position": null,
        "created_at": "2024-04-01T09:00:00",
        "updated_at": "2024-04-01T09:00:00"
    })
}

// =============================================================================
// Role
// =============================================================================

#[test]
fn role_parses_case_insensitively() {
    assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
    assert_eq!(" manager ".parse::<Role>().unwrap(), Role::Manager);
    assert_eq!("STAFF".parse::<Role>().unwrap(), Role::Staff);
}

#[test]
fn role_rejects_unknown() {
    assert_eq!("owner".parse::<Role>(), Err(UnknownRole("owner".to_owned())));
}

#[test]
fn role_serializes_lowercase() {
    assert_eq!(serde_json::to_value(Role::Manager).unwrap(), json!("manager"));
    assert_eq!(Role::Admin.to_string(), "admin");
}

#[test]
fn role_capabilities() {
    assert!(Role::Admin.can_manage_users());
    assert!(Role::Manager.can_manage_branches());
    assert!(!Role::Staff.can_manage_users());
    assert!(!Role::Staff.can_manage_branches());
}

#[test]
fn only_admin_assigns_admin() {
    assert!(Role::Admin.can_assign(Role::Admin));
    assert!(!Role::Manager.can_assign(Role::Admin));
    assert!(Role::Manager.can_assign(Role::Staff));
    assert!(!Role::Staff.can_assign(Role::Staff));
}

// =============================================================================
// UserProfile / LoginResponse
// =============================================================================

#[test]
fn user_profile_defaults_missing_fields() {
    let user: UserProfile = serde_json::from_value(backend_user_json()).unwrap();
    assert_eq!(user.id, 1);
    assert_eq!(user.role, Role::Staff);
    assert!(user.is_active);
    assert_eq!(user.branch_id, None);
    assert_eq!(user.position, None);
}

#[test]
fn user_profile_rejects_role_outside_closed_set() {
    let mut raw = backend_user_json();
    raw["role"] = json!("superuser");
    assert!(serde_json::from_value::<UserProfile>(raw).is_err());
}

#[test]
fn login_response_parses_backend_shape() {
    let raw = json!({ "access_token": "abc", "token_type": "bearer", "user": backend_user_json() });
    let resp: LoginResponse = serde_json::from_value(raw).unwrap();
    let credential = Credential::from(resp);
    assert_eq!(credential.token, "abc");
    assert_eq!(credential.user.email, "hanako@example.com");
}

#[test]
fn login_response_token_type_defaults_to_bearer() {
    let raw = json!({ "access_token": "abc", "user": backend_user_json() });
    let resp: LoginResponse = serde_json::from_value(raw).unwrap();
    assert_eq!(resp.token_type, "bearer");
}

// =============================================================================
// Payloads
// =============================================================================

#[test]
fn branch_update_serializes_only_provided_fields() {
    let update = BranchUpdate { name: Some("Osaka".to_owned()), ..BranchUpdate::default() };
    assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "name": "Osaka" }));
}

#[test]
fn daily_report_defaults_missing_content_and_status() {
    let raw = json!({ "id": 3, "user_id": 1, "report_date": "2024-05-01" });
    let report: DailyReport = serde_json::from_value(raw).unwrap();
    assert_eq!(report.content, "");
    assert_eq!(report.status, ReportStatus::Draft);
}

#[test]
fn daily_report_create_carries_author() {
    let create = DailyReportCreate {
        user_id: 1,
        report_date: "2025-01-01".to_owned(),
        content: "x".to_owned(),
        customer_id: None,
        branch_id: None,
        status: None,
    };
    assert_eq!(
        serde_json::to_value(&create).unwrap(),
        json!({ "user_id": 1, "report_date": "2025-01-01", "content": "x" })
    );
}

#[test]
fn daily_report_ownership_follows_user_id() {
    let author: UserProfile = serde_json::from_value(backend_user_json()).unwrap();
    let mut report: DailyReport =
        serde_json::from_value(json!({ "id": 3, "user_id": 1, "report_date": "2024-05-01" })).unwrap();
    assert!(report.is_owned_by(&author));
    report.user_id = 2;
    assert!(!report.is_owned_by(&author));
}

#[test]
fn report_status_parses() {
    assert_eq!("Submitted".parse::<ReportStatus>().unwrap(), ReportStatus::Submitted);
    assert!("archived".parse::<ReportStatus>().is_err());
}

#[test]
fn report_query_builds_params_in_order() {
    let query = ReportQuery {
        user_id: Some(4),
        start_date: Some("2024-05-01".to_owned()),
        end_date: None,
        page: Pagination { skip: Some(0), limit: Some(50) },
    };
    assert_eq!(
        query.to_params(),
        vec![
            ("user_id", "4".to_owned()),
            ("start_date", "2024-05-01".to_owned()),
            ("skip", "0".to_owned()),
            ("limit", "50".to_owned()),
        ]
    );
}

#[test]
fn empty_pagination_has_no_params() {
    assert!(Pagination::default().to_params().is_empty());
}

// =============================================================================
// error_detail
// =============================================================================

#[test]
fn error_detail_reads_string_detail() {
    assert_eq!(error_detail(r#"{"detail":"Not authenticated"}"#), "Not authenticated");
}

#[test]
fn error_detail_joins_validation_messages() {
    let body = r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"},{"msg":"field required"}]}"#;
    assert_eq!(error_detail(body), "value is not a valid email address; field required");
}

#[test]
fn error_detail_falls_back_to_raw_body() {
    assert_eq!(error_detail("  Bad Gateway \n"), "Bad Gateway");
}
