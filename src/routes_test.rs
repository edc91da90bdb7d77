use super::*;
use crate::net::types::UserProfile;

fn signed_in(role: Role) -> SessionState {
    SessionState {
        user: Some(UserProfile {
            id: 1,
            company_id: 1,
            name: "Tanaka".to_owned(),
            email: "tanaka@example.com".to_owned(),
            role,
            position: None,
            branch_id: None,
            department_id: None,
            is_active: true,
            created_at: None,
            updated_at: None,
        }),
        loading: false,
    }
}

// =========================================================================
// Route
// =========================================================================

#[test]
fn paths_parse_back_to_routes() {
    for route in Route::ALL {
        assert_eq!(Route::parse(route.path()), Some(route));
    }
}

#[test]
fn parse_tolerates_trailing_slash() {
    assert_eq!(Route::parse("/users/"), Some(Route::Users));
    assert_eq!(Route::parse("/"), Some(Route::Dashboard));
}

#[test]
fn parse_unknown_path_is_none() {
    assert_eq!(Route::parse("/settings"), None);
    assert_eq!(Route::parse(""), None);
    assert_eq!(Route::parse("/users/42"), None);
}

#[test]
fn only_login_is_public() {
    assert_eq!(Route::Login.guard(), Guard::PublicOnly);
    for route in [Route::Dashboard, Route::Reports, Route::Users, Route::Branches] {
        assert_eq!(route.guard(), Guard::Protected);
    }
}

#[test]
fn management_routes_hidden_from_staff() {
    assert!(!Route::Users.visible_to(Role::Staff));
    assert!(!Route::Branches.visible_to(Role::Staff));
    assert!(Route::Users.visible_to(Role::Manager));
    assert!(Route::Branches.visible_to(Role::Manager));
    assert!(Route::Branches.visible_to(Role::Admin));
    assert!(Route::Reports.visible_to(Role::Staff));
    assert!(Route::Dashboard.visible_to(Role::Staff));
}

// =========================================================================
// evaluate / resolve
// =========================================================================

#[test]
fn both_guards_wait_while_loading() {
    let state = SessionState::initializing();
    assert_eq!(resolve(Route::Users, &state), GuardOutcome::Wait);
    assert_eq!(resolve(Route::Login, &state), GuardOutcome::Wait);
}

#[test]
fn cached_profile_during_verification_still_waits() {
    let mut state = signed_in(Role::Staff);
    state.loading = true;
    assert_eq!(resolve(Route::Reports, &state), GuardOutcome::Wait);
}

#[test]
fn protected_route_redirects_signed_out_user_to_login() {
    let state = SessionState::signed_out();
    assert_eq!(resolve(Route::Users, &state), GuardOutcome::Redirect(Route::Login));
}

#[test]
fn login_redirects_signed_in_user_to_landing() {
    let state = signed_in(Role::Staff);
    assert_eq!(resolve(Route::Login, &state), GuardOutcome::Redirect(Route::Dashboard));
}

#[test]
fn renders_when_guard_is_satisfied() {
    assert_eq!(resolve(Route::Reports, &signed_in(Role::Staff)), GuardOutcome::Render(Route::Reports));
    assert_eq!(resolve(Route::Login, &SessionState::signed_out()), GuardOutcome::Render(Route::Login));
}

#[test]
fn resolve_path_reports_unknown_routes() {
    let state = signed_in(Role::Admin);
    assert_eq!(resolve_path("/branches", &state), Some(GuardOutcome::Render(Route::Branches)));
    assert_eq!(resolve_path("/nope", &state), None);
}
