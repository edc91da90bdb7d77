use super::*;

#[test]
fn classify_403_is_forbidden() {
    let err = classify_status(403, "no".to_owned());
    assert_eq!(err, ApiError::Forbidden { detail: "no".to_owned() });
    assert_eq!(err.class(), ErrorClass::InsufficientPermission);
}

#[test]
fn classify_5xx_is_server_failure() {
    for status in [500_u16, 502, 503, 599] {
        let err = classify_status(status, String::new());
        assert!(matches!(err, ApiError::Server { status: s, .. } if s == status));
        assert_eq!(err.class(), ErrorClass::NetworkOrServerFailure);
    }
}

#[test]
fn classify_other_4xx_passes_through_as_rejected() {
    for status in [400_u16, 401, 404, 409, 422] {
        let err = classify_status(status, "d".to_owned());
        assert_eq!(err, ApiError::Rejected { status, detail: "d".to_owned() });
    }
}

#[test]
fn session_expired_reports_401() {
    assert_eq!(ApiError::SessionExpired.status(), Some(401));
    assert_eq!(ApiError::SessionExpired.class(), ErrorClass::ExpiredOrInvalidSession);
}

#[test]
fn network_error_has_no_status() {
    let err = ApiError::Network("connection refused".to_owned());
    assert_eq!(err.status(), None);
    assert_eq!(err.class(), ErrorClass::NetworkOrServerFailure);
    assert_eq!(err.error_code(), "E_NETWORK");
}

#[test]
fn login_relabels_client_errors() {
    let err = ApiError::Rejected { status: 401, detail: "bad password".to_owned() }.into_login_error();
    assert_eq!(err, ApiError::InvalidCredentials { status: 401, detail: "bad password".to_owned() });
    assert_eq!(err.class(), ErrorClass::InvalidCredentials);
}

#[test]
fn login_keeps_server_and_network_errors() {
    let server = ApiError::Server { status: 500, detail: String::new() };
    assert_eq!(server.clone().into_login_error(), server);
    let network = ApiError::Network("timeout".to_owned());
    assert_eq!(network.clone().into_login_error(), network);
}

#[test]
fn client_side_errors_are_classed_client() {
    assert_eq!(ApiError::InvalidRequest("x".to_owned()).class(), ErrorClass::Client);
    assert_eq!(ApiError::HttpClientBuild("x".to_owned()).class(), ErrorClass::Client);
}

#[test]
fn display_includes_detail() {
    let err = ApiError::Forbidden { detail: "admins only".to_owned() };
    assert_eq!(err.to_string(), "insufficient permission: admins only");
}
