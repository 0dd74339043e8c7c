use super::*;

#[test]
fn unauthorized_and_forbidden_map_to_auth() {
    let err = ClientError::from_status("login", StatusCode::UNAUTHORIZED);
    assert!(matches!(err, ClientError::Auth { action: "login", status: 401 }));

    let err = ClientError::from_status("fetch users", StatusCode::FORBIDDEN);
    assert!(matches!(err, ClientError::Auth { action: "fetch users", status: 403 }));
}

#[test]
fn not_found_maps_to_not_found() {
    let err = ClientError::from_status("fetch conversation", StatusCode::NOT_FOUND);
    assert!(matches!(
        err,
        ClientError::NotFound { action: "fetch conversation", status: 404 }
    ));
}

#[test]
fn other_statuses_map_to_unexpected_status() {
    let err = ClientError::from_status("register", StatusCode::BAD_REQUEST);
    assert!(matches!(
        err,
        ClientError::UnexpectedStatus { action: "register", status: 400 }
    ));

    let err = ClientError::from_status("send message", StatusCode::INTERNAL_SERVER_ERROR);
    assert!(matches!(
        err,
        ClientError::UnexpectedStatus { action: "send message", status: 500 }
    ));
}

#[test]
fn action_accessor_reports_http_variants() {
    let err = ClientError::from_status("login", StatusCode::UNAUTHORIZED);
    assert_eq!(err.action(), Some("login"));

    assert_eq!(ClientError::MissingUserId.action(), None);
    assert_eq!(ClientError::InvalidBaseUrl("ftp://x".to_owned()).action(), None);
}

#[test]
fn status_accessor_reports_http_variants() {
    assert_eq!(
        ClientError::from_status("login", StatusCode::UNAUTHORIZED).status(),
        Some(401)
    );
    assert_eq!(
        ClientError::from_status("x", StatusCode::BAD_GATEWAY).status(),
        Some(502)
    );
    assert_eq!(ClientError::MissingUserId.status(), None);
}

#[test]
fn display_names_the_failed_action() {
    let err = ClientError::from_status("fetch messages", StatusCode::NOT_FOUND);
    let rendered = err.to_string();
    assert!(rendered.contains("fetch messages"), "got {rendered:?}");
    assert!(rendered.contains("404"), "got {rendered:?}");
}

#[test]
fn decode_error_display_carries_serde_detail() {
    let source = serde_json::from_str::<crate::types::User>("not json").expect_err("must fail");
    let err = ClientError::Decode { action: "fetch current user", source };
    let rendered = err.to_string();
    assert!(rendered.starts_with("fetch current user"), "got {rendered:?}");
}
