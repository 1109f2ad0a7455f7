use axum::http::StatusCode;
use wardmap::wardmap_auth::{
    create_access_token, create_password_reset_token, create_refresh_token,
    verify_password_reset_token, verify_refresh_token, verify_token,
};
use wardmap::wardmap_config::JwtConfig;

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        refresh_secret: "test_refresh_secret_key_for_testing".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 604800,
        reset_token_expiry: 600,
    }
}

#[test]
fn test_create_access_token_success() {
    let jwt_config = get_test_jwt_config();

    let token = create_access_token(1, "00001111", "Niel", "Marketing", &jwt_config).unwrap();

    assert!(!token.is_empty());
}

#[test]
fn test_verify_token_success() {
    let jwt_config = get_test_jwt_config();

    let token = create_access_token(12, "00001113", "Jonathan", "Quebral", &jwt_config).unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();

    assert_eq!(claims.sub, 12);
    assert_eq!(claims.employee_id, "00001113");
    assert_eq!(claims.first_name, "Jonathan");
    assert_eq!(claims.last_name, "Quebral");
}

#[test]
fn test_token_expiry_is_set() {
    let jwt_config = get_test_jwt_config();

    let token = create_access_token(1, "00001111", "Niel", "Marketing", &jwt_config).unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();

    assert!(claims.exp > claims.iat);
    assert_eq!(claims.exp - claims.iat, jwt_config.access_token_expiry as usize);
}

#[test]
fn test_verify_token_wrong_secret() {
    let jwt_config = get_test_jwt_config();
    let token = create_access_token(1, "00001111", "Niel", "Marketing", &jwt_config).unwrap();

    let wrong_jwt_config = JwtConfig {
        secret: "different_secret_key".to_string(),
        ..get_test_jwt_config()
    };

    let err = verify_token(&token, &wrong_jwt_config).unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
}

#[test]
fn test_verify_token_malformed() {
    let jwt_config = get_test_jwt_config();
    let malformed_tokens = [
        "",
        "invalid.token.here",
        "too.many.parts.here.extra",
        "!!!.invalid.chars",
        "header.payload.",
        ".payload.signature",
    ];

    for token in malformed_tokens {
        assert!(verify_token(token, &jwt_config).is_err());
    }
}

#[test]
fn test_refresh_token_uses_its_own_secret() {
    let jwt_config = get_test_jwt_config();

    let refresh = create_refresh_token(5, &jwt_config).unwrap();
    let claims = verify_refresh_token(&refresh, &jwt_config).unwrap();
    assert_eq!(claims.sub, 5);
    assert_eq!(claims.exp - claims.iat, jwt_config.refresh_token_expiry as usize);

    assert!(verify_token(&refresh, &jwt_config).is_err());

    let access = create_access_token(5, "00001111", "Niel", "Marketing", &jwt_config).unwrap();
    assert!(verify_refresh_token(&access, &jwt_config).is_err());
}

#[test]
fn test_reset_token_is_not_an_access_token() {
    let jwt_config = get_test_jwt_config();

    let reset = create_password_reset_token(9, &jwt_config).unwrap();
    let claims = verify_password_reset_token(&reset, &jwt_config).unwrap();
    assert_eq!(claims.sub, 9);
    assert_eq!(claims.exp - claims.iat, 600);

    let access = create_access_token(9, "00001111", "Niel", "Marketing", &jwt_config).unwrap();
    let err = verify_password_reset_token(&access, &jwt_config).unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
}

#[test]
fn test_different_users_get_different_tokens() {
    let jwt_config = get_test_jwt_config();

    let token1 = create_access_token(1, "00001111", "Niel", "Marketing", &jwt_config).unwrap();
    let token2 = create_access_token(2, "00001112", "Aldrin", "Gabrido", &jwt_config).unwrap();

    assert_ne!(token1, token2);
    assert_eq!(verify_token(&token1, &jwt_config).unwrap().sub, 1);
    assert_eq!(verify_token(&token2, &jwt_config).unwrap().sub, 2);
}
