//! Integration tests for login and two-factor verification

mod common;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use std::path::PathBuf;

use avatar_fetcher::app::{
    AppContext, AuthHandler, LoginOutcome, PendingTwoFactor, ReleaseFilter, TwoFactorKind,
};
use avatar_fetcher::auth::Settings;
use avatar_fetcher::config::RuntimeConfig;
use avatar_fetcher::errors::AuthError;

use common::{api_path, avatar_page, client_config, mount_plain_login, user_json, BASIC_USER_PASS};

#[tokio::test]
async fn test_plain_login_establishes_session() {
    let server = MockServer::start().await;
    mount_plain_login(&server).await;

    let outcome = AuthHandler::login(&client_config(&server), "user", "pass")
        .await
        .unwrap();

    match outcome {
        LoginOutcome::Authenticated(session) => {
            assert_eq!(session.user().display_name, "Tester");
            assert_eq!(session.user().id, "usr_test");
            assert!(session.user().extra.contains_key("bio"));
        }
        LoginOutcome::TwoFactorRequired(_) => panic!("Expected a completed login"),
    }
}

#[tokio::test]
async fn test_session_cookie_sent_on_later_calls() {
    let server = MockServer::start().await;
    mount_plain_login(&server).await;

    Mock::given(method("GET"))
        .and(path(api_path("avatars")))
        .and(header("cookie", "auth=authcookie_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(avatar_page(0, 3)))
        .expect(1)
        .mount(&server)
        .await;

    let session = match AuthHandler::login(&client_config(&server), "user", "pass")
        .await
        .unwrap()
    {
        LoginOutcome::Authenticated(session) => session,
        LoginOutcome::TwoFactorRequired(_) => panic!("Expected a completed login"),
    };

    let page = session
        .client()
        .list_avatars_page(ReleaseFilter::All, 0, 100)
        .await
        .unwrap();
    assert_eq!(page.len(), 3);
}

#[tokio::test]
async fn test_wrong_password_reports_service_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("auth/user")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "\"Invalid Username/Email or Password\"", "status_code": 401}
        })))
        .mount(&server)
        .await;

    let err = AuthHandler::login(&client_config(&server), "user", "wrong")
        .await
        .unwrap_err();

    match err {
        AuthError::LoginFailed { reason } => {
            assert_eq!(reason, "Invalid Username/Email or Password")
        }
        other => panic!("Expected LoginFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_credentials_rejected_without_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = client_config(&server);
    assert!(matches!(
        AuthHandler::login(&config, "", "pass").await,
        Err(AuthError::InvalidUsername { .. })
    ));
    assert!(matches!(
        AuthHandler::login(&config, "user", "").await,
        Err(AuthError::InvalidUsername { .. })
    ));
}

#[tokio::test]
async fn test_email_two_factor_flow() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("auth/user")))
        .and(header("authorization", BASIC_USER_PASS))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "auth=authcookie_2; Path=/")
                .set_body_json(json!({"requiresTwoFactorAuth": ["emailOtp"]})),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(api_path("auth/twofactorauth/emailotp/verify")))
        .and(body_json(json!({"code": "123456"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "twoFactorAuth=tfa_1; Path=/")
                .set_body_json(json!({"verified": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api_path("auth/user")))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("Verified")))
        .with_priority(2)
        .mount(&server)
        .await;

    let pending = match AuthHandler::login(&client_config(&server), "user", "pass")
        .await
        .unwrap()
    {
        LoginOutcome::TwoFactorRequired(pending) => pending,
        LoginOutcome::Authenticated(_) => panic!("Expected a second-factor demand"),
    };
    assert_eq!(pending.kind(), TwoFactorKind::Email);

    let session = pending.verify("123 456").await.unwrap();
    assert_eq!(session.user().display_name, "Verified");
}

#[tokio::test]
async fn test_authenticator_two_factor_from_401_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("auth/user")))
        .and(header("authorization", BASIC_USER_PASS))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "2 Factor Authentication verification is required", "status_code": 401}
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(api_path("auth/twofactorauth/totp/verify")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verified": true})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(api_path("auth/user")))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json("Totp User")))
        .with_priority(2)
        .mount(&server)
        .await;

    let pending = match AuthHandler::login(&client_config(&server), "user", "pass")
        .await
        .unwrap()
    {
        LoginOutcome::TwoFactorRequired(pending) => pending,
        LoginOutcome::Authenticated(_) => panic!("Expected a second-factor demand"),
    };
    assert_eq!(pending.kind(), TwoFactorKind::Authenticator);

    let session = pending.verify("654321").await.unwrap();
    assert_eq!(session.user().display_name, "Totp User");
}

#[tokio::test]
async fn test_rejected_two_factor_code() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("auth/user")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"requiresTwoFactorAuth": ["totp", "otp"]})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(api_path("auth/twofactorauth/totp/verify")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Invalid 2FA code", "status_code": 400}
        })))
        .mount(&server)
        .await;

    let pending = match AuthHandler::login(&client_config(&server), "user", "pass")
        .await
        .unwrap()
    {
        LoginOutcome::TwoFactorRequired(pending) => pending,
        LoginOutcome::Authenticated(_) => panic!("Expected a second-factor demand"),
    };

    match pending.verify("000000").await {
        Err(AuthError::TwoFactorFailed { reason }) => assert_eq!(reason, "Invalid 2FA code"),
        other => panic!("Expected TwoFactorFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_short_code_rejected_before_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("auth/user")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"requiresTwoFactorAuth": ["emailOtp"]})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verified": true})))
        .expect(0)
        .mount(&server)
        .await;

    let pending = match AuthHandler::login(&client_config(&server), "user", "pass")
        .await
        .unwrap()
    {
        LoginOutcome::TwoFactorRequired(pending) => pending,
        LoginOutcome::Authenticated(_) => panic!("Expected a second-factor demand"),
    };

    assert!(matches!(
        pending.verify("12a4").await,
        Err(AuthError::InvalidTwoFactorCode { .. })
    ));
}

#[tokio::test]
async fn test_unexpected_status_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("auth/user")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    match AuthHandler::login(&client_config(&server), "user", "pass").await {
        Err(AuthError::Api { status, .. }) => assert_eq!(status, 503),
        other => panic!("Expected Api error, got {:?}", other.map(|_| ())),
    }
}

async fn pending_login(server: &MockServer) -> PendingTwoFactor {
    match AuthHandler::login(&client_config(server), "user", "pass")
        .await
        .unwrap()
    {
        LoginOutcome::TwoFactorRequired(pending) => pending,
        LoginOutcome::Authenticated(_) => panic!("Expected a second-factor demand"),
    }
}

/// Identity endpoint that keeps demanding an authenticator code, with a
/// verification endpoint that accepts any code
async fn mount_stuck_two_factor(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(api_path("auth/user")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"requiresTwoFactorAuth": ["totp"]})),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(api_path("auth/twofactorauth/totp/verify")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verified": true})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_unverified_code_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(api_path("auth/user")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"requiresTwoFactorAuth": ["emailOtp"]})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(api_path("auth/twofactorauth/emailotp/verify")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verified": false})))
        .expect(1)
        .mount(&server)
        .await;

    let pending = pending_login(&server).await;
    assert_eq!(pending.kind(), TwoFactorKind::Email);

    assert!(matches!(
        pending.verify("123456").await,
        Err(AuthError::TwoFactorFailed { .. })
    ));
}

#[tokio::test]
async fn test_identity_still_demanding_code_after_verify_fails() {
    let server = MockServer::start().await;
    mount_stuck_two_factor(&server).await;

    let pending = pending_login(&server).await;

    match pending.verify("123456").await {
        Err(AuthError::TwoFactorFailed { reason }) => {
            assert!(reason.contains("2 Factor Authentication"))
        }
        other => panic!("Expected TwoFactorFailed, got {:?}", other),
    }
}

fn context_for(server: &MockServer) -> AppContext {
    AppContext::new(
        RuntimeConfig {
            client: client_config(server),
            ..Default::default()
        },
        PathBuf::from("settings.toml"),
        Settings::default(),
    )
}

#[tokio::test]
async fn test_context_stays_logged_out_after_failed_two_factor() {
    let server = MockServer::start().await;
    mount_stuck_two_factor(&server).await;

    let mut ctx = context_for(&server);
    let kind = ctx.begin_login("user", "pass").await.unwrap();
    assert_eq!(kind, Some(TwoFactorKind::Authenticator));
    assert_eq!(
        ctx.auth_state().pending_kind(),
        Some(TwoFactorKind::Authenticator)
    );
    assert!(!ctx.auth_state().is_authenticated());

    assert!(matches!(
        ctx.submit_two_factor("123456").await,
        Err(AuthError::TwoFactorFailed { .. })
    ));
    assert!(!ctx.auth_state().is_authenticated());
    assert!(ctx.auth_state().pending_kind().is_none());
    assert!(matches!(ctx.session(), Err(AuthError::NotAuthenticated)));

    // The pending login was consumed; a new code needs a new login
    assert!(matches!(
        ctx.submit_two_factor("123456").await,
        Err(AuthError::NotAuthenticated)
    ));
}

#[tokio::test]
async fn test_context_login_without_second_factor() {
    let server = MockServer::start().await;
    mount_plain_login(&server).await;

    let mut ctx = context_for(&server);
    assert_eq!(ctx.begin_login("user", "pass").await.unwrap(), None);
    assert!(ctx.auth_state().is_authenticated());
    assert_eq!(ctx.user().unwrap().display_name, "Tester");
}
