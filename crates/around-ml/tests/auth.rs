//! Integration tests for the token providers.
//!
//! Uses wiremock for the OAuth2 token endpoint and the metadata server.

use around_ml::ErrorKind;
use around_ml::auth::{
    AuthorizedUserKey, AuthorizedUserProvider, CLOUD_PLATFORM_SCOPE, CredentialsFile,
    MetadataServerProvider, ServiceAccountProvider, TokenProvider,
};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_RESPONSE: &str =
    r#"{"access_token":"ya29.test","expires_in":3599,"token_type":"Bearer"}"#;

fn authorized_user_key(mock_server: &MockServer) -> AuthorizedUserKey {
    AuthorizedUserKey {
        client_id: "client-id".to_owned(),
        client_secret: "client-secret".to_owned(),
        refresh_token: "refresh-token".to_owned(),
        token_uri: format!("{}/token", mock_server.uri()),
    }
}

#[tokio::test]
async fn test_metadata_server_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(
            "/computeMetadata/v1/instance/service-accounts/default/token",
        ))
        .and(header("metadata-flavor", "Google"))
        .and(query_param("scopes", CLOUD_PLATFORM_SCOPE))
        .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = MetadataServerProvider::new(&mock_server.uri()).unwrap();
    let token = provider
        .access_token(CLOUD_PLATFORM_SCOPE)
        .await
        .expect("token request failed");

    assert_eq!(token.secret(), "ya29.test");
    assert!(token.expires_at().is_some());
}

#[tokio::test]
async fn test_metadata_server_error_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("service account not found"))
        .mount(&mock_server)
        .await;

    let provider = MetadataServerProvider::new(&mock_server.uri()).unwrap();
    let error = provider
        .access_token(CLOUD_PLATFORM_SCOPE)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::AuthError);
    assert!(error.to_string().contains("service account not found"));
}

#[tokio::test]
async fn test_authorized_user_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-token"))
        .and(body_string_contains("client_id=client-id"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = AuthorizedUserProvider::new(authorized_user_key(&mock_server));
    let token = provider
        .access_token(CLOUD_PLATFORM_SCOPE)
        .await
        .expect("token request failed");

    assert_eq!(token.secret(), "ya29.test");
}

#[tokio::test]
async fn test_authorized_user_does_not_send_scope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = AuthorizedUserProvider::new(authorized_user_key(&mock_server));
    let token = provider
        .access_token("https://www.googleapis.com/auth/cloud-platform.read-only")
        .await
        .expect("token request failed");
    assert_eq!(token.secret(), "ya29.test");

    let requests = mock_server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(!body.contains("scope"));
}

#[tokio::test]
async fn test_authorized_user_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"error":"invalid_grant","error_description":"Bad Request"}"#),
        )
        .mount(&mock_server)
        .await;

    let provider = AuthorizedUserProvider::new(authorized_user_key(&mock_server));
    let error = provider
        .access_token(CLOUD_PLATFORM_SCOPE)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::AuthError);
    assert!(error.to_string().contains("invalid_grant"));
}

#[tokio::test]
async fn test_service_account_jwt_exchange() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion=ey"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TOKEN_RESPONSE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let json = include_bytes!("fixtures/service_account.json");
    let CredentialsFile::ServiceAccount(mut key) = CredentialsFile::from_json(json).unwrap() else {
        panic!("Expected service account credentials");
    };
    key.token_uri = format!("{}/token", mock_server.uri());

    let provider = ServiceAccountProvider::new(key).expect("invalid key");
    assert_eq!(
        provider.client_email(),
        "ml-test@around-faceml.iam.gserviceaccount.com"
    );

    let token = provider
        .access_token(CLOUD_PLATFORM_SCOPE)
        .await
        .expect("token request failed");

    assert_eq!(token.secret(), "ya29.test");
}

#[tokio::test]
async fn test_token_response_without_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&mock_server)
        .await;

    let provider = AuthorizedUserProvider::new(authorized_user_key(&mock_server));
    let error = provider
        .access_token(CLOUD_PLATFORM_SCOPE)
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::AuthError);
}
