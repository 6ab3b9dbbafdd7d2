// Integration tests for role-scoped contexts
//
// Tests cover:
// - A role without a session file fails, with no anonymous fallback
// - Two roles in one test do not share cookies
// - Anonymous sessions see the signed-out view
// - Direct API clients built from persisted sessions

mod common;

use common::Fixture;
use playwright_rs_harness::{ApiClient, Error, LoginFlow, Navigator, Role};

#[tokio::test]
async fn test_missing_session_is_an_error() {
    let fixture = Fixture::with_sessions(&[Role::Owner]).await;

    let err = fixture.harness.session(Role::Viewer).await.err().unwrap();
    match &err {
        Error::MissingSession { role, path } => {
            assert_eq!(*role, Role::Viewer);
            assert!(path.ends_with("viewer.json"));
        }
        other => panic!("expected MissingSession, got {}", other),
    }
    assert!(err.to_string().contains("cargo xtask setup-auth --role viewer"));

    // One missing file fails the whole group.
    let err = fixture
        .harness
        .sessions(&[Role::Owner, Role::Viewer])
        .await
        .err()
        .unwrap();
    assert!(err.is_config());

    fixture.finish().await;
}

#[tokio::test]
async fn test_two_roles_stay_isolated() {
    let fixture = Fixture::with_sessions(&[Role::Owner, Role::Editor]).await;
    let sessions = fixture
        .harness
        .sessions(&[Role::Owner, Role::Editor])
        .await
        .expect("Failed to open sessions");
    assert_eq!(sessions.len(), 2);

    for session in &sessions {
        let role = session.role.expect("Session has no role");
        Navigator::new(&session.page, fixture.harness.config())
            .home()
            .await
            .expect("Home never loaded");
        let welcome = session
            .page
            .locator("#welcome")
            .await
            .inner_text()
            .await
            .expect("No welcome text");
        assert!(welcome.contains(common::user(role).email));
    }

    let owner_state = sessions[0].context.storage_state().await.unwrap();
    let editor_state = sessions[1].context.storage_state().await.unwrap();
    let token = |state: &playwright_rs_harness::playwright_rs::protocol::StorageState| {
        state
            .cookies
            .iter()
            .find(|c| c.name == "session")
            .map(|c| c.value.clone())
    };
    assert!(token(&owner_state).is_some());
    assert_ne!(token(&owner_state), token(&editor_state));

    for session in sessions {
        session.close().await.expect("Failed to close session");
    }
    fixture.finish().await;
}

#[tokio::test]
async fn test_anonymous_session_is_signed_out() {
    let fixture = Fixture::start().await;
    let session = fixture.harness.anonymous().await.expect("No anonymous session");
    assert!(session.role.is_none());

    session
        .page
        .goto(&fixture.harness.config().url("/dashboard").unwrap(), None)
        .await
        .expect("Failed to navigate");
    Navigator::new(&session.page, fixture.harness.config())
        .wait_for_path("/login")
        .await
        .expect("Anonymous visitor was not sent to login");

    let marker = LoginFlow::default()
        .visible_signed_out_marker(&session.page)
        .await
        .expect("Session check failed");
    assert_eq!(marker.as_deref(), Some("Sign in"));

    session.close().await.expect("Failed to close session");
    fixture.finish().await;
}

#[tokio::test]
async fn test_api_client_carries_the_role_cookie() {
    let fixture = Fixture::with_sessions(&[Role::Owner, Role::Viewer]).await;
    let config = fixture.harness.config();
    let store = fixture.harness.store();

    let owner = ApiClient::for_role(config, store, Role::Owner).await.unwrap();
    let viewer = ApiClient::for_role(config, store, Role::Viewer).await.unwrap();
    assert_eq!(owner.me().await.unwrap().id, test_server::OWNER.id);
    assert_eq!(viewer.me().await.unwrap().email, test_server::VIEWER.email);

    let err = ApiClient::for_role(config, store, Role::Admin).await.unwrap_err();
    assert!(matches!(err, Error::MissingSession { .. }));

    fixture.finish().await;
}
