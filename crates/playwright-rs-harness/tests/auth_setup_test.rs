// Integration tests for the setup phase
//
// Tests cover:
// - Logging every role in and persisting one session file per role
// - Rejected credentials: bounded failure, nothing persisted
// - Missing credentials: configuration error before any navigation
// - Re-running setup overwrites the previous file

mod common;

use std::time::Duration;

use common::Fixture;
use playwright_rs_harness::{Error, LoginFlow, Role};

#[tokio::test]
async fn test_setup_persists_a_working_session_per_role() {
    let fixture = Fixture::start().await;
    let resolver = common::resolver(&Role::ALL);
    let flow = LoginFlow::default().timeout(common::WAIT);

    for role in Role::ALL {
        let path = fixture
            .harness
            .setup_role(&resolver, &flow, role)
            .await
            .expect("Setup failed");
        assert_eq!(path, fixture.harness.store().path_for(role));
        assert!(path.exists(), "{} session file not written", role);

        let state = fixture
            .harness
            .store()
            .load(role)
            .await
            .expect("Failed to load session");
        assert!(
            state.cookies.iter().any(|c| c.name == "session"),
            "{} session has no session cookie",
            role
        );
    }

    // A fresh context restored from each file lands signed in as that role.
    for role in Role::ALL {
        fixture
            .harness
            .verify_role(&flow, role, "/dashboard")
            .await
            .expect("Restored session is signed out");

        let session = fixture.harness.session(role).await.expect("No session");
        session
            .page
            .goto(&fixture.harness.config().url("/dashboard").unwrap(), None)
            .await
            .expect("Failed to navigate");
        let welcome = session
            .page
            .locator("#welcome")
            .await
            .text_content()
            .await
            .expect("Failed to read welcome text")
            .unwrap_or_default();
        assert!(
            welcome.contains(common::user(role).email),
            "{} landed as '{}'",
            role,
            welcome
        );
        session.close().await.expect("Failed to close session");
    }

    fixture.finish().await;
}

#[tokio::test]
async fn test_rejected_credentials_fail_without_persisting() {
    let fixture = Fixture::start().await;
    let mut env = common::credential_env(&[Role::Viewer]);
    env.insert(Role::Viewer.password_var(), "wrong-password".into());
    let resolver = playwright_rs_harness::CredentialResolver::with_source(env);
    let flow = LoginFlow::default().timeout(Duration::from_secs(2));

    let err = fixture
        .harness
        .setup_role(&resolver, &flow, Role::Viewer)
        .await
        .unwrap_err();

    assert!(err.is_timeout(), "expected a timeout, got {}", err);
    assert!(err.to_string().contains("login as viewer did not complete"));
    assert!(!fixture.harness.store().exists(Role::Viewer));

    fixture.finish().await;
}

#[tokio::test]
async fn test_missing_credentials_fail_before_navigation() {
    let fixture = Fixture::start().await;
    // Only the owner's variables are set.
    let resolver = common::resolver(&[Role::Owner]);

    let err = fixture
        .harness
        .setup_role(&resolver, &LoginFlow::default(), Role::Editor)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("E2E_EDITOR_EMAIL"));
    assert_eq!(fixture.server.login_page_hits(), 0);
    assert!(!fixture.harness.store().exists(Role::Editor));

    fixture.finish().await;
}

#[tokio::test]
async fn test_rerunning_setup_overwrites_the_session() {
    let fixture = Fixture::start().await;
    let resolver = common::resolver(&[Role::Owner]);
    let flow = LoginFlow::default().timeout(common::WAIT);
    let store = fixture.harness.store();

    fixture
        .harness
        .setup_role(&resolver, &flow, Role::Owner)
        .await
        .expect("First setup failed");
    let first = store.load(Role::Owner).await.expect("No first session");

    fixture
        .harness
        .setup_role(&resolver, &flow, Role::Owner)
        .await
        .expect("Second setup failed");
    let second = store.load(Role::Owner).await.expect("No second session");

    let token = |state: &playwright_rs_harness::playwright_rs::protocol::StorageState| {
        state
            .cookies
            .iter()
            .find(|c| c.name == "session")
            .map(|c| c.value.clone())
    };
    assert!(token(&first).is_some());
    assert_ne!(token(&first), token(&second));
    assert_eq!(fixture.server.login_page_hits(), 2);

    // No temp files are left next to the session.
    let leftovers: Vec<_> = std::fs::read_dir(store.dir())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);

    fixture.finish().await;
}
