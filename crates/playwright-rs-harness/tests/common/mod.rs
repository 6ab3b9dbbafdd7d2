// Shared fixtures for the integration tests
//
// Every test gets its own test server, its own session directory and its own
// browser, so nothing persisted by one test is visible to another.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use playwright_rs_harness::{CredentialResolver, Harness, HarnessConfig, LoginFlow, Role};
use tempfile::TempDir;

use crate::test_server::{ADMIN, EDITOR, OWNER, TestServer, User, VIEWER};

/// Upper bound for waits in these tests; the fake application answers locally
pub const WAIT: Duration = Duration::from_secs(10);

pub fn init_tracing() {
    playwright_rs_harness::init_tracing();
}

pub fn user(role: Role) -> &'static User {
    match role {
        Role::Owner => &OWNER,
        Role::Editor => &EDITOR,
        Role::Viewer => &VIEWER,
        Role::Admin => &ADMIN,
    }
}

/// Credential variables for `roles`, as the setup phase would read them.
pub fn credential_env(roles: &[Role]) -> HashMap<String, String> {
    let mut env = HashMap::new();
    for role in roles {
        let user = user(*role);
        env.insert(role.email_var(), user.email.to_string());
        env.insert(role.password_var(), user.password.to_string());
    }
    env
}

pub fn resolver(roles: &[Role]) -> CredentialResolver {
    CredentialResolver::with_source(credential_env(roles))
}

pub struct Fixture {
    pub server: TestServer,
    pub harness: Harness,
    pub dir: TempDir,
}

impl Fixture {
    /// Test server plus a launched harness with an empty session directory.
    pub async fn start() -> Self {
        init_tracing();
        let server = TestServer::start().await;
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = HarnessConfig::for_base_url(&server.url())
            .expect("Invalid test server URL")
            .with_state_dir(dir.path().join(".auth"))
            .with_results_dir(dir.path().join("test-results"))
            .with_timeout(WAIT);
        let harness = Harness::launch(config)
            .await
            .expect("Failed to launch harness");
        Fixture {
            server,
            harness,
            dir,
        }
    }

    /// Same as [`Fixture::start`], with the setup phase already run for
    /// `roles`.
    pub async fn with_sessions(roles: &[Role]) -> Self {
        let fixture = Self::start().await;
        let resolver = resolver(roles);
        let flow = LoginFlow::for_config(fixture.harness.config());
        for role in roles {
            fixture
                .harness
                .setup_role(&resolver, &flow, *role)
                .await
                .expect("Setup phase failed");
        }
        fixture
    }

    pub async fn finish(self) {
        self.harness.close().await.expect("Failed to close harness");
        self.server.shutdown();
    }
}
