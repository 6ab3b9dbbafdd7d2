// Session authenticator
//
// Drives the application's login page with a role's credentials. This step is
// never retried: every dependent suite assumes authentication is deterministic.

use std::time::Duration;

use playwright_rs::protocol::Page;
use url::Url;

use crate::config::HarnessConfig;
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::locate::{Candidate, Finder, Target, locate};
use crate::wait::poll_until;

/// Description of the application's login page and what counts as success.
#[derive(Debug, Clone)]
pub struct LoginFlow {
    pub route: String,
    pub email: Target,
    pub password: Target,
    pub submit: Target,
    /// Path prefixes that mean the login went through
    pub destinations: Vec<String>,
    /// Texts only shown to signed-out visitors
    pub signed_out_markers: Vec<String>,
    pub timeout: Duration,
}

impl Default for LoginFlow {
    fn default() -> Self {
        Self {
            route: "/login".into(),
            email: Target::new("email input")
                .css("input[type=\"email\"]")
                .css("input[name=\"email\"]")
                .placeholder("Email")
                .aria_label("Email"),
            password: Target::new("password input")
                .css("input[type=\"password\"]")
                .css("input[name=\"password\"]")
                .aria_label("Password"),
            submit: Target::new("sign-in button")
                .css("button[type=\"submit\"]")
                .role("button", "Sign in")
                .role("button", "Log in"),
            destinations: vec!["/dashboard".into(), "/projects".into(), "/home".into()],
            signed_out_markers: vec!["Sign in".into(), "Log in".into()],
            timeout: Duration::from_secs(15),
        }
    }
}

impl LoginFlow {
    /// Default login page, bounded by the run's configured timeout
    /// (`E2E_TIMEOUT_MS`).
    pub fn for_config(config: &HarnessConfig) -> Self {
        Self::default().timeout(config.timeout)
    }

    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn destinations<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.destinations = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn signed_out_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.signed_out_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Logs `credentials` in on `page`.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] when the login form never renders, or when the
    ///   page never reaches an accepted destination (rejected credentials)
    /// - [`Error::Assertion`] when a signed-out marker is still visible after
    ///   the redirect (partial login)
    pub async fn authenticate(
        &self,
        page: &Page,
        config: &HarnessConfig,
        credentials: &Credentials,
    ) -> Result<()> {
        let role = credentials.role;
        let login_url = config.url(&self.route)?;
        tracing::debug!(%role, url = %login_url, "opening login page");
        page.goto(&login_url, None).await?;

        let email = locate(page, &self.email, self.timeout)
            .await
            .map_err(|e| e.context(format!("login form never rendered at {}", login_url)))?;
        let password = locate(page, &self.password, self.timeout)
            .await
            .map_err(|e| e.context(format!("login form never rendered at {}", login_url)))?;

        email.handle.fill(&credentials.email, None).await?;
        password.handle.fill(credentials.password(), None).await?;

        let submit = locate(page, &self.submit, self.timeout).await?;
        submit.handle.click(None).await?;

        let what = format!(
            "{} to leave {} for one of {:?}",
            role, self.route, self.destinations
        );
        let landed = poll_until(&what, self.timeout, || async move {
            Ok(self.accepted_destination(&page.url()))
        })
        .await
        .map_err(|e| e.context(format!("login as {} did not complete", role)))?;

        if let Some(marker) = self.visible_signed_out_marker(page).await? {
            return Err(Error::Assertion(format!(
                "logged in as {} and landed on {}, but '{}' is still shown",
                role, landed, marker
            )));
        }

        tracing::info!(%role, destination = %landed, "authenticated");
        Ok(())
    }

    /// Returns the first signed-out marker visible on `page`, if any.
    pub async fn visible_signed_out_marker<P: Finder + ?Sized>(
        &self,
        finder: &P,
    ) -> Result<Option<String>> {
        for marker in &self.signed_out_markers {
            let selector = Candidate::ExactText(marker.clone()).selector();
            if finder.first_visible(&selector).await?.is_some() {
                return Ok(Some(marker.clone()));
            }
        }
        Ok(None)
    }

    /// The path of `url` when it starts with an accepted destination.
    fn accepted_destination(&self, url: &str) -> Option<String> {
        let path = Url::parse(url).ok()?.path().to_string();
        self.destinations
            .iter()
            .any(|prefix| path_has_prefix(&path, prefix))
            .then_some(path)
    }
}

/// `/projects/42` has prefix `/projects`; `/projectsx` does not.
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return path == "/";
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}
