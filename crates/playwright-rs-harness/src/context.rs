// Role-scoped browser contexts
//
// A `Harness` owns one Playwright connection and one browser for a test.
// Every session it hands out lives in its own browser context, so sessions of
// different roles never share cookies or storage.

use futures_util::future::try_join_all;
use playwright_rs::api::LaunchOptions;
use playwright_rs::protocol::{Browser, BrowserContext, BrowserContextOptions, Page, Playwright};

use crate::auth::LoginFlow;
use crate::config::{BrowserKind, HarnessConfig};
use crate::credentials::{CredentialResolver, Role};
use crate::error::{Error, Result};
use crate::state_store::SessionStore;

/// Playwright, a launched browser, and the configuration of the run.
pub struct Harness {
    config: HarnessConfig,
    store: SessionStore,
    _playwright: Playwright,
    browser: Browser,
}

/// An isolated, possibly authenticated, browsing session.
pub struct RoleSession {
    /// `None` for anonymous sessions
    pub role: Option<Role>,
    pub context: BrowserContext,
    pub page: Page,
}

impl RoleSession {
    pub async fn close(self) -> Result<()> {
        self.context.close().await?;
        Ok(())
    }
}

impl Harness {
    /// Starts Playwright and launches the configured browser.
    pub async fn launch(config: HarnessConfig) -> Result<Self> {
        let playwright = Playwright::launch().await?;
        let mut options = LaunchOptions::new().headless(config.headless);
        if let Some(slow_mo) = config.slow_mo {
            options = options.slow_mo(slow_mo.as_millis() as f64);
        }
        let browser_type = match config.browser {
            BrowserKind::Chromium => playwright.chromium(),
            BrowserKind::Firefox => playwright.firefox(),
            BrowserKind::Webkit => playwright.webkit(),
        };
        let browser = browser_type.launch_with_options(options).await?;
        tracing::debug!(
            browser = config.browser.as_str(),
            headless = config.headless,
            base_url = %config.base_url,
            "harness launched"
        );

        Ok(Self {
            store: SessionStore::new(&config.state_dir),
            config,
            _playwright: playwright,
            browser,
        })
    }

    /// Reads [`HarnessConfig`] from the environment and launches.
    pub async fn from_env() -> Result<Self> {
        Self::launch(HarnessConfig::from_env()?).await
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    fn context_options(&self) -> BrowserContextOptions {
        BrowserContextOptions::builder()
            .base_url(self.config.base_url.to_string())
            .build()
    }

    /// A fresh session restored from the persisted state of `role`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSession`] when the setup phase has not been run
    /// for `role`; there is no fallback to an anonymous context.
    pub async fn session(&self, role: Role) -> Result<RoleSession> {
        let state = self.store.load(role).await?;
        let mut options = self.context_options();
        options.storage_state = Some(state);
        let context = self.browser.new_context_with_options(options).await?;
        let page = context.new_page().await?;
        tracing::debug!(%role, "restored role session");
        Ok(RoleSession {
            role: Some(role),
            context,
            page,
        })
    }

    /// Sessions for several roles, built concurrently, each fully isolated.
    ///
    /// Every session file is checked before any context is created, so a
    /// missing file fails the call without leaving contexts behind.
    pub async fn sessions(&self, roles: &[Role]) -> Result<Vec<RoleSession>> {
        if let Some(role) = roles.iter().find(|role| !self.store.exists(**role)) {
            return Err(Error::MissingSession {
                role: *role,
                path: self.store.path_for(*role),
            });
        }
        try_join_all(roles.iter().map(|role| self.session(*role))).await
    }

    /// A session without any persisted state.
    pub async fn anonymous(&self) -> Result<RoleSession> {
        let context = self
            .browser
            .new_context_with_options(self.context_options())
            .await?;
        let page = context.new_page().await?;
        Ok(RoleSession {
            role: None,
            context,
            page,
        })
    }

    /// Setup phase for one role: resolve credentials, log in through the
    /// browser, persist the resulting storage state.
    ///
    /// Credentials are resolved before the browser is touched.
    pub async fn setup_role(
        &self,
        resolver: &CredentialResolver,
        flow: &LoginFlow,
        role: Role,
    ) -> Result<std::path::PathBuf> {
        let credentials = resolver.resolve(role)?;
        let session = self.anonymous().await?;
        let outcome = async {
            flow.authenticate(&session.page, &self.config, &credentials)
                .await?;
            self.store.capture(&session.context, role).await
        }
        .await;
        finish_session(outcome, session.close().await, role)
    }

    /// Checks that the persisted session of `role` still grants a signed-in
    /// view of `landing` (for example `/dashboard`).
    pub async fn verify_role(&self, flow: &LoginFlow, role: Role, landing: &str) -> Result<()> {
        let session = self.session(role).await?;
        let outcome = async {
            session.page.goto(&self.config.url(landing)?, None).await?;
            match flow.visible_signed_out_marker(&session.page).await? {
                Some(marker) => Err(Error::Assertion(format!(
                    "session for {} shows '{}' on {}; re-run setup",
                    role, marker, landing
                ))),
                None => Ok(()),
            }
        }
        .await;
        finish_session(outcome, session.close().await, role)
    }

    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}

/// Returns the outcome of the work done in a session; a failure to close the
/// session afterwards is only logged.
fn finish_session<T>(outcome: Result<T>, closed: Result<()>, role: Role) -> Result<T> {
    if let Err(e) = closed {
        tracing::warn!(%role, error = %e, "failed to close session");
    }
    outcome
}
