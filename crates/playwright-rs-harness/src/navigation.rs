// Navigation helpers
//
// Each helper is a fixed sequence of steps: open a route or click into a
// section, then wait for a landmark that proves the step completed. Fixed
// delays are only used through `NavStep::settle`, for animations without a
// reliable landmark.

use std::time::Duration;

use playwright_rs::protocol::{Locator, Page};

use crate::config::HarnessConfig;
use crate::error::Result;
use crate::locate::{Candidate, Target, locate, quote};
use crate::wait::poll_until;

/// A semantically stable element whose visibility marks a completed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Landmark {
    /// Heading (any level) whose accessible name is exactly this
    Heading(String),
    /// Element with this ARIA role, e.g. `tablist` or `dialog`
    Role(String),
    TestId(String),
    Css(String),
    Text(String),
    /// A `role=tab` with exactly this name and `aria-selected="true"`
    SelectedTab(String),
}

impl Landmark {
    fn target(&self) -> Target {
        let target = Target::new(self.describe());
        match self {
            Landmark::Heading(name) => target.role_exact("heading", name.clone()),
            Landmark::Role(role) => target.candidate(Candidate::Role {
                role: role.clone(),
                name: None,
            }),
            Landmark::TestId(id) => target.test_id(id.clone()),
            Landmark::Css(selector) => target.css(selector.clone()),
            Landmark::Text(text) => target.text(text.clone()),
            Landmark::SelectedTab(name) => {
                target.css(format!("role=tab[name={}s][selected=true]", quote(name)))
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            Landmark::Heading(name) => format!("heading '{}'", name),
            Landmark::Role(role) => format!("[role={}]", role),
            Landmark::TestId(id) => format!("test id '{}'", id),
            Landmark::Css(selector) => format!("'{}'", selector),
            Landmark::Text(text) => format!("text '{}'", text),
            Landmark::SelectedTab(name) => format!("selected tab '{}'", name),
        }
    }
}

/// What a step does before waiting for its landmark.
#[derive(Debug, Clone)]
pub enum NavAction {
    Goto(String),
    Click(Target),
}

#[derive(Debug, Clone)]
pub struct NavStep {
    pub action: NavAction,
    pub landmark: Landmark,
    /// Fixed delay after the landmark appears
    pub settle: Option<Duration>,
}

impl NavStep {
    pub fn goto(route: impl Into<String>, landmark: Landmark) -> Self {
        Self {
            action: NavAction::Goto(route.into()),
            landmark,
            settle: None,
        }
    }

    pub fn click(target: Target, landmark: Landmark) -> Self {
        Self {
            action: NavAction::Click(target),
            landmark,
            settle: None,
        }
    }

    pub fn settle(mut self, delay: Duration) -> Self {
        self.settle = Some(delay);
        self
    }
}

/// Runs navigation steps against one page.
pub struct Navigator<'a> {
    page: &'a Page,
    config: &'a HarnessConfig,
    timeout: Duration,
}

impl<'a> Navigator<'a> {
    pub fn new(page: &'a Page, config: &'a HarnessConfig) -> Self {
        Self {
            page,
            config,
            timeout: config.timeout,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Executes `steps` strictly in order.
    ///
    /// # Errors
    ///
    /// A landmark that never appears is a hard [`crate::Error::Timeout`]: the
    /// application is broken or the path changed.
    pub async fn run(&self, steps: &[NavStep]) -> Result<Locator> {
        let mut last = None;
        for step in steps {
            last = Some(self.step(step).await?);
        }
        match last {
            Some(landmark) => Ok(landmark),
            None => Err(crate::Error::Config("empty navigation path".into())),
        }
    }

    async fn step(&self, step: &NavStep) -> Result<Locator> {
        match &step.action {
            NavAction::Goto(route) => {
                let url = self.config.url(route)?;
                tracing::debug!(url = %url, "navigating");
                self.page.goto(&url, None).await?;
            }
            NavAction::Click(target) => {
                let located = locate(self.page, target, self.timeout).await?;
                tracing::debug!(element = %target.description, "clicking into section");
                located.handle.click(None).await?;
            }
        }
        let landmark = self.wait_for(&step.landmark).await?;
        if let Some(delay) = step.settle {
            tokio::time::sleep(delay).await;
        }
        Ok(landmark)
    }

    /// Waits until `landmark` is visible.
    pub async fn wait_for(&self, landmark: &Landmark) -> Result<Locator> {
        let located = locate(self.page, &landmark.target(), self.timeout)
            .await
            .map_err(|e| e.context(format!("landmark {} never appeared", landmark.describe())))?;
        Ok(located.handle)
    }

    /// Waits until the page URL path equals `path`.
    pub async fn wait_for_path(&self, path: &str) -> Result<()> {
        let page = self.page;
        poll_until(&format!("URL path {}", path), self.timeout, || async move {
            let current = url::Url::parse(&page.url()).ok();
            Ok(current.filter(|u| u.path() == path).map(|_| ()))
        })
        .await
    }

    /// Landing route of a signed-in user.
    pub async fn home(&self) -> Result<Locator> {
        self.run(&[NavStep::goto("/dashboard", Landmark::Role("main".into()))])
            .await
    }

    /// From anywhere: open `link` in the primary navigation and wait for
    /// `landmark`.
    pub async fn section(&self, link: &str, landmark: Landmark) -> Result<Locator> {
        let nav_link = Target::new(format!("navigation link '{}'", link))
            .css(format!("nav >> role=link[name={}]", quote(link)))
            .role("link", link)
            .role("button", link);
        self.run(&[NavStep::click(nav_link, landmark)]).await
    }

    /// Clicks the tab named `name` and waits until it is selected.
    pub async fn tab(&self, name: &str) -> Result<Locator> {
        let tab = Target::new(format!("tab '{}'", name))
            .role_exact("tab", name)
            .exact_text(name);
        self.run(&[NavStep::click(tab, Landmark::SelectedTab(name.to_string()))])
            .await
    }

    /// Connections page, on the given tab (`Pending`, `All`, ...).
    pub async fn connections(&self, tab: &str) -> Result<Locator> {
        self.run(&[NavStep::goto(
            "/connections",
            Landmark::Role("tablist".into()),
        )])
        .await?;
        self.tab(tab).await
    }

    /// Team-access panel of a project.
    pub async fn team_access(&self, project_id: &str) -> Result<Locator> {
        self.run(&[NavStep::goto(
            format!("/projects/{}/team", project_id),
            Landmark::Heading("Team access".into()),
        )])
        .await
    }

    /// Community admin panel, on the given tab (`Topics`, `Reports`, ...).
    pub async fn community_admin(&self, tab: &str) -> Result<Locator> {
        self.run(&[NavStep::goto(
            "/admin/community",
            Landmark::Heading("Community".into()),
        )])
        .await?;
        self.tab(tab).await
    }
}
