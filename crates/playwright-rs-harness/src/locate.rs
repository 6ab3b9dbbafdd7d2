// Resilient locator strategy
//
// UI markup drifts faster than suites are maintained, so a target is described
// by an ordered list of candidate selectors. Each polling round evaluates the
// candidates in order and stops at the first one with a visible match.
//
// Candidates are a tagged variant rather than raw strings so the
// precision/resilience trade-off of a target stays readable in one place.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use playwright_rs::protocol::{Locator, Page};

use crate::error::{Error, Result};
use crate::wait::poll_until;

/// Upper bound on how many matches of one selector are checked for visibility
const MAX_MATCHES_CHECKED: usize = 20;

/// One way of finding an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// Case-insensitive substring of the element's text
    Text(String),
    /// Whole, case-sensitive text of the element
    ExactText(String),
    /// `title` attribute
    Title(String),
    /// `aria-label` attribute
    AriaLabel(String),
    /// `data-testid` attribute
    TestId(String),
    /// ARIA role, optionally with an accessible name (case-insensitive
    /// substring)
    Role { role: String, name: Option<String> },
    /// ARIA role whose accessible name is exactly `name`
    ExactRole { role: String, name: String },
    /// `placeholder` attribute
    Placeholder(String),
    /// Any Playwright selector, passed through untouched
    Css(String),
}

impl Candidate {
    /// Renders the candidate as a Playwright selector.
    pub fn selector(&self) -> String {
        match self {
            Candidate::Text(text) => format!("text=/{}/i", regex::escape(text).replace('/', "\\/")),
            Candidate::ExactText(text) => format!("text={}", quote(text)),
            Candidate::Title(title) => format!("[title={}]", quote(title)),
            Candidate::AriaLabel(label) => format!("[aria-label={}]", quote(label)),
            Candidate::TestId(id) => format!("[data-testid={}]", quote(id)),
            Candidate::Role { role, name: None } => format!("role={}", role),
            Candidate::Role {
                role,
                name: Some(name),
            } => format!("role={}[name={}]", role, quote(name)),
            Candidate::ExactRole { role, name } => format!("role={}[name={}s]", role, quote(name)),
            Candidate::Placeholder(text) => format!("[placeholder={}]", quote(text)),
            Candidate::Css(selector) => selector.clone(),
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.selector())
    }
}

pub(crate) fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// A semantic UI element and the ordered candidates that may find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub description: String,
    pub candidates: Vec<Candidate>,
}

impl Target {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            candidates: Vec::new(),
        }
    }

    pub fn candidate(mut self, candidate: Candidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.candidate(Candidate::Text(text.into()))
    }

    pub fn exact_text(self, text: impl Into<String>) -> Self {
        self.candidate(Candidate::ExactText(text.into()))
    }

    /// Adds a `Text` candidate per synonym, in order.
    pub fn synonyms<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates
            .extend(words.into_iter().map(|w| Candidate::Text(w.into())));
        self
    }

    pub fn title(self, title: impl Into<String>) -> Self {
        self.candidate(Candidate::Title(title.into()))
    }

    pub fn aria_label(self, label: impl Into<String>) -> Self {
        self.candidate(Candidate::AriaLabel(label.into()))
    }

    pub fn test_id(self, id: impl Into<String>) -> Self {
        self.candidate(Candidate::TestId(id.into()))
    }

    pub fn role(self, role: impl Into<String>, name: impl Into<String>) -> Self {
        self.candidate(Candidate::Role {
            role: role.into(),
            name: Some(name.into()),
        })
    }

    /// Like [`Target::role`], but "All" does not match "Small" or
    /// "All connections".
    pub fn role_exact(self, role: impl Into<String>, name: impl Into<String>) -> Self {
        self.candidate(Candidate::ExactRole {
            role: role.into(),
            name: name.into(),
        })
    }

    pub fn placeholder(self, text: impl Into<String>) -> Self {
        self.candidate(Candidate::Placeholder(text.into()))
    }

    pub fn css(self, selector: impl Into<String>) -> Self {
        self.candidate(Candidate::Css(selector.into()))
    }
}

/// Answers whether a selector currently has a visible match.
///
/// Implemented for [`Page`]; the seam lets the strategy run against anything
/// that can resolve selectors.
#[async_trait]
pub trait Finder: Send + Sync {
    type Handle: Send;

    /// Returns the first visible element matching `selector`, if any.
    async fn first_visible(&self, selector: &str) -> Result<Option<Self::Handle>>;
}

#[async_trait]
impl Finder for Page {
    type Handle = Locator;

    async fn first_visible(&self, selector: &str) -> Result<Option<Locator>> {
        let locator = self.locator(selector).await;
        let count = locator.count().await?;
        for index in 0..count.min(MAX_MATCHES_CHECKED) {
            let nth = locator.nth(index as i32);
            if nth.is_visible().await? {
                return Ok(Some(nth));
            }
        }
        Ok(None)
    }
}

/// A successful match, with the candidate that produced it.
#[derive(Debug, Clone)]
pub struct Located<H> {
    pub handle: H,
    /// Position of the winning candidate in [`Target::candidates`]
    pub index: usize,
    pub candidate: Candidate,
}

/// Whether a missing element is a failure or a soft absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Absence is a hard failure ([`Error::Timeout`])
    Required,
    /// Absence depends on environment or data; the caller skips
    Optional,
}

/// Outcome of [`acquire`].
#[derive(Debug)]
pub enum Acquired<H> {
    Found(Located<H>),
    /// No candidate matched an optional target within the bound
    Absent { target: String },
}

impl<H> Acquired<H> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Acquired::Absent { .. })
    }

    pub fn found(self) -> Option<Located<H>> {
        match self {
            Acquired::Found(located) => Some(located),
            Acquired::Absent { .. } => None,
        }
    }
}

/// Finds the first candidate of `target` with a visible match.
///
/// Candidates after the first match are never evaluated.
///
/// # Errors
///
/// Returns [`Error::Config`] for a target without candidates and
/// [`Error::Timeout`] when nothing matched within `timeout`.
pub async fn locate<P: Finder + ?Sized>(
    finder: &P,
    target: &Target,
    timeout: Duration,
) -> Result<Located<P::Handle>> {
    if target.candidates.is_empty() {
        return Err(Error::Config(format!(
            "target '{}' has no candidate selectors",
            target.description
        )));
    }

    let what = format!(
        "'{}' ({} candidate selectors)",
        target.description,
        target.candidates.len()
    );
    poll_until(&what, timeout, || async move {
        for (index, candidate) in target.candidates.iter().enumerate() {
            let selector = candidate.selector();
            if let Some(handle) = finder.first_visible(&selector).await? {
                tracing::debug!(
                    element = %target.description,
                    index,
                    selector = %selector,
                    "resilient locator matched"
                );
                return Ok(Some(Located {
                    handle,
                    index,
                    candidate: candidate.clone(),
                }));
            }
        }
        Ok(None)
    })
    .await
}

/// Locates `target`, downgrading absence to [`Acquired::Absent`] when the
/// target is [`Presence::Optional`].
///
/// Only an expired wait is downgraded; every other error propagates.
pub async fn acquire<P: Finder + ?Sized>(
    finder: &P,
    target: &Target,
    presence: Presence,
    timeout: Duration,
) -> Result<Acquired<P::Handle>> {
    match locate(finder, target, timeout).await {
        Ok(located) => Ok(Acquired::Found(located)),
        Err(e) if presence == Presence::Optional && e.is_timeout() => {
            tracing::warn!(element = %target.description, "optional element not present");
            Ok(Acquired::Absent {
                target: target.description.clone(),
            })
        }
        Err(e) => Err(e),
    }
}

/// Unwraps an [`Acquired::Found`], or logs a skip and returns `Ok(())` from
/// the enclosing function.
///
/// ```ignore
/// let tool = found_or_skip!(acquire(&page, &highlight, Presence::Optional, wait).await?);
/// tool.handle.click(None).await?;
/// ```
#[macro_export]
macro_rules! found_or_skip {
    ($acquired:expr) => {
        match $acquired {
            $crate::Acquired::Found(located) => located,
            $crate::Acquired::Absent { target } => {
                $crate::__tracing::warn!("SKIPPED: '{}' is not present in this environment", target);
                return Ok(());
            }
        }
    };
}
