// Toast assertions
//
// Most mutating actions of the application report their outcome through a
// transient notification rather than a page reload, so "a toast with this
// text appeared" is the standard completion check.

use std::time::Duration;

use playwright_rs::protocol::{Locator, Page};

use crate::error::{Error, Result};
use crate::locate::{Finder, quote};
use crate::wait::{poll_until, poll_with_interval};

/// Notification regions searched, in order.
#[derive(Debug, Clone)]
pub struct Toasts {
    regions: Vec<String>,
}

impl Default for Toasts {
    fn default() -> Self {
        Self::new([
            "[data-sonner-toast]",
            "[role=\"status\"]",
            "[role=\"alert\"]",
            ".toast",
        ])
    }
}

impl Toasts {
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
        }
    }

    fn selectors(&self, text: &str) -> Vec<String> {
        self.regions
            .iter()
            .map(|region| format!("{}:has-text({})", region, quote(text)))
            .collect()
    }

    /// Returns the first visible toast containing `text`, if one is shown now.
    pub async fn find<P: Finder + ?Sized>(&self, finder: &P, text: &str) -> Result<Option<P::Handle>> {
        for selector in self.selectors(text) {
            if let Some(handle) = finder.first_visible(&selector).await? {
                return Ok(Some(handle));
            }
        }
        Ok(None)
    }

    /// Waits up to `timeout` for a toast containing `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] naming the text when no toast appears, so a
    /// missing toast stays distinguishable from a failed assertion.
    pub async fn expect<P: Finder + ?Sized>(
        &self,
        finder: &P,
        text: &str,
        timeout: Duration,
    ) -> Result<P::Handle> {
        let what = format!("toast containing '{}'", text);
        let toast = poll_until(&what, timeout, || self.find(finder, text)).await?;
        tracing::debug!(text, "toast shown");
        Ok(toast)
    }

    /// Asserts that no toast containing `text` shows up during `window`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Assertion`] as soon as a matching toast is visible.
    pub async fn expect_none<P: Finder + ?Sized>(
        &self,
        finder: &P,
        text: &str,
        window: Duration,
    ) -> Result<()> {
        let what = format!("toast containing '{}'", text);
        let seen = poll_with_interval(&what, window, Duration::from_millis(100), || async move {
            Ok(self.find(finder, text).await?.map(|_| ()))
        })
        .await;
        match seen {
            Ok(()) => Err(Error::Assertion(format!(
                "unexpected toast containing '{}'",
                text
            ))),
            Err(Error::Timeout { .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Waits for a toast containing `text` in the default regions.
pub async fn expect_toast(page: &Page, text: &str, timeout: Duration) -> Result<Locator> {
    Toasts::default().expect(page, text, timeout).await
}

/// Fails if a toast containing `text` shows up in the default regions during
/// `window`.
pub async fn expect_no_toast(page: &Page, text: &str, window: Duration) -> Result<()> {
    Toasts::default().expect_none(page, text, window).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Showing(&'static str);

    #[async_trait]
    impl Finder for Showing {
        type Handle = String;

        async fn first_visible(&self, selector: &str) -> Result<Option<String>> {
            Ok((selector == self.0).then(|| selector.to_string()))
        }
    }

    #[test]
    fn test_selectors_scope_text_to_regions() {
        let toasts = Toasts::new(["[role=\"status\"]", ".toast"]);
        assert_eq!(
            toasts.selectors("Saved \"draft\""),
            vec![
                "[role=\"status\"]:has-text(\"Saved \\\"draft\\\"\")".to_string(),
                ".toast:has-text(\"Saved \\\"draft\\\"\")".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_toast_is_a_timeout() {
        let finder = Showing("[role=\"status\"]:has-text(\"Saved\")");
        let toasts = Toasts::default();

        let found = toasts
            .expect(&finder, "Saved", Duration::from_millis(50))
            .await
            .unwrap();
        assert_eq!(found, finder.0);

        let err = toasts
            .expect(&finder, "Member added", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("toast containing 'Member added'"));
    }

    #[tokio::test]
    async fn test_expect_none_fails_on_a_visible_toast() {
        let finder = Showing("[role=\"alert\"]:has-text(\"Failed\")");
        let toasts = Toasts::default();

        toasts
            .expect_none(&finder, "Member added", Duration::from_millis(50))
            .await
            .unwrap();
        let err = toasts
            .expect_none(&finder, "Failed", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Assertion(_)));
    }

    #[tokio::test]
    async fn test_find_searches_regions_in_order() {
        let toasts = Toasts::default();
        let finder = Showing("[role=\"alert\"]:has-text(\"Failed to add member\")");
        let found = toasts.find(&finder, "Failed to add member").await.unwrap();
        assert_eq!(found.as_deref(), Some(finder.0));
        assert!(toasts.find(&finder, "Member added").await.unwrap().is_none());
    }
}
