// Network interception for failure scenarios

use playwright_rs::protocol::{FulfillOptions, Page};

use crate::error::Result;

/// Answers every request matching `glob` with `status` and a JSON error body.
///
/// Used to check how the UI reports a failing endpoint, e.g.
/// `fail_route(&page, "**/api/v1/projects/*/members", 500)`.
pub async fn fail_route(page: &Page, glob: &str, status: u16) -> Result<()> {
    let pattern = glob.to_string();
    page.route(glob, move |route| {
        let pattern = pattern.clone();
        async move {
            tracing::debug!(
                pattern = %pattern,
                url = %route.request().url(),
                status,
                "forcing failure"
            );
            let options = FulfillOptions::builder()
                .status(status)
                .content_type("application/json")
                .body_string(error_body(status))
                .build();
            route.fulfill(Some(options)).await
        }
    })
    .await?;
    Ok(())
}

fn error_body(status: u16) -> String {
    serde_json::json!({ "error": format!("forced HTTP {}", status) }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_is_json() {
        let body: serde_json::Value = serde_json::from_str(&error_body(500)).unwrap();
        assert_eq!(body["error"], "forced HTTP 500");
    }
}
