// Failure artifacts

use std::path::{Path, PathBuf};

use playwright_rs::protocol::Page;

use crate::error::Result;

/// Writes screenshots under the results directory.
#[derive(Debug, Clone)]
pub struct Artifacts {
    dir: PathBuf,
}

impl Artifacts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a screenshot for `test_name` is written to.
    pub fn screenshot_path(&self, test_name: &str) -> PathBuf {
        self.dir.join(format!("{}.png", sanitize(test_name)))
    }

    /// Captures `page` as `<results>/<test_name>.png`.
    pub async fn screenshot(&self, page: &Page, test_name: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.screenshot_path(test_name);
        page.screenshot_to_file(&path, None).await?;
        tracing::info!(path = %path.display(), "saved screenshot");
        Ok(path)
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() { "unnamed".into() } else { cleaned }
}
