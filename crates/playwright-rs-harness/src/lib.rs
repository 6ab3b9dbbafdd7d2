//! playwright-rs-harness: multi-role session fixtures for end-to-end suites
//!
//! This crate is the reusable layer between `playwright-rs` and the test files
//! of a web application's end-to-end suite:
//!
//! - a setup phase that logs each test role in once and persists the
//!   browser's storage state per role
//! - isolated, role-scoped browser contexts restored from those files
//! - a resilient locator strategy (ordered candidate selectors, soft absence)
//! - navigation helpers that wait on landmarks instead of fixed delays
//! - toast assertions, network failure injection, a direct API client for
//!   setup/teardown, failure screenshots and serial-suite locking
//!
//! # Examples
//!
//! ## Setup phase
//!
//! ```ignore
//! use playwright_rs_harness::{CredentialResolver, Harness, LoginFlow, Role};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let harness = Harness::from_env().await?;
//!     let resolver = CredentialResolver::from_env();
//!
//!     // Fails before touching the browser if E2E_OWNER_EMAIL/PASSWORD are unset
//!     harness.setup_role(&resolver, &LoginFlow::default(), Role::Owner).await?;
//!
//!     harness.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Two users in one test
//!
//! ```ignore
//! use playwright_rs_harness::{ApiClient, Harness, Navigator, Role, expect_toast};
//! use std::time::Duration;
//!
//! #[tokio::test]
//! async fn accept_connection() -> playwright_rs_harness::Result<()> {
//!     let harness = Harness::from_env().await?;
//!     let sessions = harness.sessions(&[Role::Owner, Role::Editor]).await?;
//!     let (owner, editor) = (&sessions[0], &sessions[1]);
//!
//!     let owner_api = ApiClient::for_role(harness.config(), harness.store(), Role::Owner).await?;
//!     let editor_api = ApiClient::for_role(harness.config(), harness.store(), Role::Editor).await?;
//!     let editor_id = editor_api.me().await?.id;
//!     owner_api.connections().cleanup(&editor_id).await?;
//!     owner_api.connections().send(&editor_id).await?;
//!
//!     Navigator::new(&editor.page, harness.config()).connections("Pending").await?;
//!     editor.page.locator("role=button[name=\"Accept\"]").await.click(None).await?;
//!     expect_toast(&editor.page, "Connection accepted", Duration::from_secs(5)).await?;
//!
//!     harness.close().await
//! }
//! ```
//!
//! ## Optional UI
//!
//! ```ignore
//! use playwright_rs_harness::{Presence, Target, acquire, found_or_skip};
//!
//! let highlight = Target::new("highlight tool")
//!     .exact_text("Highlight")
//!     .title("Highlight")
//!     .aria_label("Highlight")
//!     .test_id("tool-highlight");
//! let tool = found_or_skip!(acquire(&page, &highlight, Presence::Optional, wait).await?);
//! tool.handle.click(None).await?;
//! ```

pub mod api;
mod artifacts;
mod auth;
pub mod config;
mod context;
mod credentials;
mod error;
mod intercept;
mod locate;
mod logging;
mod navigation;
mod state_store;
mod suite;
mod toast;
pub mod wait;

#[doc(hidden)]
pub use tracing as __tracing;

pub use api::{ApiClient, Connection, ConnectionStatus, Member};
pub use artifacts::Artifacts;
pub use auth::LoginFlow;
pub use config::{BrowserKind, EnvSource, HarnessConfig, ProcessEnv};
pub use context::{Harness, RoleSession};
pub use credentials::{CredentialResolver, Credentials, Role};
pub use error::{Error, Result};
pub use intercept::fail_route;
pub use locate::{Acquired, Candidate, Located, Presence, Finder, Target, acquire, locate};
pub use logging::{init_cli_tracing, init_tracing};
pub use navigation::{Landmark, NavAction, NavStep, Navigator};
pub use state_store::{PROJECT_ID_FILE, SessionStore};
pub use suite::{SerialGuard, SerialSuite, serial_lock};
pub use toast::{Toasts, expect_no_toast, expect_toast};

/// Re-export of the browser bindings the harness drives
pub use playwright_rs;
