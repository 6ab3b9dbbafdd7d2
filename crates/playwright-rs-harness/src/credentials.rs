// Credential resolution per test role
//
// Every role maps to a pair of environment variables. There are no embedded
// fallback secrets: a missing or empty variable is a configuration error that
// names the variable, raised before any navigation happens.

use std::fmt;
use std::str::FromStr;

use crate::config::{EnvSource, ProcessEnv};
use crate::error::{Error, Result};

/// Logical permission level a test session holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    Owner,
    Editor,
    Viewer,
    Admin,
}

impl Role {
    /// Every role, in setup order.
    pub const ALL: [Role; 4] = [Role::Owner, Role::Editor, Role::Viewer, Role::Admin];

    /// Lowercase label, also used as the session file stem.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
            Role::Admin => "admin",
        }
    }

    /// Name of the variable holding this role's email, e.g. `E2E_OWNER_EMAIL`.
    pub fn email_var(&self) -> String {
        format!("E2E_{}_EMAIL", self.label().to_ascii_uppercase())
    }

    /// Name of the variable holding this role's password.
    pub fn password_var(&self) -> String {
        format!("E2E_{}_PASSWORD", self.label().to_ascii_uppercase())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown role '{}' (expected one of owner, editor, viewer, admin)",
                    s
                ))
            })
    }
}

/// Email and password for one role.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub role: Role,
    pub email: String,
    password: String,
}

impl Credentials {
    /// Builds credentials directly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when either value is blank.
    pub fn new(role: Role, email: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let email = email.into();
        let password = password.into();
        if email.trim().is_empty() {
            return Err(Error::Config(format!("email for role '{}' is empty", role)));
        }
        if password.is_empty() {
            return Err(Error::Config(format!("password for role '{}' is empty", role)));
        }
        Ok(Self {
            role,
            email,
            password,
        })
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("role", &self.role)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolves [`Credentials`] for a role from an [`EnvSource`].
pub struct CredentialResolver {
    env: Box<dyn EnvSource>,
}

impl CredentialResolver {
    /// Resolver backed by the process environment.
    pub fn from_env() -> Self {
        Self::with_source(ProcessEnv)
    }

    pub fn with_source(env: impl EnvSource + 'static) -> Self {
        Self { env: Box::new(env) }
    }

    /// Resolves one role.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first missing (or empty) variable.
    pub fn resolve(&self, role: Role) -> Result<Credentials> {
        let email = self.required(&role.email_var())?;
        let password = self.required(&role.password_var())?;
        tracing::debug!(%role, email = %email, "resolved credentials");
        Credentials::new(role, email, password)
    }

    /// Resolves every role up front, failing on the first unresolvable one.
    pub fn resolve_all(&self, roles: &[Role]) -> Result<Vec<Credentials>> {
        roles.iter().map(|role| self.resolve(*role)).collect()
    }

    /// Roles whose email and password variables are both set.
    pub fn available(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|role| self.resolve(*role).is_ok())
            .collect()
    }

    fn required(&self, key: &str) -> Result<String> {
        match self.env.var(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            Some(_) => Err(Error::Config(format!("environment variable {} is empty", key))),
            None => Err(Error::Config(format!(
                "environment variable {} is not set",
                key
            ))),
        }
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolver(pairs: &[(&'static str, &'static str)]) -> CredentialResolver {
        CredentialResolver::with_source(pairs.iter().copied().collect::<HashMap<_, _>>())
    }

    #[test]
    fn test_role_labels_round_trip_case_insensitively() {
        for role in Role::ALL {
            assert_eq!(role.label().to_uppercase().parse::<Role>().unwrap(), role);
        }
        assert_eq!(Role::Viewer.email_var(), "E2E_VIEWER_EMAIL");
        assert_eq!(Role::Admin.password_var(), "E2E_ADMIN_PASSWORD");
        assert!("superuser".parse::<Role>().unwrap_err().is_config());
    }

    #[test]
    fn test_resolve_reads_both_variables() {
        let resolver = resolver(&[
            ("E2E_OWNER_EMAIL", "owner@example.test"),
            ("E2E_OWNER_PASSWORD", "hunter2"),
        ]);
        let creds = resolver.resolve(Role::Owner).unwrap();
        assert_eq!(creds.email, "owner@example.test");
        assert_eq!(creds.password(), "hunter2");
        assert_eq!(resolver.available(), vec![Role::Owner]);
    }

    #[test]
    fn test_missing_variable_fails_fast_naming_it() {
        let resolver = resolver(&[("E2E_EDITOR_EMAIL", "editor@example.test")]);
        let err = resolver.resolve(Role::Editor).unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("E2E_EDITOR_PASSWORD"));

        let err = resolver.resolve(Role::Viewer).unwrap_err();
        assert!(err.to_string().contains("E2E_VIEWER_EMAIL"));
    }

    #[test]
    fn test_empty_password_is_rejected() {
        let resolver = resolver(&[
            ("E2E_ADMIN_EMAIL", "admin@example.test"),
            ("E2E_ADMIN_PASSWORD", ""),
        ]);
        let err = resolver.resolve(Role::Admin).unwrap_err();
        assert!(err.to_string().contains("E2E_ADMIN_PASSWORD is empty"));
        assert!(Credentials::new(Role::Admin, "a@example.test", "").is_err());
    }

    #[test]
    fn test_resolve_all_stops_at_first_unresolvable_role() {
        let resolver = resolver(&[
            ("E2E_OWNER_EMAIL", "owner@example.test"),
            ("E2E_OWNER_PASSWORD", "pw"),
        ]);
        assert_eq!(resolver.resolve_all(&[Role::Owner]).unwrap().len(), 1);
        let err = resolver
            .resolve_all(&[Role::Owner, Role::Editor])
            .unwrap_err();
        assert!(err.to_string().contains("E2E_EDITOR_EMAIL"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new(Role::Owner, "owner@example.test", "s3cret").unwrap();
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("<redacted>"));
    }
}
