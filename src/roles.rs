//! Role model and authorization policy.
//!
//! Every signed-in principal is assigned exactly one [`Role`] per session.
//! The three privileged roles are resolved from allowlists in
//! [`RolePolicy`]; everyone else is classified by the directory lookup in
//! [`crate::resolver`]. The policy is data loaded at startup, not code.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Access role for a dashboard session.
///
/// The set is closed: a principal is either on one of the privileged
/// allowlists, manages at least one account manager, or holds only their
/// own accounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Unrestricted access to both consumption streams.
    GlobalAdmin,
    /// Access to the eastern regional scope.
    RegionalAdminEast,
    /// Access to the western regional scope.
    RegionalAdminWest,
    /// Access to the records owned by a set of managed names.
    Manager,
    /// Access to the principal's own records only.
    IndividualContributor,
}

impl Role {
    /// Get the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GlobalAdmin => "global-admin",
            Self::RegionalAdminEast => "regional-admin-east",
            Self::RegionalAdminWest => "regional-admin-west",
            Self::Manager => "manager",
            Self::IndividualContributor => "individual-contributor",
        }
    }

    /// Whether this role was assigned from an allowlist rather than the
    /// directory lookup.
    #[must_use]
    pub fn is_privileged(&self) -> bool {
        matches!(
            self,
            Self::GlobalAdmin | Self::RegionalAdminEast | Self::RegionalAdminWest
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing a role string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid_value: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid role: '{}'", self.invalid_value)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "global-admin" => Ok(Self::GlobalAdmin),
            "regional-admin-east" => Ok(Self::RegionalAdminEast),
            "regional-admin-west" => Ok(Self::RegionalAdminWest),
            "manager" => Ok(Self::Manager),
            "individual-contributor" => Ok(Self::IndividualContributor),
            _ => Err(ParseRoleError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

/// Allowlists mapping display names to privileged roles.
///
/// Loaded once at startup (typically from a JSON file via
/// [`RolePolicy::from_file`]); membership checks are exact-match on the
/// identity provider's display name.
///
/// # Example
///
/// ```rust
/// use meterview::roles::{Role, RolePolicy};
///
/// let policy = RolePolicy::new()
///     .with_global_admin("Global Admin X")
///     .with_regional_admin_east("East Admin Y");
///
/// assert_eq!(policy.privileged_role("Global Admin X"), Some(Role::GlobalAdmin));
/// assert_eq!(policy.privileged_role("Jane Doe"), None);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RolePolicy {
    #[serde(default)]
    pub global_admins: HashSet<String>,
    #[serde(default)]
    pub regional_admins_east: HashSet<String>,
    #[serde(default)]
    pub regional_admins_west: HashSet<String>,
}

impl RolePolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a policy from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse as a
    /// policy document.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    #[must_use]
    pub fn with_global_admin(mut self, name: impl Into<String>) -> Self {
        self.global_admins.insert(name.into());
        self
    }

    #[must_use]
    pub fn with_regional_admin_east(mut self, name: impl Into<String>) -> Self {
        self.regional_admins_east.insert(name.into());
        self
    }

    #[must_use]
    pub fn with_regional_admin_west(mut self, name: impl Into<String>) -> Self {
        self.regional_admins_west.insert(name.into());
        self
    }

    /// Resolve a display name against the allowlists.
    ///
    /// Precedence is global, then east, then west; first match wins.
    /// Returns `None` for names on no allowlist.
    #[must_use]
    pub fn privileged_role(&self, display_name: &str) -> Option<Role> {
        if self.global_admins.contains(display_name) {
            Some(Role::GlobalAdmin)
        } else if self.regional_admins_east.contains(display_name) {
            Some(Role::RegionalAdminEast)
        } else if self.regional_admins_west.contains(display_name) {
            Some(Role::RegionalAdminWest)
        } else {
            None
        }
    }
}

/// The set of display names whose records a session may request.
///
/// For managers this is the subordinate names plus the manager's own name;
/// for individual contributors it is the principal's name alone. Insertion
/// order is preserved and duplicates are dropped, so the set is stable for
/// request payloads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagedNameSet {
    names: Vec<String>,
}

impl ManagedNameSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a name, keeping the set duplicate-free.
    pub fn insert(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.names.iter().any(|n| n == &name) {
            self.names.push(name);
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ManagedNameSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = Self::new();
        for name in iter {
            set.insert(name);
        }
        set
    }
}
