use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

/// Named access rights. `librarian` covers loan management (marking copies
/// returned, renewing loans), `admin` covers user administration.
pub const KNOWN_ROLES: &[&str] = &["admin", "librarian"];

#[derive(Debug, Hash, PartialEq, Eq, Serialize, Deserialize, Clone)]
#[serde(try_from = "String", into = "String")]
pub struct Role(String);

impl Role {
    pub fn admin() -> Self {
        Role("admin".to_string())
    }

    pub fn librarian() -> Self {
        Role("librarian".to_string())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if KNOWN_ROLES.contains(&s) {
            Ok(Role(s.to_string()))
        } else {
            Err(UnknownRole(s.to_string()))
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.0
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Role checks for anything that carries a set of granted roles.
pub trait Authorization {
    fn has_role(&self, role: impl AsRef<str>) -> bool;

    fn has_any_role<I>(&self, roles: I) -> bool
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        roles.into_iter().any(|role| self.has_role(role))
    }
}
