//! Page keys, permission levels and the per-admin permission map.
//!
//! Every screen of the console is identified by a [`PageKey`]. An admin's
//! [`PagePermissions`] maps page keys to the set of [`PermissionLevel`]s they
//! hold on that page. A missing key means no access to the page.
//!
//! ## JSON form
//!
//! ```json
//! { "contests": ["read", "write"], "winners": ["read"] }
//! ```
//!
//! Rows written by older clients used `{"read": true, "write": false}` objects
//! instead of lists; both shapes are accepted on input, lists are written on
//! output.
//!
//! Two decoders exist. [`PagePermissions::from_json`] (also the `Deserialize`
//! impl) is for maps coming from clients and rejects anything it does not
//! understand. [`PagePermissions::from_json_lenient`] is for stored rows and
//! drops unknown page keys and levels, since they grant nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::role::AdminRole;

/// Error returned when a page key or level string is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseKeyError {
    /// Not one of the fixed page keys.
    #[error("unknown page key: {0}")]
    UnknownPage(String),
    /// Not one of `read`, `write`, `update`.
    #[error("unknown permission level: {0}")]
    UnknownLevel(String),
}

/// Error returned when a permission map from a client is malformed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionsError {
    #[error("permissions must be a JSON object")]
    NotAnObject,
    #[error(transparent)]
    Key(#[from] ParseKeyError),
    /// Levels must be a list of names or an object of boolean flags.
    #[error("invalid levels for page {0}")]
    InvalidLevels(PageKey),
}

/// A screen of the admin console, for permission purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKey {
    Dashboard,
    Contests,
    Participants,
    Draw,
    Winners,
    Communication,
    Analytics,
    Settings,
    UserManagement,
    AdminManagement,
}

impl PageKey {
    /// Every page key, in navigation order.
    pub const ALL: [Self; 10] = [
        Self::Dashboard,
        Self::Contests,
        Self::Participants,
        Self::Draw,
        Self::Winners,
        Self::Communication,
        Self::Analytics,
        Self::Settings,
        Self::UserManagement,
        Self::AdminManagement,
    ];

    /// Key as stored in the permission map.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Contests => "contests",
            Self::Participants => "participants",
            Self::Draw => "draw",
            Self::Winners => "winners",
            Self::Communication => "communication",
            Self::Analytics => "analytics",
            Self::Settings => "settings",
            Self::UserManagement => "user_management",
            Self::AdminManagement => "admin_management",
        }
    }

    /// Human-readable title, used for navigation entries.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Contests => "Contests",
            Self::Participants => "Participants",
            Self::Draw => "Lucky Draw",
            Self::Winners => "Winners",
            Self::Communication => "Communication",
            Self::Analytics => "Analytics",
            Self::Settings => "Settings",
            Self::UserManagement => "User Management",
            Self::AdminManagement => "Admin Management",
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|page| page.as_str() == s)
            .ok_or_else(|| ParseKeyError::UnknownPage(s.to_owned()))
    }
}

/// An operation level on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    Read,
    Write,
    Update,
}

impl PermissionLevel {
    /// Every level.
    pub const ALL: [Self; 3] = [Self::Read, Self::Write, Self::Update];

    /// Level as stored in the permission map.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ParseKeyError::UnknownLevel(s.to_owned()))
    }
}

/// The stored permission map of one admin.
///
/// Invariant: no page maps to an empty set. Removing the last level of a page
/// removes the page, so "key absent" and "no access" are the same thing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PagePermissions(BTreeMap<PageKey, BTreeSet<PermissionLevel>>);

impl PagePermissions {
    /// An empty map (no access anywhere).
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Every level on every page.
    #[must_use]
    pub fn full() -> Self {
        PageKey::ALL
            .into_iter()
            .map(|page| (page, PermissionLevel::ALL.into_iter().collect()))
            .collect()
    }

    /// The map a new admin of `role` starts with.
    ///
    /// - `SUPER_ADMIN`: everything (stored for display only, never consulted).
    /// - `ADMIN`: everything except changes to other admins.
    /// - `MODERATOR`: read access to the day-to-day contest screens.
    #[must_use]
    pub fn defaults_for(role: AdminRole) -> Self {
        match role {
            AdminRole::SuperAdmin => Self::full(),
            AdminRole::Admin => {
                let mut perms = Self::full();
                perms.set_page(PageKey::AdminManagement, [PermissionLevel::Read]);
                perms
            }
            AdminRole::Moderator => [
                PageKey::Dashboard,
                PageKey::Contests,
                PageKey::Participants,
                PageKey::Winners,
                PageKey::Communication,
            ]
            .into_iter()
            .map(|page| (page, BTreeSet::from([PermissionLevel::Read])))
            .collect(),
        }
    }

    /// Add `level` on `page`.
    pub fn grant(&mut self, page: PageKey, level: PermissionLevel) {
        self.0.entry(page).or_default().insert(level);
    }

    /// Remove `level` on `page`. Returns whether it was present.
    pub fn revoke(&mut self, page: PageKey, level: PermissionLevel) -> bool {
        let Some(levels) = self.0.get_mut(&page) else {
            return false;
        };
        let removed = levels.remove(&level);
        if levels.is_empty() {
            self.0.remove(&page);
        }
        removed
    }

    /// Replace the levels held on `page`. An empty set removes the page.
    pub fn set_page(&mut self, page: PageKey, levels: impl IntoIterator<Item = PermissionLevel>) {
        let levels: BTreeSet<_> = levels.into_iter().collect();
        if levels.is_empty() {
            self.0.remove(&page);
        } else {
            self.0.insert(page, levels);
        }
    }

    /// Levels held on `page` (empty when the page is absent).
    pub fn levels(&self, page: PageKey) -> impl Iterator<Item = PermissionLevel> + '_ {
        self.0.get(&page).into_iter().flatten().copied()
    }

    /// Whether the map holds `level` on `page`.
    #[must_use]
    pub fn contains(&self, page: PageKey, level: PermissionLevel) -> bool {
        self.0.get(&page).is_some_and(|levels| levels.contains(&level))
    }

    /// Pages with at least one level, in navigation order.
    pub fn pages(&self) -> impl Iterator<Item = PageKey> + '_ {
        self.0.keys().copied()
    }

    /// Whether the map grants nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a permission map sent by a client.
    ///
    /// # Errors
    ///
    /// Returns `PermissionsError` for a non-object value, an unknown page key
    /// or level, or levels that are neither a list of names nor an object of
    /// boolean flags.
    pub fn from_json(value: &Value) -> Result<Self, PermissionsError> {
        let object = value.as_object().ok_or(PermissionsError::NotAnObject)?;

        let mut perms = Self::new();
        for (key, levels) in object {
            let page = key.parse::<PageKey>()?;
            let parsed = match levels {
                Value::Array(items) => items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .ok_or(PermissionsError::InvalidLevels(page))?
                            .parse::<PermissionLevel>()
                            .map_err(PermissionsError::from)
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                Value::Object(flags) => {
                    let mut held = Vec::new();
                    for (name, enabled) in flags {
                        let level = name.parse::<PermissionLevel>()?;
                        match enabled {
                            Value::Bool(true) => held.push(level),
                            Value::Bool(false) => {}
                            _ => return Err(PermissionsError::InvalidLevels(page)),
                        }
                    }
                    held
                }
                _ => return Err(PermissionsError::InvalidLevels(page)),
            };
            perms.set_page(page, parsed);
        }
        Ok(perms)
    }

    /// Parse a stored JSON value, dropping anything that grants nothing.
    ///
    /// `null` and non-object values read as an empty map.
    #[must_use]
    pub fn from_json_lenient(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::new();
        };

        let mut perms = Self::new();
        for (key, levels) in object {
            let Ok(page) = key.parse::<PageKey>() else {
                continue;
            };
            let parsed = match levels {
                Value::Array(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .filter_map(|s| s.parse::<PermissionLevel>().ok())
                    .collect::<Vec<_>>(),
                Value::Object(flags) => flags
                    .iter()
                    .filter(|(_, enabled)| enabled.as_bool() == Some(true))
                    .filter_map(|(s, _)| s.parse::<PermissionLevel>().ok())
                    .collect(),
                _ => Vec::new(),
            };
            perms.set_page(page, parsed);
        }
        perms
    }
}

impl FromIterator<(PageKey, BTreeSet<PermissionLevel>)> for PagePermissions {
    fn from_iter<I: IntoIterator<Item = (PageKey, BTreeSet<PermissionLevel>)>>(iter: I) -> Self {
        let mut perms = Self::new();
        for (page, levels) in iter {
            perms.set_page(page, levels);
        }
        perms
    }
}

impl<'de> Deserialize<'de> for PagePermissions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(serde::de::Error::custom)
    }
}
