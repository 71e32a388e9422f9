//! Typed user preferences over the key/value settings store.
//!
//! # Responsibility
//! - Map preference keys to typed values with defaults.
//! - Reject invalid values on write; fall back to defaults on bad reads.
//!
//! # Invariants
//! - `load()` never fails because of malformed stored values.
//! - `default_category` is never blank.

use crate::model::task::{DEFAULT_CATEGORY, DEFAULT_LEAD_MINUTES, MAX_LEAD_MINUTES};
use crate::repo::settings_repo::SettingsRepository;
use crate::repo::task_repo::{TaskListQuery, TaskSortOrder, TaskStatusFilter};
use crate::repo::{RepoError, RepoResult};
use crate::service::task_service::TaskDefaults;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const KEY_HIDE_COMPLETED: &str = "hide_completed_tasks";
pub const KEY_DEFAULT_LEAD_MINUTES: &str = "notification_time_minutes";
pub const KEY_VISIBLE_CATEGORIES: &str = "visible_categories";
pub const KEY_DEFAULT_CATEGORY: &str = "default_category";
pub const KEY_THEME_MODE: &str = "theme_mode";
pub const KEY_SORT_ORDER: &str = "sort_order";

const ALL_KEYS: &[&str] = &[
    KEY_HIDE_COMPLETED,
    KEY_DEFAULT_LEAD_MINUTES,
    KEY_VISIBLE_CATEGORIES,
    KEY_DEFAULT_CATEGORY,
    KEY_THEME_MODE,
    KEY_SORT_ORDER,
];

/// Settings service failures.
#[derive(Debug)]
pub enum SettingsError {
    InvalidValue { key: &'static str, message: String },
    Repo(RepoError),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, message } => {
                write!(f, "invalid value for setting `{key}`: {message}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<RepoError> for SettingsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// App colour scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    System,
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "system" => Some(Self::System),
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

/// Snapshot of all user preferences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub hide_completed: bool,
    pub default_lead_minutes: u32,
    pub default_category: String,
    pub visible_categories: BTreeSet<String>,
    pub theme_mode: ThemeMode,
    pub sort_order: TaskSortOrder,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hide_completed: false,
            default_lead_minutes: DEFAULT_LEAD_MINUTES,
            default_category: DEFAULT_CATEGORY.to_string(),
            visible_categories: BTreeSet::from([DEFAULT_CATEGORY.to_string()]),
            theme_mode: ThemeMode::System,
            sort_order: TaskSortOrder::DueTime,
        }
    }
}

impl Settings {
    /// Defaults applied to new tasks.
    pub fn task_defaults(&self) -> TaskDefaults {
        TaskDefaults {
            category: self.default_category.clone(),
            lead_minutes: self.default_lead_minutes,
        }
    }

    /// Base list query honouring `hide_completed` and `sort_order`.
    pub fn list_query(&self) -> TaskListQuery {
        TaskListQuery {
            status: if self.hide_completed {
                TaskStatusFilter::Incomplete
            } else {
                TaskStatusFilter::All
            },
            sort: self.sort_order,
            ..TaskListQuery::default()
        }
    }

    pub fn is_category_visible(&self, category: &str) -> bool {
        self.visible_categories.contains(category)
    }
}

/// Typed settings facade over a [`SettingsRepository`].
pub struct SettingsService<R: SettingsRepository> {
    repo: R,
}

impl<R: SettingsRepository> SettingsService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads all preferences, substituting defaults for missing or
    /// malformed values.
    pub fn load(&self) -> RepoResult<Settings> {
        let defaults = Settings::default();
        Ok(Settings {
            hide_completed: self
                .read(KEY_HIDE_COMPLETED, parse_bool)?
                .unwrap_or(defaults.hide_completed),
            default_lead_minutes: self
                .read(KEY_DEFAULT_LEAD_MINUTES, parse_lead_minutes)?
                .unwrap_or(defaults.default_lead_minutes),
            default_category: self
                .read(KEY_DEFAULT_CATEGORY, parse_category)?
                .unwrap_or(defaults.default_category),
            visible_categories: self
                .read(KEY_VISIBLE_CATEGORIES, parse_category_set)?
                .unwrap_or(defaults.visible_categories),
            theme_mode: self
                .read(KEY_THEME_MODE, ThemeMode::parse)?
                .unwrap_or(defaults.theme_mode),
            sort_order: self
                .read(KEY_SORT_ORDER, TaskSortOrder::parse)?
                .unwrap_or(defaults.sort_order),
        })
    }

    pub fn set_hide_completed(&self, hide: bool) -> Result<(), SettingsError> {
        self.repo
            .set(KEY_HIDE_COMPLETED, if hide { "true" } else { "false" })?;
        Ok(())
    }

    pub fn set_default_lead_minutes(&self, minutes: u32) -> Result<(), SettingsError> {
        if minutes > MAX_LEAD_MINUTES {
            return Err(SettingsError::InvalidValue {
                key: KEY_DEFAULT_LEAD_MINUTES,
                message: format!("{minutes} exceeds maximum of {MAX_LEAD_MINUTES}"),
            });
        }
        self.repo
            .set(KEY_DEFAULT_LEAD_MINUTES, &minutes.to_string())?;
        Ok(())
    }

    pub fn set_default_category(&self, category: &str) -> Result<(), SettingsError> {
        let Some(category) = parse_category(category) else {
            return Err(SettingsError::InvalidValue {
                key: KEY_DEFAULT_CATEGORY,
                message: "category must not be blank".to_string(),
            });
        };
        self.repo.set(KEY_DEFAULT_CATEGORY, &category)?;
        Ok(())
    }

    /// Replaces the visible category set. Blank names are dropped.
    pub fn set_visible_categories<I, S>(&self, categories: I) -> Result<(), SettingsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let normalized = categories
            .into_iter()
            .filter_map(|value| parse_category(value.as_ref()))
            .collect::<BTreeSet<_>>();
        let encoded =
            serde_json::to_string(&normalized).map_err(|err| SettingsError::InvalidValue {
                key: KEY_VISIBLE_CATEGORIES,
                message: err.to_string(),
            })?;
        self.repo.set(KEY_VISIBLE_CATEGORIES, &encoded)?;
        Ok(())
    }

    pub fn add_visible_category(&self, category: &str) -> Result<(), SettingsError> {
        let mut visible = self.load()?.visible_categories;
        visible.insert(category.to_string());
        self.set_visible_categories(visible)
    }

    pub fn remove_visible_category(&self, category: &str) -> Result<(), SettingsError> {
        let mut visible = self.load()?.visible_categories;
        visible.remove(category.trim());
        self.set_visible_categories(visible)
    }

    pub fn set_theme_mode(&self, mode: ThemeMode) -> Result<(), SettingsError> {
        self.repo.set(KEY_THEME_MODE, mode.as_str())?;
        Ok(())
    }

    pub fn set_sort_order(&self, order: TaskSortOrder) -> Result<(), SettingsError> {
        self.repo.set(KEY_SORT_ORDER, order.as_str())?;
        Ok(())
    }

    /// Drops every stored preference so defaults apply again.
    pub fn reset(&self) -> RepoResult<()> {
        for key in ALL_KEYS {
            self.repo.remove(key)?;
        }
        Ok(())
    }

    fn read<T>(&self, key: &'static str, parse: impl Fn(&str) -> Option<T>) -> RepoResult<Option<T>> {
        let Some(raw) = self.repo.get(key)? else {
            return Ok(None);
        };
        let parsed = parse(raw.as_str());
        if parsed.is_none() {
            warn!("event=settings_load module=service status=warn key={key} error_code=invalid_value");
        }
        Ok(parsed)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_lead_minutes(value: &str) -> Option<u32> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|minutes| *minutes <= MAX_LEAD_MINUTES)
}

fn parse_category(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_category_set(value: &str) -> Option<BTreeSet<String>> {
    serde_json::from_str::<BTreeSet<String>>(value).ok()
}

#[cfg(test)]
mod tests {
    use super::{parse_bool, parse_category_set, parse_lead_minutes, Settings, ThemeMode};
    use crate::repo::task_repo::{TaskSortOrder, TaskStatusFilter};

    #[test]
    fn defaults_match_new_task_defaults() {
        let settings = Settings::default();
        let defaults = settings.task_defaults();
        assert_eq!(defaults.category, "General");
        assert_eq!(defaults.lead_minutes, 15);
        assert!(settings.is_category_visible("General"));
        assert_eq!(settings.theme_mode, ThemeMode::System);
    }

    #[test]
    fn list_query_follows_hide_completed_and_sort() {
        let settings = Settings {
            hide_completed: true,
            sort_order: TaskSortOrder::CreationTime,
            ..Settings::default()
        };
        let query = settings.list_query();
        assert_eq!(query.status, TaskStatusFilter::Incomplete);
        assert_eq!(query.sort, TaskSortOrder::CreationTime);
    }

    #[test]
    fn parsers_reject_malformed_values() {
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_lead_minutes("-5"), None);
        assert_eq!(parse_lead_minutes(" 30 "), Some(30));
        assert_eq!(parse_lead_minutes("999999"), None);
        assert!(parse_category_set("not json").is_none());
        assert_eq!(
            parse_category_set(r#"["Work","Home"]"#).map(|set| set.len()),
            Some(2)
        );
    }
}
