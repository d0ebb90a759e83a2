//! Configuration items
//!
//! A [`ConfigItem`] is one logical line of a configuration file: either a
//! comment (blank lines included) or a `key = value` setting tagged with
//! the [`ConfigReason`] it holds its value for.
//!
//! An item whose value is `None` is *fetal*: it was handed out by a lookup
//! miss and nobody has assigned it yet. Fetal items are invisible to
//! presence checks and are never written out.

use crate::{ConfigError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Key reserved for comment items
pub const COMMENT_KEY: &str = "__comment__";

/// Why an item holds its current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigReason {
    /// Mirrors a known default; never written out
    Default,
    /// Reserved; nothing tracks the value being overridden yet
    Override,
    /// Persisted to the configuration file
    Stored,
    /// Fetal item whose reason is decided by its first assignment
    Unresolved,
}

impl ConfigReason {
    /// Reasons a caller may assign explicitly
    pub const ASSIGNABLE: [ConfigReason; 3] = [
        ConfigReason::Stored,
        ConfigReason::Default,
        ConfigReason::Override,
    ];

    pub fn is_assignable(self) -> bool {
        Self::ASSIGNABLE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigReason::Default => "default",
            ConfigReason::Override => "override",
            ConfigReason::Stored => "stored",
            ConfigReason::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for ConfigReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigReason {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "stored" => Ok(ConfigReason::Stored),
            "default" => Ok(ConfigReason::Default),
            "override" => Ok(ConfigReason::Override),
            other => Err(ConfigError::InvalidReason {
                key: String::new(),
                reason: other.to_string(),
            }),
        }
    }
}

/// A comment line or a `key = value` setting
#[derive(Debug, Clone)]
pub struct ConfigItem {
    key: String,
    value: Option<String>,
    default: Option<String>,
    reason: ConfigReason,
}

impl ConfigItem {
    /// Create a comment item. Blank lines are comments too.
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            key: COMMENT_KEY.to_string(),
            value: Some(text.into()),
            default: None,
            reason: ConfigReason::Stored,
        }
    }

    /// Create a setting.
    ///
    /// When `reason` is `None` it is inferred: `Stored` without a default,
    /// `Default` when the value equals the default, `Stored` when it
    /// differs, and `Unresolved` while the value is absent.
    pub fn new(
        key: impl Into<String>,
        value: Option<String>,
        default: Option<String>,
        reason: Option<ConfigReason>,
    ) -> Result<Self> {
        let key = key.into();

        let reason = match reason {
            Some(reason) => {
                validate_reason(&key, reason)?;
                reason
            }
            None => match (&value, &default) {
                (None, _) => ConfigReason::Unresolved,
                (Some(_), None) => ConfigReason::Stored,
                (Some(v), Some(d)) if v == d => ConfigReason::Default,
                (Some(_), Some(_)) => ConfigReason::Stored,
            },
        };

        let mut default = default;
        if reason == ConfigReason::Default {
            match (&value, &default) {
                (Some(v), Some(d)) if v != d => {
                    return Err(ConfigError::InvalidReason {
                        key,
                        reason: format!("default (value \"{}\" differs from \"{}\")", v, d),
                    })
                }
                (None, None) => {
                    return Err(ConfigError::InvalidReason {
                        key,
                        reason: "default (no default value)".to_string(),
                    })
                }
                _ => {}
            }
            if default.is_none() {
                default = value.clone();
            }
        }

        Ok(Self {
            key,
            value,
            default,
            reason,
        })
    }

    /// Create a `Stored` setting without a default
    pub fn stored(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            default: None,
            reason: ConfigReason::Stored,
        }
    }

    /// Create a setting that only mirrors its default
    pub fn defaulted(key: impl Into<String>, default: impl Into<String>) -> Self {
        let default = default.into();
        Self {
            key: key.into(),
            value: Some(default.clone()),
            default: Some(default),
            reason: ConfigReason::Default,
        }
    }

    /// Create a fetal (not yet materialized) setting
    pub fn fetal(key: impl Into<String>, default: Option<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            default,
            reason: ConfigReason::Unresolved,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current value, or `None` while fetal
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    pub fn reason(&self) -> ConfigReason {
        self.reason
    }

    pub fn is_comment(&self) -> bool {
        self.key == COMMENT_KEY
    }

    /// Comment text, if this is a comment
    pub fn comment_text(&self) -> Option<&str> {
        if self.is_comment() {
            self.value()
        } else {
            None
        }
    }

    pub fn is_fetal(&self) -> bool {
        self.value.is_none()
    }

    /// Whether the item belongs in the written configuration file
    pub fn is_explicit(&self) -> bool {
        self.reason == ConfigReason::Stored && !self.is_fetal()
    }

    /// Whether this is a live setting matching `key`
    pub(crate) fn is_setting(&self, key: &str) -> bool {
        !self.is_comment() && self.key == key
    }

    /// Assign a new value.
    ///
    /// Returns `true` when the assignment took the item out of the fetal
    /// state; the owning section must then be christened. Use
    /// [`ItemMut::set_value`](crate::ItemMut::set_value) to have that done
    /// automatically.
    pub fn set_value(&mut self, value: impl Into<String>) -> Result<bool> {
        self.assign(Some(value.into()))
    }

    /// Assign an optional value; `None` is rejected since absence is
    /// expressed by deletion.
    pub fn assign(&mut self, value: Option<String>) -> Result<bool> {
        let value = value.ok_or_else(|| ConfigError::InvalidValue {
            key: self.key.clone(),
            message: "cannot assign a missing value; delete the item instead".to_string(),
        })?;

        if self.value.as_deref() == Some(value.as_str()) {
            return Ok(false);
        }

        let was_fetal = self.is_fetal();
        let matches_default = self.default.as_deref() == Some(value.as_str());

        self.reason = match self.reason {
            ConfigReason::Unresolved if matches_default => ConfigReason::Default,
            ConfigReason::Unresolved => ConfigReason::Stored,
            ConfigReason::Default if !matches_default => ConfigReason::Stored,
            other => other,
        };
        self.value = Some(value);

        Ok(was_fetal)
    }

    /// Revert to the default value.
    ///
    /// A detached item without a default has nowhere to go; sections remove
    /// such items through [`ItemMut::delete_value`](crate::ItemMut::delete_value).
    pub fn delete_value(&mut self) -> Result<()> {
        match &self.default {
            Some(default) => {
                self.value = Some(default.clone());
                self.reason = ConfigReason::Default;
                Ok(())
            }
            None => Err(ConfigError::InvariantViolation(format!(
                "cannot delete value of \"{}\": no default and no owning section",
                self.key
            ))),
        }
    }

    /// Change the reason. Only `Stored`, `Default` and `Override` are accepted,
    /// and `Default` only when the value equals the default.
    pub fn set_reason(&mut self, reason: ConfigReason) -> Result<()> {
        validate_reason(&self.key, reason)?;
        if reason == ConfigReason::Default
            && (self.default.is_none() || self.default != self.value)
        {
            return Err(ConfigError::InvalidReason {
                key: self.key.clone(),
                reason: "default (value differs from default)".to_string(),
            });
        }
        self.reason = reason;
        Ok(())
    }
}

fn validate_reason(key: &str, reason: ConfigReason) -> Result<()> {
    if reason.is_assignable() {
        Ok(())
    } else {
        Err(ConfigError::InvalidReason {
            key: key.to_string(),
            reason: reason.to_string(),
        })
    }
}

impl PartialEq for ConfigItem {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value && self.reason == other.reason
    }
}

impl Eq for ConfigItem {}

impl PartialOrd for ConfigItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConfigItem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.value.cmp(&other.value))
            .then_with(|| self.reason.cmp(&other.reason))
    }
}

impl fmt::Display for ConfigItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, self.is_comment()) {
            (Some(text), true) => f.write_str(text),
            (Some(value), false) => write!(f, "{} = {}", self.key, value),
            (None, _) => write!(f, "{} (unset)", self.key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_is_stored() {
        let item = ConfigItem::comment("# hello");
        assert!(item.is_comment());
        assert_eq!(item.comment_text(), Some("# hello"));
        assert_eq!(item.reason(), ConfigReason::Stored);
        assert!(item.is_explicit());
    }

    #[test]
    fn test_reason_inference() {
        let item = ConfigItem::new("a", Some("x".into()), None, None).unwrap();
        assert_eq!(item.reason(), ConfigReason::Stored);

        let item = ConfigItem::new("a", Some("x".into()), Some("x".into()), None).unwrap();
        assert_eq!(item.reason(), ConfigReason::Default);
        assert!(!item.is_explicit());

        let item = ConfigItem::new("a", Some("y".into()), Some("x".into()), None).unwrap();
        assert_eq!(item.reason(), ConfigReason::Stored);

        let item = ConfigItem::new("a", None, Some("x".into()), None).unwrap();
        assert_eq!(item.reason(), ConfigReason::Unresolved);
        assert!(item.is_fetal());
        assert!(!item.is_explicit());
    }

    #[test]
    fn test_explicit_default_must_match() {
        let err = ConfigItem::new(
            "a",
            Some("y".into()),
            Some("x".into()),
            Some(ConfigReason::Default),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidReason { .. }));

        let item = ConfigItem::new("a", Some("y".into()), None, Some(ConfigReason::Default))
            .unwrap();
        assert_eq!(item.default(), Some("y"));
    }

    #[test]
    fn test_unresolved_reason_rejected() {
        let err = ConfigItem::new("a", Some("x".into()), None, Some(ConfigReason::Unresolved))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidReason { .. }));

        let mut item = ConfigItem::stored("a", "x");
        assert!(item.set_reason(ConfigReason::Unresolved).is_err());
        assert!(item.set_reason(ConfigReason::Override).is_ok());
        assert!(!item.is_explicit());
    }

    #[test]
    fn test_set_value_transitions() {
        let mut item = ConfigItem::fetal("a", Some("x".into()));
        assert!(item.set_value("x").unwrap());
        assert_eq!(item.reason(), ConfigReason::Default);

        assert!(!item.set_value("y").unwrap());
        assert_eq!(item.reason(), ConfigReason::Stored);

        // Stored stays stored even when it lands back on the default
        item.set_value("x").unwrap();
        assert_eq!(item.reason(), ConfigReason::Stored);
    }

    #[test]
    fn test_set_same_value_is_noop() {
        let mut item = ConfigItem::defaulted("a", "x");
        assert!(!item.set_value("x").unwrap());
        assert_eq!(item.reason(), ConfigReason::Default);
    }

    #[test]
    fn test_assign_missing_rejected() {
        let mut item = ConfigItem::stored("a", "x");
        assert!(matches!(
            item.assign(None),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(item.value(), Some("x"));
    }

    #[test]
    fn test_delete_value() {
        let mut item = ConfigItem::new("a", Some("foo".into()), Some("bar".into()), None).unwrap();
        assert_eq!(item.reason(), ConfigReason::Stored);
        item.delete_value().unwrap();
        assert_eq!(item.reason(), ConfigReason::Default);
        assert_eq!(item.value(), Some("bar"));

        let mut orphan = ConfigItem::stored("a", "foo");
        let err = orphan.delete_value().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_equality_ignores_default() {
        let a = ConfigItem::new("k", Some("v".into()), Some("d".into()), None).unwrap();
        let b = ConfigItem::stored("k", "v");
        assert_eq!(a, b);
        assert_ne!(a, ConfigItem::defaulted("k", "v"));
    }

    #[test]
    fn test_ordering() {
        let mut items = vec![
            ConfigItem::stored("b", "1"),
            ConfigItem::stored("a", "2"),
            ConfigItem::stored("a", "1"),
            ConfigItem::defaulted("a", "1"),
        ];
        items.sort();
        assert_eq!(items[0], ConfigItem::defaulted("a", "1"));
        assert_eq!(items[1], ConfigItem::stored("a", "1"));
        assert_eq!(items[2], ConfigItem::stored("a", "2"));
        assert_eq!(items[3], ConfigItem::stored("b", "1"));
    }

    #[test]
    fn test_reason_from_str() {
        assert_eq!("stored".parse::<ConfigReason>().unwrap(), ConfigReason::Stored);
        assert!("bogus".parse::<ConfigReason>().is_err());
        assert!("unresolved".parse::<ConfigReason>().is_err());
    }
}
