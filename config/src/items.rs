//! Configuration sections
//!
//! [`ConfigItems`] is an ordered list of [`ConfigItem`]s that also answers
//! map-style queries by key. Comments keep their place in the list but are
//! ignored by every key-based operation.
//!
//! Key lookups never fail: a miss appends a fetal item and hands it out
//! through an [`ItemMut`]. Assigning through the handle christens the
//! section (it stops being fetal, permanently); deleting through it either
//! reverts the item to its default or removes it from the section.

use crate::example::global_defaults;
use crate::{ConfigError, ConfigItem, ConfigReason, Result};
use std::ops::{Deref, Index, Range};
use tracing::debug;

/// Section holding settings that appear before any header
pub const IMPLICIT_GLOBAL: &str = "implicit_global";

/// Explicit `[global]` section
pub const GLOBAL: &str = "global";

/// Whether `name` is one of the two physical global sections
pub fn is_global_section(name: &str) -> bool {
    name == IMPLICIT_GLOBAL || name == GLOBAL
}

/// One `[section]` of a configuration file
#[derive(Debug, Clone)]
pub struct ConfigItems {
    name: Option<String>,
    items: Vec<ConfigItem>,
    fetal: bool,
}

impl Default for ConfigItems {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ConfigItems {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl ConfigItems {
    /// Create an empty, detached, fetal section
    pub fn new() -> Self {
        Self {
            name: None,
            items: Vec::new(),
            fetal: true,
        }
    }

    pub(crate) fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new()
        }
    }

    pub(crate) fn bind(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    /// Name of the section, once bound to a [`Config`](crate::Config)
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the section has never held a materialized item
    pub fn is_fetal(&self) -> bool {
        self.fetal
    }

    /// Mark the section as born. Called when a child item leaves the fetal state.
    pub fn christen(&mut self) {
        if self.fetal {
            debug!(section = ?self.name, "section christened");
            self.fetal = false;
        }
    }

    /// All items, fetal ones and comments included
    pub fn iter(&self) -> std::slice::Iter<'_, ConfigItem> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[ConfigItem] {
        &self.items
    }

    /// Position of the setting with `key`, fetal or not
    pub fn position(&self, key: &str) -> Option<usize> {
        self.items.iter().position(|item| item.is_setting(key))
    }

    /// Whether a materialized setting with `key` exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Whether a comment with exactly this text exists
    pub fn contains_comment(&self, text: &str) -> bool {
        self.items
            .iter()
            .any(|item| item.comment_text() == Some(text))
    }

    /// Whether an equal item exists
    pub fn contains_item(&self, item: &ConfigItem) -> bool {
        self.items.contains(item)
    }

    /// Materialized setting with `key`, without materializing anything
    pub fn find(&self, key: &str) -> Option<&ConfigItem> {
        self.items
            .iter()
            .find(|item| item.is_setting(key) && !item.is_fetal())
    }

    /// Value of `key`, falling back to the discoverable default
    pub fn value_or_default(&self, key: &str) -> Option<String> {
        match self.find(key).and_then(ConfigItem::value) {
            Some(value) => Some(value.to_string()),
            None => self.find_default(key),
        }
    }

    /// Setting with `key`, materializing a fetal item on a miss
    pub fn get(&mut self, key: &str) -> ItemMut<'_> {
        let index = match self.position(key) {
            Some(index) => index,
            None => {
                let default = self.find_default(key);
                debug!(section = ?self.name, key, ?default, "materializing fetal item");
                self.items.push(ConfigItem::fetal(key, default));
                self.items.len() - 1
            }
        };
        ItemMut {
            section: self,
            index,
        }
    }

    /// Item at `index`
    pub fn get_index(&self, index: usize) -> Option<&ConfigItem> {
        self.items.get(index)
    }

    /// Owner-aware handle to the item at `index`
    pub fn index_mut(&mut self, index: usize) -> Result<ItemMut<'_>> {
        self.check_index(index)?;
        Ok(ItemMut {
            section: self,
            index,
        })
    }

    /// Set `key` to `value`, updating in place or appending a `Stored` item
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        self.assign(key, Some(value.into()))
    }

    /// Like [`set`](Self::set); `None` is rejected with `InvalidValue`.
    pub fn assign(&mut self, key: &str, value: Option<String>) -> Result<()> {
        let value = value.ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: "cannot assign a missing value; delete the key instead".to_string(),
        })?;

        match self.position(key) {
            Some(index) => ItemMut {
                section: self,
                index,
            }
            .set_value(value),
            None => {
                let default = self.find_default(key);
                let item = ConfigItem::new(key, Some(value), default, Some(ConfigReason::Stored))?;
                self.push(item);
                Ok(())
            }
        }
    }

    /// Map `key` directly to a pre-built item, superseding any prior setting
    pub fn set_item(&mut self, key: &str, item: ConfigItem) -> Result<()> {
        if item.is_comment() || item.key() != key {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("item for key \"{}\" cannot be stored as \"{}\"", item.key(), key),
            });
        }
        match self.position(key) {
            Some(index) => {
                self.note_birth(&item);
                self.items[index] = item;
                self.drop_duplicates(key, index);
            }
            None => self.push(item),
        }
        Ok(())
    }

    /// Remove the setting with `key`.
    ///
    /// Fetal placeholders for `key` are discarded as well, but only a
    /// materialized setting counts as present.
    pub fn delete(&mut self, key: &str) -> Result<ConfigItem> {
        let index = self
            .items
            .iter()
            .position(|item| item.is_setting(key) && !item.is_fetal())
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;
        let removed = self.items.remove(index);
        self.items.retain(|item| !item.is_setting(key));
        Ok(removed)
    }

    /// Discard fetal placeholders for `key`, leaving live settings alone
    pub(crate) fn drop_fetal(&mut self, key: &str) {
        self.items
            .retain(|item| !(item.is_setting(key) && item.is_fetal()));
    }

    /// Remove and return the item at `index`
    pub fn remove_at(&mut self, index: usize) -> Result<ConfigItem> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    /// Replace the item at `index`; other settings with the same key are dropped
    pub fn replace_at(&mut self, index: usize, item: ConfigItem) -> Result<ConfigItem> {
        self.check_index(index)?;
        self.note_birth(&item);
        let old = std::mem::replace(&mut self.items[index], item);
        let key = self.items[index].key().to_string();
        if !self.items[index].is_comment() {
            self.drop_duplicates(&key, index);
        }
        Ok(old)
    }

    /// Insert `item` before position `index` (clamped to the end).
    /// A prior setting with the same key is removed first.
    pub fn insert(&mut self, index: usize, item: ConfigItem) {
        let mut index = index.min(self.items.len());
        if !item.is_comment() {
            if let Some(prior) = self.position(item.key()) {
                self.items.remove(prior);
                if prior < index {
                    index -= 1;
                }
            }
        }
        self.note_birth(&item);
        self.items.insert(index, item);
    }

    /// Insert `item` before the setting with `key`
    pub fn insert_before(&mut self, key: &str, item: ConfigItem) -> Result<()> {
        let index = self
            .position(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;
        self.insert(index, item);
        Ok(())
    }

    /// Append `item`, removing any prior setting with the same key
    pub fn append(&mut self, item: ConfigItem) {
        if !item.is_comment() {
            let key = item.key().to_string();
            self.items.retain(|existing| !existing.is_setting(&key));
        }
        self.push(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = ConfigItem>) {
        for item in items {
            self.append(item);
        }
    }

    /// Remove and return the last item
    pub fn pop(&mut self) -> Option<ConfigItem> {
        self.items.pop()
    }

    /// Remove the first item equal to `item`
    pub fn remove_item(&mut self, item: &ConfigItem) -> Result<ConfigItem> {
        let index = self
            .items
            .iter()
            .position(|existing| existing == item)
            .ok_or_else(|| ConfigError::KeyNotFound(item.to_string()))?;
        Ok(self.items.remove(index))
    }

    /// Items within `range`
    pub fn slice(&self, range: Range<usize>) -> Result<&[ConfigItem]> {
        self.check_range(&range)?;
        Ok(&self.items[range])
    }

    /// Remove and return the items within `range`
    pub fn remove_range(&mut self, range: Range<usize>) -> Result<Vec<ConfigItem>> {
        self.check_range(&range)?;
        Ok(self.items.drain(range).collect())
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Repetition has no meaning for a keyed collection
    pub fn repeat(&self, _times: usize) -> Result<ConfigItems> {
        Err(ConfigError::NotSupported(
            "repeating a configuration section".to_string(),
        ))
    }

    /// `(key, value)` pairs of materialized settings, in order
    pub fn iter_key_values(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.items.iter().filter_map(|item| match item.value() {
            Some(value) if !item.is_comment() => Some((item.key(), value)),
            _ => None,
        })
    }

    pub fn iter_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter_key_values().map(|(key, _)| key)
    }

    pub fn iter_values(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter_key_values().map(|(_, value)| value)
    }

    /// Items that are written to the configuration file
    pub fn iter_explicit(&self) -> impl Iterator<Item = &ConfigItem> + '_ {
        self.items.iter().filter(|item| item.is_explicit())
    }

    /// Default for `key`. Only the global sections have defaults.
    pub fn find_default(&self, key: &str) -> Option<String> {
        match self.name.as_deref() {
            Some(name) if is_global_section(name) => global_defaults().get(key).cloned(),
            _ => None,
        }
    }

    fn push(&mut self, item: ConfigItem) {
        self.note_birth(&item);
        self.items.push(item);
    }

    fn note_birth(&mut self, item: &ConfigItem) {
        if !item.is_fetal() {
            self.christen();
        }
    }

    fn drop_duplicates(&mut self, key: &str, keep: usize) {
        let mut index = 0;
        self.items.retain(|item| {
            let retain = index == keep || !item.is_setting(key);
            index += 1;
            retain
        });
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(ConfigError::IndexOutOfRange {
                index,
                len: self.items.len(),
            })
        }
    }

    fn check_range(&self, range: &Range<usize>) -> Result<()> {
        if range.start <= range.end && range.end <= self.items.len() {
            Ok(())
        } else {
            Err(ConfigError::IndexOutOfRange {
                index: range.end,
                len: self.items.len(),
            })
        }
    }
}

impl Index<usize> for ConfigItems {
    type Output = ConfigItem;

    fn index(&self, index: usize) -> &ConfigItem {
        &self.items[index]
    }
}

impl<'a> IntoIterator for &'a ConfigItems {
    type Item = &'a ConfigItem;
    type IntoIter = std::slice::Iter<'a, ConfigItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<ConfigItem> for ConfigItems {
    fn from_iter<I: IntoIterator<Item = ConfigItem>>(iter: I) -> Self {
        let mut section = ConfigItems::new();
        section.extend(iter);
        section
    }
}

/// Mutable handle to an item that knows its owning section
pub struct ItemMut<'a> {
    section: &'a mut ConfigItems,
    index: usize,
}

impl ItemMut<'_> {
    /// Position of the item within its section
    pub fn index(&self) -> usize {
        self.index
    }

    /// Assign a value, christening the section if the item was fetal
    pub fn set_value(&mut self, value: impl Into<String>) -> Result<()> {
        self.assign(Some(value.into()))
    }

    pub fn assign(&mut self, value: Option<String>) -> Result<()> {
        let born = self.section.items[self.index].assign(value)?;
        if born {
            self.section.christen();
        }
        Ok(())
    }

    /// Revert to the default, or remove the item when it has none
    pub fn delete_value(self) -> Result<()> {
        let item = &mut self.section.items[self.index];
        if item.default().is_some() {
            let was_fetal = item.is_fetal();
            item.delete_value()?;
            if was_fetal {
                self.section.christen();
            }
            Ok(())
        } else {
            let removed = self.section.items.remove(self.index);
            debug!(section = ?self.section.name, key = removed.key(), "removed item without default");
            Ok(())
        }
    }

    pub fn set_reason(&mut self, reason: ConfigReason) -> Result<()> {
        self.section.items[self.index].set_reason(reason)
    }
}

impl Deref for ItemMut<'_> {
    type Target = ConfigItem;

    fn deref(&self) -> &ConfigItem {
        &self.section.items[self.index]
    }
}
