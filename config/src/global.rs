//! Merged view over the two global sections
//!
//! Settings placed before the first header live in `implicit_global`;
//! settings under `[global]` live in `global`. [`GlobalSection`] presents
//! both as one section whose items are the implicit ones followed by the
//! explicit ones. New keys go to `global` once it is born, otherwise to
//! `implicit_global` if that is born, otherwise to `global`.

use crate::items::{ItemMut, GLOBAL, IMPLICIT_GLOBAL};
use crate::{ConfigError, ConfigItem, ConfigItems, Result};
use std::ops::Range;

/// Which physical section an item lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalPart {
    Implicit,
    Explicit,
}

impl GlobalPart {
    pub fn section_name(self) -> &'static str {
        match self {
            GlobalPart::Implicit => IMPLICIT_GLOBAL,
            GlobalPart::Explicit => GLOBAL,
        }
    }

    pub fn other(self) -> GlobalPart {
        match self {
            GlobalPart::Implicit => GlobalPart::Explicit,
            GlobalPart::Explicit => GlobalPart::Implicit,
        }
    }
}

/// Read/write facade over `implicit_global` followed by `global`
pub struct GlobalSection<'a> {
    implicit: &'a mut ConfigItems,
    explicit: &'a mut ConfigItems,
}

impl<'a> GlobalSection<'a> {
    pub(crate) fn new(implicit: &'a mut ConfigItems, explicit: &'a mut ConfigItems) -> Self {
        Self { implicit, explicit }
    }

    fn part(&self, part: GlobalPart) -> &ConfigItems {
        match part {
            GlobalPart::Implicit => &*self.implicit,
            GlobalPart::Explicit => &*self.explicit,
        }
    }

    fn part_mut(&mut self, part: GlobalPart) -> &mut ConfigItems {
        match part {
            GlobalPart::Implicit => &mut *self.implicit,
            GlobalPart::Explicit => &mut *self.explicit,
        }
    }

    pub fn implicit(&self) -> &ConfigItems {
        &*self.implicit
    }

    pub fn explicit(&self) -> &ConfigItems {
        &*self.explicit
    }

    pub fn len(&self) -> usize {
        self.implicit.len() + self.explicit.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetal only while both physical sections are
    pub fn is_fetal(&self) -> bool {
        self.implicit.is_fetal() && self.explicit.is_fetal()
    }

    /// Section that receives brand-new keys
    pub fn write_target(&self) -> GlobalPart {
        if !self.explicit.is_fetal() {
            GlobalPart::Explicit
        } else if !self.implicit.is_fetal() {
            GlobalPart::Implicit
        } else {
            GlobalPart::Explicit
        }
    }

    /// Physical section already holding a setting for `key`, fetal or not
    fn locate_key(&self, key: &str) -> Option<GlobalPart> {
        [GlobalPart::Implicit, GlobalPart::Explicit]
            .into_iter()
            .find(|&part| self.part(part).position(key).is_some())
    }

    /// Physical section holding a materialized setting for `key`
    fn locate_live_key(&self, key: &str) -> Option<GlobalPart> {
        [GlobalPart::Implicit, GlobalPart::Explicit]
            .into_iter()
            .find(|&part| self.part(part).contains_key(key))
    }

    /// Section a write to `key` lands in: the one holding the live setting,
    /// then one holding a placeholder, then the write target. Placeholders
    /// for `key` in the other section are discarded so only one setting
    /// can come to life.
    fn route(&mut self, key: &str) -> GlobalPart {
        let part = self
            .locate_live_key(key)
            .or_else(|| self.locate_key(key))
            .unwrap_or_else(|| self.write_target());
        self.part_mut(part.other()).drop_fetal(key);
        part
    }

    /// Map a flattened index to its physical section and local offset
    pub fn resolve(&self, index: usize) -> Result<(GlobalPart, usize)> {
        let split = self.implicit.len();
        if index < split {
            Ok((GlobalPart::Implicit, index))
        } else if index < self.len() {
            Ok((GlobalPart::Explicit, index - split))
        } else {
            Err(ConfigError::IndexOutOfRange {
                index,
                len: self.len(),
            })
        }
    }

    fn resolve_range(&self, range: &Range<usize>) -> Result<(GlobalPart, Range<usize>)> {
        let split = self.implicit.len();
        if range.start > range.end || range.end > self.len() {
            return Err(ConfigError::IndexOutOfRange {
                index: range.end,
                len: self.len(),
            });
        }
        if range.end <= split {
            Ok((GlobalPart::Implicit, range.clone()))
        } else if range.start >= split {
            Ok((GlobalPart::Explicit, range.start - split..range.end - split))
        } else {
            Err(ConfigError::NotSupported(format!(
                "range {}..{} spans both {} and {}",
                range.start, range.end, IMPLICIT_GLOBAL, GLOBAL
            )))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigItem> + '_ {
        self.implicit.iter().chain(self.explicit.iter())
    }

    pub fn iter_key_values(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.implicit
            .iter_key_values()
            .chain(self.explicit.iter_key_values())
    }

    pub fn iter_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter_key_values().map(|(key, _)| key)
    }

    pub fn iter_values(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter_key_values().map(|(_, value)| value)
    }

    pub fn iter_explicit(&self) -> impl Iterator<Item = &ConfigItem> + '_ {
        self.implicit
            .iter_explicit()
            .chain(self.explicit.iter_explicit())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.locate_live_key(key).is_some()
    }

    pub fn contains_comment(&self, text: &str) -> bool {
        self.implicit.contains_comment(text) || self.explicit.contains_comment(text)
    }

    /// Materialized setting with `key`, implicit section first
    pub fn find(&self, key: &str) -> Option<&ConfigItem> {
        self.implicit.find(key).or_else(|| self.explicit.find(key))
    }

    pub fn value_or_default(&self, key: &str) -> Option<String> {
        match self.find(key).and_then(ConfigItem::value) {
            Some(value) => Some(value.to_string()),
            None => self.find_default(key),
        }
    }

    pub fn find_default(&self, key: &str) -> Option<String> {
        self.part(self.write_target()).find_default(key)
    }

    /// Setting with `key` from whichever section holds it, materializing
    /// a fetal item in the write target on a miss
    pub fn get(&mut self, key: &str) -> ItemMut<'_> {
        let part = self.route(key);
        self.part_mut(part).get(key)
    }

    pub fn get_index(&self, index: usize) -> Option<&ConfigItem> {
        let (part, local) = self.resolve(index).ok()?;
        self.part(part).get_index(local)
    }

    pub fn index_mut(&mut self, index: usize) -> Result<ItemMut<'_>> {
        let (part, local) = self.resolve(index)?;
        self.part_mut(part).index_mut(local)
    }

    /// Set `key`, updating it where it lives or adding it to the write target
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let part = self.route(key);
        self.part_mut(part).set(key, value)
    }

    pub fn set_item(&mut self, key: &str, item: ConfigItem) -> Result<()> {
        let part = self.route(key);
        self.part_mut(part).set_item(key, item)
    }

    pub fn delete(&mut self, key: &str) -> Result<ConfigItem> {
        let part = self
            .locate_live_key(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;
        self.part_mut(part).delete(key)
    }

    /// Append `item` to the section already holding its key (superseding
    /// the old setting there), or to the write target
    pub fn append(&mut self, item: ConfigItem) {
        let part = if item.is_comment() {
            self.write_target()
        } else {
            self.route(item.key())
        };
        self.part_mut(part).append(item);
    }

    pub fn extend(&mut self, items: impl IntoIterator<Item = ConfigItem>) {
        for item in items {
            self.append(item);
        }
    }

    /// Insert before flattened position `index`. The boundary index
    /// belongs to the start of `global`.
    pub fn insert(&mut self, index: usize, item: ConfigItem) -> Result<()> {
        let split = self.implicit.len();
        if index > self.len() {
            return Err(ConfigError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        if !item.is_comment() {
            let target = if index < split {
                GlobalPart::Implicit
            } else {
                GlobalPart::Explicit
            };
            if let Some(part) = self.locate_live_key(item.key()) {
                if target == part.other() {
                    return Err(ConfigError::NotSupported(format!(
                        "moving \"{}\" between {} and {}",
                        item.key(),
                        IMPLICIT_GLOBAL,
                        GLOBAL
                    )));
                }
            }
            self.part_mut(target.other()).drop_fetal(item.key());
        }
        if index < split {
            self.implicit.insert(index, item);
        } else {
            self.explicit.insert(index - split, item);
        }
        Ok(())
    }

    pub fn insert_before(&mut self, key: &str, item: ConfigItem) -> Result<()> {
        let part = self
            .locate_live_key(key)
            .or_else(|| self.locate_key(key))
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;
        let local = self
            .part(part)
            .position(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;
        let index = match part {
            GlobalPart::Implicit => local,
            GlobalPart::Explicit => self.implicit.len() + local,
        };
        self.insert(index, item)
    }

    pub fn remove_at(&mut self, index: usize) -> Result<ConfigItem> {
        let (part, local) = self.resolve(index)?;
        self.part_mut(part).remove_at(local)
    }

    pub fn replace_at(&mut self, index: usize, item: ConfigItem) -> Result<ConfigItem> {
        let (part, local) = self.resolve(index)?;
        self.part_mut(part).replace_at(local, item)
    }

    /// Items within `range`; fails for ranges spanning both sections
    pub fn slice(&self, range: Range<usize>) -> Result<&[ConfigItem]> {
        let (part, local) = self.resolve_range(&range)?;
        self.part(part).slice(local)
    }

    pub fn remove_range(&mut self, range: Range<usize>) -> Result<Vec<ConfigItem>> {
        let (part, local) = self.resolve_range(&range)?;
        self.part_mut(part).remove_range(local)
    }

    pub fn pop(&mut self) -> Option<ConfigItem> {
        self.explicit.pop().or_else(|| self.implicit.pop())
    }

    pub fn reverse(&mut self) -> Result<()> {
        Err(ConfigError::NotSupported(
            "reversing the merged global section".to_string(),
        ))
    }

    pub fn sort(&mut self) -> Result<()> {
        Err(ConfigError::NotSupported(
            "sorting the merged global section".to_string(),
        ))
    }

    pub fn repeat(&self, _times: usize) -> Result<ConfigItems> {
        Err(ConfigError::NotSupported(
            "repeating a configuration section".to_string(),
        ))
    }
}
