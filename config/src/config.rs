//! Whole configuration file
//!
//! A [`Config`] maps section names to [`ConfigItems`] in file order. It is
//! bound to the path of the kernelng configuration file and to portage's
//! repos.conf, but only touches the filesystem when asked to load or save.
//!
//! ```text
//! # comment lines (or blank lines)
//! key = value          <- implicit_global
//! [global]
//! key = value          <- global
//! [sys-kernel/gentoo-sources]
//! key = value
//! ```

use crate::constants::Constants;
use crate::example::{example_config_data, ResolvedEntry};
use crate::global::GlobalSection;
use crate::items::{GLOBAL, IMPLICIT_GLOBAL};
use crate::{ConfigError, ConfigItem, ConfigItems, ConfigReason, Result};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Ordered collection of named sections
#[derive(Debug, Clone)]
pub struct Config {
    config_file: PathBuf,
    repos_conf_file: PathBuf,
    sections: IndexMap<String, ConfigItems>,
}

impl Default for Config {
    fn default() -> Self {
        let constants = Constants::current();
        Self::new(constants.config_file(), constants.repos_conf_file())
    }
}

impl Config {
    /// Create an empty configuration bound to the given files
    pub fn new(config_file: impl Into<PathBuf>, repos_conf_file: impl Into<PathBuf>) -> Self {
        Self {
            config_file: config_file.into(),
            repos_conf_file: repos_conf_file.into(),
            sections: IndexMap::new(),
        }
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn repos_conf_file(&self) -> &Path {
        &self.repos_conf_file
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Section names in file order, fetal sections included
    pub fn section_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.sections.keys().map(String::as_str)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &ConfigItems)> + '_ {
        self.sections
            .iter()
            .map(|(name, section)| (name.as_str(), section))
    }

    /// Whether a section with `name` exists and has been born
    pub fn contains_section(&self, name: &str) -> bool {
        self.sections
            .get(name)
            .map_or(false, |section| !section.is_fetal())
    }

    /// Existing section, without materializing anything
    pub fn get_section(&self, name: &str) -> Option<&ConfigItems> {
        self.sections.get(name)
    }

    /// Section with `name`, materializing an empty fetal one on a miss
    pub fn section(&mut self, name: &str) -> &mut ConfigItems {
        let index = match self.sections.get_index_of(name) {
            Some(index) => index,
            None => {
                debug!(section = name, "materializing fetal section");
                let (index, _) = self
                    .sections
                    .insert_full(name.to_string(), ConfigItems::named(name));
                self.hoist_implicit(index)
            }
        };
        &mut self.sections[index]
    }

    /// Add or replace a section, binding it to `name`
    pub fn insert_section(&mut self, name: &str, mut section: ConfigItems) -> Option<ConfigItems> {
        section.bind(name);
        let (index, old) = self.sections.insert_full(name.to_string(), section);
        self.hoist_implicit(index);
        old
    }

    /// `implicit_global` holds the lines before the first header, so it
    /// always sits first. Returns the final index of the entry at `index`.
    fn hoist_implicit(&mut self, index: usize) -> usize {
        let implicit = self
            .sections
            .get_index(index)
            .map_or(false, |(name, _)| name == IMPLICIT_GLOBAL);
        if implicit && index != 0 {
            self.sections.move_index(index, 0);
            0
        } else {
            index
        }
    }

    /// Remove a section, keeping the order of the rest
    pub fn remove_section(&mut self, name: &str) -> Result<ConfigItems> {
        self.sections
            .shift_remove(name)
            .ok_or_else(|| ConfigError::SectionNotFound(name.to_string()))
    }

    /// Name under which `section` is stored in this configuration
    pub fn section_name_of(&self, section: &ConfigItems) -> Result<&str> {
        self.sections
            .iter()
            .find(|(_, candidate)| std::ptr::eq(*candidate, section))
            .map(|(name, _)| name.as_str())
            .ok_or_else(|| {
                ConfigError::SectionNotFound(
                    section.name().unwrap_or("<detached section>").to_string(),
                )
            })
    }

    pub fn clear(&mut self) {
        self.sections.clear();
    }

    /// Merged view over `implicit_global` and `global`
    pub fn global_view(&mut self) -> Result<GlobalSection<'_>> {
        self.section(IMPLICIT_GLOBAL);
        self.section(GLOBAL);

        let mut implicit = None;
        let mut explicit = None;
        for (name, section) in self.sections.iter_mut() {
            match name.as_str() {
                IMPLICIT_GLOBAL => implicit = Some(section),
                GLOBAL => explicit = Some(section),
                _ => {}
            }
        }

        match (implicit, explicit) {
            (Some(implicit), Some(explicit)) => Ok(GlobalSection::new(implicit, explicit)),
            _ => Err(ConfigError::InvariantViolation(
                "global sections missing after materialization".to_string(),
            )),
        }
    }

    /// Replace the contents with the built-in example configuration
    pub fn load_example_config(&mut self) -> Result<()> {
        self.load_example_config_with(Constants::current())
    }

    pub fn load_example_config_with(&mut self, constants: &Constants) -> Result<()> {
        let data = example_config_data(constants)?;
        self.clear();

        for (name, entries) in data {
            let section = self.section(&name);
            for entry in entries {
                match entry {
                    ResolvedEntry::Comment(text) => section.append(ConfigItem::comment(text)),
                    ResolvedEntry::Forced(key, value) => section.append(ConfigItem::new(
                        key,
                        Some(value.clone()),
                        Some(value),
                        Some(ConfigReason::Stored),
                    )?),
                    ResolvedEntry::Documented(key, value) => {
                        section.append(ConfigItem::comment(format!("# {} = {}", key, value)));
                        section.append(ConfigItem::defaulted(key, value));
                    }
                    ResolvedEntry::Informational(key, value) => {
                        section.append(ConfigItem::stored(key, value))
                    }
                }
            }
        }

        debug!(sections = self.sections.len(), "loaded example configuration");
        Ok(())
    }

    /// Write the explicit items of every born section.
    ///
    /// Fetal sections produce nothing, not even a header; `implicit_global`
    /// comes first and never gets a header.
    pub fn write_config_text<W: Write>(&self, out: &mut W) -> Result<()> {
        let implicit = self.sections.get_key_value(IMPLICIT_GLOBAL);
        let headed = self
            .sections
            .iter()
            .filter(|(name, _)| name.as_str() != IMPLICIT_GLOBAL);

        for (name, section) in implicit.into_iter().chain(headed) {
            if section.is_fetal() {
                continue;
            }
            if name != IMPLICIT_GLOBAL {
                writeln!(out, "[{}]", name)?;
            }
            for item in section.iter_explicit() {
                match item.comment_text() {
                    Some(text) => writeln!(out, "{}", text)?,
                    None => writeln!(
                        out,
                        "{} = {}",
                        item.key(),
                        item.value().unwrap_or_default()
                    )?,
                }
            }
        }
        Ok(())
    }

    /// Serialized configuration as a string
    pub fn to_config_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_config_text(&mut buf)?;
        String::from_utf8(buf).map_err(|e| {
            ConfigError::InvariantViolation(format!("serialized configuration is not UTF-8: {}", e))
        })
    }

    /// Write the configuration to `path`, creating parent directories
    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_config_text(&mut writer)?;
        writer.flush()?;
        debug!(path = %path.display(), "wrote configuration");
        Ok(())
    }

    /// Write the configuration to the bound configuration file
    pub fn save(&self) -> Result<()> {
        self.write_to_path(&self.config_file)
    }

    /// Parse configuration text into a fresh configuration bound to the
    /// default file locations
    pub fn parse(text: &str) -> Result<Self> {
        let mut config = Self::default();
        config.read_config_text(text.as_bytes())?;
        Ok(config)
    }

    /// Replace the contents with the configuration read from `reader`
    pub fn read_config_text<R: BufRead>(&mut self, reader: R) -> Result<()> {
        self.clear();
        let mut current = IMPLICIT_GLOBAL.to_string();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = index + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                self.section(&current).append(ConfigItem::comment(line));
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| ConfigError::Parse {
                        line: lineno,
                        message: format!("malformed section header \"{}\"", trimmed),
                    })?;
                if name == IMPLICIT_GLOBAL {
                    return Err(ConfigError::Parse {
                        line: lineno,
                        message: format!("section name \"{}\" is reserved", name),
                    });
                }
                if self.contains_section(name) && name != GLOBAL {
                    warn!(section = name, line = lineno, "section repeated; merging");
                }
                current = name.to_string();
                self.section(&current).christen();
                continue;
            }

            let (key, value) = trimmed.split_once('=').ok_or_else(|| ConfigError::Parse {
                line: lineno,
                message: format!("expected \"<name> = <value>\", found \"{}\"", trimmed),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::Parse {
                    line: lineno,
                    message: "missing setting name".to_string(),
                });
            }

            let section = self.section(&current);
            if section.contains_key(key) {
                warn!(section = %current, key, line = lineno, "setting repeated; last one wins");
            }
            let default = section.find_default(key);
            section.append(ConfigItem::new(
                key,
                Some(value.trim().to_string()),
                default,
                Some(ConfigReason::Stored),
            )?);
        }

        debug!(sections = self.sections.len(), "parsed configuration");
        Ok(())
    }

    /// Replace the contents with the bound configuration file
    pub fn load(&mut self) -> Result<()> {
        let file = File::open(&self.config_file)?;
        self.read_config_text(BufReader::new(file))
    }
}
