//! Built-in example configuration
//!
//! The example doubles as documentation for every supported setting and as
//! the source of the global default table: whatever value the example
//! gives a global setting is that setting's default.

use crate::constants::{subconsts, Constants};
use crate::items::{is_global_section, IMPLICIT_GLOBAL};
use crate::Result;
use indexmap::IndexMap;
use std::sync::OnceLock;
use tracing::warn;

/// One line (or pair of lines) of the example configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExampleEntry {
    /// Comment or blank line
    Comment(&'static str),
    /// Written to the file even though it equals its default
    Forced(&'static str, &'static str),
    /// Documented by a commented-out `# key = value` line; held as a default
    Documented(&'static str, &'static str),
    /// Written to the file; has no default
    Informational(&'static str, &'static str),
}

impl ExampleEntry {
    /// The `(key, default)` pair this entry contributes to the default table
    pub fn default_pair(&self) -> Option<(&'static str, &'static str)> {
        match *self {
            ExampleEntry::Forced(key, value) | ExampleEntry::Documented(key, value) => {
                Some((key, value))
            }
            ExampleEntry::Comment(_) | ExampleEntry::Informational(..) => None,
        }
    }
}

use ExampleEntry::{Comment, Documented, Forced, Informational};

const GLOBAL_ENTRIES: &[ExampleEntry] = &[
    Comment("# %(framework)s.conf"),
    Comment(""),
    Comment("# This file can be modified to match your system's needs."),
    Comment("# The file has an \"ini\" type syntax of \"<name> = <value>\" pairs"),
    Comment("# preceeded by section headings enclosed with brackets,"),
    Comment("# i.e.: \"[section]\".  Each section title corresponds to a portage"),
    Comment("# package atom, i.e.: [=sys-kernel/gentoo-sources-3.15*]."),
    Comment("#"),
    Comment("# Lines beginning with a \"#\" are treated as comments.  Empty lines"),
    Comment("# are ignored.  Quotation marks are not needed and will not be"),
    Comment("# preserved by the %(prog)s utility -- their use is discouraged."),
    Comment("#"),
    Comment("# A \"[global]\" section is also supported.  Any \"<name> = <value>\""),
    Comment("# pairs appearing before any section header are considered"),
    Comment("# implicitly to be in the global section, so the \"[global]\" header"),
    Comment("# may be omitted, so long as all global settings come first."),
    Comment(""),
    Comment("# overlay"),
    Comment("# -------"),
    Comment("# default value: site-%(framework)s"),
    Comment("# scope: global only"),
    Comment("#"),
    Comment("# Name of the site-wide %(framework)s portage overlay."),
    Comment("# The overlay need not exist to be named here.  If it does"),
    Comment("# not exist it will be created automatically as required or"),
    Comment("# when the \"%(prog)s overlay create\" command is executed."),
    Comment(""),
    Forced("overlay", "site-%(framework)s"),
    Comment(""),
    Comment("# name_prefix"),
    Comment("# -----------"),
    Comment("# default value: %(prog)s_"),
    Comment("# scope: any"),
    Comment("#"),
    Comment("# Prefix applied to package names in the overlay.  For example,"),
    Comment("# if name_prefix is \"foo\", then the ebuild corresponding to"),
    Comment("# sys-kernel/gentoo-sources-3.16.3 in the overlay would be"),
    Comment("# sys-kernel/foogentoo-sources-3.16.3.  Making this empty"),
    Comment("# would result in identically named packages and is strongly"),
    Comment("# discouraged, although not technically prohibited."),
    Comment(""),
    Documented("name_prefix", "%(prog)s_"),
    Comment(""),
    Comment("# repos_conf"),
    Comment("# ----------"),
    Comment("# default value: %(eprefix)s/etc/portage/repos.conf"),
    Comment("# scope: global only"),
    Comment("#"),
    Comment("# Location of portage's repos.conf file.  If set to /dev/null,"),
    Comment("# %(framework)s will not automatically maintain the repos.conf file;"),
    Comment("# otherwise, when the overlay is created, this file will be"),
    Comment("# automatically modified to activate the %(framework)s overlay in"),
    Comment("# the portage package system."),
    Comment(""),
    Documented("repos_conf", "%(eprefix)s/etc/portage/repos.conf"),
    Comment(""),
];

const GENTOO_SOURCES_ENTRIES: &[ExampleEntry] = &[
    Comment("# Settings in this section apply to sys-kernel/gentoo-sources only."),
    Comment(""),
    Comment("# features"),
    Comment("# --------"),
    Comment("# no default value"),
    Comment("# scope: package only"),
    Comment("#"),
    Comment("# Space-separated list of %(framework)s features enabled for"),
    Comment("# ebuilds generated from this package."),
    Comment(""),
    Informational("features", "genpatches"),
    Comment(""),
];

/// Sections of the example configuration, in file order
pub const EXAMPLE_SECTIONS: &[(&str, &[ExampleEntry])] = &[
    (IMPLICIT_GLOBAL, GLOBAL_ENTRIES),
    ("sys-kernel/gentoo-sources", GENTOO_SOURCES_ENTRIES),
];

/// Example entry with its text already substituted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedEntry {
    Comment(String),
    Forced(String, String),
    Documented(String, String),
    Informational(String, String),
}

impl ResolvedEntry {
    fn resolve(entry: &ExampleEntry, constants: &Constants) -> Result<Self> {
        let sub = |text: &str| subconsts(text, constants);
        Ok(match *entry {
            Comment(text) => ResolvedEntry::Comment(sub(text)?),
            Forced(key, value) => ResolvedEntry::Forced(key.to_string(), sub(value)?),
            Documented(key, value) => ResolvedEntry::Documented(key.to_string(), sub(value)?),
            Informational(key, value) => {
                ResolvedEntry::Informational(key.to_string(), sub(value)?)
            }
        })
    }
}

/// The example configuration with placeholders substituted
pub fn example_config_data(constants: &Constants) -> Result<Vec<(String, Vec<ResolvedEntry>)>> {
    EXAMPLE_SECTIONS
        .iter()
        .map(|(name, entries)| {
            let resolved = entries
                .iter()
                .map(|entry| ResolvedEntry::resolve(entry, constants))
                .collect::<Result<Vec<_>>>()?;
            Ok((name.to_string(), resolved))
        })
        .collect()
}

/// Build the default table for the global sections
pub fn build_global_defaults(constants: &Constants) -> IndexMap<String, String> {
    let mut defaults = IndexMap::new();
    for (_, entries) in EXAMPLE_SECTIONS
        .iter()
        .filter(|(name, _)| is_global_section(name))
    {
        for (key, value) in entries.iter().filter_map(ExampleEntry::default_pair) {
            match subconsts(value, constants) {
                Ok(value) => {
                    defaults.insert(key.to_string(), value);
                }
                Err(e) => warn!("skipping default for {}: {}", key, e),
            }
        }
    }
    defaults
}

/// Default table for the process constants, computed on first use
pub fn global_defaults() -> &'static IndexMap<String, String> {
    static DEFAULTS: OnceLock<IndexMap<String, String>> = OnceLock::new();
    DEFAULTS.get_or_init(|| build_global_defaults(Constants::current()))
}
