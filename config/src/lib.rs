//! kernelng configuration
//!
//! This crate models the kernelng configuration file: an "ini" style file
//! of `<name> = <value>` settings grouped under `[section]` headers, where
//! every section title is a portage package atom and settings before the
//! first header belong to the global section.
//!
//! # Overview
//!
//! - [`item`]: one comment or setting, with the reason it holds its value
//! - [`items`]: one section; ordered like a list, addressable like a map
//! - [`global`]: merged view over the headerless and `[global]` sections
//! - [`config`]: the whole file; loading, writing and parsing
//! - [`example`]: built-in example configuration and global defaults
//! - [`constants`]: program constants and `%(name)s` substitution
//! - [`loader`]: locating and loading the file on disk
//!
//! Lookups never fail. Asking for a missing section or key hands out a
//! *fetal* placeholder that stays invisible until a value is assigned:
//!
//! ```rust
//! use kernelng_config::Config;
//!
//! let mut config = Config::new("/etc/kernel-ng/kernel-ng.conf", "/etc/portage/repos.conf");
//! let section = config.section("sys-kernel/gentoo-sources");
//! assert!(section.get("features").is_fetal());
//! assert!(!section.contains_key("features"));
//!
//! section.get("features").set_value("genpatches").unwrap();
//! assert_eq!(
//!     config.to_config_string().unwrap(),
//!     "[sys-kernel/gentoo-sources]\nfeatures = genpatches\n"
//! );
//! ```
//!
//! # Global settings
//!
//! ```rust
//! use kernelng_config::Config;
//!
//! let mut config = Config::new("kernel-ng.conf", "repos.conf");
//! config.load_example_config().unwrap();
//!
//! let mut global = config.global_view().unwrap();
//! global.set("overlay", "site-kernels").unwrap();
//! assert_eq!(global.find("overlay").unwrap().value(), Some("site-kernels"));
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod example;
pub mod global;
pub mod item;
pub mod items;
pub mod loader;

pub use config::Config;
pub use constants::{subconsts, Constants};
pub use error::{ConfigError, Result};
pub use example::{global_defaults, ExampleEntry};
pub use global::{GlobalPart, GlobalSection};
pub use item::{ConfigItem, ConfigReason, COMMENT_KEY};
pub use items::{is_global_section, ConfigItems, ItemMut, GLOBAL, IMPLICIT_GLOBAL};
pub use loader::ConfigLoader;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Config, ConfigError, ConfigItem, ConfigItems, ConfigLoader, ConfigReason, GlobalSection,
        Result,
    };
}
