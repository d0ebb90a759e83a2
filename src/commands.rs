//! `config` subcommand handlers
//!
//! Each handler loads the configuration file, performs one operation, and
//! saves the file back when the operation changed it.

use anyhow::{bail, Context, Result};
use config::{Config, ConfigLoader};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Files the configuration is bound to
#[derive(Debug, Clone)]
pub struct Paths {
    pub config: PathBuf,
    pub repos_conf: PathBuf,
}

impl Paths {
    fn load(&self) -> Result<Config> {
        ConfigLoader::new(&self.config)
            .repos_conf(&self.repos_conf)
            .load()
            .with_context(|| format!("Failed to load {}", self.config.display()))
    }

    fn save(&self, config: &Config) -> Result<()> {
        config
            .save()
            .with_context(|| format!("Failed to write {}", self.config.display()))?;
        info!("Updated {}", self.config.display());
        Ok(())
    }
}

/// Print the built-in example configuration
pub fn cmd_example(out: &mut impl Write) -> Result<()> {
    let mut config = Config::default();
    config.load_example_config()?;
    config.write_config_text(out)?;
    Ok(())
}

/// Write the example configuration to the configuration file
pub fn cmd_init(paths: &Paths, force: bool) -> Result<()> {
    if paths.config.exists() && !force {
        bail!(
            "{} already exists; use --force to overwrite it",
            paths.config.display()
        );
    }

    let mut config = Config::new(&paths.config, &paths.repos_conf);
    config.load_example_config()?;
    paths.save(&config)
}

/// Print the stored configuration
pub fn cmd_show(paths: &Paths, out: &mut impl Write) -> Result<()> {
    let config = paths.load()?;
    config.write_config_text(out)?;
    Ok(())
}

/// Print the value of a setting, falling back to its default
pub fn cmd_get(paths: &Paths, key: &str, section: Option<&str>, out: &mut impl Write) -> Result<()> {
    let mut config = paths.load()?;

    let value = match section {
        Some(name) => config
            .get_section(name)
            .and_then(|section| section.value_or_default(key)),
        None => config.global_view()?.value_or_default(key),
    };

    match value {
        Some(value) => {
            writeln!(out, "{}", value)?;
            Ok(())
        }
        None => bail!("{} is not set", describe(key, section)),
    }
}

/// Change a setting and save the configuration
pub fn cmd_set(paths: &Paths, key: &str, value: &str, section: Option<&str>) -> Result<()> {
    let mut config = paths.load()?;

    match section {
        Some(name) => config.section(name).set(key, value)?,
        None => config.global_view()?.set(key, value)?,
    }

    paths.save(&config)
}

/// Revert a setting to its default, or remove it, and save
pub fn cmd_unset(paths: &Paths, key: &str, section: Option<&str>) -> Result<()> {
    let mut config = paths.load()?;

    match section {
        Some(name) => {
            let section = config.section(name);
            if !section.contains_key(key) {
                bail!("{} is not set", describe(key, Some(name)));
            }
            section.get(key).delete_value()?;
        }
        None => {
            let mut global = config.global_view()?;
            if !global.contains_key(key) {
                bail!("{} is not set", describe(key, None));
            }
            global.get(key).delete_value()?;
        }
    }

    paths.save(&config)
}

fn describe(key: &str, section: Option<&str>) -> String {
    match section {
        Some(name) => format!("\"{}\" in [{}]", key, name),
        None => format!("\"{}\"", key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn paths(dir: &TempDir) -> Paths {
        Paths {
            config: dir.path().join("etc/kernel-ng/kernel-ng.conf"),
            repos_conf: dir.path().join("repos.conf"),
        }
    }

    fn get(paths: &Paths, key: &str, section: Option<&str>) -> Result<String> {
        let mut out = Vec::new();
        cmd_get(paths, key, section, &mut out)?;
        Ok(String::from_utf8(out)?.trim_end().to_string())
    }

    #[test]
    fn test_example_output() {
        let mut out = Vec::new();
        cmd_example(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[sys-kernel/gentoo-sources]"));
        assert!(text.contains("overlay = site-kernel-ng"));
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = TempDir::new("kernelng").unwrap();
        let paths = paths(&dir);
        cmd_init(&paths, false).unwrap();
        assert!(paths.config.is_file());
        assert!(cmd_init(&paths, false).is_err());
        cmd_init(&paths, true).unwrap();
    }

    #[test]
    fn test_get_falls_back_to_default() {
        let dir = TempDir::new("kernelng").unwrap();
        let paths = paths(&dir);
        assert_eq!(get(&paths, "overlay", None).unwrap(), "site-kernel-ng");
        assert!(get(&paths, "bogus", None).is_err());
        assert!(get(&paths, "overlay", Some("sys-kernel/gentoo-sources")).is_err());
    }

    #[test]
    fn test_set_and_unset_global() {
        let dir = TempDir::new("kernelng").unwrap();
        let paths = paths(&dir);

        cmd_set(&paths, "overlay", "site-kernels", None).unwrap();
        assert_eq!(get(&paths, "overlay", None).unwrap(), "site-kernels");
        let text = std::fs::read_to_string(&paths.config).unwrap();
        assert_eq!(text, "[global]\noverlay = site-kernels\n");

        cmd_unset(&paths, "overlay", None).unwrap();
        assert_eq!(get(&paths, "overlay", None).unwrap(), "site-kernel-ng");
        let text = std::fs::read_to_string(&paths.config).unwrap();
        assert_eq!(text, "[global]\n");

        assert!(cmd_unset(&paths, "overlay", None).is_err());
    }

    #[test]
    fn test_set_and_unset_package_section() {
        let dir = TempDir::new("kernelng").unwrap();
        let paths = paths(&dir);
        let section = Some("sys-kernel/gentoo-sources");

        cmd_init(&paths, false).unwrap();
        cmd_set(&paths, "features", "genpatches experimental", section).unwrap();
        assert_eq!(
            get(&paths, "features", section).unwrap(),
            "genpatches experimental"
        );

        cmd_unset(&paths, "features", section).unwrap();
        assert!(get(&paths, "features", section).is_err());

        let mut out = Vec::new();
        cmd_show(&paths, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[sys-kernel/gentoo-sources]"));
        assert!(!text.contains("features ="));
    }
}
