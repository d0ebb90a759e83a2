//! Program constants and placeholder substitution
//!
//! Text shipped with kernelng (the example configuration, help text) is
//! written with `%(name)s` placeholders for a handful of constants:
//!
//! - `prog`: name the program was invoked as
//! - `progdesc`: human-readable description of the tool
//! - `framework`: name of the eclass framework the overlay serves
//! - `eprefix`: Gentoo prefix the system is installed under (usually empty)

use crate::{ConfigError, Result};
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Fallback program name when `argv[0]` is unavailable
pub const DEFAULT_PROGNAME: &str = "kernelng";

/// Human-readable description of the tool
pub const PROGDESC: &str = "kernel-ng-util";

/// Name of the eclass framework
pub const FRAMEWORK: &str = "kernel-ng";

/// Portage configuration directory (relative to the prefix)
pub const PORTAGE_CONF_DIR: &str = "/etc/portage";

/// Name of portage's repository configuration file
pub const REPOS_CONF: &str = "repos.conf";

/// Environment variable consulted for the Gentoo prefix
pub const EPREFIX_ENV: &str = "EPREFIX";

/// Values substituted into `%(name)s` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constants {
    pub prog: String,
    pub progdesc: String,
    pub framework: String,
    pub eprefix: String,
}

impl Default for Constants {
    fn default() -> Self {
        Self {
            prog: DEFAULT_PROGNAME.to_string(),
            progdesc: PROGDESC.to_string(),
            framework: FRAMEWORK.to_string(),
            eprefix: String::new(),
        }
    }
}

impl Constants {
    /// Build constants from the running process (`argv[0]` and `EPREFIX`)
    pub fn from_env() -> Self {
        let prog = std::env::args()
            .next()
            .and_then(|arg0| {
                arg0.rsplit(std::path::MAIN_SEPARATOR)
                    .next()
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| DEFAULT_PROGNAME.to_string());

        Self {
            prog,
            eprefix: std::env::var(EPREFIX_ENV).unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Process-wide constants, computed on first use
    pub fn current() -> &'static Constants {
        static CURRENT: OnceLock<Constants> = OnceLock::new();
        CURRENT.get_or_init(Constants::from_env)
    }

    /// Look up a constant by placeholder name
    pub fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "prog" => Some(&self.prog),
            "progdesc" => Some(&self.progdesc),
            "framework" => Some(&self.framework),
            "eprefix" => Some(&self.eprefix),
            _ => None,
        }
    }

    /// Directory holding the kernelng configuration file
    pub fn config_dir(&self) -> PathBuf {
        PathBuf::from(format!("{}/etc/{}", self.eprefix, self.framework))
    }

    /// Default location of the kernelng configuration file
    pub fn config_file(&self) -> PathBuf {
        self.config_dir().join(format!("{}.conf", self.framework))
    }

    /// Default location of portage's repos.conf
    pub fn repos_conf_file(&self) -> PathBuf {
        PathBuf::from(format!("{}{}", self.eprefix, PORTAGE_CONF_DIR)).join(REPOS_CONF)
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"%\([^)]*\)[^\W\d_]").expect("Invalid placeholder regex"))
}

fn substitution_error(text: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Substitution {
        text: text.to_string(),
        message: message.into(),
    }
}

/// Replace `%(name)s` placeholders in `text` with the named constants.
///
/// Text without any placeholder is returned unchanged, stray `%` signs
/// included. Once a placeholder is present every `%` is a directive: `%%`
/// yields a literal `%`, and anything malformed is an error.
pub fn subconsts(text: &str, constants: &Constants) -> Result<String> {
    if !placeholder_regex().is_match(text) {
        return Ok(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];

        if let Some(after) = tail.strip_prefix('%') {
            out.push('%');
            rest = after;
            continue;
        }

        let inner = tail
            .strip_prefix('(')
            .ok_or_else(|| substitution_error(text, "expected \"(\" after \"%\""))?;
        let close = inner
            .find(')')
            .ok_or_else(|| substitution_error(text, "unterminated \"%(\""))?;
        let name = &inner[..close];

        let mut conversion = inner[close + 1..].chars();
        match conversion.next() {
            Some('s') => {}
            Some(c) => {
                return Err(substitution_error(
                    text,
                    format!("unsupported conversion \"{}\" for \"{}\"", c, name),
                ))
            }
            None => return Err(substitution_error(text, "incomplete format")),
        }

        let value = constants
            .lookup(name)
            .ok_or_else(|| substitution_error(text, format!("unknown constant \"{}\"", name)))?;
        out.push_str(value);
        rest = conversion.as_str();
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constants() -> Constants {
        Constants {
            prog: "kng".to_string(),
            eprefix: "/prefix".to_string(),
            ..Constants::default()
        }
    }

    #[test]
    fn test_plain_text_unchanged() {
        let c = constants();
        assert_eq!(subconsts("no tokens here", &c).unwrap(), "no tokens here");
        assert_eq!(subconsts("100% literal", &c).unwrap(), "100% literal");
    }

    #[test]
    fn test_substitutes_named_constants() {
        let c = constants();
        assert_eq!(
            subconsts("site-%(framework)s", &c).unwrap(),
            "site-kernel-ng"
        );
        assert_eq!(
            subconsts("%(eprefix)s/etc/portage/repos.conf", &c).unwrap(),
            "/prefix/etc/portage/repos.conf"
        );
        assert_eq!(subconsts("%(prog)s_ 50%%", &c).unwrap(), "kng_ 50%");
    }

    #[test]
    fn test_malformed_tokens() {
        let c = constants();
        assert!(matches!(
            subconsts("%(nope)s", &c),
            Err(ConfigError::Substitution { .. })
        ));
        assert!(matches!(
            subconsts("%(prog)d", &c),
            Err(ConfigError::Substitution { .. })
        ));
        assert!(matches!(
            subconsts("%(prog)s and 5% more", &c),
            Err(ConfigError::Substitution { .. })
        ));
    }

    #[test]
    fn test_paths() {
        let c = constants();
        assert_eq!(
            c.config_file(),
            PathBuf::from("/prefix/etc/kernel-ng/kernel-ng.conf")
        );
        assert_eq!(
            c.repos_conf_file(),
            PathBuf::from("/prefix/etc/portage/repos.conf")
        );
        assert_eq!(
            Constants::default().config_file(),
            PathBuf::from("/etc/kernel-ng/kernel-ng.conf")
        );
    }
}
