//! Behavioral tests for the kernelng configuration model

use assert_matches::assert_matches;
use kernelng_config::*;

fn empty() -> Config {
    Config::new("/tmp/kernel-ng.conf", "/tmp/repos.conf")
}

fn example() -> Config {
    let mut config = empty();
    config.load_example_config().unwrap();
    config
}

mod materialize {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_repeated_get_is_stable() {
        let mut section = ConfigItems::new();
        let first = section.get("k").clone();
        let second = section.get("k").clone();
        assert_eq!(first, second);
        assert_eq!(first.default(), second.default());
        assert!(!section.contains_key("k"));
        assert_eq!(section.len(), 1);
    }

    #[test]
    fn test_two_missing_layers() {
        let mut config = empty();
        let section = config.section("nonexistent");
        let item = section.get("somekey");
        assert!(item.is_fetal());
        assert!(!section.contains_key("somekey"));
        assert_eq!(config.to_config_string().unwrap(), "");
    }

    #[test]
    fn test_global_default_discovered() {
        let mut config = empty();
        let item = config.section(GLOBAL).get("overlay").clone();
        assert_eq!(item.default(), Some("site-kernel-ng"));
        assert_eq!(item.reason(), ConfigReason::Unresolved);

        let item = config.section("sys-kernel/gentoo-sources").get("overlay").clone();
        assert_eq!(item.default(), None);
    }

    #[test]
    fn test_assigning_default_writes_nothing() {
        let mut config = empty();
        config
            .section(IMPLICIT_GLOBAL)
            .get("overlay")
            .set_value("site-kernel-ng")
            .unwrap();
        assert!(config.contains_section(IMPLICIT_GLOBAL));
        assert_eq!(config.to_config_string().unwrap(), "");
    }
}

mod uniqueness {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_last_write_wins() {
        let mut section = ConfigItems::new();
        section.set("a", "1").unwrap();
        section.append(ConfigItem::stored("a", "2"));
        section.set("b", "x").unwrap();
        section.append(ConfigItem::stored("a", "3"));
        section.set("a", "4").unwrap();

        let keys: Vec<_> = section.iter_keys().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(section.find("a").unwrap().value(), Some("4"));
    }

    #[test]
    fn test_assign_missing_rejected() {
        let mut section = ConfigItems::new();
        assert_matches!(
            section.assign("a", None),
            Err(ConfigError::InvalidValue { .. })
        );
        assert!(section.is_empty());
    }
}

mod deletion {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delete_reverts_to_default() {
        let mut section = ConfigItems::new();
        section
            .append(ConfigItem::new("k", Some("foo".into()), Some("bar".into()), None).unwrap());
        section.get("k").delete_value().unwrap();

        let item = section.find("k").unwrap();
        assert_eq!(item.reason(), ConfigReason::Default);
        assert_eq!(item.value(), Some("bar"));
    }

    #[test]
    fn test_delete_without_default_removes() {
        let mut section = ConfigItems::new();
        section.set("k", "foo").unwrap();
        section.get("k").delete_value().unwrap();
        assert!(!section.contains_key("k"));
        assert!(section.is_empty());
    }

    #[test]
    fn test_delete_missing_key() {
        let mut config = example();
        assert_matches!(
            config.section("sys-kernel/gentoo-sources").delete("nope"),
            Err(ConfigError::KeyNotFound(key)) if key == "nope"
        );
    }

    #[test]
    fn test_default_never_written() {
        let mut config = example();
        {
            let mut global = config.global_view().unwrap();
            global.set("name_prefix", "custom_").unwrap();
        }
        assert!(config.to_config_string().unwrap().contains("\nname_prefix = custom_\n"));

        config.global_view().unwrap().get("name_prefix").delete_value().unwrap();
        let text = config.to_config_string().unwrap();
        assert!(!text.lines().any(|line| line.starts_with("name_prefix")));
    }
}

mod global_view {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_implicit_pairs_first() {
        let mut config = empty();
        config.section(GLOBAL).set("g", "2").unwrap();
        config.section(IMPLICIT_GLOBAL).set("i", "1").unwrap();

        let global = config.global_view().unwrap();
        let pairs: Vec<_> = global.iter_key_values().collect();
        assert_eq!(pairs, vec![("i", "1"), ("g", "2")]);
    }

    #[test]
    fn test_new_keys_prefer_headed_global() {
        let mut config = Config::parse("bare = 1\n[global]\n").unwrap();
        config.global_view().unwrap().set("fresh", "2").unwrap();
        assert_eq!(
            config.to_config_string().unwrap(),
            "bare = 1\n[global]\nfresh = 2\n"
        );
    }

    #[test]
    fn test_new_keys_fall_back_to_implicit() {
        let mut config = Config::parse("bare = 1\n").unwrap();
        config.global_view().unwrap().set("fresh", "2").unwrap();
        assert_eq!(config.to_config_string().unwrap(), "bare = 1\nfresh = 2\n");
    }

    #[test]
    fn test_nothing_born_targets_global() {
        let mut config = empty();
        config.global_view().unwrap().set("fresh", "2").unwrap();
        assert_eq!(config.to_config_string().unwrap(), "[global]\nfresh = 2\n");
    }

    #[test]
    fn test_existing_key_updated_in_place() {
        let mut config = Config::parse("bare = 1\n[global]\nother = 2\n").unwrap();
        config.global_view().unwrap().set("bare", "10").unwrap();
        assert_eq!(
            config.to_config_string().unwrap(),
            "bare = 10\n[global]\nother = 2\n"
        );
    }

    #[test]
    fn test_boundary_slice_not_supported() {
        let mut config = Config::parse("a = 1\n[global]\nb = 2\n").unwrap();
        let mut global = config.global_view().unwrap();
        assert_matches!(global.slice(0..2), Err(ConfigError::NotSupported(_)));
        assert_matches!(global.reverse(), Err(ConfigError::NotSupported(_)));
        assert_matches!(global.sort(), Err(ConfigError::NotSupported(_)));
        assert_eq!(global.slice(1..2).unwrap()[0].key(), "b");
    }
}

mod example_config {
    use super::*;

    #[test]
    fn test_written_example() {
        let text = example().to_config_string().unwrap();
        assert!(text.starts_with("# kernel-ng.conf\n"));
        assert!(text.contains("[sys-kernel/gentoo-sources]"));
        assert!(!text.contains("[implicit_global]"));
        assert!(text.lines().any(|line| line == "overlay = site-kernel-ng"));
        assert!(!text.lines().any(|line| line.starts_with("name_prefix")));
        assert!(!text.lines().any(|line| line.starts_with("repos_conf")));
    }

    #[test]
    fn test_reload_clears() {
        let mut config = example();
        config.section("sys-kernel/vanilla-sources").set("k", "v").unwrap();
        config.load_example_config().unwrap();
        assert!(config.get_section("sys-kernel/vanilla-sources").is_none());
    }

    #[test]
    fn test_custom_constants() {
        let constants = Constants {
            framework: "kernel-xx".to_string(),
            ..Constants::default()
        };
        let mut config = empty();
        config.load_example_config_with(&constants).unwrap();
        let text = config.to_config_string().unwrap();
        assert!(text.contains("overlay = site-kernel-xx\n"));
    }
}

mod round_trip {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stored_items_round_trip() {
        let mut config = empty();
        {
            let section = config.section("sys-kernel/gentoo-sources");
            section.append(ConfigItem::comment("# kernels"));
            section.set("features", "genpatches experimental").unwrap();
            section.append(ConfigItem::comment(""));
            section.set("name_prefix", "my_").unwrap();
        }
        let text = config.to_config_string().unwrap();
        let parsed = Config::parse(&text).unwrap();

        assert_eq!(
            parsed.get_section("sys-kernel/gentoo-sources"),
            config.get_section("sys-kernel/gentoo-sources")
        );
        assert_eq!(parsed.to_config_string().unwrap(), text);
    }

    #[test]
    fn test_late_implicit_section_stays_global() {
        let mut config = Config::parse("[sys-kernel/gentoo-sources]\nfeatures = genpatches\n").unwrap();
        config
            .section(IMPLICIT_GLOBAL)
            .set("overlay", "site-mine")
            .unwrap();

        let text = config.to_config_string().unwrap();
        let mut parsed = Config::parse(&text).unwrap();
        assert_eq!(parsed.to_config_string().unwrap(), text);
        assert_eq!(
            parsed.global_view().unwrap().find("overlay").and_then(ConfigItem::value),
            Some("site-mine")
        );
        assert_eq!(
            parsed
                .get_section("sys-kernel/gentoo-sources")
                .unwrap()
                .iter_keys()
                .collect::<Vec<_>>(),
            vec!["features"]
        );
    }

    #[test]
    fn test_global_key_written_once() {
        let mut config = Config::parse("[global]\nk = live\n").unwrap();
        config.section(IMPLICIT_GLOBAL).get("k");
        config.global_view().unwrap().set("k", "new").unwrap();

        assert_eq!(
            config.global_view().unwrap().iter_key_values().collect::<Vec<_>>(),
            vec![("k", "new")]
        );
        let text = config.to_config_string().unwrap();
        assert_eq!(text, "[global]\nk = new\n");
        assert_eq!(Config::parse(&text).unwrap().to_config_string().unwrap(), text);
    }

    #[test]
    fn test_example_round_trip() {
        let text = example().to_config_string().unwrap();
        let parsed = Config::parse(&text).unwrap();
        assert_eq!(parsed.to_config_string().unwrap(), text);
    }
}
