//! Command-line flags for registered options
//!
//! [`FlagBridge::project`] snapshots the registered options, [`FlagBridge::augment`]
//! adds one `--<key> <VALUE>` argument per option to a `clap` command, and
//! after parsing [`FlagBridge::apply`] writes explicitly given values into the
//! matching slots.

use crate::error::Result;
use crate::registry::Registry;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::collections::HashSet;

#[derive(Debug, Clone)]
struct FlagSeed {
    key: String,
    seed: String,
    help: String,
}

#[derive(Debug, Clone, Default)]
pub struct FlagBridge {
    flags: Vec<FlagSeed>,
}

impl FlagBridge {
    /// Capture one flag per registered option, seeded with the option's default.
    ///
    /// Options registered afterwards get no flag.
    pub fn project(registry: &Registry) -> Self {
        let flags = registry
            .concrete()
            .map(|(key, entry)| FlagSeed {
                key: key.clone(),
                seed: entry.binding.default_value().map(|v| v.raw_text()).unwrap_or_default(),
                help: entry.description.clone(),
            })
            .collect();
        Self { flags }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.flags.iter().map(|flag| flag.key.as_str())
    }

    /// Add the projected flags to `command`.
    ///
    /// A key that clashes with an argument already on the command, by id or by
    /// long name, or with clap's generated `--help`/`--version`, is dropped from
    /// the bridge, so the host's argument is never read back as an option.
    pub fn augment(&mut self, command: Command) -> Command {
        let mut added = Vec::with_capacity(self.flags.len());
        let mut command = command;
        for flag in self.flags.drain(..) {
            if clashes(&command, &flag.key) {
                tracing::warn!(key = %flag.key, "option key clashes with an existing argument");
                continue;
            }
            command = command.arg(
                Arg::new(flag.key.clone())
                    .long(flag.key.clone())
                    .value_name("VALUE")
                    .help(flag.help.clone())
                    .default_value(flag.seed.clone())
                    .action(ArgAction::Set),
            );
            added.push(flag);
        }
        self.flags = added;
        command
    }

    /// Keys whose flags were given explicitly on the command line.
    pub fn specified_keys(&self, matches: &ArgMatches) -> Vec<String> {
        let present: HashSet<&str> = matches.ids().map(|id| id.as_str()).collect();
        self.flags
            .iter()
            .filter(|flag| present.contains(flag.key.as_str()))
            .filter(|flag| matches.value_source(&flag.key) == Some(ValueSource::CommandLine))
            .map(|flag| flag.key.clone())
            .collect()
    }

    /// Overlay explicitly given flag values onto the registry's slots.
    ///
    /// Seeds are never written back, so a flag left at its default cannot
    /// mask a document value. Returns the keys that were applied.
    pub fn apply(&self, registry: &mut Registry, matches: &ArgMatches) -> Result<Vec<String>> {
        let overrides = self
            .specified_keys(matches)
            .into_iter()
            .filter_map(|key| {
                let value = matches.try_get_one::<String>(&key).ok().flatten()?.clone();
                Some((key, value))
            })
            .collect();
        registry.apply_overrides(overrides)
    }
}

fn clashes(command: &Command, key: &str) -> bool {
    let generated = (key == "help" && !command.is_disable_help_flag_set())
        || (key == "version"
            && !command.is_disable_version_flag_set()
            && (command.get_version().is_some() || command.get_long_version().is_some()));
    generated
        || command
            .get_arguments()
            .any(|arg| arg.get_id() == key || arg.get_long() == Some(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Phase;
    use crate::slot::Slot;
    use std::time::Duration;

    fn registry() -> (Registry, Slot<i64>, Slot<Vec<String>>, Slot<Duration>) {
        let mut registry = Registry::new();
        let workers = Slot::new(0i64);
        let repos = Slot::new(Vec::new());
        let period = Slot::new(Duration::ZERO);
        registry.register_int(&workers, "workers", 4, "worker count").unwrap();
        registry
            .register_string_list(&repos, "repos", vec!["a".into(), "b".into()], "repos to watch")
            .unwrap();
        registry
            .register_duration(&period, "period", Duration::from_secs(90), "resync period")
            .unwrap();
        (registry, workers, repos, period)
    }

    #[test]
    fn seeds_use_raw_default_text() {
        let (registry, ..) = registry();
        let mut bridge = FlagBridge::project(&registry);
        let command = bridge.augment(Command::new("svc"));
        let matches = command.try_get_matches_from(["svc"]).unwrap();

        assert_eq!(matches.get_one::<String>("workers").unwrap(), "4");
        assert_eq!(matches.get_one::<String>("repos").unwrap(), "a,b");
        assert_eq!(matches.get_one::<String>("period").unwrap(), "1m30s");
        assert!(bridge.specified_keys(&matches).is_empty());
    }

    #[test]
    fn secret_seed_is_redacted() {
        let mut registry = Registry::new();
        registry.register_secret(&Slot::default(), "token", "hunter2".into(), "API token").unwrap();
        let mut bridge = FlagBridge::project(&registry);
        let help = bridge.augment(Command::new("svc")).render_help().to_string();
        assert!(!help.contains("hunter2"));
        assert!(help.contains("--token"));
    }

    #[test]
    fn apply_overlays_only_given_flags() {
        let (mut registry, workers, repos, period) = registry();
        registry.populate_from_str("period: 5m\nworkers: 6").unwrap();

        let mut bridge = FlagBridge::project(&registry);
        let matches = bridge
            .augment(Command::new("svc"))
            .try_get_matches_from(["svc", "--repos", "x, y", "--workers", "4"])
            .unwrap();

        let mut specified = bridge.specified_keys(&matches);
        specified.sort();
        assert_eq!(specified, vec!["repos".to_string(), "workers".to_string()]);

        bridge.apply(&mut registry, &matches).unwrap();
        assert_eq!(repos.get(), vec!["x".to_string(), "y".to_string()]);
        // Given explicitly, so it wins over the document even though it equals the seed.
        assert_eq!(workers.get(), 4);
        assert_eq!(period.get(), Duration::from_secs(300));
        assert_eq!(registry.phase(), Phase::FlagsApplied);
    }

    #[test]
    fn malformed_flag_value_is_an_error() {
        let (mut registry, workers, ..) = registry();
        let mut bridge = FlagBridge::project(&registry);
        let matches = bridge
            .augment(Command::new("svc"))
            .try_get_matches_from(["svc", "--workers", "lots"])
            .unwrap();
        assert!(bridge.apply(&mut registry, &matches).is_err());
        assert_eq!(workers.get(), 4);
    }

    #[test]
    fn clashing_keys_leave_host_arguments_alone() {
        let mut registry = Registry::new();
        let verbose = Slot::new(false);
        let org = Slot::new(String::new());
        registry.register_bool(&verbose, "verbose", false, "log more").unwrap();
        registry.register_string(&org, "org", "kubernetes".into(), "GitHub org").unwrap();
        registry.register_int(&Slot::new(0i64), "workers", 4, "worker count").unwrap();

        let mut bridge = FlagBridge::project(&registry);
        let command = Command::new("svc")
            .arg(Arg::new("verbose").long("verbose").action(ArgAction::SetTrue))
            .arg(Arg::new("organisation").long("org"));
        let matches = bridge
            .augment(command)
            .try_get_matches_from(["svc", "--verbose", "--org", "host-owned", "--workers", "2"])
            .unwrap();

        assert!(matches.get_flag("verbose"));
        assert_eq!(bridge.keys().collect::<Vec<_>>(), vec!["workers"]);
        assert_eq!(bridge.specified_keys(&matches), vec!["workers".to_string()]);
        assert_eq!(bridge.apply(&mut registry, &matches).unwrap(), vec!["workers".to_string()]);
        assert!(!verbose.get());
        assert_eq!(org.get(), "kubernetes");
    }

    #[test]
    fn host_argument_with_same_id_is_not_read_back() {
        let mut registry = Registry::new();
        let org = Slot::new(String::new());
        registry.register_string(&org, "org", "kubernetes".into(), "GitHub org").unwrap();

        let mut bridge = FlagBridge::project(&registry);
        let command = Command::new("svc").arg(Arg::new("org").long("organisation"));
        let matches = bridge
            .augment(command)
            .try_get_matches_from(["svc", "--organisation", "host-owned"])
            .unwrap();

        assert!(bridge.specified_keys(&matches).is_empty());
        assert!(bridge.apply(&mut registry, &matches).unwrap().is_empty());
        assert_eq!(org.get(), "kubernetes");
    }

    #[test]
    fn generated_help_and_version_are_reserved() {
        let mut registry = Registry::new();
        registry.register_bool(&Slot::new(false), "help", false, "help").unwrap();
        registry.register_bool(&Slot::new(false), "version", false, "version").unwrap();

        let mut bridge = FlagBridge::project(&registry);
        let command = bridge.augment(Command::new("svc").version("1.0"));
        assert!(command.try_get_matches_from(["svc"]).is_ok());
        assert_eq!(bridge.keys().count(), 0);

        // Without a version the `version` key is free.
        let mut bridge = FlagBridge::project(&registry);
        let matches = bridge
            .augment(Command::new("svc"))
            .try_get_matches_from(["svc", "--version", "true"])
            .unwrap();
        assert_eq!(bridge.specified_keys(&matches), vec!["version".to_string()]);
    }
}
