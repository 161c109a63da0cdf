use ini::Ini;
use std::time::Duration;

pub const SECTION: &str = "virtual_desktop";

#[derive(Debug, Clone)]
pub struct Config {
    /// Period of the change detection timer when no event sink is available.
    pub poll_interval: Duration,
    /// Register an event sink when the internal manager is available.
    pub notifications: bool,
    /// Read user assigned names from the registry.
    pub registry_names: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(150),
            notifications: true,
            registry_names: true,
        }
    }
}

impl Config {
    /// Reads the `[virtual_desktop]` section of an already loaded document.
    pub fn from_ini(conf: &Ini) -> Self {
        let mut config = Config::default();
        let Some(section) = conf.section(Some(SECTION)) else {
            return config;
        };
        if let Some(v) = section.get("poll_interval_ms") {
            match v.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.poll_interval = Duration::from_millis(ms),
                _ => warn!("Invalid poll_interval_ms '{v}', using default"),
            }
        }
        if let Some(v) = section.get("notifications") {
            match Config::to_bool(v) {
                Some(v) => config.notifications = v,
                None => warn!("Invalid notifications '{v}', using default"),
            }
        }
        if let Some(v) = section.get("registry_names") {
            match Config::to_bool(v) {
                Some(v) => config.registry_names = v,
                None => warn!("Invalid registry_names '{v}', using default"),
            }
        }
        config
    }

    pub fn to_bool(v: &str) -> Option<bool> {
        match v.trim() {
            "yes" | "true" | "on" | "1" => Some(true),
            "no" | "false" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_millis(150));
        assert!(config.notifications);
        assert!(config.registry_names);
    }

    #[test]
    fn test_from_ini() {
        let conf = Ini::load_from_str(
            "[virtual_desktop]\npoll_interval_ms = 250\nnotifications = off\nregistry_names = yes\n",
        )
        .unwrap();
        let config = Config::from_ini(&conf);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert!(!config.notifications);
        assert!(config.registry_names);
    }

    #[test]
    fn test_from_ini_invalid() {
        let conf =
            Ini::load_from_str("[virtual_desktop]\npoll_interval_ms = 0\nnotifications = maybe\n")
                .unwrap();
        let config = Config::from_ini(&conf);
        assert_eq!(config.poll_interval, Duration::from_millis(150));
        assert!(config.notifications);

        let config = Config::from_ini(&Ini::new());
        assert_eq!(config.poll_interval, Duration::from_millis(150));
    }
}
