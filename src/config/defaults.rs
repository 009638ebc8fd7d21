use super::*;

impl Default for EntsoeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            area: "NL".to_string(),
            name: None,
            api_url: "https://web-api.tp.entsoe.eu/api".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            update_interval_minutes: 60,
            window: WindowStrategy::TodayTomorrow,
            min_tomorrow_hours: 23,
            rollover: true,
        }
    }
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_minutes: 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/entsoe.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8088,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            state_file: "/data/entsoe_state.json".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entsoe: EntsoeConfig::default(),
            coordinator: CoordinatorConfig::default(),
            sensors: SensorsConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}
