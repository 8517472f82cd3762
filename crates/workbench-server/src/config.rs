use std::{
    env, fmt,
    net::{AddrParseError, SocketAddr},
};

use engine::downsample::DEFAULT_MAX_POINTS;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_STORAGE_URL: &str = "http://127.0.0.1:8091/backtests";
const DEFAULT_GATE_URL: &str = "http://127.0.0.1:8092/policy_gate/assess";
const DEFAULT_SCENARIOS_URL: &str = "http://127.0.0.1:8092/policy_gate/scenarios";

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub storage_base_url: String,
    pub gate_url: String,
    pub scenarios_url: String,
    pub equity_max_points: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidListenAddr(AddrParseError),
    InvalidStorageUrl,
    InvalidGateUrl,
    InvalidScenariosUrl,
    InvalidEquityMaxPoints,
    NonUnicodeListenAddr,
    NonUnicodeStorageUrl,
    NonUnicodeGateUrl,
    NonUnicodeScenariosUrl,
    NonUnicodeEquityMaxPoints,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidListenAddr(err) => {
                write!(f, "WORKBENCH_ADDR is not a valid socket address: {err}")
            }
            Self::InvalidStorageUrl => {
                write!(f, "WORKBENCH_STORAGE_URL must not be empty or whitespace")
            }
            Self::InvalidGateUrl => {
                write!(f, "WORKBENCH_GATE_URL must not be empty or whitespace")
            }
            Self::InvalidScenariosUrl => {
                write!(f, "WORKBENCH_SCENARIOS_URL must not be empty or whitespace")
            }
            Self::InvalidEquityMaxPoints => {
                write!(
                    f,
                    "WORKBENCH_EQUITY_MAX_POINTS must be an integer of at least 2"
                )
            }
            Self::NonUnicodeListenAddr => {
                write!(f, "WORKBENCH_ADDR contains non-unicode data")
            }
            Self::NonUnicodeStorageUrl => {
                write!(f, "WORKBENCH_STORAGE_URL contains non-unicode data")
            }
            Self::NonUnicodeGateUrl => {
                write!(f, "WORKBENCH_GATE_URL contains non-unicode data")
            }
            Self::NonUnicodeScenariosUrl => {
                write!(f, "WORKBENCH_SCENARIOS_URL contains non-unicode data")
            }
            Self::NonUnicodeEquityMaxPoints => {
                write!(f, "WORKBENCH_EQUITY_MAX_POINTS contains non-unicode data")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidListenAddr(err) => Some(err),
            _ => None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen_addr = match env::var("WORKBENCH_ADDR") {
            Ok(value) => value.parse().map_err(ConfigError::InvalidListenAddr)?,
            Err(env::VarError::NotPresent) => DEFAULT_LISTEN_ADDR
                .parse()
                .expect("default listen address must be valid"),
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigError::NonUnicodeListenAddr);
            }
        };

        let storage_base_url = parse_url_env(
            "WORKBENCH_STORAGE_URL",
            DEFAULT_STORAGE_URL,
            ConfigError::InvalidStorageUrl,
            ConfigError::NonUnicodeStorageUrl,
        )?;

        let gate_url = parse_url_env(
            "WORKBENCH_GATE_URL",
            DEFAULT_GATE_URL,
            ConfigError::InvalidGateUrl,
            ConfigError::NonUnicodeGateUrl,
        )?;

        let scenarios_url = parse_url_env(
            "WORKBENCH_SCENARIOS_URL",
            DEFAULT_SCENARIOS_URL,
            ConfigError::InvalidScenariosUrl,
            ConfigError::NonUnicodeScenariosUrl,
        )?;

        let equity_max_points = match env::var("WORKBENCH_EQUITY_MAX_POINTS") {
            Ok(value) => {
                let parsed = value
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidEquityMaxPoints)?;
                if parsed < 2 {
                    return Err(ConfigError::InvalidEquityMaxPoints);
                }
                parsed
            }
            Err(env::VarError::NotPresent) => DEFAULT_MAX_POINTS,
            Err(env::VarError::NotUnicode(_)) => {
                return Err(ConfigError::NonUnicodeEquityMaxPoints);
            }
        };

        Ok(Self {
            listen_addr,
            storage_base_url,
            gate_url,
            scenarios_url,
            equity_max_points,
        })
    }
}

fn parse_url_env(
    key: &str,
    default_value: &str,
    invalid_error: ConfigError,
    non_unicode_error: ConfigError,
) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            if value.trim().is_empty() {
                return Err(invalid_error);
            }
            Ok(value)
        }
        Err(env::VarError::NotPresent) => Ok(default_value.to_owned()),
        Err(env::VarError::NotUnicode(_)) => Err(non_unicode_error),
    }
}

#[cfg(test)]
mod tests {
    use std::{env, sync::Mutex};

    use super::{Config, ConfigError};

    static ENV_LOCK: Mutex<()> = Mutex::new(());
    const ENV_ADDR_KEY: &str = "WORKBENCH_ADDR";
    const ENV_STORAGE_KEY: &str = "WORKBENCH_STORAGE_URL";
    const ENV_GATE_KEY: &str = "WORKBENCH_GATE_URL";
    const ENV_SCENARIOS_KEY: &str = "WORKBENCH_SCENARIOS_URL";
    const ENV_POINTS_KEY: &str = "WORKBENCH_EQUITY_MAX_POINTS";

    struct EnvVarGuard {
        key: &'static str,
        previous: Option<std::ffi::OsString>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }

        fn unset(key: &'static str) -> Self {
            let previous = env::var_os(key);
            env::remove_var(key);
            Self { key, previous }
        }

        #[cfg(unix)]
        fn set_os(key: &'static str, value: std::ffi::OsString) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match self.previous.take() {
                Some(value) => env::set_var(self.key, value),
                None => env::remove_var(self.key),
            }
        }
    }

    fn reset_config_env_baseline() -> [EnvVarGuard; 5] {
        [
            EnvVarGuard::unset(ENV_ADDR_KEY),
            EnvVarGuard::unset(ENV_STORAGE_KEY),
            EnvVarGuard::unset(ENV_GATE_KEY),
            EnvVarGuard::unset(ENV_SCENARIOS_KEY),
            EnvVarGuard::unset(ENV_POINTS_KEY),
        ]
    }

    #[test]
    fn defaults_apply_when_env_is_unset() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();

        let config = Config::from_env().unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.storage_base_url, "http://127.0.0.1:8091/backtests");
        assert_eq!(config.equity_max_points, 900);
    }

    #[test]
    fn uses_listen_address_override_from_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set(ENV_ADDR_KEY, "127.0.0.1:9090");

        let config = Config::from_env().unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:9090".parse().unwrap());
    }

    #[test]
    fn returns_error_for_invalid_listen_address_override() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set(ENV_ADDR_KEY, "not-an-addr");

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidListenAddr(_)));
    }

    #[test]
    fn uses_collaborator_url_overrides_from_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _storage = EnvVarGuard::set(ENV_STORAGE_KEY, "http://storage.internal/backtests");
        let _gate = EnvVarGuard::set(ENV_GATE_KEY, "http://gate.internal/assess");

        let config = Config::from_env().unwrap();

        assert_eq!(config.storage_base_url, "http://storage.internal/backtests");
        assert_eq!(config.gate_url, "http://gate.internal/assess");
    }

    #[test]
    fn returns_error_for_blank_collaborator_urls() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set(ENV_SCENARIOS_KEY, "   ");

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::InvalidScenariosUrl));
    }

    #[test]
    fn uses_equity_point_budget_override_from_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set(ENV_POINTS_KEY, "250");

        let config = Config::from_env().unwrap();

        assert_eq!(config.equity_max_points, 250);
    }

    #[test]
    fn returns_error_for_unusable_equity_point_budgets() {
        let _lock = ENV_LOCK.lock().unwrap();

        for bad in ["0", "1", "-5", "many"] {
            let _baseline = reset_config_env_baseline();
            let _guard = EnvVarGuard::set(ENV_POINTS_KEY, bad);

            let err = Config::from_env().unwrap_err();

            assert!(
                matches!(err, ConfigError::InvalidEquityMaxPoints),
                "value {bad}"
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn returns_error_for_non_unicode_env_var() {
        use std::os::unix::ffi::OsStringExt;

        let _lock = ENV_LOCK.lock().unwrap();
        let _baseline = reset_config_env_baseline();
        let _guard = EnvVarGuard::set_os(
            ENV_STORAGE_KEY,
            std::ffi::OsString::from_vec(vec![0x66, 0x6f, 0x80]),
        );

        let err = Config::from_env().unwrap_err();

        assert!(matches!(err, ConfigError::NonUnicodeStorageUrl));
    }
}
