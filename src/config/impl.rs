use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// 沿用部署脚本里的传统环境变量名，优先级高于配置文件与 SCHOOLREPORTS_ 前缀变量
const LEGACY_ENV_OVERRIDES: &[(&str, &str)] = &[
    ("app.environment", "APP_ENV"),
    ("app.log_level", "RUST_LOG"),
    ("server.host", "SERVER_HOST"),
    ("server.port", "SERVER_PORT"),
    ("server.unix_socket_path", "UNIX_SOCKET"),
    ("server.workers", "CPU_COUNT"),
    ("jwt.secret", "JWT_SECRET"),
    ("database.url", "DATABASE_URL"),
    ("cache.redis.url", "REDIS_URL"),
    ("cache.redis.key_prefix", "REDIS_KEY_PREFIX"),
    ("cache.default_ttl", "REDIS_TTL"),
    ("consolidation.title_fallback", "CONSOLIDATION_TITLE_FALLBACK"),
];

impl AppConfig {
    /// config.toml -> config.{APP_ENV}.toml -> SCHOOLREPORTS_* -> 传统环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name(&format!("config.{environment}")).required(false))
            .add_source(
                Environment::with_prefix("SCHOOLREPORTS")
                    .separator("_")
                    .try_parsing(true),
            );
        for (key, var) in LEGACY_ENV_OVERRIDES {
            builder = builder.set_override_option(*key, std::env::var(var).ok())?;
        }

        let mut app_config: AppConfig = builder.build()?.try_deserialize()?;
        app_config.resolve_workers();
        app_config.validate()?;
        Ok(app_config)
    }

    /// workers = 0 表示按 CPU 核数，且不超过 max_workers
    fn resolve_workers(&mut self) {
        if self.server.workers == 0 {
            self.server.workers = num_cpus::get().min(self.server.max_workers).max(1);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".into()));
        }
        if self.is_production() && self.jwt.secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::Message(
                "jwt.secret still has the placeholder value; set JWT_SECRET".into(),
            ));
        }
        if self.jwt.access_token_expiry <= 0 {
            return Err(ConfigError::Message(
                "jwt.access_token_expiry must be a positive number of minutes".into(),
            ));
        }
        if self.consolidation.accomplishment_category_id < 0 {
            return Err(ConfigError::Message(
                "consolidation.accomplishment_category_id must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// 全局配置；未调用 init 时按需加载，失败直接退出进程
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        Some(self.server.unix_socket_path.as_str()).filter(|path| !path.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn shipped_config() -> AppConfig {
        Config::builder()
            .add_source(File::from_str(
                include_str!("../../config.toml"),
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_shipped_config_is_valid_for_development() {
        let mut config = shipped_config();
        assert!(config.validate().is_ok());
        assert!(config.consolidation.title_fallback);

        config.resolve_workers();
        assert!(config.server.workers >= 1);
        assert!(config.server.workers <= config.server.max_workers);
    }

    #[test]
    fn test_placeholder_secret_rejected_in_production() {
        let mut config = shipped_config();
        config.app.environment = "production".into();
        assert!(config.validate().is_err());

        config.jwt.secret = "a-real-secret".into();
        assert!(config.validate().is_ok());

        config.jwt.access_token_expiry = 0;
        assert!(config.validate().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_socket_path_means_tcp() {
        let mut config = shipped_config();
        assert_eq!(config.unix_socket_path(), None);
        config.server.unix_socket_path = "/tmp/reports.sock".into();
        assert_eq!(config.unix_socket_path(), Some("/tmp/reports.sock"));
    }
}
