//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::observability::ObservabilityConfig;

/// 规则引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `<` / `<=` 的比较语义：legacy（历史行为）或 strict
    pub comparison: String,
    /// 规则定义文件（JSON），为空时以空注册表启动
    pub rules_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            comparison: "legacy".to_string(),
            rules_path: None,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub observability: ObservabilityConfig,
    pub engine: EngineConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（OPENRULE_ 前缀，层级用双下划线，如 OPENRULE_ENGINE__RULES_PATH -> engine.rules_path）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("OPENRULE_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(service_name, &env, Path::new(&config_dir))
    }

    /// 从指定目录加载配置
    pub fn load_from(
        service_name: &str,
        env: &str,
        config_dir: &Path,
    ) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix("OPENRULE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;
        config.observability.service_name = config.service_name.clone();

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn temp_config_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("openrule-config-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.engine.comparison, "legacy");
        assert!(config.engine.rules_path.is_none());
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        let dir = temp_config_dir("empty");

        let config = AppConfig::load_from("rule-engine", "test", &dir).unwrap();

        assert_eq!(config.service_name, "rule-engine");
        assert_eq!(config.environment, "test");
        assert_eq!(config.engine.comparison, "legacy");
        assert_eq!(config.observability.service_name, "rule-engine");
    }

    #[test]
    fn test_service_file_overrides_default_file() {
        let dir = temp_config_dir("layered");
        fs::write(
            dir.join("default.toml"),
            "[engine]\ncomparison = \"legacy\"\nrules_path = \"rules/default.json\"\n",
        )
        .unwrap();
        fs::write(
            dir.join("rule-engine.toml"),
            "[engine]\ncomparison = \"strict\"\n\n[observability]\njson_logs = true\n",
        )
        .unwrap();

        let config = AppConfig::load_from("rule-engine", "test", &dir).unwrap();

        assert_eq!(config.engine.comparison, "strict");
        assert_eq!(config.engine.rules_path.as_deref(), Some("rules/default.json"));
        assert!(config.observability.json_logs);
    }
}
