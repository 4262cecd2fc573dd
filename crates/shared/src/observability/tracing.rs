//! 日志初始化
//!
//! 环境过滤器 + fmt 层，支持人类可读和 JSON 两种输出格式。
//! 日志统一写到 stderr，stdout 留给业务输出。

use anyhow::Result;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use super::ObservabilityConfig;

/// 构建环境过滤器，RUST_LOG 优先于配置中的级别
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(&config.log_level))
}

/// 按配置的级别构建过滤器，无法解析时回退到 info
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化 tracing subscriber
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let fmt_layer = if config.json_logs {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter_falls_back_on_bad_level() {
        let filter = level_filter("rule_engine=verbose");
        let directives = filter.to_string();
        assert!(directives.contains("info"));
        assert!(!directives.contains("rule_engine"));
    }

    #[test]
    fn test_level_filter_keeps_valid_directives() {
        let filter = level_filter("rule_engine=debug");
        assert!(filter.to_string().contains("rule_engine=debug"));
    }
}
