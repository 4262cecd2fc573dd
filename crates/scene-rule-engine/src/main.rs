//! 场景规则引擎命令行
//!
//! 启动时加载规则定义文件，然后从 stdin 逐行读取
//! `{"scene": "...", "fact": {...}}`，向 stdout 逐行输出匹配结果。
//!
//! 规则文件路径取自第一个命令行参数，缺省时使用配置项 `engine.rules_path`。

use anyhow::{Context, Result};
use openrule_shared::config::AppConfig;
use openrule_shared::observability::{self, ObservabilityConfig};
use rule_engine::{select_winner, ComparisonMode, Fact, RuleError, SceneRegistry};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

const SERVICE_NAME: &str = "rule-engine";

/// 单行匹配请求
#[derive(Debug, Deserialize)]
struct MatchRequest {
    scene: String,
    fact: Fact,
}

/// 单行匹配结果
#[derive(Debug, Serialize)]
struct MatchResponse {
    scene: String,
    matched: Vec<i64>,
    winner: Option<i64>,
    error: Option<String>,
}

impl MatchResponse {
    fn failed(scene: String, error: impl ToString) -> Self {
        Self {
            scene,
            matched: Vec::new(),
            winner: None,
            error: Some(error.to_string()),
        }
    }
}

fn main() -> Result<()> {
    let config = AppConfig::load(SERVICE_NAME).unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig {
            service_name: SERVICE_NAME.to_string(),
            observability: ObservabilityConfig::from_env(SERVICE_NAME),
            ..Default::default()
        }
    });

    let obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    observability::init(&obs_config)?;

    let mode: ComparisonMode = config.engine.comparison.parse()?;
    let registry = SceneRegistry::with_comparison_mode(mode);
    info!(%mode, "Scene registry initialized");

    let rules_path = std::env::args().nth(1).or_else(|| config.engine.rules_path.clone());
    match rules_path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("读取规则文件失败: {}", path))?;
            let summary = registry
                .load_definitions_json(&json)
                .with_context(|| format!("加载规则文件失败: {}", path))?;
            info!(
                path = %path,
                scenes = summary.scenes,
                entities = summary.entities,
                "Rules loaded"
            );
        }
        None => warn!("No rules file configured, every match will fail with an empty rule set"),
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(&registry, &line);
        serde_json::to_writer(&mut out, &response)?;
        writeln!(out)?;
    }

    info!("Input exhausted, shutting down");
    Ok(())
}

fn handle_line(registry: &SceneRegistry, line: &str) -> MatchResponse {
    let request: MatchRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => return MatchResponse::failed(String::new(), RuleError::from(e)),
    };

    let Some(scene) = registry.get_scene(&request.scene) else {
        let err = RuleError::SceneNotFound(request.scene.clone());
        return MatchResponse::failed(request.scene, err);
    };

    match scene.match_fact(&request.fact) {
        Ok(matched) => MatchResponse {
            winner: select_winner(&matched).ok().map(|e| e.id),
            matched: matched.iter().map(|e| e.id).collect(),
            scene: request.scene,
            error: None,
        },
        Err(e) => {
            warn!(scene = %request.scene, error = %e, "Match failed");
            MatchResponse::failed(request.scene, e)
        }
    }
}
