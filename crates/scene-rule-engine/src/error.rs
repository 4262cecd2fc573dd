//! 规则引擎错误类型
//!
//! 所有错误统一为 `RuleError`，通过 `kind()` 区分四类：
//! - Config：场景注册、配置加载阶段的可恢复错误
//! - Fatal：规则构建时引用未声明字段或条件形状非法，属于调用方编程错误
//! - Match：单次匹配失败，整次调用的部分结果全部丢弃
//! - Selection：胜出规则选择失败

use thiserror::Error;

/// 错误分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Fatal,
    Match,
    Selection,
}

#[derive(Debug, Error)]
pub enum RuleError {
    // ==================== 配置错误 ====================
    #[error("场景名称不能为空")]
    EmptySceneName,

    #[error("场景 {0} 未定义任何字段")]
    EmptyFieldDefs(String),

    #[error("场景已存在: {0}")]
    SceneAlreadyExists(String),

    #[error("场景 {scene} 字段重复定义: {field}")]
    DuplicateField { scene: String, field: String },

    #[error("字段 {field} 的类型不受支持: {field_type}")]
    UnsupportedFieldType { field: String, field_type: String },

    #[error("场景未找到: {0}")]
    SceneNotFound(String),

    #[error("无效的集合字面量 '{literal}': {reason}")]
    InvalidSetLiteral { literal: String, reason: String },

    #[error("无效的比较模式: {0}")]
    InvalidComparisonMode(String),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),

    // ==================== 构建期致命错误 ====================
    #[error("字段未定义: scene={scene}, key={key}")]
    UndeclaredField { scene: String, key: String },

    #[error("无效的条件: key={key} 的操作符 {operator} 与字段类型 {field_type} 或取值不匹配")]
    InvalidCondition {
        key: String,
        operator: String,
        field_type: String,
    },

    // ==================== 匹配错误 ====================
    #[error("事实中缺少字段: {0}")]
    MissingFactKey(String),

    #[error("类型不匹配: key[{key}] 应为 {expected}")]
    TypeMismatch { key: String, expected: String },

    #[error("不支持的操作符: {0}")]
    UnsupportedOperator(String),

    #[error("场景 {0} 没有已加载的规则")]
    EmptyRuleSet(String),

    // ==================== 选择错误 ====================
    #[error("候选规则为空")]
    EmptyInput,
}

impl RuleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySceneName
            | Self::EmptyFieldDefs(_)
            | Self::SceneAlreadyExists(_)
            | Self::DuplicateField { .. }
            | Self::UnsupportedFieldType { .. }
            | Self::SceneNotFound(_)
            | Self::InvalidSetLiteral { .. }
            | Self::InvalidComparisonMode(_)
            | Self::JsonError(_) => ErrorKind::Config,
            Self::UndeclaredField { .. } | Self::InvalidCondition { .. } => ErrorKind::Fatal,
            Self::MissingFactKey(_)
            | Self::TypeMismatch { .. }
            | Self::UnsupportedOperator(_)
            | Self::EmptyRuleSet(_) => ErrorKind::Match,
            Self::EmptyInput => ErrorKind::Selection,
        }
    }

    /// 是否为规则构建期的致命错误（调用方应立即中止该实体的构建）
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
