//! 条件操作符定义

use crate::error::RuleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 条件操作符
///
/// 文本形式与规则定义文件中的写法一致，如 `"not in"`、`">="`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,

    #[serde(rename = "in")]
    In,
    #[serde(rename = "not in")]
    NotIn,

    // 数值比较，仅支持 Int 字段
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,

    // 事实值为序列时的集合求交
    #[serde(rename = "intersect")]
    Intersect,
    #[serde(rename = "not intersect")]
    NotIntersect,
}

impl Operator {
    /// 操作符的文本形式，与规则定义中的写法一致
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Intersect => "intersect",
            Self::NotIntersect => "not intersect",
        }
    }

    /// 是否为取反形式的操作符
    pub fn is_negated(&self) -> bool {
        matches!(self, Self::NotEq | Self::NotIn | Self::NotIntersect)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim() {
            "=" => Self::Eq,
            "!=" => Self::NotEq,
            "in" => Self::In,
            "not in" => Self::NotIn,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "<" => Self::Lt,
            "<=" => Self::Le,
            "intersect" => Self::Intersect,
            "not intersect" => Self::NotIntersect,
            other => return Err(RuleError::UnsupportedOperator(other.to_string())),
        };
        Ok(op)
    }
}

/// `<` / `<=` 的比较语义
///
/// 历史行为（Legacy）中 `<` 与 `<=` 都实现为 `!(fact > bound)`，即 `fact <= bound`。
/// Strict 模式给出字面语义：`<` 为严格小于，`<=` 为小于等于。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    #[default]
    Legacy,
    Strict,
}

impl FromStr for ComparisonMode {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "legacy" | "" => Ok(Self::Legacy),
            "strict" => Ok(Self::Strict),
            other => Err(RuleError::InvalidComparisonMode(other.to_string())),
        }
    }
}

impl fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Strict => write!(f, "strict"),
        }
    }
}
