//! 集合字面量解析，如 `"US,EU"` 或 `"1|2|3"`

use crate::error::{Result, RuleError};
use crate::models::{CondVal, FieldType};
use std::collections::HashSet;

pub const DEFAULT_SEPARATOR: &str = ",";

/// 解析字符串集合，忽略空白和空项
pub fn str_set(literal: &str, sep: &str) -> HashSet<String> {
    literal
        .split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// 解析整数集合，任一项不是整数时报错
pub fn int_set(literal: &str, sep: &str) -> Result<HashSet<i64>> {
    literal
        .split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|e| RuleError::InvalidSetLiteral {
                literal: literal.to_string(),
                reason: format!("'{}': {}", s, e),
            })
        })
        .collect()
}

/// 按字段类型把集合字面量转换为条件取值
pub fn set_value(field_type: FieldType, literal: &str, sep: &str) -> Result<CondVal> {
    match field_type {
        FieldType::Int => Ok(CondVal::IntSet(int_set(literal, sep)?)),
        FieldType::String => Ok(CondVal::StrSet(str_set(literal, sep))),
    }
}
