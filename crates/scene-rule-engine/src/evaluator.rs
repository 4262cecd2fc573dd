//! 条件评估器
//!
//! 实现各操作符在 int / string 两类字段上的评估逻辑。
//! 条件的取值形状在插入时已经校验过，这里只检查事实值的类型。

use crate::error::{Result, RuleError};
use crate::models::{Cond, CondVal, FactValue, FieldType};
use crate::operators::{ComparisonMode, Operator};

/// 条件评估器
#[derive(Debug, Clone, Copy, Default)]
pub struct ConditionEvaluator {
    mode: ComparisonMode,
}

impl ConditionEvaluator {
    pub fn new(mode: ComparisonMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ComparisonMode {
        self.mode
    }

    /// 评估条件
    ///
    /// # Arguments
    /// * `fact_value` - 事实中该字段的取值
    /// * `field_type` - 字段声明的类型
    /// * `cond` - 已通过校验的条件
    pub fn evaluate(
        &self,
        fact_value: &FactValue,
        field_type: FieldType,
        cond: &Cond,
    ) -> Result<bool> {
        match cond.operator {
            Operator::Eq | Operator::NotEq => {
                let equal = match field_type {
                    FieldType::Int => Self::fact_int(fact_value, cond)? == Self::bound(cond)?,
                    FieldType::String => {
                        let expected = match &cond.value {
                            CondVal::Str(s) => s.as_str(),
                            _ => return Err(Self::invalid(cond, field_type)),
                        };
                        Self::fact_str(fact_value, cond)? == expected
                    }
                };
                Ok(equal != cond.operator.is_negated())
            }
            Operator::In | Operator::NotIn => {
                let found = match (field_type, &cond.value) {
                    (FieldType::Int, CondVal::IntSet(set)) => {
                        set.contains(&Self::fact_int(fact_value, cond)?)
                    }
                    (FieldType::String, CondVal::StrSet(set)) => {
                        set.contains(Self::fact_str(fact_value, cond)?)
                    }
                    _ => return Err(Self::invalid(cond, field_type)),
                };
                Ok(found != cond.operator.is_negated())
            }
            Operator::Gt => Ok(Self::fact_int(fact_value, cond)? > Self::bound(cond)?),
            Operator::Ge => Ok(Self::fact_int(fact_value, cond)? >= Self::bound(cond)?),
            Operator::Lt => {
                let fact = Self::fact_int(fact_value, cond)?;
                let bound = Self::bound(cond)?;
                Ok(match self.mode {
                    ComparisonMode::Legacy => !(fact > bound),
                    ComparisonMode::Strict => fact < bound,
                })
            }
            Operator::Le => {
                let fact = Self::fact_int(fact_value, cond)?;
                let bound = Self::bound(cond)?;
                // Legacy 下与 `<` 完全相同
                Ok(match self.mode {
                    ComparisonMode::Legacy => !(fact > bound),
                    ComparisonMode::Strict => fact <= bound,
                })
            }
            Operator::Intersect | Operator::NotIntersect => {
                let hit = match (field_type, &cond.value) {
                    (FieldType::Int, CondVal::IntSet(set)) => {
                        let values = fact_value
                            .as_int_list()
                            .ok_or_else(|| Self::mismatch(cond, "[]int"))?;
                        values.iter().any(|v| set.contains(v))
                    }
                    (FieldType::String, CondVal::StrSet(set)) => {
                        let values = fact_value
                            .as_str_list()
                            .ok_or_else(|| Self::mismatch(cond, "[]string"))?;
                        values.iter().any(|v| set.contains(v))
                    }
                    _ => return Err(Self::invalid(cond, field_type)),
                };
                Ok(hit != cond.operator.is_negated())
            }
        }
    }

    fn fact_int(value: &FactValue, cond: &Cond) -> Result<i64> {
        value.as_int().ok_or_else(|| Self::mismatch(cond, "int"))
    }

    fn fact_str<'a>(value: &'a FactValue, cond: &Cond) -> Result<&'a str> {
        value.as_str().ok_or_else(|| Self::mismatch(cond, "string"))
    }

    fn bound(cond: &Cond) -> Result<i64> {
        match cond.value {
            CondVal::Int(v) => Ok(v),
            _ => Err(Self::invalid(cond, FieldType::Int)),
        }
    }

    fn mismatch(cond: &Cond, expected: &str) -> RuleError {
        RuleError::TypeMismatch {
            key: cond.key.clone(),
            expected: expected.to_string(),
        }
    }

    fn invalid(cond: &Cond, field_type: FieldType) -> RuleError {
        RuleError::InvalidCondition {
            key: cond.key.clone(),
            operator: cond.operator.to_string(),
            field_type: field_type.to_string(),
        }
    }
}
