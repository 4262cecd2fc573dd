//! 事实匹配
//!
//! 对当前生效快照中的每个实体按条件顺序短路求值。
//! 任一条件所需字段在事实中缺失、类型不符时整次调用失败，不返回部分结果。

use crate::error::{Result, RuleError};
use crate::evaluator::ConditionEvaluator;
use crate::models::{Fact, FieldDef, RuleEntity};
use crate::operators::ComparisonMode;
use crate::store::Generation;
use std::collections::HashMap;
use std::sync::Arc;

/// 规则匹配器
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleMatcher {
    evaluator: ConditionEvaluator,
}

impl RuleMatcher {
    pub fn new(mode: ComparisonMode) -> Self {
        Self {
            evaluator: ConditionEvaluator::new(mode),
        }
    }

    pub fn mode(&self) -> ComparisonMode {
        self.evaluator.mode()
    }

    /// 在一个快照上匹配事实，返回命中的实体（保持快照中的顺序）
    pub fn match_generation(
        &self,
        scene: &str,
        fields: &HashMap<String, FieldDef>,
        generation: &Generation,
        fact: &Fact,
    ) -> Result<Vec<Arc<RuleEntity>>> {
        if generation.is_empty() {
            return Err(RuleError::EmptyRuleSet(scene.to_string()));
        }

        let mut matched = Vec::new();
        for entity in generation.entities() {
            if self.match_entity(scene, fields, entity, fact)? {
                matched.push(Arc::clone(entity));
            }
        }

        Ok(matched)
    }

    /// 单个实体的合取求值，兜底实体直接命中
    pub fn match_entity(
        &self,
        scene: &str,
        fields: &HashMap<String, FieldDef>,
        entity: &RuleEntity,
        fact: &Fact,
    ) -> Result<bool> {
        for cond in entity.conds() {
            let fact_value = fact
                .get(&cond.key)
                .ok_or_else(|| RuleError::MissingFactKey(cond.key.clone()))?;

            let field = fields
                .get(&cond.key)
                .ok_or_else(|| RuleError::UndeclaredField {
                    scene: scene.to_string(),
                    key: cond.key.clone(),
                })?;

            if !self.evaluator.evaluate(fact_value, field.field_type, cond)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
