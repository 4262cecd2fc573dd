//! 胜出规则选择

use crate::error::{Result, RuleError};
use crate::models::RuleEntity;
use std::sync::Arc;

/// 取出优先级最高的实体
///
/// 只有严格更高的优先级才会替换当前候选，同优先级时先出现者胜出。
pub fn select_winner(entities: &[Arc<RuleEntity>]) -> Result<Arc<RuleEntity>> {
    let mut winner: Option<&Arc<RuleEntity>> = None;

    for entity in entities {
        match winner {
            Some(current) if entity.priority <= current.priority => {}
            _ => winner = Some(entity),
        }
    }

    winner.cloned().ok_or(RuleError::EmptyInput)
}
