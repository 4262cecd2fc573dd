//! 规则实体构建
//!
//! 条件插入时按场景字段定义校验并写入字段优先级，全部条件加入后按优先级排序，
//! 匹配时按此顺序短路求值。

use crate::error::{Result, RuleError};
use crate::models::{Cond, FieldDef, RuleEntity};
use crate::scene::Scene;
use serde_json::Value;
use std::collections::HashMap;
use tracing::error;

/// 向实体追加一个条件
///
/// 字段未声明或条件形状非法时返回致命错误，调用方应放弃该实体。
pub fn add_condition(
    scene: &str,
    fields: &HashMap<String, FieldDef>,
    entity: &mut RuleEntity,
    mut cond: Cond,
) -> Result<()> {
    cond.priority = check_condition(scene, fields, entity.id, &cond)?;
    entity.push_cond(cond);
    Ok(())
}

/// 按场景字段定义重新校验实体的全部条件，并重写条件优先级
///
/// 实体可能在别的场景下构建，插入前必须与目标场景的字段定义一致。
pub fn check_entity(
    scene: &str,
    fields: &HashMap<String, FieldDef>,
    entity: &mut RuleEntity,
) -> Result<()> {
    let id = entity.id;
    for cond in entity.conds_mut() {
        cond.priority = check_condition(scene, fields, id, cond)?;
    }
    Ok(())
}

/// 校验单个条件，返回对应字段的优先级
fn check_condition(
    scene: &str,
    fields: &HashMap<String, FieldDef>,
    entity_id: i64,
    cond: &Cond,
) -> Result<i32> {
    let Some(field) = fields.get(&cond.key) else {
        error!(scene, key = %cond.key, entity_id, "条件引用了未定义的字段");
        return Err(RuleError::UndeclaredField {
            scene: scene.to_string(),
            key: cond.key.clone(),
        });
    };

    if !cond.is_valid_for(field.field_type) {
        error!(
            scene,
            key = %cond.key,
            operator = %cond.operator,
            field_type = %field.field_type,
            entity_id,
            "条件取值与字段类型不匹配"
        );
        return Err(RuleError::InvalidCondition {
            key: cond.key.clone(),
            operator: cond.operator.to_string(),
            field_type: field.field_type.to_string(),
        });
    }

    Ok(field.priority)
}

/// 完成实体构建：条件按优先级升序排列
pub fn finalize_entity(entity: &mut RuleEntity) {
    entity.finalize();
}

/// 绑定到场景的实体构建器，遇到第一个致命错误即停止
#[derive(Debug)]
pub struct EntityBuilder<'a> {
    scene: &'a Scene,
    entity: RuleEntity,
}

impl<'a> EntityBuilder<'a> {
    pub fn new(scene: &'a Scene, id: i64, priority: u32) -> Self {
        Self {
            scene,
            entity: RuleEntity::new(id, priority),
        }
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entity.extra_data.insert(key.into(), value.into());
        self
    }

    pub fn cond(mut self, cond: Cond) -> Result<Self> {
        self.scene.add_condition(&mut self.entity, cond)?;
        Ok(self)
    }

    pub fn conds<I: IntoIterator<Item = Cond>>(mut self, conds: I) -> Result<Self> {
        for cond in conds {
            self.scene.add_condition(&mut self.entity, cond)?;
        }
        Ok(self)
    }

    /// 返回排好序的实体
    pub fn build(self) -> RuleEntity {
        let mut entity = self.entity;
        finalize_entity(&mut entity);
        entity
    }

    /// 构建并插入场景的待切换缓冲区
    pub fn insert(self) -> Result<()> {
        let scene = self.scene;
        scene.insert_entity(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CondVal, FieldType};
    use crate::operators::{ComparisonMode, Operator};

    fn pricing() -> Scene {
        Scene::new(
            "pricing",
            vec![
                FieldDef::string("region", 2),
                FieldDef::int("amount", 1),
                FieldDef::string("tags", 3),
            ],
            ComparisonMode::Legacy,
        )
        .unwrap()
    }

    #[test]
    fn test_priority_stamped_from_field() {
        let scene = pricing();
        let mut entity = RuleEntity::new(1, 0);

        scene
            .add_condition(&mut entity, Cond::new("region", Operator::Eq, "US"))
            .unwrap();

        assert_eq!(entity.conds()[0].priority(), 2);
    }

    #[test]
    fn test_undeclared_field_is_fatal() {
        let scene = pricing();
        let mut entity = RuleEntity::new(1, 0);

        let err = scene
            .add_condition(&mut entity, Cond::new("country", Operator::Eq, "US"))
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(matches!(err, RuleError::UndeclaredField { ref key, .. } if key == "country"));
        assert!(entity.conds().is_empty());
    }

    #[test]
    fn test_invalid_shape_is_fatal() {
        let scene = pricing();
        let mut entity = RuleEntity::new(1, 0);

        // string 字段不支持数值比较
        let err = scene
            .add_condition(&mut entity, Cond::new("region", Operator::Gt, 3))
            .unwrap_err();
        assert!(err.is_fatal());

        // int 字段的 in 不能是空集合
        let err = scene
            .add_condition(
                &mut entity,
                Cond::new("amount", Operator::In, CondVal::int_set([])),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            RuleError::InvalidCondition { ref field_type, .. } if field_type == "int"
        ));
    }

    #[test]
    fn test_builder_sorts_conditions() {
        let scene = pricing();
        let entity = EntityBuilder::new(&scene, 7, 10)
            .cond(Cond::new("tags", Operator::Intersect, CondVal::str_set(["vip"])))
            .unwrap()
            .cond(Cond::new("region", Operator::Eq, "US"))
            .unwrap()
            .cond(Cond::new("amount", Operator::Ge, 100))
            .unwrap()
            .extra("discount", 15)
            .build();

        let priorities: Vec<i32> = entity.conds().iter().map(Cond::priority).collect();
        assert_eq!(priorities, vec![1, 2, 3]);
        assert!(priorities.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(entity.extra_data["discount"], 15);
        assert_eq!(scene.field("tags").unwrap().field_type, FieldType::String);
    }

    #[test]
    fn test_builder_stops_on_first_fatal_error() {
        let scene = pricing();
        let result = EntityBuilder::new(&scene, 1, 0).conds([
            Cond::new("region", Operator::Eq, "US"),
            Cond::new("unknown", Operator::Eq, 1),
            Cond::new("amount", Operator::Gt, 1),
        ]);

        assert!(result.is_err());
    }
}
