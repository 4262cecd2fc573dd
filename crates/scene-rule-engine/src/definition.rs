//! 规则定义文件
//!
//! JSON 格式，一次描述多个场景的字段和规则实体：
//!
//! ```json
//! {
//!   "scenes": [{
//!     "name": "pricing",
//!     "fields": [{"name": "region", "type": "string", "priority": 1}],
//!     "entities": [{
//!       "id": 1,
//!       "priority": 10,
//!       "conds": [
//!         {"key": "region", "operator": "in", "set": "US,EU"},
//!         {"key": "region", "operator": "!=", "value": {"val_str": "CN"}}
//!       ],
//!       "extra_data": {"discount": 15}
//!     }]
//!   }]
//! }
//! ```

use crate::error::{Result, RuleError};
use crate::models::{Cond, CondVal, FieldDef, FieldType, RuleEntity};
use crate::operators::Operator;
use crate::parse::{set_value, DEFAULT_SEPARATOR};
use crate::scene::Scene;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleDefinitions {
    #[serde(default)]
    pub scenes: Vec<SceneDefinition>,
}

impl RuleDefinitions {
    /// 解析 JSON 规则定义文档
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// 场景字段结构，字段类型为原始文本
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSchema {
    pub name: String,
    pub fields: Vec<FieldSchema>,
}

impl SceneSchema {
    /// 转换为字段定义，字段类型不受支持时失败
    pub fn field_defs(&self) -> Result<Vec<FieldDef>> {
        self.fields.iter().map(FieldSchema::to_field_def).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDefinition {
    #[serde(flatten)]
    pub schema: SceneSchema,
    #[serde(default)]
    pub entities: Vec<EntityDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub priority: i32,
}

impl FieldSchema {
    pub fn to_field_def(&self) -> Result<FieldDef> {
        let field_type = FieldType::parse(&self.name, &self.field_type)?;
        Ok(FieldDef::new(self.name.clone(), field_type, self.priority))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub id: i64,
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub conds: Vec<CondDefinition>,
    #[serde(default)]
    pub extra_data: Map<String, Value>,
}

impl EntityDefinition {
    /// 通过场景校验每个条件并构建实体，遇到第一个错误即停止
    pub fn build(&self, scene: &Scene) -> Result<RuleEntity> {
        let mut builder = scene.entity(self.id, self.priority);
        for (key, value) in &self.extra_data {
            builder = builder.extra(key.clone(), value.clone());
        }
        for cond in &self.conds {
            builder = builder.cond(cond.to_cond(scene)?)?;
        }
        Ok(builder.build())
    }
}

/// 条件定义：`value` 给出带类型的取值，或用 `set` 给出集合字面量
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CondDefinition {
    pub key: String,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<CondVal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

impl CondDefinition {
    pub fn to_cond(&self, scene: &Scene) -> Result<Cond> {
        let operator: Operator = self.operator.parse()?;

        let value = match (&self.value, &self.set) {
            (Some(value), _) => value.clone(),
            (None, Some(literal)) => {
                let field = scene.field(&self.key).ok_or_else(|| RuleError::UndeclaredField {
                    scene: scene.name().to_string(),
                    key: self.key.clone(),
                })?;
                let sep = self.separator.as_deref().unwrap_or(DEFAULT_SEPARATOR);
                set_value(field.field_type, literal, sep)?
            }
            (None, None) => {
                return Err(RuleError::InvalidCondition {
                    key: self.key.clone(),
                    operator: operator.to_string(),
                    field_type: scene
                        .field(&self.key)
                        .map(|f| f.field_type.to_string())
                        .unwrap_or_else(|| "unknown".to_string()),
                });
            }
        };

        Ok(Cond::new(self.key.clone(), operator, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::ComparisonMode;

    const PRICING: &str = r#"
    {
        "scenes": [{
            "name": "pricing",
            "fields": [
                {"name": "region", "type": "string", "priority": 1},
                {"name": "amount", "type": "int", "priority": 2}
            ],
            "entities": [
                {
                    "id": 1,
                    "priority": 10,
                    "conds": [
                        {"key": "amount", "operator": ">=", "value": {"val_num": 100}},
                        {"key": "region", "operator": "in", "set": "US, EU"}
                    ],
                    "extra_data": {"discount": 15}
                },
                {"id": 2, "priority": 1}
            ]
        }]
    }
    "#;

    fn scene_of(defs: &RuleDefinitions) -> Scene {
        let schema = &defs.scenes[0].schema;
        Scene::new(&schema.name, schema.field_defs().unwrap(), ComparisonMode::Legacy).unwrap()
    }

    #[test]
    fn test_parse_definitions() {
        let defs = RuleDefinitions::from_json(PRICING).unwrap();
        assert_eq!(defs.scenes.len(), 1);
        assert_eq!(defs.scenes[0].schema.name, "pricing");
        assert_eq!(defs.scenes[0].entities.len(), 2);
    }

    #[test]
    fn test_build_entity_from_definition() {
        let defs = RuleDefinitions::from_json(PRICING).unwrap();
        let scene = scene_of(&defs);

        let entity = defs.scenes[0].entities[0].build(&scene).unwrap();

        assert_eq!(entity.id, 1);
        assert_eq!(entity.extra_data["discount"], 15);
        // region 优先级为 1，排在前面
        assert_eq!(entity.conds()[0].key, "region");
        assert_eq!(entity.conds()[0].value, CondVal::str_set(["US", "EU"]));
        assert_eq!(entity.conds()[1].key, "amount");
    }

    #[test]
    fn test_unsupported_field_type() {
        let schema = SceneSchema {
            name: "s".to_string(),
            fields: vec![FieldSchema {
                name: "ratio".to_string(),
                field_type: "float".to_string(),
                priority: 0,
            }],
        };

        let err = schema.field_defs().unwrap_err();
        assert!(matches!(
            err,
            RuleError::UnsupportedFieldType { ref field, .. } if field == "ratio"
        ));
    }

    #[test]
    fn test_unknown_operator_in_definition() {
        let defs = RuleDefinitions::from_json(PRICING).unwrap();
        let scene = scene_of(&defs);

        let cond = CondDefinition {
            key: "amount".to_string(),
            operator: "between".to_string(),
            value: Some(CondVal::Int(1)),
            set: None,
            separator: None,
        };

        assert!(matches!(
            cond.to_cond(&scene).unwrap_err(),
            RuleError::UnsupportedOperator(_)
        ));
    }

    #[test]
    fn test_condition_without_value() {
        let defs = RuleDefinitions::from_json(PRICING).unwrap();
        let scene = scene_of(&defs);

        let cond = CondDefinition {
            key: "amount".to_string(),
            operator: "=".to_string(),
            value: None,
            set: None,
            separator: None,
        };

        assert!(cond.to_cond(&scene).unwrap_err().is_fatal());
    }
}
