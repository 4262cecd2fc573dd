//! 场景规则引擎
//!
//! 每个场景注册一组固定类型的字段，场景下的规则实体是若干字段条件的合取加一个优先级：
//! - 条件插入时按字段定义校验，并按字段优先级排序以便短路求值
//! - 规则以双缓冲方式加载，匹配与批量重载可以并发进行
//! - 给定事实返回全部命中的实体，再按优先级选出胜出者

pub mod builder;
pub mod definition;
pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod models;
pub mod operators;
pub mod parse;
pub mod registry;
pub mod scene;
pub mod selector;
pub mod store;

pub use builder::EntityBuilder;
pub use definition::{RuleDefinitions, SceneDefinition, SceneSchema};
pub use error::{ErrorKind, Result, RuleError};
pub use evaluator::ConditionEvaluator;
pub use matcher::RuleMatcher;
pub use models::{Cond, CondVal, Fact, FactValue, FieldDef, FieldType, RuleEntity};
pub use operators::{ComparisonMode, Operator};
pub use registry::{LoadSummary, SceneRegistry};
pub use scene::Scene;
pub use selector::select_winner;
pub use store::{EntityStore, Generation};
