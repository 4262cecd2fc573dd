//! 场景注册表
//!
//! 使用 DashMap 保存场景名到场景的映射。场景只会被注册一次，
//! 之后注册表条目不再变化，规则更新通过场景自身的双缓冲完成。

use crate::definition::{RuleDefinitions, SceneDefinition, SceneSchema};
use crate::error::{Result, RuleError};
use crate::models::FieldDef;
use crate::operators::ComparisonMode;
use crate::scene::Scene;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 场景注册表
#[derive(Clone, Default)]
pub struct SceneRegistry {
    scenes: Arc<DashMap<String, Arc<Scene>>>,
    /// 新注册场景使用的比较语义
    mode: ComparisonMode,
}

impl SceneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建注册表，之后注册的场景都使用给定的比较语义
    pub fn with_comparison_mode(mode: ComparisonMode) -> Self {
        Self {
            scenes: Arc::new(DashMap::new()),
            mode,
        }
    }

    /// 新注册场景使用的比较语义
    pub fn comparison_mode(&self) -> ComparisonMode {
        self.mode
    }

    /// 注册场景，场景名为空、字段为空或场景已存在时失败
    #[instrument(skip(self, field_defs), fields(fields = field_defs.len()))]
    pub fn register_scene(&self, name: &str, field_defs: Vec<FieldDef>) -> Result<Arc<Scene>> {
        let scene = Arc::new(Scene::new(name, field_defs, self.mode)?);

        match self.scenes.entry(name.to_string()) {
            Entry::Occupied(_) => {
                warn!("场景重复注册");
                Err(RuleError::SceneAlreadyExists(name.to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(scene.clone());
                info!(mode = %self.mode, "场景已注册");
                Ok(scene)
            }
        }
    }

    /// 按文本字段类型注册场景
    pub fn register_schema(&self, schema: &SceneSchema) -> Result<Arc<Scene>> {
        self.register_scene(&schema.name, schema.field_defs()?)
    }

    /// 获取已注册的场景，未注册时返回 None
    pub fn get_scene(&self, name: &str) -> Option<Arc<Scene>> {
        self.scenes.get(name).map(|s| s.value().clone())
    }

    /// 结束指定场景的一轮加载
    pub fn finish_load(&self, name: &str) -> Result<()> {
        let scene = self
            .get_scene(name)
            .ok_or_else(|| RuleError::SceneNotFound(name.to_string()))?;
        scene.finish_load();
        Ok(())
    }

    /// 场景是否已注册
    pub fn contains(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    /// 已注册场景数量
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// 按字典序返回全部场景名
    pub fn scene_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scenes.iter().map(|s| s.key().clone()).collect();
        names.sort();
        names
    }

    /// 加载规则定义
    ///
    /// 未注册的场景先注册；已注册的场景沿用原字段定义，只重新加载实体。
    /// 任一实体构建失败时该场景的本轮加载被丢弃，线上快照保持不变。
    #[instrument(skip(self, definitions), fields(scenes = definitions.scenes.len()))]
    pub fn load_definitions(&self, definitions: &RuleDefinitions) -> Result<LoadSummary> {
        let mut summary = LoadSummary::default();

        for definition in &definitions.scenes {
            let scene = match self.get_scene(&definition.schema.name) {
                Some(scene) => scene,
                None => self.register_schema(&definition.schema)?,
            };

            summary.entities += Self::reload_scene(&scene, definition)?;
            summary.scenes += 1;
        }

        info!(
            scenes = summary.scenes,
            entities = summary.entities,
            "规则定义加载完成"
        );
        Ok(summary)
    }

    /// 从 JSON 文本加载规则定义
    pub fn load_definitions_json(&self, json: &str) -> Result<LoadSummary> {
        self.load_definitions(&RuleDefinitions::from_json(json)?)
    }

    fn reload_scene(scene: &Scene, definition: &SceneDefinition) -> Result<usize> {
        scene.begin_load();

        for entity_def in &definition.entities {
            let built = entity_def.build(scene);
            if let Err(e) = built.and_then(|entity| scene.insert_entity(entity)) {
                warn!(
                    scene = scene.name(),
                    entity_id = entity_def.id,
                    error = %e,
                    "实体构建失败，放弃本轮加载"
                );
                scene.begin_load();
                return Err(e);
            }
        }

        Ok(scene.finish_load().len())
    }
}

/// 规则定义加载统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub scenes: usize,
    pub entities: usize,
}
