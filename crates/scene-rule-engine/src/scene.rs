//! 场景：固定的字段定义 + 双缓冲规则存储

use crate::builder::{self, EntityBuilder};
use crate::error::{Result, RuleError};
use crate::matcher::RuleMatcher;
use crate::models::{Cond, Fact, FieldDef, RuleEntity};
use crate::operators::ComparisonMode;
use crate::selector::select_winner;
use crate::store::{EntityStore, Generation};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct Scene {
    name: String,
    /// 注册时的字段顺序
    field_defs: Vec<FieldDef>,
    fields: HashMap<String, FieldDef>,
    store: EntityStore,
    matcher: RuleMatcher,
}

impl Scene {
    /// 创建场景，场景名为空、字段为空或字段重名时失败
    pub fn new(
        name: impl Into<String>,
        field_defs: Vec<FieldDef>,
        mode: ComparisonMode,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(RuleError::EmptySceneName);
        }
        if field_defs.is_empty() {
            return Err(RuleError::EmptyFieldDefs(name));
        }

        let mut fields = HashMap::with_capacity(field_defs.len());
        for def in &field_defs {
            if fields.insert(def.name.clone(), def.clone()).is_some() {
                return Err(RuleError::DuplicateField {
                    scene: name,
                    field: def.name.clone(),
                });
            }
        }

        Ok(Self {
            name,
            field_defs,
            fields,
            store: EntityStore::new(),
            matcher: RuleMatcher::new(mode),
        })
    }

    /// 场景名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 按注册顺序返回字段定义
    pub fn field_defs(&self) -> &[FieldDef] {
        &self.field_defs
    }

    /// 按名称查找字段定义
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    /// 本场景使用的比较语义
    pub fn comparison_mode(&self) -> ComparisonMode {
        self.matcher.mode()
    }

    /// 底层双缓冲存储
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// 校验条件并追加到实体，失败时为致命错误
    pub fn add_condition(&self, entity: &mut RuleEntity, cond: Cond) -> Result<()> {
        builder::add_condition(&self.name, &self.fields, entity, cond)
    }

    /// 创建绑定到本场景的实体构建器
    pub fn entity(&self, id: i64, priority: u32) -> EntityBuilder<'_> {
        EntityBuilder::new(self, id, priority)
    }

    /// 插入待切换缓冲区，`finish_load` 之前对匹配不可见
    ///
    /// 实体的条件按本场景字段定义重新校验，不一致时返回致命错误且不插入。
    pub fn insert_entity(&self, mut entity: RuleEntity) -> Result<()> {
        builder::check_entity(&self.name, &self.fields, &mut entity)?;
        debug!(scene = %self.name, entity_id = entity.id, "实体已写入待切换缓冲区");
        self.store.insert(entity);
        Ok(())
    }

    /// 开始新一轮加载
    pub fn begin_load(&self) {
        let dropped = self.store.begin_load();
        if dropped > 0 {
            warn!(scene = %self.name, dropped, "丢弃未发布的实体");
        }
    }

    /// 排序并发布待切换缓冲区
    #[instrument(skip(self), fields(scene = %self.name))]
    pub fn finish_load(&self) -> Arc<Generation> {
        let published = self.store.finish_load();

        metrics::counter!("rule_engine_reloads_total", "scene" => self.name.clone()).increment(1);
        metrics::gauge!("rule_engine_active_entities", "scene" => self.name.clone())
            .set(published.len() as f64);

        info!(
            version = published.version(),
            slot = published.slot(),
            entities = published.len(),
            "规则加载完成"
        );
        published
    }

    /// 匹配事实，返回全部命中的实体
    #[instrument(level = "debug", skip(self, fact), fields(scene = %self.name))]
    pub fn match_fact(&self, fact: &Fact) -> Result<Vec<Arc<RuleEntity>>> {
        let generation = self.store.snapshot();
        let result = self
            .matcher
            .match_generation(&self.name, &self.fields, &generation, fact);

        match &result {
            Ok(matched) => {
                metrics::counter!("rule_engine_matches_total", "scene" => self.name.clone())
                    .increment(1);
                debug!(
                    version = generation.version(),
                    matched = matched.len(),
                    "匹配完成"
                );
            }
            Err(e) => {
                metrics::counter!("rule_engine_match_errors_total", "scene" => self.name.clone())
                    .increment(1);
                debug!(error = %e, "匹配失败");
            }
        }

        result
    }

    /// 匹配并取出优先级最高的实体
    pub fn match_winner(&self, fact: &Fact) -> Result<Arc<RuleEntity>> {
        let matched = self.match_fact(fact)?;
        select_winner(&matched)
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("field_defs", &self.field_defs)
            .field("generation", &self.store.generation())
            .field("comparison_mode", &self.comparison_mode())
            .finish()
    }
}
