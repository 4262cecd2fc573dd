//! 规则实体存储（双缓冲）
//!
//! 读取端通过 `ArcSwap` 一次原子 load 拿到当前生效的不可变快照；
//! 写入端把新实体追加到待切换缓冲区，`finish_load` 时排序并整体发布。
//! 发布后待切换缓冲区为空，下一轮加载不会混入上上代的实体。

use crate::builder::finalize_entity;
use crate::models::RuleEntity;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::Arc;

/// 一次发布的实体集合（不可变）
#[derive(Debug, Default)]
pub struct Generation {
    version: u64,
    entities: Vec<Arc<RuleEntity>>,
}

impl Generation {
    /// 发布序号，初始为 0，每次 `finish_load` 加一
    pub fn version(&self) -> u64 {
        self.version
    }

    /// 对应双缓冲中的下标（0 或 1）
    pub fn slot(&self) -> usize {
        (self.version % 2) as usize
    }

    /// 按实体优先级升序排列的实体
    pub fn entities(&self) -> &[Arc<RuleEntity>] {
        &self.entities
    }

    /// 实体数量
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// 双缓冲实体存储
pub struct EntityStore {
    /// 当前生效的快照，匹配只读取这里
    active: ArcSwap<Generation>,
    /// 待切换缓冲区，加载期间写入
    staging: Mutex<Vec<Arc<RuleEntity>>>,
}

impl EntityStore {
    /// 创建空存储，初始快照为空的第 0 代
    pub fn new() -> Self {
        Self {
            active: ArcSwap::from_pointee(Generation::default()),
            staging: Mutex::new(Vec::new()),
        }
    }

    /// 开始新一轮加载，丢弃待切换缓冲区中尚未发布的实体
    pub fn begin_load(&self) -> usize {
        let mut staging = self.staging.lock();
        let dropped = staging.len();
        staging.clear();
        dropped
    }

    /// 排序实体条件后追加到待切换缓冲区，条件需已由场景校验
    pub(crate) fn insert(&self, mut entity: RuleEntity) {
        finalize_entity(&mut entity);
        self.staging.lock().push(Arc::new(entity));
    }

    /// 按实体优先级升序排序待切换缓冲区并原子发布，返回新的快照
    pub fn finish_load(&self) -> Arc<Generation> {
        let mut staging = self.staging.lock();
        let mut entities = std::mem::take(&mut *staging);
        entities.sort_by_key(|e| e.priority);

        let next = Arc::new(Generation {
            version: self.active.load().version + 1,
            entities,
        });
        self.active.store(next.clone());
        next
    }

    /// 当前生效的快照
    pub fn snapshot(&self) -> Arc<Generation> {
        self.active.load_full()
    }

    /// 当前生效快照中的实体数量
    pub fn active_len(&self) -> usize {
        self.active.load().len()
    }

    /// 待切换缓冲区中尚未发布的实体数量
    pub fn staging_len(&self) -> usize {
        self.staging.lock().len()
    }

    /// 当前生效快照的发布序号
    pub fn generation(&self) -> u64 {
        self.active.load().version
    }

    /// 当前生效的缓冲区下标（0 或 1）
    pub fn active_slot(&self) -> usize {
        self.active.load().slot()
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
