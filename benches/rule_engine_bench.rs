//! 规则引擎性能基准测试
//!
//! 测试覆盖：
//! - 不同实体数量下的场景匹配性能
//! - 短路求值（首个条件即失败）
//! - 胜出者选择
//! - 规则定义加载与双缓冲切换

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rule_engine::{
    select_winner, ComparisonMode, Cond, CondVal, Fact, FieldDef, Operator, RuleEntity,
    SceneRegistry, Scene,
};
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

const REGIONS: [&str; 4] = ["US", "EU", "CN", "JP"];

/// 创建定价场景：region / amount / tags 三个字段
fn create_scene() -> Scene {
    Scene::new(
        "pricing",
        vec![
            FieldDef::string("region", 1),
            FieldDef::int("amount", 2),
            FieldDef::string("tags", 3),
        ],
        ComparisonMode::Legacy,
    )
    .unwrap()
}

/// 向场景加载 `count` 个实体并发布
fn load_entities(scene: &Scene, count: usize) {
    scene.begin_load();
    for i in 0..count {
        scene
            .entity(i as i64, (i % 100) as u32)
            .cond(Cond::new("region", Operator::Eq, REGIONS[i % REGIONS.len()]))
            .unwrap()
            .cond(Cond::new("amount", Operator::Ge, (i % 1000) as i64))
            .unwrap()
            .cond(Cond::new(
                "tags",
                Operator::Intersect,
                CondVal::str_set(["gold", "premium"]),
            ))
            .unwrap()
            .insert()
            .unwrap();
    }
    scene.finish_load();
}

/// 创建测试事实（大部分实体命中）
fn create_matching_fact() -> Fact {
    Fact::new()
        .with("region", "US")
        .with("amount", 5000)
        .with("tags", vec!["premium", "frequent"])
}

/// 创建测试事实（首个条件即不匹配）
fn create_non_matching_fact() -> Fact {
    Fact::new()
        .with("region", "BR")
        .with("amount", 5000)
        .with("tags", vec!["new"])
}

// ============================================================================
// 基准测试函数
// ============================================================================

/// 场景匹配基准（不同实体数量）
fn bench_scene_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("scene_match");

    for entity_count in [10, 100, 1000, 10000].iter() {
        let scene = create_scene();
        load_entities(&scene, *entity_count);
        let fact = create_matching_fact();

        group.throughput(Throughput::Elements(*entity_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(entity_count),
            entity_count,
            |b, _| {
                b.iter(|| {
                    let result = scene.match_fact(black_box(&fact));
                    black_box(result)
                })
            },
        );
    }

    group.finish();
}

/// 短路求值基准
fn bench_short_circuit(c: &mut Criterion) {
    let mut group = c.benchmark_group("short_circuit");

    let scene = create_scene();
    load_entities(&scene, 1000);

    let matching = create_matching_fact();
    group.bench_function("matching", |b| {
        b.iter(|| black_box(scene.match_fact(black_box(&matching))))
    });

    let non_matching = create_non_matching_fact();
    group.bench_function("non_matching", |b| {
        b.iter(|| black_box(scene.match_fact(black_box(&non_matching))))
    });

    group.finish();
}

/// 胜出者选择基准
fn bench_select_winner(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_winner");

    for count in [10, 100, 1000].iter() {
        let entities: Vec<Arc<RuleEntity>> = (0..*count)
            .map(|i| Arc::new(RuleEntity::new(i as i64, (i * 7 % 97) as u32)))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| black_box(select_winner(black_box(&entities))))
        });
    }

    group.finish();
}

/// 规则定义加载基准（解析 + 校验 + 排序 + 切换）
fn bench_definition_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("definition_load");

    for entity_count in [10, 100, 1000].iter() {
        let entities: Vec<_> = (0..*entity_count)
            .map(|i| {
                json!({
                    "id": i,
                    "priority": i % 50,
                    "conds": [
                        {"key": "region", "operator": "in", "set": "US,EU,JP"},
                        {"key": "amount", "operator": ">", "value": {"val_num": i}}
                    ]
                })
            })
            .collect();
        let definitions = json!({
            "scenes": [{
                "name": "pricing",
                "fields": [
                    {"name": "region", "type": "string", "priority": 1},
                    {"name": "amount", "type": "int", "priority": 2}
                ],
                "entities": entities
            }]
        })
        .to_string();

        let registry = SceneRegistry::new();

        group.throughput(Throughput::Elements(*entity_count as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(entity_count),
            entity_count,
            |b, _| {
                b.iter(|| {
                    let result = registry.load_definitions_json(black_box(&definitions));
                    black_box(result)
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_scene_match,
    bench_short_circuit,
    bench_select_winner,
    bench_definition_load,
);

criterion_main!(benches);
