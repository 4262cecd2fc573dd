//! 规则引擎领域模型

use crate::error::{Result, RuleError};
use crate::operators::Operator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// 字段类型，只支持 int 和 string 两种，便于比较
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Int,
    String,
}

impl FieldType {
    /// 解析字段类型文本，`field` 仅用于错误信息
    pub fn parse(field: &str, raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "int" => Ok(Self::Int),
            "string" => Ok(Self::String),
            _ => Err(RuleError::UnsupportedFieldType {
                field: field.to_string(),
                field_type: raw.to_string(),
            }),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::String => write!(f, "string"),
        }
    }
}

/// 字段定义：名称、类型以及匹配优先级
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub priority: i32,
}

impl FieldDef {
    /// 创建字段定义
    pub fn new(name: impl Into<String>, field_type: FieldType, priority: i32) -> Self {
        Self {
            name: name.into(),
            field_type,
            priority,
        }
    }

    /// 创建整数字段
    pub fn int(name: impl Into<String>, priority: i32) -> Self {
        Self::new(name, FieldType::Int, priority)
    }

    /// 创建字符串字段
    pub fn string(name: impl Into<String>, priority: i32) -> Self {
        Self::new(name, FieldType::String, priority)
    }
}

/// 条件取值，四选一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CondVal {
    #[serde(rename = "val_num")]
    Int(i64),
    #[serde(rename = "val_num_set")]
    IntSet(HashSet<i64>),
    #[serde(rename = "val_str")]
    Str(String),
    #[serde(rename = "val_str_set")]
    StrSet(HashSet<String>),
}

impl CondVal {
    /// 整数集合取值
    pub fn int_set<I: IntoIterator<Item = i64>>(values: I) -> Self {
        Self::IntSet(values.into_iter().collect())
    }

    /// 字符串集合取值
    pub fn str_set<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::StrSet(values.into_iter().map(Into::into).collect())
    }
}

impl From<i64> for CondVal {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for CondVal {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<&str> for CondVal {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for CondVal {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// 单个条件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cond {
    pub key: String,
    pub operator: Operator,
    pub value: CondVal,
    /// 插入时由字段定义赋值，用于条件排序
    #[serde(skip)]
    pub(crate) priority: i32,
}

impl Cond {
    /// 创建条件，优先级在加入实体时由字段定义写入
    pub fn new(key: impl Into<String>, operator: Operator, value: impl Into<CondVal>) -> Self {
        Self {
            key: key.into(),
            operator,
            value: value.into(),
            priority: 0,
        }
    }

    /// 所属字段的优先级
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// 校验条件取值与字段类型、操作符是否兼容
    pub fn is_valid_for(&self, field_type: FieldType) -> bool {
        use CondVal::*;
        use Operator::*;

        match (self.operator, field_type, &self.value) {
            (Eq | NotEq, FieldType::String, Str(_)) => true,
            (Eq | NotEq, FieldType::Int, Int(_)) => true,
            (In | NotIn | Intersect | NotIntersect, FieldType::String, StrSet(set)) => {
                !set.is_empty()
            }
            (In | NotIn | Intersect | NotIntersect, FieldType::Int, IntSet(set)) => {
                !set.is_empty()
            }
            (Gt | Ge | Lt | Le, FieldType::Int, Int(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            CondVal::Int(v) => write!(f, "{} {} {}", self.key, self.operator, v),
            CondVal::Str(v) => write!(f, "{} {} {:?}", self.key, self.operator, v),
            CondVal::IntSet(set) => write!(f, "{} {} {:?}", self.key, self.operator, set),
            CondVal::StrSet(set) => write!(f, "{} {} {:?}", self.key, self.operator, set),
        }
    }
}

/// 规则实体：条件合取 + 优先级 + 附加数据
///
/// 没有任何条件的实体是兜底规则，总是匹配。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleEntity {
    pub id: i64,
    conds: Vec<Cond>,
    pub priority: u32,
    pub extra_data: Map<String, Value>,
}

impl RuleEntity {
    /// 创建没有条件的实体
    pub fn new(id: i64, priority: u32) -> Self {
        Self {
            id,
            conds: Vec::new(),
            priority,
            extra_data: Map::new(),
        }
    }

    /// 附加业务数据
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_data.insert(key.into(), value.into());
        self
    }

    /// 实体的条件，插入存储后按字段优先级升序排列
    pub fn conds(&self) -> &[Cond] {
        &self.conds
    }

    /// 是否为兜底规则
    pub fn is_catch_all(&self) -> bool {
        self.conds.is_empty()
    }

    pub(crate) fn conds_mut(&mut self) -> &mut [Cond] {
        &mut self.conds
    }

    pub(crate) fn push_cond(&mut self, cond: Cond) {
        self.conds.push(cond);
    }

    /// 按条件优先级升序（稳定）排序
    pub(crate) fn finalize(&mut self) {
        self.conds.sort_by_key(|c| c.priority);
    }
}

/// 事实中某个字段的取值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Int(i64),
    Str(String),
    IntList(Vec<i64>),
    StrList(Vec<String>),
}

impl FactValue {
    /// 标量整数取值
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// 标量字符串取值
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// 空数组反序列化后总是落在 IntList，这里视为任意元素类型的空序列
    pub fn as_int_list(&self) -> Option<&[i64]> {
        match self {
            Self::IntList(v) => Some(v),
            Self::StrList(v) if v.is_empty() => Some(&[][..]),
            _ => None,
        }
    }

    /// 字符串序列取值，空数组同样适用
    pub fn as_str_list(&self) -> Option<&[String]> {
        match self {
            Self::StrList(v) => Some(v),
            Self::IntList(v) if v.is_empty() => Some(&[][..]),
            _ => None,
        }
    }
}

impl From<i64> for FactValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for FactValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<&str> for FactValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for FactValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Vec<i64>> for FactValue {
    fn from(v: Vec<i64>) -> Self {
        Self::IntList(v)
    }
}

impl From<Vec<String>> for FactValue {
    fn from(v: Vec<String>) -> Self {
        Self::StrList(v)
    }
}

impl From<Vec<&str>> for FactValue {
    fn from(v: Vec<&str>) -> Self {
        Self::StrList(v.into_iter().map(str::to_string).collect())
    }
}

/// 事实 - 待匹配的输入记录
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fact {
    values: HashMap<String, FactValue>,
}

impl Fact {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象创建
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 链式添加字段取值
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FactValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// 添加或覆盖字段取值
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FactValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// 读取字段取值
    pub fn get(&self, key: &str) -> Option<&FactValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<FactValue>> FromIterator<(K, V)> for Fact {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
