//! 提交 `fields` 载荷的类型化解码
//!
//! 数据库中 `submissions.fields` 是一段 JSON 文本，形状由 `type` 判别：
//! `ACCOMPLISHMENT`、`MPS`、`LAEMPL`、`LAEMPL_COORDINATOR`。
//! 所有读写路径（CRUD 与汇总）都经由这里的 [`ReportFields`] 解码和编码，
//! 未识别的键保存在各结构体的 `extra` 中，编码时原样写回。

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::errors::{ReportError, Result};
use crate::models::report_assignments::entities::ReportType;

/// 图片引用：文件名字符串、`{filename, url}` 对象，或其他任意 JSON 值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    Name(String),
    File(ImageFile),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageRef {
    /// 去重键：字符串本身；对象优先 filename，其次 url，最后整体 JSON
    pub fn dedup_key(&self) -> String {
        match self {
            ImageRef::Name(name) => name.clone(),
            ImageRef::File(file) => file
                .filename
                .as_deref()
                .filter(|s| !s.is_empty())
                .or_else(|| file.url.as_deref().filter(|s| !s.is_empty()))
                .map(str::to_string)
                .unwrap_or_else(|| serde_json::to_string(file).unwrap_or_default()),
            ImageRef::Other(value) => value.to_string(),
        }
    }
}

impl From<&str> for ImageRef {
    fn from(name: &str) -> Self {
        ImageRef::Name(name.to_string())
    }
}

/// 汇总来源/去向标记（`fields.meta`）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidationMeta {
    /// 本提交被汇总进的目标提交 ID
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub consolidated_into: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consolidated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consolidated_images_count: Option<i64>,
    /// 目标提交最近一轮汇总纳入的同级提交
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub consolidated_from: Vec<i64>,
    /// 目标提交首次汇总前自有图片的去重键
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub own_image_keys: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConsolidationMeta {
    pub fn is_empty(&self) -> bool {
        self.consolidated_into.is_none()
            && self.consolidated_at.is_none()
            && self.consolidated_images_count.is_none()
            && self.consolidated_from.is_empty()
            && self.own_image_keys.is_none()
            && self.extra.is_empty()
    }

    /// 标记为已汇总进 `target_id`
    pub fn mark_consolidated(&mut self, target_id: i64, at: &str) {
        self.consolidated_into = Some(target_id);
        self.consolidated_at = Some(at.to_string());
    }

    /// 清除汇总标记
    pub fn release(&mut self) {
        self.consolidated_into = None;
        self.consolidated_at = None;
    }
}

// 兼容历史数据：consolidatedInto 可能是数字、数字字符串或 null
fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// 成果报告表单中的 `_answers` 区块
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccomplishmentAnswers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRef>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 成果报告载荷
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AccomplishmentFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<ImageRef>>,
    #[serde(rename = "_answers", default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<AccomplishmentAnswers>,
    #[serde(default, skip_serializing_if = "ConsolidationMeta::is_empty")]
    pub meta: ConsolidationMeta,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccomplishmentFields {
    /// 同级提交贡献的图片：`_answers.images` > `images` > `photos`
    pub fn peer_images(&self) -> &[ImageRef] {
        self.answers
            .as_ref()
            .and_then(|a| a.images.as_deref())
            .or(self.images.as_deref())
            .or(self.photos.as_deref())
            .unwrap_or(&[])
    }

    /// 目标提交已有的图片：汇总结果写在 `images`，因此优先读取它
    pub fn current_images(&self) -> &[ImageRef] {
        self.images
            .as_deref()
            .or_else(|| self.answers.as_ref().and_then(|a| a.images.as_deref()))
            .or(self.photos.as_deref())
            .unwrap_or(&[])
    }

    pub fn narrative(&self) -> Option<&str> {
        self.answers
            .as_ref()
            .and_then(|a| a.narrative.as_deref())
            .or(self.narrative.as_deref())
    }

    pub fn title(&self) -> Option<&str> {
        self.answers
            .as_ref()
            .and_then(|a| a.title.as_deref())
            .or(self.title.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

/// 表格行：`key`（兼容 `trait`）加上任意数值列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(alias = "trait")]
    pub key: String,
    #[serde(flatten)]
    pub columns: Map<String, Value>,
}

/// LAEMPL / MPS 表格载荷
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    #[serde(default, skip_serializing_if = "ConsolidationMeta::is_empty")]
    pub meta: ConsolidationMeta,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub type MpsFields = TableFields;
pub type LaemplFields = TableFields;

/// 按 `type` 判别的提交载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReportFields {
    #[serde(rename = "ACCOMPLISHMENT")]
    Accomplishment(AccomplishmentFields),
    #[serde(rename = "MPS")]
    Mps(MpsFields),
    #[serde(rename = "LAEMPL")]
    Laempl(LaemplFields),
    #[serde(rename = "LAEMPL_COORDINATOR")]
    LaemplCoordinator(LaemplFields),
}

impl Default for ReportFields {
    fn default() -> Self {
        ReportFields::Accomplishment(AccomplishmentFields::default())
    }
}

const TYPE_KEY: &str = "type";

impl ReportFields {
    /// 新建任务时为接收人生成的空白载荷
    pub fn blank(report_type: ReportType) -> Self {
        match report_type {
            ReportType::Accomplishment => {
                ReportFields::Accomplishment(AccomplishmentFields::default())
            }
            ReportType::Mps => ReportFields::Mps(TableFields::default()),
            ReportType::Laempl => ReportFields::Laempl(TableFields::default()),
            ReportType::LaemplCoordinator => {
                ReportFields::LaemplCoordinator(TableFields::default())
            }
        }
    }

    pub fn report_type(&self) -> ReportType {
        match self {
            ReportFields::Accomplishment(_) => ReportType::Accomplishment,
            ReportFields::Mps(_) => ReportType::Mps,
            ReportFields::Laempl(_) => ReportType::Laempl,
            ReportFields::LaemplCoordinator(_) => ReportType::LaemplCoordinator,
        }
    }

    pub fn meta(&self) -> &ConsolidationMeta {
        match self {
            ReportFields::Accomplishment(f) => &f.meta,
            ReportFields::Mps(f) | ReportFields::Laempl(f) | ReportFields::LaemplCoordinator(f) => {
                &f.meta
            }
        }
    }

    pub fn meta_mut(&mut self) -> &mut ConsolidationMeta {
        match self {
            ReportFields::Accomplishment(f) => &mut f.meta,
            ReportFields::Mps(f) | ReportFields::Laempl(f) | ReportFields::LaemplCoordinator(f) => {
                &mut f.meta
            }
        }
    }

    pub fn as_accomplishment(&self) -> Option<&AccomplishmentFields> {
        match self {
            ReportFields::Accomplishment(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_accomplishment_mut(&mut self) -> Option<&mut AccomplishmentFields> {
        match self {
            ReportFields::Accomplishment(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TableFields> {
        match self {
            ReportFields::Accomplishment(_) => None,
            ReportFields::Mps(f) | ReportFields::Laempl(f) | ReportFields::LaemplCoordinator(f) => {
                Some(f)
            }
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut TableFields> {
        match self {
            ReportFields::Accomplishment(_) => None,
            ReportFields::Mps(f) | ReportFields::Laempl(f) | ReportFields::LaemplCoordinator(f) => {
                Some(f)
            }
        }
    }

    /// 展示用标题（表单内标题优先）
    pub fn title(&self) -> Option<&str> {
        match self {
            ReportFields::Accomplishment(f) => f.title(),
            _ => self
                .as_table()
                .and_then(|t| t.title.as_deref())
                .filter(|t| !t.trim().is_empty()),
        }
    }

    /// 严格解码
    ///
    /// - `NULL` 或空串视为空白成果报告
    /// - 被二次编码成 JSON 字符串的载荷会再解一次
    /// - 缺少 `type` 时按 `ACCOMPLISHMENT` 处理
    pub fn decode(raw: Option<&str>) -> Result<Self> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::default()),
            Some(raw) => raw,
        };

        let mut value: Value = serde_json::from_str(raw)
            .map_err(|e| ReportError::fields_decode(format!("fields 不是合法 JSON: {e}")))?;
        if let Value::String(inner) = &value {
            value = serde_json::from_str(inner)
                .map_err(|e| ReportError::fields_decode(format!("fields 不是合法 JSON: {e}")))?;
        }

        Self::from_value(value)
    }

    /// 宽松解码：失败时记录警告并返回 `None`，调用方按“无图片、无叙述”处理
    pub fn decode_lenient(submission_id: i64, raw: Option<&str>) -> Option<Self> {
        match Self::decode(raw) {
            Ok(fields) => Some(fields),
            Err(e) => {
                warn!("Submission {} has undecodable fields: {}", submission_id, e);
                None
            }
        }
    }

    pub fn from_value(mut value: Value) -> Result<Self> {
        match &mut value {
            Value::Object(map) => {
                if !map.contains_key(TYPE_KEY) {
                    map.insert(
                        TYPE_KEY.to_string(),
                        Value::String(ReportType::Accomplishment.as_str().to_string()),
                    );
                }
            }
            Value::Null => return Ok(Self::default()),
            _ => {
                return Err(ReportError::fields_decode("fields 必须是 JSON 对象"));
            }
        }

        serde_json::from_value(value)
            .map_err(|e| ReportError::fields_decode(format!("fields 结构无效: {e}")))
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// 浅合并客户端提交的字段补丁（PATCH 语义），不允许修改 `type`
    pub fn merge_patch(&self, patch: &Map<String, Value>) -> Result<Self> {
        let retyped = patch
            .get(TYPE_KEY)
            .is_some_and(|t| t.as_str() != Some(self.report_type().as_str()));
        if retyped {
            return Err(ReportError::validation("不允许修改 fields.type"));
        }

        let mut value = self.to_value();
        if let Value::Object(map) = &mut value {
            for (key, v) in patch {
                map.insert(key.clone(), v.clone());
            }
        }
        Self::from_value(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_missing_type_defaults_to_accomplishment() {
        let fields = ReportFields::decode(Some(r#"{"narrative": "Flag ceremony held"}"#)).unwrap();
        let acc = fields.as_accomplishment().unwrap();
        assert_eq!(acc.narrative(), Some("Flag ceremony held"));
    }

    #[test]
    fn test_decode_empty_and_null() {
        assert_eq!(ReportFields::decode(None).unwrap(), ReportFields::default());
        assert_eq!(ReportFields::decode(Some("  ")).unwrap(), ReportFields::default());
        assert_eq!(ReportFields::decode(Some("null")).unwrap(), ReportFields::default());
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = ReportFields::decode(Some("{invalid json")).unwrap_err();
        assert_eq!(err.code(), "E013");
        assert!(ReportFields::decode_lenient(7, Some("{invalid json")).is_none());
    }

    #[test]
    fn test_decode_double_encoded() {
        let raw = serde_json::to_string(r#"{"type":"ACCOMPLISHMENT","images":["a.jpg"]}"#).unwrap();
        let fields = ReportFields::decode(Some(&raw)).unwrap();
        assert_eq!(
            fields.as_accomplishment().unwrap().peer_images(),
            &[ImageRef::from("a.jpg")]
        );
    }

    #[test]
    fn test_unknown_type_is_error() {
        assert!(ReportFields::decode(Some(r#"{"type":"ATTENDANCE"}"#)).is_err());
    }

    #[test]
    fn test_round_trip_preserves_unknown_keys() {
        let raw = json!({
            "type": "ACCOMPLISHMENT",
            "activityName": "Brigada Eskwela",
            "images": ["a.jpg", {"filename": "b.jpg", "url": "/uploads/b.jpg", "caption": "day 1"}],
            "_answers": {"venue": "Gym"},
            "meta": {"consolidatedInto": "12", "reviewer": "x"}
        });
        let fields = ReportFields::from_value(raw).unwrap();
        assert_eq!(fields.meta().consolidated_into, Some(12));

        let encoded = fields.to_value();
        assert_eq!(encoded["activityName"], "Brigada Eskwela");
        assert_eq!(encoded["images"][1]["caption"], "day 1");
        assert_eq!(encoded["_answers"]["venue"], "Gym");
        assert_eq!(encoded["meta"]["reviewer"], "x");
        assert_eq!(encoded["meta"]["consolidatedInto"], 12);
    }

    #[test]
    fn test_image_priority() {
        let fields: ReportFields = ReportFields::from_value(json!({
            "_answers": {"images": ["x.jpg"]},
            "images": ["y.jpg"],
            "photos": ["z.jpg"]
        }))
        .unwrap();
        let acc = fields.as_accomplishment().unwrap();
        assert_eq!(acc.peer_images(), &[ImageRef::from("x.jpg")]);
        assert_eq!(acc.current_images(), &[ImageRef::from("y.jpg")]);

        let photos_only = ReportFields::from_value(json!({"photos": ["z.jpg"]})).unwrap();
        assert_eq!(
            photos_only.as_accomplishment().unwrap().peer_images(),
            &[ImageRef::from("z.jpg")]
        );
    }

    #[test]
    fn test_present_empty_list_wins() {
        let fields =
            ReportFields::from_value(json!({"_answers": {"images": []}, "images": ["y.jpg"]}))
                .unwrap();
        assert!(fields.as_accomplishment().unwrap().peer_images().is_empty());
    }

    #[test]
    fn test_dedup_key() {
        assert_eq!(ImageRef::from("a.jpg").dedup_key(), "a.jpg");
        let by_name: ImageRef =
            serde_json::from_value(json!({"filename": "b.jpg", "url": "/u/b.jpg"})).unwrap();
        assert_eq!(by_name.dedup_key(), "b.jpg");
        let by_url: ImageRef = serde_json::from_value(json!({"url": "/u/c.jpg"})).unwrap();
        assert_eq!(by_url.dedup_key(), "/u/c.jpg");
        let bare: ImageRef = serde_json::from_value(json!({"caption": "none"})).unwrap();
        assert_eq!(bare.dedup_key(), r#"{"caption":"none"}"#);
        let number: ImageRef = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(number.dedup_key(), "42");
    }

    #[test]
    fn test_table_rows_accept_trait_alias() {
        let fields = ReportFields::decode(Some(
            r#"{"type":"LAEMPL","rows":[{"trait":"Male","enrolled":20,"passed":18}]}"#,
        ))
        .unwrap();
        let table = fields.as_table().unwrap();
        assert_eq!(table.rows[0].key, "Male");
        assert_eq!(table.rows[0].columns["passed"], 18);
        assert_eq!(fields.report_type(), ReportType::Laempl);
    }

    #[test]
    fn test_merge_patch() {
        let fields = ReportFields::decode(Some(r#"{"narrative":"old","images":["a.jpg"]}"#)).unwrap();
        let patch = json!({"narrative": "new"});
        let merged = fields.merge_patch(patch.as_object().unwrap()).unwrap();
        let acc = merged.as_accomplishment().unwrap();
        assert_eq!(acc.narrative(), Some("new"));
        assert_eq!(acc.current_images(), &[ImageRef::from("a.jpg")]);

        let retype = json!({"type": "MPS"});
        assert!(fields.merge_patch(retype.as_object().unwrap()).is_err());
    }
}
