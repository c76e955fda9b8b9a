use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

use super::fields::ReportFields;
use crate::errors::ReportError;

/// 提交状态
///
/// 数据库与接口中都以整数表示：0 草稿，1 待提交，2 已提交，3 已通过，4 已退回
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SubmissionStatus {
    Draft,
    Pending,
    Submitted,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn code(&self) -> i32 {
        match self {
            SubmissionStatus::Draft => 0,
            SubmissionStatus::Pending => 1,
            SubmissionStatus::Submitted => 2,
            SubmissionStatus::Approved => 3,
            SubmissionStatus::Rejected => 4,
        }
    }
}

impl TryFrom<i32> for SubmissionStatus {
    type Error = ReportError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(SubmissionStatus::Draft),
            1 => Ok(SubmissionStatus::Pending),
            2 => Ok(SubmissionStatus::Submitted),
            3 => Ok(SubmissionStatus::Approved),
            4 => Ok(SubmissionStatus::Rejected),
            _ => Err(ReportError::validation(format!(
                "无效的提交状态: {code}，有效范围为 0-4"
            ))),
        }
    }
}

impl Serialize for SubmissionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.code())
    }
}

impl<'de> Deserialize<'de> for SubmissionStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = i32::deserialize(deserializer)?;
        SubmissionStatus::try_from(code).map_err(|e| serde::de::Error::custom(e.message()))
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// 提交实体
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/submission.ts")]
pub struct Submission {
    pub id: i64,
    pub report_assignment_id: i64,
    pub submitted_by: i64,
    #[ts(type = "number")]
    pub status: SubmissionStatus,
    // 提交标题
    pub value: String,
    #[ts(type = "Record<string, unknown>")]
    pub fields: ReportFields,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        for code in 0..=4 {
            let status = SubmissionStatus::try_from(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert!(SubmissionStatus::try_from(5).is_err());
        assert!(SubmissionStatus::try_from(-1).is_err());
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(serde_json::to_string(&SubmissionStatus::Approved).unwrap(), "3");
        let status: SubmissionStatus = serde_json::from_str("4").unwrap();
        assert_eq!(status, SubmissionStatus::Rejected);
        assert!(serde_json::from_str::<SubmissionStatus>("9").is_err());
    }
}
