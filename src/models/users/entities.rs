use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::common::string_enum::string_enum;

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub enum UserRole {
    Teacher,
    Coordinator,
    Principal,
    Admin,
}

string_enum!(UserRole, "用户角色" {
    Teacher => "teacher",
    Coordinator => "coordinator",
    Principal => "principal",
    Admin => "admin",
});

impl UserRole {
    pub fn admin_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin]
    }

    /// 可以分派报告任务、汇总同级提交的角色
    pub fn reviewer_roles() -> &'static [&'static UserRole] {
        &[&Self::Coordinator, &Self::Principal, &Self::Admin]
    }
}

/// 只有 active 账号可以登录
#[derive(Debug, Clone, Serialize, PartialEq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

string_enum!(UserStatus, "用户状态" {
    Active => "active",
    Inactive => "inactive",
    Suspended => "suspended",
});

// 用户资料
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct UserProfile {
    pub profile_name: String,
    pub avatar_url: Option<String>,
}

// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/user.ts")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    #[ts(skip)]
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub profile: UserProfile,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// 报告中展示的姓名，没有资料名时退回用户名
    pub fn display_name(&self) -> &str {
        if self.profile.profile_name.trim().is_empty() {
            &self.username
        } else {
            &self.profile.profile_name
        }
    }

    // 生成访问令牌
    pub fn generate_access_token(&self) -> Result<String, String> {
        crate::utils::jwt::JwtUtils::generate_access_token(self.id, self.role.as_str())
            .map_err(|e| format!("生成 access token 失败: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in UserRole::ALL {
            let parsed: UserRole = role.as_str().parse().unwrap();
            assert_eq!(&parsed, role);
        }
        for status in UserStatus::ALL {
            assert_eq!(&status.to_string().parse::<UserStatus>().unwrap(), status);
        }
        assert!("student".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_deserialize_rejects_unknown() {
        let err = serde_json::from_str::<UserRole>("\"janitor\"").unwrap_err();
        assert!(err.to_string().contains("无效的用户角色"));
        assert!(err.to_string().contains("coordinator"));
        let role: UserRole = serde_json::from_str("\"coordinator\"").unwrap();
        assert_eq!(role, UserRole::Coordinator);
    }
}
