use crate::config::{AppConfig, Argon2Config};
use crate::errors::ReportError;
use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

/// 按配置的代价参数生成 Argon2id PHC 字符串
pub fn hash_password(password: &str) -> Result<String, ReportError> {
    hash_with(&AppConfig::get().argon2, password)
}

fn hash_with(cost: &Argon2Config, password: &str) -> Result<String, ReportError> {
    let params = Params::new(cost.memory_cost, cost.time_cost, cost.parallelism, None)
        .map_err(|e| ReportError::validation(format!("Argon2 参数错误: {e}")))?;
    let salt = SaltString::generate(&mut OsRng);

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ReportError::validation(format!("密码哈希失败: {e}")))
}

/// 代价参数取自哈希串本身，配置调整后旧哈希仍可验证
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHEAP: Argon2Config = Argon2Config {
        memory_cost: 4096,
        time_cost: 1,
        parallelism: 1,
    };

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_with(&CHEAP, "Coordinator1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Coordinator1", &hash));
        assert!(!verify_password("coordinator1", &hash));
    }

    #[test]
    fn test_rejects_bad_params_and_garbage_hash() {
        let broken = Argon2Config {
            memory_cost: 0,
            ..CHEAP
        };
        assert!(hash_with(&broken, "Coordinator1").is_err());
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
