use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::errors::{ReportError, Result};
use crate::models::users::entities::{UserProfile, UserRole};
use crate::models::users::requests::CreateUserRequest;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

const FALLBACK_CACHE: &str = "moka";
const SEED_ADMIN_USERNAME: &str = "admin";

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

async fn build_cache(name: &str) -> Result<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name)
        .ok_or_else(|| ReportError::cache_connection(format!("unknown cache backend '{name}'")))?;
    let cache = constructor().await?;
    Ok(Arc::from(cache))
}

/// 配置的后端不可用时退回内存缓存
async fn open_cache(configured: &str) -> Result<Arc<dyn ObjectCache>> {
    match build_cache(configured).await {
        Ok(cache) => {
            info!("Cache backend: {}", configured);
            Ok(cache)
        }
        Err(e) if configured != FALLBACK_CACHE => {
            warn!("{}; falling back to {}", e, FALLBACK_CACHE);
            build_cache(FALLBACK_CACHE).await
        }
        Err(e) => Err(e),
    }
}

/// 生成随机密码，保证大小写字母与数字各至少一个
fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    use rand::seq::SliceRandom;

    const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
    const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
    const DIGITS: &[u8] = b"23456789";
    const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@#$%";

    let mut rng = rand::rng();
    let mut pick = |set: &[u8]| set[rng.random_range(0..set.len())];

    let mut bytes = vec![pick(UPPER), pick(LOWER), pick(DIGITS)];
    while bytes.len() < length {
        bytes.push(pick(CHARSET));
    }
    bytes.shuffle(&mut rand::rng());
    bytes.into_iter().map(char::from).collect()
}

fn admin_password() -> String {
    std::env::var("ADMIN_PASSWORD")
        .ok()
        .filter(|pwd| !pwd.is_empty())
        .unwrap_or_else(|| {
            let pwd = generate_random_password(16);
            warn!("ADMIN_PASSWORD is not set, generated one for '{}': {}", SEED_ADMIN_USERNAME, pwd);
            warn!("Store it now; it is not shown again");
            pwd
        })
}

/// 空库时建一个管理员，已有任何用户则什么都不做
async fn seed_admin(storage: &dyn Storage) -> Result<()> {
    let existing = storage.count_users().await?;
    if existing > 0 {
        debug!("{} user(s) present, admin seed skipped", existing);
        return Ok(());
    }

    let admin = storage
        .create_user(CreateUserRequest {
            username: SEED_ADMIN_USERNAME.to_string(),
            email: "admin@localhost".to_string(),
            password: hash_password(&admin_password())?,
            role: UserRole::Admin,
            profile: UserProfile {
                profile_name: "Administrator".to_string(),
                avatar_url: None,
            },
        })
        .await?;
    info!("Seeded admin account #{} ({})", admin.id, admin.username);
    Ok(())
}

/// 存储（含迁移）、初始管理员与缓存
pub async fn prepare_server_startup() -> Result<StartupContext> {
    // 已安装过时返回 Err，可忽略
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let storage = crate::storage::create_storage().await?;
    info!("Storage ready, migrations applied");

    if let Err(e) = seed_admin(storage.as_ref()).await {
        warn!("Admin seed failed: {}", e);
    }

    debug!(
        "Registered cache backends: {:?}",
        crate::cache::register::registered_object_cache_plugins()
    );
    let cache = open_cache(&AppConfig::get().cache.cache_type).await?;

    Ok(StartupContext { storage, cache })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validate::validate_password;

    #[test]
    fn test_generated_password_is_strong() {
        for _ in 0..20 {
            let pwd = generate_random_password(16);
            assert_eq!(pwd.chars().count(), 16);
            assert!(validate_password(&pwd).is_ok(), "weak password: {pwd}");
        }
    }

    #[tokio::test]
    async fn test_unknown_backend_is_an_error() {
        assert!(build_cache("memcached").await.is_err());
    }
}
