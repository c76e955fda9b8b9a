//! 对象缓存层
//!
//! 后端通过 `declare_object_cache_plugin!` 在进程启动前注册，
//! 启动时按 `cache.type` 配置选取。

pub mod object_cache;
pub mod register;
mod traits;

pub use traits::{CacheResult, ObjectCache};

use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

/// 注册缓存插件，`$ty` 需提供 `fn new() -> Result<Self, String>`
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:expr, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| {
                    Box::pin(async {
                        <$ty>::new()
                            .map(|cache| Box::new(cache) as Box<dyn $crate::cache::ObjectCache>)
                            .map_err($crate::errors::ReportError::cache_connection)
                    }) as $crate::cache::register::BoxedObjectCacheFuture
                }),
            );
        }
    };
}

/// 登录用户缓存键
pub fn user_key(user_id: i64) -> String {
    format!("user:{user_id}")
}

impl dyn ObjectCache {
    /// 读取并反序列化，脏数据会被移除
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get_raw(key).await {
            CacheResult::Found(json) => match serde_json::from_str(&json) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!("Dropping undecodable cache entry {}: {}", key, e);
                    self.remove(key).await;
                    None
                }
            },
            _ => None,
        }
    }

    pub async fn insert_json<T: Serialize>(&self, key: String, value: &T, ttl: u64) {
        if let Ok(json) = serde_json::to_string(value) {
            self.insert_raw(key, json, ttl).await;
        }
    }
}
