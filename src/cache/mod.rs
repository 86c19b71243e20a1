//! 对象缓存
//!
//! 后端以插件形式注册到全局表中，启动时按配置的名称构造。

pub mod object_cache;
pub mod register;
pub mod traits;

pub use traits::{CacheResult, ObjectCache, user_cache_key};

/// 声明缓存插件：生成 `PLUGIN_NAME` 与 `register()`
///
/// 插件类型需要提供 `async fn connect() -> Result<Self, String>`。
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:expr, $ty:ty) => {
        pub const PLUGIN_NAME: &str = $name;

        pub fn register() {
            $crate::cache::register::register_object_cache_plugin(
                PLUGIN_NAME,
                std::sync::Arc::new(|| -> $crate::cache::register::BoxedObjectCacheFuture {
                    Box::pin(async {
                        let cache = <$ty>::connect()
                            .await
                            .map_err($crate::errors::AppError::cache_connection)?;
                        Ok::<_, $crate::errors::AppError>(
                            Box::new(cache) as Box<dyn $crate::cache::ObjectCache>
                        )
                    })
                }),
            );
        }
    };
}

/// 注册内置的缓存后端
pub fn register_builtin_plugins() {
    object_cache::moka::register();
    object_cache::redis::register();
}
