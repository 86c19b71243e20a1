use crate::cache::{ObjectCache, register::get_object_cache_plugin, register_builtin_plugins};
use crate::config::{AppConfig, BootstrapConfig};
use crate::errors::{AppError, Result};
use crate::models::users::entities::{User, UserRole};
use crate::models::users::requests::NewUser;
use crate::services::analyzer::{CodeAnalyzer, create_analyzer};
use crate::services::auth::normalize_email;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub analyzer: Arc<dyn CodeAnalyzer>,
}

/// 按名称构造缓存后端
async fn build_cache(name: &str) -> Result<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name).ok_or_else(|| {
        AppError::cache_plugin_not_found(format!("Cache backend '{name}' not found in registry"))
    })?;
    let cache = constructor().await?;
    Ok(Arc::from(cache))
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
pub async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let config = AppConfig::get();
    let cache_type = config.cache.cache_type.as_str();

    warn!("Attempting to create {} cache backend", cache_type);

    match build_cache(cache_type).await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", cache_type);
            Ok(cache)
        }
        Err(e) if cache_type != "moka" => {
            warn!("Failed to create {} cache: {}", cache_type, e);
            warn!("Falling back to memory cache");
            let cache = build_cache("moka").await?;
            warn!("Successfully created fallback Moka (in-memory) cache backend");
            Ok(cache)
        }
        Err(e) => Err(e),
    }
}

/// 生成随机密码，保证同时包含字母与数字
fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const LETTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    let mut rng = rand::rng();

    let mut password: Vec<char> = (0..length.saturating_sub(2))
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect();
    password.push(LETTERS[rng.random_range(0..LETTERS.len())] as char);
    password.push(char::from(b'0' + rng.random_range(0..10u8)));
    password.into_iter().collect()
}

/// 初始化教师账号
///
/// 已存在任何教师时什么也不做，可重复调用。配置的密码为空时随机生成并打印一次。
pub async fn seed_teacher(
    storage: &Arc<dyn Storage>,
    bootstrap: &BootstrapConfig,
) -> Result<Option<User>> {
    let teachers = storage.count_users_by_role(UserRole::Teacher).await?;
    if teachers > 0 {
        debug!(
            "Database already has {} teacher(s), skipping teacher seed",
            teachers
        );
        return Ok(None);
    }

    // 与注册一致，按规范化后的邮箱查重与存储
    let email = normalize_email(&bootstrap.teacher_email);
    if storage
        .get_user_by_username(&bootstrap.teacher_username)
        .await?
        .is_some()
        || storage.get_user_by_email(&email).await?.is_some()
    {
        warn!(
            "Bootstrap teacher '{}' conflicts with an existing account, skipping teacher seed",
            bootstrap.teacher_username
        );
        return Ok(None);
    }

    info!("No teacher found in database, creating bootstrap teacher account...");

    let password = if bootstrap.teacher_password.is_empty() {
        let pwd = generate_random_password(16);
        warn!("==========================================================");
        warn!("  TEACHER PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated teacher password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    } else {
        bootstrap.teacher_password.clone()
    };

    let user = storage
        .create_user(NewUser {
            username: bootstrap.teacher_username.clone(),
            email,
            password_hash: hash_password(&password)?,
            role: UserRole::Teacher,
        })
        .await?;

    info!(
        "Bootstrap teacher account created successfully (ID: {}, username: {})",
        user.id, user.username
    );
    Ok(Some(user))
}

/// 准备服务器启动的上下文
/// 包括存储、缓存与代码分析客户端
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let config = AppConfig::get();

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    register_builtin_plugins();
    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        debug!("Debug mode: Cache registry is enabled");
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    // 初始化教师账号（如果需要）
    if let Err(e) = seed_teacher(&storage, &config.bootstrap).await {
        warn!("Failed to seed bootstrap teacher: {}", e);
    }

    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    let analyzer = create_analyzer(&config.analyzer)?;

    Ok(StartupContext {
        storage,
        cache,
        analyzer,
    })
}
