use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::artifacts::{ArtifactStore, FilesystemArtifactStore};
use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::errors::{ContestError, Result};
use crate::models::users::{NewUser, UserProfile, UserRole};
use crate::services::SubmissionLocks;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::random_code::generate_password;

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub locks: Arc<SubmissionLocks>,
}

async fn try_cache_plugin(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name)?;
    match constructor().await {
        Ok(cache) => Some(Arc::from(cache)),
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let cache_type = &AppConfig::get().cache.cache_type;

    warn!("Attempting to create {} cache backend", cache_type);

    if get_object_cache_plugin(cache_type).is_none() {
        warn!("Cache backend '{}' not found in registry", cache_type);
    } else if let Some(cache) = try_cache_plugin(cache_type).await {
        warn!("Successfully created {} cache backend", cache_type);
        return Ok(cache);
    }

    if cache_type != "moka" {
        warn!("Falling back to memory cache");
        if let Some(cache) = try_cache_plugin("moka").await {
            warn!("Successfully created fallback Moka (in-memory) cache backend");
            return Ok(cache);
        }
    }

    Err(ContestError::cache_plugin_not_found(format!(
        "No cache backend available (tried: {cache_type})"
    )))
}

/// 初始化默认管理员账号
/// 系统中还没有管理员时按配置创建一个
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users_by_role(UserRole::Admin).await {
        Ok(count) if count > 0 => {
            debug!("Found {} admin account(s), skipping admin seed", count);
            return;
        }
        Ok(_) => {
            info!("No admin account found, creating default admin account...");
        }
        Err(e) => {
            warn!("Failed to count admin accounts: {}, skipping admin seed", e);
            return;
        }
    }

    // 获取密码：优先从环境变量，否则生成随机密码
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        let pwd = generate_password(16);
        warn!("==========================================================");
        warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated admin password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    });

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    let admin = &AppConfig::get().admin;
    let new_admin = NewUser {
        name: admin.name.clone(),
        email: admin.email.to_lowercase(),
        phone: admin.phone.clone(),
        password_hash,
        profile: UserProfile::default(),
    };

    match storage.create_staff_user(new_admin, UserRole::Admin).await {
        Ok(user) => {
            info!(
                "Default admin account created successfully (ID: {}, phone: {})",
                user.id, user.phone
            );
        }
        Err(e) => {
            warn!("Failed to create admin account: {}", e);
        }
    }
}

/// 准备服务器启动的上下文
/// 包括存储、缓存、产物目录和提交锁
pub async fn prepare_server_startup() -> Result<StartupContext> {
    // 重复安装只会返回 Err，忽略即可
    let _ = rustls::crypto::ring::default_provider().install_default();

    let config = AppConfig::get();

    debug!(
        "Registered cache plugins: {:?}",
        crate::cache::register::registered_object_cache_plugins()
    );

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    seed_admin(&storage).await;

    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    let artifacts: Arc<dyn ArtifactStore> = Arc::new(
        FilesystemArtifactStore::new(&config.upload.dir, config.upload.max_size as u64).await?,
    );
    warn!("Artifact store ready at {}", config.upload.dir);

    Ok(StartupContext {
        storage,
        cache,
        artifacts,
        locks: Arc::new(SubmissionLocks::new()),
    })
}
