//! # SettingsRepository
//!
//! 通知設定（サイト全体で 1 件）の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **未インストールは `None`**: 設定が存在しないことはエラーではなく `Ok(None)` で表す
//! - **送信処理からは読み取りのみ**: 書き込みはインストールと編集操作だけが行う
//! - **保存ごとに別の一時ファイル**: 同時に保存しても一時ファイルを取り合わない
//! - **読み込み時も検証する**: 手で編集された不正な設定ファイルは読み込みエラーになる

use std::{
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use statemail_domain::settings::NotificationSettings;
use tokio::sync::RwLock;

use crate::error::InfraError;

/// 通知設定リポジトリトレイト
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// 設定を読み込む。未インストールの場合は `None`
    async fn load(&self) -> Result<Option<NotificationSettings>, InfraError>;

    /// 設定を保存する（既存の設定は置き換える）
    async fn save(&self, settings: &NotificationSettings) -> Result<(), InfraError>;
}

/// JSON ファイル実装の SettingsRepository
///
/// ファイルが存在しない状態を「未インストール」とみなす。
/// 保存は同じディレクトリの一時ファイルに書き込んでから置き換える。
#[derive(Debug, Clone)]
pub struct JsonFileSettingsRepository {
    path: PathBuf,
}

impl JsonFileSettingsRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// `bytes` を `path` にアトミックに書き込む
fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl SettingsRepository for JsonFileSettingsRepository {
    #[tracing::instrument(skip_all, level = "debug", fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Option<NotificationSettings>, InfraError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let settings = serde_json::from_slice(&bytes)?;
        Ok(Some(settings))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(path = %self.path.display()))]
    async fn save(&self, settings: &NotificationSettings) -> Result<(), InfraError> {
        let json = serde_json::to_vec_pretty(settings)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &json))
            .await
            .map_err(|e| InfraError::unexpected(format!("設定の保存タスクが失敗しました: {e}")))??;

        Ok(())
    }
}

/// メモリ実装の SettingsRepository
///
/// プロセス終了で設定は失われる。`SETTINGS_BACKEND=memory` やテストで使用する。
#[derive(Debug, Clone, Default)]
pub struct InMemorySettingsRepository {
    settings: Arc<RwLock<Option<NotificationSettings>>>,
}

impl InMemorySettingsRepository {
    /// 未インストール状態で作成する
    pub fn new() -> Self {
        Self::default()
    }

    /// インストール済みの状態で作成する
    pub fn with_settings(settings: NotificationSettings) -> Self {
        Self {
            settings: Arc::new(RwLock::new(Some(settings))),
        }
    }
}

#[async_trait]
impl SettingsRepository for InMemorySettingsRepository {
    async fn load(&self) -> Result<Option<NotificationSettings>, InfraError> {
        Ok(self.settings.read().await.clone())
    }

    async fn save(&self, settings: &NotificationSettings) -> Result<(), InfraError> {
        *self.settings.write().await = Some(settings.clone());
        Ok(())
    }
}
