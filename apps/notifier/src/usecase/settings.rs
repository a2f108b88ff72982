//! # 通知設定ユースケース
//!
//! 通知設定のインストール・参照・部分更新を扱う。
//!
//! ## 設計方針
//!
//! - **インストールは冪等**: 既にインストール済みの場合は既存の設定を返し、上書きしない
//! - **更新は検証後に保存**: 検証に失敗した場合は何も保存しない
//! - **書き込みは直列化**: インストールと更新は読み込みから保存までロックを保持し、
//!   同時の更新が互いの変更を失わない

use std::sync::Arc;

use statemail_domain::settings::{NotificationSettings, SETTINGS_ID, SettingsUpdate};
use statemail_infra::repository::SettingsRepository;
use statemail_shared::{event_log::event, log_business_event};
use tokio::sync::Mutex;

use crate::error::NotifierError;

/// インストール結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub settings:  NotificationSettings,
    /// 今回のインストールで新規作成したか
    pub installed: bool,
}

/// 通知設定ユースケース
pub struct SettingsUseCaseImpl {
    repo:       Arc<dyn SettingsRepository>,
    write_lock: Mutex<()>,
}

impl SettingsUseCaseImpl {
    pub fn new(repo: Arc<dyn SettingsRepository>) -> Self {
        Self {
            repo,
            write_lock: Mutex::new(()),
        }
    }

    /// 現在の設定を取得する
    pub async fn get(&self) -> Result<NotificationSettings, NotifierError> {
        self.repo.load().await?.ok_or_else(not_installed)
    }

    /// 既定値で設定をインストールする
    pub async fn install(&self) -> Result<InstallOutcome, NotifierError> {
        let _guard = self.write_lock.lock().await;

        if let Some(settings) = self.repo.load().await? {
            tracing::debug!("通知設定はインストール済みです");
            return Ok(InstallOutcome {
                settings,
                installed: false,
            });
        }

        let settings = NotificationSettings::default();
        self.repo.save(&settings).await?;

        log_business_event!(
            event.category = event::category::SETTINGS,
            event.action = event::action::SETTINGS_INSTALLED,
            event.entity_type = event::entity_type::NOTIFICATION_SETTINGS,
            event.entity_id = SETTINGS_ID,
            event.result = event::result::SUCCESS,
            "通知設定をインストールしました"
        );

        Ok(InstallOutcome {
            settings,
            installed: true,
        })
    }

    /// 設定を部分更新する
    pub async fn update(
        &self,
        update: SettingsUpdate,
    ) -> Result<NotificationSettings, NotifierError> {
        let _guard = self.write_lock.lock().await;

        let current = self.repo.load().await?.ok_or_else(not_installed)?;
        let next = current.apply(update)?;
        self.repo.save(&next).await?;

        log_business_event!(
            event.category = event::category::SETTINGS,
            event.action = event::action::SETTINGS_UPDATED,
            event.entity_type = event::entity_type::NOTIFICATION_SETTINGS,
            event.entity_id = SETTINGS_ID,
            event.result = event::result::SUCCESS,
            settings.enabled = next.enabled(),
            settings.allowed_states = next.allowed_states().len(),
            "通知設定を更新しました"
        );

        Ok(next)
    }
}

fn not_installed() -> NotifierError {
    NotifierError::NotFound(format!("{SETTINGS_ID} はインストールされていません"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use statemail_infra::repository::{InMemorySettingsRepository, JsonFileSettingsRepository};

    use super::*;

    fn make_sut(repo: InMemorySettingsRepository) -> SettingsUseCaseImpl {
        SettingsUseCaseImpl::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn test_未インストールの取得はnot_found() {
        let sut = make_sut(InMemorySettingsRepository::new());

        let result = sut.get().await;

        assert!(matches!(result, Err(NotifierError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_インストールで既定値が保存される() {
        let repo = InMemorySettingsRepository::new();
        let sut = make_sut(repo.clone());

        let outcome = sut.install().await.unwrap();

        assert!(outcome.installed);
        assert_eq!(outcome.settings, NotificationSettings::default());
        assert_eq!(repo.load().await.unwrap(), Some(NotificationSettings::default()));
    }

    #[tokio::test]
    async fn test_インストールは既存の設定を上書きしない() {
        let existing = NotificationSettings::default().with_enabled(true);
        let sut = make_sut(InMemorySettingsRepository::with_settings(existing.clone()));

        let outcome = sut.install().await.unwrap();

        assert!(!outcome.installed);
        assert_eq!(outcome.settings, existing);
    }

    #[tokio::test]
    async fn test_更新は指定した項目だけを変更する() {
        let repo = InMemorySettingsRepository::with_settings(NotificationSettings::default());
        let sut = make_sut(repo.clone());

        let updated = sut
            .update(SettingsUpdate {
                enabled: Some(true),
                recipient: Some("tester@example.com".to_string()),
                allowed_states: Some(vec!["pending".to_string()]),
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(updated.enabled());
        assert_eq!(updated.recipient(), Some("tester@example.com"));
        assert!(updated.allows("pending"));
        assert_eq!(
            updated.subject_template(),
            NotificationSettings::default().subject_template()
        );
        assert_eq!(repo.load().await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_不正な通知先では保存しない() {
        let repo = InMemorySettingsRepository::with_settings(NotificationSettings::default());
        let sut = make_sut(repo.clone());

        let result = sut
            .update(SettingsUpdate {
                enabled: Some(true),
                recipient: Some("not-an-email".to_string()),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(NotifierError::Validation(_))));
        assert_eq!(
            repo.load().await.unwrap(),
            Some(NotificationSettings::default())
        );
    }

    #[tokio::test]
    async fn test_未インストールの更新はnot_found() {
        let sut = make_sut(InMemorySettingsRepository::new());

        let result = sut.update(SettingsUpdate::default()).await;

        assert!(matches!(result, Err(NotifierError::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_同時の更新は互いの変更を失わない() {
        let dir = tempfile::tempdir().unwrap();

        for round in 0..50 {
            let path = dir.path().join(format!("settings-{round}.json"));
            let sut = Arc::new(SettingsUseCaseImpl::new(Arc::new(
                JsonFileSettingsRepository::new(path),
            )));
            sut.install().await.unwrap();

            let enable = {
                let sut = sut.clone();
                tokio::spawn(async move {
                    sut.update(SettingsUpdate {
                        enabled: Some(true),
                        ..Default::default()
                    })
                    .await
                })
            };
            let recipient = {
                let sut = sut.clone();
                tokio::spawn(async move {
                    sut.update(SettingsUpdate {
                        recipient: Some("tester@example.com".to_string()),
                        ..Default::default()
                    })
                    .await
                })
            };
            enable.await.unwrap().unwrap();
            recipient.await.unwrap().unwrap();

            let settings = sut.get().await.unwrap();
            assert!(settings.enabled(), "round {round}");
            assert_eq!(settings.recipient(), Some("tester@example.com"), "round {round}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_同時のインストールは一度だけ作成する() {
        let sut = Arc::new(make_sut(InMemorySettingsRepository::new()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sut = sut.clone();
                tokio::spawn(async move { sut.install().await })
            })
            .collect();

        let mut installed = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().installed {
                installed += 1;
            }
        }
        assert_eq!(installed, 1);
    }
}
