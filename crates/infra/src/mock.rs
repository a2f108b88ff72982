//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! statemail-infra = { workspace = true, features = ["test-utils"] }
//! ```
//!
//! 設定リポジトリのモックは [`InMemorySettingsRepository`](crate::repository::InMemorySettingsRepository)
//! をそのまま使う。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use statemail_domain::notification::{EmailMessage, NotificationError};

use crate::notification::NotificationSender;

// ===== MockNotificationSender =====

/// 送信したメールを記録するモック
///
/// `failing()` で作成すると、記録せずに常に `SendFailed` を返す。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent:    Arc<Mutex<Vec<EmailMessage>>>,
    failure: Option<String>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に送信に失敗するモックを作成する
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            sent:    Arc::new(Mutex::new(Vec::new())),
            failure: Some(message.into()),
        }
    }

    /// 送信されたメールの一覧
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        if let Some(message) = &self.failure {
            return Err(NotificationError::SendFailed(message.clone()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
