//! Noop 通知送信実装
//!
//! SMTP 実装と同じ手順で lettre のメッセージを組み立て、配送せずにログへ記録する。
//! アドレスや文字コードの不備は SMTP 実装と同じ [`NotificationError::SendFailed`] になるため、
//! `NOTIFICATION_BACKEND=noop` のまま設定の誤りに気づける。

use async_trait::async_trait;
use statemail_domain::notification::{EmailMessage, NotificationError};

use super::{NotificationSender, smtp::build_message};

/// Noop 通知送信（組み立てのみ行い、配送しない）
#[derive(Debug, Clone)]
pub struct NoopNotificationSender;

#[async_trait]
impl NotificationSender for NoopNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let message = build_message(email)?;

        tracing::info!(
            notification.to = %email.to,
            notification.from = %email.from,
            notification.subject = %email.subject,
            notification.charset = %email.charset,
            notification.size = message.formatted().len(),
            "Noop: メールを組み立てましたが配送はしません"
        );
        Ok(())
    }
}
