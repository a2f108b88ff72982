//! SMTP 通知送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 開発環境では Mailpit（ローカル SMTP サーバー）に接続する。

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Tokio1Executor,
    message::{Message, header::ContentType},
};
use statemail_domain::notification::{EmailMessage, NotificationError};

use super::NotificationSender;

/// SMTP 通知送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
/// 本文は `text/plain` の単一パートで、`charset` は [`EmailMessage::charset`] に従う。
pub struct SmtpNotificationSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotificationSender {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `host`: SMTP サーバーのホスト名（例: "localhost"）
    /// - `port`: SMTP サーバーのポート番号（例: 1025 for Mailpit）
    pub fn new(host: &str, port: u16) -> Self {
        // builder_dangerous: TLS なしで接続（Mailpit 等のローカル SMTP 向け）
        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(port)
            .build();

        Self { transport }
    }
}

/// lettre のメッセージを組み立てる
///
/// Noop 実装も同じ組み立てを行い、不正なアドレスを同じように検出する。
pub(super) fn build_message(email: &EmailMessage) -> Result<Message, NotificationError> {
    let content_type = ContentType::parse(&format!("text/plain; charset={}", email.charset))
        .map_err(|e| NotificationError::SendFailed(format!("Content-Type 不正: {e}")))?;

    Message::builder()
        .from(
            email
                .from
                .parse()
                .map_err(|e| NotificationError::SendFailed(format!("送信元アドレス不正: {e}")))?,
        )
        .to(email
            .to
            .parse()
            .map_err(|e| NotificationError::SendFailed(format!("宛先アドレス不正: {e}")))?)
        .subject(&email.subject)
        .header(content_type)
        .body(email.body.clone())
        .map_err(|e| NotificationError::SendFailed(format!("メッセージ構築失敗: {e}")))
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError> {
        let message = build_message(email)?;

        self.transport
            .send(message)
            .await
            .map_err(|e| NotificationError::SendFailed(format!("SMTP 送信失敗: {e}")))?;

        Ok(())
    }
}
