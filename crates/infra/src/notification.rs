//! # 通知送信
//!
//! メール通知の送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（本番・Mailpit 開発用）、Noop（通知無効化時）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **再送しない**: 送信失敗はそのまま呼び出し元に返す

mod noop;
mod smtp;

use async_trait::async_trait;
pub use noop::NoopNotificationSender;
pub use smtp::SmtpNotificationSender;
use statemail_domain::notification::{EmailMessage, NotificationError};

/// メール送信トレイト
///
/// 本文・宛先・送信元・件名・文字コードを受け取り、配送する。
/// 配送の失敗は [`NotificationError::SendFailed`] で返す。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), NotificationError>;
}
