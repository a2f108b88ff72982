//! # Notifier 設定
//!
//! 環境変数から Notifier サーバーの設定を読み込む。
//!
//! 読み込みは [`NotifierConfig::from_lookup`] に集約し、
//! テストでは環境変数の代わりに任意のルックアップ関数を渡す。

use std::{env, path::PathBuf};

use statemail_domain::value_objects::Email;
use thiserror::Error;

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{0} が設定されていません（.env を確認してください）")]
    Missing(&'static str),

    /// 値が不正
    #[error("{name} の値が不正です: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Notifier サーバーの設定
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// バインドアドレス
    pub host:         String,
    /// ポート番号
    pub port:         u16,
    /// 通知設定ストレージ
    pub settings:     SettingsConfig,
    /// 通知送信
    pub notification: NotificationConfig,
}

/// 通知設定の保存先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsBackend {
    /// JSON ファイル
    File,
    /// プロセス内メモリ（再起動で消える）
    Memory,
}

/// 通知設定ストレージの設定
#[derive(Debug, Clone)]
pub struct SettingsConfig {
    pub backend:      SettingsBackend,
    /// `backend=file` の場合の保存先
    pub path:         PathBuf,
    /// 起動時に未インストールなら既定値でインストールする
    pub auto_install: bool,
}

/// 送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationBackend {
    /// SMTP サーバー経由で送信
    Smtp,
    /// 送信しない（ログ出力のみ）
    Noop,
}

/// 通知送信の設定
///
/// `NOTIFICATION_BACKEND` 環境変数で送信バックエンドを切り替える:
/// - `smtp`: Mailpit（開発）/ SMTP サーバー経由で送信
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub backend:      NotificationBackend,
    /// SMTP ホスト（backend=smtp の場合に使用）
    pub smtp_host:    String,
    /// SMTP ポート（backend=smtp の場合に使用）
    pub smtp_port:    u16,
    /// 送信元メールアドレス
    pub from_address: String,
    /// ポータルの URL（`{portal_url}` で参照される）
    pub portal_url:   String,
}

impl NotifierConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意のルックアップ関数から設定を読み込む
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &'static str, default: &str| {
            lookup(name).unwrap_or_else(|| default.to_string())
        };

        let port = lookup("NOTIFIER_PORT").ok_or(ConfigError::Missing("NOTIFIER_PORT"))?;

        Ok(Self {
            host:         var("NOTIFIER_HOST", "0.0.0.0"),
            port:         parse_port("NOTIFIER_PORT", port)?,
            settings:     SettingsConfig {
                backend:      match var("SETTINGS_BACKEND", "file").as_str() {
                    "file" => SettingsBackend::File,
                    "memory" => SettingsBackend::Memory,
                    other => return Err(invalid("SETTINGS_BACKEND", other)),
                },
                path:         PathBuf::from(var("SETTINGS_PATH", "notification-settings.json")),
                auto_install: parse_bool(
                    "SETTINGS_AUTO_INSTALL",
                    var("SETTINGS_AUTO_INSTALL", "true"),
                )?,
            },
            notification: NotificationConfig {
                backend:      match var("NOTIFICATION_BACKEND", "noop").as_str() {
                    "smtp" => NotificationBackend::Smtp,
                    "noop" => NotificationBackend::Noop,
                    other => return Err(invalid("NOTIFICATION_BACKEND", other)),
                },
                smtp_host:    var("SMTP_HOST", "localhost"),
                smtp_port:    parse_port("SMTP_PORT", var("SMTP_PORT", "1025"))?,
                from_address: {
                    let address =
                        var("NOTIFICATION_FROM_ADDRESS", "noreply@statemail.example.com");
                    Email::new(&address)
                        .map_err(|_| invalid("NOTIFICATION_FROM_ADDRESS", &address))?
                        .into_string()
                },
                portal_url:   var("PORTAL_URL", "http://localhost:8080")
                    .trim_end_matches('/')
                    .to_string(),
            },
        })
    }
}

fn invalid(name: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}

fn parse_port(name: &'static str, value: String) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| invalid(name, &value))
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(invalid(name, &value)),
    }
}
