//! # ユースケース
//!
//! - [`notification`] - 遷移イベントのフォーマットと送信
//! - [`settings`] - 通知設定のインストールと編集

pub mod notification;
pub mod settings;

pub use notification::{NotificationService, SiteContext, TemplateFormatter};
pub use settings::SettingsUseCaseImpl;
