//! # StateMail Notifier
//!
//! ワークフロー遷移を受け取り、サイト設定に従って通知メールを送信する内部サービス。
//!
//! ## 処理の流れ
//!
//! ```text
//! ホスト ──POST /internal/workflow/transitions──▶ handler::transition
//!                                                   │
//!                                                   ▼
//!                                 usecase::NotificationService
//!                                  ├─ SettingsRepository（設定の読み込み）
//!                                  ├─ TemplateFormatter（件名・本文）
//!                                  └─ NotificationSender（SMTP / Noop）
//! ```
//!
//! ## モジュール構成
//!
//! - [`config`]: 環境変数からの設定読み込み
//! - [`error`]: エラー定義と HTTP レスポンス変換
//! - [`handler`]: HTTP ハンドラ
//! - [`usecase`]: 通知・設定のユースケース
//! - [`app_builder`]: DI とルーター構築

pub mod app_builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;

pub use app_builder::{AppDependencies, build_app};
