//! # 通知ユースケース
//!
//! ワークフロー遷移に伴うメール通知の判定・フォーマット・送信を統合する。
//!
//! ## モジュール構成
//!
//! - [`formatter`] - `{name}` / `{name.attr}` プレースホルダーの置換
//! - [`service`] - 送信条件の判定 + フォーマット + 送信の統合サービス

pub mod formatter;
pub mod service;

pub use formatter::{FormatError, Formatted, TemplateFormatter};
pub use service::{NotificationService, SiteContext};
