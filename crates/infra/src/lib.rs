//! # StateMail インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **メール送信**: SMTP / Noop の送信実装（[`notification`]）
//! - **設定の永続化**: 通知設定の読み書き（[`repository`]）
//!
//! ## 依存関係
//!
//! ```text
//! notifier → infra → domain
//! ```
//!
//! ドメイン層はインフラ層に依存しない（依存性逆転の原則）。
//!
//! ## モジュール構成
//!
//! - [`error`] - インフラ層エラー定義
//! - [`notification`] - メール送信トレイトと実装
//! - [`repository`] - 設定リポジトリトレイトと実装
//! - `mock` - テスト用モック（`test-utils` feature）

pub mod error;
pub mod notification;
pub mod repository;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use error::InfraError;
