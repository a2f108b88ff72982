//! # StateMail ドメイン層
//!
//! ワークフロー遷移通知の中核となるドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **純粋なモデル**: I/O を持たず、ホストプラットフォームから受け取った値だけを扱う
//! - **値オブジェクト**: メールアドレスなど検証が必要な値は生成時に検証する
//! - **テンプレート値**: プレースホルダーから参照できる属性はホワイトリストで公開する
//!
//! ## 依存関係の方向
//!
//! ```text
//! notifier → infra → domain
//!     ↘
//!       shared
//! ```
//!
//! ドメイン層はインフラ層（メール送信、設定の永続化）に一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`clock`] - 現在時刻の抽象化
//! - [`content`] - 遷移対象のコンテンツオブジェクト
//! - [`error`] - ドメイン層エラー
//! - [`notification`] - メールメッセージと送信結果
//! - [`settings`] - 通知設定
//! - [`template`] - テンプレートに渡すパラメータ
//! - [`transition`] - ワークフロー遷移イベント
//! - [`value_objects`] - 値オブジェクト
//!
//! ## 使用例
//!
//! ```rust
//! use statemail_domain::settings::NotificationSettings;
//!
//! let settings = NotificationSettings::default();
//! assert!(!settings.enabled());
//! assert!(settings.allowed_states().is_empty());
//! ```

pub mod clock;
pub mod content;
pub mod error;
pub mod notification;
pub mod settings;
pub mod template;
pub mod transition;
pub mod value_objects;

pub use error::DomainError;
