//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはサブモジュールに配置
//! - 親モジュール（この `handler.rs`）で re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、判定・フォーマットはユースケース層に委譲

pub mod health;
pub mod settings;
pub mod transition;

pub use health::health_check;
pub use settings::{SettingsState, get_settings, install_settings, update_settings};
pub use transition::{NotificationState, receive_transition};
