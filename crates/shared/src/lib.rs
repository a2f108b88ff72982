//! # StateMail 共有ユーティリティ
//!
//! サービス全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - axum への依存は持たない（`IntoResponse` 変換はサービス側の責務）
//! - tracing 関連は `observability` feature の背後に置く

pub mod api_response;
pub mod error_response;
pub mod event_log;
pub mod health;
pub mod observability;

pub use api_response::ApiResponse;
pub use error_response::ErrorResponse;
pub use health::HealthResponse;
