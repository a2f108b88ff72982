//! # ヘルスチェックハンドラ
//!
//! ## エンドポイント
//!
//! ```text
//! GET /health
//! ```
//!
//! ## レスポンス例
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "version": "0.1.0"
//! }
//! ```

use axum::Json;
use statemail_shared::HealthResponse;

/// ヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(env!("CARGO_PKG_VERSION")))
}
