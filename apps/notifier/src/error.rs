//! # Notifier エラー定義
//!
//! Notifier 固有のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! | バリアント | HTTP ステータス |
//! |-----------|----------------|
//! | `NotFound` | 404 |
//! | `BadRequest` / `Validation` | 400 |
//! | `Notification(SendFailed)` | 502 |
//! | その他 | 500（詳細はログのみ） |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use statemail_domain::{DomainError, notification::NotificationError};
use statemail_infra::InfraError;
use statemail_shared::ErrorResponse;
use thiserror::Error;

/// Notifier で発生するエラー
#[derive(Debug, Error)]
pub enum NotifierError {
    /// リソースが見つからない
    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),

    /// 入力値の検証失敗
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 通知処理のエラー
    #[error(transparent)]
    Notification(#[from] NotificationError),

    /// 設定ストレージのエラー
    #[error("設定ストレージのエラー: {0}")]
    Infra(#[from] InfraError),
}

impl From<DomainError> for NotifierError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::Validation(msg),
            DomainError::NotFound { .. } => Self::NotFound(err.to_string()),
        }
    }
}

impl IntoResponse for NotifierError {
    fn into_response(self) -> Response {
        let body = match &self {
            NotifierError::NotFound(msg) => ErrorResponse::not_found(msg.clone()),
            NotifierError::BadRequest(msg) => ErrorResponse::bad_request(msg.clone()),
            NotifierError::Validation(msg) => ErrorResponse::validation_error(msg.clone()),
            NotifierError::Notification(NotificationError::SendFailed(msg)) => {
                tracing::error!("メール送信エラー: {}", msg);
                ErrorResponse::mail_delivery_failed("通知メールの送信に失敗しました")
            }
            NotifierError::Notification(e) => {
                tracing::error!("通知処理エラー: {}", e);
                ErrorResponse::internal_error()
            }
            NotifierError::Infra(e) => {
                tracing::error!(
                    error.kind = "infrastructure",
                    span_trace = %e.span_trace(),
                    "設定ストレージエラー: {}",
                    e
                );
                ErrorResponse::internal_error()
            }
        };

        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}
