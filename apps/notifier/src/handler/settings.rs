//! # 通知設定ハンドラ
//!
//! ## エンドポイント
//!
//! ```text
//! GET  /internal/notification-settings          設定の取得（未インストールは 404）
//! PUT  /internal/notification-settings          部分更新（不正な通知先は 400）
//! POST /internal/notification-settings/install  既定値でインストール（冪等）
//! ```

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use statemail_domain::settings::{NotificationSettings, SettingsUpdate};
use statemail_shared::ApiResponse;

use crate::{error::NotifierError, usecase::SettingsUseCaseImpl};

/// 設定ハンドラーの State
pub struct SettingsState {
    pub usecase: SettingsUseCaseImpl,
}

/// 通知設定 DTO
#[derive(Debug, Serialize)]
pub struct NotificationSettingsDto {
    pub enabled:          bool,
    /// 未設定は空文字列
    pub recipient:        String,
    pub allowed_states:   Vec<String>,
    pub subject_template: String,
    pub message_template: String,
}

impl From<&NotificationSettings> for NotificationSettingsDto {
    fn from(settings: &NotificationSettings) -> Self {
        Self {
            enabled:          settings.enabled(),
            recipient:        settings.recipient().unwrap_or_default().to_string(),
            allowed_states:   settings.allowed_states().iter().cloned().collect(),
            subject_template: settings.subject_template().to_string(),
            message_template: settings.message_template().to_string(),
        }
    }
}

/// 設定更新リクエスト
///
/// 省略した項目は変更しない。
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettingsRequest {
    pub enabled:          Option<bool>,
    pub recipient:        Option<String>,
    pub allowed_states:   Option<Vec<String>>,
    pub subject_template: Option<String>,
    pub message_template: Option<String>,
}

impl From<UpdateSettingsRequest> for SettingsUpdate {
    fn from(req: UpdateSettingsRequest) -> Self {
        Self {
            enabled:          req.enabled,
            recipient:        req.recipient,
            allowed_states:   req.allowed_states,
            subject_template: req.subject_template,
            message_template: req.message_template,
        }
    }
}

/// GET /internal/notification-settings
pub async fn get_settings(
    State(state): State<Arc<SettingsState>>,
) -> Result<impl IntoResponse, NotifierError> {
    let settings = state.usecase.get().await?;

    Ok(Json(ApiResponse::new(NotificationSettingsDto::from(
        &settings,
    ))))
}

/// PUT /internal/notification-settings
pub async fn update_settings(
    State(state): State<Arc<SettingsState>>,
    Json(req): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, NotifierError> {
    let settings = state.usecase.update(req.into()).await?;

    Ok(Json(ApiResponse::new(NotificationSettingsDto::from(
        &settings,
    ))))
}

/// POST /internal/notification-settings/install
///
/// 新規にインストールした場合は 201、既にインストール済みの場合は 200 を返す。
pub async fn install_settings(
    State(state): State<Arc<SettingsState>>,
) -> Result<impl IntoResponse, NotifierError> {
    let outcome = state.usecase.install().await?;
    let status = if outcome.installed {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((
        status,
        Json(ApiResponse::new(NotificationSettingsDto::from(
            &outcome.settings,
        ))),
    ))
}
