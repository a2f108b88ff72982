//! # Notifier アプリケーション構築
//!
//! DI（State）の初期化とルーター構築を担当する。
//! `main.rs` は設定読み込み・インフラ初期化とサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use statemail_domain::clock::Clock;
use statemail_infra::{notification::NotificationSender, repository::SettingsRepository};
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        NotificationState,
        SettingsState,
        get_settings,
        health_check,
        install_settings,
        receive_transition,
        update_settings,
    },
    usecase::{NotificationService, SettingsUseCaseImpl, SiteContext, TemplateFormatter},
};

/// ルーター構築に必要な依存
pub struct AppDependencies {
    pub sender:        Arc<dyn NotificationSender>,
    pub settings_repo: Arc<dyn SettingsRepository>,
    pub clock:         Arc<dyn Clock>,
    pub formatter:     TemplateFormatter,
    pub site:          SiteContext,
}

/// DI コンテナの構築とルーター定義を行う
///
/// 通知サービスと設定ユースケースは同じ `SettingsRepository` を共有する。
pub fn build_app(deps: AppDependencies) -> Router {
    let notification_state = Arc::new(NotificationState {
        service: NotificationService::new(
            deps.sender,
            deps.settings_repo.clone(),
            deps.formatter,
            deps.site,
        ),
        clock:   deps.clock,
    });
    let settings_state = Arc::new(SettingsState {
        usecase: SettingsUseCaseImpl::new(deps.settings_repo),
    });

    Router::new()
        .route("/health", get(health_check))
        .route("/internal/workflow/transitions", post(receive_transition))
        .with_state(notification_state)
        .route(
            "/internal/notification-settings",
            get(get_settings).put(update_settings),
        )
        .route(
            "/internal/notification-settings/install",
            post(install_settings),
        )
        .with_state(settings_state)
        .layer(TraceLayer::new_for_http())
}
