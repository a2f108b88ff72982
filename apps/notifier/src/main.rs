//! # Notifier サーバー
//!
//! ワークフロー遷移の通知メールを送信する内部サービス。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `NOTIFIER_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `NOTIFIER_PORT` | **Yes** | ポート番号 |
//! | `SETTINGS_BACKEND` | No | `file` / `memory`（デフォルト: `file`） |
//! | `SETTINGS_PATH` | No | 設定ファイルのパス（デフォルト: `notification-settings.json`） |
//! | `SETTINGS_AUTO_INSTALL` | No | 起動時に既定値でインストールする（デフォルト: `true`） |
//! | `NOTIFICATION_BACKEND` | No | `smtp` / `noop`（デフォルト: `noop`） |
//! | `SMTP_HOST` / `SMTP_PORT` | No | SMTP サーバー（デフォルト: `localhost:1025`） |
//! | `NOTIFICATION_FROM_ADDRESS` | No | 送信元メールアドレス |
//! | `PORTAL_URL` | No | ポータルの URL（`{portal_url}`） |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//!
//! ## 起動方法
//!
//! ```bash
//! NOTIFIER_PORT=3100 cargo run -p statemail-notifier
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use statemail_domain::clock::SystemClock;
use statemail_infra::{
    notification::{NoopNotificationSender, NotificationSender, SmtpNotificationSender},
    repository::{InMemorySettingsRepository, JsonFileSettingsRepository, SettingsRepository},
};
use statemail_notifier::{
    AppDependencies,
    build_app,
    config::{NotificationBackend, NotificationConfig, NotifierConfig, SettingsBackend, SettingsConfig},
    usecase::{SettingsUseCaseImpl, SiteContext, TemplateFormatter},
};
use statemail_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// Notifier サーバーのエントリーポイント
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. アプリケーション設定の読み込み
/// 4. 送信バックエンド・設定ストレージの初期化
/// 5. ルーターの構築と HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    let tracing_config = TracingConfig::from_env("notifier");
    init_tracing(&tracing_config).context("トレーシングの初期化に失敗しました")?;
    let _tracing_guard =
        tracing::info_span!("app", service = %tracing_config.service_name).entered();

    let config = NotifierConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "Notifier サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let sender = build_sender(&config.notification);
    let settings_repo = build_settings_repository(&config.settings);

    if config.settings.auto_install {
        let outcome = SettingsUseCaseImpl::new(settings_repo.clone())
            .install()
            .await
            .context("通知設定のインストールに失敗しました")?;
        if outcome.installed {
            tracing::info!("通知設定を既定値でインストールしました");
        }
    }

    let app = build_app(AppDependencies {
        sender,
        settings_repo,
        clock: Arc::new(SystemClock),
        formatter: TemplateFormatter::new()?,
        site: SiteContext {
            portal_url:   config.notification.portal_url.clone(),
            from_address: config.notification.from_address.clone(),
        },
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("バインドアドレスが不正です")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Notifier サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// 送信バックエンドを初期化する
fn build_sender(config: &NotificationConfig) -> Arc<dyn NotificationSender> {
    match config.backend {
        NotificationBackend::Smtp => {
            tracing::info!(
                "通知バックエンド: SMTP ({}:{})",
                config.smtp_host,
                config.smtp_port
            );
            Arc::new(SmtpNotificationSender::new(
                &config.smtp_host,
                config.smtp_port,
            ))
        }
        NotificationBackend::Noop => {
            tracing::info!("通知バックエンド: Noop（メール送信なし）");
            Arc::new(NoopNotificationSender)
        }
    }
}

/// 設定ストレージを初期化する
fn build_settings_repository(config: &SettingsConfig) -> Arc<dyn SettingsRepository> {
    match config.backend {
        SettingsBackend::File => {
            tracing::info!("設定ストレージ: ファイル ({})", config.path.display());
            Arc::new(JsonFileSettingsRepository::new(config.path.clone()))
        }
        SettingsBackend::Memory => {
            tracing::info!("設定ストレージ: メモリ（再起動で消えます）");
            Arc::new(InMemorySettingsRepository::new())
        }
    }
}
