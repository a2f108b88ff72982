//! # Observability 基盤
//!
//! トレーシング初期化とログ出力形式の設定を提供する。
//!
//! ## 環境変数
//!
//! | 変数 | 既定値 | 意味 |
//! |------|--------|------|
//! | `LOG_FORMAT` | `pretty` | `json` または `pretty` |
//! | `RUST_LOG` | [`DEFAULT_DIRECTIVES`] | `EnvFilter` のディレクティブ |
//!
//! ## 設計方針
//!
//! - **読み込みはルックアップ関数経由**: `from_lookup` に任意の関数を渡してテストする
//! - **初期化は失敗を返す**: 二重初期化や不正なディレクティブで panic しない

/// `RUST_LOG` が未設定または不正な場合のディレクティブ
pub const DEFAULT_DIRECTIVES: &str = "info,statemail=debug";

/// ログ出力形式
///
/// 値が未設定または不正な場合は [`Pretty`](LogFormat::Pretty) にフォールバックする。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON 形式（本番環境向け）
    Json,
    /// 人間が読みやすい形式（開発環境向け）
    #[default]
    Pretty,
}

impl LogFormat {
    /// 文字列からログ形式をパースする
    ///
    /// 前後の空白と大文字小文字は無視する。
    /// 不正な値の場合は [`Pretty`](LogFormat::Pretty) にフォールバックし、
    /// stderr に警告を出力する（トレーシング初期化前に呼ばれるため）。
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            other => {
                eprintln!("WARNING: unknown LOG_FORMAT={other:?}, falling back to pretty");
                Self::Pretty
            }
        }
    }
}

/// トレーシング初期化設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// サービス名（初期化ログとルートスパンに付与する）
    pub service_name: String,
    pub log_format:   LogFormat,
    /// `RUST_LOG` の値。未設定なら [`DEFAULT_DIRECTIVES`] を使う
    pub directives:   Option<String>,
}

impl TracingConfig {
    pub fn new(service_name: impl Into<String>, log_format: LogFormat) -> Self {
        Self {
            service_name: service_name.into(),
            log_format,
            directives: None,
        }
    }

    /// 環境変数から読み込む
    pub fn from_env(service_name: impl Into<String>) -> Self {
        Self::from_lookup(service_name, |name| std::env::var(name).ok())
    }

    /// 任意のルックアップ関数から読み込む
    pub fn from_lookup(
        service_name: impl Into<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let log_format = lookup("LOG_FORMAT")
            .map(|value| LogFormat::parse(&value))
            .unwrap_or_default();

        Self {
            directives: lookup("RUST_LOG").filter(|value| !value.trim().is_empty()),
            ..Self::new(service_name, log_format)
        }
    }

    /// `EnvFilter` を構築する
    ///
    /// ディレクティブが不正な場合は stderr に警告し、[`DEFAULT_DIRECTIVES`] を使う。
    #[cfg(feature = "observability")]
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        use tracing_subscriber::EnvFilter;

        let fallback = || EnvFilter::new(DEFAULT_DIRECTIVES);
        match &self.directives {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
                eprintln!(
                    "WARNING: invalid RUST_LOG={directives:?} ({e}), \
                     falling back to {DEFAULT_DIRECTIVES:?}"
                );
                fallback()
            }),
            None => fallback(),
        }
    }
}

/// トレーシングを初期化する
///
/// `tracing_error::ErrorLayer` を登録し、インフラ層エラーの SpanTrace を有効にする。
/// グローバルなサブスクライバーが既に登録されている場合はエラーを返す。
#[cfg(feature = "observability")]
pub fn init_tracing(
    config: &TracingConfig,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;

    tracing::debug!(
        service = %config.service_name,
        format = ?config.log_format,
        "トレーシングを初期化しました"
    );
    Ok(())
}
