//! # インフラ層エラー定義
//!
//! 設定ファイルの読み書きなど、外部リソースとの通信で発生するエラーを表現する。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別（Io, Serialization 等）
//!
//! `From` 実装や convenience constructor でエラーを生成すると、
//! その時点のスパン情報が自動的にキャプチャされる。

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別に応じた処理には [`kind()`](InfraError::kind) を使用する。
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// ファイル I/O エラー
    #[error("I/O エラー: {0}")]
    Io(#[source] std::io::Error),

    /// シリアライズ/デシリアライズエラー
    ///
    /// 設定ファイルの JSON が壊れている場合など。
    #[error("シリアライズエラー: {0}")]
    Serialization(#[source] serde_json::Error),

    /// 予期しないエラー
    #[error("予期しないエラー: {0}")]
    Unexpected(String),
}

impl InfraError {
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// 予期しないエラーを生成する
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Unexpected(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}

// ===== From 実装（SpanTrace 自動キャプチャ） =====

impl From<std::io::Error> for InfraError {
    fn from(source: std::io::Error) -> Self {
        Self {
            kind:       InfraErrorKind::Io(source),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(source: serde_json::Error) -> Self {
        Self {
            kind:       InfraErrorKind::Serialization(source),
            span_trace: SpanTrace::capture(),
        }
    }
}
