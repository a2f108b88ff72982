//! # 通知
//!
//! メール通知に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 |
//! |---|------------|
//! | [`EmailMessage`] | 送信するメール（本文・宛先・送信元・件名・文字コード） |
//! | [`DispatchOutcome`] | 遷移イベント 1 件に対する送信結果 |
//! | [`SkipReason`] | 送信しなかった理由 |
//!
//! ## 設計方針
//!
//! - **送信失敗は呼び出し元へ**: 送信エラーは握りつぶさず [`NotificationError`] で返す
//! - **スキップは正常系**: 送信条件を満たさないイベントはエラーではなく [`DispatchOutcome::Skipped`]

use serde::Serialize;
use strum::IntoStaticStr;
use thiserror::Error;

/// メールの既定の文字コード
pub const DEFAULT_CHARSET: &str = "utf-8";

/// 通知処理のエラー
#[derive(Debug, Error)]
pub enum NotificationError {
    /// メール送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),

    /// テンプレートエンジンの初期化に失敗
    #[error("テンプレートの初期化に失敗: {0}")]
    TemplateFailed(String),

    /// 設定の読み込みに失敗（未インストールとは区別する）
    #[error("通知設定の読み込みに失敗: {0}")]
    SettingsUnavailable(String),
}

/// メールメッセージ
///
/// フォーマット済みの件名・本文。`NotificationSender` に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// プレーンテキスト本文
    pub body:    String,
    /// 送信先メールアドレス
    pub to:      String,
    /// 送信元メールアドレス
    pub from:    String,
    /// 件名
    pub subject: String,
    /// 本文の文字コード
    pub charset: String,
}

impl EmailMessage {
    /// 既定の文字コード（utf-8）でメッセージを作成する
    pub fn new(
        body: impl Into<String>,
        to: impl Into<String>,
        from: impl Into<String>,
        subject: impl Into<String>,
    ) -> Self {
        Self {
            body:    body.into(),
            to:      to.into(),
            from:    from.into(),
            subject: subject.into(),
            charset: DEFAULT_CHARSET.to_string(),
        }
    }
}

/// 送信しなかった理由
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, IntoStaticStr, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkipReason {
    /// 設定がインストールされていない
    SettingsNotInstalled,
    /// 通知が無効
    Disabled,
    /// 通知先が未設定
    RecipientMissing,
    /// 通知対象の状態が未設定
    NoAllowedStates,
    /// 遷移を伴わないイベント
    NotATransition,
    /// 遷移先の状態が通知対象外
    StateNotAllowed,
}

/// 遷移イベント 1 件に対する送信結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// メールを 1 通送信した
    Sent {
        recipient: String,
        subject:   String,
    },
    /// 送信条件を満たさなかった
    Skipped(SkipReason),
}
