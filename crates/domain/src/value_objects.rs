//! # 値オブジェクト
//!
//! 通知設定で使う検証付きの値を定義する。
//!
//! - [`Email`]: 通知先メールアドレス
//! - [`StateId`]: ワークフロー状態 ID（例: `published`, `pending`）

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// メールアドレス（値オブジェクト）
///
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[serde(transparent)]
#[display("{_0}")]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 前後の空白は除去される
    /// - 空文字列ではない
    /// - `local@domain` の形式で、ドメイン部に `.` を含む
    /// - 最大 255 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || !domain.contains('.')
            || value.chars().any(char::is_whitespace)
        {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

/// ワークフロー状態 ID（値オブジェクト）
///
/// ワークフローエンジンが付与する状態の識別子。空白を含まない。
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, derive_more::Display,
)]
#[serde(transparent)]
#[display("{_0}")]
pub struct StateId(String);

impl StateId {
    /// 状態 ID の最大文字数
    pub const MAX_LENGTH: usize = 100;

    /// 状態 ID を作成する
    ///
    /// 前後の空白を除去したうえで、空文字列・内部の空白・長さ超過を拒否する。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into().trim().to_string();

        if value.is_empty() {
            return Err(DomainError::Validation("状態 ID は必須です".to_string()));
        }

        if value.chars().any(char::is_whitespace) {
            return Err(DomainError::Validation(format!(
                "状態 ID に空白は使用できません: {value}"
            )));
        }

        if value.chars().count() > Self::MAX_LENGTH {
            return Err(DomainError::Validation(format!(
                "状態 ID は {} 文字以内である必要があります",
                Self::MAX_LENGTH
            )));
        }

        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}
