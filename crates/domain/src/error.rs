//! # ドメイン層エラー定義
//!
//! ビジネスルール違反やドメイン固有の例外状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | 設定値の検証失敗 |
//! | `NotFound` | 404 Not Found | 設定が未インストール |
//!
//! ## 使用例
//!
//! ```rust
//! use statemail_domain::DomainError;
//!
//! fn validate_state(state: &str) -> Result<(), DomainError> {
//!     if state.is_empty() {
//!         return Err(DomainError::Validation("状態 ID は必須です".to_string()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(validate_state("").is_err());
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// API 層でこのエラーを受け取り、適切な HTTP レスポンスに変換する。
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// 入力値がビジネスルールに違反している場合に使用する。
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// エンティティが見つからない
    ///
    /// # フィールド
    ///
    /// - `entity_type`: エンティティの種類（コンパイル時に決定される `&'static str`）
    /// - `id`: 検索に使用した識別子
    #[error("{entity_type} が見つかりません: {id}")]
    NotFound {
        /// エンティティの種類（"NotificationSettings" など）
        entity_type: &'static str,
        /// 検索に使用した識別子
        id:          String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validationのメッセージ() {
        let err = DomainError::Validation("不正な値".to_string());
        assert_eq!(err.to_string(), "バリデーションエラー: 不正な値");
    }

    #[test]
    fn test_not_foundのメッセージにエンティティ種別とidが含まれる() {
        let err = DomainError::NotFound {
            entity_type: "NotificationSettings",
            id:          "statemail.workflow.settings".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "NotificationSettings が見つかりません: statemail.workflow.settings"
        );
    }
}
