//! # API レスポンスエンベロープ
//!
//! 統一レスポンス形式 `{ "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 統一レスポンス型
///
/// すべての API エンドポイントは `{ "data": T }` 形式でレスポンスを返す。
///
/// ## 使用例
///
/// ```
/// use statemail_shared::ApiResponse;
///
/// let response = ApiResponse::new("sent");
/// assert_eq!(response.data, "sent");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializeでdataキーに包まれる() {
        let response = ApiResponse::new(serde_json::json!({ "result": "sent" }));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json, serde_json::json!({ "data": { "result": "sent" } }));
    }

    #[test]
    fn test_deserializeでjsonからオブジェクトに変換する() {
        let response: ApiResponse<Vec<String>> =
            serde_json::from_str(r#"{"data": ["pending", "published"]}"#).unwrap();

        assert_eq!(response.data, vec!["pending", "published"]);
    }
}
