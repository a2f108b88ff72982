//! # テンプレートパラメータ
//!
//! 件名・本文テンプレートのプレースホルダー（`{name}` / `{name.attr}`）から
//! 参照される値を定義する。
//!
//! ## 設計方針
//!
//! - **ホワイトリスト公開**: オブジェクトは [`TemplateObject`] の属性表に登録した値だけを公開する
//! - **二段階解決**: ルート名を [`TemplateParams`] から引き、属性を順に辿る
//! - **欠損キーは空文字列**: 未定義のルート名は空のテキストとして扱う
//!
//! ## パラメータキー
//!
//! | キー | 値 |
//! |-----|----|
//! | `obj` | 遷移したコンテンツオブジェクト |
//! | `event` | 遷移イベント |
//! | `obj_url` | オブジェクトの絶対 URL |
//! | `title_or_id` | タイトル（空ならば ID） |
//! | `portal_url` | ポータルの URL |

use std::{collections::BTreeMap, fmt};

use crate::{content::ContentObject, transition::TransitionEvent};

static EMPTY_TEXT: TemplateValue = TemplateValue::Text(String::new());

/// プレースホルダーから参照される値
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
    /// 文字列。属性を持たない
    Text(String),
    /// 属性表を持つオブジェクト
    Object(TemplateObject),
}

impl TemplateValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// 属性を取得する
    ///
    /// テキストは属性を持たないため常に `None` を返す。
    pub fn attribute(&self, name: &str) -> Option<&TemplateValue> {
        match self {
            Self::Text(_) => None,
            Self::Object(object) => object.attribute(name),
        }
    }
}

impl fmt::Display for TemplateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Object(object) => f.write_str(&object.display),
        }
    }
}

/// テンプレートから参照できるオブジェクト
///
/// `display` はオブジェクトそのものを埋め込んだとき（`{obj}`）の表示文字列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateObject {
    display:    String,
    attributes: BTreeMap<String, TemplateValue>,
}

impl TemplateObject {
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display:    display.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// 属性を追加する（同名の属性は上書き）
    pub fn with_attribute(mut self, name: impl Into<String>, value: TemplateValue) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// テキスト属性を追加する
    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_attribute(name, TemplateValue::text(value))
    }

    /// 値がある場合だけテキスト属性を追加する
    ///
    /// 値がない属性は公開されず、参照するとフォーマット失敗になる。
    pub fn with_optional_text(self, name: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.with_text(name, value),
            None => self,
        }
    }

    /// 未登録の場合だけテキスト属性を追加する
    pub fn with_text_if_absent(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .entry(name.to_string())
            .or_insert_with(|| TemplateValue::text(value));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&TemplateValue> {
        self.attributes.get(name)
    }
}

impl From<TemplateObject> for TemplateValue {
    fn from(object: TemplateObject) -> Self {
        Self::Object(object)
    }
}

/// テンプレートパラメータ（ルート名 → 値）
///
/// 送信のたびに構築され、フォーマッタだけが参照する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateParams {
    values: BTreeMap<String, TemplateValue>,
}

impl TemplateParams {
    pub const OBJ: &'static str = "obj";
    pub const EVENT: &'static str = "event";
    pub const OBJ_URL: &'static str = "obj_url";
    pub const TITLE_OR_ID: &'static str = "title_or_id";
    pub const PORTAL_URL: &'static str = "portal_url";

    pub fn new() -> Self {
        Self::default()
    }

    /// 遷移通知用のパラメータを構築する
    pub fn for_transition(obj: &ContentObject, event: &TransitionEvent, portal_url: &str) -> Self {
        let mut params = Self::new();
        params.insert(Self::OBJ, obj.to_template_value());
        params.insert(Self::EVENT, event.to_template_value());
        params.insert(Self::OBJ_URL, TemplateValue::text(obj.absolute_url()));
        params.insert(Self::TITLE_OR_ID, TemplateValue::text(obj.title_or_id()));
        params.insert(Self::PORTAL_URL, TemplateValue::text(portal_url));
        params
    }

    pub fn insert(&mut self, key: impl Into<String>, value: TemplateValue) {
        self.values.insert(key.into(), value);
    }

    /// ルート名を解決する
    ///
    /// 未定義のキーは空のテキストとして返す。
    pub fn resolve(&self, key: &str) -> &TemplateValue {
        self.values.get(key).unwrap_or(&EMPTY_TEXT)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        content::NewContentObject,
        transition::{Transition, TransitionEvent},
    };

    fn make_object() -> ContentObject {
        ContentObject::new(NewContentObject {
            id:           "cake".to_string(),
            portal_type:  "Workspace".to_string(),
            title:        String::new(),
            path:         "/plone/workspace/cake".to_string(),
            absolute_url: "http://nohost/plone/workspace/cake".to_string(),
        })
    }

    #[test]
    fn test_未定義のキーは空のテキストに解決される() {
        let params = TemplateParams::new();
        assert_eq!(params.resolve("not_exist"), &TemplateValue::text(""));
    }

    #[test]
    fn test_テキストは属性を持たない() {
        assert!(TemplateValue::text("cake").attribute("id").is_none());
    }

    #[test]
    fn test_オブジェクトの表示文字列と属性() {
        let value: TemplateValue = TemplateObject::new("<Item>")
            .with_text("id", "cake")
            .with_optional_text("creator", None)
            .into();

        assert_eq!(value.to_string(), "<Item>");
        assert_eq!(value.attribute("id"), Some(&TemplateValue::text("cake")));
        assert!(value.attribute("creator").is_none());
    }

    #[test]
    fn test_with_text_if_absentは既存の属性を上書きしない() {
        let object = TemplateObject::new("<Item>")
            .with_text("id", "cake")
            .with_text_if_absent("id", "other")
            .with_text_if_absent("extra", "value");

        assert_eq!(object.attribute("id"), Some(&TemplateValue::text("cake")));
        assert_eq!(object.attribute("extra"), Some(&TemplateValue::text("value")));
    }

    #[test]
    fn test_for_transitionで5つのキーが設定される() {
        let obj = make_object();
        let event = TransitionEvent::new(
            Some(Transition::new("publish", "Publish", "published")),
            Utc.with_ymd_and_hms(2026, 4, 1, 9, 30, 0).unwrap(),
        );

        let params = TemplateParams::for_transition(&obj, &event, "http://nohost/plone");

        assert_eq!(
            params.resolve(TemplateParams::OBJ_URL),
            &TemplateValue::text("http://nohost/plone/workspace/cake")
        );
        // タイトルが空なので ID が使われる
        assert_eq!(
            params.resolve(TemplateParams::TITLE_OR_ID),
            &TemplateValue::text("cake")
        );
        assert_eq!(
            params.resolve(TemplateParams::PORTAL_URL),
            &TemplateValue::text("http://nohost/plone")
        );
        assert_eq!(
            params
                .resolve(TemplateParams::OBJ)
                .attribute("id")
                .map(ToString::to_string),
            Some("cake".to_string())
        );
        assert_eq!(
            params
                .resolve(TemplateParams::EVENT)
                .attribute("transition")
                .and_then(|t| t.attribute("new_state_id"))
                .map(ToString::to_string),
            Some("published".to_string())
        );
    }
}
