//! # コンテンツオブジェクト
//!
//! ワークフロー遷移の対象となったコンテンツ（ワークスペース、ページ等）。
//! ホストプラットフォームから受け取った値をそのまま保持する。

use std::collections::BTreeMap;

use crate::template::{TemplateObject, TemplateValue};

/// コンテンツオブジェクト作成パラメータ
#[derive(Debug, Clone)]
pub struct NewContentObject {
    pub id:           String,
    pub portal_type:  String,
    /// 空文字列の場合は `title_or_id` で ID が使われる
    pub title:        String,
    pub path:         String,
    pub absolute_url: String,
}

/// 遷移対象のコンテンツオブジェクト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentObject {
    id:           String,
    portal_type:  String,
    title:        String,
    path:         String,
    absolute_url: String,
    creator:      Option<String>,
    description:  Option<String>,
    /// ホストが付与する追加メタデータ（`{obj.<name>}` で参照可能）
    extra:        BTreeMap<String, String>,
}

impl ContentObject {
    pub fn new(params: NewContentObject) -> Self {
        Self {
            id:           params.id,
            portal_type:  params.portal_type,
            title:        params.title,
            path:         params.path,
            absolute_url: params.absolute_url,
            creator:      None,
            description:  None,
            extra:        BTreeMap::new(),
        }
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 追加メタデータを設定する
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn portal_type(&self) -> &str {
        &self.portal_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn absolute_url(&self) -> &str {
        &self.absolute_url
    }

    pub fn creator(&self) -> Option<&str> {
        self.creator.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// タイトルを返す。タイトルが空白のみの場合は ID を返す
    pub fn title_or_id(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.id
        } else {
            &self.title
        }
    }

    /// テンプレートから参照される値に変換する
    ///
    /// 追加メタデータは組み込み属性を上書きしない。
    pub fn to_template_value(&self) -> TemplateValue {
        let object = TemplateObject::new(format!("<{} at {}>", self.portal_type, self.path))
            .with_text("id", &self.id)
            .with_text("portal_type", &self.portal_type)
            .with_text("title", &self.title)
            .with_text("title_or_id", self.title_or_id())
            .with_text("path", &self.path)
            .with_text("absolute_url", &self.absolute_url)
            .with_optional_text("creator", self.creator())
            .with_optional_text("description", self.description());

        self.extra
            .iter()
            .fold(object, |object, (name, value)| {
                object.with_text_if_absent(name, value)
            })
            .into()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_object(title: &str) -> ContentObject {
        ContentObject::new(NewContentObject {
            id:           "test".to_string(),
            portal_type:  "Workspace".to_string(),
            title:        title.to_string(),
            path:         "/plone/workspace/test".to_string(),
            absolute_url: "http://nohost/plone/workspace/test".to_string(),
        })
    }

    #[test]
    fn test_title_or_idはタイトルがあればタイトルを返す() {
        assert_eq!(make_object("テスト").title_or_id(), "テスト");
    }

    #[test]
    fn test_title_or_idはタイトルが空白のみならidを返す() {
        assert_eq!(make_object("").title_or_id(), "test");
        assert_eq!(make_object("   ").title_or_id(), "test");
    }

    #[test]
    fn test_テンプレート値の表示文字列() {
        let value = make_object("").to_template_value();
        assert_eq!(value.to_string(), "<Workspace at /plone/workspace/test>");
    }

    #[test]
    fn test_テンプレート値は組み込み属性を公開する() {
        let value = make_object("テスト")
            .with_creator("admin")
            .to_template_value();

        let attr = |name: &str| value.attribute(name).map(ToString::to_string);
        assert_eq!(attr("id"), Some("test".to_string()));
        assert_eq!(attr("portal_type"), Some("Workspace".to_string()));
        assert_eq!(attr("title_or_id"), Some("テスト".to_string()));
        assert_eq!(attr("creator"), Some("admin".to_string()));
        // 値のない属性は公開されない
        assert_eq!(attr("description"), None);
    }

    #[test]
    fn test_追加メタデータは組み込み属性を上書きしない() {
        let value = make_object("")
            .with_extra("id", "spoofed")
            .with_extra("model_number", "42")
            .to_template_value();

        assert_eq!(
            value.attribute("id").map(ToString::to_string),
            Some("test".to_string())
        );
        assert_eq!(
            value.attribute("model_number").map(ToString::to_string),
            Some("42".to_string())
        );
    }
}
