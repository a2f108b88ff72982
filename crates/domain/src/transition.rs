//! # ワークフロー遷移イベント
//!
//! ワークフローエンジンが状態遷移ごとに発行するイベント。
//!
//! ## 設計方針
//!
//! - **遷移は省略可能**: 作成直後の初期化イベントなど、遷移を伴わないライフサイクル
//!   イベントも同じ型で受け取る。`transition` が `None` のイベントは通知対象外
//! - **一時的な値**: 送信処理の間だけ使われ、永続化しない

use chrono::{DateTime, SecondsFormat, Utc};

use crate::template::{TemplateObject, TemplateValue};

/// 実行された遷移の定義
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    id:           String,
    title:        String,
    new_state_id: String,
}

impl Transition {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        new_state_id: impl Into<String>,
    ) -> Self {
        Self {
            id:           id.into(),
            title:        title.into(),
            new_state_id: new_state_id.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 遷移先の状態 ID
    pub fn new_state_id(&self) -> &str {
        &self.new_state_id
    }

    fn to_template_value(&self) -> TemplateValue {
        TemplateObject::new(&self.id)
            .with_text("id", &self.id)
            .with_text("title", &self.title)
            .with_text("new_state_id", &self.new_state_id)
            .into()
    }
}

/// ワークフロー遷移イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    transition:   Option<Transition>,
    old_state_id: Option<String>,
    actor:        Option<String>,
    comments:     Option<String>,
    occurred_at:  DateTime<Utc>,
}

impl TransitionEvent {
    /// イベントを作成する
    ///
    /// 発生時刻は呼び出し側が [`Clock`](crate::clock::Clock) などから渡す。
    pub fn new(transition: Option<Transition>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            transition,
            old_state_id: None,
            actor: None,
            comments: None,
            occurred_at,
        }
    }

    pub fn with_old_state_id(mut self, old_state_id: impl Into<String>) -> Self {
        self.old_state_id = Some(old_state_id.into());
        self
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = Some(comments.into());
        self
    }

    /// 遷移先の状態 ID を返す
    ///
    /// 遷移を伴わないイベントでは `None`。
    pub fn new_state_id(&self) -> Option<&str> {
        self.transition.as_ref().map(Transition::new_state_id)
    }

    pub fn old_state_id(&self) -> Option<&str> {
        self.old_state_id.as_deref()
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref()
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// テンプレートから参照される値に変換する
    ///
    /// 値のない属性（遷移なしイベントの `transition` など）は公開しない。
    pub fn to_template_value(&self) -> TemplateValue {
        let display = match &self.transition {
            Some(transition) => format!("<TransitionEvent {}>", transition.id()),
            None => "<TransitionEvent>".to_string(),
        };

        let mut object = TemplateObject::new(display)
            .with_optional_text("old_state_id", self.old_state_id())
            .with_optional_text("actor", self.actor())
            .with_optional_text("comments", self.comments())
            .with_text(
                "occurred_at",
                self.occurred_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            );

        if let Some(transition) = &self.transition {
            object = object.with_attribute("transition", transition.to_template_value());
        }

        object.into()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    fn occurred_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_new_state_idは遷移先の状態を返す() {
        let event = TransitionEvent::new(
            Some(Transition::new("submit", "Submit", "pending")),
            occurred_at(),
        );
        assert_eq!(event.new_state_id(), Some("pending"));
    }

    #[test]
    fn test_遷移なしイベントのnew_state_idはnone() {
        let event = TransitionEvent::new(None, occurred_at());
        assert_eq!(event.new_state_id(), None);
    }

    #[test]
    fn test_発生時刻は渡した値をそのまま保持する() {
        let event = TransitionEvent::new(None, occurred_at());
        assert_eq!(event.occurred_at(), occurred_at());
    }

    #[test]
    fn test_テンプレート値で遷移の属性を辿れる() {
        let event = TransitionEvent::new(
            Some(Transition::new("publish", "公開", "published")),
            occurred_at(),
        )
        .with_old_state_id("private")
        .with_actor("admin");

        let value = event.to_template_value();

        assert_eq!(value.to_string(), "<TransitionEvent publish>");
        let transition = value.attribute("transition").unwrap();
        assert_eq!(transition.to_string(), "publish");
        assert_eq!(
            transition.attribute("title").map(ToString::to_string),
            Some("公開".to_string())
        );
        assert_eq!(
            value.attribute("old_state_id").map(ToString::to_string),
            Some("private".to_string())
        );
        assert_eq!(
            value.attribute("occurred_at").map(ToString::to_string),
            Some("2026-04-01T09:30:00Z".to_string())
        );
    }

    #[test]
    fn test_遷移なしイベントはtransition属性を公開しない() {
        let value = TransitionEvent::new(None, occurred_at()).to_template_value();

        assert_eq!(value.to_string(), "<TransitionEvent>");
        assert!(value.attribute("transition").is_none());
        assert!(value.attribute("comments").is_none());
    }
}
