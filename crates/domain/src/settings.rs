//! # 通知設定
//!
//! ワークフロー遷移通知のサイト全体設定。
//!
//! ## ライフサイクル
//!
//! 1. インストール時に [`NotificationSettings::default`] の値で作成される
//! 2. 編集操作（[`SettingsUpdate`]）で部分的に更新される
//! 3. 送信処理では読み取り専用で参照される
//!
//! ## 送信条件
//!
//! `enabled` かつ `recipient` が空でなく、`allowed_states` が空でなく、
//! 遷移先の状態が `allowed_states` に含まれる場合にだけメールを送信する。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    DomainError,
    value_objects::{Email, StateId},
};

/// 設定の識別子（ログ出力とエラーメッセージで使う）
pub const SETTINGS_ID: &str = "statemail.workflow.settings";

/// 件名テンプレートの既定値
pub const DEFAULT_SUBJECT_TEMPLATE: &str =
    "{obj.portal_type} `{title_or_id}` is now {event.transition.new_state_id}";

/// 本文テンプレートの既定値
pub const DEFAULT_MESSAGE_TEMPLATE: &str = "Visit {obj_url} for more details.";

/// テンプレート項目
///
/// フォーマット失敗時のログで、どちらのテンプレートが失敗したかを示す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TemplateField {
    SubjectTemplate,
    MessageTemplate,
}

/// ワークフロー遷移通知の設定
///
/// デシリアライズは [`SettingsUpdate`] を既定値に適用して行うため、
/// 保存済みの設定も編集操作と同じ検証を通る。欠けた項目は既定値になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SettingsUpdate")]
pub struct NotificationSettings {
    /// 通知メールを送信するか
    enabled:          bool,
    /// 通知先メールアドレス（未設定は空文字列）
    recipient:        String,
    /// 通知対象の遷移先状態
    allowed_states:   BTreeSet<String>,
    subject_template: String,
    message_template: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled:          false,
            recipient:        String::new(),
            allowed_states:   BTreeSet::new(),
            subject_template: DEFAULT_SUBJECT_TEMPLATE.to_string(),
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
        }
    }
}

impl NotificationSettings {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// 通知先メールアドレスを返す。未設定の場合は `None`
    pub fn recipient(&self) -> Option<&str> {
        if self.recipient.is_empty() {
            None
        } else {
            Some(&self.recipient)
        }
    }

    pub fn allowed_states(&self) -> &BTreeSet<String> {
        &self.allowed_states
    }

    /// 遷移先の状態が通知対象かを判定する
    pub fn allows(&self, state_id: &str) -> bool {
        self.allowed_states.contains(state_id)
    }

    pub fn template(&self, field: TemplateField) -> &str {
        match field {
            TemplateField::SubjectTemplate => &self.subject_template,
            TemplateField::MessageTemplate => &self.message_template,
        }
    }

    pub fn subject_template(&self) -> &str {
        &self.subject_template
    }

    pub fn message_template(&self) -> &str {
        &self.message_template
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_recipient(mut self, recipient: Email) -> Self {
        self.recipient = recipient.into_string();
        self
    }

    pub fn with_allowed_states(mut self, states: impl IntoIterator<Item = StateId>) -> Self {
        self.allowed_states = states.into_iter().map(StateId::into_string).collect();
        self
    }

    pub fn with_subject_template(mut self, template: impl Into<String>) -> Self {
        self.subject_template = template.into();
        self
    }

    pub fn with_message_template(mut self, template: impl Into<String>) -> Self {
        self.message_template = template.into();
        self
    }

    /// 編集内容を適用した新しい設定を返す
    ///
    /// 指定された項目だけを置き換える。検証に失敗した場合は元の設定を変更しない。
    ///
    /// - `recipient`: 前後の空白を除去し、空文字列（未設定）か有効なメールアドレス
    /// - `allowed_states`: 空白のみの要素を除外し、重複をまとめる
    /// - テンプレート: そのまま保存する（フォーマットは送信時に評価）
    pub fn apply(&self, update: SettingsUpdate) -> Result<Self, DomainError> {
        let mut next = self.clone();

        if let Some(enabled) = update.enabled {
            next.enabled = enabled;
        }

        if let Some(recipient) = update.recipient {
            let recipient = recipient.trim();
            next.recipient = if recipient.is_empty() {
                String::new()
            } else {
                Email::new(recipient)?.into_string()
            };
        }

        if let Some(states) = update.allowed_states {
            next.allowed_states = states
                .into_iter()
                .filter(|state| !state.trim().is_empty())
                .map(|state| StateId::new(state).map(StateId::into_string))
                .collect::<Result<_, _>>()?;
        }

        if let Some(template) = update.subject_template {
            next.subject_template = template;
        }

        if let Some(template) = update.message_template {
            next.message_template = template;
        }

        Ok(next)
    }
}

impl TryFrom<SettingsUpdate> for NotificationSettings {
    type Error = DomainError;

    fn try_from(update: SettingsUpdate) -> Result<Self, Self::Error> {
        Self::default().apply(update)
    }
}

/// 設定の編集内容（部分更新）
///
/// `None` の項目は変更しない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SettingsUpdate {
    pub enabled:          Option<bool>,
    pub recipient:        Option<String>,
    pub allowed_states:   Option<Vec<String>>,
    pub subject_template: Option<String>,
    pub message_template: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_既定値は無効で宛先と対象状態が空() {
        let settings = NotificationSettings::default();

        assert!(!settings.enabled());
        assert_eq!(settings.recipient(), None);
        assert!(settings.allowed_states().is_empty());
        assert_eq!(settings.subject_template(), DEFAULT_SUBJECT_TEMPLATE);
        assert_eq!(settings.message_template(), DEFAULT_MESSAGE_TEMPLATE);
    }

    #[test]
    fn test_applyは指定した項目だけを更新する() {
        let settings = NotificationSettings::default();

        let updated = settings
            .apply(SettingsUpdate {
                enabled: Some(true),
                recipient: Some(" tester@example.com ".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert!(updated.enabled());
        assert_eq!(updated.recipient(), Some("tester@example.com"));
        assert_eq!(updated.subject_template(), DEFAULT_SUBJECT_TEMPLATE);
        assert!(updated.allowed_states().is_empty());
    }

    #[test]
    fn test_applyで空の宛先は未設定になる() {
        let settings = NotificationSettings::default()
            .with_recipient(Email::new("tester@example.com").unwrap());

        let updated = settings
            .apply(SettingsUpdate {
                recipient: Some("  ".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(updated.recipient(), None);
    }

    #[test]
    fn test_applyは不正な宛先を拒否する() {
        let result = NotificationSettings::default().apply(SettingsUpdate {
            recipient: Some("not-an-address".to_string()),
            ..Default::default()
        });

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_applyは対象状態の空要素を除外し重複をまとめる() {
        let updated = NotificationSettings::default()
            .apply(SettingsUpdate {
                allowed_states: Some(vec![
                    "published".to_string(),
                    " ".to_string(),
                    " pending ".to_string(),
                    "published".to_string(),
                ]),
                ..Default::default()
            })
            .unwrap();

        let states: Vec<&str> = updated.allowed_states().iter().map(String::as_str).collect();
        assert_eq!(states, vec!["pending", "published"]);
        assert!(updated.allows("pending"));
        assert!(!updated.allows("private"));
    }

    #[test]
    fn test_applyは空白を含む状態idを拒否する() {
        let result = NotificationSettings::default().apply(SettingsUpdate {
            allowed_states: Some(vec!["pending review".to_string()]),
            ..Default::default()
        });

        assert!(result.is_err());
    }

    #[test]
    fn test_applyはテンプレートをそのまま保存する() {
        let updated = NotificationSettings::default()
            .apply(SettingsUpdate {
                subject_template: Some("Item: not_exist}".to_string()),
                message_template: Some("{obj.id} is now {event.transition.new_state_id}".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(updated.subject_template(), "Item: not_exist}");
        assert_eq!(
            updated.template(TemplateField::MessageTemplate),
            "{obj.id} is now {event.transition.new_state_id}"
        );
    }

    #[test]
    fn test_template_fieldの文字列表現() {
        assert_eq!(TemplateField::SubjectTemplate.to_string(), "subject_template");
        let name: &str = TemplateField::MessageTemplate.into();
        assert_eq!(name, "message_template");
    }

    #[test]
    fn test_欠けた項目は既定値でデシリアライズされる() {
        let settings: NotificationSettings =
            serde_json::from_str(r#"{"enabled": true, "recipient": "tester@example.com"}"#)
                .unwrap();

        assert!(settings.enabled());
        assert_eq!(settings.recipient(), Some("tester@example.com"));
        assert_eq!(settings.message_template(), DEFAULT_MESSAGE_TEMPLATE);
    }

    #[test]
    fn test_不正な通知先を含む設定はデシリアライズできない() {
        let result: Result<NotificationSettings, _> =
            serde_json::from_str(r#"{"enabled": true, "recipient": "junk"}"#);

        assert!(result.is_err());
    }

    #[test]
    fn test_保存形式は同じ設定に戻る() {
        let settings = NotificationSettings::default()
            .with_enabled(true)
            .with_recipient(Email::new("tester@example.com").unwrap())
            .with_allowed_states([StateId::new("pending").unwrap()]);

        let json = serde_json::to_string(&settings).unwrap();
        let restored: NotificationSettings = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, settings);
    }
}
