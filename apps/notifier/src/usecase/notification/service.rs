//! # 通知サービス
//!
//! 送信条件の判定 → テンプレートのフォーマット → メール送信を統合するサービス。
//!
//! ## 設計方針
//!
//! - **同期的に送信**: `notify()` は送信完了まで待ち、結果を [`DispatchOutcome`] で返す
//! - **送信失敗は伝播**: メール送信のエラーは握りつぶさず呼び出し元へ返す
//! - **条件を満たさないイベントは正常系**: [`SkipReason`] 付きでスキップする
//! - **依存性注入**: `NotificationSender` と `SettingsRepository` は trait で抽象化
//!
//! ## 送信条件（評価順）
//!
//! 1. 設定がインストールされている
//! 2. `enabled` が真
//! 3. 通知先が設定されている
//! 4. 通知対象の状態が 1 つ以上ある
//! 5. イベントが遷移を伴う
//! 6. 遷移先の状態が通知対象に含まれる

use std::sync::Arc;

use statemail_domain::{
    content::ContentObject,
    notification::{DispatchOutcome, EmailMessage, NotificationError, SkipReason},
    settings::{NotificationSettings, TemplateField},
    template::TemplateParams,
    transition::TransitionEvent,
};
use statemail_infra::{notification::NotificationSender, repository::SettingsRepository};
use statemail_shared::{event_log::event, log_business_event};

use super::TemplateFormatter;

/// サイト全体の送信コンテキスト
#[derive(Debug, Clone)]
pub struct SiteContext {
    /// ポータルの URL（`{portal_url}` で参照される）
    pub portal_url:   String,
    /// 送信元メールアドレス
    pub from_address: String,
}

/// 通知サービス
///
/// ワークフロー遷移に伴うメール通知の全体フローを統合する。
pub struct NotificationService {
    sender:        Arc<dyn NotificationSender>,
    settings_repo: Arc<dyn SettingsRepository>,
    formatter:     TemplateFormatter,
    site:          SiteContext,
}

impl NotificationService {
    pub fn new(
        sender: Arc<dyn NotificationSender>,
        settings_repo: Arc<dyn SettingsRepository>,
        formatter: TemplateFormatter,
        site: SiteContext,
    ) -> Self {
        Self {
            sender,
            settings_repo,
            formatter,
            site,
        }
    }

    /// 遷移イベントを通知する
    ///
    /// 設定を読み込み、[`dispatch`](Self::dispatch) に委譲する。
    /// 設定が未インストールの場合は警告ログを出してスキップする。
    #[tracing::instrument(skip_all, level = "debug", fields(object_id = %obj.id()))]
    pub async fn notify(
        &self,
        obj: &ContentObject,
        event: &TransitionEvent,
    ) -> Result<DispatchOutcome, NotificationError> {
        let settings = match self.settings_repo.load().await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                tracing::warn!("通知設定がインストールされていないため、通知をスキップします");
                return Ok(DispatchOutcome::Skipped(SkipReason::SettingsNotInstalled));
            }
            Err(e) => {
                tracing::error!(error = %e, "通知設定の読み込みに失敗");
                return Err(NotificationError::SettingsUnavailable(e.to_string()));
            }
        };

        self.dispatch(&settings, obj, event).await
    }

    /// 読み込み済みの設定で遷移イベントを通知する
    pub async fn dispatch(
        &self,
        settings: &NotificationSettings,
        obj: &ContentObject,
        event: &TransitionEvent,
    ) -> Result<DispatchOutcome, NotificationError> {
        let recipient = match check_conditions(settings, event) {
            Ok(recipient) => recipient,
            Err(reason) => {
                let reason_str: &str = reason.into();
                tracing::debug!(reason = reason_str, "送信条件を満たさないため、通知をスキップします");
                return Ok(DispatchOutcome::Skipped(reason));
            }
        };

        let params = TemplateParams::for_transition(obj, event, &self.site.portal_url);
        let subject =
            self.formatter
                .format_setting(settings, TemplateField::SubjectTemplate, &params);
        let message =
            self.formatter
                .format_setting(settings, TemplateField::MessageTemplate, &params);

        let email = EmailMessage::new(
            message,
            recipient,
            self.site.from_address.as_str(),
            subject.as_str(),
        );

        match self.sender.send_email(&email).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.entity_type = event::entity_type::CONTENT_OBJECT,
                    event.entity_id = obj.id(),
                    event.result = event::result::SUCCESS,
                    notification.recipient = recipient,
                    notification.new_state = event.new_state_id().unwrap_or_default(),
                    "通知メール送信成功"
                );
                Ok(DispatchOutcome::Sent {
                    recipient: recipient.to_string(),
                    subject,
                })
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.entity_type = event::entity_type::CONTENT_OBJECT,
                    event.entity_id = obj.id(),
                    event.result = event::result::FAILURE,
                    notification.recipient = recipient,
                    error = %e,
                    "通知メール送信失敗"
                );
                Err(e)
            }
        }
    }
}

/// 送信条件を判定し、満たす場合は通知先を返す
fn check_conditions<'s>(
    settings: &'s NotificationSettings,
    event: &TransitionEvent,
) -> Result<&'s str, SkipReason> {
    if !settings.enabled() {
        return Err(SkipReason::Disabled);
    }
    let recipient = settings.recipient().ok_or(SkipReason::RecipientMissing)?;
    if settings.allowed_states().is_empty() {
        return Err(SkipReason::NoAllowedStates);
    }
    let new_state = event.new_state_id().ok_or(SkipReason::NotATransition)?;
    if !settings.allows(new_state) {
        return Err(SkipReason::StateNotAllowed);
    }
    Ok(recipient)
}
