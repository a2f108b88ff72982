//! # ワークフロー遷移ハンドラ
//!
//! ホストプラットフォームから遷移イベントを受け取り、通知サービスに渡す。
//!
//! ## エンドポイント
//!
//! ```text
//! POST /internal/workflow/transitions
//! ```
//!
//! ## レスポンス例
//!
//! ```json
//! { "data": { "result": "sent", "recipient": "tester@example.com", "subject": "..." } }
//! { "data": { "result": "skipped", "reason": "state_not_allowed" } }
//! ```
//!
//! 送信条件を満たさない場合も 200 を返す。メール送信の失敗は 502。

use std::{collections::BTreeMap, sync::Arc};

use axum::{Json, extract::State, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statemail_domain::{
    clock::Clock,
    content::{ContentObject, NewContentObject},
    notification::{DispatchOutcome, SkipReason},
    transition::{Transition, TransitionEvent},
};
use statemail_shared::ApiResponse;

use crate::{error::NotifierError, usecase::NotificationService};

/// 遷移ハンドラーの State
pub struct NotificationState {
    pub service: NotificationService,
    /// `occurred_at` が省略された場合の補完に使う
    pub clock:   Arc<dyn Clock>,
}

/// 遷移通知リクエスト
#[derive(Debug, Deserialize)]
pub struct TransitionNotificationRequest {
    pub object: ContentObjectRequest,
    pub event:  TransitionEventRequest,
}

/// コンテンツオブジェクト
#[derive(Debug, Deserialize)]
pub struct ContentObjectRequest {
    pub id:           String,
    pub portal_type:  String,
    #[serde(default)]
    pub title:        String,
    pub path:         String,
    pub absolute_url: String,
    #[serde(default)]
    pub creator:      Option<String>,
    #[serde(default)]
    pub description:  Option<String>,
    /// 追加メタデータ（`{obj.<name>}` で参照可能）
    #[serde(default)]
    pub attributes:   BTreeMap<String, String>,
}

/// 実行された遷移
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub id:           String,
    #[serde(default)]
    pub title:        String,
    pub new_state_id: String,
}

/// 遷移イベント
///
/// `transition` が省略された場合は遷移を伴わないイベント（作成など）として扱う。
#[derive(Debug, Deserialize)]
pub struct TransitionEventRequest {
    #[serde(default)]
    pub transition:   Option<TransitionRequest>,
    #[serde(default)]
    pub old_state_id: Option<String>,
    #[serde(default)]
    pub actor:        Option<String>,
    #[serde(default)]
    pub comments:     Option<String>,
    #[serde(default)]
    pub occurred_at:  Option<DateTime<Utc>>,
}

/// 送信結果 DTO
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DispatchResultDto {
    Sent { recipient: String, subject: String },
    Skipped { reason: SkipReason },
}

impl From<DispatchOutcome> for DispatchResultDto {
    fn from(outcome: DispatchOutcome) -> Self {
        match outcome {
            DispatchOutcome::Sent { recipient, subject } => Self::Sent { recipient, subject },
            DispatchOutcome::Skipped(reason) => Self::Skipped { reason },
        }
    }
}

impl ContentObjectRequest {
    fn into_domain(self) -> Result<ContentObject, NotifierError> {
        if self.id.trim().is_empty() {
            return Err(NotifierError::BadRequest("object.id は必須です".to_string()));
        }

        let mut obj = ContentObject::new(NewContentObject {
            id:           self.id,
            portal_type:  self.portal_type,
            title:        self.title,
            path:         self.path,
            absolute_url: self.absolute_url,
        });
        if let Some(creator) = self.creator {
            obj = obj.with_creator(creator);
        }
        if let Some(description) = self.description {
            obj = obj.with_description(description);
        }
        for (name, value) in self.attributes {
            obj = obj.with_extra(name, value);
        }
        Ok(obj)
    }
}

impl TransitionEventRequest {
    /// 遷移先の状態 ID は検証しない
    ///
    /// 空の状態 ID は通知対象の状態に含まれないため、送信条件の判定でスキップされる。
    fn into_domain(self, clock: &dyn Clock) -> TransitionEvent {
        let transition = self
            .transition
            .map(|t| Transition::new(t.id, t.title, t.new_state_id));
        let occurred_at = self.occurred_at.unwrap_or_else(|| clock.now());

        let mut event = TransitionEvent::new(transition, occurred_at);
        if let Some(old_state_id) = self.old_state_id {
            event = event.with_old_state_id(old_state_id);
        }
        if let Some(actor) = self.actor {
            event = event.with_actor(actor);
        }
        if let Some(comments) = self.comments {
            event = event.with_comments(comments);
        }
        event
    }
}

/// POST /internal/workflow/transitions
///
/// 遷移イベントを通知する。
pub async fn receive_transition(
    State(state): State<Arc<NotificationState>>,
    Json(req): Json<TransitionNotificationRequest>,
) -> Result<impl IntoResponse, NotifierError> {
    let obj = req.object.into_domain()?;
    let event = req.event.into_domain(state.clock.as_ref());

    let outcome = state.service.notify(&obj, &event).await?;

    Ok(Json(ApiResponse::new(DispatchResultDto::from(outcome))))
}
