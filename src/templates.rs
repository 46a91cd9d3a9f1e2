use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    PostApproved,
    PostRejected,
    PostNeedInfo,
    PointsAwarded,
    DisputeResolved,
    Announcement,
    ActionAssigned,
    ActionStatusChanged,
}

impl NotificationType {
    pub const ALL: [NotificationType; 8] = [
        NotificationType::PostApproved,
        NotificationType::PostRejected,
        NotificationType::PostNeedInfo,
        NotificationType::PointsAwarded,
        NotificationType::DisputeResolved,
        NotificationType::Announcement,
        NotificationType::ActionAssigned,
        NotificationType::ActionStatusChanged,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::PostApproved => "POST_APPROVED",
            NotificationType::PostRejected => "POST_REJECTED",
            NotificationType::PostNeedInfo => "POST_NEED_INFO",
            NotificationType::PointsAwarded => "POINTS_AWARDED",
            NotificationType::DisputeResolved => "DISPUTE_RESOLVED",
            NotificationType::Announcement => "ANNOUNCEMENT",
            NotificationType::ActionAssigned => "ACTION_ASSIGNED",
            NotificationType::ActionStatusChanged => "ACTION_STATUS_CHANGED",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification type '{0}'")]
pub struct UnknownNotificationType(pub String);

impl FromStr for NotificationType {
    type Err = UnknownNotificationType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        NotificationType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value.trim())
            .ok_or_else(|| UnknownNotificationType(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BTreeMap<String, String>>,
}

/// Fills the fixed copy for `kind`. Missing or empty params fall back to
/// their defaults.
pub fn build_notification_message(
    kind: NotificationType,
    params: &BTreeMap<String, String>,
) -> NotificationPayload {
    let param = |name: &str, default: &str| -> String {
        params
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
            .unwrap_or_else(|| default.to_string())
    };
    let reference = |name: &str| Some(BTreeMap::from([(name.to_string(), param(name, ""))]));

    let (title, body, data) = match kind {
        NotificationType::PostApproved => (
            "게시물 승인됨".to_string(),
            format!(
                "작성하신 안전 제보가 승인되었습니다. {}포인트가 적립되었습니다.",
                param("points", "0")
            ),
            reference("postId"),
        ),
        NotificationType::PostRejected => (
            "게시물 반려됨".to_string(),
            format!(
                "작성하신 안전 제보가 반려되었습니다. 사유: {}",
                param("reason", "미기재")
            ),
            reference("postId"),
        ),
        NotificationType::PostNeedInfo => (
            "추가 정보 요청".to_string(),
            "작성하신 안전 제보에 추가 정보가 필요합니다. 확인해 주세요.".to_string(),
            reference("postId"),
        ),
        NotificationType::PointsAwarded => (
            "포인트 지급".to_string(),
            format!(
                "{}포인트가 지급되었습니다. 사유: {}",
                param("points", "0"),
                param("reason", "관리자 지급")
            ),
            None,
        ),
        NotificationType::DisputeResolved => (
            "이의신청 처리완료".to_string(),
            "등록하신 이의신청이 처리되었습니다.".to_string(),
            reference("disputeId"),
        ),
        NotificationType::Announcement => {
            (param("title", "공지사항"), param("body", ""), None)
        }
        NotificationType::ActionAssigned => (
            "시정조치 배정".to_string(),
            format!("새로운 시정조치가 배정되었습니다: {}", param("title", "")),
            reference("actionId"),
        ),
        NotificationType::ActionStatusChanged => (
            "시정조치 상태 변경".to_string(),
            format!(
                "시정조치 상태가 {}(으)로 변경되었습니다.",
                param("status", "")
            ),
            reference("actionId"),
        ),
    };

    NotificationPayload {
        kind,
        title,
        body,
        data,
    }
}

/// Plain-text fallback: `[app] title: body`.
pub fn sms_text(app_name: &str, payload: &NotificationPayload) -> String {
    format!("[{app_name}] {}: {}", payload.title, payload.body)
}
