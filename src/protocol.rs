//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{FlowState, Lesson};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartFlow {
        #[serde(rename = "lessonId")]
        lesson_id: String,
        #[serde(default)]
        token: Option<String>,
    },
    GetFlow {
        #[serde(rename = "flowId")]
        flow_id: String,
    },
    Advance {
        #[serde(rename = "flowId")]
        flow_id: String,
        #[serde(default, rename = "answeredCorrectly")]
        answered_correctly: Option<bool>,
    },
    StartFinalQuiz {
        #[serde(rename = "flowId")]
        flow_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Flow { flow: FlowOut },
    Error { message: String },
}

/// A flow snapshot. `applied` is false when the call was ignored as misuse.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowOut {
    pub flow_id: String,
    pub lesson_id: String,
    pub applied: bool,
    pub state: FlowState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummaryOut {
    pub id: String,
    pub title: String,
    pub step_count: usize,
}

pub fn to_summary(l: &Lesson) -> LessonSummaryOut {
    LessonSummaryOut {
        id: l.id.clone(),
        title: l.title.clone(),
        step_count: l.steps.len(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlowIn {
    pub lesson_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceIn {
    #[serde(default)]
    pub answered_correctly: Option<bool>,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}
