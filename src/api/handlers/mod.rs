use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::api::identity::CurrentUser;
use crate::controller::NoteApiController;
use crate::error::{ApiResult, NoteApiError};
use crate::models::*;

type NoteIdPath = WithRejection<Path<Uuid>, NoteApiError>;
type SharePath = WithRejection<Path<(Uuid, String)>, NoteApiError>;
type Body<T> = WithRejection<Json<T>, NoteApiError>;

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Users
// ============================================================

pub async fn me(
    State(controller): State<NoteApiController>,
    CurrentUser(uid): CurrentUser,
) -> ApiResult<Json<UserInfo>> {
    controller.me(&uid).map(Json)
}

// ============================================================
// Notes
// ============================================================

pub async fn list_notes(
    State(controller): State<NoteApiController>,
    CurrentUser(uid): CurrentUser,
    WithRejection(Query(query), _): WithRejection<Query<ListNotesQuery>, NoteApiError>,
) -> ApiResult<Json<Vec<ResponseNote>>> {
    controller
        .list(&uid, query.deleted, query.group.as_deref())
        .map(Json)
}

pub async fn get_note(
    State(controller): State<NoteApiController>,
    CurrentUser(uid): CurrentUser,
    WithRejection(Path(id), _): NoteIdPath,
) -> ApiResult<Json<ResponseNote>> {
    controller.get(&uid, id).map(Json)
}

pub async fn create_note(
    State(controller): State<NoteApiController>,
    CurrentUser(uid): CurrentUser,
    WithRejection(Json(input), _): Body<CreateNoteInput>,
) -> ApiResult<(StatusCode, Json<ResponseNote>)> {
    controller
        .create(&uid, input.title, input.grouping, input.content)
        .map(|note| (StatusCode::CREATED, Json(note)))
}

pub async fn update_note(
    State(controller): State<NoteApiController>,
    CurrentUser(uid): CurrentUser,
    WithRejection(Path(id), _): NoteIdPath,
    WithRejection(Json(input), _): Body<UpdateNoteInput>,
) -> ApiResult<Json<ResponseNote>> {
    controller
        .update(
            &uid,
            id,
            input.title,
            input.grouping,
            input.content,
            input.deleted,
        )
        .map(Json)
}

pub async fn delete_note(
    State(controller): State<NoteApiController>,
    CurrentUser(uid): CurrentUser,
    WithRejection(Path(id), _): NoteIdPath,
) -> ApiResult<Json<SuccessResponse>> {
    controller.delete(&uid, id).map(Json)
}

// ============================================================
// Shares
// ============================================================

pub async fn share_note(
    State(controller): State<NoteApiController>,
    CurrentUser(uid): CurrentUser,
    WithRejection(Path((id, recipient)), _): SharePath,
    WithRejection(Json(input), _): Body<ShareNoteInput>,
) -> ApiResult<Json<ShareRole>> {
    controller
        .share(&uid, id, &UserId::from(recipient), input.permissions)
        .map(Json)
}

pub async fn unshare_note(
    State(controller): State<NoteApiController>,
    CurrentUser(uid): CurrentUser,
    WithRejection(Path((id, recipient)), _): SharePath,
) -> ApiResult<Json<SuccessResponse>> {
    controller
        .unshare(&uid, id, &UserId::from(recipient))
        .map(Json)
}
