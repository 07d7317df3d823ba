use std::collections::HashMap;

use axum::Json;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path};
use axum::routing::{delete, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};

use crate::cards::{CommentView, DailyEntryCard, DiscussionCard, ResourceCard, TaskCard};
use crate::error::AppError;
use crate::forms::{AnswerForm, DailyEntryForm, DiscussionForm, ResourceForm, TaskForm};
use crate::models::*;
use crate::services::{
    BlobUploader, CommentInput, CommentThread, DiscussionBoard, FileUpload, ListController,
};
use crate::state::AppState;

/// Rendered collection plus the last failure the view should show, if any.
#[derive(Debug, Serialize)]
pub struct View<C> {
    pub items: Vec<C>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<C> View<C> {
    fn render<'a, T>(items: &'a [T], error: Option<&str>) -> Self
    where
        T: 'a,
        C: From<&'a T>,
    {
        Self {
            items: items.iter().map(C::from).collect(),
            error: error.map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommentRequest {
    #[serde(rename = "type", default)]
    kind: CommentKind,
    content: String,
}

#[derive(Debug, Serialize)]
struct ImageAttachment {
    content: String,
}

pub fn router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.upload_limit);

    Router::new()
        .route("/health", get(health))
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/{id}", delete(delete_entry))
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/images", post(upload_task_image).layer(upload_limit))
        .route("/tasks/{id}", delete(delete_task))
        .route("/tasks/{id}/comments", get(list_comments).post(create_comment))
        .route(
            "/tasks/{id}/comments/upload",
            post(upload_comment).layer(upload_limit),
        )
        .route("/resources", get(list_resources).post(create_resource))
        .route("/resources/{id}", delete(delete_resource))
        .route("/discussions", get(list_discussions).post(create_discussion))
        .route("/discussions/{id}", delete(delete_discussion))
        .route("/discussions/{id}/answers", post(create_answer))
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list_entries(State(state): State<AppState>) -> Result<Json<View<DailyEntryCard>>, AppError> {
    let mut entries = ListController::<DailyEntry>::new(state.store.clone());
    entries.load().await?;
    Ok(Json(View::render(entries.items(), entries.error())))
}

async fn create_entry(
    State(state): State<AppState>,
    Json(mut form): Json<DailyEntryForm>,
) -> Result<(StatusCode, Json<View<DailyEntryCard>>), AppError> {
    let mut entries = ListController::<DailyEntry>::new(state.store.clone());
    entries.open_form();
    entries.submit(&mut form).await?;
    Ok((StatusCode::CREATED, Json(View::render(entries.items(), entries.error()))))
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<View<DailyEntryCard>>, AppError> {
    let mut entries = ListController::<DailyEntry>::new(state.store.clone());
    entries.delete(&id).await?;
    Ok(Json(View::render(entries.items(), entries.error())))
}

async fn list_tasks(State(state): State<AppState>) -> Result<Json<View<TaskCard>>, AppError> {
    let mut tasks = ListController::<Task>::new(state.store.clone());
    tasks.load().await?;
    Ok(Json(View::render(tasks.items(), tasks.error())))
}

async fn create_task(
    State(state): State<AppState>,
    Json(mut form): Json<TaskForm>,
) -> Result<(StatusCode, Json<View<TaskCard>>), AppError> {
    let mut tasks = ListController::<Task>::new(state.store.clone());
    tasks.open_form();
    tasks.submit(&mut form).await?;
    Ok((StatusCode::CREATED, Json(View::render(tasks.items(), tasks.error()))))
}

async fn upload_task_image(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ImageAttachment>, AppError> {
    let (_, file) = read_multipart(multipart).await?;
    let file = file.ok_or_else(|| AppError::Validation("a file is required".to_string()))?;

    let mut form = TaskForm::default();
    form.set_kind(TaskKind::Image);
    form.attach_image(&BlobUploader::task_images(state.store.clone()), file).await?;

    Ok(Json(ImageAttachment { content: form.content }))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<View<TaskCard>>, AppError> {
    let mut tasks = ListController::<Task>::new(state.store.clone());
    tasks.delete(&id).await?;
    Ok(Json(View::render(tasks.items(), tasks.error())))
}

async fn list_comments(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<View<CommentView>>, AppError> {
    let mut comments = CommentThread::new(state.store.clone(), &task_id);
    comments.load().await?;
    Ok(Json(View::render(comments.comments(), comments.error())))
}

async fn create_comment(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(req): Json<CommentRequest>,
) -> Result<(StatusCode, Json<View<CommentView>>), AppError> {
    let input = match req.kind {
        CommentKind::Text => CommentInput::Text(req.content),
        CommentKind::Link => CommentInput::Link(req.content),
        CommentKind::File | CommentKind::Folder => {
            return Err(AppError::Validation(
                "file and folder comments are posted to the upload route".to_string(),
            ));
        }
        CommentKind::Unknown => {
            return Err(AppError::Validation("unsupported comment type".to_string()));
        }
    };

    let mut comments = CommentThread::new(state.store.clone(), &task_id);
    comments.submit(input).await?;
    Ok((StatusCode::CREATED, Json(View::render(comments.comments(), comments.error()))))
}

async fn upload_comment(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<View<CommentView>>), AppError> {
    let (fields, file) = read_multipart(multipart).await?;
    let file = file.ok_or_else(|| AppError::Validation("a file is required".to_string()))?;

    let input = match fields.get("type").map(String::as_str) {
        None | Some("file") => CommentInput::File(file),
        Some("folder") => CommentInput::Folder(file),
        Some(other) => {
            return Err(AppError::Validation(format!("cannot upload a {} comment", other)));
        }
    };

    let mut comments = CommentThread::new(state.store.clone(), &task_id);
    comments.submit(input).await?;
    Ok((StatusCode::CREATED, Json(View::render(comments.comments(), comments.error()))))
}

async fn list_resources(State(state): State<AppState>) -> Result<Json<View<ResourceCard>>, AppError> {
    let mut resources = ListController::<Resource>::new(state.store.clone());
    resources.load().await?;
    Ok(Json(View::render(resources.items(), resources.error())))
}

async fn create_resource(
    State(state): State<AppState>,
    Json(mut form): Json<ResourceForm>,
) -> Result<(StatusCode, Json<View<ResourceCard>>), AppError> {
    let mut resources = ListController::<Resource>::new(state.store.clone());
    resources.open_form();
    resources.submit(&mut form).await?;
    Ok((StatusCode::CREATED, Json(View::render(resources.items(), resources.error()))))
}

async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<View<ResourceCard>>, AppError> {
    let mut resources = ListController::<Resource>::new(state.store.clone());
    resources.delete(&id).await?;
    Ok(Json(View::render(resources.items(), resources.error())))
}

async fn list_discussions(State(state): State<AppState>) -> Result<Json<View<DiscussionCard>>, AppError> {
    let mut board = DiscussionBoard::with_fanout(state.store.clone(), state.fanout);
    board.load().await?;
    Ok(Json(View::render(board.threads(), board.error())))
}

async fn create_discussion(
    State(state): State<AppState>,
    Json(mut form): Json<DiscussionForm>,
) -> Result<(StatusCode, Json<View<DiscussionCard>>), AppError> {
    let mut board = DiscussionBoard::with_fanout(state.store.clone(), state.fanout);
    board.open_form();
    board.submit(&mut form).await?;
    Ok((StatusCode::CREATED, Json(View::render(board.threads(), board.error()))))
}

async fn delete_discussion(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<View<DiscussionCard>>, AppError> {
    let mut board = DiscussionBoard::with_fanout(state.store.clone(), state.fanout);
    board.delete(&id).await?;
    Ok(Json(View::render(board.threads(), board.error())))
}

async fn create_answer(
    State(state): State<AppState>,
    Path(discussion_id): Path<String>,
    Json(mut form): Json<AnswerForm>,
) -> Result<(StatusCode, Json<View<DiscussionCard>>), AppError> {
    let mut board = DiscussionBoard::with_fanout(state.store.clone(), state.fanout);
    board.submit_answer(&discussion_id, &mut form).await?;
    Ok((StatusCode::CREATED, Json(View::render(board.threads(), board.error()))))
}

/// A body over the upload limit is an upload failure; anything else is a
/// malformed request.
fn multipart_error(err: MultipartError, part: &str) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Upload(format!("file exceeds the upload limit: {}", err.body_text()))
    } else {
        AppError::Validation(format!("Invalid {}: {}", part, err.body_text()))
    }
}

async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(HashMap<String, String>, Option<FileUpload>), AppError> {
    let mut fields = HashMap::new();
    let mut file = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, "multipart body"))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| multipart_error(e, "file field"))?;
            file = Some(FileUpload {
                file_name,
                bytes: bytes.to_vec(),
                content_type,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| multipart_error(e, "form field"))?;
            fields.insert(name, value);
        }
    }

    Ok((fields, file))
}
