use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use super::response::{success, success_message};
use super::{AppState, BearerToken};
use crate::models::{
    Advance, ContentType, EpisodeDraft, MediaFile, MetadataDraft, MovieDraft, SeasonChoice,
    ShowDraft, TitleFields,
};
use crate::services::AuthoringWorkflow;

#[derive(Debug, Deserialize)]
pub struct SelectTypeRequest {
    pub content_type: String,
}

#[derive(Debug, Deserialize)]
pub struct BeginEditRequest {
    pub content_type: String,
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SelectEpisodeRequest {
    pub episode: u32,
}

/// 表单内容：文本字段 + 文件字段
#[derive(Debug, Default)]
struct FormParts {
    text: HashMap<String, String>,
    files: HashMap<String, MediaFile>,
}

impl FormParts {
    fn text(&self, name: &str) -> Option<&str> {
        self.text.get(name).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    fn required<T: std::str::FromStr>(&self, name: &str) -> ApiResult<T> {
        let raw = self
            .text(name)
            .ok_or_else(|| ApiError::Validation(format!("Missing field: {}", name)))?;
        raw.parse()
            .map_err(|_| ApiError::BadRequest(format!("Invalid value for {}: {}", name, raw)))
    }

    fn take_file(&mut self, name: &str) -> Option<MediaFile> {
        self.files.remove(name)
    }
}

async fn read_form(mut multipart: Multipart) -> ApiResult<FormParts> {
    let mut form = FormParts::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(str::to_string);

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read field {}: {}", name, e)))?;

        match file_name {
            // Browsers send an empty part for file inputs left blank.
            Some(file_name) if !bytes.is_empty() => {
                form.files.insert(name, MediaFile::new(file_name, bytes.to_vec()));
            }
            Some(_) => {}
            None => {
                let value = String::from_utf8(bytes.to_vec())
                    .map_err(|_| ApiError::BadRequest(format!("Field {} is not UTF-8", name)))?;
                form.text.insert(name, value);
            }
        }
    }

    Ok(form)
}

fn metadata_draft(kind: ContentType, mut form: FormParts) -> ApiResult<MetadataDraft> {
    let fields = TitleFields {
        title: form.text("title").unwrap_or_default().to_string(),
        release_year: form.required("release_year")?,
        imdb_rating: form.required("imdb_rating")?,
        synopsis: form.text("synopsis").unwrap_or_default().to_string(),
    };

    if kind == ContentType::Movie {
        return Ok(MetadataDraft::Movie(MovieDraft {
            fields,
            poster: form.take_file("poster"),
            thumbnail: form.take_file("thumbnail"),
            video: form.take_file("video"),
        }));
    }

    let draft = ShowDraft {
        season_count: form.required("season_count")?,
        poster: form.take_file("poster"),
        fields,
    };
    MetadataDraft::show(kind, draft)
        .ok_or_else(|| ApiError::Internal(format!("{} has no show form", kind)))
}

// ============ 会话管理 ============

fn session_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid session id: {}", raw)))
}

fn not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("Authoring session {} not found", id))
}

/// 锁定工作流，并把本次请求的令牌绑定到它的网关
async fn lock_workflow(
    state: &AppState,
    sid: &str,
    token: BearerToken,
) -> ApiResult<OwnedMutexGuard<AuthoringWorkflow>> {
    let id = session_id(sid)?;
    let (workflow, session) = state.sessions.get(&id).await.ok_or_else(|| not_found(id))?;
    let guard = workflow.try_lock_owned().map_err(|_| busy())?;
    session.set_bearer(token.0);
    Ok(guard)
}

/// 同一工作流不允许并发转换
fn busy() -> ApiError {
    ApiError::Conflict("Another step of this authoring session is still running".to_string())
}

pub async fn create_session(
    State(state): State<AppState>,
    token: BearerToken,
) -> ApiResult<impl IntoResponse> {
    let pruned = state.sessions.prune().await;
    if pruned > 0 {
        tracing::debug!("Pruned {} idle authoring sessions", pruned);
    }

    let session = token.context();
    let workflow = state.new_workflow(&session);
    let snapshot = workflow.snapshot();
    let id = Uuid::new_v4();

    state.sessions.insert(id, workflow, session).await;

    tracing::info!("Created authoring session {}", id);
    Ok(success(json!({
        "session_id": id,
        "workflow": snapshot,
    })))
}

pub async fn get_session(
    Path(sid): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
) -> ApiResult<impl IntoResponse> {
    let guard = lock_workflow(&state, &sid, token).await?;
    Ok(success(guard.snapshot()))
}

pub async fn delete_session(
    Path(sid): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let id = session_id(&sid)?;
    if !state.sessions.remove(&id).await {
        return Err(not_found(id));
    }

    Ok(success_message("Authoring session closed"))
}

// ============ 转换 ============

pub async fn select_type(
    Path(sid): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
    Json(payload): Json<SelectTypeRequest>,
) -> ApiResult<impl IntoResponse> {
    let kind: ContentType = payload.content_type.parse()?;
    let mut guard = lock_workflow(&state, &sid, token).await?;

    guard.select_type(kind)?;
    Ok(success(guard.snapshot()))
}

pub async fn begin_edit(
    Path(sid): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
    Json(payload): Json<BeginEditRequest>,
) -> ApiResult<impl IntoResponse> {
    let kind: ContentType = payload.content_type.parse()?;
    let mut guard = lock_workflow(&state, &sid, token).await?;

    guard.begin_edit(kind, payload.id).await?;
    Ok(success(guard.snapshot()))
}

/// 提交元数据（multipart）
pub async fn submit_metadata(
    Path(sid): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut guard = lock_workflow(&state, &sid, token).await?;

    let form = read_form(multipart).await?;
    let kind = match form.text("content_type") {
        Some(raw) => raw.parse()?,
        None => guard
            .state()
            .content_type()
            .ok_or_else(|| ApiError::Conflict("Select a content type first".to_string()))?,
    };

    let draft = metadata_draft(kind, form)?;
    guard.submit_metadata(draft).await?;
    Ok(success(guard.snapshot()))
}

pub async fn choose_season(
    Path(sid): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
    Json(choice): Json<SeasonChoice>,
) -> ApiResult<impl IntoResponse> {
    let mut guard = lock_workflow(&state, &sid, token).await?;

    guard.choose_season(choice).await?;
    Ok(success(guard.snapshot()))
}

/// 保存单集（multipart），`advance` 决定去向
pub async fn save_episode(
    Path(sid): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
    multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut guard = lock_workflow(&state, &sid, token).await?;

    let mut form = read_form(multipart).await?;
    let advance: Advance = match form.text("advance") {
        Some(raw) => serde_json::from_value(json!(raw))
            .map_err(|_| ApiError::BadRequest(format!("Invalid advance: {}", raw)))?,
        None => Advance::NextEpisode,
    };

    let draft = EpisodeDraft {
        title: form.text("title").unwrap_or_default().to_string(),
        synopsis: form.text("synopsis").unwrap_or_default().to_string(),
        thumbnail: form.take_file("thumbnail"),
        video: form.take_file("video"),
    };

    guard.save_episode(draft, advance).await?;
    Ok(success(guard.snapshot()))
}

pub async fn select_episode(
    Path(sid): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
    Json(payload): Json<SelectEpisodeRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut guard = lock_workflow(&state, &sid, token).await?;

    guard.select_episode(payload.episode)?;
    Ok(success(guard.snapshot()))
}

pub async fn back_to_seasons(
    Path(sid): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
) -> ApiResult<impl IntoResponse> {
    let mut guard = lock_workflow(&state, &sid, token).await?;

    guard.back_to_seasons()?;
    Ok(success(guard.snapshot()))
}

pub async fn cancel(
    Path(sid): Path<String>,
    State(state): State<AppState>,
    token: BearerToken,
) -> ApiResult<impl IntoResponse> {
    let mut guard = lock_workflow(&state, &sid, token).await?;

    guard.cancel();
    Ok(success(guard.snapshot()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormParts {
        FormParts {
            text: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: HashMap::new(),
        }
    }

    #[test]
    fn test_movie_draft_from_form() {
        let mut parts = form(&[
            ("title", "Test"),
            ("release_year", "2020"),
            ("imdb_rating", "7.5"),
            ("synopsis", "x"),
        ]);
        parts
            .files
            .insert("video".to_string(), MediaFile::new("clip.mp4", vec![1, 2]));

        let MetadataDraft::Movie(draft) = metadata_draft(ContentType::Movie, parts).unwrap() else {
            panic!("expected a movie draft");
        };
        assert_eq!(draft.fields.title, "Test");
        assert_eq!(draft.fields.imdb_rating, 7.5);
        assert!(draft.video.is_some());
        assert!(draft.poster.is_none());
    }

    #[test]
    fn test_show_draft_requires_season_count() {
        let parts = form(&[("title", "Naruto"), ("release_year", "2002"), ("imdb_rating", "8.4")]);
        assert!(matches!(
            metadata_draft(ContentType::Anime, parts),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_bad_number_is_bad_request() {
        let parts = form(&[("title", "X"), ("release_year", "soon"), ("imdb_rating", "5")]);
        assert!(matches!(
            metadata_draft(ContentType::Movie, parts),
            Err(ApiError::BadRequest(_))
        ));
    }
}
