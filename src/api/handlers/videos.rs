use crate::AppState;
use crate::api::error::AppError;
use crate::models::VideoRecord;
use crate::services::pipeline::UploadRequest;
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{
        Multipart, Path, State,
        multipart::{Field, MultipartError},
    },
    http::header,
};
use futures::TryStreamExt;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;
use uuid::Uuid;

/// Loads the record and checks it belongs to the authenticated caller
async fn load_owned_video(
    state: &AppState,
    claims: &Claims,
    video_id: &str,
) -> Result<VideoRecord, AppError> {
    let video_id =
        Uuid::parse_str(video_id).map_err(|_| AppError::BadRequest("Invalid ID".to_string()))?;
    let user_id = claims
        .user_id()
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let video = state
        .videos
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Couldn't find video".to_string()))?;

    if !video.is_owned_by(&user_id) {
        return Err(AppError::Unauthorized(
            "Video doesn't belong to user".to_string(),
        ));
    }
    Ok(video)
}

/// Streams a multipart field's body without buffering it in memory
fn field_reader<'a>(field: Field<'a>) -> impl AsyncRead + Unpin + Send + 'a {
    StreamReader::new(Box::pin(field.map_err(std::io::Error::other)))
}

fn multipart_error(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("Couldn't parse multipart form: {}", e))
}

fn field_media_type(field: &Field<'_>) -> Result<String, AppError> {
    field
        .content_type()
        .map(|ct| ct.to_string())
        .ok_or_else(|| AppError::BadRequest("Invalid Content-Type".to_string()))
}

/// Byte count the client declared for this part, if any
fn field_content_length(field: &Field<'_>) -> Option<u64> {
    field
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[utoipa::path(
    post,
    path = "/api/video_upload/{video_id}",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    request_body(content = Multipart, content_type = "multipart/form-data", description = "MP4 file in the `video` field"),
    responses(
        (status = 200, description = "Video processed and uploaded", body = VideoRecord),
        (status = 400, description = "Invalid ID, form or media type"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Video not found"),
        (status = 500, description = "Processing or storage failure")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<VideoRecord>, AppError> {
    let video = load_owned_video(&state, &claims, &video_id).await?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("video") {
            continue;
        }
        let media_type = field_media_type(&field)?;
        let declared_len = field_content_length(&field);

        tracing::info!("Uploading video {} by user {}", video.id, claims.sub);

        let mut request = UploadRequest::new(field_reader(field), media_type);
        if let Some(len) = declared_len {
            request = request.with_content_length(len);
        }
        let updated = state.pipeline.process(request, video).await?;

        state.videos.update_video(&updated).await?;
        return Ok(Json(updated));
    }

    Err(AppError::BadRequest("Couldn't get video file".to_string()))
}

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    params(
        ("video_id" = String, Path, description = "Video ID")
    ),
    request_body(content = Multipart, content_type = "multipart/form-data", description = "JPEG or PNG in the `thumbnail` field"),
    responses(
        (status = 200, description = "Thumbnail stored", body = VideoRecord),
        (status = 400, description = "Invalid ID, form or media type"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Video not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "videos"
)]
pub async fn upload_thumbnail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<VideoRecord>, AppError> {
    let mut video = load_owned_video(&state, &claims, &video_id).await?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("thumbnail") {
            continue;
        }
        let media_type = field_media_type(&field)?;

        let url = state
            .assets
            .store_thumbnail(&media_type, field_reader(field))
            .await
            .inspect_err(|e| tracing::warn!("Thumbnail for {} not stored: {}", video.id, e))?;

        if let Some(old_url) = video.thumbnail_url.replace(url) {
            state.assets.remove_by_url(&old_url).await;
        }

        state.videos.update_video(&video).await?;
        return Ok(Json(video));
    }

    Err(AppError::BadRequest("Couldn't get file".to_string()))
}
