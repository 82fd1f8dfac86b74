use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::{base_url, checked_file_name, file_response};
use crate::error::AppError;
use crate::state::AppState;
use crate::storage::{mime, unique_file_name, StoredFile};

#[derive(Serialize)]
struct FileEntry {
    #[serde(flatten)]
    file: StoredFile,
    url: String,
}

struct IncomingFile {
    name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

fn multipart_error(state: &AppState, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::bad_request(format!(
            "Upload too large. Maximum total size is {}MB",
            state.config.max_batch_size / (1024 * 1024)
        ))
    } else {
        AppError::bad_request(format!("Invalid upload: {}", err.body_text()))
    }
}

/// Accepts any number of file parts. A lone file keeps its name and replaces
/// an existing one; in a batch every file gets a unique stored name.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut incoming = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(multipart_error(&state, e)),
        };
        let Some(name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(&state, e))?;
        incoming.push(IncomingFile {
            name,
            content_type,
            bytes,
        });
    }

    if incoming.is_empty() {
        return Err(AppError::bad_request("No file provided"));
    }

    state
        .upload_limits()
        .check(incoming.iter().map(|f| (f.name.as_str(), f.bytes.len() as u64)))
        .map_err(AppError::BadRequest)?;

    let base = base_url(&headers);
    let entry = |mut file: StoredFile, original: &IncomingFile| {
        file.mime_type = mime::upload_mime(&original.name, original.content_type.as_deref());
        FileEntry {
            url: format!("{}/files/{}", base, file.name),
            file,
        }
    };

    let stored = if let [single] = incoming.as_slice() {
        let name = checked_file_name(&single.name)?;
        let file = state
            .uploads
            .save(name, &single.bytes)
            .await
            .map_err(|e| AppError::internal("Failed to process upload", e))?;
        tracing::info!("Stored upload {} ({} bytes)", file.name, file.size);
        vec![entry(file, single)]
    } else {
        let mut stored = Vec::with_capacity(incoming.len());
        for original in &incoming {
            let stored_name = unique_file_name(&original.name);
            match state.uploads.save(&stored_name, &original.bytes).await {
                Ok(mut file) => {
                    tracing::info!("Stored upload {} as {}", original.name, stored_name);
                    file.original_name = Some(original.name.clone());
                    stored.push(entry(file, original));
                }
                Err(e) => {
                    tracing::error!("Failed to store upload {}: {}", original.name, e);
                }
            }
        }
        if stored.is_empty() {
            return Err(AppError::internal(
                "Failed to process upload",
                "no files could be stored",
            ));
        }
        stored
    };

    let message = if stored.len() == 1 {
        "File uploaded successfully".to_string()
    } else {
        format!("{} files uploaded successfully", stored.len())
    };
    Ok(Json(serde_json::json!({
        "message": message,
        "count": stored.len(),
        "files": stored,
    })))
}

pub async fn serve_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let filename = checked_file_name(&filename)?;
    if !state.uploads.exists(filename).await {
        return Err(AppError::not_found("File not found"));
    }
    let bytes = state
        .uploads
        .read(filename)
        .await
        .map_err(|e| AppError::internal("Failed to serve file", e))?;
    let mime = mime::mime_for_name(filename);
    Ok(file_response(bytes, mime, filename, mime::is_inline(mime)))
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !state.uploads.root_exists().await {
        return Ok(Json(serde_json::json!({
            "files": [],
            "message": "No uploads directory found",
        })));
    }

    let files: Vec<FileEntry> = state
        .uploads
        .list()
        .await
        .map_err(|e| AppError::internal("Failed to list files", e))?
        .into_iter()
        .map(|file| FileEntry {
            url: format!("/files/{}", file.name),
            file,
        })
        .collect();

    Ok(Json(serde_json::json!({
        "count": files.len(),
        "files": files,
    })))
}
