use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    response::Response,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use super::{base_url, checked_file_name, file_response};
use crate::certificate::CertificateRequest;
use crate::error::AppError;
use crate::state::AppState;
use crate::storage::{mime, sanitize_component};

#[derive(Serialize)]
struct TemplateEntry {
    name: String,
    url: String,
}

/// `*.png` files in the templates directory, sorted by name.
async fn available_templates(state: &AppState) -> Result<Vec<String>, AppError> {
    state
        .templates
        .list_names_with_extension("png")
        .await
        .map_err(|e| AppError::internal("Failed to list templates", e))
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CertificateRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(request) = payload
        .map_err(|e| AppError::bad_request(format!("Invalid request body: {}", e.body_text())))?;
    let data = request.validate().map_err(|missing| {
        AppError::bad_request(format!("Missing required fields: {}", missing.join(", ")))
    })?;

    let templates = available_templates(&state).await?;
    let template = match data.template.clone() {
        Some(template) => template,
        None => templates
            .first()
            .cloned()
            .ok_or_else(|| AppError::not_found("No certificate templates available"))?,
    };
    checked_file_name(&template)?;
    if !templates.contains(&template) {
        return Err(AppError::not_found(format!(
            "Template {} not found. Available templates: {}",
            template,
            templates.join(", ")
        )));
    }

    let renderer = state.renderer.clone();
    let job = data.clone();
    let template_name = template.clone();
    let png = tokio::task::spawn_blocking(move || renderer.render(&template_name, &job))
        .await
        .map_err(|e| AppError::internal("Failed to generate certificate", e))?
        .map_err(|e| AppError::internal("Failed to generate certificate", format!("{:#}", e)))?;

    let filename = format!(
        "certificate_{}_{}.png",
        sanitize_component(&data.name),
        Utc::now().timestamp_millis()
    );
    let stored = state
        .uploads
        .save(&filename, &png)
        .await
        .map_err(|e| AppError::internal("Failed to generate certificate", e))?;
    tracing::info!("Generated certificate {} from template {}", filename, template);

    Ok(Json(serde_json::json!({
        "message": "Certificate generated successfully",
        "file": {
            "name": stored.name,
            "size": stored.size,
            "type": mime::PNG,
            "url": format!("{}/files/{}", base_url(&headers), filename),
            "template": template,
            "data": data,
        }
    })))
}

pub async fn list_templates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let templates: Vec<TemplateEntry> = available_templates(&state)
        .await?
        .into_iter()
        .map(|name| TemplateEntry {
            url: format!("/certificates/{}", name),
            name,
        })
        .collect();

    Ok(Json(serde_json::json!({
        "count": templates.len(),
        "templates": templates,
    })))
}

pub async fn serve_template(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let filename = checked_file_name(&filename)?;
    if !state.templates.exists(filename).await {
        return Err(AppError::not_found("Template not found"));
    }
    let bytes = state
        .templates
        .read(filename)
        .await
        .map_err(|e| AppError::internal("Failed to serve template", e))?;
    Ok(file_response(bytes, mime::PNG, filename, true))
}
