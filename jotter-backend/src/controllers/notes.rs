//! Notes REST API - the five note operations.
//!
//! Handlers validate the request, call the store, and translate store
//! outcomes into HTTP results. Notes are never cached between requests;
//! every operation reads or writes the store directly. Admission control
//! happens in the middleware wrapping this scope, before any handler runs.

use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{CreateNoteRequest, UpdateNoteRequest};
use crate::AppState;

/// Reject a malformed note id before touching the store.
fn parse_note_id(raw: &str) -> Result<String, ApiError> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| ApiError::InvalidIdentifier)
}

/// Reject empty required fields. In legacy mode the failure surfaces as
/// a generic server error, matching the pre-rewrite API.
fn require_field(value: &str, name: &'static str, legacy: bool) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        if legacy {
            return Err(ApiError::Store(
                format!("missing required field: {}", name).into(),
            ));
        }
        return Err(ApiError::Validation(name));
    }
    Ok(())
}

/// List all notes, newest first
pub async fn list_notes(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let notes = state.db.list_notes()?;
    Ok(HttpResponse::Ok().json(notes))
}

/// Get a single note by id
pub async fn get_note(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_note_id(&path)?;

    match state.db.get_note(&id)? {
        Some(note) => Ok(HttpResponse::Ok().json(note)),
        None => Err(ApiError::NotFound),
    }
}

/// Create a note
pub async fn create_note(
    state: web::Data<AppState>,
    body: web::Json<CreateNoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let legacy = state.config.legacy_validation_errors;

    require_field(&request.title, "title", legacy)?;
    require_field(&request.content, "content", legacy)?;

    let note = state.db.create_note(&request.title, &request.content)?;
    log::info!("Created note {}", note.id);

    // Confirmation plus the new id; the full body stays one GET away
    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "message": "Note created successfully",
        "id": note.id
    })))
}

/// Overwrite a note's title and content
pub async fn update_note(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateNoteRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_note_id(&path)?;
    let request = body.into_inner();
    let legacy = state.config.legacy_validation_errors;

    require_field(&request.title, "title", legacy)?;
    require_field(&request.content, "content", legacy)?;

    match state.db.update_note(&id, &request.title, &request.content)? {
        Some(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Note updated successfully"
        }))),
        None => Err(ApiError::NotFound),
    }
}

/// Delete a note permanently
pub async fn delete_note(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_note_id(&path)?;

    if state.db.delete_note(&id)? {
        log::info!("Deleted note {}", id);
        Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Note deleted successfully"
        })))
    } else {
        Err(ApiError::NotFound)
    }
}

/// Configure routes, relative to the scope mounted in main
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("", web::get().to(list_notes))
        .route("", web::post().to(create_note))
        .route("/{id}", web::get().to(get_note))
        .route("/{id}", web::put().to(update_note))
        .route("/{id}", web::delete().to(delete_note));
}
