//! Invoice and quotation endpoints.
//!
//! Both routes share one set of handlers; the route decides the source type
//! and therefore the form rules.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{decode_document, malformed_body, ListDocumentsQuery, UpdateDocumentRequest},
    models::{DocumentDetail, DocumentPayload, DocumentSummary, ListDocumentsFilter, Page, SourceType},
    services::listing,
    AppState,
};

/// Unparseable JSON is reported in the same field map as rule violations.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| malformed_body(rejection.body_text()))
}

async fn create(
    state: AppState,
    source_type: SourceType,
    payload: DocumentPayload,
) -> Result<(StatusCode, Json<DocumentDetail>), AppError> {
    tracing::info!(source_type = source_type.as_str(), "Creating document");

    let document_id = state.engine.create_document(source_type, payload).await?;
    let detail = state.engine.get_document(document_id).await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

async fn update(
    state: AppState,
    source_type: SourceType,
    document_id: Uuid,
    request: UpdateDocumentRequest,
) -> Result<Json<DocumentDetail>, AppError> {
    let update = request.into_update(source_type);
    tracing::info!(
        document_id = %document_id,
        source_type = source_type.as_str(),
        "Updating document"
    );

    state
        .engine
        .update_document(document_id, source_type, update)
        .await?;
    let detail = state.engine.get_document(document_id).await?;

    Ok(Json(detail))
}

async fn list(
    state: AppState,
    source_type: SourceType,
    query: ListDocumentsQuery,
) -> Result<Json<Page<DocumentSummary>>, AppError> {
    let filter = ListDocumentsFilter {
        source_type: Some(source_type),
        search: query.search,
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(state.config.default_page_size),
    };
    let page = listing::list_documents(state.store.as_ref(), filter).await?;
    Ok(Json(page))
}

/// Fetch any document with its parties, items and jobs.
pub async fn get_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<Json<DocumentDetail>, AppError> {
    let detail = state.engine.get_document(document_id).await?;
    Ok(Json(detail))
}

/// Delete a document with its items and jobs.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    tracing::info!(document_id = %document_id, "Deleting document");
    state.engine.delete_document(document_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_invoice(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<DocumentDetail>), AppError> {
    let payload = decode_document(json_body(body)?)?;
    create(state, SourceType::Invoicing, payload).await
}

pub async fn update_invoice(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DocumentDetail>, AppError> {
    let request = UpdateDocumentRequest::from_json(json_body(body)?)?;
    update(state, SourceType::Invoicing, document_id, request).await
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Page<DocumentSummary>>, AppError> {
    list(state, SourceType::Invoicing, query).await
}

pub async fn create_quotation(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<DocumentDetail>), AppError> {
    let payload = decode_document(json_body(body)?)?;
    create(state, SourceType::Quotation, payload).await
}

pub async fn update_quotation(
    State(state): State<AppState>,
    Path(document_id): Path<Uuid>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DocumentDetail>, AppError> {
    let request = UpdateDocumentRequest::from_json(json_body(body)?)?;
    update(state, SourceType::Quotation, document_id, request).await
}

pub async fn list_quotations(
    State(state): State<AppState>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Page<DocumentSummary>>, AppError> {
    list(state, SourceType::Quotation, query).await
}
