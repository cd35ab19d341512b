//! Upload, download and delete handlers.

use axum::body::Body as AxumBody;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Extension, Form, FromRequest, Multipart, Query, Request};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::config::{DELETE_FIELD_NAME, UPLOAD_FIELD_NAME};
use crate::error::ApiError;
use crate::http::attachment_disposition;
use crate::registry::{FileRecord, Registry};
use crate::storage::{Storage, StorageError};

#[derive(Deserialize)]
pub(crate) struct FileParam {
    file: Option<String>,
}

fn required_name(value: Option<String>) -> Result<String, ApiError> {
    value
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Bad Request: Please provide a filename".into()))
}

/// Stores the `uploadFile` file part of a multipart form and records it.
///
/// `uploadFile` parts without a file name are plain values and are skipped.
pub async fn upload_file(
    Extension(storage): Extension<Arc<Storage>>,
    Extension(registry): Extension<Arc<dyn Registry>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, ApiError> {
    let mut multipart =
        multipart.map_err(|err| ApiError::BadRequest(format!("Bad Request: {}", err.body_text())))?;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(malformed_form)?
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Bad Request: missing {UPLOAD_FIELD_NAME} file"))
            })?;
        if field.name() != Some(UPLOAD_FIELD_NAME) {
            debug!(field = ?field.name(), "skip multipart field");
            continue;
        }
        let Some(name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            debug!(field = UPLOAD_FIELD_NAME, "skip multipart value without file name");
            continue;
        };

        // The record is appended only after the whole body reached disk.
        let size = match storage.store(&name, field).await {
            Ok(size) => size,
            Err(StorageError::Interrupted(reason)) => {
                // A body that breaks off is a malformed form, not a disk fault.
                if let Err(err) = storage.delete(&name).await {
                    debug!(name, %err, "discard partial upload");
                }
                return Err(ApiError::BadRequest(format!("Bad Request: {reason}")));
            }
            Err(err) => return Err(err.into()),
        };
        registry.add(FileRecord::new(name.as_str()));
        info!(name, size, "upload file");
        return Ok(Redirect::to("/"));
    }
}

fn malformed_form(err: MultipartError) -> ApiError {
    ApiError::BadRequest(format!("Bad Request: {}", err.body_text()))
}

/// Streams a stored file back as an attachment.
pub async fn download_file(
    Query(FileParam { file }): Query<FileParam>,
    Extension(storage): Extension<Arc<Storage>>,
) -> Result<Response, ApiError> {
    let name = required_name(file)?;
    let (file, size) = storage.retrieve(&name).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    headers.insert(header::CONTENT_DISPOSITION, attachment_disposition(&name));
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));

    info!(name, size, "download file");
    let stream = ReaderStream::new(file);
    Ok((StatusCode::OK, headers, AxumBody::from_stream(stream)).into_response())
}

/// Removes a stored file, then its first registry entry.
///
/// The name is read from the form body (urlencoded or multipart), falling back
/// to the query string.
pub async fn delete_file(
    Query(query): Query<FileParam>,
    Extension(storage): Extension<Arc<Storage>>,
    Extension(registry): Extension<Arc<dyn Registry>>,
    request: Request,
) -> Result<Redirect, ApiError> {
    let from_body = body_file_param(request).await?;
    let name = required_name(from_body.filter(|name| !name.is_empty()).or(query.file))?;

    storage.delete(&name).await.map_err(|err| match err {
        StorageError::InvalidName => ApiError::from(err),
        other => ApiError::Internal(format!("failed to delete {name}: {other}")),
    })?;
    let tracked = registry.remove(&name);
    info!(name, tracked, "delete file");
    Ok(Redirect::to("/"))
}

async fn body_file_param(request: Request) -> Result<Option<String>, ApiError> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().starts_with("multipart/form-data"));
    if !is_multipart {
        // Anything that is not a urlencoded form leaves the query string to decide.
        return Ok(Form::<FileParam>::from_request(request, &())
            .await
            .ok()
            .and_then(|Form(form)| form.file));
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|err| ApiError::BadRequest(format!("Bad Request: {}", err.body_text())))?;
    while let Some(field) = multipart.next_field().await.map_err(malformed_form)? {
        if field.name() == Some(DELETE_FIELD_NAME) && field.file_name().is_none() {
            return field.text().await.map(Some).map_err(malformed_form);
        }
    }
    Ok(None)
}
