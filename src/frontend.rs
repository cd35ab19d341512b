//! Index page rendering and embedded static assets.

use axum::body::Body as AxumBody;
use axum::extract::Extension;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{Html, IntoResponse, Response};
use rust_embed::RustEmbed;
use std::fmt::Write;
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::registry::{FileRecord, Registry};

#[derive(RustEmbed)]
#[folder = "assets"]
/// Page template and stylesheet compiled into the binary.
pub struct FrontendAssets;

const INDEX_TEMPLATE: &str = "index.html";
const STYLESHEET: &str = "style.css";
const LISTING_PLACEHOLDER: &str = "{{files}}";

/// Lists the registry as an HTML page.
pub async fn index(
    Extension(registry): Extension<Arc<dyn Registry>>,
) -> Result<Html<String>, ApiError> {
    let records = registry.list();
    let page = render_index(&records)?;
    debug!(count = records.len(), "render index");
    Ok(Html(page))
}

pub async fn stylesheet() -> Result<Response, ApiError> {
    load_embedded_asset(STYLESHEET)?
        .ok_or_else(|| ApiError::Internal("stylesheet asset missing".into()))
}

pub fn render_index(records: &[FileRecord]) -> Result<String, ApiError> {
    let template = FrontendAssets::get(INDEX_TEMPLATE)
        .ok_or_else(|| ApiError::Internal("index template missing".into()))?;
    let template = std::str::from_utf8(&template.data)
        .map_err(|err| ApiError::Internal(format!("index template is not utf-8: {err}")))?;

    let mut listing = String::new();
    for record in records {
        let name = escape_html(record.name());
        write!(
            listing,
            concat!(
                "        <li>\n",
                "            <a href=\"{url}\" target=\"_blank\">{name}</a>\n",
                "            <form action=\"/delete\" method=\"post\">\n",
                "                <input type=\"hidden\" name=\"file\" value=\"{name}\">\n",
                "                <input type=\"submit\" value=\"Delete\">\n",
                "            </form>\n",
                "        </li>\n",
            ),
            url = escape_html(record.url()),
            name = name,
        )
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    }

    Ok(template.replace(LISTING_PLACEHOLDER, listing.trim_end_matches('\n')))
}

/// Escapes text for both element content and quoted attribute values.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn load_embedded_asset(path: &str) -> Result<Option<Response>, ApiError> {
    let Some(asset) = FrontendAssets::get(path) else {
        return Ok(None);
    };
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(mime.essence_str())
            .map_err(|_| ApiError::Internal("invalid mime type".into()))?,
    );
    Ok(Some(
        (headers, AxumBody::from(asset.data.into_owned())).into_response(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryRegistry;
    use axum::http::StatusCode;
    use http_body_util::BodyExt;

    #[test]
    fn empty_registry_renders_form_without_items() {
        let page = render_index(&[]).expect("render");
        assert!(page.contains("action=\"/upload\""));
        assert!(page.contains("name=\"uploadFile\""));
        assert!(!page.contains("<li>"));
        assert!(!page.contains(LISTING_PLACEHOLDER));
    }

    #[test]
    fn records_render_link_and_delete_form() {
        let page = render_index(&[FileRecord::new("report.txt")]).expect("render");
        assert!(page.contains("<a href=\"/download?file=report.txt\" target=\"_blank\">report.txt</a>"));
        assert!(page.contains("<input type=\"hidden\" name=\"file\" value=\"report.txt\">"));
    }

    #[test]
    fn markup_in_names_is_escaped() {
        let page = render_index(&[FileRecord::new("<script>\"x'&.txt")]).expect("render");
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;&#34;x&#39;&amp;.txt"));
    }

    #[tokio::test]
    async fn index_lists_registry_in_order() {
        let registry: Arc<dyn Registry> = Arc::new(MemoryRegistry::new());
        registry.add(FileRecord::new("first.txt"));
        registry.add(FileRecord::new("second.txt"));

        let Html(page) = index(Extension(registry)).await.expect("index");
        let first = page.find("first.txt").expect("first listed");
        let second = page.find("second.txt").expect("second listed");
        assert!(first < second);
    }

    #[tokio::test]
    async fn stylesheet_is_served_as_css() {
        let response = stylesheet().await.expect("stylesheet");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        assert!(std::str::from_utf8(&body).expect("utf-8").contains("body {"));
    }
}
