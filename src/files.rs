use crate::config::ServerConfig;
use crate::error::Error;
use log::debug;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Maps a request path onto a file under the document root.
///
/// The query/fragment part is dropped, `..` components are rejected outright,
/// and the canonicalized result must still live under the canonicalized root,
/// so symlinks can't smuggle a resolved path outside it either. Anything that
/// fails these checks, or isn't a regular file, is `ResourceNotFound`.
pub async fn resolve(request_path: &str, document_root: &Path) -> Result<PathBuf, Error> {
    let not_found = || Error::ResourceNotFound(request_path.to_string());

    let path = request_path
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .trim_start_matches('/');

    let relative = Path::new(path);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(not_found());
    }

    let root = tokio::fs::canonicalize(document_root)
        .await
        .map_err(|_| not_found())?;
    let resolved = tokio::fs::canonicalize(root.join(relative))
        .await
        .map_err(|_| not_found())?;

    if !resolved.starts_with(&root) {
        return Err(not_found());
    }

    let metadata = tokio::fs::metadata(&resolved).await.map_err(|_| not_found())?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    Ok(resolved)
}

/// Extension-based MIME guess, enough for the assets a dev server hands to a
/// browser.
pub fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") | Some("mjs") => "application/javascript",
        Some("json") | Some("map") => "application/json",
        Some("txt") => "text/plain",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}

/// Serves one static request and finishes the response.
///
/// `/` maps to the configured index file; everything else resolves under the
/// document root. A resolution miss degrades to a plain 404 response, it is
/// never an error for the connection itself.
pub async fn serve<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    config: &ServerConfig,
    request_path: &str,
) -> Result<(), Error> {
    if request_path == "/" {
        let body = tokio::fs::read(&config.index_file).await?;
        return write_ok(writer, "text/html", &body).await;
    }

    match resolve(request_path, &config.document_root).await {
        Ok(path) => {
            let body = tokio::fs::read(&path).await?;
            write_ok(writer, guess_content_type(&path), &body).await
        }
        Err(Error::ResourceNotFound(path)) => {
            debug!("no static resource for {}", path);
            write_not_found(writer).await
        }
        Err(err) => Err(err),
    }
}

async fn write_ok<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    content_type: &str,
    body: &[u8],
) -> Result<(), Error> {
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        content_type,
        body.len()
    );
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

async fn write_not_found<W: AsyncWriteExt + Unpin>(writer: &mut W) -> Result<(), Error> {
    writer
        .write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n")
        .await?;
    writer.flush().await?;
    Ok(())
}
