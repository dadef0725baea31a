//! Best-effort image embedding.
//!
//! Remote image references are fetched and rewritten to data URIs so the
//! serialized document stands alone. Every failure here is soft: the
//! original reference stays in place and the export continues.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::future::BoxFuture;

use crate::error::{Error, Result, SoftFetchFailure};
use crate::ExportConfig;

/// A fetched image payload plus whatever media type the transport reported.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

/// Capability for fetching remote image bytes. Injected into the serializer
/// so tests can exercise the soft-failure path without a network.
pub trait ImageFetcher: Send + Sync {
    fn fetch<'a>(
        &'a self,
        uri: &'a str,
    ) -> BoxFuture<'a, std::result::Result<FetchedImage, SoftFetchFailure>>;
}

/// HTTP fetcher used by the default pipeline.
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(config: &ExportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch<'a>(
        &'a self,
        uri: &'a str,
    ) -> BoxFuture<'a, std::result::Result<FetchedImage, SoftFetchFailure>> {
        Box::pin(async move {
            let soft = |reason: String| SoftFetchFailure {
                uri: uri.to_string(),
                reason,
            };
            let parsed = url::Url::parse(uri).map_err(|e| soft(format!("invalid URL: {e}")))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(soft(format!("unsupported scheme '{}'", parsed.scheme())));
            }
            let response = self
                .client
                .get(parsed)
                .send()
                .await
                .map_err(|e| soft(format!("request failed: {e}")))?;
            if !response.status().is_success() {
                return Err(soft(format!("status {}", response.status())));
            }
            let mime = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
            let bytes = response
                .bytes()
                .await
                .map_err(|e| soft(format!("read failed: {e}")))?
                .to_vec();
            if bytes.is_empty() {
                return Err(soft("empty response body".into()));
            }
            Ok(FetchedImage { bytes, mime })
        })
    }
}

/// A fetcher that soft-fails every request. Used offline and in benches.
pub struct NullFetcher;

impl ImageFetcher for NullFetcher {
    fn fetch<'a>(
        &'a self,
        uri: &'a str,
    ) -> BoxFuture<'a, std::result::Result<FetchedImage, SoftFetchFailure>> {
        Box::pin(async move {
            Err(SoftFetchFailure {
                uri: uri.to_string(),
                reason: "fetching disabled".into(),
            })
        })
    }
}

/// Build a `data:` URI from a media type and raw bytes.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Identify an image payload from its magic bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

/// Decide the media type for an embed: trust a reported `image/*` type,
/// otherwise sniff. `None` means the payload is not recognizably an image
/// and should stay remote-referenced.
pub fn resolve_image_mime(fetched: &FetchedImage) -> Option<String> {
    if let Some(mime) = &fetched.mime {
        if mime.starts_with("image/") {
            return Some(mime.clone());
        }
    }
    sniff_image_mime(&fetched.bytes).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\nrest";

    #[test]
    fn data_uri_shape() {
        let uri = data_uri("image/png", &[1, 2, 3]);
        assert!(uri.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(sniff_image_mime(PNG_MAGIC), Some("image/png"));
        assert_eq!(sniff_image_mime(&[0xff, 0xd8, 0xff, 0xe0]), Some("image/jpeg"));
        assert_eq!(sniff_image_mime(b"GIF89a..."), Some("image/gif"));
        assert_eq!(sniff_image_mime(b"RIFF\x00\x00\x00\x00WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_image_mime(b"not an image"), None);
    }

    #[test]
    fn reported_mime_wins_when_plausible() {
        let fetched = FetchedImage {
            bytes: PNG_MAGIC.to_vec(),
            mime: Some("image/webp".into()),
        };
        assert_eq!(resolve_image_mime(&fetched).as_deref(), Some("image/webp"));

        let fetched = FetchedImage {
            bytes: PNG_MAGIC.to_vec(),
            mime: Some("text/html".into()),
        };
        assert_eq!(resolve_image_mime(&fetched).as_deref(), Some("image/png"));

        let fetched = FetchedImage {
            bytes: b"<html>".to_vec(),
            mime: Some("text/html".into()),
        };
        assert_eq!(resolve_image_mime(&fetched), None);
    }

    #[tokio::test]
    async fn null_fetcher_soft_fails() {
        let err = NullFetcher
            .fetch("https://example.com/x.png")
            .await
            .unwrap_err();
        assert_eq!(err.uri, "https://example.com/x.png");
    }
}
