//! Fetch-content collaborator: a plain HTTP GET returning the body bytes.

use std::{path::Path, time::Duration};

use {
    async_trait::async_trait,
    bytes::{Bytes, BytesMut},
    futures::StreamExt,
    reqwest::Client,
    tracing::debug,
};

use crate::{
    Error, Result,
    validate::{ValidatedContent, ValidationError, ValidationRules, validate},
};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Where device payloads come from. Implementations return content that
/// already passed validation.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn load(&self, source: &str) -> Result<ValidatedContent>;
}

pub struct ContentFetcher {
    client: Client,
    rules: ValidationRules,
}

impl ContentFetcher {
    pub fn new(rules: ValidationRules, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport("failed to build content client", e))?;
        Ok(Self { client, rules })
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// GET `url`. A non-2xx status is a transport failure. The body is read
    /// incrementally and abandoned once it grows past `max_bytes`.
    pub async fn fetch(&self, url: &str) -> Result<Bytes> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::transport(format!("GET {url} failed"), e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let max = self.rules.max_bytes;
        if let Some(declared) = resp.content_length()
            && declared > max as u64
        {
            return Err(ValidationError::TooLarge {
                size: usize::try_from(declared).unwrap_or(usize::MAX),
                max,
            }
            .into());
        }

        let mut body = BytesMut::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| Error::transport(format!("failed to read body of {url}"), e))?;
            body.extend_from_slice(&chunk);
            if body.len() > max {
                debug!(url, received = body.len(), max, "content exceeded size cap");
                return Err(ValidationError::TooLarge {
                    size: body.len(),
                    max,
                }
                .into());
            }
        }
        debug!(url, size = body.len(), "fetched content");
        Ok(body.freeze())
    }

    /// Fetch then validate. Validation only runs on a successful download.
    pub async fn fetch_validated(&self, url: &str) -> Result<ValidatedContent> {
        let body = self.fetch(url).await?;
        Ok(validate(&body, &self.rules)?)
    }

    /// Validate a URL or a local file path.
    pub async fn load_validated(&self, source: &str) -> Result<ValidatedContent> {
        if source.starts_with("http://") || source.starts_with("https://") {
            return self.fetch_validated(source).await;
        }
        let path = Path::new(source);
        let body = tokio::fs::read(path)
            .await
            .map_err(|e| Error::transport(format!("failed to read {}", path.display()), e))?;
        Ok(validate(&body, &self.rules)?)
    }
}

#[async_trait]
impl ContentSource for ContentFetcher {
    async fn load(&self, source: &str) -> Result<ValidatedContent> {
        self.load_validated(source).await
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::validate::{GIF89A, sample},
    };

    fn fetcher() -> ContentFetcher {
        ContentFetcher::new(ValidationRules::default(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_and_validates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/a.gif")
            .with_status(200)
            .with_header("content-type", "image/gif")
            .with_body(sample(GIF89A, 32, 16, 900))
            .create_async()
            .await;

        let url = format!("{}/a.gif", server.url());
        let content = fetcher().fetch_validated(&url).await.unwrap();
        assert_eq!(content.size, 900);
    }

    #[tokio::test]
    async fn error_status_never_reaches_validation() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.gif")
            .with_status(404)
            .with_body(sample(GIF89A, 32, 16, 100))
            .create_async()
            .await;

        let url = format!("{}/missing.gif", server.url());
        let err = fetcher().fetch_validated(&url).await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 404, .. }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn invalid_body_is_a_validation_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/big.gif")
            .with_status(200)
            .with_body(sample(GIF89A, 64, 32, 100))
            .create_async()
            .await;

        let url = format!("{}/big.gif", server.url());
        let err = fetcher().fetch_validated(&url).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::BadDimensions { width: 64, .. })
        ));
    }

    #[tokio::test]
    async fn declared_oversize_body_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/huge.gif")
            .with_status(200)
            .with_body(vec![0u8; 4096])
            .create_async()
            .await;

        let small = ContentFetcher::new(
            ValidationRules::default().with_limits(1024, 32, 16),
            Duration::from_secs(5),
        )
        .unwrap();
        let url = format!("{}/huge.gif", server.url());
        let err = small.fetch(&url).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::TooLarge {
                size: 4096,
                max: 1024
            })
        ));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn chunked_oversize_body_stops_at_cap() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/stream.gif")
            .with_status(200)
            .with_chunked_body(|w| {
                for _ in 0..64 {
                    std::io::Write::write_all(w, &[0u8; 256])?;
                }
                Ok(())
            })
            .create_async()
            .await;

        let small = ContentFetcher::new(
            ValidationRules::default().with_limits(1024, 32, 16),
            Duration::from_secs(5),
        )
        .unwrap();
        let url = format!("{}/stream.gif", server.url());
        let err = small.fetch(&url).await.unwrap_err();
        match err {
            Error::Validation(ValidationError::TooLarge { size, max }) => {
                assert_eq!(max, 1024);
                assert!(size > 1024, "read {size} bytes");
            },
            other => panic!("expected TooLarge, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn body_at_cap_is_accepted() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/edge.gif")
            .with_status(200)
            .with_body(vec![7u8; 1024])
            .create_async()
            .await;

        let small = ContentFetcher::new(
            ValidationRules::default().with_limits(1024, 32, 16),
            Duration::from_secs(5),
        )
        .unwrap();
        let url = format!("{}/edge.gif", server.url());
        assert_eq!(small.fetch(&url).await.unwrap().len(), 1024);
    }

    #[tokio::test]
    async fn local_files_are_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.gif");
        std::fs::write(&path, sample(GIF89A, 32, 16, 300)).unwrap();
        let content = fetcher()
            .load_validated(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(content.height, 16);
    }
}
