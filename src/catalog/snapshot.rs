use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Catalog bundled into the binary at compile time (validated by build.rs)
pub const EMBEDDED_SNAPSHOT: &str = include_str!("../../catalogs/productos.json");

/// Upper bound on an HTTP snapshot fetch
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// The authoritative snapshot could not be retrieved
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fetch snapshot: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Snapshot request to {url} returned status {status}")]
    Status { url: String, status: u16 },
}

/// Where the authoritative catalog comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SnapshotSource {
    /// The catalog compiled into the binary
    #[default]
    Embedded,
    /// A JSON file on disk
    File(PathBuf),
    /// A JSON document served over HTTP(S)
    Url(String),
}

impl SnapshotSource {
    /// Interpret a command-line value: `embedded`, an `http(s)://` URL, or a
    /// file path
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("embedded") {
            Self::Embedded
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }

    /// Retrieve the raw snapshot text.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if the file cannot be read, the request fails or
    /// times out, or the server answers with a non-success status.
    pub async fn fetch(&self) -> Result<String, FetchError> {
        match self {
            Self::Embedded => Ok(EMBEDDED_SNAPSHOT.to_string()),
            Self::File(path) => {
                debug!("Reading snapshot from {}", path.display());
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| FetchError::Io {
                        path: path.clone(),
                        source,
                    })
            }
            Self::Url(url) => {
                debug!("Fetching snapshot from {url}");
                let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
                let response = client.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }
                Ok(response.text().await?)
            }
        }
    }
}

impl std::fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded catalog"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::structured::decode_structured;

    #[test]
    fn test_parse_source() {
        assert_eq!(SnapshotSource::parse("embedded"), SnapshotSource::Embedded);
        assert_eq!(
            SnapshotSource::parse("https://example.com/productos.json"),
            SnapshotSource::Url("https://example.com/productos.json".to_string())
        );
        assert_eq!(
            SnapshotSource::parse("./productos.json"),
            SnapshotSource::File(PathBuf::from("./productos.json"))
        );
    }

    #[test]
    fn test_embedded_snapshot_decodes() {
        let catalog = decode_structured(EMBEDDED_SNAPSHOT).unwrap();
        assert!(!catalog.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_embedded() {
        let text = SnapshotSource::Embedded.fetch().await.unwrap();
        assert_eq!(text, EMBEDDED_SNAPSHOT);
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = SnapshotSource::File(dir.path().join("missing.json"));
        assert!(matches!(
            source.fetch().await,
            Err(FetchError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("productos.json");
        std::fs::write(&path, "[]").unwrap();

        let text = SnapshotSource::File(path).fetch().await.unwrap();
        assert_eq!(text, "[]");
    }
}
