//! Source Fetch Module
//! Resolves the two dashboard sources concurrently. Both results are
//! required: either failure fails the whole load and discards the other
//! result, a timeout bounds the join, and each source retries transient
//! failures with exponential backoff.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{label}: request failed: {source}")]
    Http {
        label: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{label}: read failed: {source}")]
    Io {
        label: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("sources did not resolve within {0:?}")]
    Timeout(Duration),
    #[error("failed to start fetch runtime: {0}")]
    Runtime(std::io::Error),
}

/// Where a source lives: a local file or an http(s) URL.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLocation {
    Path(PathBuf),
    Url(String),
}

impl SourceLocation {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Bounded retry with exponential backoff for one source.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl RetryConfig {
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms as f64 * 2.0_f64.powi(attempt as i32);
        Duration::from_millis(base.min(self.max_delay_ms as f64) as u64)
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Bound on the whole two-source join.
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
        }
    }
}

/// Raw bytes of both sources, produced only when both fetches succeed.
#[derive(Debug, Clone)]
pub struct SourceBytes {
    pub incidents: Vec<u8>,
    pub intersections: Vec<u8>,
}

/// Fetch both sources concurrently and wait for both.
pub async fn fetch_sources(
    incidents: &SourceLocation,
    intersections: &SourceLocation,
    config: &FetchConfig,
) -> Result<SourceBytes, FetchError> {
    let client = reqwest::Client::new();

    let joined = tokio::time::timeout(config.timeout, async {
        tokio::try_join!(
            read_source(&client, incidents, "incidents", &config.retry),
            read_source(&client, intersections, "intersections", &config.retry),
        )
    })
    .await;

    match joined {
        Err(_) => Err(FetchError::Timeout(config.timeout)),
        Ok(Err(err)) => Err(err),
        Ok(Ok((incidents, intersections))) => Ok(SourceBytes {
            incidents,
            intersections,
        }),
    }
}

/// Blocking entry point for callers outside a runtime (the GUI loads on a
/// plain background thread).
pub fn fetch_sources_blocking(
    incidents: &SourceLocation,
    intersections: &SourceLocation,
    config: &FetchConfig,
) -> Result<SourceBytes, FetchError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(FetchError::Runtime)?;
    runtime.block_on(fetch_sources(incidents, intersections, config))
}

async fn read_source(
    client: &reqwest::Client,
    location: &SourceLocation,
    label: &'static str,
    retry: &RetryConfig,
) -> Result<Vec<u8>, FetchError> {
    let mut attempt = 0;
    loop {
        match read_once(client, location, label).await {
            Ok(bytes) => {
                log::info!("{label}: {} bytes from {location}", bytes.len());
                return Ok(bytes);
            }
            Err(err) if attempt < retry.max_retries => {
                let delay = retry.delay_for_attempt(attempt);
                log::warn!(
                    "{label}: attempt {}/{} failed: {err}. Retrying in {delay:?}",
                    attempt + 1,
                    retry.max_retries + 1,
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn read_once(
    client: &reqwest::Client,
    location: &SourceLocation,
    label: &'static str,
) -> Result<Vec<u8>, FetchError> {
    match location {
        SourceLocation::Path(path) => tokio::fs::read(path)
            .await
            .map_err(|source| FetchError::Io { label, source }),
        SourceLocation::Url(url) => {
            let response = client
                .get(url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|source| FetchError::Http { label, source })?;
            let bytes = response
                .bytes()
                .await
                .map_err(|source| FetchError::Http { label, source })?;
            Ok(bytes.to_vec())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fast_config() -> FetchConfig {
        FetchConfig {
            timeout: Duration::from_secs(5),
            retry: RetryConfig {
                max_retries: 1,
                base_delay_ms: 1,
                max_delay_ms: 2,
            },
        }
    }

    fn temp_source(contents: &[u8]) -> (tempfile::NamedTempFile, SourceLocation) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        let location = SourceLocation::Path(file.path().to_path_buf());
        (file, location)
    }

    #[test]
    fn parse_distinguishes_urls_from_paths() {
        assert_eq!(
            SourceLocation::parse("https://example.com/incidents.csv"),
            SourceLocation::Url("https://example.com/incidents.csv".to_string())
        );
        assert_eq!(
            SourceLocation::parse(" data/incidents.csv "),
            SourceLocation::Path(PathBuf::from("data/incidents.csv"))
        );
    }

    #[test]
    fn backoff_doubles_and_clamps() {
        let retry = RetryConfig {
            max_retries: 5,
            base_delay_ms: 100,
            max_delay_ms: 500,
        };
        assert_eq!(retry.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn fetches_both_files() {
        let (_csv, csv_loc) = temp_source(b"crucero,total_incidentes\nA,1\n");
        let (_json, json_loc) = temp_source(b"{\"intersections\": []}");

        let bytes = fetch_sources(&csv_loc, &json_loc, &fast_config())
            .await
            .unwrap();
        assert!(bytes.incidents.starts_with(b"crucero"));
        assert!(bytes.intersections.starts_with(b"{"));
    }

    #[tokio::test]
    async fn one_missing_source_fails_the_whole_fetch() {
        let (_csv, csv_loc) = temp_source(b"crucero,total_incidentes\nA,1\n");
        let missing = SourceLocation::Path(PathBuf::from("/nonexistent/intersections.json"));

        let err = fetch_sources(&csv_loc, &missing, &fast_config())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FetchError::Io {
                label: "intersections",
                ..
            }
        ));
    }

    #[test]
    fn blocking_wrapper_runs_outside_a_runtime() {
        let (_csv, csv_loc) = temp_source(b"crucero,total_incidentes\nA,1\n");
        let (_json, json_loc) = temp_source(b"{\"intersections\": []}");

        let bytes = fetch_sources_blocking(&csv_loc, &json_loc, &fast_config()).unwrap();
        assert!(!bytes.incidents.is_empty());
        assert!(!bytes.intersections.is_empty());
    }
}
