use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::{QrRedirectError, Result};

/// Where the resolver gets the artifact text from.
pub trait ArtifactSource {
    fn fetch(&self) -> Result<String>;

    fn describe(&self) -> String;
}

/// Artifact on the local filesystem.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ArtifactSource for FileSource {
    fn fetch(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| {
            let status = match e.kind() {
                ErrorKind::NotFound => Some(404),
                ErrorKind::PermissionDenied => Some(403),
                _ => None,
            };
            QrRedirectError::FetchFailed {
                status,
                reason: e.to_string(),
            }
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Artifact served over HTTP, with a bounded timeout and a bounded number
/// of retries for transport errors and 5xx responses.
pub struct HttpSource {
    url: String,
    client: Client,
    retries: u32,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration, retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QrRedirectError::Config(format!("http client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
            retries,
        })
    }

    fn fetch_once(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .map_err(|e| QrRedirectError::FetchFailed {
                status: e.status().map(|s| s.as_u16()),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(QrRedirectError::FetchFailed {
                status: Some(status.as_u16()),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string(),
            });
        }

        response.text().map_err(|e| QrRedirectError::FetchFailed {
            status: Some(status.as_u16()),
            reason: e.to_string(),
        })
    }
}

impl ArtifactSource for HttpSource {
    fn fetch(&self) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.fetch_once() {
                Ok(text) => return Ok(text),
                Err(err) if attempt < self.retries && is_retryable(&err) => {
                    attempt += 1;
                    warn!(url = %self.url, attempt, error = %err, "retrying artifact fetch");
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

fn is_retryable(err: &QrRedirectError) -> bool {
    match err {
        QrRedirectError::FetchFailed { status: None, .. } => true,
        QrRedirectError::FetchFailed {
            status: Some(code), ..
        } => StatusCode::from_u16(*code).is_ok_and(|s| s.is_server_error()),
        _ => false,
    }
}

/// Pick a source for `location`: `http(s)://` URLs go over the network,
/// anything else is a filesystem path.
pub fn source_for(location: &str, config: &AppConfig) -> Result<Box<dyn ArtifactSource>> {
    if location.starts_with("http://") || location.starts_with("https://") {
        debug!(url = location, "using http artifact source");
        Ok(Box::new(HttpSource::new(
            location,
            Duration::from_secs(config.fetch_timeout_secs),
            config.fetch_retries,
        )?))
    } else {
        debug!(path = location, "using file artifact source");
        Ok(Box::new(FileSource::new(location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn http_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn read_request(stream: &mut TcpStream) {
        let mut request: Vec<u8> = Vec::new();
        let mut chunk = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
        }
    }

    /// Answers one connection per entry in `responses`, in order, and
    /// counts the requests it saw.
    fn serve(responses: Vec<String>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/data.enc", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        thread::spawn(move || {
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                read_request(&mut stream);
                counter.fetch_add(1, Ordering::SeqCst);
                stream.write_all(response.as_bytes()).unwrap();
            }
        });
        (url, hits)
    }

    #[test]
    fn test_http_retries_server_error_then_succeeds() {
        let (url, hits) = serve(vec![
            http_response("503 Service Unavailable", ""),
            http_response("200 OK", "QUJD"),
        ]);
        let source = HttpSource::new(url, Duration::from_secs(5), 1).unwrap();

        assert_eq!(source.fetch().unwrap(), "QUJD");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_http_client_error_is_not_retried() {
        let (url, hits) = serve(vec![http_response("404 Not Found", "")]);
        let source = HttpSource::new(url, Duration::from_secs(5), 1).unwrap();

        let result = source.fetch();
        assert!(matches!(
            result,
            Err(QrRedirectError::FetchFailed {
                status: Some(404),
                ..
            })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_http_retries_are_bounded() {
        let retries = 1;
        let (url, hits) = serve(vec![
            http_response("503 Service Unavailable", ""),
            http_response("503 Service Unavailable", ""),
        ]);
        let source = HttpSource::new(url, Duration::from_secs(5), retries).unwrap();

        let result = source.fetch();
        assert!(matches!(
            result,
            Err(QrRedirectError::FetchFailed {
                status: Some(503),
                ..
            })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), retries as usize + 1);
    }

    #[test]
    fn test_http_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/data.enc", listener.local_addr().unwrap());
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            read_request(&mut stream);
            thread::sleep(Duration::from_secs(2));
        });
        let source = HttpSource::new(url, Duration::from_millis(200), 0).unwrap();

        let result = source.fetch();
        assert!(matches!(
            result,
            Err(QrRedirectError::FetchFailed { status: None, .. })
        ));
    }

    #[test]
    fn test_file_source_reads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.enc");
        fs::write(&path, "QUJD").unwrap();
        assert_eq!(FileSource::new(&path).fetch().unwrap(), "QUJD");
    }

    #[test]
    fn test_file_source_missing_is_404() {
        let dir = TempDir::new().unwrap();
        let result = FileSource::new(dir.path().join("data.enc")).fetch();
        assert!(matches!(
            result,
            Err(QrRedirectError::FetchFailed {
                status: Some(404),
                ..
            })
        ));
    }

    #[test]
    fn test_retryable_statuses() {
        let failed = |status| QrRedirectError::FetchFailed {
            status,
            reason: String::new(),
        };
        assert!(is_retryable(&failed(None)));
        assert!(is_retryable(&failed(Some(503))));
        assert!(!is_retryable(&failed(Some(404))));
        assert!(!is_retryable(&QrRedirectError::AuthenticationFailure));
    }

    #[test]
    fn test_source_for_picks_by_scheme() {
        let config = AppConfig::default();
        let source = source_for("https://qr.example/data.enc", &config).unwrap();
        assert_eq!(source.describe(), "https://qr.example/data.enc");
        let source = source_for("public/data.enc", &config).unwrap();
        assert_eq!(source.describe(), "public/data.enc");
    }
}
