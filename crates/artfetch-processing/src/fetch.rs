//! Fetch stage: plain HTTP GET of remote artwork.

use std::time::Duration;

use artfetch_core::PipelineError;
use bytes::Bytes;

// Some artwork hosts refuse requests without a browser-like User-Agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// HTTP fetcher sharing one connection pool across all tasks.
///
/// Any transport error, timeout, or non-2xx status is a [`PipelineError::Fetch`]
/// for that task; there is no retry. A 2xx response with an empty body is also
/// rejected, so downstream size accounting never divides by zero.
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
}

impl ImageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Fetch(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// GET the URL and return the raw payload.
    pub async fn fetch(&self, url: &str) -> Result<Bytes, PipelineError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PipelineError::Fetch(format!("{url}: {e}")))?
            .error_for_status()
            .map_err(|e| PipelineError::Fetch(format!("{url}: {e}")))?;

        let payload = response
            .bytes()
            .await
            .map_err(|e| PipelineError::Fetch(format!("{url}: {e}")))?;

        if payload.is_empty() {
            return Err(PipelineError::Fetch(format!("{url}: empty payload")));
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serve one canned HTTP response on a local port, then exit.
    fn serve_once(status_line: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf);
                let header = format!(
                    "{status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(&body);
            }
        });
        format!("http://{addr}/image.jpg")
    }

    #[tokio::test]
    async fn fetch_returns_payload() {
        let url = serve_once("HTTP/1.1 200 OK", b"fake image bytes".to_vec());
        let fetcher = ImageFetcher::new(Duration::from_secs(5)).unwrap();
        let payload = fetcher.fetch(&url).await.unwrap();
        assert_eq!(&payload[..], b"fake image bytes");
    }

    #[tokio::test]
    async fn fetch_rejects_error_status() {
        let url = serve_once("HTTP/1.1 404 Not Found", Vec::new());
        let fetcher = ImageFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(_)));
        assert!(err.to_string().contains("image.jpg"));
    }

    #[tokio::test]
    async fn fetch_rejects_empty_payload() {
        let url = serve_once("HTTP/1.1 200 OK", Vec::new());
        let fetcher = ImageFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher.fetch(&url).await.unwrap_err();
        assert!(err.to_string().contains("empty payload"));
    }

    #[tokio::test]
    async fn fetch_reports_connection_failure() {
        // Bind and drop to get a port with nothing listening.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let fetcher = ImageFetcher::new(Duration::from_secs(2)).unwrap();
        let err = fetcher
            .fetch(&format!("http://127.0.0.1:{port}/a.jpg"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Fetch(_)));
    }
}
