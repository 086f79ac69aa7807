//! Shared fixtures for briefly-core integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use briefly_core::pdf::{PdfBackend, PdfError};
use briefly_core::summarizer::mock::MockSummarizer;
use briefly_core::{ArticleFetcher, Config, Pipeline, Summarizer};

/// A request as seen by [`FixtureServer`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body should be JSON")
    }
}

/// A one-route HTTP/1.1 server answering every request with the same
/// status, content type and body, and recording what it received.
pub struct FixtureServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl FixtureServer {
    pub async fn start(status: u16, content_type: &'static str, body: impl Into<String>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.into();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&requests);

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let body = body.clone();
                let captured = Arc::clone(&captured);
                tokio::spawn(async move {
                    if let Some(req) = read_request(&mut stream).await {
                        captured.lock().unwrap().push(req);
                    }
                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        reason(status),
                        content_type,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    Some(CapturedRequest {
        method,
        path,
        headers,
        body,
    })
}

/// PDF backend returning fixed text regardless of the bytes given.
pub struct FixedPdf(pub &'static str);

impl PdfBackend for FixedPdf {
    fn extract_text(&self, _data: &[u8]) -> Result<String, PdfError> {
        Ok(self.0.to_string())
    }
}

/// PDF backend that rejects every document.
pub struct BrokenPdf;

impl PdfBackend for BrokenPdf {
    fn extract_text(&self, _data: &[u8]) -> Result<String, PdfError> {
        Err(PdfError::Open("no objects found".into()))
    }
}

/// PDF backend that aborts mid-parse, as a crashing native library would.
pub struct PanickingPdf;

impl PdfBackend for PanickingPdf {
    fn extract_text(&self, _data: &[u8]) -> Result<String, PdfError> {
        panic!("mupdf abort");
    }
}

pub fn test_config() -> Config {
    Config {
        fetch_timeout_secs: 5,
        backend_timeout_secs: 5,
        ..Config::default()
    }
}

pub fn pipeline_with(summarizer: Arc<dyn Summarizer>, pdf: Arc<dyn PdfBackend>) -> Pipeline {
    Pipeline::new(
        summarizer,
        pdf,
        ArticleFetcher::new(&test_config()).expect("http client"),
    )
}

pub fn mock_pipeline(summarizer: Arc<MockSummarizer>) -> Pipeline {
    pipeline_with(summarizer, Arc::new(FixedPdf("")))
}

/// 500 characters of plain prose.
pub fn prose_500() -> String {
    let sentence = "The quick brown fox jumps over the lazy dog near the river bank. ";
    let mut text = sentence.repeat(8);
    text.truncate(500);
    text
}

pub const ARTICLE_HTML: &str = r#"<!doctype html>
<html>
<head><title>Harbor Reopens</title></head>
<body>
  <nav><a href="/">Home</a> <a href="/news">News</a></nav>
  <article>
    <h1>Harbor Reopens</h1>
    <p>The old harbor reopened on Saturday after two years of repairs, drawing crowds from across the region.</p>
    <p>Officials said the new sea wall, which cost more than forty million, should protect the waterfront for decades.</p>
  </article>
  <footer>Copyright the Daily Tide</footer>
</body>
</html>"#;
