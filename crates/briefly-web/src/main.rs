use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use briefly_core::{ArticleFetcher, Config, HttpSummarizer, Pipeline, SummaryPool, config_file};
use briefly_pdf_mupdf::MupdfBackend;

mod handlers;
mod models;
mod state;
mod template;
mod upload;

use state::AppState;

/// Largest accepted request body (the PDF dominates).
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index::index))
        .route("/summarize", post(handlers::summarize::summarize))
        .route("/health", get(handlers::health::health))
        .layer(axum::extract::DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let file_config = match std::env::var_os("BRIEFLY_CONFIG") {
        Some(path) => config_file::load_required(std::path::Path::new(&path))
            .map_err(anyhow::Error::msg)?,
        None => config_file::load_config(),
    };
    let config = Config::from_env(&file_config);
    tracing::debug!(?config, "resolved configuration");

    let summarizer = HttpSummarizer::connect(&config).await.with_context(|| {
        format!(
            "failed to initialize summarization backend at {}",
            config.endpoint
        )
    })?;

    let fetcher =
        ArticleFetcher::new(&config).context("failed to build the article fetcher")?;
    let pipeline = Pipeline::new(Arc::new(summarizer), Arc::new(MupdfBackend::new()), fetcher);
    let pool = SummaryPool::new(Arc::new(pipeline), config.num_workers, config.queue_capacity);

    let state = Arc::new(AppState {
        pool,
        model: config.model.clone(),
    });
    let app = router(Arc::clone(&state));

    let addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.bind))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        workers = config.num_workers,
        queue = config.queue_capacity,
        "listening on http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    // Let in-flight summaries finish once the server holds no more state.
    if let Ok(state) = Arc::try_unwrap(state) {
        state.pool.shutdown().await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use briefly_core::pdf::{PdfBackend, PdfError};
    use briefly_core::InputBundle;
    use briefly_core::summarizer::mock::{MockGate, MockResponse, MockSummarizer};
    use tower::ServiceExt;

    const BOUNDARY: &str = "briefly-test-boundary";

    struct FixedPdf(&'static str);

    impl PdfBackend for FixedPdf {
        fn extract_text(&self, _data: &[u8]) -> Result<String, PdfError> {
            Ok(self.0.to_string())
        }
    }

    fn state_with(mock: MockSummarizer, workers: usize, queue: usize) -> Arc<AppState> {
        let pipeline = Pipeline::new(
            Arc::new(mock),
            Arc::new(FixedPdf(
                "Quarterly revenue grew by twelve percent on strong overseas demand.",
            )),
            ArticleFetcher::new(&Config::default()).unwrap(),
        );
        Arc::new(AppState {
            pool: SummaryPool::new(Arc::new(pipeline), workers, queue),
            model: "test-model".into(),
        })
    }

    fn app_with(mock: MockSummarizer, workers: usize, queue: usize) -> Router {
        router(state_with(mock, workers, queue))
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, filename, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n",
                            name, filename
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn summarize_request(parts: &[Part<'_>]) -> Request<Body> {
        Request::post("/summarize")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    async fn json_of(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn long_text() -> String {
        "The city council approved funding for a new public library downtown. ".repeat(6)
    }

    #[tokio::test]
    async fn index_serves_the_form() {
        let app = app_with(MockSummarizer::text("ok"), 1, 4);
        let resp = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r#"name="word_length""#));
        assert!(html.contains("test-model"));
    }

    #[tokio::test]
    async fn health_reports_model() {
        let app = app_with(MockSummarizer::text("ok"), 3, 4);
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_of(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["workers"], 3);
    }

    #[tokio::test]
    async fn text_summary_returns_report() {
        let app = app_with(MockSummarizer::text("Library approved."), 1, 4);
        let text = long_text();
        let resp = app
            .oneshot(summarize_request(&[
                Part::Text("text", &text),
                Part::Text("word_length", "80"),
                Part::File("file", "", b""),
            ]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_of(resp).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["report"]["source"], "text");
        assert_eq!(json["report"]["bounds"]["min_tokens"], 40);
        assert_eq!(json["report"]["bounds"]["max_tokens"], 104);
        assert_eq!(json["report"]["summary"], "Library approved.");
        let md = json["markdown"].as_str().unwrap();
        assert!(md.starts_with("✅ **Source**: Textbox"));
        assert!(md.ends_with("### 🧠 Summary:\nLibrary approved."));
    }

    #[tokio::test]
    async fn pdf_upload_wins() {
        let app = app_with(MockSummarizer::new(MockResponse::LeadingWords), 1, 4);
        let text = long_text();
        let resp = app
            .oneshot(summarize_request(&[
                Part::Text("text", &text),
                Part::Text("url", "https://example.com/story"),
                Part::File("file", "earnings.pdf", b"%PDF-1.4 stub"),
            ]))
            .await
            .unwrap();

        let json = json_of(resp).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["report"]["source"], "pdf");
        assert!(
            json["markdown"]
                .as_str()
                .unwrap()
                .starts_with("✅ **Source**: PDF")
        );
    }

    #[tokio::test]
    async fn short_text_is_a_warning_with_200() {
        let app = app_with(MockSummarizer::text("unused"), 1, 4);
        let resp = app
            .oneshot(summarize_request(&[Part::Text("text", "hi")]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_of(resp).await;
        assert_eq!(json["status"], "warning");
        assert!(json["report"].is_null());
        assert!(
            json["markdown"]
                .as_str()
                .unwrap()
                .ends_with("📝 Current Input Length: 2 characters.")
        );
    }

    #[tokio::test]
    async fn wrong_file_type_is_an_error_with_200() {
        let app = app_with(MockSummarizer::text("unused"), 1, 4);
        let resp = app
            .oneshot(summarize_request(&[Part::File("file", "notes.txt", b"hello")]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = json_of(resp).await;
        assert_eq!(json["status"], "error");
        assert_eq!(
            json["markdown"],
            "❌ Invalid file format. Only PDFs are supported."
        );
    }

    #[tokio::test]
    async fn bad_word_length_is_400() {
        let app = app_with(MockSummarizer::text("unused"), 1, 4);
        let text = long_text();
        let resp = app
            .oneshot(summarize_request(&[
                Part::Text("text", &text),
                Part::Text("word_length", "lots"),
            ]))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = json_of(resp).await;
        assert_eq!(json["status"], "error");
        assert!(json["markdown"].as_str().unwrap().starts_with("❌ "));
    }

    #[tokio::test]
    async fn full_queue_is_503() {
        let gate = MockGate::new();
        let state = state_with(MockSummarizer::text("ok").with_gate(Arc::clone(&gate)), 1, 1);
        let app = router(Arc::clone(&state));
        let text = long_text();

        // One request held on the worker, one waiting in the queue.
        let busy = tokio::spawn(app.clone().oneshot(summarize_request(&[Part::Text("text", &text)])));
        gate.entered().await;
        let queued = state
            .pool
            .try_submit(InputBundle::new(80).with_text(text.clone()))
            .expect("queue slot");

        let resp = app
            .oneshot(summarize_request(&[Part::Text("text", &text)]))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = json_of(resp).await;
        assert_eq!(
            json["markdown"],
            "❌ The summarizer is busy. Please try again shortly."
        );

        gate.release(2);
        assert_eq!(busy.await.unwrap().unwrap().status(), StatusCode::OK);
        queued.await.unwrap().expect("queued summary");
    }
}
