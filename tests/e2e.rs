//! End-to-end tests for ats-resume.
//!
//! The Gemini endpoint is replaced by a local `mockito` server, so these run
//! without network access or an API key. Tests that rasterise a PDF need a
//! pdfium library; when none can be bound they print SKIP and return.
//!
//! Run with:
//!   PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture

use ats_resume::pipeline::render::bind_pdfium;
use ats_resume::{
    render_first_page, AtsError, EncodedImagePart, Evaluator, ModelConfig, PdfiumRenderer,
    RasterFormat, RenderConfig, ResumeSession, Task, UploadedDocument,
};
use mockito::Matcher;

const MODEL: &str = "gemini-1.5-flash";
const GENERATE_PATH: &str = "/models/gemini-1.5-flash:generateContent";
const JOB_DESCRIPTION: &str = "Business Analyst role requiring SQL and Tableau";

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless a pdfium library can be bound.
macro_rules! skip_unless_pdfium {
    () => {{
        if let Err(e) = bind_pdfium() {
            println!("SKIP — {e}");
            return;
        }
    }};
}

/// A minimal PDF with `pages` letter-size pages.
///
/// Page 1 always carries the same blue block; later pages carry a red block
/// so they differ from page 1.
fn sample_pdf(pages: usize) -> Vec<u8> {
    let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets: Vec<usize> = Vec::new();

    let mut push_obj = |out: &mut Vec<u8>, body: String| {
        offsets.push(out.len());
        let id = offsets.len();
        out.extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
    };

    push_obj(&mut out, "<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", 3 + 2 * i)).collect();
    push_obj(
        &mut out,
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), pages),
    );

    for i in 0..pages {
        let contents_id = 4 + 2 * i;
        push_obj(
            &mut out,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << >> /Contents {contents_id} 0 R >>"
            ),
        );
        let stream = if i == 0 {
            "0 0 1 rg 72 600 300 120 re f"
        } else {
            "1 0 0 rg 100 100 200 200 re f"
        };
        push_obj(
            &mut out,
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            ),
        );
    }

    let xref_offset = out.len();
    let count = offsets.len() + 1;
    out.extend_from_slice(format!("xref\n0 {count}\n0000000000 65535 f \n").as_bytes());
    for off in &offsets {
        out.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!("trailer\n<< /Size {count} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n")
            .as_bytes(),
    );
    out
}

fn sample_image() -> EncodedImagePart {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        16,
        16,
        image::Rgb([240, 240, 240]),
    ));
    ats_resume::encode_page(&img, RasterFormat::default()).expect("encode")
}

fn evaluator_for(base_url: &str) -> Evaluator {
    let config = ModelConfig::builder()
        .api_key("test-key")
        .model(MODEL)
        .base_url(base_url)
        .api_timeout_secs(5)
        .build()
        .expect("valid config");
    Evaluator::gemini(config).expect("client")
}

fn gemini_reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 1290, "candidatesTokenCount": 42 }
    })
    .to_string()
}

// ── Rendering (no network) ───────────────────────────────────────────────────

#[test]
fn test_render_empty_input() {
    let doc = UploadedDocument::new("resume.pdf", b"".to_vec());
    let err = render_first_page(&doc, &RenderConfig::default()).unwrap_err();
    assert!(matches!(err, AtsError::NoDocumentProvided), "got {err:?}");
}

#[test]
fn test_render_non_document() {
    let doc = UploadedDocument::new("resume.pdf", b"not a real document".to_vec());
    let err = render_first_page(&doc, &RenderConfig::default()).unwrap_err();
    assert!(matches!(err, AtsError::RenderingFailed { .. }), "got {err:?}");
}

#[test]
fn test_render_truncated_pdf() {
    skip_unless_pdfium!();
    let doc = UploadedDocument::new("broken.pdf", b"%PDF-1.4\n1 0 obj\n<<".to_vec());
    let err = render_first_page(&doc, &RenderConfig::default()).unwrap_err();
    assert!(matches!(err, AtsError::RenderingFailed { .. }), "got {err:?}");
}

#[test]
fn test_render_produces_valid_jpeg() {
    skip_unless_pdfium!();
    let doc = UploadedDocument::new("resume.pdf", sample_pdf(1));
    let config = RenderConfig::builder().dpi(72).build().unwrap();

    let part = render_first_page(&doc, &config).expect("render should succeed");
    assert_eq!(part.mime_type(), "image/jpeg");

    let bytes = part.decode().expect("valid base64");
    let img = image::load_from_memory_with_format(&bytes, image::ImageFormat::Jpeg)
        .expect("valid JPEG");
    // Letter page at 72 DPI
    assert_eq!((img.width(), img.height()), (612, 792));
}

#[test]
fn test_render_png_matches_mime() {
    skip_unless_pdfium!();
    let doc = UploadedDocument::new("resume.pdf", sample_pdf(2));
    let config = RenderConfig::builder()
        .dpi(72)
        .format(RasterFormat::Png)
        .build()
        .unwrap();

    let part = render_first_page(&doc, &config).expect("render should succeed");
    assert_eq!(part.mime_type(), "image/png");
    let bytes = part.decode().unwrap();
    image::load_from_memory_with_format(&bytes, image::ImageFormat::Png).expect("valid PNG");
}

#[test]
fn test_render_ignores_later_pages() {
    skip_unless_pdfium!();
    let config = RenderConfig::builder().dpi(72).build().unwrap();
    let one = render_first_page(&UploadedDocument::new("one.pdf", sample_pdf(1)), &config)
        .expect("1-page render");
    let ten = render_first_page(&UploadedDocument::new("ten.pdf", sample_pdf(10)), &config)
        .expect("10-page render");
    assert_eq!(one.data(), ten.data());
}

#[test]
fn test_render_caps_longest_edge() {
    skip_unless_pdfium!();
    let config = RenderConfig::builder()
        .dpi(400)
        .max_rendered_pixels(500)
        .build()
        .unwrap();
    let page = ats_resume::pipeline::render::rasterise_first_page(
        &UploadedDocument::new("resume.pdf", sample_pdf(1)),
        &config,
    )
    .expect("render");
    assert!(page.width <= 500 && page.height <= 500, "{}x{}", page.width, page.height);
    assert_eq!(page.source_pages, 1);
}

// ── Dispatch against a mock Gemini server ────────────────────────────────────

#[tokio::test]
async fn test_percentage_match_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let image = sample_image();

    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::Regex(format!(
            r#""text":"{JOB_DESCRIPTION}".*"inline_data".*"mime_type":"image/jpeg".*"text":"You are an ATS scanner"#
        )))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_reply("Percentage match: 65%\nMissing keywords: Power BI"))
        .expect(1)
        .create_async()
        .await;

    let evaluator = evaluator_for(&server.url());
    let response = evaluator
        .evaluate(JOB_DESCRIPTION, &image, Task::PercentageMatch)
        .await
        .expect("evaluation should succeed");

    assert!(!response.text().trim().is_empty());
    assert!(response.text().contains('%'));
    assert_eq!(response.task, Task::PercentageMatch);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_context_is_sent() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .match_body(Matcher::Regex(r#"^\{"contents":\[\{"role":"user","parts":\[\{"text":""\}"#.to_string()))
        .with_status(200)
        .with_body(gemini_reply("Strengths: …"))
        .expect(1)
        .create_async()
        .await;

    let response = evaluator_for(&server.url())
        .evaluate("", &sample_image(), Task::FullAnalysis)
        .await
        .expect("empty context is accepted");
    assert_eq!(response.text(), "Strengths: …");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unsupported_task_name() {
    let err = evaluator_for("http://127.0.0.1:9")
        .evaluate_named(JOB_DESCRIPTION, &sample_image(), "unsupported")
        .await
        .unwrap_err();
    assert!(matches!(err, AtsError::InvalidTask { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .with_status(503)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#)
        .expect(1)
        .create_async()
        .await;

    let err = evaluator_for(&server.url())
        .evaluate(JOB_DESCRIPTION, &sample_image(), Task::KeywordExtraction)
        .await
        .unwrap_err();

    match err {
        AtsError::RemoteCallFailed { status, detail, .. } => {
            assert_eq!(status, Some(503));
            assert!(detail.contains("overloaded"), "got: {detail}");
        }
        other => panic!("expected RemoteCallFailed, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_network_failure_then_recovery() {
    // Nothing listens on the discard port.
    let err = evaluator_for("http://127.0.0.1:9")
        .evaluate(JOB_DESCRIPTION, &sample_image(), Task::FullAnalysis)
        .await
        .unwrap_err();
    assert!(err.is_remote(), "got {err:?}");

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_body(gemini_reply("Strong SQL background."))
        .expect(1)
        .create_async()
        .await;

    let response = evaluator_for(&server.url())
        .evaluate(JOB_DESCRIPTION, &sample_image(), Task::FullAnalysis)
        .await
        .expect("second call should succeed");
    assert_eq!(response.text(), "Strong SQL background.");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_silent_server_times_out() {
    // Accepts connections and never answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let silent = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let config = ModelConfig::builder()
        .api_key("test-key")
        .model(MODEL)
        .base_url(format!("http://{addr}"))
        .api_timeout_secs(1)
        .build()
        .unwrap();
    let started = std::time::Instant::now();
    let err = Evaluator::gemini(config)
        .unwrap()
        .evaluate(JOB_DESCRIPTION, &sample_image(), Task::PercentageMatch)
        .await
        .unwrap_err();
    silent.abort();

    match err {
        AtsError::RemoteCallFailed { status, detail, .. } => {
            assert_eq!(status, None);
            assert!(detail.contains("no response within 1s"), "got: {detail}");
        }
        other => panic!("expected RemoteCallFailed, got {other:?}"),
    }
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
}

#[tokio::test]
async fn test_blocked_prompt() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
        .create_async()
        .await;

    let err = evaluator_for(&server.url())
        .evaluate(JOB_DESCRIPTION, &sample_image(), Task::FullAnalysis)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("SAFETY"), "got {err}");
}

#[tokio::test]
async fn test_missing_api_key() {
    let config = ModelConfig::builder()
        .base_url("http://127.0.0.1:9")
        .build()
        .unwrap();
    let err = Evaluator::gemini(config)
        .unwrap()
        .evaluate(JOB_DESCRIPTION, &sample_image(), Task::FullAnalysis)
        .await
        .unwrap_err();
    assert!(err.is_remote(), "got {err:?}");
}

// ── Full pipeline (pdfium + mock server) ─────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_session_renders_once_for_three_tasks() {
    skip_unless_pdfium!();
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", GENERATE_PATH)
        .with_status(200)
        .with_body(gemini_reply("ok"))
        .expect(3)
        .create_async()
        .await;

    let renderer = PdfiumRenderer::new(RenderConfig::builder().dpi(72).build().unwrap());
    let document = UploadedDocument::new("resume.pdf", sample_pdf(3));
    let session = tokio::task::block_in_place(|| {
        ResumeSession::open(&document, &renderer, evaluator_for(&server.url()))
    })
    .expect("session opens");

    let results = session.run_all(JOB_DESCRIPTION).await;
    assert_eq!(results.len(), 3);
    for (task, result) in &results {
        let response = result.as_ref().expect("task succeeds");
        assert_eq!(response.task, *task);
        assert!(response.report().starts_with(task.report_title()));
    }
    mock.assert_async().await;
}
