use slidesynth_common::{FileHandle, NormalizedInput};
use slidesynth_transport::{HttpTransport, TransportError};
use std::io::Read;
use std::thread::JoinHandle;
use std::time::Duration;

struct Canned {
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    delay: Duration,
}

impl Canned {
    fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
            delay: Duration::ZERO,
        }
    }

    fn binary(body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: "application/octet-stream",
            body: body.to_vec(),
            delay: Duration::ZERO,
        }
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug)]
struct Captured {
    method: String,
    url: String,
    content_type: Option<String>,
    body: String,
}

/// Serve `responses` in order, one per request, and hand back what was sent.
fn serve(responses: Vec<Canned>) -> (String, JoinHandle<Vec<Captured>>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let handle = std::thread::spawn(move || {
        let mut seen = Vec::new();
        for canned in responses {
            let mut request = server.recv().unwrap();
            let mut body = Vec::new();
            request.as_reader().read_to_end(&mut body).unwrap();
            let content_type = request
                .headers()
                .iter()
                .find(|h| h.field.equiv("Content-Type"))
                .map(|h| h.value.to_string());
            seen.push(Captured {
                method: request.method().to_string(),
                url: request.url().to_string(),
                content_type,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
            std::thread::sleep(canned.delay);
            let header =
                tiny_http::Header::from_bytes(&b"Content-Type"[..], canned.content_type.as_bytes())
                    .unwrap();
            let response = tiny_http::Response::from_data(canned.body)
                .with_status_code(canned.status)
                .with_header(header);
            let _ = request.respond(response);
        }
        seen
    });
    (format!("http://127.0.0.1:{port}"), handle)
}

fn transport(base_url: &str) -> HttpTransport {
    HttpTransport::new(base_url, Duration::from_secs(5)).unwrap()
}

const FARMERS_DECK: &str = r#"{
    "slides": [{"title": "Problem", "bullets": ["Farmers lack data"]}],
    "slide_count": 1,
    "source_content": "Our app helps farmers"
}"#;

#[tokio::test]
async fn text_input_is_sent_as_text_content() {
    let (base, server) = serve(vec![Canned::json(200, FARMERS_DECK)]);
    let input = NormalizedInput::Text("Our app helps farmers".to_string());

    let deck = transport(&base).generate_slides(&input).await.unwrap();
    assert_eq!(deck.len(), 1);
    assert_eq!(deck.slides[0].title, "Problem");
    assert_eq!(deck.slides[0].bullets, vec!["Farmers lack data".to_string()]);
    assert_eq!(deck.source_content, "Our app helps farmers");

    let seen = server.join().unwrap();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].url, "/generate-slides");
    assert!(seen[0]
        .content_type
        .as_deref()
        .unwrap_or_default()
        .starts_with("multipart/form-data"));
    assert!(seen[0].body.contains(r#"name="text_content""#));
    assert!(seen[0].body.contains("Our app helps farmers"));
    assert!(!seen[0].body.contains("audio_file"));
}

#[tokio::test]
async fn file_input_is_sent_as_audio_file() {
    let (base, server) = serve(vec![Canned::json(200, FARMERS_DECK)]);
    let file = FileHandle::new("pitch.mp3", "audio/mpeg", b"ID3-fake-audio".to_vec());

    transport(&base)
        .generate_slides(&NormalizedInput::File(file))
        .await
        .unwrap();

    let seen = server.join().unwrap();
    let body = &seen[0].body;
    assert!(body.contains(r#"name="audio_file""#));
    assert!(body.contains(r#"filename="pitch.mp3""#));
    assert!(body.contains("audio/mpeg"));
    assert!(body.contains("ID3-fake-audio"));
    assert!(!body.contains("text_content"));
}

#[tokio::test]
async fn export_sends_filename_and_returns_raw_bytes() {
    let payload = [0x50u8, 0x4b, 0x03, 0x04, 0xff];
    let (base, server) = serve(vec![Canned::binary(&payload)]);
    let input = NormalizedInput::Text("Our app helps farmers".to_string());

    let blob = transport(&base)
        .generate_pptx(&input, "farmers.pptx")
        .await
        .unwrap();
    assert_eq!(blob.as_bytes(), &payload);

    let seen = server.join().unwrap();
    assert_eq!(seen[0].url, "/generate-pptx");
    assert!(seen[0].body.contains(r#"name="filename""#));
    assert!(seen[0].body.contains("farmers.pptx"));
    assert!(seen[0].body.contains(r#"name="text_content""#));
}

#[tokio::test]
async fn structured_detail_becomes_remote_error() {
    let (base, _server) = serve(vec![Canned::json(
        503,
        r#"{"detail": "Export service unavailable"}"#,
    )]);
    let input = NormalizedInput::Text("deck".to_string());

    let err = transport(&base)
        .generate_pptx(&input, "deck.pptx")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Remote("Export service unavailable".to_string())
    );
}

#[tokio::test]
async fn error_status_without_detail_is_network() {
    let (base, _server) = serve(vec![Canned {
        status: 502,
        content_type: "text/html",
        body: b"<html>Bad Gateway</html>".to_vec(),
        delay: Duration::ZERO,
    }]);
    let input = NormalizedInput::Text("deck".to_string());

    let err = transport(&base).generate_slides(&input).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(msg) if msg.contains("502")));
}

#[tokio::test]
async fn validation_detail_list_is_not_surfaced() {
    let (base, _server) = serve(vec![Canned::json(
        422,
        r#"{"detail": [{"loc": ["body", "filename"], "msg": "field required"}]}"#,
    )]);
    let input = NormalizedInput::Text("deck".to_string());

    let err = transport(&base).generate_slides(&input).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}

#[tokio::test]
async fn malformed_success_body_is_protocol() {
    let (base, _server) = serve(vec![
        Canned::json(200, r#"{"slides": "not a list"}"#),
        Canned::json(
            200,
            r#"{"slides": [], "slide_count": 3, "source_content": "x"}"#,
        ),
    ]);
    let client = transport(&base);
    let input = NormalizedInput::Text("deck".to_string());

    let err = client.generate_slides(&input).await.unwrap_err();
    assert!(matches!(err, TransportError::Protocol(_)));

    let err = client.generate_slides(&input).await.unwrap_err();
    assert!(matches!(err, TransportError::Protocol(msg) if msg.contains("slide_count")));
}

#[tokio::test]
async fn slow_service_times_out() {
    let (base, _server) = serve(vec![
        Canned::json(200, FARMERS_DECK).delayed(Duration::from_millis(1500))
    ]);
    let limit = Duration::from_millis(200);
    let client = HttpTransport::new(&base, limit).unwrap();
    let input = NormalizedInput::Text("deck".to_string());

    let err = client.generate_slides(&input).await.unwrap_err();
    assert_eq!(err, TransportError::Timeout { after: limit });
}

/// Hands out `head` at once, then stalls before the rest.
struct StallingBody {
    head: Vec<u8>,
    tail: Vec<u8>,
    stall: Duration,
    stalled: bool,
}

impl Read for StallingBody {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.head.is_empty() && !self.stalled {
            std::thread::sleep(self.stall);
            self.stalled = true;
        }
        let source = if self.head.is_empty() {
            &mut self.tail
        } else {
            &mut self.head
        };
        let n = buf.len().min(source.len());
        buf[..n].copy_from_slice(&source[..n]);
        source.drain(..n);
        Ok(n)
    }
}

#[tokio::test]
async fn stalled_error_body_times_out() {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    std::thread::spawn(move || {
        let Ok(mut request) = server.recv() else {
            return;
        };
        let mut sink = Vec::new();
        let _ = request.as_reader().read_to_end(&mut sink);

        // Large enough that the status line and headers leave the server
        // before the stall.
        let pad = "x".repeat(256 * 1024);
        let head = format!(r#"{{"detail": "Transcription failed", "pad": "{pad}"#).into_bytes();
        let tail = br#""}"#.to_vec();
        let length = head.len() + tail.len();
        let body = StallingBody {
            head,
            tail,
            stall: Duration::from_millis(2000),
            stalled: false,
        };
        let header =
            tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
        let response =
            tiny_http::Response::new(tiny_http::StatusCode(500), vec![header], body, Some(length), None);
        let _ = request.respond(response);
    });

    let limit = Duration::from_millis(500);
    let client = HttpTransport::new(format!("http://127.0.0.1:{port}"), limit).unwrap();
    let input = NormalizedInput::Text("deck".to_string());

    let err = client.generate_slides(&input).await.unwrap_err();
    assert_eq!(err, TransportError::Timeout { after: limit });
}

#[tokio::test]
async fn refused_connection_is_network() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = transport(&format!("http://127.0.0.1:{port}"));
    let input = NormalizedInput::Text("deck".to_string());

    let err = client.generate_slides(&input).await.unwrap_err();
    assert!(matches!(err, TransportError::Network(_)));
}

#[tokio::test]
async fn service_info_and_transcription() {
    let (base, server) = serve(vec![
        Canned::json(200, r#"{"message": "SlideSynth API"}"#),
        Canned::json(200, r#"{"transcription": "we help farmers"}"#),
    ]);
    let client = transport(&format!("{base}/"));

    let info = client.service_info().await.unwrap();
    assert_eq!(info.message, "SlideSynth API");

    let file = FileHandle::new("memo.wav", "audio/wav", b"RIFF".to_vec());
    let text = client.transcribe(&file).await.unwrap();
    assert_eq!(text, "we help farmers");

    let seen = server.join().unwrap();
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].url, "/");
    assert_eq!(seen[1].url, "/transcribe");
    assert!(seen[1].body.contains(r#"name="file""#));
}
