use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use serde_json::Value;

pub const STUB_MODEL: &str = "stub-model";
pub const STUB_API_KEY: &str = "test-key";

pub const SUMMARY_REPLY: &str = "# Stub summary\n- key point\n";
pub const BANK_REPLY: &str =
    "### What is deep work?\n**Answer** Focused work.\n**Explanation** The summary says so.\n";
pub const QUIZ_REPLY: &str = "```json\n[{\"Q\":\"What is deep work?\",\"A\":\"Focused work.\"},{\"Q\":\"Is shallow work easy?\",\"A\":\"Yes.\"}]\n```";

/// Local stand-in for the `generateContent` endpoint.
pub struct GeminiStub {
    pub base_url: String,
    prompts: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl GeminiStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start gemini stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}/v1beta");
        let expected_path = format!("/v1beta/models/{STUB_MODEL}:generateContent");

        let prompts = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&prompts);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                if request.method() != &tiny_http::Method::Post || request.url() != expected_path {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                }

                let api_key = request
                    .headers()
                    .iter()
                    .find(|h| h.field.equiv("x-goog-api-key"))
                    .map(|h| h.value.as_str().to_owned())
                    .unwrap_or_default();
                if api_key != STUB_API_KEY {
                    let body = serde_json::json!({
                        "error": {
                            "code": 400,
                            "message": "API key not valid. Please pass a valid API key.",
                            "status": "INVALID_ARGUMENT"
                        }
                    });
                    let _ = request.respond(json_response(body, 400));
                    continue;
                }

                let mut body = String::new();
                if request.as_reader().read_to_string(&mut body).is_err() {
                    let _ = request.respond(
                        tiny_http::Response::from_string("invalid request body")
                            .with_status_code(400),
                    );
                    continue;
                }

                let prompt = serde_json::from_str::<Value>(&body)
                    .ok()
                    .and_then(|v| {
                        v.pointer("/contents/0/parts/0/text")
                            .and_then(|t| t.as_str())
                            .map(str::to_owned)
                    });
                let Some(prompt) = prompt else {
                    let _ = request.respond(
                        tiny_http::Response::from_string("missing contents").with_status_code(400),
                    );
                    continue;
                };

                let reply = reply_for(&prompt);
                seen.lock().expect("lock prompts").push(prompt);

                let body = serde_json::json!({
                    "candidates": [{
                        "content": {
                            "role": "model",
                            "parts": [ { "text": reply } ]
                        },
                        "finishReason": "STOP"
                    }],
                    "modelVersion": STUB_MODEL
                });
                let _ = request.respond(json_response(body, 200));
            }
        });

        Self {
            base_url,
            prompts,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    #[allow(dead_code)]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("lock prompts").clone()
    }
}

impl Drop for GeminiStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn reply_for(prompt: &str) -> &'static str {
    if prompt.contains("[Markdown]") {
        QUIZ_REPLY
    } else if prompt.contains("**Explanation**") {
        BANK_REPLY
    } else {
        SUMMARY_REPLY
    }
}

fn json_response(body: Value, status: u16) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let header = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .expect("build header");
    tiny_http::Response::from_string(body.to_string())
        .with_status_code(status)
        .with_header(header)
}
