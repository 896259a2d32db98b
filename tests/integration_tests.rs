use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use zimer_chat::app::{App, ChatOutcome, SEND_FAILED_APOLOGY};
use zimer_chat::backend::{BackendError, ChatBackend};
use zimer_chat::config::ChatConfig;
use zimer_chat::event::{AppEvent, Event};
use zimer_chat::store::{Sender, SEED_GREETING};

/// Minimal HTTP/1.1 stub standing in for the chat service. Answers every
/// request with the given status line and body, and forwards the raw
/// request text for assertions.
async fn spawn_stub(
    status_line: &'static str,
    body: &'static str,
) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (request_tx, request_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let request_tx = request_tx.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let _ = request_tx.send(request);

                let response = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (format!("http://{addr}"), request_rx)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = vec![0u8; 8192];
    let mut read = 0;
    loop {
        let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        read += n;
        let text = String::from_utf8_lossy(&buf[..read]).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text
                .lines()
                .find_map(|line| {
                    line.to_ascii_lowercase()
                        .strip_prefix("content-length:")
                        .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                })
                .unwrap_or(0);
            if read >= header_end + 4 + content_length {
                return text;
            }
        }
    }
    String::from_utf8_lossy(&buf[..read]).to_string()
}

/// The app's startup health probe also hits the stub; skip past anything
/// that is not a chat POST.
async fn next_chat_request(requests: &mut mpsc::UnboundedReceiver<String>) -> String {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let request = requests.recv().await.unwrap();
            if request.starts_with("POST /chat/ ") {
                return request;
            }
        }
    })
    .await
    .expect("no chat request reached the stub")
}

fn no_pending_chat_requests(requests: &mut mpsc::UnboundedReceiver<String>) -> bool {
    while let Ok(request) = requests.try_recv() {
        if request.starts_with("POST /chat/ ") {
            return false;
        }
    }
    true
}

/// Drains the app's event channel until the request task posts its
/// outcome, skipping ticks and other noise.
async fn wait_for_reply(app: &mut App) -> ChatOutcome {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Event::App(AppEvent::ReplyReceived(outcome)) = app.events.next().await.unwrap() {
                return outcome;
            }
        }
    })
    .await
    .expect("request task never posted an outcome")
}

fn app_for(backend_url: &str) -> App {
    App::new(ChatConfig {
        backend_url: backend_url.to_string(),
        ..ChatConfig::default()
    })
}

#[tokio::test]
async fn ask_decodes_a_primary_answer() {
    let (url, mut requests) = spawn_stub(
        "HTTP/1.1 200 OK",
        r#"{"response":"خوش آمدید","source":"faq"}"#,
    )
    .await;

    let backend = ChatBackend::new(url, None);
    let reply = backend.ask("سلام").await.unwrap();

    assert_eq!(reply.response, "خوش آمدید");
    assert_eq!(reply.source, "faq");
    assert!(!reply.is_fallback());

    let request = requests.recv().await.unwrap();
    assert!(request.starts_with("POST /chat/ "));
    assert!(request.to_ascii_lowercase().contains("content-type: application/json"));
    assert!(request.ends_with(r#"{"message":"سلام"}"#));
}

#[tokio::test]
async fn ask_surfaces_non_2xx_statuses_as_errors() {
    let (url, _requests) = spawn_stub(
        "HTTP/1.1 500 Internal Server Error",
        r#"{"detail":"Internal server error"}"#,
    )
    .await;

    let backend = ChatBackend::new(url, None);
    match backend.ask("سلام").await {
        Err(BackendError::Status(status)) => assert_eq!(status.as_u16(), 500),
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn ask_surfaces_malformed_bodies_as_errors() {
    let (url, _requests) = spawn_stub("HTTP/1.1 200 OK", "not json at all").await;

    let backend = ChatBackend::new(url, None);
    assert!(matches!(
        backend.ask("سلام").await,
        Err(BackendError::Decode(_))
    ));
}

#[tokio::test]
async fn ask_surfaces_connection_failures_as_errors() {
    // Bind and immediately drop a listener so the port is known-dead.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = ChatBackend::new(format!("http://{addr}"), None);
    assert!(matches!(
        backend.ask("سلام").await,
        Err(BackendError::Http(_))
    ));
}

#[tokio::test]
async fn health_probe_reports_a_live_backend() {
    let (url, _requests) = spawn_stub(
        "HTTP/1.1 200 OK",
        r#"{"status":"healthy","message":"Chat service is running"}"#,
    )
    .await;

    let backend = ChatBackend::new(url, None);
    assert!(backend.health().await);
}

#[tokio::test]
async fn health_probe_reports_a_dead_backend() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = ChatBackend::new(format!("http://{addr}"), None);
    assert!(!backend.health().await);
}

#[tokio::test]
async fn submitting_a_message_round_trips_through_the_store() {
    let (url, _requests) = spawn_stub(
        "HTTP/1.1 200 OK",
        r#"{"response":"خوش آمدید","source":"faq"}"#,
    )
    .await;

    let mut app = app_for(&url);
    app.store.seed_greeting();

    app.input.push_str("سلام");
    app.submit_message();
    assert!(app.store.is_loading());
    assert!(app.input.is_empty());

    let outcome = wait_for_reply(&mut app).await;
    app.apply_outcome(outcome);

    let messages = app.store.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].text, SEED_GREETING);
    assert_eq!(messages[1].text, "سلام");
    assert_eq!(messages[1].sender, Sender::User);
    assert_eq!(messages[2].text, "خوش آمدید");
    assert_eq!(messages[2].sender, Sender::Bot);
    assert!(!messages[2].is_fallback);
    assert!(!app.store.is_loading());
}

#[tokio::test]
async fn fallback_answers_are_flagged_end_to_end() {
    let (url, _requests) = spawn_stub(
        "HTTP/1.1 200 OK",
        r#"{"response":"متوجه منظورتون نشدم","source":"fallback"}"#,
    )
    .await;

    let mut app = app_for(&url);
    app.input.push_str("یک پرسش عجیب");
    app.submit_message();

    let outcome = wait_for_reply(&mut app).await;
    app.apply_outcome(outcome);

    let last = app.store.messages().last().unwrap();
    assert!(last.is_fallback);
    assert!(!app.store.is_loading());
}

#[tokio::test]
async fn a_failing_backend_turns_into_the_apology_message() {
    let (url, _requests) = spawn_stub(
        "HTTP/1.1 500 Internal Server Error",
        r#"{"detail":"Internal server error"}"#,
    )
    .await;

    let mut app = app_for(&url);
    app.store.seed_greeting();
    app.input.push_str("سلام");
    app.submit_message();

    let outcome = wait_for_reply(&mut app).await;
    assert_eq!(outcome, ChatOutcome::Failed);
    app.apply_outcome(outcome);

    let last = app.store.messages().last().unwrap();
    assert_eq!(last.text, SEND_FAILED_APOLOGY);
    assert_eq!(last.sender, Sender::Bot);
    assert!(last.is_fallback);
    assert!(!app.store.is_loading());
}

#[tokio::test]
async fn a_second_submit_while_loading_sends_nothing() {
    let (url, mut requests) = spawn_stub(
        "HTTP/1.1 200 OK",
        r#"{"response":"خوش آمدید","source":"faq"}"#,
    )
    .await;

    let mut app = app_for(&url);
    app.input.push_str("اولی");
    app.submit_message();

    app.input.push_str("دومی");
    app.submit_message();

    let outcome = wait_for_reply(&mut app).await;
    app.apply_outcome(outcome);

    // One user message, one reply; the second submit never left the app.
    let messages = app.store.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "اولی");
    assert_eq!(app.input, "دومی");

    let first = next_chat_request(&mut requests).await;
    assert!(first.contains("اولی"));
    assert!(
        no_pending_chat_requests(&mut requests),
        "only one request should have been issued"
    );
}

#[tokio::test]
async fn opening_the_panel_with_auto_greet_issues_one_silent_request() {
    let (url, mut requests) = spawn_stub(
        "HTTP/1.1 200 OK",
        r#"{"response":"خوش آمدید","source":"faq"}"#,
    )
    .await;

    let mut app = App::new(ChatConfig {
        backend_url: url,
        auto_greet: true,
        ..ChatConfig::default()
    });
    app.store.seed_greeting();

    app.handle_app_event(AppEvent::ToggleChat);
    assert!(app.store.is_open());
    assert!(!app.store.is_loading(), "greeting must not raise the loading flag");

    let greeting = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Event::App(event @ AppEvent::GreetingReceived(..)) = app.events.next().await.unwrap() {
                return event;
            }
        }
    })
    .await
    .expect("greeting reply never arrived");
    app.handle_app_event(greeting);

    let messages = app.store.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, "خوش آمدید");
    assert_eq!(messages[1].sender, Sender::Bot);

    let request = next_chat_request(&mut requests).await;
    assert!(request.ends_with(r#"{"message":"سلام"}"#));

    // Re-opening the panel does not greet again.
    app.handle_app_event(AppEvent::ToggleChat);
    app.handle_app_event(AppEvent::ToggleChat);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(no_pending_chat_requests(&mut requests));
}
