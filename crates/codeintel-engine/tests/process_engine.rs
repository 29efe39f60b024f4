//! ProcessEngine tests against an in-memory engine.

use codeintel_engine::transport::{read_message, write_message, WireRequest};
use codeintel_engine::{
    EngineClient, EngineError, EngineEvent, EngineRequest, EngineResponse, EventTopic,
    Preferences, ProcessEngine, RequestContext,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{BufReader, DuplexStream};

/// Engine side of a pair of pipes.
struct FakeEngine {
    input: BufReader<DuplexStream>,
    output: DuplexStream,
}

impl FakeEngine {
    async fn next_request(&mut self) -> Option<WireRequest> {
        let content = read_message(&mut self.input).await.ok()??;
        serde_json::from_str(&content).ok()
    }

    async fn reply(&mut self, value: serde_json::Value) {
        write_message(&mut self.output, &value.to_string())
            .await
            .expect("write reply");
    }

    async fn handshake(&mut self) {
        let init = self.next_request().await.expect("initialize request");
        assert_eq!(init.method, "initialize");
        self.reply(json!({"id": init.id, "result": {"languages": ["Python", "PHP"]}}))
            .await;
    }
}

fn pipes() -> (BufReader<DuplexStream>, DuplexStream, FakeEngine) {
    let (client_out, engine_in) = tokio::io::duplex(64 * 1024);
    let (engine_out, client_in) = tokio::io::duplex(64 * 1024);
    (
        BufReader::new(client_in),
        client_out,
        FakeEngine {
            input: BufReader::new(engine_in),
            output: engine_out,
        },
    )
}

fn request(context: RequestContext) -> EngineRequest {
    EngineRequest {
        language: "Python".to_string(),
        path: "/tmp/a.py".to_string(),
        text: "os.".to_string(),
        cursor_byte_pos: 3,
        preferences: Preferences::default(),
        context,
    }
}

#[tokio::test]
async fn test_handshake_reports_languages() {
    let (reader, writer, mut fake) = pipes();
    let engine_task = tokio::spawn(async move {
        fake.handshake().await;
        fake
    });

    let engine = ProcessEngine::connect(reader, writer).await.unwrap();
    let _fake = engine_task.await.unwrap();

    assert!(engine.is_available());
    let languages = engine.languages();
    assert!(languages.contains("Python"));
    assert!(languages.contains("PHP"));
}

#[tokio::test]
async fn test_out_of_order_responses_reach_their_requests() {
    let (reader, writer, mut fake) = pipes();
    let engine_task = tokio::spawn(async move {
        fake.handshake().await;
        let first = fake.next_request().await.unwrap();
        let second = fake.next_request().await.unwrap();
        // Answer the later request first.
        fake.reply(json!({"id": second.id, "result": {"kind": "callTip", "text": "join(a, b)"}}))
            .await;
        fake.reply(json!({"id": first.id, "result": {"kind": "none"}}))
            .await;
        fake
    });

    let engine = ProcessEngine::connect(reader, writer).await.unwrap();
    let (first, second) = tokio::join!(
        engine.submit(request(RequestContext::Scan)),
        engine.submit(request(RequestContext::Trigger)),
    );
    let _fake = engine_task.await.unwrap();

    let mut responses = vec![first.unwrap(), second.unwrap()];
    responses.sort_by_key(|r| matches!(r, EngineResponse::None));
    assert_eq!(
        responses,
        vec![
            EngineResponse::CallTip {
                text: "join(a, b)".to_string()
            },
            EngineResponse::None
        ]
    );
}

#[tokio::test]
async fn test_events_are_broadcast() {
    let (reader, writer, mut fake) = pipes();
    let engine_task = tokio::spawn(async move {
        fake.handshake().await;
        fake
    });
    let engine = ProcessEngine::connect(reader, writer).await.unwrap();
    let mut fake = engine_task.await.unwrap();

    let mut events = engine.subscribe();
    fake.reply(json!({"topic": "progress", "progress": 2, "total": 10, "message": "Scanning"}))
        .await;

    let event = events.recv().await.unwrap();
    assert_eq!(event.topic, EventTopic::Progress);
    assert_eq!(event, EngineEvent::progress(2, Some(10)).with_message("Scanning"));
}

#[tokio::test]
async fn test_engine_error_reply() {
    let (reader, writer, mut fake) = pipes();
    let engine_task = tokio::spawn(async move {
        fake.handshake().await;
        let req = fake.next_request().await.unwrap();
        fake.reply(json!({"id": req.id, "error": {"message": "no such language"}}))
            .await;
        fake
    });
    let engine = ProcessEngine::connect(reader, writer).await.unwrap();
    let err = engine.submit(request(RequestContext::Trigger)).await.unwrap_err();
    let _fake = engine_task.await.unwrap();

    assert!(matches!(err, EngineError::RequestFailed(_)));
    assert!(engine.is_available());
}

#[tokio::test]
async fn test_engine_exit_fails_pending_and_marks_unavailable() {
    let (reader, writer, mut fake) = pipes();
    let engine_task = tokio::spawn(async move {
        fake.handshake().await;
        // Read the request, then go away without answering.
        let _ = fake.next_request().await;
        drop(fake);
    });
    let engine = ProcessEngine::connect(reader, writer).await.unwrap();
    let err = engine.submit(request(RequestContext::Trigger)).await.unwrap_err();
    engine_task.await.unwrap();

    assert!(matches!(err, EngineError::Closed));
    assert!(!engine.is_available());
    let again = engine.submit(request(RequestContext::Trigger)).await.unwrap_err();
    assert!(matches!(again, EngineError::Unavailable));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_requests_racing_engine_exit_never_hang() {
    let (reader, writer, mut fake) = pipes();
    let engine_task = tokio::spawn(async move {
        fake.handshake().await;
        fake
    });
    let engine = Arc::new(ProcessEngine::connect(reader, writer).await.unwrap());
    let FakeEngine { input, output } = engine_task.await.unwrap();

    let submits: Vec<_> = (0..32)
        .map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.submit(request(RequestContext::Trigger)).await })
        })
        .collect();
    // The engine stops answering but still accepts input.
    drop(output);

    for submit in submits {
        let result = tokio::time::timeout(Duration::from_secs(5), submit)
            .await
            .expect("request left waiting after engine exit")
            .unwrap();
        assert!(matches!(
            result,
            Err(EngineError::Closed) | Err(EngineError::Unavailable)
        ));
    }
    assert!(!engine.is_available());
    drop(input);
}

#[tokio::test]
async fn test_close_makes_engine_unavailable() {
    let (reader, writer, mut fake) = pipes();
    let engine_task = tokio::spawn(async move {
        fake.handshake().await;
        fake
    });
    let engine = ProcessEngine::connect(reader, writer).await.unwrap();
    let _fake = engine_task.await.unwrap();

    engine.close().await.unwrap();
    assert!(!engine.is_available());
}
