mod common;

use common::{spawn_app, TestApp, EXAM_ID};
use exam_portal::models::OptionLabel;
use exam_portal::workflow::{
    FinishReason, SessionCommand, SessionCtx, SessionEvent, SessionOutcome, SessionRunner,
};
use exam_portal::{ExamBackend, Route};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Running {
    commands: mpsc::Sender<SessionCommand>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    handle: JoinHandle<SessionOutcome>,
}

impl Running {
    async fn next_event(&mut self) -> SessionEvent {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), self.events.recv())
                .await
                .expect("event should arrive in time")
                .expect("runner should still be alive");
            if !matches!(event, SessionEvent::Tick(_)) {
                return event;
            }
        }
    }

    async fn send(&self, command: SessionCommand) {
        self.commands.send(command).await.unwrap();
    }
}

fn start(app: &TestApp, exam_id: &str) -> Running {
    let backend: Arc<dyn ExamBackend> = app.client.clone();
    let runner = SessionRunner::new(
        backend,
        app.store.clone(),
        app.navigator.clone(),
        Duration::from_secs(1),
    );
    let ctx = SessionCtx::from_store(exam_id, &app.store);

    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(runner.run(ctx, cmd_rx, event_tx));

    Running {
        commands: cmd_tx,
        events: event_rx,
        handle,
    }
}

fn logged_in_app_ready(app: &TestApp) {
    app.login_with_token();
    app.store.set_exam_duration(10).unwrap();
    app.navigator.navigate(Route::ExamQuestions {
        exam_id: EXAM_ID.to_string(),
    });
}

#[tokio::test]
async fn test_session_over_http_reaches_result() {
    let app = spawn_app().await;
    logged_in_app_ready(&app);
    let mut run = start(&app, EXAM_ID);

    let mut stems = HashSet::new();
    let mut total = 0;
    loop {
        match run.next_event().await {
            SessionEvent::Question {
                progress,
                stem,
                options,
                time_left,
            } => {
                assert!(time_left > 0 && time_left <= 600);
                assert_eq!(options.len(), 4);
                assert!(stems.insert(stem));
                total += 1;
                assert_eq!(progress, format!("Q {} of 3", total));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert_eq!(app.store.remaining_time().map(|t| t <= 600), Some(true));

        run.send(SessionCommand::Select(OptionLabel::A)).await;
        run.send(SessionCommand::Submit).await;
        assert_eq!(run.next_event().await, SessionEvent::Selected(OptionLabel::A));
        assert_eq!(run.next_event().await, SessionEvent::Submitting);
        match run.next_event().await {
            SessionEvent::Feedback { headline, .. } => assert_eq!(headline, "✅ Correct!"),
            other => panic!("unexpected event: {:?}", other),
        }

        run.send(SessionCommand::Next).await;
        if total == 3 {
            break;
        }
    }

    let result_route = Route::ExamResult {
        user_exam_id: EXAM_ID.to_string(),
    };
    assert_eq!(
        run.next_event().await,
        SessionEvent::Finished {
            reason: FinishReason::Completed,
            route: result_route.clone(),
        }
    );
    assert!(matches!(
        run.handle.await.unwrap(),
        SessionOutcome::Finished { .. }
    ));

    // 去重后只剩 3 题，提交的是选项文本
    let answers = app.api.answers.lock().unwrap().clone();
    assert_eq!(answers.len(), 3);
    let selected: HashSet<String> = answers.iter().map(|(_, _, s)| s.clone()).collect();
    assert!(selected.contains("Paris"));
    assert!(selected.contains("4"));
    assert!(selected.contains("Pacific"));

    assert_eq!(app.navigator.current(), result_route);
    assert_eq!(app.store.remaining_time(), None);
}

#[tokio::test]
async fn test_missing_explanation_uses_fallback_over_http() {
    let app = spawn_app().await;
    logged_in_app_ready(&app);
    let mut run = start(&app, EXAM_ID);

    for _ in 0..3 {
        let SessionEvent::Question { stem, .. } = run.next_event().await else {
            panic!("question expected");
        };
        run.send(SessionCommand::Select(OptionLabel::B)).await;
        run.send(SessionCommand::Submit).await;
        run.next_event().await;
        run.next_event().await;

        let SessionEvent::Feedback {
            headline,
            explanation,
        } = run.next_event().await
        else {
            panic!("feedback expected");
        };
        assert!(headline.starts_with("❌ Incorrect. Answer: A."));
        match stem.as_str() {
            "What is the capital of France?" => assert_eq!(explanation, "Paris is the capital."),
            _ => assert_eq!(explanation, "No explanation available."),
        }
        run.send(SessionCommand::Next).await;
    }
}

#[tokio::test]
async fn test_resume_from_saved_remaining_time() {
    let app = spawn_app().await;
    logged_in_app_ready(&app);
    app.store.set_remaining_time(45).unwrap();
    let mut run = start(&app, EXAM_ID);

    match run.next_event().await {
        SessionEvent::Question { time_left, .. } => assert_eq!(time_left, 45),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_exam_is_unavailable() {
    let app = spawn_app().await;
    logged_in_app_ready(&app);
    let mut run = start(&app, "7");

    assert!(matches!(
        run.next_event().await,
        SessionEvent::Unavailable(_)
    ));
    assert_eq!(run.handle.await.unwrap(), SessionOutcome::Unavailable);
    assert_eq!(app.store.remaining_time(), None);
}

#[tokio::test]
async fn test_token_revoked_mid_session() {
    let app = spawn_app().await;
    logged_in_app_ready(&app);
    let mut run = start(&app, EXAM_ID);
    assert!(matches!(run.next_event().await, SessionEvent::Question { .. }));

    app.api.revoked.store(true, Ordering::SeqCst);
    run.send(SessionCommand::Select(OptionLabel::C)).await;
    run.send(SessionCommand::Submit).await;

    assert_eq!(run.next_event().await, SessionEvent::Selected(OptionLabel::C));
    assert_eq!(run.next_event().await, SessionEvent::Submitting);
    assert_eq!(run.next_event().await, SessionEvent::SessionExpired);
    assert_eq!(run.handle.await.unwrap(), SessionOutcome::LoggedOut);

    assert_eq!(app.navigator.current(), Route::Login);
    assert_eq!(app.store.auth_token(), None);
    assert_eq!(app.store.exam_duration(), None);
    assert_eq!(app.store.remaining_time(), None);
}
