//! 假的考试服务：axum 监听 127.0.0.1 随机端口，客户端走真实的 HTTP 调用

#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use exam_portal::{ApiGateway, Config, ExamClient, Navigator, Route, SessionStore};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const TOKEN: &str = "tok-123";
pub const PASSWORD: &str = "secret";
pub const EXAM_ID: &str = "42";

type Reply = (StatusCode, Json<Value>);

/// 服务端记录的请求
#[derive(Default)]
pub struct FakeExamApi {
    /// 为 true 时所有需要登录的接口返回 401
    pub revoked: AtomicBool,
    pub logout_fails: AtomicBool,
    pub auth_headers: Mutex<Vec<String>>,
    pub answers: Mutex<Vec<(String, String, String)>>,
    pub cheats: Mutex<Vec<(String, String)>>,
}

impl FakeExamApi {
    fn authorize(&self, headers: &HeaderMap) -> Result<(), Reply> {
        let value = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        self.auth_headers.lock().unwrap().push(value.clone());

        if value == format!("Bearer {}", TOKEN) && !self.revoked.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Unauthenticated." })),
            ))
        }
    }

    pub fn answer_count(&self) -> usize {
        self.answers.lock().unwrap().len()
    }
}

/// 考试 42 的题目：第 1、3 题题干相同，正确答案都是 A
pub fn question_items() -> Vec<Value> {
    let item = |id: u32, stem: &str, a: &str, explanation: Option<&str>| {
        json!({
            "id": id,
            "correct": "A",
            "question": {
                "question_stem": stem,
                "option_a": a,
                "option_b": format!("{} wrong b", id),
                "option_c": format!("{} wrong c", id),
                "option_d": format!("{} wrong d", id),
                "explanation": explanation,
            }
        })
    };

    vec![
        item(1, "What is the capital of France?", "Paris", Some("Paris is the capital.")),
        item(2, "What is 2 + 2?", "4", None),
        item(3, "What is the capital of France?", "Paris", Some("Duplicate stem.")),
        item(4, "Which ocean is the largest?", "Pacific", Some("")),
    ]
}

fn correct_text(question_id: &str) -> Option<String> {
    question_items()
        .into_iter()
        .find(|q| q["id"].to_string() == question_id)
        .and_then(|q| q["question"]["option_a"].as_str().map(str::to_string))
}

async fn login(Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if email == "nobody@example.com" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "User not found" })),
        );
    }
    if email == "silent@example.com" {
        return (StatusCode::OK, Json(json!({ "success": true })));
    }
    if password == PASSWORD {
        (StatusCode::OK, Json(json!({ "token": TOKEN })))
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        )
    }
}

async fn logout(State(api): State<Arc<FakeExamApi>>) -> Reply {
    if api.logout_fails.load(Ordering::SeqCst) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Server Error" })),
        )
    } else {
        (StatusCode::OK, Json(json!({ "success": true })))
    }
}

async fn logo() -> Reply {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": { "logo": "/storage/logo.png", "appName": "Acme Exams" }
        })),
    )
}

async fn exam_detail(State(api): State<Arc<FakeExamApi>>, headers: HeaderMap) -> Reply {
    if let Err(reply) = api.authorize(&headers) {
        return reply;
    }
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "data": [{
                "exam_title": "Safety Induction",
                "description": "Annual safety exam",
                "instruction": "<ol><li>No phones</li><li>No notes</li></ol>",
                "questions": 3,
                "duration": "10",
                "pass_mark": 75,
                "attempt_used": 1,
                "user_exam_id": 42
            }]
        })),
    )
}

async fn questions(
    State(api): State<Arc<FakeExamApi>>,
    Path(exam_id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    if let Err(reply) = api.authorize(&headers) {
        return reply;
    }
    let data = if exam_id == EXAM_ID {
        question_items()
    } else {
        Vec::new()
    };
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

async fn answers(
    State(api): State<Arc<FakeExamApi>>,
    Path(exam_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(reply) = api.authorize(&headers) {
        return reply;
    }
    let question_id = match &body["question_id"] {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let selected = body["selected_option"].as_str().unwrap_or_default().to_string();
    let is_correct = correct_text(&question_id).as_deref() == Some(selected.as_str());

    api.answers
        .lock()
        .unwrap()
        .push((exam_id, question_id, selected));
    (StatusCode::OK, Json(json!({ "is_correct": is_correct })))
}

async fn cheat(
    State(api): State<Arc<FakeExamApi>>,
    Path(exam_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    if let Err(reply) = api.authorize(&headers) {
        return reply;
    }
    let event = body["event"].as_str().unwrap_or_default().to_string();
    api.cheats.lock().unwrap().push((exam_id, event));
    (StatusCode::OK, Json(json!({ "success": true })))
}

async fn result(
    State(api): State<Arc<FakeExamApi>>,
    Path(user_exam_id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    if let Err(reply) = api.authorize(&headers) {
        return reply;
    }
    if user_exam_id != EXAM_ID {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Result not found" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "status": "failed",
            "exam": {
                "title": "Safety Induction",
                "total_questions": 3,
                "scores": "66.67",
                "pass_mark": 75,
                "attempts_used": 1,
                "duration": 10
            },
            "correctCount": 2,
            "user": { "name": "Ada", "company": "Acme", "email": "ada@example.com" }
        })),
    )
}

pub fn router(api: Arc<FakeExamApi>) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/settings/logo", get(logo))
        .route("/api/exam/detail", get(exam_detail))
        .route("/api/exam/{id}/question", get(questions))
        .route("/api/exams/{id}/answers", post(answers))
        .route("/api/exam/{id}/cheat", post(cheat))
        .route("/api/exam/{id}/result", get(result))
        .with_state(api)
}

/// 测试环境：假服务 + 真实客户端
pub struct TestApp {
    pub api: Arc<FakeExamApi>,
    pub base_url: String,
    pub store: Arc<SessionStore>,
    pub navigator: Navigator,
    pub client: Arc<ExamClient>,
}

impl TestApp {
    pub fn login_with_token(&self) {
        self.store.set_auth_token(TOKEN).unwrap();
    }
}

pub fn client_for(base_url: &str, store: Arc<SessionStore>, navigator: Navigator) -> ExamClient {
    let config = Config {
        api_base_url: base_url.to_string(),
        request_timeout_secs: 5,
        ..Default::default()
    };
    let gateway = ApiGateway::new(&config, store, navigator).expect("gateway should build");
    ExamClient::new(gateway)
}

pub async fn spawn_app() -> TestApp {
    let api = Arc::new(FakeExamApi::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let base_url = format!("http://127.0.0.1:{}/api", port);

    let app = router(api.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let store = Arc::new(SessionStore::in_memory());
    let navigator = Navigator::new(Route::Login);
    let client = Arc::new(client_for(&base_url, store.clone(), navigator.clone()));

    TestApp {
        api,
        base_url,
        store,
        navigator,
        client,
    }
}
