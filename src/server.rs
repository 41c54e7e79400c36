//! HTTP JSON API server
//!
//! Serves the learning API on the configured address until the handle is
//! stopped. Every handler shares one SQLite connection behind a mutex and one
//! generation service.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;

use crate::db::Database;
use crate::generation::{GenerationService, TextGenerator};
use crate::handlers::{self, ApiError};

/// State shared across requests
pub struct AppState {
    db: Mutex<Database>,
    pub generation: GenerationService<Arc<dyn TextGenerator>>,
}

impl AppState {
    pub fn new(db: Database, generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            db: Mutex::new(db),
            generation: GenerationService::new(generator),
        }
    }

    /// Lock the database. Never hold the guard across an `.await`.
    pub fn db(&self) -> Result<MutexGuard<'_, Database>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("Database lock poisoned".to_string()))
    }
}

/// Build the API router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/signin", post(handlers::auth::signin))
        .route("/api/me", get(handlers::auth::me).patch(handlers::auth::update_me))
        .route(
            "/api/subjects",
            get(handlers::catalog::list_subjects).post(handlers::catalog::create_subject),
        )
        .route("/api/teacher/subjects", get(handlers::catalog::teacher_subjects))
        .route(
            "/api/subjects/{id}/lessons",
            get(handlers::catalog::list_lessons).post(handlers::catalog::create_lesson),
        )
        .route(
            "/api/lessons/{id}/materials",
            get(handlers::catalog::list_materials).post(handlers::catalog::create_material),
        )
        .route("/api/lessons/{id}/quizzes", get(handlers::quizzes::list_quizzes))
        .route("/api/quizzes/{id}/questions", get(handlers::quizzes::list_questions))
        .route("/api/quizzes/{id}/attempts", post(handlers::quizzes::submit_attempt))
        .route("/api/lessons/{id}/flashcards", get(handlers::quizzes::list_flashcards))
        .route(
            "/api/lessons/{id}/review-items",
            get(handlers::review::list_items).post(handlers::review::create_item),
        )
        .route("/api/lessons/{id}/review-items/due", get(handlers::review::due_items))
        .route("/api/review-items/{id}/responses", post(handlers::review::respond))
        .route("/api/progress", get(handlers::review::list_progress))
        .route("/api/lessons/{id}/progress", put(handlers::review::update_progress))
        .route("/api/lessons/{id}/generate", post(handlers::generation::generate))
        .route(
            "/api/lessons/{id}/generate-from-document",
            post(handlers::generation::generate_from_document),
        )
        .route("/api/ai", post(handlers::generation::generate_raw))
        .route(
            "/api/melcs",
            get(handlers::catalog::list_melcs).post(handlers::catalog::create_melc),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handle for a running server
pub struct ServerHandle {
    /// Address the server is listening on
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the server gracefully.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Stop the server and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Err(e) = self.task.await {
            log::error!("Server task failed: {}", e);
        }
    }
}

/// Bind `bind` and serve the API in a background task.
pub async fn start_server(bind: &str, state: Arc<AppState>) -> std::io::Result<ServerHandle> {
    let app = router(state);

    let listener = TcpListener::bind(bind).await?;
    let addr = listener.local_addr()?;
    log::info!("Aralin server listening on http://{}", addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                log::info!("Aralin server shutting down");
            })
            .await;
        if let Err(e) = result {
            log::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::service::tests::{StubGenerator, FLASHCARD_REPLY, QUIZ_REPLY};
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        state: Arc<AppState>,
    }

    impl TestApp {
        fn new(reply: &str) -> Self {
            let db = Database::open_in_memory().unwrap();
            let generator: Arc<dyn TextGenerator> = Arc::new(StubGenerator::replying(reply));
            let state = Arc::new(AppState::new(db, generator));
            Self {
                router: router(Arc::clone(&state)),
                state,
            }
        }

        async fn call(&self, method: Method, uri: &str, user: Option<&Value>, body: Option<Value>) -> (StatusCode, Value) {
            let mut request = Request::builder().method(method).uri(uri);
            if let Some(user) = user {
                request = request.header("X-User-Id", user["id"].as_str().unwrap());
            }
            let request = match body {
                Some(body) => request
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => request.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn signup(&self, username: &str, role: &str) -> Value {
            let (status, user) = self
                .call(
                    Method::POST,
                    "/api/auth/signup",
                    None,
                    Some(json!({
                        "username": username,
                        "password": "pa55word",
                        "fullName": username,
                        "role": role,
                        "gradeLevel": 7
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{}", user);
            user
        }

        /// A teacher with one Science subject (grades 7 and 8) and one lesson
        async fn classroom(&self) -> (Value, Value) {
            let teacher = self.signup("teacher", "teacher").await;
            let (status, subject) = self
                .call(
                    Method::POST,
                    "/api/subjects",
                    Some(&teacher),
                    Some(json!({"name": "Science", "suitableGrades": [7, 8]})),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{}", subject);

            let (status, lesson) = self
                .call(
                    Method::POST,
                    &format!("/api/subjects/{}/lessons", subject["id"].as_str().unwrap()),
                    Some(&teacher),
                    Some(json!({"title": "Photosynthesis"})),
                )
                .await;
            assert_eq!(status, StatusCode::OK, "{}", lesson);
            (teacher, lesson)
        }
    }

    #[tokio::test]
    async fn test_signup_signin_and_me() {
        let app = TestApp::new(QUIZ_REPLY);
        let user = app.signup("maria", "student").await;
        assert_eq!(user["role"], "student");
        assert!(user.get("password").is_none());

        let (status, _) = app
            .call(
                Method::POST,
                "/api/auth/signin",
                None,
                Some(json!({"username": "maria", "password": "wrong"})),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, signed_in) = app
            .call(
                Method::POST,
                "/api/auth/signin",
                None,
                Some(json!({"username": "maria", "password": "pa55word"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(signed_in["id"], user["id"]);

        let (status, me) = app.call(Method::GET, "/api/me", Some(&user), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["username"], "maria");

        let (status, updated) = app
            .call(Method::PATCH, "/api/me", Some(&user), Some(json!({"fullName": "Maria Cruz"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["fullName"], "Maria Cruz");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_signins_and_password_change() {
        let app = TestApp::new(QUIZ_REPLY);
        let user = app.signup("ana", "student").await;
        let signin = |password: &'static str| {
            app.call(
                Method::POST,
                "/api/auth/signin",
                None,
                Some(json!({"username": "ana", "password": password})),
            )
        };

        let (first, second, wrong, me) = tokio::join!(
            signin("pa55word"),
            signin("pa55word"),
            signin("nope"),
            app.call(Method::GET, "/api/me", Some(&user), None),
        );
        assert_eq!(first.0, StatusCode::OK);
        assert_eq!(second.0, StatusCode::OK);
        assert_eq!(wrong.0, StatusCode::UNAUTHORIZED);
        assert_eq!(me.0, StatusCode::OK);

        let (status, _) = app
            .call(Method::PATCH, "/api/me", Some(&user), Some(json!({"password": "changed"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(signin("changed").await.0, StatusCode::OK);
        assert_eq!(signin("pa55word").await.0, StatusCode::UNAUTHORIZED);

        let (status, _) = app
            .call(Method::PATCH, "/api/me", Some(&user), Some(json!({"password": ""})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_signup_conflicts() {
        let app = TestApp::new(QUIZ_REPLY);
        app.signup("juan", "student").await;
        let (status, body) = app
            .call(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(json!({"username": "juan", "password": "x", "fullName": "J", "role": "student"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_requests_need_a_session() {
        let app = TestApp::new(QUIZ_REPLY);
        let (status, _) = app.call(Method::GET, "/api/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let stranger = json!({"id": uuid::Uuid::new_v4().to_string()});
        let (status, _) = app.call(Method::GET, "/api/me", Some(&stranger), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_students_cannot_create_subjects() {
        let app = TestApp::new(QUIZ_REPLY);
        let student = app.signup("pedro", "student").await;
        let (status, _) = app
            .call(
                Method::POST,
                "/api/subjects",
                Some(&student),
                Some(json!({"name": "Math", "suitableGrades": [7]})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_subjects_filtered_by_grade() {
        let app = TestApp::new(QUIZ_REPLY);
        let (teacher, _) = app.classroom().await;

        let (_, grade7) = app.call(Method::GET, "/api/subjects?grade=7", Some(&teacher), None).await;
        assert_eq!(grade7.as_array().unwrap().len(), 1);
        let (_, grade3) = app.call(Method::GET, "/api/subjects?grade=3", Some(&teacher), None).await;
        assert!(grade3.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_quiz_and_take_it() {
        let app = TestApp::new(QUIZ_REPLY);
        let (teacher, lesson) = app.classroom().await;
        let lesson_id = lesson["id"].as_str().unwrap();

        let (status, generated) = app
            .call(
                Method::POST,
                &format!("/api/lessons/{}/generate", lesson_id),
                Some(&teacher),
                Some(json!({"kind": "quiz", "count": 2})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", generated);
        assert_eq!(generated["kind"], "quiz");
        assert_eq!(generated["items"].as_array().unwrap().len(), 2);
        assert!(generated["rawJson"].as_str().unwrap().starts_with('['));
        let quiz_id = generated["quizId"].as_str().unwrap().to_string();

        // The content is archived
        let archived = app
            .state
            .db()
            .unwrap()
            .generated_content_for_lesson(uuid::Uuid::parse_str(lesson_id).unwrap())
            .unwrap();
        assert_eq!(archived.len(), 1);

        let (_, questions) = app
            .call(Method::GET, &format!("/api/quizzes/{}/questions", quiz_id), Some(&teacher), None)
            .await;
        assert_eq!(questions[0]["correctAnswer"], "4");

        let student = app.signup("ana", "student").await;
        let (status, result) = app
            .call(
                Method::POST,
                &format!("/api/quizzes/{}/attempts", quiz_id),
                Some(&student),
                Some(json!({"answers": ["4", "8"]})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["score"], 1);
        assert_eq!(result["total"], 2);
    }

    #[tokio::test]
    async fn test_generate_flashcards() {
        let app = TestApp::new(FLASHCARD_REPLY);
        let (teacher, lesson) = app.classroom().await;
        let lesson_id = lesson["id"].as_str().unwrap();

        let (status, generated) = app
            .call(
                Method::POST,
                &format!("/api/lessons/{}/generate", lesson_id),
                Some(&teacher),
                Some(json!({"kind": "flashcards", "count": 1, "gradeLevel": 8})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", generated);
        assert!(generated.get("quizId").is_none());

        let (_, cards) = app
            .call(Method::GET, &format!("/api/lessons/{}/flashcards", lesson_id), Some(&teacher), None)
            .await;
        assert_eq!(cards[0]["answer"], "Manila");
    }

    #[tokio::test]
    async fn test_invalid_model_output_is_unprocessable() {
        let app = TestApp::new("I cannot help with that.");
        let (teacher, lesson) = app.classroom().await;

        let (status, body) = app
            .call(
                Method::POST,
                &format!("/api/lessons/{}/generate", lesson["id"].as_str().unwrap()),
                Some(&teacher),
                Some(json!({"kind": "quiz", "count": 2})),
            )
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "No valid JSON array found in response");
    }

    #[tokio::test]
    async fn test_raw_generation_endpoint() {
        let app = TestApp::new(QUIZ_REPLY);
        let teacher = app.signup("teacher", "teacher").await;
        let (status, body) = app
            .call(Method::POST, "/api/ai", Some(&teacher), Some(json!({"prompt": "anything"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["success"], true);
        assert!(body["result"].as_str().unwrap().starts_with('['));
    }

    #[tokio::test]
    async fn test_review_flow() {
        let app = TestApp::new(QUIZ_REPLY);
        let (teacher, lesson) = app.classroom().await;
        let lesson_id = lesson["id"].as_str().unwrap();

        let (status, item) = app
            .call(
                Method::POST,
                &format!("/api/lessons/{}/review-items", lesson_id),
                Some(&teacher),
                Some(json!({"question": "Organelle for photosynthesis?", "answer": "Chloroplast"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", item);

        let student = app.signup("lito", "student").await;
        let due_uri = format!("/api/lessons/{}/review-items/due", lesson_id);
        let (_, due) = app.call(Method::GET, &due_uri, Some(&student), None).await;
        assert_eq!(due.as_array().unwrap().len(), 1);

        let respond_uri = format!("/api/review-items/{}/responses", item["id"].as_str().unwrap());
        let (status, _) = app
            .call(Method::POST, &respond_uri, Some(&student), Some(json!({"quality": 9})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, record) = app
            .call(Method::POST, &respond_uri, Some(&student), Some(json!({"quality": 2})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["intervalDays"], 1);

        // Due again tomorrow, so nothing is due now
        let (_, due) = app.call(Method::GET, &due_uri, Some(&student), None).await;
        assert!(due.as_array().unwrap().is_empty());

        let unknown = format!("/api/review-items/{}/responses", uuid::Uuid::new_v4());
        let (status, _) = app
            .call(Method::POST, &unknown, Some(&student), Some(json!({"quality": 4})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_progress() {
        let app = TestApp::new(QUIZ_REPLY);
        let (_, lesson) = app.classroom().await;
        let student = app.signup("rosa", "student").await;

        let (status, _) = app
            .call(
                Method::PUT,
                &format!("/api/lessons/{}/progress", lesson["id"].as_str().unwrap()),
                Some(&student),
                Some(json!({"status": "completed"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, progress) = app.call(Method::GET, "/api/progress", Some(&student), None).await;
        assert_eq!(progress[0]["status"], "completed");
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let db = Database::open_in_memory().unwrap();
        let generator: Arc<dyn TextGenerator> = Arc::new(StubGenerator::replying(QUIZ_REPLY));
        let handle = start_server("127.0.0.1:0", Arc::new(AppState::new(db, generator)))
            .await
            .unwrap();
        assert_ne!(handle.addr.port(), 0);
        assert!(handle.base_url().starts_with("http://127.0.0.1:"));
        handle.shutdown().await;
    }
}
