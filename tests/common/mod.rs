// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use interview_prep::{
    config::Config,
    error::AppError,
    llm_client::{LlmError, Prompt, mock::ScriptedClient},
    routes,
    state::AppState,
    store::MemoryStore,
    utils::{mailer::Mailer, otp::MemoryOtpStore},
};
use serde_json::Value;

pub const QUESTION_REPLY: &str = r#"```json
{
  "question": "What is 12 * 12?",
  "options": ["124", "144", "142", "154"],
  "correct_index": 1,
  "correct_answer_text": "144",
  "explanation": "12 * 12 = 144",
  "subtopic": "Multiplication"
}
```"#;

pub const BATCH_REPLY: &str = "Q: What is 2 + 2?
A) 3
B) 4
C) 5
D) 6
Answer: B
Explanation: 2 + 2 = 4.

Q: What is 10 / 2?
A) 2
B) 4
C) 5
D) 8
Answer: C
Explanation: 10 / 2 = 5.";

pub const SKILLS_REPLY: &str = "Job Role: Backend Developer
Skills: Programming Languages: Rust, Python
        Frameworks: Axum
        Database: PostgreSQL
        Technologies/Tools: Docker
        Soft Skills: Communication
Qualifications: Education: B.Tech
                Certifications: None";

pub const EVALUATION_REPLY: &str = "Feedback: Clear and correct explanation.\nScore: 8";

pub const SUMMARY_REPLY: &str = "1. Strengths: Explains ownership clearly.
2. Weakness: Light on async details.
3. Areas for Improvement: Practice concurrency questions.
4. Number of Questions Attended: 1
5. Number of Correct Answers: 1
6. Number of Wrong Answers: 0
7. Score out of 100: 80";

/// Answers each kind of prompt with a canned reply. Interview questions are
/// numbered so consecutive questions never repeat.
pub fn scripted_llm() -> ScriptedClient {
    let asked = Arc::new(AtomicUsize::new(0));
    ScriptedClient::new(move |prompt: &Prompt| {
        let text = prompt.text.as_str();
        let reply = if text.contains("one clear multiple-choice aptitude question") {
            QUESTION_REPLY.to_string()
        } else if text.contains("aptitude test question generator") {
            BATCH_REPLY.to_string()
        } else if text.contains("You are a resume parser") {
            SKILLS_REPLY.to_string()
        } else if text.contains("Generate exactly one relevant technical interview question") {
            let n = asked.fetch_add(1, Ordering::SeqCst) + 1;
            format!("Question {}: What is ownership in Rust?", n)
        } else if text.contains("running a mock technical interview") {
            EVALUATION_REPLY.to_string()
        } else if text.contains("Summarize the candidate's performance") {
            SUMMARY_REPLY.to_string()
        } else {
            return Err(LlmError::EmptyContent);
        };
        Ok(reply)
    })
}

/// Keeps every OTP it is asked to deliver.
#[derive(Clone, Default)]
pub struct CapturingMailer {
    sent: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl CapturingMailer {
    /// Latest OTP sent to `to` for `purpose`.
    pub fn last_otp(&self, to: &str, purpose: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(email, _, p)| email == to && p == purpose)
            .map(|(_, otp, _)| otp.clone())
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send_otp(&self, to: &str, otp: &str, purpose: &str) -> Result<(), AppError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), otp.to_string(), purpose.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub mailer: CapturingMailer,
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        gemini_api_key: "unused".to_string(),
        gemini_model: "test-model".to_string(),
        llm_timeout_secs: 5,
        redis_url: None,
        otp_ttl_secs: 300,
        smtp: None,
        cors_origins: vec!["http://localhost:5173".to_string()],
        port: 0,
        rust_log: "error".to_string(),
    }
}

/// Spawns the app on a random port with in-process storage and the given generator.
pub async fn spawn_app_with(llm: ScriptedClient) -> TestApp {
    let mailer = CapturingMailer::default();
    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        llm: Arc::new(llm),
        otp: Arc::new(MemoryOtpStore::new()),
        mailer: Arc::new(mailer.clone()),
        config: test_config(),
    };

    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        mailer,
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(scripted_llm()).await
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Signs up through the OTP flow and returns a bearer token.
    pub async fn signup_and_signin(&self, email: &str, password: &str) -> String {
        let response = self
            .client
            .post(self.url("/auth/send-otp"))
            .json(&serde_json::json!({
                "first_name": "Test",
                "last_name": "User",
                "email": email,
                "phone_number": "5550100",
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);

        let otp = self
            .mailer
            .last_otp(email, "signup")
            .expect("signup OTP was not sent");
        let response = self
            .client
            .post(self.url("/auth/verify-otp"))
            .json(&serde_json::json!({ "email": email, "otp": otp }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let response = self
            .client
            .post(self.url("/auth/signin"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 200);

        let body: Value = response.json().await.unwrap();
        body["access_token"]
            .as_str()
            .expect("access_token missing")
            .to_string()
    }

    /// Uploads a plain-text resume so the user has skills on record.
    pub async fn upload_text_resume(&self, token: &str) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(
            b"Jane Doe\nBackend developer. Rust, Python, PostgreSQL.".to_vec(),
        )
        .file_name("resume.txt")
        .mime_str("text/plain")
        .unwrap();
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("description", "Backend roles");

        self.client
            .post(self.url("/upload/"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
