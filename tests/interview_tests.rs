// tests/interview_tests.rs

mod common;

use common::{SKILLS_REPLY, scripted_llm, spawn_app, spawn_app_with};
use serde_json::Value;

#[tokio::test]
async fn protected_routes_require_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/user/dashboard"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .get(app.url("/mock-interview/"))
        .bearer_auth("not.a.jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn test_aptitude_flow() {
    let app = spawn_app().await;
    let token = app.signup_and_signin("aptitude@example.com", "password123").await;

    // 1. Create a test of two questions
    let response = app
        .client
        .post(app.url("/aptitude/create-test"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "questionType": "Quantitative",
            "difficulty": "easy",
            "totalQuestions": 2,
            "timePerQuestion": 20,
            "topics": ["Arithmetic"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let created: Value = response.json().await.unwrap();
    let test_id = created["testId"].as_str().unwrap().to_string();
    let questions = created["questions"].as_array().unwrap().clone();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0]["questionText"], "What is 2 + 2?");
    assert_eq!(questions[0]["correctAnswer"], "B");

    let submit = |question: &Value, selected: &str, time_taken: u32| {
        serde_json::json!({
            "testId": test_id,
            "questionText": question["questionText"],
            "optionA": question["optionA"],
            "optionB": question["optionB"],
            "optionC": question["optionC"],
            "optionD": question["optionD"],
            "correctAnswer": question["correctAnswer"],
            "explanation": question["explanation"],
            "selectedOption": selected,
            "timeTaken": time_taken
        })
    };

    // 2. Fast correct answer: 9 points, 45% of the 20 available
    let response = app
        .client
        .post(app.url("/aptitude/submit-answer"))
        .bearer_auth(&token)
        .json(&submit(&questions[0], "b", 5))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let result: Value = response.json().await.unwrap();
    assert_eq!(result["isCorrect"], true);
    assert_eq!(result["score"], 9);
    assert_eq!(result["totalScore"], 45.0);

    // 3. The same question again does not count twice
    let response = app
        .client
        .post(app.url("/aptitude/submit-answer"))
        .bearer_auth(&token)
        .json(&submit(&questions[0], "B", 1))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let result: Value = response.json().await.unwrap();
    assert_eq!(result["totalScore"], 45.0);

    // 4. Slow wrong answer: ratio 0.75 scores 2
    let response = app
        .client
        .post(app.url("/aptitude/submit-answer"))
        .bearer_auth(&token)
        .json(&submit(&questions[1], "A", 15))
        .send()
        .await
        .unwrap();
    let result: Value = response.json().await.unwrap();
    assert_eq!(result["isCorrect"], false);
    assert_eq!(result["score"], 2);
    assert_eq!(result["totalScore"], 55.0);

    // 5. Complete, then completing again is a conflict
    let response = app
        .client
        .post(app.url(&format!("/aptitude/complete-test/{}", test_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let completed: Value = response.json().await.unwrap();
    assert_eq!(completed["aptitudeScore"], 55.0);
    assert_eq!(completed["overallScore"], 55.0);

    let response = app
        .client
        .post(app.url(&format!("/aptitude/complete-test/{}", test_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = app
        .client
        .post(app.url("/aptitude/submit-answer"))
        .bearer_auth(&token)
        .json(&submit(&questions[1], "C", 3))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // 6. Dashboard reflects exactly one aptitude session
    let response = app
        .client
        .get(app.url("/user/dashboard"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let dashboard: Value = response.json().await.unwrap();
    assert_eq!(dashboard["total_interviews"], 1);
    assert_eq!(dashboard["aptitude_interview"], 1);
    assert_eq!(dashboard["technical_interview"], 0);
    assert_eq!(dashboard["aptitude_scores"], serde_json::json!([55.0]));
    assert_eq!(dashboard["overall_score"], 55.0);
    assert_eq!(dashboard["recent_history"][0]["interview_type"], "Aptitude");
}

#[tokio::test]
async fn aptitude_answers_are_scored_against_generated_questions() {
    let app = spawn_app().await;
    let token = app.signup_and_signin("answer_key@example.com", "password123").await;

    let created: Value = app
        .client
        .post(app.url("/aptitude/create-test"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "questionType": "Quantitative",
            "difficulty": "easy",
            "totalQuestions": 2,
            "timePerQuestion": 20
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let test_id = created["testId"].as_str().unwrap().to_string();

    // Questions that were never generated for this test are refused
    for i in 0..5 {
        let response = app
            .client
            .post(app.url("/aptitude/submit-answer"))
            .bearer_auth(&token)
            .json(&serde_json::json!({
                "testId": test_id,
                "questionText": format!("Invented question {}", i),
                "optionA": "x",
                "optionB": "y",
                "optionC": "z",
                "optionD": "w",
                "correctAnswer": "A",
                "selectedOption": "A",
                "timeTaken": 0
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }

    // A client-supplied answer key is ignored: "What is 2 + 2?" is B
    let response = app
        .client
        .post(app.url("/aptitude/submit-answer"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "testId": test_id,
            "questionText": "What is 2 + 2?",
            "correctAnswer": "A",
            "selectedOption": "A",
            "timeTaken": 0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let result: Value = response.json().await.unwrap();
    assert_eq!(result["isCorrect"], false);
    assert_eq!(result["score"], 3);

    let completed: Value = app
        .client
        .post(app.url(&format!("/aptitude/complete-test/{}", test_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // 3 of the 20 available points
    assert_eq!(completed["aptitudeScore"], 15.0);
}

#[tokio::test]
async fn complete_unknown_test_is_404() {
    let app = spawn_app().await;
    let token = app.signup_and_signin("unknown_test@example.com", "password123").await;

    let response = app
        .client
        .post(app.url(&format!(
            "/aptitude/complete-test/{}",
            uuid::Uuid::new_v4()
        )))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_mock_interview_flow() {
    let app = spawn_app().await;
    let token = app.signup_and_signin("interview@example.com", "password123").await;

    // No resume yet, so there are no skills to interview on
    let response = app
        .client
        .get(app.url("/mock-interview/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // 1. Upload a resume
    let response = app.upload_text_resume(&token).await;
    assert_eq!(response.status().as_u16(), 200);
    let uploaded: Value = response.json().await.unwrap();
    assert_eq!(uploaded["skills"], SKILLS_REPLY);

    // 2. Start
    let response = app
        .client
        .get(app.url("/mock-interview/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let started: Value = response.json().await.unwrap();
    let session_id = started["sessionId"].as_str().unwrap().to_string();
    let first_question = started["question"].as_str().unwrap().to_string();
    assert!(first_question.contains("ownership"));

    // 3. Answer and get the next question
    let response = app
        .client
        .post(app.url("/mock-interview/evaluate"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "question": first_question,
            "answer": "Every value has a single owner.",
            "sessionId": session_id
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let evaluated: Value = response.json().await.unwrap();
    assert_eq!(evaluated["score"], 8);
    assert_eq!(evaluated["feedback"], "Clear and correct explanation.");
    assert_ne!(evaluated["next_question"], first_question.as_str());

    // 4. Finish
    let response = app
        .client
        .post(app.url("/mock-interview/finish"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "sessionId": session_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let finished: Value = response.json().await.unwrap();
    assert_eq!(finished["overall_score"], 80.0);
    assert_eq!(finished["questions_attended"], 1);
    assert_eq!(finished["strengths"], "Explains ownership clearly.");
    assert_eq!(finished["weaknesses"], "Light on async details.");

    // 5. The session is closed for good
    let response = app
        .client
        .post(app.url("/mock-interview/finish"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "sessionId": session_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let response = app
        .client
        .post(app.url("/mock-interview/evaluate"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "question": "Late question",
            "answer": "Late answer",
            "sessionId": session_id
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let dashboard: Value = app
        .client
        .get(app.url("/user/dashboard"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["technical_interview"], 1);
    assert_eq!(dashboard["technical_scores"], serde_json::json!([80.0]));
    assert_eq!(dashboard["recent_history"][0]["interview_type"], "Technical");
}

#[tokio::test]
async fn skipped_feedback_scores_zero() {
    let app = spawn_app().await;
    let token = app.signup_and_signin("skip@example.com", "password123").await;
    app.upload_text_resume(&token).await;

    let started: Value = app
        .client
        .get(app.url("/mock-interview/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let response = app
        .client
        .post(app.url("/mock-interview/evaluate"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "question": started["question"],
            "answer": "skip",
            "sessionId": started["sessionId"],
            "skip_feedback": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let evaluated: Value = response.json().await.unwrap();
    assert_eq!(evaluated["score"], 0);
    assert_eq!(evaluated["feedback"], "");
}

#[tokio::test]
async fn failed_follow_up_does_not_record_the_answer() {
    use std::sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    };

    use interview_prep::llm_client::{LlmError, Prompt, mock::ScriptedClient};

    let follow_ups_down = Arc::new(AtomicBool::new(false));
    let scripted = scripted_llm();
    let down = follow_ups_down.clone();
    let llm = ScriptedClient::new(move |prompt: &Prompt| {
        if down.load(Ordering::SeqCst)
            && prompt
                .text
                .contains("Generate exactly one relevant technical interview question")
        {
            return Err(LlmError::EmptyContent);
        }
        scripted.reply(prompt)
    });
    let app = spawn_app_with(llm).await;
    let token = app.signup_and_signin("retry@example.com", "password123").await;
    app.upload_text_resume(&token).await;

    let started: Value = app
        .client
        .get(app.url("/mock-interview/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let answer = serde_json::json!({
        "question": started["question"],
        "answer": "Every value has a single owner.",
        "sessionId": started["sessionId"]
    });

    follow_ups_down.store(true, Ordering::SeqCst);
    let response = app
        .client
        .post(app.url("/mock-interview/evaluate"))
        .bearer_auth(&token)
        .json(&answer)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);

    // The client retries the same answer once generation is back
    follow_ups_down.store(false, Ordering::SeqCst);
    let response = app
        .client
        .post(app.url("/mock-interview/evaluate"))
        .bearer_auth(&token)
        .json(&answer)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let finished: Value = app
        .client
        .post(app.url("/mock-interview/finish"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "sessionId": started["sessionId"] }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(finished["questions_attended"], 1);
}

fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    use std::io::Write;

    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

async fn upload_word(app: &common::TestApp, token: &str, bytes: Vec<u8>) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name("resume.docx")
        .mime_str("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        .unwrap();
    app.client
        .post(app.url("/upload/"))
        .bearer_auth(token)
        .multipart(reqwest::multipart::Form::new().part("file", part))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn word_resume_is_extracted() {
    let app = spawn_app().await;
    let token = app.signup_and_signin("docx@example.com", "password123").await;

    let response = upload_word(
        &app,
        &token,
        docx_bytes(&["Jane Doe", "Backend developer. Rust, PostgreSQL."]),
    )
    .await;
    assert_eq!(response.status().as_u16(), 200);
    let uploaded: Value = response.json().await.unwrap();
    assert_eq!(uploaded["skills"], SKILLS_REPLY);

    let response = upload_word(&app, &token, b"PK\x03\x04 not really a docx".to_vec()).await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_settings_flow() {
    let app = spawn_app().await;
    let token = app.signup_and_signin("settings@example.com", "password123").await;
    app.signup_and_signin("taken@example.com", "password123").await;

    // 1. Update profile
    let response = app
        .client
        .put(app.url("/settings/profile"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "first_name": "  Ada ",
            "last_name": "Lovelace",
            "email": "Ada@Example.com",
            "phone_number": "5550199"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["first_name"], "Ada");
    assert_eq!(body["user"]["email"], "ada@example.com");
    assert!(body["user"].get("password").is_none());

    // 2. Another user's email is refused
    let response = app
        .client
        .put(app.url("/settings/profile"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "taken@example.com",
            "phone_number": ""
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // 3. Change password
    let response = app
        .client
        .post(app.url("/settings/change-password"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "currentPassword": "wrong",
            "newPassword": "newpassword"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .post(app.url("/settings/change-password"))
        .bearer_auth(&token)
        .json(&serde_json::json!({
            "currentPassword": "password123",
            "newPassword": "newpassword"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = app
        .client
        .post(app.url("/auth/signin"))
        .json(&serde_json::json!({ "email": "ada@example.com", "password": "newpassword" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}
