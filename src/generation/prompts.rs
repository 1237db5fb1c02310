// src/generation/prompts.rs

use serde_json::{Value, json};

use crate::{adaptive::aggregate::ChatMetrics, models::question::Difficulty};

/// Response schema for single-question structured output.
pub fn question_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "question": { "type": "STRING" },
            "options": { "type": "ARRAY", "items": { "type": "STRING" } },
            "correct_index": { "type": "INTEGER" },
            "correct_answer_text": { "type": "STRING" },
            "explanation": { "type": "STRING" },
            "subtopic": { "type": "STRING" }
        },
        "required": ["question", "options", "correct_index", "correct_answer_text", "explanation"]
    })
}

pub fn single_question(
    category: &str,
    topic: &str,
    difficulty: Difficulty,
    previous: &[String],
) -> String {
    let verbal_note = if category.eq_ignore_ascii_case("verbal") {
        "Use simple language suitable for interview-level verbal ability questions (short sentences)."
    } else {
        ""
    };

    format!(
        r#"You generate one clear multiple-choice aptitude question for interviews.
Category: {category}
Topic: {topic}
Difficulty: {difficulty}

Return a single JSON object with the fields:
question, options (exactly 4 plain strings), correct_index (0-3),
correct_answer_text (the correct option exactly as written in options),
explanation (1-3 short sentences) and subtopic.

Constraints:
- Provide exactly 4 options without "A)" style labels.
- Make sure correct_index matches the correct option.
- Keep the question and options concise and suitable for a live interview.
- For Reasoning, keep puzzles solvable within 30-45 seconds for easy and 60-90 seconds for medium or hard.
- Do not repeat any of these questions: {previous:?}

{verbal_note}"#
    )
}

pub fn question_batch(
    question_type: &str,
    difficulty: &str,
    topics: &[String],
    count: u32,
) -> String {
    let topics = if topics.is_empty() {
        "any topic within the category".to_string()
    } else {
        topics.join(", ")
    };

    format!(
        r#"You are an expert aptitude test question generator.

Generate exactly {count} multiple-choice questions of {difficulty} difficulty
from the "{question_type}" category, strictly based on these topics: {topics}.
Each question must be unique, logically valid and suited to the difficulty.

Format each question exactly as follows, with no numbering or markdown:

Q: <question text>
A) <option A>
B) <option B>
C) <option C>
D) <option D>
Answer: <correct option letter>
Explanation: <short explanation>

Example:
Q: What is the value of x if 2x + 3 = 9?
A) 2
B) 3
C) 4
D) 5
Answer: B
Explanation: 2x = 6, so x = 3."#
    )
}

pub fn technical_question(skills: &str, previous: &[String]) -> String {
    format!(
        r#"Based on the following resume skills:
{skills}

Generate exactly one relevant technical interview question for the candidate.
Pick either a short conceptual question about one of the skills (for example
"What is polymorphism in Java?") or a simple programming task in one of the
candidate's languages (for example "Write a Python program to check if a
number is an Armstrong number.").
Do not repeat any of these questions: {previous:?}
Output only the question text on one line, with no greeting or explanation."#
    )
}

pub fn evaluation(question: &str, answer: &str) -> String {
    format!(
        r#"You are a human interviewer running a mock technical interview.

Interview Question: {question}
Candidate's Answer: {answer}

If the candidate asks for the answer, give only the correct answer.
If the candidate asks to skip, acknowledge briefly and move on.
Otherwise give short, natural feedback on the answer.

Respond in exactly this format:
Feedback: <one or two sentences>
Score: <integer from 1 to 10>"#
    )
}

pub fn session_summary(transcript: &str, metrics: &ChatMetrics, score_percent: f64) -> String {
    format!(
        r#"Based on the following interview conversation between bot and user:

{transcript}

Evaluate only the technical questions. Summarize the candidate's performance
strictly in the following format, one line each:

1. Strengths: <one concise sentence>
2. Weakness: <one concise sentence>
3. Areas for Improvement: <one concise sentence>
4. Number of Questions Attended: {attended}
5. Number of Correct Answers: {correct}
6. Number of Wrong Answers: {wrong}
7. Score out of 100: {score_percent}

Output only the evaluation in the format above."#,
        attended = metrics.attended,
        correct = metrics.correct,
        wrong = metrics.wrong,
    )
}

pub fn resume_analysis(text: &str) -> String {
    format!(
        r#"You are a resume parser. Extract the following details from the resume and
return them in exactly this format:

Job Role: <job role>
Skills: Programming Languages: <languages>
        Frameworks: <frameworks>
        Database: <databases>
        Technologies/Tools: <tools>
        Soft Skills: <soft skills>
Qualifications: Education: <degrees, institutions, CGPA/percentage>
                Certifications: <certifications>

Resume Content:
{text}

Do not add any extra text or explanation."#
    )
}
