use reqwest::Client;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::feedback::{AnswerEvaluation, MAX_FEEDBACK_ITEMS};
use crate::models::question::{GeneratedQuestion, DEFAULT_CATEGORY};
use crate::models::session::Difficulty;
use crate::utils::llm_json::parse_lenient;

const GENERATION_MAX_TOKENS: u32 = 512;
const EVALUATION_MAX_TOKENS: u32 = 768;
const TEMPERATURE: f32 = 0.7;
const MIN_DURATION_SECONDS: i64 = 30;
const MAX_DURATION_SECONDS: i64 = 1800;

const QUESTION_SYSTEM_PROMPT: &str = r#"You are an expert technical interviewer.
Generate interview questions that focus on practical, real-world scenarios and technical depth appropriate for the candidate level.

Return ONLY valid JSON with this exact structure:
{
  "questions": [
    {"question": "<question text>", "category": "<short topic tag>", "duration_seconds": <suggested answer time in seconds>}
  ]
}

Do not include any explanation, markdown, or text outside the JSON."#;

const EVALUATION_SYSTEM_PROMPT: &str = r#"You are a senior technical interviewer evaluating a candidate's answer.
Be constructive, specific, and fair. Score based on technical accuracy, clarity, and completeness.

Return ONLY valid JSON with this exact structure:
{
  "score": <integer 0-100>,
  "overall_feedback": "<2-3 sentences of constructive feedback>",
  "strengths": ["<specific strength 1>", "<specific strength 2>"],
  "improvements": ["<specific area to improve 1>", "<specific area to improve 2>"]
}"#;

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    r#type: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat<'a>,
}

/// Proxy to an OpenAI-compatible chat-completion API.
#[derive(Clone)]
pub struct AIService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl AIService {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            api_key: config.llm_api_key.clone(),
            base_url: config.llm_base_url.clone(),
            model: config.llm_model.clone(),
            timeout: Duration::from_secs(config.llm_timeout_secs),
        }
    }

    /// Per-request deadline for the upstream call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn generate_questions(
        &self,
        role: &str,
        difficulty: Difficulty,
        count: usize,
    ) -> Result<Vec<GeneratedQuestion>> {
        tracing::info!(role, %difficulty, count, "generating interview questions");
        let user_prompt = format!(
            "Role: {role}\nCandidate level: {difficulty}\nGenerate exactly {count} interview questions for a {difficulty} level {role} candidate."
        );
        let content = self
            .chat(QUESTION_SYSTEM_PROMPT, user_prompt, GENERATION_MAX_TOKENS)
            .await?;
        let questions = parse_generated_questions(&content, count, difficulty)?;
        tracing::info!(generated = questions.len(), "questions generated");
        Ok(questions)
    }

    pub async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        role: &str,
        difficulty: Difficulty,
    ) -> Result<AnswerEvaluation> {
        tracing::info!(role, %difficulty, answer_chars = answer.chars().count(), "evaluating answer");
        let user_prompt = format!(
            "Role: {role}\nCandidate level: {difficulty}\n\nQuestion: {question}\n\nCandidate's Answer: {answer}"
        );
        let content = self
            .chat(EVALUATION_SYSTEM_PROMPT, user_prompt, EVALUATION_MAX_TOKENS)
            .await?;
        parse_evaluation(&content)
    }

    /// Sends one chat completion and returns the raw message content.
    async fn chat(&self, system: &str, user: String, max_tokens: u32) -> Result<String> {
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system.to_string(),
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens,
            response_format: ResponseFormat {
                r#type: "json_object",
            },
        };

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            tracing::warn!(%status, body = %text, "LLM API returned an error");
            return Err(Error::AiUnavailable(format!("upstream returned {}", status)));
        }

        let body: JsonValue = res.json().await.map_err(|e| {
            if e.is_timeout() {
                transport_error(e)
            } else {
                Error::AiResponse(format!("response body is not JSON: {}", e))
            }
        })?;

        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| Error::AiResponse("missing choices[0].message.content".into()))
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout("AI service did not respond in time".into())
    } else {
        Error::AiUnavailable(err.to_string())
    }
}

pub fn parse_generated_questions(
    content: &str,
    count: usize,
    difficulty: Difficulty,
) -> Result<Vec<GeneratedQuestion>> {
    let raw: JsonValue = parse_lenient(content)
        .map_err(|e| Error::AiResponse(format!("question generation: {}", e)))?;

    let entries = match raw.get("questions").and_then(|q| q.as_array()) {
        Some(arr) => arr.as_slice(),
        None => raw.as_array().map(Vec::as_slice).unwrap_or_default(),
    };

    let mut questions: Vec<GeneratedQuestion> = entries
        .iter()
        .filter_map(|entry| coerce_question(entry, difficulty))
        .collect();

    if questions.len() < count {
        return Err(Error::AiResponse(
            "AI did not return the expected number of questions.".into(),
        ));
    }
    questions.truncate(count);
    Ok(questions)
}

fn coerce_question(entry: &JsonValue, difficulty: Difficulty) -> Option<GeneratedQuestion> {
    let (text, category, duration) = match entry {
        JsonValue::String(s) => (s.as_str(), None, None),
        JsonValue::Object(obj) => {
            let text = ["question", "text", "prompt"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(|v| v.as_str()))?;
            let category = ["category", "topic"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(|v| v.as_str()));
            let duration = ["duration_seconds", "suggested_duration_seconds", "duration"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(as_number));
            (text, category, duration)
        }
        _ => return None,
    };

    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let category = category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CATEGORY)
        .to_lowercase();

    let suggested_duration_seconds = duration
        .map(|d| (d.round() as i64).clamp(MIN_DURATION_SECONDS, MAX_DURATION_SECONDS) as i32)
        .unwrap_or_else(|| difficulty.default_duration_seconds());

    Some(GeneratedQuestion {
        text: text.to_string(),
        category,
        suggested_duration_seconds,
    })
}

pub fn parse_evaluation(content: &str) -> Result<AnswerEvaluation> {
    let raw: JsonValue = parse_lenient(content)
        .map_err(|e| Error::AiResponse(format!("answer evaluation: {}", e)))?;

    let required = ["score", "overall_feedback", "strengths", "improvements"];
    if !required.iter().all(|k| raw.get(*k).is_some()) {
        return Err(Error::AiResponse(
            "AI response missing required feedback fields.".into(),
        ));
    }

    let score = as_number(&raw["score"])
        .ok_or_else(|| Error::AiResponse("score is not a number".into()))?;
    let overall_feedback = match &raw["overall_feedback"] {
        JsonValue::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };

    Ok(AnswerEvaluation {
        score: score.round().clamp(0.0, 100.0) as i32,
        overall_feedback,
        strengths: string_list(&raw["strengths"]),
        improvements: string_list(&raw["improvements"]),
    })
}

fn as_number(v: &JsonValue) -> Option<f64> {
    match v {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_list(v: &JsonValue) -> Vec<String> {
    let items: Vec<&str> = match v {
        JsonValue::Array(arr) => arr.iter().filter_map(|x| x.as_str()).collect(),
        JsonValue::String(s) => vec![s.as_str()],
        _ => vec![],
    };
    items
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(MAX_FEEDBACK_ITEMS)
        .map(str::to_string)
        .collect()
}
