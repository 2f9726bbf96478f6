use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::prompts;
use super::provider::TrendProvider;
use crate::error::{AppError, Result};
use crate::models::{distinct_trends, PostDraft, TrendAnalysis, TrendKeyword};

pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";

const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const TREND_MAX_TOKENS: u32 = 1024;
const POST_MAX_TOKENS: u32 = 4096;

static CODE_FENCE: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    system: Option<String>,
    messages: Vec<Message>,
    tools: Vec<Tool>,
    tool_choice: ToolChoice,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct TrendsPayload {
    trends: Vec<RawTrend>,
}

#[derive(Debug, Deserialize)]
struct RawTrend {
    keyword: String,
    score: f64,
}

/// Anthropic Messages API adapter. The required JSON shape is enforced by
/// forcing the model to call a single tool whose input schema is that shape.
pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    niche: String,
}

impl ClaudeProvider {
    pub fn new(api_key: String, niche: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            api_key,
            base_url: DEFAULT_API_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            niche,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    async fn request_structured(
        &self,
        context: &str,
        system: String,
        prompt: String,
        tool: &str,
        schema: Value,
        max_tokens: u32,
    ) -> Result<Value> {
        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens,
            system: Some(system),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            tools: vec![Tool {
                name: tool.to_string(),
                description: format!("Return the {} as structured JSON.", context),
                input_schema: schema,
            }],
            tool_choice: ToolChoice {
                choice_type: "tool".to_string(),
                name: tool.to_string(),
            },
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, MESSAGES_PATH))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::provider(context, e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::provider(
                context,
                format!("API error {}: {}", status, error_text),
            ));
        }

        let message_response: MessageResponse = response
            .json()
            .await
            .map_err(|e| AppError::provider(context, format!("unreadable response: {}", e)))?;

        extract_structured(message_response, tool, context)
    }
}

#[async_trait]
impl TrendProvider for ClaudeProvider {
    async fn analyze_trends(&self) -> Result<TrendAnalysis> {
        let context = "trend analysis";
        let value = self
            .request_structured(
                context,
                prompts::trend_system_prompt(&self.niche),
                prompts::trend_prompt(&self.niche),
                prompts::TREND_TOOL,
                prompts::trends_schema(),
                TREND_MAX_TOKENS,
            )
            .await?;

        let payload: TrendsPayload = serde_json::from_value(value).map_err(|e| {
            AppError::provider(context, format!("response does not match trend shape: {}", e))
        })?;

        let trends = distinct_trends(
            payload
                .trends
                .into_iter()
                .filter(|t| t.score.is_finite())
                .map(|t| TrendKeyword::new(t.keyword, t.score)),
        );

        if trends.is_empty() {
            return Err(AppError::provider(context, "no trend keywords returned"));
        }

        tracing::debug!("Trend analysis returned {} keywords", trends.len());

        Ok(TrendAnalysis {
            date: Utc::now().date_naive(),
            trends,
        })
    }

    async fn generate_post(&self, topic: &str, trends: &[TrendKeyword]) -> Result<PostDraft> {
        let context = format!("post for topic '{}'", topic);
        let value = self
            .request_structured(
                &context,
                prompts::post_system_prompt(&self.niche),
                prompts::post_prompt(topic, trends),
                prompts::POST_TOOL,
                prompts::post_schema(),
                POST_MAX_TOKENS,
            )
            .await?;

        let draft: PostDraft = serde_json::from_value(value).map_err(|e| {
            AppError::provider(&context, format!("response does not match post shape: {}", e))
        })?;

        if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
            return Err(AppError::provider(&context, "title or content is empty"));
        }

        Ok(draft)
    }

    fn model_version(&self) -> &str {
        &self.model
    }
}

fn extract_structured(response: MessageResponse, tool: &str, context: &str) -> Result<Value> {
    let mut text = String::new();
    for block in response.content {
        match block {
            ContentBlock::ToolUse { name, input } if name == tool => {
                if input.as_object().is_some_and(|o| !o.is_empty()) {
                    return Ok(input);
                }
            }
            ContentBlock::Text { text: t } => text.push_str(&t),
            _ => {}
        }
    }

    let body = strip_code_fence(&text);
    if body.is_empty() {
        return Err(AppError::provider(context, "empty response"));
    }

    serde_json::from_str(body)
        .map_err(|e| AppError::provider(context, format!("response is not valid JSON: {}", e)))
}

/// Models sometimes wrap JSON in a Markdown code block despite instructions.
fn strip_code_fence(text: &str) -> &str {
    let fence = CODE_FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").expect("valid code fence regex")
    });
    match fence.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> ClaudeProvider {
        ClaudeProvider::new("test-key".to_string(), "home goods".to_string())
            .with_base_url(&format!("{}/", server.uri()))
    }

    fn tool_response(name: &str, input: Value) -> Value {
        json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "tool_use", "id": "toolu_1", "name": name, "input": input }],
            "stop_reason": "tool_use"
        })
    }

    #[tokio::test]
    async fn analyze_trends_forces_tool_and_clamps_scores() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "test-key"))
            .and(body_partial_json(json!({
                "tool_choice": { "type": "tool", "name": "report_trends" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_response(
                "report_trends",
                json!({ "trends": [
                    { "keyword": " linen bedding ", "score": 120 },
                    { "keyword": "", "score": 50 },
                    { "keyword": "rattan", "score": 40.5 }
                ]}),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let analysis = provider_for(&server).analyze_trends().await.unwrap();

        assert_eq!(analysis.date, Utc::now().date_naive());
        assert_eq!(
            analysis.trends,
            vec![
                TrendKeyword::new("linen bedding", 100.0),
                TrendKeyword::new("rattan", 40.5)
            ]
        );
    }

    #[tokio::test]
    async fn repeated_trend_keywords_are_merged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_response(
                "report_trends",
                json!({ "trends": [
                    { "keyword": "linen", "score": 55 },
                    { "keyword": "rattan", "score": 30 },
                    { "keyword": "Linen", "score": 80 },
                    { "keyword": " linen ", "score": 20 }
                ]}),
            )))
            .mount(&server)
            .await;

        let analysis = provider_for(&server).analyze_trends().await.unwrap();

        assert_eq!(
            analysis.trends,
            vec![TrendKeyword::new("linen", 80.0), TrendKeyword::new("rattan", 30.0)]
        );
    }

    #[tokio::test]
    async fn generate_post_reads_fenced_text_fallback() {
        let server = MockServer::start().await;
        let draft = json!({
            "title": "Linen 101",
            "excerpt": "Why linen",
            "content": "Long body",
            "metaTitle": "Linen 101",
            "metaDescription": "All about linen",
            "tags": ["linen"],
            "readTime": 4
        });
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "text", "text": format!("```json\n{}\n```", draft) }]
            })))
            .mount(&server)
            .await;

        let post = provider_for(&server)
            .generate_post("Linen care", &[])
            .await
            .unwrap();

        assert_eq!(post.title, "Linen 101");
        assert_eq!(post.tags, vec!["linen".to_string()]);
        assert_eq!(post.read_time, 4.0);
    }

    #[tokio::test]
    async fn empty_response_is_a_provider_error_naming_the_topic() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .generate_post("Gift ideas under $50", &[])
            .await
            .unwrap_err();

        match err {
            AppError::Provider(message) => {
                assert!(message.contains("Gift ideas under $50"), "{}", message);
                assert!(message.contains("empty response"), "{}", message);
            }
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn post_missing_schema_fields_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_response(
                "write_blog_post",
                json!({ "title": "Linen 101", "excerpt": "Why linen", "content": "Long body" }),
            )))
            .mount(&server)
            .await;

        let err = provider_for(&server)
            .generate_post("Linen care", &[])
            .await
            .unwrap_err();

        assert!(
            matches!(err, AppError::Provider(ref m) if m.contains("Linen care") && m.contains("post shape")),
            "{:?}",
            err
        );
    }

    #[tokio::test]
    async fn wrong_shape_and_http_errors_are_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "tool_choice": { "name": "report_trends" } })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(tool_response("report_trends", json!({ "keywords": [] }))),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "tool_choice": { "name": "write_blog_post" } })))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let provider = provider_for(&server);

        let err = provider.analyze_trends().await.unwrap_err();
        assert!(matches!(err, AppError::Provider(ref m) if m.contains("trend shape")));

        let err = provider.generate_post("Desk setups", &[]).await.unwrap_err();
        assert!(
            matches!(err, AppError::Provider(ref m) if m.contains("Desk setups") && m.contains("overloaded"))
        );
    }

    #[test]
    fn strip_code_fence_handles_plain_and_fenced_text() {
        assert_eq!(strip_code_fence("  {\"a\":1} \n"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n[]\n```\n"), "[]");
    }
}
