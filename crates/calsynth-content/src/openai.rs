use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use calsynth_core::{OrgPerson, PersonalEventDraft, UserProfile};

use crate::errors::ContentError;
use crate::prompts;
use crate::provider::{
    ContentProvider, PersonalEventsResponse, schema_value, validate_against_schema,
};
use crate::repair::repair_events_value;

const ENDPOINT_VAR: &str = "END_POINT";
const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Client for an OpenAI-compatible chat-completions endpoint with
/// structured (JSON-schema) responses.
pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_retries: u32,
    backoff: Duration,
}

impl OpenAiProvider {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        max_retries: u32,
        backoff: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_retries,
            backoff,
        }
    }

    /// Build a provider from `END_POINT` and `OPENAI_API_KEY`.
    pub fn from_env(
        model: impl Into<String>,
        max_retries: u32,
        backoff: Duration,
    ) -> Result<Self, ContentError> {
        let endpoint = std::env::var(ENDPOINT_VAR)
            .map_err(|_| ContentError::MissingEnv(ENDPOINT_VAR.to_string()))?;
        let api_key = std::env::var(API_KEY_VAR)
            .map_err(|_| ContentError::MissingEnv(API_KEY_VAR.to_string()))?;
        Ok(Self::new(endpoint, api_key, model, max_retries, backoff))
    }

    /// One structured completion, retried on transport errors, 429 and
    /// 5xx with exponential backoff. Other HTTP errors fail immediately:
    /// they indicate a broken request, not a transient condition.
    async fn chat(
        &self,
        prompt: &str,
        schema_name: &str,
        schema: &Value,
    ) -> Result<String, ContentError> {
        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            response_format: ResponseFormat {
                kind: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: schema_name.to_string(),
                    schema: schema.clone(),
                },
            },
        };

        let mut last_error = String::new();
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff * 2_u32.saturating_pow(attempt - 1);
                debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying completion");
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    warn!(attempt, error = %err, "completion transport error");
                    last_error = err.to_string();
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let completion: ChatResponse = response.json().await?;
                let content = completion
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .unwrap_or_default();
                if content.is_empty() {
                    return Err(ContentError::EmptyCompletion(self.model.clone()));
                }
                return Ok(content);
            }

            let body_text = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 || status.is_server_error() {
                warn!(attempt, status = status.as_u16(), "retryable completion failure");
                last_error = format!("status {status}: {body_text}");
                continue;
            }
            return Err(ContentError::Endpoint {
                status: status.as_u16(),
                body: body_text,
            });
        }

        Err(ContentError::RetriesExhausted {
            attempts: self.max_retries + 1,
            last_error,
        })
    }
}

#[async_trait]
impl ContentProvider for OpenAiProvider {
    async fn generate_profile(&self, person: &OrgPerson) -> Result<UserProfile, ContentError> {
        let schema = schema_value::<UserProfile>()?;
        let prompt = prompts::profile_prompt(person);
        let content = self.chat(&prompt, "user_profile", &schema).await?;

        let parsed: Value = serde_json::from_str(&content)?;
        validate_against_schema(&parsed, &schema)?;
        let mut profile: UserProfile = serde_json::from_value(parsed)?;

        // Identity fields are not the model's to invent: keep catalog
        // values so emails stay unique and the org chart resolves.
        profile.personal.name = person.full_name();
        profile.personal.email = person.email.clone();
        profile.professional.team = person.team.clone();
        profile.professional.reports_to = person.reports_to.clone();
        Ok(profile)
    }

    async fn generate_personal_events(
        &self,
        profile: &UserProfile,
        work_schedule: &str,
    ) -> Result<Vec<PersonalEventDraft>, ContentError> {
        let schema = schema_value::<PersonalEventsResponse>()?;
        let prompt = prompts::personal_events_prompt(profile, work_schedule);
        let content = self.chat(&prompt, "personal_events", &schema).await?;

        let mut parsed: Value = serde_json::from_str(&content)?;
        repair_events_value(&mut parsed);
        validate_against_schema(&parsed, &schema)?;
        let response: PersonalEventsResponse = serde_json::from_value(parsed)?;
        Ok(response.personal_events)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat {
    name: String,
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_uses_json_schema_response_format() {
        let body = ChatRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "hello".to_string(),
            }],
            response_format: ResponseFormat {
                kind: "json_schema".to_string(),
                json_schema: JsonSchemaFormat {
                    name: "user_profile".to_string(),
                    schema: serde_json::json!({"type": "object"}),
                },
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["name"], "user_profile");
    }
}
