use crate::error::{Error, Result};
use crate::http::HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

/// LLM provider — determines API format and endpoint.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenRouter,
    /// Any OpenAI-compatible API.
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }

    fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One block of a conversation message, in the Anthropic wire shape.
/// Tool results always travel in a `User` message, tool calls in an
/// `Assistant` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        is_error: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

/// A tool the model may call, described by a JSON schema.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

#[derive(Debug)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: StopReason,
    pub usage: Usage,
}

pub struct LlmClient {
    provider: Provider,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
    http: HttpClient,
}

// -- Anthropic format --

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [ConversationMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDef]>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Usage,
}

/// Permissive block decoder: unknown block types map to nothing.
#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
    id: Option<String>,
    name: Option<String>,
    input: Option<Value>,
}

// -- OpenAI-compatible format --

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<OpenAiToolCall>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunctionCall,
}

#[derive(Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl LlmClient {
    pub fn new(
        provider: Provider,
        api_key: String,
        model: String,
        max_tokens: u32,
        base_url: Option<String>,
    ) -> Result<Self> {
        let http = HttpClient::new("uc-steward/0.1.0")?;
        let base_url = base_url.unwrap_or_else(|| provider.default_base_url().into());
        Ok(Self {
            provider,
            api_key,
            model,
            max_tokens,
            base_url,
            http,
        })
    }

    /// Build from config, reading the API key from the specified env var.
    pub fn from_config(
        provider: Provider,
        model: String,
        max_tokens: u32,
        api_key_env: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let env_var = api_key_env.unwrap_or_else(|| provider.default_api_key_env().into());
        let api_key = std::env::var(&env_var).unwrap_or_default();
        Self::new(provider, api_key, model, max_tokens, base_url)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single-shot completion: one user message, no tools, text out.
    pub async fn complete(&self, system: &str, user_message: &str) -> Result<String> {
        let messages = [ConversationMessage {
            role: Role::User,
            content: vec![ContentBlock::Text {
                text: user_message.to_string(),
            }],
        }];
        let response = self.converse(system, &messages, &[]).await?;
        let text: Vec<String> = response
            .content
            .into_iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text),
                _ => None,
            })
            .collect();
        if text.is_empty() {
            return Err(Error::parse("empty response from LLM"));
        }
        Ok(text.join("\n"))
    }

    /// Send a prompt and parse the response as JSON, stripping markdown fences if present.
    pub async fn complete_json<T: serde::de::DeserializeOwned>(
        &self,
        system: &str,
        user_message: &str,
    ) -> Result<T> {
        let text = self.complete(system, user_message).await?;
        let json_str = extract_json(&text);
        serde_json::from_str(json_str)
            .map_err(|e| Error::parse(format!("parse LLM JSON: {e}\nraw: {text}")))
    }

    /// One round of a multi-turn tool-use conversation.
    pub async fn converse(
        &self,
        system: &str,
        messages: &[ConversationMessage],
        tools: &[ToolDef],
    ) -> Result<LlmResponse> {
        debug!(provider = ?self.provider, model = %self.model, turns = messages.len(), "sending LLM request");

        match self.provider {
            Provider::Anthropic => self.converse_anthropic(system, messages, tools).await,
            Provider::OpenRouter | Provider::OpenAi => {
                self.converse_openai(system, messages, tools).await
            }
        }
    }

    async fn converse_anthropic(
        &self,
        system: &str,
        messages: &[ConversationMessage],
        tools: &[ToolDef],
    ) -> Result<LlmResponse> {
        let request = AnthropicRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages,
            tools: if tools.is_empty() { None } else { Some(tools) },
        };

        let body = serde_json::to_string(&request)
            .map_err(|e| Error::parse(format!("serialize request: {e}")))?;

        let url = format!("{}/messages", self.base_url);
        let response_text = self
            .http
            .post_json_raw(
                &url,
                &body,
                &[
                    ("x-api-key", &self.api_key),
                    ("anthropic-version", "2023-06-01"),
                ],
            )
            .await
            .map_err(|e| {
                warn!("Anthropic API error: {e}");
                e
            })?;

        let resp: AnthropicResponse = serde_json::from_str(&response_text)
            .map_err(|e| Error::parse(format!("parse Anthropic response: {e}")))?;

        let content: Vec<ContentBlock> = resp
            .content
            .into_iter()
            .filter_map(|b| match b.block_type.as_str() {
                "text" => b.text.map(|text| ContentBlock::Text { text }),
                "tool_use" => Some(ContentBlock::ToolUse {
                    id: b.id.unwrap_or_default(),
                    name: b.name.unwrap_or_default(),
                    input: b.input.unwrap_or_else(|| json!({})),
                }),
                _ => None,
            })
            .collect();

        let stop_reason = match resp.stop_reason.as_deref() {
            Some("end_turn") => StopReason::EndTurn,
            Some("tool_use") => StopReason::ToolUse,
            Some("max_tokens") => StopReason::MaxTokens,
            _ => StopReason::Other,
        };

        Ok(LlmResponse {
            content,
            stop_reason,
            usage: resp.usage,
        })
    }

    async fn converse_openai(
        &self,
        system: &str,
        messages: &[ConversationMessage],
        tools: &[ToolDef],
    ) -> Result<LlmResponse> {
        let mut request = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": to_openai_messages(system, messages),
        });
        if !tools.is_empty() {
            request["tools"] = Value::Array(tools.iter().map(to_openai_tool).collect());
        }

        let body = serde_json::to_string(&request)
            .map_err(|e| Error::parse(format!("serialize request: {e}")))?;

        let url = format!("{}/chat/completions", self.base_url);
        let response_text = self
            .http
            .post_json_raw(
                &url,
                &body,
                &[("Authorization", &format!("Bearer {}", self.api_key))],
            )
            .await
            .map_err(|e| {
                warn!("LLM API error: {e}");
                e
            })?;

        let resp: OpenAiResponse = serde_json::from_str(&response_text)
            .map_err(|e| Error::parse(format!("parse LLM response: {e}")))?;

        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::parse("empty response from LLM"))?;

        let mut content = Vec::new();
        if let Some(text) = choice.message.content
            && !text.is_empty()
        {
            content.push(ContentBlock::Text { text });
        }
        for call in choice.message.tool_calls {
            let input =
                serde_json::from_str(&call.function.arguments).unwrap_or_else(|_| json!({}));
            content.push(ContentBlock::ToolUse {
                id: call.id,
                name: call.function.name,
                input,
            });
        }

        let stop_reason = match choice.finish_reason.as_deref() {
            Some("stop") => StopReason::EndTurn,
            Some("tool_calls") => StopReason::ToolUse,
            Some("length") => StopReason::MaxTokens,
            _ => StopReason::Other,
        };

        let usage = resp
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(LlmResponse {
            content,
            stop_reason,
            usage,
        })
    }
}

/// Translate the Anthropic-shaped conversation into OpenAI chat messages.
fn to_openai_messages(system: &str, messages: &[ConversationMessage]) -> Vec<Value> {
    let mut out = vec![json!({"role": "system", "content": system})];

    for msg in messages {
        match msg.role {
            Role::Assistant => {
                let text: Vec<&str> = msg
                    .content
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                let tool_calls: Vec<Value> = msg
                    .content
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::ToolUse { id, name, input } => Some(json!({
                            "id": id,
                            "type": "function",
                            "function": {"name": name, "arguments": input.to_string()},
                        })),
                        _ => None,
                    })
                    .collect();

                let mut m = json!({"role": "assistant"});
                m["content"] = if text.is_empty() {
                    Value::Null
                } else {
                    Value::String(text.join("\n"))
                };
                if !tool_calls.is_empty() {
                    m["tool_calls"] = Value::Array(tool_calls);
                }
                out.push(m);
            }
            Role::User => {
                for block in &msg.content {
                    match block {
                        ContentBlock::Text { text } => {
                            out.push(json!({"role": "user", "content": text}));
                        }
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            is_error,
                        } => {
                            let body = if *is_error {
                                format!("ERROR: {content}")
                            } else {
                                content.clone()
                            };
                            out.push(json!({
                                "role": "tool",
                                "tool_call_id": tool_use_id,
                                "content": body,
                            }));
                        }
                        ContentBlock::ToolUse { .. } => {}
                    }
                }
            }
        }
    }

    out
}

fn to_openai_tool(tool: &ToolDef) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.input_schema,
        },
    })
}

/// Rough cost estimate in USD for a single response, by model family.
/// Prices are per million tokens (input, output).
pub fn estimate_cost_usd(usage: &Usage, model: &str) -> f64 {
    let (input_per_m, output_per_m) = if model.contains("opus") {
        (15.0, 75.0)
    } else if model.contains("sonnet") {
        (3.0, 15.0)
    } else if model.contains("haiku") {
        (1.0, 5.0)
    } else if model.contains("nano") {
        (0.1, 0.4)
    } else if model.contains("mini") {
        (0.4, 1.6)
    } else if model.contains("gpt-4") {
        (2.5, 10.0)
    } else {
        (0.5, 1.5)
    };
    (usage.input_tokens as f64 * input_per_m + usage.output_tokens as f64 * output_per_m) / 1e6
}

/// Extract JSON from a response that might be wrapped in markdown code fences.
pub fn extract_json(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let content = &text[start + 7..];
        if let Some(end) = content.find("```") {
            return content[..end].trim();
        }
    }
    if let Some(start) = text.find("```") {
        let content = &text[start + 3..];
        if let Some(end) = content.find("```") {
            let inner = content[..end].trim();
            if inner.starts_with('{') || inner.starts_with('[') {
                return inner;
            }
        }
    }
    if let Some(start) = text.find('{')
        && let Some(end) = text.rfind('}')
    {
        return &text[start..=end];
    }
    text
}
