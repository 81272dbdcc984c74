//! OpenRouter chat-completions client (OpenAI-compatible wire shape).

use serde::{Deserialize, Serialize};

const API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub struct Client {
    api_key: String,
    referer: String,
    title: String,
    http: reqwest::Client,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy)]
pub enum Role {
    System,
    User,
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ApiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl Client {
    pub fn new(api_key: String, referer: String, title: String) -> Self {
        Self {
            api_key,
            referer,
            title,
            http: reqwest::Client::new(),
        }
    }

    /// Send one completion request and return the first choice's content.
    ///
    /// A well-formed response with no choices or null content yields an
    /// empty string; callers decide what an empty completion means.
    pub async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, Error> {
        let api_messages: Vec<ApiMessage> = messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::System => "system",
                    Role::User => "user",
                },
                content: m.content.clone(),
            })
            .collect();

        let request = ApiRequest {
            model,
            messages: api_messages,
            temperature,
            max_tokens,
        };

        let response = self
            .http
            .post(API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(extract_content(api_response))
    }
}

fn extract_content(response: ApiResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default()
}

#[derive(Debug)]
pub enum Error {
    Http(String),
    Api(String),
    Parse(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ApiResponse {
        serde_json::from_str(raw).expect("response should deserialize")
    }

    #[test]
    fn test_extract_content() {
        let response = parse(
            r#"{"choices":[{"message":{"role":"assistant","content":"Исправленный текст"}}]}"#,
        );
        assert_eq!(extract_content(response), "Исправленный текст");
    }

    #[test]
    fn test_extract_first_choice_only() {
        let response = parse(
            r#"{"choices":[{"message":{"content":"first"}},{"message":{"content":"second"}}]}"#,
        );
        assert_eq!(extract_content(response), "first");
    }

    #[test]
    fn test_extract_no_choices() {
        let response = parse(r#"{"choices":[]}"#);
        assert_eq!(extract_content(response), "");
    }

    #[test]
    fn test_extract_missing_choices_field() {
        let response = parse(r#"{"id":"gen-123"}"#);
        assert_eq!(extract_content(response), "");
    }

    #[test]
    fn test_extract_null_content() {
        let response = parse(r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#);
        assert_eq!(extract_content(response), "");
    }

    #[test]
    fn test_request_serialization() {
        let request = ApiRequest {
            model: "deepseek/deepseek-chat",
            messages: vec![
                ApiMessage { role: "system", content: "prompt".to_string() },
                ApiMessage { role: "user", content: "text".to_string() },
            ],
            temperature: 0.2,
            max_tokens: 512,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "deepseek/deepseek-chat");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["max_tokens"], 512);
    }
}
