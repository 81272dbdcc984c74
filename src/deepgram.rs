//! Voice transcription through the Deepgram listen endpoint.
//!
//! Telegram voice notes arrive as OGG Opus; the raw bytes go straight to
//! Deepgram, no local decoding involved.

use serde::Deserialize;
use tracing::debug;

const LISTEN_URL: &str = "https://api.deepgram.com/v1/listen";

pub struct Transcriber {
    api_key: String,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct ListenResponse {
    #[serde(default)]
    results: Option<Results>,
}

#[derive(Deserialize)]
struct Results {
    #[serde(default)]
    channels: Vec<Channel>,
}

#[derive(Deserialize)]
struct Channel {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

impl Transcriber {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http: reqwest::Client::new(),
        }
    }

    /// Transcribe a voice note.
    ///
    /// Returns the first channel's first alternative, which may be empty
    /// when the provider heard nothing usable.
    pub async fn transcribe(&self, audio: Vec<u8>) -> Result<String, Error> {
        debug!("Transcribing {} bytes of audio", audio.len());

        let response = self
            .http
            .post(LISTEN_URL)
            .query(&[("smart_format", "true")])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/ogg")
            .body(audio)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!("{status}: {body}")));
        }

        let listen_response: ListenResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(extract_transcript(listen_response))
    }
}

fn extract_transcript(response: ListenResponse) -> String {
    response
        .results
        .and_then(|r| r.channels.into_iter().next())
        .and_then(|c| c.alternatives.into_iter().next())
        .map(|a| a.transcript)
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
