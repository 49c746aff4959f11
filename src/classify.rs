// content safety checks - openai moderation for text and images

use crate::error::ClassifyError;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MODEL: &str = "omni-moderation-latest";

pub struct Image {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Something that can tell whether content is safe to leave up.
/// Errors mean "couldn't decide", never "unsafe".
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn is_text_safe(&self, content: &str) -> Result<bool, ClassifyError>;

    /// `sensitivity` is 0..=1, higher is stricter.
    async fn is_image_safe(&self, image: &Image, sensitivity: f32) -> Result<bool, ClassifyError>;
}

pub struct OpenAi {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

// what we send
#[derive(Serialize)]
struct Request<'a> {
    model: &'static str,
    input: Input<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Input<'a> {
    Text(&'a str),
    Parts(Vec<Part>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Part {
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// what comes back
#[derive(Deserialize)]
struct Response {
    results: Vec<ModerationResult>,
}

#[derive(Deserialize)]
struct ModerationResult {
    flagged: bool,
    #[serde(default)]
    category_scores: HashMap<String, f64>,
}

impl OpenAi {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ClassifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn moderate(&self, input: Input<'_>) -> Result<ModerationResult, ClassifyError> {
        let request = Request {
            model: MODEL,
            input,
        };

        let response = self
            .client
            .post(format!("{}/moderations", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: Response = response.json().await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or(ClassifyError::EmptyResponse)
    }
}

#[async_trait]
impl Classifier for OpenAi {
    async fn is_text_safe(&self, content: &str) -> Result<bool, ClassifyError> {
        // nothing to look at, don't spend a request on it
        if content.trim().is_empty() {
            return Ok(true);
        }

        let result = self.moderate(Input::Text(content)).await?;
        Ok(!result.flagged)
    }

    async fn is_image_safe(&self, image: &Image, sensitivity: f32) -> Result<bool, ClassifyError> {
        let url = format!(
            "data:{};base64,{}",
            image.content_type,
            STANDARD.encode(&image.bytes)
        );
        let input = Input::Parts(vec![Part::ImageUrl {
            image_url: ImageUrl { url },
        }]);

        let result = self.moderate(input).await?;
        Ok(image_is_safe(result.category_scores.values().copied(), sensitivity))
    }
}

/// Safe unless some category scores above `1 - sensitivity`.
pub fn image_is_safe(scores: impl IntoIterator<Item = f64>, sensitivity: f32) -> bool {
    let cutoff = 1.0 - f64::from(sensitivity.clamp(0.0, 1.0));
    scores.into_iter().all(|score| score <= cutoff)
}
