//! Post-game commentary, fetched from a text-generation service when one is
//! configured and made up locally otherwise
use crate::consts;
use crate::game::DeathCause;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A source of short remarks about a finished game
pub(crate) trait Commentator: fmt::Debug + Send + Sync {
    fn generate(&self, score: u32, cause: DeathCause) -> Result<String, CommentaryError>;
}

/// Return the canned comment used when no commentary service is available
/// or it fails to respond in time
pub(crate) fn fallback_comment(score: u32) -> &'static str {
    if score < consts::LOW_SCORE_THRESHOLD {
        "Ouch. The snake deserved better. Try again!"
    } else if score > consts::HIGH_SCORE_THRESHOLD {
        "Outstanding! The arcade bows before you."
    } else {
        "Not bad at all. Keep going!"
    }
}

fn prompt(score: u32, cause: DeathCause) -> String {
    format!(
        "The player just finished a game of Snake.\n\
         Score: {score}.\n\
         Reason for death: {cause}.\n\
         \n\
         Act as a witty, slightly sarcastic, or encouraging arcade machine spirit.\n\
         Write a VERY short, one-sentence comment (max 15 words) about their performance.\n\
         If the score is low (<{low}), roast them gently. If high (>{high}), praise them.",
        low = consts::LOW_SCORE_THRESHOLD,
        high = consts::HIGH_SCORE_THRESHOLD,
    )
}

/// Commentary from the Gemini `generateContent` REST endpoint
pub(crate) struct GeminiCommentator {
    agent: ureq::Agent,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiCommentator {
    pub(crate) fn new(api_key: String, model: String, endpoint: String, timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        GeminiCommentator {
            agent,
            api_key,
            model,
            endpoint,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

impl fmt::Debug for GeminiCommentator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiCommentator")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Commentator for GeminiCommentator {
    fn generate(&self, score: u32, cause: DeathCause) -> Result<String, CommentaryError> {
        let request = serde_json::json!({
            "contents": [{"parts": [{"text": prompt(score, cause)}]}]
        });
        log::debug!("Requesting commentary from {}", self.url());
        let response = self
            .agent
            .post(&self.url())
            .header("x-goog-api-key", &self.api_key)
            .send_json(&request)?
            .body_mut()
            .read_json::<GenerateResponse>()?;
        response.into_text().ok_or(CommentaryError::Empty)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Return the trimmed text of the first candidate, if it has any
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text = content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect::<String>();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_owned())
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Error)]
pub(crate) enum CommentaryError {
    #[error("request to commentary service failed")]
    Request(#[from] ureq::Error),
    #[error("commentary service returned no text")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "Ouch. The snake deserved better. Try again!")]
    #[case(4, "Ouch. The snake deserved better. Try again!")]
    #[case(5, "Not bad at all. Keep going!")]
    #[case(20, "Not bad at all. Keep going!")]
    #[case(21, "Outstanding! The arcade bows before you.")]
    fn test_fallback_comment(#[case] score: u32, #[case] comment: &str) {
        assert_eq!(fallback_comment(score), comment);
    }

    #[test]
    fn prompt_mentions_score_and_cause() {
        let p = prompt(17, DeathCause::SelfHit);
        assert!(p.contains("Score: 17."));
        assert!(p.contains("Reason for death: self."));
        assert!(p.contains("(<5)"));
        assert!(p.contains("(>20)"));
    }

    #[test]
    fn parse_response() {
        let src = r#"{
            "candidates": [
                {
                    "content": {
                        "parts": [{"text": "  Twelve points? My grandma "}, {"text": "slithers faster. \n"}],
                        "role": "model"
                    },
                    "finishReason": "STOP"
                }
            ],
            "modelVersion": "gemini-2.5-flash"
        }"#;
        let response = serde_json::from_str::<GenerateResponse>(src).unwrap();
        assert_eq!(
            response.into_text().as_deref(),
            Some("Twelve points? My grandma slithers faster.")
        );
    }

    #[rstest]
    #[case("{}")]
    #[case(r#"{"candidates": []}"#)]
    #[case(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#)]
    #[case(r#"{"candidates": [{"content": {"parts": [{"text": "   "}]}}]}"#)]
    fn parse_empty_response(#[case] src: &str) {
        let response = serde_json::from_str::<GenerateResponse>(src).unwrap();
        assert_eq!(response.into_text(), None);
    }

    #[test]
    fn url() {
        let c = GeminiCommentator::new(
            String::from("key"),
            String::from("gemini-2.5-flash"),
            String::from("https://example.com/v1beta/"),
            Duration::from_secs(1),
        );
        assert_eq!(
            c.url(),
            "https://example.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(!format!("{c:?}").contains("key\""));
    }
}
