//! Suggestion content generation.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::models::TriggerType;

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub organization_id: Uuid,
    pub trigger_type: TriggerType,
    pub data: Value,
    pub brand_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedContent {
    pub content: String,
    pub image_url: Option<String>,
}

#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<GeneratedContent>;
}

/// Deterministic copy built from the trigger payload. Used when no
/// language model is wired in.
pub struct TemplateGenerator;

#[async_trait]
impl SuggestionGenerator for TemplateGenerator {
    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<GeneratedContent> {
        let brand = request.brand_name.as_deref().unwrap_or("our team");
        let field = |key: &str| request.data.get(key).and_then(Value::as_str);

        let content = match request.trigger_type {
            TriggerType::LeadConverted => match field("industry") {
                Some(industry) => format!(
                    "Another {} business just joined {}! Thank you for trusting us.",
                    industry, brand
                ),
                None => format!("We just welcomed a new customer to {}! Thank you for trusting us.", brand),
            },
            TriggerType::FiveStarCall => match field("highlight") {
                Some(highlight) => format!("\"{}\" Five stars from a happy caller. {} is listening.", highlight, brand),
                None => format!("Another five-star conversation today. {} is listening.", brand),
            },
            TriggerType::WeeklyContent => match field("topic") {
                Some(topic) => format!("This week at {}: {}", brand, topic),
                None => format!("Here is what {} has been working on this week.", brand),
            },
            TriggerType::Manual => match field("prompt") {
                Some(prompt) => prompt.to_string(),
                None => format!("News from {}.", brand),
            },
        };

        Ok(GeneratedContent {
            content,
            image_url: field("imageUrl").map(str::to_string),
        })
    }
}
