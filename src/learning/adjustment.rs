//! Apply learned persona weights to recommendation scores

use crate::learning::engine::LearningWeightsEngine;
use crate::models::{EntityScore, LearningWeights};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub persona: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "base_score", alias = "score")]
    pub base_score: f64,
    #[serde(default, alias = "vertical_key", alias = "vertical")]
    pub vertical_key: Option<String>,
}

impl RecommendationRequest {
    pub fn new(persona: impl Into<String>, base_score: f64) -> Self {
        Self {
            persona: Some(persona.into()),
            base_score,
            ..Self::default()
        }
    }

    pub fn with_vertical(mut self, vertical_key: impl Into<String>) -> Self {
        self.vertical_key = Some(vertical_key.into());
        self
    }

    /// `persona` wins over `name`
    pub fn persona_name(&self) -> Option<&str> {
        self.persona
            .as_deref()
            .or(self.name.as_deref())
            .filter(|n| !n.trim().is_empty())
    }
}

/// Informational vertical figures; they do not change the score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerticalInsight {
    pub vertical_key: String,
    pub approval_rate: f64,
    pub avg_rating: f64,
    pub total_plans: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona_score: Option<EntityScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical: Option<VerticalInsight>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationAdjustment {
    pub persona: Option<String>,
    pub base_score: f64,
    pub multiplier: f64,
    pub adjusted_score: f64,
    pub learning_confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_data: Option<LearningData>,
}

pub fn adjust_recommendation(
    engine: &LearningWeightsEngine,
    weights: &LearningWeights,
    request: &RecommendationRequest,
) -> RecommendationAdjustment {
    let persona = request.persona_name();
    let persona_score = persona.and_then(|p| weights.persona(p)).cloned();
    let multiplier = persona.map_or(1.0, |p| engine.score_adjustment(weights, p));

    let vertical = request.vertical_key.as_deref().and_then(|key| {
        weights.vertical(key).map(|stats| VerticalInsight {
            vertical_key: key.to_string(),
            approval_rate: stats.approval_rate,
            avg_rating: stats.avg_rating,
            total_plans: stats.total_plans,
        })
    });

    let learning_confidence = persona_score.as_ref().map_or(0.0, |s| s.confidence);
    let learning_data = if persona_score.is_some() || vertical.is_some() {
        Some(LearningData {
            persona_score,
            vertical,
        })
    } else {
        None
    };

    RecommendationAdjustment {
        persona: persona.map(str::to_string),
        base_score: request.base_score,
        multiplier,
        adjusted_score: request.base_score * multiplier,
        learning_confidence,
        learning_data,
    }
}
