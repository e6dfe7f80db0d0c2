//! Matching listings against a user's requirements
//!
//! The model behind a [`Judge`] is pluggable; [`Judger`] wraps one and
//! normalizes what it returns, since models differ in which of score,
//! decision and reason they actually produce.

use crate::config::JudgeConfig;
use async_trait::async_trait;
use thiserror::Error;

/// Default score at or above which a listing is recommended
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Failures of a single judgement
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("Model call failed: {0}")]
    Model(String),

    #[error("Invalid model response: {0}")]
    InvalidResponse(String),
}

/// What a model concluded about one listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Verdict {
    /// Match score in `[0, 1]`
    pub score: Option<f64>,

    /// Whether the listing is recommended
    pub decision: Option<bool>,

    pub reason: Option<String>,
}

impl Verdict {
    pub fn from_score(score: f64) -> Self {
        Self {
            score: Some(score),
            ..Self::default()
        }
    }

    pub fn is_recommended(&self) -> bool {
        self.decision.unwrap_or(false)
    }
}

/// A model that judges one description against the user's requirements
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(&self, requirements: &str, description: &str) -> Result<Verdict, JudgeError>;
}

/// Runs a [`Judge`] and fills in what the model left out
pub struct Judger<J> {
    model: J,
    threshold: f64,
}

impl<J: Judge> Judger<J> {
    pub fn new(model: J, threshold: f64) -> Self {
        Self { model, threshold }
    }

    pub fn with_default_threshold(model: J) -> Self {
        Self::new(model, DEFAULT_THRESHOLD)
    }

    pub fn from_config(model: J, config: &JudgeConfig) -> Self {
        Self::new(model, config.threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Judges one description
    ///
    /// A score without a decision is turned into a decision against the
    /// threshold, and gets a generated reason when the model gave none.
    /// Model errors are returned untouched.
    pub async fn judge_single(
        &self,
        requirements: &str,
        description: &str,
    ) -> Result<Verdict, JudgeError> {
        let verdict = self.model.judge(requirements, description).await?;
        self.validate(&verdict)?;
        Ok(self.post_process(verdict))
    }

    /// Judges many descriptions, one result per description in the same order
    pub async fn judge_batch(
        &self,
        requirements: &str,
        descriptions: &[String],
    ) -> Vec<Result<Verdict, JudgeError>> {
        let mut verdicts = Vec::with_capacity(descriptions.len());
        for description in descriptions {
            let verdict = self.judge_single(requirements, description).await;
            if let Err(e) = &verdict {
                tracing::warn!("Judgement failed: {}", e);
            }
            verdicts.push(verdict);
        }
        verdicts
    }

    fn validate(&self, verdict: &Verdict) -> Result<(), JudgeError> {
        match verdict.score {
            Some(score) if !score.is_finite() => Err(JudgeError::InvalidResponse(format!(
                "score is not a number: {}",
                score
            ))),
            _ => Ok(()),
        }
    }

    fn post_process(&self, mut verdict: Verdict) -> Verdict {
        if let (Some(score), None) = (verdict.score, verdict.decision) {
            verdict.decision = Some(score >= self.threshold);

            let has_reason = verdict
                .reason
                .as_deref()
                .is_some_and(|r| !r.trim().is_empty());
            if !has_reason {
                verdict.reason = Some(self.generate_reason(score));
            }
        }
        verdict
    }

    fn generate_reason(&self, score: f64) -> String {
        if score >= self.threshold {
            format!("Match score {:.2}%, worth considering", score * 100.0)
        } else {
            format!("Match score only {:.2}%, keep looking", score * 100.0)
        }
    }
}
