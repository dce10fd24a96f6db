use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::advance_timestamp;

/// Lowest accepted score for a dimension or a shared-entry rating
pub const MIN_SCORE: f64 = 0.0;
/// Highest accepted score for a dimension or a shared-entry rating
pub const MAX_SCORE: f64 = 10.0;

/// Checks that a score is a finite number inside `MIN_SCORE..=MAX_SCORE`
pub fn validate_score(field: &str, value: f64) -> AppResult<f64> {
    if value.is_nan() || !(MIN_SCORE..=MAX_SCORE).contains(&value) {
        return Err(AppError::InvalidInput(format!(
            "{} must be between {} and {}, got {}",
            field, MIN_SCORE, MAX_SCORE, value
        )));
    }
    Ok(value)
}

/// The five scored aspects of a rating
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatingDimensions {
    pub narrative: f64,
    pub technical: f64,
    pub performance: f64,
    pub emotional: f64,
    pub cultural: f64,
}

impl RatingDimensions {
    /// Rejects the first dimension that is out of range
    pub fn validate(&self) -> AppResult<()> {
        validate_score("narrative", self.narrative)?;
        validate_score("technical", self.technical)?;
        validate_score("performance", self.performance)?;
        validate_score("emotional", self.emotional)?;
        validate_score("cultural", self.cultural)?;
        Ok(())
    }

    /// Arithmetic mean of the five dimensions
    pub fn overall(&self) -> f64 {
        (self.narrative + self.technical + self.performance + self.emotional + self.cultural)
            / 5.0
    }
}

/// Rating submission as sent by a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingInput {
    pub title_id: String,
    #[serde(flatten)]
    pub dimensions: RatingDimensions,
}

/// A user's rating of one title; unique per (user_id, title_id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rating {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title_id: String,
    #[serde(flatten)]
    pub dimensions: RatingDimensions,
    pub overall: f64,
    pub last_updated: DateTime<Utc>,
}

impl Rating {
    pub fn new(user_id: Uuid, title_id: String, dimensions: RatingDimensions) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title_id,
            dimensions,
            overall: dimensions.overall(),
            last_updated: Utc::now(),
        }
    }

    /// Overwrites the scores in place, keeping identity
    pub fn apply(&mut self, dimensions: RatingDimensions) {
        self.dimensions = dimensions;
        self.overall = dimensions.overall();
        self.last_updated = advance_timestamp(self.last_updated);
    }
}
