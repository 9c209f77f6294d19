//! Score events for evaluating traces and observations

use bon::Builder;
use serde::{Deserialize, Serialize};

/// Value of a score, numeric or categorical
///
/// Integers are kept as integers so `200` goes over the wire as `200`, not `200.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Integer(i64),
    Float(f64),
    String(String),
}

impl From<i64> for ScoreValue {
    fn from(value: i64) -> Self {
        ScoreValue::Integer(value)
    }
}

impl From<i32> for ScoreValue {
    fn from(value: i32) -> Self {
        ScoreValue::Integer(value.into())
    }
}

impl From<u32> for ScoreValue {
    fn from(value: u32) -> Self {
        ScoreValue::Integer(value.into())
    }
}

impl From<bool> for ScoreValue {
    /// Binary scores are sent as `1` or `0`
    fn from(value: bool) -> Self {
        ScoreValue::Integer(value.into())
    }
}

impl From<f64> for ScoreValue {
    fn from(value: f64) -> Self {
        ScoreValue::Float(value)
    }
}

impl From<String> for ScoreValue {
    fn from(value: String) -> Self {
        ScoreValue::String(value)
    }
}

impl From<&str> for ScoreValue {
    fn from(value: &str) -> Self {
        ScoreValue::String(value.to_string())
    }
}

/// Data type of a score, as understood by Langfuse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScoreDataType {
    Numeric,
    Categorical,
    Boolean,
}

/// Body of `POST /api/public/scores`
///
/// Fields are serialized in declaration order; absent optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct CreateScore {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub id: Option<String>,
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    pub trace_id: String,
    #[builder(into)]
    pub value: ScoreValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub observation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<ScoreDataType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub config_id: Option<String>,
}

impl CreateScore {
    /// Create a binary score (0 or 1)
    pub fn binary(
        trace_id: impl Into<String>,
        name: impl Into<String>,
        value: bool,
    ) -> Self {
        Self::builder()
            .trace_id(trace_id)
            .name(name)
            .value(value)
            .data_type(ScoreDataType::Boolean)
            .build()
    }

    /// Create a categorical score
    pub fn categorical(
        trace_id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self::builder()
            .trace_id(trace_id)
            .name(name)
            .value(ScoreValue::String(category.into()))
            .data_type(ScoreDataType::Categorical)
            .build()
    }
}
