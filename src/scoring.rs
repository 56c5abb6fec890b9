//! The rule-driven scoring engine
//!
//! A scoring configuration is a map from metric names to rules. Requirement
//! rules are predicates: a transcript failing any of them is gated out with
//! a score of 0. Scoring rules rescale the raw metric values per locus and
//! contribute `multiplier * rescaled` to the composite score.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::utils::errors::ConfigurationError;

const EPSILON: f64 = 1e-9;

/// One row of metric values for a single transcript
pub type MetricRow = BTreeMap<String, f64>;

/// Comparison operators available to requirement and filter rules
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    In,
    NotIn,
}

/// The right-hand side of a rule
///
/// Boolean metrics are expressed as flags, discrete choices as sets.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RuleValue {
    Flag(bool),
    Number(f64),
    Set(Vec<f64>),
}

impl RuleValue {
    fn holds(&self, operator: Operator, x: f64) -> bool {
        match self {
            RuleValue::Flag(flag) => {
                let expected = if *flag { 1.0 } else { 0.0 };
                match operator {
                    Operator::Eq => (x - expected).abs() < EPSILON,
                    Operator::Ne => (x - expected).abs() >= EPSILON,
                    // flags only support (in)equality
                    _ => false,
                }
            }
            RuleValue::Number(value) => match operator {
                Operator::Eq => (x - value).abs() < EPSILON,
                Operator::Ne => (x - value).abs() >= EPSILON,
                Operator::Le => x <= value + EPSILON,
                Operator::Ge => x >= value - EPSILON,
                Operator::Lt => x < *value,
                Operator::Gt => x > *value,
                _ => false,
            },
            RuleValue::Set(values) => {
                let found = values.iter().any(|value| (x - value).abs() < EPSILON);
                match operator {
                    Operator::In => found,
                    Operator::NotIn => !found,
                    _ => false,
                }
            }
        }
    }
}

/// A secondary predicate attached to a rule
///
/// When a filter fails for a transcript, the rule it belongs to does not
/// apply to that transcript. A filter may target a different metric than
/// the rule carrying it.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Filter {
    pub operator: Operator,
    pub value: RuleValue,
    #[serde(default)]
    pub metric: Option<String>,
}

/// A hard requirement on a metric
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Requirement {
    pub operator: Operator,
    pub value: RuleValue,
    #[serde(default)]
    pub filter: Option<Filter>,
}

/// How a raw metric value is rescaled within its locus
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rescaling {
    Max,
    Min,
    Target,
}

/// A scoring contribution for one metric
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ScoringRule {
    pub rescaling: Rescaling,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub filter: Option<Filter>,
}

fn default_multiplier() -> f64 {
    1.0
}

impl ScoringRule {
    pub fn validate(&self, metric: &str) -> Result<(), ConfigurationError> {
        if !self.multiplier.is_finite() || self.multiplier == 0.0 {
            return Err(ConfigurationError::new(format!(
                "scoring rule for {} has an unusable multiplier {}",
                metric, self.multiplier
            )));
        }
        if self.rescaling == Rescaling::Target && self.value.is_none() {
            return Err(ConfigurationError::new(format!(
                "scoring rule for {} uses target rescaling without a target value",
                metric
            )));
        }
        Ok(())
    }
}

fn filter_passes(filter: &Option<Filter>, metric: &str, row: &MetricRow) -> bool {
    match filter {
        None => true,
        Some(filter) => {
            let target = filter.metric.as_deref().unwrap_or(metric);
            match row.get(target) {
                Some(&x) => filter.value.holds(filter.operator, x),
                None => false,
            }
        }
    }
}

/// Evaluates all requirements against one metric row
pub fn passes_requirements(
    row: &MetricRow,
    requirements: &BTreeMap<String, Requirement>,
) -> bool {
    requirements.iter().all(|(metric, requirement)| {
        if !filter_passes(&requirement.filter, metric, row) {
            // the requirement does not apply to this transcript
            return true;
        }
        match row.get(metric) {
            Some(&x) => requirement.value.holds(requirement.operator, x),
            None => false,
        }
    })
}

/// Scores all transcripts of one locus
///
/// Transcripts failing a requirement score 0. For each scoring rule the
/// surviving values are rescaled over the locus-wide range and contribute
/// `multiplier * rescaled`.
pub fn score_transcripts(
    rows: &BTreeMap<String, MetricRow>,
    requirements: &BTreeMap<String, Requirement>,
    scoring: &BTreeMap<String, ScoringRule>,
) -> BTreeMap<String, f64> {
    let mut scores: BTreeMap<String, f64> = rows.keys().map(|id| (id.clone(), 0.0)).collect();

    let eligible: Vec<&String> = rows
        .iter()
        .filter(|(_, row)| passes_requirements(row, requirements))
        .map(|(id, _)| id)
        .collect();
    if eligible.is_empty() {
        return scores;
    }

    for (metric, rule) in scoring {
        let pool: Vec<(&String, f64)> = eligible
            .iter()
            .filter_map(|id| {
                let row = &rows[*id];
                if !filter_passes(&rule.filter, metric, row) {
                    return None;
                }
                row.get(metric).map(|&x| (*id, x))
            })
            .collect();
        if pool.is_empty() {
            continue;
        }

        let lowest = pool.iter().map(|(_, x)| *x).fold(f64::INFINITY, f64::min);
        let highest = pool
            .iter()
            .map(|(_, x)| *x)
            .fold(f64::NEG_INFINITY, f64::max);

        for (id, x) in pool {
            let rescaled = match rule.rescaling {
                Rescaling::Max => {
                    if (highest - lowest).abs() < EPSILON {
                        1.0
                    } else {
                        (x - lowest) / (highest - lowest)
                    }
                }
                Rescaling::Min => {
                    if (highest - lowest).abs() < EPSILON {
                        1.0
                    } else {
                        (highest - x) / (highest - lowest)
                    }
                }
                Rescaling::Target => {
                    // validated at startup
                    let target = rule.value.unwrap_or(0.0);
                    let spread = (highest - target).abs().max((lowest - target).abs());
                    if spread < EPSILON {
                        1.0
                    } else {
                        1.0 - (x - target).abs() / spread
                    }
                }
            };
            *scores.get_mut(id).unwrap() += rule.multiplier * rescaled;
        }
    }
    scores
}
