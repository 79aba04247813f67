use crate::error::AnalyzerError;
use configuration::DedupMetric;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

const TARGET_DATA_PATTERN: &str = r"(?s)target_data = (.*?);";

/// A simulated alpha expression and the metrics it was scored with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub expression: String,
    pub sharpe: f64,
    pub fitness: f64,
}

impl Candidate {
    pub fn metric(&self, metric: DedupMetric) -> f64 {
        match metric {
            DedupMetric::Sharpe => self.sharpe,
            DedupMetric::Fitness => self.fitness,
        }
    }
}

/// Keeps, for every distinct `target_data` sub-expression, the candidate with
/// the highest `metric`. Groups appear in first-seen order; on ties the earlier
/// candidate wins. Candidates without a `target_data` assignment pass through.
pub fn deduplicate(
    candidates: Vec<Candidate>,
    metric: DedupMetric,
) -> Result<Vec<Candidate>, AnalyzerError> {
    let pattern = Regex::new(TARGET_DATA_PATTERN)?;
    let total = candidates.len();

    let mut slots: Vec<Candidate> = Vec::new();
    let mut groups: HashMap<String, usize> = HashMap::new();
    for candidate in candidates {
        let key = pattern
            .captures(&candidate.expression)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string());
        match key {
            Some(key) => match groups.get(&key) {
                Some(&slot) => {
                    if candidate.metric(metric) > slots[slot].metric(metric) {
                        slots[slot] = candidate;
                    }
                }
                None => {
                    groups.insert(key, slots.len());
                    slots.push(candidate);
                }
            },
            None => slots.push(candidate),
        }
    }

    tracing::info!(before = total, after = slots.len(), ?metric, "Deduplicated candidates by target data.");
    Ok(slots)
}

/// Drops candidates whose expression text repeats an earlier one.
pub fn dedup_exact(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.expression.clone()))
        .collect()
}

/// Parses a JSON array of candidates.
pub fn parse_candidates(json: &str) -> Result<Vec<Candidate>, AnalyzerError> {
    Ok(serde_json::from_str(json)?)
}
