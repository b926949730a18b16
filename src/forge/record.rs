//! Typed model of the platform's SCORM-like tracking record.
//!
//! Only the fields the forger rewrites are modeled explicitly; everything
//! else (including the whole `adl` and `cci` facets) is captured untyped
//! and passed through unchanged. All scalar values are strings on the wire,
//! score included — a platform quirk that must be preserved.

use crate::error::{PilotError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A full tracking record: the `cmi` core facet plus opaque pass-through
/// facets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingRecord {
    pub cmi: CoreFacet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adl: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cci: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `cmi` facet: completion state, score, and interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreFacet {
    #[serde(default)]
    pub completion_status: String,
    #[serde(default)]
    pub success_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Required on parse; a record without a score cannot be forged.
    pub score: Score,
    #[serde(default)]
    pub session_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_measure: Option<String>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Score {
    #[serde(default)]
    pub scaled: String,
    #[serde(default)]
    pub raw: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One recorded learner interaction. The index is positional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(default)]
    pub learner_response: String,
    #[serde(default)]
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_responses: Option<Vec<CorrectResponse>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TrackingRecord {
    /// True when the record already asserts full completion: completed,
    /// passed, 100/1 score, and every interaction marked correct.
    pub fn is_complete(&self) -> bool {
        self.cmi.completion_status == "completed"
            && self.cmi.success_status == "passed"
            && self.cmi.score.raw == "100"
            && self.cmi.score.scaled == "1"
            && self.cmi.interactions.iter().all(|i| i.result == "correct")
    }
}

/// Parse a tracking record from the structured text the fetch call returns.
pub fn parse_record(text: &str) -> Result<TrackingRecord> {
    serde_json::from_str(text).map_err(|e| PilotError::MalformedRecord(e.to_string()))
}

/// A plausible nonzero duration for a single unit, in seconds.
///
/// Too small looks suspicious, too large is implausible; the platform's own
/// client reports values in this range.
fn random_session_time<R: Rng>(rng: &mut R) -> String {
    rng.gen_range(300..=600).to_string()
}

/// Synthesize the record submitted for a unit that has no tracking data yet.
pub fn default_record<R: Rng>(rng: &mut R) -> TrackingRecord {
    TrackingRecord {
        cmi: CoreFacet {
            completion_status: "completed".to_string(),
            success_status: "passed".to_string(),
            mode: Some("normal".to_string()),
            score: Score {
                scaled: "1".to_string(),
                raw: "100".to_string(),
                extra: Map::new(),
            },
            session_time: random_session_time(rng),
            progress_measure: Some("1".to_string()),
            interactions: Vec::new(),
            extra: Map::new(),
        },
        adl: Some(serde_json::json!({ "data": [] })),
        cci: Some(serde_json::json!({ "data": [], "retry_count": "1", "submit": {} })),
        extra: Map::new(),
    }
}

/// Rewrite a record in place to assert full completion.
///
/// Every interaction is marked correct, and where a correct-answer pattern
/// is recorded its first pattern is copied into the learner response, so
/// the submitted answer matches the expected one.
pub fn apply_completion<R: Rng>(record: &mut TrackingRecord, rng: &mut R) {
    record.cmi.completion_status = "completed".to_string();
    record.cmi.success_status = "passed".to_string();
    record.cmi.score.raw = "100".to_string();
    record.cmi.score.scaled = "1".to_string();
    record.cmi.session_time = random_session_time(rng);

    for interaction in &mut record.cmi.interactions {
        interaction.result = "correct".to_string();
        if let Some(pattern) = interaction
            .correct_responses
            .as_ref()
            .and_then(|rs| rs.first())
            .and_then(|r| r.pattern.clone())
        {
            if !pattern.is_empty() {
                interaction.learner_response = pattern;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn rng() -> StepRng {
        StepRng::new(0, 1)
    }

    #[test]
    fn test_default_record_satisfies_invariants() {
        let record = default_record(&mut rand::thread_rng());
        assert!(record.is_complete());
        assert!(record.cmi.interactions.is_empty());
        let secs: u32 = record.cmi.session_time.parse().unwrap();
        assert!((300..=600).contains(&secs), "session_time {secs} out of range");
    }

    #[test]
    fn test_parse_requires_cmi_and_score() {
        assert!(parse_record("{}").is_err());
        assert!(parse_record(r#"{"cmi":{}}"#).is_err());
        assert!(parse_record(r#"{"cmi":{"score":{}}}"#).is_ok());
        assert!(parse_record("not json at all").is_err());
    }

    #[test]
    fn test_apply_completion_rewrites_interactions() {
        let mut record = parse_record(
            r#"{"cmi":{"completion_status":"incomplete","success_status":"failed",
                "score":{"scaled":"0","raw":"35"},"session_time":"12",
                "interactions":[
                  {"learner_response":"b","result":"incorrect",
                   "correct_responses":[{"pattern":"a"}]},
                  {"learner_response":"x","result":"incorrect"}
                ]}}"#,
        )
        .unwrap();

        apply_completion(&mut record, &mut rng());

        assert!(record.is_complete());
        assert_eq!(record.cmi.interactions[0].learner_response, "a");
        assert_eq!(record.cmi.interactions[0].result, "correct");
        // No pattern recorded: the original response stays, only the flag flips.
        assert_eq!(record.cmi.interactions[1].learner_response, "x");
        assert_eq!(record.cmi.interactions[1].result, "correct");
    }

    #[test]
    fn test_apply_completion_is_idempotent_on_core() {
        let mut record = parse_record(
            r#"{"cmi":{"score":{"scaled":"0","raw":"0"},
                "interactions":[{"learner_response":"a","result":"incorrect",
                                 "correct_responses":[{"pattern":"a"}]}]}}"#,
        )
        .unwrap();
        apply_completion(&mut record, &mut rng());
        let mut again = record.clone();
        apply_completion(&mut again, &mut rng());

        // Session time re-randomizes; everything else is unchanged.
        again.cmi.session_time = record.cmi.session_time.clone();
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            serde_json::to_string(&again).unwrap()
        );
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let record = parse_record(
            r#"{"cmi":{"score":{"raw":"1","min":"0"},"location":"page-9"},
                "adl":{"data":[{"id":"x"}]},"cci":{"data":[],"retry_count":"2"},
                "vendor_blob":{"k":"v"}}"#,
        )
        .unwrap();
        let out = serde_json::to_string(&record).unwrap();
        assert!(out.contains(r#""location":"page-9""#));
        assert!(out.contains(r#""min":"0""#));
        assert!(out.contains(r#""vendor_blob":{"k":"v"}"#));
        assert!(out.contains(r#""retry_count":"2""#));
    }
}
