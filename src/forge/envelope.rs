//! Wire envelope serialization.
//!
//! The submit endpoint expects a dual encoding: the compact JSON record
//! immediately followed by an `[INTERACTIONINFO]` block that restates each
//! interaction's index and learner response in a pipe-delimited secondary
//! form. The remote validator reads the suffix, not only the JSON body, so
//! both must be present and agree.

use crate::error::Result;
use crate::forge::record::{self, Interaction};
use rand::Rng;

/// Tag opening the flattened interaction block.
const INTERACTION_TAG: &str = "[INTERACTIONINFO]";

/// Uninterpreted constants the platform's own client emits between the
/// index and the response. Preserved literally; their meaning is unknown.
const RESPONSE_FLAGS: &str = "false[]false";

/// A fully serialized completion payload, ready for the `data` form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireEnvelope(String);

impl WireEnvelope {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for WireEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the flattened suffix block for a sequence of interactions.
///
/// One `{index}[]false[]false[]{response}[]correct` entry per interaction,
/// in original order, joined by `$$`. Zero interactions yield the bare tag.
pub fn interaction_suffix(interactions: &[Interaction]) -> String {
    let entries: Vec<String> = interactions
        .iter()
        .enumerate()
        .map(|(index, item)| {
            format!(
                "{index}[]{RESPONSE_FLAGS}[]{}[]correct",
                item.learner_response
            )
        })
        .collect();
    format!("{INTERACTION_TAG}{}", entries.join("$$"))
}

/// Forge a completion envelope from a unit's existing tracking text.
///
/// `None` (or blank text) synthesizes the default record; otherwise the
/// existing record is parsed, rewritten to assert full completion, and
/// re-serialized. The input is never mutated.
pub fn forge(existing: Option<&str>) -> Result<WireEnvelope> {
    forge_with_rng(existing, &mut rand::thread_rng())
}

/// `forge` with an injected randomness source.
pub fn forge_with_rng<R: Rng>(existing: Option<&str>, rng: &mut R) -> Result<WireEnvelope> {
    let record = match existing {
        Some(text) if !text.trim().is_empty() => {
            let mut record = record::parse_record(text)?;
            record::apply_completion(&mut record, rng);
            record
        }
        _ => record::default_record(rng),
    };

    // Compact serialization: the endpoint is sensitive to payload shape.
    let body = serde_json::to_string(&record)
        .map_err(|e| crate::error::PilotError::MalformedRecord(e.to_string()))?;
    let suffix = interaction_suffix(&record.cmi.interactions);

    Ok(WireEnvelope(format!("{body}{suffix}")))
}
