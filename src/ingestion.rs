use crate::error::Result;
use crate::schema::{RawObservation, StatementExtraction};
use log::debug;
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum ExtractionPayload {
    List(Vec<RawObservation>),
    Wrapped(StatementExtraction),
}

/// Parses the text returned by the extraction service.
///
/// Accepts either a bare array of records or `{"observations": [...]}`, and
/// tolerates markdown code fences or prose around the JSON. An object without
/// an `observations` key is rejected, so an error body or a renamed field never
/// reads as an empty statement.
pub fn parse_extraction_json(raw: &str) -> Result<Vec<RawObservation>> {
    let mut candidates = json_candidates(raw).into_iter();
    let first = candidates.next().unwrap_or_else(|| raw.trim());

    let payload = match serde_json::from_str::<ExtractionPayload>(first) {
        Ok(payload) => payload,
        Err(err) => candidates
            .find_map(|candidate| serde_json::from_str::<ExtractionPayload>(candidate).ok())
            .ok_or(err)?,
    };

    let observations = match payload {
        ExtractionPayload::List(list) => list,
        ExtractionPayload::Wrapped(extraction) => extraction.observations,
    };

    debug!("Parsed {} raw observations from extraction output", observations.len());
    Ok(observations)
}

/// The most likely JSON slice of `raw`. See `json_candidates` for the others.
pub fn clean_json_output(raw: &str) -> String {
    json_candidates(raw)
        .into_iter()
        .next()
        .unwrap_or_else(|| raw.trim())
        .to_string()
}

/// Slices of `raw` that may hold the JSON document, earliest opening bracket first.
///
/// Both the array slice and the object slice are returned, since prose before
/// the payload can contain a stray `[` or `{`.
fn json_candidates(raw: &str) -> Vec<&str> {
    let mut slices: Vec<(usize, &str)> = [('[', ']'), ('{', '}')]
        .iter()
        .filter_map(|&(open, close)| {
            let start = raw.find(open)?;
            let end = raw.rfind(close)?;
            (end > start).then(|| (start, &raw[start..=end]))
        })
        .collect();

    slices.sort_by_key(|(start, _)| *start);
    slices.into_iter().map(|(_, slice)| slice).collect()
}
