//! Duplicate-episode detection
//!
//! Decides whether a candidate release names an episode the ledger already
//! holds as acquired for the same series. Identity is narrative (which
//! episode), never packaging: release group, resolution, and container are
//! ignored in the comparison.
//!
//! The engine is a pure query — it never writes to the ledger — and its bias
//! is conservative: when a name cannot be parsed on either side, that side is
//! incomparable and never counts as a match, so doubtful candidates are
//! allowed to download rather than silently suppressed. The one condition
//! that does surface as an error is a ledger outage, which must stay
//! distinguishable from "no match found".

use thiserror::Error;
use tracing::{debug, warn};

use crate::db::{Database, ReleaseRecord, SeriesRecord};
use crate::services::release_parser::parse_release;

/// Failure modes of a detection call
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The acquisition ledger could not be queried. Distinct from "no match":
    /// treating an outage as a non-duplicate would mass-download during it.
    #[error("acquisition ledger unavailable: {0}")]
    Ledger(anyhow::Error),

    /// Caller passed a candidate that belongs to a different series
    #[error("candidate release {candidate} does not belong to series {series}")]
    SeriesMismatch {
        candidate: uuid::Uuid,
        series: uuid::Uuid,
    },
}

/// Duplicate detection engine over the acquisition ledger
#[derive(Clone)]
pub struct DuplicateDetector {
    db: Database,
}

impl DuplicateDetector {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Check whether an acquired release for the same (series, season,
    /// episode) identity already exists.
    ///
    /// `enabled` is the runtime toggle; when false this returns immediately
    /// without parsing or touching the database. Season participates in the
    /// comparison only when both sides expose one, so parsers that cannot
    /// infer a season for single-season shows do not spuriously fail the
    /// match.
    pub async fn is_duplicate(
        &self,
        candidate: &ReleaseRecord,
        series: &SeriesRecord,
        enabled: bool,
    ) -> Result<bool, DetectionError> {
        if !enabled {
            return Ok(false);
        }

        if let Some(series_id) = candidate.series_id {
            if series_id != series.id {
                return Err(DetectionError::SeriesMismatch {
                    candidate: candidate.id,
                    series: series.id,
                });
            }
        }

        let parsed = parse_release(&candidate.name);
        let Some(episode) = parsed.episode else {
            // Unparseable candidate: cannot compare, let it through
            debug!(
                release = %candidate.name,
                series = %series.official_title,
                "Candidate name yielded no episode number, skipping duplicate check"
            );
            return Ok(false);
        };

        let acquired = self
            .db
            .releases()
            .find_acquired(series.id)
            .await
            .map_err(DetectionError::Ledger)?;

        for stored in &acquired {
            let stored_parsed = parse_release(&stored.name);
            let Some(stored_episode) = stored_parsed.episode else {
                // Incomparable ledger entry: neither a match nor a veto
                warn!(
                    release = %stored.name,
                    series = %series.official_title,
                    "Acquired release name is unparseable, excluding from comparison"
                );
                continue;
            };

            if stored_episode != episode {
                continue;
            }

            // Season only disambiguates when both names carry one
            if let (Some(s1), Some(s2)) = (parsed.season, stored_parsed.season) {
                if s1 != s2 {
                    continue;
                }
            }

            debug!(
                candidate = %candidate.name,
                matched = %stored.name,
                episode = episode,
                "Candidate duplicates an acquired episode"
            );
            return Ok(true);
        }

        Ok(false)
    }
}
