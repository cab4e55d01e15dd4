//! Distance ranking of candidate servers.
//!
//! Candidates are kept in ascending planar distance from the origin by
//! ordered insertion, so a partially fed ranker always holds a valid
//! ranking. Equal distances keep their insertion order.

use crate::candidate::{Candidate, CandidateRecord, Coordinates, upload_host};

/// A candidate's distance from the origin
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    /// Planar distance in degrees (never negative)
    pub distance: f64,
    /// Upload endpoint URL
    pub url: String,
}

impl RankedCandidate {
    /// Bare `host[:port]` if the URL follows the upload-endpoint pattern
    #[must_use]
    pub fn hostname(&self) -> Option<String> {
        upload_host(&self.url)
    }
}

/// Incremental distance ranker
#[derive(Debug, Clone)]
pub struct DistanceRanker {
    origin: Coordinates,
    ranked: Vec<RankedCandidate>,
    skipped: usize,
}

impl DistanceRanker {
    /// Create an empty ranker around `origin`
    #[must_use]
    pub fn new(origin: Coordinates) -> Self {
        Self {
            origin,
            ranked: Vec::new(),
            skipped: 0,
        }
    }

    /// Insert a validated candidate at its ordered position
    pub fn insert(&mut self, candidate: &Candidate) {
        let distance = self.origin.planar_distance(&candidate.position);
        // After every equal distance: stable for ties
        let idx = self.ranked.partition_point(|r| r.distance <= distance);
        self.ranked.insert(
            idx,
            RankedCandidate {
                distance,
                url: candidate.url.clone(),
            },
        );
    }

    /// Validate and insert a raw record.
    ///
    /// Returns `false` and produces no entry when the record's URL or
    /// coordinates are missing or unparseable.
    pub fn insert_record(&mut self, record: &CandidateRecord) -> bool {
        match Candidate::try_from(record) {
            Ok(candidate) => {
                self.insert(&candidate);
                true
            }
            Err(reason) => {
                tracing::debug!("skipping candidate {:?}: {}", record.url, reason);
                self.skipped += 1;
                false
            }
        }
    }

    /// Current ranking, closest first
    #[must_use]
    pub fn ranked(&self) -> &[RankedCandidate] {
        &self.ranked
    }

    /// Records rejected so far
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Number of ranked candidates
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    /// Whether nothing has been ranked
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Consume the ranker, returning the ranking
    #[must_use]
    pub fn into_ranked(self) -> Vec<RankedCandidate> {
        self.ranked
    }
}

/// Rank raw directory records, skipping malformed ones
#[must_use]
pub fn rank(origin: Coordinates, records: &[CandidateRecord]) -> Vec<RankedCandidate> {
    let mut ranker = DistanceRanker::new(origin);
    for record in records {
        ranker.insert_record(record);
    }
    if ranker.skipped() > 0 {
        tracing::debug!(
            "ranked {} candidates, skipped {} malformed",
            ranker.len(),
            ranker.skipped()
        );
    }
    ranker.into_ranked()
}

/// Rank already-validated candidates
#[must_use]
pub fn rank_candidates(origin: Coordinates, candidates: &[Candidate]) -> Vec<RankedCandidate> {
    let mut ranker = DistanceRanker::new(origin);
    for candidate in candidates {
        ranker.insert(candidate);
    }
    ranker.into_ranked()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn url(name: &str) -> String {
        format!("http://{name}.example.net/speedtest/upload.php")
    }

    #[test]
    fn test_rank_ascending() {
        let origin = Coordinates::new(0.0, 0.0);
        let candidates = vec![
            Candidate::new(url("far"), 30.0, 40.0),
            Candidate::new(url("near"), 3.0, 4.0),
            Candidate::new(url("mid"), 6.0, 8.0),
        ];

        let ranked = rank_candidates(origin, &candidates);
        let names: Vec<_> = ranked.iter().map(|r| r.hostname().unwrap()).collect();
        assert_eq!(
            names,
            vec!["near.example.net", "mid.example.net", "far.example.net"]
        );
        assert_eq!(ranked[0].distance, 5.0);
        assert_eq!(ranked[2].distance, 50.0);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let origin = Coordinates::new(0.0, 0.0);
        let candidates = vec![
            Candidate::new(url("b"), 1.0, 0.0),
            Candidate::new(url("a"), 0.0, 1.0),
            Candidate::new(url("c"), -1.0, 0.0),
            Candidate::new(url("z"), 0.0, 0.5),
        ];

        let ranked = rank_candidates(origin, &candidates);
        let urls: Vec<_> = ranked.iter().map(|r| r.url.clone()).collect();
        assert_eq!(urls, vec![url("z"), url("b"), url("a"), url("c")]);
    }

    #[test]
    fn test_malformed_records_skipped() {
        let origin = Coordinates::new(0.0, 0.0);
        let records = vec![
            CandidateRecord::new(url("ok"), "1", "1"),
            CandidateRecord::new(url("text"), "north", "1"),
            CandidateRecord {
                url: None,
                lat: Some("2".into()),
                lon: Some("2".into()),
            },
            CandidateRecord {
                url: Some(url("nolat")),
                lat: None,
                lon: Some("2".into()),
            },
            CandidateRecord::new(url("ok2"), "2", "2"),
        ];

        let mut ranker = DistanceRanker::new(origin);
        let accepted: Vec<bool> = records.iter().map(|r| ranker.insert_record(r)).collect();

        assert_eq!(accepted, vec![true, false, false, false, true]);
        assert_eq!(ranker.len(), 2);
        assert_eq!(ranker.skipped(), 3);
        assert_eq!(rank(origin, &records).len(), 2);
    }

    #[test]
    fn test_partial_ranking_is_ordered() {
        let mut ranker = DistanceRanker::new(Coordinates::new(0.0, 0.0));
        for (i, d) in [9.0, 1.0, 5.0, 3.0].into_iter().enumerate() {
            ranker.insert(&Candidate::new(url(&i.to_string()), d, 0.0));
            assert!(ranker.ranked().windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }

    #[test]
    fn test_hostname_requires_upload_pattern() {
        let ranked = RankedCandidate {
            distance: 0.0,
            url: "http://a.example.net/speedtest/upload.asp".to_string(),
        };
        assert_eq!(ranked.hostname(), None);
    }

    proptest! {
        #[test]
        fn ranking_is_sorted_permutation(
            coords in prop::collection::vec((-90.0f64..90.0, -180.0f64..180.0), 0..200),
            origin in (-90.0f64..90.0, -180.0f64..180.0),
        ) {
            let candidates: Vec<Candidate> = coords
                .iter()
                .enumerate()
                .map(|(i, (lat, lon))| Candidate::new(url(&format!("c{i}")), *lat, *lon))
                .collect();
            let ranked = rank_candidates(Coordinates::new(origin.0, origin.1), &candidates);

            prop_assert_eq!(ranked.len(), candidates.len());
            prop_assert!(ranked.windows(2).all(|w| w[0].distance <= w[1].distance));
            prop_assert!(ranked.iter().all(|r| r.distance >= 0.0));

            let mut input: Vec<String> = candidates.iter().map(|c| c.url.clone()).collect();
            let mut output: Vec<String> = ranked.iter().map(|r| r.url.clone()).collect();
            input.sort();
            output.sort();
            prop_assert_eq!(input, output);
        }

        #[test]
        fn non_numeric_coordinates_never_ranked(
            junk in "[a-zA-Z ]{0,8}",
            valid in 0usize..20,
        ) {
            let mut records: Vec<CandidateRecord> = (0..valid)
                .map(|i| CandidateRecord::new(url(&format!("v{i}")), i.to_string(), "0"))
                .collect();
            records.push(CandidateRecord::new(url("junk"), junk.clone(), "0"));
            records.push(CandidateRecord::new(url("junk2"), "0", junk));

            let ranked = rank(Coordinates::new(0.0, 0.0), &records);
            prop_assert_eq!(ranked.len(), valid);
            prop_assert!(ranked.iter().all(|r| !r.url.contains("junk")));
        }
    }
}
