//! Assigns a deterministic 0–100 relevance score to a candidate and filters
//! anything below the configured threshold.

use chrono::Datelike;

use crate::types::BasicCompetitor;

const INDUSTRY_MATCH_POINTS: u8 = 30;
const GEOGRAPHY_MATCH_POINTS: u8 = 25;
const COMPLETENESS_MAX_POINTS: f64 = 20.0;
const RECENCY_WITHIN_3_YEARS: u8 = 15;
const RECENCY_WITHIN_5_YEARS: u8 = 10;
const RECENCY_WITHIN_10_YEARS: u8 = 5;
const FUNDING_HIGH_POINTS: u8 = 10;
const FUNDING_LOW_POINTS: u8 = 5;
const FUNDING_HIGH_THRESHOLD: f64 = 1_000_000.0;
const FUNDING_LOW_THRESHOLD: f64 = 100_000.0;

/// Default drop threshold; exposed as a constant rather than hard-coded
/// inline so callers can make it configuration-driven.
pub const DEFAULT_RELEVANCE_THRESHOLD: u8 = 75;

/// What the candidate is being scored against.
pub struct ScoringContext<'a> {
    pub industries: &'a [String],
    pub regions: &'a [String],
}

fn industry_points(candidate: &BasicCompetitor, ctx: &ScoringContext) -> u8 {
    let Some(candidate_industry) = candidate.industry.as_deref() else {
        return 0;
    };
    let candidate_lower = candidate_industry.to_lowercase();
    let matched = ctx
        .industries
        .iter()
        .any(|target| candidate_lower.contains(&target.to_lowercase()));
    if matched {
        INDUSTRY_MATCH_POINTS
    } else {
        0
    }
}

fn geography_points(candidate: &BasicCompetitor, ctx: &ScoringContext) -> u8 {
    let Some(country) = candidate.country.as_deref() else {
        return 0;
    };
    let matched = ctx
        .regions
        .iter()
        .any(|region| region.eq_ignore_ascii_case(country));
    if matched {
        GEOGRAPHY_MATCH_POINTS
    } else {
        0
    }
}

fn completeness_points(candidate: &BasicCompetitor) -> u8 {
    let fields_filled = [
        !candidate.name.trim().is_empty(),
        candidate.description.as_deref().is_some_and(|s| !s.trim().is_empty()),
        !candidate.website.trim().is_empty(),
        candidate.business_model.as_deref().is_some_and(|s| !s.trim().is_empty()),
        candidate.value_proposition.as_deref().is_some_and(|s| !s.trim().is_empty()),
    ];
    let filled = fields_filled.iter().filter(|f| **f).count() as f64;
    let fraction = filled / fields_filled.len() as f64;
    (fraction * COMPLETENESS_MAX_POINTS).round() as u8
}

fn recency_points(candidate: &BasicCompetitor, current_year: i32) -> u8 {
    let Some(founded_year) = candidate.founded_year else {
        return 0;
    };
    let age = (current_year - founded_year).max(0);
    if age <= 3 {
        RECENCY_WITHIN_3_YEARS
    } else if age <= 5 {
        RECENCY_WITHIN_5_YEARS
    } else if age <= 10 {
        RECENCY_WITHIN_10_YEARS
    } else {
        0
    }
}

fn funding_points(candidate: &BasicCompetitor) -> u8 {
    match candidate.total_funding {
        Some(amount) if amount >= FUNDING_HIGH_THRESHOLD => FUNDING_HIGH_POINTS,
        Some(amount) if amount >= FUNDING_LOW_THRESHOLD => FUNDING_LOW_POINTS,
        _ => 0,
    }
}

/// Score a candidate against the run's target industries/regions, as of
/// `current_year` (passed explicitly so the function stays pure and
/// testable; callers pass `Utc::now().year()`).
pub fn score_as_of(candidate: &BasicCompetitor, ctx: &ScoringContext, current_year: i32) -> u8 {
    let total = industry_points(candidate, ctx) as u16
        + geography_points(candidate, ctx) as u16
        + completeness_points(candidate) as u16
        + recency_points(candidate, current_year) as u16
        + funding_points(candidate) as u16;
    total.min(100) as u8
}

/// Score a candidate using the current wall-clock year.
pub fn score(candidate: &BasicCompetitor, ctx: &ScoringContext) -> u8 {
    score_as_of(candidate, ctx, chrono::Utc::now().year())
}

/// Whether a score clears the relevance bar.
pub fn passes_threshold(score: u8, threshold: u8) -> bool {
    score >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_candidate() -> BasicCompetitor {
        BasicCompetitor {
            name: "Acme".into(),
            website: "https://acme.com".into(),
            description: None,
            industry: None,
            country: None,
            business_model: None,
            value_proposition: None,
            founded_year: None,
            total_funding: None,
        }
    }

    #[test]
    fn score_is_always_in_0_to_100() {
        let ctx = ScoringContext {
            industries: &["fintech".to_string()],
            regions: &["NG".to_string()],
        };
        let mut candidate = base_candidate();
        candidate.industry = Some("Fintech".into());
        candidate.country = Some("NG".into());
        candidate.description = Some("desc".into());
        candidate.business_model = Some("B2B".into());
        candidate.value_proposition = Some("value".into());
        candidate.founded_year = Some(2024);
        candidate.total_funding = Some(5_000_000.0);

        let s = score_as_of(&candidate, &ctx, 2026);
        assert!(s <= 100);
        assert_eq!(s, 100);
    }

    #[test]
    fn industry_match_is_case_insensitive_substring() {
        let ctx = ScoringContext {
            industries: &["Fintech".to_string()],
            regions: &[],
        };
        let mut candidate = base_candidate();
        candidate.industry = Some("digital fintech lending".into());
        assert_eq!(industry_points(&candidate, &ctx), INDUSTRY_MATCH_POINTS);
    }

    #[test]
    fn geography_match_is_case_insensitive() {
        let ctx = ScoringContext {
            industries: &[],
            regions: &["ng".to_string()],
        };
        let mut candidate = base_candidate();
        candidate.country = Some("NG".into());
        assert_eq!(geography_points(&candidate, &ctx), GEOGRAPHY_MATCH_POINTS);
    }

    #[test]
    fn recency_boundary_values() {
        let c3 = BasicCompetitor { founded_year: Some(2023), ..base_candidate() };
        let c5 = BasicCompetitor { founded_year: Some(2021), ..base_candidate() };
        let c10 = BasicCompetitor { founded_year: Some(2016), ..base_candidate() };
        let c_old = BasicCompetitor { founded_year: Some(2000), ..base_candidate() };
        assert_eq!(recency_points(&c3, 2026), RECENCY_WITHIN_3_YEARS);
        assert_eq!(recency_points(&c5, 2026), RECENCY_WITHIN_5_YEARS);
        assert_eq!(recency_points(&c10, 2026), RECENCY_WITHIN_10_YEARS);
        assert_eq!(recency_points(&c_old, 2026), 0);
    }

    #[test]
    fn funding_boundary_values() {
        let high = BasicCompetitor { total_funding: Some(1_000_000.0), ..base_candidate() };
        let low = BasicCompetitor { total_funding: Some(100_000.0), ..base_candidate() };
        let below = BasicCompetitor { total_funding: Some(99_999.0), ..base_candidate() };
        assert_eq!(funding_points(&high), FUNDING_HIGH_POINTS);
        assert_eq!(funding_points(&low), FUNDING_LOW_POINTS);
        assert_eq!(funding_points(&below), 0);
    }

    #[test]
    fn completeness_rounds_filled_fraction() {
        let mut candidate = base_candidate();
        candidate.description = Some("x".into());
        // 3 of 5 fields filled (name, website, description) -> round(0.6*20) = 12
        assert_eq!(completeness_points(&candidate), 12);
    }

    #[test]
    fn default_threshold_matches_spec() {
        assert_eq!(DEFAULT_RELEVANCE_THRESHOLD, 75);
        assert!(passes_threshold(75, 75));
        assert!(!passes_threshold(74, 75));
    }
}
