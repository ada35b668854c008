// Score normalization onto the common 0-100 scale

use crate::models::{RatingSource, Score};
use crate::services::sources::RawScore;

/// Rotten Tomatoes critic weight when both scores are present
pub const CRITIC_WEIGHT: f64 = 0.6;
/// Rotten Tomatoes audience weight when both scores are present
pub const AUDIENCE_WEIGHT: f64 = 0.4;

/// Convert a provider-native rating to the 0-100 scale.
///
/// Returns None (absent) for missing, "N/A", non-numeric or non-finite input,
/// and for a raw score shape that does not belong to `source`. Converted
/// values are clamped to [0, 100].
pub fn normalize(source: RatingSource, raw: &RawScore) -> Option<Score> {
    match (source, raw) {
        (RatingSource::Imdb, RawScore::TenPoint(value)) => {
            let value = parse_rating_text(value.as_deref()?)?;
            Score::new(value / 10.0 * 100.0)
        }
        (RatingSource::Letterboxd, RawScore::FivePoint(value)) => Score::new((*value)? * 20.0),
        (RatingSource::RottenTomatoes, RawScore::Percentages { critic, audience }) => {
            combine_percentages(percentage(*critic), percentage(*audience))
        }
        (source, raw) => {
            tracing::debug!("Ignoring {:?} rating from {}: unexpected scale", raw, source);
            None
        }
    }
}

/// A raw percentage as a score, absent when missing or non-finite
pub fn percentage(value: Option<f64>) -> Option<Score> {
    Score::new(value?)
}

/// Weighted critic/audience average, falling back to whichever is present
pub fn combine_percentages(critic: Option<Score>, audience: Option<Score>) -> Option<Score> {
    match (critic, audience) {
        (Some(c), Some(a)) => Score::new(c.value() * CRITIC_WEIGHT + a.value() * AUDIENCE_WEIGHT),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

fn parse_rating_text(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() || text.eq_ignore_ascii_case("n/a") {
        return None;
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}
