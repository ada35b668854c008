use serde::Serialize;

/// The rating providers a lookup consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingSource {
    /// OMDb, serving IMDb ratings on a 0-10 scale
    Imdb,
    /// Letterboxd average rating, scraped, 0-5 scale
    Letterboxd,
    /// Rotten Tomatoes critic/audience percentages, scraped
    RottenTomatoes,
}

impl RatingSource {
    /// Sources whose "not found" answer fails the whole lookup
    pub fn is_mandatory(&self) -> bool {
        !matches!(self, RatingSource::RottenTomatoes)
    }
}

impl std::fmt::Display for RatingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RatingSource::Imdb => write!(f, "IMDb"),
            RatingSource::Letterboxd => write!(f, "Letterboxd"),
            RatingSource::RottenTomatoes => write!(f, "Rotten Tomatoes"),
        }
    }
}

/// A rating on the common 0-100 scale.
///
/// Only constructible through [`Score::new`], which rejects non-finite input
/// and clamps everything else into range. An absent rating is `Option::None`,
/// so a real zero and "no data" never collapse into the same value.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Score(f64);

impl Score {
    pub const MIN: f64 = 0.0;
    pub const MAX: f64 = 100.0;

    pub fn new(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Some(Self(value.clamp(Self::MIN, Self::MAX)))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Round to two decimal places
    pub fn rounded(&self) -> Self {
        Self((self.0 * 100.0).round() / 100.0)
    }
}

/// Rotten Tomatoes breakdown as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RottenTomatoesScores {
    pub critic_score: Option<Score>,
    pub audience_score: Option<Score>,
    /// Weighted combination of critic and audience scores
    pub aggregate_score: Option<Score>,
}

impl RottenTomatoesScores {
    pub fn absent() -> Self {
        Self {
            critic_score: None,
            audience_score: None,
            aggregate_score: None,
        }
    }
}

/// Combined ratings for one title, serialized as the `/movie/{title}` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub title: String,
    pub imdb_score: Option<Score>,
    pub letterboxd_score: Option<Score>,
    /// Omitted entirely when the Rotten Tomatoes source is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotten_tomatoes: Option<RottenTomatoesScores>,
    pub aggregate_score: Score,
    pub year: Option<String>,
    #[serde(rename = "poster")]
    pub poster_url: Option<String>,
}
