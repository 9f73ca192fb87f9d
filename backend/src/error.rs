use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("degenerate geometry: {0}")]
    GeometryDegenerate(String),
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("road snapping returned {actual} points for {expected} inputs")]
    SnapCountMismatch { expected: usize, actual: usize },
    #[error("malformed route: {0}")]
    MalformedRoute(String),
    #[error("no safety weight for cell ({lat:.3}, {lng:.3})")]
    UnscoredCell { lat: f64, lng: f64 },
    #[error("{found} candidate route(s) survived, at least {required} required")]
    InsufficientCandidates { found: usize, required: usize },
    #[error("{point_routes} point routes cannot be scored against {candidates} candidates")]
    ScoreAlignment {
        point_routes: usize,
        candidates: usize,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to build GPX document: {0}")]
    Gpx(#[from] gpx::errors::GpxError),
}

impl RouteError {
    /// Provider failures only cost the candidate they belong to.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ProviderUnavailable(_))
    }
}
