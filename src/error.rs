// Errors raised at the feed-load and search-invocation boundaries. Normal termination conditions
// (no route found within the transfer bound, a round that added no new stops) are not represented
// here; they are reported as data on the search result instead, not as errors.

#[derive(thiserror::Error, Debug)]
pub enum RaptorError {
    #[error("GTFS feed invariant violated: {0}")]
    FeedInvariantViolation(String),

    #[error("unknown stop id: {0}")]
    UnknownStop(String),
}

pub type RaptorResult<T> = Result<T, RaptorError>;
