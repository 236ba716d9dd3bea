use crate::error::SweepError;
use crate::services::scoring::ScoredResult;
use std::path::{Path, PathBuf};

/// Destination for the final ranked result list. The core only guarantees it
/// hands over a fully-formed, score-descending list; persistence failures are
/// reported but never corrupt the in-memory results.
pub trait ResultSink {
    /// Writes the ranked list under `dir` using `name` as the base filename
    /// and returns the path of the primary artifact.
    fn write_ranked(
        &self,
        dir: &Path,
        name: &str,
        results: &[ScoredResult],
    ) -> Result<PathBuf, SweepError>;
}
