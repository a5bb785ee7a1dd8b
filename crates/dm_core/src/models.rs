use crate::types::ClassificationResult;

/// A text classifier the pipeline can drive.
///
/// Implementations never fail: internal faults degrade to
/// [`ClassificationResult::degraded`] and are logged.
pub trait Classify: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Classify a title/content pair.
    fn classify(&self, title: &str, content: &str) -> ClassificationResult;
}
