use crate::records::EvaluationReport;
use ahash::AHashSet;

/// Running per-user precision/recall means
#[derive(Debug, Clone, Default)]
pub struct MetricAccumulator {
    precision_sum: f64,
    recall_sum: f64,
    users: usize,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one user's outcome. Users with nothing liked are skipped and
    /// do not count toward the mean; returns whether the user was counted.
    pub fn add<S: AsRef<str>>(&mut self, recommended: &[S], liked: &[S]) -> bool {
        if liked.is_empty() {
            return false;
        }

        let liked_set: AHashSet<&str> = liked.iter().map(AsRef::as_ref).collect();
        let recommended_set: AHashSet<&str> = recommended.iter().map(AsRef::as_ref).collect();
        let hits = recommended_set.intersection(&liked_set).count() as f64;

        if !recommended.is_empty() {
            self.precision_sum += hits / recommended.len() as f64;
        }
        self.recall_sum += hits / liked_set.len() as f64;
        self.users += 1;
        true
    }

    pub fn users(&self) -> usize {
        self.users
    }

    pub fn finish(&self) -> EvaluationReport {
        if self.users == 0 {
            return EvaluationReport::default();
        }
        let precision = self.precision_sum / self.users as f64;
        let recall = self.recall_sum / self.users as f64;
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        EvaluationReport {
            precision,
            recall,
            f1_score,
            test_users_count: self.users,
        }
    }
}
