use std::time::Duration;

/// Outcome counters for a single mirror.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MirrorSummary {
    pub group: String,
    pub mirror: String,
    pub planned_files: usize,
    pub uploaded_files: usize,
    pub cached_files: usize,
    pub failed_files: usize,
    pub unneeded_objects: usize,
    pub total_bytes: u64,
    pub dry_run: bool,
}

impl MirrorSummary {
    pub fn is_up_to_date(&self) -> bool {
        self.planned_files == 0
    }
}

/// Summary of a whole configuration run.
#[derive(Clone, Debug, Default)]
pub struct SyncSummary {
    pub mirrors: Vec<MirrorSummary>,
    pub dry_run: bool,
    pub duration: Duration,
}

impl SyncSummary {
    pub fn planned_files(&self) -> usize {
        self.mirrors.iter().map(|m| m.planned_files).sum()
    }

    pub fn uploaded_files(&self) -> usize {
        self.mirrors.iter().map(|m| m.uploaded_files).sum()
    }

    pub fn cached_files(&self) -> usize {
        self.mirrors.iter().map(|m| m.cached_files).sum()
    }

    pub fn failed_files(&self) -> usize {
        self.mirrors.iter().map(|m| m.failed_files).sum()
    }

    pub fn unneeded_objects(&self) -> usize {
        self.mirrors.iter().map(|m| m.unneeded_objects).sum()
    }

    pub fn total_bytes(&self) -> u64 {
        self.mirrors.iter().map(|m| m.total_bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_add_up_across_mirrors() {
        let summary = SyncSummary {
            mirrors: vec![
                MirrorSummary {
                    planned_files: 3,
                    uploaded_files: 2,
                    failed_files: 1,
                    total_bytes: 10,
                    ..Default::default()
                },
                MirrorSummary {
                    planned_files: 2,
                    cached_files: 2,
                    unneeded_objects: 4,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        assert_eq!(summary.planned_files(), 5);
        assert_eq!(summary.uploaded_files(), 2);
        assert_eq!(summary.cached_files(), 2);
        assert_eq!(summary.failed_files(), 1);
        assert_eq!(summary.unneeded_objects(), 4);
        assert_eq!(summary.total_bytes(), 10);
        assert!(MirrorSummary::default().is_up_to_date());
    }
}
