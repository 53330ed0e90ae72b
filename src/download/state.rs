//! Run statistics.

/// What happened to a single enriched post in the blob writer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PostOutcome {
    pub images: u64,
    pub videos: u64,
    pub json_files: u64,
    pub failed_blobs: u64,
    /// Ledger rows were written for this post.
    pub recorded: bool,
    /// At least one of those rows was new.
    pub new_rows: bool,
}

impl PostOutcome {
    pub fn is_complete(&self) -> bool {
        self.failed_blobs == 0
    }
}

/// Counters for one archive or restore run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// References returned by listing (or by the ledger on restore).
    pub listed: u64,
    /// References skipped because the ledger already has them.
    pub skipped: u64,
    /// References whose post no longer exists.
    pub missing: u64,
    /// References dropped by the media type filter.
    pub filtered: u64,
    /// References lost to detail chunks that exhausted retries.
    pub failed_lookups: u64,
    pub images: u64,
    pub videos: u64,
    pub json_files: u64,
    pub failed_blobs: u64,
    /// Posts whose ledger rows were written.
    pub posts_recorded: u64,
    /// Posts that contributed at least one new ledger row.
    pub new_posts: u64,
}

impl RunStats {
    /// Fold in the outcome of one post.
    pub fn add_outcome(&mut self, outcome: &PostOutcome) {
        self.images += outcome.images;
        self.videos += outcome.videos;
        self.json_files += outcome.json_files;
        self.failed_blobs += outcome.failed_blobs;
        if outcome.recorded {
            self.posts_recorded += 1;
        }
        if outcome.new_rows {
            self.new_posts += 1;
        }
    }

    /// Fold in the blob-writer counters of another run.
    pub fn add_downloads(&mut self, other: &RunStats) {
        self.images += other.images;
        self.videos += other.videos;
        self.json_files += other.json_files;
        self.failed_blobs += other.failed_blobs;
        self.posts_recorded += other.posts_recorded;
        self.new_posts += other.new_posts;
    }

    /// Total blobs written.
    pub fn total_downloaded(&self) -> u64 {
        self.images + self.videos
    }

    pub fn has_failures(&self) -> bool {
        self.failed_blobs > 0 || self.failed_lookups > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_outcome() {
        let mut stats = RunStats::default();
        stats.add_outcome(&PostOutcome {
            images: 2,
            json_files: 1,
            recorded: true,
            new_rows: true,
            ..Default::default()
        });
        stats.add_outcome(&PostOutcome {
            videos: 1,
            json_files: 1,
            failed_blobs: 1,
            ..Default::default()
        });

        assert_eq!(stats.total_downloaded(), 3);
        assert_eq!(stats.json_files, 2);
        assert_eq!(stats.posts_recorded, 1);
        assert_eq!(stats.new_posts, 1);
        assert!(stats.has_failures());
    }
}
