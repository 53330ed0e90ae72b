//! Command-line argument definitions using clap.

use clap::{ArgGroup, Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, FeedType, MediaKind, RunMode};

/// Bluesky media archiver CLI.
#[derive(Parser, Debug)]
#[command(
    name = "bsky-media-archiver",
    version,
    about = "Archive liked, reposted and authored Bluesky posts with their media",
    long_about = "Lists an account's likes, reposts or posts, fetches each referenced post,\n\
                  downloads its images or video, and remembers what was already archived\n\
                  in a local ledger so repeated runs only fetch what is new."
)]
#[command(group(ArgGroup::new("run_mode").args(["restore", "delete_account"])))]
pub struct Args {
    /// Account handle, e.g. alice.bsky.social.
    #[arg(short = 'H', long, env = "BSKY_HANDLE")]
    pub handle: Option<String>,

    /// Account DID, e.g. did:plc:abc123. Takes precedence over --handle.
    #[arg(long, env = "BSKY_DID")]
    pub did: Option<String>,

    /// Archive posts authored by the account.
    #[arg(long)]
    pub post: bool,

    /// Archive posts the account liked.
    #[arg(long)]
    pub like: bool,

    /// Archive posts the account reposted.
    #[arg(long)]
    pub repost: bool,

    /// Directory blobs and JSON files are written to.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Concurrent workers for detail fetches and downloads.
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Maximum records to list per feed type.
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Records requested per listing page (1-100).
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Only download posts carrying these media types.
    #[arg(long, value_enum, value_delimiter = ',', num_args = 1..)]
    pub media_types: Option<Vec<MediaKindArg>>,

    /// Filename template. Placeholders: {RKEY} {HANDLE} {TEXT} {DID} {DISPLAY_NAME}.
    #[arg(long = "format")]
    pub filename_format: Option<String>,

    /// Ledger database location.
    #[arg(long)]
    pub database: Option<PathBuf>,

    /// Re-download everything recorded in the ledger for the account.
    #[arg(long)]
    pub restore: bool,

    /// Remove every ledger row for the account.
    #[arg(long)]
    pub delete_account: bool,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Hide progress bars.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI media type argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MediaKindArg {
    Image,
    Video,
}

impl From<MediaKindArg> for MediaKind {
    fn from(arg: MediaKindArg) -> Self {
        match arg {
            MediaKindArg::Image => MediaKind::Image,
            MediaKindArg::Video => MediaKind::Video,
        }
    }
}

impl Args {
    /// Feed types selected by flags, in listing order.
    pub fn feed_types(&self) -> Vec<FeedType> {
        let mut feed_types = Vec::new();
        if self.post {
            feed_types.push(FeedType::Post);
        }
        if self.like {
            feed_types.push(FeedType::Like);
        }
        if self.repost {
            feed_types.push(FeedType::Repost);
        }
        feed_types
    }

    /// Run mode selected by flags.
    pub fn mode(&self) -> RunMode {
        if self.delete_account {
            RunMode::DeleteAccount
        } else if self.restore {
            RunMode::Restore
        } else {
            RunMode::Archive
        }
    }

    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) {
        config.options.mode = self.mode();

        let feed_types = self.feed_types();
        if !feed_types.is_empty() {
            config.options.feed_types = feed_types;
        }

        // A DID or handle on the command line replaces both file values
        if self.did.is_some() || self.handle.is_some() {
            config.account.did = self.did;
            config.account.handle = self.handle;
        }

        if let Some(dir) = self.download_directory {
            config.options.download_directory = Some(dir);
        }

        if let Some(threads) = self.threads {
            config.options.threads = threads;
        }

        if let Some(limit) = self.limit {
            config.options.limit = Some(limit);
        }

        if let Some(page_size) = self.page_size {
            config.options.page_size = page_size;
        }

        if let Some(media_types) = self.media_types {
            config.options.media_types = media_types.into_iter().map(Into::into).collect();
        }

        if let Some(format) = self.filename_format {
            config.options.filename_format = format;
        }

        if let Some(database) = self.database {
            config.options.database_path = Some(database);
        }

        if self.quiet {
            config.options.show_progress = false;
        }
    }
}
