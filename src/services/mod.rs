//! Service layer: parsing, feed ingestion, duplicate detection, reconciliation

pub mod duplicate;
pub mod reconcile;
pub mod release_parser;
pub mod rss;

pub use duplicate::{DetectionError, DuplicateDetector};
pub use reconcile::{
    DownloadTrigger, LogOnlyTrigger, ReconcileService, ReconcileSummary, SKIP_DUPLICATE_EPISODE,
};
pub use release_parser::{ParsedRelease, normalize_title, parse_release};
pub use rss::{FeedItem, RssService};
