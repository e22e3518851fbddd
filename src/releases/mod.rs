//! New-release detection: probe series listings and report unowned books

pub mod fanout;
pub mod probe;
pub mod report;

pub use fanout::{probe_all, FanOut};
pub use probe::{HttpListingSource, ListingParser, ReleaseProber};
pub use report::{render_failures, render_releases, ReleaseReport};
