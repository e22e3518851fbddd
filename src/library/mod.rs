pub mod grouper;
pub mod models;

pub use grouper::{group_owned_series, OwnedSeries};
pub use models::{BookRecord, OwnedItem, RatingRecord, SeriesState};
