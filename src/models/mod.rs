pub mod events;
pub mod recommendation;

pub use events::{AdEventType, AdView, AdvertiserRecord, ProductView};
pub use recommendation::{
    finite_or_null, Model, RankingRecord, TopCtrEntry, TopProductEntry, TOP_N,
};
