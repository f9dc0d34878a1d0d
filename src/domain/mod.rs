pub mod cache;
pub mod feed_item;
pub mod record;
pub mod target;

pub use cache::{Cache, CacheEntry, CacheStats, ChangeStatus, CACHE_VERSION};
pub use feed_item::{ChannelFeed, FeedItem, FeedItemKey};
pub use record::{take_first, Engagement, ExtractedRecord, RecordKey};
pub use target::{by_priority, Target, TargetKind};
