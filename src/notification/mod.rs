//! Notification records and the feed that holds the current list.

mod feed;
mod types;

pub use feed::{FeedEvent, NotificationFeed};
pub use types::{
    parse_notification_list, Notification, NotificationBuilder, RichObject, RichParameters,
};
