use chrono::{DateTime, Utc};

use crate::models::Chat;

/// Recency bucket of a conversation, by calendar day (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DateBucket {
    Today,
    Yesterday,
    Last7Days,
    Last30Days,
    Older,
}

impl DateBucket {
    pub const ALL: [DateBucket; 5] = [
        DateBucket::Today,
        DateBucket::Yesterday,
        DateBucket::Last7Days,
        DateBucket::Last30Days,
        DateBucket::Older,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DateBucket::Today => "Today",
            DateBucket::Yesterday => "Yesterday",
            DateBucket::Last7Days => "Last 7 days",
            DateBucket::Last30Days => "Last 30 days",
            DateBucket::Older => "Older",
        }
    }

    pub fn of(time: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let days = (now.date_naive() - time.date_naive()).num_days();
        match days {
            i64::MIN..=0 => DateBucket::Today,
            1 => DateBucket::Yesterday,
            2..=7 => DateBucket::Last7Days,
            8..=30 => DateBucket::Last30Days,
            _ => DateBucket::Older,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatGroup {
    pub bucket: DateBucket,
    pub chats: Vec<Chat>,
}

/// Split `chats` into recency buckets.
///
/// Buckets come out newest first and empty ones are omitted; within a
/// bucket the input order is kept.
pub fn group_by_date(chats: &[Chat], now: DateTime<Utc>) -> Vec<ChatGroup> {
    DateBucket::ALL
        .iter()
        .filter_map(|bucket| {
            let members: Vec<Chat> = chats
                .iter()
                .filter(|c| DateBucket::of(c.update_time, now) == *bucket)
                .cloned()
                .collect();
            (!members.is_empty()).then(|| ChatGroup {
                bucket: *bucket,
                chats: members,
            })
        })
        .collect()
}
