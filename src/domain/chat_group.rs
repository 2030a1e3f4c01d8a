use chrono::{DateTime, Duration, Utc};

use super::Chat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBucket {
    Today,
    Yesterday,
    Previous7Days,
    Previous30Days,
    Older,
}

impl DateBucket {
    pub fn label(&self) -> &'static str {
        match self {
            DateBucket::Today => "Today",
            DateBucket::Yesterday => "Yesterday",
            DateBucket::Previous7Days => "Previous 7 Days",
            DateBucket::Previous30Days => "Previous 30 Days",
            DateBucket::Older => "Older",
        }
    }

    const ORDER: [DateBucket; 5] = [
        DateBucket::Today,
        DateBucket::Yesterday,
        DateBucket::Previous7Days,
        DateBucket::Previous30Days,
        DateBucket::Older,
    ];
}

#[derive(Debug, Clone)]
pub struct ChatGroup<'a> {
    pub bucket: DateBucket,
    pub chats: Vec<&'a Chat>,
}

/// Buckets chats by creation day relative to the start of `now`'s (UTC) day.
/// Empty buckets are omitted; chats keep their input order within a bucket.
pub fn group_chats_by_date(chats: &[Chat], now: DateTime<Utc>) -> Vec<ChatGroup<'_>> {
    let today = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now);
    let yesterday = today - Duration::days(1);
    let last_7_days = today - Duration::days(7);
    let last_30_days = today - Duration::days(30);

    let bucket_of = |created_at: DateTime<Utc>| {
        if created_at >= today {
            DateBucket::Today
        } else if created_at >= yesterday {
            DateBucket::Yesterday
        } else if created_at >= last_7_days {
            DateBucket::Previous7Days
        } else if created_at >= last_30_days {
            DateBucket::Previous30Days
        } else {
            DateBucket::Older
        }
    };

    DateBucket::ORDER
        .iter()
        .filter_map(|bucket| {
            let members: Vec<&Chat> = chats
                .iter()
                .filter(|chat| bucket_of(chat.created_at) == *bucket)
                .collect();
            (!members.is_empty()).then_some(ChatGroup {
                bucket: *bucket,
                chats: members,
            })
        })
        .collect()
}
