//! Deduplication and ordering of the merged channel list

use indexmap::IndexMap;
use tracing::info;

use crate::models::{ChannelRecord, IdentityKey};

/// Collapses records sharing an [`IdentityKey`] and orders the result
pub struct MergeStage;

impl MergeStage {
    /// Merge records in processing order, then sort them.
    ///
    /// A later record with the same identity replaces the earlier one but keeps
    /// its slot, so the pre-sort order is first-seen order.
    pub fn process(records: Vec<ChannelRecord>) -> Vec<ChannelRecord> {
        let input_records = records.len();
        let mut merged = Self::deduplicate(records);
        Self::sort(&mut merged);

        info!(
            "Completed merge stage input_records={} output_records={} duplicates_collapsed={}",
            input_records,
            merged.len(),
            input_records - merged.len()
        );

        merged
    }

    pub fn deduplicate(records: Vec<ChannelRecord>) -> Vec<ChannelRecord> {
        let mut merged: IndexMap<IdentityKey, ChannelRecord> =
            IndexMap::with_capacity(records.len());

        for record in records {
            merged.insert(record.identity_key(), record);
        }

        merged.into_values().collect()
    }

    /// Stable sort by (group title or name, name), ordinal string comparison
    pub fn sort(records: &mut [ChannelRecord]) {
        records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    }
}
