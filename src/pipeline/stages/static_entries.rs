use tracing::debug;

use crate::config::StaticEntry;
use crate::models::{ATTR_GROUP_TITLE, ATTR_TVG_ID, ChannelRecord};
use crate::pipeline::stages::matching::GroupMappings;

/// Channels that no remote source carries
pub struct StaticEntryProvider;

impl StaticEntryProvider {
    /// One live record per entry: `group-title` from the group mapping, `tvg-id`
    /// set to the name, then the entry's own attributes on top.
    pub fn records(entries: &[StaticEntry], groups: &GroupMappings) -> Vec<ChannelRecord> {
        entries
            .iter()
            .map(|entry| {
                let mut record = ChannelRecord::new(entry.name.as_str(), entry.url.as_str());
                record
                    .attributes
                    .insert(ATTR_GROUP_TITLE, groups.group_for(&entry.name));
                record.attributes.insert(ATTR_TVG_ID, entry.name.as_str());
                record.attributes.extend(
                    entry
                        .attributes
                        .iter()
                        .map(|(key, value)| (key.as_str(), value.as_str())),
                );

                debug!("Adding static channel channel={}", record);
                record
            })
            .collect()
    }
}
