//! Pipeline stage implementations
//!
//! Each stage is a plain struct called in order by the
//! [`Curator`](crate::pipeline::Curator).

pub mod dedup;
pub mod generation;
pub mod matching;
pub mod static_entries;

pub use dedup::MergeStage;
pub use generation::GenerationStage;
pub use matching::{
    ChannelMatcher, GroupMappings, MatchedSource, RulePattern, TargetRule, repair_extinf_separators,
};
pub use static_entries::StaticEntryProvider;
