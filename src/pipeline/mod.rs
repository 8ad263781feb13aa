//! Curation pipeline
//!
//! - **Stages**: matching, static entries, merge and generation
//! - **Orchestrator**: runs the stages for every configured source

pub mod orchestrator;
pub mod stages;

pub use orchestrator::{Curator, RunSummary};
pub use stages::{
    ChannelMatcher, GenerationStage, GroupMappings, MergeStage, StaticEntryProvider, TargetRule,
};
