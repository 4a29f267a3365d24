//! CLI commands for cogmorph.

pub mod maps;
pub mod merge;
pub mod segment;
pub mod train;

pub use maps::ExtractMapsCommand;
pub use merge::MergeListsCommand;
pub use segment::SegmentCommand;
pub use train::TrainCommand;
