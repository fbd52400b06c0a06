pub mod encoding;
pub mod extract;
pub mod matching;
pub mod merge;
pub mod store;
pub mod workflow;
