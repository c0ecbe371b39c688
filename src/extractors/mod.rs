// Extractors Module
//
// Classification of media params into keys and the tree walk that groups
// matched blocks by key.

pub mod classifier;
pub mod media;

pub use classifier::QueryClassifier;
pub use media::{ExtractMode, MediaExtractor, MediaGroups, QueryGroup};
