// Output Module
//
// Name templating and persistence of extracted groups.

pub mod template;
pub mod writer;

pub use template::{FileStem, NameFn, NameVars, OutputName, OutputTarget};
pub use writer::{OutputWriter, WrittenArtifact};
