//! Serialized node tree and the diagnostic transcript

mod serialized_node;
mod transcript;

pub use serialized_node::SerializedNode;
pub use transcript::LineLevel;
pub use transcript::Transcript;
pub use transcript::TranscriptLine;
