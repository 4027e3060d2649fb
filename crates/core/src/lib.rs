//! Domain types and pure logic for the embryoseq annotation engine.
//!
//! This crate owns everything that does not touch the network: the
//! developmental [`Phase`](phase::Phase) vocabulary, the
//! [`Frame`](frame::Frame) and [`FrameSequence`](sequence::FrameSequence)
//! store, annotation propagation, natural filename ordering, and record
//! metadata with its validation rules.

pub mod error;
pub mod frame;
pub mod metadata;
pub mod ordering;
pub mod phase;
pub mod sequence;
pub mod types;

pub use error::CoreError;
pub use frame::{Frame, FrameLocation, SourceFrame, UploadFrame};
pub use metadata::{KaryotypeResult, LiveBirthOutcome, RecordMetadata};
pub use phase::Phase;
pub use sequence::{AnnotationEntry, FrameSequence, SequenceVersion};
