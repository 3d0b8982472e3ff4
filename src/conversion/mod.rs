//! File conversion module.
//!
//! Provides the pipeline that turns an input file into a stored record:
//! audio is decoded and re-encoded as WAV, anything else is kept verbatim.

pub mod pipeline;

// Re-export commonly used items
pub use pipeline::{
    convert, convert_with_progress, ConversionKind, ConversionOutcome, ConversionStage,
    ConvertRequest, CANCEL_UNSUPPORTED_MESSAGE,
};
