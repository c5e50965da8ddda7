//! Video and series bookkeeping around the streaming and progress core.
//!
//! Upload transport and frame extraction happen elsewhere; this module
//! records their results and owns deletion.

pub mod catalog;
pub mod previews;

pub use catalog::{add_episode, create_series, register_video};
pub use previews::{
    append_previews, delete_previews, delete_video_asset, generate_previews, PreviewOptions,
    PreviewTranscoder,
};
