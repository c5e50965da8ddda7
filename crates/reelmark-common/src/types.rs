//! Core domain types shared between the database and server crates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::ids::{EpisodeId, MovieId};

/// Playback offset inside a video, in milliseconds.
///
/// Unsigned so a negative offset cannot be represented.
pub type TrackId = u64;

/// The kind of a stored video asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoKind {
    /// A standalone movie.
    Movie,
    /// One episode of a series.
    Episode,
}

impl VideoKind {
    /// The lowercase name stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoKind::Movie => "movie",
            VideoKind::Episode => "episode",
        }
    }
}

impl fmt::Display for VideoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VideoKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(VideoKind::Movie),
            "episode" => Ok(VideoKind::Episode),
            other => Err(format!("unknown video kind: {other}")),
        }
    }
}

/// A logical reference to a playable video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoRef {
    Movie(MovieId),
    Episode(EpisodeId),
}

impl VideoRef {
    /// Build a reference from a stored kind and row id.
    pub fn from_parts(kind: VideoKind, id: Uuid) -> Self {
        match kind {
            VideoKind::Movie => VideoRef::Movie(MovieId::from(id)),
            VideoKind::Episode => VideoRef::Episode(EpisodeId::from(id)),
        }
    }

    pub fn kind(&self) -> VideoKind {
        match self {
            VideoRef::Movie(_) => VideoKind::Movie,
            VideoRef::Episode(_) => VideoKind::Episode,
        }
    }

    pub fn uuid(&self) -> Uuid {
        match self {
            VideoRef::Movie(id) => *id.as_uuid(),
            VideoRef::Episode(id) => *id.as_uuid(),
        }
    }
}

impl fmt::Display for VideoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.uuid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_kind_parse() {
        assert_eq!("movie".parse::<VideoKind>().unwrap(), VideoKind::Movie);
        assert_eq!("episode".parse::<VideoKind>().unwrap(), VideoKind::Episode);
        assert!("trailer".parse::<VideoKind>().is_err());
    }

    #[test]
    fn video_kind_serde() {
        let json = serde_json::to_string(&VideoKind::Episode).unwrap();
        assert_eq!(json, "\"episode\"");
    }

    #[test]
    fn video_ref_parts() {
        let id = MovieId::new();
        let r = VideoRef::Movie(id);
        assert_eq!(r.kind(), VideoKind::Movie);
        assert_eq!(r.uuid(), *id.as_uuid());
        assert_eq!(VideoRef::from_parts(VideoKind::Movie, r.uuid()), r);
    }
}
