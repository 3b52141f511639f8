//! Domain records produced from catalog responses.

use serde::{Deserialize, Serialize};

// == Game Record ==
/// Full metadata for one board game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub min_players: u32,
    pub max_players: u32,
    /// Community "best with N players" vote
    #[serde(default)]
    pub recommended_players: Option<u32>,
    /// Average play time in minutes
    #[serde(default)]
    pub average_play_time: Option<u32>,
    #[serde(default)]
    pub min_age: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
}

// == Search Result ==
/// Lightweight projection returned by free-text search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub name: String,
}

impl SearchResult {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
