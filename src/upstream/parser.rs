//! Catalog Response Parser
//!
//! Converts the catalog's XML into domain records. A malformed `<item>` is
//! skipped with a warning; only a document that is not XML at all fails the
//! whole response.

use roxmltree::{Document, Node};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{CatalogError, Result};
use crate::upstream::{GameRecord, SearchResult};

/// Poll summarising the community's suggested player counts
const PLAYER_COUNT_POLL: &str = "suggested_numplayers";
/// Result entry inside [`PLAYER_COUNT_POLL`] holding the "best with" vote
const BEST_WITH_RESULT: &str = "bestwith";
const CATEGORY_LINK: &str = "boardgamecategory";

// == Item Skip ==
/// Why a single catalog item was dropped. Logged, never returned to callers.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ItemSkip {
    #[error("missing required field `{0}`")]
    Missing(&'static str),

    #[error("field `{field}` is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },
}

// == Public Parsers ==
/// Parses a "fetch by ids" response into full records.
pub fn parse_games(xml: &str) -> Result<Vec<GameRecord>> {
    let doc = parse_document(xml)?;

    let mut games = Vec::new();
    for item in items(&doc) {
        match parse_game(item) {
            Ok(game) => games.push(game),
            Err(reason) => {
                warn!(id = item.attribute("id").unwrap_or("?"), %reason, "skipping catalog item");
            }
        }
    }

    debug!(count = games.len(), "parsed game records");
    Ok(games)
}

/// Parses a "search" response into `{id, name}` pairs.
///
/// Only items with a primary name are kept.
pub fn parse_search(xml: &str) -> Result<Vec<SearchResult>> {
    let doc = parse_document(xml)?;

    let results = items(&doc)
        .filter_map(|item| {
            let id = non_empty(item.attribute("id"));
            let name = primary_name(item);
            match (id, name) {
                (Some(id), Some(name)) => Some(SearchResult::new(id, name)),
                _ => {
                    debug!(id = item.attribute("id").unwrap_or("?"), "search item without primary name");
                    None
                }
            }
        })
        .collect();

    Ok(results)
}

// == Document Helpers ==
fn parse_document(xml: &str) -> Result<Document<'_>> {
    Document::parse(xml)
        .map_err(|err| CatalogError::Unavailable(format!("malformed catalog response: {err}")))
}

fn items<'a, 'input>(doc: &'a Document<'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    doc.root_element()
        .children()
        .filter(|n| n.has_tag_name("item"))
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// == Item Parsing ==
fn parse_game(item: Node) -> std::result::Result<GameRecord, ItemSkip> {
    let id = non_empty(item.attribute("id")).ok_or(ItemSkip::Missing("id"))?;
    let name = resolve_name(item).ok_or(ItemSkip::Missing("name"))?;
    let image_url = child_text(item, "image")
        .or_else(|| child_text(item, "thumbnail"))
        .ok_or(ItemSkip::Missing("image"))?;
    let min_players = required_number(item, "minplayers")?;
    let max_players = required_number(item, "maxplayers")?;

    Ok(GameRecord {
        id,
        name,
        description: child_text(item, "description").unwrap_or_default(),
        image_url,
        min_players,
        max_players,
        recommended_players: recommended_players(item),
        average_play_time: optional_number(item, "playingtime"),
        min_age: optional_number(item, "minage"),
        genres: genres(item),
    })
}

/// Prefers the name flagged primary, otherwise the first one listed.
fn resolve_name(item: Node) -> Option<String> {
    let names: Vec<Node> = item
        .children()
        .filter(|n| n.has_tag_name("name"))
        .collect();
    let chosen = names
        .iter()
        .find(|n| n.attribute("type") == Some("primary"))
        .or_else(|| names.first())?;
    name_value(*chosen)
}

fn primary_name(item: Node) -> Option<String> {
    item.children()
        .filter(|n| n.has_tag_name("name"))
        .find(|n| n.attribute("type") == Some("primary"))
        .and_then(name_value)
}

fn name_value(name: Node) -> Option<String> {
    non_empty(name.attribute("value")).or_else(|| non_empty(name.text()))
}

fn child_text(item: Node, tag: &str) -> Option<String> {
    child(item, tag).and_then(|n| non_empty(n.text()))
}

fn required_number(item: Node, tag: &'static str) -> std::result::Result<u32, ItemSkip> {
    let raw = child(item, tag)
        .and_then(|n| non_empty(n.attribute("value")))
        .ok_or(ItemSkip::Missing(tag))?;
    raw.parse().map_err(|_| ItemSkip::NotANumber {
        field: tag,
        value: raw,
    })
}

fn optional_number(item: Node, tag: &'static str) -> Option<u32> {
    required_number(item, tag).ok()
}

fn recommended_players(item: Node) -> Option<u32> {
    item.children()
        .filter(|n| n.has_tag_name("poll-summary"))
        .filter(|n| n.attribute("name").map_or(true, |name| name == PLAYER_COUNT_POLL))
        .flat_map(|poll| poll.children())
        .find(|n| n.has_tag_name("result") && n.attribute("name") == Some(BEST_WITH_RESULT))
        .and_then(|result| result.attribute("value"))
        .and_then(leading_integer)
}

fn genres(item: Node) -> Vec<String> {
    item.children()
        .filter(|n| n.has_tag_name("link") && n.attribute("type") == Some(CATEGORY_LINK))
        .filter_map(|n| non_empty(n.attribute("value")))
        .collect()
}

/// First run of ASCII digits in `text`, e.g. "Best with 4 players" -> 4.
pub fn leading_integer(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
