//! Versioned record encoding.
//!
//! Every stored value is `{"version": N, "data": ...}`. A value without that
//! envelope is a version-0 record written by the legacy browser build, with
//! camelCase fields and ISO-8601 dates; it is migrated on read.

use super::error::PersistenceError;
use crate::achievements::AchievementId;
use crate::core::constants::SAVE_SCHEMA_VERSION;
use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub mod keys {
    pub const CURRENCY: &str = "currency";
    pub const GENERATORS: &str = "generators";
    pub const CARDS: &str = "cards";
    pub const COLLECTION: &str = "collection";
    pub const BOOSTERS: &str = "boosters";
    pub const ACHIEVEMENTS: &str = "achievements";
    pub const HAS_RUN_BEFORE: &str = "has_run_before";

    /// Subsystem records in write order.
    pub const RECORDS: [&str; 6] = [CURRENCY, GENERATORS, CARDS, COLLECTION, BOOSTERS, ACHIEVEMENTS];
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u32,
    pub data: T,
}

pub fn encode<T: Serialize>(data: &T) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(&Versioned {
        version: SAVE_SCHEMA_VERSION,
        data,
    })?)
}

/// Parse a stored value, migrating older versions forward.
pub fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, PersistenceError> {
    let value: Value = serde_json::from_str(raw)?;
    let data = match envelope_version(&value) {
        Some(version) if version == SAVE_SCHEMA_VERSION as u64 => match value {
            Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
            other => other,
        },
        Some(version) => {
            return Err(PersistenceError::UnsupportedVersion {
                key: key.to_string(),
                version,
            })
        }
        None => migrate_v0(key, value)?,
    };
    Ok(serde_json::from_value(data)?)
}

fn envelope_version(value: &Value) -> Option<u64> {
    let map = value.as_object()?;
    if map.len() != 2 || !map.contains_key("data") {
        return None;
    }
    map.get("version")?.as_u64()
}

fn migrate_v0(key: &str, value: Value) -> Result<Value, PersistenceError> {
    let fail = |reason: &str| PersistenceError::Migration {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    log::info!("Migrating legacy '{}' record", key);

    match key {
        keys::CURRENCY => {
            let map = value.as_object().ok_or_else(|| fail("expected an object"))?;
            Ok(json!({
                "balance": number(map, &["balance", "currency"]).unwrap_or(0.0),
                "base_click_value": number(map, &["base_click_value", "baseClickValue"]).unwrap_or(1.0),
                "multiplier": number(map, &["multiplier"]).unwrap_or(1.0),
            }))
        }
        keys::GENERATORS => migrate_generators(value).ok_or_else(|| fail("unrecognized generator list")),
        keys::CARDS => migrate_cards(value).ok_or_else(|| fail("unrecognized card list")),
        keys::BOOSTERS => migrate_boosters(value).ok_or_else(|| fail("expected an object")),
        keys::ACHIEVEMENTS => migrate_achievements(value).ok_or_else(|| fail("expected an object")),
        keys::COLLECTION | keys::HAS_RUN_BEFORE => Ok(value),
        _ => Err(fail("unknown key")),
    }
}

fn number(map: &Map<String, Value>, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|n| map.get(*n).and_then(Value::as_f64))
}

fn integer(map: &Map<String, Value>, names: &[&str]) -> Option<u64> {
    names.iter().find_map(|n| {
        map.get(*n).and_then(|v| match v {
            Value::String(s) => s.parse().ok(),
            other => other.as_u64(),
        })
    })
}

fn text<'a>(map: &'a Map<String, Value>, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|n| map.get(*n).and_then(Value::as_str))
}

/// ISO-8601 date string or millisecond epoch to unix seconds.
fn timestamp(map: &Map<String, Value>, names: &[&str]) -> i64 {
    names
        .iter()
        .find_map(|n| match map.get(*n)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s).ok().map(|d| d.timestamp()),
            Value::Number(ms) => ms.as_i64().map(|ms| ms / 1000),
            _ => None,
        })
        .unwrap_or(0)
}

/// Legacy generators were a serialized `Map`: `[[id, generator], ...]`.
/// There is no flush timestamp, so 0 marks it unknown.
fn migrate_generators(value: Value) -> Option<Value> {
    let entries = match &value {
        Value::Object(map) => map.get("generators")?.as_array()?.clone(),
        Value::Array(entries) => entries.clone(),
        _ => return None,
    };

    let mut generators = Vec::new();
    for entry in entries {
        let generator = match entry {
            Value::Array(pair) => pair.get(1)?.as_object()?.clone(),
            Value::Object(map) => map,
            _ => return None,
        };
        let id = text(&generator, &["id"])?;
        let level = integer(&generator, &["level"]).unwrap_or(0);
        let base_production = number(&generator, &["base_production", "baseProduction"]).unwrap_or(0.0);
        let current_production = base_production * level as f64;
        generators.push(json!({
            "id": id,
            "level": level,
            "base_production": base_production,
            "base_cost": number(&generator, &["base_cost", "baseCost"]).unwrap_or(0.0),
            "current_production": current_production,
            "last_purchase_cost": number(&generator, &["last_purchase_cost", "lastPurchaseCost"]).unwrap_or(0.0),
            "description": text(&generator, &["description"]).unwrap_or(""),
        }));
    }
    Some(json!({ "generators": generators, "last_flush_timestamp": 0 }))
}

fn migrate_cards(value: Value) -> Option<Value> {
    let map = value.as_object()?;
    let mut cards = Vec::new();
    for card in map.get("cards")?.as_array()? {
        let card = card.as_object()?;
        let id = integer(card, &["id"])?;
        let name = text(card, &["name"])?;
        let rarity = text(card, &["rarity"])?.to_lowercase();
        let base_value = number(card, &["base_value", "baseValue"]).unwrap_or(0.0).max(0.0).floor() as u64;
        let locked = card
            .get("isLocked")
            .or_else(|| card.get("locked"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        cards.push(json!({
            "id": id,
            "name": name,
            "rarity": rarity,
            "base_value": base_value,
            "copies": integer(card, &["copies", "amount"]).unwrap_or(1),
            "locked": locked,
            "acquired_at": timestamp(card, &["acquiredDate", "acquired_at"]),
        }));
    }
    let next = integer(map, &["next_card_sequence", "nextCardId"]).unwrap_or(1);
    Some(json!({ "cards": cards, "next_card_sequence": next }))
}

fn migrate_boosters(value: Value) -> Option<Value> {
    let map = value.as_object()?;
    let empty = Map::new();
    let pity = map
        .get("pityCounters")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let stats = map
        .get("statistics")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let history: Vec<Value> = map
        .get("boosterHistory")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(Value::as_object)
                .map(|entry| {
                    let cards: Vec<Value> = entry
                        .get("cards")
                        .and_then(Value::as_array)
                        .map(|cards| {
                            cards
                                .iter()
                                .filter_map(Value::as_object)
                                .map(|c| {
                                    json!({
                                        "card_id": integer(c, &["id"]).unwrap_or(0),
                                        "rarity": text(c, &["rarity"]).unwrap_or("common"),
                                    })
                                })
                                .collect()
                        })
                        .unwrap_or_default();
                    json!({
                        "booster_id": text(entry, &["id"]).unwrap_or(""),
                        "booster_type": text(entry, &["type"]).unwrap_or("basic"),
                        "opened_at": timestamp(entry, &["openDate"]),
                        "cards": cards,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(json!({
        "boosters": [],
        "pity": {
            "rare": integer(pity, &["rare"]).unwrap_or(0),
            "epic": integer(pity, &["epic"]).unwrap_or(0),
            "legendary": integer(pity, &["legendary"]).unwrap_or(0),
        },
        "history": history,
        "statistics": {
            "total_opened": integer(stats, &["totalOpened"]).unwrap_or(0),
            "rarity_distribution": stats.get("rarityDistribution").cloned().unwrap_or_else(|| json!({})),
        },
    }))
}

fn is_known_achievement(id: &Value) -> bool {
    serde_json::from_value::<AchievementId>(id.clone()).is_ok()
}

fn migrate_achievements(value: Value) -> Option<Value> {
    let map = value.as_object()?;
    let unlocked: Vec<Value> = map
        .get("unlockedAchievements")
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter(|id| is_known_achievement(id)).cloned().collect())
        .unwrap_or_default();
    let progressive: Vec<Value> = map
        .get("progressiveStates")
        .and_then(Value::as_array)
        .map(|states| {
            states
                .iter()
                .filter_map(Value::as_object)
                .filter(|s| s.get("id").is_some_and(is_known_achievement))
                .map(|s| {
                    json!({
                        "id": s.get("id").cloned().unwrap_or(Value::Null),
                        "current_level": integer(s, &["currentLevel"]).unwrap_or(0),
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    Some(json!({ "unlocked": unlocked, "progressive_levels": progressive }))
}
