use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Image shown when a record carries neither artwork nor a default sprite.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.png";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pokemon {
    pub id: i32,
    pub name: String,
    pub types: Vec<NamedResource>,
    pub stats: Vec<PokemonStat>,
    pub abilities: Vec<PokemonAbility>,
    pub sprites: PokemonSprites,
    pub height: i32,
    pub weight: i32,
    pub base_experience: Option<i32>,
    #[serde(rename = "cachedAt")]
    pub cached_at: DateTime<Utc>,
    #[serde(
        rename = "expiresAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PokemonStat {
    pub base_stat: i32,
    pub effort: i32,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PokemonAbility {
    pub ability: NamedResource,
    pub is_hidden: bool,
    pub slot: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PokemonSprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
    pub back_default: Option<String>,
    pub back_shiny: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other: Option<OtherSprites>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OtherSprites {
    #[serde(
        rename = "official-artwork",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub official_artwork: Option<ArtworkSprites>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtworkSprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
}

impl PokemonSprites {
    #[must_use]
    pub fn official_artwork(&self) -> Option<&str> {
        self.other
            .as_ref()
            .and_then(|o| o.official_artwork.as_ref())
            .and_then(|a| a.front_default.as_deref())
    }
}

impl Pokemon {
    /// Picks the best image for the record: official artwork, then the
    /// default front sprite, then [`PLACEHOLDER_IMAGE`].
    #[must_use]
    pub fn display_image(&self) -> &str {
        self.sprites
            .official_artwork()
            .or(self.sprites.front_default.as_deref())
            .unwrap_or(PLACEHOLDER_IMAGE)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.name.as_str())
    }

    #[must_use]
    pub fn has_type_matching(&self, fragment: &str) -> bool {
        let fragment = fragment.to_lowercase();
        self.type_names()
            .any(|name| name.to_lowercase().contains(&fragment))
    }
}

/// A lookup key accepted by the provider and the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Id(i32),
    Name(String),
}

impl Identifier {
    /// Normalizes raw input (trim, lowercase). Returns `None` when nothing is left.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        Some(
            normalized
                .parse::<i32>()
                .map_or(Self::Name(normalized), Self::Id),
        )
    }

    #[must_use]
    pub const fn as_id(&self) -> Option<i32> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Name(_) => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Name(name) => f.write_str(name),
        }
    }
}

/// The per-date pointer selecting the Pokémon of the day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPick {
    pub date: String,
    pub pokemon_id: i32,
    /// Weak back-reference to the stored row; lookup convenience only.
    pub pokemon_ref: Option<i32>,
    pub expires_at: DateTime<Utc>,
}

/// Current time at the precision the store keeps, so a fetched record and
/// its stored copy compare equal.
#[must_use]
pub fn cache_timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[must_use]
pub fn date_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}
