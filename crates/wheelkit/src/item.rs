use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumIter, EnumString};

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct ItemId(String);

crate::impl_string_newtype!(ItemId);

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct PosterUrl(String);

crate::impl_string_newtype!(PosterUrl);

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    StrumDisplay,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[strum(to_string = "movie", serialize = "film")]
    Movie,
    #[strum(to_string = "tv", serialize = "series", serialize = "show")]
    Tv,
    Anime,
    #[strum(to_string = "game", serialize = "games")]
    Game,
    #[strum(to_string = "book", serialize = "books")]
    Book,
}

/// Whether an entry comes from the media catalog or from a user-defined virtual
/// collection. Both can share ids, so hit keys carry the kind as a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    #[default]
    Catalog,
    Collection,
}

impl ItemKind {
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::Catalog => "item",
            Self::Collection => "collection",
        }
    }
}

/// Back-reference from a fragment to the item it was cut from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceInfo {
    pub index: usize,
    pub count: usize,
    pub of: ItemId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelItem {
    pub id: ItemId,
    pub title: String,
    #[serde(default, alias = "poster")]
    pub poster_url: Option<PosterUrl>,
    #[serde(default = "default_weight", alias = "w")]
    pub weight: f64,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slice: Option<SliceInfo>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub winner: bool,
}

fn default_weight() -> f64 {
    1.0
}

/// Any weight that cannot describe a wedge (zero, negative, NaN, infinite) counts as 1.
pub fn normalize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        1.0
    }
}

impl WheelItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, weight: f64) -> Self {
        Self {
            id: ItemId::new(id),
            title: title.into(),
            poster_url: None,
            weight,
            media_type: None,
            year: None,
            kind: ItemKind::Catalog,
            slice: None,
            winner: false,
        }
    }

    pub fn with_poster(mut self, url: impl Into<String>) -> Self {
        self.poster_url = Some(PosterUrl::new(url));
        self
    }

    pub fn effective_weight(&self) -> f64 {
        normalize_weight(self.weight)
    }

    /// Id of the un-sliced item this entry represents.
    pub fn origin_id(&self) -> &ItemId {
        self.slice.as_ref().map(|s| &s.of).unwrap_or(&self.id)
    }

    pub fn is_fragment(&self) -> bool {
        self.slice.is_some()
    }

    pub fn matches(&self, id: &ItemId) -> bool {
        &self.id == id || self.slice.as_ref().is_some_and(|s| &s.of == id)
    }

    pub fn hit_key(&self) -> String {
        format!("{}:{}", self.kind.key_prefix(), self.origin_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_weight() {
        assert_eq!(normalize_weight(2.5), 2.5);
        assert_eq!(normalize_weight(0.0), 1.0);
        assert_eq!(normalize_weight(-3.0), 1.0);
        assert_eq!(normalize_weight(f64::NAN), 1.0);
        assert_eq!(normalize_weight(f64::INFINITY), 1.0);
    }

    #[test]
    fn test_hit_key_uses_origin() {
        let mut item = WheelItem::new("a#1", "Alien", 1.0);
        item.slice = Some(SliceInfo {
            index: 1,
            count: 3,
            of: ItemId::from("a"),
        });
        assert_eq!(item.hit_key(), "item:a");
        assert!(item.matches(&ItemId::from("a")));

        item.kind = ItemKind::Collection;
        assert_eq!(item.hit_key(), "collection:a");
    }

    #[test]
    fn test_media_type_parsing() {
        let cases = vec![
            ("movie", MediaType::Movie),
            ("Film", MediaType::Movie),
            ("TV", MediaType::Tv),
            ("series", MediaType::Tv),
            ("anime", MediaType::Anime),
            ("games", MediaType::Game),
            ("Book", MediaType::Book),
        ];

        for (input, expected) in cases {
            assert_eq!(input.parse::<MediaType>().unwrap(), expected);
        }
    }

    #[test]
    fn test_item_deserialization_defaults() {
        let item: WheelItem =
            serde_json::from_str(r#"{"id":"x","title":"Dune","w":3,"poster":"/p/dune.jpg"}"#)
                .unwrap();
        assert_eq!(item.weight, 3.0);
        assert_eq!(item.poster_url, Some(PosterUrl::from("/p/dune.jpg")));
        assert_eq!(item.kind, ItemKind::Catalog);
        assert!(item.slice.is_none());
        assert!(!item.winner);

        let missing: WheelItem = serde_json::from_str(r#"{"id":"y","title":"Up"}"#).unwrap();
        assert_eq!(missing.weight, 1.0);
    }
}
