use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Star rating, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: Rating = Rating(1);
    pub const MAX: Rating = Rating(5);

    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Rating(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// One star up, saturating at five.
    pub fn raise(self) -> Self {
        Rating(self.0.saturating_add(1).min(Self::MAX.0))
    }

    /// One star down, saturating at one.
    pub fn lower(self) -> Self {
        Rating(self.0.saturating_sub(1).max(Self::MIN.0))
    }
}

impl Default for Rating {
    fn default() -> Self {
        Rating::MAX
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| format!("rating must be between 1 and 5, got {value}"))
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// The text-like fields a visitor can edit. Used for shallow updates and
/// for reporting which required field is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Date,
    Message,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Your Name",
            Field::Date => "Date of Function",
            Field::Message => "Tell us more",
        }
    }
}

/// An image read from disk and encoded as a `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedImage {
    pub file_name: String,
    pub data_url: String,
}

/// The in-progress guestbook submission. Serializes to the exact JSON shape
/// the endpoint consumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftEntry {
    pub name: String,
    #[serde(serialize_with = "serialize_date", deserialize_with = "deserialize_date")]
    pub date: Option<NaiveDate>,
    pub rating: Rating,
    pub message: String,
    pub image: Option<String>,
    pub image_name: String,
}

impl DraftEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// First required field that is still empty, in form order.
    pub fn missing_required(&self) -> Option<Field> {
        if self.name.is_empty() {
            Some(Field::Name)
        } else if self.date.is_none() {
            Some(Field::Date)
        } else if self.message.is_empty() {
            Some(Field::Message)
        } else {
            None
        }
    }

    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn serialize_date<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(d) => s.collect_str(&d.format("%Y-%m-%d")),
        None => s.serialize_str(""),
    }
}

fn deserialize_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = String::deserialize(d)?;
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(Some)
        .map_err(serde::de::Error::custom)
}
