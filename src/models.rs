use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

pub type TabId = Uuid;

/// Retrieval strategy requested from the search backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchMethod {
    Single,
    Fusion,
    Local,
    Group,
    Hierarchy,
}

/// Grid density hint. Carried in session state but not interpreted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultsPerRow {
    Fixed(u8),
    AutoFit,
}

pub const RESULTS_PER_ROW_OPTIONS: [ResultsPerRow; 4] = [
    ResultsPerRow::Fixed(3),
    ResultsPerRow::Fixed(4),
    ResultsPerRow::Fixed(5),
    ResultsPerRow::AutoFit,
];

// On the wire this is either one of the numbers 3|4|5 or the literal
// string "auto-fit", matching what the frontend sends.
impl Serialize for ResultsPerRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResultsPerRow::Fixed(n) => serializer.serialize_u8(*n),
            ResultsPerRow::AutoFit => serializer.serialize_str("auto-fit"),
        }
    }
}

impl<'de> Deserialize<'de> for ResultsPerRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultsPerRowVisitor;

        impl Visitor<'_> for ResultsPerRowVisitor {
            type Value = ResultsPerRow;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("3, 4, 5, or \"auto-fit\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                match v {
                    3..=5 => Ok(ResultsPerRow::Fixed(v as u8)),
                    _ => Err(E::custom(format!("unsupported results-per-row: {}", v))),
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("unsupported results-per-row: {}", v)))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                match v {
                    "auto-fit" => Ok(ResultsPerRow::AutoFit),
                    other => Err(E::custom(format!("unsupported results-per-row: {}", other))),
                }
            }
        }

        deserializer.deserialize_any(ResultsPerRowVisitor)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub date: bool,
    pub relevance: bool,
    pub similarity: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSettings {
    pub method: SearchMethod,
    pub results_per_row: ResultsPerRow,
    /// Result-count hint forwarded to the backend.
    pub k_value: u32,
    pub ocr: bool,
    pub filters: SearchFilters,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            method: SearchMethod::Fusion,
            results_per_row: ResultsPerRow::AutoFit,
            k_value: 100,
            ocr: false,
            filters: SearchFilters {
                date: false,
                relevance: true,
                similarity: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

/// One search hit. Produced wholesale per search, never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultItem {
    pub id: String,
    /// 1-based position assigned by the search response.
    pub rank: u32,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub title: String,
    pub thumbnail_url: String,
    pub full_url: String,
    /// Segment preview, present only for videos with a preview asset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_preview_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    /// Items sharing this value came from the same source asset and are
    /// rendered with the same grouping color.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_video_id: Option<String>,
}

/// User-supplied query file plus its derived data-URL preview.
///
/// Raw bytes stay server-side; only the preview travels back to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabAttachment {
    pub file_name: String,
    pub content_type: String,
    #[serde(skip_serializing, default)]
    pub bytes: Vec<u8>,
    pub preview_data_url: String,
}

impl TabAttachment {
    pub fn new(file_name: String, content_type: String, bytes: Vec<u8>) -> Self {
        let preview_data_url = format!("data:{};base64,{}", content_type, BASE64.encode(&bytes));
        Self {
            file_name,
            content_type,
            bytes,
            preview_data_url,
        }
    }
}

pub const DEFAULT_TAB_TITLE: &str = "New Tab";

/// One independent search session: query, attachment, settings, results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub title: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<TabAttachment>,
    pub settings: SearchSettings,
    pub results: Vec<ResultItem>,
    pub is_loading: bool,
    /// Monotonic per-tab search counter; completions carrying a stale value
    /// are discarded instead of overwriting newer state.
    #[serde(skip, default)]
    pub search_seq: u64,
}

impl Tab {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: DEFAULT_TAB_TITLE.to_string(),
            query: String::new(),
            attachment: None,
            settings,
            results: Vec::new(),
            is_loading: false,
            search_seq: 0,
        }
    }
}
