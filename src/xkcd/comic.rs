use serde::Deserialize;

/// One published comic, as served by the `info.0.json` endpoints.
///
/// The upstream resource is immutable per number, so a `Comic` is never
/// mutated after parsing. Fields the API omits default to zero/empty and
/// fields we do not care about are ignored.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Comic {
    #[serde(default)]
    pub num: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub img: String,
    #[serde(default)]
    pub alt: String,
}

impl Comic {
    /// Decodes a metadata document. Malformed bodies are an explicit error,
    /// never a panic; callers abandon the comic and move on.
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
