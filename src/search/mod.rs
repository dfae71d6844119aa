use std::future::Future;

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};

use crate::core::{
    ContigTokenization,
    TankyuError,
    Token,
};

pub mod api;

pub use api::MassifClient;

/// An example sentence with its tokenization, one list per contiguous run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    #[serde(alias = "highlightedHtml")]
    pub highlighted_html: String,
    #[serde(default, deserialize_with = "deserialize_runs")]
    pub tokens: Vec<ContigTokenization>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentSearchResults {
    #[serde(default)]
    pub results: Vec<Fragment>,
}

/// Tokens arrive either as bare strings or as `{"t": "..."}` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireToken {
    Plain(String),
    Object { t: String },
}

impl From<WireToken> for Token {
    fn from(token: WireToken) -> Self {
        match token {
            WireToken::Plain(t) | WireToken::Object { t } => t,
        }
    }
}

fn deserialize_runs<'de, D>(deserializer: D) -> Result<Vec<ContigTokenization>, D::Error>
where
    D: Deserializer<'de>,
{
    let runs: Vec<Vec<WireToken>> = Vec::deserialize(deserializer)?;
    Ok(runs.into_iter().map(|run| run.into_iter().map(Token::from).collect()).collect())
}

/// Source of example fragments for a query.
pub trait FragmentSearch: Send + Sync {
    fn search(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<FragmentSearchResults, TankyuError>> + Send;
}
