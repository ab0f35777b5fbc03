use std::fmt;
use std::str::FromStr;

use foundation::{ProvinceKey, first_token_upper, longest_word_prefix, normalize_key};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::join::JoinedTable;

/// How a province identifier is pulled out of a free-text partner field.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartnerMatch {
    /// Longest known province name that starts the text on a word boundary.
    #[default]
    LongestPrefix,
    /// First whitespace-delimited token, matched exactly. Multi-word names
    /// never match.
    FirstToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown partner match mode {0:?} (expected longest-prefix or first-token)")]
pub struct UnknownPartnerMatch(pub String);

impl FromStr for PartnerMatch {
    type Err = UnknownPartnerMatch;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "longest-prefix" | "longest_prefix" | "prefix" => Ok(PartnerMatch::LongestPrefix),
            "first-token" | "first_token" | "token" => Ok(PartnerMatch::FirstToken),
            other => Err(UnknownPartnerMatch(other.to_string())),
        }
    }
}

impl fmt::Display for PartnerMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartnerMatch::LongestPrefix => f.write_str("longest-prefix"),
            PartnerMatch::FirstToken => f.write_str("first-token"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerCategory {
    Purchase,
    Sale,
}

impl PartnerCategory {
    pub const ALL: [PartnerCategory; 2] = [PartnerCategory::Purchase, PartnerCategory::Sale];

    pub fn label(self) -> &'static str {
        match self {
            PartnerCategory::Purchase => "Pembelian Terbesar",
            PartnerCategory::Sale => "Penjualan Terbesar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RouteOutcome {
    Resolved { partner: ProvinceKey },
    /// Something was named, but no province with a boundary matches it.
    NoPartnerGeometry { lookup: String },
    NoPartnerText,
}

impl JoinedTable {
    pub fn resolve_partner(&self, text: &str, mode: PartnerMatch) -> RouteOutcome {
        let normalized = normalize_key(text);
        if normalized.is_empty() {
            return RouteOutcome::NoPartnerText;
        }

        let found = match mode {
            PartnerMatch::FirstToken => {
                let Some(token) = first_token_upper(&normalized) else {
                    return RouteOutcome::NoPartnerText;
                };
                let key = ProvinceKey::new(&token);
                if self.location(&key).is_some() {
                    Some(key)
                } else {
                    return RouteOutcome::NoPartnerGeometry { lookup: token };
                }
            }
            PartnerMatch::LongestPrefix => {
                longest_word_prefix(&normalized, self.known_provinces().map(|k| k.as_str()))
                    .map(ProvinceKey::new)
            }
        };

        match found {
            Some(partner) => RouteOutcome::Resolved { partner },
            None => RouteOutcome::NoPartnerGeometry { lookup: normalized },
        }
    }
}
