//! Closed set of site languages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Site language. The site is published in exactly these four.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Sv,
    #[default]
    En,
    De,
    Fr,
}

impl Language {
    pub const ALL: [Language; 4] = [Self::Sv, Self::En, Self::De, Self::Fr];

    pub const fn code(self) -> &'static str {
        match self {
            Self::Sv => "sv",
            Self::En => "en",
            Self::De => "de",
            Self::Fr => "fr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code() == code)
            .ok_or_else(|| format!("unknown language `{s}` (expected one of sv, en, de, fr)"))
    }
}
