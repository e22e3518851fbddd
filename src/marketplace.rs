//! Audible marketplace table

use crate::error::ConfigError;
use std::fmt;

/// A public Audible storefront
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marketplace {
    pub code: &'static str,
    pub domain: &'static str,
}

pub const MARKETPLACES: &[Marketplace] = &[
    Marketplace { code: "us", domain: "audible.com" },
    Marketplace { code: "ca", domain: "audible.ca" },
    Marketplace { code: "uk", domain: "audible.co.uk" },
    Marketplace { code: "au", domain: "audible.com.au" },
    Marketplace { code: "fr", domain: "audible.fr" },
    Marketplace { code: "de", domain: "audible.de" },
    Marketplace { code: "jp", domain: "audible.co.jp" },
    Marketplace { code: "it", domain: "audible.it" },
    Marketplace { code: "in", domain: "audible.in" },
    Marketplace { code: "es", domain: "audible.es" },
    Marketplace { code: "br", domain: "audible.com.br" },
];

impl Marketplace {
    /// Look up a marketplace by its short code (case-insensitive)
    pub fn from_code(code: &str) -> Result<Self, ConfigError> {
        let wanted = code.trim().to_lowercase();
        MARKETPLACES
            .iter()
            .find(|m| m.code == wanted)
            .copied()
            .ok_or_else(|| ConfigError::UnknownMarketplace {
                code: code.to_string(),
                valid: valid_codes(),
            })
    }

    /// JSON API host, e.g. `api.audible.com.au`
    pub fn api_host(&self) -> String {
        format!("api.{}", self.domain)
    }
}

impl fmt::Display for Marketplace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.domain)
    }
}

/// Comma-separated list of every known code
pub fn valid_codes() -> String {
    MARKETPLACES
        .iter()
        .map(|m| m.code)
        .collect::<Vec<_>>()
        .join(", ")
}
