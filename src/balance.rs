//! Balance display helper.
//!
//! Defaults are taken from the chain snapshot once it is ready, so
//! consumers can render raw on-chain integers without knowing the chain.

use serde::Serialize;

/// Unit shown when the chain reports no token symbol.
pub const DEFAULT_UNIT: &str = "Unit";

/// Fractional digits kept when rendering.
const DISPLAY_PRECISION: usize = 4;

/// Decimal scale and unit label for one chain's native token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceFormat {
    pub decimals: u32,
    pub unit: String,
}

impl Default for BalanceFormat {
    fn default() -> Self {
        Self::new(0, None)
    }
}

impl BalanceFormat {
    pub fn new(decimals: u32, unit: Option<String>) -> Self {
        Self {
            decimals,
            unit: unit.unwrap_or_else(|| DEFAULT_UNIT.to_owned()),
        }
    }

    /// Render `raw` base units as `"<whole>[.<fraction>] <unit>"`.
    ///
    /// The fraction is truncated to four digits and trailing zeros are dropped.
    pub fn format(&self, raw: u128) -> String {
        let digits = raw.to_string();
        let decimals = self.decimals as usize;

        let (whole, fraction) = if digits.len() > decimals {
            let (w, f) = digits.split_at(digits.len() - decimals);
            (w.to_owned(), f.to_owned())
        } else {
            ("0".to_owned(), format!("{digits:0>decimals$}"))
        };

        let fraction: String = fraction.chars().take(DISPLAY_PRECISION).collect();
        let fraction = fraction.trim_end_matches('0');

        if fraction.is_empty() {
            format!("{} {}", group_thousands(&whole), self.unit)
        } else {
            format!("{}.{} {}", group_thousands(&whole), fraction, self.unit)
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
