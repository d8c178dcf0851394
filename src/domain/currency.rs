//! Currency
//!
//! Display currency plus the country lookup table used by currency
//! detection.

use serde::{Deserialize, Serialize};

/// Currency used to display prices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub symbol: String,
    pub name: String,
}

// (ISO country, code, symbol, name)
const COUNTRY_CURRENCIES: &[(&str, &str, &str, &str)] = &[
    ("US", "USD", "$", "US Dollar"),
    ("IN", "INR", "₹", "Indian Rupee"),
    ("GB", "GBP", "£", "British Pound"),
    ("CA", "CAD", "$", "Canadian Dollar"),
    ("AU", "AUD", "$", "Australian Dollar"),
    ("NZ", "NZD", "$", "New Zealand Dollar"),
    ("JP", "JPY", "¥", "Japanese Yen"),
    ("CN", "CNY", "¥", "Chinese Yuan"),
    ("KR", "KRW", "₩", "South Korean Won"),
    ("SG", "SGD", "$", "Singapore Dollar"),
    ("HK", "HKD", "$", "Hong Kong Dollar"),
    ("MY", "MYR", "RM", "Malaysian Ringgit"),
    ("ID", "IDR", "Rp", "Indonesian Rupiah"),
    ("PH", "PHP", "₱", "Philippine Peso"),
    ("TH", "THB", "฿", "Thai Baht"),
    ("VN", "VND", "₫", "Vietnamese Dong"),
    ("PK", "PKR", "₨", "Pakistani Rupee"),
    ("BD", "BDT", "৳", "Bangladeshi Taka"),
    ("LK", "LKR", "Rs", "Sri Lankan Rupee"),
    ("NP", "NPR", "Rs", "Nepalese Rupee"),
    ("AE", "AED", "د.إ", "UAE Dirham"),
    ("SA", "SAR", "﷼", "Saudi Riyal"),
    ("CH", "CHF", "CHF", "Swiss Franc"),
    ("SE", "SEK", "kr", "Swedish Krona"),
    ("NO", "NOK", "kr", "Norwegian Krone"),
    ("DK", "DKK", "kr", "Danish Krone"),
    ("PL", "PLN", "zł", "Polish Zloty"),
    ("RU", "RUB", "₽", "Russian Ruble"),
    ("TR", "TRY", "₺", "Turkish Lira"),
    ("BR", "BRL", "R$", "Brazilian Real"),
    ("MX", "MXN", "$", "Mexican Peso"),
    ("AR", "ARS", "$", "Argentine Peso"),
    ("ZA", "ZAR", "R", "South African Rand"),
    ("NG", "NGN", "₦", "Nigerian Naira"),
    ("KE", "KES", "KSh", "Kenyan Shilling"),
    ("EG", "EGP", "E£", "Egyptian Pound"),
];

// Eurozone members share one entry
const EURO_COUNTRIES: &[&str] = &[
    "AT", "BE", "CY", "DE", "EE", "ES", "FI", "FR", "GR", "HR", "IE", "IT", "LT", "LU", "LV", "MT",
    "NL", "PT", "SI", "SK",
];

impl Currency {
    pub fn new(code: impl Into<String>, symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
            name: name.into(),
        }
    }

    /// Static fallback when detection finds nothing
    pub fn usd() -> Self {
        Self::new("USD", "$", "US Dollar")
    }

    pub fn euro() -> Self {
        Self::new("EUR", "€", "Euro")
    }

    /// Currency for an ISO 3166-1 alpha-2 country code (case-insensitive)
    pub fn for_country(country: &str) -> Option<Currency> {
        let country = country.trim().to_ascii_uppercase();
        if EURO_COUNTRIES.contains(&country.as_str()) {
            return Some(Self::euro());
        }
        COUNTRY_CURRENCIES
            .iter()
            .find(|(iso, ..)| *iso == country)
            .map(|(_, code, symbol, name)| Self::new(*code, *symbol, *name))
    }

    /// Currency for an ISO 4217 code (case-insensitive)
    pub fn for_code(code: &str) -> Option<Currency> {
        let code = code.trim().to_ascii_uppercase();
        if code == "EUR" {
            return Some(Self::euro());
        }
        COUNTRY_CURRENCIES
            .iter()
            .find(|(_, c, ..)| *c == code)
            .map(|(_, code, symbol, name)| Self::new(*code, *symbol, *name))
    }

    /// Price with symbol and two decimals
    pub fn format(&self, amount: f64) -> String {
        format!("{}{:.2}", self.symbol, amount)
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::usd()
    }
}
