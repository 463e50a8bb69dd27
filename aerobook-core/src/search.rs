use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flight record as published by the dictionaries service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flight {
    pub flight_id: String,
    #[serde(rename = "from")]
    pub origin: String,
    #[serde(rename = "to")]
    pub destination: String,
    #[serde(with = "flight_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub price: Decimal,
    #[serde(rename = "passenger_count")]
    pub seat_count: u32,
}

impl Flight {
    pub fn has_seats(&self) -> bool {
        self.seat_count > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
}

/// Search criteria for the flight list. Empty fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<NaiveDate>,
}

impl FlightQuery {
    /// Cities match case-insensitively on substrings, the date matches exactly.
    pub fn matches(&self, flight: &Flight) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            match needle.as_deref().map(str::trim) {
                None | Some("") => true,
                Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
            }
        }

        contains(&flight.origin, &self.origin)
            && contains(&flight.destination, &self.destination)
            && self.date.map_or(true, |d| d == flight.date)
    }
}

/// The catalog seeds dates as `20 Dec 2024`; the admin form posts ISO dates.
mod flight_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const ISO: &str = "%Y-%m-%d";
    const HUMAN: &str = "%d %b %Y";

    pub fn serialize<S: Serializer>(date: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&date.format(ISO))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        let raw = raw.trim();
        NaiveDate::parse_from_str(raw, ISO)
            .or_else(|_| NaiveDate::parse_from_str(raw, HUMAN))
            .map_err(|e| serde::de::Error::custom(format!("invalid flight date {:?}: {}", raw, e)))
    }
}
