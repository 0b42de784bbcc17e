pub mod queries {
    use serde::{Deserialize, Serialize};
    use std::sync::OnceLock;
    use thiserror::Error;

    /// Number of characters in an airport code (IATA).
    pub const AIRPORT_CODE_LEN: usize = 3;

    fn iso_date_pattern() -> &'static regex::Regex {
        static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
        PATTERN.get_or_init(|| {
            regex::Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is a valid regex")
        })
    }

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum ValidationError {
        #[error("Airport codes must be 3 characters")]
        AirportCode,
        #[error("Date must be in YYYY-MM-DD format")]
        Date,
        #[error("Return date must be in YYYY-MM-DD format")]
        ReturnDate,
    }

    /// Body of a flight search, as sent by the front end.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct FlightSearchQuery {
        pub origin: String,
        pub destination: String,
        pub date: String,
        #[serde(default)]
        pub return_date: Option<String>,
    }

    impl FlightSearchQuery {
        /// Checks the shape of the query only. Dates are not checked against the calendar.
        pub fn validate(&self) -> Result<(), ValidationError> {
            let code_ok = |code: &str| code.chars().count() == AIRPORT_CODE_LEN;
            if !code_ok(self.origin.as_str()) || !code_ok(self.destination.as_str()) {
                return Err(ValidationError::AirportCode);
            }

            if !iso_date_pattern().is_match(&self.date) {
                return Err(ValidationError::Date);
            }

            if let Some(return_date) = self.return_date() {
                if !iso_date_pattern().is_match(return_date) {
                    return Err(ValidationError::ReturnDate);
                }
            }

            Ok(())
        }

        /// Return date of a round trip. An empty string means one way.
        pub fn return_date(&self) -> Option<&str> {
            self.return_date.as_deref().filter(|d| !d.is_empty())
        }

        pub fn origin_code(&self) -> String {
            self.origin.to_uppercase()
        }

        pub fn destination_code(&self) -> String {
            self.destination.to_uppercase()
        }
    }
}

pub mod flights {
    use chrono::Datelike;
    use serde::{Deserialize, Serialize};
    use std::fmt::{self, Display, Formatter};

    /// Season of the year, southern hemisphere.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Season {
        Summer,
        Autumn,
        Winter,
        Spring,
    }

    impl Season {
        pub fn from_month(month: u32) -> Season {
            match month {
                12 | 1 | 2 => Season::Summer,
                3..=5 => Season::Autumn,
                6..=8 => Season::Winter,
                _ => Season::Spring,
            }
        }

        /// Season for the current local date.
        pub fn current() -> Season {
            Season::from_month(chrono::Local::now().month())
        }

        pub fn as_str(&self) -> &'static str {
            match self {
                Season::Summer => "summer",
                Season::Autumn => "autumn",
                Season::Winter => "winter",
                Season::Spring => "spring",
            }
        }
    }

    impl Display for Season {
        fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
            f.write_str(self.as_str())
        }
    }

    /// A single synthetic flight offer. Lives only for the response it is generated for.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Flight {
        pub id: String,
        pub airline: String,
        pub flight_number: String,
        /// Departure time as `HH:MM`
        pub departure: String,
        /// Duration in minutes, not clamped at zero
        pub duration: i64,
        pub price: f64,
        pub route: String,
        pub demand_factor: f64,
        pub aircraft: String,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum PriceTrend {
        Up,
        Stable,
    }

    /// Demand statistics for one route of the network
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RouteStat {
        pub route: String,
        pub flights_per_day: u32,
        pub current_demand: f64,
        pub season: Season,
        pub distance_km: u32,
        pub price_trend: PriceTrend,
    }
}

pub mod responses {
    use crate::flights::{Flight, RouteStat};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Trend {
        Increasing,
        Decreasing,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub enum Recommendation {
        #[serde(rename = "Book now")]
        BookNow,
        #[serde(rename = "Wait for better deals")]
        WaitForBetterDeals,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct PriceSummary {
        pub average: f64,
        pub min: f64,
        pub max: f64,
        pub trend: Trend,
    }

    /// Derived statistics over a flight list. An empty list yields the error marker instead.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum Insights {
        Summary {
            price_summary: PriceSummary,
            recommendation: Recommendation,
            airlines: Vec<String>,
        },
        Unavailable {
            error: String,
        },
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct SearchMetadata {
        pub generated_at: String,
        pub num_flights: usize,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct FlightSearchResponse {
        pub data: Vec<Flight>,
        pub insights: Insights,
        pub metadata: SearchMetadata,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct RoutesDebug {
        pub num_routes: usize,
        pub generated_at: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct PopularRoutesResponse {
        pub routes: Vec<RouteStat>,
        pub seasonal_advice: String,
        pub debug: RoutesDebug,
    }

    /// Error body returned for 422 and 500 responses
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ErrorDetail {
        pub detail: String,
    }
}
