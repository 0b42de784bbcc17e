//! Price insights derived from a list of flights, plus seasonal travel tips.

use fare_sim_shared::flights::Flight;
use fare_sim_shared::responses::{Insights, PriceSummary, Recommendation, Trend};
use std::collections::BTreeSet;
use tracing::debug;

const BOOK_NOW_THRESHOLD: f64 = 200.0;
const TREND_WINDOW: usize = 3;

pub const NO_DATA_MARKER: &str = "No flight data available";
pub const DEFAULT_TIP: &str = "Good time to travel";

pub fn generate_insights(flights: &[Flight]) -> Insights {
    if flights.is_empty() {
        return Insights::Unavailable {
            error: NO_DATA_MARKER.to_string(),
        };
    }

    let prices: Vec<f64> = flights.iter().map(|f| f.price).collect();
    let avg_price = prices.iter().sum::<f64>() / prices.len() as f64;
    let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    debug!(
        "Price analysis - Avg: {:.2}, Range: {}-{}",
        avg_price, min_price, max_price
    );

    // Always divided by the window size, even when fewer flights are available
    let leading_avg = prices.iter().take(TREND_WINDOW).sum::<f64>() / TREND_WINDOW as f64;
    let trend = if avg_price < leading_avg {
        Trend::Decreasing
    } else {
        Trend::Increasing
    };

    let recommendation = if avg_price < BOOK_NOW_THRESHOLD {
        Recommendation::BookNow
    } else {
        Recommendation::WaitForBetterDeals
    };

    let airlines: BTreeSet<&str> = flights.iter().map(|f| f.airline.as_str()).collect();

    Insights::Summary {
        price_summary: PriceSummary {
            average: (avg_price * 100.0).round() / 100.0,
            min: min_price,
            max: max_price,
            trend,
        },
        recommendation,
        airlines: airlines.into_iter().map(String::from).collect(),
    }
}

/// Travel tip for a season name. Unknown names get a generic tip.
pub fn seasonal_tip(season: &str) -> &'static str {
    match season {
        "summer" => "Book at least 2 weeks early for peak season travel",
        "winter" => "Last-minute deals often available",
        "spring" => "Flexible dates can save up to 20%",
        "autumn" => "Ideal time for business travel",
        _ => DEFAULT_TIP,
    }
}
