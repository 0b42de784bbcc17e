//! Flight simulator module producing synthetic flight offers.
//!
//! Holds the airline and route tables, built once at startup, and turns a route key into a list of
//! priced flights. All randomness comes from the caller so results can be reproduced with a seeded
//! generator.

use fare_sim_shared::flights::{Flight, PriceTrend, RouteStat, Season};
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Normal, NormalError};
use std::borrow::Cow;
use thiserror::Error;
use tracing::debug;

const PRICE_NOISE_STD_DEV: f64 = 0.15;
// Distance at which an airline charges exactly its base price
const REFERENCE_DISTANCE_KM: f64 = 700.0;
const CRUISE_SPEED_KMH: f64 = 500.0;
const DURATION_JITTER_MINUTES: i64 = 20;
const SHORT_HAUL_LIMIT_KM: u32 = 800;
const PRICE_TREND_UP_THRESHOLD: f64 = 1.1;

const DEPARTURE_MINUTES: [&str; 4] = ["00", "15", "30", "45"];
const SHORT_HAUL_AIRCRAFT: &str = "B737";
const LONG_HAUL_AIRCRAFT: [&str; 2] = ["B787", "A330"];

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Cannot pick an airline: {0}")]
    AirlineWeights(#[from] WeightedError),
    #[error("Cannot build price noise: {0}")]
    PriceNoise(#[from] NormalError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Airline {
    pub code: String,
    pub name: String,
    pub base_price: f64,
    /// Relative weight when picking an airline for a flight
    pub reliability: f64,
}

impl Airline {
    fn new(code: &str, name: &str, base_price: f64, reliability: f64) -> Airline {
        Airline {
            code: code.to_string(),
            name: name.to_string(),
            base_price,
            reliability,
        }
    }
}

/// Demand multipliers for each season
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalFactors {
    pub summer: f64,
    pub autumn: f64,
    pub winter: f64,
    pub spring: f64,
}

impl SeasonalFactors {
    pub fn neutral() -> SeasonalFactors {
        SeasonalFactors {
            summer: 1.0,
            autumn: 1.0,
            winter: 1.0,
            spring: 1.0,
        }
    }

    pub fn get(&self, season: Season) -> f64 {
        match season {
            Season::Summer => self.summer,
            Season::Autumn => self.autumn,
            Season::Winter => self.winter,
            Season::Spring => self.spring,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Route key, `ORIGIN-DEST`
    pub key: String,
    pub base_demand: f64,
    pub distance_km: u32,
    pub daily_flights: u32,
    pub seasonal_factors: SeasonalFactors,
}

impl Route {
    /// Stand-in for a city pair missing from the network, with a random distance.
    fn fallback<R: Rng + ?Sized>(key: String, rng: &mut R) -> Route {
        Route {
            key,
            base_demand: 0.8,
            distance_km: rng.gen_range(500..=1500),
            daily_flights: 12,
            seasonal_factors: SeasonalFactors::neutral(),
        }
    }

    pub fn demand_factor(&self, season: Season) -> f64 {
        self.base_demand * self.seasonal_factors.get(season)
    }
}

pub fn route_key(origin: &str, destination: &str) -> String {
    format!("{}-{}", origin, destination)
}

fn round2(val: f64) -> f64 {
    (val * 100.0).round() / 100.0
}

/// Relative price noise, applied as `price * (1 + noise)`.
fn price_noise() -> Result<Normal<f64>, NormalError> {
    Normal::new(0.0, PRICE_NOISE_STD_DEV)
}

/// Static airline and route tables, read-only once constructed.
pub struct FlightSimulator {
    airlines: Vec<Airline>,
    routes: Vec<Route>,
}

impl FlightSimulator {
    /// Simulator over the built-in Australian domestic network.
    pub fn new() -> FlightSimulator {
        let airlines = vec![
            Airline::new("QF", "Qantas", 180.0, 0.95),
            Airline::new("VA", "Virgin Australia", 160.0, 0.92),
            Airline::new("JQ", "Jetstar", 120.0, 0.85),
        ];

        let routes = vec![
            Route {
                key: "SYD-MEL".to_string(),
                base_demand: 1.4,
                distance_km: 713,
                daily_flights: 45,
                seasonal_factors: SeasonalFactors {
                    summer: 1.3,
                    autumn: 1.0,
                    winter: 0.9,
                    spring: 1.1,
                },
            },
            Route {
                key: "BNE-SYD".to_string(),
                base_demand: 1.1,
                distance_km: 732,
                daily_flights: 32,
                seasonal_factors: SeasonalFactors {
                    summer: 1.2,
                    autumn: 1.0,
                    winter: 0.8,
                    spring: 1.0,
                },
            },
            Route {
                key: "PER-SYD".to_string(),
                base_demand: 0.9,
                distance_km: 3285,
                daily_flights: 18,
                seasonal_factors: SeasonalFactors {
                    summer: 1.1,
                    autumn: 0.9,
                    winter: 0.7,
                    spring: 1.0,
                },
            },
        ];

        FlightSimulator::with_tables(airlines, routes)
    }

    pub fn with_tables(airlines: Vec<Airline>, routes: Vec<Route>) -> FlightSimulator {
        FlightSimulator { airlines, routes }
    }

    pub fn airlines(&self) -> &[Airline] {
        &self.airlines
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Looks up a route by key, synthesizing a default one for unknown city pairs.
    pub fn resolve_route<R: Rng + ?Sized>(&self, key: &str, rng: &mut R) -> Cow<'_, Route> {
        match self.routes.iter().find(|r| r.key == key) {
            Some(route) => Cow::Borrowed(route),
            None => Cow::Owned(Route::fallback(key.to_string(), rng)),
        }
    }

    /// Generates `num_flights` flights from `origin` to `destination`, cheapest first.
    ///
    /// The date is only used for tracing, prices depend on the season passed in.
    pub fn generate_flights<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        origin: &str,
        destination: &str,
        date: &str,
        num_flights: usize,
        season: Season,
    ) -> Result<Vec<Flight>, SimError> {
        let key = route_key(origin, destination);
        debug!(route = %key, %date, num_flights, "Generating flights");

        let route = self.resolve_route(&key, rng);
        let demand_factor = route.demand_factor(season);
        let airline_dist: WeightedIndex<f64> =
            WeightedIndex::new(self.airlines.iter().map(|a| a.reliability))?;
        let noise_dist = price_noise()?;

        let mut flights: Vec<Flight> = (0..num_flights)
            .map(|i| {
                let airline = &self.airlines[airline_dist.sample(rng)];
                let noise = noise_dist.sample(rng);
                self.synthesize_flight(rng, &route, airline, demand_factor, noise, i)
            })
            .collect();

        flights.sort_by(|a, b| a.price.total_cmp(&b.price));

        debug!(route = %key, count = flights.len(), "Generated flights");
        Ok(flights)
    }

    fn synthesize_flight<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        route: &Route,
        airline: &Airline,
        demand_factor: f64,
        noise: f64,
        index: usize,
    ) -> Flight {
        let distance = route.distance_km as f64;

        let base_price = airline.base_price * (distance / REFERENCE_DISTANCE_KM);
        let price = base_price * (1.0 + noise) * demand_factor;

        let departure = format!(
            "{:02}:{}",
            rng.gen_range(5..=22),
            DEPARTURE_MINUTES.choose(rng).copied().unwrap_or_default()
        );

        let duration = (distance / CRUISE_SPEED_KMH * 60.0).round() as i64
            + rng.gen_range(-DURATION_JITTER_MINUTES..=DURATION_JITTER_MINUTES);

        let aircraft = if route.distance_km < SHORT_HAUL_LIMIT_KM {
            SHORT_HAUL_AIRCRAFT
        } else {
            LONG_HAUL_AIRCRAFT.choose(rng).copied().unwrap_or(SHORT_HAUL_AIRCRAFT)
        };

        Flight {
            id: format!("{}-{}", route.key, index),
            airline: airline.name.clone(),
            flight_number: format!("{}{}", airline.code, rng.gen_range(100..=999)),
            departure,
            duration,
            price: round2(price),
            route: route.key.clone(),
            demand_factor: round2(demand_factor),
            aircraft: aircraft.to_string(),
        }
    }

    /// Demand statistics for every route in the network, in table order.
    pub fn route_stats(&self, season: Season) -> Vec<RouteStat> {
        debug!(%season, "Computing route stats");

        self.routes
            .iter()
            .map(|route| {
                let factor = route.seasonal_factors.get(season);
                RouteStat {
                    route: route.key.clone(),
                    flights_per_day: route.daily_flights,
                    current_demand: round2(route.demand_factor(season)),
                    season,
                    distance_km: route.distance_km,
                    price_trend: if factor > PRICE_TREND_UP_THRESHOLD {
                        PriceTrend::Up
                    } else {
                        PriceTrend::Stable
                    },
                }
            })
            .collect()
    }
}

impl Default for FlightSimulator {
    fn default() -> Self {
        FlightSimulator::new()
    }
}

#[cfg(test)]
mod simulator_tests {
    use crate::simulator::{
        price_noise, Airline, FlightSimulator, Route, SeasonalFactors, SimError,
    };
    use rand::distributions::Distribution;
    use fare_sim_shared::flights::{PriceTrend, Season};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_syd_mel_winter_demand_factor() {
        let sim = FlightSimulator::new();
        let flights = sim
            .generate_flights(&mut rng(), "SYD", "MEL", "2025-06-15", 12, Season::Winter)
            .unwrap();

        assert_eq!(flights.len(), 12);
        for f in &flights {
            assert_eq!(f.route, "SYD-MEL");
            assert!((f.demand_factor - 1.26).abs() < 1e-9);
            // 713 km is short haul
            assert_eq!(f.aircraft, "B737");
        }
    }

    #[test]
    fn test_flights_sorted_by_price() {
        let sim = FlightSimulator::new();
        let mut rng = rng();
        for season in [Season::Summer, Season::Autumn, Season::Winter, Season::Spring] {
            let flights = sim
                .generate_flights(&mut rng, "PER", "SYD", "2025-01-01", 15, season)
                .unwrap();
            assert!(flights.windows(2).all(|w| w[0].price <= w[1].price));
        }
    }

    #[test]
    fn test_flight_fields() {
        let sim = FlightSimulator::new();
        let flights = sim
            .generate_flights(&mut rng(), "PER", "SYD", "2025-01-01", 50, Season::Summer)
            .unwrap();

        let mut ids: Vec<&str> = flights.iter().map(|f| f.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);

        for f in &flights {
            assert!(f.id.starts_with("PER-SYD-"));
            let index: usize = f.id["PER-SYD-".len()..].parse().unwrap();
            assert!(index < 50);

            let airline = sim.airlines().iter().find(|a| a.name == f.airline).unwrap();
            assert!(f.flight_number.starts_with(&airline.code));
            let number: u32 = f.flight_number[2..].parse().unwrap();
            assert!((100..=999).contains(&number));

            let (hour, minute) = f.departure.split_once(':').unwrap();
            assert_eq!(hour.len(), 2);
            assert!((5..=22).contains(&hour.parse::<u32>().unwrap()));
            assert!(["00", "15", "30", "45"].contains(&minute));

            // round(3285 / 500 * 60) = 394
            assert!((374..=414).contains(&f.duration));
            assert!(f.aircraft == "B787" || f.aircraft == "A330");
            assert_eq!((f.price * 100.0).round() / 100.0, f.price);
        }
    }

    #[test]
    fn test_unknown_route_falls_back() {
        let sim = FlightSimulator::new();
        let mut rng = rng();

        let route = sim.resolve_route("ADL-HBA", &mut rng);
        assert_eq!(route.key, "ADL-HBA");
        assert_eq!(route.base_demand, 0.8);
        assert_eq!(route.daily_flights, 12);
        assert!((500..=1500).contains(&route.distance_km));
        assert_eq!(route.seasonal_factors, SeasonalFactors::neutral());

        let flights = sim
            .generate_flights(&mut rng, "ADL", "HBA", "2025-03-01", 9, Season::Autumn)
            .unwrap();
        assert_eq!(flights.len(), 9);
        assert!(flights.iter().all(|f| f.route == "ADL-HBA" && f.demand_factor == 0.8));
    }

    #[test]
    fn test_known_route_is_borrowed() {
        let sim = FlightSimulator::new();
        let route = sim.resolve_route("BNE-SYD", &mut rng());
        assert!(matches!(route, std::borrow::Cow::Borrowed(_)));
        assert_eq!(route.distance_km, 732);
    }

    #[test]
    fn test_zero_flights() {
        let sim = FlightSimulator::new();
        let flights = sim
            .generate_flights(&mut rng(), "SYD", "MEL", "2025-06-15", 0, Season::Summer)
            .unwrap();
        assert!(flights.is_empty());
    }

    #[test]
    fn test_empty_airline_table_is_an_error() {
        let sim = FlightSimulator::with_tables(Vec::new(), Vec::new());
        let res = sim.generate_flights(&mut rng(), "SYD", "MEL", "2025-06-15", 3, Season::Summer);
        assert!(matches!(res, Err(SimError::AirlineWeights(_))));
    }

    #[test]
    fn test_route_stats() {
        let sim = FlightSimulator::new();

        let stats = sim.route_stats(Season::Summer);
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[0].route, "SYD-MEL");
        assert_eq!(stats[0].current_demand, 1.82);
        assert_eq!(stats[0].price_trend, PriceTrend::Up);
        assert_eq!(stats[1].price_trend, PriceTrend::Up);
        // 1.1 is not above the threshold
        assert_eq!(stats[2].price_trend, PriceTrend::Stable);
        assert_eq!(stats[2].distance_km, 3285);
        assert_eq!(stats[2].flights_per_day, 18);

        for season in [Season::Autumn, Season::Winter, Season::Spring] {
            let stats = sim.route_stats(season);
            assert_eq!(stats.len(), sim.routes().len());
            for (stat, route) in stats.iter().zip(sim.routes()) {
                assert_eq!(stat.season, season);
                let expected = if route.seasonal_factors.get(season) > 1.1 {
                    PriceTrend::Up
                } else {
                    PriceTrend::Stable
                };
                assert_eq!(stat.price_trend, expected);
            }
        }
    }

    #[test]
    fn test_single_route_table() {
        let route = Route {
            key: "AAA-BBB".to_string(),
            base_demand: 2.0,
            distance_km: 1400,
            daily_flights: 3,
            seasonal_factors: SeasonalFactors::neutral(),
        };
        let airlines = FlightSimulator::new().airlines().to_vec();
        let sim = FlightSimulator::with_tables(airlines, vec![route]);
        let stats = sim.route_stats(Season::Spring);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].current_demand, 2.0);
        assert_eq!(stats[0].price_trend, PriceTrend::Stable);
    }

    fn flat_route(distance_km: u32, base_demand: f64) -> Route {
        Route {
            key: "AAA-BBB".to_string(),
            base_demand,
            distance_km,
            daily_flights: 3,
            seasonal_factors: SeasonalFactors::neutral(),
        }
    }

    #[test]
    fn test_price_noise_spread() {
        let dist = price_noise().unwrap();
        let mut rng = rng();
        let samples: Vec<f64> = (0..20_000).map(|_| dist.sample(&mut rng)).collect();

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);

        assert!(mean.abs() < 0.01, "mean {}", mean);
        assert!((var.sqrt() - 0.15).abs() < 0.005, "std dev {}", var.sqrt());
    }

    #[test]
    fn test_price_model() {
        // Single airline at 1400 km and demand 1.5: expected price 180 * 2 * 1.5 = 540
        let airlines = vec![Airline::new("QF", "Qantas", 180.0, 1.0)];
        let sim = FlightSimulator::with_tables(airlines, vec![flat_route(1400, 1.5)]);
        let flights = sim
            .generate_flights(&mut rng(), "AAA", "BBB", "2025-04-01", 5_000, Season::Autumn)
            .unwrap();

        let ratios: Vec<f64> = flights.iter().map(|f| f.price / 540.0).collect();
        let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
        assert!((mean - 1.0).abs() < 0.01, "mean ratio {}", mean);
        // Six standard deviations of noise either side
        assert!(ratios.iter().all(|r| (r - 1.0).abs() < 0.9));

        let spread =
            ratios.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / ratios.len() as f64;
        assert!((spread.sqrt() - 0.15).abs() < 0.01, "ratio std dev {}", spread.sqrt());
        assert!(flights.iter().all(|f| f.demand_factor == 1.5));
    }

    #[test]
    fn test_price_scales_with_demand() {
        let airlines = vec![Airline::new("JQ", "Jetstar", 120.0, 1.0)];
        let low = FlightSimulator::with_tables(airlines.clone(), vec![flat_route(700, 1.0)]);
        let high = FlightSimulator::with_tables(airlines, vec![flat_route(700, 2.0)]);

        // Same seed, so the same noise draws
        let low = low
            .generate_flights(&mut rng(), "AAA", "BBB", "2025-04-01", 20, Season::Autumn)
            .unwrap();
        let high = high
            .generate_flights(&mut rng(), "AAA", "BBB", "2025-04-01", 20, Season::Autumn)
            .unwrap();

        for (l, h) in low.iter().zip(&high) {
            // Each side is rounded to cents
            assert!((h.price - 2.0 * l.price).abs() <= 0.016);
        }
    }

    #[test]
    fn test_zero_weight_airline_never_picked() {
        let airlines = vec![
            Airline::new("QF", "Qantas", 180.0, 0.95),
            Airline::new("ZZ", "Grounded Air", 10.0, 0.0),
            Airline::new("JQ", "Jetstar", 120.0, 0.85),
        ];
        let sim = FlightSimulator::with_tables(airlines, vec![flat_route(700, 1.0)]);
        let flights = sim
            .generate_flights(&mut rng(), "AAA", "BBB", "2025-04-01", 2_000, Season::Autumn)
            .unwrap();

        assert!(flights.iter().all(|f| f.airline != "Grounded Air"));
        assert!(flights.iter().any(|f| f.airline == "Qantas"));
        assert!(flights.iter().any(|f| f.airline == "Jetstar"));
    }

    #[test]
    fn test_airline_picks_follow_reliability() {
        let sim = FlightSimulator::new();
        let flights = sim
            .generate_flights(&mut rng(), "SYD", "MEL", "2025-06-15", 30_000, Season::Winter)
            .unwrap();

        let total: f64 = sim.airlines().iter().map(|a| a.reliability).sum();
        for airline in sim.airlines() {
            let count = flights.iter().filter(|f| f.airline == airline.name).count();
            let share = count as f64 / flights.len() as f64;
            let expected = airline.reliability / total;
            assert!(
                (share - expected).abs() < 0.01,
                "{} share {} expected {}",
                airline.name,
                share,
                expected
            );
        }
    }
}
