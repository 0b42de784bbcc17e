//! Main web app module containing the API routes.

use crate::insights::{generate_insights, seasonal_tip};
use crate::simulator::{FlightSimulator, SimError};
use actix_cors::Cors;
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{get, post, web, HttpResponse, ResponseError};
use fare_sim_shared::flights::{Flight, Season};
use fare_sim_shared::queries::{FlightSearchQuery, ValidationError};
use fare_sim_shared::responses::{
    ErrorDetail, FlightSearchResponse, PopularRoutesResponse, RoutesDebug, SearchMetadata,
};
use rand::Rng;
use thiserror::Error;
use tracing::{error, info};

const OUTBOUND_FLIGHTS: std::ops::RangeInclusive<usize> = 8..=15;
const RETURN_FLIGHTS: std::ops::RangeInclusive<usize> = 5..=10;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorDetail {
            detail: self.to_string(),
        })
    }
}

/// Local time in ISO 8601 form, e.g. `2025-06-15T09:30:00.123456`
fn timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Outbound flights, then the return leg if one was asked for, cheapest first overall.
pub fn search_flights<R: Rng + ?Sized>(
    sim: &FlightSimulator,
    query: &FlightSearchQuery,
    rng: &mut R,
    season: Season,
) -> Result<Vec<Flight>, SimError> {
    let origin = query.origin_code();
    let destination = query.destination_code();

    let num_outbound = rng.gen_range(OUTBOUND_FLIGHTS);
    let mut flights =
        sim.generate_flights(rng, &origin, &destination, &query.date, num_outbound, season)?;

    if let Some(return_date) = query.return_date() {
        let num_return = rng.gen_range(RETURN_FLIGHTS);
        let return_flights =
            sim.generate_flights(rng, &destination, &origin, return_date, num_return, season)?;
        flights.extend(return_flights);
        // Stable, so equal prices keep outbound before return
        flights.sort_by(|a, b| a.price.total_cmp(&b.price));
    }

    Ok(flights)
}

/// Endpoint for searching synthetic flights
#[post("/api/flights")]
pub async fn flight_search(
    sim: web::Data<FlightSimulator>,
    json: web::Json<FlightSearchQuery>,
) -> Result<HttpResponse, ApiError> {
    let query = json.into_inner();
    info!(?query, "Received request");

    query.validate()?;

    let flights = search_flights(&sim, &query, &mut rand::thread_rng(), Season::current())
        .map_err(|e| {
            error!("Error processing request: {}", e);
            ApiError::Internal(format!("Internal server error: {}", e))
        })?;

    info!("Generated {} flights", flights.len());

    let insights = generate_insights(&flights);
    let num_flights = flights.len();
    Ok(HttpResponse::Ok().json(FlightSearchResponse {
        data: flights,
        insights,
        metadata: SearchMetadata {
            generated_at: timestamp(),
            num_flights,
        },
    }))
}

/// Endpoint for demand statistics over the route network
#[get("/api/popular-routes")]
pub async fn popular_routes(sim: web::Data<FlightSimulator>) -> HttpResponse {
    info!("Fetching popular routes");

    let routes = sim.route_stats(Season::current());
    let season = routes
        .first()
        .map(|r| r.season)
        .unwrap_or(Season::Summer);

    HttpResponse::Ok().json(PopularRoutesResponse {
        seasonal_advice: seasonal_tip(season.as_str()).to_string(),
        debug: RoutesDebug {
            num_routes: routes.len(),
            generated_at: timestamp(),
        },
        routes,
    })
}

/// Rejects malformed bodies the same way as failed validation.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let resp = HttpResponse::UnprocessableEntity().json(ErrorDetail {
            detail: err.to_string(),
        });
        InternalError::from_response(err, resp).into()
    })
}

/// Any origin, method and header, for the demo front end.
pub fn cors() -> Cors {
    Cors::permissive()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(flight_search)
        .service(popular_routes);
}
