//! Backend crate for the fare simulator demo.
//!
//! Uses actix to serve synthetic flight search results and route demand statistics to the travel
//! front end.

pub mod insights;
pub mod simulator;
pub mod web_app;

use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;
use simulator::FlightSimulator;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, env = "FARE_SIM_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "FARE_SIM_PORT", default_value_t = 8000)]
    port: u16,
}

fn initialize_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Also installs a `log` bridge, so actix's access logs go through the same subscriber
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();
    initialize_logging();

    let simulator = web::Data::new(FlightSimulator::new());
    info!(
        "Initialized with {} airlines and {} routes",
        simulator.airlines().len(),
        simulator.routes().len()
    );
    info!("Listening on http://{}:{}", cli.host, cli.port);

    HttpServer::new(move || {
        App::new()
            .wrap(web_app::cors())
            .wrap(middleware::Logger::default())
            .app_data(simulator.clone())
            .configure(web_app::configure)
    })
    .bind((cli.host.as_str(), cli.port))?
    .run()
    .await
}
