use crate::demo::{run_demo, DemoArgs};
use crate::infra::load_directory;
use crate::server;
use clap::{Args, Parser, Subcommand};
use shiftgate::error::AppError;
use shiftgate::workflows::geofence::{
    distance_meters, EntityKind, EntityRef, GeoPoint, GeofenceResolver,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "shiftgate",
    about = "Location- and photo-verified attendance checks from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Great-circle distance in meters between two coordinates
    Distance(DistanceArgs),
    /// Check a position against an entity's authorized work locations
    Geofence(GeofenceArgs),
    /// Walk one worker through a scripted shift with in-memory collaborators
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON snapshot of work locations and assignments
    #[arg(long)]
    pub(crate) locations: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DistanceArgs {
    #[arg(long, allow_hyphen_values = true)]
    from_lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    from_lon: f64,
    #[arg(long, allow_hyphen_values = true)]
    to_lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    to_lon: f64,
}

#[derive(Args, Debug)]
struct GeofenceArgs {
    /// JSON snapshot of work locations and assignments (defaults to the sample site)
    #[arg(long)]
    locations: Option<PathBuf>,
    /// Entity kind: worker or employee
    #[arg(long, default_value = "worker", value_parser = parse_kind)]
    kind: EntityKind,
    /// Entity identifier
    #[arg(long)]
    id: String,
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lon: f64,
}

fn parse_kind(raw: &str) -> Result<EntityKind, String> {
    EntityKind::parse(raw).ok_or_else(|| format!("unknown entity kind '{raw}'"))
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Distance(args) => {
            let meters = distance_meters(
                GeoPoint::new(args.from_lat, args.from_lon),
                GeoPoint::new(args.to_lat, args.to_lon),
            );
            println!("{meters:.2} m");
            Ok(())
        }
        Command::Geofence(args) => run_geofence(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}

async fn run_geofence(args: GeofenceArgs) -> Result<(), AppError> {
    let directory = load_directory(args.locations.as_deref())?;
    let resolver = GeofenceResolver::new(Arc::new(directory));
    let entity = EntityRef {
        kind: args.kind,
        id: args.id,
    };

    match resolver
        .resolve(&entity, GeoPoint::new(args.lat, args.lon))
        .await
    {
        Ok(matched) => println!(
            "{entity}: inside {} ({:.1} m of {:.0} m, {:?} assignment)",
            matched.location_name, matched.distance_meters, matched.radius_meters, matched.tier
        ),
        Err(violation) => println!("{entity}: rejected [{}] {violation}", violation.code()),
    }
    Ok(())
}
