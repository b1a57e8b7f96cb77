//! Plan a route across waypoints against a brouter-compatible
//! service and print the distance breakdown.
//!
//! Usage:
//!   cargo run -p wander-cli --bin plan_route -- 53.6,10.0,Start 53.61,10.02,End

use anyhow::{bail, Context, Result};
use clap::Parser;
use wander_brouter::{BrouterClient, ProfileCatalog};
use wander_cli::parse_waypoint;
use wander_core::{
    decode_query, encode_query, LatLng, MapView, RouteSet, RoutingProfile, ShareState, Waypoint,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan a route across waypoints")]
struct Args {
    /// Routing service endpoint
    #[arg(long, default_value = "https://brouter.de/brouter")]
    server: String,

    /// Routing profile name (a service built-in, or a catalog entry
    /// when --catalog is given)
    #[arg(long, default_value = wander_core::DEFAULT_PROFILE)]
    profile: String,

    /// URL of a profiles.json catalog to load custom profiles from
    #[arg(long)]
    catalog: Option<String>,

    /// Print a shareable query string for the planned route
    #[arg(long)]
    share: bool,

    /// Restore waypoints and profile from a share query string
    /// instead of waypoint arguments
    #[arg(long)]
    from_share: Option<String>,

    /// Waypoints as lat,lng[,name]
    waypoints: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let (waypoints, mut profile) = match &args.from_share {
        Some(query) => {
            if !args.waypoints.is_empty() {
                bail!("--from-share and waypoint arguments are mutually exclusive");
            }
            let state = decode_query(query);
            (state.waypoints, state.profile)
        }
        None => {
            let waypoints = args
                .waypoints
                .iter()
                .enumerate()
                .map(|(i, arg)| parse_waypoint(arg, i))
                .collect::<Result<Vec<Waypoint>>>()?;
            (waypoints, resolve_profile(&args).await?)
        }
    };
    if waypoints.len() < 2 {
        bail!("need at least two waypoints to plan a route");
    }

    let client = BrouterClient::new(&args.server);
    let mut routes = RouteSet::new();
    routes
        .update(waypoints, &mut profile, &client)
        .await
        .context("route update failed")?;

    print_report(&routes);

    if args.share {
        let state = ShareState {
            waypoints: routes.waypoints().to_vec(),
            profile,
            view: MapView {
                center: center_of(routes.waypoints()),
                zoom: 13,
            },
        };
        println!("\nShare link query:\n?{}", encode_query(&state));
    }
    Ok(())
}

async fn resolve_profile(args: &Args) -> Result<RoutingProfile> {
    let Some(catalog_url) = &args.catalog else {
        return Ok(RoutingProfile::builtin(args.profile.as_str()));
    };
    let catalog = ProfileCatalog::fetch(catalog_url).await?;
    catalog.load(&args.profile).await
}

fn print_report(routes: &RouteSet) {
    let waypoints = routes.waypoints();
    for (i, route) in routes.routes().iter().enumerate() {
        println!(
            "{} -> {}: {:.2} km",
            waypoints[i].name,
            waypoints[i + 1].name,
            route.distance() / 1000.0
        );
    }
    println!("Total: {:.2} km", routes.total_distance() / 1000.0);

    print_breakdown("Surfaces", routes.surface_breakdown());
    print_breakdown("Way types", routes.way_type_breakdown());
}

fn print_breakdown(title: &str, totals: std::collections::BTreeMap<String, f64>) {
    if totals.is_empty() {
        return;
    }
    println!("\n{title}:");
    for (label, meters) in totals {
        println!("  {label}: {:.2} km", meters / 1000.0);
    }
}

fn center_of(waypoints: &[Waypoint]) -> LatLng {
    if waypoints.is_empty() {
        return MapView::default().center;
    }
    let count = waypoints.len() as f64;
    LatLng::new(
        waypoints.iter().map(|w| w.coordinate.lat).sum::<f64>() / count,
        waypoints.iter().map(|w| w.coordinate.lng).sum::<f64>() / count,
    )
}
