use clap::{Parser, Subcommand};
use config::Config;
use geofence_phe::{
    init_tracing, test_utils::generate_user_points, BoundaryEvaluatorService, DisclosureOutcome,
    KeyHolderService, LocationOwner, ProtocolCoordinator, Scheme,
};
use std::{fs, path::PathBuf, sync::Arc, time::Instant};
use tracing::info;

pub mod config;

/// Run the three-role encrypted geofencing protocol in one process.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Disclose one location against the configured registry.
    Run {
        #[arg(short, long)]
        config: PathBuf,

        /// Location Owner latitude, degrees
        #[arg(long)]
        latitude: f64,

        /// Location Owner longitude, degrees
        #[arg(long)]
        longitude: f64,
    },
    /// Push generated points through both encoding variants and report
    /// agreement with the plaintext haversine baseline.
    Accuracy {
        #[arg(short, long)]
        config: PathBuf,

        #[arg(long, default_value = "10")]
        points: usize,
    },
}

fn load_config(path: &PathBuf) -> Config {
    let contents = fs::read_to_string(path).unwrap();
    toml::from_str(&contents).unwrap()
}

fn deploy(
    cfg: &Config,
    scheme: Scheme,
) -> (Arc<KeyHolderService>, ProtocolCoordinator<BoundaryEvaluatorService<Arc<KeyHolderService>>>) {
    let key_holder = Arc::new(KeyHolderService::generate(
        cfg.key_bits,
        scheme,
        cfg.radius_m,
        cfg.earth_radius_m,
    ));
    let evaluator =
        BoundaryEvaluatorService::bootstrap(cfg.registry(), scheme, Arc::clone(&key_holder))
            .unwrap();
    (key_holder, ProtocolCoordinator::new(scheme, evaluator))
}

fn disclose(
    key_holder: &Arc<KeyHolderService>,
    coordinator: &ProtocolCoordinator<BoundaryEvaluatorService<Arc<KeyHolderService>>>,
    latitude_rad: f64,
    longitude_rad: f64,
) -> DisclosureOutcome {
    let owner = LocationOwner::bootstrap(latitude_rad, longitude_rad, key_holder).unwrap();
    coordinator.run(&owner).unwrap()
}

fn main() {
    init_tracing();
    match Args::parse().command {
        Commands::Run { config, latitude, longitude } => {
            let cfg = load_config(&config);
            let scheme: Scheme = cfg.scheme.parse().unwrap();
            let (key_holder, coordinator) = deploy(&cfg, scheme);

            let start = Instant::now();
            let outcome =
                disclose(&key_holder, &coordinator, latitude.to_radians(), longitude.to_radians());
            info!("Time to run disclosure: {:?}", start.elapsed());

            match outcome {
                DisclosureOutcome::Classified(statuses) => {
                    for (index, status) in statuses.iter().enumerate() {
                        println!("geofence {index}: {}", status.as_str());
                    }
                }
                DisclosureOutcome::Unknown { reason } => {
                    println!("result unknown: {reason}");
                }
            }
        }
        Commands::Accuracy { config, points } => {
            let cfg = load_config(&config);
            let registry = cfg.registry();
            let center = registry.centers()[0];
            let mut rng = rand::thread_rng();
            let generated =
                generate_user_points(&center, cfg.radius_m, cfg.earth_radius_m, points, &mut rng);
            let samples: Vec<(f64, f64)> = generated
                .inside
                .into_iter()
                .chain(generated.outside)
                .chain(generated.edge)
                .collect();

            for scheme in [Scheme::Reference, Scheme::Proposed] {
                let (key_holder, coordinator) = deploy(&cfg, scheme);
                let start = Instant::now();
                let mut correct = 0usize;
                for &(lat, lon) in &samples {
                    let truth = registry.contains_plaintext(&center, lat, lon);
                    let outcome = disclose(&key_holder, &coordinator, lat, lon);
                    let DisclosureOutcome::Classified(statuses) = outcome else {
                        panic!("disclosure did not classify");
                    };
                    let inside = statuses[0] == geofence_phe::GeofenceStatus::Inside;
                    if inside == truth {
                        correct += 1;
                    }
                }
                info!(
                    "Time to classify {} points under the {} scheme: {:?}",
                    samples.len(),
                    scheme.name(),
                    start.elapsed(),
                );
                println!(
                    "{} scheme: {}/{} agree with the plaintext baseline ({:.1}%)",
                    scheme.name(),
                    correct,
                    samples.len(),
                    100.0 * correct as f64 / samples.len() as f64,
                );
            }
        }
    }
}
