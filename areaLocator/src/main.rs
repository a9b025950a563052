use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use area_locator::cli::cli::Args;
use area_locator::config::locator_config::LocatorConfig;
use area_locator::core::batch::locate_batch;
use area_locator::core::locator::AreaLocator;
use area_locator::data::stations_loader;
use area_locator::models::area::{AreaResult, DensityBand, SearchOutcome};
use area_locator::utils::csv_export;
use area_locator::utils::logging;

fn build_config(args: &Args) -> anyhow::Result<LocatorConfig> {
    let mut config = match args.config() {
        Some(path) => LocatorConfig::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LocatorConfig::default(),
    };

    if let Some(ns3_home) = args.ns3_home() {
        config = config.with_ns3_home(ns3_home);
    }
    if let Some(dataset) = args.dataset() {
        config.dataset_path = dataset.to_path_buf();
    }
    if let Some(max_attempts) = args.max_attempts() {
        config.max_attempts = max_attempts;
    }
    if let Some(timeout) = args.timeout_secs() {
        config.timeout_secs = Some(timeout);
    }
    if let Some((min, max)) = args.density() {
        config.min_density = min;
        config.max_density = max;
    }

    config.validate()?;
    DensityBand::new(config.min_density, config.max_density)?;
    Ok(config)
}

fn attempt_spinner() -> anyhow::Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} [{elapsed_precise}] attempt {pos} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(120));
    Ok(spinner)
}

fn print_area(area: &AreaResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(area)?);
        return Ok(());
    }

    println!("Found area with density of {:.2} after {} attempts!", area.density, area.attempts);
    println!("  Center:   {:.6}, {:.6}", area.center_lat, area.center_lon);
    println!("  Size:     {:.3} km x {:.3} km ({:.3} km²)", area.width_km, area.height_km, area.area_sq_km());
    println!("  Stations: {}", area.station_count());
    println!("  Bounds:   {}", area.bounds);
    println!("  Scenario: {}", area.scenario_name());
    println!("  OSM bbox: {}", area.scenario_bounds());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init_logging(args.enable_timing(), args.debug_logging())?;

    let config = build_config(&args)?;
    tracing::debug!(?config, "Resolved configuration");

    let stations = stations_loader::load_stations(&config.dataset_path)
        .with_context(|| format!("Failed to load stations from {}", config.dataset_path.display()))?;

    let spinner = attempt_spinner()?;
    let locator = AreaLocator::new(&stations, config.limits())?.with_progress(spinner.clone());

    if !args.batch_seeds().is_empty() {
        let entries = locate_batch(
            &locator,
            args.base_stations(),
            args.batch_seeds(),
            config.min_density,
            config.max_density,
            args.parallel(),
        );
        spinner.finish_and_clear();

        if args.json() {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            for entry in &entries {
                match &entry.result {
                    Ok(SearchOutcome::Found(area)) => println!(
                        "seed {}: density {:.2}, center {:.6},{:.6}, {:.3} x {:.3} km, {} attempts",
                        entry.seed, area.density, area.center_lat, area.center_lon,
                        area.width_km, area.height_km, area.attempts
                    ),
                    Ok(SearchOutcome::Exhausted { attempts, reason }) => {
                        println!("seed {}: no area found after {} attempts ({})", entry.seed, attempts, reason)
                    }
                    Err(e) => println!("seed {}: {}", entry.seed, e),
                }
            }
        }

        if let Some(path) = args.export_results() {
            csv_export::export_batch_results(path, &entries)?;
        }

        logging::print_timing_report();
        return Ok(());
    }

    let outcome = locator.find_area_with_base_stations(
        args.base_stations(),
        args.seed(),
        config.min_density,
        config.max_density,
    )?;
    spinner.finish_and_clear();

    let area = match outcome {
        SearchOutcome::Found(area) => area,
        SearchOutcome::Exhausted { attempts, reason } => {
            logging::print_timing_report();
            bail!(
                "No area with {} base stations and density in [{}, {}] found after {} attempts: {}",
                args.base_stations(), config.min_density, config.max_density, attempts, reason
            );
        }
    };

    print_area(&area, args.json())?;

    if let Some(path) = args.export_stations() {
        csv_export::export_area_stations(path, &stations, &area)?;
    }

    logging::print_timing_report();
    Ok(())
}
