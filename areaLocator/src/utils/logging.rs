use anyhow::anyhow;
use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::Level;
use tracing_subscriber::{EnvFilter, prelude::*};
use tracing_timing::{Builder, Histogram};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use parking_lot::RwLock;
use std::time::{Duration, Instant};

// Phases of a locator run that get timed separately
#[derive(Hash, Eq, PartialEq, Clone, Copy, Debug)]
pub enum SearchPhase {
    DataLoad,
    IndexBuild,
    RadiusSearch,
    DensityExpansion,
    Batch,
    Export,
}

impl SearchPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchPhase::DataLoad => "Data Load",
            SearchPhase::IndexBuild => "Index Build",
            SearchPhase::RadiusSearch => "Radius Search",
            SearchPhase::DensityExpansion => "Density Expansion",
            SearchPhase::Batch => "Batch",
            SearchPhase::Export => "Export",
        }
    }
}

lazy_static! {
    static ref TIMING_ENABLED: AtomicBool = AtomicBool::new(false);
    static ref FUNCTION_TIMINGS: Arc<RwLock<HashMap<String, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
    static ref PHASE_TIMINGS: Arc<RwLock<HashMap<SearchPhase, Histogram<u64>>>> = Arc::new(RwLock::new(HashMap::new()));
}

const HISTOGRAM_MAX_NS: u64 = 60_000_000_000;

fn new_histogram() -> Option<Histogram<u64>> {
    Histogram::<u64>::new_with_bounds(1, HISTOGRAM_MAX_NS, 3).ok()
}

fn record_into<K>(map: &RwLock<HashMap<K, Histogram<u64>>>, key: K, duration_ns: u64)
where
    K: std::hash::Hash + Eq,
{
    let mut timings = map.write();
    let histogram = match timings.entry(key) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => match new_histogram() {
            Some(histogram) => entry.insert(histogram),
            None => return,
        },
    };
    // Durations above the histogram ceiling are clamped rather than dropped
    let _ = histogram.record(duration_ns.clamp(1, HISTOGRAM_MAX_NS));
}

pub struct TimingGuard {
    function_name: &'static str,
    phase: SearchPhase,
    start: Instant,
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        record_timing(self.function_name, self.phase, self.start.elapsed());
    }
}

pub fn start_timing(function_name: &'static str, phase: SearchPhase) -> TimingGuard {
    TimingGuard {
        function_name,
        phase,
        start: Instant::now(),
    }
}

fn record_timing(function_name: &str, phase: SearchPhase, duration: Duration) {
    if !is_timing_enabled() {
        return;
    }

    let duration_ns = duration.as_nanos().min(u64::MAX as u128) as u64;
    record_into(&**FUNCTION_TIMINGS, function_name.to_string(), duration_ns);
    record_into(&**PHASE_TIMINGS, phase, duration_ns);
}

pub fn init_logging(enable_timing: bool, debug_logging: bool) -> anyhow::Result<()> {
    TIMING_ENABLED.store(enable_timing, Ordering::SeqCst);

    let mut env_filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    if debug_logging {
        env_filter = env_filter.add_directive("area_locator=debug".parse()?);
    }

    if enable_timing {
        let template = new_histogram().ok_or_else(|| anyhow!("invalid timing histogram bounds"))?;
        let timing_layer = Builder::default().layer(move || template.clone());

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .with(timing_layer.boxed());

        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty());

        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::SeqCst)
}

pub fn print_timing_report() {
    if !is_timing_enabled() {
        return;
    }

    println!("\nPerformance Report");
    println!("==================");

    println!("\nBy function:");
    println!("------------");
    let functions = FUNCTION_TIMINGS.read();
    let mut entries: Vec<_> = functions.iter().collect();
    entries.sort_by(|a, b| {
        let a_total = a.1.mean() * a.1.len() as f64;
        let b_total = b.1.mean() * b.1.len() as f64;
        b_total.partial_cmp(&a_total).unwrap_or(std::cmp::Ordering::Equal)
    });

    for (function_name, histogram) in entries {
        println!(
            "{}: count={}, mean={:.3}ms, p99={:.3}ms",
            function_name,
            histogram.len(),
            histogram.mean() / 1_000_000.0,
            histogram.value_at_quantile(0.99) as f64 / 1_000_000.0,
        );
    }

    println!("\nBy phase:");
    println!("---------");
    let phases = PHASE_TIMINGS.read();
    let mut phase_vec: Vec<_> = phases.iter().collect();
    phase_vec.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));

    let total_time: f64 = phase_vec.iter()
        .map(|(_, hist)| hist.mean() * (hist.len() as f64))
        .sum();

    for (phase, histogram) in phase_vec {
        let phase_total = histogram.mean() * (histogram.len() as f64);
        let percentage = if total_time > 0.0 { (phase_total / total_time) * 100.0 } else { 0.0 };
        println!(
            "{}: {:.1}% of total time\n  mean={:.3}ms, p95={:.3}ms, count={}, total={:.3}s",
            phase.as_str(),
            percentage,
            histogram.mean() / 1_000_000.0,
            histogram.value_at_quantile(0.95) as f64 / 1_000_000.0,
            histogram.len(),
            phase_total / 1_000_000_000.0,
        );
    }

    println!("==================\n");
}
