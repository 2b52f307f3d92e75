//! small_town: a week of synthetic movements replayed for a few months.
//!
//! Builds the movements of a few hundred households, packs them into a
//! graph archive, reloads the archive and runs the epidemic on it with
//! work and leisure restricted after three weeks.  Finishes with a seed
//! sweep over the same archive.
//!
//! ```text
//! cargo run -p small_town --release [-- config.json]
//! ```

mod town;

use std::path::Path;
use std::time::Instant;

use anyhow::{Result, bail};
use env_logger::{Builder, Env};
use log::warn;

use ep_core::{DiseaseStatus, EpiConfig, SimRng};
use ep_model::{InfectionRecord, ScheduledPolicy};
use ep_output::{CsvWriter, IdNames, OutputWriter, ReportObserver};
use ep_provider::{EventProvider, GraphProvider, ScenarioProvider, write_archive};
use ep_sim::{EpiObserver, InfectionReport, SimBuilder, run_sweep};

// ── Constants ─────────────────────────────────────────────────────────────────

const HOUSEHOLDS:   usize = 400;
const TOWN_SEED:    u64   = 7;
const BUS_CAPACITY: u32   = 60;
const SIM_DAYS:     u32   = 120;
const LOCKDOWN_DAY: u32   = 21;
const SWEEP_SEEDS:  [u64; 4] = [1, 2, 3, 4];

const OUTPUT_DIR: &str = "output/small_town";
const DEFAULT_CONFIG: &str = include_str!("../config.json");

// ── Observer wrapper to print progress ───────────────────────────────────────

struct ProgressObserver<W: OutputWriter> {
    inner:      ReportObserver<W>,
    infections: usize,
    days:       usize,
    peak:       (u32, usize),
}

impl<W: OutputWriter> ProgressObserver<W> {
    fn new(inner: ReportObserver<W>) -> Self {
        Self { inner, infections: 0, days: 0, peak: (0, 0) }
    }
}

impl<W: OutputWriter> EpiObserver for ProgressObserver<W> {
    fn on_infection(&mut self, infection: &InfectionRecord) {
        self.infections += 1;
        self.inner.on_infection(infection);
    }

    fn on_report(&mut self, report: &InfectionReport) {
        self.days += 1;
        if report.active_infections() > self.peak.1 {
            self.peak = (report.iteration, report.active_infections());
        }
        if report.iteration % 7 == 0 {
            println!("  {report}");
        }
        self.inner.on_report(report);
    }

    fn on_sim_end(&mut self, final_report: &InfectionReport) {
        self.inner.on_sim_end(final_report);
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => EpiConfig::from_json_file(path)?,
        None => EpiConfig::from_json_str(DEFAULT_CONFIG)?,
    };

    println!("=== small_town: rust_ep contact simulation ===");
    println!("Households: {HOUSEHOLDS}  |  Days: {SIM_DAYS}  |  Seed: {}", config.seed);
    println!();

    // 1. Synthetic movements for one week.
    let movements = town::build_movements(HOUSEHOLDS, &mut SimRng::new(TOWN_SEED));
    println!("Generated {} movements", movements.len());

    // 2. Scenario provider; bus capacities come from the fleet, not from counts.
    let mut scenario = ScenarioProvider::new(movements, &config)?
        .with_capacities((0..town::BUS_LINES).map(|line| (town::bus(line), BUS_CAPACITY)));
    scenario.init()?;
    println!(
        "Scenario: {} persons, {} containers",
        scenario.persons().len(),
        scenario.containers().len()
    );

    // 3. Pack the week into an archive and read it back.
    std::fs::create_dir_all(OUTPUT_DIR)?;
    let archive_path = Path::new(OUTPUT_DIR).join("week.tar.lz4");
    let archive = write_archive(&archive_path, &scenario)?;
    let stored: Vec<String> = archive.stored_days().map(|d| d.to_string()).collect();
    println!("Archive {}: stored {}", archive_path.display(), stored.join(", "));

    let mut provider = GraphProvider::open(&archive_path, &config)?;
    provider.init()?;

    // 4. Output.
    let names = IdNames::new(provider.persons(), provider.containers());
    let writer = CsvWriter::new(Path::new(OUTPUT_DIR))?.with_names(names);
    let mut obs = ProgressObserver::new(ReportObserver::new(writer));

    // 5. Build the simulation: work and leisure shrink after three weeks.
    let policy = ScheduledPolicy::new()
        .fraction_at(LOCKDOWN_DAY, "work", 0.5)
        .fraction_at(LOCKDOWN_DAY, "leisure", 0.2);
    let mut sim = SimBuilder::new(&provider, config.clone()).policy(policy).build()?;

    // 6. Run.
    println!();
    let t0 = Instant::now();
    let last = sim.run(SIM_DAYS, &mut obs)?;
    let elapsed = t0.elapsed();

    if let Some(e) = obs.inner.take_error() {
        bail!("output error: {e}");
    }

    // 7. Summary.
    println!();
    println!("Simulation complete in {:.3} s after {} days", elapsed.as_secs_f64(), obs.days);
    println!("  infections.csv : {} rows", obs.infections);
    println!("  reports.csv    : {} rows", obs.days);
    println!("  peak           : {} active on day {}", obs.peak.1, obs.peak.0);
    println!(
        "  final          : {} susceptible, {} recovered",
        last.count(DiseaseStatus::Susceptible),
        last.count(DiseaseStatus::Recovered)
    );
    println!();

    // 8. Seed sweep over the same archive.
    let configs: Vec<EpiConfig> =
        SWEEP_SEEDS.iter().map(|&seed| EpiConfig { seed, ..config.clone() }).collect();
    let results = run_sweep(&provider, &configs, SIM_DAYS);

    println!("{:<8} {:<6} {:<12} {:<12}", "Seed", "Days", "Cumulative", "Susceptible");
    println!("{}", "-".repeat(40));
    for (config, result) in configs.iter().zip(results) {
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                warn!("seed {}: {e}", config.seed);
                continue;
            }
        };
        println!(
            "{:<8} {:<6} {:<12} {:<12}",
            config.seed,
            report.iteration,
            report.cumulative_infected(),
            report.count(DiseaseStatus::Susceptible),
        );
    }

    Ok(())
}
