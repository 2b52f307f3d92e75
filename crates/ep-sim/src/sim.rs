//! The `Simulation` struct, its day loop, and multi-config sweeps.

use ep_core::{DayOfWeek, EpiConfig};
use ep_provider::EventProvider;
use log::info;

use crate::{EpiObserver, InfectionEventHandler, InfectionReport, NoopObserver, SimBuilder, SimError, SimResult};

// ── Simulation ────────────────────────────────────────────────────────────────

/// One run over a shared, initialized provider.
///
/// Each iteration is a day, processed strictly in order:
///
/// 1. **Reset**: provider and handler start the iteration; the handler
///    runs progression, imports cases and updates restrictions.
/// 2. **Replay**: every event of the iteration's weekday is passed to the
///    handler in provider order.
/// 3. **Report**: the day's infections and the completed report go to the
///    observer.
///
/// Create via [`SimBuilder`].
pub struct Simulation<'p> {
    /// Source of the daily events.  Only read, so runs can share it.
    pub provider: &'p dyn EventProvider,

    /// Population and models of this run.
    pub handler: InfectionEventHandler,
}

impl<'p> Simulation<'p> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run until iteration `max_iterations`, or earlier once nothing can
    /// change any more.  Returns the report of the last day run.
    ///
    /// Calls observer hooks at every day boundary.  Use [`NoopObserver`] if
    /// you don't need callbacks.
    pub fn run<O: EpiObserver>(&mut self, max_iterations: u32, observer: &mut O) -> SimResult<InfectionReport> {
        if max_iterations <= self.handler.iteration() {
            return Err(SimError::Config(format!(
                "max_iterations {max_iterations} leaves no day to run after iteration {}",
                self.handler.iteration()
            )));
        }

        let mut last = self.step(observer)?;
        while last.iteration < max_iterations {
            if self.handler.is_finished() {
                info!("nothing left to progress after day {}; stopping early", last.iteration);
                break;
            }
            last = self.step(observer)?;
        }
        observer.on_sim_end(&last);
        Ok(last)
    }

    /// Run exactly one more day.
    pub fn step<O: EpiObserver>(&mut self, observer: &mut O) -> SimResult<InfectionReport> {
        let provider = self.provider;
        self.handler.init(provider)?;

        let iteration = self.handler.iteration() + 1;
        provider.reset(iteration);
        self.handler.reset(iteration)?;

        let day = DayOfWeek::for_iteration(self.handler.config().start_day, iteration);
        self.handler.set_trajectories(provider.trajectories(day)?)?;
        observer.on_day_start(iteration, day);
        for event in provider.for_day(day)? {
            self.handler.process_event(&event)?;
        }

        let infections = self.handler.finish_day()?;
        for infection in &infections {
            observer.on_infection(infection);
        }
        let report = self.handler.report().cloned().ok_or(SimError::NotInitialized)?;
        info!("{report}");
        observer.on_report(&report);
        Ok(report)
    }
}

// ── Sweeps ────────────────────────────────────────────────────────────────────

/// Run one isolated simulation per config over the same provider.
///
/// Results are in config order.  With the `parallel` feature the runs are
/// spread over Rayon's thread pool; each run still sees its days strictly
/// in order.
pub fn run_sweep(
    provider:       &dyn EventProvider,
    configs:        &[EpiConfig],
    max_iterations: u32,
) -> Vec<SimResult<InfectionReport>> {
    let run_one = |config: &EpiConfig| -> SimResult<InfectionReport> {
        let mut sim = SimBuilder::new(provider, config.clone()).build()?;
        sim.run(max_iterations, &mut NoopObserver)
    };

    #[cfg(not(feature = "parallel"))]
    {
        configs.iter().map(run_one).collect()
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        configs.par_iter().map(run_one).collect()
    }
}
