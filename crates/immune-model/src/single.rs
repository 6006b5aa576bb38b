//! Single-Strain Immune Dynamics
//!
//! The within-host virus/infected/immune/antibody equations for one strain,
//! advanced with a fixed-step explicit scheme. The immune response term reads
//! the infected-cell count from a fixed number of steps in the past; before
//! enough history exists the delayed value is taken as zero.

use serde::{Deserialize, Serialize};

use crate::params::{ImmuneParams, VIRUS_STEP_DECAY};
use crate::timeseries::TimeSeries;

/// Within-host state for a single virus strain.
///
/// Tracks four coupled quantities plus derived healthy-cell and elapsed-time
/// series. One `advance_one_step` call integrates one `dt` of model time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImmuneState {
    params: ImmuneParams,
    /// Free virus load (V).
    pub virus: f64,
    /// Infected-cell count (I), always within `[0, max_cells]`.
    pub infected_cells: f64,
    /// Immune-cell count (M).
    pub immune_cells: f64,
    /// Antibody level (A).
    pub antibodies: f64,
    virus_history: TimeSeries,
    infected_history: TimeSeries,
    immune_history: TimeSeries,
    antibody_history: TimeSeries,
    healthy_history: TimeSeries,
    time: TimeSeries,
}

impl ImmuneState {
    /// Creates a state with no virus and a fully healthy cell pool.
    pub fn new(params: ImmuneParams) -> Self {
        Self::with_virus(params, 0.0)
    }

    /// Creates a state seeded with an initial virus load.
    pub fn with_virus(params: ImmuneParams, virus: f64) -> Self {
        Self {
            params,
            virus,
            infected_cells: 0.0,
            immune_cells: 0.0,
            antibodies: 0.0,
            virus_history: TimeSeries::new(),
            infected_history: TimeSeries::new(),
            immune_history: TimeSeries::new(),
            antibody_history: TimeSeries::new(),
            healthy_history: TimeSeries::new(),
            time: TimeSeries::new(),
        }
    }

    pub fn params(&self) -> &ImmuneParams {
        &self.params
    }

    /// Healthy-cell count, always `max_cells - infected_cells`.
    pub fn healthy_cells(&self) -> f64 {
        self.params.max_cells - self.infected_cells
    }

    /// Advances the state by one integration step of `dt`.
    pub fn advance_one_step(&mut self) {
        let p = &self.params;
        let n = p.max_cells;
        let infected_ratio = self.infected_cells / n;
        let healthy = n - self.infected_cells;

        let dv = p.virus_growth * (1.0 - infected_ratio) * self.virus
            - p.virus_loss * self.virus * healthy
            - p.antibody_efficiency * self.antibodies * self.virus * (1.0 + infected_ratio);

        // Response lag: infected-cell count from delay_steps ago, zero until
        // enough history has accumulated.
        let delayed_infected = self
            .infected_history
            .delayed(p.delay_steps())
            .unwrap_or(0.0);

        let dm = p.immune_gain * delayed_infected * self.virus - p.immune_death * self.immune_cells;
        let di = p.infection_gain * dv.max(0.0) - p.immune_death * delayed_infected;
        let da = p.antibody_growth * self.immune_cells - p.antibody_decay * self.antibodies;

        self.virus = (self.virus + dv * p.dt - VIRUS_STEP_DECAY).abs();
        self.infected_cells = (self.infected_cells + di * p.dt).clamp(0.0, n);
        self.immune_cells += dm * p.dt;
        self.antibodies += da * p.dt;

        self.record();
    }

    /// Folds an instantaneous exposure into the virus load.
    ///
    /// The amount is scaled by `dt`: exposure magnitude is a dose rate, not a
    /// dose. Zero and non-finite amounts are ignored.
    pub fn add_virus(&mut self, amount: f64) {
        if amount == 0.0 || !amount.is_finite() {
            return;
        }
        self.virus += amount * self.params.dt;
    }

    /// Runs `floor(total_time / dt)` integration steps.
    pub fn simulate(&mut self, total_time: f64) {
        let steps = (total_time / self.params.dt) as usize;
        for _ in 0..steps {
            self.advance_one_step();
        }
    }

    fn record(&mut self) {
        self.virus_history.push(self.virus);
        self.infected_history.push(self.infected_cells);
        self.immune_history.push(self.immune_cells);
        self.antibody_history.push(self.antibodies);
        self.healthy_history.push(self.healthy_cells());
        self.time.push(self.time.len() as f64 * self.params.dt);
    }

    pub fn virus_history(&self) -> &TimeSeries {
        &self.virus_history
    }

    pub fn infected_history(&self) -> &TimeSeries {
        &self.infected_history
    }

    pub fn immune_history(&self) -> &TimeSeries {
        &self.immune_history
    }

    pub fn antibody_history(&self) -> &TimeSeries {
        &self.antibody_history
    }

    pub fn healthy_history(&self) -> &TimeSeries {
        &self.healthy_history
    }

    /// Elapsed model time per recorded step.
    pub fn time(&self) -> &TimeSeries {
        &self.time
    }
}
