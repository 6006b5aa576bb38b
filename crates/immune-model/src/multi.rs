//! Multi-Strain Immune Dynamics
//!
//! Generalizes the single-strain equations to any number of co-infecting
//! strains. Each strain keeps its own virus and antibody trajectories; the
//! host's infected-cell, immune-cell, and native antibody pools are shared,
//! their deltas summed across strains and applied once per step.

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::params::{ImmuneParams, VIRUS_STEP_DECAY};
use crate::strain::{Strain, StrainId};
use crate::timeseries::TimeSeries;

/// One strain's trajectory within a host.
///
/// A track created mid-run has a shorter history than tracks present since
/// the start; lookups always use this track's own length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrainTrack {
    pub strain: Strain,
    /// Free virus load of this strain (V_k).
    pub virus: f64,
    /// Antibody level specific to this strain (A_k).
    pub antibodies: f64,
    virus_history: TimeSeries,
    antibody_history: TimeSeries,
}

impl StrainTrack {
    fn new(strain: Strain, initial_virus: f64) -> Self {
        Self {
            strain,
            virus: initial_virus,
            antibodies: 0.0,
            virus_history: TimeSeries::new(),
            antibody_history: TimeSeries::new(),
        }
    }

    pub fn virus_history(&self) -> &TimeSeries {
        &self.virus_history
    }

    pub fn antibody_history(&self) -> &TimeSeries {
        &self.antibody_history
    }
}

/// Within-host immune state tracking an arbitrary set of co-infecting strains.
///
/// Tracks are stored in registration order and iterated in that order, so a
/// host's evolution is deterministic regardless of how strain ids hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiStrainImmuneState {
    params: ImmuneParams,
    /// Shared infected-cell count (I), within `[0, max_cells]`.
    pub infected_cells: f64,
    /// Shared immune-cell count (M).
    pub immune_cells: f64,
    /// Host-native antibody pool (A), effective against strains in
    /// proportion to their reactivity.
    pub antibodies: f64,
    tracks: Vec<StrainTrack>,
    infected_history: TimeSeries,
    immune_history: TimeSeries,
    antibody_history: TimeSeries,
    healthy_history: TimeSeries,
    time: TimeSeries,
}

impl MultiStrainImmuneState {
    /// Creates an uninfected host with the given native parameters.
    pub fn new(params: ImmuneParams) -> Self {
        Self {
            params,
            infected_cells: 0.0,
            immune_cells: 0.0,
            antibodies: 0.0,
            tracks: Vec::new(),
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

    /// Registers an exposure to a strain.
    ///
    /// A strain already tracked folds `amount * dt` into its current load and
    /// latest recorded sample rather than creating a duplicate track; a new
    /// strain starts a fresh track seeded with `amount`. Zero and non-finite
    /// amounts are ignored.
    pub fn add_strain(&mut self, strain: Strain, amount: f64) {
        if amount == 0.0 || !amount.is_finite() {
            return;
        }
        if let Some(track) = self.tracks.iter_mut().find(|t| t.strain.id == strain.id) {
            let dose = amount * track.strain.params.dt;
            track.virus += dose;
            track.virus_history.fold_into_latest(dose);
        } else {
            self.tracks.push(StrainTrack::new(strain, amount));
        }
    }

    /// Folds an exposure into the host's native strain track.
    ///
    /// Creates the native track on first use; thereafter behaves exactly like
    /// `add_strain` for that track. Mirrors the single-strain dose-rate
    /// convention, including the no-op on zero.
    pub fn add_virus(&mut self, amount: f64) {
        if amount == 0.0 || !amount.is_finite() {
            return;
        }
        let native = Strain {
            id: StrainId::new("native"),
            reactivity: 1.0,
            params: self.params,
        };
        self.add_strain(native, amount);
    }

    /// Strains currently tracked, in registration order.
    pub fn tracks(&self) -> &[StrainTrack] {
        &self.tracks
    }

    /// Sum of the current virus load across all tracked strains.
    pub fn total_virus_load(&self) -> f64 {
        self.tracks.iter().map(|t| t.virus).sum()
    }

    /// The virus trajectory recorded for one strain.
    pub fn strain_trajectory(&self, id: &StrainId) -> Result<&TimeSeries, ModelError> {
        self.tracks
            .iter()
            .find(|t| &t.strain.id == id)
            .map(|t| t.virus_history())
            .ok_or_else(|| ModelError::StrainNotFound(id.clone()))
    }

    /// The antibody-versus-strain trajectory recorded for one strain.
    pub fn strain_antibody_trajectory(&self, id: &StrainId) -> Result<&TimeSeries, ModelError> {
        self.tracks
            .iter()
            .find(|t| &t.strain.id == id)
            .map(|t| t.antibody_history())
            .ok_or_else(|| ModelError::StrainNotFound(id.clone()))
    }

    /// Advances every strain and the shared pools by one step of `dt`.
    pub fn advance_one_step(&mut self) {
        let host = self.params;
        let n = host.max_cells;
        let infected_ratio = self.infected_cells / n;
        let healthy = n - self.infected_cells;
        let total_virus = self.total_virus_load();

        let delayed_infected = self
            .infected_history
            .delayed(host.delay_steps())
            .unwrap_or(0.0);

        // Per-strain updates, accumulating the shared infection pressure.
        let mut infection_growth = 0.0;
        for track in &mut self.tracks {
            let p = track.strain.params;
            let dv = p.virus_growth * (1.0 - infected_ratio) * track.virus
                - p.virus_loss * track.virus * healthy
                - p.antibody_efficiency * track.antibodies * track.virus * (1.0 + infected_ratio)
                - track.strain.reactivity
                    * host.antibody_efficiency
                    * self.antibodies
                    * track.virus
                    * (1.0 + infected_ratio);
            let da = p.antibody_growth * self.immune_cells - p.antibody_decay * track.antibodies;

            infection_growth += host.infection_gain * dv.max(0.0);

            track.virus = (track.virus + dv * p.dt - VIRUS_STEP_DECAY).abs();
            track.antibodies += da * p.dt;
            track.virus_history.push(track.virus);
            track.antibody_history.push(track.antibodies);
        }

        // Shared pools move once, after all strain contributions are in.
        let di = infection_growth - host.immune_death * delayed_infected;
        let dm =
            host.immune_gain * delayed_infected * total_virus - host.immune_death * self.immune_cells;
        let da = host.antibody_growth * self.immune_cells - host.antibody_decay * self.antibodies;

        self.infected_cells = (self.infected_cells + di * host.dt).clamp(0.0, n);
        self.immune_cells += dm * host.dt;
        self.antibodies += da * host.dt;

        self.infected_history.push(self.infected_cells);
        self.immune_history.push(self.immune_cells);
        self.antibody_history.push(self.antibodies);
        self.healthy_history.push(self.healthy_cells());
        self.time.push(self.time.len() as f64 * host.dt);
    }

    /// Runs `floor(total_time / dt)` integration steps.
    pub fn simulate(&mut self, total_time: f64) {
        let steps = (total_time / self.params.dt) as usize;
        for _ in 0..steps {
            self.advance_one_step();
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> MultiStrainImmuneState {
        MultiStrainImmuneState::new(ImmuneParams::default())
    }

    #[test]
    fn test_total_virus_load_sums_tracks() {
        let mut state = host();
        state.add_strain(Strain::native("alpha"), 0.1);
        state.add_strain(Strain::native("beta"), 0.2);
        state.add_strain(Strain::native("gamma"), 0.3);
        assert!((state.total_virus_load() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_repeat_exposure_folds_into_existing_track() {
        let mut state = host();
        state.add_strain(Strain::native("alpha"), 0.1);
        state.advance_one_step();
        state.add_strain(Strain::native("alpha"), 1.0);
        assert_eq!(state.tracks().len(), 1);

        // Latest recorded sample absorbs the dose in place.
        let track = &state.tracks()[0];
        let dose = 1.0 * track.strain.params.dt;
        assert!((track.virus_history().latest().unwrap() - track.virus).abs() < 1e-12);
        assert!(track.virus >= dose);
    }

    #[test]
    fn test_zero_exposure_ignored() {
        let mut state = host();
        state.add_strain(Strain::native("alpha"), 0.0);
        assert!(state.tracks().is_empty());
        state.add_virus(0.0);
        assert!(state.tracks().is_empty());
    }

    #[test]
    fn test_unknown_strain_trajectory_errors() {
        let state = host();
        let err = state.strain_trajectory(&StrainId::new("ghost")).unwrap_err();
        assert_eq!(err, ModelError::StrainNotFound(StrainId::new("ghost")));
    }

    #[test]
    fn test_late_strain_has_shorter_history() {
        let mut state = host();
        state.add_strain(Strain::native("early"), 0.1);
        state.simulate(1.0);
        state.add_strain(Strain::native("late"), 0.1);
        state.simulate(0.5);

        let early = state.strain_trajectory(&StrainId::new("early")).unwrap();
        let late = state.strain_trajectory(&StrainId::new("late")).unwrap();
        assert_eq!(early.len(), 150);
        assert_eq!(late.len(), 50);

        let late_antibodies = state
            .strain_antibody_trajectory(&StrainId::new("late"))
            .unwrap();
        assert_eq!(late_antibodies.len(), 50);
    }

    #[test]
    fn test_shared_infected_cells_stay_in_bounds() {
        let mut state = host();
        state.add_strain(Strain::native("alpha"), 1e6);
        state.add_strain(Strain::new("beta", 0.2, ImmuneParams::default()), 1e6);
        for _ in 0..1000 {
            state.advance_one_step();
            assert!(state.infected_cells >= 0.0);
            assert!(state.infected_cells <= state.params().max_cells);
        }
    }

    #[test]
    fn test_shared_and_track_histories_advance_together() {
        let mut state = host();
        state.add_strain(Strain::native("alpha"), 0.5);
        state.simulate(2.0);
        assert_eq!(state.infected_history().len(), 200);
        assert_eq!(state.immune_history().len(), 200);
        assert_eq!(
            state
                .strain_trajectory(&StrainId::new("alpha"))
                .unwrap()
                .len(),
            200
        );
    }

    #[test]
    fn test_add_virus_uses_native_track() {
        let mut state = host();
        state.add_virus(0.1);
        assert_eq!(state.tracks().len(), 1);
        assert_eq!(state.tracks()[0].strain.id, StrainId::new("native"));
        state.add_virus(0.1);
        assert_eq!(state.tracks().len(), 1);
    }
}
