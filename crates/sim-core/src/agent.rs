//! Agents
//!
//! An agent is an identity, a grid position, and an owned immune state.
//! Movement is a random unit step; exposure folds another agent's strain
//! loads into this agent's immune state, scaled by distance.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use immune_model::{ImmuneParams, MultiStrainImmuneState, Strain};

use crate::environment::{MapSize, TransmissionRule};
use crate::SimRng;

/// Unique identifier for an agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random identifier for agents the caller does not name.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer grid position within an environment's map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The four unit moves an agent can attempt each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    fn sample(rng: &mut SimRng) -> Self {
        match rng.0.gen_range(0..4u8) {
            0 => Direction::Up,
            1 => Direction::Down,
            2 => Direction::Left,
            _ => Direction::Right,
        }
    }
}

/// Read-only view of an infection source for pairwise transmission.
///
/// Snapshotted from the source agent before exposure so the source and
/// recipient never need to be borrowed at the same time.
#[derive(Debug, Clone)]
pub struct ExposureSnapshot {
    pub position: Position,
    /// Current load per tracked strain.
    pub strains: Vec<(Strain, f64)>,
}

impl ExposureSnapshot {
    /// Sum of the snapshotted strain loads.
    pub fn total_load(&self) -> f64 {
        self.strains.iter().map(|(_, load)| load).sum()
    }
}

/// A spatially situated host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub position: Position,
    /// Free-form key/value tags for scenario-level queries (grade, role...).
    /// Ordered map so iteration stays deterministic.
    pub attributes: BTreeMap<String, String>,
    pub immune: MultiStrainImmuneState,
}

impl Agent {
    /// Creates an uninfected agent with default immune parameters.
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_params(id, ImmuneParams::default())
    }

    /// Creates an uninfected agent with explicit immune parameters.
    pub fn with_params(id: impl Into<String>, params: ImmuneParams) -> Self {
        Self {
            id: AgentId::new(id),
            position: Position::default(),
            attributes: BTreeMap::new(),
            immune: MultiStrainImmuneState::new(params),
        }
    }

    /// Creates an agent with a random identifier.
    pub fn anonymous() -> Self {
        Self::with_params(AgentId::random().0, ImmuneParams::default())
    }

    /// Builder-style initial infection with the host-native strain.
    pub fn with_virus(mut self, load: f64) -> Self {
        let native = Strain {
            id: "native".into(),
            reactivity: 1.0,
            params: *self.immune.params(),
        };
        self.immune.add_strain(native, load);
        self
    }

    /// Builder-style initial infection with a specific strain.
    pub fn with_strain(mut self, strain: Strain, load: f64) -> Self {
        self.immune.add_strain(strain, load);
        self
    }

    /// Builder-style attribute tag.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Returns the attribute value for `key`, if the agent carries it.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Current total virus load across all strains.
    pub fn virus_level(&self) -> f64 {
        self.immune.total_virus_load()
    }

    /// Attempts one random unit step inside `bounds`.
    ///
    /// A step that would leave the map is silently dropped; the agent stays
    /// in place. No wraparound, no reflection.
    pub fn step_move(&mut self, bounds: MapSize, rng: &mut SimRng) {
        let Position { x, y } = self.position;
        let candidate = match Direction::sample(rng) {
            Direction::Up => (y + 1 < bounds.height).then(|| Position::new(x, y + 1)),
            Direction::Down => y.checked_sub(1).map(|y| Position::new(x, y)),
            Direction::Left => x.checked_sub(1).map(|x| Position::new(x, y)),
            Direction::Right => (x + 1 < bounds.width).then(|| Position::new(x + 1, y)),
        };
        if let Some(position) = candidate {
            self.position = position;
        }
    }

    /// Advances the immune state by one simulation tick.
    ///
    /// One tick integrates `floor(tick_duration / dt)` model sub-steps.
    pub fn advance_immunity(&mut self, tick_duration: f64) {
        self.immune.simulate(tick_duration);
    }

    /// Captures this agent's position and strain loads for transmission.
    pub fn exposure_snapshot(&self) -> ExposureSnapshot {
        ExposureSnapshot {
            position: self.position,
            strains: self
                .immune
                .tracks()
                .iter()
                .map(|t| (t.strain.clone(), t.virus))
                .collect(),
        }
    }

    /// Receives exposure from a snapshotted source.
    ///
    /// Every source strain is folded in, scaled by the distance coefficient;
    /// the total folded amount equals the source's total load times the
    /// coefficient.
    pub fn receive_exposure(&mut self, source: &ExposureSnapshot, rule: &TransmissionRule) {
        let distance = self.position.distance_to(&source.position);
        let coefficient = rule.coefficient(distance);
        if coefficient <= 0.0 {
            return;
        }
        for (strain, load) in &source.strains {
            self.immune.add_strain(strain.clone(), load * coefficient);
        }
    }
}
