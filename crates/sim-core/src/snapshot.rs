//! Run Snapshots
//!
//! Read-only serializable views of a run for external reporting. The core
//! exposes plain numeric series; rendering is someone else's job.

use serde::{Deserialize, Serialize};

use immune_model::TimeSeries;

use crate::agent::{Agent, Position};
use crate::environment::Environment;

/// Per-agent summary with the full virus trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: String,
    pub position: Position,
    pub virus_level: f64,
    pub infected_cells: f64,
    pub immune_cells: f64,
    pub antibodies: f64,
    /// Per-strain virus trajectories, in strain registration order.
    pub strains: Vec<StrainSnapshot>,
}

/// One strain's recorded trajectory on one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrainSnapshot {
    pub strain_id: String,
    pub virus_history: TimeSeries,
    pub antibody_history: TimeSeries,
}

impl AgentSnapshot {
    pub fn of(agent: &Agent) -> Self {
        Self {
            id: agent.id.0.clone(),
            position: agent.position,
            virus_level: agent.virus_level(),
            infected_cells: agent.immune.infected_cells,
            immune_cells: agent.immune.immune_cells,
            antibodies: agent.immune.antibodies,
            strains: agent
                .immune
                .tracks()
                .iter()
                .map(|t| StrainSnapshot {
                    strain_id: t.strain.id.to_string(),
                    virus_history: t.virus_history().clone(),
                    antibody_history: t.antibody_history().clone(),
                })
                .collect(),
        }
    }
}

/// One environment node, recursively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    pub id: String,
    pub name: String,
    pub agent_count: usize,
    pub infected_count: usize,
    pub agent_count_history: Vec<usize>,
    pub infected_count_history: Vec<usize>,
    pub agents: Vec<AgentSnapshot>,
    pub sub_environments: Vec<EnvironmentSnapshot>,
}

impl EnvironmentSnapshot {
    pub fn of(env: &Environment) -> Self {
        Self {
            id: env.id.0.clone(),
            name: env.name.clone(),
            agent_count: env.size(0),
            infected_count: env.count_infected(env.profile().infection_threshold),
            agent_count_history: env.agent_count_history.clone(),
            infected_count_history: env.infected_count_history.clone(),
            agents: env.agents(0).into_iter().map(AgentSnapshot::of).collect(),
            sub_environments: env
                .sub_environments()
                .iter()
                .map(EnvironmentSnapshot::of)
                .collect(),
        }
    }
}

/// Top-level run output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub root: EnvironmentSnapshot,
}

impl WorldSnapshot {
    pub fn capture(tick: u64, root: &Environment) -> Self {
        Self {
            tick,
            root: EnvironmentSnapshot::of(root),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::MapSize;
    use crate::SimRng;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_snapshot_serializes_to_json() {
        let mut rng = SimRng(SmallRng::seed_from_u64(1));
        let mut env = Environment::new("room", MapSize::new(10, 10));
        env.add_agent(crate::agent::Agent::new("a").with_virus(0.1), &mut rng);
        env.step(0.1, &mut rng);

        let snapshot = WorldSnapshot::capture(1, &env);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"tick\":1"));
        assert!(json.contains("\"room\""));

        let back: WorldSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.root.agent_count, 1);
        assert_eq!(back.root.infected_count_history.len(), 1);
    }

    #[test]
    fn test_snapshot_recurses_into_children() {
        let mut rng = SimRng(SmallRng::seed_from_u64(1));
        let mut root = Environment::new("root", MapSize::default());
        let mut child = Environment::new("child", MapSize::default());
        child.generate_agents(2, &mut rng);
        root.add_sub_environment(child);

        let snapshot = EnvironmentSnapshot::of(&root);
        assert_eq!(snapshot.sub_environments.len(), 1);
        assert_eq!(snapshot.sub_environments[0].agent_count, 2);
    }
}
