//! Environments
//!
//! A node in a tree of environments: owned agents, owned sub-environments,
//! and the per-tick simulation step. Venue kinds (classroom, building,
//! canteen...) are configuration profiles on a single type, not subtypes.
//!
//! Children are owned strongly by their parents; parent back-references are
//! stored as ids only and are never traversed, so recursive queries cannot
//! loop even if the id graph is not a tree.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::agent::{Agent, AgentId, Position};
use crate::SimRng;

/// Unique identifier for an environment node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnvironmentId(pub String);

impl EnvironmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random identifier for nodes the caller does not name.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Width and height of an environment's grid map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSize {
    pub width: u32,
    pub height: u32,
}

impl MapSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }
}

impl Default for MapSize {
    fn default() -> Self {
        Self {
            width: 50,
            height: 50,
        }
    }
}

/// Distance-based transmission coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionRule {
    /// Maximum distance at which transmission occurs.
    pub max_range: f64,
    /// Coefficient for agents sharing a cell. Fixed, and deliberately
    /// distinct from the falloff formula's limit as distance approaches 0.
    pub colocation_coefficient: f64,
}

impl TransmissionRule {
    /// Transmission coefficient for a given distance.
    ///
    /// Same cell uses the fixed colocation coefficient; otherwise a linear
    /// falloff `1 - distance / max_range`, zero beyond `max_range`.
    pub fn coefficient(&self, distance: f64) -> f64 {
        if distance == 0.0 {
            self.colocation_coefficient
        } else if distance <= self.max_range {
            1.0 - distance / self.max_range
        } else {
            0.0
        }
    }
}

impl Default for TransmissionRule {
    fn default() -> Self {
        Self {
            max_range: 5.0,
            colocation_coefficient: 0.9,
        }
    }
}

/// Configuration distinguishing venue kinds.
///
/// Replaces a class-per-venue hierarchy: a classroom and a sports ground are
/// the same `Environment` type with different profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueProfile {
    pub transmission: TransmissionRule,
    /// Virus level at or above which an agent counts as infected.
    pub infection_threshold: f64,
}

impl VenueProfile {
    /// Small enclosed room: short range, high colocation transfer.
    pub fn classroom() -> Self {
        Self {
            transmission: TransmissionRule {
                max_range: 5.0,
                colocation_coefficient: 0.9,
            },
            infection_threshold: 10.0,
        }
    }

    /// Shared indoor hall with dense seating.
    pub fn canteen() -> Self {
        Self {
            transmission: TransmissionRule {
                max_range: 3.0,
                colocation_coefficient: 0.9,
            },
            infection_threshold: 10.0,
        }
    }

    /// Open-air ground: longer reach, weaker close contact.
    pub fn sports_ground() -> Self {
        Self {
            transmission: TransmissionRule {
                max_range: 8.0,
                colocation_coefficient: 0.5,
            },
            infection_threshold: 10.0,
        }
    }

    /// Container node (building, school): default transmission for any
    /// agents placed directly on it.
    pub fn building() -> Self {
        Self::default()
    }
}

impl Default for VenueProfile {
    fn default() -> Self {
        Self {
            transmission: TransmissionRule::default(),
            infection_threshold: 10.0,
        }
    }
}

/// A node in the environment hierarchy.
///
/// Owns its agents and sub-environments; every owned collection is freshly
/// allocated per instance. History buffers grow by one entry per tick and
/// are never pruned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub id: EnvironmentId,
    pub name: String,
    map_size: MapSize,
    profile: VenueProfile,
    agents: Vec<Agent>,
    sub_environments: Vec<Environment>,
    /// Non-owning back-references to parent nodes. Lookup metadata only;
    /// traversal always walks child links.
    parent_ids: Vec<EnvironmentId>,
    /// Directly-owned agent count per tick.
    pub agent_count_history: Vec<usize>,
    /// Directly-owned infected count per tick.
    pub infected_count_history: Vec<usize>,
}

impl Environment {
    /// Creates an empty environment with a default venue profile.
    pub fn new(name: impl Into<String>, map_size: MapSize) -> Self {
        let name = name.into();
        Self {
            id: EnvironmentId::new(&name),
            name,
            map_size,
            profile: VenueProfile::default(),
            agents: Vec::new(),
            sub_environments: Vec::new(),
            parent_ids: Vec::new(),
            agent_count_history: Vec::new(),
            infected_count_history: Vec::new(),
        }
    }

    /// Builder-style venue profile.
    pub fn with_profile(mut self, profile: VenueProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Builder-style explicit id (defaults to the name).
    pub fn with_id(mut self, id: EnvironmentId) -> Self {
        self.id = id;
        self
    }

    pub fn map_size(&self) -> MapSize {
        self.map_size
    }

    pub fn profile(&self) -> &VenueProfile {
        &self.profile
    }

    pub fn parent_ids(&self) -> &[EnvironmentId] {
        &self.parent_ids
    }

    /// Changes the map size, clamping resident agents back into bounds.
    pub fn resize_map(&mut self, width: u32, height: u32) {
        self.map_size = MapSize::new(width, height);
        for agent in &mut self.agents {
            agent.position.x = agent.position.x.min(width.saturating_sub(1));
            agent.position.y = agent.position.y.min(height.saturating_sub(1));
        }
    }

    fn random_position(&self, rng: &mut SimRng) -> Position {
        Position {
            x: rng.0.gen_range(0..self.map_size.width.max(1)),
            y: rng.0.gen_range(0..self.map_size.height.max(1)),
        }
    }

    /// Places an agent at a uniformly random position and takes ownership.
    pub fn add_agent(&mut self, mut agent: Agent, rng: &mut SimRng) {
        agent.position = self.random_position(rng);
        self.agents.push(agent);
    }

    /// Appends `count` default agents with ids derived from this node's id.
    ///
    /// `count == 0` silently generates nothing.
    pub fn generate_agents(&mut self, count: usize, rng: &mut SimRng) {
        let offset = self.agents.len();
        for i in 0..count {
            let agent = Agent::new(format!("{}_{}", self.id, offset + i));
            self.add_agent(agent, rng);
        }
        if count > 0 {
            debug!(env = %self.id, count, "generated agents");
        }
    }

    /// Attaches a sub-environment, recording this node as its parent.
    pub fn add_sub_environment(&mut self, mut env: Environment) {
        env.parent_ids.push(self.id.clone());
        self.sub_environments.push(env);
    }

    pub fn sub_environments(&self) -> &[Environment] {
        &self.sub_environments
    }

    pub fn sub_environments_mut(&mut self) -> &mut [Environment] {
        &mut self.sub_environments
    }

    /// Mutable access to a direct sub-environment by id.
    pub fn sub_environment_mut(&mut self, id: &EnvironmentId) -> Option<&mut Environment> {
        self.sub_environments.iter_mut().find(|e| &e.id == id)
    }

    /// Removes and returns a directly-owned agent, if present.
    pub fn take_agent(&mut self, id: &AgentId) -> Option<Agent> {
        let index = self.agents.iter().position(|a| &a.id == id)?;
        Some(self.agents.remove(index))
    }

    /// True if the agent is in this node's own list.
    pub fn contains_agent(&self, id: &AgentId) -> bool {
        self.agents.iter().any(|a| &a.id == id)
    }

    /// Moves an agent from this node to `target`.
    ///
    /// A single remove-then-add: the agent is never in two lists or zero
    /// lists between ticks. Silently does nothing if the agent is not here.
    /// The position is re-randomized within the target's bounds.
    pub fn transfer_agent_to(&mut self, target: &mut Environment, id: &AgentId, rng: &mut SimRng) {
        if let Some(agent) = self.take_agent(id) {
            debug!(agent = %id, from = %self.id, to = %target.id, "agent transfer");
            target.add_agent(agent, rng);
        }
    }

    /// Number of agents within `depth` levels.
    ///
    /// Depth 0 counts only directly-owned agents; a negative depth recurses
    /// through all descendants; depth k > 0 includes k levels of descendants.
    pub fn size(&self, depth: i32) -> usize {
        let mut total = self.agents.len();
        if depth != 0 {
            let next = if depth < 0 { depth } else { depth - 1 };
            total += self
                .sub_environments
                .iter()
                .map(|e| e.size(next))
                .sum::<usize>();
        }
        total
    }

    /// Agents within `depth` levels, own list first, children in order.
    pub fn agents(&self, depth: i32) -> Vec<&Agent> {
        let mut out: Vec<&Agent> = self.agents.iter().collect();
        if depth != 0 {
            let next = if depth < 0 { depth } else { depth - 1 };
            for sub in &self.sub_environments {
                out.extend(sub.agents(next));
            }
        }
        out
    }

    /// Agents within `depth` levels whose attribute `key` equals `value`.
    ///
    /// Agents without the attribute are excluded, not an error.
    pub fn filter_agents(&self, key: &str, value: &str, depth: i32) -> Vec<&Agent> {
        self.agents(depth)
            .into_iter()
            .filter(|a| a.attribute(key) == Some(value))
            .collect()
    }

    /// Uniform sample without replacement of `min(n, count)` agents.
    pub fn random_agents(&self, n: usize, depth: i32, rng: &mut SimRng) -> Vec<&Agent> {
        self.agents(depth)
            .choose_multiple(&mut rng.0, n)
            .copied()
            .collect()
    }

    /// Directly-owned agents whose virus level is at or above `threshold`.
    pub fn count_infected(&self, threshold: f64) -> usize {
        self.agents
            .iter()
            .filter(|a| a.virus_level() >= threshold)
            .count()
    }

    /// Advances this node and all descendants by one tick.
    ///
    /// Strict intra-tick order over directly-owned agents: movement, immune
    /// advancement, then all-pairs exposure in list order using loads already
    /// advanced this tick, then history bookkeeping. Sub-environments step
    /// depth-first after this node completes.
    pub fn step(&mut self, tick_duration: f64, rng: &mut SimRng) {
        let bounds = self.map_size;
        let rule = self.profile.transmission.clone();

        for agent in &mut self.agents {
            agent.step_move(bounds, rng);
        }
        for agent in &mut self.agents {
            agent.advance_immunity(tick_duration);
        }

        // Source loads are snapshotted when the source's turn comes, so an
        // exposure received earlier in this pass is already visible to later
        // sources.
        for source_index in 0..self.agents.len() {
            let snapshot = self.agents[source_index].exposure_snapshot();
            if snapshot.total_load() == 0.0 {
                continue;
            }
            for (recipient_index, recipient) in self.agents.iter_mut().enumerate() {
                if recipient_index == source_index {
                    continue;
                }
                recipient.receive_exposure(&snapshot, &rule);
            }
        }

        self.agent_count_history.push(self.agents.len());
        self.infected_count_history
            .push(self.count_infected(self.profile.infection_threshold));

        for sub in &mut self.sub_environments {
            sub.step(tick_duration, rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SimRng {
        SimRng(SmallRng::seed_from_u64(7))
    }

    /// root(2 agents) -> child(3) -> grandchild(5)
    fn nested_tree(rng: &mut SimRng) -> Environment {
        let mut root = Environment::new("root", MapSize::new(20, 20));
        root.generate_agents(2, rng);

        let mut child = Environment::new("child", MapSize::new(20, 20));
        child.generate_agents(3, rng);

        let mut grandchild = Environment::new("grandchild", MapSize::new(20, 20));
        grandchild.generate_agents(5, rng);

        child.add_sub_environment(grandchild);
        root.add_sub_environment(child);
        root
    }

    #[test]
    fn test_size_depth_semantics() {
        let mut rng = rng();
        let root = nested_tree(&mut rng);
        assert_eq!(root.size(0), 2);
        assert_eq!(root.size(1), 5);
        assert_eq!(root.size(-1), 10);
        assert_eq!(root.size(2), 10);
    }

    #[test]
    fn test_agents_matches_size() {
        let mut rng = rng();
        let root = nested_tree(&mut rng);
        assert_eq!(root.agents(0).len(), 2);
        assert_eq!(root.agents(-1).len(), 10);
    }

    #[test]
    fn test_parent_back_reference_recorded() {
        let mut rng = rng();
        let root = nested_tree(&mut rng);
        let child = &root.sub_environments()[0];
        assert_eq!(child.parent_ids(), &[root.id.clone()]);
    }

    #[test]
    fn test_add_agent_places_inside_bounds() {
        let mut rng = rng();
        let mut env = Environment::new("room", MapSize::new(4, 3));
        for i in 0..50 {
            env.add_agent(Agent::new(format!("a{i}")), &mut rng);
        }
        let bounds = env.map_size();
        assert!(env.agents(0).iter().all(|a| bounds.contains(a.position)));
    }

    #[test]
    fn test_transfer_moves_exactly_one_agent() {
        let mut rng = rng();
        let mut a = Environment::new("a", MapSize::default());
        let mut b = Environment::new("b", MapSize::default());
        a.generate_agents(3, &mut rng);
        b.generate_agents(2, &mut rng);

        let moved = a.agents(0)[0].id.clone();
        a.transfer_agent_to(&mut b, &moved, &mut rng);

        assert!(!a.contains_agent(&moved));
        assert!(b.contains_agent(&moved));
        assert_eq!(a.size(0) + b.size(0), 5);
    }

    #[test]
    fn test_transfer_of_absent_agent_is_noop() {
        let mut rng = rng();
        let mut a = Environment::new("a", MapSize::default());
        let mut b = Environment::new("b", MapSize::default());
        a.generate_agents(2, &mut rng);

        a.transfer_agent_to(&mut b, &AgentId::new("ghost"), &mut rng);
        assert_eq!(a.size(0), 2);
        assert_eq!(b.size(0), 0);
    }

    #[test]
    fn test_filter_agents_skips_missing_attribute() {
        let mut rng = rng();
        let mut env = Environment::new("room", MapSize::default());
        env.add_agent(Agent::new("x").with_attribute("grade", "3"), &mut rng);
        env.add_agent(Agent::new("y").with_attribute("grade", "4"), &mut rng);
        env.add_agent(Agent::new("z"), &mut rng);

        let third_grade = env.filter_agents("grade", "3", 0);
        assert_eq!(third_grade.len(), 1);
        assert_eq!(third_grade[0].id, AgentId::new("x"));
    }

    #[test]
    fn test_random_agents_caps_at_population() {
        let mut rng = rng();
        let mut env = Environment::new("room", MapSize::default());
        env.generate_agents(4, &mut rng);

        assert_eq!(env.random_agents(2, 0, &mut rng).len(), 2);
        assert_eq!(env.random_agents(10, 0, &mut rng).len(), 4);
    }

    #[test]
    fn test_random_agents_without_replacement() {
        let mut rng = rng();
        let mut env = Environment::new("room", MapSize::default());
        env.generate_agents(6, &mut rng);

        let sample = env.random_agents(6, 0, &mut rng);
        let mut ids: Vec<_> = sample.iter().map(|a| a.id.clone()).collect();
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn test_count_infected_threshold() {
        let mut rng = rng();
        let mut env = Environment::new("room", MapSize::default());
        env.add_agent(Agent::new("hot").with_virus(12.0), &mut rng);
        env.add_agent(Agent::new("warm").with_virus(10.0), &mut rng);
        env.add_agent(Agent::new("cold").with_virus(1.0), &mut rng);

        assert_eq!(env.count_infected(10.0), 2);
    }

    #[test]
    fn test_step_appends_histories_recursively() {
        let mut rng = rng();
        let mut root = nested_tree(&mut rng);
        for _ in 0..3 {
            root.step(0.1, &mut rng);
        }
        assert_eq!(root.agent_count_history, vec![2, 2, 2]);
        assert_eq!(root.infected_count_history.len(), 3);
        let grandchild = &root.sub_environments()[0].sub_environments()[0];
        assert_eq!(grandchild.agent_count_history, vec![5, 5, 5]);
    }

    #[test]
    fn test_resize_map_clamps_agents() {
        let mut rng = rng();
        let mut env = Environment::new("room", MapSize::new(40, 40));
        env.generate_agents(20, &mut rng);
        env.resize_map(5, 5);
        let bounds = env.map_size();
        assert!(env.agents(0).iter().all(|a| bounds.contains(a.position)));
    }

    #[test]
    fn test_explicit_and_random_ids() {
        let env = Environment::new("room", MapSize::default()).with_id(EnvironmentId::random());
        assert_ne!(env.id, EnvironmentId::new("room"));
        assert_eq!(env.name, "room");

        let mut parent = Environment::new("parent", MapSize::default());
        parent.add_sub_environment(env);
        assert!(parent
            .sub_environment_mut(&EnvironmentId::new("missing"))
            .is_none());
    }

    #[test]
    fn test_transmission_coefficient_shape() {
        let rule = TransmissionRule::default();
        assert_eq!(rule.coefficient(0.0), 0.9);
        assert!((rule.coefficient(2.5) - 0.5).abs() < 1e-12);
        assert_eq!(rule.coefficient(5.0), 0.0);
        assert_eq!(rule.coefficient(5.1), 0.0);
    }
}
