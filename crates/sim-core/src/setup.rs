//! Scenario Setup
//!
//! Builds the stock environment hierarchies the demo driver runs: a single
//! room with one index case, and a school with buildings, classrooms, a
//! canteen, and a sports ground.

use tracing::info;

use crate::agent::Agent;
use crate::config::{Config, ConfigError};
use crate::environment::{Environment, MapSize, VenueProfile};
use crate::SimRng;

/// One flat room: 50 clean agents plus one agent seeded with virus.
///
/// Mirrors the canonical smoke scenario (50x50 map, index case at load 0.1).
pub fn single_room(config: &Config, rng: &mut SimRng) -> Result<Environment, ConfigError> {
    let params = config.immune.params()?;
    let mut room = Environment::new("room", MapSize::new(50, 50)).with_profile(VenueProfile {
        transmission: config.transmission.rule(),
        infection_threshold: config.transmission.infection_threshold,
    });

    for i in 0..50 {
        room.add_agent(Agent::with_params(format!("room_{i}"), params), rng);
    }
    room.add_agent(
        Agent::with_params("index_case", params).with_virus(0.1),
        rng,
    );

    info!(agents = room.size(0), "built single-room scenario");
    Ok(room)
}

/// A school: two teaching buildings with three classrooms each, a canteen,
/// and a sports ground. Pupils live in classrooms; the index case sits in
/// the first classroom of the first building.
pub fn school(config: &Config, rng: &mut SimRng) -> Result<Environment, ConfigError> {
    let params = config.immune.params()?;
    let mut school =
        Environment::new("school", MapSize::new(200, 200)).with_profile(VenueProfile::building());

    for b in 1..=2 {
        let mut building = Environment::new(format!("building_{b}"), MapSize::new(60, 60))
            .with_profile(VenueProfile::building());

        for c in 1..=3 {
            let mut classroom =
                Environment::new(format!("building_{b}_class_{c}"), MapSize::new(10, 10))
                    .with_profile(VenueProfile::classroom());
            for p in 0..25 {
                let pupil = Agent::with_params(format!("{}_{p}", classroom.id), params)
                    .with_attribute("role", "pupil");
                classroom.add_agent(pupil, rng);
            }
            building.add_sub_environment(classroom);
        }
        school.add_sub_environment(building);
    }

    let canteen =
        Environment::new("canteen", MapSize::new(30, 30)).with_profile(VenueProfile::canteen());
    school.add_sub_environment(canteen);

    let sports_ground = Environment::new("sports_ground", MapSize::new(80, 80))
        .with_profile(VenueProfile::sports_ground());
    school.add_sub_environment(sports_ground);

    if let Some(building) = school.sub_environments_mut().first_mut() {
        if let Some(classroom) = building.sub_environments_mut().first_mut() {
            classroom.add_agent(
                Agent::with_params("index_case", params)
                    .with_attribute("role", "pupil")
                    .with_virus(0.1),
                rng,
            );
        }
    }

    info!(
        agents = school.size(-1),
        venues = school.sub_environments().len(),
        "built school scenario"
    );
    Ok(school)
}
