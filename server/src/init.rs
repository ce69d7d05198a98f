use crate::physics::RigidWorld;
use crate::scene::SceneConfig;
use crate::simulation::{self, DripTimers, SimulationClock};
use bevy::prelude::*;
use bevy_app::ScheduleRunnerPlugin;
use std::time::Duration;

/// Everything the host needs besides the scene itself.
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub ticks_per_second: u32,
    pub max_ticks: Option<u64>,
    pub seed: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 60,
            max_ticks: None,
            seed: 0,
        }
    }
}

/// Insert the simulation resources built from `scene` and register the
/// per-tick systems. Plugins are left to the caller.
pub fn setup_simulation(app: &mut App, scene: &SceneConfig, config: &HostConfig) {
    let mut clock = SimulationClock::new(config.ticks_per_second, scene.substeps);
    clock.max_ticks = config.max_ticks;

    app.insert_resource(scene.build_pond());
    app.insert_resource(RigidWorld::from_scene(scene));
    app.insert_resource(DripTimers::new(&scene.drips, config.seed));
    app.insert_resource(clock);

    simulation::register_systems(app);
}

pub fn init(scene: SceneConfig, config: HostConfig) {
    let mut app = App::new();
    app.add_plugins(
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1.0 / config.ticks_per_second.max(1) as f64,
        ))),
    );
    app.add_plugins(bevy::log::LogPlugin::default());

    info!(
        "Starting scene {} at {} ticks per second (seed {})",
        scene.name, config.ticks_per_second, config.seed
    );
    match config.max_ticks {
        Some(ticks) => info!("Running for {} ticks", ticks),
        None => info!("Running until interrupted"),
    }

    setup_simulation(&mut app, &scene, &config);

    app.run();
}

#[cfg(test)]
mod tests {
    use super::*;
    use pond::Pond;

    #[test]
    fn test_setup_inserts_resources() {
        let mut app = App::new();
        let config = HostConfig {
            max_ticks: Some(3),
            ..Default::default()
        };
        setup_simulation(&mut app, &SceneConfig::default(), &config);

        for _ in 0..3 {
            app.update();
        }

        let clock = app.world().resource::<SimulationClock>();
        assert_eq!(clock.tick, 3);
        assert_eq!(clock.substeps, 3);
        assert_eq!(app.world().resource::<Pond>().len(), 1);
        assert_eq!(app.world().resource::<RigidWorld>().tracked().len(), 1);
    }
}
