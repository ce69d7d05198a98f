use crate::physics::RigidWorld;
use bevy::prelude::*;
use bevy_log::{debug, info};
use pond::water::DripSchedule;
use pond::{FieldId, Pond};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Tick bookkeeping for the headless host.
#[derive(Resource, Debug, Clone)]
pub struct SimulationClock {
    pub tick: u64,
    /// Seconds simulated per tick
    pub frame_dt: f32,
    /// Rigid-body steps per tick
    pub substeps: u32,
    /// Stop after this many ticks, run forever when `None`
    pub max_ticks: Option<u64>,
    /// Log statistics every this many ticks, never when zero
    pub stats_interval: u64,
}

impl SimulationClock {
    pub fn new(ticks_per_second: u32, substeps: u32) -> Self {
        let tps = ticks_per_second.max(1);
        Self {
            tick: 0,
            frame_dt: 1.0 / tps as f32,
            substeps: substeps.max(1),
            max_ticks: None,
            stats_interval: tps as u64,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.tick as f32 * self.frame_dt
    }
}

struct DripTimer {
    schedule: DripSchedule,
    remaining: f32,
}

/// Countdown for every scheduled drip, sharing one seeded generator.
#[derive(Resource)]
pub struct DripTimers {
    timers: Vec<DripTimer>,
    rng: StdRng,
}

impl DripTimers {
    pub fn new(schedules: &[DripSchedule], seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let timers = schedules
            .iter()
            .map(|schedule| DripTimer {
                schedule: *schedule,
                remaining: schedule.next_delay(rng.gen_range(-1.0..=1.0)),
            })
            .collect();
        Self { timers, rng }
    }

    /// Count every timer down by `dt` and drip for each one that runs out.
    /// Returns the number of drips that landed.
    pub fn tick(&mut self, pond: &mut Pond, dt: f32) -> usize {
        let mut dripped = 0;
        for timer in &mut self.timers {
            timer.remaining -= dt;
            if timer.remaining > 0.0 {
                continue;
            }
            let schedule = timer.schedule;
            if let Some(index) = pond.drip(
                FieldId(schedule.field),
                schedule.offset_from_end,
                schedule.depth,
            ) {
                debug!("Drip into field {} at sample {}", schedule.field, index);
                dripped += 1;
            }
            timer.remaining += schedule.next_delay(self.rng.gen_range(-1.0..=1.0));
        }
        dripped
    }
}

/// Advance bodies and water by one frame.
///
/// The rigid world takes `substeps` steps; before each one the bodies are
/// coupled with the water using the substep length. The water surface then
/// integrates the whole frame once.
pub fn run_tick(pond: &mut Pond, world: &mut RigidWorld, frame_dt: f32, substeps: u32) -> usize {
    let substeps = substeps.max(1);
    let body_dt = frame_dt / substeps as f32;
    let mut coupled = 0;

    for _ in 0..substeps {
        world.reset_forces();
        let samples = world.samples();
        coupled += pond.couple(&samples, body_dt, world);
        world.step(body_dt);
    }

    pond.advance(frame_dt);
    coupled
}

pub fn step_simulation(
    clock: Res<SimulationClock>,
    mut pond: ResMut<Pond>,
    mut world: ResMut<RigidWorld>,
) {
    run_tick(&mut pond, &mut world, clock.frame_dt, clock.substeps);
}

pub fn run_drips(clock: Res<SimulationClock>, mut pond: ResMut<Pond>, mut timers: ResMut<DripTimers>) {
    timers.tick(&mut pond, clock.frame_dt);
}

pub fn log_stats(clock: Res<SimulationClock>, pond: Res<Pond>, world: Res<RigidWorld>) {
    if clock.stats_interval == 0 || (clock.tick + 1) % clock.stats_interval != 0 {
        return;
    }

    for (i, field) in pond.fields().iter().enumerate() {
        let peak = field.heights().iter().fold(0.0f32, |acc, h| acc.max(h.abs()));
        info!(
            "t={:.2}s field {}: peak displacement {:.4}",
            clock.elapsed() + clock.frame_dt,
            i,
            peak
        );
    }
    for tracked in world.tracked() {
        if let Some(position) = world.body_position(tracked.handle) {
            info!(
                "t={:.2}s {} at ({:.3}, {:.3})",
                clock.elapsed() + clock.frame_dt,
                tracked.name,
                position.x,
                position.y
            );
        }
    }
}

pub fn advance_clock(mut clock: ResMut<SimulationClock>, mut ev_app_exit: EventWriter<AppExit>) {
    clock.tick += 1;
    if clock.max_ticks.is_some_and(|max| clock.tick >= max) {
        info!("Tick budget of {} reached, stopping", clock.tick);
        ev_app_exit.write(AppExit::Success);
    }
}

pub fn register_systems(app: &mut App) {
    app.add_systems(
        Update,
        (step_simulation, run_drips, log_stats, advance_clock).chain(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{BodyConfig, SceneConfig, WaterConfig};
    use pond::water::HeightField;

    const DT: f32 = 1.0 / 60.0;

    fn floating_scene() -> SceneConfig {
        SceneConfig {
            walls: None,
            water: vec![WaterConfig {
                left: 0.0,
                right: 10.0,
                ..Default::default()
            }],
            platforms: vec![],
            bodies: vec![BodyConfig {
                x: 4.0,
                y: 6.5,
                width: 1.0,
                height: 1.0,
                mass: 5.0,
                ..Default::default()
            }],
            drips: vec![],
            ..Default::default()
        }
    }

    #[test]
    fn test_box_floats_at_equilibrium() {
        let scene = floating_scene();
        let mut pond = scene.build_pond();
        let mut world = RigidWorld::from_scene(&scene);
        let handle = world.tracked()[0].handle;

        for _ in 0..900 {
            run_tick(&mut pond, &mut world, DT, scene.substeps);
        }

        // 5 kg under gravity 50 is held by 500 * 1 * 0.5: half submerged.
        let centre = world.body_position(handle).unwrap();
        let bottom = centre.y - 0.5;
        assert!((bottom - 6.0).abs() < 0.15, "bottom at {bottom}");
        assert!(world.body_velocity(handle).unwrap().length() < 0.5);
        assert!(pond.fields()[0].is_finite());
    }

    #[test]
    fn test_splash_disturbs_surface() {
        let mut scene = floating_scene();
        scene.bodies[0].y = 9.0;
        let mut pond = scene.build_pond();
        let mut world = RigidWorld::from_scene(&scene);

        let mut coupled = 0;
        for _ in 0..60 {
            coupled += run_tick(&mut pond, &mut world, DT, scene.substeps);
        }

        assert!(coupled > 0);
        let field = &pond.fields()[0];
        assert!(field.heights().iter().any(|h| h.abs() > 1e-3));
        assert_eq!(field.strip().len(), 2 * field.sample_count());
    }

    #[test]
    fn test_drip_timers_fire_on_schedule() {
        let mut pond = Pond::new();
        pond.add_field(HeightField::new(0.0, 10.0, 6.5, 0.0));
        let schedule = DripSchedule {
            period: 0.5,
            ..Default::default()
        };
        let mut timers = DripTimers::new(&[schedule], 1);

        let dripped: usize = (0..135).map(|_| timers.tick(&mut pond, DT)).sum();
        assert_eq!(dripped, 4);
        assert!(pond.fields()[0].heights().iter().any(|&h| h != 0.0));
    }

    #[test]
    fn test_jittered_drips_are_seeded() {
        let schedule = DripSchedule {
            period: 0.5,
            jitter: 0.3,
            ..Default::default()
        };
        let run = |seed: u64| {
            let mut pond = SceneConfig::default().build_pond();
            let mut timers = DripTimers::new(&[schedule], seed);
            (0..600)
                .map(|_| timers.tick(&mut pond, DT))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(3), run(3));
        let total: usize = run(3).iter().sum();
        assert!((12..=50).contains(&total), "{total} drips");
    }

    #[test]
    fn test_app_stops_after_tick_budget() {
        let scene = SceneConfig::default();
        let mut clock = SimulationClock::new(60, scene.substeps);
        clock.max_ticks = Some(5);

        let mut app = App::new();
        app.insert_resource(scene.build_pond());
        app.insert_resource(RigidWorld::from_scene(&scene));
        app.insert_resource(DripTimers::new(&scene.drips, 0));
        app.insert_resource(clock);
        register_systems(&mut app);

        for _ in 0..5 {
            app.update();
        }

        assert_eq!(app.world().resource::<SimulationClock>().tick, 5);
        let exits = app.world().resource::<Events<AppExit>>();
        assert_eq!(exits.len(), 1);
    }
}
