use glam::Vec3;
use proptest::prelude::*;
use spinshot::{
    FixedTimestep, Packet, Side, ShotInput, ShotPlanner, SimulationLoop, SimulationMode,
    TableConfig, TrajectoryConfig, TrajectorySynthesizer,
};

fn side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Left), Just(Side::Right)]
}

#[derive(Default)]
struct TickCounter {
    ticks: u32,
}

impl SimulationMode for TickCounter {
    fn fixed_update(&mut self, _tick: u32) {
        self.ticks += 1;
    }
}

fn counting_loop() -> SimulationLoop<TickCounter> {
    SimulationLoop::new(FixedTimestep::new(60, 0.25), TickCounter::default())
}

#[test]
fn whole_steps_of_frame_time_run_one_tick_each() {
    let mut sim = counting_loop();
    for _ in 0..600 {
        assert_eq!(sim.update(1.0 / 60.0), 1);
    }
    assert_eq!(sim.mode().ticks, 600);
    assert_eq!(sim.tick(), 600);
}

fn vec3(range: std::ops::Range<f32>) -> impl Strategy<Value = Vec3> {
    (range.clone(), range.clone(), range).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

proptest! {
    #[test]
    fn rally_targets_stay_on_the_table(
        ball in vec3(-3.0..3.0),
        paddle in vec3(-3.0..3.0),
        velocity in vec3(-20.0..20.0),
        hitter in side(),
    ) {
        let table = TableConfig::default();
        let config = TrajectoryConfig::default();
        let synth = TrajectorySynthesizer::new(config.clone(), table.clone());
        let input = ShotInput {
            ball: ball + Vec3::new(0.0, 2.3, 0.0),
            paddle_position: paddle,
            paddle_velocity: velocity,
            hitter_side: hitter,
        };

        for shot in [synth.rally(&input), synth.serve(&input)] {
            prop_assert!(shot.velocity.is_finite());
            prop_assert!(shot.flight_time.is_finite() && shot.flight_time > 0.0);
            prop_assert!(shot.target.x.abs() <= table.half_width - config.safety_margin + 1e-4);
            prop_assert!(shot.target.z.abs() <= table.half_length - config.safety_margin + 1e-4);
        }

        let rally = synth.rally(&input);
        prop_assert_eq!(Side::of_z(rally.target.z), hitter.opposite());
        let serve = synth.serve(&input);
        prop_assert_eq!(Side::of_z(serve.target.z), hitter);
    }

    #[test]
    fn arbitrary_bytes_never_panic_the_codec(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = Packet::deserialize(&bytes);
    }

    #[test]
    fn ticks_match_accumulated_frame_time(
        deltas in proptest::collection::vec(0.0f64..0.2, 1..400),
    ) {
        let mut sim = counting_loop();
        let mut total = 0.0;
        let mut ran = 0;
        for delta in deltas {
            total += delta;
            ran += sim.update(delta);
        }

        let steps = total * 60.0;
        let expected = steps.floor() as u32;
        prop_assert_eq!(sim.mode().ticks, ran);
        prop_assert_eq!(sim.tick(), ran);
        if (steps - steps.round()).abs() > 1e-6 {
            prop_assert_eq!(ran, expected);
        } else {
            // Sitting on a step boundary, rounding may fall either way.
            prop_assert!(ran.abs_diff(steps.round() as u32) <= 1);
        }
    }
}
