//! Unit tests for tagq-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, ProposalId};

    #[test]
    fn ordering() {
        assert!(AgentId(0) < AgentId(1));
        assert!(ProposalId(100) > ProposalId(99));
    }

    #[test]
    fn display() {
        assert_eq!(AgentId(7).to_string(), "AgentId(7)");
        assert_eq!(ProposalId(3).to_string(), "ProposalId(3)");
    }
}

#[cfg(test)]
mod time {
    use crate::{SimClock, Tick};

    #[test]
    fn tick_arithmetic() {
        let t = Tick(10);
        assert_eq!(t + 5, Tick(15));
        assert!(Tick(3) < t);
        assert_eq!(t.to_string(), "T10");
    }

    #[test]
    fn clock_elapsed() {
        let mut clock = SimClock::new(0, 3600);
        assert_eq!(clock.elapsed_secs(), 0);
        clock.advance_to(Tick(1));
        assert_eq!(clock.elapsed_secs(), 3600);
    }

    #[test]
    fn advance_to_never_goes_back() {
        let mut clock = SimClock::new(0, 60);
        clock.advance_to(Tick(10));
        assert_eq!(clock.current_tick, Tick(10));
        clock.advance_to(Tick(4));
        assert_eq!(clock.current_tick, Tick(10));
    }

    #[test]
    fn clock_dhm() {
        let mut clock = SimClock::new(0, 3600);
        clock.advance_to(Tick(25));
        assert_eq!(clock.elapsed_dhm(), (1, 1, 0));
        assert_eq!(clock.to_string(), "T25 (day 1 01:00)");
    }

    #[test]
    fn unix_secs_at_uses_start() {
        let clock = SimClock::new(1_000, 60);
        assert_eq!(clock.unix_secs_at(Tick(2)), 1_120);
    }

}

#[cfg(test)]
mod config {
    use crate::{SimConfig, Tick};

    #[test]
    fn default_is_valid() {
        let cfg = SimConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.end_tick(), Tick(168));
    }

    #[test]
    fn zero_tick_duration_rejected() {
        let cfg = SimConfig { tick_duration_secs: 0, ..SimConfig::default() };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("tick_duration_secs"));
    }

    #[test]
    fn zero_total_ticks_rejected() {
        let cfg = SimConfig { total_ticks: 0, ..SimConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn make_clock_copies_resolution() {
        let cfg = SimConfig { start_unix_secs: 500, tick_duration_secs: 60, ..SimConfig::default() };
        let clock = cfg.make_clock();
        assert_eq!(clock.start_unix_secs, 500);
        assert_eq!(clock.tick_duration_secs, 60);
        assert_eq!(clock.current_tick, Tick::ZERO);
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentId, AgentRng, SimRng, Tick};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = AgentRng::for_step(12345, AgentId(0), Tick(3));
        let mut r2 = AgentRng::for_step(12345, AgentId(0), Tick(3));
        for _ in 0..100 {
            assert_eq!(r1.gen_range(0u32..1000), r2.gen_range(0u32..1000));
        }
    }

    #[test]
    fn step_streams_differ_by_tick() {
        let mut a = AgentRng::for_step(1, AgentId(0), Tick(1));
        let mut b = AgentRng::for_step(1, AgentId(0), Tick(2));
        let xs: Vec<u64> = (0..4).map(|_| a.gen_range(0..u64::MAX)).collect();
        let ys: Vec<u64> = (0..4).map(|_| b.gen_range(0..u64::MAX)).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = AgentRng::for_step(0, AgentId(0), Tick::ZERO);
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
    }

    #[test]
    fn sim_rng_children_are_reproducible() {
        let mut root1 = SimRng::new(9);
        let mut root2 = SimRng::new(9);
        let a: u64 = root1.child(1).gen_range(0..u64::MAX);
        let b: u64 = root2.child(1).gen_range(0..u64::MAX);
        assert_eq!(a, b);
    }
}
