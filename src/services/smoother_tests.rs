//! Unit tests for DecisionSmoother - threshold gate and trend confirmation.

#[cfg(test)]
mod smoother_tests {
    use std::sync::Arc;
    use std::thread;

    use crate::config::SmootherConfig;
    use crate::events::{Action, Signal};
    use crate::services::smoother::DecisionSmoother;

    fn smoother() -> DecisionSmoother {
        DecisionSmoother::new(&SmootherConfig::default())
    }

    fn signal(action: Action, confidence: f64) -> Signal {
        Signal::new(action, confidence, "test")
    }

    // ============= Threshold =============

    #[test]
    fn test_low_confidence_holds() {
        let s = smoother();
        assert_eq!(s.analyze(&signal(Action::Buy, 0.59)), Action::Hold);
        assert_eq!(s.analyze(&signal(Action::Sell, 0.0)), Action::Hold);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let s = smoother();
        assert_eq!(s.analyze(&signal(Action::Buy, 0.6)), Action::Buy);
    }

    #[test]
    fn test_low_confidence_signals_still_recorded() {
        let s = smoother();
        s.analyze(&signal(Action::Sell, 0.1));
        let latest = s.latest().unwrap();
        assert_eq!(latest.action, Action::Sell);
        assert_eq!(latest.decision, Action::Hold);
        assert_eq!(s.history().len(), 1);
    }

    // ============= Trend confirmation =============

    #[test]
    fn test_short_history_passes_action_through() {
        let s = smoother();
        assert_eq!(s.analyze(&signal(Action::Buy, 0.9)), Action::Buy);
        assert_eq!(s.analyze(&signal(Action::Sell, 0.9)), Action::Sell);
    }

    #[test]
    fn test_conflicting_window_holds() {
        let s = smoother();
        s.analyze(&signal(Action::Buy, 0.9));
        s.analyze(&signal(Action::Buy, 0.9));
        assert_eq!(s.analyze(&signal(Action::Sell, 0.9)), Action::Hold);
    }

    #[test]
    fn test_consistent_window_confirms() {
        let s = smoother();
        s.analyze(&signal(Action::Buy, 0.9));
        s.analyze(&signal(Action::Buy, 0.9));
        assert_eq!(s.analyze(&signal(Action::Buy, 0.9)), Action::Buy);
    }

    #[test]
    fn test_repeated_action_beats_conflict() {
        let s = smoother();
        s.analyze(&signal(Action::Buy, 0.9));
        s.analyze(&signal(Action::Sell, 0.9));
        assert_eq!(s.analyze(&signal(Action::Sell, 0.9)), Action::Sell);
    }

    #[test]
    fn test_low_confidence_entries_count_in_window() {
        let s = smoother();
        s.analyze(&signal(Action::Sell, 0.2));
        s.analyze(&signal(Action::Hold, 0.9));
        assert_eq!(s.analyze(&signal(Action::Buy, 0.9)), Action::Hold);
    }

    #[test]
    fn test_no_conflict_passes_current() {
        let s = smoother();
        s.analyze(&signal(Action::Hold, 0.9));
        s.analyze(&signal(Action::Hold, 0.9));
        assert_eq!(s.analyze(&signal(Action::Buy, 0.9)), Action::Buy);
    }

    // ============= History =============

    #[test]
    fn test_history_capacity() {
        let config = SmootherConfig {
            history_capacity: 5,
            ..SmootherConfig::default()
        };
        let s = DecisionSmoother::new(&config);
        for i in 0..12 {
            s.analyze(&signal(Action::Hold, i as f64 / 100.0));
        }
        let history = s.history();
        assert_eq!(history.len(), 5);
        assert!((history[0].confidence - 0.07).abs() < 1e-12);
        assert!((history[4].confidence - 0.11).abs() < 1e-12);
    }

    #[test]
    fn test_capacity_below_window_never_confirms() {
        let config = SmootherConfig {
            history_capacity: 2,
            ..SmootherConfig::default()
        };
        let s = DecisionSmoother::new(&config);
        s.analyze(&signal(Action::Buy, 0.9));
        s.analyze(&signal(Action::Buy, 0.9));
        assert_eq!(s.analyze(&signal(Action::Sell, 0.9)), Action::Sell);
    }

    #[test]
    fn test_reset_history() {
        let s = smoother();
        s.analyze(&signal(Action::Buy, 0.9));
        s.analyze(&signal(Action::Buy, 0.9));
        s.reset_history();
        assert!(s.history().is_empty());
        assert!(s.latest().is_none());
        assert_eq!(s.analyze(&signal(Action::Sell, 0.9)), Action::Sell);
    }

    #[test]
    fn test_clones_share_history() {
        let s = smoother();
        let reader = s.clone();
        s.analyze(&signal(Action::Buy, 0.9));
        assert_eq!(reader.history().len(), 1);
    }

    #[test]
    fn test_concurrent_analyze_keeps_every_entry() {
        let s = Arc::new(smoother());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let s = s.clone();
                thread::spawn(move || {
                    for _ in 0..10 {
                        s.analyze(&signal(Action::Buy, 0.9));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(s.history().len(), 40);
    }
}
