//! Unit tests for the pipeline's event and signal types.

#[cfg(test)]
mod events_tests {
    use chrono::Utc;

    use crate::events::*;

    // ============= Action =============

    #[test]
    fn test_action_parse_case_insensitive() {
        assert_eq!("buy".parse::<Action>(), Ok(Action::Buy));
        assert_eq!("SELL".parse::<Action>(), Ok(Action::Sell));
        assert_eq!(" Hold ".parse::<Action>(), Ok(Action::Hold));
        assert!("short".parse::<Action>().is_err());
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Buy.to_string(), "BUY");
        assert_eq!(Action::Sell.as_str(), "SELL");
    }

    #[test]
    fn test_action_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Action::Hold).unwrap(), "\"HOLD\"");
        let a: Action = serde_json::from_str("\"BUY\"").unwrap();
        assert_eq!(a, Action::Buy);
    }

    #[test]
    fn test_action_tie_break_order() {
        assert_eq!(Action::ALL, [Action::Buy, Action::Sell, Action::Hold]);
    }

    #[test]
    fn test_only_buy_and_sell_execute() {
        assert!(Action::Buy.is_executable());
        assert!(Action::Sell.is_executable());
        assert!(!Action::Hold.is_executable());
    }

    // ============= Signal =============

    #[test]
    fn test_signal_confidence_clamped() {
        assert_eq!(Signal::new(Action::Buy, 1.4, "x").confidence, 1.0);
        assert_eq!(Signal::new(Action::Buy, -0.2, "x").confidence, 0.0);
        assert_eq!(Signal::new(Action::Buy, f64::NAN, "x").confidence, 0.0);
    }

    #[test]
    fn test_hold_signal() {
        let s = Signal::hold("ensemble");
        assert_eq!(s.action, Action::Hold);
        assert_eq!(s.confidence, 0.0);
        assert_eq!(s.source_id, "ensemble");
        assert!(s.metadata.is_none());
    }

    #[test]
    fn test_signal_note_creates_metadata() {
        let s = Signal::hold("range").with_note("no bars");
        assert_eq!(s.metadata.unwrap().note.as_deref(), Some("no bars"));
    }

    #[test]
    fn test_signal_metadata_skips_empty_fields() {
        let s = Signal::new(Action::Sell, 0.7, "single_swing").with_metadata(SignalMetadata {
            nearest_resistance: Some(102.5),
            trend: Some(Trend::Down),
            ..SignalMetadata::default()
        });
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["action"], "SELL");
        assert_eq!(json["metadata"]["nearest_resistance"], 102.5);
        assert_eq!(json["metadata"]["trend"], "down");
        assert!(json["metadata"].get("nearest_support").is_none());
    }

    #[test]
    fn test_signal_without_metadata_deserializes() {
        let s: Signal =
            serde_json::from_str(r#"{"action":"BUY","confidence":0.6,"source_id":"ml_ready"}"#).unwrap();
        assert_eq!(s.action, Action::Buy);
        assert!(s.metadata.is_none());
    }

    // ============= Decisions and events =============

    #[test]
    fn test_final_decision_roundtrip() {
        let d = FinalDecision {
            symbol: "BTC".to_string(),
            action: Action::Sell,
            confidence: 0.9,
            timestamp: Utc::now(),
        };
        let back: FinalDecision = serde_json::from_str(&serde_json::to_string(&d).unwrap()).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_event_clone_and_debug() {
        let event = Event::Signal(Signal::new(Action::Buy, 0.8, "ensemble"));
        let cloned = event.clone();
        let debug = format!("{:?}", cloned);
        assert!(debug.contains("Signal"));
        assert!(debug.contains("ensemble"));
    }
}
