//! Unit tests for SignalRouter - signal combination and the tick pipeline.

#[cfg(test)]
mod router_tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    use crate::bus::EventBus;
    use crate::config::{AggregationConfig, SmootherConfig};
    use crate::data::feed::{FeedResult, MarketDataProvider};
    use crate::data::snapshot::{Bar, MarketSnapshot};
    use crate::error::{ExecutionError, FeedError, TickError};
    use crate::events::{Action, Event, Signal};
    use crate::execution::{ExecutionResult, OrderReceipt, TradeExecutor};
    use crate::fibonacci::LevelClassification;
    use crate::services::aggregator::AdapterAggregator;
    use crate::services::router::{combine_signals, SignalRouter};
    use crate::services::smoother::DecisionSmoother;
    use crate::strategies::{SourceRegistry, StrategySource};

    // ============= Test doubles =============

    struct FixedSource {
        id: &'static str,
        action: Action,
        confidence: f64,
    }

    impl StrategySource for FixedSource {
        fn id(&self) -> &str {
            self.id
        }

        fn compute_levels(&self, _snapshot: &MarketSnapshot) -> LevelClassification {
            LevelClassification::default()
        }

        fn compute_signal(&self, _snapshot: &MarketSnapshot) -> Signal {
            Signal::new(self.action, self.confidence, self.id)
        }
    }

    fn snapshot() -> MarketSnapshot {
        let bars = (0..10).map(|_| Bar::new(100.0, 101.0, 99.0, 100.0, 10.0)).collect();
        MarketSnapshot::new("BTC", "1h", bars, 100.0)
    }

    struct FixedFeed {
        ok: bool,
    }

    #[async_trait]
    impl MarketDataProvider for FixedFeed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn snapshot(&self) -> FeedResult<MarketSnapshot> {
            if self.ok {
                Ok(snapshot())
            } else {
                Err(FeedError::NoData {
                    symbol: "BTC".to_string(),
                })
            }
        }
    }

    struct GatedFeed {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl MarketDataProvider for GatedFeed {
        fn name(&self) -> &'static str {
            "gated"
        }

        async fn snapshot(&self) -> FeedResult<MarketSnapshot> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(snapshot())
        }
    }

    #[derive(Default)]
    struct CountingExecutor {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TradeExecutor for CountingExecutor {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn execute(&self, action: Action) -> ExecutionResult<OrderReceipt> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ExecutionError::Http {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(OrderReceipt {
                order_id: "order-1".to_string(),
                symbol: "BTC".to_string(),
                action,
                amount: 0.01,
                price: None,
                simulated: true,
                timestamp: Utc::now(),
            })
        }
    }

    fn router(
        feed: Arc<dyn MarketDataProvider>,
        primary: (Action, f64),
        secondary: Action,
        executor: Arc<CountingExecutor>,
        bus: EventBus,
    ) -> SignalRouter {
        let mut registry = SourceRegistry::new();
        registry
            .register(Arc::new(FixedSource {
                id: "primary",
                action: primary.0,
                confidence: primary.1,
            }))
            .unwrap();
        let aggregator = AdapterAggregator::new(registry, AggregationConfig::default());
        let secondary = Arc::new(FixedSource {
            id: "secondary",
            action: secondary,
            confidence: 0.5,
        });
        SignalRouter::new(
            "BTC",
            feed,
            aggregator,
            secondary,
            DecisionSmoother::new(&SmootherConfig::default()),
            executor,
            bus,
            0.2,
        )
    }

    fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    // ============= combine_signals =============

    #[test]
    fn test_agreement_boosts_confidence() {
        let combined = combine_signals(&Signal::new(Action::Buy, 0.5, "aggregate"), Action::Buy, 0.2);
        assert_eq!(combined.action, Action::Buy);
        assert!((combined.confidence - 0.7).abs() < 1e-12);
        assert_eq!(combined.metadata.unwrap().secondary_action, Some(Action::Buy));
    }

    #[test]
    fn test_disagreement_leaves_confidence() {
        let combined = combine_signals(&Signal::new(Action::Buy, 0.9, "aggregate"), Action::Sell, 0.2);
        assert_eq!(combined.action, Action::Buy);
        assert_eq!(combined.confidence, 0.9);
    }

    #[test]
    fn test_boost_is_capped() {
        let combined = combine_signals(&Signal::new(Action::Sell, 0.95, "aggregate"), Action::Sell, 0.2);
        assert_eq!(combined.confidence, 1.0);
    }

    #[test]
    fn test_hold_agreement_also_boosts() {
        let combined = combine_signals(&Signal::hold("aggregate"), Action::Hold, 0.2);
        assert_eq!(combined.action, Action::Hold);
        assert!((combined.confidence - 0.2).abs() < 1e-12);
    }

    // ============= Tick pipeline =============

    #[tokio::test]
    async fn test_tick_executes_buy() {
        let bus = EventBus::new(64);
        let mut rx = bus.subscribe();
        let executor = Arc::new(CountingExecutor::default());
        let r = router(
            Arc::new(FixedFeed { ok: true }),
            (Action::Buy, 0.9),
            Action::Buy,
            executor.clone(),
            bus,
        );

        let decision = r.tick().await.unwrap();
        assert_eq!(decision.action, Action::Buy);
        assert_eq!(decision.symbol, "BTC");
        assert_eq!(decision.confidence, 1.0);
        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);

        let events = drain(&mut rx);
        assert!(matches!(events.first(), Some(Event::Snapshot(_))));
        assert!(events.iter().any(|e| matches!(e, Event::Decision(d) if d.action == Action::Buy)));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Execution(r) if r.status == "submitted")));
    }

    #[tokio::test]
    async fn test_hold_does_not_execute() {
        let executor = Arc::new(CountingExecutor::default());
        let r = router(
            Arc::new(FixedFeed { ok: true }),
            (Action::Hold, 0.9),
            Action::Buy,
            executor.clone(),
            EventBus::new(64),
        );

        let decision = r.tick().await.unwrap();
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_weak_signal_held_by_smoother() {
        let executor = Arc::new(CountingExecutor::default());
        let r = router(
            Arc::new(FixedFeed { ok: true }),
            (Action::Sell, 0.3),
            Action::Sell,
            executor.clone(),
            EventBus::new(64),
        );

        let decision = r.tick().await.unwrap();
        assert_eq!(decision.action, Action::Hold);
        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(r.smoother().history().len(), 1);
    }

    #[tokio::test]
    async fn test_feed_failure_abandons_tick() {
        let executor = Arc::new(CountingExecutor::default());
        let r = router(
            Arc::new(FixedFeed { ok: false }),
            (Action::Buy, 0.9),
            Action::Buy,
            executor.clone(),
            EventBus::new(64),
        );

        assert!(r.tick().await.is_none());
        assert!(matches!(r.try_tick().await, Err(TickError::Feed(_))));
        assert!(r.smoother().history().is_empty());
        assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_executor_failure_keeps_decision() {
        let bus = EventBus::new(64);
        let mut rx = bus.subscribe();
        let executor = Arc::new(CountingExecutor {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let r = router(
            Arc::new(FixedFeed { ok: true }),
            (Action::Sell, 0.9),
            Action::Buy,
            executor.clone(),
            bus,
        );

        let decision = r.tick().await.unwrap();
        assert_eq!(decision.action, Action::Sell);
        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
        assert!(drain(&mut rx)
            .iter()
            .any(|e| matches!(e, Event::Execution(r) if r.status == "failed" && r.order_id.is_none())));
    }

    #[tokio::test]
    async fn test_overlapping_tick_is_skipped() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let feed = Arc::new(GatedFeed {
            entered: entered.clone(),
            release: release.clone(),
        });
        let executor = Arc::new(CountingExecutor::default());
        let r = Arc::new(router(feed, (Action::Buy, 0.9), Action::Buy, executor, EventBus::new(64)));

        let first = {
            let r = r.clone();
            tokio::spawn(async move { r.tick().await })
        };
        entered.notified().await;

        assert!(matches!(r.try_tick().await, Err(TickError::InProgress)));

        release.notify_one();
        let decision = first.await.unwrap();
        assert_eq!(decision.map(|d| d.action), Some(Action::Buy));
        assert_eq!(r.smoother().history().len(), 1);
    }
}
