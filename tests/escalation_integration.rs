//! Integration tests for decision escalation
//!
//! These verify that:
//! 1. An agent never has more than one call outstanding
//! 2. The request budget is enforced on wall-clock time
//! 3. Accepted decisions are verified exactly once, and only misses are written back
//! 4. Replies for agents that are gone change nothing
//! 5. A decision biases the scorer for its window and then lapses on its own

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::Handle;

use ember_colony::actions::ActionId;
use ember_colony::core::config::{EscalationConfig, SimulationConfig};
use ember_colony::core::error::Result;
use ember_colony::core::types::Position;
use ember_colony::entity::agent::{Agent, Role, Trait};
use ember_colony::llm::{
    ColonyContext, CompletionProvider, DecisionSystem, Escalation, ManualClock, ProviderReply,
    RateLimit, TokenUsage, UsageSink, UsageTotals,
};
use ember_colony::simulation::crisis::{CrisisKind, CrisisSituation};
use ember_colony::simulation::events::EventLog;
use ember_colony::simulation::tick::{run_tick, Colony};
use ember_colony::world::{AStarPathfinder, GridWorld};

const EAT_REPLY: &str = r#"Here is my answer:
{"action": "eat whatever is left", "intent": "eat", "justification": "I am starving", "mood": "grim"}"#;

/// Provider that answers every call with the same text after a delay
struct Scripted {
    reply: &'static str,
    delay: Duration,
    limit: RateLimit,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(reply: &'static str) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            limit: RateLimit::UNLIMITED,
            calls: AtomicUsize::new(0),
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn limited(mut self, per_minute: u32) -> Self {
        self.limit = RateLimit::new(per_minute, 0);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn rate_limit(&self) -> RateLimit {
        self.limit
    }

    async fn complete(&self, _system: &str, _user: &str) -> Result<ProviderReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(ProviderReply {
            text: self.reply.to_string(),
            usage: TokenUsage {
                input_tokens: 120,
                output_tokens: 30,
            },
        })
    }
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<UsageTotals>>>);

impl UsageSink for Recorder {
    fn record(&mut self, totals: &UsageTotals) {
        if let Ok(mut seen) = self.0.lock() {
            seen.push(*totals);
        }
    }
}

fn crisis(kind: CrisisKind) -> CrisisSituation {
    CrisisSituation {
        kind,
        description: "stores are empty".into(),
        context: "hunger 70".into(),
    }
}

fn colonist(name: &str) -> Agent {
    let mut agent = Agent::new(name, Role::Forager, Trait::Steady, Position::new(4, 4));
    agent.vitals.hunger = 70.0;
    agent
}

fn system(provider: Arc<Scripted>) -> DecisionSystem {
    DecisionSystem::new(provider, EscalationConfig::default(), Handle::current())
}

async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test]
async fn test_single_flight_per_agent() {
    let provider = Arc::new(Scripted::new(EAT_REPLY).slow(Duration::from_millis(80)));
    let mut ds = system(provider.clone());
    let mut agents = vec![colonist("Ada")];
    let ctx = ColonyContext::default();
    let mut events = EventLog::new();

    let first = ds.request_decision(&agents[0], &crisis(CrisisKind::CriticalSupplies), &ctx, 0);
    let second = ds.request_decision(&agents[0], &crisis(CrisisKind::CriticalSupplies), &ctx, 1);
    assert_eq!(first, Escalation::Spawned);
    assert_eq!(second, Escalation::InFlight);
    assert_eq!(ds.in_flight_count(), 1);

    settle(200).await;
    assert_eq!(ds.apply_completed(&mut agents, 2, &mut events), 1);
    assert_eq!(provider.calls(), 1);
    assert_eq!(ds.in_flight_count(), 0);
    assert_eq!(ds.usage().calls, 1);
}

#[tokio::test]
async fn test_rate_limit_rejects_then_recovers() {
    let provider = Arc::new(Scripted::new(EAT_REPLY).limited(2));
    let clock = Arc::new(ManualClock::new());
    let mut ds = system(provider.clone()).with_clock(clock.clone());
    let agents = vec![colonist("Ada"), colonist("Bo"), colonist("Cy")];
    let ctx = ColonyContext::default();
    let situation = crisis(CrisisKind::CriticalSupplies);

    assert!(ds.request_decision(&agents[0], &situation, &ctx, 0).is_spawned());
    assert!(ds.request_decision(&agents[1], &situation, &ctx, 0).is_spawned());
    assert_eq!(ds.request_decision(&agents[2], &situation, &ctx, 0), Escalation::RateLimited);
    assert_eq!(ds.usage().calls, 2);

    // Ticks alone never refill the budget
    assert_eq!(ds.request_decision(&agents[2], &situation, &ctx, 5_000), Escalation::RateLimited);

    clock.advance(Duration::from_secs(61));
    assert!(ds.request_decision(&agents[2], &situation, &ctx, 5_001).is_spawned());
}

#[tokio::test]
async fn test_raid_cooldown_is_colony_wide() {
    let provider = Arc::new(Scripted::new(EAT_REPLY));
    let mut ds = system(provider);
    let ctx = ColonyContext::default();
    let a = Agent::new("Ada", Role::Guard, Trait::Brave, Position::new(1, 1));
    let b = Agent::new("Bo", Role::Guard, Trait::Brave, Position::new(2, 1));
    let raid = crisis(CrisisKind::ImminentThreat);

    assert!(ds.request_decision(&a, &raid, &ctx, 10).is_spawned());
    assert_eq!(ds.request_decision(&b, &raid, &ctx, 11), Escalation::RaidCooldown);
    // Other crises are not held back by the raid window
    assert!(ds
        .request_decision(&b, &crisis(CrisisKind::CriticalSupplies), &ctx, 11)
        .is_spawned());
}

#[tokio::test]
async fn test_verified_success_leaves_memory_alone() {
    let provider = Arc::new(Scripted::new(EAT_REPLY));
    let mut ds = system(provider);
    let mut agents = vec![colonist("Ada")];
    let ctx = ColonyContext::default();
    let mut events = EventLog::new();

    ds.request_decision(&agents[0], &crisis(CrisisKind::CriticalSupplies), &ctx, 9);
    settle(30).await;
    assert_eq!(ds.apply_completed(&mut agents, 10, &mut events), 1);

    let ada = &agents[0];
    assert_eq!(ada.memory.len(), 1);
    assert_eq!(ada.memory.entries()[0].crisis, CrisisKind::CriticalSupplies);
    assert_eq!(ada.active_intent(10), Some(ActionId::Eat));
    assert_eq!(ada.justification.as_deref(), Some("I am starving"));
    assert_eq!(ada.mood.as_deref(), Some("grim"));
    assert_eq!(ds.pending_verifications(), 1);

    agents[0].vitals.hunger = 30.0;
    assert_eq!(ds.drain_verifications(&mut agents, 29, &mut events), 0);
    assert_eq!(ds.pending_verifications(), 1);
    assert_eq!(ds.drain_verifications(&mut agents, 30, &mut events), 0);
    assert_eq!(ds.pending_verifications(), 0);
    assert!(agents[0].memory.entries()[0].outcome.is_none());
}

#[tokio::test]
async fn test_verified_miss_backfills_once() {
    let provider = Arc::new(Scripted::new(EAT_REPLY));
    let mut ds = system(provider);
    let mut agents = vec![colonist("Ada")];
    let ctx = ColonyContext::default();
    let mut events = EventLog::new();

    ds.request_decision(&agents[0], &crisis(CrisisKind::CriticalSupplies), &ctx, 9);
    settle(30).await;
    ds.apply_completed(&mut agents, 10, &mut events);

    agents[0].vitals.hunger = 75.0;
    assert_eq!(ds.drain_verifications(&mut agents, 30, &mut events), 1);
    let outcome = agents[0].memory.entries()[0].outcome.clone();
    assert!(outcome.as_deref().unwrap_or("").contains("surprise"));
    assert_eq!(ds.pending_verifications(), 0);

    assert_eq!(ds.drain_verifications(&mut agents, 31, &mut events), 0);
    assert_eq!(agents[0].memory.entries()[0].outcome, outcome);
}

#[tokio::test]
async fn test_drain_with_nothing_due_is_noop() {
    let mut ds = system(Arc::new(Scripted::new(EAT_REPLY)));
    let mut agents = vec![colonist("Ada")];
    let mut events = EventLog::new();

    assert_eq!(ds.drain_verifications(&mut agents, 100, &mut events), 0);
    assert!(events.is_empty());
    assert!(agents[0].memory.is_empty());
}

#[tokio::test]
async fn test_reply_for_dead_agent_is_dropped() {
    let mut ds = system(Arc::new(Scripted::new(EAT_REPLY)));
    let mut agents = vec![colonist("Ada")];
    let mut events = EventLog::new();

    ds.request_decision(&agents[0], &crisis(CrisisKind::CriticalSupplies), &ColonyContext::default(), 0);
    agents[0].die();
    settle(30).await;

    assert_eq!(ds.apply_completed(&mut agents, 1, &mut events), 0);
    assert!(agents[0].memory.is_empty());
    assert!(agents[0].bias.is_none());
    assert_eq!(ds.in_flight_count(), 0);
    assert_eq!(ds.pending_verifications(), 0);
}

#[tokio::test]
async fn test_reply_for_removed_agent_is_dropped() {
    let mut ds = system(Arc::new(Scripted::new(EAT_REPLY)));
    let mut agents = vec![colonist("Ada"), colonist("Bo")];
    let mut events = EventLog::new();

    ds.request_decision(&agents[0], &crisis(CrisisKind::CriticalSupplies), &ColonyContext::default(), 0);
    let gone = agents.remove(0);
    ds.forget(gone.id);
    settle(30).await;

    assert_eq!(ds.apply_completed(&mut agents, 1, &mut events), 0);
    assert!(agents[0].memory.is_empty());
}

#[tokio::test]
async fn test_forget_clears_cooldown_and_flight() {
    let mut ds = system(Arc::new(Scripted::new(EAT_REPLY).slow(Duration::from_millis(50))));
    let agent = colonist("Ada");
    let ctx = ColonyContext::default();
    let situation = crisis(CrisisKind::CriticalSupplies);

    assert!(ds.request_decision(&agent, &situation, &ctx, 0).is_spawned());
    assert!(ds.is_in_flight(agent.id));
    ds.forget(agent.id);
    assert!(!ds.is_in_flight(agent.id));
    assert!(ds.request_decision(&agent, &situation, &ctx, 1).is_spawned());
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let provider = Arc::new(Scripted::new(EAT_REPLY).slow(Duration::from_millis(500)));
    let config = EscalationConfig {
        timeout_ms: 20,
        ..EscalationConfig::default()
    };
    let mut ds = DecisionSystem::new(provider, config, Handle::current());
    let mut agents = vec![colonist("Ada")];
    let mut events = EventLog::new();

    ds.request_decision(&agents[0], &crisis(CrisisKind::CriticalSupplies), &ColonyContext::default(), 0);
    settle(120).await;

    assert_eq!(ds.apply_completed(&mut agents, 1, &mut events), 0);
    assert_eq!(ds.usage().failures, 1);
    assert_eq!(ds.in_flight_count(), 0);
    assert!(events.contains("timed out"));
    assert!(agents[0].memory.is_empty());
}

#[tokio::test]
async fn test_usage_sink_sees_running_totals() {
    let recorder = Recorder::default();
    let mut ds = system(Arc::new(Scripted::new(EAT_REPLY))).with_usage_sink(Box::new(recorder.clone()));
    let mut agents = vec![colonist("Ada"), colonist("Bo")];
    let ctx = ColonyContext::default();
    let mut events = EventLog::new();

    ds.request_decision(&agents[0], &crisis(CrisisKind::CriticalSupplies), &ctx, 0);
    ds.request_decision(&agents[1], &crisis(CrisisKind::CriticalSupplies), &ctx, 0);
    settle(30).await;
    assert_eq!(ds.apply_completed(&mut agents, 1, &mut events), 2);

    let seen = recorder.0.lock().map(|s| s.clone()).unwrap_or_default();
    assert_eq!(seen.len(), 2);
    let last = seen[1];
    assert_eq!(last.calls, 2);
    assert_eq!(last.input_tokens, 240);
    assert_eq!(last.output_tokens, 60);
}

#[tokio::test]
async fn test_decision_biases_scorer_then_lapses() {
    let provider = Arc::new(Scripted::new(
        r#"{"action": "forage the far bushes", "intent": "forage", "justification": "the stores are bare"}"#,
    ));
    let mut ds = system(provider.clone());
    let mut colony = Colony::new(SimulationConfig::default(), Position::new(10, 10), 3);
    let mut world = GridWorld::new(20, 20);
    let pathfinder = AStarPathfinder::default();

    let mut agent = Agent::new("Ada", Role::Miner, Trait::Steady, Position::new(4, 4));
    agent.vitals.hunger = 65.0;
    let id = colony.spawn(agent);

    let first = run_tick(&mut colony, &mut world, &pathfinder, Some(&mut ds));
    assert_eq!(first.escalations, 1);
    settle(30).await;

    let second = run_tick(&mut colony, &mut world, &pathfinder, Some(&mut ds));
    assert_eq!(second.decisions_applied, 1);
    let ada = colony.agent(id).unwrap();
    assert_eq!(ada.active_intent(1), Some(ActionId::Forage));
    assert_eq!(ada.bias.map(|b| b.expires_at), Some(31));
    assert!(ada.justification.is_some());

    let mut surprises = 0;
    while colony.tick <= 32 {
        let summary = run_tick(&mut colony, &mut world, &pathfinder, Some(&mut ds));
        surprises += summary.surprises;
        assert_eq!(summary.escalations, 0);
        let bias = colony.agent(id).unwrap().bias;
        if summary.tick <= 31 {
            assert!(bias.is_some());
        } else {
            assert!(bias.is_none());
        }
    }

    let expired = colony
        .events
        .events()
        .iter()
        .filter(|e| e.message == "decision bias expired")
        .count();
    assert_eq!(expired, 1);
    // Nothing to forage on a bare map: the check at tick 21 comes back a miss
    assert_eq!(surprises, 1);
    assert_eq!(provider.calls(), 1);
}
