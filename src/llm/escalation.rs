//! Decision escalation service
//!
//! Owns everything about asking the provider for help: cooldowns, the rate
//! budget, the single-flight set, pending verifications and token totals.
//! Calls run on detached tokio tasks; their replies come back over a channel
//! and are applied by [`DecisionSystem::apply_completed`] inside the tick, so
//! agent state is only ever touched from the synchronous phase.

use std::sync::Arc;
use std::time::Duration;

use ahash::{AHashMap, AHashSet};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::core::config::EscalationConfig;
use crate::core::error::{ColonyError, Result};
use crate::core::types::{AgentId, Tick};
use crate::entity::agent::{Agent, DecisionBias};
use crate::entity::memory::MemoryEntry;
use crate::llm::parser::{parse_decision, Decision};
use crate::llm::prompt::{build_prompt, ColonyContext};
use crate::llm::provider::{CompletionProvider, TokenUsage};
use crate::llm::rate_limit::{Clock, RateLimiter, SystemClock};
use crate::llm::verification::{has_predicate, succeeded, surprise, VerificationQueue, VerificationSnapshot};
use crate::simulation::crisis::{CrisisKind, CrisisSituation, Tier};
use crate::simulation::events::EventSink;

/// Result of asking for a decision; only `Spawned` issues a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    Spawned,
    Disabled,
    NotAlive,
    /// A call for this agent is already outstanding
    InFlight,
    /// Low-tier crises are never escalated
    LowTier,
    Cooldown,
    RaidCooldown,
    RateLimited,
}

impl Escalation {
    pub fn is_spawned(&self) -> bool {
        matches!(self, Escalation::Spawned)
    }
}

/// Cumulative provider usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageTotals {
    pub calls: u64,
    pub failures: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl UsageTotals {
    fn add(&mut self, usage: TokenUsage) {
        self.input_tokens += usage.input_tokens;
        self.output_tokens += usage.output_tokens;
    }
}

/// Receives cumulative totals after every successful call
pub trait UsageSink: Send {
    fn record(&mut self, totals: &UsageTotals);
}

/// Usage sink that writes totals to the log
#[derive(Debug, Default)]
pub struct TracingUsageSink;

impl UsageSink for TracingUsageSink {
    fn record(&mut self, totals: &UsageTotals) {
        tracing::info!(
            calls = totals.calls,
            failures = totals.failures,
            input_tokens = totals.input_tokens,
            output_tokens = totals.output_tokens,
            "provider usage"
        );
    }
}

/// Message from a finished call back to the tick
struct Reply {
    agent: AgentId,
    crisis: CrisisKind,
    outcome: Result<Decision>,
    usage: TokenUsage,
}

pub struct DecisionSystem {
    provider: Arc<dyn CompletionProvider>,
    config: EscalationConfig,
    limiter: RateLimiter,
    runtime: Handle,
    /// Tick of each agent's last accepted escalation
    cooldowns: AHashMap<AgentId, Tick>,
    last_raid: Option<Tick>,
    in_flight: AHashSet<AgentId>,
    verifications: VerificationQueue,
    usage: UsageTotals,
    usage_sink: Option<Box<dyn UsageSink>>,
    tx: mpsc::UnboundedSender<Reply>,
    rx: mpsc::UnboundedReceiver<Reply>,
}

impl DecisionSystem {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: EscalationConfig, runtime: Handle) -> Self {
        let limiter = RateLimiter::new(provider.rate_limit(), Arc::new(SystemClock));
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            provider,
            config,
            limiter,
            runtime,
            cooldowns: AHashMap::new(),
            last_raid: None,
            in_flight: AHashSet::new(),
            verifications: VerificationQueue::new(),
            usage: UsageTotals::default(),
            usage_sink: None,
            tx,
            rx,
        }
    }

    /// Build on the tokio runtime the caller is running in
    pub fn from_current(provider: Arc<dyn CompletionProvider>, config: EscalationConfig) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| ColonyError::LlmError(format!("no tokio runtime: {}", e)))?;
        Ok(Self::new(provider, config, runtime))
    }

    /// Replace the wall clock behind the rate limiter
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.limiter = RateLimiter::new(self.provider.rate_limit(), clock);
        self
    }

    pub fn with_usage_sink(mut self, sink: Box<dyn UsageSink>) -> Self {
        self.usage_sink = Some(sink);
        self
    }

    pub fn config(&self) -> &EscalationConfig {
        &self.config
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_in_flight(&self, agent: AgentId) -> bool {
        self.in_flight.contains(&agent)
    }

    pub fn pending_verifications(&self) -> usize {
        self.verifications.len()
    }

    pub fn usage(&self) -> UsageTotals {
        self.usage
    }

    fn cooldown_for(&self, tier: Tier) -> Option<u64> {
        match tier {
            Tier::High => Some(self.config.cooldown_ticks),
            Tier::Medium => {
                let scaled = self.config.cooldown_ticks as f64 * self.config.medium_cooldown_multiplier;
                Some(scaled.round() as u64)
            }
            Tier::Low => None,
        }
    }

    /// Ask the provider about `crisis` if every gate allows it
    ///
    /// Never blocks: on acceptance the call runs on a detached task and this
    /// returns immediately.
    pub fn request_decision(
        &mut self,
        agent: &Agent,
        crisis: &CrisisSituation,
        colony: &ColonyContext,
        tick: Tick,
    ) -> Escalation {
        if !self.config.enabled {
            return Escalation::Disabled;
        }
        if !agent.alive {
            return Escalation::NotAlive;
        }
        if self.in_flight.contains(&agent.id) {
            return Escalation::InFlight;
        }
        let Some(cooldown) = self.cooldown_for(crisis.tier()) else {
            return Escalation::LowTier;
        };
        if let Some(&last) = self.cooldowns.get(&agent.id) {
            if tick < last.saturating_add(cooldown) {
                return Escalation::Cooldown;
            }
        }
        if crisis.kind.is_raid() {
            if let Some(last) = self.last_raid {
                if tick < last.saturating_add(self.config.raid_cooldown_ticks) {
                    return Escalation::RaidCooldown;
                }
            }
        }
        if !self.limiter.try_acquire() {
            tracing::debug!(agent = %agent.id, "escalation rate limited");
            return Escalation::RateLimited;
        }

        self.cooldowns.insert(agent.id, tick);
        if crisis.kind.is_raid() {
            self.last_raid = Some(tick);
        }
        self.in_flight.insert(agent.id);
        self.usage.calls += 1;

        let prompt = build_prompt(agent, crisis, colony, &self.config);
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        let timeout_ms = self.config.timeout_ms;
        let (agent_id, kind) = (agent.id, crisis.kind);

        tracing::debug!(agent = %agent_id, crisis = %kind, provider = provider.name(), "escalating");
        self.runtime.spawn(async move {
            let call = provider.complete(&prompt.system, &prompt.user);
            let (outcome, usage) = match tokio::time::timeout(Duration::from_millis(timeout_ms), call).await {
                Ok(Ok(reply)) => (parse_decision(&reply.text), reply.usage),
                Ok(Err(e)) => (Err(e), TokenUsage::default()),
                Err(_) => (Err(ColonyError::Timeout(timeout_ms)), TokenUsage::default()),
            };
            // A closed channel means the system is gone; the reply has nowhere to go
            let _ = tx.send(Reply {
                agent: agent_id,
                crisis: kind,
                outcome,
                usage,
            });
        });

        Escalation::Spawned
    }

    fn emit_usage(&mut self) {
        if let Some(sink) = self.usage_sink.as_mut() {
            sink.record(&self.usage);
        }
    }

    /// Apply every reply that has arrived since the last call
    ///
    /// Returns the number of decisions installed. Replies for agents that
    /// died or were removed in the meantime are dropped.
    pub fn apply_completed(&mut self, agents: &mut [Agent], tick: Tick, events: &mut dyn EventSink) -> usize {
        let mut applied = 0;
        while let Ok(reply) = self.rx.try_recv() {
            self.in_flight.remove(&reply.agent);
            self.usage.add(reply.usage);

            let decision = match reply.outcome {
                Ok(decision) => decision,
                Err(e) => {
                    self.usage.failures += 1;
                    events.warn(tick, Some(reply.agent), format!("no decision: {}", e));
                    continue;
                }
            };
            self.emit_usage();

            let Some(agent) = agents.iter_mut().find(|a| a.id == reply.agent) else {
                tracing::debug!(agent = %reply.agent, "decision for unknown agent dropped");
                continue;
            };
            if !agent.alive {
                continue;
            }

            agent.justification = Some(decision.justification.clone());
            agent.mood = decision.mood.clone();
            let index = agent
                .memory
                .append(MemoryEntry::new(tick, reply.crisis, decision.action.clone()));

            if let Some(intent) = decision.intent {
                agent.bias = Some(DecisionBias {
                    intent,
                    expires_at: tick + self.config.bias_window,
                });
                if has_predicate(intent) {
                    let due = tick + self.config.verify_delay;
                    self.verifications
                        .schedule(VerificationSnapshot::capture(agent, intent, index, due));
                }
            }

            events.info(
                tick,
                agent.id,
                format!("decided to {}: {}", decision.action, decision.justification),
            );
            applied += 1;
        }
        applied
    }

    /// Check every verification that has come due
    ///
    /// Each due snapshot is consumed whether or not its agent still exists.
    /// Returns the number of surprises written to memory.
    pub fn drain_verifications(&mut self, agents: &mut [Agent], tick: Tick, events: &mut dyn EventSink) -> usize {
        let mut surprises = 0;
        for snapshot in self.verifications.take_due(tick) {
            let Some(agent) = agents.iter_mut().find(|a| a.id == snapshot.agent && a.alive) else {
                continue;
            };
            if succeeded(&snapshot, agent) != Some(false) {
                continue;
            }
            let text = surprise(&snapshot, agent);
            if agent.memory.backfill(snapshot.memory_index, text.clone()) {
                events.debug(tick, agent.id, text);
                surprises += 1;
            }
        }
        surprises
    }

    /// Drop all state held for an agent leaving the simulation
    pub fn forget(&mut self, agent: AgentId) {
        self.cooldowns.remove(&agent);
        self.in_flight.remove(&agent);
        self.verifications.forget(agent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Position;
    use crate::entity::agent::{Role, Trait};
    use crate::llm::provider::{ProviderReply, RateLimit};
    use crate::simulation::events::EventLog;
    use async_trait::async_trait;

    struct Canned(&'static str);

    #[async_trait]
    impl CompletionProvider for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        fn rate_limit(&self) -> RateLimit {
            RateLimit::UNLIMITED
        }

        async fn complete(&self, _system: &str, _user: &str) -> Result<ProviderReply> {
            Ok(ProviderReply {
                text: self.0.to_string(),
                usage: TokenUsage {
                    input_tokens: 100,
                    output_tokens: 20,
                },
            })
        }
    }

    fn situation(kind: CrisisKind) -> CrisisSituation {
        CrisisSituation {
            kind,
            description: "test".into(),
            context: String::new(),
        }
    }

    fn system(reply: &'static str) -> DecisionSystem {
        DecisionSystem::new(Arc::new(Canned(reply)), EscalationConfig::default(), Handle::current())
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_low_tier_never_escalates() {
        let mut ds = system("{}");
        let agent = Agent::new("Ada", Role::Miner, Trait::Steady, Position::new(0, 0));
        let ctx = ColonyContext::default();
        assert_eq!(
            ds.request_decision(&agent, &situation(CrisisKind::HighFatigue), &ctx, 1),
            Escalation::LowTier
        );
        assert_eq!(ds.usage().calls, 0);
    }

    #[tokio::test]
    async fn test_disabled_and_dead_are_rejected() {
        let mut ds = DecisionSystem::new(
            Arc::new(Canned("{}")),
            EscalationConfig {
                enabled: false,
                ..EscalationConfig::default()
            },
            Handle::current(),
        );
        let mut agent = Agent::new("Ada", Role::Miner, Trait::Steady, Position::new(0, 0));
        let ctx = ColonyContext::default();
        let crisis = situation(CrisisKind::CriticalSupplies);
        assert_eq!(ds.request_decision(&agent, &crisis, &ctx, 1), Escalation::Disabled);

        let mut ds = system("{}");
        agent.die();
        assert_eq!(ds.request_decision(&agent, &crisis, &ctx, 1), Escalation::NotAlive);
    }

    #[tokio::test]
    async fn test_medium_cooldown_is_scaled() {
        let mut ds = system(r#"{"action": "eat", "justification": "hungry"}"#);
        let mut agents = vec![Agent::new("Ada", Role::Miner, Trait::Steady, Position::new(0, 0))];
        let ctx = ColonyContext::default();
        let mut events = EventLog::new();
        let crisis = situation(CrisisKind::HighHunger);

        assert!(ds.request_decision(&agents[0], &crisis, &ctx, 0).is_spawned());
        settle().await;
        assert_eq!(ds.apply_completed(&mut agents, 1, &mut events), 1);

        // High would be allowed at 200, medium waits 400
        assert_eq!(ds.request_decision(&agents[0], &crisis, &ctx, 250), Escalation::Cooldown);
        assert!(ds.request_decision(&agents[0], &crisis, &ctx, 400).is_spawned());
    }

    #[tokio::test]
    async fn test_malformed_reply_is_no_decision() {
        let mut ds = system("I would rather not say");
        let mut agents = vec![Agent::new("Ada", Role::Miner, Trait::Steady, Position::new(0, 0))];
        let mut events = EventLog::new();

        ds.request_decision(&agents[0], &situation(CrisisKind::CriticalSupplies), &ColonyContext::default(), 0);
        settle().await;
        assert_eq!(ds.apply_completed(&mut agents, 1, &mut events), 0);

        assert_eq!(ds.in_flight_count(), 0);
        assert!(agents[0].memory.is_empty());
        assert!(agents[0].bias.is_none());
        assert_eq!(ds.usage().failures, 1);
        assert_eq!(ds.usage().input_tokens, 100);
        assert!(events.contains("no decision"));
    }

    struct Recorder(std::sync::Arc<std::sync::Mutex<Vec<UsageTotals>>>);

    impl UsageSink for Recorder {
        fn record(&mut self, totals: &UsageTotals) {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(*totals);
            }
        }
    }

    #[tokio::test]
    async fn test_usage_sink_skips_failed_calls() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut ds = system("I would rather not say").with_usage_sink(Box::new(Recorder(seen.clone())));
        let mut agents = vec![Agent::new("Ada", Role::Miner, Trait::Steady, Position::new(0, 0))];
        let mut events = EventLog::new();

        ds.request_decision(&agents[0], &situation(CrisisKind::CriticalSupplies), &ColonyContext::default(), 0);
        settle().await;
        ds.apply_completed(&mut agents, 1, &mut events);

        assert!(seen.lock().unwrap().is_empty());
        assert_eq!(ds.usage().calls, 1);
        assert_eq!(ds.usage().failures, 1);
        assert_eq!(ds.usage().input_tokens, 100);
        assert_eq!(ds.usage().output_tokens, 20);
    }
}
