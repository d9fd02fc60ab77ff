//! Decision escalation to an external completion provider
//!
//! The scorer never waits on anything in here. A crisis may start a call;
//! the reply, if it ever arrives, only nudges the scorer for a while.

pub mod client;
pub mod escalation;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod rate_limit;
pub mod verification;

pub use client::HttpProvider;
pub use escalation::{DecisionSystem, Escalation, TracingUsageSink, UsageSink, UsageTotals};
pub use parser::{parse_decision, Decision};
pub use prompt::{ColonyContext, Prompt};
pub use provider::{CompletionProvider, ProviderConfig, ProviderReply, RateLimit, TokenUsage};
pub use rate_limit::{Clock, ManualClock, RateLimiter, SystemClock};
