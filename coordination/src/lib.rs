//! WSDE Team Coordination Library
//!
//! Coordinates a team of agents working on a shared task:
//! - Expertise-driven role assignment (Primus, Supervisor, Designer, Evaluator, Worker)
//!   with fair Primus rotation and EDRR phase awareness
//! - Critical-decision voting with a deterministic tie-break chain
//! - Dialectical reasoning (thesis → antithesis → synthesis → evaluation) in
//!   basic, enhanced, knowledge-graph, multi-solution and multi-disciplinary modes
//! - Consensus synthesis over competing proposals
//!
//! # Usage
//!
//! ```no_run
//! use wsde_coordination::{ScriptedAgent, Task, Team};
//!
//! let mut team = Team::new("core");
//! team.add_agent(Box::new(ScriptedAgent::new("alice", &["security"]).voting("A")))?;
//! team.add_agent(Box::new(ScriptedAgent::new("bob", &["performance"]).voting("B")))?;
//!
//! let task = Task::critical_decision("db-choice", &["A", "B"]);
//! team.select_primus_by_expertise(&task)?;
//! let outcome = team.vote_on_critical_decision(&task)?;
//! println!("{:?}", outcome.winner());
//! # Ok::<(), wsde_coordination::TeamError>(())
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod agent;
pub mod config;
pub mod consensus;
pub mod decisions;
pub mod dialectic;
pub mod error;
pub mod expertise;
pub mod knowledge;
pub mod readability;
pub mod roles;
pub mod task;
pub mod team;
pub mod voting;

pub use agent::{Agent, AgentError, AgentOutput, ExpertiseLevel, ScriptedAgent};
pub use config::{ConfigError, EngineConfig};
pub use consensus::{ConsensusMethod, ConsensusOutcome};
pub use decisions::{DecisionMethod, DecisionQuery, DecisionTracker, TrackedDecision};
pub use dialectic::{DialecticalBody, DialecticalOutcome, DialecticalResult, ReasoningMode};
pub use error::{TeamError, TeamResult};
pub use expertise::ExpertiseScorer;
pub use knowledge::{InMemoryKnowledgeGraph, KnowledgeConcept, KnowledgeError, KnowledgeGraph};
pub use readability::stakeholder_explanation;
pub use roles::{Phase, Role, RoleAssignment};
pub use task::{DecisionKind, Task, TaskOption};
pub use team::{DialecticalHook, SharedTeam, Solution, Team};
pub use voting::{ConsensusVoteOutcome, TieBreakAttempt, TieBreakMethod, VoteOutcome, VoteRecord, VoteResult};
