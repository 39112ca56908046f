//! Voting on critical decisions.
//!
//! Each agent casts one vote through `process`. With a task domain the votes
//! are weighted by expertise, otherwise counted. A tie runs the fixed
//! tie-break chain, stopping at the first stage that succeeds:
//!
//! ```text
//!   Primus ──▶ ExpertiseWeighted ──▶ HistoricalPattern ──▶ ConsensusFallback
//!   (primus   (strongest advocate     (past wins among      (always
//!    voted a   per tied option:        tied options)          succeeds)
//!    tied one) level + relevance)
//! ```
//!
//! Every task option enters the tally, so a vote where nobody picks a listed
//! option is a tie across all of them and still ends in a record.
//!
//! Every stage that runs leaves a [`TieBreakAttempt`] in the record, so the
//! audit trail shows why each earlier stage failed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::config::VoteWeights;
use crate::consensus::ConsensusOutcome;
use crate::decisions::DecisionMethod;
use crate::error::{TeamError, TeamResult};
use crate::task::{DecisionKind, Task};
use crate::team::Team;

const WEIGHT_EPSILON: f64 = 1e-9;

/// Stage of the tie-break chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreakMethod {
    Primus,
    ExpertiseWeighted,
    HistoricalPattern,
    ConsensusFallback,
}

impl TieBreakMethod {
    /// The chain, in execution order.
    pub fn chain() -> &'static [TieBreakMethod] {
        &[
            Self::Primus,
            Self::ExpertiseWeighted,
            Self::HistoricalPattern,
            Self::ConsensusFallback,
        ]
    }
}

impl std::fmt::Display for TieBreakMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primus => write!(f, "primus"),
            Self::ExpertiseWeighted => write!(f, "expertise_weighted"),
            Self::HistoricalPattern => write!(f, "historical_pattern"),
            Self::ConsensusFallback => write!(f, "consensus_fallback"),
        }
    }
}

/// Audit entry for one tie-break stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieBreakAttempt {
    pub method: TieBreakMethod,
    pub successful: bool,
    pub winner: Option<String>,
    pub detail: String,
}

impl TieBreakAttempt {
    fn success(method: TieBreakMethod, winner: &str, detail: String) -> Self {
        Self {
            method,
            successful: true,
            winner: Some(winner.to_string()),
            detail,
        }
    }

    fn failure(method: TieBreakMethod, detail: String) -> Self {
        Self {
            method,
            successful: false,
            winner: None,
            detail,
        }
    }
}

/// How a vote was decided.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VoteResult {
    Majority {
        winner: String,
        vote_counts: BTreeMap<String, u32>,
    },
    Weighted {
        winner: String,
        weighted_votes: BTreeMap<String, f64>,
    },
    TieBroken {
        winner: String,
        fallback_stage: TieBreakMethod,
        attempts: Vec<TieBreakAttempt>,
    },
    ConsensusFallback {
        tied_options: Vec<String>,
        consensus_result: ConsensusOutcome,
        attempts: Vec<TieBreakAttempt>,
    },
}

impl VoteResult {
    /// Winning option, if the vote produced one.
    pub fn winner(&self) -> Option<&str> {
        match self {
            Self::Majority { winner, .. }
            | Self::Weighted { winner, .. }
            | Self::TieBroken { winner, .. } => Some(winner),
            Self::ConsensusFallback { .. } => None,
        }
    }

    /// Tie-break audit trail (empty for an untied vote).
    pub fn attempts(&self) -> &[TieBreakAttempt] {
        match self {
            Self::TieBroken { attempts, .. } | Self::ConsensusFallback { attempts, .. } => attempts,
            Self::Majority { .. } | Self::Weighted { .. } => &[],
        }
    }

    fn method(&self) -> DecisionMethod {
        match self {
            Self::Majority { .. } => DecisionMethod::MajorityVote,
            Self::Weighted { .. } => DecisionMethod::WeightedVote,
            Self::TieBroken { .. } => DecisionMethod::TieBreak,
            Self::ConsensusFallback { .. } => DecisionMethod::ConsensusFallback,
        }
    }
}

/// Ledger entry for one decided vote. Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub id: String,
    pub task_id: String,
    /// Agent name → option id.
    pub votes: BTreeMap<String, String>,
    pub result: VoteResult,
    pub timestamp: DateTime<Utc>,
}

impl VoteRecord {
    pub fn new(task_id: &str, votes: BTreeMap<String, String>, result: VoteResult) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            votes,
            result,
            timestamp: Utc::now(),
        }
    }

    pub fn winner(&self) -> Option<&str> {
        self.result.winner()
    }

    /// Whether every vote went to the winner.
    pub fn is_unanimous(&self) -> bool {
        match self.winner() {
            Some(winner) => self.votes.values().all(|v| v == winner),
            None => false,
        }
    }
}

/// Outcome of `vote_on_critical_decision`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VoteOutcome {
    /// A vote was held and recorded.
    Decided(VoteRecord),
    /// The task is not a votable critical decision.
    NotInitiated { error: String },
}

impl VoteOutcome {
    pub fn voting_initiated(&self) -> bool {
        !matches!(self, Self::NotInitiated { .. })
    }

    pub fn record(&self) -> Option<&VoteRecord> {
        match self {
            Self::Decided(record) => Some(record),
            Self::NotInitiated { .. } => None,
        }
    }

    pub fn winner(&self) -> Option<&str> {
        self.record().and_then(VoteRecord::winner)
    }
}

/// Vote plus an optional consensus augmentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusVoteOutcome {
    pub vote: VoteOutcome,
    /// Present when the winning votes were not unanimous. Does not override
    /// the voted winner.
    pub consensus: Option<ConsensusOutcome>,
}

fn agent_weight(agent: &dyn Agent, domain: Option<&str>, weights: &VoteWeights) -> f64 {
    match domain {
        Some(domain) if !agent.has_expertise(domain) => weights.outside_domain,
        _ => weights.for_level(agent.expertise_level()),
    }
}

/// Options holding the maximum value, in option order.
fn leaders<V: Copy + Into<f64>>(totals: &BTreeMap<String, V>) -> Vec<String> {
    let max = totals
        .values()
        .map(|v| (*v).into())
        .fold(f64::NEG_INFINITY, f64::max);
    totals
        .iter()
        .filter(|(_, v)| (max - (**v).into()).abs() < WEIGHT_EPSILON)
        .map(|(k, _)| k.clone())
        .collect()
}

impl Team {
    /// Hold a vote on a critical decision.
    ///
    /// Errors only when the team has no agents. An ineligible task returns
    /// `NotInitiated`; a failing agent is skipped.
    pub fn vote_on_critical_decision(&mut self, task: &Task) -> TeamResult<VoteOutcome> {
        if self.agents.is_empty() {
            return Err(TeamError::NoAgents);
        }

        if !task.is_kind(&DecisionKind::CriticalDecision) || !task.is_critical {
            warn!(team = %self.name, "Voting requested for a task that is not a critical decision");
            return Ok(VoteOutcome::NotInitiated {
                error: "Task is not a critical decision".to_string(),
            });
        }
        if task.options.is_empty() {
            warn!(team = %self.name, "Voting requested without options");
            return Ok(VoteOutcome::NotInitiated {
                error: "No options provided for voting".to_string(),
            });
        }

        let task_id = task.task_id();
        let options = task.option_ids();
        info!(
            team = %self.name,
            task_id = %task_id,
            agents = self.agents.len(),
            options = options.len(),
            "Starting vote"
        );

        let votes = self.collect_votes(task, &options);
        if votes.is_empty() {
            warn!(team = %self.name, task_id = %task_id, "No usable votes cast; every option is tied");
        }

        let domain = task.domain.as_deref();
        let result = match domain {
            Some(_) => {
                let weighted = self.weighted_totals(&options, &votes, domain);
                let tied = leaders(&weighted);
                if tied.len() == 1 {
                    VoteResult::Weighted {
                        winner: tied[0].clone(),
                        weighted_votes: weighted,
                    }
                } else {
                    self.break_tie(task, &votes, tied)
                }
            }
            None => {
                let mut counts: BTreeMap<String, u32> = options.iter().map(|o| (o.to_string(), 0)).collect();
                for option in votes.values() {
                    *counts.entry(option.clone()).or_insert(0) += 1;
                }
                let tied = leaders(&counts);
                if tied.len() == 1 {
                    VoteResult::Majority {
                        winner: tied[0].clone(),
                        vote_counts: counts,
                    }
                } else {
                    self.break_tie(task, &votes, tied)
                }
            }
        };

        let record = VoteRecord::new(&task_id, votes, result);
        info!(
            team = %self.name,
            task_id = %task_id,
            winner = ?record.winner(),
            attempts = record.result.attempts().len(),
            "Vote decided"
        );

        let summary = match record.winner() {
            Some(winner) => format!("Option {} selected", winner),
            None => "Tie resolved by consensus synthesis".to_string(),
        };
        self.decisions.track(
            &task_id,
            record.result.method(),
            &summary,
            record.votes.keys().cloned().collect(),
        );

        self.voting_history.push(record.clone());
        Ok(VoteOutcome::Decided(record))
    }

    /// Vote, then add a consensus synthesis when the vote was not unanimous.
    pub fn consensus_vote(&mut self, task: &Task) -> TeamResult<ConsensusVoteOutcome> {
        let vote = self.vote_on_critical_decision(task)?;
        let consensus = match vote.record() {
            Some(record) if !record.is_unanimous() => {
                debug!(team = %self.name, task_id = %record.task_id, "Vote not unanimous; building consensus");
                Some(self.synthesize_consensus(task))
            }
            _ => None,
        };
        Ok(ConsensusVoteOutcome { vote, consensus })
    }

    fn collect_votes(&mut self, task: &Task, options: &[&str]) -> BTreeMap<String, String> {
        let mut votes = BTreeMap::new();
        for agent in self.agents.iter_mut() {
            let name = agent.name().to_string();
            match agent.process(task) {
                Ok(output) => match output.vote {
                    Some(vote) if options.contains(&vote.as_str()) => {
                        debug!(agent = %name, vote = %vote, "Vote cast");
                        votes.insert(name, vote);
                    }
                    Some(vote) => {
                        warn!(agent = %name, vote = %vote, "Vote for unknown option ignored");
                    }
                    None => {
                        warn!(agent = %name, "Agent returned no vote");
                    }
                },
                Err(e) => {
                    warn!(agent = %name, error = %e, "Agent failed to vote");
                }
            }
        }
        votes
    }

    fn weighted_totals(
        &self,
        options: &[&str],
        votes: &BTreeMap<String, String>,
        domain: Option<&str>,
    ) -> BTreeMap<String, f64> {
        let weights = self.config.vote_weights;
        let mut totals: BTreeMap<String, f64> = options.iter().map(|o| (o.to_string(), 0.0)).collect();
        for (name, option) in votes {
            let weight = self
                .agent(name)
                .map(|agent| agent_weight(agent, domain, &weights))
                .unwrap_or(0.0);
            *totals.entry(option.clone()).or_insert(0.0) += weight;
        }
        totals
    }

    /// Best single backer of each tied option: level weight plus the backer's
    /// expertise score against the task. Tied options nobody backed stay at 0.
    fn advocate_strengths(&self, task: &Task, votes: &BTreeMap<String, String>, tied: &[String]) -> BTreeMap<String, f64> {
        let weights = self.config.vote_weights;
        let context = task.flatten();
        let mut strengths: BTreeMap<String, f64> = tied.iter().map(|o| (o.clone(), 0.0)).collect();
        for (name, option) in votes {
            let (Some(best), Some(agent)) = (strengths.get_mut(option), self.agent(name)) else {
                continue;
            };
            let relevance = self.scorer.score(agent.expertise(), &context).max(0.0);
            let strength = weights.for_level(agent.expertise_level()) + relevance;
            debug!(agent = %name, option = %option, strength, "Advocate strength");
            *best = best.max(strength);
        }
        strengths
    }

    fn break_tie(&self, task: &Task, votes: &BTreeMap<String, String>, tied: Vec<String>) -> VoteResult {
        info!(team = %self.name, tied = ?tied, "Vote tied; running tie-break chain");
        let mut attempts = Vec::new();

        // 1. Primus
        let primus_vote = self
            .get_primus()
            .and_then(|p| votes.get(p.name()).map(|v| (p.name().to_string(), v.clone())));
        match primus_vote {
            Some((primus, vote)) if tied.contains(&vote) => {
                attempts.push(TieBreakAttempt::success(
                    TieBreakMethod::Primus,
                    &vote,
                    format!("Primus {} voted for tied option {}", primus, vote),
                ));
                return VoteResult::TieBroken {
                    winner: vote,
                    fallback_stage: TieBreakMethod::Primus,
                    attempts,
                };
            }
            Some((primus, vote)) => attempts.push(TieBreakAttempt::failure(
                TieBreakMethod::Primus,
                format!("Primus {} voted for {}, which is not tied", primus, vote),
            )),
            None => attempts.push(TieBreakAttempt::failure(
                TieBreakMethod::Primus,
                "Primus did not vote".to_string(),
            )),
        }

        // 2. Strongest advocate of each tied option
        let reweighted = self.advocate_strengths(task, votes, &tied);
        let expertise_leaders = leaders(&reweighted);
        if expertise_leaders.len() == 1 {
            let winner = expertise_leaders[0].clone();
            attempts.push(TieBreakAttempt::success(
                TieBreakMethod::ExpertiseWeighted,
                &winner,
                format!("Strongest advocate per tied option {:?}", reweighted),
            ));
            return VoteResult::TieBroken {
                winner,
                fallback_stage: TieBreakMethod::ExpertiseWeighted,
                attempts,
            };
        }
        attempts.push(TieBreakAttempt::failure(
            TieBreakMethod::ExpertiseWeighted,
            format!("Strongest advocates still tied: {:?}", reweighted),
        ));

        // 3. Historical pattern
        let mut history: BTreeMap<String, u32> = tied.iter().map(|o| (o.clone(), 0)).collect();
        for record in &self.voting_history {
            if let Some(count) = record.winner().and_then(|w| history.get_mut(w)) {
                *count += 1;
            }
        }
        let history_leaders = leaders(&history);
        if history_leaders.len() == 1 {
            let winner = history_leaders[0].clone();
            attempts.push(TieBreakAttempt::success(
                TieBreakMethod::HistoricalPattern,
                &winner,
                format!("Past wins among tied options {:?}", history),
            ));
            return VoteResult::TieBroken {
                winner,
                fallback_stage: TieBreakMethod::HistoricalPattern,
                attempts,
            };
        }
        attempts.push(TieBreakAttempt::failure(
            TieBreakMethod::HistoricalPattern,
            format!("No unique historical favourite: {:?}", history),
        ));

        // 4. Consensus fallback
        let mut annotated = task.clone();
        annotated.id = Some(task.task_id());
        annotated.tied_options = tied.clone();
        let consensus_result = self.synthesize_consensus(&annotated);
        attempts.push(TieBreakAttempt {
            method: TieBreakMethod::ConsensusFallback,
            successful: true,
            winner: None,
            detail: format!("Consensus built via {}", consensus_result.method),
        });
        VoteResult::ConsensusFallback {
            tied_options: tied,
            consensus_result,
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentOutput, ExpertiseLevel, ScriptedAgent};
    use crate::consensus::ConsensusMethod;

    fn team_with(agents: Vec<ScriptedAgent>) -> Team {
        let mut team = Team::new("voters");
        for agent in agents {
            team.add_agent(Box::new(agent)).unwrap();
        }
        team
    }

    fn task() -> Task {
        Task::critical_decision("decide", &["A", "B"])
    }

    #[test]
    fn test_not_initiated_for_ordinary_task() {
        let mut team = team_with(vec![ScriptedAgent::new("a1", &[]).voting("A")]);
        let outcome = team.vote_on_critical_decision(&Task::new("plain")).unwrap();
        assert!(!outcome.voting_initiated());
        assert!(team.voting_history().is_empty());

        let mut no_options = task();
        no_options.options.clear();
        let outcome = team.vote_on_critical_decision(&no_options).unwrap();
        assert!(matches!(outcome, VoteOutcome::NotInitiated { .. }));

        let mut not_critical = task();
        not_critical.is_critical = false;
        assert!(!team.vote_on_critical_decision(&not_critical).unwrap().voting_initiated());
    }

    #[test]
    fn test_empty_team_is_fatal() {
        let mut team = Team::new("empty");
        assert!(matches!(team.vote_on_critical_decision(&task()), Err(TeamError::NoAgents)));
    }

    #[test]
    fn test_majority_vote() {
        let mut team = team_with(vec![
            ScriptedAgent::new("a1", &[]).voting("A"),
            ScriptedAgent::new("a2", &[]).voting("B"),
            ScriptedAgent::new("a3", &[]).voting("A"),
        ]);
        let outcome = team.vote_on_critical_decision(&task()).unwrap();
        let record = outcome.record().unwrap();
        match &record.result {
            VoteResult::Majority { winner, vote_counts } => {
                assert_eq!(winner, "A");
                assert_eq!(vote_counts["A"], 2);
                assert_eq!(vote_counts["B"], 1);
            }
            other => panic!("expected majority, got {:?}", other),
        }
        assert_eq!(team.voting_history().len(), 1);
        assert!(!record.is_unanimous());
    }

    #[test]
    fn test_failing_agent_is_skipped() {
        let mut team = team_with(vec![
            ScriptedAgent::new("a1", &[]).voting("A"),
            ScriptedAgent::new("broken", &[]).voting("B").failing(),
            ScriptedAgent::new("a3", &[]).voting("B"),
            ScriptedAgent::new("a4", &[]).voting("B"),
        ]);
        let outcome = team.vote_on_critical_decision(&task()).unwrap();
        let record = outcome.record().unwrap();
        assert_eq!(record.votes.len(), 3);
        assert!(!record.votes.contains_key("broken"));
        assert_eq!(record.winner(), Some("B"));
    }

    #[test]
    fn test_unknown_option_votes_leave_every_option_tied() {
        let mut team = team_with(vec![
            ScriptedAgent::new("a1", &[]).voting("Z"),
            ScriptedAgent::new("a2", &[]),
        ]);
        let outcome = team.vote_on_critical_decision(&task()).unwrap();
        let record = outcome.record().unwrap();
        assert!(record.votes.is_empty());
        match &record.result {
            VoteResult::ConsensusFallback { tied_options, attempts, .. } => {
                assert_eq!(tied_options, &vec!["A".to_string(), "B".to_string()]);
                assert_eq!(attempts.len(), 4);
            }
            other => panic!("expected consensus fallback, got {:?}", other),
        }
        assert_eq!(team.voting_history().len(), 1);
    }

    #[test]
    fn test_vote_counts_list_every_option() {
        let mut team = team_with(vec![
            ScriptedAgent::new("a1", &[]).voting("A"),
            ScriptedAgent::new("a2", &[]).voting("A"),
        ]);
        let task = Task::critical_decision("decide", &["A", "B", "C"]);
        let outcome = team.vote_on_critical_decision(&task).unwrap();
        match &outcome.record().unwrap().result {
            VoteResult::Majority { vote_counts, .. } => {
                assert_eq!(vote_counts.len(), 3);
                assert_eq!(vote_counts["B"], 0);
                assert_eq!(vote_counts["C"], 0);
            }
            other => panic!("expected majority, got {:?}", other),
        }
    }

    #[test]
    fn test_weighted_vote_by_domain_expertise() {
        let mut team = team_with(vec![
            ScriptedAgent::new("expert", &["security"])
                .with_level(ExpertiseLevel::Expert)
                .voting("A"),
            ScriptedAgent::new("n1", &["security"]).voting("B"),
            ScriptedAgent::new("outsider", &["ui"]).with_level(ExpertiseLevel::Expert).voting("B"),
        ]);
        let outcome = team.vote_on_critical_decision(&task().with_domain("security")).unwrap();
        match &outcome.record().unwrap().result {
            VoteResult::Weighted { winner, weighted_votes } => {
                assert_eq!(winner, "A");
                assert_eq!(weighted_votes["A"], 3.0);
                assert_eq!(weighted_votes["B"], 1.5);
            }
            other => panic!("expected weighted, got {:?}", other),
        }
    }

    #[test]
    fn test_tie_broken_by_primus() {
        let mut team = team_with(vec![
            ScriptedAgent::new("a1", &[]).voting("A"),
            ScriptedAgent::new("a2", &[]).voting("B"),
        ]);
        let outcome = team.vote_on_critical_decision(&task()).unwrap();
        match &outcome.record().unwrap().result {
            VoteResult::TieBroken {
                winner,
                fallback_stage,
                attempts,
            } => {
                assert_eq!(winner, "A");
                assert_eq!(*fallback_stage, TieBreakMethod::Primus);
                assert_eq!(attempts.len(), 1);
                assert!(attempts[0].successful);
            }
            other => panic!("expected tie broken, got {:?}", other),
        }
    }

    #[test]
    fn test_tie_broken_by_expertise() {
        // Primus abstains, so stage 1 fails; levels differ, so stage 2 decides.
        let mut team = team_with(vec![
            ScriptedAgent::new("primus", &[]).with_response(AgentOutput::default()),
            ScriptedAgent::new("senior", &[]).with_level(ExpertiseLevel::Expert).voting("B"),
            ScriptedAgent::new("junior", &[]).voting("A"),
        ]);
        let outcome = team.vote_on_critical_decision(&task()).unwrap();
        let result = &outcome.record().unwrap().result;
        assert_eq!(result.winner(), Some("B"));
        let methods: Vec<TieBreakMethod> = result.attempts().iter().map(|a| a.method).collect();
        assert_eq!(methods, vec![TieBreakMethod::Primus, TieBreakMethod::ExpertiseWeighted]);
        assert!(!result.attempts()[0].successful);
        assert!(result.attempts()[1].successful);
    }

    #[test]
    fn test_tie_broken_by_history() {
        let mut team = team_with(vec![
            ScriptedAgent::new("primus", &[])
                .with_response(AgentOutput::vote("B"))
                .with_fallback(AgentOutput::default()),
            ScriptedAgent::new("x", &[]).voting("A"),
            ScriptedAgent::new("y", &[]).voting("B"),
        ]);
        // First vote: B wins 2-1 and enters the history.
        let first = team.vote_on_critical_decision(&task()).unwrap();
        assert_eq!(first.winner(), Some("B"));

        // Second vote: primus abstains, equal levels, history favours B.
        let outcome = team.vote_on_critical_decision(&task()).unwrap();
        let result = &outcome.record().unwrap().result;
        assert_eq!(result.winner(), Some("B"));
        let methods: Vec<TieBreakMethod> = result.attempts().iter().map(|a| a.method).collect();
        assert_eq!(
            methods,
            vec![
                TieBreakMethod::Primus,
                TieBreakMethod::ExpertiseWeighted,
                TieBreakMethod::HistoricalPattern
            ]
        );
    }

    #[test]
    fn test_tie_falls_back_to_consensus() {
        let mut team = team_with(vec![
            ScriptedAgent::new("primus", &[]).with_fallback(AgentOutput::default()),
            ScriptedAgent::new("x", &[]).voting("A"),
            ScriptedAgent::new("y", &[]).voting("B"),
        ]);
        let outcome = team.vote_on_critical_decision(&task()).unwrap();
        match &outcome.record().unwrap().result {
            VoteResult::ConsensusFallback {
                tied_options,
                consensus_result,
                attempts,
            } => {
                assert_eq!(tied_options, &vec!["A".to_string(), "B".to_string()]);
                assert_eq!(consensus_result.method, ConsensusMethod::Consensus);
                let methods: Vec<TieBreakMethod> = attempts.iter().map(|a| a.method).collect();
                assert_eq!(methods, TieBreakMethod::chain().to_vec());
                assert!(attempts[..3].iter().all(|a| !a.successful));
                assert!(attempts[3].successful);
            }
            other => panic!("expected consensus fallback, got {:?}", other),
        }
        assert_eq!(outcome.winner(), None);
    }

    #[test]
    fn test_consensus_vote_augments_split_decision() {
        let mut team = team_with(vec![
            ScriptedAgent::new("a1", &[]).voting("A"),
            ScriptedAgent::new("a2", &[]).voting("B"),
            ScriptedAgent::new("a3", &[]).voting("A"),
        ]);
        let outcome = team.consensus_vote(&task()).unwrap();
        assert_eq!(outcome.vote.winner(), Some("A"));
        assert!(outcome.consensus.is_some());

        let mut unanimous = team_with(vec![
            ScriptedAgent::new("a1", &[]).voting("A"),
            ScriptedAgent::new("a2", &[]).voting("A"),
        ]);
        let outcome = unanimous.consensus_vote(&task()).unwrap();
        assert_eq!(outcome.vote.winner(), Some("A"));
        assert!(outcome.consensus.is_none());
    }

    #[test]
    fn test_decided_vote_is_tracked() {
        let mut team = team_with(vec![ScriptedAgent::new("a1", &[]).voting("A")]);
        team.vote_on_critical_decision(&task()).unwrap();
        assert_eq!(team.decisions().len(), 1);
    }
}
