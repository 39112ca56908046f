//! Critical-decision voting end to end: majority and weighted tallies, each
//! stage of the tie-break chain, the consensus augmentation, and weights
//! loaded from a config file.

use std::io::Write;
use std::sync::Arc;

use wsde_coordination::config::ConfigErrorKind;
use wsde_coordination::{
    AgentOutput, ConsensusMethod, DecisionMethod, DecisionQuery, EngineConfig, ExpertiseLevel, ScriptedAgent,
    Solution, Task, Team, TeamError, TieBreakMethod, VoteOutcome, VoteResult,
};

fn team_with(agents: Vec<ScriptedAgent>) -> Team {
    let mut team = Team::new("voters");
    for agent in agents {
        team.add_agent(Box::new(agent)).unwrap();
    }
    team
}

fn decision() -> Task {
    Task::critical_decision("decide", &["A", "B"])
}

fn attempt_methods(result: &VoteResult) -> Vec<TieBreakMethod> {
    result.attempts().iter().map(|a| a.method).collect()
}

// ── Untied votes ───────────────────────────────────────────────────

#[test]
fn test_majority_two_to_one() {
    let mut team = team_with(vec![
        ScriptedAgent::new("a1", &[]).voting("A"),
        ScriptedAgent::new("a2", &[]).voting("A"),
        ScriptedAgent::new("a3", &[]).voting("B"),
    ]);

    let outcome = team.vote_on_critical_decision(&decision()).unwrap();
    assert!(outcome.voting_initiated());
    assert_eq!(outcome.winner(), Some("A"));

    let record = outcome.record().unwrap();
    match &record.result {
        VoteResult::Majority { vote_counts, .. } => {
            assert_eq!(vote_counts["A"], 2);
            assert_eq!(vote_counts["B"], 1);
        }
        other => panic!("expected majority, got {:?}", other),
    }
    assert!(record.result.attempts().is_empty());
    assert!(!record.is_unanimous());

    assert_eq!(team.voting_history().len(), 1);
    let tracked = team.decisions().query(&DecisionQuery::for_task("decide"));
    assert_eq!(tracked.len(), 1);
    assert_eq!(tracked[0].method, DecisionMethod::MajorityVote);
}

#[test]
fn test_domain_votes_are_weighted_by_expertise() {
    let mut team = team_with(vec![
        ScriptedAgent::new("sec", &["security"])
            .with_level(ExpertiseLevel::Expert)
            .voting("B"),
        ScriptedAgent::new("n1", &[]).voting("A"),
        ScriptedAgent::new("n2", &[]).voting("A"),
    ]);
    let task = decision().with_domain("security");

    let outcome = team.vote_on_critical_decision(&task).unwrap();
    assert_eq!(outcome.winner(), Some("B"));
    match &outcome.record().unwrap().result {
        VoteResult::Weighted { weighted_votes, .. } => {
            assert!((weighted_votes["B"] - 3.0).abs() < 1e-9);
            assert!((weighted_votes["A"] - 1.0).abs() < 1e-9);
        }
        other => panic!("expected weighted, got {:?}", other),
    }
}

#[test]
fn test_raising_expertise_never_lowers_weight() {
    let mut previous = 0.0;
    for &level in ExpertiseLevel::all() {
        let mut team = team_with(vec![
            ScriptedAgent::new("sec", &["security"]).with_level(level).voting("B"),
            ScriptedAgent::new("outsider", &[]).voting("A"),
        ]);
        let outcome = team
            .vote_on_critical_decision(&decision().with_domain("security"))
            .unwrap();
        let VoteResult::Weighted { weighted_votes, .. } = &outcome.record().unwrap().result else {
            panic!("expected weighted result at level {}", level);
        };
        assert!(weighted_votes["B"] > previous, "level {}", level);
        previous = weighted_votes["B"];
    }
}

#[test]
fn test_unknown_and_missing_votes_are_skipped() {
    let mut team = team_with(vec![
        ScriptedAgent::new("stray", &[]).voting("Z"),
        ScriptedAgent::new("silent", &[]).with_fallback(AgentOutput::default()),
        ScriptedAgent::new("broken", &[]).failing(),
        ScriptedAgent::new("voter", &[]).voting("B"),
    ]);

    let outcome = team.vote_on_critical_decision(&decision()).unwrap();
    let record = outcome.record().unwrap();
    assert_eq!(record.votes.len(), 1);
    assert_eq!(record.votes["voter"], "B");
    assert_eq!(outcome.winner(), Some("B"));
}

#[test]
fn test_no_usable_votes_ties_every_option_and_is_recorded() {
    let mut team = team_with(vec![ScriptedAgent::new("stray", &[]).voting("Z")]);
    let outcome = team.vote_on_critical_decision(&decision()).unwrap();
    assert!(matches!(outcome, VoteOutcome::Decided(_)));
    assert_eq!(outcome.winner(), None);

    let record = outcome.record().unwrap();
    assert!(record.votes.is_empty());
    assert_eq!(attempt_methods(&record.result), TieBreakMethod::chain().to_vec());
    let VoteResult::ConsensusFallback { tied_options, .. } = &record.result else {
        panic!("expected consensus fallback");
    };
    assert_eq!(tied_options, &vec!["A".to_string(), "B".to_string()]);
    assert_eq!(team.voting_history().len(), 1);
}

#[test]
fn test_weighted_tally_reports_unvoted_options() {
    let mut team = team_with(vec![ScriptedAgent::new("dba", &["database"]).voting("A")]);
    let task = Task::critical_decision("decide", &["A", "B", "C"]).with_domain("database");

    let outcome = team.vote_on_critical_decision(&task).unwrap();
    match &outcome.record().unwrap().result {
        VoteResult::Weighted { winner, weighted_votes } => {
            assert_eq!(winner, "A");
            assert_eq!(weighted_votes.len(), 3);
            assert_eq!(weighted_votes["B"], 0.0);
            assert_eq!(weighted_votes["C"], 0.0);
        }
        other => panic!("expected weighted, got {:?}", other),
    }
}

#[test]
fn test_empty_team_errors_before_eligibility() {
    let mut team = Team::new("empty");
    assert!(matches!(
        team.vote_on_critical_decision(&Task::new("plain")),
        Err(TeamError::NoAgents)
    ));
}

// ── Tie-break chain ────────────────────────────────────────────────

#[test]
fn test_primus_breaks_one_to_one_tie() {
    let mut team = team_with(vec![
        ScriptedAgent::new("a1", &[]).voting("A"),
        ScriptedAgent::new("a2", &[]).voting("B"),
    ]);
    team.assign_roles(None).unwrap();

    let outcome = team.vote_on_critical_decision(&decision()).unwrap();
    let result = &outcome.record().unwrap().result;
    match result {
        VoteResult::TieBroken {
            winner, fallback_stage, ..
        } => {
            assert_eq!(winner, "A");
            assert_eq!(*fallback_stage, TieBreakMethod::Primus);
        }
        other => panic!("expected tie broken, got {:?}", other),
    }
    assert_eq!(attempt_methods(result), vec![TieBreakMethod::Primus]);
    assert!(result.attempts()[0].successful);
}

#[test]
fn test_expertise_breaks_tie_when_primus_abstains() {
    let mut team = team_with(vec![
        ScriptedAgent::new("a1", &[]).failing(),
        ScriptedAgent::new("a2", &[]).with_level(ExpertiseLevel::Expert).voting("A"),
        ScriptedAgent::new("a3", &[]).voting("B"),
    ]);

    let outcome = team.vote_on_critical_decision(&decision()).unwrap();
    let result = &outcome.record().unwrap().result;
    assert_eq!(outcome.winner(), Some("A"));
    assert_eq!(
        attempt_methods(result),
        vec![TieBreakMethod::Primus, TieBreakMethod::ExpertiseWeighted]
    );
    assert!(!result.attempts()[0].successful);
    assert!(result.attempts()[1].successful);
}

#[test]
fn test_strongest_advocate_breaks_domain_weighted_tie() {
    // Weighted totals tie at 3.0 (expert vs novice + intermediate); the expert
    // is the strongest single advocate.
    let mut team = team_with(vec![
        ScriptedAgent::new("primus", &["security"]).failing(),
        ScriptedAgent::new("lead", &["security"]).with_level(ExpertiseLevel::Expert).voting("A"),
        ScriptedAgent::new("junior", &["security"]).voting("B"),
        ScriptedAgent::new("mid", &["security"]).with_level(ExpertiseLevel::Intermediate).voting("B"),
    ]);
    let task = decision().with_domain("security");

    let outcome = team.vote_on_critical_decision(&task).unwrap();
    let result = &outcome.record().unwrap().result;
    match result {
        VoteResult::TieBroken {
            winner, fallback_stage, ..
        } => {
            assert_eq!(winner, "A");
            assert_eq!(*fallback_stage, TieBreakMethod::ExpertiseWeighted);
        }
        other => panic!("expected tie broken, got {:?}", other),
    }
    assert_eq!(
        attempt_methods(result),
        vec![TieBreakMethod::Primus, TieBreakMethod::ExpertiseWeighted]
    );
}

#[test]
fn test_history_breaks_tie_after_expertise_fails() {
    let mut team = team_with(vec![
        // Votes once, then has nothing more to say.
        ScriptedAgent::new("a1", &[]).with_response(AgentOutput::vote("A")),
        ScriptedAgent::new("a2", &[]).voting("A"),
        ScriptedAgent::new("a3", &[]).with_response(AgentOutput::vote("A")).voting("B"),
    ]);
    let task = decision();

    let first = team.vote_on_critical_decision(&task).unwrap();
    assert_eq!(first.winner(), Some("A"));
    assert!(first.record().unwrap().is_unanimous());

    let second = team.vote_on_critical_decision(&task).unwrap();
    let result = &second.record().unwrap().result;
    assert_eq!(second.winner(), Some("A"));
    assert_eq!(
        attempt_methods(result),
        vec![
            TieBreakMethod::Primus,
            TieBreakMethod::ExpertiseWeighted,
            TieBreakMethod::HistoricalPattern,
        ]
    );
    assert_eq!(team.voting_history().len(), 2);
}

#[test]
fn test_consensus_fallback_runs_full_chain() {
    let mut team = team_with(vec![
        ScriptedAgent::new("a1", &[]).failing(),
        ScriptedAgent::new("a2", &[]).voting("A"),
        ScriptedAgent::new("a3", &[]).voting("B"),
    ]);
    let task = decision();
    team.add_solution(&task, Solution::new("a2", "Adopt option A for its simpler operations."));
    team.add_solution(&task, Solution::new("a3", "Adopt option B for its stronger isolation."));

    let outcome = team.vote_on_critical_decision(&task).unwrap();
    let record = outcome.record().unwrap();
    assert_eq!(outcome.winner(), None);
    assert_eq!(attempt_methods(&record.result), TieBreakMethod::chain().to_vec());

    match &record.result {
        VoteResult::ConsensusFallback {
            tied_options,
            consensus_result,
            ..
        } => {
            assert_eq!(tied_options, &vec!["A".to_string(), "B".to_string()]);
            assert_eq!(consensus_result.method, ConsensusMethod::ConsensusSynthesis);
            assert!(consensus_result.reasoning.contains("resolves tie between A, B"));
        }
        other => panic!("expected consensus fallback, got {:?}", other),
    }

    let tracked = team
        .decisions()
        .query(&DecisionQuery::for_task("decide").with_method(DecisionMethod::ConsensusFallback));
    assert_eq!(tracked.len(), 1);
}

#[test]
fn test_consensus_fallback_without_solutions_is_empty() {
    let mut team = team_with(vec![
        ScriptedAgent::new("a1", &[]).failing(),
        ScriptedAgent::new("a2", &[]).voting("A"),
        ScriptedAgent::new("a3", &[]).voting("B"),
    ]);

    let outcome = team.vote_on_critical_decision(&decision()).unwrap();
    let VoteResult::ConsensusFallback { consensus_result, .. } = &outcome.record().unwrap().result else {
        panic!("expected consensus fallback");
    };
    assert!(consensus_result.is_empty());
}

// ── Consensus augmentation ─────────────────────────────────────────

#[test]
fn test_consensus_vote_only_augments_split_votes() {
    let mut split = team_with(vec![
        ScriptedAgent::new("a1", &[]).voting("A"),
        ScriptedAgent::new("a2", &[]).voting("A"),
        ScriptedAgent::new("a3", &[]).voting("B"),
    ]);
    let outcome = split.consensus_vote(&decision()).unwrap();
    assert_eq!(outcome.vote.winner(), Some("A"));
    assert!(outcome.consensus.is_some());

    let mut unanimous = team_with(vec![
        ScriptedAgent::new("a1", &[]).voting("A"),
        ScriptedAgent::new("a2", &[]).voting("A"),
    ]);
    let outcome = unanimous.consensus_vote(&decision()).unwrap();
    assert!(outcome.consensus.is_none());
}

// ── Configured weights ─────────────────────────────────────────────

#[test]
fn test_vote_weights_from_yaml_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "vote_weights:\n  expert: 10.0").unwrap();
    let config = EngineConfig::load_file(file.path()).unwrap();
    assert!((config.vote_weights.expert - 10.0).abs() < 1e-9);
    assert!((config.vote_weights.novice - 1.0).abs() < 1e-9);

    let agents = || {
        vec![
            ScriptedAgent::new("lead", &["security"])
                .with_level(ExpertiseLevel::Expert)
                .voting("B"),
            ScriptedAgent::new("n1", &["security"]).voting("A"),
            ScriptedAgent::new("n2", &["security"]).voting("A"),
            ScriptedAgent::new("n3", &["security"]).voting("A"),
        ]
    };
    let task = decision().with_domain("security");

    // Default weights: 3.0 against 3 × 1.0 is a tie.
    let mut default_team = team_with(agents());
    let outcome = default_team.vote_on_critical_decision(&task).unwrap();
    assert!(!outcome.record().unwrap().result.attempts().is_empty());

    let mut configured = Team::with_config("configured", Arc::new(config));
    for agent in agents() {
        configured.add_agent(Box::new(agent)).unwrap();
    }
    let outcome = configured.vote_on_critical_decision(&task).unwrap();
    assert!(matches!(outcome.record().unwrap().result, VoteResult::Weighted { .. }));
    assert_eq!(outcome.winner(), Some("B"));
}

#[test]
fn test_config_file_with_unknown_extension_is_rejected() {
    let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
    let err = EngineConfig::load_file(file.path()).unwrap_err();
    assert_eq!(err.kind, ConfigErrorKind::UnsupportedFormat);
    assert!(err.to_string().contains("unsupported_format"));
}
