//! Consensus building and dialectical reasoning driven through `Team`, the
//! way a coordinator would chain them for one task.

use std::sync::{Arc, Mutex};

use wsde_coordination::dialectic::{DialecticalBody, Transformation};
use wsde_coordination::dialectic::multi::MIN_ELEMENTS;
use wsde_coordination::{
    stakeholder_explanation, AgentOutput, ConsensusMethod, DecisionMethod, DialecticalOutcome, DialecticalResult,
    KnowledgeGraph, ReasoningMode, ScriptedAgent, Solution, Task, Team, TeamError,
};

fn team() -> Team {
    let mut team = Team::new("wsde");
    team.add_agent(Box::new(ScriptedAgent::new("dev", &["python"]))).unwrap();
    team.add_agent(Box::new(ScriptedAgent::new("ops", &["deployment"]))).unwrap();
    team.add_agent(Box::new(
        ScriptedAgent::new("critic", &["review"]).with_fallback(AgentOutput::critiques(&[
            "The hardcoded password is a critical vulnerability",
            "Missing error handling around the login call",
        ])),
    ))
    .unwrap();
    team
}

fn insecure_login() -> Solution {
    Solution::new("dev", "Login handler. It must check the password before granting access.")
        .with_code("password = \"hunter2\"\nlogin(user, password)")
}

// ── Consensus ──────────────────────────────────────────────────────

#[test]
fn test_consensus_without_solutions_is_the_empty_sentinel() {
    let mut team = team();
    let task = Task::new("nothing-yet");

    let outcome = team.build_consensus(&task);
    assert!(outcome.is_empty());
    assert_eq!(outcome.reasoning, "No solutions available");
    assert!(team.decisions().is_empty());

    let explanation = stakeholder_explanation(&task, &outcome);
    assert!(explanation.contains("no decision was made"));
}

#[test]
fn test_single_solution_consensus_is_idempotent() {
    let mut team = team();
    let task = Task::new("cache").with_description("Choose a cache");
    team.add_solution(&task, Solution::new("ops", "Use Redis. Keep the TTL short."));

    let first = team.build_consensus(&task);
    let second = team.build_consensus(&task);
    assert_eq!(first.method, ConsensusMethod::SingleSolution);
    assert_eq!(first.consensus, "Use Redis. Keep the TTL short.");
    assert_eq!(first.consensus, second.consensus);
    assert_eq!(first.contributors, second.contributors);

    let explanation = stakeholder_explanation(&task, &first);
    assert!(explanation.starts_with("Decision summary for 'Choose a cache'"));
    assert!(explanation.contains("A single proposal from ops"));
}

#[test]
fn test_competing_solutions_are_merged() {
    let mut team = team();
    let task = Task::new("storage").with_requirements(&["backups"]);
    team.add_solution(&task, Solution::new("dev", "Use Postgres with nightly backups."));
    team.add_solution(&task, Solution::new("ops", "Use SQLite on a replicated volume."));

    let outcome = team.build_consensus(&task);
    assert_eq!(outcome.method, ConsensusMethod::ConsensusSynthesis);
    assert_eq!(outcome.contributors, vec!["dev", "ops"]);
    assert!(outcome.quality.is_some());

    let decisions: Vec<_> = team.decisions().iter().collect();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].method, DecisionMethod::ConsensusSynthesis);

    let explanation = stakeholder_explanation(&task, &outcome);
    assert!(explanation.contains("After comparing 2 proposals"));
    assert!(explanation.ends_with("Next steps: implement the decision and monitor outcomes."));
}

// ── Dialectical reasoning ──────────────────────────────────────────

#[test]
fn test_basic_reasoning_follows_the_critic() {
    let mut team = team();
    let task = Task::new("login");
    team.add_solution(&task, insecure_login());

    let outcome = team.apply_dialectical_reasoning(&task, "critic").unwrap();
    let result = outcome.result().unwrap();
    assert_eq!(result.mode(), ReasoningMode::Basic);
    assert_eq!(result.task_id, "login");

    let DialecticalBody::Basic { synthesis, .. } = &result.body else {
        panic!("expected basic body");
    };
    let code = synthesis.code.as_deref().unwrap();
    assert!(code.contains("os.environ.get(\"PASSWORD\")"));
    assert!(!code.contains("hunter2"));
    assert!(synthesis.applied.contains(&Transformation::CredentialRemoval));
    assert!(synthesis.applied.contains(&Transformation::ErrorHandling));
}

#[test]
fn test_basic_reasoning_rejects_unknown_critic() {
    let mut team = team();
    let err = team
        .apply_dialectical_reasoning(&Task::new("login"), "nobody")
        .unwrap_err();
    assert!(matches!(err, TeamError::UnknownAgent(ref name) if name == "nobody"));
}

#[test]
fn test_every_mode_reports_missing_solution_and_runs_hooks() {
    struct NoKnowledge;
    impl KnowledgeGraph for NoKnowledge {}

    let mut team = team();
    let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    team.register_dialectical_hook(Box::new(move |_task: &Task, results: &[DialecticalResult]| {
        sink.lock().unwrap().push(results.len());
    }));

    let task = Task::new("empty");
    let outcomes = vec![
        team.apply_dialectical_reasoning(&task, "critic").unwrap(),
        team.apply_enhanced_dialectical_reasoning(&task).unwrap(),
        team.apply_enhanced_dialectical_reasoning_multi(&task).unwrap(),
        team.apply_dialectical_reasoning_with_knowledge_graph(&task, &NoKnowledge)
            .unwrap(),
        team.apply_multi_disciplinary_dialectical_reasoning(&task).unwrap(),
    ];
    for outcome in &outcomes {
        assert!(matches!(outcome, DialecticalOutcome::NoSolution { task_id } if task_id == "empty"));
    }
    assert_eq!(*seen.lock().unwrap(), vec![0; 5]);
}

#[test]
fn test_multi_solution_synthesis_has_enough_elements() {
    let mut team = team();
    let task = Task::new("queue");
    team.add_solution(&task, Solution::new("dev", "Use a queue."));
    team.add_solution(&task, Solution::new("ops", "Use a log."));

    let outcome = team.apply_enhanced_dialectical_reasoning_multi(&task).unwrap();
    let DialecticalBody::MultiSolution { synthesis, theses, .. } = &outcome.result().unwrap().body else {
        panic!("expected multi-solution body");
    };
    assert_eq!(theses.len(), 2);
    assert!(synthesis.elements.len() >= MIN_ELEMENTS);
    assert!(synthesis.content.starts_with("# Combined solution"));
}

#[test]
fn test_multi_disciplinary_resolves_known_conflict() {
    let mut team = Team::new("cross");
    team.add_agent(Box::new(ScriptedAgent::new("dev", &["python"]))).unwrap();
    team.add_agent(Box::new(
        ScriptedAgent::new("sec", &["security"]).with_fallback(
            AgentOutput::default().with_recommendations(&["Use encryption for every stored record"]),
        ),
    ))
    .unwrap();
    team.add_agent(Box::new(
        ScriptedAgent::new("perf", &["performance"]).with_fallback(
            AgentOutput::default().with_recommendations(&["Apply optimization to the hot read path"]),
        ),
    ))
    .unwrap();

    let task = Task::new("records");
    team.add_solution(&task, Solution::new("dev", "Store records in a table."));

    let outcome = team.apply_multi_disciplinary_dialectical_reasoning(&task).unwrap();
    let result = outcome.result().unwrap();
    assert_eq!(result.mode(), ReasoningMode::MultiDisciplinary);

    let DialecticalBody::MultiDisciplinary {
        perspectives,
        conflicts,
        synthesis,
        ..
    } = &result.body
    else {
        panic!("expected multi-disciplinary body");
    };
    assert_eq!(perspectives.len(), 2);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].topic, "protection overhead");
    assert_eq!(synthesis.resolutions.len(), 1);
    assert!(result.body.synthesis_content().contains("## Conflict resolutions"));
}

#[test]
fn test_outcome_json_is_tagged() {
    let mut team = team();
    let task = Task::new("login");
    team.add_solution(&task, insecure_login());

    let outcome = team.apply_enhanced_dialectical_reasoning(&task).unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["mode"], "enhanced");
    assert_eq!(json["transitions"].as_array().map(Vec::len), Some(3));
}
