//! The team: roster, role state, solution store and voting ledger.
//!
//! A `Team` is a plain single-owner value; all coordination operations take
//! `&mut self`. Share one across threads through [`SharedTeam`], which makes
//! the one-writer-at-a-time rule enforced rather than documented.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::agent::Agent;
use crate::config::{self, EngineConfig};
use crate::decisions::DecisionTracker;
use crate::dialectic::DialecticalResult;
use crate::error::{TeamError, TeamResult};
use crate::expertise::ExpertiseScorer;
use crate::roles::{Phase, Role, RoleAssignment};
use crate::task::Task;
use crate::voting::VoteRecord;

/// Observer invoked after every dialectical reasoning call.
pub type DialecticalHook = Box<dyn Fn(&Task, &[DialecticalResult]) + Send>;

/// Team behind a mutex: one coordination call in flight at a time.
pub type SharedTeam = Arc<Mutex<Team>>;

/// A proposed solution for a task. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    #[serde(default = "new_solution_id")]
    pub id: String,
    /// Name of the proposing agent.
    pub agent: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn new_solution_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Solution {
    pub fn new(agent: &str, content: &str) -> Self {
        Self {
            id: new_solution_id(),
            agent: agent.to_string(),
            content: content.to_string(),
            code: None,
            confidence: 0.0,
            reasoning: String::new(),
            created_at: Utc::now(),
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_reasoning(mut self, reasoning: &str) -> Self {
        self.reasoning = reasoning.to_string();
        self
    }

    /// Text the code heuristics run over: the code when present, else content.
    pub fn code_text(&self) -> &str {
        self.code.as_deref().unwrap_or(&self.content)
    }

    /// Content and code joined, for keyword matching.
    pub fn full_text(&self) -> String {
        match &self.code {
            Some(code) => format!("{}\n{}", self.content, code),
            None => self.content.clone(),
        }
    }
}

/// A WSDE team.
pub struct Team {
    pub(crate) name: String,
    pub(crate) agents: Vec<Box<dyn Agent>>,
    pub(crate) primus_index: usize,
    pub(crate) role_assignments: Option<RoleAssignment>,
    pub(crate) current_phase: Option<Phase>,
    pub(crate) solutions: HashMap<String, Vec<Solution>>,
    pub(crate) voting_history: Vec<VoteRecord>,
    pub(crate) decisions: DecisionTracker,
    pub(crate) hooks: Vec<DialecticalHook>,
    pub(crate) config: Arc<EngineConfig>,
    pub(crate) scorer: ExpertiseScorer,
}

impl std::fmt::Debug for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.agents.iter().map(|a| a.name()).collect();
        f.debug_struct("Team")
            .field("name", &self.name)
            .field("agents", &names)
            .field("primus_index", &self.primus_index)
            .field("role_assignments", &self.role_assignments)
            .field("current_phase", &self.current_phase)
            .field("tasks_with_solutions", &self.solutions.len())
            .field("votes", &self.voting_history.len())
            .finish()
    }
}

impl Team {
    /// Create an empty team using the process-wide config.
    pub fn new(name: &str) -> Self {
        Self::with_config(name, config::global())
    }

    /// Create an empty team with an explicit config.
    pub fn with_config(name: &str, config: Arc<EngineConfig>) -> Self {
        let scorer = ExpertiseScorer::new(&config.documentation_expertise);
        Self {
            name: name.to_string(),
            agents: Vec::new(),
            primus_index: 0,
            role_assignments: None,
            current_phase: None,
            solutions: HashMap::new(),
            voting_history: Vec::new(),
            decisions: DecisionTracker::new(),
            hooks: Vec::new(),
            config,
            scorer,
        }
    }

    /// Wrap in a mutex-guarded handle.
    pub fn shared(self) -> SharedTeam {
        Arc::new(Mutex::new(self))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Add an agent. Names must be unique within the team.
    ///
    /// If roles have already been assigned the newcomer joins as a Worker.
    pub fn add_agent(&mut self, agent: Box<dyn Agent>) -> TeamResult<()> {
        if self.agent_index(agent.name()).is_some() {
            return Err(TeamError::DuplicateAgent(agent.name().to_string()));
        }
        debug!(team = %self.name, agent = agent.name(), "Agent added");
        if let Some(assignment) = self.role_assignments.as_mut() {
            assignment.workers.push(agent.name().to_string());
        }
        self.agents.push(agent);
        Ok(())
    }

    pub fn add_agents(&mut self, agents: Vec<Box<dyn Agent>>) -> TeamResult<()> {
        for agent in agents {
            self.add_agent(agent)?;
        }
        Ok(())
    }

    pub fn agents(&self) -> &[Box<dyn Agent>] {
        &self.agents
    }

    pub fn agent(&self, name: &str) -> Option<&dyn Agent> {
        self.agents.iter().find(|a| a.name() == name).map(|a| &**a)
    }

    pub fn agent_mut(&mut self, name: &str) -> Option<&mut Box<dyn Agent>> {
        self.agents.iter_mut().find(|a| a.name() == name)
    }

    pub(crate) fn agent_index(&self, name: &str) -> Option<usize> {
        self.agents.iter().position(|a| a.name() == name)
    }

    /// Agent at `primus_index`; `None` only for an empty team.
    pub fn get_primus(&self) -> Option<&dyn Agent> {
        self.agents.get(self.primus_index).map(|a| &**a)
    }

    pub fn primus_index(&self) -> usize {
        self.primus_index
    }

    pub fn role_assignments(&self) -> Option<&RoleAssignment> {
        self.role_assignments.as_ref()
    }

    pub fn role_of(&self, name: &str) -> Option<Role> {
        self.role_assignments.as_ref().and_then(|a| a.role_of(name))
    }

    pub fn current_phase(&self) -> Option<Phase> {
        self.current_phase
    }

    /// Append a solution to the task's store. Returns the solution id.
    pub fn add_solution(&mut self, task: &Task, solution: Solution) -> String {
        let task_id = task.task_id();
        let id = solution.id.clone();
        info!(
            team = %self.name,
            task_id = %task_id,
            agent = %solution.agent,
            "Solution added"
        );
        self.solutions.entry(task_id).or_default().push(solution);
        id
    }

    /// Stored solutions for a task id, oldest first.
    pub fn solutions(&self, task_id: &str) -> &[Solution] {
        self.solutions.get(task_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn solutions_for(&self, task: &Task) -> &[Solution] {
        self.solutions(&task.task_id())
    }

    pub fn voting_history(&self) -> &[VoteRecord] {
        &self.voting_history
    }

    pub fn decisions(&self) -> &DecisionTracker {
        &self.decisions
    }

    pub fn decisions_mut(&mut self) -> &mut DecisionTracker {
        &mut self.decisions
    }

    pub fn register_dialectical_hook(&mut self, hook: DialecticalHook) {
        self.hooks.push(hook);
    }

    pub(crate) fn run_hooks(&self, task: &Task, results: &[DialecticalResult]) {
        for hook in &self.hooks {
            hook(task, results);
        }
    }
}
