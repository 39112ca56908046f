//! Role assignment: Primus selection and distribution of the remaining roles.
//!
//! Three entry points, all producing a fresh [`RoleAssignment`] atomically:
//!
//! ```text
//!   assign_roles(None)           Primus = agents[primus_index], keyword match for
//!                                Supervisor → Designer → Evaluator, rest Worker
//!   assign_roles(Some(mapping))  validate membership, apply, rest Worker
//!   select_primus_by_expertise   fairness pool → doc specialists → best score
//!   assign_roles_for_phase       rotate on transition → phase Primus → priority table
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info};

use crate::error::{TeamError, TeamResult};
use crate::expertise::rank_cmp;
use crate::task::{DecisionKind, Task};
use crate::team::Team;

/// Role of an agent within the team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Primus,
    Worker,
    Supervisor,
    Designer,
    Evaluator,
}

impl Role {
    /// Next role in the rotation cycle. Primus is not part of the cycle.
    pub fn rotated(self) -> Role {
        match self {
            Self::Worker => Self::Supervisor,
            Self::Supervisor => Self::Designer,
            Self::Designer => Self::Evaluator,
            Self::Evaluator => Self::Worker,
            Self::Primus => Self::Primus,
        }
    }

    /// Capitalised name used in role maps.
    pub fn title(self) -> &'static str {
        match self {
            Self::Primus => "Primus",
            Self::Worker => "Worker",
            Self::Supervisor => "Supervisor",
            Self::Designer => "Designer",
            Self::Evaluator => "Evaluator",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primus => write!(f, "primus"),
            Self::Worker => write!(f, "worker"),
            Self::Supervisor => write!(f, "supervisor"),
            Self::Designer => write!(f, "designer"),
            Self::Evaluator => write!(f, "evaluator"),
        }
    }
}

/// EDRR phase driving phase-aware assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Expand,
    Differentiate,
    Refine,
    Retrospect,
}

impl Phase {
    pub fn all() -> &'static [Phase] {
        &[Self::Expand, Self::Differentiate, Self::Refine, Self::Retrospect]
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expand => write!(f, "expand"),
            Self::Differentiate => write!(f, "differentiate"),
            Self::Refine => write!(f, "refine"),
            Self::Retrospect => write!(f, "retrospect"),
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expand" => Ok(Self::Expand),
            "differentiate" => Ok(Self::Differentiate),
            "refine" => Ok(Self::Refine),
            "retrospect" | "reflect" => Ok(Self::Retrospect),
            other => Err(format!("unknown phase: {}", other)),
        }
    }
}

/// Complete role assignment, keyed by agent name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub primus: String,
    #[serde(default)]
    pub workers: Vec<String>,
    #[serde(default)]
    pub supervisor: Option<String>,
    #[serde(default)]
    pub designer: Option<String>,
    #[serde(default)]
    pub evaluator: Option<String>,
}

impl RoleAssignment {
    pub fn new(primus: &str) -> Self {
        Self {
            primus: primus.to_string(),
            ..Self::default()
        }
    }

    pub fn with_supervisor(mut self, name: &str) -> Self {
        self.supervisor = Some(name.to_string());
        self
    }

    pub fn with_designer(mut self, name: &str) -> Self {
        self.designer = Some(name.to_string());
        self
    }

    pub fn with_evaluator(mut self, name: &str) -> Self {
        self.evaluator = Some(name.to_string());
        self
    }

    pub fn with_worker(mut self, name: &str) -> Self {
        self.workers.push(name.to_string());
        self
    }

    /// Role held by an agent, if any.
    pub fn role_of(&self, name: &str) -> Option<Role> {
        if self.primus == name {
            Some(Role::Primus)
        } else if self.supervisor.as_deref() == Some(name) {
            Some(Role::Supervisor)
        } else if self.designer.as_deref() == Some(name) {
            Some(Role::Designer)
        } else if self.evaluator.as_deref() == Some(name) {
            Some(Role::Evaluator)
        } else if self.workers.iter().any(|w| w == name) {
            Some(Role::Worker)
        } else {
            None
        }
    }

    /// Every `(agent, role)` pair in the assignment, duplicates included.
    pub fn entries(&self) -> Vec<(&str, Role)> {
        let mut out = vec![(self.primus.as_str(), Role::Primus)];
        if let Some(s) = &self.supervisor {
            out.push((s.as_str(), Role::Supervisor));
        }
        if let Some(d) = &self.designer {
            out.push((d.as_str(), Role::Designer));
        }
        if let Some(e) = &self.evaluator {
            out.push((e.as_str(), Role::Evaluator));
        }
        out.extend(self.workers.iter().map(|w| (w.as_str(), Role::Worker)));
        out
    }

    fn set(&mut self, role: Role, name: &str) {
        match role {
            Role::Primus => self.primus = name.to_string(),
            Role::Supervisor => self.supervisor = Some(name.to_string()),
            Role::Designer => self.designer = Some(name.to_string()),
            Role::Evaluator => self.evaluator = Some(name.to_string()),
            Role::Worker => self.workers.push(name.to_string()),
        }
    }
}

impl Team {
    /// Assign roles automatically, or apply an explicit mapping.
    ///
    /// An explicit mapping must only reference team members and must give
    /// each agent at most one role; members it omits become Workers.
    pub fn assign_roles(&mut self, mapping: Option<RoleAssignment>) -> TeamResult<&RoleAssignment> {
        if self.agents.is_empty() {
            return Err(TeamError::NoAgents);
        }

        let assignment = match mapping {
            Some(mapping) => self.validated_mapping(mapping)?,
            None => self.auto_assignment(),
        };

        info!(
            team = %self.name,
            primus = %assignment.primus,
            workers = assignment.workers.len(),
            "Roles assigned"
        );
        Ok(&*self.role_assignments.insert(assignment))
    }

    fn validated_mapping(&mut self, mut mapping: RoleAssignment) -> TeamResult<RoleAssignment> {
        let mut seen = HashSet::new();
        for (name, _) in mapping.entries() {
            if self.agent_index(name).is_none() {
                return Err(TeamError::InvalidRoleMapping {
                    agent: name.to_string(),
                });
            }
            if !seen.insert(name.to_string()) {
                return Err(TeamError::DuplicateRole {
                    agent: name.to_string(),
                });
            }
        }

        for agent in &self.agents {
            if !seen.contains(agent.name()) {
                mapping.workers.push(agent.name().to_string());
            }
        }
        if let Some(idx) = self.agent_index(&mapping.primus) {
            self.primus_index = idx;
        }
        Ok(mapping)
    }

    fn auto_assignment(&self) -> RoleAssignment {
        let primus = self.agents[self.primus_index].name().to_string();
        let mut assignment = RoleAssignment::new(&primus);
        let mut pool: Vec<usize> = (0..self.agents.len()).filter(|&i| i != self.primus_index).collect();

        for role in [Role::Supervisor, Role::Designer, Role::Evaluator] {
            let keywords = self.config.role_keywords.for_role(role);
            let mut best: Option<(usize, usize)> = None;
            for (pos, &idx) in pool.iter().enumerate() {
                let matches = keyword_matches(self.agents[idx].expertise(), keywords);
                if best.map_or(true, |(_, m)| matches > m) {
                    best = Some((pos, matches));
                }
            }
            if let Some((pos, matches)) = best {
                let idx = pool.remove(pos);
                debug!(role = %role, agent = self.agents[idx].name(), matches, "Role filled");
                assignment.set(role, self.agents[idx].name());
            }
        }

        for idx in pool {
            assignment.workers.push(self.agents[idx].name().to_string());
        }
        assignment
    }

    /// Pick the Primus by expertise, rotating fairly through the roster.
    pub fn select_primus_by_expertise(&mut self, task: &Task) -> TeamResult<&RoleAssignment> {
        if self.agents.is_empty() {
            return Err(TeamError::NoAgents);
        }

        let mut candidates: Vec<usize> = (0..self.agents.len())
            .filter(|&i| !self.agents[i].has_been_primus())
            .collect();
        if candidates.is_empty() {
            info!(team = %self.name, "All agents have served as Primus; resetting rotation");
            for agent in self.agents.iter_mut() {
                agent.set_has_been_primus(false);
            }
            candidates = (0..self.agents.len()).collect();
        }

        if task.is_kind(&DecisionKind::Documentation) {
            let specialists: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&i| self.scorer.is_documentation_specialist(self.agents[i].expertise()))
                .collect();
            if !specialists.is_empty() {
                candidates = specialists;
            }
        }

        let context = task.flatten();
        let mut best = candidates[0];
        let mut best_score = self.scorer.score(self.agents[best].expertise(), &context);
        for &idx in &candidates[1..] {
            let score = self.scorer.score(self.agents[idx].expertise(), &context);
            if rank_cmp(score, best_score) == std::cmp::Ordering::Greater {
                best = idx;
                best_score = score;
            }
        }

        info!(
            team = %self.name,
            primus = self.agents[best].name(),
            score = best_score,
            "Primus selected by expertise"
        );
        self.agents[best].set_has_been_primus(true);
        self.primus_index = best;
        self.assign_roles(None)
    }

    /// Advance the Primus to the next agent and reassign the rest.
    pub fn rotate_primus(&mut self) -> TeamResult<&RoleAssignment> {
        if self.agents.is_empty() {
            return Err(TeamError::NoAgents);
        }
        self.primus_index = (self.primus_index + 1) % self.agents.len();
        self.assign_roles(None)
    }

    /// Phase-aware assignment driven by the phase keyword and priority tables.
    pub fn assign_roles_for_phase(&mut self, phase: Phase, task: &Task) -> TeamResult<&RoleAssignment> {
        if self.agents.is_empty() {
            return Err(TeamError::NoAgents);
        }

        // A phase change rotates every role one step before the new phase
        // re-selects; the rotated holders keep their seats on equal scores.
        let transition = self.current_phase.is_some_and(|prev| prev != phase);
        let preferred = if transition {
            let rotated = self.rotated_assignment();
            self.primus_index = (self.primus_index + 1) % self.agents.len();
            info!(
                team = %self.name,
                from = ?self.current_phase,
                to = %phase,
                primus = %rotated.primus,
                "Phase transition; rotating roles"
            );
            self.role_assignments = Some(rotated.clone());
            Some(rotated)
        } else {
            None
        };

        let profile = self.config.phases.profile(phase).clone();
        let context = task.flatten();
        let n = self.agents.len();

        // Roster order starting from the current (possibly rotated) Primus.
        let order: Vec<usize> = (0..n).map(|k| (self.primus_index + k) % n).collect();

        let mut primus = order[0];
        let mut primus_score = self.phase_score(primus, &context, &profile.keywords);
        for &idx in &order[1..] {
            let score = self.phase_score(idx, &context, &profile.keywords);
            if rank_cmp(score, primus_score) == std::cmp::Ordering::Greater {
                primus = idx;
                primus_score = score;
            }
        }

        let mut assignment = RoleAssignment::new(self.agents[primus].name());
        let mut unassigned: Vec<usize> = order.iter().copied().filter(|&i| i != primus).collect();

        for &role in &profile.role_priority {
            if role == Role::Primus || unassigned.is_empty() {
                continue;
            }
            let mut role_context = context.clone();
            role_context.insert("role".to_string(), role.to_string());
            let mut keywords = profile.keywords.clone();
            keywords.extend(self.config.role_keywords.for_role(role).iter().cloned());

            let holder = preferred.as_ref().and_then(|p| match role {
                Role::Supervisor => p.supervisor.clone(),
                Role::Designer => p.designer.clone(),
                Role::Evaluator => p.evaluator.clone(),
                Role::Worker => p.workers.first().cloned(),
                Role::Primus => None,
            });
            let first = holder
                .as_deref()
                .and_then(|name| unassigned.iter().position(|&i| self.agents[i].name() == name))
                .unwrap_or(0);

            let mut best_pos = first;
            let mut best_score = self.phase_score(unassigned[first], &role_context, &keywords);
            for (pos, &idx) in unassigned.iter().enumerate() {
                if pos == first {
                    continue;
                }
                let score = self.phase_score(idx, &role_context, &keywords);
                if rank_cmp(score, best_score) == std::cmp::Ordering::Greater {
                    best_pos = pos;
                    best_score = score;
                }
            }
            let idx = unassigned.remove(best_pos);
            assignment.set(role, self.agents[idx].name());
        }

        for idx in unassigned {
            assignment.workers.push(self.agents[idx].name().to_string());
        }

        self.agents[primus].set_has_been_primus(true);
        self.primus_index = primus;
        self.current_phase = Some(phase);
        info!(
            team = %self.name,
            phase = %phase,
            primus = %assignment.primus,
            score = primus_score,
            "Roles assigned for phase"
        );
        Ok(&*self.role_assignments.insert(assignment))
    }

    fn phase_score(&self, idx: usize, context: &BTreeMap<String, String>, keywords: &[String]) -> f64 {
        self.scorer.phase_score(self.agents[idx].expertise(), context, keywords)
    }

    /// Current assignment rotated one step: Primus moves to the next agent,
    /// every other role shifts along the Worker → Supervisor → Designer →
    /// Evaluator cycle.
    fn rotated_assignment(&self) -> RoleAssignment {
        let n = self.agents.len();
        let next_primus = (self.primus_index + 1) % n;
        let mut rotated = RoleAssignment::new(self.agents[next_primus].name());

        let Some(current) = self.role_assignments.as_ref() else {
            return rotated;
        };
        for (name, role) in current.entries() {
            if name == rotated.primus {
                continue;
            }
            let next = if role == Role::Primus { Role::Worker } else { role.rotated() };
            match next {
                Role::Worker => rotated.workers.push(name.to_string()),
                other => {
                    if rotated.role_of_slot(other).is_none() {
                        rotated.set(other, name);
                    } else {
                        rotated.workers.push(name.to_string());
                    }
                }
            }
        }
        rotated
    }

    /// Agent name → role for the current assignment.
    pub fn get_role_map(&self) -> BTreeMap<String, Role> {
        let mut map = BTreeMap::new();
        if let Some(assignment) = &self.role_assignments {
            for (name, role) in assignment.entries() {
                map.insert(name.to_string(), role);
            }
        }
        map
    }
}

impl RoleAssignment {
    fn role_of_slot(&self, role: Role) -> Option<&str> {
        match role {
            Role::Primus => Some(self.primus.as_str()),
            Role::Supervisor => self.supervisor.as_deref(),
            Role::Designer => self.designer.as_deref(),
            Role::Evaluator => self.evaluator.as_deref(),
            Role::Worker => self.workers.first().map(String::as_str),
        }
    }
}

/// Number of role keywords found inside any expertise term.
fn keyword_matches(expertise: &[String], keywords: &[String]) -> usize {
    let terms: Vec<String> = expertise.iter().map(|e| e.to_lowercase()).collect();
    keywords
        .iter()
        .filter(|k| {
            let k = k.to_lowercase();
            terms.iter().any(|t| t.contains(k.as_str()))
        })
        .count()
}
