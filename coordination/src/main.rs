//! `wsde`: drive a WSDE team from a JSON scenario file.
//!
//! A scenario describes the team, the task and any pre-submitted solutions.
//! An agent's `solution` is stored as its proposal; `critiques` and
//! `recommendations` are what it answers when asked to critique or to speak
//! for its discipline.
//!
//! ```text
//! {
//!   "agents":    [{"name": "a1", "expertise": ["security"], "expertise_level": "expert", "vote": "A"}],
//!   "task":      {"id": "db-choice", "type": "critical_decision", "options": [{"id": "A"}]},
//!   "solutions": [{"agent": "a1", "content": "Use Postgres."}],
//!   "knowledge": {"concepts": [], "relationships": []}
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tracing::info;

use wsde_coordination::{
    stakeholder_explanation, AgentOutput, EngineConfig, ExpertiseLevel, InMemoryKnowledgeGraph, Phase, ScriptedAgent,
    Solution, Task, Team,
};

// ── CLI definition ──────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "wsde", version, about = "WSDE team coordination and consensus engine")]
struct Cli {
    /// Engine configuration file (YAML or TOML). Defaults to built-in tables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assign roles and print the role map.
    Roles {
        scenario: PathBuf,
        /// Assign roles for an EDRR phase instead of by task expertise.
        #[arg(long)]
        phase: Option<Phase>,
    },
    /// Hold a vote on the scenario's critical decision.
    Vote { scenario: PathBuf },
    /// Build a consensus from the scenario's solutions.
    Consensus { scenario: PathBuf },
    /// Run dialectical reasoning over the scenario's solutions.
    Dialectic {
        scenario: PathBuf,
        #[arg(long, value_enum, default_value_t = Mode::Enhanced)]
        mode: Mode,
        /// Agent that critiques the thesis in basic mode.
        #[arg(long)]
        critic: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Basic,
    Enhanced,
    Multi,
    Knowledge,
    MultiDisciplinary,
}

// ── Scenario loading ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct AgentSpec {
    name: String,
    #[serde(default)]
    expertise: Vec<String>,
    #[serde(default)]
    expertise_level: ExpertiseLevel,
    #[serde(default)]
    vote: Option<String>,
    #[serde(default)]
    solution: Option<String>,
    #[serde(default)]
    critiques: Vec<String>,
    #[serde(default)]
    recommendations: Vec<String>,
}

impl AgentSpec {
    fn build(&self) -> ScriptedAgent {
        let expertise: Vec<&str> = self.expertise.iter().map(String::as_str).collect();
        ScriptedAgent::new(&self.name, &expertise)
            .with_level(self.expertise_level)
            .with_fallback(AgentOutput {
                vote: self.vote.clone(),
                result: self.solution.clone(),
                critiques: self.critiques.clone(),
                recommendations: self.recommendations.clone(),
                ..AgentOutput::default()
            })
    }
}

#[derive(Debug, Deserialize)]
struct Scenario {
    agents: Vec<AgentSpec>,
    task: serde_json::Value,
    #[serde(default)]
    solutions: Vec<Solution>,
    #[serde(default)]
    knowledge: InMemoryKnowledgeGraph,
}

struct Loaded {
    team: Team,
    task: Task,
    knowledge: InMemoryKnowledgeGraph,
}

fn load(path: &Path, config: Option<&Path>) -> anyhow::Result<Loaded> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading scenario {}", path.display()))?;
    let scenario: Scenario =
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario {}", path.display()))?;

    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("scenario");
    let mut team = match config {
        Some(config_path) => Team::with_config(name, Arc::new(EngineConfig::load_file(config_path)?)),
        None => Team::new(name),
    };

    for spec in &scenario.agents {
        team.add_agent(Box::new(spec.build()))?;
    }

    let task = Task::from_value(scenario.task).context("scenario task is not a valid task object")?;
    for spec in &scenario.agents {
        if let Some(content) = &spec.solution {
            team.add_solution(&task, Solution::new(&spec.name, content));
        }
    }
    for solution in scenario.solutions {
        team.add_solution(&task, solution);
    }

    info!(
        team = %team.name(),
        agents = team.agents().len(),
        solutions = team.solutions_for(&task).len(),
        "Scenario loaded"
    );

    Ok(Loaded {
        team,
        task,
        knowledge: scenario.knowledge,
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// First agent that did not author the latest solution.
fn default_critic(team: &Team, task: &Task) -> Option<String> {
    let author = team.solutions_for(task).last().map(|s| s.agent.clone());
    team.agents()
        .iter()
        .map(|a| a.name().to_string())
        .find(|name| Some(name) != author.as_ref())
}

// ── Entry point ─────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("wsde_coordination=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Roles { scenario, phase } => {
            let Loaded { mut team, task, .. } = load(&scenario, config)?;
            match phase {
                Some(phase) => team.assign_roles_for_phase(phase, &task)?,
                None => team.select_primus_by_expertise(&task)?,
            };
            print_json(&team.get_role_map())?;
        }
        Commands::Vote { scenario } => {
            let Loaded { mut team, task, .. } = load(&scenario, config)?;
            team.select_primus_by_expertise(&task)?;
            let outcome = team.vote_on_critical_decision(&task)?;
            print_json(&outcome)?;
        }
        Commands::Consensus { scenario } => {
            let Loaded { mut team, task, .. } = load(&scenario, config)?;
            let outcome = team.build_consensus(&task);
            print_json(&outcome)?;
            println!();
            println!("{}", stakeholder_explanation(&task, &outcome));
        }
        Commands::Dialectic { scenario, mode, critic } => {
            let Loaded {
                mut team,
                task,
                knowledge,
            } = load(&scenario, config)?;
            let outcome = match mode {
                Mode::Basic => {
                    let Some(critic) = critic.or_else(|| default_critic(&team, &task)) else {
                        bail!("basic mode needs a critic; pass --critic <agent>");
                    };
                    team.apply_dialectical_reasoning(&task, &critic)?
                }
                Mode::Enhanced => team.apply_enhanced_dialectical_reasoning(&task)?,
                Mode::Multi => team.apply_enhanced_dialectical_reasoning_multi(&task)?,
                Mode::Knowledge => team.apply_dialectical_reasoning_with_knowledge_graph(&task, &knowledge)?,
                Mode::MultiDisciplinary => team.apply_multi_disciplinary_dialectical_reasoning(&task)?,
            };
            print_json(&outcome)?;
        }
    }

    Ok(())
}
