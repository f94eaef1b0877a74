//! Scenario runner
//!
//! A scenario is a TOML file declaring actors and an ordered list of steps.
//! Each step issues one request through the [`SessionService`] as a named
//! actor and may state the outcome it expects. Sessions are referred to by a
//! label assigned when they are created.
//!
//! ```toml
//! [[actors]]
//! name = "host"
//! roles = ["admin"]
//!
//! [[steps]]
//! actor = "host"
//! op = "create"
//! name = "A"
//! max_players = 2
//! label = "game"
//!
//! [[steps]]
//! actors = ["p1", "p2", "p3"]   # issued concurrently
//! op = "join"
//! session = "game"
//! expect_successes = 2
//! ```

use anyhow::{anyhow, bail, Context, Result};
use arena_core::{Actor, ArenaError, PlayerId, Role, Score, SessionId, SessionStore};
use arena_effects::StaticIdentity;
use arena_registry::{SessionRequest, SessionResponse, SessionService};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Parsed scenario file
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Declared actors
    #[serde(default)]
    pub actors: Vec<ActorSpec>,
    /// Steps in execution order
    pub steps: Vec<Step>,
}

/// An actor available to steps
#[derive(Debug, Clone, Deserialize)]
pub struct ActorSpec {
    /// Name used by steps
    pub name: String,
    /// Granted roles
    #[serde(default = "default_roles")]
    pub roles: Vec<Role>,
}

fn default_roles() -> Vec<Role> {
    vec![Role::User]
}

/// One request issued by one or more actors
#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    /// Single issuing actor
    #[serde(default)]
    pub actor: Option<String>,
    /// Actors issuing the same request concurrently
    #[serde(default)]
    pub actors: Vec<String>,
    /// The request
    #[serde(flatten)]
    pub request: StepRequest,
    /// Label bound to the created session
    #[serde(default)]
    pub label: Option<String>,
    /// `ok` or an error kind such as `session_full`
    #[serde(default)]
    pub expect: Option<String>,
    /// For concurrent steps: how many requests must succeed
    #[serde(default)]
    pub expect_successes: Option<usize>,
}

/// Request shape inside a scenario, with sessions named by label
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepRequest {
    /// Create a session
    Create {
        /// Display name
        name: String,
        /// Capacity
        max_players: u32,
        /// Seed the caller as the first player
        #[serde(default)]
        join_as_first_player: bool,
    },
    /// Join a session
    Join {
        /// Session label
        session: String,
    },
    /// Start a session
    Start {
        /// Session label
        session: String,
    },
    /// End a session
    End {
        /// Session label
        session: String,
        /// Final score
        score: i64,
    },
    /// List sessions
    List {
        /// State filter
        #[serde(default)]
        state: Option<String>,
    },
    /// Read a session
    Get {
        /// Session label
        session: String,
    },
}

impl StepRequest {
    fn op(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Join { .. } => "join",
            Self::Start { .. } => "start",
            Self::End { .. } => "end",
            Self::List { .. } => "list",
            Self::Get { .. } => "get",
        }
    }
}

/// What happened for one issued request
#[derive(Debug, Clone, Serialize)]
pub struct StepOutcome {
    /// Step index, from 1
    pub step: usize,
    /// Issuing actor
    pub actor: String,
    /// Operation name
    pub op: &'static str,
    /// Response message or error text
    pub message: String,
    /// Error kind, if the request failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Response payload, if the request succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<SessionResponse>,
    /// Whether the outcome met the step's expectation
    pub as_expected: bool,
}

/// Result of running a scenario
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioReport {
    /// One entry per issued request
    pub outcomes: Vec<StepOutcome>,
    /// Human-readable expectation failures
    pub failures: Vec<String>,
}

impl ScenarioReport {
    /// Check if every expectation held
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl Scenario {
    /// Parse a scenario from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(content).context("invalid scenario file")?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for actor in &self.actors {
            if !names.insert(actor.name.as_str()) {
                bail!("actor '{}' declared twice", actor.name);
            }
        }
        for (index, step) in self.steps.iter().enumerate() {
            let step_no = index + 1;
            if step.actor.is_some() == !step.actors.is_empty() {
                bail!("step {step_no}: set exactly one of `actor` or `actors`");
            }
            for name in step.actor.iter().chain(&step.actors) {
                if !names.contains(name.as_str()) {
                    bail!("step {step_no}: unknown actor '{name}'");
                }
            }
            if step.label.is_some() && !matches!(step.request, StepRequest::Create { .. }) {
                bail!("step {step_no}: only create steps may set a label");
            }
        }
        Ok(())
    }

    /// Run every step against `service`, in order.
    ///
    /// Expectation mismatches are collected in the report; only malformed
    /// scenarios (e.g. an unbound session label) abort the run.
    pub async fn run<S: SessionStore>(
        &self,
        service: &SessionService<S>,
    ) -> Result<ScenarioReport> {
        let identities: HashMap<&str, StaticIdentity> = self
            .actors
            .iter()
            .map(|spec| {
                let actor = Actor::new(PlayerId::new(), spec.name.clone(), spec.roles.iter().copied());
                (spec.name.as_str(), StaticIdentity::new(actor))
            })
            .collect();
        let identities = &identities;
        let mut sessions: HashMap<String, SessionId> = HashMap::new();
        let mut report = ScenarioReport::default();

        for (index, step) in self.steps.iter().enumerate() {
            let step_no = index + 1;
            let request = resolve(&step.request, &sessions)
                .with_context(|| format!("step {step_no}"))?;
            let issuers: Vec<&str> = step
                .actor
                .iter()
                .chain(&step.actors)
                .map(String::as_str)
                .collect();

            let results = join_all(issuers.iter().map(|name| {
                let request = request.clone();
                async move {
                    let identity = identities
                        .get(name)
                        .ok_or_else(|| anyhow!("unknown actor '{name}'"))?;
                    Ok::<_, anyhow::Error>(service.handle(identity, request).await)
                }
            }))
            .await;

            let mut successes = 0;
            for (name, result) in issuers.iter().zip(results) {
                let result = result?;
                if result.is_ok() {
                    successes += 1;
                }
                let outcome = record(step_no, name, step, result, &mut sessions, &mut report);
                tracing::debug!(step = step_no, actor = %name, op = outcome.op, message = %outcome.message, "step finished");
                report.outcomes.push(outcome);
            }

            if let Some(expected) = step.expect_successes {
                if successes != expected {
                    report.failures.push(format!(
                        "step {step_no} ({}): expected {expected} successes, got {successes}",
                        step.request.op()
                    ));
                }
            }
        }

        Ok(report)
    }
}

fn resolve(request: &StepRequest, sessions: &HashMap<String, SessionId>) -> Result<SessionRequest> {
    let lookup = |label: &str| {
        sessions
            .get(label)
            .copied()
            .ok_or_else(|| anyhow!("no session labelled '{label}'"))
    };

    Ok(match request {
        StepRequest::Create {
            name,
            max_players,
            join_as_first_player,
        } => SessionRequest::Create {
            name: name.clone(),
            max_players: *max_players,
            join_as_first_player: *join_as_first_player,
        },
        StepRequest::Join { session } => SessionRequest::Join {
            session_id: lookup(session)?,
        },
        StepRequest::Start { session } => SessionRequest::Start {
            session_id: lookup(session)?,
        },
        StepRequest::End { session, score } => SessionRequest::End {
            session_id: lookup(session)?,
            score: Score::new(*score),
        },
        StepRequest::List { state } => SessionRequest::List {
            state: state.clone(),
        },
        StepRequest::Get { session } => SessionRequest::Get {
            session_id: lookup(session)?,
        },
    })
}

fn record(
    step_no: usize,
    actor: &str,
    step: &Step,
    result: std::result::Result<SessionResponse, ArenaError>,
    sessions: &mut HashMap<String, SessionId>,
    report: &mut ScenarioReport,
) -> StepOutcome {
    let op = step.request.op();
    let (message, error, response) = match result {
        Ok(response) => {
            if let (Some(label), SessionResponse::Created { session }) = (&step.label, &response) {
                sessions.insert(label.clone(), session.id);
            }
            (response.message().to_string(), None, Some(response))
        }
        Err(err) => (err.to_string(), Some(kind_name(&err)), None),
    };

    let as_expected = match step.expect.as_deref() {
        None => true,
        Some("ok") => error.is_none(),
        Some(kind) => error.as_deref() == Some(kind),
    };
    if !as_expected {
        report.failures.push(format!(
            "step {step_no} ({op} as {actor}): expected {}, got {}",
            step.expect.as_deref().unwrap_or("ok"),
            error.as_deref().unwrap_or("ok")
        ));
    }

    StepOutcome {
        step: step_no,
        actor: actor.to_string(),
        op,
        message,
        error,
        response,
        as_expected,
    }
}

fn kind_name(err: &ArenaError) -> String {
    serde_json::to_value(err.kind())
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{:?}", err.kind()))
}
