//! Server state: agent definitions and session-bound engines.

use axon_agent::{AgentConfig, ReactAgent};
use axon_core::{AgentId, SessionId, StateModule};
use axon_hooks::Hook;
use axon_model::ChatModel;
use axon_session::{MemorySessionBackend, SessionError, SessionManager};
use axon_tool::Toolkit;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Everything needed to build an engine for one named agent.
pub struct AgentDefinition {
    /// Agent id; the resolution key for requests.
    pub name: AgentId,
    /// Model port shared by this agent's engines.
    pub model: Arc<dyn ChatModel>,
    /// Base toolkit; each session engine gets its own shallow copy so
    /// client-supplied tools never leak across sessions.
    pub toolkit: Arc<Toolkit>,
    /// Hooks installed on every engine of this agent.
    pub hooks: Vec<Arc<dyn Hook>>,
    /// Engine configuration.
    pub config: AgentConfig,
}

impl AgentDefinition {
    /// A definition with an empty toolkit, no hooks, and default config.
    pub fn new(name: impl Into<AgentId>, model: Arc<dyn ChatModel>) -> Self {
        Self {
            name: name.into(),
            model,
            toolkit: Arc::new(Toolkit::new()),
            hooks: Vec::new(),
            config: AgentConfig::default(),
        }
    }

    /// Share a toolkit with this agent.
    #[must_use]
    pub fn with_toolkit(mut self, toolkit: Arc<Toolkit>) -> Self {
        self.toolkit = toolkit;
        self
    }

    /// Install a hook on every engine of this agent.
    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Set the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    fn build_engine(&self) -> Arc<ReactAgent> {
        let mut builder = ReactAgent::builder(self.model.clone())
            .name(self.name.clone())
            .toolkit(Arc::new(self.toolkit.as_ref().clone()))
            .config(self.config.clone());
        for hook in &self.hooks {
            builder = builder.hook(hook.clone());
        }
        Arc::new(builder.build())
    }
}

/// Server-level configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Agent used when the request names none.
    pub default_agent: Option<AgentId>,
    /// Idle time after which a session-bound engine is discarded.
    pub session_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_agent: None,
            session_ttl: Duration::from_secs(30 * 60),
        }
    }
}

struct SessionEntry {
    engine: Arc<ReactAgent>,
    last_used: Instant,
}

pub(crate) enum AcquireError {
    UnknownAgent,
    Session(SessionError),
}

/// Shared state behind the HTTP handlers.
pub struct AppState {
    agents: HashMap<AgentId, AgentDefinition>,
    sessions: Mutex<HashMap<String, SessionEntry>>,
    manager: Arc<SessionManager>,
    config: ServerConfig,
}

impl AppState {
    /// Start building server state.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder {
            agents: HashMap::new(),
            manager: None,
            config: ServerConfig::default(),
        }
    }

    pub(crate) fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get or create the engine bound to `(agent, session)`. A freshly
    /// created engine has already attempted a load from the session
    /// backend. Expired entries are pruned on every acquire.
    pub(crate) async fn acquire(
        &self,
        agent: &AgentId,
        session: &SessionId,
    ) -> Result<Arc<ReactAgent>, AcquireError> {
        let mut sessions = self.sessions.lock().await;
        let now = Instant::now();
        let ttl = self.config.session_ttl;
        sessions.retain(|_, entry| now.duration_since(entry.last_used) < ttl);

        let key = format!("{agent}\u{0}{session}");
        if let Some(entry) = sessions.get_mut(&key) {
            entry.last_used = now;
            return Ok(entry.engine.clone());
        }

        let definition = self.agents.get(agent).ok_or(AcquireError::UnknownAgent)?;
        let engine = definition.build_engine();
        let components: Vec<Arc<dyn StateModule>> = vec![engine.clone()];
        self.manager
            .load(session, true, &components)
            .await
            .map_err(AcquireError::Session)?;
        sessions.insert(
            key,
            SessionEntry {
                engine: engine.clone(),
                last_used: now,
            },
        );
        Ok(engine)
    }

    /// Write the engine's state back to the session backend. Failures are
    /// logged; the response has already been produced.
    pub(crate) async fn persist(&self, session: &SessionId, engine: &Arc<ReactAgent>) {
        let components: Vec<Arc<dyn StateModule>> = vec![engine.clone()];
        if let Err(e) = self.manager.save(session, &components).await {
            tracing::warn!(session = %session, error = %e, "failed to persist session");
        }
    }
}

/// Builder for [`AppState`].
pub struct AppStateBuilder {
    agents: HashMap<AgentId, AgentDefinition>,
    manager: Option<Arc<SessionManager>>,
    config: ServerConfig,
}

impl AppStateBuilder {
    /// Register an agent definition under its name.
    #[must_use]
    pub fn agent(mut self, definition: AgentDefinition) -> Self {
        self.agents.insert(definition.name.clone(), definition);
        self
    }

    /// Use a specific session manager. Defaults to an in-memory backend.
    #[must_use]
    pub fn session_manager(mut self, manager: Arc<SessionManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Set the default agent.
    #[must_use]
    pub fn default_agent(mut self, name: impl Into<AgentId>) -> Self {
        self.config.default_agent = Some(name.into());
        self
    }

    /// Set the session engine TTL.
    #[must_use]
    pub fn session_ttl(mut self, ttl: Duration) -> Self {
        self.config.session_ttl = ttl;
        self
    }

    /// Build the shared state.
    pub fn build(self) -> Arc<AppState> {
        Arc::new(AppState {
            agents: self.agents,
            sessions: Mutex::new(HashMap::new()),
            manager: self.manager.unwrap_or_else(|| {
                Arc::new(SessionManager::new(Arc::new(MemorySessionBackend::new())))
            }),
            config: self.config,
        })
    }
}
