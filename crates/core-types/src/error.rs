//! The §7 error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable context attached to every surfaced [`OrchestratorError`]
/// (§7 "User-visible behavior").
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ErrorContext {
    pub task_description: Option<String>,
    pub step_number: Option<u32>,
    pub action_key: Option<String>,
    pub last_url: Option<String>,
    pub suggested_action: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, task_description: impl Into<String>) -> Self {
        self.task_description = Some(task_description.into());
        self
    }

    pub fn with_step(mut self, step_number: u32) -> Self {
        self.step_number = Some(step_number);
        self
    }

    pub fn with_action_key(mut self, action_key: impl Into<String>) -> Self {
        self.action_key = Some(action_key.into());
        self
    }

    pub fn with_last_url(mut self, last_url: impl Into<String>) -> Self {
        self.last_url = Some(last_url.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggested_action = Some(suggestion.into());
        self
    }
}

/// The §7 error taxonomy, implemented as kinds (not type names) so that a
/// single enum carries classification, human message and machine-readable
/// context together.
#[derive(Debug, Error, Clone)]
pub enum OrchestratorError {
    #[error("validation error: {message}")]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("llm error: {message}")]
    Llm {
        message: String,
        context: ErrorContext,
    },

    #[error("browser error: {message}")]
    Browser {
        message: String,
        context: ErrorContext,
    },

    #[error("task execution error: {message}")]
    TaskExecution {
        message: String,
        context: ErrorContext,
    },

    #[error("session replay error: {message}")]
    SessionReplay {
        message: String,
        context: ErrorContext,
    },

    #[error("cyclic dependency: {message}")]
    CyclicDependency {
        message: String,
        context: ErrorContext,
    },

    #[error("dependency conflict: {message}")]
    DependencyConflict {
        message: String,
        context: ErrorContext,
    },
}

impl OrchestratorError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn browser(message: impl Into<String>) -> Self {
        Self::Browser {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn task_execution(message: impl Into<String>) -> Self {
        Self::TaskExecution {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn session_replay(message: impl Into<String>) -> Self {
        Self::SessionReplay {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn cyclic_dependency(message: impl Into<String>) -> Self {
        Self::CyclicDependency {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn dependency_conflict(message: impl Into<String>) -> Self {
        Self::DependencyConflict {
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    /// Attach or replace the machine-readable context on this error.
    pub fn with_context(mut self, ctx: ErrorContext) -> Self {
        match &mut self {
            Self::Validation { context, .. }
            | Self::Configuration { context, .. }
            | Self::Llm { context, .. }
            | Self::Browser { context, .. }
            | Self::TaskExecution { context, .. }
            | Self::SessionReplay { context, .. }
            | Self::CyclicDependency { context, .. }
            | Self::DependencyConflict { context, .. } => *context = ctx,
        }
        self
    }

    /// The taxonomy kind name, for logging and for `TaskError::error_type`.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Configuration { .. } => "configuration_error",
            Self::Llm { .. } => "llm_error",
            Self::Browser { .. } => "browser_error",
            Self::TaskExecution { .. } => "task_execution_error",
            Self::SessionReplay { .. } => "session_replay_error",
            Self::CyclicDependency { .. } => "cyclic_dependency",
            Self::DependencyConflict { .. } => "dependency_conflict",
        }
    }

    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Validation { context, .. }
            | Self::Configuration { context, .. }
            | Self::Llm { context, .. }
            | Self::Browser { context, .. }
            | Self::TaskExecution { context, .. }
            | Self::SessionReplay { context, .. }
            | Self::CyclicDependency { context, .. }
            | Self::DependencyConflict { context, .. } => context,
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
