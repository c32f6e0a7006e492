pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod invocation;
pub mod orchestrator;
pub mod session;
pub mod workflow;

pub use backend::SuiteBackend;
pub use error::{BackendError, GatewayError, TestError};
pub use gateway::ConfigPersistenceGateway;
pub use orchestrator::StepTestOrchestrator;
pub use session::EditorSession;
pub use workflow::{StepName, WorkflowConfig};
