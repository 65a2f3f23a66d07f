pub mod agent;
pub mod auth;
pub mod errorhandler;
pub mod server;
pub mod topology;
pub mod types;

pub use agent::{AgentError, BucketInfo, ClusterAgent, Document, MemoryAgent, MutationResult};
pub use auth::AuthConfig;
pub use errorhandler::{http_status, ApiError, ErrorHandler};
pub use server::{create_router, start_server, AppState, HOOKS_SESSION_HEADER};
pub use topology::{StaticTopology, Topology, TopologyNode, TopologyProvider};
