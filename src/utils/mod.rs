pub mod configuration;
pub mod logging;
pub mod thread_pool;

pub use configuration::{AssemblerConfig, ConfigurationError};
pub use logging::init_logging;
pub use thread_pool::build_pool;
