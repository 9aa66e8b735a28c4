pub mod provider_options;

// Re-export commonly used types
pub use provider_options::{ProviderOptions, ENV_DETECT_CYCLES, ENV_VALIDATE_SCOPES};
