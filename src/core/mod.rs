// Public modules
pub mod debounce;
pub mod error;
pub mod functions;
pub mod scheduler;
pub mod template;

// Public modules for CLI access
pub mod defaults;
pub mod paths;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
pub use template::{compile, template, Template, TemplateOptions};
