pub mod config;
pub mod directive;
pub mod error;
pub mod registry;
pub mod types;
pub mod work_order;

pub use directive::Directive;
pub use error::{RelayError, Result};
pub use registry::{ProjectDescriptor, Registry};
pub use types::Action;
pub use work_order::WorkOrder;
