pub mod guard;
pub mod hooks;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod store;
