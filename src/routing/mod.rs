pub mod resolver;
pub mod rewrite;

pub use resolver::{Resolution, TenantResolver};
pub use rewrite::rewrite_path;
