//! QueryEngine trait: anything that turns a natural-language query into an
//! answer string.
//!
//! Vector and summary query engines implement it, and so do zone agents and
//! the compare sub-agent. That is what lets every one of them be wrapped as
//! the same kind of tool.

use async_trait::async_trait;

#[async_trait]
pub trait QueryEngine: Send + Sync {
    async fn query(&self, query: &str) -> crate::Result<String>;
}
