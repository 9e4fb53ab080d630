//! The authentication boundary.
//!
//! Sign-in itself belongs to the hosting application; the desk only asks
//! whether someone is signed in right now.

use async_trait::async_trait;
use std::sync::Arc;

pub type AuthHandle = Arc<dyn AuthGate + Send + Sync>;

#[async_trait]
pub trait AuthGate: Send + Sync {
    /// The signed-in operator, if any.
    async fn operator(&self) -> Option<String>;
}

/// A fixed operator identity, typically from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    operator: Option<String>,
}
impl StaticAuth {
    pub fn new(operator: Option<String>) -> Self {
        Self { operator: operator.filter(|name| !name.trim().is_empty()) }
    }

    pub fn signed_in(operator: impl Into<String>) -> Self {
        Self::new(Some(operator.into()))
    }

    pub fn signed_out() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthGate for StaticAuth {
    async fn operator(&self) -> Option<String> {
        self.operator.clone()
    }
}
