//! # Cache Keys
//!
//! A [`QueryKey`] names one memoized value: the entity scope, the identity the
//! value belongs to (for user-scoped data) and every parameter the value
//! depends on. Two keys are equal only if all three parts are equal, so data
//! fetched for one principal can never be served for another.
//!
//! [`KeyFilter`] selects groups of keys for invalidation and removal.

use crate::identity::Principal;
use std::fmt::Display;

/// Scope of the actor handle entry.
pub const ACTOR_SCOPE: &str = "actor";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    scope: String,
    identity: Option<Principal>,
    params: Vec<String>,
}

impl QueryKey {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            identity: None,
            params: Vec::new(),
        }
    }

    /// The key of the actor handle for `identity` (`None` for anonymous).
    pub fn actor(identity: Option<&Principal>) -> Self {
        Self::new(ACTOR_SCOPE).with_identity_opt(identity.cloned())
    }

    pub fn with_identity(self, identity: Principal) -> Self {
        self.with_identity_opt(Some(identity))
    }

    pub fn with_identity_opt(mut self, identity: Option<Principal>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_param(mut self, param: impl Display) -> Self {
        self.params.push(param.to_string());
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn identity(&self) -> Option<&Principal> {
        self.identity.as_ref()
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn is_actor(&self) -> bool {
        self.scope == ACTOR_SCOPE
    }
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.scope)?;
        if let Some(identity) = &self.identity {
            write!(f, "@{}", identity)?;
        }
        for param in &self.params {
            write!(f, "/{}", param)?;
        }
        Ok(())
    }
}

/// Selects the cache keys an invalidation or removal applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyFilter {
    /// Exactly this key.
    Exact(QueryKey),
    /// Every key in the scope, regardless of identity or params.
    Scope(String),
    /// Every key owned by the identity (`None` matches only unscoped keys).
    Identity(Option<Principal>),
    /// Every key except actor handle entries.
    AllExceptActors,
}

impl KeyFilter {
    pub fn scope(scope: impl Into<String>) -> Self {
        KeyFilter::Scope(scope.into())
    }

    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyFilter::Exact(exact) => exact == key,
            KeyFilter::Scope(scope) => key.scope == *scope,
            KeyFilter::Identity(identity) => key.identity == *identity,
            KeyFilter::AllExceptActors => !key.is_actor(),
        }
    }
}

impl From<QueryKey> for KeyFilter {
    fn from(key: QueryKey) -> Self {
        KeyFilter::Exact(key)
    }
}
