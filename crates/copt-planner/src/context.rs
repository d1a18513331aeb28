//! # Session Context
//!
//! The read-only environment a planning call runs in, reduced to the two
//! questions the planner actually asks, plus the id allocator it mutates:
//!
//! - Can the storage client serve coprocessor requests of a given type? If
//!   not, the only way to read a table is a memtable scan in the SQL layer.
//! - Is a database an in-memory schema? Those never go through storage.
//!
//! Both questions sit behind trait objects so production wiring and tests
//! can answer them differently; static in-memory implementations ship here
//! for development and testing.

use std::collections::HashSet;
use std::sync::Arc;

/// Coprocessor request families the storage client may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    Select,
    Index,
    Analyze,
}

/// Capability probe for the storage layer.
pub trait StorageClient: Send + Sync {
    fn support_request_type(&self, req: RequestType, sub_type: i64) -> bool;
}

/// Schema-level metadata the planner consults.
pub trait InfoSchema: Send + Sync {
    fn is_memory_db(&self, db_name: &str) -> bool;
}

/// A storage client with a fixed capability set.
#[derive(Debug, Clone, Default)]
pub struct StaticClient {
    pub supported: HashSet<RequestType>,
}

impl StaticClient {
    /// A client supporting every request family.
    pub fn full() -> Self {
        Self {
            supported: HashSet::from([RequestType::Select, RequestType::Index, RequestType::Analyze]),
        }
    }
}

impl StorageClient for StaticClient {
    fn support_request_type(&self, req: RequestType, _sub_type: i64) -> bool {
        self.supported.contains(&req)
    }
}

/// An info schema with a fixed set of memory databases.
#[derive(Debug, Clone)]
pub struct StaticInfoSchema {
    pub memory_dbs: HashSet<String>,
}

impl Default for StaticInfoSchema {
    fn default() -> Self {
        Self {
            memory_dbs: HashSet::from([
                "information_schema".to_string(),
                "performance_schema".to_string(),
            ]),
        }
    }
}

impl InfoSchema for StaticInfoSchema {
    fn is_memory_db(&self, db_name: &str) -> bool {
        self.memory_dbs.contains(&db_name.to_ascii_lowercase())
    }
}

/// Monotonic id source for materialized physical plan nodes. One allocator
/// per planning session; never shared across sessions.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self) -> u32 {
        self.next += 1;
        self.next
    }
}

/// Everything session-scoped the planner reads.
#[derive(Clone)]
pub struct SessionContext {
    pub client: Option<Arc<dyn StorageClient>>,
    pub info_schema: Arc<dyn InfoSchema>,
}

impl SessionContext {
    pub fn new(client: Option<Arc<dyn StorageClient>>, info_schema: Arc<dyn InfoSchema>) -> Self {
        Self { client, info_schema }
    }

    /// A context with full storage capabilities and the default memory DBs.
    pub fn with_full_client() -> Self {
        Self {
            client: Some(Arc::new(StaticClient::full())),
            info_schema: Arc::new(StaticInfoSchema::default()),
        }
    }

    /// A context with no storage client at all.
    pub fn without_client() -> Self {
        Self {
            client: None,
            info_schema: Arc::new(StaticInfoSchema::default()),
        }
    }

    /// Whether the storage client supports the given request family.
    pub fn supports(&self, req: RequestType) -> bool {
        self.client
            .as_ref()
            .is_some_and(|c| c.support_request_type(req, 0))
    }
}
