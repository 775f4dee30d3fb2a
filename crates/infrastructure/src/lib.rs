//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_role_grant_cache;
mod in_memory_role_repository;
mod in_memory_workflow_record_repository;
mod postgres_audit_repository;
mod postgres_role_repository;
mod postgres_workflow_record_repository;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_role_grant_cache::InMemoryRoleGrantCache;
pub use in_memory_role_repository::InMemoryRoleRepository;
pub use in_memory_workflow_record_repository::InMemoryWorkflowRecordRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_role_repository::PostgresRoleRepository;
pub use postgres_workflow_record_repository::PostgresWorkflowRecordRepository;
