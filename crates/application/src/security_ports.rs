mod cache;
mod repository;
mod roles;

pub use cache::RoleGrantCache;
pub use repository::RoleRepository;
pub use roles::RoleAssignment;
