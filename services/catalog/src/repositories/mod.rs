//! Repositories for database operations

pub mod book;
pub mod role;
pub mod session;
pub mod user;

pub use book::BookRepository;
pub use role::RoleRepository;
pub use session::SessionRepository;
pub use user::UserRepository;
