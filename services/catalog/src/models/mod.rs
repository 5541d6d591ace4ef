//! Catalog service models

pub mod book;
pub mod role;
pub mod session;
pub mod user;

// Re-export for convenience
pub use book::{Book, BookForm, NewBook};
pub use role::Role;
pub use session::{NewSession, Session};
pub use user::{NewUser, SignInForm, User};
