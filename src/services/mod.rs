pub mod recommendation;
pub mod session;

pub use recommendation::RecommendationService;
pub use session::{InMemorySessionStore, Session, SessionStore};
