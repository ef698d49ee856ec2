//! Content Query Resolver
//!
//! Maps an incoming request onto a single [`ContentIdentityState`]:
//!
//! - [`RequestParser`] turns a permalink path and query pairs into a
//!   [`QueryRequest`]
//! - [`QueryResolver`] classifies the request and loads the entity, term,
//!   author, post type, or date it is about
//!
//! The result is a [`ResolvedQuery`] consumed by the template hierarchy.

mod request;
mod resolver;
mod state;

pub use request::{QueryRequest, QueryRequestBuilder, RequestParser};
pub use resolver::QueryResolver;
pub use state::{ContentIdentityState, DateArchive, QueriedObject, QueryFlags, ResolvedQuery};
