pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod transform;

pub use routes::create_router;
