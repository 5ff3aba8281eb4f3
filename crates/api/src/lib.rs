pub mod middleware;
pub mod mitigation;
pub mod routes;
pub mod state;
