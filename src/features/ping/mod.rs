pub mod handler;

pub use handler::create_ping_router;
