mod handler;

pub use handler::{get_stats, invalidate_tags};
