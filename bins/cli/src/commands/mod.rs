//! Command handlers.

pub mod config;
pub mod info;
pub mod init;
pub mod metric_config;
pub mod middleware;
pub mod test_gen;

pub use config::{run_config_check, run_config_show};
pub use info::run_info;
pub use init::run_init;
pub use metric_config::run_metric_config;
pub use middleware::run_middleware;
pub use test_gen::run_test_gen;
