pub mod db;
pub mod http;
pub mod memory;
pub mod telemetry;
