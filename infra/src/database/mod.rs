//! MySQL connection pool and the MySQL challenge store

pub mod connection;
pub mod otp_store;


pub use connection::{DatabasePool, PoolStatistics};
pub use otp_store::MySqlOtpStore;
