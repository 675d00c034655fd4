//! Redis client and the Redis challenge store

pub mod otp_store;
pub mod redis_client;

#[cfg(test)]
mod tests;

pub use otp_store::RedisOtpStore;
pub use redis_client::RedisClient;

pub use mg_shared::config::CacheConfig;
