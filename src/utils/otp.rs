// src/utils/otp.rs

//! One-time codes for signup and password reset.
//!
//! Records live in a TTL key-value store: Redis in production, an in-process
//! map otherwise. Keys are `otp:<purpose>:<email>`.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use argon2::password_hash::rand_core::{OsRng, RngCore};
use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::AppError;

pub const PURPOSE_SIGNUP: &str = "signup";
pub const PURPOSE_RESET: &str = "reset";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtpRecord {
    pub code: String,
    pub verified: bool,
    /// Data held until the code is verified, e.g. a pending signup.
    pub payload: Option<Value>,
}

impl OtpRecord {
    pub fn new(code: String, payload: Option<Value>) -> Self {
        Self {
            code,
            verified: false,
            payload,
        }
    }
}

pub fn otp_key(purpose: &str, email: &str) -> String {
    format!("otp:{}:{}", purpose, email.trim().to_lowercase())
}

/// Six random digits.
pub fn generate_otp() -> String {
    format!("{:06}", OsRng.next_u32() % 1_000_000)
}

#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn put(&self, key: &str, record: &OtpRecord, ttl_secs: u64) -> Result<(), AppError>;

    /// `None` when missing or expired.
    async fn get(&self, key: &str) -> Result<Option<OtpRecord>, AppError>;

    async fn remove(&self, key: &str) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct RedisOtpStore {
    conn: MultiplexedConnection,
}

impl RedisOtpStore {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl OtpStore for RedisOtpStore {
    async fn put(&self, key: &str, record: &OtpRecord, ttl_secs: u64) -> Result<(), AppError> {
        let value = serde_json::to_string(record)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<OtpRecord>, AppError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        value
            .map(|v| {
                serde_json::from_str(&v).map_err(|e| AppError::InternalServerError(e.to_string()))
            })
            .transpose()
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }
}

/// In-process TTL map. Expired entries are dropped on read.
#[derive(Default)]
pub struct MemoryOtpStore {
    entries: Mutex<HashMap<String, (OtpRecord, Instant)>>,
}

impl MemoryOtpStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OtpStore for MemoryOtpStore {
    async fn put(&self, key: &str, record: &OtpRecord, ttl_secs: u64) -> Result<(), AppError> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (record.clone(), expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<OtpRecord>, AppError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((record, expires_at)) if Instant::now() < *expires_at => Ok(Some(record.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
