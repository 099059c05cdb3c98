use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use serde_json::Value;

use super::{CacheStore, IndexDefinition, SearchQuery};
use crate::{CacheError, CacheResult};

/// Cache store backed by Redis with the RedisJSON and RediSearch modules
/// (e.g. Redis Stack).
///
/// Documents are written with `JSON.SET` and expire through `EXPIRE`.
/// Every key, including index prefixes, is namespaced by `prefix`.
#[derive(Clone)]
pub struct RedisCache {
    conn: MultiplexedConnection,
    prefix: String,
}

impl RedisCache {
    /// Connects to Redis at `url`, namespacing all keys with `prefix`.
    pub async fn connect(url: &str, prefix: impl Into<String>) -> CacheResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;

        Ok(Self {
            conn,
            prefix: prefix.into(),
        })
    }

    /// Returns the global key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Pings the server.
    pub async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("JSON.GET")
            .arg(self.full_key(key))
            .query_async(&mut conn)
            .await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> CacheResult<()> {
        let key = self.full_key(key);
        let json = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();

        redis::pipe()
            .atomic()
            .cmd("JSON.SET")
            .arg(&key)
            .arg("$")
            .arg(json)
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(ttl.as_secs().max(1))
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.full_key(key)).await?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        let secs = i64::try_from(ttl.as_secs().max(1)).unwrap_or(i64::MAX);
        let updated: bool = conn.expire(self.full_key(key), secs).await?;
        Ok(updated)
    }

    async fn create_index(&self, index: &IndexDefinition) -> CacheResult<()> {
        let mut cmd = redis::cmd("FT.CREATE");
        cmd.arg(&index.name)
            .arg("ON")
            .arg("JSON")
            .arg("PREFIX")
            .arg(1)
            .arg(self.full_key(&index.prefix))
            .arg("SCHEMA");
        for field in &index.fields {
            cmd.arg(&field.path)
                .arg("AS")
                .arg(&field.alias)
                .arg(field.kind.as_str());
        }

        let mut conn = self.conn.clone();
        match cmd.query_async::<()>(&mut conn).await {
            Ok(()) => Ok(()),
            Err(e) if is_index_exists(&e) => {
                tracing::debug!(index = %index.name, "search index already exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn search(&self, index: &str, query: &SearchQuery) -> CacheResult<Vec<Value>> {
        let mut conn = self.conn.clone();
        let reply: redis::Value = redis::cmd("FT.SEARCH")
            .arg(index)
            .arg(query.to_redis_query())
            .arg("RETURN")
            .arg(1)
            .arg("$")
            .arg("LIMIT")
            .arg(query.effective_offset())
            .arg(query.effective_limit())
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                if is_unknown_index(&e) {
                    CacheError::UnknownIndex(index.to_string())
                } else {
                    CacheError::Redis(e)
                }
            })?;

        parse_search_reply(reply)
    }
}

// RediSearch words these errors differently across releases.
fn is_index_exists(e: &redis::RedisError) -> bool {
    e.to_string().to_lowercase().contains("index already exists")
}

fn is_unknown_index(e: &redis::RedisError) -> bool {
    let message = e.to_string().to_lowercase();
    message.contains("no such index") || message.contains("unknown index name")
}

/// Decodes an `FT.SEARCH ... RETURN 1 $` reply.
///
/// The reply is `[total, key, [field, value, ...], key, [...], ...]`; the
/// document is the value of the `$` field.
fn parse_search_reply(reply: redis::Value) -> CacheResult<Vec<Value>> {
    let redis::Value::Array(items) = reply else {
        return Err(CacheError::UnexpectedReply(format!(
            "expected array, got {reply:?}"
        )));
    };

    let mut documents = Vec::new();
    let mut iter = items.into_iter().skip(1);
    while let Some(_key) = iter.next() {
        let Some(redis::Value::Array(fields)) = iter.next() else {
            return Err(CacheError::UnexpectedReply(
                "missing field list for search hit".to_string(),
            ));
        };

        let mut pairs = fields.into_iter();
        while let (Some(name), Some(value)) = (pairs.next(), pairs.next()) {
            if value_as_str(&name).as_deref() == Some("$") {
                let raw = value_as_str(&value).ok_or_else(|| {
                    CacheError::UnexpectedReply("search hit document is not a string".to_string())
                })?;
                documents.push(serde_json::from_str(&raw)?);
            }
        }
    }

    Ok(documents)
}

fn value_as_str(value: &redis::Value) -> Option<String> {
    match value {
        redis::Value::BulkString(bytes) => String::from_utf8(bytes.clone()).ok(),
        redis::Value::SimpleString(s) => Some(s.clone()),
        _ => None,
    }
}
