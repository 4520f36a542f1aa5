use redis::{AsyncCommands, RedisResult};
use tracing::info;

/// INCR plus an expiry that only the first hit of a window sets (`EXPIRE .. NX`,
/// Redis 7+), so retries never push the window out.
fn rate_limit_pipeline(key: &str, window_seconds: i64) -> redis::Pipeline {
    let mut pipe = redis::pipe();
    pipe.atomic()
        .incr(key, 1)
        .cmd("EXPIRE")
        .arg(key)
        .arg(window_seconds)
        .arg("NX")
        .ignore();
    pipe
}

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    /// Fixed-window counter. Returns whether this request is still under `limit`.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let (count,): (i64,) = rate_limit_pipeline(key, window_seconds).query_async(&mut conn).await?;
        Ok(count <= limit)
    }

    /// Mark a refresh token id as revoked until it would have expired anyway.
    pub async fn revoke_token(&self, jti: &str, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("revoked:{}", jti);
        conn.set_ex::<_, _, ()>(key, 1, ttl_seconds.max(1)).await?;
        info!("Refresh token revoked: {}", jti);
        Ok(())
    }

    pub async fn is_token_revoked(&self, jti: &str) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = format!("revoked:{}", jti);
        conn.exists(key).await
    }

    pub async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_window_is_fixed() {
        let packed = String::from_utf8(rate_limit_pipeline("ratelimit:10.0.0.1", 60).get_packed_pipeline()).unwrap();
        assert!(packed.contains("INCR\r\n$18\r\nratelimit:10.0.0.1"));
        assert!(packed.contains("EXPIRE\r\n$18\r\nratelimit:10.0.0.1\r\n$2\r\n60\r\n$2\r\nNX\r\n"));
    }
}
