use crate::config::ProxyConfig;
use crate::error::{CoreError, PoolError};
use reqwest::{Client, Proxy};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(15);

/// Round-robin registry of HTTP transports shared by every worker.
///
/// Transports are registered up front and handed out in order, wrapping
/// around. The cursor is guarded by a single mutex so concurrent callers
/// never observe or advance it inconsistently.
#[derive(Debug)]
pub struct ClientPool<C = Client> {
    clients: Vec<C>,
    cursor: Mutex<usize>,
}

impl<C> Default for ClientPool<C> {
    fn default() -> Self {
        Self {
            clients: Vec::new(),
            cursor: Mutex::new(0),
        }
    }
}

impl<C: Clone> ClientPool<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, client: C) {
        self.clients.push(client);
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Next transport in round-robin order.
    pub fn next(&self) -> Result<C, PoolError> {
        if self.clients.is_empty() {
            return Err(PoolError::Empty);
        }

        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let client = self.clients[*cursor % self.clients.len()].clone();
        *cursor = (*cursor + 1) % self.clients.len();
        Ok(client)
    }
}

impl ClientPool<Client> {
    /// Builds one client per proxy, or a single direct client when the list
    /// is empty. Every proxy scheme is checked here, before any work starts.
    pub fn from_proxies(proxies: &[ProxyConfig], timeout: Duration) -> Result<Self, CoreError> {
        let mut pool = Self::new();

        if proxies.is_empty() {
            pool.register(build_client(None, timeout)?);
            info!("No proxies configured, using a direct connection");
            return Ok(pool);
        }

        for proxy in proxies {
            proxy.scheme()?;
            pool.register(build_client(Some(proxy), timeout)?);
        }

        info!("Built client pool with {} proxied transports", pool.len());
        Ok(pool)
    }
}

pub fn build_client(proxy: Option<&ProxyConfig>, timeout: Duration) -> Result<Client, PoolError> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(5);

    if let Some(proxy_config) = proxy {
        let build_err = |reason: String| PoolError::Build {
            proxy: proxy_config.url.clone(),
            reason,
        };

        let mut proxy = Proxy::all(&proxy_config.url).map_err(|e| build_err(e.to_string()))?;
        if let (Some(username), Some(password)) = (&proxy_config.username, &proxy_config.password)
        {
            proxy = proxy.basic_auth(username, password);
        }
        builder = builder.proxy(proxy);
    }

    builder.build().map_err(|e| PoolError::Build {
        proxy: proxy.map(|p| p.url.clone()).unwrap_or_else(|| "direct".to_string()),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn proxy(url: &str) -> ProxyConfig {
        ProxyConfig {
            url: url.to_string(),
            username: None,
            password: None,
        }
    }

    #[test]
    fn test_empty_pool_has_no_client() {
        let pool: ClientPool<u8> = ClientPool::new();
        assert_eq!(pool.next(), Err(PoolError::Empty));
    }

    #[test]
    fn test_round_robin_wraps() {
        let mut pool = ClientPool::new();
        pool.register("a");
        pool.register("b");
        pool.register("c");

        let seen: Vec<_> = (0..7).map(|_| pool.next().unwrap()).collect();
        assert_eq!(seen, vec!["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn test_unknown_scheme_fails_at_build_time() {
        let err = ClientPool::from_proxies(&[proxy("ftp://127.0.0.1:21")], DEFAULT_CLIENT_TIMEOUT)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::UnsupportedProxyScheme { ref scheme, .. }) if scheme == "ftp"
        ));
    }

    #[test]
    fn test_no_proxies_gives_direct_client() {
        let pool = ClientPool::from_proxies(&[], DEFAULT_CLIENT_TIMEOUT).unwrap();
        assert_eq!(pool.len(), 1);
        assert!(pool.next().is_ok());
    }

    #[test]
    fn test_http_proxy_with_credentials() {
        let mut p = proxy("http://127.0.0.1:8080");
        p.username = Some("user".to_string());
        p.password = Some("pass".to_string());
        let pool = ClientPool::from_proxies(&[p, proxy("socks5://127.0.0.1:1080")], DEFAULT_CLIENT_TIMEOUT)
            .unwrap();
        assert_eq!(pool.len(), 2);
    }
}
