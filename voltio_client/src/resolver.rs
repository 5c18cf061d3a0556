//! Which cart is active right now?
//!
//! The answer is a pure function of a fresh probe, never stored session
//! state: on every page load the storefront asks the server for a draft
//! order, and only when that fetch fails or comes back empty does the local
//! cart take over. An unreachable server is indistinguishable from "not
//! logged in" by design.
use log::*;
use voltio_engine::{
    db_types::ExchangeRate,
    traits::{CartError, CartLine, CartLineView, CartStore, CartTotals, LineKey},
};

use crate::{local_cart::LocalCartStore, remote_cart::RemoteCart};

#[derive(Debug)]
pub enum ActiveCart {
    Server(RemoteCart),
    Local(LocalCartStore),
}

impl ActiveCart {
    pub fn is_server(&self) -> bool {
        matches!(self, ActiveCart::Server(_))
    }
}

/// Probe-first selection: the server cart wins whenever the authenticated
/// session has a draft order; everything else lands on the local cart.
pub async fn resolve_active_cart(remote: RemoteCart, local: LocalCartStore) -> ActiveCart {
    match remote.probe().await {
        Some(draft) => {
            debug!("🛒️ Server draft {} is active", draft.order.id);
            ActiveCart::Server(remote)
        },
        None => {
            debug!("🛒️ No server cart; using the local cart");
            ActiveCart::Local(local)
        },
    }
}

/// One-way migration run after login: merge the anonymous lines into the
/// server draft (quantities for the same product sum by the merge rule),
/// then clear the local entry. If any line fails to transfer the local cart
/// is left intact so nothing is silently lost.
pub async fn migrate_local_cart(
    local: &mut LocalCartStore,
    remote: &RemoteCart,
) -> Result<usize, CartError> {
    let lines = local.snapshot();
    if lines.is_empty() {
        return Ok(0);
    }
    for line in &lines {
        remote.add_item(line.product_id, line.quantity).await?;
    }
    let migrated = lines.len();
    local.clear().await?;
    info!("🛒️ Migrated {migrated} local cart lines into the server draft");
    Ok(migrated)
}

impl CartStore for ActiveCart {
    async fn lines(&mut self) -> Result<Vec<CartLineView>, CartError> {
        match self {
            ActiveCart::Server(cart) => cart.lines().await,
            ActiveCart::Local(cart) => cart.lines().await,
        }
    }

    async fn add_line(&mut self, line: &CartLine) -> Result<(), CartError> {
        match self {
            ActiveCart::Server(cart) => cart.add_line(line).await,
            ActiveCart::Local(cart) => cart.add_line(line).await,
        }
    }

    async fn set_quantity(&mut self, key: &LineKey, quantity: i64) -> Result<(), CartError> {
        match self {
            ActiveCart::Server(cart) => cart.set_quantity(key, quantity).await,
            ActiveCart::Local(cart) => cart.set_quantity(key, quantity).await,
        }
    }

    async fn remove_line(&mut self, key: &LineKey) -> Result<(), CartError> {
        match self {
            ActiveCart::Server(cart) => cart.remove_line(key).await,
            ActiveCart::Local(cart) => cart.remove_line(key).await,
        }
    }

    async fn clear(&mut self) -> Result<(), CartError> {
        match self {
            ActiveCart::Server(cart) => cart.clear().await,
            ActiveCart::Local(cart) => cart.clear().await,
        }
    }

    async fn totals(&mut self, rate: Option<&ExchangeRate>) -> Result<CartTotals, CartError> {
        match self {
            ActiveCart::Server(cart) => cart.totals(rate).await,
            ActiveCart::Local(cart) => cart.totals(rate).await,
        }
    }
}

#[cfg(test)]
mod test {
    use voltio_common::Secret;

    use super::*;
    use crate::config::ClientConfig;

    #[tokio::test]
    async fn unreachable_server_falls_back_to_the_local_cart() {
        let _ = env_logger::try_init();
        let dir = tempfile::tempdir().unwrap();
        // nothing listens on this port; the probe must degrade, not error
        let config = ClientConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            access_token: Secret::new("stale-token".to_string()),
            storage_dir: dir.path().to_path_buf(),
        };
        let remote = RemoteCart::new(&config).unwrap();
        let local = LocalCartStore::open(dir.path());
        let active = resolve_active_cart(remote, local).await;
        assert!(!active.is_server());
    }
}
