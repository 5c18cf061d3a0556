//! The anonymous cart: a line list persisted under one namespaced entry.
//!
//! Every mutation rewrites the whole entry and then tells the registered
//! listeners, so badges and drawers elsewhere in the UI can refresh. Storage
//! trouble (missing directory, bad permissions, corrupt JSON) is never an
//! error: the cart degrades to empty and keeps working in memory.
use std::{
    fs,
    path::{Path, PathBuf},
};

use log::*;
use voltio_engine::{
    db_types::ExchangeRate,
    traits::{totals_of, CartError, CartLine, CartLineView, CartStore, CartTotals, LineKey},
};

/// The storage namespace, versioned so a layout change can't misread old
/// entries.
pub const CART_STORAGE_KEY: &str = "cart:v1";

type ChangeListener = Box<dyn Fn(&[CartLine]) + Send + Sync>;

pub struct LocalCartStore {
    path: PathBuf,
    lines: Vec<CartLine>,
    listeners: Vec<ChangeListener>,
}

impl std::fmt::Debug for LocalCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LocalCartStore ({} lines at {})", self.lines.len(), self.path.display())
    }
}

impl LocalCartStore {
    /// Opens the cart persisted under `storage_dir`, hydrating the line list
    /// from the namespaced entry if it is readable.
    pub fn open<P: AsRef<Path>>(storage_dir: P) -> Self {
        let path = storage_dir.as_ref().join(storage_file_name());
        let lines = read_entry(&path);
        Self { path, lines, listeners: Vec::new() }
    }

    /// Registers a listener that runs after every persisted mutation.
    pub fn on_change<F>(&mut self, listener: F)
    where F: Fn(&[CartLine]) + Send + Sync + 'static {
        self.listeners.push(Box::new(listener));
    }

    /// A snapshot of the raw lines (used by the login migration).
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }

    fn persist_and_notify(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("🛒️ Could not create cart storage dir: {e}. Cart lives in memory only.");
            }
        }
        match serde_json::to_string(&self.lines) {
            Ok(serialized) => {
                if let Err(e) = fs::write(&self.path, serialized) {
                    warn!("🛒️ Could not persist cart entry: {e}. Cart lives in memory only.");
                }
            },
            Err(e) => warn!("🛒️ Could not serialize cart: {e}"),
        }
        for listener in &self.listeners {
            listener(&self.lines);
        }
    }

    fn views(&self) -> Vec<CartLineView> {
        self.lines
            .iter()
            .map(|line| CartLineView {
                key: LineKey::Product(line.product_id),
                product_id: Some(line.product_id),
                name: line.name.clone(),
                sku: line.sku.clone(),
                unit_price: line.unit_price,
                currency: line.currency,
                quantity: line.quantity,
            })
            .collect()
    }
}

impl CartStore for LocalCartStore {
    async fn lines(&mut self) -> Result<Vec<CartLineView>, CartError> {
        Ok(self.views())
    }

    async fn add_line(&mut self, line: &CartLine) -> Result<(), CartError> {
        let quantity = line.quantity.max(1);
        match self.lines.iter_mut().find(|l| l.product_id == line.product_id) {
            Some(existing) => existing.quantity += quantity,
            None => self.lines.push(CartLine { quantity, ..line.clone() }),
        }
        self.persist_and_notify();
        Ok(())
    }

    async fn set_quantity(&mut self, key: &LineKey, quantity: i64) -> Result<(), CartError> {
        let LineKey::Product(product_id) = key else {
            return Err(CartError::LineNotFound(*key));
        };
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == *product_id)
            .ok_or(CartError::LineNotFound(*key))?;
        line.quantity = quantity.max(1);
        self.persist_and_notify();
        Ok(())
    }

    async fn remove_line(&mut self, key: &LineKey) -> Result<(), CartError> {
        let LineKey::Product(product_id) = key else {
            return Err(CartError::LineNotFound(*key));
        };
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != *product_id);
        if self.lines.len() == before {
            return Err(CartError::LineNotFound(*key));
        }
        self.persist_and_notify();
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), CartError> {
        self.lines.clear();
        self.persist_and_notify();
        Ok(())
    }

    async fn totals(&mut self, rate: Option<&ExchangeRate>) -> Result<CartTotals, CartError> {
        Ok(totals_of(&self.views(), rate))
    }
}

fn storage_file_name() -> String {
    format!("{}.json", CART_STORAGE_KEY.replace(':', "_"))
}

fn read_entry(path: &Path) -> Vec<CartLine> {
    match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("🛒️ Cart entry at {} is unreadable ({e}). Starting empty.", path.display());
            Vec::new()
        }),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod test {
    use voltio_common::Money;
    use voltio_engine::db_types::{Currency, ExchangeRate, ProductId};

    use super::*;

    fn line(product: i64, price: i64, currency: Currency, qty: i64) -> CartLine {
        CartLine {
            product_id: ProductId(product),
            name: format!("Producto {product}"),
            sku: None,
            unit_price: Money::from(price),
            currency,
            quantity: qty,
        }
    }

    #[tokio::test]
    async fn mutations_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut cart = LocalCartStore::open(dir.path());
        cart.add_line(&line(1, 10_000, Currency::Ars, 2)).await.unwrap();
        cart.add_line(&line(2, 5_000, Currency::Ars, 1)).await.unwrap();

        let mut reopened = LocalCartStore::open(dir.path());
        let lines = reopened.lines().await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].quantity, 2);
    }

    #[tokio::test]
    async fn adding_the_same_product_merges_commutatively() {
        let dir = tempfile::tempdir().unwrap();
        let mut cart = LocalCartStore::open(dir.path());
        cart.add_line(&line(1, 10_000, Currency::Ars, 2)).await.unwrap();
        cart.add_line(&line(1, 10_000, Currency::Ars, 3)).await.unwrap();
        let forward = cart.lines().await.unwrap();

        cart.clear().await.unwrap();
        cart.add_line(&line(1, 10_000, Currency::Ars, 3)).await.unwrap();
        cart.add_line(&line(1, 10_000, Currency::Ars, 2)).await.unwrap();
        let reverse = cart.lines().await.unwrap();

        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].quantity, 5);
        assert_eq!(forward[0].quantity, reverse[0].quantity);
    }

    #[tokio::test]
    async fn quantities_clamp_to_one_never_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut cart = LocalCartStore::open(dir.path());
        cart.add_line(&line(1, 10_000, Currency::Ars, 4)).await.unwrap();
        for bad in [0, -1, -100] {
            cart.set_quantity(&LineKey::Product(ProductId(1)), bad).await.unwrap();
            assert_eq!(cart.lines().await.unwrap()[0].quantity, 1);
        }
        // removal is explicit, not a zero quantity
        cart.remove_line(&LineKey::Product(ProductId(1))).await.unwrap();
        assert!(cart.lines().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn listeners_fire_after_every_mutation() {
        use std::sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        };
        let dir = tempfile::tempdir().unwrap();
        let mut cart = LocalCartStore::open(dir.path());
        let notified = Arc::new(AtomicUsize::new(0));
        let n = notified.clone();
        cart.on_change(move |_| {
            n.fetch_add(1, Ordering::SeqCst);
        });
        cart.add_line(&line(1, 10_000, Currency::Ars, 1)).await.unwrap();
        cart.set_quantity(&LineKey::Product(ProductId(1)), 3).await.unwrap();
        cart.remove_line(&LineKey::Product(ProductId(1))).await.unwrap();
        cart.clear().await.unwrap();
        assert_eq!(notified.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn corrupt_storage_degrades_to_an_empty_cart() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(storage_file_name()), "{not json").unwrap();
        let mut cart = LocalCartStore::open(dir.path());
        assert!(cart.lines().await.unwrap().is_empty());
        // and it works from there
        cart.add_line(&line(1, 10_000, Currency::Ars, 1)).await.unwrap();
        assert_eq!(cart.lines().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn usd_lines_convert_only_when_a_rate_exists() {
        let dir = tempfile::tempdir().unwrap();
        let mut cart = LocalCartStore::open(dir.path());
        cart.add_line(&line(1, 1_000, Currency::Usd, 1)).await.unwrap();

        // sell rate ARS 1000.00 per USD: USD 10.00 shows as ARS 10,000.00
        let rate =
            ExchangeRate::new(Currency::Usd, Money::from_units(980), Money::from_units(1000), "BNA");
        let totals = cart.totals(Some(&rate)).await.unwrap();
        assert_eq!(totals.subtotal, Money::from_units(10_000));
        assert_eq!(totals.unconverted_usd, Money::ZERO);

        // without a rate the USD amount is reported as USD, never as ARS 0
        let totals = cart.totals(None).await.unwrap();
        assert_eq!(totals.subtotal, Money::ZERO);
        assert_eq!(totals.unconverted_usd, Money::from_units(10));
    }
}
