use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::catalog::{Catalog, CatalogError, CatalogSource};

/// Single-flight shared catalog loader.
///
/// Concurrent first use never double-loads: the first caller performs the
/// load, every other caller awaits the same initialization. Once loaded
/// the catalog is shared read-only as an `Arc`.
pub struct SharedCatalog {
    source: Box<dyn CatalogSource>,
    cell: OnceCell<Arc<Catalog>>,
}

impl SharedCatalog {
    pub fn new(source: Box<dyn CatalogSource>) -> Self {
        Self {
            source,
            cell: OnceCell::new(),
        }
    }

    /// Get the loaded catalog, loading it on first use.
    ///
    /// A load failure is not cached: a later call retries the source, so a
    /// transient source failure at startup does not poison the process.
    pub async fn get(&self) -> Result<Arc<Catalog>, CatalogError> {
        self.cell
            .get_or_try_init(|| async { Catalog::load(self.source.as_ref()).map(Arc::new) })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::BuiltinSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;

    use crate::types::CatalogData;

    struct CountingSource {
        inner: BuiltinSource,
        fetches: StdArc<AtomicUsize>,
    }

    impl CatalogSource for CountingSource {
        fn fetch(&self) -> Result<CatalogData, CatalogError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch()
        }
    }

    #[tokio::test]
    async fn concurrent_first_use_loads_once() {
        let fetches = StdArc::new(AtomicUsize::new(0));
        let shared = StdArc::new(SharedCatalog::new(Box::new(CountingSource {
            inner: BuiltinSource,
            fetches: fetches.clone(),
        })));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move { shared.get().await.map(|_| ()) }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_get_returns_same_instance() {
        let shared = SharedCatalog::new(Box::new(BuiltinSource));
        let a = shared.get().await.unwrap();
        let b = shared.get().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
