//! Product persistence and the canned storefront queries.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use shopcore_catalog::{Product, ProductId, ProductStatus};
use shopcore_core::Slug;

use crate::error::{StoreError, StoreResult};

/// Product persistence boundary.
///
/// `save` is a whole-document last-write-wins upsert. Uniqueness is enforced
/// here, not in the aggregate: the slug always, sku/barcode only among
/// products that have one (sparse).
///
/// Every query helper excludes soft-deleted products.
pub trait ProductStore {
    fn save(&self, product: &Product) -> StoreResult<()>;

    /// Admin lookup: returns the product even when soft-deleted.
    fn find(&self, id: ProductId) -> StoreResult<Product>;

    /// Customer-facing lookup: a soft-deleted product is `NotFound`.
    fn find_active(&self, id: ProductId) -> StoreResult<Product>;

    fn find_by_slug(&self, slug: &Slug) -> StoreResult<Product>;

    /// Featured products whose window is still open at `now`, published
    /// only, newest publish first.
    fn featured_products(&self, now: DateTime<Utc>, limit: usize) -> StoreResult<Vec<Product>>;

    /// Published products selling below base price at `now` (sale price or a
    /// live Black-Friday window), steepest effective discount first.
    fn sale_products(&self, now: DateTime<Utc>, limit: usize) -> StoreResult<Vec<Product>>;

    /// Products at or below their low-stock threshold (restock report).
    fn low_stock_products(&self) -> StoreResult<Vec<Product>>;

    fn products_by_status(&self, status: ProductStatus) -> StoreResult<Vec<Product>>;
}

/// In-memory product store.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, HashMap<ProductId, Product>>> {
        self.inner
            .read()
            .map_err(|_| StoreError::backend("product store lock poisoned"))
    }

    /// All live (not soft-deleted) products, for the query helpers.
    fn live<F>(&self, mut keep: F) -> StoreResult<Vec<Product>>
    where
        F: FnMut(&Product) -> bool,
    {
        let guard = self.read()?;
        Ok(guard
            .values()
            .filter(|p| !p.is_deleted && keep(p))
            .cloned()
            .collect())
    }
}

impl ProductStore for InMemoryProductStore {
    fn save(&self, product: &Product) -> StoreResult<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| StoreError::backend("product store lock poisoned"))?;

        for other in guard.values().filter(|p| p.id != product.id) {
            if other.slug == product.slug {
                tracing::warn!(slug = %product.slug, "duplicate product slug rejected");
                return Err(StoreError::conflict("product slug already in use"));
            }
            if product.sku.is_some() && other.sku == product.sku {
                tracing::warn!(sku = ?product.sku, "duplicate sku rejected");
                return Err(StoreError::conflict("sku already in use"));
            }
            if product.barcode.is_some() && other.barcode == product.barcode {
                tracing::warn!(barcode = ?product.barcode, "duplicate barcode rejected");
                return Err(StoreError::conflict("barcode already in use"));
            }
        }

        tracing::debug!(product_id = %product.id, version = product.version, "product saved");
        guard.insert(product.id, product.clone());
        Ok(())
    }

    fn find(&self, id: ProductId) -> StoreResult<Product> {
        self.read()?.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn find_active(&self, id: ProductId) -> StoreResult<Product> {
        let product = self.find(id)?;
        if product.is_deleted {
            return Err(StoreError::NotFound);
        }
        Ok(product)
    }

    fn find_by_slug(&self, slug: &Slug) -> StoreResult<Product> {
        self.read()?
            .values()
            .find(|p| !p.is_deleted && p.slug == *slug)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn featured_products(&self, now: DateTime<Utc>, limit: usize) -> StoreResult<Vec<Product>> {
        let mut products = self.live(|p| {
            p.featured
                && p.status == ProductStatus::Published
                && p.featured_end_date.is_none_or(|end| end >= now)
        })?;
        products.sort_by(|a, b| b.publish_date.cmp(&a.publish_date));
        products.truncate(limit);
        Ok(products)
    }

    fn sale_products(&self, now: DateTime<Utc>, limit: usize) -> StoreResult<Vec<Product>> {
        let mut products =
            self.live(|p| p.status == ProductStatus::Published && p.is_on_sale(now))?;
        products.sort_by(|a, b| {
            b.effective_discount_percent(now)
                .cmp(&a.effective_discount_percent(now))
        });
        products.truncate(limit);
        Ok(products)
    }

    fn low_stock_products(&self) -> StoreResult<Vec<Product>> {
        self.live(Product::is_low_stock)
    }

    fn products_by_status(&self, status: ProductStatus) -> StoreResult<Vec<Product>> {
        self.live(|p| p.status == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shopcore_catalog::{
        CreateProduct, NewProduct, ProductCommand, Publish, SetFeatured, StockOperation,
        UpdateStock,
    };
    use shopcore_core::{Aggregate, EntityId};

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn run(product: &mut Product, cmd: ProductCommand) {
        let events = product.handle(&cmd).unwrap();
        for event in &events {
            product.apply(event);
        }
    }

    fn new_product(name: &str, base_price: u64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            description: String::new(),
            short_description: String::new(),
            category: "scales".to_string(),
            subcategory: None,
            brand: None,
            base_price,
            sale_price: None,
            discount_percent: 0,
            black_friday: None,
            stock: 30,
            low_stock_threshold: None,
            sku: None,
            barcode: None,
            images: Vec::new(),
            attributes: Vec::new(),
            delivery_locations: Vec::new(),
        }
    }

    fn created(name: &str, base_price: u64) -> Product {
        let mut product = Product::empty(ProductId::new(EntityId::new()));
        let cmd = ProductCommand::Create(CreateProduct {
            product_id: product.id,
            details: new_product(name, base_price),
            actor: None,
            occurred_at: test_time(),
        });
        run(&mut product, cmd);
        product
    }

    fn published(name: &str, base_price: u64) -> Product {
        let mut product = created(name, base_price);
        run(
            &mut product,
            ProductCommand::Publish(Publish {
                scheduled_for: None,
                actor: None,
                occurred_at: test_time(),
            }),
        );
        product
    }

    #[test]
    fn save_then_find_round_trips() {
        let store = InMemoryProductStore::new();
        let product = created("Bench scale", 10_000);
        store.save(&product).unwrap();
        assert_eq!(store.find(product.id).unwrap(), product);
    }

    #[test]
    fn duplicate_slug_is_a_conflict() {
        let store = InMemoryProductStore::new();
        store.save(&created("Bench scale", 10_000)).unwrap();
        let err = store.save(&created("Bench scale", 12_000)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn sku_uniqueness_is_sparse() {
        let store = InMemoryProductStore::new();

        // Two products without a sku coexist.
        store.save(&created("Scale A", 1_000)).unwrap();
        store.save(&created("Scale B", 1_000)).unwrap();

        let mut with_sku = created("Scale C", 1_000);
        with_sku.sku = Some("SKU-1".to_string());
        store.save(&with_sku).unwrap();

        let mut dup = created("Scale D", 1_000);
        dup.sku = Some("SKU-1".to_string());
        assert!(matches!(
            store.save(&dup).unwrap_err(),
            StoreError::Conflict(_)
        ));
    }

    #[test]
    fn save_is_last_write_wins() {
        let store = InMemoryProductStore::new();
        let mut product = created("Bench scale", 10_000);
        store.save(&product).unwrap();

        // A stale copy overwrites without any version check.
        let stale = product.clone();
        run(
            &mut product,
            ProductCommand::UpdateStock(UpdateStock {
                operation: StockOperation::Set(99),
                actor: None,
                occurred_at: test_time(),
            }),
        );
        store.save(&product).unwrap();
        store.save(&stale).unwrap();
        assert_eq!(store.find(product.id).unwrap().stock, stale.stock);
    }

    #[test]
    fn soft_deleted_is_not_found_on_customer_path() {
        let store = InMemoryProductStore::new();
        let mut product = published("Bench scale", 10_000);
        run(
            &mut product,
            ProductCommand::SoftDelete {
                actor: None,
                occurred_at: test_time(),
            },
        );
        store.save(&product).unwrap();

        assert_eq!(store.find_active(product.id).unwrap_err(), StoreError::NotFound);
        assert!(store.find(product.id).is_ok());
        assert!(store
            .products_by_status(ProductStatus::Published)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn featured_query_respects_window_and_order() {
        let store = InMemoryProductStore::new();
        let now = test_time();

        let mut older = published("Old featured", 1_000);
        run(
            &mut older,
            ProductCommand::SetFeatured(SetFeatured {
                featured: true,
                until: None,
                actor: None,
                occurred_at: now,
            }),
        );
        older.publish_date = Some(now - Duration::days(2));
        store.save(&older).unwrap();

        let mut newer = published("New featured", 1_000);
        run(
            &mut newer,
            ProductCommand::SetFeatured(SetFeatured {
                featured: true,
                until: Some(now + Duration::days(1)),
                actor: None,
                occurred_at: now,
            }),
        );
        newer.publish_date = Some(now - Duration::days(1));
        store.save(&newer).unwrap();

        let mut expired = published("Expired featured", 1_000);
        run(
            &mut expired,
            ProductCommand::SetFeatured(SetFeatured {
                featured: true,
                until: Some(now - Duration::hours(1)),
                actor: None,
                occurred_at: now,
            }),
        );
        store.save(&expired).unwrap();

        let featured = store.featured_products(now, 10).unwrap();
        assert_eq!(featured.len(), 2);
        assert_eq!(featured[0].id, newer.id);
        assert_eq!(featured[1].id, older.id);
    }

    #[test]
    fn featured_window_ending_now_is_still_open() {
        let store = InMemoryProductStore::new();
        let now = test_time();

        let mut product = published("Ends now", 1_000);
        run(
            &mut product,
            ProductCommand::SetFeatured(SetFeatured {
                featured: true,
                until: Some(now),
                actor: None,
                occurred_at: now,
            }),
        );
        store.save(&product).unwrap();

        let featured = store.featured_products(now, 10).unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].id, product.id);
    }

    #[test]
    fn sale_query_sorts_by_effective_discount() {
        let store = InMemoryProductStore::new();
        let now = test_time();

        let mut shallow = published("Shallow sale", 10_000);
        shallow.sale_price = Some(9_000); // 10%
        store.save(&shallow).unwrap();

        let mut steep = published("Steep sale", 10_000);
        steep.sale_price = Some(5_000); // 50%
        store.save(&steep).unwrap();

        store.save(&published("Full price", 10_000)).unwrap();

        let sale = store.sale_products(now, 10).unwrap();
        assert_eq!(sale.len(), 2);
        assert_eq!(sale[0].id, steep.id);
        assert_eq!(sale[1].id, shallow.id);
    }

    #[test]
    fn low_stock_uses_threshold() {
        let store = InMemoryProductStore::new();

        let mut low = created("Low", 1_000);
        run(
            &mut low,
            ProductCommand::UpdateStock(UpdateStock {
                operation: StockOperation::Set(5),
                actor: None,
                occurred_at: test_time(),
            }),
        );
        store.save(&low).unwrap();
        store.save(&created("Plenty", 1_000)).unwrap();

        let report = store.low_stock_products().unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].id, low.id);
    }
}
