use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopcore_core::{
    Aggregate, AggregateRoot, DomainError, EntityId, Event, Slug, UserId,
};

use crate::review::{RatingSummary, Review};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

impl ProductId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Product status lifecycle.
///
/// `Scheduled` is a stored flag only; nothing in this workspace promotes it
/// to `Published` when the date arrives; that sweep belongs to an external
/// cron (see `Product::is_publish_due`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Draft,
    Published,
    Scheduled,
}

/// Catalog image. `asset_id` refers to the external asset host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    pub asset_id: String,
    pub alt_text: Option<String>,
}

/// Free-form name/value attribute pair (e.g. Size=Large).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub name: String,
    pub value: String,
}

/// Shipping destination offered for this product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLocation {
    pub name: String,
    /// Shipping cost in minor currency units.
    pub shipping_cost: u64,
    pub estimated_days: u32,
    pub is_available: bool,
}

/// Time-boxed Black-Friday price override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlackFridayWindow {
    /// Override price in minor currency units.
    pub price: u64,
    pub active: bool,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl BlackFridayWindow {
    /// The override applies only while active and inside its date window.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.active && self.starts_at <= now && now <= self.ends_at
    }
}

/// Monotonic engagement counters plus the derived conversion rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsCounters {
    pub views: u64,
    pub clicks: u64,
    pub add_to_cart: u64,
    pub purchases: u64,
    /// `purchases / views * 100`, recomputed on each purchase; 0 when there
    /// are no views yet.
    pub conversion_rate: f64,
}

/// Engagement signal kinds tracked per product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EngagementKind {
    View,
    Click,
    AddToCart,
    Purchase,
}

/// Stock mutation semantics. `Subtract` clamps the result at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    Set(u32),
    Add(u32),
    Subtract(u32),
}

/// Everything the caller supplies when creating a product.
///
/// `discount_percent` is caller-supplied, never derived from base/sale price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    /// Price in minor currency units.
    pub base_price: u64,
    pub sale_price: Option<u64>,
    pub discount_percent: u8,
    pub black_friday: Option<BlackFridayWindow>,
    pub stock: u32,
    pub low_stock_threshold: Option<u32>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub images: Vec<ProductImage>,
    pub attributes: Vec<ProductAttribute>,
    pub delivery_locations: Vec<DeliveryLocation>,
}

pub const DEFAULT_LOW_STOCK_THRESHOLD: u32 = 10;

/// Aggregate root: Product.
///
/// Persisted whole as one document; the serde field names and enum strings
/// are the storage compatibility surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub slug: Slug,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub base_price: u64,
    pub sale_price: Option<u64>,
    pub discount_percent: u8,
    pub black_friday: Option<BlackFridayWindow>,
    pub stock: u32,
    pub low_stock_threshold: u32,
    /// Globally unique among products that have one (sparse uniqueness).
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub images: Vec<ProductImage>,
    /// Always the first image's URL, cleared when the list empties.
    pub thumbnail: Option<String>,
    pub attributes: Vec<ProductAttribute>,
    pub featured: bool,
    pub featured_end_date: Option<DateTime<Utc>>,
    pub status: ProductStatus,
    pub publish_date: Option<DateTime<Utc>>,
    pub scheduled_publish_date: Option<DateTime<Utc>>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub reviews: Vec<Review>,
    #[serde(flatten)]
    pub rating: RatingSummary,
    pub analytics: AnalyticsCounters,
    pub delivery_locations: Vec<DeliveryLocation>,
    pub created_by: Option<UserId>,
    pub updated_by: Option<UserId>,
    pub version: u64,
    pub created: bool,
}

impl Product {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ProductId) -> Self {
        Self {
            id,
            slug: Slug::from_raw(""),
            name: String::new(),
            description: String::new(),
            short_description: String::new(),
            category: String::new(),
            subcategory: None,
            brand: None,
            base_price: 0,
            sale_price: None,
            discount_percent: 0,
            black_friday: None,
            stock: 0,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            sku: None,
            barcode: None,
            images: Vec::new(),
            thumbnail: None,
            attributes: Vec::new(),
            featured: false,
            featured_end_date: None,
            status: ProductStatus::Draft,
            publish_date: None,
            scheduled_publish_date: None,
            is_deleted: false,
            deleted_at: None,
            reviews: Vec::new(),
            rating: RatingSummary::default(),
            analytics: AnalyticsCounters::default(),
            delivery_locations: Vec::new(),
            created_by: None,
            updated_by: None,
            version: 0,
            created: false,
        }
    }

    /// Effective selling price at `now`: a live Black-Friday override wins,
    /// then the sale price, then the base price.
    pub fn current_price(&self, now: DateTime<Utc>) -> u64 {
        if let Some(bf) = &self.black_friday {
            if bf.is_live(now) {
                return bf.price;
            }
        }
        self.sale_price.unwrap_or(self.base_price)
    }

    /// Effective discount against the base price, in whole percent.
    ///
    /// This is a read-side value (used to order the sale listing); it is not
    /// the caller-supplied `discount_percent` field.
    pub fn effective_discount_percent(&self, now: DateTime<Utc>) -> u8 {
        let current = self.current_price(now);
        if self.base_price == 0 || current >= self.base_price {
            return 0;
        }
        // Widen before multiplying so prices near u64::MAX cannot overflow.
        let discount =
            (u128::from(self.base_price - current) * 100) / u128::from(self.base_price);
        discount as u8
    }

    /// Whether the product is discounted at `now` (sale price below base, or
    /// a live Black-Friday override).
    pub fn is_on_sale(&self, now: DateTime<Utc>) -> bool {
        self.current_price(now) < self.base_price
    }

    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }

    /// Whether a scheduled publish date has passed. An external sweep may use
    /// this to promote `scheduled` products; nothing in this workspace does.
    pub fn is_publish_due(&self, now: DateTime<Utc>) -> bool {
        self.status == ProductStatus::Scheduled
            && self
                .scheduled_publish_date
                .is_some_and(|scheduled| scheduled <= now)
    }

    /// Customer-facing visibility: published and not soft-deleted.
    pub fn is_live(&self) -> bool {
        self.created && !self.is_deleted && self.status == ProductStatus::Published
    }

    fn ensure_exists(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    /// Soft-deleted products are not-found for every operation except restore.
    fn ensure_not_deleted(&self) -> Result<(), DomainError> {
        self.ensure_exists()?;
        if self.is_deleted {
            return Err(DomainError::not_found());
        }
        Ok(())
    }
}

impl AggregateRoot for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProduct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProduct {
    pub product_id: ProductId,
    pub details: NewProduct,
    pub actor: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateDetails.
///
/// `None` leaves a field untouched. For clearable fields the double-`Option`
/// convention applies: `Some(None)` clears, `Some(Some(v))` sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateDetails {
    pub name: Option<String>,
    pub description: Option<String>,
    pub short_description: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<Option<String>>,
    pub brand: Option<Option<String>>,
    pub base_price: Option<u64>,
    pub sale_price: Option<Option<u64>>,
    pub discount_percent: Option<u8>,
    pub black_friday: Option<Option<BlackFridayWindow>>,
    pub actor: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Publish (immediately, or at a future date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publish {
    pub scheduled_for: Option<DateTime<Utc>>,
    pub actor: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddReview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddReview {
    pub review: Review,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateStock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateStock {
    pub operation: StockOperation,
    pub actor: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetFeatured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetFeatured {
    pub featured: bool,
    pub until: Option<DateTime<Utc>>,
    pub actor: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductCommand {
    Create(CreateProduct),
    UpdateDetails(UpdateDetails),
    Publish(Publish),
    Unpublish {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    SoftDelete {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    Restore {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    AddReview(AddReview),
    Track {
        kind: EngagementKind,
        occurred_at: DateTime<Utc>,
    },
    UpdateStock(UpdateStock),
    AddImage {
        image: ProductImage,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    RemoveImage {
        asset_id: String,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    SetFeatured(SetFeatured),
}

/// Event: ProductCreated. Carries the derived slug and normalized identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductCreated {
    pub product_id: ProductId,
    pub slug: Slug,
    pub details: NewProduct,
    pub thumbnail: Option<String>,
    pub actor: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DetailsUpdated. `slug` is present only when the name changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailsUpdated {
    pub changes: UpdateDetails,
    pub slug: Option<Slug>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReviewAdded. Carries the recomputed summary so `apply` stays a fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewAdded {
    pub review: Review,
    pub summary: RatingSummary,
    pub occurred_at: DateTime<Utc>,
}

/// Event: EngagementTracked. Carries the resulting counter snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementTracked {
    pub kind: EngagementKind,
    pub counters: AnalyticsCounters,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductEvent {
    Created(ProductCreated),
    DetailsUpdated(DetailsUpdated),
    Published {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    Scheduled {
        scheduled_for: DateTime<Utc>,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    Unpublished {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    SoftDeleted {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    Restored {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    ReviewAdded(ReviewAdded),
    EngagementTracked(EngagementTracked),
    /// Carries the resulting stock level (clamping happens at decision time).
    StockUpdated {
        stock: u32,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    ImageAdded {
        image: ProductImage,
        thumbnail: Option<String>,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    ImageRemoved {
        asset_id: String,
        thumbnail: Option<String>,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    FeaturedChanged {
        featured: bool,
        until: Option<DateTime<Utc>>,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for ProductEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductEvent::Created(_) => "catalog.product.created",
            ProductEvent::DetailsUpdated(_) => "catalog.product.details_updated",
            ProductEvent::Published { .. } => "catalog.product.published",
            ProductEvent::Scheduled { .. } => "catalog.product.scheduled",
            ProductEvent::Unpublished { .. } => "catalog.product.unpublished",
            ProductEvent::SoftDeleted { .. } => "catalog.product.soft_deleted",
            ProductEvent::Restored { .. } => "catalog.product.restored",
            ProductEvent::ReviewAdded(_) => "catalog.product.review_added",
            ProductEvent::EngagementTracked(_) => "catalog.product.engagement_tracked",
            ProductEvent::StockUpdated { .. } => "catalog.product.stock_updated",
            ProductEvent::ImageAdded { .. } => "catalog.product.image_added",
            ProductEvent::ImageRemoved { .. } => "catalog.product.image_removed",
            ProductEvent::FeaturedChanged { .. } => "catalog.product.featured_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductEvent::Created(e) => e.occurred_at,
            ProductEvent::DetailsUpdated(e) => e.occurred_at,
            ProductEvent::Published { occurred_at, .. }
            | ProductEvent::Scheduled { occurred_at, .. }
            | ProductEvent::Unpublished { occurred_at, .. }
            | ProductEvent::SoftDeleted { occurred_at, .. }
            | ProductEvent::Restored { occurred_at, .. }
            | ProductEvent::StockUpdated { occurred_at, .. }
            | ProductEvent::ImageAdded { occurred_at, .. }
            | ProductEvent::ImageRemoved { occurred_at, .. }
            | ProductEvent::FeaturedChanged { occurred_at, .. } => *occurred_at,
            ProductEvent::ReviewAdded(e) => e.occurred_at,
            ProductEvent::EngagementTracked(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Product {
    type Command = ProductCommand;
    type Event = ProductEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductEvent::Created(e) => self.apply_created(e),
            ProductEvent::DetailsUpdated(e) => self.apply_details_updated(e),
            ProductEvent::Published { actor, occurred_at } => {
                self.status = ProductStatus::Published;
                self.publish_date = Some(*occurred_at);
                self.scheduled_publish_date = None;
                self.updated_by = *actor;
            }
            ProductEvent::Scheduled {
                scheduled_for,
                actor,
                ..
            } => {
                self.status = ProductStatus::Scheduled;
                self.scheduled_publish_date = Some(*scheduled_for);
                self.updated_by = *actor;
            }
            ProductEvent::Unpublished { actor, .. } => {
                self.status = ProductStatus::Draft;
                self.publish_date = None;
                self.scheduled_publish_date = None;
                self.updated_by = *actor;
            }
            ProductEvent::SoftDeleted { actor, occurred_at } => {
                self.is_deleted = true;
                self.deleted_at = Some(*occurred_at);
                self.updated_by = *actor;
            }
            ProductEvent::Restored { actor, .. } => {
                self.is_deleted = false;
                self.deleted_at = None;
                self.updated_by = *actor;
            }
            ProductEvent::ReviewAdded(e) => {
                self.reviews.push(e.review.clone());
                self.rating = e.summary.clone();
            }
            ProductEvent::EngagementTracked(e) => {
                self.analytics = e.counters.clone();
            }
            ProductEvent::StockUpdated { stock, actor, .. } => {
                self.stock = *stock;
                self.updated_by = *actor;
            }
            ProductEvent::ImageAdded {
                image,
                thumbnail,
                actor,
                ..
            } => {
                self.images.push(image.clone());
                self.thumbnail = thumbnail.clone();
                self.updated_by = *actor;
            }
            ProductEvent::ImageRemoved {
                asset_id,
                thumbnail,
                actor,
                ..
            } => {
                self.images.retain(|img| img.asset_id != *asset_id);
                self.thumbnail = thumbnail.clone();
                self.updated_by = *actor;
            }
            ProductEvent::FeaturedChanged {
                featured,
                until,
                actor,
                ..
            } => {
                self.featured = *featured;
                self.featured_end_date = *until;
                self.updated_by = *actor;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductCommand::Create(cmd) => self.handle_create(cmd),
            ProductCommand::UpdateDetails(cmd) => self.handle_update_details(cmd),
            ProductCommand::Publish(cmd) => self.handle_publish(cmd),
            ProductCommand::Unpublish { actor, occurred_at } => {
                self.ensure_not_deleted()?;
                Ok(vec![ProductEvent::Unpublished {
                    actor: *actor,
                    occurred_at: *occurred_at,
                }])
            }
            ProductCommand::SoftDelete { actor, occurred_at } => {
                self.ensure_exists()?;
                if self.is_deleted {
                    return Err(DomainError::conflict("product is already deleted"));
                }
                Ok(vec![ProductEvent::SoftDeleted {
                    actor: *actor,
                    occurred_at: *occurred_at,
                }])
            }
            ProductCommand::Restore { actor, occurred_at } => {
                self.ensure_exists()?;
                if !self.is_deleted {
                    return Err(DomainError::conflict("product is not deleted"));
                }
                Ok(vec![ProductEvent::Restored {
                    actor: *actor,
                    occurred_at: *occurred_at,
                }])
            }
            ProductCommand::AddReview(cmd) => self.handle_add_review(cmd),
            ProductCommand::Track { kind, occurred_at } => self.handle_track(*kind, *occurred_at),
            ProductCommand::UpdateStock(cmd) => self.handle_update_stock(cmd),
            ProductCommand::AddImage {
                image,
                actor,
                occurred_at,
            } => {
                self.ensure_not_deleted()?;
                let mut images = self.images.clone();
                images.push(image.clone());
                Ok(vec![ProductEvent::ImageAdded {
                    image: image.clone(),
                    thumbnail: Self::thumbnail_of(&images),
                    actor: *actor,
                    occurred_at: *occurred_at,
                }])
            }
            ProductCommand::RemoveImage {
                asset_id,
                actor,
                occurred_at,
            } => self.handle_remove_image(asset_id, *actor, *occurred_at),
            ProductCommand::SetFeatured(cmd) => {
                self.ensure_not_deleted()?;
                Ok(vec![ProductEvent::FeaturedChanged {
                    featured: cmd.featured,
                    until: cmd.until,
                    actor: cmd.actor,
                    occurred_at: cmd.occurred_at,
                }])
            }
        }
    }
}

impl Product {
    /// The thumbnail always tracks the first image's URL.
    fn thumbnail_of(images: &[ProductImage]) -> Option<String> {
        images.first().map(|img| img.url.clone())
    }

    fn handle_create(&self, cmd: &CreateProduct) -> Result<Vec<ProductEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("product already exists"));
        }

        let details = &cmd.details;
        if details.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if details.category.trim().is_empty() {
            return Err(DomainError::validation("category cannot be empty"));
        }
        if details.discount_percent > 100 {
            return Err(DomainError::validation(
                "discount percent must be between 0 and 100",
            ));
        }

        let slug = Slug::derive(&details.name)?;

        // Empty-string SKU/barcode means "no identifier": sparse uniqueness
        // only applies among present values.
        let mut details = details.clone();
        details.sku = details.sku.filter(|s| !s.trim().is_empty());
        details.barcode = details.barcode.filter(|s| !s.trim().is_empty());

        let thumbnail = Self::thumbnail_of(&details.images);
        Ok(vec![ProductEvent::Created(ProductCreated {
            product_id: cmd.product_id,
            slug,
            details,
            thumbnail,
            actor: cmd.actor,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn apply_created(&mut self, e: &ProductCreated) {
        let d = &e.details;
        self.id = e.product_id;
        self.slug = e.slug.clone();
        self.name = d.name.clone();
        self.description = d.description.clone();
        self.short_description = d.short_description.clone();
        self.category = d.category.clone();
        self.subcategory = d.subcategory.clone();
        self.brand = d.brand.clone();
        self.base_price = d.base_price;
        self.sale_price = d.sale_price;
        self.discount_percent = d.discount_percent;
        self.black_friday = d.black_friday.clone();
        self.stock = d.stock;
        self.low_stock_threshold = d.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD);
        self.sku = d.sku.clone();
        self.barcode = d.barcode.clone();
        self.images = d.images.clone();
        self.thumbnail = e.thumbnail.clone();
        self.attributes = d.attributes.clone();
        self.delivery_locations = d.delivery_locations.clone();
        self.created_by = e.actor;
        self.updated_by = e.actor;
        self.created = true;
    }

    fn handle_update_details(&self, cmd: &UpdateDetails) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_not_deleted()?;

        if let Some(name) = &cmd.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
        }
        if let Some(category) = &cmd.category {
            if category.trim().is_empty() {
                return Err(DomainError::validation("category cannot be empty"));
            }
        }
        if let Some(discount) = cmd.discount_percent {
            if discount > 100 {
                return Err(DomainError::validation(
                    "discount percent must be between 0 and 100",
                ));
            }
        }

        // Slug is regenerated whenever the name changes.
        let slug = match &cmd.name {
            Some(name) if *name != self.name => Some(Slug::derive(name)?),
            _ => None,
        };

        Ok(vec![ProductEvent::DetailsUpdated(DetailsUpdated {
            changes: cmd.clone(),
            slug,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn apply_details_updated(&mut self, e: &DetailsUpdated) {
        let c = &e.changes;
        if let Some(name) = &c.name {
            self.name = name.clone();
        }
        if let Some(slug) = &e.slug {
            self.slug = slug.clone();
        }
        if let Some(description) = &c.description {
            self.description = description.clone();
        }
        if let Some(short_description) = &c.short_description {
            self.short_description = short_description.clone();
        }
        if let Some(category) = &c.category {
            self.category = category.clone();
        }
        if let Some(subcategory) = &c.subcategory {
            self.subcategory = subcategory.clone();
        }
        if let Some(brand) = &c.brand {
            self.brand = brand.clone();
        }
        if let Some(base_price) = c.base_price {
            self.base_price = base_price;
        }
        if let Some(sale_price) = &c.sale_price {
            self.sale_price = *sale_price;
        }
        if let Some(discount_percent) = c.discount_percent {
            self.discount_percent = discount_percent;
        }
        if let Some(black_friday) = &c.black_friday {
            self.black_friday = black_friday.clone();
        }
        self.updated_by = c.actor;
    }

    fn handle_publish(&self, cmd: &Publish) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_not_deleted()?;

        match cmd.scheduled_for {
            // A future date schedules; a past (or absent) date publishes now.
            Some(scheduled_for) if scheduled_for > cmd.occurred_at => {
                Ok(vec![ProductEvent::Scheduled {
                    scheduled_for,
                    actor: cmd.actor,
                    occurred_at: cmd.occurred_at,
                }])
            }
            _ => Ok(vec![ProductEvent::Published {
                actor: cmd.actor,
                occurred_at: cmd.occurred_at,
            }]),
        }
    }

    fn handle_add_review(&self, cmd: &AddReview) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_not_deleted()?;
        cmd.review.validate()?;

        let mut reviews = self.reviews.clone();
        reviews.push(cmd.review.clone());

        Ok(vec![ProductEvent::ReviewAdded(ReviewAdded {
            review: cmd.review.clone(),
            summary: RatingSummary::recompute(&reviews),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_track(
        &self,
        kind: EngagementKind,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_not_deleted()?;

        let mut counters = self.analytics.clone();
        match kind {
            EngagementKind::View => counters.views += 1,
            EngagementKind::Click => counters.clicks += 1,
            EngagementKind::AddToCart => counters.add_to_cart += 1,
            EngagementKind::Purchase => {
                counters.purchases += 1;
                counters.conversion_rate = if counters.views == 0 {
                    0.0
                } else {
                    counters.purchases as f64 / counters.views as f64 * 100.0
                };
            }
        }

        Ok(vec![ProductEvent::EngagementTracked(EngagementTracked {
            kind,
            counters,
            occurred_at,
        })])
    }

    fn handle_update_stock(&self, cmd: &UpdateStock) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_not_deleted()?;

        let stock = match cmd.operation {
            StockOperation::Set(quantity) => quantity,
            StockOperation::Add(quantity) => self.stock.saturating_add(quantity),
            // Clamp at zero: stock never goes negative.
            StockOperation::Subtract(quantity) => self.stock.saturating_sub(quantity),
        };

        Ok(vec![ProductEvent::StockUpdated {
            stock,
            actor: cmd.actor,
            occurred_at: cmd.occurred_at,
        }])
    }

    fn handle_remove_image(
        &self,
        asset_id: &str,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<ProductEvent>, DomainError> {
        self.ensure_not_deleted()?;

        if !self.images.iter().any(|img| img.asset_id == asset_id) {
            return Err(DomainError::validation(format!(
                "no image with asset id '{asset_id}'"
            )));
        }

        let remaining: Vec<ProductImage> = self
            .images
            .iter()
            .filter(|img| img.asset_id != asset_id)
            .cloned()
            .collect();

        Ok(vec![ProductEvent::ImageRemoved {
            asset_id: asset_id.to_string(),
            thumbnail: Self::thumbnail_of(&remaining),
            actor,
            occurred_at,
        }])
    }
}
