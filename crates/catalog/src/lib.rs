//! Product catalog domain module.
//!
//! This crate contains the product lifecycle business rules, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod product;
pub mod review;

pub use product::{
    AddReview, AnalyticsCounters, BlackFridayWindow, CreateProduct, DeliveryLocation,
    EngagementKind, NewProduct, Product, ProductAttribute, ProductCommand, ProductEvent,
    ProductId, ProductImage, ProductStatus, Publish, SetFeatured, StockOperation, UpdateDetails,
    UpdateStock, DEFAULT_LOW_STOCK_THRESHOLD,
};
pub use review::{RatingSummary, Review};
