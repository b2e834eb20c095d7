//! End-to-end storefront scenario across the domain crates and the stores:
//! create and publish a product, take a review and a purchase, check pricing
//! through a Black-Friday window, register a customer and walk an order to
//! paid.

use chrono::{DateTime, Duration, Utc};

use shopcore_accounts::{RegisterUser, User, UserCommand};
use shopcore_catalog::{
    AddReview, BlackFridayWindow, CreateProduct, EngagementKind, NewProduct, Product,
    ProductCommand, ProductId, Publish, Review, SetFeatured, StockOperation, UpdateStock,
};
use shopcore_core::{Aggregate, EntityId, UserId};
use shopcore_orders::{
    LineItem, Order, OrderCommand, OrderId, OrderStatus, PaymentStatus, PlaceOrder,
};
use shopcore_store::{
    InMemoryOrderStore, InMemoryProductStore, InMemoryUserStore, OrderStore, ProductStore,
    StoreError, UserStore,
};

fn run_product(product: &mut Product, cmd: ProductCommand) {
    let events = product.handle(&cmd).expect("product command");
    for event in &events {
        product.apply(event);
    }
}

fn run_user(user: &mut User, cmd: UserCommand) {
    let events = user.handle(&cmd).expect("user command");
    for event in &events {
        user.apply(event);
    }
}

fn run_order(order: &mut Order, cmd: OrderCommand) {
    let events = order.handle(&cmd).expect("order command");
    for event in &events {
        order.apply(event);
    }
}

fn scale_set(now: DateTime<Utc>) -> NewProduct {
    NewProduct {
        name: "Fish Scale Set!! 2025".to_string(),
        description: "Premium stainless scale set.".to_string(),
        short_description: "Scale set".to_string(),
        category: "scales".to_string(),
        subcategory: None,
        brand: Some("ScaleCo".to_string()),
        base_price: 1000,
        sale_price: Some(800),
        discount_percent: 20,
        black_friday: Some(BlackFridayWindow {
            price: 500,
            active: true,
            starts_at: now + Duration::days(10),
            ends_at: now + Duration::days(12),
        }),
        stock: 25,
        low_stock_threshold: None,
        sku: Some("SCALE-2025".to_string()),
        barcode: None,
        images: Vec::new(),
        attributes: Vec::new(),
        delivery_locations: Vec::new(),
    }
}

#[test]
fn storefront_flow_end_to_end() -> anyhow::Result<()> {
    shopcore_observability::init();
    let now = Utc::now();

    // --- catalog: create, publish, feature ---
    let mut product = Product::empty(ProductId::new(EntityId::new()));
    let create = ProductCommand::Create(CreateProduct {
        product_id: product.id,
        details: scale_set(now),
        actor: None,
        occurred_at: now,
    });
    run_product(&mut product, create);
    assert_eq!(product.slug.as_str(), "fish-scale-set-2025");

    run_product(
        &mut product,
        ProductCommand::Publish(Publish {
            scheduled_for: None,
            actor: None,
            occurred_at: now,
        }),
    );
    run_product(
        &mut product,
        ProductCommand::SetFeatured(SetFeatured {
            featured: true,
            until: Some(now + Duration::days(30)),
            actor: None,
            occurred_at: now,
        }),
    );

    // Pricing walks sale price outside the window, override inside it.
    assert_eq!(product.current_price(now), 800);
    assert_eq!(product.current_price(now + Duration::days(11)), 500);
    assert_eq!(product.current_price(now + Duration::days(13)), 800);

    let products = InMemoryProductStore::new();
    products.save(&product)?;

    // A second product with the same name collides on the slug.
    let mut twin = Product::empty(ProductId::new(EntityId::new()));
    let create_twin = ProductCommand::Create(CreateProduct {
        product_id: twin.id,
        details: scale_set(now),
        actor: None,
        occurred_at: now,
    });
    run_product(&mut twin, create_twin);
    assert!(matches!(
        products.save(&twin).unwrap_err(),
        StoreError::Conflict(_)
    ));

    // --- engagement and reviews ---
    run_product(
        &mut product,
        ProductCommand::Track {
            kind: EngagementKind::View,
            occurred_at: now,
        },
    );
    run_product(
        &mut product,
        ProductCommand::Track {
            kind: EngagementKind::View,
            occurred_at: now,
        },
    );
    run_product(
        &mut product,
        ProductCommand::Track {
            kind: EngagementKind::Purchase,
            occurred_at: now,
        },
    );
    assert_eq!(product.analytics.conversion_rate, 50.0);

    run_product(
        &mut product,
        ProductCommand::AddReview(AddReview {
            review: Review {
                user_id: None,
                user_name: "Jane Doe".to_string(),
                rating: 4,
                title: "Solid".to_string(),
                comment: "Accurate and sturdy.".to_string(),
                verified: true,
                created_at: now,
            },
            occurred_at: now,
        }),
    );
    assert_eq!(product.rating.total_reviews, 1);
    assert_eq!(product.rating.average_rating, 4.0);

    // Purchase takes stock with it.
    run_product(
        &mut product,
        ProductCommand::UpdateStock(UpdateStock {
            operation: StockOperation::Subtract(1),
            actor: None,
            occurred_at: now,
        }),
    );
    assert_eq!(product.stock, 24);

    products.save(&product)?;

    // --- storefront queries ---
    let featured = products.featured_products(now, 10)?;
    assert_eq!(featured.len(), 1);
    assert_eq!(featured[0].id, product.id);

    let sale = products.sale_products(now, 10)?;
    assert_eq!(sale.len(), 1);

    assert!(products.low_stock_products()?.is_empty());

    // --- accounts: register and log in ---
    let users = InMemoryUserStore::new();
    let password_hash =
        shopcore_accounts::password::hash_password("correct horse")?;

    let mut customer = User::empty(UserId::new());
    let register = UserCommand::Register(RegisterUser {
        user_id: customer.id,
        email: "Jane.Doe@Example.com".to_string(),
        name: "Jane Doe".to_string(),
        password_hash,
        role: None,
        actor: None,
        actor_role: None,
        occurred_at: now,
    });
    run_user(&mut customer, register);
    users.save(&customer)?;

    let email = shopcore_core::EmailAddress::parse("jane.doe@example.com")?;
    let mut loaded = users.find_by_email(&email)?;
    let outcome = loaded.attempt_login("correct horse", now)?;
    assert!(outcome.success);
    for event in &outcome.events {
        loaded.apply(event);
    }
    users.save(&loaded)?;

    // --- orders: place, confirm, pay ---
    let orders = InMemoryOrderStore::new();
    let mut order = Order::empty(OrderId::new(EntityId::new()));
    let place = OrderCommand::Place(PlaceOrder {
        order_id: order.id,
        customer_id: Some(customer.id),
        customer_name: customer.name.clone(),
        items: vec![LineItem {
            product_id: product.id,
            name: product.name.clone(),
            quantity: 1,
            unit_price: product.current_price(now),
        }],
        occurred_at: now,
    });
    run_order(&mut order, place);
    assert_eq!(order.total, 800);

    run_order(
        &mut order,
        OrderCommand::Confirm {
            actor: None,
            occurred_at: now,
        },
    );
    run_order(
        &mut order,
        OrderCommand::RecordPayment {
            amount: 800,
            occurred_at: now,
        },
    );
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    orders.save(&order)?;

    let history = orders.for_customer(customer.id)?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, OrderStatus::Confirmed);

    // --- soft delete removes the product from the storefront ---
    run_product(
        &mut product,
        ProductCommand::SoftDelete {
            actor: None,
            occurred_at: now,
        },
    );
    products.save(&product)?;

    assert_eq!(
        products.find_active(product.id).unwrap_err(),
        StoreError::NotFound
    );
    assert!(products.featured_products(now, 10)?.is_empty());
    assert!(products.sale_products(now, 10)?.is_empty());

    Ok(())
}
