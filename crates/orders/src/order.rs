//! Order aggregate: line items, fulfilment status machine, payment tracking.
//!
//! # Invariants
//! - `total` is always the sum of line totals; both are computed at decision
//!   time and carried in events.
//! - Line items may only change while the order is `pending`.
//! - Status moves only along the fulfilment chain
//!   pending -> confirmed -> processing -> shipped -> delivered, with
//!   `cancelled` reachable from the first three and `refunded` only from
//!   `delivered` or a paid-then-cancelled order.
//! - `payment_status` is derived from `amount_paid` against `total`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopcore_catalog::ProductId;
use shopcore_core::{Aggregate, AggregateRoot, DomainError, EntityId, Event, UserId};

/// Strongly-typed order identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct OrderId(pub EntityId);

impl OrderId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.0.fmt(f)
    }
}

/// Fulfilment status. The strings are the stored-document compatibility
/// surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Refunded => "refunded",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    /// Derive the payment status from what has been paid against the total.
    pub fn derive(amount_paid: u64, total: u64) -> Self {
        if amount_paid == 0 {
            PaymentStatus::Unpaid
        } else if amount_paid < total {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Paid
        }
    }
}

/// A snapshot of a catalog product at placement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    /// Unit price in minor currency units, frozen at placement.
    pub unit_price: u64,
}

impl LineItem {
    pub fn line_total(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("line item name cannot be empty"));
        }
        if self.quantity == 0 {
            return Err(DomainError::validation(
                "line item quantity must be at least 1",
            ));
        }
        Ok(())
    }
}

fn total_of(items: &[LineItem]) -> u64 {
    items.iter().map(LineItem::line_total).sum()
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_id: Option<UserId>,
    pub customer_name: String,
    pub items: Vec<LineItem>,
    /// Sum of line totals, in minor currency units.
    pub total: u64,
    pub amount_paid: u64,
    pub payment_status: PaymentStatus,
    pub status: OrderStatus,
    pub placed_at: Option<DateTime<Utc>>,
    pub updated_by: Option<UserId>,
    pub version: u64,
    pub created: bool,
}

impl Order {
    /// Create an empty, not-yet-placed aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            customer_id: None,
            customer_name: String::new(),
            items: Vec::new(),
            total: 0,
            amount_paid: 0,
            payment_status: PaymentStatus::Unpaid,
            status: OrderStatus::Pending,
            placed_at: None,
            updated_by: None,
            version: 0,
            created: false,
        }
    }

    fn ensure_exists(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), DomainError> {
        self.ensure_exists()?;
        if self.status != OrderStatus::Pending {
            return Err(DomainError::conflict(format!(
                "line items can only change while pending, order is {}",
                self.status
            )));
        }
        Ok(())
    }

    /// Whether the fulfilment chain allows moving to `next` from here.
    fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self.status, next) {
            (Pending, Confirmed)
            | (Confirmed, Processing)
            | (Processing, Shipped)
            | (Shipped, Delivered) => true,
            (Pending | Confirmed | Processing, Cancelled) => true,
            (Delivered, Refunded) => true,
            // A cancelled order can still be refunded if money changed hands.
            (Cancelled, Refunded) => self.amount_paid > 0,
            _ => false,
        }
    }

    fn transition(
        &self,
        next: OrderStatus,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    ) -> Result<Vec<OrderEvent>, DomainError> {
        self.ensure_exists()?;
        if !self.can_transition_to(next) {
            return Err(DomainError::conflict(format!(
                "cannot move order from {} to {}",
                self.status, next
            )));
        }
        Ok(vec![OrderEvent::StatusChanged {
            status: next,
            actor,
            occurred_at,
        }])
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: PlaceOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub order_id: OrderId,
    pub customer_id: Option<UserId>,
    pub customer_name: String,
    pub items: Vec<LineItem>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    Place(PlaceOrder),
    AddItem {
        item: LineItem,
        occurred_at: DateTime<Utc>,
    },
    RemoveItem {
        product_id: ProductId,
        occurred_at: DateTime<Utc>,
    },
    Confirm {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    StartProcessing {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    Ship {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    Deliver {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    Cancel {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    Refund {
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    RecordPayment {
        amount: u64,
        occurred_at: DateTime<Utc>,
    },
}

/// Event: OrderPlaced. Carries the computed total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub order_id: OrderId,
    pub customer_id: Option<UserId>,
    pub customer_name: String,
    pub items: Vec<LineItem>,
    pub total: u64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    Placed(OrderPlaced),
    /// Carries the full recomputed line list and total.
    ItemsChanged {
        items: Vec<LineItem>,
        total: u64,
        occurred_at: DateTime<Utc>,
    },
    StatusChanged {
        status: OrderStatus,
        actor: Option<UserId>,
        occurred_at: DateTime<Utc>,
    },
    /// Carries the accumulated amount and the derived payment status.
    PaymentRecorded {
        amount: u64,
        amount_paid: u64,
        payment_status: PaymentStatus,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "orders.order.placed",
            OrderEvent::ItemsChanged { .. } => "orders.order.items_changed",
            OrderEvent::StatusChanged { .. } => "orders.order.status_changed",
            OrderEvent::PaymentRecorded { .. } => "orders.order.payment_recorded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::Placed(e) => e.occurred_at,
            OrderEvent::ItemsChanged { occurred_at, .. }
            | OrderEvent::StatusChanged { occurred_at, .. }
            | OrderEvent::PaymentRecorded { occurred_at, .. } => *occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::Placed(e) => {
                self.id = e.order_id;
                self.customer_id = e.customer_id;
                self.customer_name = e.customer_name.clone();
                self.items = e.items.clone();
                self.total = e.total;
                self.status = OrderStatus::Pending;
                self.placed_at = Some(e.occurred_at);
                self.created = true;
            }
            OrderEvent::ItemsChanged { items, total, .. } => {
                self.items = items.clone();
                self.total = *total;
                // Money already taken is re-classified against the new total.
                self.payment_status = PaymentStatus::derive(self.amount_paid, *total);
            }
            OrderEvent::StatusChanged { status, actor, .. } => {
                self.status = *status;
                self.updated_by = *actor;
            }
            OrderEvent::PaymentRecorded {
                amount_paid,
                payment_status,
                ..
            } => {
                self.amount_paid = *amount_paid;
                self.payment_status = *payment_status;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::Place(cmd) => self.handle_place(cmd),
            OrderCommand::AddItem { item, occurred_at } => {
                self.ensure_pending()?;
                item.validate()?;
                let mut items = self.items.clone();
                match items.iter_mut().find(|i| i.product_id == item.product_id) {
                    Some(existing) => {
                        existing.quantity = existing.quantity.saturating_add(item.quantity);
                    }
                    None => items.push(item.clone()),
                }
                let total = total_of(&items);
                Ok(vec![OrderEvent::ItemsChanged {
                    items,
                    total,
                    occurred_at: *occurred_at,
                }])
            }
            OrderCommand::RemoveItem {
                product_id,
                occurred_at,
            } => {
                self.ensure_pending()?;
                if !self.items.iter().any(|i| i.product_id == *product_id) {
                    return Err(DomainError::not_found());
                }
                let items: Vec<LineItem> = self
                    .items
                    .iter()
                    .filter(|i| i.product_id != *product_id)
                    .cloned()
                    .collect();
                if items.is_empty() {
                    return Err(DomainError::validation(
                        "an order must keep at least one line item",
                    ));
                }
                let total = total_of(&items);
                Ok(vec![OrderEvent::ItemsChanged {
                    items,
                    total,
                    occurred_at: *occurred_at,
                }])
            }
            OrderCommand::Confirm { actor, occurred_at } => {
                self.transition(OrderStatus::Confirmed, *actor, *occurred_at)
            }
            OrderCommand::StartProcessing { actor, occurred_at } => {
                self.transition(OrderStatus::Processing, *actor, *occurred_at)
            }
            OrderCommand::Ship { actor, occurred_at } => {
                self.transition(OrderStatus::Shipped, *actor, *occurred_at)
            }
            OrderCommand::Deliver { actor, occurred_at } => {
                self.transition(OrderStatus::Delivered, *actor, *occurred_at)
            }
            OrderCommand::Cancel { actor, occurred_at } => {
                self.transition(OrderStatus::Cancelled, *actor, *occurred_at)
            }
            OrderCommand::Refund { actor, occurred_at } => {
                self.transition(OrderStatus::Refunded, *actor, *occurred_at)
            }
            OrderCommand::RecordPayment {
                amount,
                occurred_at,
            } => {
                self.ensure_exists()?;
                if *amount == 0 {
                    return Err(DomainError::validation("payment amount must be positive"));
                }
                if matches!(
                    self.status,
                    OrderStatus::Cancelled | OrderStatus::Refunded
                ) {
                    return Err(DomainError::conflict(format!(
                        "cannot record a payment on a {} order",
                        self.status
                    )));
                }
                let amount_paid = self.amount_paid.saturating_add(*amount);
                Ok(vec![OrderEvent::PaymentRecorded {
                    amount: *amount,
                    amount_paid,
                    payment_status: PaymentStatus::derive(amount_paid, self.total),
                    occurred_at: *occurred_at,
                }])
            }
        }
    }
}

impl Order {
    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        if cmd.customer_name.trim().is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }
        if cmd.items.is_empty() {
            return Err(DomainError::validation(
                "an order needs at least one line item",
            ));
        }
        for item in &cmd.items {
            item.validate()?;
        }

        Ok(vec![OrderEvent::Placed(OrderPlaced {
            order_id: cmd.order_id,
            customer_id: cmd.customer_id,
            customer_name: cmd.customer_name.clone(),
            items: cmd.items.clone(),
            total: total_of(&cmd.items),
            occurred_at: cmd.occurred_at,
        })])
    }
}
