//! Order checkout saga with compensation and persisted status.
//!
//! Demonstrates:
//! - Steps with and without rollback
//! - Sharing typed data between steps through context tokens
//! - A storage strategy that logs every status change
//! - Compensation when shipping cannot be arranged

#![allow(dead_code)]

use async_trait::async_trait;
use sagaflow::prelude::*;
use sagaflow::ContextError;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone)]
struct Order {
    id: String,
    items: Vec<OrderItem>,
    country: String,
}

#[derive(Debug, Clone)]
struct OrderItem {
    product_id: String,
    quantity: u32,
    price_cents: u64,
}

#[derive(Debug)]
enum OrderError {
    Invalid(String),
    OutOfStock(String),
    Undeliverable(String),
    Missing(ContextError),
    Crashed(StepFault),
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderError::Invalid(msg) => write!(f, "invalid order: {}", msg),
            OrderError::OutOfStock(product) => write!(f, "out of stock: {}", product),
            OrderError::Undeliverable(country) => write!(f, "cannot ship to {}", country),
            OrderError::Missing(e) => write!(f, "{}", e),
            OrderError::Crashed(fault) => write!(f, "{}", fault),
        }
    }
}

impl From<StepFault> for OrderError {
    fn from(fault: StepFault) -> Self {
        OrderError::Crashed(fault)
    }
}

impl From<ContextError> for OrderError {
    fn from(error: ContextError) -> Self {
        OrderError::Missing(error)
    }
}

/// Context slots used by the checkout steps.
#[derive(Debug, Clone, Copy)]
struct Slots {
    order: ContextToken<Order>,
    stock: ContextToken<HashMap<String, u32>>,
    charged_cents: ContextToken<u64>,
}

#[derive(Debug)]
struct ValidateOrder(Slots);

#[async_trait]
impl Step for ValidateOrder {
    type Output = ();
    type Error = OrderError;

    async fn run(&self, ctx: &mut Context) -> Outcome<(), OrderError> {
        let order = match ctx.get_or_err(&self.0.order) {
            Ok(order) => order,
            Err(e) => return Outcome::error(e.into()),
        };
        if order.items.is_empty() {
            return Outcome::error(OrderError::Invalid(
                "order must contain at least one item".to_string(),
            ));
        }
        Outcome::success(())
    }
}

#[derive(Debug)]
struct ReserveStock(Slots);

#[async_trait]
impl Step for ReserveStock {
    type Output = ();
    type Error = OrderError;

    async fn run(&self, ctx: &mut Context) -> Outcome<(), OrderError> {
        let Some(order) = ctx.get(&self.0.order).cloned() else {
            return Outcome::error(OrderError::Invalid("no order".to_string()));
        };
        let Some(stock) = ctx.get_mut(&self.0.stock) else {
            return Outcome::error(OrderError::Invalid("no stock table".to_string()));
        };
        for item in &order.items {
            match stock.get_mut(&item.product_id) {
                Some(available) if *available >= item.quantity => *available -= item.quantity,
                _ => return Outcome::error(OrderError::OutOfStock(item.product_id.clone())),
            }
        }
        println!("Reserved stock for order {}", order.id);
        Outcome::success(())
    }
}

#[async_trait]
impl Rollback for ReserveStock {
    async fn rollback(&self, ctx: &mut Context) -> Result<(), OrderError> {
        let order = ctx.get_or_err(&self.0.order)?.clone();
        if let Some(stock) = ctx.get_mut(&self.0.stock) {
            for item in &order.items {
                *stock.entry(item.product_id.clone()).or_insert(0) += item.quantity;
            }
        }
        println!("Released stock for order {}", order.id);
        Ok(())
    }
}

#[derive(Debug)]
struct ChargePayment(Slots);

#[async_trait]
impl Step for ChargePayment {
    type Output = u64;
    type Error = OrderError;

    async fn run(&self, ctx: &mut Context) -> Outcome<u64, OrderError> {
        async {
            let total: u64 = ctx
                .get_or_err(&self.0.order)?
                .items
                .iter()
                .map(|i| i.price_cents * u64::from(i.quantity))
                .sum();
            ctx.set(&self.0.charged_cents, total);
            println!("Charged {} cents", total);
            Ok::<_, OrderError>(total)
        }
        .await
        .into()
    }
}

#[async_trait]
impl Rollback for ChargePayment {
    async fn rollback(&self, ctx: &mut Context) -> Result<(), OrderError> {
        if let Some(charged) = ctx.remove(&self.0.charged_cents) {
            println!("Refunded {} cents", charged);
        }
        Ok(())
    }
}

#[derive(Debug)]
struct ArrangeShipping(Slots);

#[async_trait]
impl Step for ArrangeShipping {
    type Output = String;
    type Error = OrderError;

    async fn run(&self, ctx: &mut Context) -> Outcome<String, OrderError> {
        let order = match ctx.get_or_err(&self.0.order) {
            Ok(order) => order,
            Err(e) => return Outcome::error(e.into()),
        };
        if order.country != "JP" {
            return Outcome::error(OrderError::Undeliverable(order.country.clone()));
        }
        Outcome::success(format!("TRACK-{}", order.id))
    }
}

/// Storage strategy that keeps status history in memory and logs it.
#[derive(Debug, Default)]
struct StatusLog {
    next_id: AtomicU64,
    history: Mutex<Vec<(u64, WorkflowStatus)>>,
}

impl StatusLog {
    fn push(&self, id: u64, status: WorkflowStatus) {
        if let Ok(mut history) = self.history.lock() {
            history.push((id, status));
        }
    }
}

#[async_trait]
impl StorageStrategy for StatusLog {
    type Id = u64;
    type Error = Infallible;

    async fn store_workflow(&self, name: &str) -> Result<u64, Infallible> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        info!("stored workflow '{}' as #{}", name, id);
        Ok(id)
    }

    async fn update_workflow_status(
        &self,
        workflow_id: &u64,
        status: WorkflowStatus,
    ) -> Result<(), Infallible> {
        info!("workflow #{} is {}", workflow_id, status);
        self.push(*workflow_id, status);
        Ok(())
    }

    async fn store_step(&self, workflow_id: &u64, step_name: &StepName) -> Result<u64, Infallible> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        info!("stored step '{}' of workflow #{} as #{}", step_name, workflow_id, id);
        Ok(id)
    }

    async fn update_step_status(
        &self,
        _workflow_id: &u64,
        step_id: &u64,
        status: WorkflowStatus,
    ) -> Result<(), Infallible> {
        info!("step #{} is {}", step_id, status);
        self.push(*step_id, status);
        Ok(())
    }
}

async fn checkout(order: Order) -> Result<(), Box<dyn std::error::Error>> {
    let slots = Slots {
        order: ContextToken::new("order"),
        stock: ContextToken::new("stock"),
        charged_cents: ContextToken::new("charged_cents"),
    };

    let workflow = Workflow::builder("checkout")
        .storage(StatusLog::default())
        .setup_context(|ctx| {
            ctx.set(&slots.order, order);
            ctx.set(
                &slots.stock,
                HashMap::from([("apple".to_string(), 10), ("pear".to_string(), 2)]),
            );
        })
        .step(ValidateOrder(slots))
        .compensated_step(ReserveStock(slots))
        .compensated_step(ChargePayment(slots))
        .step(ArrangeShipping(slots))
        .build()?;

    match workflow.run().await? {
        Outcome::Success { data: report } => {
            println!(
                "Checkout #{} completed ({} steps)",
                report.id, report.steps_completed
            );
        }
        Outcome::Error { error: failure } => {
            println!("Checkout #{} failed: {}", failure.id, failure);
            if let Some(stock) = failure.context.get(&slots.stock) {
                println!("Stock after compensation: {:?}", stock);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let items = vec![
        OrderItem {
            product_id: "apple".to_string(),
            quantity: 3,
            price_cents: 120,
        },
        OrderItem {
            product_id: "pear".to_string(),
            quantity: 1,
            price_cents: 250,
        },
    ];

    checkout(Order {
        id: "ORD-1".to_string(),
        items: items.clone(),
        country: "JP".to_string(),
    })
    .await?;

    checkout(Order {
        id: "ORD-2".to_string(),
        items,
        country: "FR".to_string(),
    })
    .await?;

    Ok(())
}
