use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    sequence::{ALLOCATION_ATTEMPTS, next_order_id},
    state::AppState,
};

/// Per-item snapshot taken from the product catalog before anything is
/// written. Prices and names are frozen here; later catalog edits do not
/// reach historical orders.
struct ItemSnapshot {
    product_id: Uuid,
    name: String,
    image_url: Option<String>,
    price: i64,
    qty: i32,
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Items must not be empty".into()));
    }

    // Resolve every product before the first write so a bad item aborts the
    // whole order with nothing persisted.
    let mut snapshots: Vec<ItemSnapshot> = Vec::with_capacity(payload.items.len());
    let mut total: i64 = 0;
    for item in &payload.items {
        if item.qty < 1 {
            return Err(AppError::BadRequest(format!(
                "Quantity must be at least 1 for product {}",
                item.product_id
            )));
        }
        let product = Products::find_by_id(item.product_id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| {
                AppError::BadRequest(format!("Product {} not found", item.product_id))
            })?;

        total += product.price * i64::from(item.qty);
        snapshots.push(ItemSnapshot {
            product_id: product.id,
            name: product.name,
            image_url: product.image_url,
            price: product.price,
            qty: item.qty,
        });
    }

    let note = payload.note.unwrap_or_default();

    // The read-latest-then-increment sequence races with concurrent
    // checkouts; the unique index on orders.order_id turns a lost race into
    // a retryable conflict.
    let mut attempt = 0;
    let (order, items) = loop {
        attempt += 1;

        let latest = Orders::find()
            .order_by_desc(OrderCol::CreatedAt)
            .order_by_desc(OrderCol::OrderId)
            .one(&state.orm)
            .await?;
        let order_id = next_order_id(latest.as_ref().map(|o| o.order_id.as_str()))?;

        let txn = state.orm.begin().await?;
        let inserted = OrderActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            email: Set(user.email.clone()),
            name: Set(user.name.clone()),
            address: Set(payload.address.clone()),
            phone: Set(payload.phone.clone()),
            status: Set("pending".into()),
            note: Set(note.clone()),
            total: Set(total),
            created_at: NotSet,
        }
        .insert(&txn)
        .await;

        let order = match inserted {
            Ok(order) => order,
            Err(err) if is_unique_violation(&err) => {
                txn.rollback().await?;
                if attempt >= ALLOCATION_ATTEMPTS {
                    return Err(AppError::Conflict(
                        "Could not allocate an order id, please retry".into(),
                    ));
                }
                tracing::debug!(attempt, "order id allocation collided, retrying");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let mut items: Vec<OrderItem> = Vec::with_capacity(snapshots.len());
        for snap in &snapshots {
            let item = OrderItemActive {
                id: Set(Uuid::new_v4()),
                order_id: Set(order.id),
                product_id: Set(snap.product_id),
                name: Set(snap.name.clone()),
                image_url: Set(snap.image_url.clone()),
                price: Set(snap.price),
                qty: Set(snap.qty),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
            items.push(order_item_from_entity(item));
        }

        txn.commit().await?;
        break (order, items);
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_create",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.order_id, "total": order.total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order created successfully",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();

    // Admins see the whole book; everyone else only their own orders.
    let mut condition = Condition::all();
    if user.role != "admin" {
        condition = condition.add(OrderCol::Email.eq(user.email.clone()));
    }

    let finder = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(OrderCol::OrderId.eq(order_id))
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if user.role != "admin" && order.email != user.email {
        return Err(AppError::Forbidden);
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        order_id: model.order_id,
        email: model.email,
        name: model.name,
        address: model.address,
        phone: model.phone,
        status: model.status,
        note: model.note,
        total: model.total,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        name: model.name,
        image_url: model.image_url,
        price: model.price,
        qty: model.qty,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
