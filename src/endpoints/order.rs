use tracing::{debug, info};

use super::parse_body;
use crate::api::NewOrder;
use crate::auth::authenticate;
use crate::errors::{Error, Result};
use crate::http::{Request, Response};
use crate::models::{order_total, OrderItem};
use crate::routes::HttpParams;
use crate::state::AppState;

fn check_item(item: &OrderItem) -> Result<()> {
    if item.quantity == 0 {
        return Err(Error::BadRequest(format!(
            "Quantity of '{}' must be at least 1",
            item.name
        )));
    }
    if !item.price.is_finite() || item.price < 0.0 {
        return Err(Error::BadRequest(format!(
            "Price of '{}' must be a non-negative number",
            item.name
        )));
    }
    Ok(())
}

/// Place an order for the authenticated user.
///
/// The total is always recomputed from the submitted lines, a total sent by the client is
/// only compared against it.
pub fn create_order(request: Request, _: HttpParams, state: &AppState) -> Result<Response> {
    let user = authenticate(&request, state)?;
    let body: NewOrder = parse_body(&request)?;

    if body.order_items.is_empty() {
        return Err(Error::BadRequest("No order items provided".to_string()));
    }
    body.order_items.iter().try_for_each(check_item)?;

    let total = order_total(&body.order_items);
    if !total.is_finite() {
        return Err(Error::BadRequest("Order total is out of range".to_string()));
    }
    if let Some(claimed) = body.total_price {
        if claimed != total {
            debug!(user_id = user.id, claimed, total, "Ignoring client order total");
        }
    }

    let order = state.accounts.create_order(user.id, body.order_items, total)?;
    info!(order_id = order.id, user_id = user.id, total, "Order placed");

    Response::json(201, order, "Order placed successfully")
}

pub fn list_orders(request: Request, _: HttpParams, state: &AppState) -> Result<Response> {
    let user = authenticate(&request, state)?;

    let orders = state.accounts.orders_for_user(user.id)?;
    if orders.is_empty() {
        return Err(Error::NotFound("No orders found for this user".to_string()));
    }

    Response::json(200, orders, "Orders fetched successfully")
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::endpoints::test_support::{call, with_token};
    use crate::models::{Category, NewUser, Order, Role};
    use crate::routes::paths;
    use crate::state::testing;

    fn customer(state: &AppState, phone: &str) -> String {
        let user = state
            .accounts
            .create_user(NewUser {
                name: "Ravi".to_string(),
                phone: phone.to_string(),
                password_hash: "unused".to_string(),
                role: Role::Customer,
            })
            .unwrap();
        state.tokens.issue(&user).unwrap().access_token
    }

    fn place(state: &AppState, token: &str, body: serde_json::Value) -> (u16, Option<Order>) {
        let request = with_token(Request::post(paths::ORDERS, body.to_string()), token);
        let (status, order, _) = call::<Order>(state, request);
        (status, order)
    }

    #[test]
    fn test_total_is_computed_by_the_server() {
        let state = testing::state();
        let token = customer(&state, "1");

        let (status, order) = place(
            &state,
            &token,
            json!({
                "orderItems": [
                    {"_id": "a", "name": "Samosa", "price": 2.5, "quantity": 2, "category": "starter"},
                    {"id": "b", "name": "Lassi", "price": 4.0, "quantity": 3, "category": "drinks"},
                ],
                "totalPrice": 1.0,
            }),
        );

        assert_eq!(status, 201);
        let order = order.unwrap();
        assert_eq!(order.total_price, 17.0);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[1].category, Category::Drinks);

        let stored = state.accounts.orders_for_user(order.user_id).unwrap();
        assert_eq!(stored, vec![order]);
    }

    #[test]
    fn test_order_validation() {
        let state = testing::state();
        let token = customer(&state, "1");

        for body in [
            json!({}),
            json!({"orderItems": []}),
            json!({"orderItems": [{"id": "a", "name": "Samosa", "price": 2.5, "quantity": 0, "category": "starter"}]}),
            json!({"orderItems": [{"id": "a", "name": "Samosa", "price": -2.5, "quantity": 1, "category": "starter"}]}),
            json!({"orderItems": [{"id": "a", "name": "Samosa", "price": 2.5, "quantity": -1, "category": "starter"}]}),
        ] {
            let (status, _) = place(&state, &token, body);
            assert_eq!(status, 400);
        }

        let request = with_token(Request::post(paths::ORDERS, "{}".to_string()), &token);
        let (_, _, response) = call::<Order>(&state, request);
        assert!(response.body.contains("No order items provided"));
    }

    #[test]
    fn test_order_total_out_of_range() {
        let state = testing::state();
        let token = customer(&state, "1");

        let (status, _) = place(
            &state,
            &token,
            json!({"orderItems": [{"id": "a", "name": "Thali", "price": 1e308, "quantity": 10, "category": "main-course"}]}),
        );
        assert_eq!(status, 400);

        let (status, _) = place(
            &state,
            &token,
            json!({"orderItems": [
                {"id": "a", "name": "Thali", "price": 1e308, "quantity": 1, "category": "main-course"},
                {"id": "b", "name": "Feast", "price": 1e308, "quantity": 1, "category": "main-course"},
            ]}),
        );
        assert_eq!(status, 400);

        let request = with_token(Request::get(paths::ORDERS), &token);
        let (status, _, _) = call::<Vec<Order>>(&state, request);
        assert_eq!(status, 404);
    }

    #[test]
    fn test_orders_need_a_session() {
        let state = testing::state();
        let body = json!({"orderItems": [{"id": "a", "name": "Samosa", "price": 2.5, "quantity": 1, "category": "starter"}]});

        let (status, _, response) = call::<Order>(&state, Request::post(paths::ORDERS, body.to_string()));
        assert_eq!(status, 401);
        assert!(response.body.contains("Unauthorized request, token missing"));

        let (status, _) = place(&state, "not-a-token", body);
        assert_eq!(status, 401);

        let (status, _, _) = call::<Vec<Order>>(&state, Request::get(paths::ORDERS));
        assert_eq!(status, 401);
    }

    #[test]
    fn test_list_orders() {
        let state = testing::state();
        let ravi = customer(&state, "1");
        let other = customer(&state, "2");

        let request = with_token(Request::get(paths::ORDERS), &ravi);
        let (status, _, response) = call::<Vec<Order>>(&state, request);
        assert_eq!(status, 404);
        assert!(response.body.contains("No orders found for this user"));

        for quantity in 1..=2 {
            place(
                &state,
                &ravi,
                json!({"orderItems": [{"id": "a", "name": "Samosa", "price": 2.0, "quantity": quantity, "category": "starter"}]}),
            );
        }
        place(
            &state,
            &other,
            json!({"orderItems": [{"id": "b", "name": "Lassi", "price": 4.0, "quantity": 1, "category": "drinks"}]}),
        );

        let request = with_token(Request::get(paths::ORDERS), &ravi);
        let (status, orders, _) = call::<Vec<Order>>(&state, request);
        assert_eq!(status, 200);
        let totals: Vec<f64> = orders.unwrap().iter().map(|order| order.total_price).collect();
        assert_eq!(totals, vec![4.0, 2.0]);
    }
}
