//! Client side cart, kept in memory until checkout.
use crate::api::NewOrder;
use crate::models::{order_total, MenuItem, OrderItem};

/// Lines picked from the menu, in the order they were first added
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<OrderItem>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Put one more of `item` in the cart
    pub fn add(&mut self, item: &MenuItem) {
        if !self.increment(&item.id) {
            self.items.push(OrderItem {
                id: item.id.clone(),
                name: item.name.clone(),
                price: item.price,
                quantity: 1,
                category: item.category,
            });
        }
    }

    /// Bump the quantity of a line already in the cart. Returns false if there is no such line.
    pub fn increment(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|line| line.id == id) {
            Some(line) => {
                line.quantity += 1;
                true
            }
            None => false,
        }
    }

    /// Take one off a line, dropping it once it reaches zero
    pub fn decrement(&mut self, id: &str) -> bool {
        let Some(position) = self.items.iter().position(|line| line.id == id) else {
            return false;
        };
        self.items[position].quantity -= 1;
        if self.items[position].quantity == 0 {
            self.items.remove(position);
        }
        true
    }

    pub fn quantity(&self, id: &str) -> u32 {
        self.items
            .iter()
            .find(|line| line.id == id)
            .map_or(0, |line| line.quantity)
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total(&self) -> f64 {
        order_total(&self.items)
    }

    /// Checkout body for this cart
    pub fn to_order(&self) -> NewOrder {
        NewOrder {
            order_items: self.items.clone(),
            total_price: Some(self.total()),
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::models::Category;

    fn menu_item(id: &str, price: f64) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: format!("Dish {}", id),
            description: "Tasty".to_string(),
            category: Category::MainCourse,
            price,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_and_increment() {
        let mut cart = Cart::new();
        let dal = menu_item("dal", 6.0);
        let naan = menu_item("naan", 1.5);

        cart.add(&dal);
        cart.add(&naan);
        cart.add(&dal);
        assert!(cart.increment("naan"));
        assert!(!cart.increment("paneer"));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.items()[0].id, "dal");
        assert_eq!(cart.quantity("dal"), 2);
        assert_eq!(cart.quantity("naan"), 2);
        assert_eq!(cart.total(), 15.0);
    }

    #[test]
    fn test_decrement_drops_empty_lines() {
        let mut cart = Cart::new();
        cart.add(&menu_item("dal", 6.0));
        cart.add(&menu_item("dal", 6.0));

        assert!(cart.decrement("dal"));
        assert_eq!(cart.quantity("dal"), 1);
        assert!(cart.decrement("dal"));
        assert!(cart.is_empty());
        assert!(!cart.decrement("dal"));
        assert_eq!(cart.total(), 0.0);
    }

    #[test]
    fn test_to_order() {
        let mut cart = Cart::new();
        cart.add(&menu_item("dal", 6.0));
        cart.increment("dal");

        let order = cart.to_order();
        assert_eq!(order.order_items, cart.items());
        assert_eq!(order.total_price, Some(12.0));
    }
}
