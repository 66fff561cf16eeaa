use super::money::Amount;
use serde::{Deserialize, Serialize};

/// A catalog entry. Immutable after seeding except for `available`.
///
/// Orders reference items weakly by id and snapshot `name` and `price` onto
/// their line items at add time, so retiring an item never corrupts
/// historical orders.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct MenuItem {
    pub id: u32,
    pub name: String,
    pub description: String,
    pub price: Amount,
    pub category: String,
    pub available: bool,
}

impl MenuItem {
    pub fn new(id: u32, name: &str, description: &str, price: Amount, category: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            price,
            category: category.to_string(),
            available: true,
        }
    }
}

/// The sample menu the service is seeded with on first start.
pub fn sample_menu() -> Vec<MenuItem> {
    vec![
        MenuItem::new(
            1,
            "Jollof Rice with Chicken",
            "Traditional Nigerian jollof rice served with grilled chicken",
            Amount::naira(2500),
            "Main Course",
        ),
        MenuItem::new(
            2,
            "Pounded Yam with Egusi Soup",
            "Soft pounded yam with melon seed soup",
            Amount::naira(2200),
            "Main Course",
        ),
        MenuItem::new(
            3,
            "Fried Rice with Beef",
            "Special fried rice with tender beef pieces",
            Amount::naira(2300),
            "Main Course",
        ),
        MenuItem::new(
            4,
            "Pepper Soup",
            "Spicy assorted meat pepper soup",
            Amount::naira(1500),
            "Starter",
        ),
        MenuItem::new(
            5,
            "Chapman Drink",
            "Refreshing Nigerian cocktail",
            Amount::naira(800),
            "Drinks",
        ),
        MenuItem::new(
            6,
            "Chocolate Cake",
            "Rich chocolate cake slice",
            Amount::naira(1200),
            "Dessert",
        ),
    ]
}
