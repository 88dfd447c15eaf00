use lazy_static::lazy_static;

use super::repo_types::{CalorieCategory, Product};

lazy_static! {
    /// Built-in catalog served whenever the products table cannot be reached.
    pub static ref STATIC_PRODUCTS: Vec<Product> = vec![
        seed("heytea-001", "Cheese Grape Boom", "HEYTEA", "Fresh grape pulp under a salted cheese foam cap", 280, "regular", "500ml", &["grape", "jasmine green tea", "cheese foam"], 4.7, None),
        seed("heytea-002", "Roasted Brown Sugar Boba Milk", "HEYTEA", "Slow-cooked brown sugar pearls in fresh milk", 420, "full", "500ml", &["brown sugar", "tapioca pearls", "fresh milk"], 4.5, None),
        seed("heytea-003", "Pure Green Jasmine", "HEYTEA", "Unsweetened cold-brewed jasmine green tea", 90, "none", "500ml", &["jasmine green tea"], 4.1, None),
        seed("nayuki-001", "Overload Strawberry", "Nayuki", "Crushed strawberry with green tea and cream", 310, "regular", "650ml", &["strawberry", "green tea", "cream"], 4.4, None),
        seed("nayuki-002", "Oolong Milk Tea", "Nayuki", "Roasted oolong with whole milk", 250, "half", "500ml", &["oolong tea", "milk"], 4.2, None),
        seed("chagee-001", "Boya Jasmine Milk Tea", "CHAGEE", "Light floral milk tea made with jasmine snow buds", 220, "light", "470ml", &["jasmine tea", "milk"], 4.8, None),
        seed("chagee-002", "Lost in Oolong", "CHAGEE", "Dancong oolong milk tea with a roasted finish", 240, "half", "470ml", &["dancong oolong", "milk"], 4.6, None),
        seed("coco-001", "Pearl Milk Tea", "CoCo", "Classic black milk tea with chewy tapioca pearls", 360, "full", "500ml", &["black tea", "creamer", "tapioca pearls"], 4.0, None),
        seed("coco-002", "Taro Milk Tea", "CoCo", "Taro paste blended into milk tea", 390, "full", "500ml", &["taro", "black tea", "milk"], 3.9, None),
        seed("mixue-001", "Lemon Black Tea", "Mixue", "Fresh lemon slices in iced black tea", 160, "light", "500ml", &["lemon", "black tea"], 4.3, None),
        seed("mixue-002", "Sundae Milk Tea", "Mixue", "Milk tea topped with soft-serve", 450, "full", "500ml", &["black tea", "soft serve", "milk"], 3.8, None),
        seed("tigersugar-001", "Brown Sugar Boba Milk with Cream Mousse", "Tiger Sugar", "Tiger-striped brown sugar syrup, pearls and cream mousse", 480, "full", "500ml", &["brown sugar", "tapioca pearls", "milk", "cream mousse"], 4.5, None),
        seed("gongcha-001", "Milk Foam Green Tea", "Gong cha", "Green tea with salted milk foam", 200, "half", "500ml", &["green tea", "milk foam"], 4.2, None),
        seed("gongcha-002", "Earl Grey Milk Tea with 3 Jellies", "Gong cha", "Earl grey milk tea with pearl, pudding and coconut jelly", 410, "full", "500ml", &["earl grey", "milk", "pudding", "coconut jelly", "tapioca pearls"], 4.1, None),
    ];
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    name: &str,
    brand: &str,
    description: &str,
    calories: u32,
    sweetness: &str,
    size: &str,
    ingredients: &[&str],
    rating: f64,
    image_url: Option<&str>,
) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        brand: brand.into(),
        description: description.into(),
        calories,
        sweetness: sweetness.into(),
        size: size.into(),
        ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        rating,
        category: category_for(calories),
        image_url: image_url.map(Into::into),
    }
}

pub fn category_for(calories: u32) -> CalorieCategory {
    match calories {
        0..=199 => CalorieCategory::Low,
        200..=349 => CalorieCategory::Medium,
        _ => CalorieCategory::High,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn seed_ids_are_unique_and_ratings_in_range() {
        let ids: HashSet<_> = STATIC_PRODUCTS.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids.len(), STATIC_PRODUCTS.len());
        assert!(STATIC_PRODUCTS.iter().all(|p| (0.0..=5.0).contains(&p.rating)));
    }

    #[test]
    fn category_boundaries() {
        assert_eq!(category_for(199), CalorieCategory::Low);
        assert_eq!(category_for(200), CalorieCategory::Medium);
        assert_eq!(category_for(350), CalorieCategory::High);
    }
}
