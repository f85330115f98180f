//! Demo fixtures shared by the API seed and the CLI `seed` command.

use crate::models::{Category, ListingDraft};

fn draft(
    title: &str,
    category: Category,
    price: i64,
    description: &str,
    owner: &str,
    upload_date: &str,
    location: &str,
) -> ListingDraft {
    ListingDraft {
        id: None,
        title: title.to_string(),
        category,
        price,
        description: description.to_string(),
        owner: owner.to_string(),
        upload_date: upload_date.to_string(),
        location: location.to_string(),
    }
}

/// The three listings a fresh server starts with.
#[must_use]
pub fn server_seed() -> Vec<ListingDraft> {
    vec![
        draft(
            "Bicycle",
            Category::Sports,
            25,
            "Mountain bike, good condition.",
            "John Doe",
            "2025-04-01",
            "New York",
        ),
        draft(
            "Projector",
            Category::Electronics,
            30,
            "1080p projector, suitable for presentations.",
            "Jane Smith",
            "2025-04-03",
            "San Francisco",
        ),
        draft(
            "Tent",
            Category::Outdoors,
            15,
            "2-person tent, waterproof.",
            "Alice Johnson",
            "2025-04-05",
            "Seattle",
        ),
    ]
}

/// A small catalogue for populating an empty deployment.
#[must_use]
pub fn sample_listings() -> Vec<ListingDraft> {
    const LAWN_MOWER: &str = "Electric lawn mower available for short-term rental.";
    const TEXTBOOK: &str = "University-level physics textbook in great condition.";
    const LAPTOP: &str = "High-performance gaming laptop available for rent.";
    const CAR_JACK: &str = "Hydraulic car jack, great for repairs.";
    const GIMBAL: &str = "Stabilizer for smooth video recording.";

    vec![
        draft("Lawn Mower", Category::Garden, 15, LAWN_MOWER, "user1", "2024-12-25", "Cluj"),
        draft("Physics Textbook", Category::Education, 5, TEXTBOOK, "me", "2025-02-28", "Dolj"),
        draft("Gaming Laptop", Category::Computers, 50, LAPTOP, "user3", "2025-03-15", "Cluj"),
        draft("Car Jack", Category::Vehicles, 10, CAR_JACK, "user4", "2024-12-10", "Prahova"),
        draft("Smartphone Gimbal", Category::Technology, 20, GIMBAL, "user5", "2025-03-05", "Tulcea"),
        draft("Lawn Mower", Category::Garden, 15, LAWN_MOWER, "user1", "2025-03-20", "Cluj"),
        draft("Physics Textbook", Category::Education, 5, TEXTBOOK, "me", "2024-02-28", "Dolj"),
        draft("Gaming Laptop", Category::Computers, 50, LAPTOP, "user3", "2024-11-15", "Cluj"),
        draft("Car Jack", Category::Vehicles, 10, CAR_JACK, "user4", "2024-08-10", "Prahova"),
        draft("Smartphone Gimbal", Category::Technology, 20, GIMBAL, "user5", "2024-09-15", "Tulcea"),
    ]
}
