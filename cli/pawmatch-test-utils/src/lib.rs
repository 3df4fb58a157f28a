//! Fixtures shared by the pawmatch test suites.

use pawmatch_client::types::{Dog, Location};

pub mod proptest;

/// Build a dog record with a predictable image URL.
pub fn dog(id: &str, name: &str, breed: &str, age: u32, zip_code: &str) -> Dog {
    Dog {
        id: id.to_string(),
        img: format!("https://img.example/{id}.jpg"),
        name: name.to_string(),
        age,
        zip_code: zip_code.to_string(),
        breed: breed.to_string(),
    }
}

/// `n` Poodles with ids `poodle-01`, `poodle-02`, ... sorting by id,
/// name and age all give the same order.
pub fn poodles(n: usize) -> Vec<Dog> {
    (1..=n)
        .map(|i| {
            dog(
                &format!("poodle-{i:02}"),
                &format!("Poodle {i:02}"),
                "Poodle",
                (i % 21) as u32,
                "03060",
            )
        })
        .collect()
}

/// A small mixed shelter: three breeds across two ZIP codes.
pub fn mixed_shelter() -> Vec<Dog> {
    vec![
        dog("1", "Biscuit", "Beagle", 2, "03060"),
        dog("2", "Rex", "Boxer", 7, "03060"),
        dog("3", "Mochi", "Pug", 4, "10001"),
        dog("4", "Nala", "Beagle", 11, "10001"),
        dog("5", "Ziggy", "Pug", 1, "03060"),
    ]
}

pub fn location(zip_code: &str, city: &str, state: &str, latitude: f64, longitude: f64) -> Location {
    Location {
        zip_code: zip_code.to_string(),
        latitude,
        longitude,
        city: city.to_string(),
        state: state.to_string(),
        county: None,
    }
}

pub fn nashua() -> Location {
    location("03060", "Nashua", "NH", 42.7654, -71.4676)
}

pub fn new_york() -> Location {
    location("10001", "New York", "NY", 40.7506, -73.9972)
}

/// Serialize a fixture catalog in the format read by the mock client.
pub fn catalog_json(dogs: &[Dog], locations: &[Location]) -> String {
    serde_json::json!({
        "dogs": dogs,
        "locations": locations,
    })
    .to_string()
}
