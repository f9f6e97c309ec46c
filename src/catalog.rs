use crate::models::{Property, PropertyMedia, Source};

const PROPERTY_1_IMAGE: &str = "/assets/property-1.jpg";
const PROPERTY_2_IMAGE: &str = "/assets/property-2.jpg";
const PROPERTY_3_IMAGE: &str = "/assets/property-3.jpg";
const FLOORPLAN_1_IMAGE: &str = "/assets/property-1-floorplan.jpg";
const BUILDING_GYM_IMAGE: &str = "/assets/building-gym.jpg";
const BUILDING_LOBBY_IMAGE: &str = "/assets/building-lobby.jpg";
const BUILDING_POOL_IMAGE: &str = "/assets/building-pool.jpg";

const DEMO_VIDEO_URL: &str = "https://www.youtube.com/embed/dQw4w9WgXcQ";
const LONG_TERM_RENT: &str = "Long term rent, usual tenancy contract";

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Built-in demonstration listings, tagged as `initial`
pub fn builtin_properties() -> Vec<Property> {
    vec![
        Property {
            id: "sky-tower-penthouse".to_string(),
            image: PROPERTY_1_IMAGE.to_string(),
            name: "Sky Tower Penthouse".to_string(),
            neighborhood: "Downtown Dubai".to_string(),
            subcluster: Some("Business Bay".to_string()),
            bedrooms: 4,
            bathrooms: 5,
            sqft: 4500,
            price: "AED 15,000,000".to_string(),
            rent_price_per_year: Some("AED 450,000".to_string()),
            price_details: Some(LONG_TERM_RENT.to_string()),
            maids_room: Some(true),
            labels: strings(&["Luxury Amenities", "City View"]),
            description: "Experience unparalleled luxury in this stunning penthouse located in the heart of Downtown Dubai. Floor-to-ceiling windows offer breathtaking views of the Burj Khalifa and the Dubai Fountain. This residence features premium Italian marble flooring, a state-of-the-art smart home system, and designer fixtures throughout.".to_string(),
            location_description: Some("Downtown Dubai is the epitome of modern luxury living. Home to the world's tallest building, the Burj Khalifa, and the spectacular Dubai Mall, this neighborhood offers unmatched access to world-class dining, entertainment, and shopping.".to_string()),
            video_url: Some(DEMO_VIDEO_URL.to_string()),
            floorplans: vec![PropertyMedia::new(
                FLOORPLAN_1_IMAGE,
                "Spacious 4-bedroom penthouse layout",
                "Open-plan living areas with private elevator access.",
            )],
            development_images: vec![
                PropertyMedia::new(BUILDING_GYM_IMAGE, "Fitness Center", "State-of-the-art gym with panoramic city views"),
                PropertyMedia::new(BUILDING_LOBBY_IMAGE, "Grand Lobby", "Elegant entrance with 24/7 concierge service"),
                PropertyMedia::new(BUILDING_POOL_IMAGE, "Infinity Pool", "Rooftop infinity pool overlooking Dubai skyline"),
            ],
            amenities: strings(&[
                "24/7 Concierge Service",
                "Infinity Pool",
                "Private Gym",
                "Spa & Wellness Center",
                "Valet Parking",
                "Business Center",
            ]),
            features: strings(&[
                "Smart Home Technology",
                "Italian Marble Flooring",
                "Miele Kitchen Appliances",
                "Private Elevator Access",
                "Walk-in Closets",
                "Wine Cellar",
            ]),
            source: Some(Source::Initial),
            ..Default::default()
        },
        Property {
            id: "palm-residence".to_string(),
            image: PROPERTY_2_IMAGE.to_string(),
            name: "Palm Residence".to_string(),
            neighborhood: "Palm Jumeirah".to_string(),
            subcluster: Some("Golden Mile".to_string()),
            bedrooms: 5,
            bathrooms: 6,
            sqft: 6200,
            price: "AED 22,500,000".to_string(),
            rent_price_per_year: Some("AED 680,000".to_string()),
            price_details: Some(LONG_TERM_RENT.to_string()),
            maids_room: Some(true),
            labels: strings(&["Beach Access", "Private Pool"]),
            description: "Discover paradise in this exceptional beachfront residence on Palm Jumeirah. This property offers direct beach access, a private infinity pool, and panoramic views of the Arabian Gulf.".to_string(),
            location_description: Some("Palm Jumeirah is Dubai's iconic man-made island, offering an exclusive island lifestyle with pristine beaches, luxury hotels, and world-class restaurants minutes away from Dubai Marina.".to_string()),
            video_url: Some(DEMO_VIDEO_URL.to_string()),
            development_images: vec![
                PropertyMedia::new(BUILDING_POOL_IMAGE, "Beach Club", "Exclusive beach club with private cabanas"),
                PropertyMedia::new(BUILDING_GYM_IMAGE, "Wellness Center", "Premium spa and wellness facilities"),
                PropertyMedia::new(BUILDING_LOBBY_IMAGE, "Residents Lounge", "Elegant communal spaces for socializing"),
            ],
            amenities: strings(&[
                "Private Beach Access",
                "Infinity Pool",
                "24/7 Security",
                "Kids Play Area",
                "BBQ Area",
                "Landscaped Gardens",
            ]),
            features: strings(&[
                "Floor-to-Ceiling Windows",
                "High-End Kitchen",
                "Master Suite with Sea View",
                "Home Theater",
                "Smart Home System",
                "Covered Parking for 3 Cars",
            ]),
            source: Some(Source::Initial),
            ..Default::default()
        },
        Property {
            id: "emirates-hills-villa".to_string(),
            image: PROPERTY_3_IMAGE.to_string(),
            name: "Emirates Hills Villa".to_string(),
            neighborhood: "Emirates Hills".to_string(),
            subcluster: Some("Xora".to_string()),
            bedrooms: 6,
            bathrooms: 7,
            sqft: 8000,
            price: "AED 28,000,000".to_string(),
            rent_price_per_year: Some("AED 850,000".to_string()),
            price_details: Some(LONG_TERM_RENT.to_string()),
            maids_room: Some(false),
            labels: strings(&["Golf Course View", "Premium Location"]),
            description: "Nestled in the prestigious Emirates Hills community, this contemporary villa offers spectacular golf course views and ultimate privacy.".to_string(),
            location_description: Some("Emirates Hills is Dubai's most exclusive gated community, surrounding the Montgomerie Golf Course with unparalleled privacy and security.".to_string()),
            video_url: Some(DEMO_VIDEO_URL.to_string()),
            floorplans: vec![PropertyMedia::new(
                FLOORPLAN_1_IMAGE,
                "Luxury villa floor plan",
                "Six bedrooms with cinema room and panoramic golf course views.",
            )],
            amenities: strings(&[
                "Golf Course Access",
                "Private Pool",
                "Tennis Court",
                "Maid's Room",
                "Driver's Room",
                "Landscaped Garden",
            ]),
            features: strings(&[
                "Contemporary Architecture",
                "Premium Finishes Throughout",
                "Gourmet Kitchen",
                "Home Office",
                "Cinema Room",
                "4-Car Garage",
            ]),
            source: Some(Source::Initial),
            ..Default::default()
        },
    ]
}
