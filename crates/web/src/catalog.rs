//! The skill catalog: a fixed, ordered list of offerings.

use skillswap_core::{OfferingId, Price, Rating};

/// One skill listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offering {
    pub id: OfferingId,
    pub title: &'static str,
    pub provider_name: &'static str,
    pub provider_contact: &'static str,
    pub price: Price,
    pub rating: Rating,
    pub remaining_slots: u32,
    pub description: &'static str,
    pub image_ref: &'static str,
    pub category: &'static str,
}

impl Offering {
    /// Path of the detail page.
    #[must_use]
    pub fn path(&self) -> String {
        format!("/skill/{}", self.id)
    }
}

static OFFERINGS: [Offering; 6] = [
    Offering {
        id: OfferingId::new(1),
        title: "Beginner Guitar Lessons",
        provider_name: "Alex Martin",
        provider_contact: "alex@skillswap.com",
        price: Price::usd(20),
        rating: Rating::new(48, 1),
        remaining_slots: 3,
        description: "Acoustic guitar classes for complete beginners.",
        image_ref: "https://i.postimg.cc/3xk3G0c0/guitar.jpg",
        category: "Music",
    },
    Offering {
        id: OfferingId::new(2),
        title: "Spoken English Practice",
        provider_name: "Sara Hossain",
        provider_contact: "sara@skillswap.com",
        price: Price::usd(10),
        rating: Rating::new(46, 1),
        remaining_slots: 5,
        description: "Conversational English sessions for non-native speakers.",
        image_ref: "https://i.postimg.cc/QC2r6Z6s/english.jpg",
        category: "Language",
    },
    Offering {
        id: OfferingId::new(3),
        title: "Intro to Web Development",
        provider_name: "Rafi Khan",
        provider_contact: "rafi@skillswap.com",
        price: Price::usd(25),
        rating: Rating::new(49, 1),
        remaining_slots: 2,
        description: "HTML, CSS and basic JavaScript for total beginners.",
        image_ref: "https://i.postimg.cc/0Q5m0VYD/webdev.jpg",
        category: "Tech",
    },
    Offering {
        id: OfferingId::new(4),
        title: "Yoga for Beginners",
        provider_name: "Maya Roy",
        provider_contact: "maya@skillswap.com",
        price: Price::usd(15),
        rating: Rating::new(47, 1),
        remaining_slots: 6,
        description: "Gentle yoga sessions focusing on flexibility and breathing.",
        image_ref: "https://i.postimg.cc/T3f9z3kB/yoga.jpg",
        category: "Wellness",
    },
    Offering {
        id: OfferingId::new(5),
        title: "Spanish Conversation",
        provider_name: "Carlos Perez",
        provider_contact: "carlos@skillswap.com",
        price: Price::usd(18),
        rating: Rating::new(45, 1),
        remaining_slots: 4,
        description: "Practice speaking Spanish in a relaxed environment.",
        image_ref: "https://i.postimg.cc/0j0L0P3f/spanish.jpg",
        category: "Language",
    },
    Offering {
        id: OfferingId::new(6),
        title: "Portrait Photography Basics",
        provider_name: "Nina Bose",
        provider_contact: "nina@skillswap.com",
        price: Price::usd(30),
        rating: Rating::new(485, 2),
        remaining_slots: 1,
        description: "Understand light, composition, and posing for portraits.",
        image_ref: "https://i.postimg.cc/XYzTgqG1/photo.jpg",
        category: "Art",
    },
];

/// All offerings, in catalog order.
#[must_use]
pub fn all() -> &'static [Offering] {
    &OFFERINGS
}

/// Look up an offering by ID.
#[must_use]
pub fn find(id: OfferingId) -> Option<&'static Offering> {
    OFFERINGS.iter().find(|offering| offering.id == id)
}

/// Look up an offering by the raw path segment.
///
/// Non-numeric segments never match.
#[must_use]
pub fn find_by_segment(segment: &str) -> Option<&'static Offering> {
    segment.parse().ok().and_then(find)
}

/// The `n` highest-rated offerings, best first; ties keep catalog order.
#[must_use]
pub fn top_rated(n: usize) -> Vec<&'static Offering> {
    let mut ranked: Vec<_> = OFFERINGS.iter().collect();
    ranked.sort_by(|a, b| b.rating.cmp(&a.rating));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_six_entries_with_unique_ids() {
        assert_eq!(all().len(), 6);
        let ids: HashSet<_> = all().iter().map(|o| o.id).collect();
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn test_find() {
        let yoga = find(OfferingId::new(4)).map(|o| o.title);
        assert_eq!(yoga, Some("Yoga for Beginners"));
        assert!(find(OfferingId::new(7)).is_none());
        assert!(find(OfferingId::new(0)).is_none());
    }

    #[test]
    fn test_find_by_segment_rejects_non_numeric() {
        assert_eq!(find_by_segment("3").map(|o| o.provider_name), Some("Rafi Khan"));
        for segment in ["abc", "", "-1", "3.0", "99"] {
            assert!(find_by_segment(segment).is_none(), "{segment}");
        }
    }

    #[test]
    fn test_top_rated() {
        let names: Vec<_> = top_rated(3).iter().map(|o| o.provider_name).collect();
        assert_eq!(names, ["Rafi Khan", "Nina Bose", "Alex Martin"]);
        assert_eq!(top_rated(3)[1].rating.to_string(), "4.85");
    }

    #[test]
    fn test_display_values() {
        let guitar = &all()[0];
        assert_eq!(guitar.price.to_string(), "$20");
        assert_eq!(guitar.rating.to_string(), "4.8");
        assert_eq!(guitar.path(), "/skill/1");
    }
}
