//! Catalog (home page) route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::catalog::{self, Offering};
use crate::filters;
use crate::page::Page;

/// How many offerings the "Top Rated Providers" strip shows.
const TOP_RATED_COUNT: usize = 3;

/// A slide in the hero banner.
#[derive(Clone)]
pub struct HeroSlide {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub button_text: Option<&'static str>,
    pub button_url: Option<&'static str>,
}

const HERO_SLIDES: [HeroSlide; 2] = [
    HeroSlide {
        title: "Learn locally, teach locally",
        subtitle: "Offer, learn, or trade skills in your neighborhood.",
        button_text: Some("Get Started"),
        button_url: Some("#popular-skills"),
    },
    HeroSlide {
        title: "Find top-rated providers",
        subtitle: "Read ratings and book sessions with confidence.",
        button_text: None,
        button_url: None,
    },
];

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: Page,
    pub hero_slides: &'static [HeroSlide],
    pub offerings: &'static [Offering],
    pub top_rated: Vec<&'static Offering>,
}

/// Display the catalog.
pub async fn home(page: Page) -> impl IntoResponse {
    HomeTemplate {
        page,
        hero_slides: &HERO_SLIDES,
        offerings: catalog::all(),
        top_rated: catalog::top_rated(TOP_RATED_COUNT),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_home_renders_every_offering_and_sections() {
        let html = HomeTemplate {
            page: Page::default(),
            hero_slides: &HERO_SLIDES,
            offerings: catalog::all(),
            top_rated: catalog::top_rated(TOP_RATED_COUNT),
        }
        .render()
        .unwrap();

        for offering in catalog::all() {
            assert!(html.contains(offering.title), "missing {}", offering.title);
            assert!(html.contains(&format!("href=\"{}\"", offering.path())));
        }
        assert!(html.contains("Top Rated Providers"));
        assert!(html.contains("How It Works"));
        assert!(html.contains("Community Events"));
        assert!(html.contains("Login"));
    }
}
