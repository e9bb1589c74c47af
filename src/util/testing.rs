//! Shared test setup: logging and small category fixtures.

use std::env;
use std::sync::Once;

use tracing::{debug, info};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{RawCategory, RawOffer};

static TEST_SETUP: Once = Once::new();

pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        if env::var("RUST_LOG").is_err() {
            env::set_var("RUST_LOG", "debug");
        }
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    // quick_xml traces every event at trace level
    let noisy_modules = ["quick_xml"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
    } else {
        subscriber.try_init().unwrap_or_else(|e| {
            eprintln!("Error: Failed to set up logging: {}", e);
        });
    }
}

/// Kids → Girls → Dolls plus a five level chain under Home, in child-first order.
pub fn sample_categories() -> Vec<RawCategory> {
    vec![
        RawCategory::new("12", "11", "Dolls"),
        RawCategory::new("11", "10", "Girls"),
        RawCategory::new("10", "", "Kids"),
        RawCategory::new("24", "23", "Sconces"),
        RawCategory::new("23", "22", "Wall"),
        RawCategory::new("22", "21", "Lamps"),
        RawCategory::new("21", "20", "Lighting"),
        RawCategory::new("20", "", "Home"),
    ]
}

/// Offer in category `category_id` with the given child elements.
pub fn raw_offer(id: &str, category_id: &str, fields: &[(&str, &str)]) -> RawOffer {
    let mut all = vec![("categoryId".to_string(), category_id.to_string())];
    all.extend(fields.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    RawOffer {
        id: Some(id.to_string()),
        fields: all,
        params: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_test_setup() {
        init_test_setup();
        init_test_setup();
    }

    #[test]
    fn given_sample_categories_when_listed_then_children_precede_parents() {
        let cats = sample_categories();
        let pos = |id: &str| cats.iter().position(|c| c.id == id).unwrap();
        assert!(pos("12") < pos("10"));
        assert!(pos("24") < pos("20"));
    }
}
