//! Runs one supplier search against the marketplace API and prints the page.
//!
//! Usage: `supplier-search "service_type=cmt&certifications[]=gots&page=2"`

use std::env;
use std::sync::Arc;

use dotenvy::dotenv;
use supplier_discovery::dto::search::SearchPageData;
use supplier_discovery::forms::search::SearchForm;
use supplier_discovery::models::config::DiscoveryConfig;
use supplier_discovery::pagination::PageItem;
use supplier_discovery::repository::http::HttpSupplierRepository;
use supplier_discovery::services::discovery::{SearchOutcome, SupplierDiscoveryController};
use supplier_discovery::services::saved::SavedStore;

fn render(data: &SearchPageData) {
    if let Some(meta) = &data.meta {
        match (meta.from, meta.to) {
            (Some(from), Some(to)) => println!("Showing {from}-{to} of {} suppliers", meta.total),
            _ => println!("No suppliers match the current filters"),
        }
    }
    if data.active_filter_count > 0 {
        println!("Active filters: {}", data.active_filter_count);
    }

    for card in &data.cards {
        let supplier = &card.supplier;
        println!(
            "{:>5}  {}{}{}  [{}]  MOQ {}  {}",
            supplier.id.get(),
            supplier.company_name,
            if supplier.is_verified { " (verified)" } else { "" },
            if card.is_saved { " *saved*" } else { "" },
            supplier.service_type,
            supplier
                .minimum_order_quantity
                .map_or_else(|| "-".to_string(), |moq| moq.to_string()),
            supplier
                .location
                .as_ref()
                .map_or("", |location| location.as_str()),
        );
    }

    let pages: Vec<String> = data
        .navigation
        .items
        .iter()
        .map(|item| match item {
            PageItem::Page(page) if *page == data.navigation.current_page => format!("[{page}]"),
            PageItem::Page(page) => page.to_string(),
            PageItem::Ellipsis => "...".to_string(),
        })
        .collect();
    println!("Pages: {}", pages.join(" "));
}

#[tokio::main]
async fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Select config profile (defaults to `local`).
    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    let config = match DiscoveryConfig::load(&app_env) {
        Ok(config) => config,
        Err(err) => {
            log::error!("Error loading discovery config: {err}");
            std::process::exit(1);
        }
    };

    let raw_query = env::args().nth(1).unwrap_or_default();
    let filters = match SearchForm::parse(&raw_query) {
        Ok(filters) => filters,
        Err(err) => {
            log::error!("Invalid search parameters: {err}");
            std::process::exit(2);
        }
    };

    let mut repo = match HttpSupplierRepository::new(&config) {
        Ok(repo) => repo,
        Err(err) => {
            log::error!("Failed to create HTTP client: {err}");
            std::process::exit(1);
        }
    };
    if let Ok(token) = env::var("APP_API_TOKEN") {
        repo = repo.with_token(token);
    }

    let controller =
        SupplierDiscoveryController::from_config(Arc::new(repo), Arc::new(SavedStore::new()), &config);

    match controller.restore(filters).await {
        Ok(SearchOutcome::Failed(err)) => {
            log::error!("Search failed: {err}");
            std::process::exit(1);
        }
        Ok(_) => render(&controller.page_data()),
        Err(err) => {
            log::error!("Search rejected: {err}");
            std::process::exit(2);
        }
    }
}
