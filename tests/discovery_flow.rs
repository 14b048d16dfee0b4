use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use supplier_discovery::domain::certification::{CertificationStatus, SupplierCertification};
use supplier_discovery::domain::filters::FilterChange;
use supplier_discovery::domain::supplier::Supplier;
use supplier_discovery::domain::types::{
    CertificationType, CompanyName, LocationName, ServiceType, SortBy, SupplierId,
};
use supplier_discovery::dto::search::DiscoveryPhase;
use supplier_discovery::forms::search::SearchForm;
use supplier_discovery::pagination::PageItem;
use supplier_discovery::query;
use supplier_discovery::repository::memory::InMemorySupplierRepository;
use supplier_discovery::services::certifications::{
    CertificationSummary, load_certification_badges,
};
use supplier_discovery::services::discovery::{
    SearchOutcome, SupplierDiscoveryController, ViewEffect,
};
use supplier_discovery::services::saved::{SaveStateSynchronizer, SaveTransition, SavedStore};

fn id(value: i32) -> SupplierId {
    SupplierId::new(value).unwrap()
}

fn supplier(value: i32, service_type: ServiceType, moq: u32) -> Supplier {
    let mut supplier = Supplier::new(
        id(value),
        CompanyName::new(format!("Mill {value}")).unwrap(),
        service_type,
    );
    supplier.minimum_order_quantity = Some(moq);
    supplier.location = Some(LocationName::new("Porto, Portugal").unwrap());
    supplier
}

fn catalog() -> InMemorySupplierRepository {
    let mut repo = InMemorySupplierRepository::new(2);
    for value in 1..=7 {
        let mut entry = supplier(value, ServiceType::Cmt, value as u32 * 100);
        entry.is_verified = value % 2 == 1;
        if value <= 5 {
            entry.certification_types = vec![CertificationType::Gots];
        }
        entry.is_saved = value == 3;
        repo = repo.with_supplier(entry);
    }
    repo.with_supplier(supplier(8, ServiceType::Fabric, 50))
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[tokio::test]
async fn filtered_search_pages_through_results() {
    let repo = Arc::new(catalog());
    let controller = SupplierDiscoveryController::new(repo, Arc::new(SavedStore::new()));

    let outcome = controller
        .toggle_service_type(ServiceType::Cmt)
        .await
        .unwrap();
    assert_eq!(outcome, SearchOutcome::Loaded { total: 7 });

    controller
        .toggle_certification(CertificationType::Gots)
        .await
        .unwrap();
    let data = controller.page_data();
    assert_eq!(data.phase, DiscoveryPhase::Success);
    assert_eq!(data.active_filter_count, 2);
    let meta = data.meta.unwrap();
    assert_eq!((meta.total, meta.last_page), (5, 3));
    assert_eq!((meta.from, meta.to), (Some(1), Some(2)));
    assert_eq!(
        data.navigation.items,
        vec![PageItem::Page(1), PageItem::Page(2), PageItem::Page(3)]
    );
    controller.take_effects();

    controller.go_to_page(3).await.unwrap();
    let data = controller.page_data();
    assert_eq!(controller.take_effects(), vec![ViewEffect::ScrollToTop]);
    assert_eq!(data.cards.len(), 1);
    assert!(!data.navigation.has_next);
    assert!(data.navigation.has_prev);

    controller.set_sort(SortBy::MoqDesc).await.unwrap();
    let data = controller.page_data();
    assert_eq!(data.filters.page(), 1);
    assert_eq!(data.cards[0].supplier.id, id(5));
}

#[tokio::test]
async fn no_matches_render_empty_state() {
    let controller =
        SupplierDiscoveryController::new(Arc::new(catalog()), Arc::new(SavedStore::new()));

    controller.apply(FilterChange::MinMoq(Some(10_000))).await.unwrap();

    let data = controller.page_data();
    assert_eq!(data.phase, DiscoveryPhase::Empty);
    assert!(data.cards.is_empty());
    assert_eq!(data.meta.unwrap().from, None);

    controller.clear_all().await;
    assert_eq!(controller.page_data().active_filter_count, 0);
    assert_eq!(controller.page_data().meta.unwrap().total, 8);
}

#[tokio::test]
async fn saving_from_a_card_updates_every_view() {
    let repo = Arc::new(catalog());
    let store = Arc::new(SavedStore::new());
    let controller = SupplierDiscoveryController::new(repo.clone(), store.clone());
    let synchronizer = SaveStateSynchronizer::new(store.clone(), repo.clone());

    controller.load().await;
    let card = controller.page_data().cards[0].clone();
    assert!(!card.is_saved);
    let mut profile_view = store.subscribe(card.supplier.id);

    let transition = synchronizer
        .toggle_save(card.supplier.id, card.is_saved)
        .await
        .unwrap();

    assert_eq!(
        transition,
        SaveTransition::Settled {
            saved: true,
            requests: 1
        }
    );
    assert!(repo.is_saved(card.supplier.id));
    assert!(*profile_view.borrow_and_update());
    assert!(controller.page_data().cards[0].is_saved);
}

#[tokio::test]
async fn backend_saved_flag_seeds_the_store() {
    let repo = Arc::new(catalog());
    let store = Arc::new(SavedStore::new());
    let controller = SupplierDiscoveryController::new(repo.clone(), store.clone());
    let synchronizer = SaveStateSynchronizer::new(store.clone(), repo.clone());

    controller.go_to_page(2).await.unwrap();
    assert!(store.is_saved(id(3)));

    synchronizer.toggle_save(id(3), true).await.unwrap();

    assert!(!store.is_saved(id(3)));
    assert!(!repo.is_saved(id(3)));
}

#[tokio::test]
async fn shared_link_restores_the_session() {
    let filters = SearchForm::parse("?service_type=cmt&certifications[]=gots&is_verified=true&page=2")
        .unwrap();
    let controller =
        SupplierDiscoveryController::new(Arc::new(catalog()), Arc::new(SavedStore::new()));

    controller.restore(filters.clone()).await.unwrap();

    let data = controller.page_data();
    assert_eq!(data.filters, filters);
    assert_eq!(data.navigation.current_page, 2);
    assert_eq!(data.meta.unwrap().total, 3);
    assert_eq!(SearchForm::parse(&query::to_query_string(&data.filters)).unwrap(), filters);
}

#[tokio::test]
async fn profile_certifications_are_evaluated_once() {
    let today = now().date();
    let repo = catalog().with_certifications(
        id(1),
        vec![
            SupplierCertification::new(CertificationType::Gots, true)
                .expires_on(today + Duration::days(90)),
            SupplierCertification::new(CertificationType::OekoTex, true)
                .expires_on(today + Duration::days(30)),
            SupplierCertification::new(CertificationType::Sa8000, false),
        ],
    );

    let badges = load_certification_badges(&repo, id(1), now()).await.unwrap();

    assert_eq!(badges[0].evaluation.status, CertificationStatus::Verified);
    assert_eq!(badges[1].evaluation.status, CertificationStatus::ExpiringSoon);
    assert_eq!(badges[1].evaluation.days_until_expiry, Some(30));
    assert_eq!(badges[2].evaluation.status, CertificationStatus::Pending);

    let summary = CertificationSummary::from_badges(&badges);
    assert_eq!(summary.active(), 2);
    assert!(summary.needs_attention());
}
