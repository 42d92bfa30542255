//! End-to-end behaviour of the recipe service against the in-memory store
//! and the fake catalog.

use saucier_core::{
    CoreError, FakeCatalog, FamilyRecipePayload, MemoryStore, PersonalRecipePayload,
    PersonalRecipeRow, RecipeKey, RecipeRef, RecipeService, RecipeSource, SearchCriteria,
    SearchRequest, ServiceDeps, UserFlags,
};
use serde_json::json;
use std::sync::Arc;

struct Harness {
    store: Arc<MemoryStore>,
    catalog: Arc<FakeCatalog>,
    service: RecipeService,
}

fn harness(catalog: FakeCatalog) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let catalog = Arc::new(catalog);
    let service = RecipeService::new(ServiceDeps {
        recipes: store.clone(),
        interactions: store.clone(),
        family: store.clone(),
        catalog: catalog.clone(),
    });
    Harness {
        store,
        catalog,
        service,
    }
}

fn pancakes() -> PersonalRecipePayload {
    serde_json::from_value(json!({
        "title": "Pancakes",
        "servings": 4,
        "vegetarian": true,
        "ingredients": [
            {"name": "flour", "amount": 2, "unit": "cup"},
            {"name": "salt", "amount": 0.5, "unit": "tsp"}
        ],
        "instructions": ["Mix", "Fry"]
    }))
    .unwrap()
}

/// Let background tasks spawned by the service run until `done` holds.
async fn settle(done: impl Fn() -> bool) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("background work did not finish");
}

#[tokio::test]
async fn test_personal_recipe_wins_over_catalog() {
    let h = harness(FakeCatalog::new().with_recipe(1, "Catalog soup"));
    let id = h.service.create_personal_recipe(pancakes(), 9).await.unwrap();
    assert_eq!(id, 1);

    let recipe = h.service.get_recipe_by_id("1", None).await.unwrap();
    assert_eq!(recipe.view.title, "Pancakes");
    assert_eq!(recipe.view.source, RecipeSource::Personal);
    assert_eq!(recipe.view.instructions, Some(vec!["Mix".into(), "Fry".into()]));
    assert_eq!(h.catalog.call_count(), 0);

    let remote = h.service.get_recipe_by_id("catalog-1", None).await.unwrap();
    assert_eq!(remote.view.title, "Catalog soup");
    assert_eq!(remote.view.source, RecipeSource::Catalog);
}

#[tokio::test]
async fn test_unknown_numeric_id_falls_through_to_catalog() {
    let h = harness(FakeCatalog::new().with_recipe(716429, "Pasta"));
    let recipe = h.service.get_recipe_by_id("716429", None).await.unwrap();
    assert_eq!(recipe.view.title, "Pasta");
    assert_eq!(recipe.view.servings, Some(2));

    let err = h.service.get_recipe_by_id("5", None).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[tokio::test]
async fn test_non_numeric_id_never_reaches_catalog() {
    let h = harness(FakeCatalog::new().with_recipe(1, "Soup"));
    for id in ["abc", "1e3", "personal-x", "", " 1 ", "1\n"] {
        let err = h.service.get_recipe_by_id(id, Some(1)).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)), "{id:?}");
    }
    assert_eq!(h.catalog.call_count(), 0);
    assert_eq!(h.store.view_count(1), 0);
}

#[tokio::test]
async fn test_catalog_outage_is_dependency_failure() {
    let h = harness(FakeCatalog::new());
    h.catalog.set_failing(true);
    let err = h.service.get_recipe_by_id("42", None).await.unwrap_err();
    assert!(err.is_retryable());
    let err = h.service.get_random_recipes(None, None).await.unwrap_err();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_detail_fetch_records_first_view_only() {
    let h = harness(FakeCatalog::new().with_recipe(100, "Curry"));

    let first = h.service.get_recipe_by_id("100", Some(3)).await.unwrap();
    assert_eq!(first.flags, UserFlags::default());
    let again = h.service.get_recipe_by_id("100", Some(3)).await.unwrap();
    assert!(again.flags.viewed);
    assert_eq!(h.store.view_count(3), 1);

    let anonymous = h.service.get_recipe_by_id("100", None).await.unwrap();
    assert_eq!(anonymous.flags, UserFlags::default());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_views_leave_one_row() {
    let h = harness(FakeCatalog::new());
    let ledger = h.service.ledger().clone();
    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.record_view(1, RecipeRef::catalog(77)).await })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        if task.await.unwrap().unwrap() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(h.store.view_count(1), 1);
}

#[tokio::test]
async fn test_favorite_twice_is_conflict() {
    let h = harness(FakeCatalog::new().with_recipe(200, "Tacos"));
    let added = h.service.add_favorite(1, RecipeKey::Ambiguous(200)).await.unwrap();
    assert_eq!(added, RecipeRef::catalog(200));
    let err = h
        .service
        .add_favorite(1, RecipeKey::Catalog(200))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let favorites = h.service.list_favorites(1).await.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].view.id, 200);
    assert!(favorites[0].flags.favorite);
    assert!(!favorites[0].view.is_full());
}

#[tokio::test]
async fn test_same_id_in_both_sources_keeps_interactions_apart() {
    let h = harness(FakeCatalog::new().with_recipe(1, "Catalog soup"));
    let id = h.service.create_personal_recipe(pancakes(), 9).await.unwrap();
    assert_eq!(id, 1);

    let opened = h.service.get_recipe_by_id("catalog-1", Some(5)).await.unwrap();
    assert_eq!(opened.view.title, "Catalog soup");

    let personal = h.service.get_recipe_by_id("personal-1", Some(5)).await.unwrap();
    assert_eq!(personal.view.title, "Pancakes");
    assert_eq!(personal.flags, UserFlags::default());

    let again = h.service.get_recipe_by_id("catalog-1", Some(5)).await.unwrap();
    assert!(again.flags.viewed);

    let recent = h.service.list_recent_views(5).await.unwrap();
    let seen: Vec<_> = recent
        .iter()
        .map(|p| (p.view.title.as_str(), p.view.source))
        .collect();
    assert_eq!(
        seen,
        vec![
            ("Pancakes", RecipeSource::Personal),
            ("Catalog soup", RecipeSource::Catalog),
        ]
    );

    h.service
        .add_favorite(5, RecipeKey::Catalog(1))
        .await
        .unwrap();
    let favorites = h.service.list_favorites(5).await.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].view.source, RecipeSource::Catalog);
    assert_eq!(favorites[0].view.title, "Catalog soup");
    let personal = h.service.get_recipe_by_id("personal-1", Some(5)).await.unwrap();
    assert!(!personal.flags.favorite);
}

#[tokio::test]
async fn test_bare_id_favorite_goes_to_personal_recipe_first() {
    let h = harness(FakeCatalog::new().with_recipe(1, "Catalog soup"));
    h.service.create_personal_recipe(pancakes(), 9).await.unwrap();

    let added = h.service.add_favorite(5, RecipeKey::Ambiguous(1)).await.unwrap();
    assert_eq!(added, RecipeRef::personal(1));
    let added = h.service.add_favorite(5, RecipeKey::Ambiguous(2)).await.unwrap();
    assert_eq!(added, RecipeRef::catalog(2));

    let err = h.service.add_favorite(5, RecipeKey::Opaque).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput { field: "recipeId", .. }));
    assert_eq!(h.store.favorite_count(5), 2);
}

#[tokio::test]
async fn test_update_servings_requires_ownership() {
    let h = harness(FakeCatalog::new());
    let id = h.service.create_personal_recipe(pancakes(), 1).await.unwrap();

    let err = h.service.update_servings(id, 6, 2).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
    let untouched = h.service.get_recipe_by_id(&id.to_string(), None).await.unwrap();
    assert_eq!(untouched.view.servings, Some(4));

    let rescaled = h.service.update_servings(id, 6, 1).await.unwrap();
    let amounts: Vec<_> = rescaled.iter().map(|r| r.ingredient.amount).collect();
    assert_eq!(amounts, vec![Some(3.0), Some(0.75)]);
}

#[tokio::test]
async fn test_partial_servings_write_is_flagged() {
    let h = harness(FakeCatalog::new());
    let id = h.service.create_personal_recipe(pancakes(), 1).await.unwrap();
    let recipe = h.store.recipe_row(id).unwrap();
    h.store.fail_ingredient_updates(recipe.ingredients[1].id);

    match h.service.update_servings(id, 8, 1).await {
        Err(CoreError::DependencyFailure { partial, .. }) => assert!(partial),
        other => panic!("expected partial failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_search_saves_latest_criteria() {
    let h = harness(
        FakeCatalog::new()
            .with_recipe(1, "Tomato soup")
            .with_recipe(2, "Tomato pasta")
            .with_recipe(3, "Pancakes"),
    );
    let search = |q: &str| SearchRequest {
        query: Some(q.to_string()),
        ..Default::default()
    };

    let first = h.service.search_recipes(search("tomato"), Some(4)).await.unwrap();
    assert_eq!(first.total_results, 2);
    let saved_query = |store: &MemoryStore| {
        store
            .last_search_row(4)
            .map(|c: SearchCriteria| c.query)
            .unwrap_or_default()
    };
    settle(|| saved_query(&h.store) == "tomato").await;

    let second = h.service.search_recipes(search("pancakes"), Some(4)).await.unwrap();
    assert_eq!(second.results[0].view.title, "Pancakes");
    settle(|| saved_query(&h.store) == "pancakes").await;

    assert_eq!(h.store.last_search_count(), 1);
    let last = h.service.get_last_search(4).await.unwrap().unwrap();
    assert_eq!(last.query, "pancakes");
    assert_eq!(last.number, 5);
}

#[tokio::test]
async fn test_failed_search_keeps_previous_last_search() {
    let h = harness(FakeCatalog::new().with_recipe(1, "Soup"));
    let search = |q: &str| SearchRequest {
        query: Some(q.to_string()),
        ..Default::default()
    };
    h.service.search_recipes(search("soup"), Some(3)).await.unwrap();
    settle(|| h.store.last_search_row(3).is_some()).await;

    h.catalog.set_failing(true);
    let err = h
        .service
        .search_recipes(search("pasta"), Some(3))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        h.store.last_search_row(3).map(|c| c.query),
        Some("soup".to_string())
    );

    let fresh = harness(FakeCatalog::new());
    fresh.catalog.set_failing(true);
    assert!(fresh.service.search_recipes(search("pasta"), Some(3)).await.is_err());
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
    assert_eq!(fresh.store.last_search_count(), 0);
}

#[tokio::test]
async fn test_anonymous_search_saves_nothing() {
    let h = harness(FakeCatalog::new().with_recipe(1, "Soup"));
    let results = h
        .service
        .search_recipes(
            SearchRequest {
                query: Some("soup".to_string()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();
    assert!(results.last_search.is_none());
    tokio::task::yield_now().await;
    assert_eq!(h.store.last_search_count(), 0);
}

#[tokio::test]
async fn test_recent_views_lists_three_newest() {
    let h = harness(
        FakeCatalog::new()
            .with_recipe(10, "A")
            .with_recipe(11, "B")
            .with_recipe(12, "C")
            .with_recipe(13, "D"),
    );
    for id in ["10", "11", "12", "13"] {
        h.service.get_recipe_by_id(id, Some(1)).await.unwrap();
    }
    let recent = h.service.list_recent_views(1).await.unwrap();
    let ids: Vec<_> = recent.iter().map(|p| p.view.id).collect();
    assert_eq!(ids, vec![13, 12, 11]);
    assert!(recent.iter().all(|p| p.flags.viewed));
}

#[tokio::test]
async fn test_legacy_rows_decode() {
    let h = harness(FakeCatalog::new());
    h.store.insert_raw_recipe(PersonalRecipeRow {
        id: 50,
        user_id: 1,
        title: "Old stew".to_string(),
        image: None,
        ready_in_minutes: Some(90),
        popularity: 0,
        vegan: false,
        vegetarian: false,
        gluten_free: true,
        servings: 4,
        instructions: Some("Brown meat; add stock ;".to_string()),
        legacy_ingredients: Some(r#"["beef","stock"]"#.to_string()),
        ingredients: Vec::new(),
        created_at: chrono::Utc::now(),
    });

    let recipe = h.service.get_recipe_by_id("personal-50", None).await.unwrap();
    let names: Vec<_> = recipe
        .view
        .ingredients
        .unwrap()
        .into_iter()
        .map(|i| i.name)
        .collect();
    assert_eq!(names, vec!["beef", "stock"]);
    assert_eq!(
        recipe.view.instructions,
        Some(vec!["Brown meat".to_string(), "add stock".to_string()])
    );
}

#[tokio::test]
async fn test_family_and_own_recipes_are_per_user() {
    let h = harness(FakeCatalog::new());
    h.service.create_personal_recipe(pancakes(), 1).await.unwrap();
    h.service
        .add_family_recipe(
            1,
            FamilyRecipePayload {
                title: Some("Apple pie".to_string()),
                owner: Some("Grandma".to_string()),
                occasion: Some("Thanksgiving".to_string()),
                image: Some("https://img.example.com/pie.jpg".to_string()),
                ingredients: Some(vec!["apples".to_string(), "butter".to_string()]),
                instructions: Some("Bake.".to_string()),
            },
        )
        .await
        .unwrap();

    let mine = h.service.list_user_recipes(1).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert!(h.service.list_user_recipes(2).await.unwrap().is_empty());

    let family = h.service.list_family_recipes(1).await.unwrap();
    assert_eq!(family[0].images, vec!["https://img.example.com/pie.jpg"]);
    assert_eq!(family[0].ingredients, vec!["apples", "butter"]);
    assert!(h.service.list_family_recipes(2).await.unwrap().is_empty());
}
