use interview_bank::commands::{self, BrowseRequest};
use interview_bank::models::{Difficulty, NewQuestion};
use interview_bank::services::{DatabaseService, DEFAULT_CATEGORIES};
use interview_bank::{AppState, Config};
use std::sync::Arc;
use tempfile::TempDir;

fn open_state() -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        database_path: dir.path().join("bank.db"),
        default_page_size: 2,
        max_page_size: 10,
        ..Config::default()
    };
    let db = Arc::new(DatabaseService::open(&config.database_path).unwrap());
    db.seed_categories(&DEFAULT_CATEGORIES).unwrap();
    (dir, AppState::new(db, config))
}

fn seed_questions(state: &AppState) -> Vec<String> {
    let categories = state.catalog.categories().unwrap();
    let new = |title: &str, body: &str, rank: usize, difficulty| NewQuestion {
        title: title.to_string(),
        body: body.to_string(),
        category_id: categories[rank].id.clone(),
        difficulty,
        is_published: true,
    };
    let report = state
        .db
        .import_questions(&[
            new("Explain yield return", "Generators build **state machines**.", 3, Difficulty::Beginner),
            new("What is a nullable value type?", "`int?` wraps `Nullable<int>`.", 2, Difficulty::Beginner),
            new("Middleware order", "Order matters in the pipeline.", 4, Difficulty::Intermediate),
            new("Service lifetimes", "Singleton, scoped, transient.", 5, Difficulty::Advanced),
        ])
        .unwrap();
    assert!(report.success());
    report.imported.into_iter().map(|q| q.id).collect()
}

#[test]
fn seeded_categories_with_no_questions_browse_empty() {
    let (_dir, state) = open_state();
    let categories = commands::get_categories(&state).unwrap();
    assert_eq!(categories.len(), 7);

    for category in &categories {
        let page = commands::browse_questions(
            &state,
            BrowseRequest {
                category_id: Some(category.id.clone()),
                ..BrowseRequest::default()
            },
        )
        .unwrap();
        assert_eq!(page.total_count, 0);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 0);
    }
}

#[test]
fn browse_uses_configured_page_size_and_limits() {
    let (_dir, state) = open_state();
    seed_questions(&state);

    let page = commands::browse_questions(&state, BrowseRequest::default()).unwrap();
    assert_eq!(page.page_size, 2);
    assert_eq!(page.total_count, 4);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items[0].title, "Explain yield return");
    assert_eq!(page.items[0].category_name, "Iterators & yield");
    assert_eq!(page.items[0].excerpt, "Generators build state machines.");

    let too_big = commands::browse_questions(
        &state,
        BrowseRequest {
            page_size: Some(11),
            ..BrowseRequest::default()
        },
    )
    .unwrap_err();
    assert_eq!(too_big.code, "validation");

    let bad_page = commands::browse_questions(
        &state,
        BrowseRequest {
            page: Some(0),
            ..BrowseRequest::default()
        },
    )
    .unwrap_err();
    assert_eq!(bad_page.code, "validation");
}

#[test]
fn browse_filters_by_difficulty_and_search() {
    let (_dir, state) = open_state();
    seed_questions(&state);

    let page = commands::browse_questions(
        &state,
        BrowseRequest {
            difficulty: Some("beginner".to_string()),
            search: Some("NULLABLE".to_string()),
            ..BrowseRequest::default()
        },
    )
    .unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].difficulty, "Beginner");
    assert_eq!(page.items[0].number, 2);

    let err = commands::browse_questions(
        &state,
        BrowseRequest {
            difficulty: Some("Expert".to_string()),
            ..BrowseRequest::default()
        },
    )
    .unwrap_err();
    assert_eq!(err.code, "validation");
}

#[test]
fn detail_counts_views_and_reports_user_state() {
    let (_dir, state) = open_state();
    let ids = seed_questions(&state);

    let anonymous = commands::get_question_detail(&state, &ids[0], None).unwrap();
    assert_eq!(anonymous.view_count, 1);
    assert!(anonymous.body_html.contains("<strong>state machines</strong>"));
    assert_eq!(anonymous.is_favorite, None);

    assert!(commands::toggle_favorite(&state, "alice", &ids[0]).unwrap());
    let detail = commands::get_question_detail(&state, &ids[0], Some("alice")).unwrap();
    assert_eq!(detail.view_count, 2);
    assert_eq!(detail.is_favorite, Some(true));
    assert_eq!(detail.is_completed, Some(false));

    let missing = commands::get_question_detail(&state, "missing", None).unwrap_err();
    assert_eq!(missing.code, "not_found");
}

#[test]
fn favorites_and_progress_flow() {
    let (_dir, state) = open_state();
    let ids = seed_questions(&state);

    commands::toggle_favorite(&state, "alice", &ids[1]).unwrap();
    commands::toggle_favorite(&state, "alice", &ids[2]).unwrap();
    assert!(!commands::toggle_favorite(&state, "alice", &ids[2]).unwrap());

    let favorites = commands::get_favorites(&state, "alice").unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].question.id, ids[1]);

    assert!(commands::mark_completed(&state, "alice", &ids[0]).unwrap());
    assert!(!commands::mark_completed(&state, "alice", &ids[0]).unwrap());
    assert!(commands::mark_completed(&state, "alice", &ids[3]).unwrap());

    let progress = commands::get_progress(&state, "alice").unwrap();
    assert_eq!(progress.completed, 2);
    assert_eq!(progress.total, 4);
    assert_eq!(progress.percentage, 50.0);
    assert_eq!(progress.categories.len(), 7);
    let iterators = &progress.categories[3];
    assert_eq!(iterators.category.name, "Iterators & yield");
    assert_eq!((iterators.completed, iterators.total), (1, 1));

    let blank = commands::get_progress(&state, " ").unwrap_err();
    assert_eq!(blank.code, "validation");
}

#[test]
fn unpublished_questions_only_with_opt_in() {
    let (_dir, state) = open_state();
    let ids = seed_questions(&state);
    commands::set_question_published(&state, &ids[0], false).unwrap();

    let visible = commands::browse_questions(
        &state,
        BrowseRequest {
            page_size: Some(10),
            ..BrowseRequest::default()
        },
    )
    .unwrap();
    assert_eq!(visible.total_count, 3);

    let all = commands::browse_questions(
        &state,
        BrowseRequest {
            page_size: Some(10),
            include_unpublished: true,
            ..BrowseRequest::default()
        },
    )
    .unwrap();
    assert_eq!(all.total_count, 4);

    let err = commands::set_question_published(&state, "missing", true).unwrap_err();
    assert_eq!(err.code, "not_found");
}

#[test]
fn blank_user_on_detail_does_not_count_a_view() {
    let (_dir, state) = open_state();
    let ids = seed_questions(&state);

    let err = commands::get_question_detail(&state, &ids[1], Some("  ")).unwrap_err();
    assert_eq!(err.code, "validation");
    assert_eq!(state.catalog.get_question(&ids[1]).unwrap().view_count, 0);

    let detail = commands::get_question_detail(&state, &ids[1], Some("alice")).unwrap();
    assert_eq!(detail.view_count, 1);
}

#[test]
fn progress_reaches_full_when_visible_questions_done() {
    let (_dir, state) = open_state();
    let ids = seed_questions(&state);
    commands::set_question_published(&state, &ids[3], false).unwrap();
    for id in &ids[..3] {
        commands::mark_completed(&state, "alice", id).unwrap();
    }

    let progress = commands::get_progress(&state, "alice").unwrap();
    assert_eq!((progress.completed, progress.total), (3, 3));
    assert_eq!(progress.percentage, 100.0);
}
