//! Read scopes against a populated store
//!
//! Run with: `cargo test --test scopes`

mod common;

use blogpost::{CategorySelection, LabelKind, Post, PostOrder, PostQuery};
use common::{create_engine, save, slugs};

/// Four posts saved in this order:
/// spring (2024-03, live), summer (2024-06, live), draft (2024-06), old (2023-11, live)
fn seeded() -> blogpost::BlogEngine {
    let engine = create_engine();
    save(&engine, Post::new("Spring", "s").with_date(2024, 3).published().with_tags("rust, notes"));
    save(&engine, Post::new("Summer", "s").with_date(2024, 6).published().with_tags("rust"));
    save(&engine, Post::new("Draft", "d").with_date(2024, 6).with_tags("notes"));
    save(&engine, Post::new("Old", "o").with_date(2023, 11).published());
    engine
}

#[test]
fn test_published_in_year_newest_first() {
    let engine = seeded();
    let query = PostQuery::new().published().for_year(2024);
    assert_eq!(slugs(&engine, &query), vec!["summer", "spring"]);
}

#[test]
fn test_scopes_commute() {
    let engine = seeded();
    let a = PostQuery::new().published().for_year(2024).tagged_with("rust");
    let b = PostQuery::new().tagged_with("rust").for_year(2024).published();
    assert_eq!(slugs(&engine, &a), slugs(&engine, &b));
    assert_eq!(slugs(&engine, &a), vec!["summer", "spring"]);
}

#[test]
fn test_month_and_draft_scopes() {
    let engine = seeded();
    assert_eq!(slugs(&engine, &PostQuery::new().for_month(6)), vec!["draft", "summer"]);
    assert_eq!(slugs(&engine, &PostQuery::new().drafts()), vec!["draft"]);
    assert_eq!(
        slugs(&engine, &PostQuery::new().for_year(2024).for_month(6).published()),
        vec!["summer"]
    );
}

#[test]
fn test_unscoped_query_returns_everything() {
    let engine = seeded();
    let result = engine.find_posts(&PostQuery::new()).unwrap();
    assert_eq!(result.total_count, 4);
    assert_eq!(result.slugs(), vec!["old", "draft", "summer", "spring"]);
}

#[test]
fn test_alternate_orders() {
    let engine = seeded();
    assert_eq!(
        slugs(&engine, &PostQuery::ordered_by(PostOrder::OldestFirst).published()),
        vec!["spring", "summer", "old"]
    );
    assert_eq!(
        slugs(&engine, &PostQuery::new().reorder(PostOrder::Title)),
        vec!["draft", "old", "spring", "summer"]
    );
}

#[test]
fn test_multiple_label_scopes_require_all() {
    let engine = seeded();
    let query = PostQuery::new().tagged_with("rust").tagged_with("notes");
    assert_eq!(slugs(&engine, &query), vec!["spring"]);
}

#[test]
fn test_unknown_label_matches_nothing() {
    let engine = seeded();
    assert!(slugs(&engine, &PostQuery::new().tagged_with("haskell")).is_empty());
    assert!(slugs(&engine, &PostQuery::new().categorized_as("rust")).is_empty());
}

#[test]
fn test_label_scopes_respect_kind() {
    let engine = create_engine();
    let essays = engine.create_label("essays", LabelKind::Category).unwrap();

    let filed = save(
        &engine,
        Post::new("Filed", "f").with_categories(CategorySelection::new().include(essays.id)),
    );
    // "essays" already names a category, so it is not applied as a tag
    let tagged = save(&engine, Post::new("Tagged", "t").with_tags("essays, misc"));

    assert_eq!(slugs(&engine, &PostQuery::new().categorized_as("essays")), vec!["filed"]);
    assert!(slugs(&engine, &PostQuery::new().tagged_with("essays")).is_empty());
    assert_eq!(slugs(&engine, &PostQuery::new().tagged_with("misc")), vec!["tagged"]);

    assert_eq!(common::names(engine.categories(&filed).unwrap()), vec!["essays"]);
    assert_eq!(common::names(engine.tags(&tagged).unwrap()), vec!["misc"]);
}

#[test]
fn test_post_with_several_labels_is_listed_once() {
    let engine = create_engine();
    let guides = engine.create_label("guides", LabelKind::Category).unwrap();
    let howto = engine.create_label("howto", LabelKind::Category).unwrap();

    save(
        &engine,
        Post::new("Busy", "b")
            .with_tags("a, b, c")
            .with_categories(CategorySelection::new().include(guides.id).include(howto.id)),
    );

    let result = engine
        .find_posts(&PostQuery::new().tagged_with("a").categorized_as("guides"))
        .unwrap();
    assert_eq!(result.total_count, 1);
    assert_eq!(result.posts.len(), 1);
    assert_eq!(slugs(&engine, &PostQuery::new()), vec!["busy"]);
}

#[test]
fn test_pagination_reports_total() {
    let engine = create_engine();
    for i in 0..5 {
        save(&engine, Post::new(format!("Entry {}", i), "e").published());
    }

    let page = engine
        .find_posts(&PostQuery::new().published().limit(2).offset(2))
        .unwrap();
    assert_eq!(page.slugs(), vec!["entry-2", "entry-1"]);
    assert_eq!(page.total_count, 5);

    let tail = engine.find_posts(&PostQuery::new().offset(4)).unwrap();
    assert_eq!(tail.slugs(), vec!["entry-0"]);
    assert_eq!(tail.total_count, 5);
}

#[test]
fn test_scopes_see_label_changes() {
    let engine = create_engine();
    let mut post = save(&engine, Post::new("Moving", "m").with_tags("before"));
    assert_eq!(slugs(&engine, &PostQuery::new().tagged_with("before")), vec!["moving"]);

    post.desired_tags = Some("after".into());
    engine.save_post(&mut post).unwrap();

    assert!(slugs(&engine, &PostQuery::new().tagged_with("before")).is_empty());
    assert_eq!(slugs(&engine, &PostQuery::new().tagged_with("after")), vec!["moving"]);
}
