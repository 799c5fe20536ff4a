//! Storage Module Tests
//!
//! Validates the book collection and the notification path into search.
//!
//! ## Test Scopes
//! - **BookStore**: Create/update/delete/bulk-load semantics, validation and ordering.
//! - **Notification**: Every write reaches subscribed listeners with the full current list.
//! - **HTTP**: CRUD endpoints through the full router, including the search side effects.

#[cfg(test)]
mod tests {
    use crate::app::build_router;
    use crate::config::SearchConfig;
    use crate::reviews::store::ReviewStore;
    use crate::search::service::SearchService;
    use crate::search::types::{Book, SearchOptions};
    use crate::storage::memory::BookStore;
    use crate::storage::types::{BookPatch, BookSource, MutationListener, NewBook, StoreError};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use parking_lot::Mutex;
    use serde_json::{Map, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingListener {
        snapshots: Mutex<Vec<Vec<String>>>,
    }

    impl MutationListener for RecordingListener {
        fn on_books_changed(&self, books: Vec<Book>) {
            self.snapshots
                .lock()
                .push(books.into_iter().map(|b| b.title).collect());
        }
    }

    fn new_book(title: &str, category: &str) -> NewBook {
        NewBook {
            id: None,
            title: title.to_string(),
            author: "Autor".to_string(),
            description: String::new(),
            category: category.to_string(),
            language: "Español".to_string(),
            rating: 0.0,
            extra: Map::new(),
        }
    }

    fn subscribed_store() -> (Arc<BookStore>, Arc<RecordingListener>) {
        let store = BookStore::new();
        let listener = Arc::new(RecordingListener::default());
        let as_listener: Arc<dyn MutationListener> = listener.clone();
        store.subscribe(Arc::downgrade(&as_listener));
        (store, listener)
    }

    // ============================================================
    // BOOKSTORE TESTS
    // ============================================================

    #[test]
    fn test_create_assigns_id_and_keeps_extra_fields() {
        let store = BookStore::new();
        let mut req = new_book("Rayuela", "Novela");
        req.extra.insert("pages".to_string(), json!(600));

        let book = store.create(req).unwrap();

        assert!(!book.id.is_empty());
        assert_eq!(store.get(&book.id), Some(book.clone()));
        assert_eq!(book.extra["pages"], 600);
    }

    #[test]
    fn test_create_keeps_client_id_and_rejects_duplicates() {
        let store = BookStore::new();
        let mut req = new_book("Rayuela", "Novela");
        req.id = Some("42".to_string());

        assert_eq!(store.create(req.clone()).unwrap().id, "42");
        assert_eq!(
            store.create(req),
            Err(StoreError::Conflict("book 42".to_string()))
        );
    }

    #[test]
    fn test_create_validates_required_fields() {
        let store = BookStore::new();

        let err = store.create(new_book("  ", "Novela")).unwrap_err();
        assert!(matches!(err, StoreError::Invalid { field: "title", .. }));

        let mut bad_rating = new_book("Rayuela", "Novela");
        bad_rating.rating = 7.0;
        let err = store.create(bad_rating).unwrap_err();
        assert!(matches!(err, StoreError::Invalid { field: "rating", .. }));

        assert!(store.list().is_empty());
    }

    #[test]
    fn test_store_owns_timestamps() {
        let store = BookStore::new();
        let mut req = new_book("Rayuela", "Novela");
        req.extra.insert("createdAt".to_string(), json!(1));
        req.extra.insert("updatedAt".to_string(), json!(1));

        let book = store.create(req).unwrap();
        assert!(book.created_at > 1);
        assert_eq!(book.created_at, book.updated_at);
        assert!(!book.extra.contains_key("createdAt"));

        let mut patch = BookPatch {
            title: Some("Rayuela (edición crítica)".to_string()),
            ..Default::default()
        };
        patch.extra.insert("createdAt".to_string(), json!(2));
        let updated = store.update(&book.id, patch).unwrap();

        assert_eq!(updated.created_at, book.created_at);
        assert!(updated.updated_at >= book.updated_at);
        assert!(!updated.extra.contains_key("createdAt"));
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let store = BookStore::new();
        for title in ["C", "A", "B"] {
            store.create(new_book(title, "Novela")).unwrap();
        }

        let titles: Vec<String> = store.list().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_update_merges_patch() {
        let store = BookStore::new();
        let book = store.create(new_book("Rayuela", "Novela")).unwrap();

        let mut patch = BookPatch {
            category: Some("Novela experimental".to_string()),
            ..Default::default()
        };
        patch.extra.insert("coverImage".to_string(), json!("c.jpg"));
        let updated = store.update(&book.id, patch).unwrap();

        assert_eq!(updated.title, "Rayuela");
        assert_eq!(updated.category, "Novela experimental");
        assert_eq!(updated.extra["coverImage"], "c.jpg");
        assert_eq!(store.get(&book.id), Some(updated));
    }

    #[test]
    fn test_invalid_update_changes_nothing() {
        let store = BookStore::new();
        let book = store.create(new_book("Rayuela", "Novela")).unwrap();

        let patch = BookPatch {
            author: Some(String::new()),
            ..Default::default()
        };
        assert!(store.update(&book.id, patch).is_err());
        assert_eq!(store.get(&book.id), Some(book));
    }

    #[test]
    fn test_missing_book_errors() {
        let store = BookStore::new();
        assert!(matches!(
            store.update("nope", BookPatch::default()),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(store.delete("nope"), Err(StoreError::NotFound(_))));
        assert_eq!(
            StoreError::NotFound("book nope".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_bulk_load_replaces_collection() {
        let store = BookStore::new();
        store.create(new_book("Vieja", "Novela")).unwrap();

        let loaded = store
            .bulk_load(vec![new_book("Uno", "Poesía"), new_book("Dos", "Ensayo")])
            .unwrap();

        assert_eq!(loaded.len(), 2);
        let titles: Vec<String> = store.list().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Uno", "Dos"]);
    }

    #[test]
    fn test_bulk_load_is_all_or_nothing() {
        let store = BookStore::new();
        store.create(new_book("Vieja", "Novela")).unwrap();

        let result = store.bulk_load(vec![new_book("Uno", "Poesía"), new_book("Dos", "")]);

        assert!(result.is_err());
        assert_eq!(store.list().len(), 1);
    }

    // ============================================================
    // NOTIFICATION TESTS
    // ============================================================

    #[test]
    fn test_every_write_notifies_with_full_list() {
        let (store, listener) = subscribed_store();

        let a = store.create(new_book("A", "Novela")).unwrap();
        store.create(new_book("B", "Novela")).unwrap();
        store
            .update(
                &a.id,
                BookPatch {
                    title: Some("A2".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        store.delete(&a.id).unwrap();
        store.bulk_load(vec![new_book("C", "Novela")]).unwrap();

        let snapshots = listener.snapshots.lock().clone();
        assert_eq!(
            snapshots,
            vec![
                vec!["A"],
                vec!["A", "B"],
                vec!["A2", "B"],
                vec!["B"],
                vec!["C"],
            ]
        );
    }

    #[test]
    fn test_failed_writes_do_not_notify() {
        let (store, listener) = subscribed_store();

        let _ = store.create(new_book("", "Novela"));
        let _ = store.delete("missing");

        assert!(listener.snapshots.lock().is_empty());
    }

    #[test]
    fn test_dropped_listener_is_forgotten() {
        let store = BookStore::new();
        {
            let listener: Arc<dyn MutationListener> = Arc::new(RecordingListener::default());
            store.subscribe(Arc::downgrade(&listener));
        }

        store.create(new_book("A", "Novela")).unwrap();
        assert_eq!(store.list_books().len(), 1);
    }

    #[test]
    fn test_writes_rebuild_search_index() {
        let store = BookStore::new();
        let search = Arc::new(SearchService::new(store.clone(), SearchConfig::default()));
        let listener: Arc<dyn MutationListener> = search.clone();
        store.subscribe(Arc::downgrade(&listener));

        let book = store.create(new_book("Cien años de soledad", "Novela")).unwrap();
        assert_eq!(search.search("soledad", &SearchOptions::default()).len(), 1);
        assert_eq!(search.stats().cache_keys, 1);

        store
            .update(
                &book.id,
                BookPatch {
                    title: Some("La hojarasca".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(search.stats().cache_keys, 0);
        assert!(search.search("soledad", &SearchOptions::default()).is_empty());
        assert_eq!(search.search("hojarasca", &SearchOptions::default()).len(), 1);

        store.delete(&book.id).unwrap();
        assert_eq!(search.stats().total_books, 0);
    }

    // ============================================================
    // HTTP TESTS
    // ============================================================

    fn app() -> axum::Router {
        let books = BookStore::new();
        let search = Arc::new(SearchService::new(books.clone(), SearchConfig::default()));
        let listener: Arc<dyn MutationListener> = search.clone();
        books.subscribe(Arc::downgrade(&listener));
        let reviews = ReviewStore::new(books.clone());
        build_router(books, search, reviews)
    }

    async fn send(
        router: &axum::Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn book_json(title: &str) -> serde_json::Value {
        json!({
            "title": title,
            "author": "Gabriel García Márquez",
            "description": "Novela del realismo mágico",
            "category": "Novela",
            "language": "Español",
            "rating": 4.9,
            "coverImage": "cover.jpg",
            "publicationYear": 1967
        })
    }

    #[tokio::test]
    async fn test_book_crud_roundtrip() {
        let router = app();

        let (status, created) = send(&router, "POST", "/books", Some(book_json("Cien años de soledad"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["publicationYear"], 1967);
        assert!(created["createdAt"].as_u64().unwrap() > 0);
        assert_eq!(created["createdAt"], created["updatedAt"]);

        let (status, fetched) = send(&router, "GET", &format!("/books/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["title"], "Cien años de soledad");

        let (status, updated) = send(
            &router,
            "PUT",
            &format!("/books/{}", id),
            Some(json!({ "rating": 4.2 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["rating"], 4.2);

        let (status, _) = send(&router, "DELETE", &format!("/books/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&router, "GET", &format!("/books/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_invalid_book_is_rejected() {
        let router = app();
        let mut body = book_json("Sin autor");
        body["author"] = json!("");

        let (status, body) = send(&router, "POST", "/books", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("author"));
    }

    #[tokio::test]
    async fn test_load_list_and_search_over_http() {
        let router = app();
        let books: Vec<serde_json::Value> = (1..=3)
            .map(|i| book_json(&format!("Crónica {}", i)))
            .collect();

        let (status, loaded) = send(&router, "POST", "/books/load", Some(json!(books))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(loaded["totalBooks"], 3);

        let (_, listed) = send(&router, "GET", "/books?limit=2", None).await;
        assert_eq!(listed.as_array().unwrap().len(), 2);

        let (_, found) = send(&router, "GET", "/books/search?q=cronica&limit=1", None).await;
        assert_eq!(found["totalResults"], 1);
        assert_eq!(found["results"][0]["title"], "Crónica 1");

        let (_, stats) = send(&router, "GET", "/books/stats", None).await;
        assert_eq!(stats["totalBooks"], 3);
        assert_eq!(stats["cacheKeys"], 1);

        let (status, _) = send(&router, "POST", "/books/cache/clear", None).await;
        assert_eq!(status, StatusCode::OK);
        let (_, stats) = send(&router, "GET", "/books/stats", None).await;
        assert_eq!(stats["cacheKeys"], 0);
    }
}
