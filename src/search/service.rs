//! Search Service Facade
//!
//! Owns the single live [`BookIndex`] and the [`QueryCache`] in front of it.
//!
//! ## Lifecycle
//! The service starts unbuilt. The first `initialize` (explicit, or triggered by a
//! store mutation) builds the index; a search against an unbuilt service pulls the
//! book list from its [`BookSource`] and builds lazily. Every rebuild replaces the
//! index and flushes the cache under one write lock, so a search never pairs the
//! new index with results cached from the old one.

use super::cache::{QueryCache, category_key, search_key};
use super::engine;
use super::filter::{filter_and_limit, matches_category};
use super::index::BookIndex;
use super::types::{Book, ScoredMatch, SearchOptions, SearchStats};
use crate::config::SearchConfig;
use crate::storage::types::{BookSource, MutationListener};

use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub enum CachedResults {
    Matches(Arc<Vec<ScoredMatch>>),
    Books(Arc<Vec<Book>>),
}

pub struct SearchService {
    source: Arc<dyn BookSource>,
    config: SearchConfig,
    index: RwLock<Option<BookIndex>>,
    cache: QueryCache<CachedResults>,
}

impl SearchService {
    pub fn new(source: Arc<dyn BookSource>, config: SearchConfig) -> Self {
        let cache = QueryCache::new(config.cache_ttl);
        Self::with_cache(source, config, cache)
    }

    pub fn with_cache(
        source: Arc<dyn BookSource>,
        config: SearchConfig,
        cache: QueryCache<CachedResults>,
    ) -> Self {
        Self {
            source,
            config,
            index: RwLock::new(None),
            cache,
        }
    }

    /// Rebuilds the index from `books` and flushes the cache.
    pub fn initialize(&self, books: Vec<Book>) {
        let index = BookIndex::build(books);
        let total = index.len();

        let mut slot = self.index.write();
        *slot = Some(index);
        self.cache.flush();
        drop(slot);

        tracing::info!("Search index rebuilt with {} books", total);
    }

    /// Ranked, filtered and truncated search.
    ///
    /// Without a usable query (under two characters) the books are returned
    /// unscored: all of them (up to the listing limit) unless a category is
    /// given, in which case the filtered subset is returned instead.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Vec<ScoredMatch> {
        let mut options = options.normalized();
        let index = self.ready_index();
        let short_query = query.trim().chars().count() < engine::MIN_QUERY_CHARS;

        if short_query && options.category.is_none() {
            let limit = options.limit.unwrap_or(self.config.listing_limit);
            return index
                .books()
                .iter()
                .take(limit)
                .cloned()
                .map(ScoredMatch::unscored)
                .collect();
        }

        options.limit = Some(options.limit.unwrap_or(self.config.default_limit));
        let key = search_key(query, &options);

        if let Some(CachedResults::Matches(results)) = self.cache.get(&key) {
            tracing::debug!("Cache hit for {:?}", query);
            return results.as_ref().clone();
        }

        let started = Instant::now();
        let matches = engine::search(&index, query, &self.config.match_options());
        let results = filter_and_limit(matches, &options, self.config.default_limit);

        self.cache
            .put(key, CachedResults::Matches(Arc::new(results.clone())));

        tracing::debug!(
            "Search {:?} finished in {:?} with {} results",
            query,
            started.elapsed(),
            results.len()
        );
        results
    }

    /// Every indexed book whose category contains `category`, in index order.
    pub fn search_by_category(&self, category: &str) -> Vec<Book> {
        let index = self.ready_index();
        let key = category_key(category);

        if let Some(CachedResults::Books(books)) = self.cache.get(&key) {
            return books.as_ref().clone();
        }

        let needle = category.trim();
        let books: Vec<Book> = index
            .books()
            .iter()
            .filter(|book| matches_category(book, needle))
            .cloned()
            .collect();

        self.cache.put(key, CachedResults::Books(Arc::new(books.clone())));
        books
    }

    pub fn stats(&self) -> SearchStats {
        let total_books = self.index.read().as_ref().map_or(0, BookIndex::len);
        let cache_stats = self.cache.stats();

        SearchStats {
            total_books,
            cache_keys: cache_stats.keys,
            cache_stats,
        }
    }

    pub fn clear_cache(&self) {
        self.cache.flush();
        tracing::info!("Search cache cleared");
    }

    /// Read access to the index, building it from the source first if needed.
    fn ready_index(&self) -> MappedRwLockReadGuard<'_, BookIndex> {
        loop {
            match RwLockReadGuard::try_map(self.index.read(), |slot| slot.as_ref()) {
                Ok(index) => return index,
                Err(unbuilt) => {
                    drop(unbuilt);
                    self.lazy_initialize();
                }
            }
        }
    }

    fn lazy_initialize(&self) {
        let books = self.source.list_books();

        let mut slot = self.index.write();
        if slot.is_some() {
            return;
        }
        tracing::info!("Building search index on first use ({} books)", books.len());
        *slot = Some(BookIndex::build(books));
        self.cache.flush();
    }
}

impl MutationListener for SearchService {
    fn on_books_changed(&self, books: Vec<Book>) {
        self.initialize(books);
    }
}
