use async_trait::async_trait;
use cinescout::app::{fetch_actor_detail, render_movie_detail};
use cinescout::error::TmdbError;
use cinescout::listing::{self, ListingState, Mode, Phase};
use cinescout::models::{Actor, KnownFor, Movie};
use cinescout::tmdb::MetadataApi;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct FakeMetadata {
    trending: HashMap<u32, Vec<Movie>>,
    movie_search: HashMap<u32, Vec<Movie>>,
    people_search: HashMap<u32, Vec<Actor>>,
    movies: HashMap<i32, Movie>,
    people: HashMap<i32, Actor>,
    credits: HashMap<i32, Vec<Movie>>,
    failing_trending_pages: HashSet<u32>,
}

#[async_trait]
impl MetadataApi for FakeMetadata {
    async fn trending_movies(&self, page: u32) -> Result<Vec<Movie>, TmdbError> {
        if self.failing_trending_pages.contains(&page) {
            return Err(TmdbError::Status {
                code: 500,
                body: "internal error".to_string(),
            });
        }
        Ok(self.trending.get(&page).cloned().unwrap_or_default())
    }

    async fn search_movies(&self, _query: &str, page: u32) -> Result<Vec<Movie>, TmdbError> {
        Ok(self.movie_search.get(&page).cloned().unwrap_or_default())
    }

    async fn search_people(&self, _query: &str, page: u32) -> Result<Vec<Actor>, TmdbError> {
        Ok(self.people_search.get(&page).cloned().unwrap_or_default())
    }

    async fn movie_details(&self, id: i32) -> Result<Movie, TmdbError> {
        self.movies.get(&id).cloned().ok_or(TmdbError::NotFound {
            what: format!("movie {id}"),
        })
    }

    async fn person_details(&self, id: i32) -> Result<Actor, TmdbError> {
        self.people.get(&id).cloned().ok_or(TmdbError::NotFound {
            what: format!("person {id}"),
        })
    }

    async fn person_movie_credits(&self, id: i32) -> Result<Vec<Movie>, TmdbError> {
        Ok(self.credits.get(&id).cloned().unwrap_or_default())
    }
}

fn movie(id: i32, title: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        overview: format!("Overview of {title}"),
        poster_path: Some(format!("/poster-{id}.jpg")),
        release_date: Some("2024-05-01".to_string()),
        vote_average: 7.2,
        genres: None,
        credits: None,
    }
}

fn posterless(id: i32, title: &str) -> Movie {
    Movie {
        poster_path: Some(String::new()),
        ..movie(id, title)
    }
}

fn movie_page(ids: std::ops::RangeInclusive<i32>) -> Vec<Movie> {
    ids.map(|id| movie(id, &format!("Movie {id}"))).collect()
}

fn ids<T: listing::Entity>(state: &ListingState<T>) -> Vec<i32> {
    state.items().iter().map(|e| e.id()).collect()
}

#[tokio::test]
async fn bulk_mount_merges_two_pages_and_advances_cursor() {
    let mut api = FakeMetadata::default();
    api.trending.insert(1, movie_page(1..=20));
    api.trending.insert(2, movie_page(21..=40));

    let mut state = ListingState::new();
    listing::mount(&mut state, |page| api.trending_movies(page)).await;

    assert_eq!(state.items().len(), 40);
    assert_eq!(state.page(), 3);
    assert_eq!(state.phase(), Phase::Loaded);
    assert!(state.has_more());
    assert!(state.error().is_none());
}

#[tokio::test]
async fn no_duplicate_ids_across_pages_first_seen_wins() {
    let mut api = FakeMetadata::default();
    api.trending.insert(1, vec![movie(1, "First"), movie(2, "Second")]);
    api.trending
        .insert(2, vec![movie(1, "First (again)"), movie(3, "Third")]);

    let mut state = ListingState::new();
    listing::mount(&mut state, |page| api.trending_movies(page)).await;

    assert_eq!(ids(&state), vec![1, 2, 3]);
    assert_eq!(state.items()[0].title, "First");
}

#[tokio::test]
async fn duplicate_in_later_fetch_leaves_length_unchanged() {
    let mut api = FakeMetadata::default();
    api.trending.insert(1, movie_page(1..=20));
    api.trending.insert(2, movie_page(21..=40));
    api.trending.insert(3, vec![movie(7, "Movie 7 duplicate")]);

    let mut state = ListingState::new();
    listing::mount(&mut state, |page| api.trending_movies(page)).await;
    assert_eq!(state.items().len(), 40);

    listing::load_next(&mut state, |page| api.trending_movies(page)).await;
    assert_eq!(state.items().len(), 40);
    assert_eq!(state.items()[6].title, "Movie 7");
    assert_eq!(state.page(), 4);
}

#[tokio::test]
async fn posterless_results_are_filtered_without_error() {
    let mut api = FakeMetadata::default();
    api.movie_search.insert(
        1,
        (1..=5)
            .map(|id| posterless(id, &format!("Batman {id}")))
            .collect(),
    );

    let mut state = ListingState::new();
    state.set_query(Some("batman".to_string()));
    listing::load_next(&mut state, |page| api.search_movies("batman", page)).await;

    assert!(state.items().is_empty());
    assert_eq!(state.phase(), Phase::Loaded);
    assert!(state.error().is_none());
    // The raw page was non-empty, so paging continues.
    assert!(state.has_more());
}

#[tokio::test]
async fn fetch_failure_sets_error_and_keeps_accumulated() {
    let mut api = FakeMetadata::default();
    api.trending.insert(1, movie_page(1..=20));
    api.trending.insert(2, movie_page(21..=40));
    api.failing_trending_pages.insert(3);

    let mut state = ListingState::new();
    listing::mount(&mut state, |page| api.trending_movies(page)).await;
    assert_eq!(state.items().len(), 40);

    listing::load_next(&mut state, |page| api.trending_movies(page)).await;

    assert_eq!(state.phase(), Phase::Error);
    assert!(state.error().unwrap().contains("500"));
    assert_eq!(state.items().len(), 40);
    assert_eq!(state.page(), 3);
}

#[tokio::test]
async fn mount_surfaces_a_first_page_failure() {
    let mut api = FakeMetadata::default();
    api.failing_trending_pages.insert(1);
    api.trending.insert(2, movie_page(21..=40));

    let mut state = ListingState::new();
    listing::mount(&mut state, |page| api.trending_movies(page)).await;

    // Page 2's successful result must not paper over the page-1 failure.
    assert_eq!(state.phase(), Phase::Error);
    assert!(state.error().unwrap().contains("500"));
    assert!(state.items().is_empty());
    assert_eq!(state.page(), 1);

    // Once the backend recovers, the failed page is retried, not skipped.
    api.failing_trending_pages.clear();
    api.trending.insert(1, movie_page(1..=20));
    listing::load_next(&mut state, |page| api.trending_movies(page)).await;
    assert_eq!(state.items().len(), 20);
    assert_eq!(ids(&state), (1..=20).collect::<Vec<_>>());
    assert_eq!(state.page(), 2);
    assert!(state.error().is_none());
}

#[tokio::test]
async fn mount_second_page_failure_keeps_cursor_for_retry() {
    let mut api = FakeMetadata::default();
    api.trending.insert(1, movie_page(1..=20));
    api.trending.insert(2, movie_page(21..=40));
    api.failing_trending_pages.insert(2);

    let mut state = ListingState::new();
    listing::mount(&mut state, |page| api.trending_movies(page)).await;

    assert_eq!(state.phase(), Phase::Error);
    assert_eq!(state.items().len(), 20);
    assert_eq!(state.page(), 2);

    api.failing_trending_pages.clear();
    listing::load_next(&mut state, |page| api.trending_movies(page)).await;
    assert_eq!(state.items().len(), 40);
    assert_eq!(state.page(), 3);
}

#[tokio::test]
async fn empty_page_exhausts_the_listing() {
    let mut api = FakeMetadata::default();
    api.trending.insert(1, movie_page(1..=20));
    // Page 2 is past the end: the fake returns an empty page.

    let mut state = ListingState::new();
    listing::mount(&mut state, |page| api.trending_movies(page)).await;

    assert_eq!(state.items().len(), 20);
    assert!(!state.has_more());
    assert!(!state.should_fetch(0));
    assert!(state.begin().is_none());

    // Further load-more triggers are no-ops.
    listing::load_next(&mut state, |page| api.trending_movies(page)).await;
    assert_eq!(state.page(), 3);
}

#[tokio::test]
async fn clearing_the_query_restores_the_initial_browse_accumulation() {
    let mut api = FakeMetadata::default();
    api.trending.insert(1, movie_page(1..=20));
    api.trending.insert(2, movie_page(21..=40));
    api.movie_search.insert(1, vec![movie(500, "Batman Begins")]);

    let mut state = ListingState::new();
    listing::mount(&mut state, |page| api.trending_movies(page)).await;
    let browse_ids = ids(&state);

    state.set_query(Some("batman".to_string()));
    assert_eq!(state.mode(), &Mode::Search("batman".to_string()));
    listing::load_next(&mut state, |page| api.search_movies("batman", page)).await;
    assert_eq!(ids(&state), vec![500]);
    assert_eq!(state.page(), 2);

    state.set_query(None);
    assert_eq!(state.mode(), &Mode::Browse);
    assert!(state.items().is_empty());
    listing::mount(&mut state, |page| api.trending_movies(page)).await;

    assert_eq!(ids(&state), browse_ids);
    assert_eq!(state.page(), 3);
}

#[tokio::test]
async fn stale_completion_after_reset_is_discarded() {
    let mut state: ListingState<Movie> = ListingState::new();

    let ticket = state.begin().expect("fresh state accepts a fetch");
    // The user submits a query while the page-1 fetch is still in flight.
    state.set_query(Some("batman".to_string()));

    state.complete(ticket, Ok(vec![movie(1, "Stale trending result")]));

    assert!(state.items().is_empty());
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.page(), 1);

    // The reset listing still accepts fresh fetches.
    let fresh = state.begin().expect("reset state accepts a fetch");
    state.complete(fresh, Ok(vec![movie(500, "Batman Begins")]));
    assert_eq!(ids(&state), vec![500]);
}

#[tokio::test]
async fn loading_phase_blocks_reentrant_triggers() {
    let mut state: ListingState<Movie> = ListingState::new();
    assert!(state.should_fetch(99));
    assert!(!state.should_fetch(100));
    assert!(!state.should_fetch(250));

    let ticket = state.begin().expect("idle state accepts a fetch");
    assert!(!state.should_fetch(0));
    assert!(state.begin().is_none());

    state.complete(ticket, Ok(vec![movie(1, "Movie 1")]));
    assert!(state.should_fetch(0));
}

#[tokio::test]
async fn actor_listing_filters_missing_profiles() {
    let actor = |id: i32, profile: Option<&str>| Actor {
        id,
        name: format!("Actor {id}"),
        profile_path: profile.map(str::to_string),
        biography: None,
        birthday: None,
        place_of_birth: None,
        known_for: vec![KnownFor {
            title: Some("Some Movie".to_string()),
            name: None,
        }],
    };

    let mut api = FakeMetadata::default();
    api.people_search.insert(
        1,
        vec![
            actor(1, Some("/a.jpg")),
            actor(2, None),
            actor(3, Some("/c.jpg")),
        ],
    );
    api.people_search.insert(2, vec![actor(4, Some("/d.jpg"))]);

    let mut state = ListingState::new();
    listing::mount(&mut state, |page| api.search_people("a", page)).await;

    assert_eq!(ids(&state), vec![1, 3, 4]);
    assert_eq!(state.page(), 3);
}

#[tokio::test]
async fn movie_detail_renders_cast_and_missing_movie_is_not_found() {
    let mut api = FakeMetadata::default();
    let mut detailed = movie(42, "The Answer");
    detailed.genres = Some(vec![cinescout::models::Genre {
        id: 18,
        name: "Drama".to_string(),
    }]);
    detailed.credits = Some(cinescout::models::Credits {
        cast: vec![cinescout::models::CastMember {
            id: 1,
            name: "Lead Actor".to_string(),
            character: Some("The Lead".to_string()),
            profile_path: None,
        }],
    });
    api.movies.insert(42, detailed);

    let rendered = render_movie_detail(&api.movie_details(42).await.unwrap());
    assert!(rendered.contains("The Answer"));
    assert!(rendered.contains("Drama"));
    assert!(rendered.contains("Lead Actor"));
    assert!(rendered.contains("https://image.tmdb.org/t/p/w500/poster-42.jpg"));

    let err = api.movie_details(7).await.unwrap_err();
    assert!(matches!(err, TmdbError::NotFound { .. }));
    assert_eq!(err.to_string(), "movie 7 not found");
}

#[tokio::test]
async fn actor_detail_filters_posterless_credits() {
    let mut api = FakeMetadata::default();
    api.people.insert(
        9,
        Actor {
            id: 9,
            name: "Famous Person".to_string(),
            profile_path: Some("/p.jpg".to_string()),
            biography: Some("A life in film.".to_string()),
            birthday: Some("1970-01-01".to_string()),
            place_of_birth: Some("Springfield".to_string()),
            known_for: Vec::new(),
        },
    );
    api.credits
        .insert(9, vec![movie(1, "With Poster"), posterless(2, "No Poster")]);

    let rendered = fetch_actor_detail(&api, 9).await.unwrap();
    assert!(rendered.contains("Famous Person"));
    assert!(rendered.contains("https://image.tmdb.org/t/p/w300/p.jpg"));
    assert!(rendered.contains("A life in film."));
    assert!(rendered.contains("With Poster"));
    assert!(!rendered.contains("No Poster"));
}
