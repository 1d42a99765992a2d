//! Interactive shell: turns typed commands into listing triggers (mount,
//! query submit, load more, favorite toggle) and renders text cards.

use crate::error::TmdbError;
use crate::favorites::FavoritesStore;
use crate::listing::{self, ListingState, Mode, Phase};
use crate::models::{Actor, Movie};
use crate::tmdb::{image_url, MetadataApi, TmdbClient};
use anyhow::Result;
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

// Browsing actors has no dedicated TMDB listing endpoint; a broad search
// query stands in for "popular people".
const DEFAULT_PERSON_QUERY: &str = "a";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Home,
    Actors,
}

pub struct App {
    api: Arc<dyn MetadataApi>,
    favorites: FavoritesStore,
    view: View,
    movies: ListingState<Movie>,
    actors: ListingState<Actor>,
}

pub async fn run() -> Result<()> {
    let api: Arc<dyn MetadataApi> = Arc::new(TmdbClient::from_env()?);
    let favorites = FavoritesStore::open_default()?;
    info!("{} favorites loaded", favorites.list().len());

    let mut app = App::new(api, favorites);
    app.enter_home().await;
    app.render_current();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        if !app.handle(line.trim()).await {
            break;
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> Result<()> {
    print!("cinescout> ");
    std::io::stdout().flush()?;
    Ok(())
}

impl App {
    pub fn new(api: Arc<dyn MetadataApi>, favorites: FavoritesStore) -> Self {
        Self {
            api,
            favorites,
            view: View::Home,
            movies: ListingState::new(),
            actors: ListingState::new(),
        }
    }

    /// Returns false when the loop should stop.
    pub async fn handle(&mut self, line: &str) -> bool {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (line, ""),
        };
        match command {
            "" => {}
            "home" | "trending" => {
                self.view = View::Home;
                self.movies = ListingState::new();
                self.enter_home().await;
                self.render_current();
            }
            "actors" => {
                self.view = View::Actors;
                self.actors = ListingState::new();
                self.enter_actors().await;
                self.render_current();
            }
            "search" => {
                self.submit_query(Some(rest.to_string())).await;
                self.render_current();
            }
            "clear" => {
                self.submit_query(None).await;
                self.render_current();
            }
            "more" => {
                self.load_more().await;
                self.render_current();
            }
            "movie" => self.show_movie(rest).await,
            "actor" => self.show_actor(rest).await,
            "fav" => self.toggle_favorite(rest).await,
            "favs" => self.render_favorites(rest),
            "help" => print_help(),
            "quit" | "exit" => return false,
            _ => println!("Unknown command '{command}'. Type `help`."),
        }
        true
    }

    async fn enter_home(&mut self) {
        let api = self.api.clone();
        let mode = self.movies.mode().clone();
        match mode {
            Mode::Browse => {
                listing::mount(&mut self.movies, |page| api.trending_movies(page)).await
            }
            Mode::Search(q) => {
                listing::load_next(&mut self.movies, |page| api.search_movies(&q, page)).await
            }
        }
    }

    async fn enter_actors(&mut self) {
        let api = self.api.clone();
        let mode = self.actors.mode().clone();
        match mode {
            Mode::Browse => {
                listing::mount(&mut self.actors, |page| {
                    api.search_people(DEFAULT_PERSON_QUERY, page)
                })
                .await
            }
            Mode::Search(q) => {
                listing::load_next(&mut self.actors, |page| api.search_people(&q, page)).await
            }
        }
    }

    async fn submit_query(&mut self, query: Option<String>) {
        match self.view {
            View::Home => {
                self.movies.set_query(query);
                self.enter_home().await;
            }
            View::Actors => {
                self.actors.set_query(query);
                self.enter_actors().await;
            }
        }
    }

    async fn load_more(&mut self) {
        let api = self.api.clone();
        match self.view {
            View::Home => {
                if !self.movies.should_fetch(0) {
                    return;
                }
                let mode = self.movies.mode().clone();
                match mode {
                    Mode::Browse => {
                        listing::load_next(&mut self.movies, |page| api.trending_movies(page))
                            .await
                    }
                    Mode::Search(q) => {
                        listing::load_next(&mut self.movies, |page| api.search_movies(&q, page))
                            .await
                    }
                }
            }
            View::Actors => {
                if !self.actors.should_fetch(0) {
                    return;
                }
                let q = match self.actors.mode().clone() {
                    Mode::Browse => DEFAULT_PERSON_QUERY.to_string(),
                    Mode::Search(q) => q,
                };
                listing::load_next(&mut self.actors, |page| api.search_people(&q, page)).await
            }
        }
    }

    async fn show_movie(&self, arg: &str) {
        let Some(id) = parse_id(arg) else {
            println!("Usage: movie <id>");
            return;
        };
        match self.api.movie_details(id).await {
            Ok(movie) => println!("{}", render_movie_detail(&movie)),
            Err(e) => println!("Failed to load movie details: {e}"),
        }
    }

    async fn show_actor(&self, arg: &str) {
        let Some(id) = parse_id(arg) else {
            println!("Usage: actor <id>");
            return;
        };
        match fetch_actor_detail(self.api.as_ref(), id).await {
            Ok(text) => println!("{text}"),
            Err(e) => println!("Failed to load actor details: {e}"),
        }
    }

    async fn toggle_favorite(&mut self, arg: &str) {
        let Some(id) = parse_id(arg) else {
            println!("Usage: fav <id>");
            return;
        };
        if self.favorites.contains(id) {
            self.favorites.remove(id);
            println!("Removed {id} from favorites.");
            return;
        }
        // Prefer the already-listed record; fall back to a detail fetch for
        // ids favorited straight from a detail view.
        let movie = match self.movies.items().iter().find(|m| m.id == id) {
            Some(m) => m.clone(),
            None => match self.api.movie_details(id).await {
                Ok(m) => m,
                Err(e) => {
                    println!("Cannot favorite {id}: {e}");
                    return;
                }
            },
        };
        let title = movie.title.clone();
        self.favorites.add(movie);
        println!("Added '{title}' to favorites.");
    }

    fn render_favorites(&self, query: &str) {
        println!("{}", format_favorites(&self.favorites, query));
    }

    fn render_current(&self) {
        match self.view {
            View::Home => {
                render_listing(&self.movies, |m| movie_card(m, self.favorites.contains(m.id)))
            }
            View::Actors => render_listing(&self.actors, actor_card),
        }
    }
}

fn render_listing<T: listing::Entity>(state: &ListingState<T>, card: impl Fn(&T) -> String) {
    if let Some(message) = state.error() {
        println!("Error: {message}");
        return;
    }
    if state.items().is_empty() {
        if state.phase() == Phase::Loading {
            println!("Loading...");
        } else {
            println!("No results found.");
        }
        return;
    }
    for item in state.items() {
        println!("{}", card(item));
    }
    if state.has_more() {
        println!("-- type `more` for the next page --");
    } else {
        println!("-- end of results --");
    }
}

/// Favorites view: the stored list filtered by title, or a message saying
/// whether nothing is stored or nothing matched.
pub fn format_favorites(favorites: &FavoritesStore, query: &str) -> String {
    let shown = favorites.filter(query);
    if shown.is_empty() {
        return if favorites.list().is_empty() {
            "No favorites yet.".to_string()
        } else {
            format!("No favorites matching '{}'.", query.trim())
        };
    }
    shown
        .into_iter()
        .map(|m| movie_card(m, true))
        .collect::<Vec<_>>()
        .join("\n")
}

fn movie_card(movie: &Movie, favorite: bool) -> String {
    let mark = if favorite { "★" } else { " " };
    let year = movie
        .release_date
        .as_deref()
        .and_then(|d| d.split('-').next())
        .unwrap_or("????");
    format!(
        "{mark} [{:>8}] {} ({year})  {:.1}/10",
        movie.id, movie.title, movie.vote_average
    )
}

fn actor_card(actor: &Actor) -> String {
    let known_for = actor
        .known_for
        .first()
        .map(|k| k.label())
        .unwrap_or("N/A");
    format!(
        "  [{:>8}] {}  (Known for: {known_for})",
        actor.id, actor.name
    )
}

pub fn render_movie_detail(movie: &Movie) -> String {
    let mut out = String::new();
    let year = movie
        .release_date
        .as_deref()
        .unwrap_or("unknown release date");
    out.push_str(&format!(
        "{} ({year})\nRating: {:.1}/10\n",
        movie.title, movie.vote_average
    ));
    if let Some(path) = movie.poster_path.as_deref().filter(|p| !p.is_empty()) {
        out.push_str(&format!("Poster: {}\n", image_url(path, "w500")));
    }
    if let Some(genres) = &movie.genres {
        let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
        if !names.is_empty() {
            out.push_str(&format!("Genres: {}\n", names.join(", ")));
        }
    }
    if !movie.overview.is_empty() {
        out.push_str(&format!("\n{}\n", movie.overview));
    }
    if let Some(credits) = &movie.credits {
        if !credits.cast.is_empty() {
            let top: Vec<&str> = credits
                .cast
                .iter()
                .take(10)
                .map(|c| c.name.as_str())
                .collect();
            out.push_str(&format!("\nCast: {}\n", top.join(", ")));
        }
    }
    out
}

pub async fn fetch_actor_detail(
    api: &dyn MetadataApi,
    id: i32,
) -> std::result::Result<String, TmdbError> {
    let actor = api.person_details(id).await?;
    let credits = api.person_movie_credits(id).await?;
    Ok(render_actor_detail(&actor, &credits))
}

pub fn render_actor_detail(actor: &Actor, credits: &[Movie]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", actor.name));
    if let Some(path) = actor.profile_path.as_deref().filter(|p| !p.is_empty()) {
        out.push_str(&format!("Photo: {}\n", image_url(path, "w300")));
    }
    out.push_str(&format!(
        "Birthday: {}\n",
        actor.birthday.as_deref().unwrap_or("N/A")
    ));
    out.push_str(&format!(
        "Birthplace: {}\n",
        actor.place_of_birth.as_deref().unwrap_or("N/A")
    ));
    match actor.biography.as_deref().filter(|b| !b.is_empty()) {
        Some(bio) => out.push_str(&format!("\n{bio}\n")),
        None => out.push_str("\nNo biography available.\n"),
    }
    let known: Vec<&str> = credits
        .iter()
        .filter(|m| m.poster_path.as_deref().is_some_and(|p| !p.is_empty()))
        .map(|m| m.title.as_str())
        .collect();
    if !known.is_empty() {
        out.push_str(&format!("\nKnown for: {}\n", known.join(", ")));
    }
    out
}

fn parse_id(arg: &str) -> Option<i32> {
    arg.parse().ok()
}

fn print_help() {
    println!(
        "Commands:\n  \
         home              browse trending movies\n  \
         actors            browse actors\n  \
         search <query>    search the current view\n  \
         clear             clear the search and return to browsing\n  \
         more              load the next page\n  \
         movie <id>        movie details\n  \
         actor <id>        actor details\n  \
         fav <id>          toggle a favorite\n  \
         favs [query]      list favorites, optionally filtered by title\n  \
         quit              exit"
    );
}
