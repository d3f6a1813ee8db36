//! Tests for the TMDB catalog client against a loopback server

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::api::*;
    use crate::test_support::TestServer;

    const PAGE: &str = r#"{
        "page": 1,
        "results": [
            {"id": 155, "title": "The Dark Knight", "poster_path": "/qJ2tW6WMUDux911r6m7haRef0WH.jpg",
             "release_date": "2008-07-16", "vote_average": 8.5, "genre_ids": [18, 28], "popularity": 120.4},
            {"id": 272, "title": "Batman Begins", "poster_path": "", "release_date": "", "vote_average": null}
        ],
        "total_pages": 1,
        "total_results": 2
    }"#;

    const MOVIE: &str = r#"{
        "id": 155,
        "title": "The Dark Knight",
        "tagline": "Welcome to a world without rules.",
        "overview": "Batman raises the stakes in his war on crime.",
        "release_date": "2008-07-16",
        "runtime": 152,
        "budget": 185000000,
        "revenue": 1004558444,
        "vote_average": 8.516,
        "vote_count": 32000,
        "popularity": 120.4,
        "original_language": "en",
        "genres": [{"id": 18, "name": "Drama"}, {"id": 28, "name": "Action"}],
        "production_companies": [{"id": 9993, "name": "DC Entertainment", "logo_path": null}],
        "backdrop_path": null
    }"#;

    const CREDITS: &str = r#"{
        "id": 155,
        "cast": [
            {"id": 3894, "name": "Christian Bale", "character": "Bruce Wayne", "profile_path": "/b.jpg"},
            {"id": 1810, "name": "Heath Ledger", "character": null, "profile_path": null}
        ]
    }"#;

    fn client(server: &TestServer) -> TmdbClient {
        let config = CatalogConfig::new("test-token")
            .with_base_url(&format!("{}/3/", server.url()))
            .with_timeout(Duration::from_secs(5));
        TmdbClient::new(config)
    }

    fn routes() -> TestServer {
        TestServer::start(|req| match req.path() {
            "/3/discover/movie" | "/3/search/movie" => (200, PAGE.to_string()),
            "/3/movie/155" => (200, MOVIE.to_string()),
            "/3/movie/155/credits" => (200, CREDITS.to_string()),
            "/3/movie/500" => (500, r#"{"status_message":"Internal error"}"#.to_string()),
            _ => (404, r#"{"success":false,"status_code":34}"#.to_string()),
        })
    }

    #[test]
    fn test_discover_sorts_by_popularity_and_authenticates() {
        let server = routes();
        let movies = client(&server).discover_popular().unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "The Dark Knight");
        assert_eq!(movies[0].genre_ids, vec![18, 28]);

        let req = &server.requests()[0];
        assert_eq!(req.method, "GET");
        assert_eq!(req.query("sort_by").as_deref(), Some("popularity.desc"));
        assert_eq!(req.header("Authorization"), Some("Bearer test-token"));
        assert_eq!(req.header("Accept"), Some("application/json"));
    }

    #[test]
    fn test_search_encodes_term_and_normalizes() {
        let server = routes();
        let movies = client(&server).search_by_term("dark knight & co").unwrap();

        // blank strings become None at the boundary
        assert!(movies[1].poster_path.is_none());
        assert!(movies[1].release_date.is_none());
        assert!(movies[1].vote_average.is_none());

        let req = &server.requests()[0];
        assert_eq!(req.path(), "/3/search/movie");
        assert_eq!(req.query("query").as_deref(), Some("dark knight & co"));
    }

    #[test]
    fn test_get_movie_details() {
        let server = routes();
        let movie = client(&server).get_movie(155).unwrap();
        assert_eq!(movie.runtime, Some(152));
        assert_eq!(movie.budget, 185_000_000);
        assert_eq!(movie.genres.len(), 2);
        assert_eq!(movie.production_companies[0].name, "DC Entertainment");
        assert_eq!(movie.tagline.as_deref(), Some("Welcome to a world without rules."));
        assert!(movie.backdrop_path.is_none());
    }

    #[test]
    fn test_get_credits_defaults_missing_character() {
        let server = routes();
        let credits = client(&server).get_credits(155).unwrap();
        assert_eq!(credits.cast.len(), 2);
        assert_eq!(credits.cast[0].character, "Bruce Wayne");
        assert_eq!(credits.cast[1].character, "");
        assert!(credits.cast[1].profile_path.is_none());
    }

    #[test]
    fn test_missing_movie_is_not_found() {
        let server = routes();
        let err = client(&server).get_movie(999).unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, CatalogError::NotFound { id: 999 }));
    }

    #[test]
    fn test_server_error_is_http_status() {
        let server = routes();
        let err = client(&server).get_movie(500).unwrap_err();
        assert!(matches!(err, CatalogError::HttpStatus { status: 500 }));
    }

    #[test]
    fn test_list_404_is_http_status_not_not_found() {
        let server = TestServer::start(|_| (404, "{}".to_string()));
        let err = client(&server).search_by_term("x").unwrap_err();
        assert!(matches!(err, CatalogError::HttpStatus { status: 404 }));
    }

    #[test]
    fn test_bad_json_is_decode_error() {
        let server = TestServer::start(|_| (200, "<html>".to_string()));
        let err = client(&server).discover_popular().unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)));
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = CatalogConfig::new("k")
            .with_base_url(&format!("http://{}", addr))
            .with_timeout(Duration::from_secs(2));
        let err = TmdbClient::new(config).discover_popular().unwrap_err();
        assert!(matches!(err, CatalogError::Transport(_)));
    }

    #[test]
    fn test_missing_api_key_fails_before_request() {
        let server = routes();
        let config = CatalogConfig::default().with_base_url(&server.url());
        let err = TmdbClient::new(config).discover_popular().unwrap_err();
        assert!(matches!(err, CatalogError::MissingApiKey));
        assert!(server.requests().is_empty());
    }

    #[test]
    fn test_image_url() {
        let config = CatalogConfig::default();
        assert_eq!(
            config.image_url("w500", Some("/abc.jpg")).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/abc.jpg")
        );
        assert_eq!(config.image_url("w500", None), None);
        assert_eq!(config.image_url("w500", Some("")), None);
    }
}
