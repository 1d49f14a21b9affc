//! Integration tests for the search and update pipeline
//!
//! These drive the agent end to end against a mocked catalog:
//! - Search ranking, threshold filtering, and pre-order exclusion
//! - The automatic-search short-circuit at a good-enough score
//! - Update-phase field writes, including the force policy and cover fetch

use narrator::{Agent, AgentConfig, CatalogId, LocalMediaQuery, MediaKind, MetadataSink, Region};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> AgentConfig {
    AgentConfig {
        api_base_url: Some(server.uri()),
        enrichment_base_url: Some(server.uri()),
        ..Default::default()
    }
}

fn book_query(album: &str, artist: &str) -> LocalMediaQuery {
    LocalMediaQuery {
        kind: MediaKind::Book,
        album: Some(album.to_string()),
        artist: Some(artist.to_string()),
        language: "en".to_string(),
        ..Default::default()
    }
}

fn product(asin: &str, title: &str, author: &str, date: &str) -> serde_json::Value {
    json!({
        "asin": asin,
        "title": title,
        "authors": [{"name": author}],
        "narrators": [{"name": "Ray Porter"}],
        "language": "English",
        "release_date": date,
    })
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn search_ranks_candidates_and_drops_the_unacceptable() {
    let server = MockServer::start().await;

    let products = json!({
        "products": [
            // Decent but not exact; catalog ranked it first.
            product("B000000001", "The Martian: Classified", "Andy Weir", "2021-10-04"),
            // Exact match, one index slot later.
            product("B000000002", "The Martian", "Andy Weir", "2013-03-22"),
            // Missing title: dropped before scoring.
            json!({
                "asin": "B000000003",
                "authors": [{"name": "Andy Weir"}],
                "narrators": [{"name": "Ray Porter"}],
                "language": "English"
            }),
            // Pre-order: excluded outright.
            product("B000000004", "The Martian", "Andy Weir", "2199-01-01"),
            // Unrelated: scores far below the ignore boundary.
            product("B000000005", "A History of Gardening", "Someone Else", "2019-01-01"),
        ]
    });

    Mock::given(method("GET"))
        .and(path("/1.0/catalog/products"))
        .and(query_param("title", "the martian"))
        .and(query_param("author", "Andy Weir"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products))
        .mount(&server)
        .await;

    let agent = Agent::new(config_for(&server));
    // Manual search keeps every acceptable candidate visible.
    let mut media = book_query("The Martian", "Andy Weir");
    media.manual = true;

    let results = agent.search(&media).await;

    assert_eq!(results.len(), 2);
    // Exact match wins despite the catalog ranking it second.
    assert_eq!(results[0].id.asin, "B000000002");
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(results.iter().all(|r| r.score >= 45));
    assert!(results.iter().all(|r| r.id.asin != "B000000004"));
    assert_eq!(results[0].year, Some(2013));
}

#[tokio::test]
async fn automatic_search_short_circuits_on_good_score() {
    let server = MockServer::start().await;

    let products = json!({
        "products": [
            product("B000000001", "The Martian", "Andy Weir", "2013-03-22"),
            product("B000000002", "The Martian: Classified", "Andy Weir", "2021-10-04"),
        ]
    });

    Mock::given(method("GET"))
        .and(path("/1.0/catalog/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(products))
        .mount(&server)
        .await;

    let agent = Agent::new(config_for(&server));

    let automatic = agent.search(&book_query("The Martian", "Andy Weir")).await;
    assert_eq!(automatic.len(), 1);
    assert_eq!(automatic[0].id.asin, "B000000001");

    let mut manual_media = book_query("The Martian", "Andy Weir");
    manual_media.manual = true;
    let manual = agent.search(&manual_media).await;
    assert_eq!(manual.len(), 2);
}

#[tokio::test]
async fn search_returns_empty_on_malformed_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1.0/catalog/products"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let config = AgentConfig {
        max_retries: 1,
        ..config_for(&server)
    };
    let agent = Agent::new(config);

    let results = agent.search(&book_query("The Martian", "Andy Weir")).await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn search_returns_empty_on_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1.0/catalog/products"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = AgentConfig {
        max_retries: 1,
        ..config_for(&server)
    };
    let agent = Agent::new(config);

    let results = agent.search(&book_query("The Martian", "Andy Weir")).await;
    assert!(results.is_empty());
}

#[tokio::test]
async fn quick_match_makes_no_catalog_request() {
    // No mocks mounted: any request against this server would 404 and the
    // search would come back empty.
    let server = MockServer::start().await;
    let agent = Agent::new(config_for(&server));

    let mut media = book_query("The Martian", "Andy Weir");
    media.filename = Some("The Martian B002V0QK4C.m4b".to_string());

    let results = agent.search(&media).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id.asin, "B002V0QK4C");
    assert_eq!(results[0].score, 100);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn author_search_ranks_by_name_distance() {
    let server = MockServer::start().await;

    let authors = json!([
        {"asin": "B000000010", "name": "Andrew Weird"},
        {"asin": "B000000011", "name": "Andy Weir"},
    ]);

    Mock::given(method("GET"))
        .and(path("/authors"))
        .and(query_param("name", "Andy Weir"))
        .and(query_param("region", "us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(authors))
        .mount(&server)
        .await;

    let agent = Agent::new(config_for(&server));
    let mut media = LocalMediaQuery {
        kind: MediaKind::Author,
        artist: Some("Andy Weir".to_string()),
        language: "en".to_string(),
        ..Default::default()
    };
    media.manual = true;

    let results = agent.search(&media).await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id.asin, "B000000011");
    assert_eq!(results[0].display_name, "Andy Weir");
    assert_eq!(results[0].score, 99);
}

// ============================================================================
// Update
// ============================================================================

fn full_book_json(image_url: Option<&str>) -> serde_json::Value {
    json!({
        "asin": "B002V0QK4C",
        "title": "The Final Empire",
        "subtitle": "Mistborn Book One",
        "summary": "<p>What if the <i>hero</i> failed?</p>",
        "publisherName": "Macmillan Audio",
        "releaseDate": "2010-05-24T00:00:00.000Z",
        "rating": "4.5",
        "image": image_url,
        "genres": [
            {"name": "Science Fiction & Fantasy", "type": "genre"},
            {"name": "Epic Fantasy", "type": "tag"}
        ],
        "seriesPrimary": {"name": "Mistborn", "position": "1"},
        "authors": [
            {"name": "Brandon Sanderson"},
            {"name": "Jane Doe - translator"}
        ],
        "narrators": [{"name": "Michael Kramer"}]
    })
}

#[tokio::test]
async fn update_fills_the_sink_from_the_full_record() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/books/B002V0QK4C"))
        .and(query_param("region", "uk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_book_json(None)))
        .mount(&server)
        .await;

    let agent = Agent::new(config_for(&server));
    let id = agent.parse_id("B002V0QK4C_uk").unwrap();
    assert_eq!(id, CatalogId::new("B002V0QK4C", Region::Uk));

    let mut sink = MetadataSink::default();
    agent.update(&id, MediaKind::Book, &mut sink, false).await;

    assert_eq!(
        sink.title.as_deref(),
        Some("The Final Empire: Mistborn Book One")
    );
    assert_eq!(
        sink.sort_title.as_deref(),
        Some("Mistborn, Book 1 - The Final Empire")
    );
    assert_eq!(sink.studio.as_deref(), Some("Macmillan Audio"));
    assert_eq!(sink.summary.as_deref(), Some("What if the hero failed?\n"));
    assert_eq!(sink.rating, Some(9.0));
    assert_eq!(sink.genres, vec!["Science Fiction & Fantasy", "Epic Fantasy"]);
    assert_eq!(sink.narrators, vec!["Michael Kramer"]);
    assert_eq!(sink.author_tags, vec!["Brandon Sanderson"]);
    assert_eq!(sink.series_tags, vec!["Series: Mistborn"]);
}

#[tokio::test]
async fn update_respects_existing_fields_unless_forced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/books/B002V0QK4C"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_book_json(None)))
        .mount(&server)
        .await;

    let agent = Agent::new(config_for(&server));
    let id = CatalogId::new("B002V0QK4C", Region::Us);

    let mut sink = MetadataSink {
        title: Some("Hand-Edited".to_string()),
        rating: Some(2.0),
        ..Default::default()
    };
    agent.update(&id, MediaKind::Book, &mut sink, false).await;
    assert_eq!(sink.title.as_deref(), Some("Hand-Edited"));
    // Ratings are the exception: the catalog value always wins.
    assert_eq!(sink.rating, Some(9.0));

    agent.update(&id, MediaKind::Book, &mut sink, true).await;
    assert_eq!(
        sink.title.as_deref(),
        Some("The Final Empire: Mistborn Book One")
    );
}

#[tokio::test]
async fn update_fetches_cover_as_primary_image() {
    let server = MockServer::start().await;
    let cover_url = format!("{}/cover.jpg", server.uri());

    Mock::given(method("GET"))
        .and(path("/books/B002V0QK4C"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(full_book_json(Some(&cover_url))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cover.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
        .mount(&server)
        .await;

    let agent = Agent::new(config_for(&server));
    let id = CatalogId::new("B002V0QK4C", Region::Us);

    let mut sink = MetadataSink::default();
    agent.update(&id, MediaKind::Book, &mut sink, false).await;

    let poster = sink.poster.expect("cover should be stored");
    assert_eq!(poster.url, cover_url);
    assert_eq!(poster.data, vec![0xFF, 0xD8, 0xFF]);
    assert_eq!(poster.sort_order, 0);

    // A second update with the same cover URL must not refetch it.
    let requests_before = server.received_requests().await.unwrap().len();
    let mut sink = MetadataSink {
        poster: Some(poster),
        ..Default::default()
    };
    agent.update(&id, MediaKind::Book, &mut sink, false).await;
    let cover_requests_after: usize = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .skip(requests_before)
        .filter(|r| r.url.path() == "/cover.jpg")
        .count();
    assert_eq!(cover_requests_after, 0);
}

#[tokio::test]
async fn update_leaves_sink_untouched_when_fetch_fails() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/books/B002V0QK4C"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = AgentConfig {
        max_retries: 1,
        ..config_for(&server)
    };
    let agent = Agent::new(config);
    let id = CatalogId::new("B002V0QK4C", Region::Us);

    let mut sink = MetadataSink {
        title: Some("Untouched".to_string()),
        ..Default::default()
    };
    agent.update(&id, MediaKind::Book, &mut sink, true).await;

    assert_eq!(sink.title.as_deref(), Some("Untouched"));
    assert!(sink.genres.is_empty());
}

#[tokio::test]
async fn update_applies_author_records() {
    let server = MockServer::start().await;

    let author = json!({
        "asin": "B000APZOQA",
        "name": "Andy Weir",
        "description": "Author of The Martian.",
        "genres": [{"name": "Science Fiction", "type": "genre"}]
    });

    Mock::given(method("GET"))
        .and(path("/authors/B000APZOQA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(author))
        .mount(&server)
        .await;

    let agent = Agent::new(config_for(&server));
    let id = CatalogId::new("B000APZOQA", Region::Us);

    let mut sink = MetadataSink::default();
    agent.update(&id, MediaKind::Author, &mut sink, false).await;

    assert_eq!(sink.title.as_deref(), Some("Andy Weir"));
    assert_eq!(sink.summary.as_deref(), Some("Author of The Martian."));
    assert_eq!(sink.genres, vec!["Science Fiction"]);
}
