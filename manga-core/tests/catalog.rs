use manga_core::{Catalog, ChapterNumber, Client, Error};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn chapter(id: &str, number: Option<&str>) -> Value {
    json!({
        "id": id,
        "type": "chapter",
        "attributes": {
            "volume": "1",
            "chapter": number,
            "title": format!("Chapter {}", number.unwrap_or("?")),
            "translatedLanguage": "en",
        }
    })
}

fn chapter_list(chapters: Vec<Value>, offset: u32, total: u32) -> Value {
    json!({
        "result": "ok",
        "limit": 100,
        "offset": offset,
        "total": total,
        "data": chapters,
    })
}

async fn catalog(server: &MockServer) -> Catalog {
    Catalog::new(Client::with_base_url(&server.uri()).unwrap())
}

#[tokio::test]
async fn resolve_title_returns_every_match() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manga"))
        .and(query_param("title", "One Piece"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                { "id": "a1", "attributes": { "title": { "en": "One Piece" } } },
                { "id": "b2", "attributes": { "title": { "ja-ro": "One Piece Party" } } },
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let entries = catalog(&server)
        .await
        .resolve_title("One Piece")
        .await
        .unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, "a1");
    assert_eq!(entries[0].title("en"), "One Piece");
    assert_eq!(entries[1].title("en"), "One Piece Party");
}

#[tokio::test]
async fn resolve_title_without_match_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manga"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .mount(&server)
        .await;

    let err = catalog(&server)
        .await
        .resolve_title("Nothing at all")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)), "{err}");
}

#[tokio::test]
async fn upstream_failures_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manga"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/manga/broken/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let catalog = catalog(&server).await;

    assert!(matches!(
        catalog.resolve_title("One Piece").await,
        Err(Error::Upstream { .. })
    ));
    assert!(matches!(
        catalog.list_chapters("broken", 10, 0).await,
        Err(Error::Upstream { .. })
    ));
}

#[tokio::test]
async fn list_chapters_forwards_paging_and_language() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manga/m1/feed"))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "20"))
        .and(query_param("translatedLanguage[]", "fr"))
        .and(query_param("order[volume]", "asc"))
        .and(query_param("order[chapter]", "asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chapter_list(
            vec![chapter("c21", Some("21")), chapter("c22", Some("21.5"))],
            20,
            42,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let page = catalog(&server)
        .await
        .set_language("fr")
        .list_chapters("m1", 10, 20)
        .await
        .unwrap();

    assert_eq!(page.total, 42);
    assert_eq!(page.chapters.len(), 2);
    assert_eq!(page.chapters[1].number, ChapterNumber::parse("21.50"));
    assert_eq!(page.chapters[1].language, "en");
}

#[tokio::test]
async fn fetch_all_chapters_stops_on_short_page() {
    let server = MockServer::start().await;
    let full_page = (0..100)
        .map(|i| chapter(&format!("c{i}"), Some((i + 1).to_string().as_str())))
        .collect();
    Mock::given(method("GET"))
        .and(path("/manga/m1/feed"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chapter_list(full_page, 0, 0)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/manga/m1/feed"))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chapter_list(
            vec![chapter("c100", Some("101")), chapter("extra", None)],
            100,
            0,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let chapters = catalog(&server)
        .await
        .fetch_all_chapters("m1")
        .await
        .unwrap();

    assert_eq!(chapters.len(), 102);
    assert_eq!(chapters[100].number.as_integer(), Some(101));
    assert_eq!(chapters[101].number.label(), "oneshot");
}

#[tokio::test]
async fn missing_chapter_number_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chapter"))
        .and(query_param("manga", "one-piece"))
        .and(query_param("chapter[]", "1050"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chapter_list(vec![], 0, 0)))
        .expect(1)
        .mount(&server)
        .await;

    let err = catalog(&server)
        .await
        .resolve_chapter_by_number("one-piece", &ChapterNumber::from(1050))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)), "{err}");
}

#[tokio::test]
async fn fractional_chapters_resolve_by_number() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chapter"))
        .and(query_param("chapter[]", "10.5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chapter_list(
            vec![chapter("c105", Some("10.5"))],
            0,
            1,
        )))
        .mount(&server)
        .await;

    let chapter = catalog(&server)
        .await
        .resolve_chapter_by_number("m1", &ChapterNumber::parse("10.50"))
        .await
        .unwrap();

    assert_eq!(chapter.id, "c105");
    assert_eq!(chapter.display_title.as_deref(), Some("Chapter 10.5"));
}

#[tokio::test]
async fn range_keeps_only_existing_whole_numbers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chapter"))
        .and(query_param("chapter[]", "1"))
        .and(query_param("chapter[]", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chapter_list(
            vec![
                chapter("c1", Some("1")),
                chapter("c3-group-a", Some("3")),
                chapter("c3-group-b", Some("3")),
                chapter("c3.5", Some("3.5")),
                chapter("c4", Some("4.0")),
            ],
            0,
            5,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let found = catalog(&server)
        .await
        .resolve_chapter_range("m1", 1, 4)
        .await
        .unwrap();

    assert_eq!(found.len(), 3);
    assert_eq!(found[&1], "c1");
    assert!(!found.contains_key(&2));
    assert_eq!(found[&3], "c3-group-a");
    assert_eq!(found[&4], "c4");
}

#[tokio::test]
async fn long_ranges_are_batched_and_paged() {
    let server = MockServer::start().await;
    let first_batch = (1..=100)
        .map(|number| chapter(&format!("c{number}"), Some(number.to_string().as_str())))
        .collect();
    Mock::given(method("GET"))
        .and(path("/chapter"))
        .and(query_param("chapter[]", "1"))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chapter_list(first_batch, 0, 100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chapter"))
        .and(query_param("chapter[]", "1"))
        .and(query_param("offset", "100"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chapter_list(Vec::new(), 100, 100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chapter"))
        .and(query_param("chapter[]", "150"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chapter_list(
            vec![chapter("c150", Some("150"))],
            0,
            1,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let found = catalog(&server)
        .await
        .resolve_chapter_range("m1", 1, 150)
        .await
        .unwrap();

    assert_eq!(found.len(), 101);
    assert_eq!(found[&1], "c1");
    assert_eq!(found[&100], "c100");
    assert!(!found.contains_key(&101));
    assert_eq!(found[&150], "c150");
}

#[tokio::test]
async fn inverted_range_is_rejected() {
    let server = MockServer::start().await;

    let err = catalog(&server)
        .await
        .resolve_chapter_range("m1", 5, 2)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidChapterSelection(_)), "{err}");
}
