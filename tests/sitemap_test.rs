use sitenotify::error::SitemapError;
use sitenotify::sitemap::{SitemapType, extract_sitemap_urls, fetch, identify_sitemap_type};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ===========================================================================================
// identify_sitemap_type Tests
// ===========================================================================================

#[test]
fn test_identify_sitemap_type_urlset() {
    let xml = include_str!("fixtures/sitemap1.xml");
    assert_eq!(identify_sitemap_type(xml), SitemapType::UrlSet);
}

#[test]
fn test_identify_sitemap_type_sitemapindex() {
    let xml = include_str!("fixtures/sitemap_index.xml");
    assert_eq!(identify_sitemap_type(xml), SitemapType::SitemapIndex);
}

#[test]
fn test_identify_sitemap_type_invalid() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
   <channel>
      <title>Example RSS Feed</title>
      <link>http://www.example.com/</link>
   </channel>
</rss>"#;
    assert_eq!(identify_sitemap_type(xml), SitemapType::Unknown);
}

#[test]
fn test_identify_sitemap_type_malformed() {
    assert_eq!(identify_sitemap_type("This is not XML at all"), SitemapType::Unknown);
    assert_eq!(identify_sitemap_type(""), SitemapType::Unknown);
}

// ===========================================================================================
// extract_sitemap_urls Tests
// ===========================================================================================

#[test]
fn test_extract_sitemap_urls_in_document_order() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
   <url>
      <loc>http://www.example.com/</loc>
      <lastmod>2005-01-01</lastmod>
      <changefreq>monthly</changefreq>
      <priority>0.8</priority>
   </url>
   <url>
      <loc>http://www.example.com/catalog?item=12&amp;desc=vacation_hawaii</loc>
      <changefreq>weekly</changefreq>
   </url>
   <url>
      <loc>http://www.example.com/about</loc>
   </url>
</urlset>"#;

    let urls = extract_sitemap_urls(xml).expect("valid sitemap should parse");
    assert_eq!(
        urls,
        vec![
            "http://www.example.com/",
            "http://www.example.com/catalog?item=12&desc=vacation_hawaii",
            "http://www.example.com/about",
        ]
    );
}

#[test]
fn test_extract_sitemap_urls_keeps_duplicates_verbatim() {
    let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/a</loc></url>
  <url><loc>https://example.com/a</loc></url>
</urlset>"#;

    let urls = extract_sitemap_urls(xml).unwrap();
    assert_eq!(urls.len(), 2);
}

#[test]
fn test_extract_sitemap_urls_empty_urlset() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
</urlset>"#;
    assert!(extract_sitemap_urls(xml).unwrap().is_empty());
}

#[test]
fn test_extract_sitemap_urls_ignores_other_namespaces() {
    let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
        xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
  <url>
    <loc>https://example.com/gallery</loc>
    <image:image><image:loc>https://example.com/photo.jpg</image:loc></image:image>
  </url>
</urlset>"#;

    let urls = extract_sitemap_urls(xml).unwrap();
    assert_eq!(urls, vec!["https://example.com/gallery"]);
}

#[test]
fn test_extract_sitemap_urls_without_namespace_finds_nothing() {
    let xml = "<urlset><url><loc>https://example.com/</loc></url></urlset>";
    assert!(extract_sitemap_urls(xml).unwrap().is_empty());
}

#[test]
fn test_extract_sitemap_urls_prefixed_namespace_and_cdata() {
    let xml = r#"<sm:urlset xmlns:sm="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sm:url><sm:loc><![CDATA[https://example.com/?a=1&b=2]]></sm:loc></sm:url>
  <sm:url><sm:loc>
      https://example.com/padded
  </sm:loc></sm:url>
</sm:urlset>"#;

    let urls = extract_sitemap_urls(xml).unwrap();
    assert_eq!(
        urls,
        vec!["https://example.com/?a=1&b=2", "https://example.com/padded"]
    );
}

#[test]
fn test_extract_sitemap_urls_skips_empty_locations() {
    let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc/></url>
  <url><loc></loc></url>
  <url><loc>   </loc></url>
  <url><loc>https://a/</loc></url>
</urlset>"#;

    let urls = extract_sitemap_urls(xml).unwrap();
    assert_eq!(urls, vec!["https://a/"]);
}

#[test]
fn test_extract_sitemap_urls_not_xml() {
    let err = extract_sitemap_urls("This is not XML at all").unwrap_err();
    assert!(err.is_parse_error(), "unexpected error: {err}");
}

#[test]
fn test_extract_sitemap_urls_empty_document() {
    let err = extract_sitemap_urls("").unwrap_err();
    assert!(matches!(err, SitemapError::Malformed(_)));
}

#[test]
fn test_extract_sitemap_urls_mismatched_tags() {
    let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></uri>
</urlset>"#;
    let err = extract_sitemap_urls(xml).unwrap_err();
    assert!(err.is_parse_error(), "unexpected error: {err}");
}

#[test]
fn test_extract_sitemap_urls_truncated_document() {
    let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></url>"#;
    let err = extract_sitemap_urls(xml).unwrap_err();
    assert!(err.is_parse_error(), "unexpected error: {err}");
}

// ===========================================================================================
// fetch Tests
// ===========================================================================================

#[tokio::test]
async fn test_fetch_urlset() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(include_str!("fixtures/sitemap1.xml")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::new();
    let urls = fetch(&format!("{}/sitemap.xml", mock_server.uri()), &client)
        .await
        .expect("fetch should succeed");

    assert_eq!(
        urls,
        vec!["http://www.example.com/page1", "http://www.example.com/page2"]
    );
}

#[tokio::test]
async fn test_fetch_http_error_yields_empty_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::new();
    let urls = fetch(&format!("{}/sitemap.xml", mock_server.uri()), &client)
        .await
        .expect("HTTP failures are not errors at this layer");

    assert!(urls.is_empty());
}

#[tokio::test]
async fn test_fetch_unreachable_host_yields_empty_list() {
    let client = reqwest::Client::new();
    // Port 1 is reserved and nothing listens there.
    let urls = fetch("http://127.0.0.1:1/sitemap.xml", &client).await.unwrap();
    assert!(urls.is_empty());
}

#[tokio::test]
async fn test_fetch_malformed_body_is_a_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<urlset><url></urlset>"))
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::new();
    let err = fetch(&format!("{}/sitemap.xml", mock_server.uri()), &client)
        .await
        .unwrap_err();

    assert!(err.is_parse_error(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_fetch_follows_sitemap_index() {
    let mock_server = MockServer::start().await;

    let index_xml =
        include_str!("fixtures/sitemap_index.xml").replace("http://www.example.com", &mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/sitemap_index.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(index_xml))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap1.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(include_str!("fixtures/sitemap1.xml")),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap2.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(include_str!("fixtures/sitemap2.xml")),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing.xml"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = reqwest::Client::new();
    let urls = fetch(&format!("{}/sitemap_index.xml", mock_server.uri()), &client)
        .await
        .expect("index should be followed");

    // The missing child sitemap is skipped, the others keep document order.
    assert_eq!(
        urls,
        vec![
            "http://www.example.com/page1",
            "http://www.example.com/page2",
            "http://www.example.com/page3",
        ]
    );
}
