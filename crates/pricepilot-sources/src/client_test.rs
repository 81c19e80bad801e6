use super::*;

fn param<'a>(params: &'a [(&'static str, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v.as_str())
}

#[test]
fn shopping_params_carry_locale() {
    let params =
        SerpApiClient::search_params(SourceId::GoogleShopping, "iphone 16 pro", Country::Uk)
            .unwrap();
    assert_eq!(param(&params, "engine"), Some("google_shopping"));
    assert_eq!(param(&params, "q"), Some("iphone 16 pro"));
    assert_eq!(param(&params, "gl"), Some("uk"));
    assert_eq!(param(&params, "hl"), Some("en"));
    assert_eq!(param(&params, "num"), Some("20"));
}

#[test]
fn amazon_params_use_country_domain() {
    let params = SerpApiClient::search_params(SourceId::Amazon, "kindle", Country::In).unwrap();
    assert_eq!(param(&params, "k"), Some("kindle"));
    assert_eq!(param(&params, "amazon_domain"), Some("amazon.in"));
}

#[test]
fn general_web_query_is_shopping_flavoured() {
    let params =
        SerpApiClient::search_params(SourceId::GoogleGeneral, "sony wh-1000xm5", Country::Us)
            .unwrap();
    assert_eq!(param(&params, "engine"), Some("google"));
    assert_eq!(param(&params, "q"), Some("sony wh-1000xm5 buy price online"));
    assert_eq!(param(&params, "num"), Some("10"));
}

#[test]
fn ebay_params_reject_country_without_site() {
    let err = SerpApiClient::search_params(SourceId::Ebay, "switch", Country::In).unwrap_err();
    assert!(
        matches!(err, FetchError::UnsupportedCountry { source_id: SourceId::Ebay, .. }),
        "expected UnsupportedCountry, got: {err:?}"
    );
}

#[test]
fn sources_for_skips_marketplaces_without_local_site() {
    assert_eq!(SerpApiClient::sources_for(Country::Us), SourceId::ALL.to_vec());
    assert_eq!(
        SerpApiClient::sources_for(Country::In),
        vec![SourceId::GoogleShopping, SourceId::Amazon, SourceId::GoogleGeneral]
    );
    assert_eq!(
        SerpApiClient::sources_for(Country::Jp),
        vec![SourceId::GoogleShopping, SourceId::GoogleGeneral]
    );
}

#[test]
fn with_base_url_trims_trailing_slash() {
    let client = SerpApiClient::new("key", 5, "pricepilot-test/0.1")
        .unwrap()
        .with_base_url("http://127.0.0.1:9999/")
        .unwrap();
    assert_eq!(client.base_url, "http://127.0.0.1:9999");
}

#[test]
fn with_base_url_rejects_non_http() {
    let result = SerpApiClient::new("key", 5, "pricepilot-test/0.1")
        .unwrap()
        .with_base_url("ftp://serpapi.example");
    assert!(matches!(result, Err(FetchError::InvalidBaseUrl { .. })));
    let result = SerpApiClient::new("key", 5, "pricepilot-test/0.1")
        .unwrap()
        .with_base_url("not a url");
    assert!(matches!(result, Err(FetchError::InvalidBaseUrl { .. })));
}

#[test]
fn domain_tables_agree_on_uk() {
    assert_eq!(amazon_domain(Country::Uk), Some("amazon.co.uk"));
    assert_eq!(ebay_domain(Country::Uk), Some("ebay.co.uk"));
    assert_eq!(amazon_domain(Country::Br), None);
}
