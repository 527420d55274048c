use crate::dom::HtmlDocument;
use crate::error::ScrapeError;
use crate::extract::{extract, extract_from_html};
use crate::results::Author;
use crate::schema::{SiteSchema, SiteSelectors, default_schema};

const SCHOLAR_PAGE: &str = r##"<html><head><title>iot - Google Scholar</title></head><body>
<div id="gs_res_ccl_mid">
  <div class="gs_r gs_or gs_scl" data-cid="a1">
    <div class="gs_ri">
      <h3 class="gs_rt"><a href="https://example.org/iot-survey">Internet of Things: A survey</a></h3>
      <div class="gs_a"><a href="/citations?user=u1">L Atzori</a>, A Iera, G Morabito - Computer networks, 2010 - Elsevier</div>
      <div class="gs_rs">The Internet of Things is a novel paradigm that is rapidly gaining ground.</div>
      <div class="gs_fl gs_flb"><a href="#">Save</a> <a href="#">Cite</a> <a href="/scholar?cites=1">Cited by 21532</a> <a href="#">Related articles</a></div>
    </div>
  </div>
  <div class="gs_r gs_or gs_scl" data-cid="a2">
    <div class="gs_ri">
      <h3 class="gs_rt"><span class="gs_ctc">[BOOK]</span> <a href="https://example.org/iot-book">Building the Internet of Things</a></h3>
      <div class="gs_a">M Kranz, P Holleis, A Schmidt - 2019 - books.example.org</div>
      <div class="gs_rs">A practical guide.</div>
      <div class="gs_fl gs_flb"><a href="#">Save</a> <a href="#">Cite</a></div>
    </div>
  </div>
  <div class="gs_r gs_or gs_scl" data-cid="a3">
    <div class="gs_ri">
      <h3 class="gs_rt"><a href="/scholar_url?url=https://example.org/edge">Edge computing for IoT…</a></h3>
      <div class="gs_a"><a href="/citations?user=u2">W Shi</a>, <a href="/citations?user=u3">J Cao</a> - IEEE IoT journal, 2016</div>
      <div class="gs_rs">Edge computing pushes computation to the network edge.</div>
      <div class="gs_fl gs_flb"><a href="/scholar?cites=3">Cited by 7</a></div>
    </div>
  </div>
</div>
</body></html>"##;

fn scholar_doc() -> HtmlDocument {
    HtmlDocument::parse(SCHOLAR_PAGE)
}

fn schema_with(selectors: SiteSelectors) -> SiteSchema {
    let mut schema = default_schema();
    schema.name = "Fixture".to_string();
    schema.selectors = selectors;
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_end_to_end() {
        let schema = default_schema();
        let url = "https://scholar.google.com/scholar?q=iot";
        let result = extract(&scholar_doc(), &schema, "iot", url).unwrap();

        assert_eq!(result.source, "Google Scholar");
        assert_eq!(result.domain, "academic");
        assert_eq!(result.url, url);
        assert_eq!(result.query, "iot");
        assert_eq!(result.semantic_type, "ArticleScientific");
        assert_eq!(result.total_results, 3);

        let titles: Vec<_> = result.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Internet of Things: A survey",
                "Building the Internet of Things",
                "Edge computing for IoT…",
            ]
        );
        let urls: Vec<_> = result.records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.org/iot-survey",
                "https://example.org/iot-book",
                "/scholar_url?url=https://example.org/edge",
            ]
        );
    }

    #[test]
    fn test_default_schema_fields() {
        let result = extract(&scholar_doc(), &default_schema(), "iot", "u").unwrap();
        let [first, second, third] = &result.records[..] else {
            panic!("expected three records");
        };

        // author links take precedence over the text line
        assert_eq!(first.authors, vec![Author::new("L Atzori", "/citations?user=u1")]);
        assert_eq!(first.date, "2010");
        assert_eq!(first.citation_count, "21532");
        assert_eq!(
            first.abstract_text,
            "The Internet of Things is a novel paradigm that is rapidly gaining ground."
        );

        // no author links: fall back to splitting the line
        let names: Vec<_> = second.authors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["M Kranz", "P Holleis", "A Schmidt"]);
        assert_eq!(second.date, "2019");
        assert_eq!(second.citation_count, "0");

        assert_eq!(
            third.authors,
            vec![
                Author::new("W Shi", "/citations?user=u2"),
                Author::new("J Cao", "/citations?user=u3"),
            ]
        );
        assert_eq!(third.date, "2016");
        assert_eq!(third.citation_count, "7");
    }

    #[test]
    fn test_empty_container_selector_is_invalid() {
        let schema = schema_with(SiteSelectors::default());
        let err = extract(&scholar_doc(), &schema, "", "").unwrap_err();
        assert!(matches!(err, ScrapeError::SchemaInvalid { ref name } if name == "Fixture"));
    }

    #[test]
    fn test_no_containers_matched() {
        let schema = schema_with(SiteSelectors {
            result_container: "li.result".to_string(),
            ..SiteSelectors::default()
        });
        let err = extract(&scholar_doc(), &schema, "", "").unwrap_err();
        assert!(matches!(err, ScrapeError::NoResultsFound { .. }));
    }

    #[test]
    fn test_invalid_container_selector() {
        let schema = schema_with(SiteSelectors {
            result_container: "div[".to_string(),
            ..SiteSelectors::default()
        });
        let err = extract(&scholar_doc(), &schema, "", "").unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidSelector(_)));
    }

    #[test]
    fn test_untitled_containers_are_dropped() {
        let html = r#"<body>
            <li class="hit"><span class="t">First</span></li>
            <li class="hit"><span class="other">no title here</span></li>
            <li class="hit"><span class="t">   </span></li>
            <li class="hit"><span class="t">Fourth</span></li>
        </body>"#;
        let schema = schema_with(SiteSelectors {
            result_container: "li.hit".to_string(),
            title: ".t".to_string(),
            ..SiteSelectors::default()
        });

        let result = extract_from_html(html, &schema, "", "").unwrap();
        assert_eq!(result.total_results, 2);
        assert_eq!(result.records[0].title, "First");
        assert_eq!(result.records[1].title, "Fourth");
        assert_eq!(result.records[0].url, "");
        assert_eq!(result.records[0].citation_count, "0");
    }

    #[test]
    fn test_title_selector_with_nested_anchor() {
        let html = r#"<body>
            <article class="entry"><h2 class="title"><a href="/p/1">Paper one</a></h2></article>
            <article class="entry"><h2 class="title">Paper two</h2></article>
        </body>"#;
        let schema = schema_with(SiteSelectors {
            result_container: "article.entry".to_string(),
            title: "h2.title".to_string(),
            title_link: "a.missing".to_string(),
            ..SiteSelectors::default()
        });

        let result = extract_from_html(html, &schema, "", "").unwrap();
        assert_eq!(result.records[0].title, "Paper one");
        assert_eq!(result.records[0].url, "/p/1");
        assert_eq!(result.records[1].title, "Paper two");
        assert_eq!(result.records[1].url, "");
    }

    #[test]
    fn test_bad_field_selector_skips_container_only() {
        let html = r#"<body><div class="r"><a class="t" href="/x">X</a></div></body>"#;
        let schema = schema_with(SiteSelectors {
            result_container: "div.r".to_string(),
            title_link: "a.t".to_string(),
            citations: "span[".to_string(),
            ..SiteSelectors::default()
        });

        let result = extract_from_html(html, &schema, "q", "u").unwrap();
        assert_eq!(result.total_results, 0);
        assert!(result.records.is_empty());
    }

    #[test]
    fn test_author_links_with_empty_text_are_skipped() {
        let html = r#"<body><div class="r"><h3>T</h3>
            <span class="au"><a href="/a1">Ann</a><a href="/a2"> </a><a>Bob</a></span>
        </div></body>"#;
        let schema = schema_with(SiteSelectors {
            result_container: "div.r".to_string(),
            title: "h3".to_string(),
            author_links: ".au a".to_string(),
            authors: ".au".to_string(),
            ..SiteSelectors::default()
        });

        let result = extract_from_html(html, &schema, "", "").unwrap();
        assert_eq!(
            result.records[0].authors,
            vec![Author::new("Ann", "/a1"), Author::new("Bob", "")]
        );
    }
}
