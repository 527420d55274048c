//! Selector-driven extraction of records from a result listing.

pub mod fields;
pub mod query;

#[cfg(test)]
mod tests;

pub use query::extract_query_from_url;

use crate::dom::{Document, Element, HtmlDocument, SelectorError};
use crate::error::ScrapeError;
use crate::results::{Author, ExtractedRecord, ExtractionResult};
use crate::schema::{SiteSchema, SiteSelectors};

/// Extracts one record per result container of `doc`.
///
/// Fails with [`ScrapeError::SchemaInvalid`] before touching the document when
/// the schema has no container selector, and with
/// [`ScrapeError::NoResultsFound`] when the selector matches nothing.
/// Containers whose title comes out empty are dropped, and a container that
/// fails to extract is skipped with a warning; neither aborts the page.
/// Records keep the document order of their containers.
pub fn extract<D: Document>(
    doc: &D,
    schema: &SiteSchema,
    query: &str,
    source_url: &str,
) -> Result<ExtractionResult, ScrapeError> {
    let selectors = &schema.selectors;
    if !schema.is_usable() {
        return Err(ScrapeError::SchemaInvalid {
            name: schema.name.clone(),
        });
    }

    let containers = doc.select_all(&selectors.result_container)?;
    if containers.is_empty() {
        return Err(ScrapeError::NoResultsFound {
            selector: selectors.result_container.clone(),
            site: schema.name.clone(),
        });
    }
    ::log::debug!(
        "{} containers matched {:?} on {}",
        containers.len(),
        selectors.result_container,
        source_url
    );

    let mut records = Vec::with_capacity(containers.len());
    for (index, container) in containers.iter().enumerate() {
        match extract_record(container, selectors) {
            Ok(record) if record.title.is_empty() => {
                ::log::debug!("Dropping result {} without a title", index);
            }
            Ok(record) => records.push(record),
            Err(e) => {
                ::log::warn!("Skipping result {} on {}: {}", index, schema.name, e);
            }
        }
    }

    ::log::info!(
        "Extracted {} of {} results from {} using {}",
        records.len(),
        containers.len(),
        source_url,
        schema.name
    );

    Ok(ExtractionResult {
        source: schema.name.clone(),
        domain: schema.domain_tag.clone(),
        url: source_url.to_string(),
        query: query.to_string(),
        total_results: records.len(),
        records,
        semantic_type: schema.semantic_type().to_string(),
    })
}

/// Parses `html` into a detached document and extracts from it
pub fn extract_from_html(
    html: &str,
    schema: &SiteSchema,
    query: &str,
    source_url: &str,
) -> Result<ExtractionResult, ScrapeError> {
    let doc = HtmlDocument::parse(html);
    extract(&doc, schema, query, source_url)
}

/// Extracts the fields of one result container.
///
/// An empty selector means the field is absent on the site and is skipped.
pub fn extract_record<E: Element>(
    container: &E,
    selectors: &SiteSelectors,
) -> Result<ExtractedRecord, SelectorError> {
    let (title, url) = extract_title(container, selectors)?;

    let mut authors = Vec::new();
    if !selectors.author_links.is_empty() {
        for link in container.select_all(&selectors.author_links)? {
            let name = link.text().trim().to_string();
            if !name.is_empty() {
                authors.push(Author::new(name, link.attr("href").unwrap_or_default()));
            }
        }
    }
    if authors.is_empty() && !selectors.authors.is_empty() {
        if let Some(line) = container.select_first(&selectors.authors)? {
            authors = fields::split_author_line(&line.text());
        }
    }

    let date = match first_text(container, &selectors.date)? {
        Some(text) => fields::parse_year(&text),
        None => String::new(),
    };

    let abstract_text = first_text(container, &selectors.abstract_text)?
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    let citation_count = if selectors.citations.is_empty() {
        "0".to_string()
    } else {
        let candidates = container.select_all(&selectors.citations)?;
        fields::first_citation_count(candidates.iter().map(|el| el.text()))
    };

    Ok(ExtractedRecord {
        title,
        url,
        date,
        authors,
        citation_count,
        abstract_text,
    })
}

/// Title and link: the title link wins, then the title element and any
/// anchor nested in it.
fn extract_title<E: Element>(
    container: &E,
    selectors: &SiteSelectors,
) -> Result<(String, String), SelectorError> {
    let mut title = String::new();
    let mut url = String::new();

    if !selectors.title_link.is_empty() {
        if let Some(link) = container.select_first(&selectors.title_link)? {
            title = link.text().trim().to_string();
            url = link.attr("href").unwrap_or_default();
        }
    }

    if title.is_empty() && !selectors.title.is_empty() {
        if let Some(heading) = container.select_first(&selectors.title)? {
            title = heading.text().trim().to_string();
            if url.is_empty() {
                url = heading
                    .select_first("a")?
                    .and_then(|a| a.attr("href"))
                    .unwrap_or_default();
            }
        }
    }

    Ok((title, url))
}

fn first_text<E: Element>(container: &E, selector: &str) -> Result<Option<String>, SelectorError> {
    if selector.is_empty() {
        return Ok(None);
    }
    Ok(container.select_first(selector)?.map(|el| el.text()))
}
