//! Incoming request parameters and pretty-permalink parsing

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::state::DateArchive;
use crate::config::SiteConfig;
use crate::content::{ContentRegistry, CATEGORY, POST_TAG};
use crate::error::{PressError, Result};

/// `YYYY[/MM[/DD]][/name]`
static DATE_PERMALINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})(?:/(\d{1,2}))?(?:/(\d{1,2}))?(?:/([^/]+))?$")
        .expect("date permalink pattern is valid")
});

/// Leap year used to check month/day pairs that come without a year
const ANY_LEAP_YEAR: i32 = 2000;

/// Normalized query parameters of one request
///
/// `slug` is the term slug when `taxonomy` is set; on its own it is an
/// ambiguous permalink path that the resolver disambiguates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthnum: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagename: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    /// Requested locale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Requested revision (preview) identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    /// Token authorizing the revision preview
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_token: Option<String>,
}

impl QueryRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> QueryRequestBuilder {
        QueryRequestBuilder::default()
    }

    /// Whether no routing parameter is present (the site root)
    pub fn is_root(&self) -> bool {
        self.year.is_none()
            && self.monthnum.is_none()
            && self.day.is_none()
            && self.taxonomy.is_none()
            && self.slug.is_none()
            && self.name.is_none()
            && self.pagename.is_none()
            && self.post_type.is_none()
            && self.author_name.is_none()
    }

    /// Validated date components
    ///
    /// Fails with `InvalidDateRange` for components no calendar date can have.
    /// Missing components are left open.
    pub fn date_archive(&self) -> Result<DateArchive> {
        let year = match self.year {
            None => None,
            Some(y) if (1..=9999).contains(&y) => Some(y as i32),
            Some(y) => {
                return Err(PressError::InvalidDateRange {
                    reason: format!("year {} is out of range", y),
                })
            }
        };
        let month = match self.monthnum {
            None => None,
            Some(m) if (1..=12).contains(&m) => Some(m as u32),
            Some(m) => {
                return Err(PressError::InvalidDateRange {
                    reason: format!("month {} is out of range", m),
                })
            }
        };
        let day = match self.day {
            None => None,
            Some(d) if (1..=31).contains(&d) => Some(d as u32),
            Some(d) => {
                return Err(PressError::InvalidDateRange {
                    reason: format!("day {} is out of range", d),
                })
            }
        };

        if let (Some(m), Some(d)) = (month, day) {
            match year {
                Some(y) if NaiveDate::from_ymd_opt(y, m, d).is_none() => {
                    return Err(PressError::InvalidDateRange {
                        reason: format!("{:04}-{:02}-{:02} is not a calendar date", y, m, d),
                    });
                }
                None if NaiveDate::from_ymd_opt(ANY_LEAP_YEAR, m, d).is_none() => {
                    return Err(PressError::InvalidDateRange {
                        reason: format!("month {} has no day {}", m, d),
                    });
                }
                _ => {}
            }
        }

        Ok(DateArchive { year, month, day })
    }
}

/// Builder for QueryRequest
#[derive(Debug, Default)]
pub struct QueryRequestBuilder {
    request: QueryRequest,
}

impl QueryRequestBuilder {
    pub fn date(mut self, year: i64, month: Option<i64>, day: Option<i64>) -> Self {
        self.request.year = Some(year);
        self.request.monthnum = month;
        self.request.day = day;
        self
    }

    pub fn term(mut self, taxonomy: impl Into<String>, slug: impl Into<String>) -> Self {
        self.request.taxonomy = Some(taxonomy.into());
        self.request.slug = Some(slug.into());
        self
    }

    /// Ambiguous permalink path
    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.request.slug = Some(slug.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.request.name = Some(name.into());
        self
    }

    pub fn pagename(mut self, path: impl Into<String>) -> Self {
        self.request.pagename = Some(path.into());
        self
    }

    pub fn post_type(mut self, post_type: impl Into<String>) -> Self {
        self.request.post_type = Some(post_type.into());
        self
    }

    pub fn author(mut self, nicename: impl Into<String>) -> Self {
        self.request.author_name = Some(nicename.into());
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.request.locale = Some(locale.into());
        self
    }

    pub fn revision(mut self, revision_id: impl Into<String>, token: impl Into<String>) -> Self {
        self.request.revision = Some(revision_id.into());
        self.request.revision_token = Some(token.into());
        self
    }

    pub fn build(self) -> QueryRequest {
        self.request
    }
}

/// Turns a URL path and query pairs into a [`QueryRequest`]
///
/// Path prefixes come from the permalink settings and the rewrite slugs of
/// registered types; explicit query pairs override what the path implied.
pub struct RequestParser<'a> {
    registry: &'a ContentRegistry,
    config: &'a SiteConfig,
}

impl<'a> RequestParser<'a> {
    pub fn new(registry: &'a ContentRegistry, config: &'a SiteConfig) -> Self {
        Self { registry, config }
    }

    /// Parse `path` then apply `pairs` on top
    pub fn parse<K, V>(&self, path: &str, pairs: &[(K, V)]) -> Result<QueryRequest>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };

        let mut request = self.parse_path(path)?;
        if let Some(query) = query {
            let embedded: Vec<(&str, &str)> = query
                .split('&')
                .filter(|kv| !kv.is_empty())
                .map(|kv| kv.split_once('=').unwrap_or((kv, "")))
                .collect();
            self.apply_pairs(&mut request, embedded.as_slice())?;
        }
        self.apply_pairs(&mut request, pairs)?;
        Ok(request)
    }

    /// Map a pretty permalink onto query parameters
    pub fn parse_path(&self, path: &str) -> Result<QueryRequest> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut request = QueryRequest::new();

        let Some(first) = segments.first().copied() else {
            return Ok(request);
        };

        let joined = segments.join("/");
        if let Some(caps) = DATE_PERMALINK.captures(&joined) {
            request.year = caps.get(1).map(|m| parse_number("year", m.as_str())).transpose()?;
            request.monthnum = caps.get(2).map(|m| parse_number("monthnum", m.as_str())).transpose()?;
            request.day = caps.get(3).map(|m| parse_number("day", m.as_str())).transpose()?;
            request.name = caps.get(4).map(|m| m.as_str().to_string());
            return Ok(request);
        }

        let permalinks = &self.config.permalinks;
        let last = segments[segments.len() - 1].to_string();
        if segments.len() >= 2 {
            if first == permalinks.category_base {
                request.taxonomy = Some(CATEGORY.to_string());
                request.slug = Some(last);
                return Ok(request);
            }
            if first == permalinks.tag_base {
                request.taxonomy = Some(POST_TAG.to_string());
                request.slug = Some(last);
                return Ok(request);
            }
            if first == permalinks.author_base {
                request.author_name = Some(last);
                return Ok(request);
            }
            if let Some(taxonomy) = self
                .registry
                .taxonomy_for_rewrite(first)
                .filter(|t| t.name != CATEGORY && t.name != POST_TAG)
            {
                request.taxonomy = Some(taxonomy.name.clone());
                request.slug = Some(last);
                return Ok(request);
            }
        }

        if let Some(post_type) = self.registry.post_type_for_rewrite(first) {
            request.post_type = Some(post_type.name.clone());
            if segments.len() >= 2 {
                request.name = Some(segments[1..].join("/"));
            }
            return Ok(request);
        }

        request.slug = Some(joined);
        Ok(request)
    }

    fn apply_pairs<K, V>(&self, request: &mut QueryRequest, pairs: &[(K, V)]) -> Result<()>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in pairs {
            let key = key.as_ref();
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            let owned = Some(value.to_string());
            match key {
                "year" => request.year = Some(parse_number(key, value)?),
                "monthnum" => request.monthnum = Some(parse_number(key, value)?),
                "day" => request.day = Some(parse_number(key, value)?),
                "m" => apply_compact_date(request, value)?,
                "taxonomy" => request.taxonomy = owned,
                "term" | "slug" => request.slug = owned,
                "category_name" => {
                    request.taxonomy = Some(CATEGORY.to_string());
                    request.slug = owned;
                }
                "tag" => {
                    request.taxonomy = Some(POST_TAG.to_string());
                    request.slug = owned;
                }
                "name" | "p_name" => request.name = owned,
                "pagename" => request.pagename = owned,
                "post_type" => request.post_type = owned,
                "author_name" => request.author_name = owned,
                "revision" | "preview_id" => request.revision = owned,
                "token" | "preview_nonce" => request.revision_token = owned,
                k if k == self.config.multilang.locale_param || k == "locale" => {
                    request.locale = owned
                }
                other => {
                    tracing::trace!("Ignoring unknown query parameter '{}'", other);
                }
            }
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<i64> {
    value.parse::<i64>().map_err(|_| {
        // Digits that overflow are still a date problem, not a malformed request
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            PressError::InvalidDateRange {
                reason: format!("{} '{}' is out of range", key, value),
            }
        } else {
            PressError::InvalidRequest {
                reason: format!("{} must be numeric, got '{}'", key, value),
            }
        }
    })
}

/// `m=YYYY[MM[DD]]`
fn apply_compact_date(request: &mut QueryRequest, value: &str) -> Result<()> {
    if !value.bytes().all(|b| b.is_ascii_digit()) || !matches!(value.len(), 4 | 6 | 8) {
        return Err(PressError::InvalidRequest {
            reason: format!("m must be YYYY, YYYYMM, or YYYYMMDD, got '{}'", value),
        });
    }
    request.year = Some(parse_number("year", &value[0..4])?);
    if value.len() >= 6 {
        request.monthnum = Some(parse_number("monthnum", &value[4..6])?);
    }
    if value.len() == 8 {
        request.day = Some(parse_number("day", &value[6..8])?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{PostTypeDescriptor, RegistryBuilder, TaxonomyDescriptor};

    fn registry() -> ContentRegistry {
        RegistryBuilder::new()
            .post_type(PostTypeDescriptor::new("book").with_archive().with_rewrite("books"))
            .taxonomy(TaxonomyDescriptor::new("genre").with_rewrite("genres").for_types(&["book"]))
            .build()
            .unwrap()
    }

    fn parse(path: &str) -> QueryRequest {
        let registry = registry();
        let config = SiteConfig::default();
        RequestParser::new(&registry, &config)
            .parse::<&str, &str>(path, &[])
            .unwrap()
    }

    #[test]
    fn test_root_is_empty() {
        assert!(parse("/").is_root());
        assert!(parse("").is_root());
    }

    #[test]
    fn test_date_permalinks() {
        let r = parse("/2024/03/");
        assert_eq!((r.year, r.monthnum, r.day), (Some(2024), Some(3), None));

        let r = parse("/2024/03/09/hello-world/");
        assert_eq!(r.day, Some(9));
        assert_eq!(r.name.as_deref(), Some("hello-world"));

        assert!(DATE_PERMALINK.is_match("2024"));
        assert!(!DATE_PERMALINK.is_match("20245"));
        assert!(!DATE_PERMALINK.is_match("2024/03/09/hello/extra"));
    }

    #[test]
    fn test_builtin_archive_bases() {
        let r = parse("/category/news/");
        assert_eq!(r.taxonomy.as_deref(), Some("category"));
        assert_eq!(r.slug.as_deref(), Some("news"));

        let r = parse("/category/news/local/");
        assert_eq!(r.slug.as_deref(), Some("local"));

        let r = parse("/tag/rust");
        assert_eq!(r.taxonomy.as_deref(), Some("post_tag"));

        let r = parse("/author/ada/");
        assert_eq!(r.author_name.as_deref(), Some("ada"));
    }

    #[test]
    fn test_registered_rewrites() {
        let r = parse("/books/");
        assert_eq!(r.post_type.as_deref(), Some("book"));
        assert!(r.name.is_none());

        let r = parse("/books/dune/");
        assert_eq!(r.name.as_deref(), Some("dune"));

        let r = parse("/genres/scifi/");
        assert_eq!(r.taxonomy.as_deref(), Some("genre"));
        assert_eq!(r.slug.as_deref(), Some("scifi"));
    }

    #[test]
    fn test_anything_else_is_an_ambiguous_slug() {
        let r = parse("/about/team/");
        assert_eq!(r.slug.as_deref(), Some("about/team"));
        assert!(r.taxonomy.is_none());

        // A lone base segment is not an archive
        let r = parse("/category/");
        assert_eq!(r.slug.as_deref(), Some("category"));
    }

    #[test]
    fn test_query_pairs_override_path() {
        let registry = registry();
        let config = SiteConfig::default();
        let parser = RequestParser::new(&registry, &config);

        let r = parser
            .parse("/hello/?lang=fr", &[("revision", "12"), ("token", "abc")])
            .unwrap();
        assert_eq!(r.slug.as_deref(), Some("hello"));
        assert_eq!(r.locale.as_deref(), Some("fr"));
        assert_eq!(r.revision.as_deref(), Some("12"));
        assert_eq!(r.revision_token.as_deref(), Some("abc"));

        let r = parser.parse("/", &[("m", "20240229")]).unwrap();
        assert_eq!((r.year, r.monthnum, r.day), (Some(2024), Some(2), Some(29)));
    }

    #[test]
    fn test_non_numeric_date_is_invalid_request() {
        let registry = registry();
        let config = SiteConfig::default();
        let err = RequestParser::new(&registry, &config)
            .parse("/", &[("year", "twenty")])
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_REQUEST");

        let err = RequestParser::new(&registry, &config)
            .parse("/", &[("year", "99999999999999999999999")])
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
    }

    #[test]
    fn test_date_archive_validation() {
        let ok = QueryRequest::builder().date(2024, Some(2), Some(29)).build();
        assert_eq!(ok.date_archive().unwrap().day, Some(29));

        for (y, m, d) in [(2023, Some(2), Some(29)), (2024, Some(13), None), (0, None, None), (10000, None, None)] {
            let err = QueryRequest::builder().date(y, m, d).build().date_archive().unwrap_err();
            assert_eq!(err.error_code(), "INVALID_DATE_RANGE", "{}-{:?}-{:?}", y, m, d);
        }

        assert!(QueryRequest::new().date_archive().unwrap().is_empty());

        // Month and day without a year still have to name a real day
        let no_year = |m, d| QueryRequest {
            monthnum: Some(m),
            day: Some(d),
            ..Default::default()
        };
        let err = no_year(2, 31).date_archive().unwrap_err();
        assert_eq!(err.error_code(), "INVALID_DATE_RANGE");
        assert!(no_year(4, 31).date_archive().is_err());
        let leap = no_year(2, 29).date_archive().unwrap();
        assert_eq!((leap.year, leap.month, leap.day), (None, Some(2), Some(29)));
    }
}
