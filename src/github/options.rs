//! Commit search qualifiers.
//!
//! The commit search endpoint accepts a handful of qualifiers joined with
//! `+` into the `q` parameter, for example:
//!
//! ```text
//! q='monkey'+author-date:2020-01-01..2020-01-13+sort:author-date-asc&page=1
//! ```
//!
//! Qualifiers are always emitted in the same order: text, date range, hash,
//! user, org, repo, sort.

use chrono::NaiveDate;

/// Sort order of search results by author date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Earliest date first.
    Asc,
    /// Latest date first.
    Desc,
}

impl SortOrder {
    fn qualifier(self) -> &'static str {
        match self {
            SortOrder::Asc => "sort:author-date-asc",
            SortOrder::Desc => "sort:author-date-desc",
        }
    }
}

/// Qualifiers and paging for one commit search request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub query_text: String,
    /// Author date lower bound, `YYYY-MM-DD`.
    pub from_date: String,
    /// Author date upper bound, `YYYY-MM-DD`.
    pub to_date: String,
    pub hash: String,
    pub user: String,
    pub org: String,
    /// `owner/name`
    pub repo: String,
    pub sort: Option<SortOrder>,
    /// 0 means "don't send a page parameter".
    pub page: u32,
}

impl SearchOptions {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            query_text: text.into(),
            ..Self::default()
        }
    }

    /// True when no qualifier would be emitted.
    pub fn is_empty(&self) -> bool {
        self.qualifiers().is_empty()
    }

    /// Render as a URL query string: `q=<qualifiers>[&page=<n>]`.
    pub fn serialize(&self) -> String {
        let mut query = format!("q={}", self.qualifiers().join("+"));
        if self.page != 0 {
            query.push_str(&format!("&page={}", self.page));
        }
        query
    }

    fn qualifiers(&self) -> Vec<String> {
        let mut qualifiers = Vec::new();

        if !self.query_text.is_empty() {
            let escaped: String =
                url::form_urlencoded::byte_serialize(self.query_text.as_bytes()).collect();
            qualifiers.push(format!("'{}'", escaped));
        }
        if is_valid_date(&self.from_date) && is_valid_date(&self.to_date) {
            qualifiers.push(format!("author-date:{}..{}", self.from_date, self.to_date));
        }
        if !self.hash.is_empty() {
            qualifiers.push(format!("hash:{}", self.hash));
        }
        if !self.user.is_empty() {
            qualifiers.push(format!("user:{}", self.user));
        }
        if !self.org.is_empty() {
            qualifiers.push(format!("org:{}", self.org));
        }
        if !self.repo.is_empty() {
            qualifiers.push(format!("repo:{}", self.repo));
        }
        if let Some(sort) = self.sort {
            qualifiers.push(sort.qualifier().to_string());
        }

        qualifiers
    }
}

/// Checks that a string is a real calendar date in `YYYY-MM-DD` form.
pub fn is_valid_date(value: &str) -> bool {
    !value.is_empty() && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}
