use eyre::{eyre, Result, WrapErr};
use percent_encoding::percent_decode_str;
use scraper::{Html, Selector};

use crate::remote::HttpClient;

/// Recursive walk over HTML directory indexes rooted at `base_url`.
///
/// Pages are fetched lazily as the iterator advances. Each call to
/// [`WebListing::iter`] starts again from the root page.
pub struct WebListing<'a> {
    client: &'a HttpClient,
    base_url: String,
}

impl<'a> WebListing<'a> {
    pub fn new(client: &'a HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    pub fn iter(&self) -> WebListingIter<'_> {
        WebListingIter {
            listing: self,
            pending: Vec::new(),
            started: false,
        }
    }

    /// Drain the listing, stopping at the first page that cannot be fetched.
    pub fn collect_uris(&self) -> Result<Vec<String>> {
        self.iter().collect()
    }

    /// Links on the page at `<base><suffix>`, already prefixed with `suffix`.
    fn fetch_page(&self, suffix: &str) -> Result<Vec<String>> {
        let url = format!("{}{}", self.base_url, suffix);
        let body = self.client.get_bytes(&url)?;
        let html = String::from_utf8_lossy(&body);
        let links = page_links(&html).wrap_err_with(|| format!("parsing index {url}"))?;
        Ok(links
            .into_iter()
            .map(|link| format!("{suffix}{link}"))
            .collect())
    }
}

pub struct WebListingIter<'l> {
    listing: &'l WebListing<'l>,
    pending: Vec<std::vec::IntoIter<String>>,
    started: bool,
}

impl Iterator for WebListingIter<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            match self.listing.fetch_page("") {
                Ok(links) => self.pending.push(links.into_iter()),
                Err(err) => return Some(Err(err)),
            }
        }

        loop {
            let page = self.pending.last_mut()?;
            let Some(uri) = page.next() else {
                self.pending.pop();
                continue;
            };

            if uri.ends_with('/') {
                match self.listing.fetch_page(&uri) {
                    Ok(links) => self.pending.push(links.into_iter()),
                    Err(err) => {
                        self.pending.clear();
                        return Some(Err(err));
                    }
                }
                continue;
            }

            return Some(Ok(percent_decode_str(&uri).decode_utf8_lossy().into_owned()));
        }
    }
}

/// `href` targets of every anchor on an index page that point below it.
/// Self and parent links, sort-order query links, fragments and absolute
/// links are dropped.
pub fn page_links(html: &str) -> Result<Vec<String>> {
    let selector =
        Selector::parse("a[href]").map_err(|err| eyre!("invalid link selector: {err:?}"))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| is_sub_link(href))
        .map(str::to_string)
        .collect())
}

fn is_sub_link(href: &str) -> bool {
    !(href.is_empty()
        || href == "."
        || href == "./"
        || href.starts_with("../")
        || href.starts_with('?')
        || href.starts_with('#')
        || href.starts_with('/')
        || href.contains("://")
        || href.starts_with("mailto:"))
}
