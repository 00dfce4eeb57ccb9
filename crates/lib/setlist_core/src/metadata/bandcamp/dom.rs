//! DOM scrape of a rendered Bandcamp track page.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::BandcampPage;
use crate::metadata::MetadataError;

/// Separator between artist and album in the album link text.
const ALBUM_SEPARATOR: &str = " - ";

macro_rules! selector {
    ($name:ident, $css:literal) => {
        static $name: LazyLock<Selector> =
            LazyLock::new(|| Selector::parse($css).expect(concat!("valid selector: ", $css)));
    };
}

selector!(NAME_SECTION, "div#name-section");
selector!(TRACK_TITLE, "h2.trackTitle");
selector!(HEADING, "h3");
selector!(LINK, "a");

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Read track, artist and album out of `#name-section`.
///
/// The `h3` under the section holds the release links: none, the artist
/// alone, or the album followed by the artist.
pub fn scrape_name_section(html: &str) -> Result<BandcampPage, MetadataError> {
    let document = Html::parse_document(html);
    let section = document
        .select(&NAME_SECTION)
        .next()
        .ok_or_else(|| MetadataError::bandcamp("Could not find #name-section"))?;

    let track_name = section.select(&TRACK_TITLE).next().map(text_of);

    let links: Vec<String> = section
        .select(&HEADING)
        .next()
        .map(|h3| h3.select(&LINK).map(text_of).collect())
        .unwrap_or_default();

    let (artist, album_name) = match links.as_slice() {
        [] => (None, None),
        [artist] => (Some(artist.clone()), None),
        [raw_album, artist, ..] => {
            let album = match raw_album.split_once(ALBUM_SEPARATOR) {
                Some((_, rest)) => rest.trim().to_string(),
                None => raw_album.trim().to_string(),
            };
            (Some(artist.clone()), Some(album))
        }
    };

    Ok(BandcampPage {
        track_name,
        artist,
        album_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn page(h3: &str) -> String {
        format!(
            r#"<html><body><div id="name-section">
                <h2 class="trackTitle">
                    How Are We
                </h2>
                <h3>{h3}</h3>
            </div></body></html>"#
        )
    }

    #[test]
    fn album_and_artist_links() {
        let html =
            page(r#"from <a href="/album/a">Another Life</a> by <a href="/">Horse Vision</a>"#);
        let scraped = scrape_name_section(&html).unwrap();
        assert_eq!(scraped.track_name.as_deref(), Some("How Are We"));
        assert_eq!(scraped.artist.as_deref(), Some("Horse Vision"));
        assert_eq!(scraped.album_name.as_deref(), Some("Another Life"));
    }

    #[test]
    fn album_text_after_first_separator() {
        let html = page(
            r#"<a href="/album/a">Another Life - Deluxe Edition - 2024</a>
               <a href="/">Horse Vision</a>"#,
        );
        let scraped = scrape_name_section(&html).unwrap();
        assert_eq!(scraped.album_name.as_deref(), Some("Deluxe Edition - 2024"));

        let html = page(
            r#"<a href="/album/a">Another Life - Deluxe Edition</a><a href="/">Horse Vision</a>"#,
        );
        let scraped = scrape_name_section(&html).unwrap();
        assert_eq!(scraped.album_name.as_deref(), Some("Deluxe Edition"));
    }

    #[test]
    fn single_link_is_artist() {
        let html = page(r#"by <a href="/"> Horse Vision </a>"#);
        let scraped = scrape_name_section(&html).unwrap();
        assert_eq!(scraped.artist.as_deref(), Some("Horse Vision"));
        assert_eq!(scraped.album_name, None);
    }

    #[test]
    fn no_links_leaves_artist_and_album_empty() {
        let scraped = scrape_name_section(&page("by nobody")).unwrap();
        assert_eq!(scraped.track_name.as_deref(), Some("How Are We"));
        assert_eq!(scraped.artist, None);
        assert_eq!(scraped.album_name, None);
    }

    #[test]
    fn missing_title_is_none() {
        let html = r#"<div id="name-section"><h3><a>Solo</a></h3></div>"#;
        let scraped = scrape_name_section(html).unwrap();
        assert_eq!(scraped.track_name, None);
        assert_eq!(scraped.artist.as_deref(), Some("Solo"));
    }

    #[test]
    fn missing_section_is_bandcamp_error() {
        let err = scrape_name_section("<html><body><h2>hi</h2></body></html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Bandcamp);
        assert_eq!(
            err.to_string(),
            "Bandcamp metadata error: Could not find #name-section"
        );
    }
}
