use crate::error::Error;
use crate::item::Story;
use std::fmt::Write;

const HN_ITEM_URL: &str = "https://news.ycombinator.com/item?id=";

const STYLE: &str = r#"
body { background: #f6f6ef; font-family: Verdana, Geneva, sans-serif; font-size: 14px; margin: 0; }
.container { max-width: 960px; margin: 0 auto; padding: 1em 2em; background: #fff; }
header { border-bottom: 1px solid #ddd; padding-bottom: 0.5em; }
header a { color: #000; font-weight: bold; text-decoration: none; }
li { padding: 0.3em 0; }
li a { color: #000; text-decoration: none; }
.host, .meta { color: #828282; font-size: 0.85em; }
.time { color: #828282; font-size: 0.8em; margin-top: 2em; }
"#;

/// Renders the story list together with how long the request took to serve.
pub(crate) fn render_page(stories: &[Story], elapsed: std::time::Duration) -> Result<String, Error> {
    let mut page = String::with_capacity(4096 + stories.len() * 256);

    write!(
        page,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Quiet Hacker News</title>\n<style>{}</style>\n</head>\n<body>\n<div class=\"container\">\n<header><a href=\"/\">Quiet Hacker News</a></header>\n<ol>\n",
        STYLE
    )?;

    for story in stories {
        write_story(&mut page, story)?;
    }

    write!(
        page,
        "</ol>\n<p class=\"time\">This page was rendered in {:?}</p>\n</div>\n</body>\n</html>\n",
        elapsed
    )?;

    Ok(page)
}

fn write_story(page: &mut String, story: &Story) -> std::fmt::Result {
    let url = story.item.url.as_deref().unwrap_or_default();

    write!(
        page,
        "<li><a href=\"{}\">{}</a>",
        html_escape::encode_double_quoted_attribute(url),
        html_escape::encode_text(&story.item.title)
    )?;

    if !story.host.is_empty() {
        write!(
            page,
            " <span class=\"host\">({})</span>",
            html_escape::encode_text(&story.host)
        )?;
    }

    write!(page, "<br><span class=\"meta\">{} points", story.item.score)?;
    if let Some(by) = &story.item.by {
        write!(page, " by {}", html_escape::encode_text(by))?;
    }
    if let Some(descendants) = story.item.descendants {
        write!(
            page,
            " | <a href=\"{}{}\">{} comments</a>",
            HN_ITEM_URL, story.item.id, descendants
        )?;
    }

    writeln!(page, "</span></li>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::RawItem;

    #[test]
    fn test_render_page() {
        let stories = vec![
            Story::from(crate::test_helpers::story(1)),
            Story::from(crate::test_helpers::story(2)),
        ];

        let page = render_page(&stories, std::time::Duration::from_micros(1500)).unwrap();

        assert!(page.contains("<a href=\"https://www.site1.com/post/1\">Story 1</a>"));
        assert!(page.contains("<span class=\"host\">(site2.com)</span>"));
        assert!(page.contains(
            "20 points by pg | <a href=\"https://news.ycombinator.com/item?id=2\">2 comments</a>"
        ));
        assert!(page.contains("This page was rendered in 1.5ms"));
        assert!(page.find("Story 1").unwrap() < page.find("Story 2").unwrap());
    }

    #[test]
    fn test_render_escapes_story_fields() {
        let stories = vec![Story::from(RawItem {
            id: 1,
            kind: "story".to_string(),
            title: "<script>alert(1)</script> & more".to_string(),
            url: Some("https://example.com/?a=\"b\"".to_string()),
            ..Default::default()
        })];

        let page = render_page(&stories, std::time::Duration::ZERO).unwrap();

        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; more"));
        assert!(page.contains("href=\"https://example.com/?a=&quot;b&quot;\""));
    }

    #[test]
    fn test_render_empty_page() {
        let page = render_page(&[], std::time::Duration::ZERO).unwrap();

        assert!(page.contains("<ol>\n</ol>"));
    }

    #[test]
    fn test_empty_host_is_omitted() {
        let stories = vec![Story::from(RawItem {
            id: 1,
            kind: "story".to_string(),
            title: "Odd link".to_string(),
            url: Some("not a url".to_string()),
            ..Default::default()
        })];

        let page = render_page(&stories, std::time::Duration::ZERO).unwrap();

        assert!(page.contains("Odd link</a><br>"));
        assert!(page.contains("0 points</span>"));
    }
}
