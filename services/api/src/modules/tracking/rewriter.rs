use regex::{Captures, NoExpand, Regex};
use shared::ids::tracking_id;
use std::collections::HashMap;
use std::sync::OnceLock;

pub struct TrackingLink {
    pub tracking_id: String,
    pub original_url: String,
    pub tracking_url: String,
}

pub struct RewriteResult {
    pub modified_html: String,
    pub open_tracking_id: String,
    pub links: Vec<TrackingLink>,
}

/// URLs whose lowercase form contains any of these substrings are left
/// untouched: unsubscribe/optout links must keep working even with tracking
/// disabled, and mailto/tel/anchor links aren't clickable redirects.
const EXCLUDED_SUBSTRINGS: &[&str] = &["unsubscribe", "optout", "mailto:", "tel:", "#"];

fn anchor_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<a\s+([^>]*?)href=["']([^"']+)["']([^>]*)>"#).expect("valid regex")
    })
}

fn body_close_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</body>").expect("valid regex"))
}

/// Rewrites every non-excluded `<a href>` to the click-tracking endpoint and
/// injects a 1x1 open-tracking pixel before `</body>` (or at the end of the
/// document if there is none). Identical original URLs share one click id.
pub fn rewrite(html: &str, base_url: &str) -> RewriteResult {
    let mut allocated: HashMap<String, String> = HashMap::new();
    let mut links = Vec::new();

    let modified_html = anchor_regex()
        .replace_all(html, |caps: &Captures| {
            let before = &caps[1];
            let url = &caps[2];
            let after = &caps[3];

            if EXCLUDED_SUBSTRINGS
                .iter()
                .any(|needle| url.to_lowercase().contains(needle))
            {
                return caps[0].to_string();
            }

            let click_id = allocated
                .entry(url.to_string())
                .or_insert_with(|| {
                    let id = tracking_id();
                    links.push(TrackingLink {
                        tracking_id: id.clone(),
                        original_url: url.to_string(),
                        tracking_url: format!("{base_url}/t/c/{id}"),
                    });
                    id
                })
                .clone();

            format!(r#"<a {before}href="{base_url}/t/c/{click_id}"{after}>"#)
        })
        .into_owned();

    let open_tracking_id = tracking_id();
    let pixel = format!(
        r#"<img src="{base_url}/t/o/{open_tracking_id}" width="1" height="1" alt="" style="display:none;width:1px;height:1px;border:0;" />"#
    );

    let modified_html = if body_close_regex().is_match(&modified_html) {
        body_close_regex()
            .replacen(&modified_html, 1, NoExpand(&format!("{pixel}</body>")))
            .into_owned()
    } else {
        format!("{modified_html}{pixel}")
    };

    RewriteResult {
        modified_html,
        open_tracking_id,
        links,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_plain_links_and_injects_pixel() {
        let html = r#"<p>hi <a href="https://a.example">link</a></p></body>"#;
        let result = rewrite(html, "https://track.example");

        assert_eq!(result.links.len(), 1);
        assert_eq!(result.links[0].original_url, "https://a.example");
        assert!(result
            .modified_html
            .contains(&format!("/t/c/{}", result.links[0].tracking_id)));
        assert!(result
            .modified_html
            .contains(&format!("/t/o/{}", result.open_tracking_id)));
        assert!(result.modified_html.find("<img").unwrap() < result.modified_html.find("</body>").unwrap());
    }

    #[test]
    fn preserves_excluded_links_verbatim() {
        let html = r#"<a href="https://x/unsubscribe">Unsubscribe</a>
            <a href="mailto:a@b.com">Mail</a>
            <a href="tel:+15551234">Call</a>
            <a href="#section">Jump</a>"#;

        let result = rewrite(html, "https://track.example");

        assert!(result.links.is_empty());
        assert!(result.modified_html.contains(r#"href="https://x/unsubscribe""#));
        assert!(result.modified_html.contains(r#"href="mailto:a@b.com""#));
        assert!(result.modified_html.contains(r#"href="tel:+15551234""#));
        assert!(result.modified_html.contains(r#"href="#section""#));
    }

    #[test]
    fn identical_urls_share_one_click_id() {
        let html = r#"<a href="https://a">1</a><a href="https://a">2</a>"#;
        let result = rewrite(html, "https://track.example");

        assert_eq!(result.links.len(), 1);
        let occurrences = result
            .modified_html
            .matches(&result.links[0].tracking_id)
            .count();
        assert_eq!(occurrences, 2);
    }

    #[test]
    fn appends_pixel_when_no_closing_body_tag() {
        let html = "<p>no body tag</p>";
        let result = rewrite(html, "https://track.example");
        assert!(result.modified_html.ends_with("/>"));
    }
}
