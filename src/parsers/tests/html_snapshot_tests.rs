use crate::parsers::html::{self, Snapshot};

#[cfg(test)]
mod inner_text_tests {
    use super::*;

    #[test]
    fn test_block_elements_break_lines() {
        let snap = Snapshot::parse(
            r#"<html><body><div id="card">
                <div>Title</div>
                <div><span>Cosy</span> <span>cabin</span></div>
            </div></body></html>"#,
        );
        let card = snap.first("#card").unwrap();
        assert_eq!(html::inner_text(card), "Title\nCosy cabin");
    }

    #[test]
    fn test_br_and_source_newlines() {
        let snap = Snapshot::parse(
            "<html><body><p id=\"p\">Check-in\n   after 2 PM<br>Quiet hours</p></body></html>",
        );
        let p = snap.first("#p").unwrap();
        assert_eq!(html::inner_text(p), "Check-in after 2 PM\nQuiet hours");
    }

    #[test]
    fn test_hidden_and_script_content_is_skipped() {
        let snap = Snapshot::parse(
            r#"<html><body><div id="root">
                Visible
                <span style="display: none">Secret</span>
                <span hidden>Also secret</span>
                <script>var x = 1;</script>
            </div></body></html>"#,
        );
        assert_eq!(html::inner_text(snap.first("#root").unwrap()), "Visible");
    }

    #[test]
    fn test_text_of_missing_or_empty_element() {
        let snap = Snapshot::parse("<html><body><h1>  </h1></body></html>");
        assert_eq!(snap.text_of("h1"), None);
        assert_eq!(snap.text_of("h2"), None);
    }
}

#[cfg(test)]
mod query_tests {
    use super::*;

    #[test]
    fn test_closest_and_contains() {
        let snap = Snapshot::parse(
            r#"<html><body><main id="m"><section id="s"><p id="p">Hi</p></section></main><aside id="a"></aside></body></html>"#,
        );
        let p = snap.first("#p").unwrap();
        let main = snap.first("#m").unwrap();
        let aside = snap.first("#a").unwrap();

        assert_eq!(html::closest(p, "main").map(|e| e.value().id()), Some(Some("m")));
        assert_eq!(html::closest(p, "#p").map(|e| e.value().id()), Some(Some("p")));
        assert!(html::closest(p, "aside").is_none());
        assert!(html::contains(main, p));
        assert!(html::contains(p, p));
        assert!(!html::contains(aside, p));
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let snap = Snapshot::parse("<html><body><div></div></body></html>");
        assert!(snap.select("div[[").is_empty());
        assert!(snap.first(":::").is_none());
    }

    #[test]
    fn test_text_nodes_report_parent() {
        let snap = Snapshot::parse(
            r#"<html><body><div id="c"><p class="a">one</p><p class="b">two</p></div></body></html>"#,
        );
        let nodes = html::text_nodes(snap.first("#c").unwrap());
        let texts: Vec<(&str, Option<&str>)> = nodes
            .iter()
            .map(|(t, el)| (*t, el.value().attr("class")))
            .collect();
        assert_eq!(texts, vec![("one", Some("a")), ("two", Some("b"))]);
    }
}

#[cfg(test)]
mod style_tests {
    use super::*;

    #[test]
    fn test_inline_style_parsing() {
        let style = html::parse_inline_style("color: RGB(176, 176, 176); opacity:0.3 ; display:block");
        assert_eq!(style.color.as_deref(), Some("rgb(176, 176, 176)"));
        assert_eq!(style.opacity, Some(0.3));
        assert_eq!(style.display.as_deref(), Some("block"));
        assert_eq!(style.visibility, None);
    }

    #[test]
    fn test_annotations_override_inline_style() {
        let snap = Snapshot::parse(
            r#"<html><body><span id="s" style="opacity: 1" data-hc-opacity="0.4" data-hc-top="120.5">x</span></body></html>"#,
        );
        let span = snap.first("#s").unwrap();
        assert_eq!(html::style(span).opacity, Some(0.4));
        assert_eq!(html::offset_top(span), Some(120.5));
    }

    #[test]
    fn test_visibility_is_inherited() {
        let snap = Snapshot::parse(
            r#"<html><body>
                <div style="visibility: hidden"><span id="inner">a</span></div>
                <div style="visibility: hidden"><span id="shown" style="visibility: visible">b</span></div>
                <div style="display:none"><span id="gone">c</span></div>
                <span id="transparent" style="opacity: 0">d</span>
                <span id="plain">e</span>
            </body></html>"#,
        );
        assert!(html::is_hidden(snap.first("#inner").unwrap()));
        assert!(!html::is_hidden(snap.first("#shown").unwrap()));
        assert!(html::is_hidden(snap.first("#gone").unwrap()));
        assert!(html::is_hidden(snap.first("#transparent").unwrap()));
        assert!(!html::is_hidden(snap.first("#plain").unwrap()));
    }
}
