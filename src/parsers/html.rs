use crate::parsers::text;
use scraper::{ElementRef, Html, Node, Selector};

/// Attribute prefix used by the live source to stamp browser-computed values
/// (style and layout) onto elements before the page source is captured.
pub const ANNOTATION_PREFIX: &str = "data-hc-";

/// Elements whose rendered text starts and ends on its own line
const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "dd",
    "details",
    "dialog",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "summary",
    "table",
    "tbody",
    "tfoot",
    "thead",
    "tr",
    "ul",
];

/// Elements that never contribute rendered text
const SKIPPED_TAGS: &[&str] = &["head", "noscript", "script", "style", "template"];

/// A read-only snapshot of the host page's DOM at extraction time
///
/// Extractors never own the live document; they receive a snapshot,
/// query it, and tolerate the absence of every element they look for.
pub struct Snapshot {
    doc: Html,
}

impl Snapshot {
    /// Parses a full HTML document into a snapshot
    pub fn parse(html: &str) -> Self {
        Self {
            doc: Html::parse_document(html),
        }
    }

    /// Returns the `<body>` element, or the document root when there is none
    pub fn body(&self) -> ElementRef<'_> {
        match compile("body").and_then(|sel| self.doc.select(&sel).next()) {
            Some(body) => body,
            None => self.doc.root_element(),
        }
    }

    /// All elements matching `css`, in document order
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match compile(css) {
            Some(sel) => self.doc.select(&sel).collect(),
            None => Vec::new(),
        }
    }

    /// First element matching `css`, in document order
    pub fn first(&self, css: &str) -> Option<ElementRef<'_>> {
        let sel = compile(css)?;
        self.doc.select(&sel).next()
    }

    /// Trimmed rendered text of the first element matching `css`, if non-empty
    pub fn text_of(&self, css: &str) -> Option<String> {
        self.first(css).and_then(non_empty_text)
    }
}

/// Compiles a CSS selector, logging and discarding invalid ones
pub fn compile(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            ::log::warn!("Ignoring invalid selector {:?}: {:?}", css, e);
            None
        }
    }
}

/// Descendants of `scope` (excluding `scope` itself) matching `css`
pub fn select_within<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match compile(css) {
        Some(sel) => scope.select(&sel).collect(),
        None => Vec::new(),
    }
}

/// Whether `scope` has at least one descendant matching `css`
pub fn has_descendant(scope: ElementRef<'_>, css: &str) -> bool {
    compile(css).is_some_and(|sel| scope.select(&sel).next().is_some())
}

/// Whether `el` itself matches `css`
pub fn matches(el: ElementRef<'_>, css: &str) -> bool {
    compile(css).is_some_and(|sel| sel.matches(&el))
}

/// Nearest inclusive ancestor of `el` matching `css`
pub fn closest<'a>(el: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let sel = compile(css)?;
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .find(|candidate| sel.matches(candidate))
}

/// Whether `node` is `ancestor` or lies inside it
pub fn contains(ancestor: ElementRef<'_>, node: ElementRef<'_>) -> bool {
    node.id() == ancestor.id() || node.ancestors().any(|a| a.id() == ancestor.id())
}

/// Parent element of `el`, if any
pub fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

/// Attribute value of `el`
pub fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

/// Every text node below `scope`, paired with the element that holds it
pub fn text_nodes<'a>(scope: ElementRef<'a>) -> Vec<(&'a str, ElementRef<'a>)> {
    scope
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let parent = node.parent().and_then(ElementRef::wrap)?;
            Some((&**text, parent))
        })
        .collect()
}

/// Approximates the browser's `innerText` for `el`
///
/// Block-level elements and `<br>` break lines, whitespace inside a line
/// collapses, empty lines are dropped, and hidden or non-rendered
/// subtrees are skipped.
pub fn inner_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_rendered(el, &mut raw);
    text::normalize_lines(&raw)
}

/// Rendered text of `el`, or `None` when it is empty
pub fn non_empty_text(el: ElementRef<'_>) -> Option<String> {
    let text = inner_text(el);
    if text.is_empty() { None } else { Some(text) }
}

fn collect_rendered(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => {
                // Source formatting newlines are not rendered line breaks
                out.extend(t.chars().map(|c| if c.is_whitespace() { ' ' } else { c }));
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    render_element(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn render_element(el: ElementRef<'_>, out: &mut String) {
    let name = el.value().name();
    if SKIPPED_TAGS.contains(&name) || is_display_none(el) {
        return;
    }
    if name == "br" {
        out.push('\n');
        return;
    }

    let block = BLOCK_TAGS.contains(&name);
    let cell = name == "td" || name == "th";
    if block {
        out.push('\n');
    } else if cell {
        out.push(' ');
    }
    collect_rendered(el, out);
    if block {
        out.push('\n');
    } else if cell {
        out.push(' ');
    }
}

/// Computed-style approximation for a single element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style {
    pub display: Option<String>,
    pub visibility: Option<String>,
    pub opacity: Option<f64>,
    pub color: Option<String>,
}

/// Resolves the style of `el`
///
/// Values stamped by the live source (`data-hc-display`, `data-hc-visibility`,
/// `data-hc-opacity`, `data-hc-color`) win over the inline `style` attribute.
pub fn style(el: ElementRef<'_>) -> Style {
    let mut resolved = attr(el, "style").map(parse_inline_style).unwrap_or_default();

    let annotated = |key: &str| {
        attr(el, &format!("{}{}", ANNOTATION_PREFIX, key)).map(|v| v.trim().to_ascii_lowercase())
    };
    if let Some(display) = annotated("display") {
        resolved.display = Some(display);
    }
    if let Some(visibility) = annotated("visibility") {
        resolved.visibility = Some(visibility);
    }
    if let Some(opacity) = annotated("opacity").and_then(|v| v.parse::<f64>().ok()) {
        resolved.opacity = Some(opacity);
    }
    if let Some(color) = annotated("color") {
        resolved.color = Some(color);
    }
    resolved
}

/// Parses the declarations of an inline `style` attribute that matter for visibility
pub fn parse_inline_style(declarations: &str) -> Style {
    let mut parsed = Style::default();
    for declaration in declarations.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let value = value.trim().trim_end_matches("!important").trim().to_ascii_lowercase();
        match property.trim().to_ascii_lowercase().as_str() {
            "display" => parsed.display = Some(value),
            "visibility" => parsed.visibility = Some(value),
            "opacity" => parsed.opacity = value.parse::<f64>().ok(),
            "color" => parsed.color = Some(value),
            _ => {}
        }
    }
    parsed
}

fn is_display_none(el: ElementRef<'_>) -> bool {
    attr(el, "hidden").is_some() || style(el).display.as_deref() == Some("none")
}

/// Whether `el` would be invisible to the user
///
/// `display:none` and the `hidden` attribute hide the whole subtree,
/// `visibility` inherits from the nearest ancestor that sets it, and
/// `opacity:0` is checked on the element itself.
pub fn is_hidden(el: ElementRef<'_>) -> bool {
    let chain: Vec<ElementRef<'_>> = std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .collect();

    if chain.iter().any(|e| is_display_none(*e)) {
        return true;
    }

    let visibility = chain.iter().find_map(|e| style(*e).visibility);
    if matches!(visibility.as_deref(), Some("hidden") | Some("collapse")) {
        return true;
    }

    style(el).opacity.is_some_and(|o| o <= 0.0)
}

/// Viewport offset of `el`'s top edge, when layout information is available
pub fn offset_top(el: ElementRef<'_>) -> Option<f64> {
    attr(el, &format!("{}top", ANNOTATION_PREFIX)).and_then(|v| v.trim().parse::<f64>().ok())
}
