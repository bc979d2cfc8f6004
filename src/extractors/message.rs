use super::{ExtractEnv, Extractor};
use crate::filter::{NoiseFilter, forbidden_terms};
use crate::parsers::html;
use crate::parsers::text::{compact_eq, dedup_preserving_order, dedup_tokens};
use crate::results::MessageRecord;
use scraper::ElementRef;

/// Separator between chat blocks in `full_chat` and `previous_chat`
pub const CHAT_SEPARATOR: &str = "\n---\n";

const DEFAULT_GUEST_NAME: &str = "Guest";
const INBOX_HEADING: &str = "Messages";

const MESSAGE_INPUT: &str = r#"textarea[placeholder*="message"], div[contenteditable="true"], textarea[aria-label*="message"]"#;
const SIDEBAR_REGIONS: &str = r#"nav, aside, [role="navigation"], [class*="sidebar"], [aria-label="Threads"], section[aria-label*="About"]"#;
const NAVIGATION_REGIONS: &str = r#"nav, aside, [role="navigation"]"#;
const THREAD_LIST_MARKER: &str = r#"[aria-label="Threads"]"#;
const PROFILE_REGIONS: &str = r#"section[aria-label="Reservation details"], section[aria-label="UserProfile"], aside"#;
const NAME_HEADINGS: &str = r#"h2, h1, div[data-testid="header-container"] h2"#;
const HEADER_REGIONS: &[&str] = &[
    "header",
    r#"div[data-testid="header-container"]"#,
    r#"div[style*="border-bottom"]"#,
];
const SECTION_HEADINGS: &str = "h2, h3, h4";
const SIDEBAR_HEADING_WORDS: &[&str] = &["Reservation", "About"];
const MESSAGE_PANE: &str = r#"div[data-testid="message-pane"]"#;
const THREAD_LIST: &str = r#"nav, [aria-label="Threads"], [data-testid="conversation-list-item"], a[href*="/messaging/conversation/"]"#;
const NON_RENDERED: &str = "head, script, style, noscript, template";

/// Reads the open conversation from the inbox
#[derive(Debug, Default, Clone, Copy)]
pub struct MessageExtractor;

impl Extractor for MessageExtractor {
    type Output = MessageRecord;

    fn name(&self) -> &'static str {
        "message"
    }

    fn extract(&self, env: &ExtractEnv<'_>) -> Option<MessageRecord> {
        let input = env.dom.first(MESSAGE_INPUT);
        let container = chat_container(env, input);

        let sidebar_texts: Vec<String> = env
            .dom
            .select(PROFILE_REGIONS)
            .into_iter()
            .filter(|region| !input.is_some_and(|input| html::contains(*region, input)))
            .map(html::inner_text)
            .collect();
        let forbidden = forbidden_terms(sidebar_texts.iter().map(String::as_str));

        let guest_name = guest_name(env, container, &forbidden);
        let filter = NoiseFilter::new(&env.rules.set.message, &guest_name, forbidden);

        let blocks = text_blocks(env, container, &filter);
        if blocks.is_empty() {
            ::log::debug!("No chat text found");
            return None;
        }

        let mut blocks = dedup_preserving_order(blocks);
        let mut last_message = blocks.pop().unwrap_or_default();
        // A header line that slipped through is not the latest message
        if compact_eq(&last_message, &guest_name) {
            last_message = blocks.pop().unwrap_or_default();
        }
        if let Some(rest) = strip_speaker(&last_message, &guest_name) {
            last_message = rest.to_string();
        }
        if last_message.is_empty() {
            return None;
        }

        let previous_chat = blocks.join(CHAT_SEPARATOR);
        let full_chat = if previous_chat.is_empty() {
            last_message.clone()
        } else {
            format!("{}{}{}", previous_chat, CHAT_SEPARATOR, last_message)
        };

        Some(MessageRecord {
            guest_name,
            last_message,
            full_chat,
            previous_chat,
            extracted_at: env.now,
        })
    }
}

/// Text after a leading speaker name, when the name stands as a whole word
fn strip_speaker<'t>(text: &'t str, name: &str) -> Option<&'t str> {
    let rest = text.strip_prefix(name)?;
    if !rest.is_empty() && !rest.starts_with(|c: char| c.is_whitespace() || c == ':') {
        return None;
    }
    Some(rest.trim_start_matches(':').trim())
}

/// Smallest ancestor of the message input that sits beside a navigation or sidebar region
fn chat_container<'a>(env: &ExtractEnv<'a>, input: Option<ElementRef<'a>>) -> ElementRef<'a> {
    let body = env.dom.body();
    let Some(input) = input else {
        return body;
    };

    let mut current = input;
    while let Some(parent) = html::parent_element(current) {
        if parent.id() == body.id() {
            break;
        }
        let beside_sidebar = html::select_within(parent, SIDEBAR_REGIONS)
            .into_iter()
            .any(|region| !html::contains(current, region));
        let is_sidebar = html::matches(current, NAVIGATION_REGIONS)
            || html::has_descendant(current, THREAD_LIST_MARKER);
        if beside_sidebar && !is_sidebar {
            return current;
        }
        current = parent;
    }

    html::closest(input, "main").unwrap_or(body)
}

fn guest_name(
    env: &ExtractEnv<'_>,
    container: ElementRef<'_>,
    forbidden: &std::collections::HashSet<String>,
) -> String {
    html::select_within(container, NAME_HEADINGS)
        .into_iter()
        .filter(|heading| !env.in_panel(*heading))
        .filter_map(html::non_empty_text)
        .find(|name| name != INBOX_HEADING && !forbidden.contains(&name.to_lowercase()))
        .map(|name| dedup_tokens(&name))
        .unwrap_or_else(|| DEFAULT_GUEST_NAME.to_string())
}

/// Reservation or profile region rendered inside the chat container itself
fn inline_sidebar<'a>(container: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let heading = html::select_within(container, SECTION_HEADINGS)
        .into_iter()
        .find(|heading| {
            let text = html::inner_text(*heading);
            SIDEBAR_HEADING_WORDS.iter().any(|w| text.contains(w))
                && html::closest(*heading, MESSAGE_PANE).is_none()
        })?;
    html::closest(heading, "section").or_else(|| html::closest(heading, "aside"))
}

fn text_blocks(env: &ExtractEnv<'_>, container: ElementRef<'_>, filter: &NoiseFilter<'_>) -> Vec<String> {
    let header = HEADER_REGIONS
        .iter()
        .find_map(|css| html::select_within(container, css).into_iter().next());
    let sidebar = inline_sidebar(container);

    let mut blocks = Vec::new();
    for (raw, el) in html::text_nodes(container) {
        let text = raw.trim();
        if text.is_empty() || env.in_panel(el) || html::closest(el, NON_RENDERED).is_some() {
            continue;
        }

        if filter.is_forced(text) {
            blocks.push(text.to_string());
            continue;
        }
        if filter.is_leak(text) {
            continue;
        }
        if header.is_some_and(|h| html::contains(h, el)) {
            continue;
        }
        if sidebar.is_some_and(|s| html::contains(s, el)) {
            ::log::trace!("Dropped (sidebar): {}", text);
            continue;
        }
        if html::closest(el, THREAD_LIST).is_some() {
            ::log::trace!("Dropped (thread list): {}", text);
            continue;
        }
        if html::is_hidden(el) || html::closest(el, r#"[aria-hidden="true"]"#).is_some() {
            continue;
        }

        if filter.is_noise(text) {
            ::log::trace!("Dropped (noise): {:?}", text);
        } else {
            blocks.push(text.to_string());
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::testing::Fixture;

    const INBOX: &str = "https://host.example/hosting/messages/thread/9";

    fn inbox(chat: &str) -> String {
        format!(
            r#"<body><div class="app">
                <nav aria-label="Threads">
                    <a href="/messaging/conversation/1">Read Conversation with Ana</a>
                    <div data-testid="conversation-list-item">Ana: See you soon</div>
                </nav>
                <main>
                    <section class="chat">
                        <div data-testid="header-container"><h2>Nabhas Nabhas</h2><span>Booker</span></div>
                        <div data-testid="message-pane">{}</div>
                        <textarea placeholder="Write a message..."></textarea>
                    </section>
                </main>
                <aside>
                    <h2>About Nabhas</h2>
                    <div>Lives in Kochi, India</div>
                    <div>Show profile</div>
                </aside>
            </div></body>"#,
            chat
        )
    }

    fn extract(html: &str) -> Option<MessageRecord> {
        let fixture = Fixture::new(INBOX, html);
        MessageExtractor.extract(&fixture.env())
    }

    #[test]
    fn test_conversation_split() {
        let record = extract(&inbox(
            r#"<div>Enquiry sent · 2 guests</div>
               <div><span>Hi! Is the cabin free on the 27th?</span><span>9:41 AM</span></div>
               <div>Today</div>
               <div><span>Nabhas</span><span>Can we check in early?</span></div>"#,
        ))
        .unwrap();

        assert_eq!(record.guest_name, "Nabhas");
        assert_eq!(record.last_message, "Can we check in early?");
        assert_eq!(
            record.previous_chat,
            "Enquiry sent · 2 guests\n---\nHi! Is the cabin free on the 27th?"
        );
        assert_eq!(
            record.full_chat,
            "Enquiry sent · 2 guests\n---\nHi! Is the cabin free on the 27th?\n---\nCan we check in early?"
        );
    }

    #[test]
    fn test_sidebar_and_thread_list_do_not_leak() {
        let record = extract(&inbox(
            r#"<div>Lives in Kochi, India</div><div>Hello there</div>"#,
        ))
        .unwrap();
        assert_eq!(record.last_message, "Hello there");
        assert_eq!(record.previous_chat, "");
        assert_eq!(record.full_chat, "Hello there");
        assert!(!record.full_chat.contains("Ana"));
    }

    #[test]
    fn test_hidden_and_duplicate_blocks() {
        let record = extract(&inbox(
            r#"<div>Hello there</div>
               <div aria-hidden="true">Screen reader copy</div>
               <div style="display: none">Draft</div>
               <div>Hello there</div>
               <div>Thanks!</div>"#,
        ))
        .unwrap();
        assert_eq!(record.full_chat, "Hello there\n---\nThanks!");
    }

    #[test]
    fn test_guest_name_prefix_stripped() {
        let record = extract(&inbox(r#"<div>Nabhas arriving at 6</div>"#)).unwrap();
        assert_eq!(record.last_message, "arriving at 6");
        assert_eq!(record.full_chat, "arriving at 6");
    }

    #[test]
    fn test_guest_name_prefix_needs_word_boundary() {
        let record = extract(r#"<body><main><div>Guests arrive at 5</div></main></body>"#).unwrap();
        assert_eq!(record.guest_name, "Guest");
        assert_eq!(record.last_message, "Guests arrive at 5");

        let record = extract(&inbox(r#"<div>Nabhas: see you at 6</div>"#)).unwrap();
        assert_eq!(record.last_message, "see you at 6");
    }

    #[test]
    fn test_injected_panel_is_ignored() {
        let record = extract(&inbox(
            r#"<div>Hello there</div><div id="host-context-message-box"><div>Latest: Hello there</div></div>"#,
        ))
        .unwrap();
        assert_eq!(record.last_message, "Hello there");
    }

    #[test]
    fn test_empty_conversation() {
        assert!(extract(&inbox("")).is_none());
        assert!(extract("<body><div>9:41 AM</div></body>").is_none());
    }

    #[test]
    fn test_default_guest_name_without_heading() {
        let record = extract(r#"<body><main><div>Hello there</div></main></body>"#).unwrap();
        assert_eq!(record.guest_name, "Guest");
        assert_eq!(record.last_message, "Hello there");
    }
}
