//! Scripts executed in the watched page.

/// Installs the mutation recorder once per window
///
/// Records the target id and the ids of its ancestors, nearest first, for
/// every childList mutation under `document.body`.
pub const INSTALL_RECORDER: &str = r#"
if (window.__hostContextMutations !== undefined || !document.body) {
    return false;
}
window.__hostContextMutations = [];
const ancestorIds = (node) => {
    const ids = [];
    for (let el = node ? node.parentElement : null; el; el = el.parentElement) {
        if (el.id) {
            ids.push(el.id);
        }
    }
    return ids;
};
new MutationObserver((records) => {
    for (const record of records) {
        const target = record.target;
        window.__hostContextMutations.push({
            targetId: target && target.id ? target.id : null,
            ancestorIds: ancestorIds(target),
        });
    }
}).observe(document.body, { childList: true, subtree: true });
return true;
"#;

/// Returns and clears the recorded mutations
pub const DRAIN_MUTATIONS: &str = r#"
const recorded = window.__hostContextMutations || [];
window.__hostContextMutations = window.__hostContextMutations ? [] : undefined;
return recorded;
"#;

/// Stamps computed style and layout as `data-hc-*` attributes, then returns the page HTML
///
/// Attribute writes are not childList mutations, so the recorder does not see them.
pub const ANNOTATE_AND_SERIALIZE: &str = r#"
for (const el of document.body.querySelectorAll('*')) {
    const style = window.getComputedStyle(el);
    el.setAttribute('data-hc-display', style.display);
    el.setAttribute('data-hc-visibility', style.visibility);
    el.setAttribute('data-hc-opacity', style.opacity);
    el.setAttribute('data-hc-color', style.color);
    el.setAttribute('data-hc-top', String(Math.round(el.getBoundingClientRect().top)));
}
return document.documentElement.outerHTML;
"#;
