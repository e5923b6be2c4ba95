/// Scroll the pager so the entry for `index` sits in the middle of the window.
pub(super) fn center_page_script(index: usize) -> String {
    format!(
        r#"(function() {{
            const pages = document.getElementById("exam-pages");
            const page = document.getElementById("page-{index}");
            if (!pages || !page) return;
            const rect = page.getClientRects()[0];
            if (!rect) return;
            const screenWidth = document.body.clientWidth;
            pages.scrollBy({{
                left: rect.left + rect.width / 2 - screenWidth / 2,
                behavior: "smooth",
            }});
        }})();"#,
    )
}

pub(super) fn document_locale_script(lang: &str, dir: &str) -> String {
    format!(
        r"(function() {{
            const html = document.documentElement;
            html.setAttribute('lang', {lang:?});
            html.setAttribute('dir', {dir:?});
        }})();",
    )
}

pub(super) fn focus_root_script() -> &'static str {
    r#"document.getElementById("exam-root")?.focus();"#
}
