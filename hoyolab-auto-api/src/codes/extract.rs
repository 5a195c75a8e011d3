//! Wiki/article markup extraction.
//!
//! The wiki sources render codes inside table markup that has kept the same
//! shape for years; a row/cell scan is all that is needed. Rows that list a
//! code as China-only or already expired are excluded from the valid set, and
//! the expired set feeds the aggregator's cross-source filter.

use regex::Regex;

/// Codes pulled from one source page, split by the page's own expiry column.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(super) struct CodeTable {
    pub valid: Vec<String>,
    pub expired: Vec<String>,
}

#[allow(clippy::unwrap_used)] // literal patterns, exercised by tests
fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap()
}

fn tables(html: &str) -> Vec<&str> {
    re(r"(?s)<table[^>]*>.*?</table>")
        .find_iter(html)
        .map(|m| m.as_str())
        .collect()
}

fn rows(table: &str) -> Vec<&str> {
    re(r"(?s)<tr[^>]*>.*?</tr>")
        .find_iter(table)
        .map(|m| m.as_str())
        .collect()
}

fn cells(row: &str) -> Vec<String> {
    re(r"(?s)<td[^>]*>(.*?)</td>")
        .captures_iter(row)
        .map(|c| c[1].to_string())
        .collect()
}

/// Text inside `<code>` elements of a fragment, tags stripped.
fn code_tokens(fragment: &str) -> Vec<String> {
    re(r"(?s)<code[^>]*>(.*?)</code>")
        .captures_iter(fragment)
        .map(|c| strip_tags(&c[1]))
        .filter(|s| !s.is_empty())
        .collect()
}

fn strip_tags(fragment: &str) -> String {
    let text = re(r"<[^>]+>").replace_all(fragment, "");
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// First wikitable on the page.
fn first_wikitable(html: &str) -> Option<&str> {
    re(r#"(?s)<table[^>]*class="[^"]*wikitable[^"]*"[^>]*>.*?</table>"#)
        .find(html)
        .map(|m| m.as_str())
}

/// Genshin Fandom "Promotional Code" table: codes sit in the first cell, the
/// second cell names the server scope. China-only rows are skipped; the page
/// moves expired codes to a separate article, so nothing lands in `expired`.
pub(super) fn fandom_hk4e(html: &str) -> CodeTable {
    let mut out = CodeTable::default();
    let Some(table) = first_wikitable(html) else {
        return out;
    };
    for row in rows(table).into_iter().skip(1) {
        let cells = cells(row);
        let Some(first) = cells.first() else { continue };
        if cells
            .get(1)
            .is_some_and(|scope| strip_tags(scope).contains("China"))
        {
            continue;
        }
        out.valid.extend(code_tokens(first));
    }
    out
}

/// Zenless Fandom "Redemption Code" table: the fourth cell carries the
/// validity text, with expired rows kept in the same table.
pub(super) fn fandom_nap(html: &str) -> CodeTable {
    let mut out = CodeTable::default();
    let Some(table) = first_wikitable(html) else {
        return out;
    };
    for row in rows(table).into_iter().skip(1) {
        let cells = cells(row);
        let Some(first) = cells.first() else { continue };
        let codes = code_tokens(first);
        if cells
            .get(3)
            .is_some_and(|status| strip_tags(status).contains("Expired"))
        {
            out.expired.extend(codes);
        } else {
            out.valid.extend(codes);
        }
    }
    out
}

fn copy_ui_tokens(fragment: &str) -> Vec<String> {
    re(r#"(?s)<div class="w-clipboard-copy-ui"[^>]*>(.*?)</div>"#)
        .captures_iter(fragment)
        .map(|c| strip_tags(&c[1]))
        .filter(|s| !s.is_empty())
        .collect()
}

/// GameWith Genshin article: every `genshin_table_table` row carries one code
/// in a clipboard-copy widget. The article only lists live codes.
pub(super) fn gamewith_hk4e(html: &str) -> CodeTable {
    let mut out = CodeTable::default();
    let table_re = re(r#"(?s)<table[^>]*class="[^"]*genshin_table_table[^"]*"[^>]*>.*?</table>"#);
    for table in table_re.find_iter(html).map(|m| m.as_str()) {
        for row in rows(table).into_iter().skip(1) {
            out.valid.extend(copy_ui_tokens(row));
        }
    }
    out
}

/// GameWith Zenless article: the trailing copy-widget table is the expired
/// list, everything before it is live.
pub(super) fn gamewith_nap(html: &str) -> CodeTable {
    let mut out = CodeTable::default();
    let with_codes: Vec<&str> = tables(html)
        .into_iter()
        .filter(|t| t.contains("w-clipboard-copy-ui"))
        .collect();
    let last = with_codes.len().saturating_sub(1);
    for (index, table) in with_codes.iter().enumerate() {
        for row in rows(table).into_iter().skip(1) {
            let tokens = copy_ui_tokens(row);
            if index == last && with_codes.len() > 1 {
                out.expired.extend(tokens);
            } else {
                out.valid.extend(tokens);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_tags_flattens_markup() {
        assert_eq!(strip_tags("<a href=\"x\"><b>GENSHIN</b></a>&nbsp;"), "GENSHIN");
    }

    #[test]
    fn fandom_hk4e_skips_header_and_china_rows() {
        let html = r#"
            <table class="sortable wikitable"><tbody>
              <tr><th>Code</th><th>Server</th><th>Rewards</th></tr>
              <tr><td><a><b><code>GLOBALCODE</code></b></a></td><td>All</td><td>x</td></tr>
              <tr><td><a><b><code>CNCODE</code></b></a></td><td>China</td><td>x</td></tr>
              <tr><td><a><b><code>TWOCODES1</code></b></a> <a><b><code>TWOCODES2</code></b></a></td><td>All</td><td>x</td></tr>
            </tbody></table>
        "#;
        let table = fandom_hk4e(html);
        assert_eq!(table.valid, vec!["GLOBALCODE", "TWOCODES1", "TWOCODES2"]);
        assert!(table.expired.is_empty());
    }

    #[test]
    fn fandom_hk4e_ignores_later_tables() {
        let html = r#"
            <table class="wikitable"><tbody>
              <tr><th>Code</th><th>Server</th></tr>
              <tr><td><code>KEEPME</code></td><td>All</td></tr>
            </tbody></table>
            <table class="wikitable"><tbody>
              <tr><th>Code</th><th>Server</th></tr>
              <tr><td><code>NOTME</code></td><td>All</td></tr>
            </tbody></table>
        "#;
        assert_eq!(fandom_hk4e(html).valid, vec!["KEEPME"]);
    }

    #[test]
    fn fandom_nap_splits_on_expired_column() {
        let html = r#"
            <table class="wikitable"><tbody>
              <tr><th>Code</th><th>Rewards</th><th>Server</th><th>Duration</th></tr>
              <tr><td><code>LIVEZZZ</code></td><td>x</td><td>All</td><td>Valid until further notice</td></tr>
              <tr><td><code>DEADZZZ</code></td><td>x</td><td>All</td><td>Expired: May 2025</td></tr>
            </tbody></table>
        "#;
        let table = fandom_nap(html);
        assert_eq!(table.valid, vec!["LIVEZZZ"]);
        assert_eq!(table.expired, vec!["DEADZZZ"]);
    }

    #[test]
    fn gamewith_hk4e_reads_copy_widgets() {
        let html = r#"
            <table class="genshin_table_table"><tbody>
              <tr><th>コード</th><th>報酬</th></tr>
              <tr><td><div class="w-clipboard-copy-ui">GWCODE1</div></td><td>x</td></tr>
              <tr><td><div class="w-clipboard-copy-ui">GWCODE2</div></td><td>x</td></tr>
            </tbody></table>
            <table class="other_table"><tbody>
              <tr><td><div class="w-clipboard-copy-ui">IGNORED</div></td></tr>
            </tbody></table>
        "#;
        let table = gamewith_hk4e(html);
        assert_eq!(table.valid, vec!["GWCODE1", "GWCODE2"]);
    }

    #[test]
    fn gamewith_nap_last_table_is_expired() {
        let html = r#"
            <table><tbody>
              <tr><th>h</th></tr>
              <tr><td><div class="w-clipboard-copy-ui">LIVE1</div></td></tr>
            </tbody></table>
            <table><tbody>
              <tr><th>h</th></tr>
              <tr><td>no widget here</td></tr>
            </tbody></table>
            <table><tbody>
              <tr><th>h</th></tr>
              <tr><td><div class="w-clipboard-copy-ui">OLD1</div></td></tr>
              <tr><td><div class="w-clipboard-copy-ui">OLD2</div></td></tr>
            </tbody></table>
        "#;
        let table = gamewith_nap(html);
        assert_eq!(table.valid, vec!["LIVE1"]);
        assert_eq!(table.expired, vec!["OLD1", "OLD2"]);
    }

    #[test]
    fn gamewith_nap_single_table_counts_as_live() {
        let html = r#"
            <table><tbody>
              <tr><th>h</th></tr>
              <tr><td><div class="w-clipboard-copy-ui">ONLY1</div></td></tr>
            </tbody></table>
        "#;
        let table = gamewith_nap(html);
        assert_eq!(table.valid, vec!["ONLY1"]);
        assert!(table.expired.is_empty());
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert_eq!(fandom_hk4e("<html></html>"), CodeTable::default());
        assert_eq!(fandom_nap(""), CodeTable::default());
        assert_eq!(gamewith_nap(""), CodeTable::default());
    }
}
