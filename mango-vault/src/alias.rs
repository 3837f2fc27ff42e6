//! Alternate site forms for alias resolution.
//!
//! Users type sites inconsistently (`google.com` one day, `google` the
//! next). Each lookup tries the literal key and exactly one alternate, so a
//! miss costs at most two probes and never a collection scan.

/// Computes the single alternate key tried when `site` itself is not stored.
///
/// - `example.com` → `example` (a trailing `.com` is stripped).
/// - `example.co.uk` → `example.com`, `www.example.co.uk` → `www.example.com`:
///   the registrable domain (eTLD+1, from the public suffix list) is
///   rewritten to `base.com` and any subdomain prefix is kept.
/// - Anything without a recognizable ICANN suffix (bare labels like
///   `example`, unlisted or private suffixes, malformed names) falls back to
///   `site + ".com"`.
///
/// The suffix lookup ignores ASCII case; the returned key keeps the caller's
/// spelling.
pub fn alternate_site(site: &str) -> String {
    if let Some(base) = site.strip_suffix(".com") {
        return base.to_string();
    }
    registrable_as_com(site).unwrap_or_else(|| format!("{site}.com"))
}

fn registrable_as_com(site: &str) -> Option<String> {
    if site.is_empty() || site.split('.').any(str::is_empty) {
        return None;
    }

    let lower = site.to_ascii_lowercase();
    let domain = psl::domain(lower.as_bytes())?;
    let suffix = domain.suffix();
    if !suffix.is_known() || suffix.typ() != Some(psl::Type::Icann) {
        return None;
    }

    // The registrable domain is a byte suffix of `site` that starts on a
    // label boundary, so both splits land on ASCII dots.
    let registrable_len = domain.as_bytes().len();
    let suffix_len = suffix.as_bytes().len();
    let (prefix, registrable) = site.split_at(site.len().checked_sub(registrable_len)?);
    let base = registrable.get(..registrable_len.checked_sub(suffix_len + 1)?)?;

    Some(match prefix.strip_suffix('.') {
        Some(subdomain) => format!("{subdomain}.{base}.com"),
        None => format!("{base}.com"),
    })
}
