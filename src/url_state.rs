//! Two-way adapter between a `ViewState` and the page's query string.
//!
//! Only state that differs from the defaults is written, so a pristine view
//! has an empty query string.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use portal_protocol::{Criteria, SortDir, SortKey, Tab, ViewState};
use url::form_urlencoded;

/// Characters a URI component keeps unescaped, as in `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encoding for a single URI component; spaces become `%20`.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Splits `a=1&b=2` (optionally prefixed with `?`) into decoded pairs.
/// Malformed escapes are kept literally.
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .into_owned()
        .collect()
}

/// Applies query parameters on top of `state`. Unknown tabs, sort keys and
/// directions are ignored; unknown parameters are skipped.
pub fn apply_query_string(state: &mut ViewState, query: &str) {
    state.admin = false;
    for (key, value) in parse_query_string(query) {
        match key.as_str() {
            "q" if !value.is_empty() => state.criteria.query = value,
            "region" | "state" => {
                if let Some(region) = Criteria::selector(&value) {
                    state.criteria.region = Some(region);
                }
            }
            "amr_class" => {
                if let Some(class) = Criteria::selector(&value) {
                    state.criteria.amr_class = Some(class);
                }
            }
            "tab" => {
                if let Some(tab) = Tab::parse(&value) {
                    state.tab = tab;
                }
            }
            "sort" => {
                if let Some(sort_key) = SortKey::parse(&value) {
                    state.sort.key = sort_key;
                }
            }
            "dir" => {
                if let Some(dir) = SortDir::parse(&value) {
                    state.sort.dir = dir;
                }
            }
            "admin" => state.admin = value == "1",
            _ => {}
        }
    }
}

pub fn decode(query: &str) -> ViewState {
    let mut state = ViewState::default();
    apply_query_string(&mut state, query);
    state
}

/// Query string (without `?`) describing the non-default parts of `state`.
pub fn encode(state: &ViewState) -> String {
    let mut params: Vec<(&str, String)> = vec![];
    if !state.criteria.query.is_empty() {
        params.push(("q", state.criteria.query.clone()));
    }
    if let Some(region) = &state.criteria.region {
        params.push(("region", region.clone()));
    }
    if let Some(class) = &state.criteria.amr_class {
        params.push(("amr_class", class.clone()));
    }
    if state.tab != Tab::default() {
        params.push(("tab", state.tab.label().to_string()));
    }
    if !state.sort.is_default() {
        params.push(("sort", state.sort.key.as_str().to_string()));
        params.push(("dir", state.sort.dir.as_str().to_string()));
    }
    if state.admin {
        params.push(("admin", "1".to_string()));
    }
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, &value);
    }
    serializer.finish()
}
