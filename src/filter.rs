use crate::error::ExplorerError;
use crate::view::ResourceView;
use regex::RegexBuilder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterSpec {
    Substring(String),
    Regex(String),
    InverseRegex(String),
    Tags(Vec<(String, String)>),
    Fuzzy(String),
}

impl FilterSpec {
    // An empty expression clears the filter (None).
    pub fn parse(raw: &str) -> Result<Option<Self>, ExplorerError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        if let Some(rest) = raw.strip_prefix("-t")
            && (rest.is_empty() || rest.starts_with(' '))
        {
            return Ok(Some(Self::Tags(parse_tag_pairs(rest.trim())?)));
        }
        if let Some(rest) = raw.strip_prefix("-f")
            && (rest.is_empty() || rest.starts_with(' '))
        {
            let needle = rest.trim();
            if needle.is_empty() {
                return Err(ExplorerError::InvalidFilter(
                    "empty fuzzy query".to_string(),
                ));
            }
            return Ok(Some(Self::Fuzzy(needle.to_string())));
        }
        if let Some(rest) = raw.strip_prefix('!') {
            return Ok(Some(Self::InverseRegex(rest.to_string())));
        }
        if raw.contains(|c| "\\.+*?()[]{}|^$".contains(c)) {
            Ok(Some(Self::Regex(raw.to_string())))
        } else {
            Ok(Some(Self::Substring(raw.to_string())))
        }
    }
}

fn parse_tag_pairs(spec: &str) -> Result<Vec<(String, String)>, ExplorerError> {
    if spec.is_empty() {
        return Err(ExplorerError::InvalidFilter(
            "tag filter needs key=value pairs".to_string(),
        ));
    }
    spec.split(',')
        .map(|pair| {
            let pair = pair.trim();
            match pair.split_once('=') {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => Ok((
                    key.trim().to_ascii_lowercase(),
                    value.trim().to_ascii_lowercase(),
                )),
                _ => Err(ExplorerError::InvalidFilter(format!(
                    "malformed tag pair '{pair}'"
                ))),
            }
        })
        .collect()
}

pub fn apply(base: &ResourceView, spec: &FilterSpec) -> Result<ResourceView, ExplorerError> {
    let rows = match spec {
        FilterSpec::Substring(needle) => {
            let needle = needle.to_ascii_lowercase();
            base.rows
                .iter()
                .filter(|row| {
                    row.cells
                        .iter()
                        .any(|cell| cell.to_ascii_lowercase().contains(&needle))
                })
                .cloned()
                .collect()
        }
        FilterSpec::Regex(pattern) | FilterSpec::InverseRegex(pattern) => {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|err| ExplorerError::InvalidFilter(err.to_string()))?;
            let keep_matching = matches!(spec, FilterSpec::Regex(_));
            base.rows
                .iter()
                .filter(|row| row.cells.iter().any(|cell| regex.is_match(cell)) == keep_matching)
                .cloned()
                .collect()
        }
        FilterSpec::Tags(pairs) => match base.column_index("TAGS") {
            // No TAGS column means nothing can match, not an error.
            None => Vec::new(),
            Some(column) => base
                .rows
                .iter()
                .filter(|row| {
                    let tokens: Vec<String> = row.cells[column]
                        .split(',')
                        .map(|token| token.trim().to_ascii_lowercase())
                        .collect();
                    pairs
                        .iter()
                        .all(|(key, value)| tokens.iter().any(|t| t == &format!("{key}={value}")))
                })
                .cloned()
                .collect(),
        },
        FilterSpec::Fuzzy(needle) => {
            let mut scored: Vec<(i64, usize)> = base
                .rows
                .iter()
                .enumerate()
                .filter_map(|(index, row)| {
                    row.cells
                        .iter()
                        .filter_map(|cell| fuzzy_score(cell, needle))
                        .max()
                        .map(|score| (score, index))
                })
                .collect();
            // Stable: ties keep catalog order.
            scored.sort_by(|a, b| b.0.cmp(&a.0));
            scored
                .into_iter()
                .map(|(_, index)| base.rows[index].clone())
                .collect()
        }
    };

    Ok(ResourceView {
        kind: base.kind,
        columns: base.columns.clone(),
        rows,
        sort_keys: base.sort_keys.clone(),
        actions: base.actions,
    })
}

// Two tiers: exact substring beats subsequence credit, earlier and longer
// exact matches beat later and shorter ones. Subsequence credit counts the
// query characters found in order; characters that never appear are skipped
// rather than failing the whole cell. Zero found characters is no match.
fn fuzzy_score(cell: &str, needle: &str) -> Option<i64> {
    let hay = cell.to_ascii_lowercase();
    let needle = needle.to_ascii_lowercase();
    if needle.is_empty() {
        return None;
    }
    if let Some(index) = hay.find(&needle) {
        return Some(1000 - 10 * index as i64 + needle.chars().count() as i64);
    }
    let mut from = 0usize;
    let mut matched = 0i64;
    for ch in needle.chars() {
        if let Some(offset) = hay[from..].find(ch) {
            from += offset + ch.len_utf8();
            matched += 1;
        }
    }
    if matched == 0 { None } else { Some(5 * matched) }
}

#[cfg(test)]
mod tests {
    use super::{FilterSpec, apply, fuzzy_score};
    use crate::model::{ResourceKind, sample_catalog};
    use crate::view::{ResourceView, build};

    fn vm_view() -> ResourceView {
        build(ResourceKind::Vms, &sample_catalog())
    }

    #[test]
    fn empty_expression_clears() {
        assert_eq!(FilterSpec::parse("").unwrap(), None);
        assert_eq!(FilterSpec::parse("   ").unwrap(), None);
    }

    #[test]
    fn plain_text_is_substring_and_metacharacters_are_regex() {
        assert_eq!(
            FilterSpec::parse("alpha").unwrap(),
            Some(FilterSpec::Substring("alpha".to_string()))
        );
        assert_eq!(
            FilterSpec::parse("vm-.*a$").unwrap(),
            Some(FilterSpec::Regex("vm-.*a$".to_string()))
        );
        assert_eq!(
            FilterSpec::parse("!powered").unwrap(),
            Some(FilterSpec::InverseRegex("powered".to_string()))
        );
    }

    #[test]
    fn substring_matches_any_cell_case_insensitively() {
        let view = vm_view();
        let spec = FilterSpec::parse("PROD-NET").unwrap().unwrap();
        let filtered = apply(&view, &spec).unwrap();
        let names: Vec<&str> = filtered.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(names, vec!["vm-alpha", "vm-beta"]);
    }

    #[test]
    fn inverse_regex_keeps_non_matching_rows() {
        let view = vm_view();
        let filtered = apply(&view, &FilterSpec::InverseRegex("poweredOn".to_string())).unwrap();
        let names: Vec<&str> = filtered.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(names, vec!["vm-beta"]);
    }

    #[test]
    fn invalid_regex_is_an_error() {
        let view = vm_view();
        let result = apply(&view, &FilterSpec::Regex("vm-(".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn tag_conjunction_requires_every_pair() {
        let view = vm_view();
        let spec = FilterSpec::parse("-t env=prod,tier=gold").unwrap().unwrap();
        let filtered = apply(&view, &spec).unwrap();
        let names: Vec<&str> = filtered.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(names, vec!["vm-alpha"]);
    }

    #[test]
    fn tag_filter_without_tags_column_matches_nothing() {
        let clusters = build(ResourceKind::Clusters, &sample_catalog());
        let spec = FilterSpec::Tags(vec![("env".to_string(), "prod".to_string())]);
        assert!(apply(&clusters, &spec).unwrap().rows.is_empty());
    }

    #[test]
    fn malformed_tag_pairs_are_parse_errors() {
        assert!(FilterSpec::parse("-t env").is_err());
        assert!(FilterSpec::parse("-t =prod").is_err());
        assert!(FilterSpec::parse("-t env=").is_err());
        assert!(FilterSpec::parse("-f ").is_err());
    }

    #[test]
    fn fuzzy_subsequence_credits_characters_found_in_order() {
        // v and a are found in order, b never appears and is skipped
        assert_eq!(fuzzy_score("vm-alpha", "vab"), Some(10));
        assert_eq!(fuzzy_score("vm-alpha", "xyz"), None);
        // exact substring, earlier and longer is better
        assert_eq!(fuzzy_score("vm-alpha", "alpha"), Some(1000 - 30 + 5));
        assert!(fuzzy_score("vm-alpha", "alpha") > fuzzy_score("xx-vm-alpha", "alpha"));
    }

    #[test]
    fn fuzzy_vab_matches_vm_alpha_by_subsequence() {
        let view = vm_view();
        let spec = FilterSpec::parse("-f vab").unwrap().unwrap();
        let filtered = apply(&view, &spec).unwrap();
        assert!(filtered.rows.iter().any(|row| row.id == "vm-alpha"));
    }

    #[test]
    fn fuzzy_ranks_exact_substring_above_subsequence() {
        let view = vm_view();
        let spec = FilterSpec::parse("-f eta").unwrap().unwrap();
        let filtered = apply(&view, &spec).unwrap();
        let names: Vec<&str> = filtered.rows.iter().map(|r| r.id.as_str()).collect();
        // vm-beta and vm-zeta contain "eta" exactly; vm-alpha only earns
        // partial subsequence credit and ranks last.
        assert_eq!(names, vec!["vm-beta", "vm-zeta", "vm-alpha"]);
    }

    #[test]
    fn fuzzy_sort_is_stable_on_ties() {
        let view = vm_view();
        let spec = FilterSpec::Fuzzy("vm".to_string());
        let filtered = apply(&view, &spec).unwrap();
        let names: Vec<&str> = filtered.rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(names, vec!["vm-alpha", "vm-beta", "vm-zeta"]);
    }
}
