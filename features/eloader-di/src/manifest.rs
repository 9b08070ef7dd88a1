//! Dependency name extraction
//!
//! A unit names its dependencies through an explicit [`Manifest`]. Units
//! without one fall back to [`infer_parameters`], a best-effort parser over
//! the source text of the entry point's parameter list.

use once_cell::sync::Lazy;
use regex::Regex;

/// Line and block comments
static COMMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(//.*$)|(/\*[\s\S]*?\*/)").expect("valid comment pattern"));

/// Explicit, ordered list of dependency names of a unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Manifest {
    /// Names used verbatim
    List(Vec<String>),
    /// Names separated by whitespace and/or commas, e.g. `"db, logger"`
    Delimited(String),
}

impl Manifest {
    pub fn list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Manifest::List(names.into_iter().map(Into::into).collect())
    }

    pub fn delimited(names: impl Into<String>) -> Self {
        Manifest::Delimited(names.into())
    }

    /// The dependency names, in declaration order
    pub fn names(&self) -> Vec<String> {
        match self {
            Manifest::List(names) => names.clone(),
            Manifest::Delimited(text) => text
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Manifest::List(names) => names.is_empty(),
            Manifest::Delimited(text) => text.trim().is_empty(),
        }
    }
}

/// Returns the ordered dependency names of an entry point
///
/// A non-empty manifest wins. Otherwise the names are inferred from the
/// entry point's signature, and a unit with neither has no dependencies.
pub fn extract(manifest: Option<&Manifest>, signature: Option<&str>) -> Vec<String> {
    if let Some(manifest) = manifest.filter(|manifest| !manifest.is_empty()) {
        return manifest.names();
    }

    match signature {
        Some(signature) => infer_parameters(signature),
        None => Vec::new(),
    }
}

/// Best-effort parameter name inference
///
/// Strips comments, takes the text between the first `(` and its matching
/// `)` and yields one identifier per top-level comma separated parameter.
/// Type annotations and default values are dropped, as are binding
/// modifiers such as `mut`: `fn main(mut db: Db, log = x)` gives
/// `["db", "log"]`. Commas and parentheses nested in `()`, `<>` or `[]`
/// belong to a parameter's type.
pub fn infer_parameters(source: &str) -> Vec<String> {
    let stripped = COMMENTS.replace_all(source, "");

    let Some(open) = stripped.find('(') else {
        return Vec::new();
    };

    let mut params = Vec::new();
    let mut depth = 0_usize;
    let mut start = open + 1;
    let mut previous = '(';
    for (index, c) in stripped[open + 1..].char_indices() {
        let index = index + open + 1;
        match c {
            '(' | '<' | '[' => depth += 1,
            // `->` and `=>` are arrows, not closing brackets
            '>' if matches!(previous, '-' | '=') => {}
            ')' if depth == 0 => {
                params.push(&stripped[start..index]);
                start = stripped.len();
                break;
            }
            ')' | '>' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                params.push(&stripped[start..index]);
                start = index + 1;
            }
            _ => {}
        }
        previous = c;
    }
    // Unterminated parameter list
    if start < stripped.len() {
        params.push(&stripped[start..]);
    }

    params
        .into_iter()
        .filter_map(|param| {
            let binding = param.split([':', '=']).next().unwrap_or_default();
            binding.split_whitespace().last()
        })
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_is_used_verbatim() {
        let manifest = Manifest::list(["a", "b"]);

        let names = extract(Some(&manifest), Some("fn main(x: X, y: Y)"));

        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn delimited_manifest_splits_on_whitespace_and_commas() {
        let manifest = Manifest::delimited(" db,logger  cache ,, mailer");

        assert_eq!(manifest.names(), vec!["db", "logger", "cache", "mailer"]);
    }

    #[test]
    fn empty_manifest_falls_back_to_inference() {
        let manifest = Manifest::List(vec![]);

        let names = extract(Some(&manifest), Some("function (db, log) {}"));

        assert_eq!(names, vec!["db", "log"]);
    }

    #[test]
    fn infers_rust_style_parameters() {
        let names = infer_parameters("fn main(mut db: Arc<Db>, logger: Logger) -> bool");

        assert_eq!(names, vec!["db", "logger"]);
    }

    #[test]
    fn commas_inside_types_do_not_split_parameters() {
        let names = infer_parameters("fn main(db: HashMap<String, u8>, log: Log)");

        assert_eq!(names, vec!["db", "log"]);
    }

    #[test]
    fn nested_parentheses_do_not_end_the_parameter_list() {
        let names = infer_parameters("fn main(f: fn(u8) -> u8, db: Db, pair: (A, [B; 2]))");

        assert_eq!(names, vec!["f", "db", "pair"]);
    }

    #[test]
    fn comments_in_parameter_list_are_ignored() {
        let source = "function (a /* first, second */, // trailing, c\n b) {}";

        assert_eq!(infer_parameters(source), vec!["a", "b"]);
    }

    #[test]
    fn zero_parameters_yield_nothing() {
        assert!(infer_parameters("fn main() {}").is_empty());
        assert!(infer_parameters("function ( ) {}").is_empty());
        assert!(infer_parameters("no parens at all").is_empty());
        assert!(extract(None, None).is_empty());
    }
}
