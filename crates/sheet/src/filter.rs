use indexmap::IndexSet;
use std::fmt;

/// Ordered set of header names to keep.
///
/// An empty filter retains every column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFilter {
    names: IndexSet<String>,
}

impl ColumnFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ColumnFilter {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated list of names, ignoring empty entries.
    pub fn parse(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Whether a column with this header survives the filter.
    pub fn retain(&self, header: &str) -> bool {
        self.names.is_empty() || self.names.contains(header)
    }

    /// Map each column index to its output position, `None` for dropped columns.
    pub fn positions(&self, headers: &[String]) -> Vec<Option<usize>> {
        let mut next = 0;
        headers
            .iter()
            .map(|header| {
                self.retain(header).then(|| {
                    next += 1;
                    next - 1
                })
            })
            .collect()
    }

    /// Headers kept by the filter, in their original order.
    pub fn apply(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .filter(|header| self.retain(header))
            .cloned()
            .collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnFilter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for ColumnFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quoted: Vec<String> = self.names.iter().map(|n| format!("'{n}'")).collect();
        write!(f, "{}", quoted.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_empty_filter_retains_everything() {
        let filter = ColumnFilter::default();
        assert!(filter.retain("anything"));
        assert_eq!(
            filter.positions(&headers(&["a", "b"])),
            vec![Some(0), Some(1)]
        );
    }

    #[test]
    fn test_positions_skip_dropped_columns() {
        let filter = ColumnFilter::new(["Name", "Birthdate"]);
        let hs = headers(&["Name", "Age", "Birthdate"]);
        assert_eq!(filter.positions(&hs), vec![Some(0), None, Some(1)]);
        assert_eq!(filter.apply(&hs), headers(&["Name", "Birthdate"]));
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let filter = ColumnFilter::new(["name"]);
        assert!(!filter.retain("Name"));
    }

    #[test]
    fn test_parse_and_display() {
        let filter = ColumnFilter::parse("Name, Age,,");
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.to_string(), "'Name', 'Age'");
    }
}
