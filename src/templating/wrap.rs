//! JSON aggregation boilerplate around query text.
//!
//! PostgreSQL can fold a result set into a single JSON value. These wrappers
//! produce that SQL around an inner query:
//!
//! - [`WrapKind::Object`] turns the first row into a JSON object, or `'{}'` when
//!   the query returns no rows.
//! - [`WrapKind::Array`] turns every row into an element of a JSON array, or
//!   `'[]'` when the query returns no rows.
//!
//! Fragments are parenthesized sub-expressions meant to sit inside a larger
//! query. Statements are complete `SELECT`s meant to be the outermost query.
//! The text is fixed; downstream code relies on it byte for byte.

const OBJECT_AGGREGATE: &str = "COALESCE(row_to_json(object_row),'{}'::json)";
const ARRAY_AGGREGATE: &str = "COALESCE(array_to_json(array_agg(row_to_json(array_row))),'[]'::json)";

/// The two row aggregations a template can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapKind {
    /// Single row as a JSON object
    Object,
    /// All rows as a JSON array of objects
    Array,
}

impl WrapKind {
    /// Template keyword for this aggregation (`object` or `array`).
    pub const fn keyword(self) -> &'static str {
        match self {
            WrapKind::Object => "object",
            WrapKind::Array => "array",
        }
    }

    const fn aggregate(self) -> &'static str {
        match self {
            WrapKind::Object => OBJECT_AGGREGATE,
            WrapKind::Array => ARRAY_AGGREGATE,
        }
    }

    const fn alias(self) -> &'static str {
        match self {
            WrapKind::Object => "object_row",
            WrapKind::Array => "array_row",
        }
    }

    /// Text written before the inner query of a fragment.
    pub(crate) fn fragment_prefix(self) -> String {
        format!("(SELECT {} FROM (", self.aggregate())
    }

    /// Text written after the inner query of a fragment.
    pub(crate) fn fragment_suffix(self) -> String {
        format!("){})", self.alias())
    }

    /// Wrap `inner` as a parenthesized sub-expression.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pgjbuilder::templating::WrapKind;
    ///
    /// assert_eq!(
    ///     WrapKind::Object.wrap_fragment("SELECT 1"),
    ///     "(SELECT COALESCE(row_to_json(object_row),'{}'::json) FROM (SELECT 1)object_row)"
    /// );
    /// ```
    pub fn wrap_fragment(self, inner: &str) -> String {
        format!("{}{}{}", self.fragment_prefix(), inner, self.fragment_suffix())
    }

    /// Wrap `inner` as a complete top-level statement.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pgjbuilder::templating::WrapKind;
    ///
    /// assert_eq!(
    ///     WrapKind::Array.wrap_statement("SELECT 1"),
    ///     "SELECT COALESCE(array_to_json(array_agg(row_to_json(array_row))),'[]'::json)\nFROM (\nSELECT 1\n) array_row"
    /// );
    /// ```
    pub fn wrap_statement(self, inner: &str) -> String {
        format!("SELECT {}\nFROM (\n{}\n) {}", self.aggregate(), inner, self.alias())
    }
}

impl std::fmt::Display for WrapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}
