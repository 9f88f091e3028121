//! The rendering capability shared by every SQL fragment.

use crate::value::SqlValue;

/// A fragment that renders to SQL text plus its bound values.
///
/// Implementors must return values in exactly the order their `?`
/// placeholders appear in [`Sqlifiable::to_sql`].
pub trait Sqlifiable {
    /// Renders the fragment. An empty string means "omit this fragment".
    fn to_sql(&self) -> String;

    /// Returns the values bound to the rendered placeholders.
    fn values(&self) -> Vec<SqlValue>;

    /// Renders SQL and values together.
    fn build(&self) -> (String, Vec<SqlValue>) {
        (self.to_sql(), self.values())
    }
}
