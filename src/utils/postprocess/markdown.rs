use regex::Regex;
use lazy_static::lazy_static;

lazy_static! {
    /// A whole line that starts with one or more `#` followed by a space, with its line break if it has one.
    static ref HEADING_LINE_RE: Regex = Regex::new(r"(?m)^#+ [^\n]*(\n|\z)").unwrap();
}

/// Removes every markdown heading line (`# abc`, `## abc`, ...).
///
/// A heading on the last line is removed even without a trailing line break. Removing a line never turns another line
/// into a heading, which makes this idempotent.
///
/// ```
/// use storymaker::utils::postprocess::markdown::strip_headings;
/// assert_eq!("Body\nMore\n", strip_headings("# Title\nBody\n## Sub\nMore\n"));
/// ```
pub fn strip_headings(story: &str) -> String {
    HEADING_LINE_RE.replace_all(story, "").into_owned()
}
