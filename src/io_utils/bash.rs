use std::borrow::Cow;

use itertools::Itertools;

const CHARS_NOT_NEEDING_QUOTING: &str = "_:.-+,/=@[]^";

/// Quote `s` for bash if it contains anything that bash would
/// interpret.
pub fn bash_string_literal(s: &str) -> Cow<'_, str> {
    if !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || CHARS_NOT_NEEDING_QUOTING.contains(c))
    {
        s.into()
    } else {
        let mut ss = String::new();
        ss.push('\'');
        for c in s.chars() {
            if c == '\'' {
                ss.push_str("'\\''");
            } else {
                ss.push(c);
            }
        }
        ss.push('\'');
        ss.into()
    }
}

/// For showing the commands we run in log messages, in a form that
/// can be copy-pasted into a shell.
pub fn bash_string_from_cmd(cmd: impl IntoIterator<Item = impl AsRef<str>>) -> String {
    cmd.into_iter()
        .map(|s| bash_string_literal(s.as_ref()).to_string())
        .join(" ")
}
