//! Shell command helpers: quoting, wrapping, and executable lookup.

use std::path::Path;

/// Quote `s` for safe inclusion in a POSIX shell command line.
pub fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | ':' | ','))
    {
        return s.to_string();
    }
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Wrap a command so its combined stdout/stderr lands in `log_path`.
///
/// The `;` before the closing brace terminates whatever the command ends
/// with, so multi-command lines are redirected as one group.
pub fn wrap_command(command: &str, log_path: &Path) -> String {
    format!(
        "{{ {} ; }} > {} 2>&1",
        command,
        shell_quote(&log_path.to_string_lossy())
    )
}

/// The program a command line starts with, if it can be checked statically.
///
/// Leading `NAME=value` assignments are skipped. Returns `None` when the
/// word is built from expansions, quoting, or `~`, and when an assignment
/// changes `PATH` for the command, since the shell would resolve it
/// differently than the caller can.
pub fn leading_program(command: &str) -> Option<&str> {
    let mut words = command.split_whitespace();
    let word = loop {
        let word = words.next()?;
        match assignment_name(word) {
            Some("PATH") => return None,
            Some(_) => continue,
            None => break word,
        }
    };

    is_plain_word(word).then_some(word)
}

/// A name or path made only of characters the shell takes literally.
fn is_plain_word(word: &str) -> bool {
    word.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | ':' | ',' | '@' | '%'))
}

fn assignment_name(word: &str) -> Option<&str> {
    let (name, _) = word.split_once('=')?;
    is_assignment(name).then_some(name)
}

fn is_assignment(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// True if `path` is a regular file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        path.metadata()
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain", "plain")]
    #[case("/tmp/run_0/1700000000000.log", "/tmp/run_0/1700000000000.log")]
    #[case("with space", "'with space'")]
    #[case("it's", r"'it'\''s'")]
    #[case("", "''")]
    fn test_shell_quote(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(shell_quote(input), expected);
    }

    #[test]
    fn test_wrap_command() {
        let wrapped = wrap_command("pythia8 main.cmnd", Path::new("/out/run_0/1.log"));
        assert_eq!(wrapped, "{ pythia8 main.cmnd ; } > /out/run_0/1.log 2>&1");
    }

    #[rstest]
    #[case("Sherpa -e 1000", Some("Sherpa"))]
    #[case("OMP_NUM_THREADS=1 SEED=4 ./run.sh", Some("./run.sh"))]
    #[case("cd sub && make", Some("cd"))]
    #[case("hash -r; true", Some("hash"))]
    #[case("$HOME/bin/gen", None)]
    #[case("~/gen.sh --seed 1", None)]
    #[case(r"\ls -l", None)]
    #[case("PATH=/opt/gen/bin:$PATH Sherpa", None)]
    #[case("LD_LIBRARY_PATH=/opt/lib Sherpa", Some("Sherpa"))]
    #[case("{ gen ; }", None)]
    #[case("   ", None)]
    fn test_leading_program(#[case] command: &str, #[case] expected: Option<&str>) {
        assert_eq!(leading_program(command), expected);
    }

    #[test]
    fn test_is_executable() {
        assert!(is_executable(Path::new("/bin/sh")));
        assert!(!is_executable(Path::new("/bin")));
        assert!(!is_executable(Path::new("/nonexistent/definitely_missing")));
    }
}
