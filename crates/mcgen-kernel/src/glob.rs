//! Filename glob matching for locating job artifacts.
//!
//! Supports the usual shell forms:
//! - `*` matches zero or more characters
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]`, `[!abc]` / `[^abc]` character classes
//! - `{a,b,c}` brace alternatives, nested or repeated
//!
//! Matching is against a single file name, so `/` has no special meaning.

/// Match a file name against a glob pattern.
///
/// ```
/// use mcgen_kernel::glob::glob_match;
///
/// assert!(glob_match("*.yoda", "Rivet.yoda"));
/// assert!(glob_match("pt_[0-9]*.{yoda,root}", "pt_20_40.root"));
/// assert!(!glob_match("*.yoda", "Rivet.yoda.gz"));
/// ```
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let name: Vec<char> = name.chars().collect();
    expand_braces(pattern).iter().any(|pat| {
        let pat: Vec<char> = pat.chars().collect();
        match_chars(&pat, &name)
    })
}

/// Expand the brace groups of a pattern into plain glob patterns.
///
/// A group without a top-level comma, or without a closing brace, is kept
/// literally; groups after it are still expanded.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut from = 0;

    loop {
        let Some(open) = chars[from..].iter().position(|&c| c == '{').map(|i| from + i) else {
            return vec![pattern.to_string()];
        };

        let mut depth = 0usize;
        let mut close = None;
        let mut commas = Vec::new();
        for (i, &c) in chars.iter().enumerate().skip(open) {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(i);
                        break;
                    }
                }
                ',' if depth == 1 => commas.push(i),
                _ => {}
            }
        }

        let Some(close) = close else {
            return vec![pattern.to_string()];
        };
        if commas.is_empty() {
            // Literal group; look for alternatives inside and after it
            from = open + 1;
            continue;
        }

        let prefix: String = chars[..open].iter().collect();
        let suffix: String = chars[close + 1..].iter().collect();

        let mut bounds = vec![open];
        bounds.extend(&commas);
        bounds.push(close);

        return bounds
            .windows(2)
            .flat_map(|w| {
                let alternative: String = chars[w[0] + 1..w[1]].iter().collect();
                expand_braces(&format!("{}{}{}", prefix, alternative, suffix))
            })
            .collect();
    }
}

/// Iterative wildcard match, backtracking only to the most recent `*`.
fn match_chars(pat: &[char], text: &[char]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pat.len() {
            if pat[p] == '*' {
                star = Some((p + 1, t));
                p += 1;
                continue;
            }
            if let Some(next) = match_single(pat, p, text[t]) {
                p = next;
                t += 1;
                continue;
            }
        }

        match star {
            Some((star_p, star_t)) => {
                p = star_p;
                t = star_t + 1;
                star = Some((star_p, star_t + 1));
            }
            None => return false,
        }
    }

    pat[p..].iter().all(|&c| c == '*')
}

/// If the pattern element at `p` matches `ch`, the index after it.
fn match_single(pat: &[char], p: usize, ch: char) -> Option<usize> {
    match pat[p] {
        '?' => Some(p + 1),
        '[' => match match_class(pat, p, ch) {
            Some((true, next)) => Some(next),
            Some((false, _)) => None,
            // Unterminated class: a literal '['
            None => (ch == '[').then_some(p + 1),
        },
        c => (c == ch).then_some(p + 1),
    }
}

/// Evaluate the class starting at `start`. Returns whether `ch` is in it
/// and the index after the closing `]`, or `None` if it never closes.
fn match_class(pat: &[char], start: usize, ch: char) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negated = matches!(pat.get(i), Some('!' | '^'));
    if negated {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;
    while i < pat.len() {
        let c = pat[i];
        if c == ']' && !first {
            return Some((matched != negated, i + 1));
        }
        first = false;

        if i + 2 < pat.len() && pat[i + 1] == '-' && pat[i + 2] != ']' {
            if c <= ch && ch <= pat[i + 2] {
                matched = true;
            }
            i += 3;
        } else {
            if c == ch {
                matched = true;
            }
            i += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*.yoda", "out.yoda", true)]
    #[case("*.yoda", "out.yoda.gz", false)]
    #[case("*", "", true)]
    #[case("", "", true)]
    #[case("", "a", false)]
    #[case("run_?.log", "run_7.log", true)]
    #[case("run_?.log", "run_17.log", false)]
    #[case("*pt*_*.yoda", "Rivet_pt20_40.yoda", true)]
    #[case("a*b*c", "aXXbYYbZc", true)]
    #[case("a*b*c", "aXXbYY", false)]
    #[case("[abc]x", "bx", true)]
    #[case("[!abc]x", "bx", false)]
    #[case("[^abc]x", "dx", true)]
    #[case("bin_[0-9].dat", "bin_5.dat", true)]
    #[case("bin_[0-9].dat", "bin_x.dat", false)]
    #[case("[]]", "]", true)]
    #[case("[a-]", "-", true)]
    #[case("x[y", "x[y", true)]
    #[case("*.{yoda,root}", "h.root", true)]
    #[case("*.{yoda,root}", "h.hepmc", false)]
    #[case("{a,b{c,d}}.txt", "bd.txt", true)]
    #[case("{a}.txt", "{a}.txt", true)]
    #[case("{a}x{b,c}", "{a}xb", true)]
    #[case("{a}x{b,c}", "{a}xd", false)]
    fn test_glob_match(#[case] pattern: &str, #[case] name: &str, #[case] expected: bool) {
        assert_eq!(glob_match(pattern, name), expected, "{} vs {}", pattern, name);
    }

    #[test]
    fn test_expand_braces() {
        assert_eq!(expand_braces("plain"), vec!["plain"]);
        assert_eq!(expand_braces("{a,b}.{x,y}"), vec!["a.x", "a.y", "b.x", "b.y"]);
        assert_eq!(expand_braces("p{1,{2,3}}"), vec!["p1", "p2", "p3"]);
        assert_eq!(expand_braces("open{a,b"), vec!["open{a,b"]);
        assert_eq!(expand_braces("{a}x{b,c}"), vec!["{a}xb", "{a}xc"]);
        assert_eq!(expand_braces("{x{a,b}}"), vec!["{xa}", "{xb}"]);
    }
}
