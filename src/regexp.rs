//! Opaque regular-expression matcher.
//!
//! Patterns use ECMAScript syntax via the `regress` engine. The interpreter
//! treats this module as a black box: validate at lex time, match at run
//! time. Supported flags are `g i m y`; `g` and `y` are implemented here
//! through the caller-supplied start offset, `i` and `m` are passed to the
//! engine.

use regress::Regex;

/// Validate a pattern against the engine's grammar. Returns the engine's
/// message on failure.
pub fn validate(pattern: &str) -> Result<(), String> {
    Regex::new(pattern).map(|_| ()).map_err(|e| e.to_string())
}

/// Check a flag string: any of `g i m y`, each at most meaningful once.
pub fn invalid_flag(flags: &str) -> Option<char> {
    flags.chars().find(|c| !matches!(c, 'g' | 'i' | 'm' | 'y'))
}

/// One successful match: byte offsets of the whole match plus the capture
/// groups (group 0 is the whole match).
#[derive(Debug, Clone)]
pub struct RegExpMatch {
    pub start: usize,
    pub end: usize,
    pub groups: Vec<Option<String>>,
}

/// A compiled pattern.
pub struct ScriptRegExp {
    regex: Regex,
}

impl ScriptRegExp {
    /// Compile `source` with the engine-relevant subset of `flags`.
    pub fn compile(source: &str, flags: &str) -> Result<ScriptRegExp, String> {
        let engine_flags: String = flags.chars().filter(|c| matches!(c, 'i' | 'm')).collect();
        let regex = Regex::with_flags(source, engine_flags.as_str()).map_err(|e| e.to_string())?;
        Ok(ScriptRegExp { regex })
    }

    /// Search `input` from byte offset `start`. With `sticky` the match must
    /// begin exactly at `start`.
    pub fn exec(&self, input: &str, start: usize, sticky: bool) -> Option<RegExpMatch> {
        if start > input.len() {
            return None;
        }
        let found = self.regex.find_from(input, start).next()?;
        if sticky && found.start() != start {
            return None;
        }
        let mut groups = Vec::with_capacity(found.captures.len() + 1);
        groups.push(Some(input[found.range()].to_string()));
        for capture in &found.captures {
            groups.push(capture.clone().map(|range| input[range].to_string()));
        }
        Some(RegExpMatch {
            start: found.start(),
            end: found.end(),
            groups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(validate("a+b*").is_ok());
        assert!(validate("(unclosed").is_err());
    }

    #[test]
    fn test_invalid_flag() {
        assert_eq!(invalid_flag("gim"), None);
        assert_eq!(invalid_flag("gx"), Some('x'));
    }

    #[test]
    fn test_exec_groups() {
        let re = ScriptRegExp::compile("(a)(b)?", "").unwrap();
        let m = re.exec("xab", 0, false).unwrap_or_else(|| panic!("no match"));
        assert_eq!(m.start, 1);
        assert_eq!(m.groups[0].as_deref(), Some("ab"));
        assert_eq!(m.groups[1].as_deref(), Some("a"));
        assert_eq!(m.groups[2].as_deref(), Some("b"));
    }

    #[test]
    fn test_sticky_requires_anchor() {
        let re = ScriptRegExp::compile("b", "").unwrap();
        assert!(re.exec("ab", 0, true).is_none());
        assert!(re.exec("ab", 1, true).is_some());
        assert!(re.exec("ab", 0, false).is_some());
    }

    #[test]
    fn test_case_insensitive_flag() {
        let re = ScriptRegExp::compile("abc", "i").unwrap();
        assert!(re.exec("xABC", 0, false).is_some());
    }
}
