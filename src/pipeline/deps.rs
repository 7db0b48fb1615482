//! Lexical dependency extraction.
//!
//! Picks a language from the file extension and runs that language's ordered
//! regex rules over the content. Every match contributes at most one token (its
//! last non-empty capture group). This is a heuristic scan, not a parser: it will
//! over- and under-report, and it never fails.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

/// Deduplicated dependency tokens found in one file.
pub type DependencySet = BTreeSet<String>;

/// Languages with dependency rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// PHP.
    Php,
    /// JavaScript and TypeScript (shared rules).
    JavaScript,
    /// Python.
    Python,
    /// Java.
    Java,
    /// C#.
    CSharp,
    /// Ruby.
    Ruby,
    /// SQL: recognised, but no rules.
    Sql,
}

const EXTENSIONS: &[(&str, Language)] = &[
    ("php", Language::Php),
    ("js", Language::JavaScript),
    ("mjs", Language::JavaScript),
    ("cjs", Language::JavaScript),
    ("jsx", Language::JavaScript),
    ("ts", Language::JavaScript),
    ("tsx", Language::JavaScript),
    ("py", Language::Python),
    ("java", Language::Java),
    ("cs", Language::CSharp),
    ("rb", Language::Ruby),
    ("sql", Language::Sql),
];

/// A regex rule; the last non-empty capture group of a match is its token.
type Rule = &'static str;

const PHP: &[Rule] = &[
    r#"require(?:_once)?\s*\(?['"](.+?)['"]\)?"#,
    r#"include(?:_once)?\s*\(?['"](.+?)['"]\)?"#,
    r"\buse\s+([\w\\]+)",
    r"\bnew\s+([A-Za-z_][\w\\]*)",
    r"([A-Za-z_]\w*)::",
];

const JAVASCRIPT: &[Rule] = &[
    r#"require\(\s*['"](.+?)['"]\s*\)"#,
    r#"import\s+.*?from\s+['"](.+?)['"]"#,
    r#"import\s+['"](.+?)['"]"#,
    r#"export\s+.*?from\s+['"](.+?)['"]"#,
];

// `from a import b` yields both `a` and `b`.
const PYTHON: &[Rule] = &[r"\bimport\s+([\w.]+)", r"\bfrom\s+([\w.]+)\s+import"];

// An `implements` clause is one token, e.g. `Runnable, Serializable`.
const JAVA: &[Rule] = &[
    r"\bimport\s+(?:static\s+)?([\w.]+(?:\.\*)?)\s*;",
    r"\bextends\s+([A-Za-z_]\w*)",
    r"\bimplements\s+([A-Za-z_][\w, ]*)",
];

const CSHARP: &[Rule] = &[
    r"\busing\s+([\w.]+)\s*;",
    r"\bnamespace\s+([\w.]+)",
    r":\s*([A-Za-z_]\w*)",
];

const RUBY: &[Rule] = &[
    r#"require(_relative)?\s+['"](.+?)['"]"#,
    r"\binclude\s+([A-Za-z_]\w*)",
    r"<\s*([A-Za-z_]\w*)",
];

impl Language {
    /// Selects a language from a file name's extension (case-insensitive).
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
        EXTENSIONS.iter().find(|(e, _)| *e == ext).map(|(_, lang)| *lang)
    }

    /// Short tag used in logs.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Php => "php",
            Self::JavaScript => "js",
            Self::Python => "python",
            Self::Java => "java",
            Self::CSharp => "csharp",
            Self::Ruby => "ruby",
            Self::Sql => "sql",
        }
    }

    fn rules(self) -> &'static [Rule] {
        match self {
            Self::Php => PHP,
            Self::JavaScript => JAVASCRIPT,
            Self::Python => PYTHON,
            Self::Java => JAVA,
            Self::CSharp => CSHARP,
            Self::Ruby => RUBY,
            Self::Sql => &[],
        }
    }

    fn compiled(self) -> &'static [Regex] {
        static PHP_RE: OnceLock<Vec<Regex>> = OnceLock::new();
        static JS_RE: OnceLock<Vec<Regex>> = OnceLock::new();
        static PY_RE: OnceLock<Vec<Regex>> = OnceLock::new();
        static JAVA_RE: OnceLock<Vec<Regex>> = OnceLock::new();
        static CS_RE: OnceLock<Vec<Regex>> = OnceLock::new();
        static RB_RE: OnceLock<Vec<Regex>> = OnceLock::new();
        static SQL_RE: OnceLock<Vec<Regex>> = OnceLock::new();

        let cell = match self {
            Self::Php => &PHP_RE,
            Self::JavaScript => &JS_RE,
            Self::Python => &PY_RE,
            Self::Java => &JAVA_RE,
            Self::CSharp => &CS_RE,
            Self::Ruby => &RB_RE,
            Self::Sql => &SQL_RE,
        };
        cell.get_or_init(|| {
            self.rules()
                .iter()
                .map(|pattern| Regex::new(pattern).expect("dependency rule must compile"))
                .collect()
        })
    }
}

/// Extracts likely import/include/inheritance tokens from `content`.
///
/// Unknown extensions yield an empty set.
#[must_use]
pub fn analyze(file_name: &str, content: &str) -> DependencySet {
    let Some(language) = Language::from_file_name(file_name) else {
        return DependencySet::new();
    };

    let mut deps = DependencySet::new();
    for regex in language.compiled() {
        for caps in regex.captures_iter(content) {
            let token = caps
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
                .last();
            if let Some(token) = token {
                deps.insert(token.to_string());
            }
        }
    }
    debug!(file_name, lang = language.tag(), deps = deps.len(), "dependencies extracted");
    deps
}
