//! Per-file input facts and import resolution.
//!
//! The parsing front end produces one [`FileFacts`] per source file. Import
//! specifiers are turned into file paths by an [`ImportResolver`]; anything it
//! cannot resolve is external and never becomes an edge.

use serde::{Deserialize, Serialize};
use strata_core::types::collections::{FxHashSet, SymbolList};
use xxhash_rust::xxh3::xxh3_64;

/// Parse facts for one source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileFacts {
    /// Forward-slash path relative to the project root.
    pub file_path: String,
    pub language: Option<String>,
    pub imports: Vec<ImportFact>,
    pub exports: Vec<ExportFact>,
    pub content_hash: u64,
}

impl FileFacts {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            language: None,
            imports: Vec::new(),
            exports: Vec::new(),
            content_hash: 0,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_import(mut self, import: ImportFact) -> Self {
        self.imports.push(import);
        self
    }

    pub fn with_export(mut self, export: ExportFact) -> Self {
        self.exports.push(export);
        self
    }

    pub fn with_hash(mut self, content_hash: u64) -> Self {
        self.content_hash = content_hash;
        self
    }
}

/// Content hash used for change tracking.
pub fn hash_content(content: &[u8]) -> u64 {
    xxh3_64(content)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportFact {
    /// Specifier as written, e.g. `./util` or `react`.
    pub specifier: String,
    /// Set when the front end already resolved the target file.
    pub resolved_path: Option<String>,
    /// Imported names. `default` for default imports, `*` for namespace imports.
    pub symbols: SymbolList,
    pub is_type_only: bool,
    pub line: u32,
}

impl ImportFact {
    pub fn new(specifier: impl Into<String>, symbols: &[&str]) -> Self {
        Self {
            specifier: specifier.into(),
            resolved_path: None,
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            is_type_only: false,
            line: 1,
        }
    }

    pub fn resolved(mut self, path: impl Into<String>) -> Self {
        self.resolved_path = Some(path.into());
        self
    }

    pub fn type_only(mut self) -> Self {
        self.is_type_only = true;
        self
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Function,
    Class,
    AbstractClass,
    Interface,
    TypeAlias,
    Trait,
    Enum,
    Constant,
    Variable,
    Other,
}

impl ExportKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::AbstractClass => "abstract_class",
            Self::Interface => "interface",
            Self::TypeAlias => "type_alias",
            Self::Trait => "trait",
            Self::Enum => "enum",
            Self::Constant => "constant",
            Self::Variable => "variable",
            Self::Other => "other",
        }
    }

    pub fn is_abstract(&self) -> bool {
        matches!(
            self,
            Self::AbstractClass | Self::Interface | Self::TypeAlias | Self::Trait
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportFact {
    pub name: String,
    pub kind: ExportKind,
    pub line: u32,
    pub is_default: bool,
    pub is_type_only: bool,
}

impl ExportFact {
    pub fn new(name: impl Into<String>, kind: ExportKind) -> Self {
        Self {
            name: name.into(),
            kind,
            line: 1,
            is_default: false,
            is_type_only: false,
        }
    }

    pub fn default_export(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn type_only(mut self) -> Self {
        self.is_type_only = true;
        self
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = line;
        self
    }

    /// Type-only exports count as abstract whatever their kind.
    pub fn is_abstract(&self) -> bool {
        self.is_type_only || self.kind.is_abstract()
    }
}

/// Maps an import specifier written in `from_file` to a project file path.
/// `None` means external; the import is dropped.
pub trait ImportResolver {
    fn resolve(&self, specifier: &str, from_file: &str) -> Option<String>;
}

impl<F> ImportResolver for F
where
    F: Fn(&str, &str) -> Option<String>,
{
    fn resolve(&self, specifier: &str, from_file: &str) -> Option<String> {
        self(specifier, from_file)
    }
}

/// Extensions tried when a relative specifier omits one.
const CANDIDATE_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "rs", "go", "java", "kt", "cs", "rb", "php",
];

/// Resolves `./` and `../` specifiers against a known file set, trying
/// extensions and `index.*` files. Bare specifiers are external.
#[derive(Debug, Clone, Default)]
pub struct RelativePathResolver {
    known: FxHashSet<String>,
}

impl RelativePathResolver {
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: files.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_facts(files: &[FileFacts]) -> Self {
        Self::new(files.iter().map(|f| f.file_path.clone()))
    }
}

impl ImportResolver for RelativePathResolver {
    fn resolve(&self, specifier: &str, from_file: &str) -> Option<String> {
        if !specifier.starts_with("./") && !specifier.starts_with("../") && specifier != "." && specifier != ".." {
            return None;
        }
        let base = parent_dir(from_file);
        let joined = if base.is_empty() {
            specifier.to_string()
        } else {
            format!("{base}/{specifier}")
        };
        let candidate = normalize_path(&joined)?;

        if self.known.contains(&candidate) {
            return Some(candidate);
        }
        for ext in CANDIDATE_EXTENSIONS {
            let with_ext = format!("{candidate}.{ext}");
            if self.known.contains(&with_ext) {
                return Some(with_ext);
            }
        }
        for ext in CANDIDATE_EXTENSIONS {
            let index = if candidate.is_empty() {
                format!("index.{ext}")
            } else {
                format!("{candidate}/index.{ext}")
            };
            if self.known.contains(&index) {
                return Some(index);
            }
        }
        None
    }
}

/// Directory part of a forward-slash path; empty for root-level files.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Collapses `.` and `..` segments. Returns `None` when `..` escapes the root.
pub fn normalize_path(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_hash_tracks_bytes() {
        let original = hash_content(b"export const a = 1;\n");
        assert_eq!(original, hash_content(b"export const a = 1;\n"));
        assert_ne!(original, hash_content(b"export const a = 2;\n"));
        let facts = FileFacts::new("a.ts").with_hash(original);
        assert_eq!(facts.content_hash, original);
    }

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(normalize_path("src/a/../b/./c.ts").as_deref(), Some("src/b/c.ts"));
        assert_eq!(normalize_path("../outside"), None);
    }

    #[test]
    fn relative_resolver_tries_extensions_and_index() {
        let resolver = RelativePathResolver::new([
            "src/app.ts",
            "src/util/index.ts",
            "src/lib/math.js",
        ]);
        assert_eq!(
            resolver.resolve("./util", "src/app.ts").as_deref(),
            Some("src/util/index.ts")
        );
        assert_eq!(
            resolver.resolve("../lib/math", "src/util/index.ts").as_deref(),
            Some("src/lib/math.js")
        );
        assert_eq!(resolver.resolve("react", "src/app.ts"), None);
        assert_eq!(resolver.resolve("./missing", "src/app.ts"), None);
    }

    #[test]
    fn closures_are_resolvers() {
        let resolver = |spec: &str, _from: &str| -> Option<String> {
            spec.strip_prefix("@/").map(|rest| format!("src/{rest}.ts"))
        };
        assert_eq!(
            ImportResolver::resolve(&resolver, "@/db", "src/app.ts").as_deref(),
            Some("src/db.ts")
        );
    }

    #[test]
    fn type_only_exports_are_abstract() {
        assert!(ExportFact::new("Props", ExportKind::Constant).type_only().is_abstract());
        assert!(ExportFact::new("Repo", ExportKind::Interface).is_abstract());
        assert!(!ExportFact::new("run", ExportKind::Function).is_abstract());
    }
}
