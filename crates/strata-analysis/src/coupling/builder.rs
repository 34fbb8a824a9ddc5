//! Builds the module graph from per-file facts.
//!
//! Files are grouped into modules by granularity, one node per module, then
//! one edge per surviving import. External, unresolved and self imports are
//! dropped without error.

use strata_core::config::Granularity;
use strata_core::types::collections::{FxHashMap, FxHashSet};

use super::facts::{parent_dir, FileFacts, ImportFact, ImportResolver};
use super::graph::{DependencyEdge, ModuleExport, ModuleGraph, ModuleNode};

/// Counters describing what the builder kept and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub files: usize,
    pub modules: usize,
    pub edges: usize,
    pub external_imports: usize,
    pub self_imports: usize,
    pub skipped_files: usize,
}

/// Imports of one file that produced no edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DroppedImports {
    self_imports: usize,
    external: usize,
}

/// The graph plus the file → module assignment it was built from.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub graph: ModuleGraph,
    pub file_to_module: FxHashMap<String, String>,
    pub stats: BuildStats,
    dropped: FxHashMap<String, DroppedImports>,
}

/// Assigns files to modules at a fixed granularity.
#[derive(Debug, Clone)]
pub struct ModuleAssigner {
    granularity: Granularity,
    manifests: FxHashSet<String>,
    package_roots: FxHashSet<String>,
}

impl ModuleAssigner {
    pub fn new(granularity: Granularity, manifests: &[String]) -> Self {
        Self {
            granularity,
            manifests: manifests.iter().cloned().collect(),
            package_roots: FxHashSet::default(),
        }
    }

    /// Register package roots: explicit ones plus, under package granularity,
    /// the directory of every manifest present in `files`. Manifests stay
    /// ordinary module members.
    pub fn with_package_roots<'a, I>(mut self, roots: I, files: &[FileFacts]) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.package_roots.extend(roots.into_iter().map(|r| r.trim_end_matches('/').to_string()));
        if self.granularity != Granularity::Package {
            return self;
        }
        for file in files {
            if self.is_manifest(&file.file_path) {
                self.package_roots.insert(parent_dir(&file.file_path).to_string());
            }
        }
        self
    }

    pub fn is_manifest(&self, path: &str) -> bool {
        let name = path.rsplit('/').next().unwrap_or(path);
        self.manifests.contains(name)
    }

    /// Module path for `file`, or `None` if the path cannot belong to one.
    pub fn module_for(&self, file: &str) -> Option<String> {
        if file.is_empty() || file.ends_with('/') {
            return None;
        }
        match self.granularity {
            Granularity::File => Some(file.to_string()),
            Granularity::Directory => Some(directory_module(file)),
            Granularity::Package => {
                let mut dir = parent_dir(file);
                loop {
                    if self.package_roots.contains(dir) {
                        return Some(if dir.is_empty() { ".".to_string() } else { dir.to_string() });
                    }
                    if dir.is_empty() {
                        break;
                    }
                    dir = parent_dir(dir);
                }
                Some(directory_module(file))
            }
        }
    }
}

fn directory_module(file: &str) -> String {
    let dir = parent_dir(file);
    if dir.is_empty() {
        ".".to_string()
    } else {
        dir.to_string()
    }
}

pub struct GraphBuilder<'r> {
    assigner: ModuleAssigner,
    resolver: &'r dyn ImportResolver,
}

impl<'r> GraphBuilder<'r> {
    pub fn new(assigner: ModuleAssigner, resolver: &'r dyn ImportResolver) -> Self {
        Self { assigner, resolver }
    }

    pub fn assigner(&self) -> &ModuleAssigner {
        &self.assigner
    }

    /// Build the graph in O(files + imports).
    pub fn build(&self, files: &[FileFacts]) -> BuildOutput {
        let mut out = BuildOutput::default();
        out.stats.files = files.len();

        let mut grouped: FxHashMap<String, Vec<&FileFacts>> = FxHashMap::default();
        for file in files {
            match self.assigner.module_for(&file.file_path) {
                Some(module) => {
                    out.file_to_module.insert(file.file_path.clone(), module.clone());
                    grouped.entry(module).or_default().push(file);
                }
                None => {
                    out.stats.skipped_files += 1;
                    tracing::warn!(file = %file.file_path, "file belongs to no module, skipping");
                }
            }
        }

        let mut module_paths: Vec<&String> = grouped.keys().collect();
        module_paths.sort();
        for path in module_paths {
            out.graph.add_module(module_node(path, &grouped[path]));
        }

        let mut sources: Vec<&FileFacts> = grouped.values().flatten().copied().collect();
        sources.sort_by(|a, b| a.file_path.cmp(&b.file_path));
        for file in sources {
            self.add_file_edges(&mut out, file);
        }

        out.stats.modules = out.graph.module_count();
        out.stats.edges = out.graph.edge_count();
        tracing::debug!(
            files = out.stats.files,
            modules = out.stats.modules,
            edges = out.stats.edges,
            external = out.stats.external_imports,
            skipped = out.stats.skipped_files,
            "built module graph"
        );
        out
    }

    /// Add the edges for one file's imports. Used by the full build and by
    /// the incremental coordinator when a module is rewired. The file's
    /// previous self/external tallies are replaced, not added to.
    pub fn add_file_edges(&self, out: &mut BuildOutput, file: &FileFacts) {
        let Some(source_module) = out.file_to_module.get(&file.file_path) else {
            return;
        };
        let Some(source) = out.graph.index_of(source_module) else {
            return;
        };
        let mut dropped = DroppedImports::default();
        for import in &file.imports {
            match self.target_module(&out.file_to_module, import, &file.file_path) {
                Some(target_module) if target_module == source_module => {
                    dropped.self_imports += 1;
                }
                Some(target_module) => {
                    if let Some(target) = out.graph.index_of(target_module) {
                        out.graph.add_edge(source, target, edge_for(import, &file.file_path));
                    } else {
                        dropped.external += 1;
                    }
                }
                None => dropped.external += 1,
            }
        }

        let previous = out.dropped.insert(file.file_path.clone(), dropped).unwrap_or_default();
        out.stats.self_imports = out.stats.self_imports - previous.self_imports + dropped.self_imports;
        out.stats.external_imports = out.stats.external_imports - previous.external + dropped.external;
    }

    fn target_module<'m>(
        &self,
        file_to_module: &'m FxHashMap<String, String>,
        import: &ImportFact,
        from_file: &str,
    ) -> Option<&'m String> {
        let resolved = match &import.resolved_path {
            Some(path) => Some(path.clone()),
            None => self.resolver.resolve(&import.specifier, from_file),
        }?;
        file_to_module.get(&resolved)
    }
}

/// Aggregate a module's files into one node.
pub fn module_node(path: &str, files: &[&FileFacts]) -> ModuleNode {
    let mut sorted: Vec<&FileFacts> = files.to_vec();
    sorted.sort_by(|a, b| a.file_path.cmp(&b.file_path));

    let mut node = ModuleNode::new(path);
    let mut languages: FxHashMap<&str, usize> = FxHashMap::default();
    for file in &sorted {
        node.files.push(file.file_path.clone());
        node.file_hashes.push(file.content_hash);
        if let Some(lang) = &file.language {
            *languages.entry(lang.as_str()).or_default() += 1;
        }
        for export in &file.exports {
            node.exports.push(ModuleExport {
                name: export.name.clone(),
                kind: export.kind,
                file: file.file_path.clone(),
                line: export.line,
                is_default: export.is_default,
                is_type_only: export.is_type_only,
            });
        }
    }
    // Most common language, ties broken by name.
    node.language = languages
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(lang, _)| lang.to_string());
    node
}

fn edge_for(import: &ImportFact, file: &str) -> DependencyEdge {
    DependencyEdge {
        symbols: import.symbols.clone(),
        is_type_only: import.is_type_only,
        file: file.to_string(),
        line: import.line,
    }
}
