//! Relational backend: SQLite queries over a staged edge table.
//!
//! Edges are staged as distinct (src, dst) pairs of node indices in a
//! private in-memory database. Counts are plain GROUP BY queries. Cycles are
//! approximated by a depth-bounded recursive CTE: two modules that reach
//! each other within `max_depth` steps share a component, so cycles longer
//! than the bound can be missed.

use std::sync::Mutex;

use petgraph::stable_graph::NodeIndex;
use rusqlite::{params, Connection};
use strata_core::errors::CouplingError;
use strata_core::types::collections::FxHashMap;

use super::{CouplingBackend, SccResult};
use crate::coupling::graph::ModuleGraph;
use crate::coupling::martin_metrics::CouplingCounts;
use crate::coupling::types::{BackendKind, CycleStatus};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS strata_edges (
        src INTEGER NOT NULL,
        dst INTEGER NOT NULL,
        PRIMARY KEY (src, dst)
    ) WITHOUT ROWID;
    CREATE INDEX IF NOT EXISTS idx_strata_edges_dst ON strata_edges(dst);
    CREATE TABLE IF NOT EXISTS strata_reach (
        origin INTEGER NOT NULL,
        node INTEGER NOT NULL,
        PRIMARY KEY (origin, node)
    ) WITHOUT ROWID;
";

fn backend_err(e: rusqlite::Error) -> CouplingError {
    CouplingError::Backend {
        message: e.to_string(),
    }
}

pub struct RelationalBackend {
    conn: Mutex<Connection>,
    max_depth: u32,
}

impl RelationalBackend {
    /// Open a private in-memory database for staging.
    pub fn open(max_depth: u32) -> Result<Self, CouplingError> {
        let conn = Connection::open_in_memory().map_err(|e| CouplingError::BackendUnavailable {
            backend: BackendKind::Relational.name().to_string(),
            message: e.to_string(),
        })?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| CouplingError::BackendUnavailable {
                backend: BackendKind::Relational.name().to_string(),
                message: format!("failed to create staging tables: {e}"),
            })?;
        Ok(Self {
            conn: Mutex::new(conn),
            max_depth,
        })
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    fn with_staged<T>(
        &self,
        graph: &ModuleGraph,
        f: impl FnOnce(&Connection) -> Result<T, CouplingError>,
    ) -> Result<T, CouplingError> {
        let mut conn = self.conn.lock().map_err(|e| CouplingError::Backend {
            message: format!("staging connection poisoned: {e}"),
        })?;
        let tx = conn.transaction().map_err(backend_err)?;
        tx.execute_batch("DELETE FROM strata_edges; DELETE FROM strata_reach;")
            .map_err(backend_err)?;
        {
            let mut insert = tx
                .prepare("INSERT OR IGNORE INTO strata_edges (src, dst) VALUES (?1, ?2)")
                .map_err(backend_err)?;
            for (src, dst) in graph.distinct_edge_pairs() {
                insert
                    .execute(params![src.index() as i64, dst.index() as i64])
                    .map_err(backend_err)?;
            }
        }
        let out = f(&tx)?;
        // Staging data is scratch; never keep it.
        tx.rollback().map_err(backend_err)?;
        Ok(out)
    }
}

impl CouplingBackend for RelationalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Relational
    }

    fn coupling_counts(&self, graph: &ModuleGraph) -> Result<CouplingCounts, CouplingError> {
        self.with_staged(graph, |conn| {
            let mut counts: CouplingCounts = graph.sorted_indices().into_iter().map(|idx| (idx, (0, 0))).collect();

            let mut stmt = conn
                .prepare("SELECT dst, COUNT(*) FROM strata_edges WHERE src != dst GROUP BY dst")
                .map_err(backend_err)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))
                .map_err(backend_err)?;
            for row in rows {
                let (node, ca) = row.map_err(backend_err)?;
                counts.entry(NodeIndex::new(node as usize)).or_default().0 = ca as u32;
            }

            let mut stmt = conn
                .prepare("SELECT src, COUNT(*) FROM strata_edges WHERE src != dst GROUP BY src")
                .map_err(backend_err)?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))
                .map_err(backend_err)?;
            for row in rows {
                let (node, ce) = row.map_err(backend_err)?;
                counts.entry(NodeIndex::new(node as usize)).or_default().1 = ce as u32;
            }

            Ok(counts)
        })
    }

    fn strongly_connected(&self, graph: &ModuleGraph) -> Result<SccResult, CouplingError> {
        let max_depth = self.max_depth;
        let components = self.with_staged(graph, |conn| {
            conn.execute(
                "WITH RECURSIVE reach(origin, node, depth) AS (
                     SELECT src, dst, 1 FROM strata_edges WHERE src != dst
                     UNION
                     SELECT r.origin, e.dst, r.depth + 1
                     FROM reach r
                     JOIN strata_edges e ON e.src = r.node
                     WHERE r.depth < ?1 AND e.src != e.dst AND e.dst != r.origin
                 )
                 INSERT OR IGNORE INTO strata_reach (origin, node)
                 SELECT DISTINCT origin, node FROM reach",
                params![max_depth],
            )
            .map_err(backend_err)?;

            let mut stmt = conn
                .prepare(
                    "SELECT a.origin, a.node FROM strata_reach a
                     JOIN strata_reach b ON b.origin = a.node AND b.node = a.origin
                     WHERE a.origin < a.node",
                )
                .map_err(backend_err)?;
            let pairs = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))
                .map_err(backend_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(backend_err)?;

            let mut stmt = conn
                .prepare("SELECT src FROM strata_edges WHERE src = dst")
                .map_err(backend_err)?;
            let self_loops = stmt
                .query_map([], |row| row.get::<_, i64>(0))
                .map_err(backend_err)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(backend_err)?;

            Ok(group_components(&pairs, &self_loops))
        })?;

        Ok(SccResult {
            components,
            status: CycleStatus::Approximate { max_depth },
        })
    }
}

/// Union mutually reachable pairs; self-loops outside any group stay singletons.
fn group_components(pairs: &[(i64, i64)], self_loops: &[i64]) -> Vec<Vec<NodeIndex>> {
    let mut parent: FxHashMap<i64, i64> = FxHashMap::default();

    fn find(parent: &mut FxHashMap<i64, i64>, x: i64) -> i64 {
        let mut root = x;
        while let Some(&p) = parent.get(&root) {
            if p == root {
                break;
            }
            root = p;
        }
        let mut cur = x;
        while cur != root {
            let next = parent.get(&cur).copied().unwrap_or(root);
            parent.insert(cur, root);
            cur = next;
        }
        root
    }

    for &(a, b) in pairs {
        parent.entry(a).or_insert(a);
        parent.entry(b).or_insert(b);
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        if ra != rb {
            parent.insert(ra.max(rb), ra.min(rb));
        }
    }
    for &n in self_loops {
        parent.entry(n).or_insert(n);
    }

    let nodes: Vec<i64> = parent.keys().copied().collect();
    let mut groups: FxHashMap<i64, Vec<NodeIndex>> = FxHashMap::default();
    for n in nodes {
        let root = find(&mut parent, n);
        groups.entry(root).or_default().push(NodeIndex::new(n as usize));
    }

    let mut components: Vec<Vec<NodeIndex>> = groups
        .into_values()
        .map(|mut members| {
            members.sort_unstable();
            members
        })
        .collect();
    components.sort_unstable();
    components
}
