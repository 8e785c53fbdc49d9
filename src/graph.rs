//! Graph Emitter: converts a binary's modules and their package sets into
//! a flat dependency graph rooted at the binary name.

use crate::model::GoBinary;

/// Fixed package-manager type tag carried on every emitted graph.
pub const PACKAGE_MANAGER: &str = "gomodules";

/// Identity of a package-level node: `(name, version)`, where `name`
/// inherits the owning module's name plus its directory suffix and
/// `version` is the owning module's version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageNode {
    pub name: String,
    pub version: String,
}

/// The dependency-graph collaborator this engine writes into. Callers
/// supply their own graph type and wire it in through this trait; the
/// engine never constructs a graph itself.
pub trait GraphBuilder {
    type NodeId;
    type Graph;

    /// Builder construction takes the package-manager descriptor and the
    /// root node's identity; modeled here as a required associated
    /// constructor-like method so implementors can do it however their
    /// graph type demands.
    fn new(package_manager: &str, root_name: &str) -> Self;

    fn root_node_id(&self) -> Self::NodeId;

    fn add_pkg_node(&mut self, node: PackageNode, node_id: Self::NodeId);

    fn connect_dep(&mut self, from: Self::NodeId, to: Self::NodeId);

    fn build(self) -> Self::Graph;
}

/// Emits one node per `(package, version)` pair across every module, each
/// connected directly to the root, preserving
/// (module-declaration-order, package-insertion-order). Yields to the
/// hosting runtime between packages via `tokio::task::consume_budget`, so
/// very large package sets don't monopolize a cooperative executor.
pub async fn emit<B>(binary: &GoBinary) -> B::Graph
where
    B: GraphBuilder,
    B::NodeId: Clone + From<u64>,
{
    let mut builder = B::new(PACKAGE_MANAGER, &binary.name);
    let root = builder.root_node_id();

    let mut next_id: u64 = 1;
    for module in &binary.modules {
        log::debug!(
            "emitting {} packages for module {}",
            module.packages().len(),
            module.full_name()
        );
        for package in module.packages() {
            let node_id = B::NodeId::from(next_id);
            next_id += 1;
            builder.add_pkg_node(
                PackageNode {
                    name: package.clone(),
                    version: module.version().to_string(),
                },
                node_id.clone(),
            );
            builder.connect_dep(root.clone(), node_id);
            tokio::task::consume_budget().await;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Module;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct TestNodeId(u64);

    impl From<u64> for TestNodeId {
        fn from(v: u64) -> Self {
            TestNodeId(v)
        }
    }

    struct RecordingGraph {
        package_manager: String,
        root_name: String,
        nodes: HashMap<TestNodeId, PackageNode>,
        edges: Vec<(TestNodeId, TestNodeId)>,
    }

    impl GraphBuilder for RecordingGraph {
        type NodeId = TestNodeId;
        type Graph = Self;

        fn new(package_manager: &str, root_name: &str) -> Self {
            RecordingGraph {
                package_manager: package_manager.to_string(),
                root_name: root_name.to_string(),
                nodes: HashMap::new(),
                edges: Vec::new(),
            }
        }

        fn root_node_id(&self) -> Self::NodeId {
            TestNodeId(0)
        }

        fn add_pkg_node(&mut self, node: PackageNode, node_id: Self::NodeId) {
            self.nodes.insert(node_id, node);
        }

        fn connect_dep(&mut self, from: Self::NodeId, to: Self::NodeId) {
            self.edges.push((from, to));
        }

        fn build(self) -> Self::Graph {
            self
        }
    }

    #[tokio::test]
    async fn emits_one_node_per_package_connected_to_root() {
        let mut main = Module::new("example.com/a", "v1.0.0", true);
        main.add_package("example.com/a".to_string());
        let mut dep = Module::new("example.com/b", "v2.1.0", false);
        dep.add_package("example.com/b/x".to_string());
        dep.add_package("example.com/b/y".to_string());

        let binary = GoBinary {
            name: "example.com/a".to_string(),
            modules: vec![main, dep],
        };

        let graph: RecordingGraph = emit::<RecordingGraph>(&binary).await;

        assert_eq!(graph.package_manager, PACKAGE_MANAGER);
        assert_eq!(graph.root_name, "example.com/a");
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 3);
        assert!(graph.edges.iter().all(|(from, _)| *from == TestNodeId(0)));

        let names: Vec<&str> = graph.nodes.values().map(|n| n.name.as_str()).collect();
        assert!(names.contains(&"example.com/a"));
        assert!(names.contains(&"example.com/b/x"));
        assert!(names.contains(&"example.com/b/y"));
    }

    #[tokio::test]
    async fn empty_modules_yield_no_nodes() {
        let binary = GoBinary {
            name: "example.com/a".to_string(),
            modules: vec![Module::new("example.com/a", "v1.0.0", true)],
        };
        let graph: RecordingGraph = emit::<RecordingGraph>(&binary).await;
        assert!(graph.nodes.is_empty());
        assert!(graph.edges.is_empty());
    }
}
