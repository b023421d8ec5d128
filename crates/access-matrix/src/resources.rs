//! # Resources
//!
//! Resources are addressed by unique slash-delimited paths such as
//! `/orders/form/amount`. The path doubles as the resource's position in an
//! implicit hierarchy: ancestry is derived by cutting path segments, never by
//! following `parent_id`. The parent id only feeds the navigation tree.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Numeric resource identifier.
pub type ResourceId = i64;

/// Kind of resource a path refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A routed page.
    Page,
    /// A section within a page.
    Section,
    /// A reusable component.
    Component,
    /// A single form field.
    Field,
    /// A button or other trigger.
    Button,
    /// A backend API endpoint.
    ApiEndpoint,
}

impl ResourceKind {
    /// Get the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Page => "page",
            ResourceKind::Section => "section",
            ResourceKind::Component => "component",
            ResourceKind::Field => "field",
            ResourceKind::Button => "button",
            ResourceKind::ApiEndpoint => "api_endpoint",
        }
    }

    /// Parse a kind from its string representation.
    ///
    /// # Example
    ///
    /// ```
    /// use access_matrix::resources::ResourceKind;
    ///
    /// assert_eq!(ResourceKind::parse("page"), Some(ResourceKind::Page));
    /// assert_eq!(ResourceKind::parse("API-ENDPOINT"), Some(ResourceKind::ApiEndpoint));
    /// assert_eq!(ResourceKind::parse("widget"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "page" => Some(ResourceKind::Page),
            "section" => Some(ResourceKind::Section),
            "component" => Some(ResourceKind::Component),
            "field" => Some(ResourceKind::Field),
            "button" => Some(ResourceKind::Button),
            "api_endpoint" | "api-endpoint" | "apiendpoint" | "api" => {
                Some(ResourceKind::ApiEndpoint)
            }
            _ => None,
        }
    }
}

/// A guarded resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Resource identifier.
    pub id: ResourceId,
    /// Unique hierarchical path.
    pub path: String,
    /// Display name.
    pub name: String,
    /// Kind of resource.
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Depth in the hierarchy.
    pub depth: u32,
    /// Parent resource, used only to build navigation trees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ResourceId>,
}

impl Resource {
    /// Create a resource. Depth is derived from the path.
    pub fn new(
        id: ResourceId,
        path: impl Into<String>,
        name: impl Into<String>,
        kind: ResourceKind,
    ) -> Self {
        let path = path.into();
        let depth = segments(&path).len() as u32;
        Self {
            id,
            path,
            name: name.into(),
            kind,
            depth,
            parent_id: None,
        }
    }

    /// Set the parent resource.
    pub fn with_parent(mut self, parent_id: ResourceId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Split a resource path into its non-empty segments.
///
/// ```
/// use access_matrix::resources::segments;
///
/// assert_eq!(segments("/orders/form/amount"), vec!["orders", "form", "amount"]);
/// assert_eq!(segments("//orders/"), vec!["orders"]);
/// assert!(segments("").is_empty());
/// ```
pub fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Ancestor paths of `path`, most specific first, ending with the root `/`.
///
/// The path itself is not included. A path without segments has no ancestors.
///
/// ```
/// use access_matrix::resources::ancestor_paths;
///
/// assert_eq!(ancestor_paths("/orders/form/amount"), vec!["/orders/form", "/orders", "/"]);
/// assert!(ancestor_paths("/").is_empty());
/// ```
pub fn ancestor_paths(path: &str) -> Vec<String> {
    let parts = segments(path);
    (0..parts.len())
        .rev()
        .map(|k| format!("/{}", parts[..k].join("/")))
        .collect()
}

/// A resource and its navigation children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    /// The resource at this node.
    pub resource: Resource,
    /// Child nodes, ordered by path.
    pub children: Vec<ResourceNode>,
}

impl ResourceNode {
    fn retain<F>(mut self, keep: &F) -> Option<Self>
    where
        F: Fn(&Resource) -> bool,
    {
        self.children = self
            .children
            .into_iter()
            .filter_map(|child| child.retain(keep))
            .collect();

        if keep(&self.resource) || !self.children.is_empty() {
            Some(self)
        } else {
            None
        }
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(ResourceNode::count).sum::<usize>()
    }
}

/// Navigation tree built from resource parent ids.
///
/// Resources whose parent is missing from the list become roots.
/// Resources caught in a parent-id cycle are unreachable and left out.
///
/// # Example
///
/// ```
/// use access_matrix::resources::{Resource, ResourceKind, ResourceTree};
///
/// let resources = vec![
///     Resource::new(1, "/orders", "Orders", ResourceKind::Page),
///     Resource::new(2, "/orders/form", "Order form", ResourceKind::Section).with_parent(1),
/// ];
/// let tree = ResourceTree::build(&resources);
/// assert_eq!(tree.roots().len(), 1);
/// assert_eq!(tree.roots()[0].children[0].resource.path, "/orders/form");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTree {
    roots: Vec<ResourceNode>,
}

impl ResourceTree {
    /// Build the tree from a flat resource list.
    pub fn build(resources: &[Resource]) -> Self {
        let ids: HashSet<ResourceId> = resources.iter().map(|r| r.id).collect();
        let mut children_of: HashMap<Option<ResourceId>, Vec<&Resource>> = HashMap::new();

        for resource in resources {
            let parent = resource
                .parent_id
                .filter(|parent| *parent != resource.id && ids.contains(parent));
            children_of.entry(parent).or_default().push(resource);
        }

        for siblings in children_of.values_mut() {
            siblings.sort_by(|a, b| a.path.cmp(&b.path));
        }

        fn attach(
            parent: Option<ResourceId>,
            children_of: &HashMap<Option<ResourceId>, Vec<&Resource>>,
        ) -> Vec<ResourceNode> {
            children_of
                .get(&parent)
                .map(|siblings| {
                    siblings
                        .iter()
                        .map(|resource| ResourceNode {
                            resource: (*resource).clone(),
                            children: attach(Some(resource.id), children_of),
                        })
                        .collect()
                })
                .unwrap_or_default()
        }

        Self {
            roots: attach(None, &children_of),
        }
    }

    /// Root nodes, ordered by path.
    pub fn roots(&self) -> &[ResourceNode] {
        &self.roots
    }

    /// Total number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.roots.iter().map(ResourceNode::count).sum()
    }

    /// Check if the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Keep nodes that satisfy `keep` or have a descendant that does.
    ///
    /// A parent that fails the predicate is kept as a container when one of
    /// its descendants survives.
    pub fn retain<F>(self, keep: F) -> Self
    where
        F: Fn(&Resource) -> bool,
    {
        Self {
            roots: self
                .roots
                .into_iter()
                .filter_map(|node| node.retain(&keep))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Resource> {
        vec![
            Resource::new(1, "/orders", "Orders", ResourceKind::Page),
            Resource::new(3, "/orders/list", "Order list", ResourceKind::Section).with_parent(1),
            Resource::new(2, "/orders/form", "Order form", ResourceKind::Section).with_parent(1),
            Resource::new(4, "/orders/form/amount", "Amount", ResourceKind::Field).with_parent(2),
            Resource::new(5, "/reports", "Reports", ResourceKind::Page),
            Resource::new(6, "/stray", "Stray", ResourceKind::Button).with_parent(99),
        ]
    }

    #[test]
    fn test_resource_kind_parsing() {
        assert_eq!(ResourceKind::parse("Section"), Some(ResourceKind::Section));
        assert_eq!(ResourceKind::parse("button"), Some(ResourceKind::Button));
        assert_eq!(ResourceKind::parse("api_endpoint"), Some(ResourceKind::ApiEndpoint));
        assert_eq!(ResourceKind::ApiEndpoint.as_str(), "api_endpoint");
        assert_eq!(ResourceKind::parse(""), None);
    }

    #[test]
    fn test_resource_deserialize() {
        let json = r#"{
            "id": 4,
            "path": "/orders/form/amount",
            "name": "Amount",
            "type": "field",
            "depth": 3,
            "parentId": 2
        }"#;
        let resource: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(resource.kind, ResourceKind::Field);
        assert_eq!(resource.parent_id, Some(2));
        assert_eq!(resource.depth, 3);
    }

    #[test]
    fn test_depth_from_path() {
        let resource = Resource::new(1, "/a/b/c", "C", ResourceKind::Field);
        assert_eq!(resource.depth, 3);
    }

    #[test]
    fn test_ancestor_paths() {
        assert_eq!(ancestor_paths("/orders"), vec!["/"]);
        assert_eq!(ancestor_paths("orders/form"), vec!["/orders", "/"]);
        assert!(ancestor_paths("").is_empty());
        assert!(ancestor_paths("///").is_empty());
    }

    #[test]
    fn test_tree_build_orders_children_by_path() {
        let tree = ResourceTree::build(&sample());
        let roots: Vec<&str> = tree.roots().iter().map(|n| n.resource.path.as_str()).collect();
        assert_eq!(roots, vec!["/orders", "/reports", "/stray"]);

        let children: Vec<&str> = tree.roots()[0]
            .children
            .iter()
            .map(|n| n.resource.path.as_str())
            .collect();
        assert_eq!(children, vec!["/orders/form", "/orders/list"]);
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_tree_drops_cycles() {
        let resources = vec![
            Resource::new(1, "/a", "A", ResourceKind::Page).with_parent(2),
            Resource::new(2, "/b", "B", ResourceKind::Page).with_parent(1),
            Resource::new(3, "/c", "C", ResourceKind::Page).with_parent(3),
        ];
        let tree = ResourceTree::build(&resources);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.roots()[0].resource.id, 3);
    }

    #[test]
    fn test_tree_retain_keeps_containers() {
        let tree = ResourceTree::build(&sample()).retain(|r| r.path == "/orders/form/amount");
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.roots()[0].resource.path, "/orders");
        assert_eq!(tree.roots()[0].children.len(), 1);

        let empty = ResourceTree::build(&sample()).retain(|_| false);
        assert!(empty.is_empty());
    }
}
