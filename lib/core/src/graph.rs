// Output graph: points and canonical undirected links
use crate::{Error, Result};
use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    pub id: String,
    pub label: String,
    /// Weighted degree: sum of the weights of this point's links.
    #[serde(default)]
    pub degree: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub source: String,
    pub target: String,
    pub weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub points: Vec<Point>,
    pub links: Vec<Link>,
}

impl Point {
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            degree: 0,
            category: None,
            community: None,
            first_seen: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_degree(mut self, degree: u64) -> Self {
        self.degree = degree;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_first_seen(mut self, first_seen: Option<i64>) -> Self {
        self.first_seen = first_seen;
        self
    }
}

impl Link {
    /// Builds a link with its endpoints in canonical order (smaller id first).
    #[inline]
    #[must_use]
    pub fn new(a: impl Into<String>, b: impl Into<String>, weight: u32) -> Self {
        let (a, b) = (a.into(), b.into());
        let (source, target) = if a <= b { (a, b) } else { (b, a) };
        Self {
            source,
            target,
            weight,
            first_seen: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_first_seen(mut self, first_seen: Option<i64>) -> Self {
        self.first_seen = first_seen;
        self
    }

    #[inline]
    pub fn is_canonical(&self) -> bool {
        self.source < self.target
    }
}

impl Graph {
    pub fn new(points: Vec<Point>, links: Vec<Link>) -> Self {
        Self { points, links }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, id: &str) -> Option<&Point> {
        self.points.iter().find(|p| p.id == id)
    }

    /// Returns a copy of this graph with `community` set from `assignments`.
    ///
    /// Points missing from `assignments` keep whatever value they had.
    pub fn with_communities(&self, assignments: &BTreeMap<String, usize>) -> Graph {
        let points = self
            .points
            .iter()
            .map(|p| {
                let mut p = p.clone();
                if let Some(&c) = assignments.get(&p.id) {
                    p.community = Some(c);
                }
                p
            })
            .collect();
        Graph {
            points,
            links: self.links.clone(),
        }
    }

    /// Induced subgraph: the points in `ids` and the links with both ends in `ids`.
    pub fn induced<S: AsRef<str>>(&self, ids: &[S]) -> Graph {
        let keep: AHashSet<&str> = ids.iter().map(|s| s.as_ref()).collect();
        let points = self
            .points
            .iter()
            .filter(|p| keep.contains(p.id.as_str()))
            .cloned()
            .collect();
        let links = self
            .links
            .iter()
            .filter(|l| keep.contains(l.source.as_str()) && keep.contains(l.target.as_str()))
            .cloned()
            .collect();
        Graph { points, links }
    }

    /// Checks the link invariants: canonical direction, no self loops,
    /// no duplicates, positive weights, endpoints present.
    pub fn validate(&self) -> Result<()> {
        let ids: AHashSet<&str> = self.points.iter().map(|p| p.id.as_str()).collect();
        if ids.len() != self.points.len() {
            return Err(Error::InvalidInput("duplicate point id".to_string()));
        }
        let mut seen = AHashSet::with_capacity(self.links.len());
        for link in &self.links {
            if !link.is_canonical() {
                return Err(Error::InvalidInput(format!(
                    "link {} -> {} is not canonical",
                    link.source, link.target
                )));
            }
            if link.weight == 0 {
                return Err(Error::InvalidInput(format!(
                    "link {} -> {} has zero weight",
                    link.source, link.target
                )));
            }
            if !ids.contains(link.source.as_str()) || !ids.contains(link.target.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "link {} -> {} references a missing point",
                    link.source, link.target
                )));
            }
            if !seen.insert((link.source.as_str(), link.target.as_str())) {
                return Err(Error::InvalidInput(format!(
                    "duplicate link {} -> {}",
                    link.source, link.target
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Graph {
        Graph::new(
            vec![Point::new("a", "A"), Point::new("b", "B"), Point::new("c", "C")],
            vec![Link::new("b", "a", 3), Link::new("a", "c", 1), Link::new("c", "b", 2)],
        )
    }

    #[test]
    fn test_link_is_canonicalized() {
        let link = Link::new("zeta", "alpha", 4);
        assert_eq!(link.source, "alpha");
        assert_eq!(link.target, "zeta");
        assert!(triangle().validate().is_ok());
    }

    #[test]
    fn test_with_communities_does_not_mutate() {
        let graph = triangle();
        let mut assignments = BTreeMap::new();
        assignments.insert("a".to_string(), 0);
        assignments.insert("c".to_string(), 1);

        let labelled = graph.with_communities(&assignments);
        assert_eq!(labelled.point("a").unwrap().community, Some(0));
        assert_eq!(labelled.point("b").unwrap().community, None);
        assert_eq!(labelled.point("c").unwrap().community, Some(1));
        assert!(graph.points.iter().all(|p| p.community.is_none()));
        assert_eq!(labelled.links, graph.links);
    }

    #[test]
    fn test_induced_keeps_only_inner_links() {
        let sub = triangle().induced(&["a", "b"]);
        assert_eq!(sub.points.len(), 2);
        assert_eq!(sub.links.len(), 1);
        assert_eq!(sub.links[0].source, "a");
        assert_eq!(sub.links[0].target, "b");
    }

    #[test]
    fn test_validate_rejects_dangling_link() {
        let graph = Graph::new(vec![Point::new("a", "A")], vec![Link::new("a", "b", 1)]);
        assert!(graph.validate().is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let point = Point::new("a", "A").with_first_seen(Some(10));
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["firstSeen"], 10);
        assert!(json.get("category").is_none());
    }
}
