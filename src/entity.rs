//! Domain vertex and edge payload types for the usual reaction-network views.
//!
//! The graph variants are plain aliases over [`BioGraph`]: the variant only decides what sits
//! on nodes and edges.

use crate::graph::{BioGraph, Vertex};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Compound {
    pub id: String,
    pub name: Option<String>,
}

impl Compound {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: None }
    }
}

impl Vertex for Compound {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reaction {
    pub id: String,
    pub reversible: bool,
}

impl Reaction {
    pub fn new(id: impl Into<String>, reversible: bool) -> Self {
        Self { id: id.into(), reversible }
    }
}

impl Vertex for Reaction {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pathway {
    pub id: String,
    pub name: Option<String>,
}

impl Pathway {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: None }
    }
}

impl Vertex for Pathway {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Node of a compound/reaction bipartite graph. Edges only join nodes of different kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BipartiteNode {
    Compound(Compound),
    Reaction(Reaction),
}

impl Vertex for BipartiteNode {
    fn key(&self) -> &str {
        match self {
            Self::Compound(c) => &c.id,
            Self::Reaction(r) => &r.id,
        }
    }

    fn can_link(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Compound(_), Self::Reaction(_)) | (Self::Reaction(_), Self::Compound(_))
        )
    }
}

/// Compound-to-compound transition labelled with the reaction that performs it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionEdge {
    pub reaction: String,
}

impl ReactionEdge {
    pub fn new(reaction: impl Into<String>) -> Self {
        Self { reaction: reaction.into() }
    }
}

/// Compounds linked by the reactions converting one into another.
pub type CompoundGraph = BioGraph<Compound, ReactionEdge>;
/// Reactions linked by the compound one produces and the other consumes.
pub type ReactionGraph = BioGraph<Reaction, String>;
/// Pathways linked by shared compounds.
pub type PathwayGraph = BioGraph<Pathway, String>;
pub type BipartiteGraph = BioGraph<BipartiteNode, ()>;
