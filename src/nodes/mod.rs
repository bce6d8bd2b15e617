//! Node kinds.
//!
//! The set of kinds is closed: [`NodeKind`] enumerates them and dispatches
//! [`metadata`](NodeKind::metadata) and [`process`](NodeKind::process) to the
//! implementation modules under [`builtin`].

pub mod builtin;

use crate::core::context::ProcessContext;
use crate::core::error::NodeResult;
use crate::core::node::{NodeMetadata, NodeOutput};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name of the single image port on most kinds.
pub const IMAGE_PORT: &str = "image";
/// Reference input of a difference node.
pub const DIFF_A_PORT: &str = "a";
/// Compared input of a difference node.
pub const DIFF_B_PORT: &str = "b";

/// Every kind of node that can appear in a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Exposes an externally loaded buffer.
    Source,
    /// Holds its input for export.
    Sink,
    /// Holds its input for a viewer.
    Display,
    /// Brightness or threshold.
    PointOp,
    /// Kernel convolution (or median via preset).
    Convolution,
    /// Median filter.
    Median,
    /// Intensity histogram.
    Histogram,
    /// Difference image and metrics.
    Difference,
}

impl NodeKind {
    /// All kinds, in menu order.
    pub const ALL: [NodeKind; 8] = [
        NodeKind::Source,
        NodeKind::Sink,
        NodeKind::Display,
        NodeKind::PointOp,
        NodeKind::Convolution,
        NodeKind::Median,
        NodeKind::Histogram,
        NodeKind::Difference,
    ];

    /// Stable identifier (e.g. "point_op").
    pub fn id(&self) -> &'static str {
        match self {
            NodeKind::Source => "source",
            NodeKind::Sink => "sink",
            NodeKind::Display => "display",
            NodeKind::PointOp => "point_op",
            NodeKind::Convolution => "convolution",
            NodeKind::Median => "median",
            NodeKind::Histogram => "histogram",
            NodeKind::Difference => "difference",
        }
    }

    /// Describe this kind's ports and parameters.
    pub fn metadata(&self) -> NodeMetadata {
        use builtin::*;
        match self {
            NodeKind::Source => io::source_metadata(),
            NodeKind::Sink => io::sink_metadata(),
            NodeKind::Display => io::display_metadata(),
            NodeKind::PointOp => point::metadata(),
            NodeKind::Convolution => convolution::metadata(),
            NodeKind::Median => median::metadata(),
            NodeKind::Histogram => histogram::metadata(),
            NodeKind::Difference => difference::metadata(),
        }
    }

    /// Process one node.
    ///
    /// Errors are local to the node: the scheduler records them and carries
    /// on with an absent output.
    pub fn process(&self, ctx: &mut ProcessContext) -> NodeResult<NodeOutput> {
        use builtin::*;
        match self {
            NodeKind::Source => io::process_source(ctx),
            NodeKind::Sink => io::process_sink(ctx),
            NodeKind::Display => io::process_display(ctx),
            NodeKind::PointOp => point::process(ctx),
            NodeKind::Convolution => convolution::process(ctx),
            NodeKind::Median => median::process(ctx),
            NodeKind::Histogram => histogram::process(ctx),
            NodeKind::Difference => difference::process(ctx),
        }
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown node kind '{}'", wanted))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
