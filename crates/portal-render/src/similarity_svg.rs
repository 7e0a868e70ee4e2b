use portal_protocol::SimilarityGraph;
use std::collections::HashMap;
use std::f32::consts::TAU;
use svg::Document;
use svg::node::element::{Circle, Line, Rectangle, Text};

const W: f32 = 1200.0;
const H: f32 = 900.0;
const RING_RADIUS: f32 = 320.0;
const MIN_NODE_RADIUS: f32 = 10.0;
const NODE_RADIUS_STEP: f32 = 4.0;
const MAX_NODE_RADIUS: f32 = 34.0;

fn node_radius(weight: usize) -> f32 {
    (MIN_NODE_RADIUS + weight as f32 * NODE_RADIUS_STEP).min(MAX_NODE_RADIUS)
}

/// Static drawing of the organism similarity graph. Organisms sit on a ring
/// in row order; this is a snapshot for reports, not an interactive layout.
pub fn export_similarity_svg(graph: &SimilarityGraph) -> String {
    let cx = W * 0.5;
    let cy = H * 0.5 + 20.0;
    let count = graph.nodes.len().max(1) as f32;

    let mut pos_by_node: HashMap<&str, (f32, f32)> = HashMap::new();
    for (idx, node) in graph.nodes.iter().enumerate() {
        let angle = TAU * idx as f32 / count - TAU / 4.0;
        let (x, y) = if graph.nodes.len() == 1 {
            (cx, cy)
        } else {
            (cx + RING_RADIUS * angle.cos(), cy + RING_RADIUS * angle.sin())
        };
        pos_by_node.insert(node.id.as_str(), (x, y));
    }

    let mut doc = Document::new()
        .set("viewBox", (0, 0, W, H))
        .set("width", W)
        .set("height", H)
        .set("style", "background:#ffffff");

    doc = doc.add(
        Text::new(format!(
            "AMR similarity ({}, min shared {}): {} organisms, {} links",
            graph.mode.as_str(),
            graph.min_shared,
            graph.nodes.len(),
            graph.links.len()
        ))
        .set("x", 24)
        .set("y", 34)
        .set("font-family", "Helvetica, Arial, sans-serif")
        .set("font-size", 22)
        .set("fill", "#202020"),
    );

    for link in &graph.links {
        let Some((fx, fy)) = pos_by_node.get(link.source.as_str()).cloned() else {
            continue;
        };
        let Some((tx, ty)) = pos_by_node.get(link.target.as_str()).cloned() else {
            continue;
        };
        doc = doc.add(
            Line::new()
                .set("x1", fx)
                .set("y1", fy)
                .set("x2", tx)
                .set("y2", ty)
                .set("stroke", "#8b5cf6")
                .set("stroke-opacity", 0.6)
                .set("stroke-width", 1.0 + link.weight as f32),
        );
        let mx = (fx + tx) * 0.5;
        let my = (fy + ty) * 0.5;
        doc = doc
            .add(
                Rectangle::new()
                    .set("x", mx - 14.0)
                    .set("y", my - 9.0)
                    .set("width", 28)
                    .set("height", 16)
                    .set("fill", "#f5f5f5")
                    .set("stroke", "#e0e0e0")
                    .set("rx", 2),
            )
            .add(
                Text::new(link.weight.to_string())
                    .set("x", mx)
                    .set("y", my)
                    .set("text-anchor", "middle")
                    .set("dominant-baseline", "middle")
                    .set("font-family", "Helvetica, Arial, sans-serif")
                    .set("font-size", 10)
                    .set("fill", "#222222"),
            );
    }

    for node in &graph.nodes {
        let Some((x, y)) = pos_by_node.get(node.id.as_str()).cloned() else {
            continue;
        };
        let r = node_radius(node.weight);
        doc = doc
            .add(
                Circle::new()
                    .set("cx", x)
                    .set("cy", y)
                    .set("r", r)
                    .set("fill", "#a78bfa")
                    .set("stroke", "#6d28d9")
                    .set("stroke-width", 1),
            )
            .add(
                Text::new(node.id.clone())
                    .set("x", x + r + 6.0)
                    .set("y", y - 2.0)
                    .set("font-family", "Helvetica, Arial, sans-serif")
                    .set("font-size", 12)
                    .set("fill", "#101010"),
            )
            .add(
                Text::new(format!("{} items", node.weight))
                    .set("x", x + r + 6.0)
                    .set("y", y + 12.0)
                    .set("font-family", "Helvetica, Arial, sans-serif")
                    .set("font-size", 10)
                    .set("fill", "#444444"),
            );
    }

    doc.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_protocol::{GraphMode, MinShared, OrganismNode, SimilarityLink};

    fn graph() -> SimilarityGraph {
        SimilarityGraph {
            mode: GraphMode::Genes,
            min_shared: MinShared::new(1),
            nodes: vec![
                OrganismNode {
                    id: "Escherichia coli".into(),
                    weight: 3,
                },
                OrganismNode {
                    id: "Klebsiella pneumoniae".into(),
                    weight: 2,
                },
            ],
            links: vec![SimilarityLink {
                source: "Escherichia coli".into(),
                target: "Klebsiella pneumoniae".into(),
                weight: 1,
                shared: vec!["sul1".into()],
            }],
        }
    }

    #[test]
    fn draws_one_circle_per_node_and_one_line_per_link() {
        let svg = export_similarity_svg(&graph());
        assert_eq!(svg.matches("<circle").count(), 2);
        assert_eq!(svg.matches("<line").count(), 1);
        assert!(svg.contains("Klebsiella pneumoniae"));
        assert!(svg.contains("genes, min shared 1"));
    }

    #[test]
    fn empty_graph_still_renders_a_document() {
        let svg = export_similarity_svg(&SimilarityGraph::default());
        assert!(svg.contains("<svg"));
        assert!(svg.contains("0 organisms, 0 links"));
        assert_eq!(svg.matches("<circle").count(), 0);
    }

    #[test]
    fn node_radius_is_capped() {
        assert_eq!(node_radius(0), MIN_NODE_RADIUS);
        assert_eq!(node_radius(100), MAX_NODE_RADIUS);
    }
}
