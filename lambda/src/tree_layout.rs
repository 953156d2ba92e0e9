use serde::Serialize;

use crate::{
    config::TreeConfig,
    error::LayoutError,
    geometry::{Bounds, Point, Rect},
    prelude::*,
    reducer::MAX_DEPTH,
    term::{Term, TermId, TermKind},
};

#[derive(Clone, Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeLabel {
    Variable { name: Identifier },
    Lambda { param: Identifier },
    Application,
}

impl NodeLabel {
    pub fn text(&self) -> String {
        match self {
            NodeLabel::Variable { name } => name.to_string(),
            NodeLabel::Lambda { param } => format!("λ{param}"),
            NodeLabel::Application => "@".to_string(),
        }
    }
}

#[derive(Clone, Serialize, Debug)]
pub struct TreeNode {
    pub id: TermId,
    #[serde(flatten)]
    pub label: NodeLabel,
    #[serde(flatten)]
    pub rect: Rect,
    pub highlighted: bool,
    pub tag: Option<Identifier>,
}

#[derive(Clone, Serialize, Debug)]
pub struct Connector {
    pub from: TermId,
    pub to: TermId,
    pub start: Point,
    pub end: Point,
    pub highlighted: bool,
}

#[derive(Clone, Serialize, Debug)]
pub struct TreeLayout {
    pub nodes: Vec<TreeNode>,
    pub connectors: Vec<Connector>,
    pub width: f64,
    pub height: f64,
    pub error: Option<LayoutError>,
}

/// A laid-out subtree in its own coordinates, starting at x = 0. The
/// subtree's root is always the first node.
struct Block {
    nodes: Vec<TreeNode>,
    connectors: Vec<Connector>,
    width: f64,
}

impl Block {
    fn shift(&mut self, dx: f64) {
        for node in &mut self.nodes {
            node.rect.translate(dx, 0.0);
        }
        for connector in &mut self.connectors {
            connector.start = connector.start.translated(dx, 0.0);
            connector.end = connector.end.translated(dx, 0.0);
        }
    }

    fn root(&self) -> &TreeNode {
        &self.nodes[0]
    }
}

struct Layouter<'a> {
    config: &'a TreeConfig,
    highlight: Option<TermId>,
}

impl<'a> Layouter<'a> {
    fn label(term: &Term) -> NodeLabel {
        match term.kind() {
            TermKind::Variable(name) => NodeLabel::Variable { name: name.clone() },
            TermKind::Lambda { param, .. } => NodeLabel::Lambda {
                param: param.clone(),
            },
            TermKind::Application { .. } => NodeLabel::Application,
        }
    }

    fn box_width(&self, label: &NodeLabel) -> f64 {
        match label {
            NodeLabel::Application => self.config.min_box_width,
            _ => {
                let chars = label.text().chars().count() as f64;
                (chars * self.config.char_width + self.config.text_padding)
                    .max(self.config.min_box_width)
            }
        }
    }

    fn layout(&self, term: &Term, y: f64, depth: usize) -> Result<Block, LayoutError> {
        if depth > MAX_DEPTH {
            return Err(LayoutError::DepthExceeded { limit: MAX_DEPTH });
        }
        let children: Vec<&Term> = match term.kind() {
            TermKind::Variable(_) => vec![],
            TermKind::Lambda { body, .. } => vec![body],
            TermKind::Application { func, arg } => vec![func, arg],
        };
        let child_y = y + self.config.box_height + self.config.vertical_gap;
        let blocks = children
            .iter()
            .map(|child| self.layout(child, child_y, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;

        let gap = self.config.horizontal_gap;
        let span = blocks.iter().map(|b| b.width).sum::<f64>()
            + gap * blocks.len().saturating_sub(1) as f64;
        let label = Self::label(term);
        let own_width = self.box_width(&label);
        let width = own_width.max(span);
        let rect = Rect {
            x: (width - own_width) / 2.0,
            y,
            width: own_width,
            height: self.config.box_height,
        };

        let mut block = Block {
            nodes: vec![TreeNode {
                id: term.id(),
                label,
                rect,
                highlighted: self.highlight == Some(term.id()),
                tag: term.tag().cloned(),
            }],
            connectors: vec![],
            width,
        };
        let mut offset = (width - span) / 2.0;
        for (child, mut child_block) in children.into_iter().zip(blocks) {
            child_block.shift(offset);
            offset += child_block.width + gap;
            block.connectors.push(Connector {
                from: term.id(),
                to: child.id(),
                start: rect.bottom_center(),
                end: child_block.root().rect.top_center(),
                highlighted: self.highlight == Some(term.id()) && child.is_redex(),
            });
            block.nodes.append(&mut child_block.nodes);
            block.connectors.append(&mut child_block.connectors);
        }
        Ok(block)
    }

    fn finish(&self, mut block: Block) -> TreeLayout {
        let mut bounds = Bounds::default();
        for node in &block.nodes {
            bounds.add(&node.rect);
        }
        let padding = self.config.padding;
        let (dx, dy) = (padding - bounds.min().x, padding - bounds.min().y);
        for node in &mut block.nodes {
            node.rect.translate(dx, dy);
        }
        for connector in &mut block.connectors {
            connector.start = connector.start.translated(dx, dy);
            connector.end = connector.end.translated(dx, dy);
        }
        TreeLayout {
            nodes: block.nodes,
            connectors: block.connectors,
            width: (bounds.width() + 2.0 * padding).max(self.config.min_canvas_width),
            height: (bounds.height() + 2.0 * padding).max(self.config.min_canvas_height),
            error: None,
        }
    }
}

/// Box-and-line layout of `term`. Failures come back in `error` with an
/// empty drawing.
pub fn layout_tree(term: &Term, highlight: Option<TermId>, config: &TreeConfig) -> TreeLayout {
    let layouter = Layouter { config, highlight };
    match layouter.layout(term, 0.0, 0) {
        Ok(block) => layouter.finish(block),
        Err(error) => {
            tracing::warn!(%error, "tree layout failed");
            TreeLayout {
                nodes: vec![],
                connectors: vec![],
                width: config.min_canvas_width,
                height: config.min_canvas_height,
                error: Some(error),
            }
        }
    }
}
