use tabled::{settings::Style, Table, Tabled};
use crate::edge::Edge;
use crate::node::Node;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
}

#[derive(Tabled)]
struct EdgeRow {
    #[tabled(rename = "Id")]
    id: i64,
    #[tabled(rename = "Start")]
    start: i64,
    #[tabled(rename = "End")]
    end: i64,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

pub fn nodes_table(nodes: &[Node]) -> String {
    if nodes.is_empty() {
        return String::new();
    }
    let rows: Vec<NodeRow> = nodes
        .iter()
        .map(|n| NodeRow { id: n.id.0, name: n.name.clone() })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn edges_table(edges: &[Edge]) -> String {
    if edges.is_empty() {
        return String::new();
    }
    let rows: Vec<EdgeRow> = edges
        .iter()
        .map(|e| EdgeRow { id: e.id.0, start: e.start_node.0, end: e.end_node.0 })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::EdgeId;
    use crate::node::NodeId;

    #[test]
    fn test_nodes_table_lists_rows() {
        let table = nodes_table(&[Node::new(NodeId(1), "Paris"), Node::new(NodeId(2), "Rome")]);
        assert!(table.contains("Name"));
        assert!(table.contains("Paris"));
        assert!(table.contains("Rome"));
    }

    #[test]
    fn test_empty_tables_render_nothing() {
        assert!(nodes_table(&[]).is_empty());
        assert!(edges_table(&[]).is_empty());
        assert!(stats_table(&[]).is_empty());
    }

    #[test]
    fn test_edges_table_shows_endpoints() {
        let table = edges_table(&[Edge::new(EdgeId(3), NodeId(1), NodeId(2))]);
        assert!(table.contains("Start"));
        assert!(table.contains('3'));
    }
}
